use assert_cmd::Command;
use serde_json::Value;
use std::path::PathBuf;
use tempfile::TempDir;

/// Variables that would leak the developer's own configuration into a test run.
const CONFIG_VARIABLES: &[&str] = &[
    "TASK_AGENT_PRIVATE_KEY",
    "APTOS_PRIVATE_KEY",
    "SERVICE_AGENT_PRIVATE_KEY",
    "SERVICE_AGENT_ADDRESS",
    "TASK_MANAGER_PACKAGE_ID",
    "TASK_MANAGER_ID",
    "SUI_NETWORK",
    "SUI_NODE_URL",
    "APTOS_NETWORK",
    "APTOS_NODE_URL",
    "BRIDGE_CHAIN",
    "BRIDGE_SDK_PATH",
    "BRIDGE_FAUCET_URL",
    "BRIDGE_MIN_BALANCE",
    "NODE_PATH",
];

pub struct Invocation {
    pub json: Value,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Runs the `bridge` binary against a fake SDK runtime in a scratch directory.
pub struct BridgeHarness {
    dir: TempDir,
    runtime: Option<PathBuf>,
}

impl BridgeHarness {
    pub fn new() -> Result<Self, String> {
        let dir = tempfile::tempdir().map_err(|e| format!("failed to create temp dir: {e}"))?;
        Ok(Self { dir, runtime: None })
    }

    /// Installs an executable that prints `stdout_lines` and exits with
    /// `exit_code`, optionally writing `stderr` first.
    #[cfg(unix)]
    pub fn with_fake_sdk(
        mut self,
        stdout_lines: &[&str],
        stderr: Option<&str>,
        exit_code: i32,
    ) -> Result<Self, String> {
        use std::os::unix::fs::PermissionsExt;

        let printed: String = stdout_lines
            .iter()
            .map(|line| format!("echo '{line}'\n"))
            .collect();
        let warned = stderr.map_or_else(String::new, |text| format!("echo '{text}' >&2\n"));
        let path = self.dir.path().join("fake-node");
        std::fs::write(
            &path,
            format!("#!/bin/sh\ncat > /dev/null\n{warned}{printed}exit {exit_code}\n"),
        )
        .map_err(|e| format!("failed to write fake sdk: {e}"))?;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .map_err(|e| format!("failed to mark fake sdk executable: {e}"))?;
        self.runtime = Some(path);
        Ok(self)
    }

    pub fn run(&self, args: &[&str], env: &[(&str, &str)]) -> Result<Invocation, String> {
        let mut command = Command::new(assert_cmd::cargo::cargo_bin!("bridge"));
        command.current_dir(self.dir.path());
        for name in CONFIG_VARIABLES {
            command.env_remove(name);
        }
        command.env("RUST_LOG", "warn");
        match &self.runtime {
            Some(path) => command.env("BRIDGE_SCRIPT_RUNTIME", path),
            None => command.env("BRIDGE_SCRIPT_RUNTIME", self.dir.path().join("missing-node")),
        };
        for (name, value) in env {
            command.env(name, value);
        }

        let output = command
            .args(args)
            .output()
            .map_err(|e| format!("failed to run bridge: {e}"))?;
        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let json = serde_json::from_str(&stdout).unwrap_or(Value::Null);

        Ok(Invocation {
            json,
            exit_code: output.status.code().unwrap_or(-1),
            stdout,
            stderr,
        })
    }
}

pub fn assert_envelope(json: &Value) -> Result<(), String> {
    if !json["ok"].is_boolean() {
        return Err(format!("missing ok flag: {json}"));
    }
    if !json["rid"].is_string() || !json["t"].is_i64() {
        return Err(format!("missing rid or timestamp: {json}"));
    }
    if json["ok"] == false && !json["err"]["code"].is_string() {
        return Err(format!("failed envelope without error code: {json}"));
    }
    Ok(())
}
