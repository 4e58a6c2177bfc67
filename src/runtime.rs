//! Script-bridge executor.
//!
//! Each call writes a fixed script to a temporary file, runs it under the
//! configured script runtime with the chain SDK on the module search path,
//! feeds the JSON payload on stdin and captures stdout/stderr under a time
//! budget. The temporary file is owned by a `NamedTempFile`, so it is
//! removed on every exit path including timeouts and early errors.

use crate::error::{BridgeError, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tracing::{debug, warn};

pub const MAX_SCRIPT_OUTPUT_CAPTURE_BYTES: usize = 1_048_576;
pub const DEFAULT_SCRIPT_PROGRAM: &str = "node";
/// Environment variable the child runtime resolves SDK modules from.
pub const MODULE_PATH_ENV: &str = "NODE_PATH";

#[derive(Debug, Clone)]
pub struct StreamCapture {
    pub bytes: Vec<u8>,
    pub truncated: bool,
}

pub async fn capture_stream_limited<R>(mut stream: R, max_bytes: usize) -> Result<StreamCapture>
where
    R: AsyncRead + Unpin,
{
    let mut bytes = Vec::new();
    let mut truncated = false;
    let mut chunk = [0_u8; 8_192];

    loop {
        let read = stream.read(&mut chunk).await.map_err(BridgeError::IoError)?;
        if read == 0 {
            break;
        }

        let remaining = max_bytes.saturating_sub(bytes.len());
        if remaining == 0 {
            truncated = true;
            continue;
        }

        let to_copy = remaining.min(read);
        bytes.extend_from_slice(&chunk[..to_copy]);
        if to_copy < read {
            truncated = true;
        }
    }

    Ok(StreamCapture { bytes, truncated })
}

/// One request to the external chain SDK.
#[derive(Debug, Clone)]
pub struct ScriptInvocation {
    pub operation: &'static str,
    pub script: &'static str,
    pub payload: Value,
    pub timeout: Duration,
}

impl ScriptInvocation {
    #[must_use]
    pub const fn new(
        operation: &'static str,
        script: &'static str,
        payload: Value,
        timeout: Duration,
    ) -> Self {
        Self {
            operation,
            script,
            payload,
            timeout,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedScript {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub stdout_truncated: bool,
    pub stderr_truncated: bool,
    pub elapsed: Duration,
}

impl CompletedScript {
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        matches!(self.exit_code, Some(0))
    }

    /// Diagnostic text for a failed run: stderr, or stdout when stderr is empty.
    #[must_use]
    pub fn diagnostic(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            let stdout = self.stdout.trim();
            if stdout.is_empty() {
                format!("script exited with status {}", exit_label(self.exit_code))
            } else {
                stdout.to_string()
            }
        } else {
            stderr.to_string()
        }
    }
}

fn exit_label(code: Option<i32>) -> String {
    code.map_or_else(|| "signal".to_string(), |c| c.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptOutcome {
    Completed(CompletedScript),
    TimedOut { after: Duration },
}

/// Where and how scripts run. The module path is injected configuration,
/// never a path baked into the binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptRuntime {
    program: String,
    module_path: Option<PathBuf>,
    script_dir: Option<PathBuf>,
    timeout_override: Option<Duration>,
}

impl Default for ScriptRuntime {
    fn default() -> Self {
        Self::new(DEFAULT_SCRIPT_PROGRAM)
    }
}

impl ScriptRuntime {
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            module_path: None,
            script_dir: None,
            timeout_override: None,
        }
    }

    #[must_use]
    pub fn with_module_path(mut self, module_path: Option<PathBuf>) -> Self {
        self.module_path = module_path;
        self
    }

    /// Directory for temporary script files; defaults to the system temp dir.
    #[must_use]
    pub fn with_script_dir(mut self, script_dir: Option<PathBuf>) -> Self {
        self.script_dir = script_dir;
        self
    }

    /// Replaces every per-operation timeout with `timeout`.
    #[must_use]
    pub fn with_timeout_override(mut self, timeout: Option<Duration>) -> Self {
        self.timeout_override = timeout;
        self
    }

    /// The budget for an operation whose own limit is `default`.
    #[must_use]
    pub fn timeout_for(&self, default: Duration) -> Duration {
        self.timeout_override.unwrap_or(default)
    }

    #[must_use]
    pub fn module_path(&self) -> Option<&Path> {
        self.module_path.as_deref()
    }

    fn write_script(&self, script: &str) -> Result<NamedTempFile> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("bridge-").suffix(".js");
        let mut file = match &self.script_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        std::io::Write::write_all(&mut file, script.as_bytes())?;
        std::io::Write::flush(&mut file)?;
        Ok(file)
    }

    /// Runs one invocation to completion or timeout.
    ///
    /// # Errors
    /// Returns `BridgeError::IoError` when the script file cannot be written,
    /// the runtime cannot be spawned, or its output cannot be read.
    pub async fn execute(&self, invocation: &ScriptInvocation) -> Result<ScriptOutcome> {
        let script_file = self.write_script(invocation.script)?;
        let payload = serde_json::to_vec(&invocation.payload)?;
        let start = Instant::now();

        let mut command = Command::new(&self.program);
        command
            .arg(script_file.path())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(module_path) = &self.module_path {
            command.env(MODULE_PATH_ENV, module_path);
        }

        let mut child = command.spawn().map_err(|err| {
            BridgeError::IoError(std::io::Error::new(
                err.kind(),
                format!("Failed to execute {}: {err}", self.program),
            ))
        })?;
        debug!(
            operation = invocation.operation,
            program = %self.program,
            "spawned script runtime"
        );

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| BridgeError::Internal(format!("Failed to open {} stdin", self.program)))?;
        let stdout = child.stdout.take().ok_or_else(|| {
            BridgeError::Internal(format!("Failed to capture {} stdout", self.program))
        })?;
        let stderr = child.stderr.take().ok_or_else(|| {
            BridgeError::Internal(format!("Failed to capture {} stderr", self.program))
        })?;

        let stdin_task = tokio::spawn(write_payload(stdin, payload));
        let mut stdout_task = tokio::spawn(async move {
            capture_stream_limited(stdout, MAX_SCRIPT_OUTPUT_CAPTURE_BYTES).await
        });
        let mut stderr_task = tokio::spawn(async move {
            capture_stream_limited(stderr, MAX_SCRIPT_OUTPUT_CAPTURE_BYTES).await
        });

        // The budget covers the output readers too: a backgrounded grandchild
        // can hold the pipes open after the script itself has exited.
        let collected = tokio::time::timeout(invocation.timeout, async {
            let status = child.wait().await?;
            let stdout_capture = (&mut stdout_task)
                .await
                .map_err(|err| BridgeError::Internal(format!("Failed to read stdout: {err}")))??;
            let stderr_capture = (&mut stderr_task)
                .await
                .map_err(|err| BridgeError::Internal(format!("Failed to read stderr: {err}")))??;
            Ok::<_, BridgeError>((status, stdout_capture, stderr_capture))
        })
        .await;

        let Ok(collected) = collected else {
            if let Err(err) = child.kill().await {
                debug!(operation = invocation.operation, error = %err, "timed out script already exited");
            }
            stdin_task.abort();
            stdout_task.abort();
            stderr_task.abort();
            discard_script(script_file, invocation.operation);
            return Ok(ScriptOutcome::TimedOut {
                after: invocation.timeout,
            });
        };

        if stdin_task.is_finished() {
            if let Ok(Err(err)) = stdin_task.await {
                debug!(operation = invocation.operation, error = %err, "script did not read full payload");
            }
        } else {
            stdin_task.abort();
        }
        discard_script(script_file, invocation.operation);
        let (status, stdout_capture, stderr_capture) = collected?;

        Ok(ScriptOutcome::Completed(CompletedScript {
            exit_code: status.code(),
            stdout: String::from_utf8_lossy(&stdout_capture.bytes).into_owned(),
            stderr: String::from_utf8_lossy(&stderr_capture.bytes).into_owned(),
            stdout_truncated: stdout_capture.truncated,
            stderr_truncated: stderr_capture.truncated,
            elapsed: start.elapsed(),
        }))
    }
}

async fn write_payload(mut stdin: tokio::process::ChildStdin, payload: Vec<u8>) -> std::io::Result<()> {
    match stdin.write_all(&payload).await {
        Err(err) if err.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }?;
    stdin.shutdown().await
}

fn discard_script(script_file: NamedTempFile, operation: &str) {
    if let Err(err) = script_file.close() {
        warn!(operation, error = %err, "failed to remove temporary script");
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::{ScriptInvocation, ScriptOutcome, ScriptRuntime};
    use serde_json::json;
    use std::path::PathBuf;
    use std::time::{Duration, Instant};

    fn runtime_in(dir: &tempfile::TempDir) -> ScriptRuntime {
        ScriptRuntime::new("sh").with_script_dir(Some(dir.path().to_path_buf()))
    }

    fn leftover_files(dir: &tempfile::TempDir) -> usize {
        std::fs::read_dir(dir.path()).map_or(0, Iterator::count)
    }

    #[tokio::test]
    async fn completed_script_captures_stdout_and_payload() -> Result<(), String> {
        let dir = tempfile::tempdir().map_err(|e| e.to_string())?;
        let invocation = ScriptInvocation::new(
            "echo_payload",
            "echo SUCCESS\ncat\n",
            json!({"task_id": "t-1"}),
            Duration::from_secs(5),
        );

        let outcome = runtime_in(&dir)
            .execute(&invocation)
            .await
            .map_err(|e| e.to_string())?;

        match outcome {
            ScriptOutcome::Completed(done) => {
                assert!(done.succeeded());
                assert!(done.stdout.starts_with("SUCCESS"));
                assert!(done.stdout.contains(r#"{"task_id":"t-1"}"#));
            }
            ScriptOutcome::TimedOut { .. } => return Err("unexpected timeout".to_string()),
        }
        assert_eq!(leftover_files(&dir), 0);
        Ok(())
    }

    #[tokio::test]
    async fn failing_script_reports_stderr() -> Result<(), String> {
        let dir = tempfile::tempdir().map_err(|e| e.to_string())?;
        let invocation = ScriptInvocation::new(
            "fail",
            "echo 'ERROR: boom' >&2\nexit 3\n",
            json!({}),
            Duration::from_secs(5),
        );

        let outcome = runtime_in(&dir)
            .execute(&invocation)
            .await
            .map_err(|e| e.to_string())?;

        match outcome {
            ScriptOutcome::Completed(done) => {
                assert!(!done.succeeded());
                assert_eq!(done.exit_code, Some(3));
                assert_eq!(done.diagnostic(), "ERROR: boom");
            }
            ScriptOutcome::TimedOut { .. } => return Err("unexpected timeout".to_string()),
        }
        assert_eq!(leftover_files(&dir), 0);
        Ok(())
    }

    #[tokio::test]
    async fn timeout_kills_child_and_removes_script() -> Result<(), String> {
        let dir = tempfile::tempdir().map_err(|e| e.to_string())?;
        let invocation = ScriptInvocation::new(
            "slow",
            "sleep 10\n",
            json!({}),
            Duration::from_millis(200),
        );

        let outcome = runtime_in(&dir)
            .execute(&invocation)
            .await
            .map_err(|e| e.to_string())?;

        assert_eq!(
            outcome,
            ScriptOutcome::TimedOut {
                after: Duration::from_millis(200)
            }
        );
        assert_eq!(leftover_files(&dir), 0);
        Ok(())
    }

    #[tokio::test]
    async fn background_process_holding_stdout_does_not_outlive_budget() -> Result<(), String> {
        let dir = tempfile::tempdir().map_err(|e| e.to_string())?;
        let invocation = ScriptInvocation::new(
            "lingering",
            "sleep 5 &\necho SUCCESS\nexit 0\n",
            json!({}),
            Duration::from_millis(500),
        );

        let started = Instant::now();
        let outcome = runtime_in(&dir)
            .execute(&invocation)
            .await
            .map_err(|e| e.to_string())?;

        assert!(started.elapsed() < Duration::from_secs(3), "took {:?}", started.elapsed());
        assert_eq!(
            outcome,
            ScriptOutcome::TimedOut {
                after: Duration::from_millis(500)
            }
        );
        assert_eq!(leftover_files(&dir), 0);
        Ok(())
    }

    #[test]
    fn timeout_override_replaces_operation_budget() {
        let default = Duration::from_secs(120);
        assert_eq!(ScriptRuntime::new("sh").timeout_for(default), default);
        assert_eq!(
            ScriptRuntime::new("sh")
                .with_timeout_override(Some(Duration::from_secs(2)))
                .timeout_for(default),
            Duration::from_secs(2)
        );
    }

    #[tokio::test]
    async fn module_path_is_exported_to_child() -> Result<(), String> {
        let dir = tempfile::tempdir().map_err(|e| e.to_string())?;
        let runtime = runtime_in(&dir).with_module_path(Some(PathBuf::from("/opt/sdk/node_modules")));
        let invocation = ScriptInvocation::new(
            "env",
            "echo \"PATH_SEEN:$NODE_PATH\"\n",
            json!({}),
            Duration::from_secs(5),
        );

        let outcome = runtime.execute(&invocation).await.map_err(|e| e.to_string())?;
        match outcome {
            ScriptOutcome::Completed(done) => {
                assert_eq!(done.stdout.trim(), "PATH_SEEN:/opt/sdk/node_modules");
                Ok(())
            }
            ScriptOutcome::TimedOut { .. } => Err("unexpected timeout".to_string()),
        }
    }

    #[tokio::test]
    async fn missing_runtime_is_an_error_and_leaves_no_script() -> Result<(), String> {
        let dir = tempfile::tempdir().map_err(|e| e.to_string())?;
        let runtime = ScriptRuntime::new("definitely-not-a-runtime-binary")
            .with_script_dir(Some(dir.path().to_path_buf()));
        let invocation =
            ScriptInvocation::new("missing", "", json!({}), Duration::from_secs(1));

        assert!(runtime.execute(&invocation).await.is_err());
        assert_eq!(leftover_files(&dir), 0);
        Ok(())
    }
}
