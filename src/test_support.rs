//! Fixtures shared by unit tests: a fake SDK executable and an in-memory
//! `ChainClient`.

use crate::client::{BridgeFuture, ChainClient};
use crate::config::{env, ChainSettings, ConfigOverrides, PrivateKey};
use crate::runtime::ScriptRuntime;
use crate::signature::serialize_for_tests;
use crate::types::{
    Address, BaseUnits, CreateTaskRequest, ObjectId, OperationResult, QueryOutcome,
    SignedMessage,
};
use ed25519_dalek::SigningKey;
use std::collections::{BTreeMap, VecDeque};
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::TempDir;

pub const TEST_PRIVATE_KEY: &str = "abcdef0123456789";

pub fn settings_from_env(pairs: &[(&str, &str)]) -> Result<ChainSettings, String> {
    let mut environment: BTreeMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    environment
        .entry(env::TASK_AGENT_PRIVATE_KEY.to_string())
        .or_insert_with(|| TEST_PRIVATE_KEY.to_string());
    ChainSettings::resolve(&ConfigOverrides::default(), &environment).map_err(|e| e.to_string())
}

#[cfg(unix)]
/// Executable standing in for `node`: records the stdin payload and prints
/// canned lines.
pub struct FakeSdk {
    dir: TempDir,
}

#[cfg(unix)]
impl FakeSdk {
    pub fn new(stdout_lines: &[&str], exit_code: i32) -> Result<Self, String> {
        let printed: String = stdout_lines
            .iter()
            .map(|line| format!("echo '{line}'\n"))
            .collect();
        Self::with_body(&format!("{printed}exit {exit_code}\n"))
    }

    pub fn failing(stderr: &str) -> Result<Self, String> {
        Self::with_body(&format!("echo '{stderr}' >&2\nexit 1\n"))
    }

    /// Reads the payload, then sleeps for `seconds` without printing.
    pub fn stalled(seconds: u64) -> Result<Self, String> {
        Self::with_body(&format!("sleep {seconds}\nexit 0\n"))
    }

    fn with_body(body: &str) -> Result<Self, String> {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().map_err(|e| e.to_string())?;
        std::fs::create_dir(dir.path().join("scripts")).map_err(|e| e.to_string())?;
        let payload_path = dir.path().join("payload.json");
        let program = dir.path().join("fake-sdk");
        let script = format!(
            "#!/bin/sh\ncat > '{}'\n{body}",
            payload_path.display()
        );
        std::fs::write(&program, script).map_err(|e| e.to_string())?;
        std::fs::set_permissions(&program, std::fs::Permissions::from_mode(0o755))
            .map_err(|e| e.to_string())?;
        Ok(Self { dir })
    }

    pub fn runtime(&self) -> ScriptRuntime {
        ScriptRuntime::new(self.dir.path().join("fake-sdk").display().to_string())
            .with_script_dir(Some(self.scripts_dir()))
    }

    fn scripts_dir(&self) -> PathBuf {
        self.dir.path().join("scripts")
    }

    pub fn received_payload(&self) -> Result<serde_json::Value, String> {
        let raw = std::fs::read_to_string(self.dir.path().join("payload.json"))
            .map_err(|e| e.to_string())?;
        serde_json::from_str(&raw).map_err(|e| e.to_string())
    }

    pub fn leftover_scripts(&self) -> Result<usize, String> {
        std::fs::read_dir(self.scripts_dir())
            .map(Iterator::count)
            .map_err(|e| e.to_string())
    }
}

#[cfg(unix)]
pub fn fake_settings(sdk: &FakeSdk) -> Result<ChainSettings, String> {
    settings_from_env(&[(env::SERVICE_AGENT_PRIVATE_KEY, "fedcba9876543210")])
        .map(|settings| settings.with_runtime(sdk.runtime()))
}

/// In-memory chain. Balance reads pop queued values; the last one repeats.
pub struct FakeChainClient {
    address: QueryOutcome<String>,
    connection: QueryOutcome<String>,
    balances: Mutex<VecDeque<QueryOutcome<BaseUnits>>>,
    create: OperationResult,
    complete: OperationResult,
    signing_key: SigningKey,
    calls: Mutex<Vec<&'static str>>,
}

impl FakeChainClient {
    pub fn healthy(address: &str) -> Self {
        Self {
            address: QueryOutcome::Ok {
                value: address.to_string(),
            },
            connection: QueryOutcome::Ok {
                value: "4c78adac".to_string(),
            },
            balances: Mutex::new(VecDeque::from([QueryOutcome::Ok {
                value: BaseUnits(1_000_000_000),
            }])),
            create: OperationResult::succeeded(Some("CreateDigest".to_string()))
                .with_task_object_id(Some("0xfeed".to_string())),
            complete: OperationResult::succeeded(Some("CompleteDigest".to_string()))
                .with_task_completed(true),
            signing_key: SigningKey::from_bytes(&[7_u8; 32]),
            calls: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn with_address(mut self, address: QueryOutcome<String>) -> Self {
        self.address = address;
        self
    }

    #[must_use]
    pub fn with_connection(mut self, connection: QueryOutcome<String>) -> Self {
        self.connection = connection;
        self
    }

    #[must_use]
    pub fn with_balances(self, balances: Vec<QueryOutcome<BaseUnits>>) -> Self {
        Self {
            balances: Mutex::new(balances.into()),
            ..self
        }
    }

    #[must_use]
    pub fn with_create(mut self, create: OperationResult) -> Self {
        self.create = create;
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    fn record(&self, call: &'static str) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    fn next_balance(&self) -> QueryOutcome<BaseUnits> {
        let Ok(mut balances) = self.balances.lock() else {
            return QueryOutcome::failed(crate::types::FailureKind::Internal, "poisoned");
        };
        if balances.len() > 1 {
            balances.pop_front().unwrap_or(QueryOutcome::Ok { value: BaseUnits(0) })
        } else {
            balances
                .front()
                .cloned()
                .unwrap_or(QueryOutcome::Ok { value: BaseUnits(0) })
        }
    }
}

impl ChainClient for FakeChainClient {
    fn derive_address<'a>(
        &'a self,
        _settings: &'a ChainSettings,
    ) -> BridgeFuture<'a, QueryOutcome<String>> {
        self.record("derive_address");
        Box::pin(async move { self.address.clone() })
    }

    fn balance<'a>(
        &'a self,
        _settings: &'a ChainSettings,
        _owner: &'a Address,
    ) -> BridgeFuture<'a, QueryOutcome<BaseUnits>> {
        self.record("balance");
        Box::pin(async move { self.next_balance() })
    }

    fn check_connection<'a>(
        &'a self,
        _settings: &'a ChainSettings,
    ) -> BridgeFuture<'a, QueryOutcome<String>> {
        self.record("check_connection");
        Box::pin(async move { self.connection.clone() })
    }

    fn create_task<'a>(
        &'a self,
        _settings: &'a ChainSettings,
        _request: &'a CreateTaskRequest,
    ) -> BridgeFuture<'a, OperationResult> {
        self.record("create_task");
        Box::pin(async move { self.create.clone() })
    }

    fn complete_task<'a>(
        &'a self,
        _settings: &'a ChainSettings,
        _signer: &'a PrivateKey,
        task_object_id: &'a ObjectId,
    ) -> BridgeFuture<'a, OperationResult> {
        self.record("complete_task");
        Box::pin(async move {
            self.complete
                .clone()
                .with_task_object_id(Some(task_object_id.to_string()))
        })
    }

    fn sign_message<'a>(
        &'a self,
        _settings: &'a ChainSettings,
        message: &'a str,
    ) -> BridgeFuture<'a, QueryOutcome<SignedMessage>> {
        self.record("sign_message");
        Box::pin(async move {
            QueryOutcome::Ok {
                value: SignedMessage {
                    message: message.to_string(),
                    signature: serialize_for_tests(&self.signing_key, message),
                    public_key: Some(hex::encode(self.signing_key.verifying_key().as_bytes())),
                },
            }
        })
    }
}
