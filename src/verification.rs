#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

//! End-to-end smoke run against a configured chain.
//!
//! Steps run in order and never abort the run; each records whether it
//! passed, failed or was skipped.

use crate::client::ChainClient;
use crate::config::{env, Chain, ChainConfig, EnvSource};
use crate::signature::{verify_personal_message, SignatureManager};
use crate::task_manager::TaskManager;
use crate::types::{
    Address, BaseUnits, CreateTaskRequest, Description, ObjectId, TaskId, TaskOperation,
    MOCK_PAY_AMOUNT,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::time::Duration;
use tracing::info;

pub const SMOKE_MESSAGE: &str = "Hello SUI Blockchain!";
const ROUND_TRIP_DEADLINE_SECS: u64 = 86_400;
/// Deployment ids must be set explicitly; the built-in defaults may not match the keys in use.
const DEPLOYMENT_VARIABLES: [&str; 2] = [env::TASK_MANAGER_PACKAGE_ID, env::TASK_MANAGER_ID];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepStatus {
    Passed { detail: String },
    Failed { reason: String },
    Skipped { reason: String },
}

impl StepStatus {
    fn passed(detail: impl Into<String>) -> Self {
        Self::Passed {
            detail: detail.into(),
        }
    }

    fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }

    fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }

    const fn label(&self) -> &'static str {
        match self {
            Self::Passed { .. } => "PASS",
            Self::Failed { .. } => "FAIL",
            Self::Skipped { .. } => "SKIP",
        }
    }

    fn text(&self) -> &str {
        match self {
            Self::Passed { detail } => detail,
            Self::Failed { reason } | Self::Skipped { reason } => reason,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmokeStep {
    pub name: String,
    #[serde(flatten)]
    pub status: StepStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmokeReport {
    pub chain: Chain,
    pub network: String,
    pub steps: Vec<SmokeStep>,
}

impl SmokeReport {
    #[must_use]
    pub fn passed(&self) -> bool {
        !self
            .steps
            .iter()
            .any(|step| matches!(step.status, StepStatus::Failed { .. }))
    }

    #[must_use]
    pub fn step(&self, name: &str) -> Option<&StepStatus> {
        self.steps
            .iter()
            .find(|step| step.name == name)
            .map(|step| &step.status)
    }

    fn record(&mut self, name: &str, status: StepStatus) {
        info!(step = name, result = status.label(), detail = status.text(), "smoke step");
        self.steps.push(SmokeStep {
            name: name.to_string(),
            status,
        });
    }

    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = format!("Smoke run on {} ({})\n", self.chain, self.network);
        for step in &self.steps {
            let _ = writeln!(
                out,
                "  [{}] {:<16} {}",
                step.status.label(),
                step.name,
                step.status.text()
            );
        }
        let failed = self
            .steps
            .iter()
            .filter(|step| matches!(step.status, StepStatus::Failed { .. }))
            .count();
        let _ = write!(
            out,
            "{} steps, {failed} failed: {}",
            self.steps.len(),
            if failed == 0 { "OK" } else { "FAILED" }
        );
        out
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SmokeOptions {
    /// Wait between creating and completing the round-trip task.
    pub confirmation_delay: Duration,
}

impl Default for SmokeOptions {
    fn default() -> Self {
        Self {
            confirmation_delay: Duration::from_secs(5),
        }
    }
}

pub async fn run_smoke<C: ChainClient + ?Sized>(
    config: &ChainConfig,
    client: &C,
    source: &impl EnvSource,
    options: SmokeOptions,
) -> SmokeReport {
    let settings = config.settings();
    let mut report = SmokeReport {
        chain: config.chain(),
        network: settings.network().to_string(),
        steps: Vec::new(),
    };

    report.record("config", StepStatus::passed(config.to_string()));
    report.record(
        "address",
        if config.account().is_authoritative() {
            StepStatus::passed(config.address().to_string())
        } else {
            StepStatus::failed(format!(
                "{}; the SDK could not derive the address",
                config.account()
            ))
        },
    );

    let connection = client.check_connection(settings).await;
    report.record(
        "connection",
        match connection.into_result() {
            Ok(chain_id) => StepStatus::passed(format!("chain id {chain_id}")),
            Err(failure) => StepStatus::failed(failure.message),
        },
    );

    let balance = client.balance(settings, config.address()).await;
    report.record(
        "balance",
        match balance.into_result() {
            Ok(units) => StepStatus::passed(format!(
                "{units} {} ({} {})",
                config.chain().base_unit(),
                units.to_whole_tokens(config.chain().decimals()),
                config.chain().token_symbol()
            )),
            Err(failure) => StepStatus::failed(failure.message),
        },
    );

    let tasks = TaskManager::new(config, client);
    report.record("mock_operations", check_mock_operations(&tasks, config.address()));
    report.record("sign_message", check_signing(config, client).await);

    match round_trip_blocker(config, source) {
        None => run_round_trip(&mut report, &tasks, config, source, options).await,
        Some(reason) => {
            report.record("create_task", StepStatus::skipped(reason.clone()));
            report.record("complete_task", StepStatus::skipped(reason));
        }
    }

    report
}

/// Why the create/complete round cannot run, if anything prevents it. The
/// task agent key is always present once settings resolved.
fn round_trip_blocker(config: &ChainConfig, source: &impl EnvSource) -> Option<String> {
    if config.chain() != Chain::Sui {
        return Some(format!("task transactions are not available on {}", config.chain()));
    }
    let mut missing = Vec::new();
    if config.settings().service_agent_key().is_none() {
        missing.push(env::SERVICE_AGENT_PRIVATE_KEY);
    }
    missing.extend(
        DEPLOYMENT_VARIABLES
            .iter()
            .copied()
            .filter(|name| source.non_empty(name).is_none()),
    );
    (!missing.is_empty()).then(|| format!("missing {}", missing.join(", ")))
}

fn check_mock_operations<C: ChainClient + ?Sized>(
    tasks: &TaskManager<'_, C>,
    agent: &Address,
) -> StepStatus {
    let Ok(task_id) = TaskId::parse("smoke_task_001") else {
        return StepStatus::failed("could not build smoke task id");
    };
    let cancel = tasks.cancel_task(&task_id);
    let info = tasks.task_info(agent, &task_id);
    let stats = tasks.task_stats(agent);
    let expiry = tasks.is_task_expired(agent, &task_id);

    let all_mock = [
        TaskOperation::CancelTask,
        TaskOperation::TaskInfo,
        TaskOperation::TaskStats,
        TaskOperation::IsTaskExpired,
    ]
    .iter()
    .all(|operation| tasks.capability(*operation).is_mock());

    if all_mock && cancel.success && info.pay_amount == MOCK_PAY_AMOUNT && !expiry.expired {
        StepStatus::passed(format!(
            "4 mock operations answered (stats {}/{}/{})",
            stats.total_tasks, stats.completed_tasks, stats.cancelled_tasks
        ))
    } else {
        StepStatus::failed("mock operations returned unexpected payloads")
    }
}

async fn check_signing<C: ChainClient + ?Sized>(config: &ChainConfig, client: &C) -> StepStatus {
    if config.chain() != Chain::Sui {
        return StepStatus::skipped(format!("message signing is not available on {}", config.chain()));
    }
    let signer = SignatureManager::new(config, client);
    let signed = match signer.sign_message(SMOKE_MESSAGE).await {
        Ok(outcome) => match outcome.into_result() {
            Ok(signed) => signed,
            Err(failure) => return StepStatus::failed(failure.message),
        },
        Err(err) => return StepStatus::failed(err.to_string()),
    };
    match verify_personal_message(SMOKE_MESSAGE, &signed.signature, signed.public_key.as_deref()) {
        Ok(true) => StepStatus::passed("signature verified locally"),
        Ok(false) => StepStatus::failed("signature did not verify"),
        Err(err) => StepStatus::failed(err.to_string()),
    }
}

async fn run_round_trip<C: ChainClient + ?Sized>(
    report: &mut SmokeReport,
    tasks: &TaskManager<'_, C>,
    config: &ChainConfig,
    source: &impl EnvSource,
    options: SmokeOptions,
) {
    let request = match round_trip_request(source) {
        Ok(request) => request,
        Err(reason) => {
            report.record("create_task", StepStatus::failed(reason));
            report.record("complete_task", StepStatus::skipped("create_task did not run"));
            return;
        }
    };

    let created = match tasks.create_task(&request).await {
        Ok(result) => result,
        Err(err) => {
            report.record("create_task", StepStatus::failed(err.to_string()));
            report.record("complete_task", StepStatus::skipped("create_task failed"));
            return;
        }
    };
    if let Some(failure) = created.error {
        report.record("create_task", StepStatus::failed(failure.message));
        report.record("complete_task", StepStatus::skipped("create_task failed"));
        return;
    }
    report.record(
        "create_task",
        StepStatus::passed(format!(
            "tx {}",
            created.explorer_url.as_deref().or(created.tx_hash.as_deref()).unwrap_or("-")
        )),
    );

    let Some(task_object_id) = created
        .task_object_id
        .as_deref()
        .and_then(|raw| ObjectId::parse(raw).ok())
    else {
        report.record("complete_task", StepStatus::skipped("no task object id reported"));
        return;
    };

    tokio::time::sleep(options.confirmation_delay).await;
    let completed = tasks.complete_task(&task_object_id).await;
    report.record(
        "complete_task",
        match completed.error {
            None => StepStatus::passed(format!(
                "tx {} on {}",
                completed.tx_hash.as_deref().unwrap_or("-"),
                config.chain()
            )),
            Some(failure) => StepStatus::failed(failure.message),
        },
    );
}

fn round_trip_request(source: &impl EnvSource) -> Result<CreateTaskRequest, String> {
    let task_id = format!("smoke_task_{}", Utc::now().timestamp());
    let service_agent = match source.non_empty(env::SERVICE_AGENT_ADDRESS) {
        Some(raw) => Address::parse(&raw).map_err(|e| e.to_string())?,
        None => Address::zero(),
    };
    Ok(CreateTaskRequest {
        description: Description::parse(&format!("bridge smoke test task - {task_id}"))
            .map_err(|e| e.to_string())?,
        task_id: TaskId::parse(&task_id).map_err(|e| e.to_string())?,
        service_agent,
        amount: BaseUnits::from(MOCK_PAY_AMOUNT),
        deadline_seconds: ROUND_TRIP_DEADLINE_SECS,
    })
}

#[cfg(test)]
mod tests {
    use super::{run_smoke, SmokeOptions, StepStatus};
    use crate::config::{env, AccountAddress, ChainConfig, ChainSettings, ConfigOverrides};
    use crate::test_support::{settings_from_env, FakeChainClient};
    use crate::types::{Address, FailureKind, QueryOutcome};
    use std::collections::BTreeMap;
    use std::time::Duration;

    fn options() -> SmokeOptions {
        SmokeOptions {
            confirmation_delay: Duration::ZERO,
        }
    }

    fn env_of(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    const ROUND_TRIP_ENV: [(&str, &str); 4] = [
        (env::TASK_AGENT_PRIVATE_KEY, "abcdef0123456789"),
        (env::SERVICE_AGENT_PRIVATE_KEY, "fedcba9876543210"),
        (env::TASK_MANAGER_PACKAGE_ID, "0xabc"),
        (env::TASK_MANAGER_ID, "0xdef"),
    ];

    #[tokio::test]
    async fn healthy_chain_without_round_trip_variables_skips_transactions() -> Result<(), String> {
        let client = FakeChainClient::healthy("0x1");
        let config = ChainConfig::load(settings_from_env(&[])?, &client).await;
        let report = run_smoke(&config, &client, &env_of(&[]), options()).await;

        assert!(report.passed(), "{}", report.render_text());
        assert!(matches!(report.step("sign_message"), Some(StepStatus::Passed { .. })));
        assert!(matches!(report.step("create_task"), Some(StepStatus::Skipped { .. })));
        assert!(!client.calls().contains(&"create_task"));
        Ok(())
    }

    #[tokio::test]
    async fn full_round_trip_creates_then_completes() -> Result<(), String> {
        let client = FakeChainClient::healthy("0x1");
        let config = ChainConfig::load(settings_from_env(&ROUND_TRIP_ENV)?, &client).await;
        let report = run_smoke(&config, &client, &env_of(&ROUND_TRIP_ENV), options()).await;

        assert!(report.passed(), "{}", report.render_text());
        assert!(matches!(report.step("create_task"), Some(StepStatus::Passed { .. })));
        assert!(matches!(report.step("complete_task"), Some(StepStatus::Passed { .. })));
        let calls = client.calls();
        let create = calls.iter().position(|c| *c == "create_task");
        let complete = calls.iter().position(|c| *c == "complete_task");
        assert!(create.is_some() && create < complete);
        Ok(())
    }

    #[tokio::test]
    async fn key_from_override_is_enough_for_round_trip() -> Result<(), String> {
        let environment = env_of(&ROUND_TRIP_ENV[1..]);
        let overrides = ConfigOverrides {
            private_key: Some("abcdef0123456789".to_string()),
            ..ConfigOverrides::default()
        };
        let settings =
            ChainSettings::resolve(&overrides, &environment).map_err(|e| e.to_string())?;
        let client = FakeChainClient::healthy("0x1");
        let config = ChainConfig::load(settings, &client).await;
        let report = run_smoke(&config, &client, &environment, options()).await;

        assert!(matches!(report.step("create_task"), Some(StepStatus::Passed { .. })));
        assert!(matches!(report.step("complete_task"), Some(StepStatus::Passed { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn aptos_skips_task_round_trip() -> Result<(), String> {
        let mut pairs = ROUND_TRIP_ENV.to_vec();
        pairs.extend([(env::CHAIN, "aptos"), (env::APTOS_PRIVATE_KEY, "abcdef0123456789")]);
        let client = FakeChainClient::healthy("0x1");
        let config = ChainConfig::load(settings_from_env(&pairs)?, &client).await;
        let report = run_smoke(&config, &client, &env_of(&pairs), options()).await;

        assert!(report.passed(), "{}", report.render_text());
        assert!(matches!(report.step("create_task"), Some(StepStatus::Skipped { .. })));
        assert!(matches!(report.step("complete_task"), Some(StepStatus::Skipped { .. })));
        assert!(!client.calls().contains(&"create_task"));
        Ok(())
    }

    #[tokio::test]
    async fn failures_are_recorded_without_aborting() -> Result<(), String> {
        let client = FakeChainClient::healthy("0x1")
            .with_connection(QueryOutcome::failed(FailureKind::Execution, "fetch failed"));
        let config = ChainConfig::with_address(
            settings_from_env(&[])?,
            AccountAddress::Placeholder(Address::parse("0x99").map_err(|e| e.to_string())?),
        );
        let report = run_smoke(&config, &client, &env_of(&[]), options()).await;

        assert!(!report.passed());
        assert!(matches!(report.step("address"), Some(StepStatus::Failed { .. })));
        assert!(matches!(report.step("connection"), Some(StepStatus::Failed { .. })));
        assert!(matches!(report.step("sign_message"), Some(StepStatus::Failed { .. })));
        assert!(matches!(report.step("mock_operations"), Some(StepStatus::Passed { .. })));
        assert!(report.render_text().ends_with("FAILED"));
        Ok(())
    }
}
