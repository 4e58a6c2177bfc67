//! Narrow interface to the external chain SDK.
//!
//! `ChainClient` is the only seam through which the crate reaches a chain.
//! The production implementation runs the fixed scripts from
//! [`crate::scripts`] through the configured [`crate::runtime::ScriptRuntime`];
//! tests substitute in-memory clients.

use crate::config::{ChainSettings, PrivateKey};
use crate::diagnostics::{classify_failure_category, redact_diagnostic};
use crate::error::BridgeError;
use crate::parsing::{parse_output, ParsedOutput};
use crate::runtime::{ScriptInvocation, ScriptOutcome};
use crate::scripts::{script_for, ScriptKind, SUI_CLOCK_OBJECT_ID, TASK_GAS_BUDGET};
use crate::types::{
    Address, BaseUnits, CreateTaskRequest, FailureKind, ObjectId, OperationFailure,
    OperationResult, QueryOutcome, SignedMessage,
};
use serde_json::{json, Map, Value};
use std::future::Future;
use std::pin::Pin;
use tracing::{debug, error, info, warn};

pub type BridgeFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Remote capabilities of a chain. Implementations never fail with an
/// error: every failure comes back as a result value.
pub trait ChainClient: Send + Sync {
    fn derive_address<'a>(
        &'a self,
        settings: &'a ChainSettings,
    ) -> BridgeFuture<'a, QueryOutcome<String>>;

    fn balance<'a>(
        &'a self,
        settings: &'a ChainSettings,
        owner: &'a Address,
    ) -> BridgeFuture<'a, QueryOutcome<BaseUnits>>;

    /// Returns the chain identifier when the node answers.
    fn check_connection<'a>(
        &'a self,
        settings: &'a ChainSettings,
    ) -> BridgeFuture<'a, QueryOutcome<String>>;

    fn create_task<'a>(
        &'a self,
        settings: &'a ChainSettings,
        request: &'a CreateTaskRequest,
    ) -> BridgeFuture<'a, OperationResult>;

    fn complete_task<'a>(
        &'a self,
        settings: &'a ChainSettings,
        signer: &'a PrivateKey,
        task_object_id: &'a ObjectId,
    ) -> BridgeFuture<'a, OperationResult>;

    fn sign_message<'a>(
        &'a self,
        settings: &'a ChainSettings,
        message: &'a str,
    ) -> BridgeFuture<'a, QueryOutcome<SignedMessage>>;
}

/// `ChainClient` backed by SDK scripts run in a child process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptChainClient;

impl ScriptChainClient {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

fn base_payload(settings: &ChainSettings) -> Map<String, Value> {
    let mut payload = Map::new();
    payload.insert("network".to_string(), json!(settings.network()));
    payload.insert("node_url".to_string(), json!(settings.node_url()));
    payload
}

fn with_fields(mut payload: Map<String, Value>, fields: Value) -> Value {
    if let Value::Object(extra) = fields {
        payload.extend(extra);
    }
    Value::Object(payload)
}

async fn run_script(
    settings: &ChainSettings,
    kind: ScriptKind,
    payload: Value,
) -> Result<ParsedOutput, OperationFailure> {
    let operation = kind.operation();
    let Some(script) = script_for(settings.chain(), kind) else {
        return Err(OperationFailure::new(
            FailureKind::Internal,
            format!("{operation} is not available on {}", settings.chain()),
        ));
    };

    let timeout = settings.runtime().timeout_for(kind.timeout());
    let invocation = ScriptInvocation::new(operation, script, payload, timeout);
    match settings.runtime().execute(&invocation).await {
        Ok(ScriptOutcome::Completed(done)) => {
            debug!(
                operation,
                exit_code = ?done.exit_code,
                elapsed_ms = u64::try_from(done.elapsed.as_millis()).unwrap_or(u64::MAX),
                "script finished"
            );
            if done.stdout_truncated {
                warn!(operation, "script stdout exceeded capture limit and was truncated");
            }
            if done.stderr_truncated {
                warn!(operation, "script stderr exceeded capture limit and was truncated");
            }
            if done.succeeded() {
                return Ok(parse_output(&done.stdout));
            }
            let diagnostic = redact_diagnostic(&done.diagnostic(), settings.secrets());
            error!(
                operation,
                exit_code = ?done.exit_code,
                category = classify_failure_category(&diagnostic),
                error = %diagnostic,
                "script reported failure"
            );
            Err(OperationFailure::new(FailureKind::Execution, diagnostic))
        }
        Ok(ScriptOutcome::TimedOut { after }) => {
            let timeout = BridgeError::Timeout {
                operation: operation.to_string(),
                seconds: after.as_secs(),
            };
            warn!(operation, seconds = after.as_secs(), "script timed out");
            Err(OperationFailure::new(FailureKind::Timeout, timeout.to_string()))
        }
        Err(err) => {
            let message = redact_diagnostic(&err.to_string(), settings.secrets());
            error!(operation, error = %message, "script could not be executed");
            Err(OperationFailure::new(FailureKind::Internal, message))
        }
    }
}

fn missing_field(operation: &str, field: &str) -> OperationFailure {
    OperationFailure::new(
        FailureKind::Execution,
        format!("{operation} output did not contain {field}"),
    )
}

fn into_query<T>(result: Result<T, OperationFailure>) -> QueryOutcome<T> {
    match result {
        Ok(value) => QueryOutcome::Ok { value },
        Err(failure) => QueryOutcome::Failed { failure },
    }
}

fn into_operation_result(
    result: Result<OperationResult, OperationFailure>,
) -> OperationResult {
    result.unwrap_or_else(|failure| OperationResult::failed(failure.kind, failure.message))
}

impl ChainClient for ScriptChainClient {
    fn derive_address<'a>(
        &'a self,
        settings: &'a ChainSettings,
    ) -> BridgeFuture<'a, QueryOutcome<String>> {
        Box::pin(async move {
            let payload = with_fields(
                base_payload(settings),
                json!({ "private_key": settings.private_key().expose() }),
            );
            let result = run_script(settings, ScriptKind::DeriveAddress, payload)
                .await
                .and_then(|parsed| {
                    parsed
                        .address
                        .ok_or_else(|| missing_field("derive_address", "ADDRESS"))
                });
            into_query(result)
        })
    }

    fn balance<'a>(
        &'a self,
        settings: &'a ChainSettings,
        owner: &'a Address,
    ) -> BridgeFuture<'a, QueryOutcome<BaseUnits>> {
        Box::pin(async move {
            let payload = with_fields(base_payload(settings), json!({ "owner": owner }));
            let result = run_script(settings, ScriptKind::Balance, payload)
                .await
                .and_then(|parsed| match (&parsed.balance, parsed.balance_units()) {
                    (_, Some(units)) => Ok(BaseUnits(units)),
                    (Some(raw), None) => Err(OperationFailure::new(
                        FailureKind::Execution,
                        format!("get_balance returned non-numeric balance '{raw}'"),
                    )),
                    (None, None) => Err(missing_field("get_balance", "BALANCE")),
                });
            into_query(result)
        })
    }

    fn check_connection<'a>(
        &'a self,
        settings: &'a ChainSettings,
    ) -> BridgeFuture<'a, QueryOutcome<String>> {
        Box::pin(async move {
            let payload = Value::Object(base_payload(settings));
            let result = run_script(settings, ScriptKind::CheckConnection, payload)
                .await
                .map(|parsed| parsed.chain_id.unwrap_or_else(|| "unknown".to_string()));
            into_query(result)
        })
    }

    fn create_task<'a>(
        &'a self,
        settings: &'a ChainSettings,
        request: &'a CreateTaskRequest,
    ) -> BridgeFuture<'a, OperationResult> {
        Box::pin(async move {
            let payload = with_fields(
                base_payload(settings),
                json!({
                    "private_key": settings.private_key().expose(),
                    "target": settings.module_function("create_task"),
                    "task_id": request.task_id,
                    "service_agent": request.service_agent,
                    "amount": request.amount.value().to_string(),
                    "deadline_seconds": request.deadline_seconds.to_string(),
                    "description": request.description,
                    "task_manager_id": settings.task_manager_id(),
                    "clock_id": SUI_CLOCK_OBJECT_ID,
                    "gas_budget": TASK_GAS_BUDGET.to_string(),
                }),
            );
            let result = run_script(settings, ScriptKind::CreateTask, payload)
                .await
                .map(|parsed| {
                    let explorer = parsed
                        .tx_hash
                        .as_deref()
                        .map(|hash| settings.explorer_tx_url(hash));
                    match &explorer {
                        Some(url) => info!(
                            task_id = %request.task_id,
                            explorer = %url,
                            "task created"
                        ),
                        None => warn!(
                            task_id = %request.task_id,
                            "create_task succeeded without reporting a transaction hash"
                        ),
                    }
                    OperationResult::succeeded(parsed.tx_hash.clone())
                        .with_task_object_id(parsed.task_object_id().map(str::to_string))
                        .with_explorer_url(explorer)
                });
            into_operation_result(result)
        })
    }

    fn complete_task<'a>(
        &'a self,
        settings: &'a ChainSettings,
        signer: &'a PrivateKey,
        task_object_id: &'a ObjectId,
    ) -> BridgeFuture<'a, OperationResult> {
        Box::pin(async move {
            let payload = with_fields(
                base_payload(settings),
                json!({
                    "private_key": signer.expose(),
                    "target": settings.module_function("complete_task"),
                    "task_object_id": task_object_id,
                    "task_manager_id": settings.task_manager_id(),
                    "clock_id": SUI_CLOCK_OBJECT_ID,
                    "gas_budget": TASK_GAS_BUDGET.to_string(),
                }),
            );
            let result = run_script(settings, ScriptKind::CompleteTask, payload)
                .await
                .map(|parsed| {
                    let explorer = parsed
                        .tx_hash
                        .as_deref()
                        .map(|hash| settings.explorer_tx_url(hash));
                    info!(
                        task_object_id = %task_object_id,
                        explorer = ?explorer,
                        "task completed"
                    );
                    OperationResult::succeeded(parsed.tx_hash.clone())
                        .with_task_object_id(Some(task_object_id.to_string()))
                        .with_task_completed(parsed.task_completed)
                        .with_explorer_url(explorer)
                });
            into_operation_result(result)
        })
    }

    fn sign_message<'a>(
        &'a self,
        settings: &'a ChainSettings,
        message: &'a str,
    ) -> BridgeFuture<'a, QueryOutcome<SignedMessage>> {
        Box::pin(async move {
            let payload = with_fields(
                base_payload(settings),
                json!({
                    "private_key": settings.private_key().expose(),
                    "message": message,
                }),
            );
            let result = run_script(settings, ScriptKind::SignMessage, payload)
                .await
                .and_then(|parsed| {
                    let public_key = parsed.public_key;
                    parsed
                        .signature
                        .map(|signature| SignedMessage {
                            message: message.to_string(),
                            signature,
                            public_key,
                        })
                        .ok_or_else(|| missing_field("sign_message", "SIGNATURE"))
                });
            into_query(result)
        })
    }
}
