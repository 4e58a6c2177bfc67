#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use super::action::CliAction;
use super::args::suggest_commands;
use super::commands::{CliCommand, HELP_TEXT};
use super::parser::{parse_cli_args, CliError};
use crate::client::ChainClient;
use crate::config::{env, ChainConfig, ChainSettings, ConfigOverrides, EnvSource};
use crate::envelope::{new_request_id, Envelope};
use crate::error::{code, BridgeError, Result};
use crate::faucet::{
    ensure_sufficient_balance, FaucetClient, FaucetOutcome, FundingPolicy, DEFAULT_FUND_AMOUNT,
};
use crate::signature::{verify_personal_message, SignatureManager};
use crate::task_manager::TaskManager;
use crate::types::{
    BaseUnits, CreateTaskRequest, FailureKind, OperationFailure, OperationResult, TaskOperation,
};
use crate::verification::{run_smoke, SmokeOptions};
use serde_json::{json, Value};
use std::time::Instant;
use tracing::debug;

/// Exit status for malformed command lines.
pub const CLI_EXIT_CODE: i32 = 1;

/// What a command produced. A `failure` means the command ran but its
/// remote part did not succeed.
#[derive(Debug)]
pub struct CommandOutput {
    pub data: Value,
    pub failure: Option<OperationFailure>,
    pub text: Option<String>,
}

impl CommandOutput {
    const fn data(data: Value) -> Self {
        Self {
            data,
            failure: None,
            text: None,
        }
    }

    fn with_failure(mut self, failure: Option<OperationFailure>) -> Self {
        self.failure = failure;
        self
    }

    fn operation(result: &OperationResult) -> Result<Self> {
        Ok(Self::data(serde_json::to_value(result)?).with_failure(result.error.clone()))
    }
}

const fn failure_code(failure: &OperationFailure) -> (&'static str, i32) {
    match failure.kind {
        FailureKind::Timeout => (code::TIMEOUT, 5),
        FailureKind::Execution => (code::REMOTE, 6),
        FailureKind::Internal => (code::INTERNAL, 9),
    }
}

/// Parses `args`, runs the command and renders stdout. Returns the text to
/// print and the process exit code.
pub async fn run_cli<C: ChainClient + ?Sized>(
    args: &[String],
    source: &impl EnvSource,
    client: &C,
) -> (String, i32) {
    let rid = new_request_id();
    let start = Instant::now();

    let (overrides, command) = match parse_cli_args(args) {
        Ok(CliAction::ShowHelp) => return (HELP_TEXT.to_string(), 0),
        Ok(CliAction::ShowVersion) => {
            return (format!("bridge {}", env!("CARGO_PKG_VERSION")), 0);
        }
        Ok(CliAction::Command { overrides, command }) => (overrides, command),
        Err(err) => return (render(&cli_error_envelope(rid, &err)), CLI_EXIT_CODE),
    };

    let result = execute(&overrides, command, source, client).await;
    let ms = i64::try_from(start.elapsed().as_millis()).unwrap_or(i64::MAX);

    match result {
        Ok(CommandOutput {
            text: Some(text),
            failure,
            ..
        }) => (text, failure.as_ref().map_or(0, |f| failure_code(f).1)),
        Ok(CommandOutput {
            data,
            failure: None,
            ..
        }) => (render(&Envelope::success(rid, data).with_ms(ms)), 0),
        Ok(CommandOutput {
            data,
            failure: Some(failure),
            ..
        }) => {
            let (error_code, exit_code) = failure_code(&failure);
            let envelope = Envelope::unsuccessful(rid, data, error_code, failure.message);
            (render(&envelope.with_ms(ms)), exit_code)
        }
        Err(err) => {
            debug!(error = %err, "command failed");
            (
                render(&Envelope::from_error(rid, &err).with_ms(ms)),
                err.exit_code(),
            )
        }
    }
}

fn cli_error_envelope(rid: String, err: &CliError) -> Envelope {
    let envelope = Envelope::error(rid, code::CLI_ERROR, err.to_string());
    let suggestion = match err {
        CliError::UnknownCommand { cmd } => suggest_commands(cmd).into_iter().next(),
        _ => None,
    };
    match suggestion {
        Some(cmd) => envelope.with_fix(format!("Did you mean '{cmd}'?")),
        None => envelope.with_fix("Run 'bridge help' for valid options".to_string()),
    }
}

fn render(envelope: &Envelope) -> String {
    serde_json::to_string(envelope).unwrap_or_else(|e| {
        format!(r#"{{"ok":false,"err":{{"code":"INTERNAL","msg":"{e}"}}}}"#)
    })
}

/// Runs one parsed command.
///
/// # Errors
/// Returns `BridgeError` for configuration problems, invalid input and
/// refusals such as placeholder addresses. Remote failures are reported in
/// `CommandOutput::failure` instead.
pub async fn execute<C: ChainClient + ?Sized>(
    overrides: &ConfigOverrides,
    command: CliCommand,
    source: &impl EnvSource,
    client: &C,
) -> Result<CommandOutput> {
    match command {
        CliCommand::Help => Ok(CommandOutput {
            text: Some(HELP_TEXT.to_string()),
            ..CommandOutput::data(Value::Null)
        }),
        CliCommand::Capabilities => Ok(CommandOutput::data(Value::Array(
            TaskOperation::ALL
                .iter()
                .map(|op| json!({ "operation": op.as_str(), "capability": op.capability() }))
                .collect(),
        ))),
        CliCommand::VerifySignature {
            message,
            signature,
            public_key,
        } => {
            let valid = verify_personal_message(&message, &signature, public_key.as_deref())?;
            let failure = (!valid).then(|| {
                OperationFailure::new(FailureKind::Execution, "signature does not verify")
            });
            Ok(CommandOutput::data(json!({ "valid": valid })).with_failure(failure))
        }
        CliCommand::Connect => {
            let settings = ChainSettings::resolve(overrides, source)?;
            let outcome = client.check_connection(&settings).await;
            let failure = outcome.failure().cloned();
            Ok(CommandOutput::data(json!({
                "chain": settings.chain(),
                "network": settings.network(),
                "connected": failure.is_none(),
                "chain_id": outcome.ok(),
            }))
            .with_failure(failure))
        }
        command => {
            let settings = ChainSettings::resolve(overrides, source)?;
            let config = ChainConfig::load(settings, client).await;
            execute_with_config(command, &config, source, client).await
        }
    }
}

async fn execute_with_config<C: ChainClient + ?Sized>(
    command: CliCommand,
    config: &ChainConfig,
    source: &impl EnvSource,
    client: &C,
) -> Result<CommandOutput> {
    let tasks = TaskManager::new(config, client);
    let agent_or_self = |agent: Option<crate::types::Address>| {
        agent.unwrap_or_else(|| config.address().clone())
    };

    match command {
        CliCommand::Address => {
            let failure = (!config.account().is_authoritative()).then(|| {
                OperationFailure::new(
                    FailureKind::Execution,
                    "address derivation failed; reporting a placeholder address",
                )
            });
            Ok(CommandOutput::data(json!({
                "chain": config.chain(),
                "network": config.settings().network(),
                "address": config.address(),
                "authoritative": config.account().is_authoritative(),
            }))
            .with_failure(failure))
        }
        CliCommand::Balance { address } => {
            let owner = agent_or_self(address);
            let outcome = client.balance(config.settings(), &owner).await;
            let failure = outcome.failure().cloned();
            let chain = config.chain();
            Ok(CommandOutput::data(json!({
                "address": owner,
                "balance": outcome.clone().ok().map(|units| units.to_string()),
                "unit": chain.base_unit(),
                "tokens": outcome.ok().map(|units| units.to_whole_tokens(chain.decimals())),
                "symbol": chain.token_symbol(),
            }))
            .with_failure(failure))
        }
        CliCommand::CreateTask {
            task_id,
            service_agent,
            amount,
            deadline_seconds,
            description,
        } => {
            let request = CreateTaskRequest {
                task_id,
                service_agent,
                amount: BaseUnits(amount),
                deadline_seconds,
                description,
            };
            CommandOutput::operation(&tasks.create_task(&request).await?)
        }
        CliCommand::CompleteTask { task_object_id } => {
            CommandOutput::operation(&tasks.complete_task(&task_object_id).await)
        }
        CliCommand::CancelTask { task_id } => Ok(CommandOutput::data(serde_json::to_value(
            tasks.cancel_task(&task_id),
        )?)),
        CliCommand::TaskInfo {
            task_agent,
            task_id,
        } => Ok(CommandOutput::data(serde_json::to_value(
            tasks.task_info(&agent_or_self(task_agent), &task_id),
        )?)),
        CliCommand::TaskStats { task_agent } => Ok(CommandOutput::data(serde_json::to_value(
            tasks.task_stats(&agent_or_self(task_agent)),
        )?)),
        CliCommand::TaskExpired {
            task_agent,
            task_id,
        } => Ok(CommandOutput::data(serde_json::to_value(
            tasks.is_task_expired(&agent_or_self(task_agent), &task_id),
        )?)),
        CliCommand::Sign { message } => {
            let outcome = SignatureManager::new(config, client)
                .sign_message(&message)
                .await?;
            match outcome.into_result() {
                Ok(signed) => {
                    let verified = verify_personal_message(
                        &signed.message,
                        &signed.signature,
                        signed.public_key.as_deref(),
                    )
                    .unwrap_or(false);
                    let mut data = serde_json::to_value(&signed)?;
                    data["verified"] = Value::Bool(verified);
                    Ok(CommandOutput::data(data))
                }
                Err(failure) => Ok(CommandOutput::data(Value::Null).with_failure(Some(failure))),
            }
        }
        CliCommand::Faucet { address, amount } => {
            let faucet = FaucetClient::from_settings(config.settings())?;
            let recipient = match address {
                Some(address) => address,
                None => config.account().require_authoritative()?.clone(),
            };
            let amount = amount.map_or_else(|| BaseUnits::from(DEFAULT_FUND_AMOUNT), BaseUnits);
            let outcome = faucet.request_funds(&recipient, amount).await;
            let failure = match &outcome {
                FaucetOutcome::Funded { .. } => None,
                FaucetOutcome::Rejected { message, .. } | FaucetOutcome::Unreachable { message } => {
                    Some(OperationFailure::new(FailureKind::Execution, message.clone()))
                }
            };
            Ok(CommandOutput::data(json!({
                "address": recipient,
                "amount": amount.to_string(),
                "faucet": outcome,
            }))
            .with_failure(failure))
        }
        CliCommand::EnsureBalance {
            min_balance,
            amount,
        } => {
            let faucet = FaucetClient::from_settings(config.settings())?;
            let defaults = FundingPolicy::default();
            let min_balance = match min_balance {
                Some(value) => BaseUnits(value),
                None => min_balance_from_env(source)?.unwrap_or(defaults.min_balance),
            };
            let policy = FundingPolicy {
                min_balance,
                amount: amount.map_or(defaults.amount, BaseUnits),
                ..defaults
            };
            let check = ensure_sufficient_balance(client, config, &faucet, policy).await?;
            let failure = (!check.sufficient).then(|| {
                OperationFailure::new(
                    FailureKind::Execution,
                    check
                        .detail
                        .clone()
                        .unwrap_or_else(|| "balance is below the minimum".to_string()),
                )
            });
            Ok(CommandOutput::data(serde_json::to_value(&check)?).with_failure(failure))
        }
        CliCommand::Smoke { text } => {
            let report = run_smoke(config, client, source, SmokeOptions::default()).await;
            let failure = (!report.passed()).then(|| {
                OperationFailure::new(FailureKind::Execution, "one or more smoke steps failed")
            });
            Ok(CommandOutput {
                data: serde_json::to_value(&report)?,
                failure,
                text: text.then(|| report.render_text()),
            })
        }
        CliCommand::Help
        | CliCommand::Capabilities
        | CliCommand::VerifySignature { .. }
        | CliCommand::Connect => Err(BridgeError::Internal(
            "command does not need a loaded account".to_string(),
        )),
    }
}

fn min_balance_from_env(source: &impl EnvSource) -> Result<Option<BaseUnits>> {
    source
        .non_empty(env::MIN_BALANCE)
        .map(|raw| {
            raw.parse::<u128>().map(BaseUnits).map_err(|e| {
                BridgeError::ConfigError(format!("Invalid {}={raw}: {e}", env::MIN_BALANCE))
            })
        })
        .transpose()
}
