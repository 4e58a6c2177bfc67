#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use super::action::CliAction;
use super::args::{ensure_no_unknown_flags, split_global_args};
use super::commands::{allowed_flags, CliCommand, COMMAND_NAMES};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CliError {
    #[error("Missing required argument: {}", arg)]
    MissingRequiredArg { arg: String },
    #[error("Unknown command: {}", cmd)]
    UnknownCommand { cmd: String },
    #[error("Unknown flag: {}", flag)]
    UnknownFlag { flag: String },
    #[error("Invalid argument value for {}: {}", arg, error)]
    InvalidArgValue { arg: String, error: String },
}

/// # Errors
/// Returns `CliError` for unknown commands or flags and missing or malformed
/// argument values.
pub fn parse_cli_args(args: &[String]) -> Result<CliAction, CliError> {
    let (overrides, args) = split_global_args(args)?;

    if args
        .get(1)
        .is_some_and(|arg| matches!(arg.as_str(), "-h" | "--help"))
    {
        return Ok(CliAction::ShowHelp);
    }

    let command = match args.first().map(String::as_str) {
        None | Some("-h" | "--help") => return Ok(CliAction::ShowHelp),
        Some("-v" | "-V" | "--version") => return Ok(CliAction::ShowVersion),
        Some(name) if !COMMAND_NAMES.contains(&name) && name != "?" => {
            return Err(CliError::UnknownCommand {
                cmd: name.to_string(),
            });
        }
        Some(name) => {
            ensure_no_unknown_flags(&args, allowed_flags(name))?;
            parse_command(name, &args)?
        }
    };

    Ok(CliAction::Command { overrides, command })
}

fn parse_command(name: &str, args: &[String]) -> Result<CliCommand, CliError> {
    match name {
        "?" | "help" => Ok(CliCommand::Help),
        "capabilities" => Ok(CliCommand::Capabilities),
        "address" => Ok(CliCommand::Address),
        "balance" => Ok(CliCommand::Balance {
            address: parse_optional_arg(args, "address")?,
        }),
        "connect" => Ok(CliCommand::Connect),
        "create-task" => Ok(CliCommand::CreateTask {
            task_id: parse_required_arg(args, "task_id")?,
            service_agent: parse_required_arg(args, "service_agent")?,
            amount: parse_required_arg(args, "amount")?,
            deadline_seconds: parse_required_arg(args, "deadline_seconds")?,
            description: parse_required_arg(args, "description")?,
        }),
        "complete-task" => Ok(CliCommand::CompleteTask {
            task_object_id: parse_required_arg(args, "task_object_id")?,
        }),
        "cancel-task" => Ok(CliCommand::CancelTask {
            task_id: parse_required_arg(args, "task_id")?,
        }),
        "task-info" => Ok(CliCommand::TaskInfo {
            task_agent: parse_optional_arg(args, "task_agent")?,
            task_id: parse_required_arg(args, "task_id")?,
        }),
        "task-stats" => Ok(CliCommand::TaskStats {
            task_agent: parse_optional_arg(args, "task_agent")?,
        }),
        "task-expired" => Ok(CliCommand::TaskExpired {
            task_agent: parse_optional_arg(args, "task_agent")?,
            task_id: parse_required_arg(args, "task_id")?,
        }),
        "sign" => Ok(CliCommand::Sign {
            message: parse_required_arg(args, "message")?,
        }),
        "verify-signature" => Ok(CliCommand::VerifySignature {
            message: parse_required_arg(args, "message")?,
            signature: parse_required_arg(args, "signature")?,
            public_key: parse_optional_arg(args, "public_key")?,
        }),
        "faucet" => Ok(CliCommand::Faucet {
            address: parse_optional_arg(args, "address")?,
            amount: parse_optional_arg(args, "amount")?,
        }),
        "ensure-balance" => Ok(CliCommand::EnsureBalance {
            min_balance: parse_optional_arg(args, "min_balance")?,
            amount: parse_optional_arg(args, "amount")?,
        }),
        "smoke" => Ok(CliCommand::Smoke {
            text: parse_optional_arg(args, "text")?.unwrap_or(false),
        }),
        cmd => Err(CliError::UnknownCommand {
            cmd: cmd.to_string(),
        }),
    }
}

fn parse_required_arg<T>(args: &[String], name: &str) -> Result<T, CliError>
where
    T: std::str::FromStr + 'static,
    T::Err: std::fmt::Display,
{
    parse_optional_arg(args, name)?.ok_or_else(|| CliError::MissingRequiredArg {
        arg: name.to_string(),
    })
}

/// Reads `--name value` or `--name=value`. A separate value may not start
/// with `--`; such values need the `=` form.
fn parse_optional_arg<T>(args: &[String], name: &str) -> Result<Option<T>, CliError>
where
    T: std::str::FromStr + 'static,
    T::Err: std::fmt::Display,
{
    let flag = format!("--{}", name.replace('_', "-"));
    let inline_prefix = format!("{flag}=");
    let found = args.iter().enumerate().find_map(|(i, arg)| {
        if arg.as_str() == flag {
            Some((i, None))
        } else {
            arg.strip_prefix(inline_prefix.as_str())
                .map(|value| (i, Some(value)))
        }
    });

    match found {
        None => Ok(None),
        Some((_, Some(inline))) => parse_value(name, inline).map(Some),
        Some((i, None)) => {
            let maybe_value = args.get(i + 1);
            let treat_as_boolean_flag = std::any::TypeId::of::<T>()
                == std::any::TypeId::of::<bool>()
                && maybe_value.is_none_or(|v| v.starts_with("--"));

            if treat_as_boolean_flag {
                return parse_value(name, "true").map(Some);
            }

            match maybe_value {
                Some(v) if !v.starts_with("--") => parse_value(name, v).map(Some),
                _ => Err(CliError::MissingRequiredArg {
                    arg: name.to_string(),
                }),
            }
        }
    }
}

fn parse_value<T>(name: &str, raw: &str) -> Result<T, CliError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| CliError::InvalidArgValue {
        arg: name.to_string(),
        error: format!("{e}"),
    })
}
