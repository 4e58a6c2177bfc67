#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use super::commands::COMMAND_NAMES;
use super::parser::CliError;
use crate::config::ConfigOverrides;

pub const GLOBAL_FLAGS: &[&str] = &["--chain", "--network", "--private-key"];

/// # Errors
/// Returns `CliError::UnknownFlag` if a flag outside `allowed_flags` is found.
pub fn ensure_no_unknown_flags(args: &[String], allowed_flags: &[&str]) -> Result<(), CliError> {
    let invalid = args
        .iter()
        .skip(1)
        .find(|arg| {
            let flag = arg.split_once('=').map_or(arg.as_str(), |(flag, _)| flag);
            arg.starts_with("--")
                && !matches!(flag, "--help" | "-h")
                && !allowed_flags.iter().any(|allowed| *allowed == flag)
        })
        .cloned();

    invalid.map_or(Ok(()), |flag| Err(CliError::UnknownFlag { flag }))
}

/// Removes the global `--chain`, `--network` and `--private-key` flags (either
/// `--flag value` or `--flag=value`) from anywhere in `args`, returning them
/// as overrides plus the remaining args.
///
/// # Errors
/// Returns `CliError::MissingRequiredArg` when a global flag has no value and
/// `CliError::InvalidArgValue` for an unknown chain.
pub fn split_global_args(args: &[String]) -> Result<(ConfigOverrides, Vec<String>), CliError> {
    let mut overrides = ConfigOverrides::default();
    let mut rest = Vec::with_capacity(args.len());
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) if GLOBAL_FLAGS.contains(&flag) => (flag, Some(value)),
            _ => (arg.as_str(), None),
        };
        if !GLOBAL_FLAGS.contains(&flag) {
            rest.push(arg.clone());
            continue;
        }
        let name = flag.trim_start_matches("--").replace('-', "_");
        let value = match inline {
            Some(value) => value.to_string(),
            None => iter
                .next()
                .filter(|value| !value.starts_with("--"))
                .cloned()
                .ok_or_else(|| CliError::MissingRequiredArg { arg: name.clone() })?,
        };
        match flag {
            "--chain" => {
                overrides.chain = Some(value.parse().map_err(|e: crate::error::BridgeError| {
                    CliError::InvalidArgValue {
                        arg: name,
                        error: e.to_string(),
                    }
                })?);
            }
            "--network" => overrides.network = Some(value),
            _ => overrides.private_key = Some(value),
        }
    }

    Ok((overrides, rest))
}

#[must_use]
pub fn suggest_commands(typo: &str) -> Vec<String> {
    COMMAND_NAMES
        .iter()
        .map(|cmd| (cmd, strsim::levenshtein(typo, cmd)))
        .filter(|(_, dist)| *dist <= 3)
        .min_by_key(|(_, dist)| *dist)
        .map(|(cmd, _)| vec![(*cmd).to_string()])
        .unwrap_or_default()
}
