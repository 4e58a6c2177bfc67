#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

mod action;
mod args;
mod commands;
mod dispatch;
mod parser;

pub use action::CliAction;
pub use args::{ensure_no_unknown_flags, split_global_args, suggest_commands};
pub use commands::{allowed_flags, CliCommand, COMMAND_NAMES, HELP_TEXT};
pub use dispatch::{execute, run_cli, CommandOutput, CLI_EXIT_CODE};
pub use parser::{parse_cli_args, CliError};
