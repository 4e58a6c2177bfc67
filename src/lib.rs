pub mod cli;
pub mod client;
pub mod config;
pub mod diagnostics;
pub mod envelope;
pub mod error;
pub mod faucet;
pub mod parsing;
pub mod runtime;
pub mod scripts;
pub mod signature;
pub mod task_manager;
pub mod types;
pub mod verification;

#[cfg(test)]
mod test_support;

pub use client::{ChainClient, ScriptChainClient};
pub use config::{AccountAddress, Chain, ChainConfig, ChainSettings, ConfigOverrides};
pub use error::{BridgeError, Result};
pub use faucet::{ensure_sufficient_balance, FaucetClient, FaucetOutcome};
pub use signature::{verify_personal_message, SignatureManager};
pub use task_manager::TaskManager;
pub use types::*;
pub use verification::{run_smoke, SmokeReport};
