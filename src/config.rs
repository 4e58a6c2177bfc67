#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use crate::client::ChainClient;
use crate::error::{BridgeError, Result};
use crate::runtime::{ScriptRuntime, DEFAULT_SCRIPT_PROGRAM};
use crate::types::{Address, ObjectId};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

/// Testnet deployment of the `task_manager` Move package.
pub const DEFAULT_TASK_MANAGER_PACKAGE_ID: &str =
    "0x73d3dd28f146f77c625eb7c631da0855acc95b1a9d922eafbd46d7d3ad9e4d22";
/// Shared `TaskManager` object of the default deployment.
pub const DEFAULT_TASK_MANAGER_ID: &str =
    "0x8daf22f074cee2b8f4a06ba3dce996a0100ac5c4d6f211664f34f4f0134a563f";
pub const TASK_MANAGER_MODULE: &str = "task_manager";
pub const APTOS_DEVNET_FAUCET_URL: &str = "https://faucet.devnet.aptoslabs.com";

pub mod env {
    pub const SUI_NETWORK: &str = "SUI_NETWORK";
    pub const SUI_NODE_URL: &str = "SUI_NODE_URL";
    pub const APTOS_NETWORK: &str = "APTOS_NETWORK";
    pub const APTOS_NODE_URL: &str = "APTOS_NODE_URL";
    pub const TASK_AGENT_PRIVATE_KEY: &str = "TASK_AGENT_PRIVATE_KEY";
    pub const APTOS_PRIVATE_KEY: &str = "APTOS_PRIVATE_KEY";
    pub const SERVICE_AGENT_PRIVATE_KEY: &str = "SERVICE_AGENT_PRIVATE_KEY";
    pub const SERVICE_AGENT_ADDRESS: &str = "SERVICE_AGENT_ADDRESS";
    pub const TASK_MANAGER_PACKAGE_ID: &str = "TASK_MANAGER_PACKAGE_ID";
    pub const TASK_MANAGER_ID: &str = "TASK_MANAGER_ID";
    pub const CHAIN: &str = "BRIDGE_CHAIN";
    pub const SDK_PATH: &str = "BRIDGE_SDK_PATH";
    pub const NODE_PATH: &str = "NODE_PATH";
    pub const SCRIPT_RUNTIME: &str = "BRIDGE_SCRIPT_RUNTIME";
    pub const SCRIPT_TIMEOUT_SECS: &str = "BRIDGE_SCRIPT_TIMEOUT_SECS";
    pub const FAUCET_URL: &str = "BRIDGE_FAUCET_URL";
    pub const MIN_BALANCE: &str = "BRIDGE_MIN_BALANCE";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Chain {
    Sui,
    Aptos,
}

impl Chain {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sui => "sui",
            Self::Aptos => "aptos",
        }
    }

    #[must_use]
    pub const fn default_network(self) -> &'static str {
        match self {
            Self::Sui => "testnet",
            Self::Aptos => "devnet",
        }
    }

    /// Name of the smallest token unit.
    #[must_use]
    pub const fn base_unit(self) -> &'static str {
        match self {
            Self::Sui => "MIST",
            Self::Aptos => "octas",
        }
    }

    #[must_use]
    pub const fn token_symbol(self) -> &'static str {
        match self {
            Self::Sui => "SUI",
            Self::Aptos => "APT",
        }
    }

    /// Fractional digits between the base unit and one whole token.
    #[must_use]
    pub const fn decimals(self) -> u32 {
        match self {
            Self::Sui => 9,
            Self::Aptos => 8,
        }
    }

    const fn private_key_env(self) -> &'static str {
        match self {
            Self::Sui => env::TASK_AGENT_PRIVATE_KEY,
            Self::Aptos => env::APTOS_PRIVATE_KEY,
        }
    }

    const fn network_env(self) -> &'static str {
        match self {
            Self::Sui => env::SUI_NETWORK,
            Self::Aptos => env::APTOS_NETWORK,
        }
    }

    const fn node_url_env(self) -> &'static str {
        match self {
            Self::Sui => env::SUI_NODE_URL,
            Self::Aptos => env::APTOS_NODE_URL,
        }
    }

    const fn default_faucet_url(self) -> Option<&'static str> {
        match self {
            Self::Sui => None,
            Self::Aptos => Some(APTOS_DEVNET_FAUCET_URL),
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Chain {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sui" => Ok(Self::Sui),
            "aptos" => Ok(Self::Aptos),
            other => Err(BridgeError::ConfigError(format!(
                "Unknown chain '{other}', expected sui or aptos"
            ))),
        }
    }
}

/// Secret key material. Never printed by `Debug` or `Display`.
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey(String);

impl PrivateKey {
    /// Strips a `0x` prefix; bech32 `suiprivkey1...` keys are kept verbatim.
    #[must_use]
    pub fn new(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.starts_with("suiprivkey") {
            return Self(trimmed.to_string());
        }
        Self(trimmed.strip_prefix("0x").unwrap_or(trimmed).to_string())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKey(<redacted>)")
    }
}

impl fmt::Display for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<redacted>")
    }
}

/// Lookup for configuration values; the process environment in production.
pub trait EnvSource {
    fn var(&self, name: &str) -> Option<String>;

    fn non_empty(&self, name: &str) -> Option<String> {
        self.var(name)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvSource for BTreeMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Explicit values that win over the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub chain: Option<Chain>,
    pub network: Option<String>,
    pub private_key: Option<String>,
}

/// Everything resolved from overrides and environment, before the account
/// address is known.
#[derive(Debug, Clone)]
pub struct ChainSettings {
    chain: Chain,
    network: String,
    node_url: Option<String>,
    private_key: PrivateKey,
    service_agent_key: Option<PrivateKey>,
    package_id: ObjectId,
    task_manager_id: ObjectId,
    module_name: String,
    faucet_url: Option<String>,
    runtime: ScriptRuntime,
}

fn script_timeout_override(source: &impl EnvSource) -> Result<Option<Duration>> {
    source
        .non_empty(env::SCRIPT_TIMEOUT_SECS)
        .map(|raw| match raw.parse::<u64>() {
            Ok(seconds) if seconds > 0 => Ok(Duration::from_secs(seconds)),
            _ => Err(BridgeError::ConfigError(format!(
                "Invalid {}={raw}: expected a positive number of seconds",
                env::SCRIPT_TIMEOUT_SECS
            ))),
        })
        .transpose()
}

impl ChainSettings {
    /// # Errors
    /// Returns `BridgeError::MissingCredential` when no private key is available,
    /// and `BridgeError::ConfigError`/`InvalidParameter` for malformed values.
    pub fn resolve(overrides: &ConfigOverrides, source: &impl EnvSource) -> Result<Self> {
        let chain = match overrides.chain {
            Some(chain) => chain,
            None => source
                .non_empty(env::CHAIN)
                .map_or(Ok(Chain::Sui), |raw| raw.parse())?,
        };

        let private_key = overrides
            .private_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
            .or_else(|| source.non_empty(chain.private_key_env()))
            .map(|raw| PrivateKey::new(&raw))
            .ok_or_else(|| {
                BridgeError::MissingCredential(format!(
                    "No {chain} private key provided; set {} or pass --private-key",
                    chain.private_key_env()
                ))
            })?;

        let network = overrides
            .network
            .clone()
            .or_else(|| source.non_empty(chain.network_env()))
            .unwrap_or_else(|| chain.default_network().to_string());

        let package_id = ObjectId::parse(
            &source.non_empty(env::TASK_MANAGER_PACKAGE_ID)
                .unwrap_or_else(|| DEFAULT_TASK_MANAGER_PACKAGE_ID.to_string()),
        )?;
        let task_manager_id = ObjectId::parse(
            &source.non_empty(env::TASK_MANAGER_ID)
                .unwrap_or_else(|| DEFAULT_TASK_MANAGER_ID.to_string()),
        )?;

        let module_path = source
            .non_empty(env::SDK_PATH)
            .or_else(|| source.non_empty(env::NODE_PATH))
            .map(PathBuf::from);
        let runtime = ScriptRuntime::new(
            source.non_empty(env::SCRIPT_RUNTIME)
                .unwrap_or_else(|| DEFAULT_SCRIPT_PROGRAM.to_string()),
        )
        .with_module_path(module_path)
        .with_timeout_override(script_timeout_override(source)?);

        let faucet_url = source
            .non_empty(env::FAUCET_URL)
            .or_else(|| chain.default_faucet_url().map(str::to_string));
        if let Some(raw) = &faucet_url {
            url::Url::parse(raw)
                .map_err(|e| BridgeError::ConfigError(format!("Invalid faucet URL {raw}: {e}")))?;
        }

        Ok(Self {
            chain,
            network,
            node_url: source.non_empty(chain.node_url_env()),
            private_key,
            service_agent_key: source
                .non_empty(env::SERVICE_AGENT_PRIVATE_KEY)
                .map(|raw| PrivateKey::new(&raw)),
            package_id,
            task_manager_id,
            module_name: TASK_MANAGER_MODULE.to_string(),
            faucet_url,
            runtime,
        })
    }

    #[must_use]
    pub fn with_runtime(mut self, runtime: ScriptRuntime) -> Self {
        self.runtime = runtime;
        self
    }

    #[must_use]
    pub const fn chain(&self) -> Chain {
        self.chain
    }

    #[must_use]
    pub fn network(&self) -> &str {
        &self.network
    }

    #[must_use]
    pub fn node_url(&self) -> Option<&str> {
        self.node_url.as_deref()
    }

    #[must_use]
    pub const fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    #[must_use]
    pub const fn service_agent_key(&self) -> Option<&PrivateKey> {
        self.service_agent_key.as_ref()
    }

    #[must_use]
    pub const fn package_id(&self) -> &ObjectId {
        &self.package_id
    }

    #[must_use]
    pub const fn task_manager_id(&self) -> &ObjectId {
        &self.task_manager_id
    }

    #[must_use]
    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    #[must_use]
    pub fn faucet_url(&self) -> Option<&str> {
        self.faucet_url.as_deref()
    }

    #[must_use]
    pub const fn runtime(&self) -> &ScriptRuntime {
        &self.runtime
    }

    /// Fully qualified Move function: `package::module::function`.
    #[must_use]
    pub fn module_function(&self, function_name: &str) -> String {
        format!("{}::{}::{function_name}", self.package_id, self.module_name)
    }

    #[must_use]
    pub fn explorer_tx_url(&self, tx_hash: &str) -> String {
        match self.chain {
            Chain::Sui => format!("https://suiscan.xyz/{}/tx/{tx_hash}", self.network),
            Chain::Aptos => format!(
                "https://explorer.aptoslabs.com/txn/{tx_hash}?network={}",
                self.network
            ),
        }
    }

    /// Secrets that must never appear in diagnostics leaving the process.
    pub fn secrets(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.private_key.expose())
            .chain(self.service_agent_key.iter().map(PrivateKey::expose))
    }
}

/// The account address, tagged with how it was obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", content = "address", rename_all = "snake_case")]
pub enum AccountAddress {
    /// Reported by the chain SDK from the private key.
    Derived(Address),
    /// Hash of the private key; not a real account and unusable for signing.
    Placeholder(Address),
}

impl AccountAddress {
    #[must_use]
    pub const fn address(&self) -> &Address {
        match self {
            Self::Derived(address) | Self::Placeholder(address) => address,
        }
    }

    #[must_use]
    pub const fn is_authoritative(&self) -> bool {
        matches!(self, Self::Derived(_))
    }

    /// # Errors
    /// Returns `BridgeError::PlaceholderAddress` for the deterministic fallback.
    pub fn require_authoritative(&self) -> Result<&Address> {
        match self {
            Self::Derived(address) => Ok(address),
            Self::Placeholder(address) => {
                Err(BridgeError::PlaceholderAddress(address.to_string()))
            }
        }
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Derived(address) => write!(f, "{address}"),
            Self::Placeholder(address) => write!(f, "{address} (placeholder)"),
        }
    }
}

/// Non-cryptographic stand-in address: sha256 of the key text.
#[must_use]
pub fn deterministic_placeholder(private_key: &PrivateKey) -> Address {
    let digest = Sha256::digest(private_key.expose().as_bytes());
    Address::parse(&format!("0x{}", hex::encode(digest))).unwrap_or_else(|_| Address::zero())
}

/// Immutable per-process configuration: settings plus the account address.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    settings: ChainSettings,
    address: AccountAddress,
}

impl ChainConfig {
    /// Derives the account address through the chain SDK, falling back to a
    /// flagged placeholder when derivation is unavailable.
    pub async fn load<C: ChainClient + ?Sized>(settings: ChainSettings, client: &C) -> Self {
        let derived = client
            .derive_address(&settings)
            .await
            .into_result()
            .map_err(|failure| failure.to_string())
            .and_then(|raw| Address::parse(&raw).map_err(|e| e.to_string()));

        let address = match derived {
            Ok(address) => {
                info!(chain = %settings.chain, %address, "derived account address");
                AccountAddress::Derived(address)
            }
            Err(reason) => {
                let placeholder = deterministic_placeholder(&settings.private_key);
                warn!(
                    chain = %settings.chain,
                    address = %placeholder,
                    reason = %crate::diagnostics::redact_diagnostic(&reason, settings.secrets()),
                    "address derivation failed; using deterministic placeholder address, not usable for transactions"
                );
                AccountAddress::Placeholder(placeholder)
            }
        };

        Self { settings, address }
    }

    #[must_use]
    pub const fn with_address(settings: ChainSettings, address: AccountAddress) -> Self {
        Self { settings, address }
    }

    #[must_use]
    pub const fn settings(&self) -> &ChainSettings {
        &self.settings
    }

    #[must_use]
    pub const fn account(&self) -> &AccountAddress {
        &self.address
    }

    #[must_use]
    pub const fn address(&self) -> &Address {
        self.address.address()
    }

    #[must_use]
    pub const fn chain(&self) -> Chain {
        self.settings.chain
    }
}

impl fmt::Display for ChainConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ChainConfig(chain={}, network={}, address={}, package={}::{})",
            self.settings.chain,
            self.settings.network,
            self.address,
            self.settings.package_id,
            self.settings.module_name
        )
    }
}
