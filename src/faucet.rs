#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

//! Test-network faucet: one funding request, one settle delay, one re-check.

use crate::client::ChainClient;
use crate::config::{env, ChainConfig, ChainSettings};
use crate::error::{BridgeError, Result};
use crate::types::{Address, BaseUnits};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

pub const FAUCET_TIMEOUT: Duration = Duration::from_secs(30);
pub const SETTLE_DELAY: Duration = Duration::from_secs(5);
/// 1 APT in octas.
pub const DEFAULT_FUND_AMOUNT: u64 = 100_000_000;
/// 0.1 APT in octas.
pub const DEFAULT_MIN_BALANCE: u64 = 10_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FaucetOutcome {
    /// Any 2xx answer. The hash is only present when the body carried one.
    Funded {
        status: u16,
        #[serde(skip_serializing_if = "Option::is_none")]
        tx_hash: Option<String>,
    },
    Rejected { status: u16, message: String },
    Unreachable { message: String },
}

impl FaucetOutcome {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Funded { .. })
    }
}

/// Classifies a faucet answer. The body shape never decides success.
#[must_use]
pub fn interpret_response(status: u16, body: &str) -> FaucetOutcome {
    if !(200..300).contains(&status) {
        return FaucetOutcome::Rejected {
            status,
            message: format!("{status} - {}", body.trim()),
        };
    }

    let tx_hash = match serde_json::from_str::<Value>(body) {
        Ok(Value::Array(items)) => items.first().map(value_text),
        Ok(Value::Object(fields)) => fields
            .get("hash")
            .or_else(|| fields.get("txHash"))
            .map(value_text),
        Ok(_) | Err(_) => None,
    };
    FaucetOutcome::Funded { status, tx_hash }
}

fn value_text(value: &Value) -> String {
    value
        .as_str()
        .map_or_else(|| value.to_string(), str::to_string)
}

#[derive(Debug, Clone)]
pub struct FaucetClient {
    base: Url,
    http: reqwest::Client,
}

impl FaucetClient {
    /// # Errors
    /// Returns `BridgeError::ConfigError` for an unusable base URL and
    /// `BridgeError::HttpError` when the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base = Url::parse(base_url)
            .map_err(|e| BridgeError::ConfigError(format!("Invalid faucet URL {base_url}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(BridgeError::ConfigError(format!(
                "Faucet URL {base_url} cannot carry a path"
            )));
        }
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { base, http })
    }

    /// # Errors
    /// Returns `BridgeError::ConfigError` when the chain has no faucet configured.
    pub fn from_settings(settings: &ChainSettings) -> Result<Self> {
        let base = settings.faucet_url().ok_or_else(|| {
            BridgeError::ConfigError(format!(
                "No faucet configured for {}; set {}",
                settings.chain(),
                env::FAUCET_URL
            ))
        })?;
        Self::new(base, FAUCET_TIMEOUT)
    }

    #[must_use]
    pub fn mint_url(&self, address: &Address, amount: BaseUnits) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("mint");
        }
        url.query_pairs_mut()
            .append_pair("address", address.value())
            .append_pair("amount", &amount.to_string());
        url
    }

    /// Sends exactly one funding request.
    pub async fn request_funds(&self, address: &Address, amount: BaseUnits) -> FaucetOutcome {
        let url = self.mint_url(address, amount);
        info!(%address, %amount, faucet = %self.base, "requesting faucet funds");

        let response = match self.http.post(url).send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(%address, error = %err, "faucet request failed");
                return FaucetOutcome::Unreachable {
                    message: err.to_string(),
                };
            }
        };

        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => {
                debug!(status, error = %err, "faucet body unreadable");
                String::new()
            }
        };
        let outcome = interpret_response(status, &body);
        match &outcome {
            FaucetOutcome::Funded { tx_hash, .. } => {
                info!(%address, status, tx_hash = tx_hash.as_deref().unwrap_or("-"), "faucet accepted request");
            }
            FaucetOutcome::Rejected { message, .. } | FaucetOutcome::Unreachable { message } => {
                warn!(%address, status, error = %message, "faucet rejected request");
            }
        }
        outcome
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FundingPolicy {
    pub min_balance: BaseUnits,
    pub amount: BaseUnits,
    pub settle_delay: Duration,
}

impl Default for FundingPolicy {
    fn default() -> Self {
        Self {
            min_balance: BaseUnits::from(DEFAULT_MIN_BALANCE),
            amount: BaseUnits::from(DEFAULT_FUND_AMOUNT),
            settle_delay: SETTLE_DELAY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceCheck {
    pub sufficient: bool,
    pub min_balance: BaseUnits,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_balance: Option<BaseUnits>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_balance: Option<BaseUnits>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub faucet: Option<FaucetOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl BalanceCheck {
    const fn unfunded(min_balance: BaseUnits) -> Self {
        Self {
            sufficient: false,
            min_balance,
            initial_balance: None,
            final_balance: None,
            faucet: None,
            detail: None,
        }
    }
}

/// Tops the account up when its balance is below `policy.min_balance`.
///
/// Settlement is confirmed by a single balance re-read after
/// `policy.settle_delay`; a 2xx faucet answer alone is not trusted.
///
/// # Errors
/// Returns `BridgeError::PlaceholderAddress` when the address was never
/// derived, so no funds are sent to an account nobody controls.
pub async fn ensure_sufficient_balance<C: ChainClient + ?Sized>(
    client: &C,
    config: &ChainConfig,
    faucet: &FaucetClient,
    policy: FundingPolicy,
) -> Result<BalanceCheck> {
    let address = config.account().require_authoritative()?;
    let settings = config.settings();
    let mut check = BalanceCheck::unfunded(policy.min_balance);

    if let Some(failure) = client.check_connection(settings).await.failure() {
        warn!(chain = %settings.chain(), error = %failure, "node unreachable; not requesting funds");
        check.detail = Some(format!("connection check failed: {}", failure.message));
        return Ok(check);
    }

    match client.balance(settings, address).await.into_result() {
        Ok(balance) if balance >= policy.min_balance => {
            info!(%address, %balance, "balance already sufficient");
            check.sufficient = true;
            check.initial_balance = Some(balance);
            check.final_balance = Some(balance);
            return Ok(check);
        }
        Ok(balance) => {
            info!(%address, %balance, min = %policy.min_balance, "balance below minimum");
            check.initial_balance = Some(balance);
        }
        Err(failure) => {
            warn!(%address, error = %failure, "balance unknown; requesting funds anyway");
        }
    }

    let outcome = faucet.request_funds(address, policy.amount).await;
    let funded = outcome.is_success();
    check.faucet = Some(outcome);
    if !funded {
        return Ok(check);
    }

    tokio::time::sleep(policy.settle_delay).await;
    match client.balance(settings, address).await.into_result() {
        Ok(balance) => {
            check.sufficient = balance >= policy.min_balance;
            check.final_balance = Some(balance);
            if !check.sufficient {
                check.detail = Some("faucet accepted the request but the balance has not settled".to_string());
            }
        }
        Err(failure) => {
            check.detail = Some(format!("balance re-check failed: {}", failure.message));
        }
    }
    info!(%address, sufficient = check.sufficient, "balance check finished");
    Ok(check)
}
