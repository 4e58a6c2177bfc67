use serde::{Deserialize, Serialize};

pub const SUCCESS_MARKER: &str = "SUCCESS";
pub const TASK_COMPLETED_MARKER: &str = "TASK_COMPLETED";
pub const TX_HASH_PREFIX: &str = "TX_HASH:";
pub const TASK_OBJECT_ID_PREFIX: &str = "TASK_OBJECT_ID:";
pub const ADDRESS_PREFIX: &str = "ADDRESS:";
pub const BALANCE_PREFIX: &str = "BALANCE:";
pub const SIGNATURE_PREFIX: &str = "SIGNATURE:";
pub const PUBLIC_KEY_PREFIX: &str = "PUBLIC_KEY:";
pub const CHAIN_ID_PREFIX: &str = "CHAIN_ID:";

/// Fields recognised in a script's stdout. Unknown lines are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedOutput {
    pub success_marker: bool,
    pub tx_hash: Option<String>,
    pub task_object_ids: Vec<String>,
    pub task_completed: bool,
    pub address: Option<String>,
    pub balance: Option<String>,
    pub signature: Option<String>,
    pub public_key: Option<String>,
    pub chain_id: Option<String>,
}

impl ParsedOutput {
    /// The last reported task object id; the object-change line follows the event line.
    #[must_use]
    pub fn task_object_id(&self) -> Option<&str> {
        self.task_object_ids.last().map(String::as_str)
    }

    /// Balance in base units, if reported and numeric.
    #[must_use]
    pub fn balance_units(&self) -> Option<u128> {
        self.balance.as_deref().and_then(|raw| raw.parse::<u128>().ok())
    }
}

#[must_use]
pub fn parse_output(output: &str) -> ParsedOutput {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .fold(ParsedOutput::default(), |mut parsed, line| {
            if line == SUCCESS_MARKER {
                parsed.success_marker = true;
            } else if line == TASK_COMPLETED_MARKER {
                parsed.task_completed = true;
            } else if let Some(value) = line.strip_prefix(TX_HASH_PREFIX) {
                parsed.tx_hash = Some(value.to_string());
            } else if let Some(value) = line.strip_prefix(TASK_OBJECT_ID_PREFIX) {
                parsed.task_object_ids.push(value.to_string());
            } else if let Some(value) = line.strip_prefix(ADDRESS_PREFIX) {
                parsed.address = Some(value.to_string());
            } else if let Some(value) = line.strip_prefix(BALANCE_PREFIX) {
                parsed.balance = Some(value.to_string());
            } else if let Some(value) = line.strip_prefix(SIGNATURE_PREFIX) {
                parsed.signature = Some(value.to_string());
            } else if let Some(value) = line.strip_prefix(PUBLIC_KEY_PREFIX) {
                parsed.public_key = Some(value.to_string());
            } else if let Some(value) = line.strip_prefix(CHAIN_ID_PREFIX) {
                parsed.chain_id = Some(value.to_string());
            }
            parsed
        })
}
