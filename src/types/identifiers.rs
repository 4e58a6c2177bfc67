use crate::error::{BridgeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MAX_HEX_DIGITS: usize = 64;
const MAX_TASK_ID_BYTES: usize = 128;
const MAX_DESCRIPTION_BYTES: usize = 1024;

/// Account address on either chain: `0x` followed by up to 64 hex digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// # Errors
    /// Returns `BridgeError::InvalidParameter` if the value is not `0x`-prefixed hex.
    pub fn parse(value: &str) -> Result<Self> {
        parse_hex_identifier("address", value).map(Self)
    }

    /// The all-zero address used as a stand-in counter-party.
    #[must_use]
    pub fn zero() -> Self {
        Self(format!("0x{}", "0".repeat(MAX_HEX_DIGITS)))
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.0
    }
}

/// On-chain object identifier (task object, task manager, package).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectId(String);

impl ObjectId {
    /// Accepts ids with or without the `0x` prefix and stores them prefixed.
    ///
    /// # Errors
    /// Returns `BridgeError::InvalidParameter` if the value is not hex.
    pub fn parse(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        let prefixed = if trimmed.starts_with("0x") {
            trimmed.to_string()
        } else {
            format!("0x{trimmed}")
        };
        parse_hex_identifier("object_id", &prefixed).map(Self)
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskId(String);

impl TaskId {
    /// # Errors
    /// Returns `BridgeError::InvalidParameter` for empty, oversized or control-character ids.
    pub fn parse(value: &str) -> Result<Self> {
        if value.trim().is_empty() {
            return Err(BridgeError::invalid("task_id", "must not be empty"));
        }
        check_free_text("task_id", value, MAX_TASK_ID_BYTES).map(|()| Self(value.to_string()))
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.0
    }
}

/// Free-text task description passed to the contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Description(String);

impl Description {
    /// # Errors
    /// Returns `BridgeError::InvalidParameter` for oversized or control-character text.
    pub fn parse(value: &str) -> Result<Self> {
        check_free_text("description", value, MAX_DESCRIPTION_BYTES)
            .map(|()| Self(value.to_string()))
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.0
    }
}

fn parse_hex_identifier(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .ok_or_else(|| BridgeError::invalid(field, "must start with 0x"))?;

    if digits.is_empty() || digits.len() > MAX_HEX_DIGITS {
        return Err(BridgeError::invalid(
            field,
            format!("expected 1..={MAX_HEX_DIGITS} hex digits, got {}", digits.len()),
        ));
    }

    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(BridgeError::invalid(field, "contains non-hex characters"));
    }

    Ok(format!("0x{}", digits.to_ascii_lowercase()))
}

fn check_free_text(field: &str, value: &str, max_bytes: usize) -> Result<()> {
    if value.len() > max_bytes {
        return Err(BridgeError::invalid(
            field,
            format!("longer than {max_bytes} bytes"),
        ));
    }
    value
        .chars()
        .find(|c| c.is_control())
        .map_or(Ok(()), |c| {
            Err(BridgeError::invalid(
                field,
                format!("contains control character U+{:04X}", u32::from(c)),
            ))
        })
}

macro_rules! string_newtype_impls {
    ($($name:ident),+) => {
        $(
            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }

            impl FromStr for $name {
                type Err = BridgeError;

                fn from_str(s: &str) -> Result<Self> {
                    Self::parse(s)
                }
            }

            impl TryFrom<String> for $name {
                type Error = BridgeError;

                fn try_from(value: String) -> Result<Self> {
                    Self::parse(&value)
                }
            }

            impl From<$name> for String {
                fn from(value: $name) -> Self {
                    value.0
                }
            }
        )+
    };
}

string_newtype_impls!(Address, ObjectId, TaskId, Description);

#[cfg(test)]
mod tests {
    use super::{Address, Description, ObjectId, TaskId};

    #[test]
    fn address_is_normalized_to_lowercase() {
        let address = Address::parse("0xABCdef").map_err(|e| e.to_string());
        assert_eq!(address.map(|a| a.to_string()), Ok("0xabcdef".to_string()));
    }

    #[test]
    fn address_without_prefix_is_rejected() {
        assert!(Address::parse("abcdef").is_err());
        assert!(Address::parse("0x").is_err());
        assert!(Address::parse("0xzz").is_err());
    }

    #[test]
    fn object_id_gains_prefix() {
        let id = ObjectId::parse("6").map_err(|e| e.to_string());
        assert_eq!(id.map(|i| i.to_string()), Ok("0x6".to_string()));
    }

    #[test]
    fn zero_address_has_full_width() {
        assert_eq!(Address::zero().value().len(), 66);
    }

    #[test]
    fn description_rejects_quote_breaking_control_characters() {
        assert!(Description::parse("ok \"quoted\" text").is_ok());
        assert!(Description::parse("line\nbreak").is_err());
        assert!(Description::parse("nul\0byte").is_err());
    }

    #[test]
    fn task_id_rejects_empty_and_oversized_values() {
        assert!(TaskId::parse("   ").is_err());
        assert!(TaskId::parse(&"x".repeat(129)).is_err());
        assert!(TaskId::parse("test_task_001").is_ok());
    }

    #[test]
    fn serde_round_trip_validates_input() {
        let parsed: Result<Address, _> = serde_json::from_str("\"not-an-address\"");
        assert!(parsed.is_err());
    }
}
