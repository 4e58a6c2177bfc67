#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use thiserror::Error;

/// Error code constants for type-safe error handling
pub mod code {
    pub const CLI_ERROR: &str = "CLI_ERROR";
    pub const MISSING_CREDENTIAL: &str = "MISSING_CREDENTIAL";
    pub const INVALID: &str = "INVALID";
    pub const DEPENDENCY: &str = "DEPENDENCY";
    pub const TIMEOUT: &str = "TIMEOUT";
    pub const REMOTE: &str = "REMOTE";
    pub const UNSAFE_ADDRESS: &str = "UNSAFE_ADDRESS";
    pub const INTERNAL: &str = "INTERNAL";
}

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid parameter {field}: {reason}")]
    InvalidParameter { field: String, reason: String },

    #[error("Placeholder address {0} cannot be used for signing or funding")]
    PlaceholderAddress(String),

    #[error("{operation} timed out after {seconds} seconds")]
    Timeout { operation: String, seconds: u64 },

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BridgeError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Returns the protocol error code for this error
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MissingCredential(_) => code::MISSING_CREDENTIAL,
            Self::ConfigError(_) | Self::InvalidParameter { .. } => code::INVALID,
            Self::PlaceholderAddress(_) => code::UNSAFE_ADDRESS,
            Self::Timeout { .. } => code::TIMEOUT,
            Self::HttpError(_) => code::REMOTE,
            Self::IoError(_) => code::DEPENDENCY,
            Self::SerializationError(_) => code::INVALID,
            Self::Internal(_) => code::INTERNAL,
        }
    }

    /// Returns the exit code for this error
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::MissingCredential(_) | Self::ConfigError(_) => 2,
            Self::InvalidParameter { .. } => 3,
            Self::PlaceholderAddress(_) => 4,
            Self::Timeout { .. } => 5,
            Self::HttpError(_) => 6,
            Self::IoError(_) => 7,
            Self::SerializationError(_) => 8,
            Self::Internal(_) => 9,
        }
    }
}

/// Protocol error codes as documented in the CLI
pub const ERROR_CODES: &[(&str, &str, &str)] = &[
    (
        code::CLI_ERROR,
        "Invalid CLI usage",
        "Run 'bridge help' for valid options",
    ),
    (
        code::MISSING_CREDENTIAL,
        "No private key available",
        "Set TASK_AGENT_PRIVATE_KEY (SUI) or APTOS_PRIVATE_KEY, or pass --private-key",
    ),
    (
        code::INVALID,
        "Invalid request parameter or configuration",
        "Check identifiers are 0x-prefixed hex and free text has no control characters",
    ),
    (
        code::DEPENDENCY,
        "Script runtime unavailable",
        "Install node and point BRIDGE_SDK_PATH at a node_modules directory with the chain SDK",
    ),
    (
        code::TIMEOUT,
        "Remote operation timed out",
        "Check node connectivity and retry",
    ),
    (
        code::REMOTE,
        "Remote operation failed",
        "Inspect the diagnostic text returned with the failure",
    ),
    (
        code::UNSAFE_ADDRESS,
        "Address is a non-authoritative placeholder",
        "Fix SDK address derivation before signing or funding",
    ),
    (
        code::INTERNAL,
        "Unexpected internal failure",
        "Inspect logs and retry command",
    ),
];

/// Get error code details (description and fix) for a given error code
#[must_use]
pub fn get_error_info(error_code: &str) -> Option<(&'static str, &'static str)> {
    ERROR_CODES
        .iter()
        .find(|(code, _, _)| *code == error_code)
        .map(|(_, desc, fix)| (*desc, *fix))
}

pub type Result<T> = std::result::Result<T, BridgeError>;
