//! Per-call result values returned by every remote operation.
//!
//! Failures are ordinary values here, not errors: a timed out or rejected
//! transaction is something the caller inspects, not an unhandled fault.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a remote operation did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The child process exceeded its time budget and was killed.
    Timeout,
    /// The child ran and reported failure (non-zero exit, non-2xx HTTP).
    Execution,
    /// Something failed on our side before or after the call.
    Internal,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::Execution => write!(f, "execution"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl OperationFailure {
    #[must_use]
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self.kind, FailureKind::Timeout)
    }
}

impl fmt::Display for OperationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failure: {}", self.kind, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_object_id: Option<String>,
    #[serde(default)]
    pub task_completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explorer_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<OperationFailure>,
}

impl OperationResult {
    #[must_use]
    pub const fn succeeded(tx_hash: Option<String>) -> Self {
        Self {
            success: true,
            tx_hash,
            task_object_id: None,
            task_completed: false,
            explorer_url: None,
            error: None,
        }
    }

    #[must_use]
    pub fn failed(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            tx_hash: None,
            task_object_id: None,
            task_completed: false,
            explorer_url: None,
            error: Some(OperationFailure::new(kind, message)),
        }
    }

    #[must_use]
    pub fn with_task_object_id(mut self, task_object_id: Option<String>) -> Self {
        self.task_object_id = task_object_id;
        self
    }

    #[must_use]
    pub const fn with_task_completed(mut self, completed: bool) -> Self {
        self.task_completed = completed;
        self
    }

    #[must_use]
    pub fn with_explorer_url(mut self, url: Option<String>) -> Self {
        self.explorer_url = url;
        self
    }

    #[must_use]
    pub fn is_timeout(&self) -> bool {
        self.error.as_ref().is_some_and(OperationFailure::is_timeout)
    }
}

/// Outcome of a query that returns a single value (address, balance, signature).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QueryOutcome<T> {
    Ok { value: T },
    Failed { failure: OperationFailure },
}

impl<T> QueryOutcome<T> {
    #[must_use]
    pub fn failed(kind: FailureKind, message: impl Into<String>) -> Self {
        Self::Failed {
            failure: OperationFailure::new(kind, message),
        }
    }

    #[must_use]
    pub fn ok(self) -> Option<T> {
        match self {
            Self::Ok { value } => Some(value),
            Self::Failed { .. } => None,
        }
    }

    #[must_use]
    pub const fn failure(&self) -> Option<&OperationFailure> {
        match self {
            Self::Ok { .. } => None,
            Self::Failed { failure } => Some(failure),
        }
    }

    /// Converts into a `Result`, keeping the structured failure.
    ///
    /// # Errors
    /// Returns the recorded `OperationFailure` when the query failed.
    pub fn into_result(self) -> std::result::Result<T, OperationFailure> {
        match self {
            Self::Ok { value } => Ok(value),
            Self::Failed { failure } => Err(failure),
        }
    }
}
