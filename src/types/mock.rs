//! Placeholder payloads for task operations that have no on-chain
//! implementation yet.
//!
//! Every payload serializes `"mock": true` and none of them can hold a real
//! transaction hash, so callers can never mistake them for chain data.

use super::identifiers::{Address, TaskId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pay amount reported by the task-info placeholder: 1 SUI in MIST.
pub const MOCK_PAY_AMOUNT: u64 = 1_000_000_000;
/// Deadline offset reported by the task-info placeholder: 24 hours.
pub const MOCK_DEADLINE_OFFSET_SECS: i64 = 86_400;

/// Whether an operation reaches the chain or answers with canned data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Real,
    Mock,
}

impl Capability {
    #[must_use]
    pub const fn is_mock(self) -> bool {
        matches!(self, Self::Mock)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskOperation {
    CreateTask,
    CompleteTask,
    CancelTask,
    TaskInfo,
    TaskStats,
    IsTaskExpired,
}

impl TaskOperation {
    pub const ALL: [Self; 6] = [
        Self::CreateTask,
        Self::CompleteTask,
        Self::CancelTask,
        Self::TaskInfo,
        Self::TaskStats,
        Self::IsTaskExpired,
    ];

    /// Capability wired for this operation. Only create and complete reach the chain.
    #[must_use]
    pub const fn capability(self) -> Capability {
        match self {
            Self::CreateTask | Self::CompleteTask => Capability::Real,
            Self::CancelTask | Self::TaskInfo | Self::TaskStats | Self::IsTaskExpired => {
                Capability::Mock
            }
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreateTask => "create_task",
            Self::CompleteTask => "complete_task",
            Self::CancelTask => "cancel_task",
            Self::TaskInfo => "get_task_info",
            Self::TaskStats => "get_task_stats",
            Self::IsTaskExpired => "is_task_expired",
        }
    }
}

impl fmt::Display for TaskOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Marker serialized as `true`; has no other value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MockFlag;

impl Serialize for MockFlag {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bool(true)
    }
}

impl<'de> Deserialize<'de> for MockFlag {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let flag = bool::deserialize(deserializer)?;
        if flag {
            Ok(Self)
        } else {
            Err(serde::de::Error::custom("mock payloads must carry mock: true"))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockCancellation {
    pub success: bool,
    pub mock: MockFlag,
    pub message: String,
    pub task_id: TaskId,
    /// Placeholder reference, always prefixed `mock_cancel_tx_`.
    pub mock_reference: String,
}

impl MockCancellation {
    #[must_use]
    pub fn new(task_id: TaskId, at: DateTime<Utc>) -> Self {
        Self {
            success: true,
            mock: MockFlag,
            message: "Cancel task functionality not implemented".to_string(),
            task_id,
            mock_reference: format!("mock_cancel_tx_{}", at.timestamp()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockTaskInfo {
    pub mock: MockFlag,
    pub message: String,
    pub task_agent: Address,
    pub service_agent: Address,
    pub pay_amount: u64,
    pub created_at: i64,
    pub deadline: i64,
    pub is_completed: bool,
    pub is_cancelled: bool,
    pub description: String,
}

impl MockTaskInfo {
    #[must_use]
    pub fn new(task_agent: Address, task_id: &TaskId, at: DateTime<Utc>) -> Self {
        let created_at = at.timestamp();
        Self {
            mock: MockFlag,
            message: "Get task info functionality not implemented".to_string(),
            task_agent,
            service_agent: Address::zero(),
            pay_amount: MOCK_PAY_AMOUNT,
            created_at,
            deadline: created_at.saturating_add(MOCK_DEADLINE_OFFSET_SECS),
            is_completed: false,
            is_cancelled: false,
            description: format!("Mock task info for {task_id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockTaskStats {
    pub mock: MockFlag,
    pub message: String,
    pub task_agent: Address,
    pub total_tasks: u32,
    pub completed_tasks: u32,
    pub cancelled_tasks: u32,
}

impl MockTaskStats {
    #[must_use]
    pub fn new(task_agent: Address) -> Self {
        Self {
            mock: MockFlag,
            message: "Get task stats functionality not implemented".to_string(),
            task_agent,
            total_tasks: 5,
            completed_tasks: 3,
            cancelled_tasks: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockExpiry {
    pub mock: MockFlag,
    pub task_agent: Address,
    pub task_id: TaskId,
    pub expired: bool,
}

impl MockExpiry {
    #[must_use]
    pub const fn new(task_agent: Address, task_id: TaskId) -> Self {
        Self {
            mock: MockFlag,
            task_agent,
            task_id,
            expired: false,
        }
    }
}
