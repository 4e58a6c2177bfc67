use super::amount::BaseUnits;
use super::identifiers::{Address, Description, TaskId};
use serde::{Deserialize, Serialize};

/// Parameters for escrowing a payment into a new task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    pub task_id: TaskId,
    pub service_agent: Address,
    /// Escrowed payment in base units.
    pub amount: BaseUnits,
    pub deadline_seconds: u64,
    pub description: Description,
}

/// A serialized signature as produced by the chain SDK.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedMessage {
    pub message: String,
    /// Base64 serialized signature (`flag || signature || public key` on SUI).
    pub signature: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
}
