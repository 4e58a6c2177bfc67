#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

//! Task lifecycle operations against the `task_manager` Move module.
//!
//! Only creation and completion reach the chain. The remaining operations
//! answer with clearly marked placeholder payloads; see
//! [`TaskOperation::capability`].

use crate::client::ChainClient;
use crate::config::{env, ChainConfig};
use crate::error::{BridgeError, Result};
use crate::types::{
    Address, Capability, CreateTaskRequest, FailureKind, MockCancellation, MockExpiry,
    MockTaskInfo, MockTaskStats, ObjectId, OperationResult, TaskId, TaskOperation,
};
use chrono::Utc;
use tracing::{error, info, warn};

pub struct TaskManager<'a, C: ChainClient + ?Sized> {
    config: &'a ChainConfig,
    client: &'a C,
}

impl<'a, C: ChainClient + ?Sized> TaskManager<'a, C> {
    #[must_use]
    pub const fn new(config: &'a ChainConfig, client: &'a C) -> Self {
        Self { config, client }
    }

    #[must_use]
    pub const fn capability(&self, operation: TaskOperation) -> Capability {
        operation.capability()
    }

    /// Escrows `request.amount` into a new task object.
    ///
    /// # Errors
    /// Returns `BridgeError::InvalidParameter` for a zero amount or deadline.
    /// Remote failures are reported through the returned `OperationResult`.
    pub async fn create_task(&self, request: &CreateTaskRequest) -> Result<OperationResult> {
        if request.amount.value() == 0 {
            return Err(BridgeError::invalid("amount", "must be greater than zero"));
        }
        if request.deadline_seconds == 0 {
            return Err(BridgeError::invalid(
                "deadline_seconds",
                "must be greater than zero",
            ));
        }

        info!(
            task_id = %request.task_id,
            service_agent = %request.service_agent,
            amount = %request.amount,
            deadline_seconds = request.deadline_seconds,
            "creating task"
        );
        let result = self
            .client
            .create_task(self.config.settings(), request)
            .await;
        log_result(TaskOperation::CreateTask, &result);
        Ok(result)
    }

    /// Completes a task with the service agent's key.
    ///
    /// A missing service agent key is reported as a failed result, matching
    /// every other remote failure.
    pub async fn complete_task(&self, task_object_id: &ObjectId) -> OperationResult {
        let Some(signer) = self.config.settings().service_agent_key() else {
            warn!(%task_object_id, "cannot complete task without service agent key");
            return OperationResult::failed(
                FailureKind::Internal,
                format!("{} not found", env::SERVICE_AGENT_PRIVATE_KEY),
            );
        };

        info!(%task_object_id, "completing task");
        let result = self
            .client
            .complete_task(self.config.settings(), signer, task_object_id)
            .await;
        log_result(TaskOperation::CompleteTask, &result);
        result
    }

    #[must_use]
    pub fn cancel_task(&self, task_id: &TaskId) -> MockCancellation {
        info!(%task_id, "cancel_task is not implemented on chain; returning mock");
        MockCancellation::new(task_id.clone(), Utc::now())
    }

    #[must_use]
    pub fn task_info(&self, task_agent: &Address, task_id: &TaskId) -> MockTaskInfo {
        info!(%task_agent, %task_id, "get_task_info is not implemented on chain; returning mock");
        MockTaskInfo::new(task_agent.clone(), task_id, Utc::now())
    }

    #[must_use]
    pub fn task_stats(&self, task_agent: &Address) -> MockTaskStats {
        info!(%task_agent, "get_task_stats is not implemented on chain; returning mock");
        MockTaskStats::new(task_agent.clone())
    }

    #[must_use]
    pub fn is_task_expired(&self, task_agent: &Address, task_id: &TaskId) -> MockExpiry {
        info!(%task_agent, %task_id, "is_task_expired is not implemented on chain; returning mock");
        MockExpiry::new(task_agent.clone(), task_id.clone())
    }
}

fn log_result(operation: TaskOperation, result: &OperationResult) {
    match &result.error {
        None => info!(
            operation = operation.as_str(),
            tx_hash = result.tx_hash.as_deref().unwrap_or("-"),
            explorer = result.explorer_url.as_deref().unwrap_or("-"),
            "transaction succeeded"
        ),
        Some(failure) if failure.is_timeout() => warn!(
            operation = operation.as_str(),
            error = %failure.message,
            "transaction timed out; it may still land on chain"
        ),
        Some(failure) => error!(
            operation = operation.as_str(),
            kind = %failure.kind,
            error = %failure.message,
            "transaction failed"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::TaskManager;
    use crate::config::{env, ChainConfig};
    use crate::error::BridgeError;
    use crate::test_support::{settings_from_env, FakeChainClient};
    use crate::types::{
        Address, BaseUnits, Capability, CreateTaskRequest, Description, FailureKind, ObjectId,
        OperationResult, TaskId, TaskOperation, MOCK_DEADLINE_OFFSET_SECS, MOCK_PAY_AMOUNT,
    };

    fn request(amount: u128, deadline_seconds: u64) -> Result<CreateTaskRequest, String> {
        Ok(CreateTaskRequest {
            task_id: TaskId::parse("task-42").map_err(|e| e.to_string())?,
            service_agent: Address::parse("0x2").map_err(|e| e.to_string())?,
            amount: BaseUnits(amount),
            deadline_seconds,
            description: Description::parse("translate a document").map_err(|e| e.to_string())?,
        })
    }

    async fn config_with(
        pairs: &[(&str, &str)],
        client: &FakeChainClient,
    ) -> Result<ChainConfig, String> {
        Ok(ChainConfig::load(settings_from_env(pairs)?, client).await)
    }

    #[tokio::test]
    async fn create_task_passes_through_client_result() -> Result<(), String> {
        let client = FakeChainClient::healthy("0x1");
        let config = config_with(&[], &client).await?;
        let result = TaskManager::new(&config, &client)
            .create_task(&request(1_000, 3_600)?)
            .await
            .map_err(|e| e.to_string())?;

        assert!(result.success);
        assert_eq!(result.task_object_id.as_deref(), Some("0xfeed"));
        assert_eq!(client.calls(), vec!["derive_address", "create_task"]);
        Ok(())
    }

    #[tokio::test]
    async fn create_task_rejects_zero_amount_before_any_remote_call() -> Result<(), String> {
        let client = FakeChainClient::healthy("0x1");
        let config = config_with(&[], &client).await?;
        let manager = TaskManager::new(&config, &client);

        assert!(matches!(
            manager.create_task(&request(0, 3_600)?).await,
            Err(BridgeError::InvalidParameter { .. })
        ));
        assert!(matches!(
            manager.create_task(&request(10, 0)?).await,
            Err(BridgeError::InvalidParameter { .. })
        ));
        assert!(!client.calls().contains(&"create_task"));
        Ok(())
    }

    #[tokio::test]
    async fn create_task_timeout_is_a_result_not_an_error() -> Result<(), String> {
        let client = FakeChainClient::healthy("0x1").with_create(OperationResult::failed(
            FailureKind::Timeout,
            "create_task timed out after 120 seconds",
        ));
        let config = config_with(&[], &client).await?;
        let result = TaskManager::new(&config, &client)
            .create_task(&request(5, 60)?)
            .await
            .map_err(|e| e.to_string())?;

        assert!(!result.success);
        assert!(result.is_timeout());
        assert!(result.tx_hash.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn complete_task_without_service_key_fails_without_remote_call() -> Result<(), String> {
        let client = FakeChainClient::healthy("0x1");
        let config = config_with(&[], &client).await?;
        let task_object = ObjectId::parse("0xabc").map_err(|e| e.to_string())?;
        let result = TaskManager::new(&config, &client)
            .complete_task(&task_object)
            .await;

        assert!(!result.success);
        assert_eq!(
            result.error.map(|f| f.message),
            Some("SERVICE_AGENT_PRIVATE_KEY not found".to_string())
        );
        assert!(!client.calls().contains(&"complete_task"));
        Ok(())
    }

    #[tokio::test]
    async fn complete_task_with_service_key_reaches_chain() -> Result<(), String> {
        let client = FakeChainClient::healthy("0x1");
        let config = config_with(&[(env::SERVICE_AGENT_PRIVATE_KEY, "fedcba98")], &client).await?;
        let task_object = ObjectId::parse("0xabc").map_err(|e| e.to_string())?;
        let result = TaskManager::new(&config, &client)
            .complete_task(&task_object)
            .await;

        assert!(result.success);
        assert!(result.task_completed);
        assert_eq!(result.task_object_id.as_deref(), Some("0xabc"));
        Ok(())
    }

    #[tokio::test]
    async fn mock_operations_never_touch_the_client() -> Result<(), String> {
        let client = FakeChainClient::healthy("0x1");
        let config = config_with(&[], &client).await?;
        let manager = TaskManager::new(&config, &client);
        let agent = Address::parse("0x1").map_err(|e| e.to_string())?;
        let task_id = TaskId::parse("task-42").map_err(|e| e.to_string())?;

        let info = manager.task_info(&agent, &task_id);
        assert_eq!(info.pay_amount, MOCK_PAY_AMOUNT);
        assert_eq!(info.deadline - info.created_at, MOCK_DEADLINE_OFFSET_SECS);
        assert_eq!(info.service_agent, Address::zero());

        let stats = manager.task_stats(&agent);
        assert_eq!(
            (stats.total_tasks, stats.completed_tasks, stats.cancelled_tasks),
            (5, 3, 1)
        );
        assert!(!manager.is_task_expired(&agent, &task_id).expired);
        assert!(manager.cancel_task(&task_id).success);

        assert_eq!(client.calls(), vec!["derive_address"]);
        assert_eq!(manager.capability(TaskOperation::TaskStats), Capability::Mock);
        assert_eq!(manager.capability(TaskOperation::CreateTask), Capability::Real);
        Ok(())
    }
}
