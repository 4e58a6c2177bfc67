mod amount;
mod identifiers;
mod mock;
mod requests;
mod results;

pub use amount::BaseUnits;
pub use identifiers::{Address, Description, ObjectId, TaskId};
pub use mock::{
    Capability, MockCancellation, MockExpiry, MockFlag, MockTaskInfo, MockTaskStats,
    TaskOperation, MOCK_DEADLINE_OFFSET_SECS, MOCK_PAY_AMOUNT,
};
pub use requests::{CreateTaskRequest, SignedMessage};
pub use results::{FailureKind, OperationFailure, OperationResult, QueryOutcome};
