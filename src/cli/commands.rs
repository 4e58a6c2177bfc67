#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use crate::types::{Address, Description, ObjectId, TaskId};

#[derive(Debug, Clone)]
pub enum CliCommand {
    Help,
    Capabilities,
    Address,
    Balance {
        address: Option<Address>,
    },
    Connect,
    CreateTask {
        task_id: TaskId,
        service_agent: Address,
        amount: u128,
        deadline_seconds: u64,
        description: Description,
    },
    CompleteTask {
        task_object_id: ObjectId,
    },
    CancelTask {
        task_id: TaskId,
    },
    TaskInfo {
        task_agent: Option<Address>,
        task_id: TaskId,
    },
    TaskStats {
        task_agent: Option<Address>,
    },
    TaskExpired {
        task_agent: Option<Address>,
        task_id: TaskId,
    },
    Sign {
        message: String,
    },
    VerifySignature {
        message: String,
        signature: String,
        public_key: Option<String>,
    },
    Faucet {
        address: Option<Address>,
        amount: Option<u128>,
    },
    EnsureBalance {
        min_balance: Option<u128>,
        amount: Option<u128>,
    },
    Smoke {
        text: bool,
    },
}

pub const COMMAND_NAMES: &[&str] = &[
    "help",
    "capabilities",
    "address",
    "balance",
    "connect",
    "create-task",
    "complete-task",
    "cancel-task",
    "task-info",
    "task-stats",
    "task-expired",
    "sign",
    "verify-signature",
    "faucet",
    "ensure-balance",
    "smoke",
];

/// Command-specific flags accepted after the command name.
#[must_use]
pub fn allowed_flags(command: &str) -> &'static [&'static str] {
    match command {
        "balance" => &["--address"],
        "create-task" => &[
            "--task-id",
            "--service-agent",
            "--amount",
            "--deadline-seconds",
            "--description",
        ],
        "complete-task" => &["--task-object-id"],
        "cancel-task" => &["--task-id"],
        "task-info" | "task-expired" => &["--task-agent", "--task-id"],
        "task-stats" => &["--task-agent"],
        "sign" => &["--message"],
        "verify-signature" => &["--message", "--signature", "--public-key"],
        "faucet" => &["--address", "--amount"],
        "ensure-balance" => &["--min-balance", "--amount"],
        "smoke" => &["--text"],
        _ => &[],
    }
}

pub const HELP_TEXT: &str = "\
bridge - run chain SDK operations for the task_manager contract

USAGE:
    bridge [--chain sui|aptos] [--network NAME] [--private-key KEY] <command> [flags]

COMMANDS:
    address                              Derive the account address from the key
    balance [--address A]                Account balance in base units
    connect                              Check the node answers; prints the chain id
    create-task --task-id ID --service-agent A --amount N
                --deadline-seconds S --description TEXT
                                         Escrow N base units into a new task
    complete-task --task-object-id O     Complete a task with SERVICE_AGENT_PRIVATE_KEY
    cancel-task --task-id ID             (mock) Cancel a task
    task-info [--task-agent A] --task-id ID
                                         (mock) Task details
    task-stats [--task-agent A]          (mock) Per-agent task counters
    task-expired [--task-agent A] --task-id ID
                                         (mock) Deadline check
    sign --message TEXT                  Sign a personal message (sui)
    verify-signature --message TEXT --signature SIG [--public-key PK]
                                         Verify a serialized Ed25519 signature
    faucet [--address A] [--amount N]    Request test tokens once
    ensure-balance [--min-balance N] [--amount N]
                                         Fund the account if below the minimum
    smoke [--text]                       Run the end-to-end verification steps
    capabilities                         Which task operations are real or mock
    help                                 Show this text

Flags take `--flag value` or `--flag=value`; a value that itself starts
with `--` must use the `=` form (sign --message=--hello).

Output is one JSON envelope on stdout; logs go to stderr (RUST_LOG).
Configuration is read from the environment and a .env file.";
