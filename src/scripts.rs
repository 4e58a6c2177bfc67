//! Fixed SDK scripts, one per chain and operation.
//!
//! No value is ever spliced into script source. Each script reads one JSON
//! document from stdin and reports through the line protocol parsed by
//! [`crate::parsing`]: `SUCCESS` followed by `KEY:value` lines on stdout, or
//! `ERROR: ...` on stderr with a non-zero exit.

use crate::config::Chain;
use std::time::Duration;

pub const SHORT_CALL_TIMEOUT: Duration = Duration::from_secs(30);
pub const COMPLETE_TASK_TIMEOUT: Duration = Duration::from_secs(60);
pub const CREATE_TASK_TIMEOUT: Duration = Duration::from_secs(120);

/// Gas budget attached to task transactions, in MIST.
pub const TASK_GAS_BUDGET: u64 = 20_000_000;
/// Shared clock object passed to time-aware Move calls.
pub const SUI_CLOCK_OBJECT_ID: &str = "0x6";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptKind {
    DeriveAddress,
    Balance,
    CheckConnection,
    CreateTask,
    CompleteTask,
    SignMessage,
}

impl ScriptKind {
    #[must_use]
    pub const fn operation(self) -> &'static str {
        match self {
            Self::DeriveAddress => "derive_address",
            Self::Balance => "get_balance",
            Self::CheckConnection => "check_connection",
            Self::CreateTask => "create_task",
            Self::CompleteTask => "complete_task",
            Self::SignMessage => "sign_message",
        }
    }

    #[must_use]
    pub const fn timeout(self) -> Duration {
        match self {
            Self::CreateTask => CREATE_TASK_TIMEOUT,
            Self::CompleteTask => COMPLETE_TASK_TIMEOUT,
            Self::DeriveAddress | Self::Balance | Self::CheckConnection | Self::SignMessage => {
                SHORT_CALL_TIMEOUT
            }
        }
    }
}

/// Script text for `kind` on `chain`, or `None` when the chain has no such script.
#[must_use]
pub const fn script_for(chain: Chain, kind: ScriptKind) -> Option<&'static str> {
    match (chain, kind) {
        (Chain::Sui, ScriptKind::DeriveAddress) => Some(SUI_DERIVE_ADDRESS),
        (Chain::Sui, ScriptKind::Balance) => Some(SUI_BALANCE),
        (Chain::Sui, ScriptKind::CheckConnection) => Some(SUI_CHECK_CONNECTION),
        (Chain::Sui, ScriptKind::CreateTask) => Some(SUI_CREATE_TASK),
        (Chain::Sui, ScriptKind::CompleteTask) => Some(SUI_COMPLETE_TASK),
        (Chain::Sui, ScriptKind::SignMessage) => Some(SUI_SIGN_MESSAGE),
        (Chain::Aptos, ScriptKind::DeriveAddress) => Some(APTOS_DERIVE_ADDRESS),
        (Chain::Aptos, ScriptKind::Balance) => Some(APTOS_BALANCE),
        (Chain::Aptos, ScriptKind::CheckConnection) => Some(APTOS_CHECK_CONNECTION),
        (
            Chain::Aptos,
            ScriptKind::CreateTask | ScriptKind::CompleteTask | ScriptKind::SignMessage,
        ) => None,
    }
}

macro_rules! stdin_script {
    ($($body:literal),+ $(,)?) => {
        concat!(
            "\"use strict\";\n",
            "function fail(error) {\n",
            "  const message = error && error.message ? error.message : String(error);\n",
            "  console.error(\"ERROR:\", message);\n",
            "  process.exit(1);\n",
            "}\n",
            "const chunks = [];\n",
            "process.stdin.on(\"data\", (chunk) => chunks.push(chunk));\n",
            "process.stdin.on(\"end\", () => {\n",
            "  let params;\n",
            "  try {\n",
            "    params = JSON.parse(Buffer.concat(chunks).toString(\"utf8\"));\n",
            "  } catch (error) {\n",
            "    fail(error);\n",
            "    return;\n",
            "  }\n",
            "  Promise.resolve().then(() => main(params)).then(() => process.exit(0), fail);\n",
            "});\n",
            $($body),+
        )
    };
}

macro_rules! sui_script {
    ($($body:literal),+ $(,)?) => {
        stdin_script!(
            "const { Ed25519Keypair } = require(\"@mysten/sui/keypairs/ed25519\");\n",
            "const { SuiClient, getFullnodeUrl } = require(\"@mysten/sui/client\");\n",
            "function keypair(secret) {\n",
            "  if (secret.startsWith(\"suiprivkey\")) {\n",
            "    return Ed25519Keypair.fromSecretKey(secret);\n",
            "  }\n",
            "  return Ed25519Keypair.fromSecretKey(Uint8Array.from(Buffer.from(secret, \"hex\")));\n",
            "}\n",
            "function client(params) {\n",
            "  return new SuiClient({ url: params.node_url || getFullnodeUrl(params.network) });\n",
            "}\n",
            $($body),+
        )
    };
}

macro_rules! aptos_script {
    ($($body:literal),+ $(,)?) => {
        stdin_script!(
            "const sdk = require(\"@aptos-labs/ts-sdk\");\n",
            "function client(params) {\n",
            "  const options = { network: params.network };\n",
            "  if (params.node_url) {\n",
            "    options.fullnode = params.node_url;\n",
            "  }\n",
            "  return new sdk.Aptos(new sdk.AptosConfig(options));\n",
            "}\n",
            $($body),+
        )
    };
}

pub const SUI_DERIVE_ADDRESS: &str = sui_script!(
    "async function main(params) {\n",
    "  const address = keypair(params.private_key).toSuiAddress();\n",
    "  console.log(\"SUCCESS\");\n",
    "  console.log(`ADDRESS:${address}`);\n",
    "}\n",
);

pub const SUI_BALANCE: &str = sui_script!(
    "async function main(params) {\n",
    "  const balance = await client(params).getBalance({ owner: params.owner });\n",
    "  console.log(\"SUCCESS\");\n",
    "  console.log(`BALANCE:${balance.totalBalance}`);\n",
    "}\n",
);

pub const SUI_CHECK_CONNECTION: &str = sui_script!(
    "async function main(params) {\n",
    "  const chainId = await client(params).getChainIdentifier();\n",
    "  console.log(\"SUCCESS\");\n",
    "  console.log(`CHAIN_ID:${chainId}`);\n",
    "}\n",
);

pub const SUI_CREATE_TASK: &str = sui_script!(
    "const { Transaction } = require(\"@mysten/sui/transactions\");\n",
    "async function main(params) {\n",
    "  const signer = keypair(params.private_key);\n",
    "  const tx = new Transaction();\n",
    "  const [coin] = tx.splitCoins(tx.gas, [tx.pure.u64(BigInt(params.amount))]);\n",
    "  tx.moveCall({\n",
    "    target: params.target,\n",
    "    arguments: [\n",
    "      tx.pure.string(params.task_id),\n",
    "      tx.pure.address(params.service_agent),\n",
    "      coin,\n",
    "      tx.pure.u64(BigInt(params.deadline_seconds)),\n",
    "      tx.pure.string(params.description),\n",
    "      tx.object(params.task_manager_id),\n",
    "      tx.object(params.clock_id),\n",
    "    ],\n",
    "  });\n",
    "  tx.setGasBudget(BigInt(params.gas_budget));\n",
    "  const result = await client(params).signAndExecuteTransaction({\n",
    "    transaction: tx,\n",
    "    signer,\n",
    "    options: { showEffects: true, showObjectChanges: true, showEvents: true },\n",
    "  });\n",
    "  console.log(\"SUCCESS\");\n",
    "  console.log(`TX_HASH:${result.digest}`);\n",
    "  const created = (result.events || []).find((event) => event.type.includes(\"TaskCreatedEvent\"));\n",
    "  if (created && created.parsedJson && created.parsedJson.task_object_id) {\n",
    "    console.log(`TASK_OBJECT_ID:${created.parsedJson.task_object_id}`);\n",
    "  }\n",
    "  const object = (result.objectChanges || []).find(\n",
    "    (change) => change.type === \"created\" && change.objectType && change.objectType.includes(\"Task\"),\n",
    "  );\n",
    "  if (object) {\n",
    "    console.log(`TASK_OBJECT_ID:${object.objectId}`);\n",
    "  }\n",
    "}\n",
);

pub const SUI_COMPLETE_TASK: &str = sui_script!(
    "const { Transaction } = require(\"@mysten/sui/transactions\");\n",
    "async function main(params) {\n",
    "  const signer = keypair(params.private_key);\n",
    "  const tx = new Transaction();\n",
    "  tx.moveCall({\n",
    "    target: params.target,\n",
    "    arguments: [\n",
    "      tx.object(params.task_object_id),\n",
    "      tx.object(params.task_manager_id),\n",
    "      tx.object(params.clock_id),\n",
    "    ],\n",
    "  });\n",
    "  tx.setGasBudget(BigInt(params.gas_budget));\n",
    "  const result = await client(params).signAndExecuteTransaction({\n",
    "    transaction: tx,\n",
    "    signer,\n",
    "    options: { showEffects: true, showObjectChanges: true, showEvents: true },\n",
    "  });\n",
    "  console.log(\"SUCCESS\");\n",
    "  console.log(`TX_HASH:${result.digest}`);\n",
    "  const completed = (result.events || []).find((event) => event.type.includes(\"TaskCompletedEvent\"));\n",
    "  if (completed) {\n",
    "    console.log(\"TASK_COMPLETED\");\n",
    "  }\n",
    "}\n",
);

pub const SUI_SIGN_MESSAGE: &str = sui_script!(
    "async function main(params) {\n",
    "  const signer = keypair(params.private_key);\n",
    "  const bytes = new TextEncoder().encode(params.message);\n",
    "  const signed = await signer.signPersonalMessage(bytes);\n",
    "  console.log(\"SUCCESS\");\n",
    "  console.log(`SIGNATURE:${signed.signature}`);\n",
    "  console.log(`PUBLIC_KEY:${signer.getPublicKey().toBase64()}`);\n",
    "}\n",
);

pub const APTOS_DERIVE_ADDRESS: &str = aptos_script!(
    "async function main(params) {\n",
    "  const privateKey = new sdk.Ed25519PrivateKey(params.private_key);\n",
    "  const account = sdk.Account.fromPrivateKey({ privateKey });\n",
    "  console.log(\"SUCCESS\");\n",
    "  console.log(`ADDRESS:${account.accountAddress.toString()}`);\n",
    "}\n",
);

pub const APTOS_BALANCE: &str = aptos_script!(
    "async function main(params) {\n",
    "  const amount = await client(params).getAccountAPTAmount({ accountAddress: params.owner });\n",
    "  console.log(\"SUCCESS\");\n",
    "  console.log(`BALANCE:${amount}`);\n",
    "}\n",
);

pub const APTOS_CHECK_CONNECTION: &str = aptos_script!(
    "async function main(params) {\n",
    "  const info = await client(params).getLedgerInfo();\n",
    "  console.log(\"SUCCESS\");\n",
    "  console.log(`CHAIN_ID:${info.chain_id}`);\n",
    "}\n",
);
