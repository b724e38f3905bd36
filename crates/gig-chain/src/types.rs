//! Request and receipt types for the chain connector.
//!
//! Receipts are parsed defensively: a field the node omits or mangles is a
//! [`ChainError::Malformed`], never a silently defaulted value.

use serde_json::Value;

use gig_core::hex::{decode_hex, parse_quantity};
use gig_core::{Address, TxHash};

use crate::error::ChainError;

/// A read-only `eth_call` request.
#[derive(Debug, Clone)]
pub struct CallRequest {
    /// Contract to call.
    pub to: Address,
    /// ABI-encoded calldata.
    pub data: Vec<u8>,
    /// Optional caller identity for view functions that branch on sender.
    pub from: Option<Address>,
}

impl CallRequest {
    /// A call with no explicit caller.
    pub fn new(to: Address, data: Vec<u8>) -> Self {
        Self { to, data, from: None }
    }

    /// Set the caller identity.
    pub fn with_from(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }
}

/// A state-changing transaction request. The `from` account comes from the
/// signer passed to `send`, never from the request itself.
#[derive(Debug, Clone)]
pub struct TxRequest {
    /// Target contract; `None` deploys the calldata as a new contract.
    pub to: Option<Address>,
    /// ABI-encoded calldata (or init code for a deployment).
    pub data: Vec<u8>,
    /// Native value to attach, in wei.
    pub value: u128,
}

impl TxRequest {
    /// A zero-value call transaction.
    pub fn call(to: Address, data: Vec<u8>) -> Self {
        Self {
            to: Some(to),
            data,
            value: 0,
        }
    }

    /// A contract deployment transaction.
    pub fn deploy(init_code: Vec<u8>) -> Self {
        Self {
            to: None,
            data: init_code,
            value: 0,
        }
    }
}

/// One log entry from a transaction receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Contract that emitted the log.
    pub address: Address,
    /// Topic list; `topics[0]` is the event signature hash.
    pub topics: Vec<String>,
    /// ABI-encoded non-indexed event data.
    pub data: Vec<u8>,
}

/// A mined transaction receipt.
#[derive(Debug, Clone)]
pub struct TxReceipt {
    /// Hash of the mined transaction.
    pub transaction_hash: TxHash,
    /// Block the transaction was included in.
    pub block_number: u64,
    /// Whether the transaction succeeded (`status == 0x1`).
    pub succeeded: bool,
    /// Address of the deployed contract, for deployment transactions.
    pub contract_address: Option<Address>,
    /// Logs emitted during execution.
    pub logs: Vec<LogEntry>,
}

impl TxReceipt {
    /// Parse a receipt from the node's JSON representation.
    pub fn from_json(value: &Value) -> Result<Self, ChainError> {
        let obj = value.as_object().ok_or_else(|| ChainError::Malformed {
            reason: "receipt is not a JSON object".to_string(),
        })?;

        let transaction_hash = obj
            .get("transactionHash")
            .and_then(Value::as_str)
            .ok_or_else(|| ChainError::Malformed {
                reason: "receipt missing transactionHash".to_string(),
            })
            .and_then(|s| TxHash::new(s).map_err(ChainError::from))?;

        let block_number = obj
            .get("blockNumber")
            .and_then(Value::as_str)
            .ok_or_else(|| ChainError::Malformed {
                reason: "receipt missing blockNumber".to_string(),
            })
            .and_then(|s| parse_quantity(s).map_err(ChainError::from))?;

        let succeeded = match obj.get("status").and_then(Value::as_str) {
            Some("0x1") => true,
            Some("0x0") => false,
            other => {
                return Err(ChainError::Malformed {
                    reason: format!("receipt status is not 0x0/0x1: {other:?}"),
                })
            }
        };

        let contract_address = match obj.get("contractAddress") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(Address::new(s.as_str())?),
            Some(other) => {
                return Err(ChainError::Malformed {
                    reason: format!("receipt contractAddress is not a string: {other}"),
                })
            }
        };

        let mut logs = Vec::new();
        if let Some(raw_logs) = obj.get("logs").and_then(Value::as_array) {
            for raw in raw_logs {
                logs.push(parse_log(raw)?);
            }
        }

        Ok(Self {
            transaction_hash,
            block_number,
            succeeded,
            contract_address,
            logs,
        })
    }
}

fn parse_log(value: &Value) -> Result<LogEntry, ChainError> {
    let obj = value.as_object().ok_or_else(|| ChainError::Malformed {
        reason: "log entry is not a JSON object".to_string(),
    })?;
    let address = obj
        .get("address")
        .and_then(Value::as_str)
        .ok_or_else(|| ChainError::Malformed {
            reason: "log entry missing address".to_string(),
        })
        .and_then(|s| Address::new(s).map_err(ChainError::from))?;
    let topics = obj
        .get("topics")
        .and_then(Value::as_array)
        .map(|ts| {
            ts.iter()
                .filter_map(Value::as_str)
                .map(|s| s.to_ascii_lowercase())
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    let data = match obj.get("data").and_then(Value::as_str) {
        Some(hex) => decode_hex(hex)?,
        None => Vec::new(),
    };
    Ok(LogEntry {
        address,
        topics,
        data,
    })
}
