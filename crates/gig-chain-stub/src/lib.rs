//! # gig-chain-stub — Simulated Chain
//!
//! An in-memory chain behind the [`RpcTransport`] trait, for integration
//! tests and the CLI demo mode. Mining is instantaneous: every
//! transaction gets a receipt in the next block, so confirmation waiting
//! completes on the first poll. Reverted transactions are mined with
//! status `0x0`, and replaying them as `eth_call` surfaces the revert
//! reason exactly as a node would.

mod world;

use parking_lot::Mutex;
use serde_json::{json, Value};

use gig_chain::{RpcError, RpcTransport};
use gig_core::hex::{decode_hex, encode_hex, encode_quantity};
use gig_core::Address;

use world::World;

/// The simulated chain. Cheap to share by reference; all state lives
/// behind one lock.
pub struct StubChain {
    world: Mutex<World>,
}

impl StubChain {
    /// A chain with ten funded-by-nothing development accounts.
    pub fn new() -> Self {
        Self::with_accounts(10)
    }

    /// A chain with `count` development accounts.
    pub fn with_accounts(count: usize) -> Self {
        Self {
            world: Mutex::new(World::new(count)),
        }
    }

    /// The settlement-token contract address.
    pub fn token_address(&self) -> Address {
        self.world.lock().token().clone()
    }

    /// The market factory address.
    pub fn market_maker_address(&self) -> Address {
        self.world.lock().market_maker().clone()
    }

    /// The dispute factory address.
    pub fn dispute_factory_address(&self) -> Address {
        self.world.lock().dispute_factory().clone()
    }

    /// The development account at `index`, if present.
    pub fn account(&self, index: usize) -> Option<Address> {
        self.world.lock().accounts().get(index).cloned()
    }

    /// Deploy a fresh, unbound escrow and return its address. Stands in
    /// for the escrow migration step of a real deployment.
    pub fn deploy_escrow(&self) -> Address {
        self.world.lock().allocate_escrow()
    }

    fn handle_call(&self, params: &Value) -> Result<Value, RpcError> {
        let tx = params
            .get(0)
            .and_then(Value::as_object)
            .ok_or_else(invalid_params)?;
        let to = parse_address(tx.get("to"))?;
        let from = tx.get("from").map(|v| parse_address(Some(v))).transpose()?;
        let data = parse_data(tx.get("data"))?;

        let world = self.world.lock();
        if let Some(result) = world.view(&to, &data) {
            return match result {
                Ok(bytes) => Ok(json!(encode_hex(&bytes))),
                Err(reason) => Err(revert_error("eth_call", &reason)),
            };
        }

        // Not a view: simulate the mutation on a copy and report only
        // success or the revert reason. This is the path the connector's
        // revert-reason recovery takes.
        let mut scratch = world.clone();
        drop(world);
        let sender = from.unwrap_or(to.clone());
        match scratch.execute(&sender, &to, &data) {
            Ok(_) => Ok(json!("0x")),
            Err(reason) => Err(revert_error("eth_call", &reason)),
        }
    }

    fn handle_send(&self, params: &Value) -> Result<Value, RpcError> {
        let tx = params
            .get(0)
            .and_then(Value::as_object)
            .ok_or_else(invalid_params)?;
        let from = parse_address(tx.get("from"))?;
        let to = parse_address(tx.get("to"))?;
        let data = parse_data(tx.get("data"))?;

        let mut world = self.world.lock();
        // Execute against a copy and commit it only on success, so a
        // reverted transaction leaves no partial state behind and the
        // replay path sees the same pre-state the transaction saw.
        let mut scratch = world.clone();
        let outcome = scratch.execute(&from, &to, &data);
        if outcome.is_ok() {
            *world = scratch;
        }
        world.block += 1;
        let tx_hash = format!("0x{:064x}", world.next_tx);
        world.next_tx += 1;

        let (status, logs) = match outcome {
            Ok(records) => (
                "0x1",
                records
                    .iter()
                    .map(|r| {
                        json!({
                            "address": r.address.as_str(),
                            "topics": r.topics,
                            "data": encode_hex(&r.data),
                        })
                    })
                    .collect::<Vec<_>>(),
            ),
            Err(_) => ("0x0", Vec::new()),
        };
        let receipt = json!({
            "transactionHash": tx_hash,
            "blockNumber": encode_quantity(world.block),
            "status": status,
            "contractAddress": null,
            "logs": logs,
        });
        world.receipts.insert(tx_hash.clone(), receipt);
        Ok(json!(tx_hash))
    }
}

impl Default for StubChain {
    fn default() -> Self {
        Self::new()
    }
}

impl RpcTransport for StubChain {
    async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        match method {
            "eth_accounts" => {
                let world = self.world.lock();
                let accounts: Vec<&str> =
                    world.accounts().iter().map(|a| a.as_str()).collect();
                Ok(json!(accounts))
            }
            "eth_blockNumber" => Ok(json!(encode_quantity(self.world.lock().block))),
            "eth_call" => self.handle_call(&params),
            "eth_sendTransaction" => self.handle_send(&params),
            "eth_getTransactionReceipt" => {
                let hash = params
                    .get(0)
                    .and_then(Value::as_str)
                    .ok_or_else(invalid_params)?;
                let world = self.world.lock();
                Ok(world.receipts.get(hash).cloned().unwrap_or(Value::Null))
            }
            other => Err(RpcError::Rpc {
                method: other.to_string(),
                code: -32601,
                message: format!("method not found: {other}"),
                data: None,
            }),
        }
    }
}

fn invalid_params() -> RpcError {
    RpcError::Rpc {
        method: String::new(),
        code: -32602,
        message: "invalid params".to_string(),
        data: None,
    }
}

fn revert_error(method: &str, reason: &str) -> RpcError {
    RpcError::Rpc {
        method: method.to_string(),
        code: 3,
        message: format!("execution reverted: {reason}"),
        data: None,
    }
}

fn parse_address(value: Option<&Value>) -> Result<Address, RpcError> {
    value
        .and_then(Value::as_str)
        .and_then(|s| Address::new(s).ok())
        .ok_or_else(invalid_params)
}

fn parse_data(value: Option<&Value>) -> Result<Vec<u8>, RpcError> {
    match value.and_then(Value::as_str) {
        Some(hex) => decode_hex(hex).map_err(|_| invalid_params()),
        None => Ok(Vec::new()),
    }
}
