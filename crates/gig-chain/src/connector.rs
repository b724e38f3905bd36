//! # Chain Connector
//!
//! [`ChainConnector`] turns the raw JSON-RPC transport into the two
//! primitives the orchestration layers use: `call` (read-only) and `send`
//! (state-changing, confirmed before return).
//!
//! ## Confirmation
//!
//! `send` submits via `eth_sendTransaction`, then polls
//! `eth_getTransactionReceipt` until the transaction is mined or the
//! confirmation timeout elapses. A mined receipt with status `0x0` is
//! replayed as an `eth_call` to recover the revert reason, and surfaced as
//! [`ChainError::TransactionReverted`].
//!
//! ## Per-signer serialization
//!
//! The node sequences nonces per account, so two in-flight sends from the
//! same signer can race. The connector holds a per-signer async mutex from
//! submit through confirmation; distinct signers proceed concurrently.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde_json::{json, Map, Value};

use gig_core::hex::{decode_hex, encode_hex, encode_quantity_u128, parse_quantity};
use gig_core::Address;

use crate::error::{ChainError, RpcError};
use crate::signer::Signer;
use crate::transport::RpcTransport;
use crate::types::{CallRequest, TxReceipt, TxRequest};

/// Selector of the standard `Error(string)` revert payload.
/// keccak256("Error(string)")[0..4]
const ERROR_STRING_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

/// High-level chain access over any [`RpcTransport`].
pub struct ChainConnector<T: RpcTransport> {
    transport: Arc<T>,
    confirmation_timeout: Duration,
    poll_interval: Duration,
    signer_locks: DashMap<Address, Arc<tokio::sync::Mutex<()>>>,
}

impl<T: RpcTransport> ChainConnector<T> {
    /// Build a connector with explicit confirmation settings.
    pub fn new(transport: T, confirmation_timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            transport: Arc::new(transport),
            confirmation_timeout,
            poll_interval,
            signer_locks: DashMap::new(),
        }
    }

    /// The underlying transport, for callers that need raw RPC access.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// List the node-managed accounts.
    pub async fn accounts(&self) -> Result<Vec<Address>, ChainError> {
        let result = self.transport.request("eth_accounts", json!([])).await?;
        let raw = result.as_array().ok_or_else(|| ChainError::Malformed {
            reason: "eth_accounts result is not an array".to_string(),
        })?;
        let mut out = Vec::with_capacity(raw.len());
        for entry in raw {
            let s = entry.as_str().ok_or_else(|| ChainError::Malformed {
                reason: "eth_accounts entry is not a string".to_string(),
            })?;
            out.push(Address::new(s)?);
        }
        Ok(out)
    }

    /// Bind a signer to the node-managed account at `index`.
    pub async fn signer(&self, index: usize) -> Result<Signer, ChainError> {
        let accounts = self.accounts().await?;
        let available = accounts.len();
        accounts
            .into_iter()
            .nth(index)
            .map(Signer::new)
            .ok_or(ChainError::NoAccount { index, available })
    }

    /// Current chain head block number.
    pub async fn block_number(&self) -> Result<u64, ChainError> {
        let result = self.transport.request("eth_blockNumber", json!([])).await?;
        let s = result.as_str().ok_or_else(|| ChainError::Malformed {
            reason: "eth_blockNumber result is not a string".to_string(),
        })?;
        Ok(parse_quantity(s)?)
    }

    /// Read-only contract call against the latest block. Returns the raw
    /// ABI-encoded return data.
    pub async fn call(&self, request: &CallRequest) -> Result<Vec<u8>, ChainError> {
        let params = json!([call_params(request), "latest"]);
        let result = self.transport.request("eth_call", params).await?;
        let s = result.as_str().ok_or_else(|| ChainError::Malformed {
            reason: "eth_call result is not a string".to_string(),
        })?;
        Ok(decode_hex(s)?)
    }

    /// Submit a transaction from `signer` and wait for one confirmation.
    ///
    /// Holds the signer's lock from submit through confirmation so that
    /// sequential sends from one role never race on nonces.
    pub async fn send(&self, signer: &Signer, request: &TxRequest) -> Result<TxReceipt, ChainError> {
        let lock = self
            .signer_locks
            .entry(signer.address().clone())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        let tx = tx_params(signer, request);
        let result = self
            .transport
            .request("eth_sendTransaction", json!([tx]))
            .await?;
        let tx_hash = result
            .as_str()
            .ok_or_else(|| ChainError::Malformed {
                reason: "eth_sendTransaction result is not a string".to_string(),
            })?
            .to_string();

        tracing::debug!(%signer, tx_hash, "transaction submitted, awaiting confirmation");

        let receipt = self.wait_for_receipt(&tx_hash).await?;
        if receipt.succeeded {
            tracing::debug!(
                tx_hash,
                block = receipt.block_number,
                "transaction confirmed"
            );
            return Ok(receipt);
        }

        // Mined but reverted. Replay as a call to recover the reason.
        let reason = self.recover_revert_reason(signer, request).await;
        Err(ChainError::TransactionReverted { tx_hash, reason })
    }

    /// Poll for a receipt until mined or the confirmation timeout elapses.
    async fn wait_for_receipt(&self, tx_hash: &str) -> Result<TxReceipt, ChainError> {
        let started = Instant::now();
        loop {
            let result = self
                .transport
                .request("eth_getTransactionReceipt", json!([tx_hash]))
                .await?;
            if !result.is_null() {
                return TxReceipt::from_json(&result);
            }
            if started.elapsed() >= self.confirmation_timeout {
                return Err(ChainError::ConfirmationTimeout {
                    tx_hash: tx_hash.to_string(),
                    waited_ms: started.elapsed().as_millis() as u64,
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Replay a reverted transaction as `eth_call` and extract the revert
    /// reason from the resulting RPC error. Falls back to a generic marker
    /// if the node exposes nothing useful.
    async fn recover_revert_reason(&self, signer: &Signer, request: &TxRequest) -> String {
        let Some(to) = request.to.clone() else {
            return "deployment reverted".to_string();
        };
        let replay = CallRequest {
            to,
            data: request.data.clone(),
            from: Some(signer.address().clone()),
        };
        match self.call(&replay).await {
            Err(ChainError::Rpc(RpcError::Rpc { message, data, .. })) => {
                if let Some(reason) = data
                    .as_deref()
                    .and_then(|hex| decode_hex(hex).ok())
                    .and_then(|bytes| decode_revert_reason(&bytes))
                {
                    return reason;
                }
                message
                    .strip_prefix("execution reverted: ")
                    .unwrap_or(&message)
                    .to_string()
            }
            // The replay succeeding (or failing some other way) tells us
            // nothing about the original revert.
            _ => "reverted without reason".to_string(),
        }
    }
}

/// Decode an `Error(string)` revert payload into its message.
pub fn decode_revert_reason(payload: &[u8]) -> Option<String> {
    if payload.len() < 68 || payload[..4] != ERROR_STRING_SELECTOR {
        return None;
    }
    let body = &payload[4..];
    // Word 0: offset to the string head (always 0x20 here). Word 1: length.
    let len = u64::from_be_bytes(body[56..64].try_into().ok()?) as usize;
    let bytes = body.get(64..64 + len)?;
    String::from_utf8(bytes.to_vec()).ok()
}

fn call_params(request: &CallRequest) -> Value {
    let mut obj = Map::new();
    obj.insert("to".into(), json!(request.to.as_str()));
    obj.insert("data".into(), json!(encode_hex(&request.data)));
    if let Some(from) = &request.from {
        obj.insert("from".into(), json!(from.as_str()));
    }
    Value::Object(obj)
}

fn tx_params(signer: &Signer, request: &TxRequest) -> Value {
    let mut obj = Map::new();
    obj.insert("from".into(), json!(signer.address().as_str()));
    if let Some(to) = &request.to {
        obj.insert("to".into(), json!(to.as_str()));
    }
    obj.insert("data".into(), json!(encode_hex(&request.data)));
    if request.value > 0 {
        obj.insert("value".into(), json!(encode_quantity_u128(request.value)));
    }
    Value::Object(obj)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// Transport that replays a scripted sequence of responses.
    struct MockTransport {
        script: Mutex<VecDeque<Result<Value, RpcError>>>,
        log: Mutex<Vec<String>>,
    }

    impl MockTransport {
        fn new(script: Vec<Result<Value, RpcError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                log: Mutex::new(Vec::new()),
            }
        }

        fn methods(&self) -> Vec<String> {
            self.log.lock().clone()
        }
    }

    impl RpcTransport for MockTransport {
        async fn request(&self, method: &str, _params: Value) -> Result<Value, RpcError> {
            self.log.lock().push(method.to_string());
            self.script
                .lock()
                .pop_front()
                .unwrap_or_else(|| panic!("unscripted request: {method}"))
        }
    }

    fn addr(last: &str) -> Address {
        Address::new(format!("0x{last:0>40}")).unwrap()
    }

    fn tx_hash_hex() -> String {
        format!("0x{}", "11".repeat(32))
    }

    fn receipt_json(status: &str) -> Value {
        json!({
            "transactionHash": tx_hash_hex(),
            "blockNumber": "0x5",
            "status": status,
            "logs": []
        })
    }

    fn connector(transport: MockTransport) -> ChainConnector<MockTransport> {
        ChainConnector::new(
            transport,
            Duration::from_millis(100),
            Duration::from_millis(1),
        )
    }

    #[tokio::test]
    async fn accounts_and_signer_binding() {
        let transport = MockTransport::new(vec![
            Ok(json!([addr("1").as_str(), addr("2").as_str()])),
            Ok(json!([addr("1").as_str(), addr("2").as_str()])),
            Ok(json!([addr("1").as_str(), addr("2").as_str()])),
        ]);
        let conn = connector(transport);
        assert_eq!(conn.accounts().await.unwrap().len(), 2);
        let signer = conn.signer(1).await.unwrap();
        assert_eq!(signer.address(), &addr("2"));
        let err = conn.signer(5).await.unwrap_err();
        assert!(matches!(
            err,
            ChainError::NoAccount { index: 5, available: 2 }
        ));
    }

    #[tokio::test]
    async fn send_waits_through_pending_receipts() {
        let transport = MockTransport::new(vec![
            Ok(json!(tx_hash_hex())),
            Ok(Value::Null),
            Ok(Value::Null),
            Ok(receipt_json("0x1")),
        ]);
        let conn = connector(transport);
        let signer = Signer::new(addr("1"));
        let request = TxRequest::call(addr("2"), vec![0xde, 0xad]);
        let receipt = conn.send(&signer, &request).await.unwrap();
        assert!(receipt.succeeded);
        assert_eq!(receipt.block_number, 5);
        assert_eq!(
            conn.transport().methods(),
            vec![
                "eth_sendTransaction",
                "eth_getTransactionReceipt",
                "eth_getTransactionReceipt",
                "eth_getTransactionReceipt",
            ]
        );
    }

    #[tokio::test]
    async fn send_times_out_when_never_mined() {
        let mut script: Vec<Result<Value, RpcError>> = vec![Ok(json!(tx_hash_hex()))];
        for _ in 0..200 {
            script.push(Ok(Value::Null));
        }
        let conn = connector(MockTransport::new(script));
        let signer = Signer::new(addr("1"));
        let request = TxRequest::call(addr("2"), vec![]);
        let err = conn.send(&signer, &request).await.unwrap_err();
        assert!(matches!(err, ChainError::ConfirmationTimeout { .. }));
    }

    #[tokio::test]
    async fn send_surfaces_revert_reason_from_replay() {
        let transport = MockTransport::new(vec![
            Ok(json!(tx_hash_hex())),
            Ok(receipt_json("0x0")),
            Err(RpcError::Rpc {
                method: "eth_call".into(),
                code: 3,
                message: "execution reverted: INSUFFICIENT_ALLOWANCE".into(),
                data: None,
            }),
        ]);
        let conn = connector(transport);
        let signer = Signer::new(addr("1"));
        let request = TxRequest::call(addr("2"), vec![]);
        let err = conn.send(&signer, &request).await.unwrap_err();
        match err {
            ChainError::TransactionReverted { reason, .. } => {
                assert_eq!(reason, "INSUFFICIENT_ALLOWANCE");
            }
            other => panic!("expected TransactionReverted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn revert_reason_decoded_from_error_payload() {
        // Error(string) payload carrying "NOT_WORKER".
        let mut payload = ERROR_STRING_SELECTOR.to_vec();
        let mut word = [0u8; 32];
        word[31] = 0x20;
        payload.extend_from_slice(&word); // offset
        let mut len_word = [0u8; 32];
        len_word[31] = 10;
        payload.extend_from_slice(&len_word); // length
        let mut data = b"NOT_WORKER".to_vec();
        data.resize(32, 0);
        payload.extend_from_slice(&data);

        assert_eq!(
            decode_revert_reason(&payload).as_deref(),
            Some("NOT_WORKER")
        );

        let transport = MockTransport::new(vec![
            Ok(json!(tx_hash_hex())),
            Ok(receipt_json("0x0")),
            Err(RpcError::Rpc {
                method: "eth_call".into(),
                code: 3,
                message: "execution reverted".into(),
                data: Some(encode_hex(&payload)),
            }),
        ]);
        let conn = connector(transport);
        let signer = Signer::new(addr("1"));
        let request = TxRequest::call(addr("2"), vec![]);
        let err = conn.send(&signer, &request).await.unwrap_err();
        match err {
            ChainError::TransactionReverted { reason, .. } => {
                assert_eq!(reason, "NOT_WORKER");
            }
            other => panic!("expected TransactionReverted, got {other:?}"),
        }
    }

    #[test]
    fn decode_revert_reason_rejects_short_or_foreign_payloads() {
        assert!(decode_revert_reason(&[]).is_none());
        assert!(decode_revert_reason(&[0x08, 0xc3, 0x79, 0xa0]).is_none());
        assert!(decode_revert_reason(&[0xff; 100]).is_none());
    }

    #[tokio::test]
    async fn call_decodes_return_data() {
        let transport = MockTransport::new(vec![Ok(json!(format!(
            "0x{}",
            "00".repeat(31) + "02"
        )))]);
        let conn = connector(transport);
        let request = CallRequest::new(addr("2"), vec![0xaa; 4]);
        let data = conn.call(&request).await.unwrap();
        assert_eq!(data.len(), 32);
        assert_eq!(data[31], 2);
    }
}
