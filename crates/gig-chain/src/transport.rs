//! # JSON-RPC Transport
//!
//! The [`RpcTransport`] trait is the seam between the connector and the
//! wire. Production uses [`HttpTransport`] (reqwest over HTTPS); tests and
//! the local demo use the in-memory simulated chain from `gig-chain-stub`.
//!
//! ## Retry
//!
//! Transport-level failures (connection refused, timeout, 5xx) are retried
//! with exponential backoff up to a fixed budget. JSON-RPC error objects —
//! including reverts — are never retried: they indicate a logic or
//! sequencing fault, and retrying would only resubmit a doomed request.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde_json::{json, Value};

use crate::error::RpcError;

/// Maximum number of retry attempts after the initial request.
const MAX_RETRIES: u32 = 3;

/// Base delay between retries (doubles each attempt: 200ms, 400ms, 800ms).
const BASE_DELAY_MS: u64 = 200;

/// A JSON-RPC request/response round trip.
///
/// Implementations must be `Send + Sync`; the connector shares one
/// transport across concurrent workflows.
pub trait RpcTransport: Send + Sync {
    /// Issue a single JSON-RPC request and return the `result` value.
    fn request(
        &self,
        method: &str,
        params: Value,
    ) -> impl std::future::Future<Output = Result<Value, RpcError>> + Send;
}

/// HTTP JSON-RPC 2.0 transport.
#[derive(Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl HttpTransport {
    /// Build a transport for the given endpoint with a per-request timeout.
    pub fn new(url: impl Into<String>, request_timeout: Duration) -> Result<Self, RpcError> {
        let url = url.into();
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| RpcError::Transport {
                endpoint: url.clone(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            url,
            next_id: AtomicU64::new(1),
        })
    }

    /// One un-retried request attempt.
    async fn request_once(&self, method: &str, params: &Value) -> Result<Value, RpcError> {
        let body = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": self.next_id.fetch_add(1, Ordering::Relaxed),
        });

        let resp = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| RpcError::Transport {
                endpoint: self.url.clone(),
                reason: if e.is_timeout() {
                    "request timed out".to_string()
                } else {
                    e.to_string()
                },
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(RpcError::HttpStatus {
                endpoint: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let envelope: Value = resp.json().await.map_err(|e| RpcError::InvalidResponse {
            method: method.to_string(),
            reason: format!("body is not JSON: {e}"),
        })?;

        parse_envelope(method, envelope)
    }
}

impl RpcTransport for HttpTransport {
    async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        for attempt in 0..MAX_RETRIES {
            match self.request_once(method, &params).await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_transient() => {
                    let delay = Duration::from_millis(BASE_DELAY_MS * 2u64.pow(attempt));
                    tracing::warn!(
                        method,
                        attempt = attempt + 1,
                        max_retries = MAX_RETRIES,
                        "transient RPC failure, retrying in {delay:?}: {e}"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
        // Final attempt — no more retries.
        self.request_once(method, &params).await
    }
}

/// Extract the `result` from a JSON-RPC envelope, surfacing `error`
/// objects and missing results explicitly.
pub(crate) fn parse_envelope(method: &str, envelope: Value) -> Result<Value, RpcError> {
    if let Some(error) = envelope.get("error") {
        let code = error.get("code").and_then(Value::as_i64).unwrap_or(0);
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown RPC error")
            .to_string();
        let data = error
            .get("data")
            .and_then(Value::as_str)
            .map(|s| s.to_string());
        return Err(RpcError::Rpc {
            method: method.to_string(),
            code,
            message,
            data,
        });
    }
    match envelope.get("result") {
        Some(result) => Ok(result.clone()),
        None => Err(RpcError::InvalidResponse {
            method: method.to_string(),
            reason: "response missing 'result' field".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_envelope_result() {
        let envelope = json!({"jsonrpc": "2.0", "id": 1, "result": "0x1"});
        assert_eq!(parse_envelope("eth_blockNumber", envelope).unwrap(), json!("0x1"));
    }

    #[test]
    fn parse_envelope_null_result_is_ok() {
        // eth_getTransactionReceipt legitimately returns null while pending.
        let envelope = json!({"jsonrpc": "2.0", "id": 1, "result": null});
        assert_eq!(
            parse_envelope("eth_getTransactionReceipt", envelope).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn parse_envelope_error_object() {
        let envelope = json!({
            "jsonrpc": "2.0", "id": 1,
            "error": {"code": 3, "message": "execution reverted: NOT_PAYER", "data": "0x08c379a0"}
        });
        let err = parse_envelope("eth_call", envelope).unwrap_err();
        match err {
            RpcError::Rpc { code, message, data, .. } => {
                assert_eq!(code, 3);
                assert!(message.contains("NOT_PAYER"));
                assert_eq!(data.as_deref(), Some("0x08c379a0"));
            }
            other => panic!("expected Rpc error, got {other:?}"),
        }
    }

    #[test]
    fn parse_envelope_missing_result() {
        let envelope = json!({"jsonrpc": "2.0", "id": 1});
        assert!(matches!(
            parse_envelope("eth_call", envelope),
            Err(RpcError::InvalidResponse { .. })
        ));
    }

    #[test]
    fn rpc_errors_are_not_transient() {
        let err = RpcError::Rpc {
            method: "eth_call".into(),
            code: 3,
            message: "execution reverted".into(),
            data: None,
        };
        assert!(!err.is_transient());
    }

    #[test]
    fn transport_errors_are_transient() {
        let err = RpcError::Transport {
            endpoint: "http://localhost:8545".into(),
            reason: "connection refused".into(),
        };
        assert!(err.is_transient());
        let err = RpcError::HttpStatus {
            endpoint: "http://localhost:8545".into(),
            status: 502,
        };
        assert!(err.is_transient());
        let err = RpcError::HttpStatus {
            endpoint: "http://localhost:8545".into(),
            status: 404,
        };
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn http_transport_reports_connection_failure() {
        // Request to a guaranteed-closed port → transport error after retries.
        let transport =
            HttpTransport::new("http://127.0.0.1:1/", Duration::from_millis(50)).unwrap();
        let result = transport.request("eth_blockNumber", json!([])).await;
        assert!(matches!(result, Err(RpcError::Transport { .. })));
    }
}
