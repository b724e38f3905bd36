//! Chain connector error types.

use gig_core::ValidationError;

/// Errors from the JSON-RPC transport layer.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// HTTP transport failure (connection refused, timeout, TLS).
    /// Retryable with bounded backoff.
    #[error("transport error calling {endpoint}: {reason}")]
    Transport {
        /// The endpoint URL.
        endpoint: String,
        /// Description of the transport failure.
        reason: String,
    },

    /// The endpoint answered with an HTTP error status.
    #[error("endpoint {endpoint} returned HTTP {status}")]
    HttpStatus {
        /// The endpoint URL.
        endpoint: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The node returned a JSON-RPC error object. Not retryable.
    #[error("RPC error from {method}: {message} (code {code})")]
    Rpc {
        /// The JSON-RPC method that failed.
        method: String,
        /// JSON-RPC error code.
        code: i64,
        /// JSON-RPC error message.
        message: String,
        /// Optional error data (revert payload hex on some nodes).
        data: Option<String>,
    },

    /// The response body was not a JSON-RPC envelope, or the `result`
    /// field was absent. A missing result is an explicit error here,
    /// never a silent `null`.
    #[error("invalid JSON-RPC response for {method}: {reason}")]
    InvalidResponse {
        /// The JSON-RPC method.
        method: String,
        /// Description of the problem.
        reason: String,
    },
}

impl RpcError {
    /// Whether this error is a transient transport failure worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::HttpStatus { status: 500..=599, .. })
    }
}

/// Errors from the chain connector.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    /// Underlying RPC failure.
    #[error(transparent)]
    Rpc(#[from] RpcError),

    /// The transaction was submitted but did not reach one confirmation
    /// within the configured timeout. On-chain state must be re-read; no
    /// assumption is made about whether the transaction later lands.
    #[error("transaction {tx_hash} not confirmed within {waited_ms}ms")]
    ConfirmationTimeout {
        /// The submitted transaction hash.
        tx_hash: String,
        /// How long the connector waited.
        waited_ms: u64,
    },

    /// The transaction was mined but reverted.
    #[error("transaction {tx_hash} reverted: {reason}")]
    TransactionReverted {
        /// The mined transaction hash.
        tx_hash: String,
        /// Revert reason string when the node exposed one, otherwise a
        /// generic marker.
        reason: String,
    },

    /// A receipt or response field failed to parse.
    #[error("malformed chain response: {reason}")]
    Malformed {
        /// Description of the parse failure.
        reason: String,
    },

    /// The node exposes no account at the requested index.
    #[error("no node-managed account at index {index} ({available} available)")]
    NoAccount {
        /// The requested account index.
        index: usize,
        /// How many accounts the node reported.
        available: usize,
    },
}

impl From<ValidationError> for ChainError {
    fn from(e: ValidationError) -> Self {
        Self::Malformed {
            reason: e.to_string(),
        }
    }
}
