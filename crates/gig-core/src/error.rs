//! Validation errors for core primitives.

/// Errors raised when constructing core primitives from untrusted input.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// Not a well-formed Ethereum address (`0x` + 40 hex chars).
    #[error("invalid address: {value}")]
    InvalidAddress {
        /// The rejected input.
        value: String,
    },

    /// Not a well-formed transaction hash (`0x` + 64 hex chars).
    #[error("invalid transaction hash: {value}")]
    InvalidTxHash {
        /// The rejected input.
        value: String,
    },

    /// A hex byte string could not be decoded.
    #[error("invalid hex data: {reason}")]
    InvalidHex {
        /// Description of the decoding failure.
        reason: String,
    },

    /// A JSON-RPC quantity (`0x`-prefixed hex integer) could not be parsed.
    #[error("invalid quantity: {value}")]
    InvalidQuantity {
        /// The rejected input.
        value: String,
    },

    /// A relationship kind string is not one of the recognized kinds.
    #[error("unknown relationship kind: {value}")]
    UnknownRelationshipKind {
        /// The rejected input.
        value: String,
    },

    /// An on-chain status word does not map to a relationship state.
    #[error("relationship status word out of range: {value}")]
    StatusOutOfRange {
        /// The rejected status word.
        value: u64,
    },

    /// A network name or chain id is not recognized.
    #[error("unknown network: {value}")]
    UnknownNetwork {
        /// The rejected input.
        value: String,
    },
}
