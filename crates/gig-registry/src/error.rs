//! Registry and ABI codec error types.

/// Errors from the 32-byte-word ABI codec.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The value list does not match the declared parameter list.
    #[error("expected {expected} values, got {actual}")]
    ArityMismatch {
        /// Declared parameter count.
        expected: usize,
        /// Supplied value count.
        actual: usize,
    },

    /// A value's type does not match the declared parameter type.
    #[error("parameter {index} expects {expected}, got {actual}")]
    TypeMismatch {
        /// Zero-based parameter position.
        index: usize,
        /// Declared type name.
        expected: &'static str,
        /// Supplied type name.
        actual: &'static str,
    },

    /// Encoded data ended before the declared parameters did.
    #[error("truncated ABI data: {reason}")]
    Truncated {
        /// What was being read when the data ran out.
        reason: String,
    },

    /// A `uint256` word exceeds the 128-bit range this codec carries.
    #[error("uint value exceeds 128 bits")]
    UintOverflow,

    /// A `bool` word was neither 0 nor 1.
    #[error("invalid bool word")]
    InvalidBool,

    /// A decoded string was not valid UTF-8.
    #[error("string payload is not valid UTF-8")]
    InvalidUtf8,
}

/// Errors from the contract registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// No interface or deployment is registered under this name.
    #[error("unknown contract: {name}")]
    UnknownContract {
        /// The requested registry name.
        name: String,
    },

    /// An interface description failed validation at registry build time.
    #[error("malformed interface {interface}: {reason}")]
    MalformedInterface {
        /// The interface being validated.
        interface: String,
        /// What was wrong with it.
        reason: String,
    },

    /// The named function does not exist on the interface.
    #[error("interface {interface} has no function {function}")]
    UnknownFunction {
        /// The interface name.
        interface: String,
        /// The requested function name.
        function: String,
    },

    /// The named event does not exist on the interface.
    #[error("interface {interface} has no event {event}")]
    UnknownEvent {
        /// The interface name.
        interface: String,
        /// The requested event name.
        event: String,
    },

    /// Encoding or decoding failed against a validated description.
    #[error(transparent)]
    Codec(#[from] CodecError),
}
