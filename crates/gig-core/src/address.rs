//! # Address Newtypes
//!
//! Domain-primitive newtypes for on-chain identifiers. An [`Address`] is
//! always a well-formed `0x` + 40-hex-char Ethereum address, a [`TxHash`]
//! always `0x` + 64 hex chars — you cannot pass a raw string where either
//! is expected, and malformed values are rejected at construction time,
//! not deep inside a JSON-RPC call.
//!
//! Addresses are normalized to lowercase so that equality and map lookups
//! are checksum-insensitive.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Helper macro to implement `Deserialize` for string newtypes that must
/// validate their contents. Deserializes as a plain `String`, then routes
/// through the type's `new()` constructor so that invalid values are
/// rejected at deserialization time — not silently accepted.
macro_rules! impl_validating_deserialize {
    ($ty:ident) => {
        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                Self::new(raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A deployed contract or account address: `0x` followed by 40 hex chars.
///
/// Stored lowercase. Construction validates the format; the inner string
/// is never exposed mutably.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Create an address, validating `0x` + 40 hex chars.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if is_hex_of_len(&value, 40) {
            Ok(Self(value.to_ascii_lowercase()))
        } else {
            Err(ValidationError::InvalidAddress { value })
        }
    }

    /// The `0x`-prefixed lowercase string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The 20 raw bytes of the address.
    pub fn to_bytes(&self) -> [u8; 20] {
        let mut out = [0u8; 20];
        for (i, chunk) in self.0[2..].as_bytes().chunks(2).enumerate() {
            // Infallible: construction guarantees 40 hex chars.
            let hi = (chunk[0] as char).to_digit(16).unwrap_or(0) as u8;
            let lo = (chunk[1] as char).to_digit(16).unwrap_or(0) as u8;
            out[i] = (hi << 4) | lo;
        }
        out
    }

    /// Build an address from 20 raw bytes.
    pub fn from_bytes(bytes: &[u8; 20]) -> Self {
        let mut s = String::with_capacity(42);
        s.push_str("0x");
        for b in bytes {
            s.push_str(&format!("{b:02x}"));
        }
        Self(s)
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Address {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl_validating_deserialize!(Address);

// ---------------------------------------------------------------------------
// TxHash
// ---------------------------------------------------------------------------

/// A transaction hash: `0x` followed by 64 hex chars. Stored lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TxHash(String);

impl TxHash {
    /// Create a transaction hash, validating `0x` + 64 hex chars.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if is_hex_of_len(&value, 64) {
            Ok(Self(value.to_ascii_lowercase()))
        } else {
            Err(ValidationError::InvalidTxHash { value })
        }
    }

    /// The `0x`-prefixed lowercase string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TxHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TxHash {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl_validating_deserialize!(TxHash);

/// Validate `0x` prefix followed by exactly `digits` hex characters.
fn is_hex_of_len(value: &str, digits: usize) -> bool {
    value.len() == digits + 2
        && value.starts_with("0x")
        && value[2..].chars().all(|c| c.is_ascii_hexdigit())
}
