//! # gig-core — Shared Primitives
//!
//! Foundation types for the Gig Stack, the off-chain orchestration toolkit
//! for an on-chain freelance marketplace:
//!
//! - **Address** ([`address`]): Validating newtypes for Ethereum addresses
//!   and transaction hashes.
//!
//! - **Hex** ([`hex`]): `0x`-prefixed byte and quantity codecs shared by the
//!   JSON-RPC layer and the ABI codec.
//!
//! - **Relationship** ([`relationship`]): The relationship lifecycle state
//!   machine and relationship kinds.
//!
//! - **Config** ([`config`]): Network selection and fail-fast environment
//!   configuration. No module-level singletons — every component receives
//!   its configuration explicitly.
//!
//! - **Book** ([`book`]): The deployed-address book, the only artifact the
//!   deployment flow persists between invocations.

pub mod address;
pub mod book;
pub mod config;
pub mod error;
pub mod hex;
pub mod relationship;

// Re-export primary types for ergonomic imports.

pub use address::{Address, TxHash};
pub use book::{AddressBook, BookError};
pub use config::{ChainConfig, ConfigError, Network};
pub use error::ValidationError;
pub use relationship::{RelationshipKind, RelationshipState};
