//! # gig-chain — Chain Connector
//!
//! Wraps a JSON-RPC endpoint and exposes two primitives to the rest of the
//! stack:
//!
//! - `call` — read-only `eth_call`, no state change;
//! - `send` — state-changing `eth_sendTransaction` that does not return
//!   until the transaction is mined to at least one confirmation, or fails
//!   with an explicit timeout or revert error.
//!
//! ## Signing
//!
//! Transaction signing is delegated to the JSON-RPC node's key management
//! (development accounts derived from the node's mnemonic). This crate
//! never holds Ethereum private keys; a [`Signer`] is the address of a
//! node-managed account bound to exactly one actor role.
//!
//! ## Ordering
//!
//! Transaction nonces are sequenced per account by the node, so two
//! in-flight sends from the same account can collide. [`ChainConnector`]
//! serializes submit-through-confirm per signer; sends from different
//! signers proceed concurrently.

pub mod connector;
pub mod error;
pub mod signer;
pub mod transport;
pub mod types;

pub use connector::ChainConnector;
pub use error::{ChainError, RpcError};
pub use signer::Signer;
pub use transport::{HttpTransport, RpcTransport};
pub use types::{CallRequest, LogEntry, TxReceipt, TxRequest};
