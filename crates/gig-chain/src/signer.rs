//! # Signers
//!
//! A [`Signer`] names a node-managed account used to authorize
//! transactions. One signer belongs to exactly one actor role (employer,
//! worker, arbitrator-caller) within a workflow run; handles bound to a
//! signer are rebound by construction, never by mutation, so a role's
//! authority cannot leak into another role's calls.

use serde::{Deserialize, Serialize};

use gig_core::Address;

/// A node-managed signing account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signer {
    address: Address,
}

impl Signer {
    /// Bind a signer to a node-managed account address.
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    /// The account address this signer submits from.
    pub fn address(&self) -> &Address {
        &self.address
    }
}

impl std::fmt::Display for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "signer:{}", self.address)
    }
}
