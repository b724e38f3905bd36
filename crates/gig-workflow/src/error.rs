//! Workflow error types.
//!
//! Every failure names the market, relationship, or escrow involved and
//! the attempted operation. Errors are per-workflow values; a failure in
//! one relationship's lifecycle never aborts another's.

use gig_chain::ChainError;
use gig_core::{Address, RelationshipState, ValidationError};
use gig_registry::RegistryError;

/// Errors from the relationship workflow orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// Underlying chain connector failure.
    #[error(transparent)]
    Chain(#[from] ChainError),

    /// Underlying registry or codec failure.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The relationship is not in a valid source state for the operation.
    /// No transaction was submitted.
    #[error("{operation} is invalid for relationship {relationship} in state {state}")]
    InvalidStateTransition {
        /// The relationship contract address.
        relationship: Address,
        /// The observed on-chain state.
        state: RelationshipState,
        /// The attempted operation.
        operation: &'static str,
    },

    /// The requested relationship kind is not recognized, or the supplied
    /// terms do not match the kind.
    #[error("invalid relationship kind: {value}")]
    InvalidRelationshipKind {
        /// The offending kind string or kind/terms combination.
        value: String,
    },

    /// The payer's token allowance to the escrow is below the requested
    /// amount. Detected by a pre-flight read; no transaction was submitted.
    #[error(
        "payer {payer} approved only {allowance} of {required} to escrow {escrow}"
    )]
    InsufficientApproval {
        /// The funding account.
        payer: Address,
        /// The escrow contract.
        escrow: Address,
        /// The observed allowance.
        allowance: u128,
        /// The requested funding amount.
        required: u128,
    },

    /// The factory transaction confirmed but its receipt carried no
    /// `MarketCreated` event.
    #[error("market creation for {name:?} confirmed without a MarketCreated event")]
    MarketCreationFailed {
        /// The requested market name.
        name: String,
    },

    /// The market transaction confirmed but its receipt carried no
    /// `RelationshipCreated` event.
    #[error("relationship creation in market {market} confirmed without a RelationshipCreated event")]
    RelationshipCreationFailed {
        /// The market the relationship was created in.
        market: Address,
    },

    /// The dispute factory confirmed without a `DisputeCreated` event.
    #[error("dispute for relationship {relationship} confirmed without a DisputeCreated event")]
    DisputeCreationFailed {
        /// The disputed relationship.
        relationship: Address,
    },

    /// A decoded on-chain value was outside its expected shape.
    #[error("malformed on-chain value: {reason}")]
    Malformed {
        /// Description of the problem.
        reason: String,
    },
}

impl From<ValidationError> for WorkflowError {
    fn from(e: ValidationError) -> Self {
        Self::Malformed {
            reason: e.to_string(),
        }
    }
}
