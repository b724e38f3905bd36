//! # gig-workflow — Relationship Workflow Orchestrator
//!
//! The core of the stack: establishes a market, creates a relationship
//! inside it, funds escrow, assigns a worker, and drives the relationship
//! through submission to resolution or dispute. Every step waits for the
//! previous transaction's confirmation and validates the resulting state
//! by a read call before the next dependent step is issued.
//!
//! ## Lifecycle
//!
//! ```text
//! Created -> Proposed -> Funded -> Assigned -> Submitted -> Resolved [terminal]
//! Assigned | Submitted -> Disputed -> Arbitrated            [terminal]
//! ```
//!
//! The dispute branch hands off to `gig-dispute`, which runs the external
//! voting process and submits the verdict back on-chain.

pub mod error;
pub mod interfaces;
pub mod orchestrator;

pub use error::WorkflowError;
pub use interfaces::default_registry;
pub use orchestrator::{
    DisputeRef, MarketRef, Orchestrator, RelationshipRef, RelationshipTerms,
};
