//! # gig-dispute — Dispute Sub-flow
//!
//! The alternate terminal path for a contested relationship: register a
//! voting process with the external voting system, wait for the window,
//! submit signed vote envelopes on behalf of registered voters, tally,
//! and record the verdict on-chain.
//!
//! The voting system is a collaborator behind the [`VotingGateway`]
//! trait; its internals are out of scope. All polling is bounded by an
//! explicit [`BackoffPolicy`], and a process that never becomes
//! observable is a fatal [`DisputeError::ProcessNotObserved`], never a
//! silent continuation.

pub mod backoff;
pub mod envelope;
pub mod error;
pub mod flow;
pub mod gateway;
pub mod memory;

pub use backoff::BackoffPolicy;
pub use envelope::{nullifier, VoteEnvelope, VoterKey};
pub use error::{DisputeError, GatewayError};
pub use flow::{
    BallotReport, Dispute, DisputeFlow, DisputeStage, Verdict, CHOICE_REFUND_EMPLOYER,
    CHOICE_RELEASE_WORKER, DEFAULT_SUBMISSION_CAP,
};
pub use gateway::{HttpVotingGateway, ProcessInfo, ProcessResults, ProcessSpec, VotingGateway};
pub use memory::MemoryGateway;
