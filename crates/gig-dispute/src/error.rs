//! Dispute sub-flow error types.

use gig_workflow::WorkflowError;

/// Errors from the external voting gateway.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Transport-level failure reaching the gateway.
    #[error("gateway transport error during {operation}: {reason}")]
    Transport {
        /// The gateway operation attempted.
        operation: &'static str,
        /// Description of the failure.
        reason: String,
    },

    /// The gateway rejected the request (duplicate nullifier, unknown
    /// process, malformed envelope).
    #[error("gateway rejected {operation}: {reason}")]
    Rejected {
        /// The gateway operation attempted.
        operation: &'static str,
        /// The gateway's stated reason.
        reason: String,
    },

    /// The gateway's response did not parse.
    #[error("malformed gateway response for {operation}: {reason}")]
    Malformed {
        /// The gateway operation attempted.
        operation: &'static str,
        /// Description of the problem.
        reason: String,
    },
}

/// Errors from the dispute flow.
#[derive(Debug, thiserror::Error)]
pub enum DisputeError {
    /// Underlying gateway failure.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Underlying workflow failure while recording the verdict on-chain.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// The voting process never became observable within the retry
    /// budget. Fatal, not retryable.
    #[error("voting process {process_id} not observed after {attempts} attempts")]
    ProcessNotObserved {
        /// The registered process identifier.
        process_id: String,
        /// How many polls were made.
        attempts: u32,
    },

    /// The process did not reach its start block within the retry budget.
    #[error("voting process {process_id} not started after {attempts} attempts")]
    ProcessNotStarted {
        /// The registered process identifier.
        process_id: String,
        /// How many polls were made.
        attempts: u32,
    },

    /// The process did not conclude within the retry budget.
    #[error("voting process {process_id} not concluded after {attempts} attempts")]
    ProcessNotConcluded {
        /// The registered process identifier.
        process_id: String,
        /// How many polls were made.
        attempts: u32,
    },

    /// The dispute is not in the stage the operation requires.
    #[error("dispute {dispute} is in stage {stage} but {operation} requires {required}")]
    WrongStage {
        /// The dispute identifier.
        dispute: uuid::Uuid,
        /// The current stage name.
        stage: &'static str,
        /// The attempted operation.
        operation: &'static str,
        /// The stage the operation requires.
        required: &'static str,
    },

    /// The tallied results were empty or unusable.
    #[error("voting process {process_id} produced no usable tally")]
    EmptyTally {
        /// The registered process identifier.
        process_id: String,
    },
}
