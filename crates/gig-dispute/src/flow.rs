//! # Dispute Flow
//!
//! Coordinates one dispute from opening through the external voting
//! process to the on-chain verdict. Polling against the gateway is
//! bounded by an explicit [`BackoffPolicy`]; ballot submission runs
//! concurrently under a semaphore cap, with per-voter failures collected
//! rather than propagated into sibling submissions.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use uuid::Uuid;

use gig_chain::{RpcTransport, Signer};
use gig_core::Address;
use gig_workflow::{DisputeRef, Orchestrator};

use crate::backoff::BackoffPolicy;
use crate::envelope::VoterKey;
use crate::error::{DisputeError, GatewayError};
use crate::gateway::{ProcessInfo, ProcessSpec, VotingGateway};

/// Ballot option: release the escrow to the worker.
pub const CHOICE_RELEASE_WORKER: u8 = 0;
/// Ballot option: refund the escrow to the employer.
pub const CHOICE_REFUND_EMPLOYER: u8 = 1;

const OPTION_COUNT: u8 = 2;

/// Default cap on simultaneous envelope submissions.
pub const DEFAULT_SUBMISSION_CAP: usize = 100;

/// Where a dispute stands in its flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisputeStage {
    Opened,
    ProcessLaunched,
    Voting,
    Concluded,
}

impl DisputeStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Opened => "OPENED",
            Self::ProcessLaunched => "PROCESS_LAUNCHED",
            Self::Voting => "VOTING",
            Self::Concluded => "CONCLUDED",
        }
    }
}

/// The arbitration outcome derived from the tallied vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    ReleaseToWorker,
    RefundEmployer,
}

/// One dispute's off-chain record. The authoritative relationship state
/// stays on-chain; this tracks only the voting-process coordination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dispute {
    /// Flow-local identifier.
    pub id: Uuid,
    /// The deployed dispute contract.
    pub contract: Address,
    /// The relationship under dispute.
    pub relationship: Address,
    /// The initiator's claim pointer.
    pub complaint_ptr: String,
    /// The counterparty's claim pointer.
    pub counter_complaint_ptr: String,
    /// The gateway process id, once registered.
    pub process_id: Option<String>,
    /// Current stage.
    pub stage: DisputeStage,
    /// When the dispute record was opened.
    pub opened_at: DateTime<Utc>,
}

/// Outcome of a batch ballot submission.
#[derive(Debug)]
pub struct BallotReport {
    /// Envelopes the gateway recorded.
    pub submitted: usize,
    /// Per-voter failures; sibling submissions were unaffected.
    pub failures: Vec<(Address, GatewayError)>,
}

/// Drives disputes against an orchestrator and a voting gateway.
pub struct DisputeFlow<'o, T: RpcTransport, G: VotingGateway + 'static> {
    orchestrator: &'o Orchestrator<T>,
    gateway: Arc<G>,
    backoff: BackoffPolicy,
    submission_cap: usize,
}

impl<'o, T: RpcTransport, G: VotingGateway + 'static> DisputeFlow<'o, T, G> {
    pub fn new(orchestrator: &'o Orchestrator<T>, gateway: Arc<G>) -> Self {
        Self {
            orchestrator,
            gateway,
            backoff: BackoffPolicy::default(),
            submission_cap: DEFAULT_SUBMISSION_CAP,
        }
    }

    /// Replace the polling budget.
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Replace the concurrent-submission cap.
    pub fn with_submission_cap(mut self, cap: usize) -> Self {
        self.submission_cap = cap.max(1);
        self
    }

    /// Open the off-chain dispute record for an already-created dispute
    /// contract.
    pub fn open(
        &self,
        dispute: &DisputeRef,
        complaint_ptr: &str,
        counter_complaint_ptr: &str,
    ) -> Dispute {
        let record = Dispute {
            id: Uuid::new_v4(),
            contract: dispute.address.clone(),
            relationship: dispute.relationship.clone(),
            complaint_ptr: complaint_ptr.to_string(),
            counter_complaint_ptr: counter_complaint_ptr.to_string(),
            process_id: None,
            stage: DisputeStage::Opened,
            opened_at: Utc::now(),
        };
        tracing::info!(
            dispute = %record.id,
            contract = %record.contract,
            relationship = %record.relationship,
            "dispute opened"
        );
        record
    }

    /// Register the voting process and poll until it is observable.
    /// Exhausting the budget without observing it is fatal.
    pub async fn launch_process(
        &self,
        dispute: &mut Dispute,
        duration_blocks: u64,
    ) -> Result<ProcessInfo, DisputeError> {
        self.require_stage(dispute, DisputeStage::Opened, "launch_process")?;
        let spec = ProcessSpec {
            subject: dispute.contract.clone(),
            duration_blocks,
            option_count: OPTION_COUNT,
        };
        let process_id = self.gateway.create_process(&spec).await?;
        tracing::debug!(dispute = %dispute.id, process_id, "voting process registered");

        for attempt in 0..self.backoff.max_attempts {
            if let Some(info) = self.gateway.process(&process_id).await? {
                dispute.process_id = Some(process_id.clone());
                dispute.stage = DisputeStage::ProcessLaunched;
                tracing::info!(
                    dispute = %dispute.id,
                    process_id,
                    start_block = info.start_block,
                    end_block = info.end_block,
                    "voting process observed"
                );
                return Ok(info);
            }
            tokio::time::sleep(self.backoff.delay_for(attempt)).await;
        }
        Err(DisputeError::ProcessNotObserved {
            process_id,
            attempts: self.backoff.max_attempts,
        })
    }

    /// Poll the gateway's block height until the voting window opens.
    pub async fn wait_until_started(&self, dispute: &mut Dispute) -> Result<(), DisputeError> {
        self.require_stage(dispute, DisputeStage::ProcessLaunched, "wait_until_started")?;
        let info = self.observed_process(dispute).await?;
        self.wait_for_height(&info.id, info.start_block, |process_id, attempts| {
            DisputeError::ProcessNotStarted {
                process_id,
                attempts,
            }
        })
        .await?;
        dispute.stage = DisputeStage::Voting;
        tracing::info!(dispute = %dispute.id, "voting window open");
        Ok(())
    }

    /// Seal and submit one ballot per voter, concurrently under the
    /// submission cap. Per-voter failures are collected in the report;
    /// they never abort sibling submissions.
    pub async fn submit_ballots(
        &self,
        dispute: &Dispute,
        voters: &[VoterKey],
        choice_for: impl Fn(&Address) -> u8,
    ) -> Result<BallotReport, DisputeError> {
        self.require_stage(dispute, DisputeStage::Voting, "submit_ballots")?;
        let process_id = dispute
            .process_id
            .clone()
            .ok_or_else(|| DisputeError::WrongStage {
                dispute: dispute.id,
                stage: dispute.stage.as_str(),
                operation: "submit_ballots",
                required: DisputeStage::Voting.as_str(),
            })?;

        let envelopes: Vec<_> = voters
            .iter()
            .map(|key| key.seal(&process_id, choice_for(key.address())))
            .collect();

        let semaphore = Arc::new(Semaphore::new(self.submission_cap));
        let mut tasks = JoinSet::new();
        for envelope in envelopes {
            let gateway = Arc::clone(&self.gateway);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let voter = envelope.voter.clone();
                (voter, gateway.submit_envelope(&envelope).await)
            });
        }

        let mut report = BallotReport {
            submitted: 0,
            failures: Vec::new(),
        };
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(()))) => report.submitted += 1,
                Ok((voter, Err(e))) => {
                    tracing::warn!(%voter, error = %e, "ballot submission failed");
                    report.failures.push((voter, e));
                }
                Err(e) => {
                    tracing::warn!(error = %e, "ballot submission task aborted");
                }
            }
        }
        tracing::info!(
            dispute = %dispute.id,
            submitted = report.submitted,
            failed = report.failures.len(),
            "ballot batch complete"
        );
        Ok(report)
    }

    /// Wait for the voting window to close, tally the results, derive the
    /// verdict, and record it on-chain. `Disputed → Arbitrated`.
    pub async fn conclude(
        &self,
        dispute: &mut Dispute,
        caller: &Signer,
    ) -> Result<Verdict, DisputeError> {
        self.require_stage(dispute, DisputeStage::Voting, "conclude")?;
        let info = self.observed_process(dispute).await?;
        self.wait_for_height(&info.id, info.end_block + 1, |process_id, attempts| {
            DisputeError::ProcessNotConcluded {
                process_id,
                attempts,
            }
        })
        .await?;

        let results = self.gateway.results(&info.id).await?;
        let release = results
            .tallies
            .get(usize::from(CHOICE_RELEASE_WORKER))
            .copied()
            .unwrap_or(0);
        let refund = results
            .tallies
            .get(usize::from(CHOICE_REFUND_EMPLOYER))
            .copied()
            .unwrap_or(0);
        if release == 0 && refund == 0 {
            return Err(DisputeError::EmptyTally {
                process_id: info.id,
            });
        }
        // A tie keeps the funds with their depositor.
        let verdict = if release > refund {
            Verdict::ReleaseToWorker
        } else {
            Verdict::RefundEmployer
        };

        let dispute_ref = DisputeRef {
            address: dispute.contract.clone(),
            relationship: dispute.relationship.clone(),
        };
        self.orchestrator
            .arbitrate(&dispute_ref, caller, verdict == Verdict::ReleaseToWorker)
            .await?;
        dispute.stage = DisputeStage::Concluded;
        tracing::info!(
            dispute = %dispute.id,
            ?verdict,
            release,
            refund,
            "dispute concluded"
        );
        Ok(verdict)
    }

    async fn observed_process(&self, dispute: &Dispute) -> Result<ProcessInfo, DisputeError> {
        let process_id = dispute
            .process_id
            .clone()
            .ok_or_else(|| DisputeError::WrongStage {
                dispute: dispute.id,
                stage: dispute.stage.as_str(),
                operation: "process lookup",
                required: DisputeStage::ProcessLaunched.as_str(),
            })?;
        self.gateway
            .process(&process_id)
            .await?
            .ok_or(DisputeError::ProcessNotObserved {
                process_id,
                attempts: 1,
            })
    }

    async fn wait_for_height(
        &self,
        process_id: &str,
        target: u64,
        exhausted: impl Fn(String, u32) -> DisputeError,
    ) -> Result<(), DisputeError> {
        for attempt in 0..self.backoff.max_attempts {
            if self.gateway.block_height().await? >= target {
                return Ok(());
            }
            tokio::time::sleep(self.backoff.delay_for(attempt)).await;
        }
        Err(exhausted(process_id.to_string(), self.backoff.max_attempts))
    }

    fn require_stage(
        &self,
        dispute: &Dispute,
        required: DisputeStage,
        operation: &'static str,
    ) -> Result<(), DisputeError> {
        if dispute.stage == required {
            Ok(())
        } else {
            Err(DisputeError::WrongStage {
                dispute: dispute.id,
                stage: dispute.stage.as_str(),
                operation,
                required: required.as_str(),
            })
        }
    }
}
