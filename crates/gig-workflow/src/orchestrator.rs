//! # Relationship Workflow Orchestrator
//!
//! Drives a work relationship through its on-chain lifecycle by issuing
//! ordered transactions and re-reading state after every confirmation.
//! The orchestrator owns no authoritative state: the chain is the single
//! source of truth, and every operation validates the relationship's
//! current on-chain state before submitting anything.
//!
//! Operations attempted from a non-matching state fail with
//! [`WorkflowError::InvalidStateTransition`] and submit no transaction.
//! Errors are scoped to the relationship they name; workflows for other
//! relationships running concurrently are unaffected.

use serde::{Deserialize, Serialize};

use gig_chain::{CallRequest, ChainConnector, RpcTransport, Signer, TxReceipt, TxRequest};
use gig_core::{Address, RelationshipKind, RelationshipState};
use gig_registry::{AbiValue, ContractHandle, ContractRegistry, DecodedEvent};

use crate::error::WorkflowError;
use crate::interfaces::{deployments, ifaces};

/// A market recovered from its creation event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketRef {
    /// The deployed market address (first event argument).
    pub address: Address,
    /// 1-based creation sequence index.
    pub index: u64,
    /// The market name.
    pub name: String,
}

/// A relationship recovered from its creation event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipRef {
    /// The deployed relationship address.
    pub address: Address,
    /// The market it was created in.
    pub market: Address,
    /// 1-based index within the market.
    pub index: u64,
    /// The relationship kind.
    pub kind: RelationshipKind,
    /// The escrow bound at creation.
    pub escrow: Address,
}

/// A dispute contract recovered from its creation event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisputeRef {
    /// The deployed dispute contract address.
    pub address: Address,
    /// The relationship under dispute.
    pub relationship: Address,
}

/// Kind-specific creation terms. The kind string supplied alongside must
/// agree with the variant, otherwise creation fails without a transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RelationshipTerms {
    /// Single payout of `amount` settlement-token units.
    FlatRate { amount: u128 },
    /// Payout split across `milestones` checkpoints.
    Milestone { milestones: u64 },
    /// Payout gated on completion before a unix timestamp.
    Deadline { deadline: u64 },
}

impl RelationshipTerms {
    fn kind(&self) -> RelationshipKind {
        match self {
            Self::FlatRate { .. } => RelationshipKind::FlatRate,
            Self::Milestone { .. } => RelationshipKind::Milestone,
            Self::Deadline { .. } => RelationshipKind::Deadline,
        }
    }

    /// The uint term carried by the creation call.
    fn term_word(&self) -> u128 {
        match self {
            Self::FlatRate { amount } => *amount,
            Self::Milestone { milestones } => u128::from(*milestones),
            Self::Deadline { deadline } => u128::from(*deadline),
        }
    }

    fn creation_function(&self) -> &'static str {
        match self {
            Self::FlatRate { .. } => "createFlatRateContract",
            Self::Milestone { .. } => "createMilestoneContract",
            Self::Deadline { .. } => "createDeadlineContract",
        }
    }
}

/// Parse and cross-check the requested kind against the supplied terms.
fn checked_kind(kind: &str, terms: &RelationshipTerms) -> Result<RelationshipKind, WorkflowError> {
    let parsed = RelationshipKind::parse(kind).map_err(|_| {
        WorkflowError::InvalidRelationshipKind {
            value: kind.to_string(),
        }
    })?;
    if parsed != terms.kind() {
        return Err(WorkflowError::InvalidRelationshipKind {
            value: format!("{kind} with {} terms", terms.kind().as_str()),
        });
    }
    Ok(parsed)
}

/// The workflow orchestrator. Holds the connector and registry; owns no
/// relationship state of its own.
pub struct Orchestrator<T: RpcTransport> {
    connector: ChainConnector<T>,
    registry: ContractRegistry,
}

impl<T: RpcTransport> Orchestrator<T> {
    pub fn new(connector: ChainConnector<T>, registry: ContractRegistry) -> Self {
        Self { connector, registry }
    }

    /// The underlying chain connector.
    pub fn connector(&self) -> &ChainConnector<T> {
        &self.connector
    }

    /// The contract registry, for recording deployments.
    pub fn registry_mut(&mut self) -> &mut ContractRegistry {
        &mut self.registry
    }

    // ── Markets ────────────────────────────────────────────────────────

    /// Create a named market through the factory and recover its address
    /// and 1-based sequence index from the `MarketCreated` event.
    pub async fn create_market(
        &self,
        name: &str,
        deployer: &Signer,
    ) -> Result<MarketRef, WorkflowError> {
        let factory = self.registry.handle(deployments::MARKET_MAKER)?;
        let receipt = self
            .submit(
                &factory,
                deployer,
                "createMarket",
                &[AbiValue::String(name.to_string())],
            )
            .await?;
        let event = factory
            .find_event("MarketCreated", &receipt.logs)?
            .ok_or_else(|| WorkflowError::MarketCreationFailed {
                name: name.to_string(),
            })?;
        let address = indexed_address(&event, 0)?;
        let index = indexed_uint(&event, 1)? as u64;
        tracing::info!(%address, index, name, "market created");
        Ok(MarketRef {
            address,
            index,
            name: name.to_string(),
        })
    }

    // ── Relationships ──────────────────────────────────────────────────

    /// Create a relationship of the given kind inside `market`, bound to
    /// `escrow` and carrying a task metadata pointer. The resulting
    /// relationship starts in `Proposed`.
    pub async fn create_relationship(
        &self,
        market: &Address,
        kind: &str,
        escrow: &Address,
        task_metadata_ptr: &str,
        terms: &RelationshipTerms,
        employer: &Signer,
    ) -> Result<RelationshipRef, WorkflowError> {
        let kind = checked_kind(kind, terms)?;
        let handle = self.registry.handle_at(ifaces::MARKET, market.clone())?;
        let receipt = self
            .submit(
                &handle,
                employer,
                terms.creation_function(),
                &[
                    AbiValue::Address(escrow.clone()),
                    AbiValue::String(task_metadata_ptr.to_string()),
                    AbiValue::Uint(terms.term_word()),
                ],
            )
            .await?;
        let event = handle
            .find_event("RelationshipCreated", &receipt.logs)?
            .ok_or_else(|| WorkflowError::RelationshipCreationFailed {
                market: market.clone(),
            })?;
        let address = indexed_address(&event, 0)?;
        let index = indexed_uint(&event, 1)? as u64;

        let state = self.relationship_state(&address).await?;
        tracing::info!(
            relationship = %address,
            %market,
            index,
            kind = kind.as_str(),
            state = state.as_str(),
            "relationship created"
        );
        Ok(RelationshipRef {
            address,
            market: market.clone(),
            index,
            kind,
            escrow: escrow.clone(),
        })
    }

    /// Approve the escrow to pull `amount` of the settlement token from
    /// the payer.
    pub async fn approve_escrow(
        &self,
        payer: &Signer,
        escrow: &Address,
        amount: u128,
    ) -> Result<(), WorkflowError> {
        let token = self.registry.handle(deployments::TOKEN)?;
        self.submit(
            &token,
            payer,
            "approve",
            &[AbiValue::Address(escrow.clone()), AbiValue::Uint(amount)],
        )
        .await?;
        tracing::info!(payer = %payer.address(), %escrow, amount, "escrow approved");
        Ok(())
    }

    /// Fund the relationship's escrow with `amount`. The payer must have
    /// pre-approved the escrow for at least `amount`; the allowance is
    /// read before any transaction so a skipped approval fails without
    /// spending gas. `Proposed → Funded`.
    pub async fn fund_escrow(
        &self,
        relationship: &Address,
        escrow: &Address,
        payer: &Signer,
        amount: u128,
    ) -> Result<(), WorkflowError> {
        self.require_state(relationship, &[RelationshipState::Proposed], "fund_escrow")
            .await?;

        let allowance = self.token_allowance(payer.address(), escrow).await?;
        if allowance < amount {
            return Err(WorkflowError::InsufficientApproval {
                payer: payer.address().clone(),
                escrow: escrow.clone(),
                allowance,
                required: amount,
            });
        }

        let handle = self.registry.handle_at(ifaces::ESCROW, escrow.clone())?;
        self.submit(&handle, payer, "fund", &[AbiValue::Uint(amount)])
            .await?;

        let state = self.relationship_state(relationship).await?;
        tracing::info!(
            %relationship,
            amount,
            state = state.as_str(),
            "escrow funded"
        );
        Ok(())
    }

    /// Assign a worker. Valid from `Proposed` or `Funded`; `→ Assigned`.
    pub async fn assign_worker(
        &self,
        relationship: &Address,
        employer: &Signer,
        worker: &Address,
        amount: u128,
        metadata: &str,
    ) -> Result<(), WorkflowError> {
        self.require_state(
            relationship,
            &[RelationshipState::Proposed, RelationshipState::Funded],
            "assign_worker",
        )
        .await?;
        let handle = self
            .registry
            .handle_at(ifaces::RELATIONSHIP, relationship.clone())?;
        self.submit(
            &handle,
            employer,
            "assignWorker",
            &[
                AbiValue::Address(worker.clone()),
                AbiValue::Uint(amount),
                AbiValue::String(metadata.to_string()),
            ],
        )
        .await?;
        tracing::info!(%relationship, %worker, amount, "worker assigned");
        Ok(())
    }

    /// Submit work. Valid from `Assigned`; `→ Submitted`. Returns the
    /// solution pointer read back from the contract after confirmation.
    pub async fn submit_work(
        &self,
        relationship: &Address,
        worker: &Signer,
        submission_ptr: &str,
    ) -> Result<String, WorkflowError> {
        self.require_state(relationship, &[RelationshipState::Assigned], "submit_work")
            .await?;
        let handle = self
            .registry
            .handle_at(ifaces::RELATIONSHIP, relationship.clone())?;
        self.submit(
            &handle,
            worker,
            "submitWork",
            &[AbiValue::String(submission_ptr.to_string())],
        )
        .await?;

        let stored = self.task_solution_pointer(relationship).await?;
        if stored != submission_ptr {
            tracing::warn!(
                %relationship,
                submitted = submission_ptr,
                stored,
                "stored solution pointer differs from submission"
            );
        }
        tracing::info!(%relationship, pointer = stored, "work submitted");
        Ok(stored)
    }

    /// Resolve the relationship, releasing escrow to the worker. Valid
    /// from `Submitted`; `→ Resolved`, terminal.
    pub async fn resolve(
        &self,
        relationship: &Address,
        employer: &Signer,
    ) -> Result<(), WorkflowError> {
        self.require_state(relationship, &[RelationshipState::Submitted], "resolve")
            .await?;
        let handle = self
            .registry
            .handle_at(ifaces::RELATIONSHIP, relationship.clone())?;
        self.submit(&handle, employer, "resolve", &[]).await?;
        tracing::info!(%relationship, "relationship resolved, escrow released");
        Ok(())
    }

    /// Open a dispute. Valid from `Assigned` or `Submitted`; creates the
    /// dispute contract through the factory with the two opposing claim
    /// pointers and transitions the relationship `→ Disputed`.
    pub async fn dispute(
        &self,
        relationship: &Address,
        initiator: &Signer,
        complaint_ptr: &str,
        counter_complaint_ptr: &str,
    ) -> Result<DisputeRef, WorkflowError> {
        self.require_state(
            relationship,
            &[RelationshipState::Assigned, RelationshipState::Submitted],
            "dispute",
        )
        .await?;
        let factory = self.registry.handle(deployments::DISPUTE_FACTORY)?;
        let receipt = self
            .submit(
                &factory,
                initiator,
                "createDispute",
                &[
                    AbiValue::Address(relationship.clone()),
                    AbiValue::String(complaint_ptr.to_string()),
                    AbiValue::String(counter_complaint_ptr.to_string()),
                ],
            )
            .await?;
        let event = factory
            .find_event("DisputeCreated", &receipt.logs)?
            .ok_or_else(|| WorkflowError::DisputeCreationFailed {
                relationship: relationship.clone(),
            })?;
        let address = indexed_address(&event, 0)?;
        tracing::info!(dispute = %address, %relationship, "dispute opened");
        Ok(DisputeRef {
            address,
            relationship: relationship.clone(),
        })
    }

    /// Record an arbitration verdict on the dispute contract. Valid while
    /// the relationship is `Disputed`; releases escrow to the worker or
    /// refunds the depositor and transitions `→ Arbitrated`, terminal.
    pub async fn arbitrate(
        &self,
        dispute: &DisputeRef,
        caller: &Signer,
        release_to_worker: bool,
    ) -> Result<(), WorkflowError> {
        self.require_state(
            &dispute.relationship,
            &[RelationshipState::Disputed],
            "arbitrate",
        )
        .await?;
        let handle = self
            .registry
            .handle_at(ifaces::DISPUTE, dispute.address.clone())?;
        self.submit(
            &handle,
            caller,
            "resolveDispute",
            &[AbiValue::Bool(release_to_worker)],
        )
        .await?;
        tracing::info!(
            dispute = %dispute.address,
            relationship = %dispute.relationship,
            release_to_worker,
            "arbitration verdict recorded"
        );
        Ok(())
    }

    // ── Reads ──────────────────────────────────────────────────────────

    /// The relationship's current on-chain state.
    pub async fn relationship_state(
        &self,
        relationship: &Address,
    ) -> Result<RelationshipState, WorkflowError> {
        let handle = self
            .registry
            .handle_at(ifaces::RELATIONSHIP, relationship.clone())?;
        let word = self.read_uint(&handle, "contractStatus").await?;
        let word = u64::try_from(word).map_err(|_| WorkflowError::Malformed {
            reason: format!("status word {word} exceeds u64"),
        })?;
        Ok(RelationshipState::from_status_word(word)?)
    }

    /// The worker assigned to the relationship.
    pub async fn worker_of(&self, relationship: &Address) -> Result<Address, WorkflowError> {
        let handle = self
            .registry
            .handle_at(ifaces::RELATIONSHIP, relationship.clone())?;
        let data = self
            .connector
            .call(&CallRequest::new(
                handle.address().clone(),
                handle.encode_call("worker", &[])?,
            ))
            .await?;
        let values = handle.decode_output("worker", &data)?;
        values
            .first()
            .and_then(|v| v.as_address())
            .cloned()
            .ok_or_else(|| WorkflowError::Malformed {
                reason: "worker() returned no address".to_string(),
            })
    }

    /// The stored task solution pointer.
    pub async fn task_solution_pointer(
        &self,
        relationship: &Address,
    ) -> Result<String, WorkflowError> {
        let handle = self
            .registry
            .handle_at(ifaces::RELATIONSHIP, relationship.clone())?;
        let data = self
            .connector
            .call(&CallRequest::new(
                handle.address().clone(),
                handle.encode_call("getTaskSolutionPointer", &[])?,
            ))
            .await?;
        let values = handle.decode_output("getTaskSolutionPointer", &data)?;
        values
            .into_iter()
            .next()
            .and_then(|v| match v {
                AbiValue::String(s) => Some(s),
                _ => None,
            })
            .ok_or_else(|| WorkflowError::Malformed {
                reason: "getTaskSolutionPointer() returned no string".to_string(),
            })
    }

    /// The amount currently held by an escrow.
    pub async fn escrow_held(&self, escrow: &Address) -> Result<u128, WorkflowError> {
        let handle = self.registry.handle_at(ifaces::ESCROW, escrow.clone())?;
        self.read_uint(&handle, "heldAmount").await
    }

    /// An account's settlement-token balance.
    pub async fn token_balance(&self, account: &Address) -> Result<u128, WorkflowError> {
        let token = self.registry.handle(deployments::TOKEN)?;
        let data = self
            .connector
            .call(&CallRequest::new(
                token.address().clone(),
                token.encode_call("balanceOf", &[AbiValue::Address(account.clone())])?,
            ))
            .await?;
        first_uint(token.decode_output("balanceOf", &data)?)
    }

    /// The payer's settlement-token allowance to a spender.
    pub async fn token_allowance(
        &self,
        owner: &Address,
        spender: &Address,
    ) -> Result<u128, WorkflowError> {
        let token = self.registry.handle(deployments::TOKEN)?;
        let data = self
            .connector
            .call(&CallRequest::new(
                token.address().clone(),
                token.encode_call(
                    "allowance",
                    &[
                        AbiValue::Address(owner.clone()),
                        AbiValue::Address(spender.clone()),
                    ],
                )?,
            ))
            .await?;
        first_uint(token.decode_output("allowance", &data)?)
    }

    /// Mint settlement tokens to an account (development networks only;
    /// public token deployments reject this).
    pub async fn mint_tokens(
        &self,
        minter: &Signer,
        account: &Address,
        amount: u128,
    ) -> Result<(), WorkflowError> {
        let token = self.registry.handle(deployments::TOKEN)?;
        self.submit(
            &token,
            minter,
            "mint",
            &[AbiValue::Address(account.clone()), AbiValue::Uint(amount)],
        )
        .await?;
        tracing::info!(%account, amount, "tokens minted");
        Ok(())
    }

    // ── Internals ──────────────────────────────────────────────────────

    async fn require_state(
        &self,
        relationship: &Address,
        allowed: &[RelationshipState],
        operation: &'static str,
    ) -> Result<(), WorkflowError> {
        let state = self.relationship_state(relationship).await?;
        if allowed.contains(&state) {
            Ok(())
        } else {
            Err(WorkflowError::InvalidStateTransition {
                relationship: relationship.clone(),
                state,
                operation,
            })
        }
    }

    async fn submit(
        &self,
        handle: &ContractHandle,
        signer: &Signer,
        function: &str,
        args: &[AbiValue],
    ) -> Result<TxReceipt, WorkflowError> {
        let data = handle.encode_call(function, args)?;
        let request = TxRequest::call(handle.address().clone(), data);
        Ok(self.connector.send(signer, &request).await?)
    }

    async fn read_uint(
        &self,
        handle: &ContractHandle,
        function: &str,
    ) -> Result<u128, WorkflowError> {
        let data = self
            .connector
            .call(&CallRequest::new(
                handle.address().clone(),
                handle.encode_call(function, &[])?,
            ))
            .await?;
        first_uint(handle.decode_output(function, &data)?)
    }
}

fn first_uint(values: Vec<AbiValue>) -> Result<u128, WorkflowError> {
    values
        .first()
        .and_then(|v| v.as_uint())
        .ok_or_else(|| WorkflowError::Malformed {
            reason: "expected a uint return value".to_string(),
        })
}

fn indexed_address(event: &DecodedEvent, position: usize) -> Result<Address, WorkflowError> {
    event
        .indexed
        .get(position)
        .and_then(|v| v.as_address())
        .cloned()
        .ok_or_else(|| WorkflowError::Malformed {
            reason: format!("event {} has no address at indexed position {position}", event.name),
        })
}

fn indexed_uint(event: &DecodedEvent, position: usize) -> Result<u128, WorkflowError> {
    event
        .indexed
        .get(position)
        .and_then(|v| v.as_uint())
        .ok_or_else(|| WorkflowError::Malformed {
            reason: format!("event {} has no uint at indexed position {position}", event.name),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checked_kind_accepts_matching_terms() {
        let kind = checked_kind("flat_rate", &RelationshipTerms::FlatRate { amount: 1000 }).unwrap();
        assert_eq!(kind, RelationshipKind::FlatRate);
        let kind = checked_kind("milestone", &RelationshipTerms::Milestone { milestones: 3 }).unwrap();
        assert_eq!(kind, RelationshipKind::Milestone);
        let kind = checked_kind("deadline", &RelationshipTerms::Deadline { deadline: 1_700_000_000 }).unwrap();
        assert_eq!(kind, RelationshipKind::Deadline);
    }

    #[test]
    fn checked_kind_rejects_unknown_kind() {
        let err = checked_kind("hourly", &RelationshipTerms::FlatRate { amount: 1 }).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidRelationshipKind { .. }));
    }

    #[test]
    fn checked_kind_rejects_mismatched_terms() {
        let err = checked_kind("milestone", &RelationshipTerms::FlatRate { amount: 1 }).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidRelationshipKind { .. }));
    }

    #[test]
    fn terms_pick_their_creation_function() {
        assert_eq!(
            RelationshipTerms::FlatRate { amount: 1 }.creation_function(),
            "createFlatRateContract"
        );
        assert_eq!(
            RelationshipTerms::Milestone { milestones: 2 }.creation_function(),
            "createMilestoneContract"
        );
        assert_eq!(
            RelationshipTerms::Deadline { deadline: 3 }.creation_function(),
            "createDeadlineContract"
        );
    }
}
