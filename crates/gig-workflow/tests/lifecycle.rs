//! Relationship lifecycle integration tests against the simulated chain.

use std::time::Duration;

use gig_chain::{ChainConnector, Signer};
use gig_chain_stub::StubChain;
use gig_core::{Address, RelationshipState};
use gig_workflow::interfaces::{deployments, ifaces};
use gig_workflow::{
    default_registry, Orchestrator, RelationshipRef, RelationshipTerms, WorkflowError,
};

fn orchestrator() -> Orchestrator<StubChain> {
    let chain = StubChain::new();
    let token = chain.token_address();
    let maker = chain.market_maker_address();
    let dispute_factory = chain.dispute_factory_address();

    let connector = ChainConnector::new(
        chain,
        Duration::from_secs(5),
        Duration::from_millis(1),
    );
    let mut registry = default_registry().unwrap();
    registry
        .record_deployment(deployments::TOKEN, ifaces::TOKEN, token)
        .unwrap();
    registry
        .record_deployment(deployments::MARKET_MAKER, ifaces::MARKET_MAKER, maker)
        .unwrap();
    registry
        .record_deployment(
            deployments::DISPUTE_FACTORY,
            ifaces::DISPUTE_FACTORY,
            dispute_factory,
        )
        .unwrap();
    Orchestrator::new(connector, registry)
}

async fn signer(orch: &Orchestrator<StubChain>, index: usize) -> Signer {
    orch.connector().signer(index).await.unwrap()
}

/// Market, escrow, and a flat-rate relationship in `Proposed`.
async fn proposed_relationship(
    orch: &Orchestrator<StubChain>,
    employer: &Signer,
) -> (Address, RelationshipRef) {
    let market = orch.create_market("Test Market One", employer).await.unwrap();
    let escrow = orch.connector().transport().deploy_escrow();
    let relationship = orch
        .create_relationship(
            &market.address,
            "flat_rate",
            &escrow,
            "ipfs://task-metadata",
            &RelationshipTerms::FlatRate { amount: 1000 },
            employer,
        )
        .await
        .unwrap();
    (escrow, relationship)
}

#[tokio::test]
async fn market_indices_start_at_one() {
    let orch = orchestrator();
    let deployer = signer(&orch, 0).await;

    let first = orch.create_market("Test Market One", &deployer).await.unwrap();
    assert_eq!(first.index, 1);
    assert_eq!(first.name, "Test Market One");

    let second = orch.create_market("Test Market Two", &deployer).await.unwrap();
    assert_eq!(second.index, 2);
    assert_ne!(first.address, second.address);
}

#[tokio::test]
async fn end_to_end_flat_rate_lifecycle() {
    let orch = orchestrator();
    let employer = signer(&orch, 0).await;
    let worker = signer(&orch, 1).await;

    orch.mint_tokens(&employer, employer.address(), 1000)
        .await
        .unwrap();
    let (escrow, relationship) = proposed_relationship(&orch, &employer).await;
    assert_eq!(
        orch.relationship_state(&relationship.address).await.unwrap(),
        RelationshipState::Proposed
    );
    assert_eq!(orch.escrow_held(&escrow).await.unwrap(), 0);

    orch.approve_escrow(&employer, &escrow, 1000).await.unwrap();
    orch.fund_escrow(&relationship.address, &escrow, &employer, 1000)
        .await
        .unwrap();
    assert_eq!(orch.escrow_held(&escrow).await.unwrap(), 1000);
    assert_eq!(orch.token_balance(employer.address()).await.unwrap(), 0);
    assert_eq!(
        orch.relationship_state(&relationship.address).await.unwrap(),
        RelationshipState::Funded
    );

    orch.assign_worker(
        &relationship.address,
        &employer,
        worker.address(),
        1000,
        "offer",
    )
    .await
    .unwrap();
    assert_eq!(
        orch.worker_of(&relationship.address).await.unwrap(),
        *worker.address()
    );

    let stored = orch
        .submit_work(&relationship.address, &worker, "ipfs://solution")
        .await
        .unwrap();
    assert_eq!(stored, "ipfs://solution");

    orch.resolve(&relationship.address, &employer).await.unwrap();
    assert_eq!(
        orch.relationship_state(&relationship.address).await.unwrap(),
        RelationshipState::Resolved
    );
    assert_eq!(orch.escrow_held(&escrow).await.unwrap(), 0);
    assert_eq!(orch.token_balance(worker.address()).await.unwrap(), 1000);
    assert_eq!(orch.token_balance(employer.address()).await.unwrap(), 0);
}

#[tokio::test]
async fn fund_escrow_requires_prior_approval() {
    let orch = orchestrator();
    let employer = signer(&orch, 0).await;
    orch.mint_tokens(&employer, employer.address(), 1000)
        .await
        .unwrap();
    let (escrow, relationship) = proposed_relationship(&orch, &employer).await;

    // allowance = 0, amount = 1000 → pre-flight failure, no transaction.
    let err = orch
        .fund_escrow(&relationship.address, &escrow, &employer, 1000)
        .await
        .unwrap_err();
    match err {
        WorkflowError::InsufficientApproval {
            allowance, required, ..
        } => {
            assert_eq!(allowance, 0);
            assert_eq!(required, 1000);
        }
        other => panic!("expected InsufficientApproval, got {other:?}"),
    }
    assert_eq!(orch.escrow_held(&escrow).await.unwrap(), 0);
    assert_eq!(
        orch.relationship_state(&relationship.address).await.unwrap(),
        RelationshipState::Proposed
    );

    // allowance = 1000 → succeeds.
    orch.approve_escrow(&employer, &escrow, 1000).await.unwrap();
    orch.fund_escrow(&relationship.address, &escrow, &employer, 1000)
        .await
        .unwrap();
    assert_eq!(orch.escrow_held(&escrow).await.unwrap(), 1000);
}

#[tokio::test]
async fn reverted_funding_leaves_allowance_intact() {
    let orch = orchestrator();
    let employer = signer(&orch, 0).await;
    orch.mint_tokens(&employer, employer.address(), 500)
        .await
        .unwrap();
    let (escrow, relationship) = proposed_relationship(&orch, &employer).await;
    orch.approve_escrow(&employer, &escrow, 1000).await.unwrap();

    // Allowance covers the amount, so the pre-flight passes; the chain
    // then rejects the transfer on the balance check.
    let err = orch
        .fund_escrow(&relationship.address, &escrow, &employer, 1000)
        .await
        .unwrap_err();
    match err {
        WorkflowError::Chain(gig_chain::ChainError::TransactionReverted { reason, .. }) => {
            assert_eq!(reason, "INSUFFICIENT_BALANCE");
        }
        other => panic!("expected TransactionReverted, got {other:?}"),
    }

    // The revert commits nothing: allowance, balance, and state survive.
    assert_eq!(
        orch.token_allowance(employer.address(), &escrow)
            .await
            .unwrap(),
        1000
    );
    assert_eq!(orch.token_balance(employer.address()).await.unwrap(), 500);
    assert_eq!(orch.escrow_held(&escrow).await.unwrap(), 0);
    assert_eq!(
        orch.relationship_state(&relationship.address).await.unwrap(),
        RelationshipState::Proposed
    );
}

#[tokio::test]
async fn operations_from_wrong_state_fail_without_effect() {
    let orch = orchestrator();
    let employer = signer(&orch, 0).await;
    let worker = signer(&orch, 1).await;
    let (escrow, relationship) = proposed_relationship(&orch, &employer).await;

    // resolve from Proposed
    let err = orch
        .resolve(&relationship.address, &employer)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::InvalidStateTransition {
            state: RelationshipState::Proposed,
            operation: "resolve",
            ..
        }
    ));

    // submit_work from Proposed
    let err = orch
        .submit_work(&relationship.address, &worker, "ipfs://early")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::InvalidStateTransition { .. }
    ));

    // dispute from Proposed
    let err = orch
        .dispute(&relationship.address, &employer, "c1", "c2")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::InvalidStateTransition { .. }
    ));

    // State and escrow untouched by any of the rejected operations.
    assert_eq!(
        orch.relationship_state(&relationship.address).await.unwrap(),
        RelationshipState::Proposed
    );
    assert_eq!(orch.escrow_held(&escrow).await.unwrap(), 0);
}

#[tokio::test]
async fn dispute_branch_reaches_disputed() {
    let orch = orchestrator();
    let employer = signer(&orch, 0).await;
    let worker = signer(&orch, 1).await;
    let (_escrow, relationship) = proposed_relationship(&orch, &employer).await;

    orch.assign_worker(
        &relationship.address,
        &employer,
        worker.address(),
        1000,
        "offer",
    )
    .await
    .unwrap();

    let dispute = orch
        .dispute(
            &relationship.address,
            &worker,
            "ipfs://complaint",
            "ipfs://counter-complaint",
        )
        .await
        .unwrap();
    assert_eq!(dispute.relationship, relationship.address);
    assert_eq!(
        orch.relationship_state(&relationship.address).await.unwrap(),
        RelationshipState::Disputed
    );

    // Once disputed, the cooperative path is closed.
    let err = orch
        .resolve(&relationship.address, &employer)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::InvalidStateTransition { .. }
    ));
}

#[tokio::test]
async fn arbitration_releases_escrow_per_verdict() {
    let orch = orchestrator();
    let employer = signer(&orch, 0).await;
    let worker = signer(&orch, 1).await;
    let arbiter = signer(&orch, 2).await;

    orch.mint_tokens(&employer, employer.address(), 1000)
        .await
        .unwrap();
    let (escrow, relationship) = proposed_relationship(&orch, &employer).await;
    orch.approve_escrow(&employer, &escrow, 1000).await.unwrap();
    orch.fund_escrow(&relationship.address, &escrow, &employer, 1000)
        .await
        .unwrap();
    orch.assign_worker(
        &relationship.address,
        &employer,
        worker.address(),
        1000,
        "offer",
    )
    .await
    .unwrap();

    let dispute = orch
        .dispute(&relationship.address, &worker, "c1", "c2")
        .await
        .unwrap();
    orch.arbitrate(&dispute, &arbiter, true).await.unwrap();

    assert_eq!(
        orch.relationship_state(&relationship.address).await.unwrap(),
        RelationshipState::Arbitrated
    );
    assert_eq!(orch.escrow_held(&escrow).await.unwrap(), 0);
    assert_eq!(orch.token_balance(worker.address()).await.unwrap(), 1000);

    // Terminal: a second verdict is rejected by the pre-check.
    let err = orch.arbitrate(&dispute, &arbiter, false).await.unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::InvalidStateTransition { .. }
    ));
}

#[tokio::test]
async fn unknown_kind_fails_before_any_transaction() {
    let orch = orchestrator();
    let employer = signer(&orch, 0).await;
    let market = orch.create_market("Test Market One", &employer).await.unwrap();
    let escrow = orch.connector().transport().deploy_escrow();
    let block_before = orch.connector().block_number().await.unwrap();

    let err = orch
        .create_relationship(
            &market.address,
            "hourly",
            &escrow,
            "ipfs://task",
            &RelationshipTerms::FlatRate { amount: 1 },
            &employer,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::InvalidRelationshipKind { .. }));
    assert_eq!(
        orch.connector().block_number().await.unwrap(),
        block_before
    );
}

#[tokio::test]
async fn reverted_transaction_carries_reason() {
    let orch = orchestrator();
    let employer = signer(&orch, 0).await;
    let worker = signer(&orch, 1).await;
    let outsider = signer(&orch, 2).await;
    let (_escrow, relationship) = proposed_relationship(&orch, &employer).await;

    orch.assign_worker(
        &relationship.address,
        &employer,
        worker.address(),
        1000,
        "offer",
    )
    .await
    .unwrap();

    // Submission by a non-worker passes the state pre-check but reverts
    // on-chain; the revert reason is recovered by replay.
    let err = orch
        .submit_work(&relationship.address, &outsider, "ipfs://fake")
        .await
        .unwrap_err();
    match err {
        WorkflowError::Chain(gig_chain::ChainError::TransactionReverted { reason, .. }) => {
            assert_eq!(reason, "NOT_WORKER");
        }
        other => panic!("expected TransactionReverted, got {other:?}"),
    }
}
