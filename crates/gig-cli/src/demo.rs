//! # Demo Subcommand
//!
//! Seeded end-to-end run against the built-in simulated chain and an
//! in-memory voting gateway. Needs no environment configuration, no
//! node, and no address book; it exists so a new operator can watch the
//! whole lifecycle before touching a real network.
//!
//! The happy path runs mint → market → relationship → approve → fund →
//! assign → submit → resolve. With `--dispute` the run branches after
//! assignment into a dispute, a simulated vote, and an arbitration
//! verdict.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Args;

use gig_chain::ChainConnector;
use gig_chain_stub::StubChain;
use gig_dispute::{
    BackoffPolicy, DisputeFlow, MemoryGateway, Verdict, VoterKey, CHOICE_REFUND_EMPLOYER,
    CHOICE_RELEASE_WORKER,
};
use gig_workflow::interfaces::{deployments, ifaces};
use gig_workflow::{default_registry, Orchestrator, RelationshipTerms};

use gig_core::Address;

/// Arguments for the `gig demo` subcommand.
#[derive(Args, Debug)]
pub struct DemoArgs {
    /// Escrowed payment amount for the demo relationship.
    #[arg(long, default_value_t = 1000)]
    pub amount: u128,

    /// Branch into the dispute sub-flow instead of resolving normally.
    #[arg(long)]
    pub dispute: bool,

    /// Number of simulated voters on the dispute branch.
    #[arg(long, default_value_t = 10)]
    pub voters: usize,

    /// How many of the simulated voters side with the worker.
    #[arg(long, default_value_t = 7)]
    pub for_worker: usize,
}

pub async fn run_demo(args: &DemoArgs) -> Result<u8> {
    let chain = StubChain::new();
    let token = chain.token_address();
    let maker = chain.market_maker_address();
    let dispute_factory = chain.dispute_factory_address();

    let connector = ChainConnector::new(chain, Duration::from_secs(5), Duration::from_millis(10));
    let mut registry = default_registry()?;
    registry.record_deployment(deployments::TOKEN, ifaces::TOKEN, token)?;
    registry.record_deployment(deployments::MARKET_MAKER, ifaces::MARKET_MAKER, maker)?;
    registry.record_deployment(
        deployments::DISPUTE_FACTORY,
        ifaces::DISPUTE_FACTORY,
        dispute_factory,
    )?;
    let orch = Orchestrator::new(connector, registry);

    let employer = orch.connector().signer(0).await?;
    let worker = orch.connector().signer(1).await?;
    println!("Employer: {}", employer.address());
    println!("Worker:   {}", worker.address());

    orch.mint_tokens(&employer, employer.address(), args.amount)
        .await?;
    println!("Minted {} to the employer", args.amount);

    let market = orch.create_market("Demo Market", &employer).await?;
    println!("Market {} created at {}", market.index, market.address);

    let escrow = orch.connector().transport().deploy_escrow();
    let relationship = orch
        .create_relationship(
            &market.address,
            "flat_rate",
            &escrow,
            "demo://task",
            &RelationshipTerms::FlatRate {
                amount: args.amount,
            },
            &employer,
        )
        .await?;
    println!("Relationship created at {}", relationship.address);

    orch.approve_escrow(&employer, &escrow, args.amount).await?;
    orch.fund_escrow(&relationship.address, &escrow, &employer, args.amount)
        .await?;
    println!("Escrow funded, holding {}", orch.escrow_held(&escrow).await?);

    orch.assign_worker(
        &relationship.address,
        &employer,
        worker.address(),
        args.amount,
        "demo://offer",
    )
    .await?;
    println!("Worker assigned");

    if args.dispute {
        run_dispute_branch(&orch, &relationship.address, &employer, args).await?;
    } else {
        orch.submit_work(&relationship.address, &worker, "demo://solution")
            .await?;
        println!("Work submitted");
        orch.resolve(&relationship.address, &employer).await?;
        println!("Relationship resolved");
    }

    let state = orch.relationship_state(&relationship.address).await?;
    println!("Final state: {}", state.as_str());
    println!(
        "Balances: employer {}, worker {}, escrow {}",
        orch.token_balance(employer.address()).await?,
        orch.token_balance(worker.address()).await?,
        orch.escrow_held(&escrow).await?
    );
    Ok(0)
}

async fn run_dispute_branch(
    orch: &Orchestrator<StubChain>,
    relationship: &Address,
    employer: &gig_chain::Signer,
    args: &DemoArgs,
) -> Result<()> {
    let for_worker = args.for_worker.min(args.voters);
    let dispute_ref = orch
        .dispute(relationship, employer, "demo://complaint", "demo://counter")
        .await?;
    println!("Dispute opened at {}", dispute_ref.address);

    let gateway = Arc::new(MemoryGateway::new());
    let flow = DisputeFlow::new(orch, gateway).with_backoff(BackoffPolicy {
        max_attempts: 32,
        base_delay: Duration::from_millis(10),
        multiplier: 1,
    });

    let mut dispute = flow.open(&dispute_ref, "demo://complaint", "demo://counter");
    let info = flow.launch_process(&mut dispute, 3).await?;
    println!(
        "Voting process {} open for blocks {}..={}",
        info.id, info.start_block, info.end_block
    );
    flow.wait_until_started(&mut dispute).await?;

    let keys: Vec<VoterKey> = (0..args.voters)
        .map(|i| {
            let address = Address::new(format!("0x{:040x}", 0xde_0000u64 + i as u64))?;
            Ok::<_, gig_core::ValidationError>(VoterKey::generate(address))
        })
        .collect::<Result<_, _>>()?;
    let release: Vec<Address> = keys[..for_worker]
        .iter()
        .map(|k| k.address().clone())
        .collect();
    let report = flow
        .submit_ballots(&dispute, &keys, |address| {
            if release.contains(address) {
                CHOICE_RELEASE_WORKER
            } else {
                CHOICE_REFUND_EMPLOYER
            }
        })
        .await?;
    println!(
        "{} ballots submitted ({} for the worker)",
        report.submitted, for_worker
    );

    let verdict = flow.conclude(&mut dispute, employer).await?;
    match verdict {
        Verdict::ReleaseToWorker => println!("Verdict: release escrow to the worker"),
        Verdict::RefundEmployer => println!("Verdict: refund the employer"),
    }
    Ok(())
}
