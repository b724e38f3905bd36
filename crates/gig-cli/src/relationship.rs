//! # Relationship Subcommand
//!
//! Lifecycle operations on work relationships inside a market.
//!
//! ## Subcommands
//!
//! - `create` — Create a flat-rate, milestone, or deadline relationship.
//! - `assign` — Assign a worker to a relationship.
//! - `submit` — Submit work on behalf of the assigned worker.
//! - `resolve` — Resolve a submitted relationship, releasing escrow.
//! - `status` — Show the relationship's on-chain state.

use std::path::Path;

use anyhow::{bail, Context as _, Result};
use clap::{Args, Subcommand};

use gig_workflow::RelationshipTerms;

use crate::context::{build_context, signer};
use crate::parse_address;

/// Arguments for the `gig relationship` subcommand.
#[derive(Args, Debug)]
pub struct RelationshipArgs {
    #[command(subcommand)]
    pub command: RelationshipCommand,
}

/// Relationship subcommands.
#[derive(Subcommand, Debug)]
pub enum RelationshipCommand {
    /// Create a relationship inside a market (state: PROPOSED).
    Create {
        /// Address of the market contract.
        #[arg(long)]
        market: String,
        /// Relationship kind: flat_rate, milestone, or deadline.
        #[arg(long)]
        kind: String,
        /// Address of the escrow contract backing payment.
        #[arg(long)]
        escrow: String,
        /// Content pointer describing the task.
        #[arg(long)]
        task_ptr: String,
        /// Payment amount; required for kind flat_rate.
        #[arg(long)]
        amount: Option<u128>,
        /// Milestone count; required for kind milestone.
        #[arg(long)]
        milestones: Option<u64>,
        /// Completion deadline as a unix timestamp; required for kind deadline.
        #[arg(long)]
        deadline: Option<u64>,
        /// Index of the employer's node-managed account.
        #[arg(long, default_value_t = 0)]
        signer: usize,
    },

    /// Assign a worker (PROPOSED or FUNDED → ASSIGNED).
    Assign {
        /// Address of the relationship contract.
        #[arg(long)]
        relationship: String,
        /// Address of the worker to assign.
        #[arg(long)]
        worker: String,
        /// Agreed payment amount.
        #[arg(long)]
        amount: u128,
        /// Content pointer for the offer metadata.
        #[arg(long, default_value = "")]
        metadata: String,
        /// Index of the employer's node-managed account.
        #[arg(long, default_value_t = 0)]
        signer: usize,
    },

    /// Submit completed work (ASSIGNED → SUBMITTED).
    Submit {
        /// Address of the relationship contract.
        #[arg(long)]
        relationship: String,
        /// Content pointer for the submitted solution.
        #[arg(long)]
        solution_ptr: String,
        /// Index of the worker's node-managed account.
        #[arg(long)]
        signer: usize,
    },

    /// Resolve and release escrow to the worker (SUBMITTED → RESOLVED).
    Resolve {
        /// Address of the relationship contract.
        #[arg(long)]
        relationship: String,
        /// Index of the employer's node-managed account.
        #[arg(long, default_value_t = 0)]
        signer: usize,
    },

    /// Show the relationship's on-chain state and worker.
    Status {
        /// Address of the relationship contract.
        #[arg(long)]
        relationship: String,
    },
}

pub async fn run_relationship(args: &RelationshipArgs, book_path: &Path) -> Result<u8> {
    let ctx = build_context(book_path)?;

    match &args.command {
        RelationshipCommand::Create {
            market,
            kind,
            escrow,
            task_ptr,
            amount,
            milestones,
            deadline,
            signer: index,
        } => {
            let market = parse_address("market", market)?;
            let escrow = parse_address("escrow", escrow)?;
            let terms = terms_for(kind, *amount, *milestones, *deadline)?;
            let employer = signer(&ctx, *index).await?;
            let relationship = ctx
                .orchestrator
                .create_relationship(&market, kind, &escrow, task_ptr, &terms, &employer)
                .await?;
            println!("OK: created {} relationship", relationship.kind.as_str());
            println!("  Address: {}", relationship.address);
            println!("  Market: {}", relationship.market);
            println!("  Index: {}", relationship.index);
            println!("  Escrow: {}", relationship.escrow);
            Ok(0)
        }

        RelationshipCommand::Assign {
            relationship,
            worker,
            amount,
            metadata,
            signer: index,
        } => {
            let relationship = parse_address("relationship", relationship)?;
            let worker = parse_address("worker", worker)?;
            let employer = signer(&ctx, *index).await?;
            ctx.orchestrator
                .assign_worker(&relationship, &employer, &worker, *amount, metadata)
                .await?;
            println!("OK: assigned {worker} to {relationship}");
            Ok(0)
        }

        RelationshipCommand::Submit {
            relationship,
            solution_ptr,
            signer: index,
        } => {
            let relationship = parse_address("relationship", relationship)?;
            let worker = signer(&ctx, *index).await?;
            let stored = ctx
                .orchestrator
                .submit_work(&relationship, &worker, solution_ptr)
                .await?;
            println!("OK: work submitted on {relationship}");
            println!("  Stored pointer: {stored}");
            Ok(0)
        }

        RelationshipCommand::Resolve {
            relationship,
            signer: index,
        } => {
            let relationship = parse_address("relationship", relationship)?;
            let employer = signer(&ctx, *index).await?;
            ctx.orchestrator.resolve(&relationship, &employer).await?;
            println!("OK: resolved {relationship}, escrow released");
            Ok(0)
        }

        RelationshipCommand::Status { relationship } => {
            let relationship = parse_address("relationship", relationship)?;
            let state = ctx.orchestrator.relationship_state(&relationship).await?;
            println!("Relationship: {relationship}");
            println!("  State: {}", state.as_str());
            let worker = ctx.orchestrator.worker_of(&relationship).await?;
            if worker.to_bytes().iter().all(|b| *b == 0) {
                println!("  Worker: (none)");
            } else {
                println!("  Worker: {worker}");
            }
            Ok(0)
        }
    }
}

/// Build the terms for the requested kind, insisting on the matching
/// term argument.
fn terms_for(
    kind: &str,
    amount: Option<u128>,
    milestones: Option<u64>,
    deadline: Option<u64>,
) -> Result<RelationshipTerms> {
    match kind {
        "flat_rate" => Ok(RelationshipTerms::FlatRate {
            amount: amount.context("--amount is required for kind flat_rate")?,
        }),
        "milestone" => Ok(RelationshipTerms::Milestone {
            milestones: milestones.context("--milestones is required for kind milestone")?,
        }),
        "deadline" => Ok(RelationshipTerms::Deadline {
            deadline: deadline.context("--deadline is required for kind deadline")?,
        }),
        other => bail!("unknown relationship kind \"{other}\" (expected flat_rate, milestone, or deadline)"),
    }
}
