//! # Escrow Subcommand
//!
//! Escrow approval, funding, and balance checks.
//!
//! ## Subcommands
//!
//! - `approve` — Approve the escrow to pull settlement tokens.
//! - `fund` — Fund a relationship's escrow (PROPOSED → FUNDED).
//! - `check` — Show the amount currently held by an escrow.

use std::path::Path;

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::context::{build_context, signer};
use crate::parse_address;

/// Arguments for the `gig escrow` subcommand.
#[derive(Args, Debug)]
pub struct EscrowArgs {
    #[command(subcommand)]
    pub command: EscrowCommand,
}

/// Escrow subcommands.
#[derive(Subcommand, Debug)]
pub enum EscrowCommand {
    /// Approve the escrow to pull tokens from the payer's account.
    Approve {
        /// Address of the escrow contract.
        #[arg(long)]
        escrow: String,
        /// Token amount to approve.
        #[arg(long)]
        amount: u128,
        /// Index of the payer's node-managed account.
        #[arg(long, default_value_t = 0)]
        signer: usize,
    },

    /// Fund a relationship's escrow. Requires a prior approval covering
    /// the amount; the allowance is checked before any transaction.
    Fund {
        /// Address of the relationship contract.
        #[arg(long)]
        relationship: String,
        /// Address of the escrow contract.
        #[arg(long)]
        escrow: String,
        /// Token amount to deposit.
        #[arg(long)]
        amount: u128,
        /// Index of the payer's node-managed account.
        #[arg(long, default_value_t = 0)]
        signer: usize,
    },

    /// Show the amount currently held by an escrow.
    Check {
        /// Address of the escrow contract.
        #[arg(long)]
        escrow: String,
    },
}

pub async fn run_escrow(args: &EscrowArgs, book_path: &Path) -> Result<u8> {
    let ctx = build_context(book_path)?;

    match &args.command {
        EscrowCommand::Approve {
            escrow,
            amount,
            signer: index,
        } => {
            let escrow = parse_address("escrow", escrow)?;
            let payer = signer(&ctx, *index).await?;
            ctx.orchestrator
                .approve_escrow(&payer, &escrow, *amount)
                .await?;
            println!("OK: approved {escrow} for {amount}");
            Ok(0)
        }

        EscrowCommand::Fund {
            relationship,
            escrow,
            amount,
            signer: index,
        } => {
            let relationship = parse_address("relationship", relationship)?;
            let escrow = parse_address("escrow", escrow)?;
            let payer = signer(&ctx, *index).await?;
            ctx.orchestrator
                .fund_escrow(&relationship, &escrow, &payer, *amount)
                .await?;
            println!("OK: funded {escrow} with {amount}");
            Ok(0)
        }

        EscrowCommand::Check { escrow } => {
            let escrow = parse_address("escrow", escrow)?;
            let held = ctx.orchestrator.escrow_held(&escrow).await?;
            println!("Escrow: {escrow}");
            println!("  Held: {held}");
            Ok(0)
        }
    }
}
