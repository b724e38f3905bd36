//! # Token Subcommand
//!
//! Settlement-token operations against the deployment recorded in the
//! address book. Minting is only meaningful on development networks
//! where the token contract is freshly deployed and unrestricted.
//!
//! ## Subcommands
//!
//! - `mint` — Mint tokens to an account.
//! - `balance` — Show an account's token balance.

use std::path::Path;

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::context::{build_context, signer};
use crate::parse_address;

/// Arguments for the `gig token` subcommand.
#[derive(Args, Debug)]
pub struct TokenArgs {
    #[command(subcommand)]
    pub command: TokenCommand,
}

/// Token subcommands.
#[derive(Subcommand, Debug)]
pub enum TokenCommand {
    /// Mint tokens to an account (development networks only).
    Mint {
        /// Recipient account address.
        #[arg(long)]
        account: String,
        /// Token amount to mint.
        #[arg(long)]
        amount: u128,
        /// Index of the node-managed account sending the mint.
        #[arg(long, default_value_t = 0)]
        signer: usize,
    },

    /// Show an account's token balance.
    Balance {
        /// Account address to query.
        #[arg(long)]
        account: String,
    },
}

pub async fn run_token(args: &TokenArgs, book_path: &Path) -> Result<u8> {
    let ctx = build_context(book_path)?;

    match &args.command {
        TokenCommand::Mint {
            account,
            amount,
            signer: index,
        } => {
            let account = parse_address("account", account)?;
            let sender = signer(&ctx, *index).await?;
            ctx.orchestrator
                .mint_tokens(&sender, &account, *amount)
                .await?;
            println!("OK: minted {amount} to {account}");
            Ok(0)
        }

        TokenCommand::Balance { account } => {
            let account = parse_address("account", account)?;
            let balance = ctx.orchestrator.token_balance(&account).await?;
            println!("Account: {account}");
            println!("  Balance: {balance}");
            Ok(0)
        }
    }
}
