//! # Market Subcommand
//!
//! Market creation through the deployed market factory.
//!
//! ## Subcommands
//!
//! - `create` — Create a named market and print its address and index.

use std::path::Path;

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::context::{build_context, signer};

/// Arguments for the `gig market` subcommand.
#[derive(Args, Debug)]
pub struct MarketArgs {
    #[command(subcommand)]
    pub command: MarketCommand,
}

/// Market subcommands.
#[derive(Subcommand, Debug)]
pub enum MarketCommand {
    /// Create a new market through the market factory.
    Create {
        /// Human-readable market name.
        #[arg(long)]
        name: String,
        /// Index of the node-managed account that pays for creation.
        #[arg(long, default_value_t = 0)]
        signer: usize,
        /// Record the new market in the address book under this name.
        #[arg(long)]
        save_as: Option<String>,
    },
}

pub async fn run_market(args: &MarketArgs, book_path: &Path) -> Result<u8> {
    let mut ctx = build_context(book_path)?;

    match &args.command {
        MarketCommand::Create {
            name,
            signer: index,
            save_as,
        } => {
            let deployer = signer(&ctx, *index).await?;
            let market = ctx.orchestrator.create_market(name, &deployer).await?;
            println!("OK: created market \"{}\"", market.name);
            println!("  Address: {}", market.address);
            println!("  Index: {}", market.index);
            if let Some(entry) = save_as {
                ctx.book.insert(entry.clone(), market.address.clone());
                ctx.book.save(book_path)?;
                println!("  Recorded as \"{entry}\" in {}", book_path.display());
            }
            Ok(0)
        }
    }
}
