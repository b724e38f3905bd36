//! # gig CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.
//! Chain-facing commands read node configuration from the environment
//! and deployed addresses from the address book; `gig demo` runs
//! self-contained on the simulated chain.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use gig_cli::demo::{run_demo, DemoArgs};
use gig_cli::dispute::{run_dispute, DisputeArgs};
use gig_cli::escrow::{run_escrow, EscrowArgs};
use gig_cli::market::{run_market, MarketArgs};
use gig_cli::relationship::{run_relationship, RelationshipArgs};
use gig_cli::token::{run_token, TokenArgs};

/// Gig Stack CLI
///
/// Off-chain orchestration for the freelance-market contract suite:
/// market and relationship lifecycle operations, escrow funding, token
/// queries, and dispute runs through the external voting system.
#[derive(Parser, Debug)]
#[command(name = "gig", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the deployed-address book.
    #[arg(long, global = true, default_value = "deployments.json")]
    book: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Market creation through the market factory.
    Market(MarketArgs),

    /// Relationship lifecycle (create, assign, submit, resolve, status).
    Relationship(RelationshipArgs),

    /// Escrow approval, funding, and balance checks.
    Escrow(EscrowArgs),

    /// Settlement-token mint and balance queries.
    Token(TokenArgs),

    /// Drive a dispute through the external voting system.
    Dispute(DisputeArgs),

    /// Seeded end-to-end run on the simulated chain; needs no node.
    Demo(DemoArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity level.
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Market(args) => run_market(&args, &cli.book).await,
        Commands::Relationship(args) => run_relationship(&args, &cli.book).await,
        Commands::Escrow(args) => run_escrow(&args, &cli.book).await,
        Commands::Token(args) => run_token(&args, &cli.book).await,
        Commands::Dispute(args) => run_dispute(&args, &cli.book).await,
        Commands::Demo(args) => run_demo(&args).await,
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parse_market_create() {
        let cli = Cli::try_parse_from(["gig", "market", "create", "--name", "Rust Jobs"]).unwrap();
        assert!(matches!(cli.command, Commands::Market(_)));
        if let Commands::Market(args) = cli.command {
            let gig_cli::market::MarketCommand::Create {
                name,
                signer,
                save_as,
            } = args.command;
            assert_eq!(name, "Rust Jobs");
            assert_eq!(signer, 0);
            assert!(save_as.is_none());
        }
    }

    #[test]
    fn cli_parse_relationship_create_flat_rate() {
        let addr = format!("0x{}", "a".repeat(40));
        let cli = Cli::try_parse_from([
            "gig",
            "relationship",
            "create",
            "--market",
            &addr,
            "--kind",
            "flat_rate",
            "--escrow",
            &addr,
            "--task-ptr",
            "ipfs://task",
            "--amount",
            "1000",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Relationship(_)));
        if let Commands::Relationship(args) = cli.command {
            if let gig_cli::relationship::RelationshipCommand::Create { kind, amount, .. } =
                args.command
            {
                assert_eq!(kind, "flat_rate");
                assert_eq!(amount, Some(1000));
            } else {
                panic!("expected create");
            }
        }
    }

    #[test]
    fn cli_parse_relationship_assign() {
        let addr = format!("0x{}", "b".repeat(40));
        let cli = Cli::try_parse_from([
            "gig",
            "relationship",
            "assign",
            "--relationship",
            &addr,
            "--worker",
            &addr,
            "--amount",
            "500",
            "--signer",
            "2",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Relationship(_)));
    }

    #[test]
    fn cli_parse_escrow_fund() {
        let addr = format!("0x{}", "c".repeat(40));
        let cli = Cli::try_parse_from([
            "gig",
            "escrow",
            "fund",
            "--relationship",
            &addr,
            "--escrow",
            &addr,
            "--amount",
            "1000",
        ])
        .unwrap();
        if let Commands::Escrow(args) = cli.command {
            assert!(matches!(
                args.command,
                gig_cli::escrow::EscrowCommand::Fund { amount: 1000, .. }
            ));
        } else {
            panic!("expected escrow");
        }
    }

    #[test]
    fn cli_parse_token_balance() {
        let addr = format!("0x{}", "d".repeat(40));
        let cli =
            Cli::try_parse_from(["gig", "token", "balance", "--account", &addr]).unwrap();
        assert!(matches!(cli.command, Commands::Token(_)));
    }

    #[test]
    fn cli_parse_dispute_run_with_gateway() {
        let addr = format!("0x{}", "e".repeat(40));
        let cli = Cli::try_parse_from([
            "gig",
            "dispute",
            "run",
            "--relationship",
            &addr,
            "--complaint",
            "ipfs://c1",
            "--counter-complaint",
            "ipfs://c2",
            "--voters",
            "25",
            "--for-worker",
            "20",
            "--gateway-url",
            "http://localhost:9090",
        ])
        .unwrap();
        if let Commands::Dispute(args) = cli.command {
            let gig_cli::dispute::DisputeCommand::Run {
                voters,
                for_worker,
                gateway_url,
                ..
            } = args.command;
            assert_eq!(voters, 25);
            assert_eq!(for_worker, 20);
            assert_eq!(gateway_url.as_deref(), Some("http://localhost:9090"));
        }
    }

    #[test]
    fn cli_parse_demo_defaults() {
        let cli = Cli::try_parse_from(["gig", "demo"]).unwrap();
        if let Commands::Demo(args) = cli.command {
            assert_eq!(args.amount, 1000);
            assert!(!args.dispute);
            assert_eq!(args.voters, 10);
        } else {
            panic!("expected demo");
        }
    }

    #[test]
    fn cli_parse_demo_dispute_branch() {
        let cli =
            Cli::try_parse_from(["gig", "demo", "--dispute", "--for-worker", "3"]).unwrap();
        if let Commands::Demo(args) = cli.command {
            assert!(args.dispute);
            assert_eq!(args.for_worker, 3);
        }
    }

    #[test]
    fn cli_parse_book_option() {
        let cli = Cli::try_parse_from(["gig", "--book", "/tmp/dev.json", "demo"]).unwrap();
        assert_eq!(cli.book, PathBuf::from("/tmp/dev.json"));
    }

    #[test]
    fn cli_parse_verbose_levels() {
        let cli0 = Cli::try_parse_from(["gig", "demo"]).unwrap();
        assert_eq!(cli0.verbose, 0);

        let cli2 = Cli::try_parse_from(["gig", "-vv", "demo"]).unwrap();
        assert_eq!(cli2.verbose, 2);
    }

    #[test]
    fn cli_parse_no_subcommand_errors() {
        assert!(Cli::try_parse_from(["gig"]).is_err());
    }

    #[test]
    fn cli_parse_unknown_kind_still_parses() {
        // Kind validation happens at run time, not parse time.
        let addr = format!("0x{}", "f".repeat(40));
        let cli = Cli::try_parse_from([
            "gig",
            "relationship",
            "create",
            "--market",
            &addr,
            "--kind",
            "hourly",
            "--escrow",
            &addr,
            "--task-ptr",
            "t",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Relationship(_)));
    }
}
