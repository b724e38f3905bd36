//! # gig-cli — CLI Tool for the Gig Stack
//!
//! Provides the `gig` command-line interface over the workflow
//! orchestrator. Commands that touch a real chain read their node
//! configuration from the environment and the deployed-address book from
//! a JSON file; the `demo` command needs neither and runs the full
//! lifecycle against the built-in simulated chain.
//!
//! ## Subcommands
//!
//! - `gig market` — Market creation through the market factory.
//! - `gig relationship` — Relationship lifecycle (create, assign,
//!   submit, resolve, status).
//! - `gig escrow` — Escrow approval, funding, and balance checks.
//! - `gig token` — Settlement-token mint and balance queries.
//! - `gig dispute` — Drive a dispute through the external voting system.
//! - `gig demo` — Seeded end-to-end run on the simulated chain.

pub mod context;
pub mod demo;
pub mod dispute;
pub mod escrow;
pub mod market;
pub mod relationship;
pub mod token;

use anyhow::Result;
use gig_core::Address;

/// Parse a command-line address argument, naming the flag on failure.
pub fn parse_address(flag: &str, value: &str) -> Result<Address> {
    Address::new(value)
        .map_err(|e| anyhow::anyhow!("invalid address for --{flag}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_address_accepts_checksummed_input() {
        let addr = parse_address("worker", "0xAB0000000000000000000000000000000000CDef").unwrap();
        assert_eq!(addr.as_str(), "0xab0000000000000000000000000000000000cdef");
    }

    #[test]
    fn parse_address_names_the_flag() {
        let err = parse_address("escrow", "0x123").unwrap_err();
        assert!(err.to_string().contains("--escrow"));
    }

    #[test]
    fn public_modules_are_accessible() {
        // Verify that the public module re-exports compile.
        let _ = std::any::type_name::<market::MarketArgs>();
        let _ = std::any::type_name::<relationship::RelationshipArgs>();
        let _ = std::any::type_name::<escrow::EscrowArgs>();
        let _ = std::any::type_name::<token::TokenArgs>();
        let _ = std::any::type_name::<dispute::DisputeArgs>();
        let _ = std::any::type_name::<demo::DemoArgs>();
    }
}
