//! # Dispute Subcommand
//!
//! Drives a dispute end to end: opens the dispute contract through the
//! factory, registers a voting process with the external voting system,
//! submits one sealed ballot per voter, waits out the window, and
//! records the verdict on-chain.
//!
//! Voter identities are generated locally, which is only meaningful on
//! development networks where the gateway accepts unregistered voters.
//! With `--gateway-url` the run targets a real gateway; without it an
//! in-memory gateway simulates one.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::{Args, Subcommand};

use gig_chain::HttpTransport;
use gig_core::Address;
use gig_dispute::{
    DisputeFlow, HttpVotingGateway, MemoryGateway, Verdict, VoterKey, VotingGateway,
    CHOICE_REFUND_EMPLOYER, CHOICE_RELEASE_WORKER,
};
use gig_workflow::DisputeRef;

use crate::context::{build_context, signer, CliContext};
use crate::parse_address;

/// Arguments for the `gig dispute` subcommand.
#[derive(Args, Debug)]
pub struct DisputeArgs {
    #[command(subcommand)]
    pub command: DisputeCommand,
}

/// Dispute subcommands.
#[derive(Subcommand, Debug)]
pub enum DisputeCommand {
    /// Open a dispute and drive it through voting to a verdict.
    Run {
        /// Address of the relationship under dispute.
        #[arg(long)]
        relationship: String,
        /// Content pointer for the initiator's complaint.
        #[arg(long)]
        complaint: String,
        /// Content pointer for the counterparty's counter-complaint.
        #[arg(long)]
        counter_complaint: String,
        /// Index of the initiator's node-managed account.
        #[arg(long, default_value_t = 0)]
        initiator: usize,
        /// Index of the account recording the verdict on-chain.
        #[arg(long, default_value_t = 0)]
        arbiter: usize,
        /// How many gateway blocks the voting window stays open.
        #[arg(long, default_value_t = 16)]
        duration_blocks: u64,
        /// Number of voter identities to generate.
        #[arg(long, default_value_t = 10)]
        voters: usize,
        /// How many of the voters vote to release escrow to the worker;
        /// the rest vote to refund the employer.
        #[arg(long, default_value_t = 0)]
        for_worker: usize,
        /// Voting-gateway base URL; omitted, an in-memory gateway is used.
        #[arg(long)]
        gateway_url: Option<String>,
    },
}

pub async fn run_dispute(args: &DisputeArgs, book_path: &Path) -> Result<u8> {
    let ctx = build_context(book_path)?;

    match &args.command {
        DisputeCommand::Run {
            relationship,
            complaint,
            counter_complaint,
            initiator,
            arbiter,
            duration_blocks,
            voters,
            for_worker,
            gateway_url,
        } => {
            if *for_worker > *voters {
                bail!("--for-worker ({for_worker}) exceeds --voters ({voters})");
            }
            let relationship = parse_address("relationship", relationship)?;
            let initiator = signer(&ctx, *initiator).await?;
            let arbiter = signer(&ctx, *arbiter).await?;

            let dispute_ref = ctx
                .orchestrator
                .dispute(&relationship, &initiator, complaint, counter_complaint)
                .await?;
            println!("OK: dispute opened at {}", dispute_ref.address);

            let verdict = match gateway_url {
                Some(url) => {
                    let gateway = HttpVotingGateway::new(url.clone(), Duration::from_secs(30))?;
                    drive(
                        &ctx,
                        Arc::new(gateway),
                        &dispute_ref,
                        complaint,
                        counter_complaint,
                        &arbiter,
                        *duration_blocks,
                        *voters,
                        *for_worker,
                    )
                    .await?
                }
                None => {
                    drive(
                        &ctx,
                        Arc::new(MemoryGateway::new()),
                        &dispute_ref,
                        complaint,
                        counter_complaint,
                        &arbiter,
                        *duration_blocks,
                        *voters,
                        *for_worker,
                    )
                    .await?
                }
            };

            match verdict {
                Verdict::ReleaseToWorker => println!("Verdict: release escrow to the worker"),
                Verdict::RefundEmployer => println!("Verdict: refund the employer"),
            }
            Ok(0)
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn drive<G: VotingGateway + 'static>(
    ctx: &CliContext,
    gateway: Arc<G>,
    dispute_ref: &DisputeRef,
    complaint: &str,
    counter_complaint: &str,
    arbiter: &gig_chain::Signer,
    duration_blocks: u64,
    voters: usize,
    for_worker: usize,
) -> Result<Verdict> {
    let flow: DisputeFlow<'_, HttpTransport, G> =
        DisputeFlow::new(&ctx.orchestrator, gateway);

    let mut dispute = flow.open(dispute_ref, complaint, counter_complaint);
    let info = flow.launch_process(&mut dispute, duration_blocks).await?;
    println!(
        "OK: voting process {} (blocks {}..={})",
        info.id, info.start_block, info.end_block
    );

    flow.wait_until_started(&mut dispute).await?;

    let keys = voter_keys(voters)?;
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
        "OK: {} ballots submitted, {} failed",
        report.submitted,
        report.failures.len()
    );

    Ok(flow.conclude(&mut dispute, arbiter).await?)
}

/// Generate locally-held voter identities with distinct addresses.
fn voter_keys(n: usize) -> Result<Vec<VoterKey>> {
    (0..n)
        .map(|i| {
            let address = Address::new(format!("0x{:040x}", 0xb0_0000u64 + i as u64))?;
            Ok(VoterKey::generate(address))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voter_keys_are_distinct() {
        let keys = voter_keys(5).unwrap();
        for (i, a) in keys.iter().enumerate() {
            for b in &keys[i + 1..] {
                assert_ne!(a.address(), b.address());
            }
        }
    }
}
