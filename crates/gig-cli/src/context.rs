//! Shared command context: environment configuration, JSON-RPC
//! transport, and the registry populated from the address book.
//!
//! Every command that talks to a real node goes through [`build_context`]
//! so a missing variable or an unreadable book fails before any network
//! call is attempted.

use std::path::Path;

use anyhow::{Context as _, Result};

use gig_chain::{ChainConnector, HttpTransport, Signer};
use gig_core::{AddressBook, ChainConfig};
use gig_workflow::interfaces::{deployments, ifaces};
use gig_workflow::{default_registry, Orchestrator};

/// Everything a chain-facing command needs.
pub struct CliContext {
    pub orchestrator: Orchestrator<HttpTransport>,
    pub book: AddressBook,
}

/// Build the command context from the environment and the address book.
///
/// The book must record the `token`, `market-maker`, and
/// `dispute-factory` deployments; per-relationship contracts are
/// addressed directly by their command-line arguments.
pub fn build_context(book_path: &Path) -> Result<CliContext> {
    let config = ChainConfig::from_env().context("loading chain configuration")?;
    tracing::debug!(
        rpc_url = %config.rpc_url,
        network = %config.network,
        "chain configuration loaded"
    );

    let transport = HttpTransport::new(config.rpc_url.as_str(), config.request_timeout)
        .context("constructing JSON-RPC transport")?;
    let connector = ChainConnector::new(
        transport,
        config.confirmation_timeout,
        config.poll_interval,
    );

    let book = AddressBook::load(book_path)
        .with_context(|| format!("loading address book {}", book_path.display()))?;
    let mut registry = default_registry()?;
    for (name, interface) in [
        (deployments::TOKEN, ifaces::TOKEN),
        (deployments::MARKET_MAKER, ifaces::MARKET_MAKER),
        (deployments::DISPUTE_FACTORY, ifaces::DISPUTE_FACTORY),
    ] {
        let address = book.require(name)?.clone();
        registry.record_deployment(name, interface, address)?;
    }

    Ok(CliContext {
        orchestrator: Orchestrator::new(connector, registry),
        book,
    })
}

/// Resolve a node-managed account by index into a signer.
pub async fn signer(ctx: &CliContext, index: usize) -> Result<Signer> {
    ctx.orchestrator
        .connector()
        .signer(index)
        .await
        .with_context(|| format!("resolving signer account {index}"))
}
