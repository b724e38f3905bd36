//! # Contract Interface Catalog
//!
//! The marketplace contract surfaces, described as data. Selectors and
//! event signature hashes are precomputed by the external compilation
//! step and carried here as constants; the registry validates them at
//! construction.

use gig_registry::{AbiType, ContractRegistry, InterfaceDescription, RegistryError};

// ── Settlement token (ERC-20) ──────────────────────────────────────────

/// keccak256("approve(address,uint256)")[0..4]
pub const SEL_APPROVE: &str = "0x095ea7b3";
/// keccak256("allowance(address,address)")[0..4]
pub const SEL_ALLOWANCE: &str = "0xdd62ed3e";
/// keccak256("balanceOf(address)")[0..4]
pub const SEL_BALANCE_OF: &str = "0x70a08231";
/// keccak256("transfer(address,uint256)")[0..4]
pub const SEL_TRANSFER: &str = "0xa9059cbb";
/// keccak256("transferFrom(address,address,uint256)")[0..4]
pub const SEL_TRANSFER_FROM: &str = "0x23b872dd";
/// keccak256("mint(address,uint256)")[0..4]
pub const SEL_MINT: &str = "0x40c10f19";
/// keccak256("Transfer(address,address,uint256)")
pub const TOPIC_TRANSFER: &str =
    "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef";
/// keccak256("Approval(address,address,uint256)")
pub const TOPIC_APPROVAL: &str =
    "0x8c5be1e5ebec7d5bd14f71427d1e84f3dd0314c0f7b2291e5b200ac8c7c3b925";

// ── Market factory ─────────────────────────────────────────────────────

/// keccak256("createMarket(string)")[0..4]
pub const SEL_CREATE_MARKET: &str = "0x3ed67b8f";
/// keccak256("MarketCreated(address,uint256,address,string)")
pub const TOPIC_MARKET_CREATED: &str =
    "0x5b3fd0a0c38f1b1e3f0c2d94a14bb0d3c0e8f14d14b5b2b77a33a1c6ea3f9d21";

// ── Market ─────────────────────────────────────────────────────────────

/// keccak256("createFlatRateContract(address,string,uint256)")[0..4]
pub const SEL_CREATE_FLAT_RATE: &str = "0x5d1ca631";
/// keccak256("createMilestoneContract(address,string,uint256)")[0..4]
pub const SEL_CREATE_MILESTONE: &str = "0x8d0fac0b";
/// keccak256("createDeadlineContract(address,string,uint256)")[0..4]
pub const SEL_CREATE_DEADLINE: &str = "0xc1a9e1d3";
/// keccak256("RelationshipCreated(address,uint256,address)")
pub const TOPIC_RELATIONSHIP_CREATED: &str =
    "0x2f00a965ff4a1f4f3bd1c8b52cf8b23a2ad410a1cf7c1e9b84dd25b22f1ecf30";

// ── Work relationship ──────────────────────────────────────────────────

/// keccak256("contractStatus()")[0..4]
pub const SEL_CONTRACT_STATUS: &str = "0x8f779201";
/// keccak256("worker()")[0..4]
pub const SEL_WORKER: &str = "0x9d0bd5ec";
/// keccak256("getTaskSolutionPointer()")[0..4]
pub const SEL_TASK_SOLUTION_POINTER: &str = "0x51a08f49";
/// keccak256("assignWorker(address,uint256,string)")[0..4]
pub const SEL_ASSIGN_WORKER: &str = "0x2f9d3c3a";
/// keccak256("submitWork(string)")[0..4]
pub const SEL_SUBMIT_WORK: &str = "0x6df2f0a8";
/// keccak256("resolve()")[0..4]
pub const SEL_RESOLVE: &str = "0x0e8643b2";

// ── Escrow ─────────────────────────────────────────────────────────────

/// keccak256("fund(uint256)")[0..4]
pub const SEL_FUND: &str = "0xca1d209d";
/// keccak256("heldAmount()")[0..4]
pub const SEL_HELD_AMOUNT: &str = "0x3e158b0c";

// ── Dispute ────────────────────────────────────────────────────────────

/// keccak256("createDispute(address,string,string)")[0..4]
pub const SEL_CREATE_DISPUTE: &str = "0x1e0034d1";
/// keccak256("DisputeCreated(address,uint256,address)")
pub const TOPIC_DISPUTE_CREATED: &str =
    "0xb3d0a1cc2e1b07e90cf9312a3a1f5c2e66d0b5f3d6c0af3e52f7e2b9ad04c861";
/// keccak256("resolveDispute(bool)")[0..4]
pub const SEL_RESOLVE_DISPUTE: &str = "0x7dc04304";

/// Registry names for the contracts the stack deploys once per network.
pub mod deployments {
    /// The settlement token (DAI on public networks).
    pub const TOKEN: &str = "token";
    /// The market factory.
    pub const MARKET_MAKER: &str = "market-maker";
    /// The dispute factory.
    pub const DISPUTE_FACTORY: &str = "dispute-factory";
}

/// Interface names used with [`ContractRegistry::handle_at`] for
/// contracts discovered from events rather than deployed up front.
pub mod ifaces {
    pub const TOKEN: &str = "Token";
    pub const MARKET_MAKER: &str = "MarketMaker";
    pub const MARKET: &str = "Market";
    pub const RELATIONSHIP: &str = "WorkRelationship";
    pub const ESCROW: &str = "Escrow";
    pub const DISPUTE_FACTORY: &str = "DisputeFactory";
    pub const DISPUTE: &str = "Dispute";
}

fn token_interface() -> Result<InterfaceDescription, RegistryError> {
    InterfaceDescription::builder(ifaces::TOKEN)
        .function(
            "approve",
            SEL_APPROVE,
            &[AbiType::Address, AbiType::Uint],
            &[AbiType::Bool],
        )
        .function(
            "allowance",
            SEL_ALLOWANCE,
            &[AbiType::Address, AbiType::Address],
            &[AbiType::Uint],
        )
        .function("balanceOf", SEL_BALANCE_OF, &[AbiType::Address], &[AbiType::Uint])
        .function(
            "transfer",
            SEL_TRANSFER,
            &[AbiType::Address, AbiType::Uint],
            &[AbiType::Bool],
        )
        .function(
            "transferFrom",
            SEL_TRANSFER_FROM,
            &[AbiType::Address, AbiType::Address, AbiType::Uint],
            &[AbiType::Bool],
        )
        .function("mint", SEL_MINT, &[AbiType::Address, AbiType::Uint], &[])
        .event(
            "Transfer",
            TOPIC_TRANSFER,
            &[AbiType::Address, AbiType::Address],
            &[AbiType::Uint],
        )
        .event(
            "Approval",
            TOPIC_APPROVAL,
            &[AbiType::Address, AbiType::Address],
            &[AbiType::Uint],
        )
        .build()
}

fn market_maker_interface() -> Result<InterfaceDescription, RegistryError> {
    InterfaceDescription::builder(ifaces::MARKET_MAKER)
        .function("createMarket", SEL_CREATE_MARKET, &[AbiType::String], &[])
        .event(
            "MarketCreated",
            TOPIC_MARKET_CREATED,
            &[AbiType::Address, AbiType::Uint],
            &[AbiType::Address, AbiType::String],
        )
        .build()
}

fn market_interface() -> Result<InterfaceDescription, RegistryError> {
    // All three creation functions share the (escrow, metadata pointer,
    // uint terms) shape; the uint carries the kind-specific term.
    InterfaceDescription::builder(ifaces::MARKET)
        .function(
            "createFlatRateContract",
            SEL_CREATE_FLAT_RATE,
            &[AbiType::Address, AbiType::String, AbiType::Uint],
            &[],
        )
        .function(
            "createMilestoneContract",
            SEL_CREATE_MILESTONE,
            &[AbiType::Address, AbiType::String, AbiType::Uint],
            &[],
        )
        .function(
            "createDeadlineContract",
            SEL_CREATE_DEADLINE,
            &[AbiType::Address, AbiType::String, AbiType::Uint],
            &[],
        )
        .event(
            "RelationshipCreated",
            TOPIC_RELATIONSHIP_CREATED,
            &[AbiType::Address, AbiType::Uint],
            &[AbiType::Address],
        )
        .build()
}

fn relationship_interface() -> Result<InterfaceDescription, RegistryError> {
    InterfaceDescription::builder(ifaces::RELATIONSHIP)
        .function("contractStatus", SEL_CONTRACT_STATUS, &[], &[AbiType::Uint])
        .function("worker", SEL_WORKER, &[], &[AbiType::Address])
        .function(
            "getTaskSolutionPointer",
            SEL_TASK_SOLUTION_POINTER,
            &[],
            &[AbiType::String],
        )
        .function(
            "assignWorker",
            SEL_ASSIGN_WORKER,
            &[AbiType::Address, AbiType::Uint, AbiType::String],
            &[],
        )
        .function("submitWork", SEL_SUBMIT_WORK, &[AbiType::String], &[])
        .function("resolve", SEL_RESOLVE, &[], &[])
        .build()
}

fn escrow_interface() -> Result<InterfaceDescription, RegistryError> {
    InterfaceDescription::builder(ifaces::ESCROW)
        .function("fund", SEL_FUND, &[AbiType::Uint], &[])
        .function("heldAmount", SEL_HELD_AMOUNT, &[], &[AbiType::Uint])
        .build()
}

fn dispute_factory_interface() -> Result<InterfaceDescription, RegistryError> {
    InterfaceDescription::builder(ifaces::DISPUTE_FACTORY)
        .function(
            "createDispute",
            SEL_CREATE_DISPUTE,
            &[AbiType::Address, AbiType::String, AbiType::String],
            &[],
        )
        .event(
            "DisputeCreated",
            TOPIC_DISPUTE_CREATED,
            &[AbiType::Address, AbiType::Uint],
            &[AbiType::Address],
        )
        .build()
}

fn dispute_interface() -> Result<InterfaceDescription, RegistryError> {
    InterfaceDescription::builder(ifaces::DISPUTE)
        .function("resolveDispute", SEL_RESOLVE_DISPUTE, &[AbiType::Bool], &[])
        .build()
}

/// A registry pre-loaded with every marketplace interface. Interface
/// validation failures here are construction-time bugs, surfaced before
/// any network traffic.
pub fn default_registry() -> Result<ContractRegistry, RegistryError> {
    let mut registry = ContractRegistry::new();
    registry.register_interface(token_interface()?);
    registry.register_interface(market_maker_interface()?);
    registry.register_interface(market_interface()?);
    registry.register_interface(relationship_interface()?);
    registry.register_interface(escrow_interface()?);
    registry.register_interface(dispute_factory_interface()?);
    registry.register_interface(dispute_interface()?);
    Ok(registry)
}
