//! # gig-registry — Contract Registry
//!
//! Interface descriptions are plain data: function selectors and event
//! signature hashes are precomputed constants carried in the description,
//! so the registry needs no ABI-JSON parser and no keccak at runtime.
//!
//! A malformed description is rejected when the registry is built, never
//! at call time: every selector, topic hash, and parameter list is
//! validated up front, and a [`ContractHandle`] handed out by the registry
//! can therefore encode and decode without re-checking the description.

pub mod abi;
pub mod error;
pub mod handle;
pub mod interface;
pub mod registry;

pub use abi::{AbiType, AbiValue};
pub use error::{CodecError, RegistryError};
pub use handle::{ContractHandle, DecodedEvent};
pub use interface::{EventEntry, FunctionEntry, InterfaceDescription};
pub use registry::ContractRegistry;
