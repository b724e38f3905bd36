//! # Contract Registry
//!
//! Maps human-readable names to validated interface descriptions and
//! recorded deployments. Interfaces are registered once at startup;
//! deployments accumulate as the workflow deploys or discovers contracts.

use std::collections::HashMap;
use std::sync::Arc;

use gig_core::Address;

use crate::error::RegistryError;
use crate::handle::ContractHandle;
use crate::interface::InterfaceDescription;

/// Named interfaces plus recorded deployments.
#[derive(Debug, Default)]
pub struct ContractRegistry {
    interfaces: HashMap<String, Arc<InterfaceDescription>>,
    deployments: HashMap<String, (String, Address)>,
}

impl ContractRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a validated interface under its own name.
    pub fn register_interface(&mut self, interface: InterfaceDescription) {
        tracing::debug!(interface = interface.name(), "interface registered");
        self.interfaces
            .insert(interface.name().to_string(), Arc::new(interface));
    }

    /// Record a deployment: `name` resolves to `address` speaking
    /// `interface`. Fails if the interface is not registered.
    pub fn record_deployment(
        &mut self,
        name: impl Into<String>,
        interface: &str,
        address: Address,
    ) -> Result<(), RegistryError> {
        if !self.interfaces.contains_key(interface) {
            return Err(RegistryError::UnknownContract {
                name: interface.to_string(),
            });
        }
        let name = name.into();
        tracing::info!(%name, interface, %address, "deployment recorded");
        self.deployments
            .insert(name, (interface.to_string(), address));
        Ok(())
    }

    /// The recorded address for a named deployment.
    pub fn deployment(&self, name: &str) -> Result<&Address, RegistryError> {
        self.deployments
            .get(name)
            .map(|(_, addr)| addr)
            .ok_or_else(|| RegistryError::UnknownContract {
                name: name.to_string(),
            })
    }

    /// A handle for a recorded deployment.
    pub fn handle(&self, name: &str) -> Result<ContractHandle, RegistryError> {
        let (interface, address) =
            self.deployments
                .get(name)
                .ok_or_else(|| RegistryError::UnknownContract {
                    name: name.to_string(),
                })?;
        let description =
            self.interfaces
                .get(interface)
                .ok_or_else(|| RegistryError::UnknownContract {
                    name: interface.clone(),
                })?;
        Ok(ContractHandle::new(Arc::clone(description), address.clone()))
    }

    /// A handle for an ad-hoc address speaking a registered interface.
    /// Used for contracts discovered from events rather than deployed here.
    pub fn handle_at(&self, interface: &str, address: Address) -> Result<ContractHandle, RegistryError> {
        let description =
            self.interfaces
                .get(interface)
                .ok_or_else(|| RegistryError::UnknownContract {
                    name: interface.to_string(),
                })?;
        Ok(ContractHandle::new(Arc::clone(description), address))
    }
}
