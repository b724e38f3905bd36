//! # Interface Descriptions
//!
//! An [`InterfaceDescription`] carries, as plain data, everything needed
//! to talk to one contract family: function names with their precomputed
//! 4-byte selectors and parameter lists, and event names with their
//! precomputed signature hashes and split indexed/data parameter lists.
//!
//! Descriptions are validated by [`InterfaceDescription::build`]; a
//! description that survives construction never fails structurally later.

use std::collections::HashMap;

use gig_core::hex::decode_hex;

use crate::abi::AbiType;
use crate::error::RegistryError;

/// One callable function on an interface.
#[derive(Debug, Clone)]
pub struct FunctionEntry {
    /// Solidity-level function name.
    pub name: String,
    /// Precomputed 4-byte selector.
    pub selector: [u8; 4],
    /// Parameter types, in declaration order.
    pub inputs: Vec<AbiType>,
    /// Return types, in declaration order.
    pub outputs: Vec<AbiType>,
}

/// One event on an interface. Indexed parameters arrive in topics (after
/// the signature hash), non-indexed parameters in the data payload.
#[derive(Debug, Clone)]
pub struct EventEntry {
    /// Solidity-level event name.
    pub name: String,
    /// Precomputed signature hash, `0x` + 64 hex chars, lowercase.
    pub topic0: String,
    /// Indexed parameter types, in topic order.
    pub indexed: Vec<AbiType>,
    /// Non-indexed parameter types, in data order.
    pub data: Vec<AbiType>,
}

/// A validated contract interface.
#[derive(Debug)]
pub struct InterfaceDescription {
    name: String,
    functions: HashMap<String, FunctionEntry>,
    events: HashMap<String, EventEntry>,
}

impl InterfaceDescription {
    /// Start building a description for the named interface.
    pub fn builder(name: impl Into<String>) -> InterfaceBuilder {
        InterfaceBuilder {
            name: name.into(),
            functions: Vec::new(),
            events: Vec::new(),
        }
    }

    /// The interface name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a function by name.
    pub fn function(&self, name: &str) -> Result<&FunctionEntry, RegistryError> {
        self.functions
            .get(name)
            .ok_or_else(|| RegistryError::UnknownFunction {
                interface: self.name.clone(),
                function: name.to_string(),
            })
    }

    /// Look up an event by name.
    pub fn event(&self, name: &str) -> Result<&EventEntry, RegistryError> {
        self.events
            .get(name)
            .ok_or_else(|| RegistryError::UnknownEvent {
                interface: self.name.clone(),
                event: name.to_string(),
            })
    }

    /// Find the event matching a signature hash, if any.
    pub fn event_by_topic0(&self, topic0: &str) -> Option<&EventEntry> {
        self.events.values().find(|e| e.topic0 == topic0)
    }
}

/// Builder that accumulates entries and validates them in [`build`].
///
/// [`build`]: InterfaceBuilder::build
pub struct InterfaceBuilder {
    name: String,
    functions: Vec<(String, String, Vec<AbiType>, Vec<AbiType>)>,
    events: Vec<(String, String, Vec<AbiType>, Vec<AbiType>)>,
}

impl InterfaceBuilder {
    /// Declare a function with its precomputed selector (`0x` + 8 hex).
    pub fn function(
        mut self,
        name: &str,
        selector: &str,
        inputs: &[AbiType],
        outputs: &[AbiType],
    ) -> Self {
        self.functions.push((
            name.to_string(),
            selector.to_string(),
            inputs.to_vec(),
            outputs.to_vec(),
        ));
        self
    }

    /// Declare an event with its precomputed signature hash (`0x` + 64 hex).
    pub fn event(
        mut self,
        name: &str,
        topic0: &str,
        indexed: &[AbiType],
        data: &[AbiType],
    ) -> Self {
        self.events.push((
            name.to_string(),
            topic0.to_string(),
            indexed.to_vec(),
            data.to_vec(),
        ));
        self
    }

    /// Validate and finalize the description.
    pub fn build(self) -> Result<InterfaceDescription, RegistryError> {
        let malformed = |reason: String| RegistryError::MalformedInterface {
            interface: self.name.clone(),
            reason,
        };

        let mut functions = HashMap::new();
        for (name, selector_hex, inputs, outputs) in &self.functions {
            let bytes = decode_hex(selector_hex)
                .ok()
                .filter(|b| b.len() == 4)
                .ok_or_else(|| {
                    malformed(format!("function {name}: selector {selector_hex} is not 4 bytes"))
                })?;
            let mut selector = [0u8; 4];
            selector.copy_from_slice(&bytes);
            let entry = FunctionEntry {
                name: name.clone(),
                selector,
                inputs: inputs.clone(),
                outputs: outputs.clone(),
            };
            if functions.insert(name.clone(), entry).is_some() {
                return Err(malformed(format!("duplicate function {name}")));
            }
        }

        let mut events = HashMap::new();
        for (name, topic0, indexed, data) in &self.events {
            if decode_hex(topic0).ok().filter(|b| b.len() == 32).is_none() {
                return Err(malformed(format!(
                    "event {name}: topic hash {topic0} is not 32 bytes"
                )));
            }
            if indexed.iter().any(|t| t.is_dynamic()) {
                return Err(malformed(format!(
                    "event {name}: dynamic types cannot be indexed"
                )));
            }
            let entry = EventEntry {
                name: name.clone(),
                topic0: topic0.to_ascii_lowercase(),
                indexed: indexed.clone(),
                data: data.clone(),
            };
            if events.insert(name.clone(), entry).is_some() {
                return Err(malformed(format!("duplicate event {name}")));
            }
        }

        Ok(InterfaceDescription {
            name: self.name,
            functions,
            events,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic(fill: &str) -> String {
        format!("0x{}", fill.repeat(32))
    }

    #[test]
    fn build_and_look_up() {
        let iface = InterfaceDescription::builder("Token")
            .function(
                "approve",
                "0x095ea7b3",
                &[AbiType::Address, AbiType::Uint],
                &[AbiType::Bool],
            )
            .event(
                "Approval",
                &topic("ab"),
                &[AbiType::Address, AbiType::Address],
                &[AbiType::Uint],
            )
            .build()
            .unwrap();

        let f = iface.function("approve").unwrap();
        assert_eq!(f.selector, [0x09, 0x5e, 0xa7, 0xb3]);
        assert_eq!(f.inputs.len(), 2);
        assert!(iface.function("transfer").is_err());
        assert!(iface.event("Approval").is_ok());
        assert!(iface.event_by_topic0(&topic("ab")).is_some());
        assert!(iface.event_by_topic0(&topic("cd")).is_none());
    }

    #[test]
    fn reject_short_selector() {
        let err = InterfaceDescription::builder("Token")
            .function("approve", "0x095e", &[], &[])
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistryError::MalformedInterface { .. }));
    }

    #[test]
    fn reject_short_topic_hash() {
        let err = InterfaceDescription::builder("Token")
            .event("Approval", "0xabcd", &[], &[])
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistryError::MalformedInterface { .. }));
    }

    #[test]
    fn reject_duplicate_function() {
        let err = InterfaceDescription::builder("Token")
            .function("approve", "0x095ea7b3", &[], &[])
            .function("approve", "0x095ea7b3", &[], &[])
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistryError::MalformedInterface { .. }));
    }

    #[test]
    fn reject_indexed_string() {
        let err = InterfaceDescription::builder("Market")
            .event("Named", &topic("ab"), &[AbiType::String], &[])
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistryError::MalformedInterface { .. }));
    }
}
