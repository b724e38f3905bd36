//! # Contract Handles
//!
//! A [`ContractHandle`] binds a validated interface description to one
//! deployed address, and optionally to a signer. Binding a signer is
//! non-mutating: [`ContractHandle::with_signer`] returns a new handle, so
//! a handle shared between actor roles can never silently change whose
//! authority it carries.

use std::sync::Arc;

use gig_chain::{LogEntry, Signer};
use gig_core::Address;
use gig_core::hex::decode_hex;

use crate::abi::{self, AbiValue};
use crate::error::{CodecError, RegistryError};
use crate::interface::InterfaceDescription;

/// A decoded event occurrence from a receipt log.
#[derive(Debug, Clone)]
pub struct DecodedEvent {
    /// The event name.
    pub name: String,
    /// Indexed parameter values, in topic order.
    pub indexed: Vec<AbiValue>,
    /// Non-indexed parameter values, in data order.
    pub data: Vec<AbiValue>,
}

/// An interface bound to a deployed address.
#[derive(Debug, Clone)]
pub struct ContractHandle {
    interface: Arc<InterfaceDescription>,
    address: Address,
    signer: Option<Signer>,
}

impl ContractHandle {
    pub(crate) fn new(interface: Arc<InterfaceDescription>, address: Address) -> Self {
        Self {
            interface,
            address,
            signer: None,
        }
    }

    /// The deployed contract address.
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// The interface this handle speaks.
    pub fn interface(&self) -> &InterfaceDescription {
        &self.interface
    }

    /// The signer bound to this handle, if any.
    pub fn signer(&self) -> Option<&Signer> {
        self.signer.as_ref()
    }

    /// A new handle with `signer` bound; `self` is untouched.
    pub fn with_signer(&self, signer: Signer) -> Self {
        Self {
            interface: Arc::clone(&self.interface),
            address: self.address.clone(),
            signer: Some(signer),
        }
    }

    /// Encode calldata for the named function: selector plus encoded args.
    pub fn encode_call(&self, function: &str, args: &[AbiValue]) -> Result<Vec<u8>, RegistryError> {
        let entry = self.interface.function(function)?;
        let mut data = entry.selector.to_vec();
        data.extend_from_slice(&abi::encode(&entry.inputs, args)?);
        Ok(data)
    }

    /// Decode the return data of the named function.
    pub fn decode_output(
        &self,
        function: &str,
        data: &[u8],
    ) -> Result<Vec<AbiValue>, RegistryError> {
        let entry = self.interface.function(function)?;
        Ok(abi::decode(&entry.outputs, data)?)
    }

    /// Find and decode the first occurrence of the named event in `logs`.
    ///
    /// Returns `Ok(None)` when no log matches; callers must decide whether
    /// absence is an error in their context. Only logs emitted by this
    /// handle's address are considered.
    pub fn find_event(
        &self,
        event: &str,
        logs: &[LogEntry],
    ) -> Result<Option<DecodedEvent>, RegistryError> {
        let entry = self.interface.event(event)?;
        for log in logs {
            if log.address != self.address {
                continue;
            }
            let Some(first) = log.topics.first() else {
                continue;
            };
            if first != &entry.topic0 {
                continue;
            }

            if log.topics.len() != entry.indexed.len() + 1 {
                return Err(CodecError::Truncated {
                    reason: format!(
                        "event {event}: expected {} topics, got {}",
                        entry.indexed.len() + 1,
                        log.topics.len()
                    ),
                }
                .into());
            }
            let mut indexed = Vec::with_capacity(entry.indexed.len());
            for (ty, topic) in entry.indexed.iter().zip(&log.topics[1..]) {
                let word = topic_word(topic)?;
                indexed.push(abi::decode_topic(*ty, &word)?);
            }
            let data = abi::decode(&entry.data, &log.data)?;
            return Ok(Some(DecodedEvent {
                name: entry.name.clone(),
                indexed,
                data,
            }));
        }
        Ok(None)
    }
}

fn topic_word(topic: &str) -> Result<[u8; 32], RegistryError> {
    let bytes = decode_hex(topic)
        .ok()
        .filter(|b| b.len() == 32)
        .ok_or_else(|| CodecError::Truncated {
            reason: format!("topic {topic} is not a 32-byte word"),
        })?;
    let mut word = [0u8; 32];
    word.copy_from_slice(&bytes);
    Ok(word)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::{address_word, uint_word, AbiType};
    use gig_core::hex::encode_hex;

    fn addr(last: &str) -> Address {
        Address::new(format!("0x{last:0>40}")).unwrap()
    }

    fn topic0() -> String {
        format!("0x{}", "ab".repeat(32))
    }

    fn handle() -> ContractHandle {
        let iface = InterfaceDescription::builder("Market")
            .function(
                "createMarket",
                "0xa9b37d50",
                &[AbiType::String],
                &[AbiType::Uint],
            )
            .event(
                "MarketCreated",
                &topic0(),
                &[AbiType::Address, AbiType::Uint],
                &[AbiType::String],
            )
            .build()
            .unwrap();
        ContractHandle::new(Arc::new(iface), addr("77"))
    }

    #[test]
    fn with_signer_is_non_mutating() {
        let base = handle();
        let bound = base.with_signer(Signer::new(addr("1")));
        assert!(base.signer().is_none());
        assert_eq!(bound.signer().unwrap().address(), &addr("1"));
        assert_eq!(bound.address(), base.address());
    }

    #[test]
    fn encode_call_prepends_selector() {
        let h = handle();
        let data = h
            .encode_call("createMarket", &[AbiValue::String("m".to_string())])
            .unwrap();
        assert_eq!(&data[..4], &[0xa9, 0xb3, 0x7d, 0x50]);
        // selector + offset word + length word + padded payload
        assert_eq!(data.len(), 4 + 96);
    }

    #[test]
    fn encode_call_unknown_function() {
        let h = handle();
        assert!(matches!(
            h.encode_call("destroyMarket", &[]),
            Err(RegistryError::UnknownFunction { .. })
        ));
    }

    #[test]
    fn find_event_decodes_topics_and_data() {
        let h = handle();
        let log = LogEntry {
            address: addr("77"),
            topics: vec![
                topic0(),
                encode_hex(&address_word(&addr("9"))),
                encode_hex(&uint_word(1)),
            ],
            data: abi::encode(
                &[AbiType::String],
                &[AbiValue::String("Test Market One".to_string())],
            )
            .unwrap(),
        };
        let event = h.find_event("MarketCreated", &[log]).unwrap().unwrap();
        assert_eq!(event.indexed[0].as_address().unwrap(), &addr("9"));
        assert_eq!(event.indexed[1].as_uint().unwrap(), 1);
        assert_eq!(event.data[0].as_string().unwrap(), "Test Market One");
    }

    #[test]
    fn find_event_ignores_foreign_addresses() {
        let h = handle();
        let log = LogEntry {
            address: addr("99"),
            topics: vec![topic0(), encode_hex(&address_word(&addr("9"))), encode_hex(&uint_word(1))],
            data: Vec::new(),
        };
        assert!(h.find_event("MarketCreated", &[log]).unwrap().is_none());
    }

    #[test]
    fn find_event_absent_is_none() {
        let h = handle();
        assert!(h.find_event("MarketCreated", &[]).unwrap().is_none());
    }

    #[test]
    fn find_event_topic_arity_mismatch_is_error() {
        let h = handle();
        let log = LogEntry {
            address: addr("77"),
            topics: vec![topic0()],
            data: Vec::new(),
        };
        assert!(h.find_event("MarketCreated", &[log]).is_err());
    }
}
