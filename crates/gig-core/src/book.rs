//! # Deployed-Address Book
//!
//! Deployment produces exactly one artifact this system persists: the table
//! of deployed contract addresses per logical name. The book is a flat JSON
//! file so that subsequent invocations (and operators) can reference the
//! same deployment without re-reading transaction logs.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::address::Address;

/// Errors from loading or saving the address book.
#[derive(Debug, thiserror::Error)]
pub enum BookError {
    /// Filesystem failure reading or writing the book.
    #[error("address book I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The book file is not valid JSON or fails address validation.
    #[error("address book is malformed: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A logical name has no recorded address.
    #[error("no deployed address recorded for contract {name}")]
    MissingAddress {
        /// The logical contract name that was requested.
        name: String,
    },
}

/// Logical contract name → deployed address, per deployment.
///
/// Entries are sorted (`BTreeMap`) so the serialized book is deterministic
/// and diffs cleanly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressBook {
    entries: BTreeMap<String, Address>,
}

impl AddressBook {
    /// Create an empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a deployed address under a logical name, replacing any
    /// previous entry.
    pub fn insert(&mut self, name: impl Into<String>, address: Address) {
        self.entries.insert(name.into(), address);
    }

    /// Look up a deployed address.
    pub fn get(&self, name: &str) -> Option<&Address> {
        self.entries.get(name)
    }

    /// Look up a deployed address, failing with the missing name.
    pub fn require(&self, name: &str) -> Result<&Address, BookError> {
        self.entries.get(name).ok_or_else(|| BookError::MissingAddress {
            name: name.to_string(),
        })
    }

    /// Number of recorded entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the book has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Address)> {
        self.entries.iter()
    }

    /// Load a book from a JSON file. Malformed addresses are rejected at
    /// load time via the validating deserializer.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, BookError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Save the book as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), BookError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(fill: char) -> Address {
        Address::new(format!("0x{}", fill.to_string().repeat(40))).unwrap()
    }

    #[test]
    fn insert_and_require() {
        let mut book = AddressBook::new();
        book.insert("MarketMaker", addr('1'));
        assert_eq!(book.require("MarketMaker").unwrap(), &addr('1'));
        assert!(book.require("Escrow").is_err());
    }

    #[test]
    fn missing_address_names_the_contract() {
        let book = AddressBook::new();
        let err = book.require("TestDai").unwrap_err();
        assert!(err.to_string().contains("TestDai"));
    }

    #[test]
    fn file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deployments.json");

        let mut book = AddressBook::new();
        book.insert("MarketMaker", addr('a'));
        book.insert("Escrow", addr('b'));
        book.save(&path).unwrap();

        let loaded = AddressBook::load(&path).unwrap();
        assert_eq!(loaded, book);
    }

    #[test]
    fn load_rejects_malformed_address() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deployments.json");
        std::fs::write(&path, r#"{"entries":{"Escrow":"0x123"}}"#).unwrap();
        assert!(matches!(AddressBook::load(&path), Err(BookError::Malformed(_))));
    }

    #[test]
    fn serialization_is_sorted() {
        let mut book = AddressBook::new();
        book.insert("Zeta", addr('2'));
        book.insert("Alpha", addr('3'));
        let json = serde_json::to_string(&book).unwrap();
        assert!(json.find("Alpha").unwrap() < json.find("Zeta").unwrap());
    }
}
