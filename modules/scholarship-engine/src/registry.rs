//! The set of addresses whose events are processed.

use std::collections::HashMap;

use scholarship_world::{Address, SourceKind};

/// Addresses of interest and the contract template each one belongs to.
///
/// Starts with the factory alone and grows only through
/// [`SourceRegistry::register_source`], once per created scholarship.
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    factory: Address,
    sources: HashMap<Address, SourceKind>,
}

impl SourceRegistry {
    pub fn new(factory: Address) -> Self {
        let mut sources = HashMap::new();
        sources.insert(factory, SourceKind::Factory);
        Self { factory, sources }
    }

    pub fn factory(&self) -> Address {
        self.factory
    }

    pub fn kind_of(&self, address: &Address) -> Option<SourceKind> {
        self.sources.get(address).copied()
    }

    /// Start tracking a scholarship contract. Returns `false` (and changes
    /// nothing) if the address is already a source, so events are never
    /// delivered twice.
    pub fn register_source(&mut self, address: Address) -> bool {
        if self.sources.contains_key(&address) {
            return false;
        }
        self.sources.insert(address, SourceKind::Scholarship);
        true
    }

    /// Registered scholarship addresses, sorted.
    pub fn scholarships(&self) -> Vec<Address> {
        let mut addresses: Vec<Address> = self
            .sources
            .iter()
            .filter(|(_, kind)| **kind == SourceKind::Scholarship)
            .map(|(address, _)| *address)
            .collect();
        addresses.sort();
        addresses
    }

    /// Number of sources, factory included.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
