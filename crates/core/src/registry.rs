//! Static lookup from stable node id to a constructor.

use std::collections::BTreeMap;

use crate::error::NodeError;
use crate::node::{Node, NodeMetadata};

pub type NodeFactory = fn() -> Box<dyn Node>;

struct RegistryEntry {
    metadata: NodeMetadata,
    factory: NodeFactory,
}

#[derive(Default)]
pub struct NodeRegistry {
    entries: BTreeMap<&'static str, RegistryEntry>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when an entry with the same id was replaced.
    pub fn register(&mut self, factory: NodeFactory) -> bool {
        let metadata = factory().metadata();
        self.entries
            .insert(metadata.id, RegistryEntry { metadata, factory })
            .is_some()
    }

    pub fn create(&self, id: &str) -> Result<Box<dyn Node>, NodeError> {
        self.entries
            .get(id)
            .map(|entry| (entry.factory)())
            .ok_or_else(|| NodeError::UnknownNode(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }

    pub fn display_name(&self, id: &str) -> Option<&'static str> {
        self.entries.get(id).map(|entry| entry.metadata.display_name)
    }

    pub fn metadata(&self) -> impl Iterator<Item = &NodeMetadata> + '_ {
        self.entries.values().map(|entry| &entry.metadata)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
