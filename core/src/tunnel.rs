//! One tunnel network: a containment pool shared by every entrance
//! registered under the same cave index.

use crate::types::EntityId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const DEFAULT_TUNNEL_CAPACITY: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TunnelTracker {
    contained:    Vec<EntityId>,
    max_capacity: usize,
    entrances:    BTreeSet<EntityId>,
}

impl TunnelTracker {
    pub fn new(max_capacity: usize) -> Self {
        Self {
            contained: Vec::new(),
            max_capacity,
            entrances: BTreeSet::new(),
        }
    }

    /// Whether `item` may enter. With `check_capacity`, a full network
    /// refuses. Being full is a normal outcome, not an error.
    pub fn is_valid_container_for(&self, _item: EntityId, check_capacity: bool) -> bool {
        !(check_capacity && self.is_full())
    }

    /// Admit `item`. Returns false when full or already inside.
    pub fn add_to_contain_list(&mut self, item: EntityId) -> bool {
        if !self.is_valid_container_for(item, true) {
            log::debug!("tunnel: {item} refused, network full ({})", self.max_capacity);
            return false;
        }
        if self.contains(item) {
            log::warn!("tunnel: {item} is already inside");
            return false;
        }
        self.contained.push(item);
        true
    }

    /// Returns false if `item` was not inside.
    pub fn remove_from_contain_list(&mut self, item: EntityId) -> bool {
        match self.contained.iter().position(|&id| id == item) {
            Some(i) => {
                self.contained.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, item: EntityId) -> bool {
        self.contained.contains(&item)
    }

    /// Items in the order they entered.
    pub fn contained_items(&self) -> &[EntityId] {
        &self.contained
    }

    pub fn contain_count(&self) -> usize {
        self.contained.len()
    }

    pub fn contain_max(&self) -> usize {
        self.max_capacity
    }

    pub fn is_full(&self) -> bool {
        self.contained.len() >= self.max_capacity
    }

    pub fn is_empty(&self) -> bool {
        self.contained.is_empty()
    }

    /// A new entrance joined this network.
    pub fn on_tunnel_created(&mut self, entrance: EntityId) {
        self.entrances.insert(entrance);
    }

    /// An entrance left this network.
    pub fn on_tunnel_destroyed(&mut self, entrance: EntityId) {
        self.entrances.remove(&entrance);
    }

    pub fn entrances(&self) -> &BTreeSet<EntityId> {
        &self.entrances
    }

    pub fn entrance_count(&self) -> usize {
        self.entrances.len()
    }

    /// Empty out items and entrances.
    pub fn clear(&mut self) {
        self.contained.clear();
        self.entrances.clear();
    }
}

impl Default for TunnelTracker {
    fn default() -> Self { Self::new(DEFAULT_TUNNEL_CAPACITY) }
}
