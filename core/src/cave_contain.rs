//! Cave entrance containment.
//!
//! An entrance keeps no contents of its own. Every containment call is
//! forwarded to the tunnel network its cave index maps to, so all
//! entrances on one index see the same pool.

use crate::{
    cave_subsystem::CaveSystem,
    types::{CaveIndex, EntityId},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaveEntrance {
    object_id:            EntityId,
    cave_index:           CaveIndex,
    needs_build_complete: bool,
}

impl CaveEntrance {
    /// An entrance for `object_id`, not yet connected to any network.
    pub fn new(object_id: EntityId, cave_index: CaveIndex) -> Self {
        Self { object_id, cave_index, needs_build_complete: true }
    }

    pub fn object_id(&self) -> EntityId {
        self.object_id
    }

    pub fn cave_index(&self) -> CaveIndex {
        self.cave_index
    }

    pub fn should_do_on_build_complete(&self) -> bool {
        self.needs_build_complete
    }

    /// Construction finished: join the network. Runs once.
    pub fn on_build_complete(&mut self, caves: &mut CaveSystem) {
        if !self.needs_build_complete {
            return;
        }
        self.needs_build_complete = false;

        caves.register_new_cave(self.cave_index);
        if let Some(tracker) = caves.tracker_for_index_mut(self.cave_index) {
            tracker.on_tunnel_created(self.object_id);
        }
        log::info!("caves: entrance {} joined network {}", self.object_id, self.cave_index);
    }

    /// The entrance was destroyed. Ignored while still under
    /// construction, since it never joined.
    pub fn on_die(&mut self, caves: &mut CaveSystem, under_construction: bool) {
        if under_construction {
            return;
        }
        caves.unregister_cave(self.cave_index);
        if let Some(tracker) = caves.tracker_for_index_mut(self.cave_index) {
            tracker.on_tunnel_destroyed(self.object_id);
        }
        log::info!("caves: entrance {} left network {}", self.object_id, self.cave_index);
    }

    pub fn is_valid_container_for(
        &self,
        caves: &CaveSystem,
        item: EntityId,
        check_capacity: bool,
    ) -> bool {
        caves
            .tracker_for_index(self.cave_index)
            .is_some_and(|t| t.is_valid_container_for(item, check_capacity))
    }

    /// Returns false when there is no network yet or it is full.
    pub fn add_to_contain(&self, caves: &mut CaveSystem, item: EntityId) -> bool {
        caves
            .tracker_for_index_mut(self.cave_index)
            .is_some_and(|t| t.add_to_contain_list(item))
    }

    pub fn remove_from_contain(&self, caves: &mut CaveSystem, item: EntityId) -> bool {
        caves
            .tracker_for_index_mut(self.cave_index)
            .is_some_and(|t| t.remove_from_contain_list(item))
    }

    pub fn contain_count(&self, caves: &CaveSystem) -> usize {
        caves.tracker_for_index(self.cave_index).map_or(0, |t| t.contain_count())
    }

    pub fn contain_max(&self, caves: &CaveSystem) -> usize {
        caves.tracker_for_index(self.cave_index).map_or(0, |t| t.contain_max())
    }

    pub fn contained_items<'a>(&self, caves: &'a CaveSystem) -> &'a [EntityId] {
        caves
            .tracker_for_index(self.cave_index)
            .map(|t| t.contained_items())
            .unwrap_or(&[])
    }

    /// Move this entrance to another network if both networks are empty.
    /// Sibling entrances keep their index. Returns whether it moved.
    pub fn try_to_set_cave_index(&mut self, caves: &mut CaveSystem, new_index: CaveIndex) -> bool {
        if !caves.can_switch_index_to_index(self.cave_index, new_index) {
            log::debug!(
                "caves: entrance {} may not switch {} -> {}; a network is occupied",
                self.object_id, self.cave_index, new_index
            );
            return false;
        }

        let old_index = self.cave_index;
        if let Some(old) = caves.tracker_for_index_mut(old_index) {
            old.on_tunnel_destroyed(self.object_id);
            caves.unregister_cave(old_index);
        }

        self.cave_index = new_index;
        caves.register_new_cave(new_index);
        if let Some(new) = caves.tracker_for_index_mut(new_index) {
            new.on_tunnel_created(self.object_id);
        }

        log::info!(
            "caves: entrance {} switched network {old_index} -> {new_index}",
            self.object_id
        );
        true
    }
}
