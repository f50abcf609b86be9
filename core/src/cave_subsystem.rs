//! Cave system: the registry of tunnel networks, keyed by cave index.
//!
//! Trackers are created lazily and never removed while the game runs,
//! so the indices of entrances that still share a network stay stable.
//!
//! Execution: every frame, in registration order. Nothing time-driven
//! happens here today; the update reports occupancy at trace level.

use crate::{
    error::SimResult,
    event::SimEvent,
    rng::SubsystemRng,
    subsystem::{FrameInfo, SimSubsystem},
    tunnel::{TunnelTracker, DEFAULT_TUNNEL_CAPACITY},
    types::CaveIndex,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const CAVE_SUBSYSTEM_NAME: &str = "cave_system";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaveSystem {
    name:            String,
    tunnel_capacity: usize,
    trackers:        BTreeMap<CaveIndex, TunnelTracker>,
}

impl CaveSystem {
    pub fn new(tunnel_capacity: usize) -> Self {
        Self {
            name: CAVE_SUBSYSTEM_NAME.to_string(),
            tunnel_capacity,
            trackers: BTreeMap::new(),
        }
    }

    /// Whether an entrance may move from `old_index` to `new_index`.
    /// Refused if either network exists and holds anything. Permission
    /// granted means the caller must unregister and re-register.
    pub fn can_switch_index_to_index(&self, old_index: CaveIndex, new_index: CaveIndex) -> bool {
        let occupied = |index: CaveIndex| {
            self.tracker_for_index(index)
                .is_some_and(|t| t.contain_count() > 0)
        };
        !(occupied(old_index) || occupied(new_index))
    }

    /// Make sure a tracker exists for `index`. Idempotent.
    pub fn register_new_cave(&mut self, index: CaveIndex) {
        let capacity = self.tunnel_capacity;
        self.trackers.entry(index).or_insert_with(|| {
            log::debug!("caves: created tunnel network {index}");
            TunnelTracker::new(capacity)
        });
    }

    /// An entrance stopped using `index`. The tracker is kept so the
    /// other entrances on the network keep their index.
    pub fn unregister_cave(&mut self, index: CaveIndex) {
        if self.tracker_for_index(index).is_none() {
            log::debug!("caves: unregister of unknown network {index}");
        }
    }

    pub fn tracker_for_index(&self, index: CaveIndex) -> Option<&TunnelTracker> {
        self.trackers.get(&index)
    }

    pub fn tracker_for_index_mut(&mut self, index: CaveIndex) -> Option<&mut TunnelTracker> {
        self.trackers.get_mut(&index)
    }

    /// Every existing network with its index, in index order.
    pub fn trackers(&self) -> impl Iterator<Item = (CaveIndex, &TunnelTracker)> {
        self.trackers.iter().map(|(&index, tracker)| (index, tracker))
    }

    pub fn tunnel_capacity(&self) -> usize {
        self.tunnel_capacity
    }

    /// Capacity for networks created from now on.
    pub fn set_tunnel_capacity(&mut self, capacity: usize) {
        self.tunnel_capacity = capacity;
    }
}

impl Default for CaveSystem {
    fn default() -> Self { Self::new(DEFAULT_TUNNEL_CAPACITY) }
}

impl SimSubsystem for CaveSystem {
    fn name(&self) -> &str { &self.name }

    fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    fn init(&mut self) -> SimResult<()> {
        if !self.trackers.is_empty() {
            log::error!("caves: init() on a populated cave system; clearing");
        }
        self.reset();
        Ok(())
    }

    fn reset(&mut self) {
        self.trackers.clear();
    }

    fn update(
        &mut self,
        frame: FrameInfo,
        _events_in: &[SimEvent],
        _rng: &mut SubsystemRng,
    ) -> SimResult<Vec<SimEvent>> {
        if log::log_enabled!(log::Level::Trace) {
            for (index, tracker) in self.trackers() {
                log::trace!(
                    "frame={} caves: network {index} holds {}/{} via {} entrances",
                    frame.frame,
                    tracker.contain_count(),
                    tracker.contain_max(),
                    tracker.entrance_count(),
                );
            }
        }
        Ok(vec![])
    }

    fn as_any(&self) -> &dyn std::any::Any { self }
}
