//! World snapshot: plain, serializable state for external persistence.
//!
//! The core never writes snapshots anywhere. `SimEngine::snapshot()`
//! builds one on demand and the host decides what to do with it.

use crate::{
    ai::AiState,
    clock::SimClock,
    command::AiCommand,
    math::Vec3,
    types::{CaveIndex, EntityId, LogicFrame},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSnapshot {
    pub id:            EntityId,
    pub position:      Vec3,
    pub speed:         f64,
    pub state:         AiState,
    pub command_queue: Vec<AiCommand>,
    pub goal:          Option<Vec3>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TunnelSnapshot {
    pub index:     CaveIndex,
    pub capacity:  usize,
    pub contained: Vec<EntityId>,
    pub entrances: BTreeSet<EntityId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub frame:      LogicFrame,
    pub seed:       u64,
    pub clock:      SimClock,
    pub subsystems: Vec<String>,
    pub units:      Vec<UnitSnapshot>,
    pub tunnels:    Vec<TunnelSnapshot>,
}
