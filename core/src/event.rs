//! The per-frame event log.
//!
//! RULE: Every observable state change inside a logic frame is reported
//! as a SimEvent. Hosts drain the log; two engines fed the same seed and
//! the same inputs produce identical logs.

use crate::{
    ai::AiState,
    command::CommandKind,
    math::Vec3,
    types::{EntityId, LogicFrame},
};
use serde::{Deserialize, Serialize};

/// Every event emitted during simulation.
/// Variants are appended, never removed or reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    // ── Engine events ──────────────────────────────
    FrameStarted {
        frame: LogicFrame,
        paused: bool,
    },
    FrameCompleted {
        frame: LogicFrame,
    },
    EngineInitialized {
        seed: u64,
        max_fps: u32,
    },

    // ── Unit events ────────────────────────────────
    UnitSpawned {
        frame: LogicFrame,
        unit: EntityId,
        position: Vec3,
    },
    UnitDespawned {
        frame: LogicFrame,
        unit: EntityId,
    },
    AiStateChanged {
        frame: LogicFrame,
        unit: EntityId,
        from: AiState,
        to: AiState,
    },
    CommandCompleted {
        frame: LogicFrame,
        unit: EntityId,
        kind: CommandKind,
    },
    UnitArrived {
        frame: LogicFrame,
        unit: EntityId,
        position: Vec3,
    },
}

/// One event as recorded by the engine, with its origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub frame:      LogicFrame,
    pub source:     String,
    pub event_type: String,
    pub event:      SimEvent,
}

impl EventLogEntry {
    pub fn new(frame: LogicFrame, source: &str, event: SimEvent) -> Self {
        Self {
            frame,
            source: source.to_string(),
            event_type: event_type_name(&event).to_string(),
            event,
        }
    }
}

/// Stable string name of a SimEvent variant.
pub fn event_type_name(event: &SimEvent) -> &'static str {
    match event {
        SimEvent::FrameStarted { .. }      => "frame_started",
        SimEvent::FrameCompleted { .. }    => "frame_completed",
        SimEvent::EngineInitialized { .. } => "engine_initialized",
        SimEvent::UnitSpawned { .. }       => "unit_spawned",
        SimEvent::UnitDespawned { .. }     => "unit_despawned",
        SimEvent::AiStateChanged { .. }    => "ai_state_changed",
        SimEvent::CommandCompleted { .. }  => "command_completed",
        SimEvent::UnitArrived { .. }       => "unit_arrived",
    }
}
