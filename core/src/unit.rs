//! Units: an AI entity and its locomotors bound to one entity id.
//!
//! The built-in command behavior drives the locomotor for the surface the
//! unit stands on. Combat, guarding, and patrolling belong to game logic
//! outside this crate; here those orders finish on their first run.

use crate::{
    ai::{AiBehavior, AiEntity, AiState},
    command::AiCommand,
    event::SimEvent,
    locomotor::{Locomotor, LocomotorSet, LocomotorTemplate, SurfaceMask, WAYPOINT_REACHED_DISTANCE},
    math::Vec3,
    types::{EntityId, LogicFrame},
};
use std::{collections::BTreeMap, rc::Rc};

/// Positions of every unit as they stood when the frame began.
pub type PositionTable = BTreeMap<EntityId, Vec3>;

#[derive(Debug, Clone)]
pub struct Unit {
    id:         EntityId,
    ai:         AiEntity,
    locomotors: LocomotorSet,
    surface:    SurfaceMask,
}

impl Unit {
    /// A unit standing on ground at `position`, AI active.
    pub fn new(id: EntityId, position: Vec3) -> Self {
        let mut ai = AiEntity::new();
        ai.init();
        ai.set_position(position);
        ai.activate();
        Self {
            id,
            ai,
            locomotors: LocomotorSet::new(),
            surface:    SurfaceMask::GROUND,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn ai(&self) -> &AiEntity {
        &self.ai
    }

    pub fn ai_mut(&mut self) -> &mut AiEntity {
        &mut self.ai
    }

    pub fn state(&self) -> AiState {
        self.ai.state()
    }

    pub fn issue_command(&mut self, command: AiCommand) {
        self.ai.issue_command(command);
    }

    pub fn position(&self) -> Vec3 {
        self.ai.position()
    }

    /// Teleport. Every locomotor follows.
    pub fn set_position(&mut self, position: Vec3) {
        self.ai.set_position(position);
        for i in 0..self.locomotors.len() {
            if let Some(loco) = self.locomotors.get_mut(i) {
                loco.set_position(position);
            }
        }
    }

    /// Give the unit another locomotor. Returns false when the set
    /// reported a downhill-only/regular mix (the locomotor is kept).
    pub fn add_locomotor(&mut self, template: Rc<LocomotorTemplate>) -> bool {
        let consistent = self.locomotors.add_locomotor(template);
        self.locomotors.attach_to(self.id);
        let position = self.ai.position();
        let last = self.locomotors.len() - 1;
        if let Some(loco) = self.locomotors.get_mut(last) {
            loco.set_position(position);
        }
        consistent
    }

    pub fn locomotors(&self) -> &LocomotorSet {
        &self.locomotors
    }

    pub fn surface(&self) -> SurfaceMask {
        self.surface
    }

    /// Move onto another surface. The locomotor that takes over picks up
    /// position, heading, and speed from the one that was driving.
    pub fn set_surface(&mut self, surface: SurfaceMask) {
        let from = self.locomotors.find_index(self.surface);
        let to = self.locomotors.find_index(surface);
        self.surface = surface;

        if let (Some(from), Some(to)) = (from, to) {
            if from != to {
                if let Some(previous) = self.locomotors.get(from).cloned() {
                    if let Some(next) = self.locomotors.get_mut(to) {
                        next.copy_kinematics_from(&previous);
                    }
                }
            }
        }
    }

    /// The locomotor for the current surface, if the unit can move here.
    pub fn active_locomotor(&self) -> Option<&Locomotor> {
        self.locomotors.find_locomotor(self.surface)
    }

    /// One logic frame: run the AI, then step the active locomotor by
    /// `dt` seconds.
    pub fn frame_update(
        &mut self,
        frame: LogicFrame,
        dt: f64,
        positions: &PositionTable,
    ) -> Vec<SimEvent> {
        let active = self.locomotors.find_index(self.surface);

        let mut driver = UnitDriver {
            unit:      self.id,
            frame,
            locomotor: active.and_then(|i| self.locomotors.get_mut(i)),
            positions,
            arrived:   None,
        };
        let report = self.ai.frame_update(&mut driver);
        let arrived = driver.arrived;

        let mut events = Vec::new();
        if let Some((from, to)) = report.transition {
            events.push(SimEvent::AiStateChanged { frame, unit: self.id, from, to });
        }
        if let Some(position) = arrived {
            events.push(SimEvent::UnitArrived { frame, unit: self.id, position });
        }
        if let Some(command) = report.completed {
            events.push(SimEvent::CommandCompleted { frame, unit: self.id, kind: command.kind });
        }

        if let Some(loco) = active.and_then(|i| self.locomotors.get_mut(i)) {
            loco.update(dt);
            self.ai.set_position(loco.position());
        }
        events
    }
}

/// Command handlers for one unit during one frame.
struct UnitDriver<'a> {
    unit:      EntityId,
    frame:     LogicFrame,
    locomotor: Option<&'a mut Locomotor>,
    positions: &'a PositionTable,
    arrived:   Option<Vec3>,
}

impl UnitDriver<'_> {
    /// An entity target resolves to where that entity stood at frame
    /// start; a vanished entity falls back to the recorded position.
    fn resolve_target(&self, command: &AiCommand) -> Option<Vec3> {
        let target = command.target?;
        let resolved = target
            .object_id
            .and_then(|id| self.positions.get(&id).copied())
            .unwrap_or(target.position);
        Some(resolved)
    }
}

impl AiBehavior for UnitDriver<'_> {
    fn on_state_enter(&mut self, state: AiState) {
        log::trace!("frame={} unit {}: enter {state:?}", self.frame, self.unit);
    }

    fn execute_move(&mut self, command: &AiCommand) -> bool {
        let Some(target) = self.resolve_target(command) else {
            log::warn!("frame={} unit {}: move without a target dropped", self.frame, self.unit);
            return true;
        };
        let (frame, unit) = (self.frame, self.unit);
        let Some(loco) = self.locomotor.as_deref_mut() else {
            log::warn!("frame={frame} unit {unit}: no locomotor for this surface; move dropped");
            return true;
        };

        if (target - loco.position()).planar().length() <= WAYPOINT_REACHED_DISTANCE {
            // The goal stays set so the locomotor brakes onto the point.
            self.arrived = Some(target);
            log::debug!("frame={frame} unit {unit}: arrived at ({:.2}, {:.2})", target.x, target.y);
            return true;
        }
        if loco.goal_position() != Some(target) {
            loco.set_goal_position(target);
        }
        false
    }

    fn execute_stop(&mut self, _command: &AiCommand) -> bool {
        if let Some(loco) = self.locomotor.as_deref_mut() {
            loco.clear_goals();
        }
        true
    }
}
