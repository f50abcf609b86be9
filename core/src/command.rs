use crate::{math::Vec3, types::EntityId};
use serde::{Deserialize, Serialize};

/// Every order an AI entity understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    None,
    Move,
    Attack,
    Stop,
    Guard,
    Patrol,
}

/// Where a command points. `object_id`, when set, takes precedence:
/// the referenced entity's position at frame start replaces `position`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CommandTarget {
    pub position:  Vec3,
    pub object_id: Option<EntityId>,
}

impl CommandTarget {
    pub fn at(position: Vec3) -> Self {
        Self { position, object_id: None }
    }

    pub fn entity(object_id: EntityId, last_known: Vec3) -> Self {
        Self { position: last_known, object_id: Some(object_id) }
    }
}

/// An issued AI command. Immutable once issued.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AiCommand {
    pub kind:          CommandKind,
    pub target:        Option<CommandTarget>,
    /// Append to the queue instead of replacing it.
    pub queue_command: bool,
}

impl AiCommand {
    pub fn new(kind: CommandKind, target: Option<CommandTarget>, queue_command: bool) -> Self {
        Self { kind, target, queue_command }
    }

    pub fn move_to(position: Vec3) -> Self {
        Self::new(CommandKind::Move, Some(CommandTarget::at(position)), false)
    }

    pub fn attack(object_id: EntityId, last_known: Vec3) -> Self {
        Self::new(CommandKind::Attack, Some(CommandTarget::entity(object_id, last_known)), false)
    }

    pub fn stop() -> Self {
        Self::new(CommandKind::Stop, None, false)
    }

    pub fn guard(position: Vec3) -> Self {
        Self::new(CommandKind::Guard, Some(CommandTarget::at(position)), false)
    }

    pub fn patrol(position: Vec3) -> Self {
        Self::new(CommandKind::Patrol, Some(CommandTarget::at(position)), false)
    }

    /// The same command, flagged to queue behind whatever is in flight.
    pub fn queued(mut self) -> Self {
        self.queue_command = true;
        self
    }
}
