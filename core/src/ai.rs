//! Per-entity AI command machine.
//!
//! The core owns only the Idle ⇄ Busy toggle and hook ordering. Every
//! other state is entered through `set_state` by behavior logic that
//! lives outside this crate.
//!
//! The command queue is FIFO. The current command is never stored apart
//! from the queue: it is the queue head once adopted, so it can never
//! drift from the head.

use crate::{
    command::{AiCommand, CommandKind},
    math::Vec3,
};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiState {
    /// Waiting for commands.
    #[default]
    Idle,
    /// Working through the command queue.
    Busy,
    Combat,
    Moving,
    Guarding,
    Patrolling,
    Fleeing,
    Dead,
}

/// Per-type command handlers and state hooks. Every handler reports
/// whether its command finished; the defaults finish immediately.
pub trait AiBehavior {
    fn on_state_enter(&mut self, _state: AiState) {}
    fn on_state_exit(&mut self, _state: AiState) {}

    fn execute_move(&mut self, _command: &AiCommand) -> bool { true }
    fn execute_attack(&mut self, _command: &AiCommand) -> bool { true }
    fn execute_stop(&mut self, _command: &AiCommand) -> bool { true }
    fn execute_guard(&mut self, _command: &AiCommand) -> bool { true }
    fn execute_patrol(&mut self, _command: &AiCommand) -> bool { true }
}

/// Behavior with every default: all commands complete on first run.
pub struct InstantBehavior;

impl AiBehavior for InstantBehavior {}

/// What happened during one `frame_update`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AiFrameReport {
    pub transition: Option<(AiState, AiState)>,
    pub completed:  Option<AiCommand>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AiEntity {
    state:    AiState,
    queue:    VecDeque<AiCommand>,
    /// The head of `queue` has been adopted as the current command.
    adopted:  bool,
    position: Vec3,
    active:   bool,
}

impl AiEntity {
    /// A fresh, inactive entity.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn init(&mut self) {
        self.reset();
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn state(&self) -> AiState {
        self.state
    }

    /// Change state, running `on_state_exit(old)` then
    /// `on_state_enter(new)`. Returns false when already in `new_state`,
    /// in which case no hook runs.
    pub fn set_state<B: AiBehavior + ?Sized>(
        &mut self,
        new_state: AiState,
        behavior: &mut B,
    ) -> bool {
        if self.state == new_state {
            return false;
        }
        let old = self.state;
        behavior.on_state_exit(old);
        self.state = new_state;
        behavior.on_state_enter(new_state);
        true
    }

    /// Accept a command. Always accepted, even while inactive.
    ///
    /// Queued commands append; if nothing was in flight the new command
    /// becomes current. Unqueued commands replace the whole queue and
    /// become current at once.
    pub fn issue_command(&mut self, command: AiCommand) {
        if command.queue_command {
            let was_empty = self.queue.is_empty();
            self.queue.push_back(command);
            if was_empty {
                self.adopted = true;
            }
        } else {
            self.queue.clear();
            self.queue.push_back(command);
            self.adopted = true;
        }
    }

    pub fn clear_commands(&mut self) {
        self.queue.clear();
        self.adopted = false;
    }

    /// The command being executed: the queue head once adopted.
    pub fn current_command(&self) -> Option<&AiCommand> {
        if self.adopted { self.queue.front() } else { None }
    }

    pub fn command_queue(&self) -> &VecDeque<AiCommand> {
        &self.queue
    }

    /// Direct queue access for scripted collaborators. The head is
    /// re-adopted on the next frame update.
    pub fn command_queue_mut(&mut self) -> &mut VecDeque<AiCommand> {
        self.adopted = false;
        &mut self.queue
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn activate(&mut self)   { self.active = true;  }
    pub fn deactivate(&mut self) { self.active = false; }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// One logic frame: Idle/Busy check, then run the current command.
    /// Inactive entities do nothing and keep their queue.
    pub fn frame_update<B: AiBehavior + ?Sized>(&mut self, behavior: &mut B) -> AiFrameReport {
        let mut report = AiFrameReport::default();
        if !self.active {
            return report;
        }

        let before = self.state;
        self.update_state(behavior);
        if self.state != before {
            report.transition = Some((before, self.state));
        }

        report.completed = self.execute_current_command(behavior);
        report
    }

    fn update_state<B: AiBehavior + ?Sized>(&mut self, behavior: &mut B) {
        match self.state {
            AiState::Idle if !self.queue.is_empty() => {
                self.set_state(AiState::Busy, behavior);
            }
            AiState::Busy if self.queue.is_empty() => {
                self.set_state(AiState::Idle, behavior);
            }
            _ => {}
        }
    }

    fn execute_current_command<B: AiBehavior + ?Sized>(
        &mut self,
        behavior: &mut B,
    ) -> Option<AiCommand> {
        if self.queue.is_empty() {
            self.adopted = false;
            return None;
        }
        // Head left un-adopted by external queue edits.
        self.adopted = true;

        let command = *self.queue.front()?;
        let done = match command.kind {
            CommandKind::None   => true,
            CommandKind::Move   => behavior.execute_move(&command),
            CommandKind::Attack => behavior.execute_attack(&command),
            CommandKind::Stop   => behavior.execute_stop(&command),
            CommandKind::Guard  => behavior.execute_guard(&command),
            CommandKind::Patrol => behavior.execute_patrol(&command),
        };

        if !done {
            return None;
        }
        self.queue.pop_front();
        self.adopted = !self.queue.is_empty();
        Some(command)
    }
}
