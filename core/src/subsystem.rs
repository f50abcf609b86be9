//! Subsystem trait and registry.
//!
//! RULE: Every globally-driven engine module implements SimSubsystem.
//! The registry calls update() on each registered subsystem in
//! registration order, once per admitted frame.
//! Cross-subsystem references are resolved in post_process_load(),
//! never in init(), because init() runs before later members exist.

use crate::{
    error::SimResult,
    event::SimEvent,
    rng::{RngBank, SubsystemRng},
    types::LogicFrame,
};
use std::{any::Any, cell::RefCell, rc::Rc};

/// What a subsystem is told about the frame being run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameInfo {
    /// The Logic Frame Counter value for this frame. Does not advance
    /// while paused.
    pub frame:  LogicFrame,
    pub paused: bool,
}

/// The contract every subsystem must fulfill.
pub trait SimSubsystem {
    /// Display name, assigned by `SubsystemList::init_subsystem`.
    fn name(&self) -> &str;

    fn set_name(&mut self, name: &str);

    /// Called once, right after the subsystem joins the registry.
    fn init(&mut self) -> SimResult<()>;

    /// Return to the freshly-initialized state.
    fn reset(&mut self);

    /// Called once per admitted frame, in registration order.
    ///
    /// - `frame`:     the frame number and pause state
    /// - `events_in`: events emitted earlier this frame
    /// - `rng`:       this subsystem's deterministic RNG for this frame
    fn update(
        &mut self,
        frame: FrameInfo,
        events_in: &[SimEvent],
        rng: &mut SubsystemRng,
    ) -> SimResult<Vec<SimEvent>>;

    /// Optional render hook, called after update on admitted frames.
    fn draw(&mut self) {}

    /// Optional hook run after every member exists.
    fn post_process_load(&mut self) -> SimResult<()> {
        Ok(())
    }

    /// For downcasting in tests and tooling only.
    fn as_any(&self) -> &dyn Any;
}

/// A shared handle to a registered subsystem. The registry holds one
/// clone; whoever registered it keeps theirs, so removal never drops it.
pub type SubsystemHandle = Rc<RefCell<dyn SimSubsystem>>;

/// Wrap a concrete subsystem in a handle.
pub fn handle<S: SimSubsystem + 'static>(subsystem: S) -> Rc<RefCell<S>> {
    Rc::new(RefCell::new(subsystem))
}

fn same_subsystem(a: &SubsystemHandle, b: &SubsystemHandle) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

/// Ordered registry. Insertion order = update order.
#[derive(Default)]
pub struct SubsystemList {
    subsystems: Vec<SubsystemHandle>,
}

impl SubsystemList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.subsystems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subsystems.is_empty()
    }

    pub fn contains(&self, sys: &SubsystemHandle) -> bool {
        self.subsystems.iter().any(|s| same_subsystem(s, sys))
    }

    /// Names in update order.
    pub fn names(&self) -> Vec<String> {
        self.subsystems.iter().map(|s| s.borrow().name().to_string()).collect()
    }

    pub fn find(&self, name: &str) -> Option<SubsystemHandle> {
        self.subsystems
            .iter()
            .find(|s| s.borrow().name() == name)
            .cloned()
    }

    /// Name the subsystem, append it, then initialize it.
    /// A subsystem that is already registered is left untouched.
    pub fn init_subsystem(&mut self, sys: SubsystemHandle, name: &str) -> SimResult<()> {
        if self.contains(&sys) {
            log::error!("registry: '{name}' is already registered; init skipped");
            return Ok(());
        }
        sys.borrow_mut().set_name(name);
        self.add_subsystem(sys.clone());
        sys.borrow_mut().init()?;
        log::info!("registry: initialized subsystem '{name}'");
        Ok(())
    }

    /// Append a subsystem. Returns false (and changes nothing) if it is
    /// already a member.
    pub fn add_subsystem(&mut self, sys: SubsystemHandle) -> bool {
        if self.contains(&sys) {
            log::error!(
                "registry: subsystem '{}' added twice; ignoring",
                sys.borrow().name()
            );
            return false;
        }
        let name = sys.borrow().name().to_string();
        if self.find(&name).is_some() {
            log::warn!("registry: two subsystems share the name '{name}'");
        }
        self.subsystems.push(sys);
        true
    }

    /// Remove a subsystem without tearing it down. Removing a
    /// non-member is a no-op that returns false.
    pub fn remove_subsystem(&mut self, sys: &SubsystemHandle) -> bool {
        let before = self.subsystems.len();
        self.subsystems.retain(|s| !same_subsystem(s, sys));
        before != self.subsystems.len()
    }

    pub fn reset_all(&self) {
        for sys in &self.subsystems {
            sys.borrow_mut().reset();
        }
    }

    pub fn post_process_load_all(&self) -> SimResult<()> {
        for sys in &self.subsystems {
            sys.borrow_mut().post_process_load()?;
        }
        Ok(())
    }

    /// Update every member once, in registration order.
    ///
    /// Each subsystem sees `events_in` plus everything emitted by the
    /// members before it. A failing subsystem is reported and skipped;
    /// the rest of the frame still runs.
    pub fn update_all(
        &self,
        frame: FrameInfo,
        rng_bank: &RngBank,
        events_in: &[SimEvent],
    ) -> Vec<(String, SimEvent)> {
        let mut seen: Vec<SimEvent> = events_in.to_vec();
        let mut emitted = Vec::new();

        for sys in &self.subsystems {
            let mut sys = sys.borrow_mut();
            let name = sys.name().to_string();
            let mut rng = rng_bank.for_subsystem(&name, frame.frame);
            match sys.update(frame, &seen, &mut rng) {
                Ok(new_events) => {
                    seen.extend(new_events.iter().cloned());
                    emitted.extend(new_events.into_iter().map(|e| (name.clone(), e)));
                }
                Err(e) => {
                    log::error!("frame={} registry: '{name}' update failed: {e}", frame.frame);
                }
            }
        }
        emitted
    }

    pub fn draw_all(&self) {
        for sys in &self.subsystems {
            sys.borrow_mut().draw();
        }
    }

    /// Drop every membership. Members are not torn down; their owners
    /// still hold them.
    pub fn shutdown_all(&mut self) {
        self.subsystems.clear();
    }
}
