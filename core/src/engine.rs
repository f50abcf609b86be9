//! The simulation engine: the frame driver that ties the kernel together.
//!
//! FRAME ORDER (fixed, never reordered):
//!   1. Clock admission (nothing runs on a frame that is not due)
//!   2. Registry subsystems, in registration order
//!        cave_system, locomotor_store, then anything the host added
//!   3. Units, in id order: AI command machine, then locomotion
//!      (skipped while paused)
//!   4. Subsystem draw hooks, then the presenter
//!   5. Clock bookkeeping: the Logic Frame Counter advances unless paused
//!
//! RULES:
//!   - All randomness flows through the RngBank.
//!   - Every observable change inside a frame lands in the event log.
//!   - Units read other units' positions as they stood at frame start.
//!   - Locomotion integrates a fixed logic step, whatever the frame-rate
//!     ceiling, so runs are reproducible.

use crate::{
    cave_subsystem::{CaveSystem, CAVE_SUBSYSTEM_NAME},
    clock::{Admission, SimClock},
    command::AiCommand,
    config::EngineConfig,
    error::{SimError, SimResult},
    event::{EventLogEntry, SimEvent},
    math::Vec3,
    rng::{RngBank, SubsystemRng},
    snapshot::{TunnelSnapshot, UnitSnapshot, WorldSnapshot},
    subsystem::{FrameInfo, SubsystemHandle, SubsystemList},
    template_store::{LocomotorStore, TEMPLATE_STORE_NAME},
    timing::SECONDS_PER_LOGIC_FRAME,
    types::{EntityId, LogicFrame},
    unit::{PositionTable, Unit},
};
use std::{
    cell::{Ref, RefCell, RefMut},
    collections::BTreeMap,
    rc::Rc,
    time::{Duration, Instant},
};

/// Source name for events the engine itself emits.
pub const ENGINE_SOURCE: &str = "engine";
/// Source name for events emitted by units.
pub const UNITS_SOURCE: &str = "units";

/// Rendering collaborator. Drawing itself is out of scope here; the
/// engine only says when.
pub trait FramePresenter {
    /// Called once per admitted frame, paused or not.
    fn present(&mut self, frame: LogicFrame);

    /// Called once when the engine tears down after a quit.
    fn release(&mut self) {}
}

/// Presenter that draws nothing.
pub struct NullPresenter;

impl FramePresenter for NullPresenter {
    fn present(&mut self, _frame: LogicFrame) {}
}

/// What `run_loop` needs from its host: a time source, a way to wait,
/// and a chance to act between frames.
pub trait FrameHost {
    /// Time since the host's epoch.
    fn now(&mut self) -> Duration;

    fn sleep(&mut self, duration: Duration);

    /// Called after every admitted frame. Returning false leaves the
    /// loop without quitting the engine.
    fn after_frame(&mut self, _engine: &mut SimEngine) -> bool {
        true
    }
}

/// Host driven by the OS clock. Requests a quit after `frame_budget`
/// admitted frames, if one is set.
pub struct WallClockHost {
    epoch:        Instant,
    frame_budget: Option<u64>,
    admitted:     u64,
}

impl WallClockHost {
    pub fn new(frame_budget: Option<u64>) -> Self {
        Self { epoch: Instant::now(), frame_budget, admitted: 0 }
    }
}

impl FrameHost for WallClockHost {
    fn now(&mut self) -> Duration {
        self.epoch.elapsed()
    }

    fn sleep(&mut self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }

    fn after_frame(&mut self, engine: &mut SimEngine) -> bool {
        self.admitted += 1;
        if self.frame_budget.is_some_and(|budget| self.admitted >= budget) {
            engine.request_quit();
        }
        true
    }
}

pub struct SimEngine {
    pub clock:    SimClock,
    config:       EngineConfig,
    rng_bank:     RngBank,
    subsystems:   SubsystemList,
    caves:        Rc<RefCell<CaveSystem>>,
    templates:    Rc<RefCell<LocomotorStore>>,
    units:        BTreeMap<EntityId, Unit>,
    next_unit_id: EntityId,
    event_log:    Vec<EventLogEntry>,
    presenter:    Box<dyn FramePresenter>,
    released:     bool,
}

impl SimEngine {
    /// Build a fully wired engine: the cave system and the template
    /// store are registered and initialized, then every member gets its
    /// post-load pass.
    pub fn initialize(config: EngineConfig) -> SimResult<Self> {
        let mut config = config;
        config.validate();

        let mut engine = Self {
            clock:        SimClock::new(config.max_frames_per_second),
            rng_bank:     RngBank::new(config.seed),
            subsystems:   SubsystemList::new(),
            caves:        Rc::new(RefCell::new(CaveSystem::new(config.tunnel_capacity))),
            templates:    Rc::new(RefCell::new(LocomotorStore::new())),
            units:        BTreeMap::new(),
            next_unit_id: 1,
            event_log:    Vec::new(),
            presenter:    Box::new(NullPresenter),
            released:     false,
            config,
        };

        let caves: SubsystemHandle = engine.caves.clone();
        engine.subsystems.init_subsystem(caves, CAVE_SUBSYSTEM_NAME)?;
        let templates: SubsystemHandle = engine.templates.clone();
        engine.subsystems.init_subsystem(templates, TEMPLATE_STORE_NAME)?;
        engine.subsystems.post_process_load_all()?;

        engine.record(ENGINE_SOURCE, SimEvent::EngineInitialized {
            seed:    engine.config.seed,
            max_fps: engine.config.max_frames_per_second,
        });
        log::info!(
            "engine: initialized seed={} fps={} subsystems={:?}",
            engine.config.seed,
            engine.config.max_frames_per_second,
            engine.subsystems.names(),
        );
        Ok(engine)
    }

    pub fn set_presenter(&mut self, presenter: Box<dyn FramePresenter>) {
        self.presenter = presenter;
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.config.seed
    }

    /// A named RNG stream for host-side scenario setup. Stream names
    /// never collide with registered subsystems unless the host reuses one.
    pub fn scenario_rng(&self, name: &str) -> SubsystemRng {
        self.rng_bank.for_subsystem(name, self.clock.current_frame())
    }

    // ── Registry ───────────────────────────────────────────────

    /// Register and initialize a host subsystem after the built-in ones.
    pub fn register_subsystem(&mut self, subsystem: SubsystemHandle, name: &str) -> SimResult<()> {
        if self.released {
            return Err(SimError::Quitting);
        }
        if self.subsystems.contains(&subsystem) {
            log::error!("engine: '{name}' is already registered");
            return Ok(());
        }
        self.subsystems.init_subsystem(subsystem.clone(), name)?;
        subsystem.borrow_mut().post_process_load()
    }

    pub fn remove_subsystem(&mut self, subsystem: &SubsystemHandle) -> bool {
        self.subsystems.remove_subsystem(subsystem)
    }

    pub fn subsystem(&self, name: &str) -> SimResult<SubsystemHandle> {
        self.subsystems
            .find(name)
            .ok_or_else(|| SimError::SubsystemNotFound { name: name.to_string() })
    }

    pub fn subsystems(&self) -> &SubsystemList {
        &self.subsystems
    }

    pub fn caves(&self) -> Ref<'_, CaveSystem> {
        self.caves.borrow()
    }

    pub fn caves_mut(&self) -> RefMut<'_, CaveSystem> {
        self.caves.borrow_mut()
    }

    pub fn templates(&self) -> Ref<'_, LocomotorStore> {
        self.templates.borrow()
    }

    pub fn templates_mut(&self) -> RefMut<'_, LocomotorStore> {
        self.templates.borrow_mut()
    }

    /// Return every subsystem to its initialized state, rewind the Logic
    /// Frame Counter, and clear units and the event log.
    pub fn reset_all(&mut self) {
        self.subsystems.reset_all();
        self.clock.reset();
        self.units.clear();
        self.next_unit_id = 1;
        self.event_log.clear();
        log::info!("engine: reset");
    }

    // ── Clock control ──────────────────────────────────────────

    /// Begin admitting frames, the first one interval after `now`.
    pub fn start(&mut self, now: Duration) -> bool {
        self.clock.start(now)
    }

    pub fn request_quit(&mut self) {
        self.clock.request_quit();
    }

    pub fn pause(&mut self) {
        self.clock.pause();
        log::info!("engine: paused at frame {}", self.clock.current_frame());
    }

    pub fn resume(&mut self) {
        self.clock.resume();
        log::info!("engine: resumed at frame {}", self.clock.current_frame());
    }

    pub fn set_frame_rate_limit(&mut self, fps: u32, now: Duration) -> bool {
        self.clock.set_frame_rate_limit(fps, now)
    }

    pub fn frame_rate_limit(&self) -> u32 {
        self.clock.frame_rate_limit()
    }

    pub fn current_frame(&self) -> LogicFrame {
        self.clock.current_frame()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    // ── Frame driving ──────────────────────────────────────────

    /// Run one frame if the clock admits one at `now`. Returns whether a
    /// frame ran. A pending quit is handled here: teardown happens once
    /// and no frame runs.
    pub fn run_one_frame(&mut self, now: Duration) -> bool {
        match self.clock.poll(now) {
            Admission::NotDue | Admission::Halted => false,
            Admission::Quit => {
                self.teardown();
                false
            }
            Admission::Due => {
                self.step();
                self.clock.complete_frame(now);
                true
            }
        }
    }

    /// Headless fast-forward: run up to `n` frames back to back, each
    /// stamped at the moment it falls due. Starts the clock if needed.
    /// Returns how many frames ran.
    pub fn run_frames(&mut self, n: u64) -> u64 {
        if !self.clock.is_running() && !self.clock.is_quitting() {
            self.clock.start(self.clock.last_frame_timestamp());
        }
        let mut ran = 0;
        for _ in 0..n {
            let due = self.clock.next_due_timestamp();
            if !self.run_one_frame(due) {
                break;
            }
            ran += 1;
        }
        ran
    }

    /// Drive frames from `host` until the engine quits or the host
    /// stops the loop. Sleeps between frames. Returns frames run.
    pub fn run_loop<H: FrameHost>(&mut self, host: &mut H) -> u64 {
        if !self.clock.is_running() && !self.clock.start(host.now()) {
            return 0;
        }
        let mut frames = 0;
        loop {
            let now = host.now();
            if self.run_one_frame(now) {
                frames += 1;
                if !host.after_frame(self) {
                    break;
                }
                continue;
            }
            if !self.clock.is_running() {
                break;
            }
            host.sleep(self.clock.time_until_due(now));
        }
        log::info!("engine: loop finished after {frames} frames");
        frames
    }

    fn step(&mut self) {
        let frame = FrameInfo {
            frame:  self.clock.current_frame(),
            paused: self.clock.is_paused(),
        };
        log::debug!(
            "frame={} engine: start{}",
            frame.frame,
            if frame.paused { " (paused)" } else { "" }
        );

        let started = SimEvent::FrameStarted { frame: frame.frame, paused: frame.paused };
        self.record(ENGINE_SOURCE, started.clone());

        let emitted = self.subsystems.update_all(frame, &self.rng_bank, &[started]);
        for (source, event) in emitted {
            self.record(&source, event);
        }

        if !frame.paused {
            let positions: PositionTable = self
                .units
                .iter()
                .map(|(&id, unit)| (id, unit.position()))
                .collect();
            let mut unit_events = Vec::new();
            for unit in self.units.values_mut() {
                unit_events.extend(
                    unit.frame_update(frame.frame, SECONDS_PER_LOGIC_FRAME, &positions),
                );
            }
            for event in unit_events {
                self.record(UNITS_SOURCE, event);
            }
        }

        self.subsystems.draw_all();
        self.presenter.present(frame.frame);
        self.record(ENGINE_SOURCE, SimEvent::FrameCompleted { frame: frame.frame });
    }

    fn teardown(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.presenter.release();
        self.subsystems.shutdown_all();
        log::info!("engine: shut down at frame {}", self.clock.current_frame());
    }

    // ── Units ──────────────────────────────────────────────────

    /// Create a unit at `position` with no locomotors. Ids start at 1
    /// and are never reused within a game.
    pub fn spawn_unit(&mut self, position: Vec3) -> EntityId {
        let id = self.next_unit_id;
        self.next_unit_id += 1;
        self.units.insert(id, Unit::new(id, position));
        self.record(UNITS_SOURCE, SimEvent::UnitSpawned {
            frame: self.clock.current_frame(),
            unit: id,
            position,
        });
        id
    }

    /// Create a unit and give it the current version of each named
    /// template. Unknown names fail before anything is spawned.
    pub fn spawn_unit_with(&mut self, position: Vec3, locomotors: &[&str]) -> SimResult<EntityId> {
        let templates = {
            let store = self.templates.borrow();
            locomotors
                .iter()
                .map(|name| store.require_template(name))
                .collect::<SimResult<Vec<_>>>()?
        };
        let id = self.spawn_unit(position);
        if let Some(unit) = self.units.get_mut(&id) {
            for template in templates {
                unit.add_locomotor(template);
            }
        }
        Ok(id)
    }

    pub fn unit(&self, id: EntityId) -> Option<&Unit> {
        self.units.get(&id)
    }

    pub fn unit_mut(&mut self, id: EntityId) -> Option<&mut Unit> {
        self.units.get_mut(&id)
    }

    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    pub fn despawn_unit(&mut self, id: EntityId) -> SimResult<Unit> {
        let unit = self.units.remove(&id).ok_or(SimError::UnitNotFound { id })?;
        self.record(UNITS_SOURCE, SimEvent::UnitDespawned {
            frame: self.clock.current_frame(),
            unit: id,
        });
        Ok(unit)
    }

    pub fn issue_command(&mut self, id: EntityId, command: AiCommand) -> SimResult<()> {
        let unit = self.units.get_mut(&id).ok_or(SimError::UnitNotFound { id })?;
        unit.issue_command(command);
        Ok(())
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn events(&self) -> &[EventLogEntry] {
        &self.event_log
    }

    /// Hand the buffered events to the host and start a fresh buffer.
    pub fn drain_events(&mut self) -> Vec<EventLogEntry> {
        std::mem::take(&mut self.event_log)
    }

    pub fn events_for_frame(&self, frame: LogicFrame) -> impl Iterator<Item = &EventLogEntry> {
        self.event_log.iter().filter(move |e| e.frame == frame)
    }

    fn record(&mut self, source: &str, event: SimEvent) {
        let frame = self.clock.current_frame();
        self.event_log.push(EventLogEntry::new(frame, source, event));
    }

    // ── Snapshot ───────────────────────────────────────────────

    pub fn snapshot(&self) -> WorldSnapshot {
        let units = self
            .units
            .values()
            .map(|unit| {
                let loco = unit.active_locomotor();
                UnitSnapshot {
                    id:            unit.id(),
                    position:      unit.position(),
                    speed:         loco.map_or(0.0, |l| l.speed()),
                    state:         unit.state(),
                    command_queue: unit.ai().command_queue().iter().copied().collect(),
                    goal:          loco.and_then(|l| l.goal_position()),
                }
            })
            .collect();

        let tunnels = self
            .caves
            .borrow()
            .trackers()
            .map(|(index, tracker)| TunnelSnapshot {
                index,
                capacity:  tracker.contain_max(),
                contained: tracker.contained_items().to_vec(),
                entrances: tracker.entrances().clone(),
            })
            .collect();

        WorldSnapshot {
            frame:      self.clock.current_frame(),
            seed:       self.config.seed,
            clock:      self.clock.clone(),
            subsystems: self.subsystems.names(),
            units,
            tunnels,
        }
    }
}
