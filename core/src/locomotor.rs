//! Kinematic locomotion: steering one entity toward a goal within the
//! acceleration, deceleration, and turn-rate bounds of its template.
//!
//! Movement is planar (x/y). Height (z) is carried through untouched;
//! vertical adjustment and appearance are recorded on the template for
//! whichever collaborator places the entity on terrain.

use crate::{
    math::{normalize_angle, Vec3},
    types::EntityId,
};
use serde::{Deserialize, Serialize};
use std::{
    f64::consts::PI,
    ops::{BitAnd, BitOr, BitOrAssign},
    rc::Rc,
};

/// A waypoint counts as reached inside this planar distance.
pub const WAYPOINT_REACHED_DISTANCE: f64 = 0.5;
/// Below this distance the target is treated as reached.
pub const ARRIVAL_EPSILON: f64 = 0.01;
/// Speeds below this snap to a standstill.
pub const MIN_MOVING_SPEED: f64 = 0.01;

/// Bitmask of surface types a locomotor may traverse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfaceMask(pub u16);

impl SurfaceMask {
    pub const NONE:   SurfaceMask = SurfaceMask(0);
    pub const GROUND: SurfaceMask = SurfaceMask(1 << 0);
    pub const WATER:  SurfaceMask = SurfaceMask(1 << 1);
    pub const CLIFF:  SurfaceMask = SurfaceMask(1 << 2);
    pub const AIR:    SurfaceMask = SurfaceMask(1 << 3);
    pub const RUBBLE: SurfaceMask = SurfaceMask(1 << 4);
    pub const ALL:    SurfaceMask = SurfaceMask(0xffff);

    pub fn intersects(self, other: SurfaceMask) -> bool {
        self.0 & other.0 != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for SurfaceMask {
    type Output = SurfaceMask;
    fn bitor(self, rhs: SurfaceMask) -> SurfaceMask { SurfaceMask(self.0 | rhs.0) }
}

impl BitOrAssign for SurfaceMask {
    fn bitor_assign(&mut self, rhs: SurfaceMask) { self.0 |= rhs.0; }
}

impl BitAnd for SurfaceMask {
    type Output = SurfaceMask;
    fn bitand(self, rhs: SurfaceMask) -> SurfaceMask { SurfaceMask(self.0 & rhs.0) }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZAdjustMode {
    Absolute,
    #[default]
    TerrainRelative,
    TerrainInfluence,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppearanceMode {
    #[default]
    Normal,
    Floats,
    Flies,
}

/// Immutable movement profile shared by many locomotors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocomotorTemplate {
    pub name:           String,
    pub legal_surfaces: SurfaceMask,
    /// Units per second.
    pub max_speed:      f64,
    /// Seconds for a half turn is `turn_radius`; rate = π / turn_radius.
    pub turn_radius:    f64,
    /// Units per second².
    pub acceleration:   f64,
    /// Units per second².
    pub deceleration:   f64,
    pub downhill_only:  bool,
    pub max_slope:      f64,
    pub z_adjust:       ZAdjustMode,
    pub appearance:     AppearanceMode,
}

impl LocomotorTemplate {
    pub fn new(name: &str) -> Self {
        Self {
            name:           name.to_string(),
            legal_surfaces: SurfaceMask::GROUND,
            max_speed:      1.0,
            turn_radius:    1.0,
            acceleration:   0.1,
            deceleration:   0.1,
            downhill_only:  false,
            max_slope:      1.0,
            z_adjust:       ZAdjustMode::default(),
            appearance:     AppearanceMode::default(),
        }
    }

    pub fn with_surfaces(mut self, surfaces: SurfaceMask) -> Self {
        self.legal_surfaces = surfaces;
        self
    }

    pub fn with_max_speed(mut self, speed: f64) -> Self {
        self.max_speed = speed;
        self
    }

    pub fn with_turn_radius(mut self, radius: f64) -> Self {
        self.turn_radius = radius;
        self
    }

    pub fn with_acceleration(mut self, acceleration: f64) -> Self {
        self.acceleration = acceleration;
        self
    }

    pub fn with_deceleration(mut self, deceleration: f64) -> Self {
        self.deceleration = deceleration;
        self
    }

    pub fn with_downhill_only(mut self, downhill_only: bool) -> Self {
        self.downhill_only = downhill_only;
        self
    }

    pub fn with_max_slope(mut self, slope: f64) -> Self {
        self.max_slope = slope;
        self
    }

    pub fn with_z_adjust(mut self, mode: ZAdjustMode) -> Self {
        self.z_adjust = mode;
        self
    }

    pub fn with_appearance(mut self, mode: AppearanceMode) -> Self {
        self.appearance = mode;
        self
    }

    /// Replace values no locomotor can work with by safe ones, logging
    /// each fix. Returns the number of fields changed.
    pub fn sanitize(&mut self) -> usize {
        let mut fixed = 0;
        let name = self.name.clone();
        let mut check = |field: &str, value: &mut f64, fallback: f64| {
            if !value.is_finite() || *value < 0.0 {
                log::warn!("locomotor '{name}': {field}={value} is invalid; using {fallback}");
                *value = fallback;
                fixed += 1;
            }
        };
        check("max_speed", &mut self.max_speed, 0.0);
        check("turn_radius", &mut self.turn_radius, 1.0);
        check("acceleration", &mut self.acceleration, 0.1);
        check("deceleration", &mut self.deceleration, 0.1);
        check("max_slope", &mut self.max_slope, 1.0);
        fixed
    }

    /// Maximum turn rate in radians per second. A non-positive radius
    /// turns instantly.
    pub fn max_turn_rate(&self) -> f64 {
        if self.turn_radius > 0.0 { PI / self.turn_radius } else { f64::INFINITY }
    }
}

/// Per-entity steering state.
#[derive(Debug, Clone)]
pub struct Locomotor {
    template:       Rc<LocomotorTemplate>,
    attached:       Option<EntityId>,
    position:       Vec3,
    direction:      Vec3,
    velocity:       Vec3,
    speed:          f64,
    goal_position:  Option<Vec3>,
    goal_direction: Option<Vec3>,
    path:           Vec<Vec3>,
    path_index:     usize,
}

impl Locomotor {
    /// A template with unusable values is repaired on a private copy;
    /// the shared one is left alone.
    pub fn new(template: Rc<LocomotorTemplate>) -> Self {
        let mut checked = LocomotorTemplate::clone(&template);
        let template = if checked.sanitize() > 0 {
            log::warn!("locomotor '{}': built from an unsanitized template", checked.name);
            Rc::new(checked)
        } else {
            template
        };
        Self {
            template,
            attached:       None,
            position:       Vec3::ZERO,
            direction:      Vec3::UNIT_X,
            velocity:       Vec3::ZERO,
            speed:          0.0,
            goal_position:  None,
            goal_direction: None,
            path:           Vec::new(),
            path_index:     0,
        }
    }

    pub fn template(&self) -> &LocomotorTemplate {
        &self.template
    }

    pub fn legal_surfaces(&self) -> SurfaceMask {
        self.template.legal_surfaces
    }

    pub fn is_downhill_only(&self) -> bool {
        self.template.downhill_only
    }

    /// Record the owning entity. The locomotor never controls its
    /// lifetime.
    pub fn attach_to(&mut self, entity: EntityId) {
        self.attached = Some(entity);
    }

    pub fn detach(&mut self) {
        self.attached = None;
    }

    pub fn attached_entity(&self) -> Option<EntityId> {
        self.attached
    }

    // ── Goals ──────────────────────────────────────────────────

    pub fn set_goal_position(&mut self, position: Vec3) {
        self.goal_position = Some(position);
    }

    pub fn clear_goal_position(&mut self) {
        self.goal_position = None;
    }

    pub fn goal_position(&self) -> Option<Vec3> {
        self.goal_position
    }

    /// Face `direction` once turned. A zero vector is ignored.
    pub fn set_goal_direction(&mut self, direction: Vec3) {
        match direction.planar().try_normalized() {
            Some(dir) => self.goal_direction = Some(dir),
            None => log::warn!("locomotor '{}': zero goal direction ignored", self.template.name),
        }
    }

    pub fn clear_goal_direction(&mut self) {
        self.goal_direction = None;
    }

    pub fn goal_direction(&self) -> Option<Vec3> {
        self.goal_direction
    }

    /// Follow `path` in order. The last waypoint becomes the goal
    /// position, so the locomotor settles there once the path runs out.
    pub fn set_path(&mut self, path: Vec<Vec3>) {
        self.goal_position = path.last().copied().or(self.goal_position);
        self.path = path;
        self.path_index = 0;
    }

    pub fn clear_path(&mut self) {
        self.path.clear();
        self.path_index = 0;
    }

    pub fn has_path(&self) -> bool {
        self.path_index < self.path.len()
    }

    pub fn path(&self) -> &[Vec3] {
        &self.path
    }

    pub fn path_index(&self) -> usize {
        self.path_index
    }

    /// Drop every goal and path. The locomotor coasts to a stop.
    pub fn clear_goals(&mut self) {
        self.clear_goal_position();
        self.clear_goal_direction();
        self.clear_path();
    }

    /// Planar distance to the goal position, `None` without one.
    pub fn distance_to_goal(&self) -> Option<f64> {
        self.goal_position
            .map(|goal| (goal - self.position).planar().length())
    }

    // ── Kinematic state ────────────────────────────────────────

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// A zero vector is ignored.
    pub fn set_direction(&mut self, direction: Vec3) {
        if let Some(dir) = direction.planar().try_normalized() {
            self.direction = dir;
        }
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Clamped into [0, max_speed].
    pub fn set_speed(&mut self, speed: f64) {
        self.speed = speed.min(self.template.max_speed).max(0.0);
        self.velocity = self.direction * self.speed;
    }

    pub fn max_speed(&self) -> f64 {
        self.template.max_speed
    }

    pub fn is_moving(&self) -> bool {
        self.speed > 0.0
    }

    /// Take over position, heading, and speed from another locomotor of
    /// the same entity (used when the entity changes surface).
    pub fn copy_kinematics_from(&mut self, other: &Locomotor) {
        self.position = other.position;
        self.direction = other.direction;
        self.set_speed(other.speed);
    }

    // ── Per-frame update ───────────────────────────────────────

    /// Advance by `dt` seconds. Non-positive or non-finite `dt` is a no-op.
    pub fn update(&mut self, dt: f64) {
        if !(dt > 0.0 && dt.is_finite()) {
            return;
        }

        if self.goal_position.is_none() && self.goal_direction.is_none() {
            self.decelerate(dt);
            return;
        }

        match self.next_waypoint().or(self.goal_position) {
            Some(target) => self.move_towards(target, dt),
            None => self.decelerate(dt),
        }

        if let Some(goal_dir) = self.goal_direction {
            self.turn_towards(goal_dir, dt);
        } else if self.speed > MIN_MOVING_SPEED {
            if let Some(heading) = self.velocity.planar().try_normalized() {
                self.turn_towards(heading, dt);
            }
        }

        if self.speed > 0.0 {
            self.position += self.velocity * dt;
        }
    }

    /// Skip reached waypoints and return the next one, if any.
    fn next_waypoint(&mut self) -> Option<Vec3> {
        while let Some(&waypoint) = self.path.get(self.path_index) {
            let dist = (waypoint - self.position).planar().length();
            if dist >= WAYPOINT_REACHED_DISTANCE {
                return Some(waypoint);
            }
            self.path_index += 1;
        }
        None
    }

    fn move_towards(&mut self, target: Vec3, dt: f64) {
        let offset = (target - self.position).planar();
        let distance = offset.length();
        if distance < ARRIVAL_EPSILON {
            // On target: hold still and bleed off what speed is left.
            self.position = Vec3::new(target.x, target.y, self.position.z);
            self.velocity = Vec3::ZERO;
            let decel = self.template.deceleration;
            self.speed = if decel > 0.0 { (self.speed - decel * dt).max(0.0) } else { 0.0 };
            return;
        }
        let heading = offset * (1.0 / distance);

        let desired = self.template.max_speed.min(self.braking_speed(distance, dt));
        self.adjust_speed(desired, dt);

        // The final frame of an approach lands on the target instead of
        // stepping past it.
        self.velocity = if self.speed * dt >= distance {
            offset * (1.0 / dt)
        } else {
            heading * self.speed
        };
    }

    fn turn_towards(&mut self, target: Vec3, dt: f64) {
        let max_step = self.template.max_turn_rate() * dt;
        let current = self.direction.angle();
        let diff = normalize_angle(target.angle() - current);
        let step = diff.clamp(-max_step, max_step);
        self.direction = Vec3::from_angle(current + step);
    }

    fn adjust_speed(&mut self, desired: f64, dt: f64) {
        let desired = desired.min(self.template.max_speed).max(0.0);
        if desired > self.speed {
            self.speed = (self.speed + self.template.acceleration * dt).min(desired);
        } else if desired < self.speed {
            self.speed = (self.speed - self.template.deceleration * dt).max(desired);
        }
    }

    fn decelerate(&mut self, dt: f64) {
        self.adjust_speed(0.0, dt);
        if self.speed < MIN_MOVING_SPEED {
            self.speed = 0.0;
            self.velocity = Vec3::ZERO;
        } else {
            self.velocity = self.velocity.normalized() * self.speed;
        }
    }

    /// Fastest speed from which braking by `deceleration * dt` every
    /// frame still stops within `distance`. Unbounded when the template
    /// cannot brake at all.
    ///
    /// Braking from `v` covers `dt * (v + (v - a*dt) + ...)`, which is
    /// `v * (v + a*dt) / (2a)`; this solves that for `v`.
    fn braking_speed(&self, distance: f64, dt: f64) -> f64 {
        let decel = self.template.deceleration;
        if decel <= 0.0 {
            return f64::INFINITY;
        }
        let step = decel * dt;
        ((step * step + 8.0 * decel * distance).sqrt() - step) / 2.0
    }
}

/// The locomotors of one mobile entity, one per surface family.
#[derive(Debug, Clone, Default)]
pub struct LocomotorSet {
    locomotors:     Vec<Locomotor>,
    valid_surfaces: SurfaceMask,
    downhill_only:  bool,
    mixed_downhill: bool,
}

impl LocomotorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Add a locomotor built from `template`. Mixing downhill-only and
    /// regular locomotors is a configuration error: it is reported, the
    /// locomotor is still added, and false is returned.
    pub fn add_locomotor(&mut self, template: Rc<LocomotorTemplate>) -> bool {
        let loco = Locomotor::new(template);
        self.valid_surfaces |= loco.legal_surfaces();

        let consistent =
            self.locomotors.is_empty() || loco.is_downhill_only() == self.downhill_only;
        if self.locomotors.is_empty() {
            self.downhill_only = loco.is_downhill_only();
        } else if !consistent {
            log::error!(
                "locomotor set: cannot mix downhill-only and regular locomotors ('{}')",
                loco.template().name
            );
            self.mixed_downhill = true;
        }

        self.locomotors.push(loco);
        consistent
    }

    /// Point every member at `entity`.
    pub fn attach_to(&mut self, entity: EntityId) {
        for loco in &mut self.locomotors {
            loco.attach_to(entity);
        }
    }

    pub fn find_index(&self, surface: SurfaceMask) -> Option<usize> {
        self.locomotors
            .iter()
            .position(|loco| loco.legal_surfaces().intersects(surface))
    }

    /// First locomotor able to move on `surface`, or `None` (impassable).
    pub fn find_locomotor(&self, surface: SurfaceMask) -> Option<&Locomotor> {
        self.find_index(surface).map(|i| &self.locomotors[i])
    }

    pub fn find_locomotor_mut(&mut self, surface: SurfaceMask) -> Option<&mut Locomotor> {
        self.find_index(surface).map(move |i| &mut self.locomotors[i])
    }

    pub fn get(&self, index: usize) -> Option<&Locomotor> {
        self.locomotors.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Locomotor> {
        self.locomotors.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Locomotor> {
        self.locomotors.iter()
    }

    pub fn len(&self) -> usize {
        self.locomotors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locomotors.is_empty()
    }

    pub fn valid_surfaces(&self) -> SurfaceMask {
        self.valid_surfaces
    }

    /// Classification of the set, taken from its first member.
    pub fn is_downhill_only(&self) -> bool {
        self.downhill_only
    }

    /// A downhill-only/regular mix was reported for this set.
    pub fn has_mixed_downhill(&self) -> bool {
        self.mixed_downhill
    }
}
