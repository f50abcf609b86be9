//! Shared primitive types used across the entire simulation.

/// A logic frame number. One frame = 1/30 simulated second.
pub type LogicFrame = u64;

/// A stable identifier for any entity in the simulation.
pub type EntityId = u32;

/// Index of a tunnel network. Entrances sharing an index share a pool.
pub type CaveIndex = usize;
