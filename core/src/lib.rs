//! Skirmish simulation kernel: frame pacing, the subsystem registry,
//! per-unit AI command queues, kinematic locomotion, and tunnel networks.

pub mod ai;
pub mod cave_contain;
pub mod cave_subsystem;
pub mod clock;
pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod locomotor;
pub mod math;
pub mod rng;
pub mod snapshot;
pub mod subsystem;
pub mod template_store;
pub mod timing;
pub mod tunnel;
pub mod types;
pub mod unit;
