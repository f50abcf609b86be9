//! THE MOST IMPORTANT TEST IN THE PROJECT.
//!
//! Two engines, same seed, same operations.
//! They must produce byte-identical event logs.
//! Any divergence is a blocker; do not merge until fixed.

use skirmish_core::{
    cave_contain::CaveEntrance,
    command::AiCommand,
    config::EngineConfig,
    engine::SimEngine,
    locomotor::{LocomotorTemplate, SurfaceMask},
    math::Vec3,
};

const UNITS: usize = 12;

/// A small skirmish: scattered units, patrol orders drawn from the
/// scenario stream, and a shared tunnel network.
fn build_engine(seed: u64) -> SimEngine {
    let config = EngineConfig { seed, ..Default::default() };
    let mut engine = SimEngine::initialize(config).expect("engine initializes");
    engine.templates_mut().register_template(
        LocomotorTemplate::new("walker")
            .with_surfaces(SurfaceMask::GROUND)
            .with_max_speed(5.0)
            .with_acceleration(8.0)
            .with_deceleration(10.0)
            .with_turn_radius(0.5),
    );

    let mut rng = engine.scenario_rng("scenario");
    let mut entrance = CaveEntrance::new(10_000, 0);
    entrance.on_build_complete(&mut engine.caves_mut());

    for i in 0..UNITS {
        let at = Vec3::new(rng.range_f64(-40.0, 40.0), rng.range_f64(-40.0, 40.0), 0.0);
        let unit = engine.spawn_unit_with(at, &["walker"]).expect("spawn");
        if i % 4 == 0 {
            entrance.add_to_contain(&mut engine.caves_mut(), unit);
            continue;
        }
        let out = Vec3::new(rng.range_f64(-40.0, 40.0), rng.range_f64(-40.0, 40.0), 0.0);
        engine.issue_command(unit, AiCommand::move_to(out)).expect("order");
        engine.issue_command(unit, AiCommand::move_to(at).queued()).expect("order");
    }
    engine
}

fn collect_event_log(engine: &SimEngine) -> Vec<String> {
    engine
        .events()
        .iter()
        .map(|e| serde_json::to_string(e).expect("serialize event"))
        .collect()
}

#[test]
fn same_seed_produces_identical_event_logs() {
    const SEED: u64 = 0xDEAD_BEEF_CAFE_1234;
    const FRAMES: u64 = 30 * 60; // one simulated minute

    let mut engine_a = build_engine(SEED);
    let mut engine_b = build_engine(SEED);

    engine_a.run_frames(FRAMES);
    engine_b.run_frames(FRAMES);

    let log_a = collect_event_log(&engine_a);
    let log_b = collect_event_log(&engine_b);

    assert_eq!(
        log_a.len(), log_b.len(),
        "Event log lengths differ: {} vs {}",
        log_a.len(), log_b.len()
    );

    for (i, (a, b)) in log_a.iter().zip(log_b.iter()).enumerate() {
        assert_eq!(
            a, b,
            "Event log diverged at entry {i}:\n  A: {a}\n  B: {b}"
        );
    }

    let snap_a = serde_json::to_string(&engine_a.snapshot()).unwrap();
    let snap_b = serde_json::to_string(&engine_b.snapshot()).unwrap();
    assert_eq!(snap_a, snap_b);
}

#[test]
fn different_seeds_produce_different_worlds() {
    let engine_a = build_engine(1);
    let engine_b = build_engine(2);

    let positions =
        |engine: &SimEngine| -> Vec<Vec3> { engine.units().map(|u| u.position()).collect() };
    assert_ne!(positions(&engine_a), positions(&engine_b));
}

#[test]
fn frame_rate_ceiling_does_not_change_the_simulation() {
    let mut slow = build_engine(77);
    let mut fast = build_engine(77);
    let started = std::time::Duration::ZERO;
    slow.set_frame_rate_limit(15, started);
    fast.set_frame_rate_limit(120, started);

    slow.run_frames(300);
    fast.run_frames(300);

    let units = |engine: &SimEngine| -> Vec<String> {
        engine.snapshot().units.iter().map(|u| serde_json::to_string(u).unwrap()).collect()
    };
    assert_eq!(units(&slow), units(&fast));
}
