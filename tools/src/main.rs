//! sim-runner: headless skirmish kernel runner.
//!
//! Usage:
//!   sim-runner --seed 12345 --frames 300 --units 8
//!   sim-runner --config options.json --realtime --fps 60
//!   sim-runner --seed 7 --frames 90 --json

use anyhow::{Context, Result};
use skirmish_core::{
    cave_contain::CaveEntrance,
    command::AiCommand,
    config::EngineConfig,
    engine::{SimEngine, WallClockHost},
    event::SimEvent,
    locomotor::{LocomotorTemplate, SurfaceMask},
    math::Vec3,
    types::EntityId,
};
use std::env;

/// Structures get ids far above the unit range.
const FIRST_ENTRANCE_ID: EntityId = 1_000_000;
const SCATTER_RADIUS: f64 = 50.0;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let frames = parse_arg(&args, "--frames", 300u64);
    let unit_count = parse_arg(&args, "--units", 8usize);
    let realtime = args.iter().any(|a| a == "--realtime");
    let json = args.iter().any(|a| a == "--json");
    let config_path = args
        .windows(2)
        .find(|w| w[0] == "--config")
        .map(|w| w[1].as_str());

    let mut config = match config_path {
        Some(path) => load_config(path)?,
        None => EngineConfig::default(),
    };
    config.seed = parse_arg(&args, "--seed", config.seed);
    config.max_frames_per_second = parse_arg(&args, "--fps", config.max_frames_per_second);

    if !json {
        println!("skirmish kernel: sim-runner");
        println!("  seed:      {}", config.seed);
        println!("  frames:    {frames}");
        println!("  units:     {unit_count}");
        println!("  fps:       {}", config.max_frames_per_second);
        println!("  mode:      {}", if realtime { "realtime" } else { "headless" });
        println!();
    }

    let mut engine = SimEngine::initialize(config)?;
    let entrances = setup_scenario(&mut engine, unit_count)?;

    let ran = if realtime {
        let mut host = WallClockHost::new(Some(frames));
        engine.run_loop(&mut host)
    } else {
        engine.run_frames(frames)
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&engine.snapshot())?);
    } else {
        print_summary(&engine, &entrances, ran);
    }
    Ok(())
}

fn load_config(path: &str) -> Result<EngineConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read {path}"))?;
    if path.ends_with(".json") {
        Ok(EngineConfig::from_json_str(&text)?)
    } else {
        Ok(EngineConfig::from_key_value_text(&text))
    }
}

/// Register templates, scatter units, open a two-entrance tunnel network,
/// and hand out orders.
fn setup_scenario(engine: &mut SimEngine, unit_count: usize) -> Result<Vec<CaveEntrance>> {
    {
        let mut templates = engine.templates_mut();
        templates.register_template(
            LocomotorTemplate::new("infantry")
                .with_surfaces(SurfaceMask::GROUND | SurfaceMask::RUBBLE)
                .with_max_speed(6.0)
                .with_turn_radius(0.5)
                .with_acceleration(12.0)
                .with_deceleration(18.0),
        );
        templates.register_template(
            LocomotorTemplate::new("swimmer")
                .with_surfaces(SurfaceMask::WATER)
                .with_max_speed(3.0)
                .with_acceleration(6.0)
                .with_deceleration(6.0),
        );
    }

    let mut rng = engine.scenario_rng("scenario");
    let mut units = Vec::with_capacity(unit_count);
    for _ in 0..unit_count {
        let at = Vec3::new(
            rng.range_f64(-SCATTER_RADIUS, SCATTER_RADIUS),
            rng.range_f64(-SCATTER_RADIUS, SCATTER_RADIUS),
            0.0,
        );
        units.push(engine.spawn_unit_with(at, &["infantry", "swimmer"])?);
    }

    let mut entrances = vec![
        CaveEntrance::new(FIRST_ENTRANCE_ID, 0),
        CaveEntrance::new(FIRST_ENTRANCE_ID + 1, 0),
    ];
    {
        let mut caves = engine.caves_mut();
        for entrance in &mut entrances {
            entrance.on_build_complete(&mut caves);
        }
    }

    // Every third unit garrisons the network; the rest patrol out and back.
    for (i, &unit) in units.iter().enumerate() {
        if i % 3 == 2 {
            let admitted = entrances[0].add_to_contain(&mut engine.caves_mut(), unit);
            if !admitted {
                log::info!("scenario: tunnel network full, unit {unit} stays outside");
            }
            continue;
        }
        let start = engine.unit(unit).map(|u| u.position()).unwrap_or_default();
        let out = Vec3::new(
            rng.range_f64(-SCATTER_RADIUS, SCATTER_RADIUS),
            rng.range_f64(-SCATTER_RADIUS, SCATTER_RADIUS),
            0.0,
        );
        engine.issue_command(unit, AiCommand::move_to(out))?;
        engine.issue_command(unit, AiCommand::move_to(start).queued())?;
        engine.issue_command(unit, AiCommand::stop().queued())?;
    }
    Ok(entrances)
}

fn print_summary(engine: &SimEngine, entrances: &[CaveEntrance], ran: u64) {
    let events = engine.events();
    let arrivals = events
        .iter()
        .filter(|e| matches!(e.event, SimEvent::UnitArrived { .. }))
        .count();
    let completed = events
        .iter()
        .filter(|e| matches!(e.event, SimEvent::CommandCompleted { .. }))
        .count();
    let idle = engine.units().filter(|u| u.ai().queue_len() == 0).count();

    println!("=== RUN SUMMARY ===");
    println!("  frames run:     {ran}");
    println!("  final frame:    {}", engine.current_frame());
    println!("  events:         {}", events.len());
    println!("  arrivals:       {arrivals}");
    println!("  commands done:  {completed}");
    println!("  idle units:     {idle}/{}", engine.unit_count());

    println!();
    println!("=== TUNNEL NETWORK ===");
    let caves = engine.caves();
    for entrance in entrances {
        println!(
            "  entrance {} | network {} | {}/{} inside",
            entrance.object_id(),
            entrance.cave_index(),
            entrance.contain_count(&caves),
            entrance.contain_max(&caves),
        );
    }
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
