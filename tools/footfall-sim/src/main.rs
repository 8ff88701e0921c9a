use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use footfall_core::{vec3, Isometry, StepCtx, StepHasher, TickContract, Vec3};
use footfall_motion::{BodySample, MotionState};
use footfall_rig::{LocomotionRig, RigConfig, RigReport, Side};
use footfall_terrain::{Aabb, LayerMask, TerrainProbe, TerrainScene};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Scenario {
    /// Level ground.
    Flat,
    /// Five 0.1 m stairs starting 1 m ahead.
    Stairs,
    /// A knee-high box across the path.
    Box,
    /// Nothing to stand on.
    Void,
}

#[derive(Parser, Debug)]
#[command(name = "footfall-sim", version, about = "Walk the locomotion rig across a canned scene")]
struct Opts {
    #[arg(long, value_enum, default_value_t = Scenario::Flat)]
    scenario: Scenario,
    /// Ticks to simulate (default: $FOOTFALL_TICKS or 600)
    #[arg(long)]
    ticks: Option<u32>,
    /// Forward body speed in m/s (default: $FOOTFALL_SPEED or 1.2)
    #[arg(long)]
    speed: Option<f32>,
    /// Hip height above the ground in meters
    #[arg(long, default_value_t = 0.9)]
    hip: f32,
    /// Rig config JSON; defaults are used when absent
    #[arg(long)]
    config: Option<PathBuf>,
    /// Write the effective config here and exit
    #[arg(long)]
    dump_config: Option<PathBuf>,
    /// Print a summary line every N ticks (0 = never)
    #[arg(long, default_value_t = 30)]
    every: u32,
    /// Print every report as a JSON line instead of summaries
    #[arg(long)]
    json: bool,
    /// Print both feet's diagnostic ledgers at the end
    #[arg(long)]
    ledger: bool,
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key).ok().and_then(|s| s.parse().ok()).unwrap_or(default)
}
fn env_f32(key: &str, default: f32) -> f32 {
    std::env::var(key).ok().and_then(|s| s.parse().ok()).unwrap_or(default)
}

fn build_scene(scenario: Scenario) -> TerrainScene {
    let solid = LayerMask::layer(0);
    match scenario {
        Scenario::Flat => TerrainScene::flat(0.0),
        Scenario::Stairs => {
            let mut scene = TerrainScene::flat(0.0);
            for i in 0..5 {
                let x0 = 1.0 + 0.35 * i as f32;
                scene.add_box(Aabb::new(vec3(x0, 0.0, -2.0), vec3(40.0, 0.1 * (i + 1) as f32, 2.0)), solid);
            }
            scene
        }
        Scenario::Box => TerrainScene::flat(0.0)
            .with_box(Aabb::new(vec3(1.5, 0.0, -2.0), vec3(2.1, 0.25, 2.0)), solid),
        Scenario::Void => TerrainScene::new(),
    }
}

/// Highest surface under `x` on the centre line, or 0 over the void.
fn ground_under(scene: &TerrainScene, x: f32) -> f32 {
    scene.raycast(vec3(x, 50.0, 0.0), Vec3::NEG_Y, 100.0, LayerMask::ALL).map_or(0.0, |h| h.point.y)
}

fn foot(pos: Vec3, swinging: bool) -> String {
    format!("({:+.3} {:+.3} {:+.3}){}", pos.x, pos.y, pos.z, if swinging { "*" } else { " " })
}

fn summary(r: &RigReport) -> String {
    format!(
        "tick {:5} v={:.2} {} lead={:<5} L{} R{} {:016x}",
        r.tick,
        r.speed,
        if r.run { "run " } else { "walk" },
        if r.lead == Side::Left { "left" } else { "right" },
        foot(r.left.effector.pos, r.left.swinging),
        foot(r.right.effector.pos, r.right.swinging),
        r.digest,
    )
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    let opts = Opts::parse();
    let cfg = match &opts.config {
        Some(path) => RigConfig::load_json(path).with_context(|| format!("loading {}", path.display()))?,
        None => RigConfig::default(),
    };
    if let Some(path) = &opts.dump_config {
        cfg.save_json(path, true).with_context(|| format!("writing {}", path.display()))?;
        println!("config: {}", path.display());
        return Ok(());
    }

    let ticks = opts.ticks.unwrap_or_else(|| env_u32("FOOTFALL_TICKS", 600));
    let speed = opts.speed.unwrap_or_else(|| env_f32("FOOTFALL_SPEED", 1.2));
    let contract = TickContract::default_contract();
    let scene = build_scene(opts.scenario);
    info!(scenario = ?opts.scenario, ticks, speed, dt = contract.fixed_dt, "starting");

    let mut rig = LocomotionRig::new(cfg).context("building rig")?;
    let velocity = vec3(speed, 0.0, 0.0);
    let mut body = Isometry::from_translation(vec3(0.0, ground_under(&scene, 0.0) + opts.hip, 0.0));
    rig.setup(&scene, body);

    let mut motion = MotionState::default();
    let mut ctx = StepCtx::new(contract.fixed_dt);
    let mut run_hash = StepHasher::new();
    for _ in 0..ticks {
        ctx = ctx.next();
        body.pos += velocity * ctx.dt;
        body.pos.y = ground_under(&scene, body.pos.x) + opts.hip;
        motion.update(&BodySample { velocity, position: body.pos, forward: Vec3::X, grounded: true, ..Default::default() }, ctx.dt);

        let report = rig.step(ctx, &scene as &dyn TerrainProbe, body, &motion);
        run_hash.update_bytes(&report.digest.to_le_bytes());
        if opts.json {
            println!("{}", serde_json::to_string(&report)?);
        } else if opts.every > 0 && report.tick % opts.every as u64 == 0 {
            println!("{}", summary(&report));
        }
    }

    if opts.ledger {
        for side in [Side::Left, Side::Right] {
            let jsonl = rig.foot(side).ledger().to_jsonl()?;
            println!("# {side:?} ledger ({} entries)", rig.foot(side).ledger().len());
            print!("{jsonl}");
        }
    }
    println!("digest {:016x} after {} ticks", run_hash.finalize_u64(), ticks);
    Ok(())
}
