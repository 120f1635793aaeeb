use rand::Rng;
use serde::Serialize;
use tracing::{info, Level};

use holdout_sim::config::{FullBountyPolicy, SimConfig, SoftCapPolicy};
use holdout_sim::game::constants::frame;
use holdout_sim::game::events::CombatEventKind;
use holdout_sim::game::pool::PoolStats;
use holdout_sim::game::spatial::GridStats;
use holdout_sim::game::state::{
    Homing, HostileSpec, ProjectileSpec, SimStats, SlowEffect, World,
};
use holdout_sim::util::vec2::Vec2;

/// Where the defense holds; hostiles march toward this line
const HOLD_LINE_X: f32 = 80.0;
/// Turret mount on the hold line
const TURRET: Vec2 = Vec2 { x: 60.0, y: 360.0 };
const VOLLEY_INTERVAL: u64 = 6;
const HOSTILE_SPEED: f32 = 90.0;

#[derive(Serialize)]
struct BalanceReport {
    frames: u64,
    stats: SimStats,
    projectile_pool: PoolStats,
    grid: GridStats,
    average_frame_us: u128,
    p95_frame_us: u128,
    budget_usage_percent: f32,
}

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    info!("Holdout balance run v{}", env!("CARGO_PKG_VERSION"));

    let config = SimConfig::load_or_default();
    config.validate().map_err(anyhow::Error::msg)?;
    info!(
        "Field {}x{}, grid cell {}",
        config.field_width, config.field_height, config.grid_cell_size
    );

    let frames: u64 = std::env::var("RUN_FRAMES")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(3600);
    let wave_size: usize = std::env::var("WAVE_SIZE")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(40);

    let mut world = World::new(config.clone());
    match std::env::var("REWARD_POLICY").as_deref() {
        Ok("full") => world.set_reward_policy(Box::new(FullBountyPolicy)),
        _ => world.set_reward_policy(Box::new(SoftCapPolicy::default())),
    }

    let mut rng = rand::thread_rng();
    for _ in 0..wave_size {
        spawn_wave_hostile(&mut world, &mut rng, &config);
    }

    info!(frames, wave_size, "starting run");
    run(&mut world, &mut rng, &config, frames);

    let timings = world.timings();
    let report = BalanceReport {
        frames,
        stats: *world.stats(),
        projectile_pool: world.projectile_pool_stats(),
        grid: world.grid_stats(),
        average_frame_us: timings.average().as_micros(),
        p95_frame_us: timings.p95().as_micros(),
        budget_usage_percent: timings.budget_usage_percent(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

fn run(world: &mut World, rng: &mut impl Rng, config: &SimConfig, frames: u64) {
    let dt = frame::TARGET_DT;
    let mut timestamp = 0.0_f64;

    for _ in 0..frames {
        timestamp += f64::from(dt);

        if world.tick() % VOLLEY_INTERVAL == 0 {
            fire_volley(world, rng);
        }

        advance_hostiles(world, dt);
        world.update_frame(dt, timestamp);

        // Renderer stand-in: acknowledge every death and refill the wave
        for cue in world.drain_death_cues() {
            world.acknowledge_death(cue.hostile);
            // Economy stand-in: xp floats where the kill happened
            world.push_event(CombatEventKind::Xp, cue.bounty_credited as f32, cue.position);
            spawn_wave_hostile(world, rng, config);
        }
        world.mark_events_displayed();

        if world.tick() % 600 == 0 {
            let snap = world.snapshot();
            info!(
                tick = snap.tick,
                live = world.live_hostile_count(),
                projectiles = snap.projectiles.len(),
                events = snap.events.len(),
                kills = snap.stats.kills,
                p95_us = world.timings().p95().as_micros(),
                "progress"
            );
        }
    }
}

fn spawn_wave_hostile(world: &mut World, rng: &mut impl Rng, config: &SimConfig) {
    let spec = HostileSpec {
        position: Vec2::new(
            config.field_width - rng.gen_range(0.0..120.0),
            rng.gen_range(40.0..config.field_height - 40.0),
        ),
        radius: rng.gen_range(8.0..22.0),
        health: rng.gen_range(40.0..180.0),
        bounty: rng.gen_range(5..40),
        shielded: rng.gen_bool(0.08),
    };
    // Specs built from these ranges always validate
    if let Err(err) = world.spawn_hostile(spec) {
        tracing::warn!(%err, "wave spawn rejected");
    }
}

/// The march: movement itself is external to the engine, which only
/// ingests the resulting positions
fn advance_hostiles(world: &mut World, dt: f32) {
    let now = world.now();
    let moves: Vec<_> = world
        .hostiles()
        .iter()
        .filter(|h| !h.dead && h.position.x > HOLD_LINE_X)
        .map(|h| {
            let step = HOSTILE_SPEED * h.speed_factor(now) * dt;
            (h.id, h.position - Vec2::new(step, 0.0))
        })
        .collect();
    for (id, position) in moves {
        world.set_hostile_position(id, position);
    }
}

fn fire_volley(world: &mut World, rng: &mut impl Rng) {
    let targets: Vec<_> = world
        .hostiles()
        .iter()
        .filter(|h| !h.dead)
        .map(|h| (h.id, h.position))
        .collect();
    if targets.is_empty() {
        return;
    }

    for _ in 0..3 {
        let (target, target_pos) = targets[rng.gen_range(0..targets.len())];
        let aim = match (target_pos - TURRET).normalize() {
            dir if dir.length_sq() > 0.0 => dir,
            _ => Vec2::new(1.0, 0.0),
        };

        let roll: f32 = rng.gen();
        let spec = ProjectileSpec {
            position: TURRET,
            velocity: aim * rng.gen_range(600.0..1400.0),
            radius: rng.gen_range(2.0..5.0),
            damage: rng.gen_range(8.0..35.0),
            pierce: if roll < 0.3 { rng.gen_range(1..4) } else { 0 },
            splash_radius: (roll < 0.2).then(|| rng.gen_range(30.0..80.0)),
            slow: (roll > 0.8).then(|| SlowEffect {
                factor: rng.gen_range(0.3..0.7),
                duration: rng.gen_range(0.5..2.0),
            }),
            homing: (0.2..0.4).contains(&roll).then_some(Homing {
                target,
                turn_rate: rng.gen_range(2.0..6.0),
            }),
            ..ProjectileSpec::default()
        };
        if let Err(err) = world.spawn_projectile(spec) {
            tracing::warn!(%err, "volley shot rejected");
        }
    }
}
