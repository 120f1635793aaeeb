//! Simulation state definitions and the frame entry point
//!
//! Contains all entities (hostiles, projectiles), the combat log, pooling
//! bookkeeping, and the `World` aggregate the per-frame systems mutate.

use std::time::Instant;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::config::{RewardPolicy, SimConfig, SoftCapPolicy};
use crate::game::constants::{combat, pooling};
use crate::game::events::{CombatEvent, CombatEventKind, CombatLog};
use crate::game::frame::{FrameClock, FrameContext, FrameTimings};
use crate::game::pool::{EntityPool, PoolKey, PoolStats, Recyclable};
use crate::game::spatial::{GridStats, TargetGrid};
use crate::game::systems;
use crate::util::vec2::Vec2;

/// Unique hostile identifier, monotonic per world
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct HostileId(pub u64);

/// Unique projectile identifier, monotonic per world
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ProjectileId(pub u64);

/// Movement penalty a projectile applies on hit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlowEffect {
    /// Speed multiplier while slowed, in (0, 1)
    pub factor: f32,
    /// How long the slow lasts, in seconds
    pub duration: f32,
}

/// Steering behavior toward a tracked hostile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Homing {
    pub target: HostileId,
    /// Maximum heading change in radians per second
    pub turn_rate: f32,
}

/// Why a projectile left the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectileFate {
    /// Piercing budget exhausted on a hit
    Consumed,
    /// Lifetime ran out
    Expired,
    /// Left the playfield plus margin
    OutOfBounds,
}

/// A projectile in flight
///
/// Fields ordered hot-first: motion fields touched every frame lead,
/// resolution fields follow, bookkeeping last.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Projectile {
    // === HOT (integration, every frame) ===
    pub position: Vec2,
    /// Position at the start of this frame, the swept-segment origin
    pub prev_position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    /// Remaining lifetime in seconds
    pub lifetime: f32,
    /// Set once, cleared only by the end-of-frame sweep
    pub fate: Option<ProjectileFate>,

    // === WARM (hit resolution) ===
    pub damage: f32,
    /// Additional targets this projectile may pass through
    pub pierce_left: u32,
    pub splash_radius: Option<f32>,
    pub slow: Option<SlowEffect>,
    pub homing: Option<Homing>,

    // === COLD ===
    pub id: ProjectileId,
    /// Hostiles already hit by this projectile, at most one entry each
    pub hit_targets: FxHashSet<HostileId>,
}

impl Projectile {
    pub fn is_expired(&self) -> bool {
        self.lifetime <= 0.0
    }

    pub fn has_hit(&self, id: HostileId) -> bool {
        self.hit_targets.contains(&id)
    }
}

impl Recyclable for Projectile {
    fn recycle(&mut self) {
        self.position = Vec2::ZERO;
        self.prev_position = Vec2::ZERO;
        self.velocity = Vec2::ZERO;
        self.radius = 0.0;
        self.lifetime = 0.0;
        self.fate = None;
        self.damage = 0.0;
        self.pierce_left = 0;
        self.splash_radius = None;
        self.slow = None;
        self.homing = None;
        // Keeps its allocation, so reused projectiles don't regrow it
        self.hit_targets.clear();
    }
}

/// A hostile unit advancing on the defense line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hostile {
    // === HOT (queried every frame) ===
    pub position: Vec2,
    pub radius: f32,
    pub health: f32,
    /// Set exactly once, by the damage stage
    pub dead: bool,

    // === WARM (status and removal) ===
    /// Simulation time until which the slow applies
    pub slow_until: f64,
    /// Speed multiplier while slowed
    pub slow_factor: f32,
    /// Immune to projectiles; hits emit an event and pass through
    pub shielded: bool,
    /// Renderer has acknowledged the death; removable at next sweep
    pub reaped: bool,

    // === COLD ===
    pub id: HostileId,
    pub max_health: f32,
    /// Nominal reward for destroying this hostile
    pub bounty: u32,
}

impl Hostile {
    pub fn is_slowed(&self, now: f64) -> bool {
        now < self.slow_until
    }

    /// Speed multiplier the movement collaborator should apply
    pub fn speed_factor(&self, now: f64) -> f32 {
        if self.is_slowed(now) {
            self.slow_factor
        } else {
            1.0
        }
    }
}

/// Validated input for `World::spawn_projectile`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileSpec {
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    pub damage: f32,
    /// Additional targets the projectile may pass through after the first
    pub pierce: u32,
    pub splash_radius: Option<f32>,
    pub slow: Option<SlowEffect>,
    pub homing: Option<Homing>,
    pub lifetime: f32,
}

impl Default for ProjectileSpec {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            radius: 4.0,
            damage: 10.0,
            pierce: 0,
            splash_radius: None,
            slow: None,
            homing: None,
            lifetime: combat::DEFAULT_LIFETIME,
        }
    }
}

/// Validated input for `World::spawn_hostile`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostileSpec {
    pub position: Vec2,
    pub radius: f32,
    pub health: f32,
    pub bounty: u32,
    pub shielded: bool,
}

impl Default for HostileSpec {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            radius: 12.0,
            health: 100.0,
            bounty: 10,
            shielded: false,
        }
    }
}

/// Spawn input rejected before it reaches the simulation
#[derive(Debug, Error, PartialEq)]
pub enum SpawnError {
    #[error("{field} must be finite")]
    NonFinite { field: &'static str },
    #[error("radius must be positive, got {0}")]
    NonPositiveRadius(f32),
    #[error("damage cannot be negative, got {0}")]
    NegativeDamage(f32),
    #[error("lifetime cannot be negative, got {0}")]
    NegativeLifetime(f32),
    #[error("splash radius must be positive, got {0}")]
    NonPositiveSplash(f32),
    #[error("slow factor must be in (0, 1) with a positive duration")]
    InvalidSlow,
    #[error("homing turn rate must be positive, got {0}")]
    NonPositiveTurnRate(f32),
    #[error("health must be positive, got {0}")]
    NonPositiveHealth(f32),
    #[error("projectile would have no effect: zero damage, no splash, no slow")]
    NoEffect,
}

fn validate_projectile_spec(spec: &ProjectileSpec) -> Result<(), SpawnError> {
    if !spec.position.is_finite() {
        return Err(SpawnError::NonFinite { field: "position" });
    }
    if !spec.velocity.is_finite() {
        return Err(SpawnError::NonFinite { field: "velocity" });
    }
    if !spec.radius.is_finite() || spec.radius <= 0.0 {
        return Err(SpawnError::NonPositiveRadius(spec.radius));
    }
    if !spec.damage.is_finite() || spec.damage < 0.0 {
        return Err(SpawnError::NegativeDamage(spec.damage));
    }
    if !spec.lifetime.is_finite() || spec.lifetime < 0.0 {
        return Err(SpawnError::NegativeLifetime(spec.lifetime));
    }
    if let Some(radius) = spec.splash_radius {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(SpawnError::NonPositiveSplash(radius));
        }
    }
    if let Some(slow) = spec.slow {
        let factor_ok = slow.factor.is_finite() && slow.factor > 0.0 && slow.factor < 1.0;
        let duration_ok = slow.duration.is_finite() && slow.duration > 0.0;
        if !factor_ok || !duration_ok {
            return Err(SpawnError::InvalidSlow);
        }
    }
    if let Some(homing) = spec.homing {
        if !homing.turn_rate.is_finite() || homing.turn_rate <= 0.0 {
            return Err(SpawnError::NonPositiveTurnRate(homing.turn_rate));
        }
    }
    if spec.damage == 0.0 && spec.splash_radius.is_none() && spec.slow.is_none() {
        return Err(SpawnError::NoEffect);
    }
    Ok(())
}

fn validate_hostile_spec(spec: &HostileSpec) -> Result<(), SpawnError> {
    if !spec.position.is_finite() {
        return Err(SpawnError::NonFinite { field: "position" });
    }
    if !spec.radius.is_finite() || spec.radius <= 0.0 {
        return Err(SpawnError::NonPositiveRadius(spec.radius));
    }
    if !spec.health.is_finite() || spec.health <= 0.0 {
        return Err(SpawnError::NonPositiveHealth(spec.health));
    }
    Ok(())
}

/// Renderer-facing notification that a hostile died this frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeathCue {
    pub hostile: HostileId,
    pub position: Vec2,
    /// Reward actually credited, after the policy and the engine clamp
    pub bounty_credited: u32,
}

/// Running combat totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SimStats {
    pub damage_dealt: f32,
    pub kills: u32,
    pub currency_credited: u64,
    pub shots_fired: u64,
    pub hits_landed: u64,
    pub shots_expired: u64,
    pub shots_out_of_bounds: u64,
}

/// Pool buckets owned by the simulation itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimPoolKind {
    Projectile,
}

impl PoolKey for SimPoolKind {
    fn capacity(self) -> usize {
        match self {
            SimPoolKind::Projectile => pooling::PROJECTILE_CAP,
        }
    }
}

/// Read-only view of one frame's results, handed to the renderer
#[derive(Debug, Clone, Copy, Serialize)]
pub struct WorldSnapshot<'a> {
    pub hostiles: &'a [Hostile],
    pub projectiles: &'a [Projectile],
    pub events: &'a [CombatEvent],
    pub stats: &'a SimStats,
    pub tick: u64,
    pub now: f64,
}

/// Complete simulation state
///
/// The explicit value every frame mutates; there is no global state behind
/// it. Hostiles stay sorted by id so lookups are binary searches and frame
/// iteration order is deterministic.
#[derive(Debug)]
pub struct World {
    pub config: SimConfig,
    pub(crate) clock: FrameClock,
    pub(crate) hostiles: Vec<Hostile>,
    pub(crate) projectiles: Vec<Projectile>,
    /// Accepted shots waiting to go live at the next frame start
    pending_shots: Vec<Projectile>,
    pub(crate) grid: TargetGrid,
    pub(crate) log: CombatLog,
    pub(crate) death_cues: Vec<DeathCue>,
    pub(crate) projectile_pool: EntityPool<SimPoolKind, Projectile>,
    pub(crate) stats: SimStats,
    pub(crate) reward_policy: Box<dyn RewardPolicy>,
    timings: FrameTimings,
    next_hostile_id: u64,
    next_projectile_id: u64,
}

impl World {
    pub fn new(config: SimConfig) -> Self {
        let grid = TargetGrid::new(config.grid_cell_size);
        Self {
            config,
            clock: FrameClock::new(),
            hostiles: Vec::new(),
            projectiles: Vec::new(),
            pending_shots: Vec::new(),
            grid,
            log: CombatLog::new(),
            death_cues: Vec::new(),
            projectile_pool: EntityPool::new(),
            stats: SimStats::default(),
            reward_policy: Box::new(SoftCapPolicy::default()),
            timings: FrameTimings::new(),
            next_hostile_id: 0,
            next_projectile_id: 0,
        }
    }

    /// Replace the reward crediting policy
    pub fn set_reward_policy(&mut self, policy: Box<dyn RewardPolicy>) {
        self.reward_policy = policy;
    }

    /// Advance the simulation by one frame.
    ///
    /// Runs the full stage pipeline in order: pending spawns go live, motion
    /// integrates, the grid rebuilds, swept collisions resolve into ordered
    /// hits, damage applies, and the cleanup sweep removes what the frame
    /// marked. Entities are never removed mid-stage.
    pub fn update_frame(&mut self, raw_dt: f32, timestamp: f64) -> FrameContext {
        let step_started = Instant::now();
        let ctx = self.clock.advance(raw_dt, timestamp);

        self.projectiles.append(&mut self.pending_shots);

        systems::motion::update(self, ctx);

        self.grid.rebuild(
            self.hostiles
                .iter()
                .filter(|h| !h.dead)
                .map(|h| (h.id, h.position, h.radius)),
        );

        let hits = systems::collision::sweep(self);
        systems::damage::apply(self, &hits, ctx);
        systems::cleanup::sweep(self, ctx);

        self.timings.record(step_started.elapsed());
        ctx
    }

    /// Queue a projectile for the next frame. The id is allocated
    /// immediately; the projectile goes live when the frame steps.
    pub fn spawn_projectile(&mut self, spec: ProjectileSpec) -> Result<ProjectileId, SpawnError> {
        validate_projectile_spec(&spec)?;

        let id = ProjectileId(self.next_projectile_id);
        self.next_projectile_id += 1;

        let mut proj = self
            .projectile_pool
            .acquire(SimPoolKind::Projectile, Projectile::default);
        proj.id = id;
        proj.position = spec.position;
        proj.prev_position = spec.position;
        proj.velocity = spec.velocity;
        proj.radius = spec.radius;
        proj.damage = spec.damage;
        proj.pierce_left = spec.pierce;
        proj.splash_radius = spec.splash_radius;
        proj.slow = spec.slow;
        proj.homing = spec.homing;
        proj.lifetime = spec.lifetime;
        proj.fate = None;

        self.stats.shots_fired += 1;
        self.pending_shots.push(proj);
        Ok(id)
    }

    /// Add a hostile to the field
    pub fn spawn_hostile(&mut self, spec: HostileSpec) -> Result<HostileId, SpawnError> {
        validate_hostile_spec(&spec)?;

        let id = HostileId(self.next_hostile_id);
        self.next_hostile_id += 1;

        // Monotonic ids keep the push-at-end vector sorted
        self.hostiles.push(Hostile {
            position: spec.position,
            radius: spec.radius,
            health: spec.health,
            dead: false,
            slow_until: 0.0,
            slow_factor: 1.0,
            shielded: spec.shielded,
            reaped: false,
            id,
            max_health: spec.health,
            bounty: spec.bounty,
        });
        Ok(id)
    }

    /// Movement collaborator feed. Returns false for unknown ids, dead
    /// hostiles, or non-finite positions.
    pub fn set_hostile_position(&mut self, id: HostileId, position: Vec2) -> bool {
        if !position.is_finite() {
            warn!(hostile = id.0, "ignoring non-finite position update");
            return false;
        }
        match self.hostile_index(id) {
            Some(idx) if !self.hostiles[idx].dead => {
                self.hostiles[idx].position = position;
                true
            }
            _ => false,
        }
    }

    /// Renderer handshake: a dead hostile becomes removable at the next
    /// sweep once acknowledged. Returns false if the hostile is unknown,
    /// still alive, or already acknowledged.
    pub fn acknowledge_death(&mut self, id: HostileId) -> bool {
        match self.hostile_index(id) {
            Some(idx) if self.hostiles[idx].dead && !self.hostiles[idx].reaped => {
                self.hostiles[idx].reaped = true;
                true
            }
            _ => false,
        }
    }

    pub fn hostile(&self, id: HostileId) -> Option<&Hostile> {
        self.hostile_index(id).map(|idx| &self.hostiles[idx])
    }

    pub(crate) fn hostile_index(&self, id: HostileId) -> Option<usize> {
        self.hostiles.binary_search_by_key(&id, |h| h.id).ok()
    }

    pub fn hostiles(&self) -> &[Hostile] {
        &self.hostiles
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn live_hostile_count(&self) -> usize {
        self.hostiles.iter().filter(|h| !h.dead).count()
    }

    pub fn events(&self) -> &[CombatEvent] {
        self.log.events()
    }

    /// Append a collaborator-emitted event (heals, burns, xp pickups) at
    /// the current simulation time
    pub fn push_event(&mut self, kind: CombatEventKind, amount: f32, position: Vec2) {
        self.log.push(kind, amount, position, self.clock.now());
    }

    pub fn mark_events_displayed(&mut self) {
        self.log.mark_all_displayed();
    }

    /// Take this frame's death notifications
    pub fn drain_death_cues(&mut self) -> Vec<DeathCue> {
        std::mem::take(&mut self.death_cues)
    }

    pub fn snapshot(&self) -> WorldSnapshot<'_> {
        WorldSnapshot {
            hostiles: &self.hostiles,
            projectiles: &self.projectiles,
            events: self.log.events(),
            stats: &self.stats,
            tick: self.clock.tick(),
            now: self.clock.now(),
        }
    }

    pub fn stats(&self) -> &SimStats {
        &self.stats
    }

    pub fn grid_stats(&self) -> GridStats {
        self.grid.stats()
    }

    pub fn projectile_pool_stats(&self) -> PoolStats {
        self.projectile_pool.stats(SimPoolKind::Projectile)
    }

    pub fn timings(&self) -> &FrameTimings {
        &self.timings
    }

    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    pub fn tick(&self) -> u64 {
        self.clock.tick()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}

/// Binary-search lookup in an id-sorted hostile slice
pub(crate) fn find_hostile(hostiles: &[Hostile], id: HostileId) -> Option<&Hostile> {
    hostiles
        .binary_search_by_key(&id, |h| h.id)
        .ok()
        .map(|idx| &hostiles[idx])
}
