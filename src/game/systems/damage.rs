//! Hit application: health, slows, splash, deaths, and pierce budgets
//!
//! Consumes the ordered hit lists the collision stage produced. Hostiles
//! are only ever marked dead here, never removed; the cleanup sweep owns
//! removal.

use tracing::debug;

use crate::config::RewardContext;
use crate::game::constants::splash_damage;
use crate::game::events::CombatEventKind;
use crate::game::frame::FrameContext;
use crate::game::state::{DeathCue, HostileId, ProjectileFate, SlowEffect, World};
use crate::game::systems::collision::ProjectileHits;
use crate::util::vec2::Vec2;

/// Apply every projectile's hits in path order
pub fn apply(world: &mut World, frame_hits: &[ProjectileHits], ctx: FrameContext) {
    for batch in frame_hits {
        for candidate in batch.hits.iter() {
            if world.projectiles[batch.shooter].fate.is_some() {
                break;
            }

            let target_idx = match world.hostile_index(candidate.target) {
                Some(idx) => idx,
                None => continue,
            };
            // An earlier hit this frame may have killed or tagged it
            if world.hostiles[target_idx].dead {
                continue;
            }
            if world.projectiles[batch.shooter].has_hit(candidate.target) {
                continue;
            }

            // Shielded targets pass the projectile through untouched:
            // no damage, no pierce spent, no hit-set entry
            if world.hostiles[target_idx].shielded {
                let position = world.hostiles[target_idx].position;
                world.log.push(CombatEventKind::Immune, 0.0, position, ctx.now);
                continue;
            }

            let (nominal, slow, splash) = {
                let proj = &world.projectiles[batch.shooter];
                (proj.damage, proj.slow, proj.splash_radius)
            };

            damage_and_slow(world, target_idx, nominal, slow, ctx);
            world.stats.hits_landed += 1;
            world.projectiles[batch.shooter]
                .hit_targets
                .insert(candidate.target);

            if let Some(radius) = splash {
                let center = world.hostiles[target_idx].position;
                apply_splash(world, center, candidate.target, nominal, slow, radius, ctx);
            }

            if world.hostiles[target_idx].health <= 0.0 && !world.hostiles[target_idx].dead {
                settle_death(world, target_idx, ctx);
            }

            let proj = &mut world.projectiles[batch.shooter];
            if proj.pierce_left == 0 {
                proj.fate = Some(ProjectileFate::Consumed);
            } else {
                proj.pierce_left -= 1;
            }
        }
    }
}

/// Health subtraction, damage event, and slow bookkeeping for one target.
///
/// Events and the damage total always carry the nominal amount, even when
/// the subtraction clamps at zero health.
fn damage_and_slow(
    world: &mut World,
    target_idx: usize,
    amount: f32,
    slow: Option<SlowEffect>,
    ctx: FrameContext,
) {
    let position = world.hostiles[target_idx].position;

    let hostile = &mut world.hostiles[target_idx];
    hostile.health = (hostile.health - amount).max(0.0);
    world.stats.damage_dealt += amount;
    world.log.push(CombatEventKind::Damage, amount, position, ctx.now);

    if let Some(slow) = slow {
        let hostile = &mut world.hostiles[target_idx];
        // Re-application extends, never shortens; the factor is replaced
        let extended = ctx.now + f64::from(slow.duration);
        hostile.slow_until = hostile.slow_until.max(extended);
        hostile.slow_factor = slow.factor;
        world.log.push(CombatEventKind::Freeze, 0.0, position, ctx.now);
    }
}

/// Area pass around a direct hit. Victims take half the nominal damage
/// plus the same slow, and can die from it, but are never recorded in the
/// projectile's hit set.
fn apply_splash(
    world: &mut World,
    center: Vec2,
    direct_target: HostileId,
    nominal: f32,
    slow: Option<SlowEffect>,
    radius: f32,
    ctx: FrameContext,
) {
    let amount = splash_damage(nominal);
    if amount <= 0.0 && slow.is_none() {
        return;
    }

    // Collect ids first; applying damage below mutates the hostiles
    let victims: Vec<HostileId> = world
        .grid
        .query_radius(center, radius)
        .filter(|entry| entry.id != direct_target)
        .filter(|entry| entry.position.distance_sq_to(center) <= radius * radius)
        .map(|entry| entry.id)
        .collect();

    for victim in victims {
        let target_idx = match world.hostile_index(victim) {
            Some(idx) => idx,
            None => continue,
        };
        let hostile = &world.hostiles[target_idx];
        if hostile.dead || hostile.shielded {
            continue;
        }

        damage_and_slow(world, target_idx, amount, slow, ctx);
        if world.hostiles[target_idx].health <= 0.0 {
            settle_death(world, target_idx, ctx);
        }
    }
}

/// The single place a hostile transitions to dead. Credits the reward
/// through the active policy, clamped to the nominal bounty.
fn settle_death(world: &mut World, target_idx: usize, ctx: FrameContext) {
    let (id, position, bounty) = {
        let hostile = &mut world.hostiles[target_idx];
        hostile.dead = true;
        (hostile.id, hostile.position, hostile.bounty)
    };

    let reward_ctx = RewardContext {
        total_credited: world.stats.currency_credited,
        kills: world.stats.kills,
    };
    let credited = world.reward_policy.credit(bounty, &reward_ctx).min(bounty);

    world.stats.kills += 1;
    world.stats.currency_credited += u64::from(credited);
    world
        .log
        .push(CombatEventKind::Currency, credited as f32, position, ctx.now);
    world.death_cues.push(DeathCue {
        hostile: id,
        position,
        bounty_credited: credited,
    });

    debug!(hostile = id.0, credited, "hostile destroyed");
}
