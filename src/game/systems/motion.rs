//! Projectile motion: homing steer, integration, lifetime and bounds
//!
//! Runs before collision so every projectile has a clean
//! `prev_position -> position` segment for the sweep to test.

use crate::game::frame::FrameContext;
use crate::game::state::{find_hostile, Hostile, ProjectileFate, World};

/// Integrate all live projectiles one frame
pub fn update(world: &mut World, ctx: FrameContext) {
    let World {
        config,
        hostiles,
        projectiles,
        stats,
        ..
    } = world;
    let hostiles: &[Hostile] = hostiles;

    for proj in projectiles.iter_mut() {
        if proj.fate.is_some() {
            continue;
        }

        proj.prev_position = proj.position;

        // Bounded-turn steer toward a live homing target
        if let Some(homing) = proj.homing {
            match find_hostile(hostiles, homing.target) {
                Some(target) if !target.dead => {
                    let desired = target.position - proj.position;
                    if desired.length_sq() > 0.0 && proj.velocity.length_sq() > 0.0 {
                        let turn = proj.velocity.angle_to(desired);
                        let max_turn = homing.turn_rate * ctx.dt;
                        proj.velocity = proj.velocity.rotate(turn.clamp(-max_turn, max_turn));
                    }
                }
                // Target gone: keep the last heading and fly straight
                _ => proj.homing = None,
            }
        }

        proj.position += proj.velocity * ctx.dt;

        proj.lifetime -= ctx.dt;
        if proj.is_expired() {
            proj.fate = Some(ProjectileFate::Expired);
            stats.shots_expired += 1;
            continue;
        }

        if !config.in_bounds(proj.position) {
            proj.fate = Some(ProjectileFate::OutOfBounds);
            stats.shots_out_of_bounds += 1;
        }
    }
}
