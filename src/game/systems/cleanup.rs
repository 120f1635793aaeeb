//! End-of-frame removal sweep
//!
//! The only stage allowed to remove entities. Fated projectiles go back to
//! the pool in spawn order, hostiles leave once dead and acknowledged, and
//! expired combat events are pruned.

use crate::game::frame::FrameContext;
use crate::game::state::{SimPoolKind, World};

pub fn sweep(world: &mut World, ctx: FrameContext) {
    // Shift-removal keeps the survivors in spawn order, which later
    // frames rely on for deterministic iteration
    let mut idx = 0;
    while idx < world.projectiles.len() {
        if world.projectiles[idx].fate.is_some() {
            let proj = world.projectiles.remove(idx);
            world.projectile_pool.release(SimPoolKind::Projectile, proj);
        } else {
            idx += 1;
        }
    }

    world.hostiles.retain(|h| !(h.dead && h.reaped));

    world.log.prune(ctx.now);
}
