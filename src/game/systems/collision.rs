//! Swept projectile-versus-hostile narrow phase
//!
//! Fast projectiles cross several cells in one frame, so contacts are
//! resolved against the segment each projectile traveled this frame, not
//! its final position. No entity is mutated here; the stage only produces
//! an ordered hit list for the damage stage to apply.

use smallvec::SmallVec;

use crate::game::constants::{combat, pooling};
use crate::game::state::{HostileId, World};
use crate::util::vec2::Vec2;

/// One contact along a projectile's frame segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitCandidate {
    pub target: HostileId,
    /// Entry parameter along the segment, in [0, 1]
    pub t: f32,
}

/// Every contact one projectile makes this frame, in path order
#[derive(Debug)]
pub struct ProjectileHits {
    /// Index into the frame's projectile vector
    pub shooter: usize,
    pub hits: SmallVec<[HitCandidate; pooling::HIT_BUFFER_INLINE]>,
}

/// Earliest contact of a circle swept along `p0 -> p1` against a
/// stationary circle at `center`.
///
/// Returns the entry parameter in [0, 1], or 0 when the sweep starts
/// already overlapping. Segments shorter than the sweep epsilon degrade
/// to a plain containment test.
pub fn sweep_circle(p0: Vec2, p1: Vec2, center: Vec2, combined_radius: f32) -> Option<f32> {
    let d = p1 - p0;
    let f = p0 - center;
    let r2 = combined_radius * combined_radius;

    if d.length_sq() < combat::SWEEP_EPSILON * combat::SWEEP_EPSILON {
        return (f.length_sq() <= r2).then_some(0.0);
    }

    let a = d.dot(d);
    let b = 2.0 * f.dot(d);
    let c = f.dot(f) - r2;

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }

    let sqrt_disc = discriminant.sqrt();
    let t_enter = (-b - sqrt_disc) / (2.0 * a);
    let t_exit = (-b + sqrt_disc) / (2.0 * a);

    if (0.0..=1.0).contains(&t_enter) {
        Some(t_enter)
    } else if t_enter < 0.0 && t_exit >= 0.0 {
        // Started inside the circle
        Some(0.0)
    } else {
        None
    }
}

/// Gather contacts for every live projectile, each list sorted by entry
/// time with ids breaking exact ties.
///
/// Candidates are deliberately not truncated to the pierce budget here: a
/// shielded target early on the path passes the projectile through, so a
/// target behind it must stay in the list.
pub fn sweep(world: &World) -> Vec<ProjectileHits> {
    let mut frame_hits = Vec::new();

    for (idx, proj) in world.projectiles.iter().enumerate() {
        if proj.fate.is_some() {
            continue;
        }

        let p0 = proj.prev_position;
        let p1 = proj.position;

        let mut hits: SmallVec<[HitCandidate; pooling::HIT_BUFFER_INLINE]> = SmallVec::new();
        for entry in world.grid.query_segment(p0, p1, proj.radius) {
            if proj.has_hit(entry.id) {
                continue;
            }
            if let Some(t) = sweep_circle(p0, p1, entry.position, proj.radius + entry.radius) {
                hits.push(HitCandidate {
                    target: entry.id,
                    t,
                });
            }
        }

        if hits.is_empty() {
            continue;
        }

        hits.sort_by(|lhs, rhs| {
            lhs.t
                .partial_cmp(&rhs.t)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(lhs.target.cmp(&rhs.target))
        });

        frame_hits.push(ProjectileHits {
            shooter: idx,
            hits,
        });
    }

    frame_hits
}
