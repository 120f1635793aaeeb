//! Holdout Sim Library
//!
//! Deterministic collision and pooling core for a wave-based arcade
//! defense game. Projectiles are tested against the segment they travel
//! each frame so high velocities cannot tunnel, hits resolve in path
//! order, and removal happens in exactly one place per frame.

pub mod config;
pub mod util;
pub mod game;
