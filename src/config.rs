use serde::Serialize;

use crate::game::constants::{field, grid};
use crate::util::vec2::Vec2;

/// Simulation configuration
#[derive(Debug, Clone, Serialize)]
pub struct SimConfig {
    /// Playfield width in world units
    pub field_width: f32,
    /// Playfield height in world units
    pub field_height: f32,
    /// Margin beyond the field edge before projectiles count as gone
    pub out_of_bounds_margin: f32,
    /// Spatial grid cell size in world units
    pub grid_cell_size: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            field_width: field::WIDTH,
            field_height: field::HEIGHT,
            out_of_bounds_margin: field::OUT_OF_BOUNDS_MARGIN,
            grid_cell_size: grid::CELL_SIZE,
        }
    }
}

impl SimConfig {
    /// Load config from environment or use defaults
    pub fn load_or_default() -> Self {
        let mut config = Self::default();

        if let Ok(width) = std::env::var("FIELD_WIDTH") {
            if let Ok(parsed) = width.parse::<f32>() {
                if parsed.is_finite() && parsed > 0.0 {
                    config.field_width = parsed;
                } else {
                    tracing::warn!("FIELD_WIDTH must be > 0, using default");
                }
            } else {
                tracing::warn!("Invalid FIELD_WIDTH '{}', using default", width);
            }
        }

        if let Ok(height) = std::env::var("FIELD_HEIGHT") {
            if let Ok(parsed) = height.parse::<f32>() {
                if parsed.is_finite() && parsed > 0.0 {
                    config.field_height = parsed;
                } else {
                    tracing::warn!("FIELD_HEIGHT must be > 0, using default");
                }
            } else {
                tracing::warn!("Invalid FIELD_HEIGHT '{}', using default", height);
            }
        }

        if let Ok(margin) = std::env::var("OUT_OF_BOUNDS_MARGIN") {
            if let Ok(parsed) = margin.parse::<f32>() {
                if parsed.is_finite() && parsed >= 0.0 {
                    config.out_of_bounds_margin = parsed;
                } else {
                    tracing::warn!("OUT_OF_BOUNDS_MARGIN must be >= 0, using default");
                }
            } else {
                tracing::warn!("Invalid OUT_OF_BOUNDS_MARGIN '{}', using default", margin);
            }
        }

        if let Ok(cell) = std::env::var("GRID_CELL_SIZE") {
            if let Ok(parsed) = cell.parse::<f32>() {
                if parsed.is_finite() && parsed > 0.0 {
                    config.grid_cell_size = parsed;
                } else {
                    tracing::warn!("GRID_CELL_SIZE must be > 0, using default");
                }
            } else {
                tracing::warn!("Invalid GRID_CELL_SIZE '{}', using default", cell);
            }
        }

        config
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), String> {
        if !(self.field_width.is_finite() && self.field_width > 0.0) {
            return Err("field_width must be positive".to_string());
        }
        if !(self.field_height.is_finite() && self.field_height > 0.0) {
            return Err("field_height must be positive".to_string());
        }
        if !(self.out_of_bounds_margin.is_finite() && self.out_of_bounds_margin >= 0.0) {
            return Err("out_of_bounds_margin cannot be negative".to_string());
        }
        if !(self.grid_cell_size.is_finite() && self.grid_cell_size > 0.0) {
            return Err("grid_cell_size must be positive".to_string());
        }
        Ok(())
    }

    /// Whether a point is still inside the field plus the removal margin
    #[inline]
    pub fn in_bounds(&self, point: Vec2) -> bool {
        let m = self.out_of_bounds_margin;
        point.x >= -m
            && point.y >= -m
            && point.x <= self.field_width + m
            && point.y <= self.field_height + m
    }
}

/// Decides how much of a destroyed target's nominal bounty is credited.
///
/// The engine clamps whatever this returns into `0..=nominal`, so a policy
/// can shape the reward curve but never inflate it.
pub trait RewardPolicy: std::fmt::Debug {
    fn credit(&mut self, nominal: u32, ctx: &RewardContext) -> u32;
}

/// Running totals a policy may factor into its decision
#[derive(Debug, Clone, Copy)]
pub struct RewardContext {
    /// Currency credited over the whole run so far
    pub total_credited: u64,
    /// Kills over the whole run so far
    pub kills: u32,
}

/// Credits every bounty in full
#[derive(Debug, Clone, Copy, Default)]
pub struct FullBountyPolicy;

impl RewardPolicy for FullBountyPolicy {
    fn credit(&mut self, nominal: u32, _ctx: &RewardContext) -> u32 {
        nominal
    }
}

/// Full bounty below a total-earnings knee, a fixed fraction above it,
/// with a hard per-kill ceiling
#[derive(Debug, Clone, Copy)]
pub struct SoftCapPolicy {
    /// Total credited currency beyond which bounties are reduced
    pub knee: u64,
    /// Fraction of the bounty credited past the knee
    pub fraction: f32,
    /// Hard ceiling per kill
    pub per_kill_cap: u32,
}

impl Default for SoftCapPolicy {
    fn default() -> Self {
        Self {
            knee: 10_000,
            fraction: 0.5,
            per_kill_cap: 500,
        }
    }
}

impl RewardPolicy for SoftCapPolicy {
    fn credit(&mut self, nominal: u32, ctx: &RewardContext) -> u32 {
        let base = if ctx.total_credited < self.knee {
            nominal
        } else {
            (nominal as f32 * self.fraction).floor() as u32
        };
        base.min(self.per_kill_cap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SimConfig::default();
        assert_eq!(config.field_width, field::WIDTH);
        assert_eq!(config.field_height, field::HEIGHT);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_or_default() {
        let config = SimConfig::load_or_default();
        assert!(config.field_width > 0.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_dimensions() {
        let mut config = SimConfig::default();
        config.field_width = 0.0;
        assert!(config.validate().is_err());

        config = SimConfig::default();
        config.grid_cell_size = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_in_bounds_includes_margin() {
        let config = SimConfig::default();
        assert!(config.in_bounds(Vec2::new(0.0, 0.0)));
        assert!(config.in_bounds(Vec2::new(-config.out_of_bounds_margin / 2.0, 10.0)));
        assert!(!config.in_bounds(Vec2::new(
            config.field_width + config.out_of_bounds_margin + 1.0,
            10.0
        )));
    }

    #[test]
    fn test_full_bounty_policy() {
        let mut policy = FullBountyPolicy;
        let ctx = RewardContext {
            total_credited: 0,
            kills: 0,
        };
        assert_eq!(policy.credit(75, &ctx), 75);
    }

    #[test]
    fn test_soft_cap_below_knee_pays_full() {
        let mut policy = SoftCapPolicy::default();
        let ctx = RewardContext {
            total_credited: 0,
            kills: 0,
        };
        assert_eq!(policy.credit(100, &ctx), 100);
    }

    #[test]
    fn test_soft_cap_past_knee_pays_fraction() {
        let mut policy = SoftCapPolicy {
            knee: 1000,
            fraction: 0.5,
            per_kill_cap: 500,
        };
        let ctx = RewardContext {
            total_credited: 2000,
            kills: 40,
        };
        assert_eq!(policy.credit(100, &ctx), 50);
    }

    #[test]
    fn test_soft_cap_per_kill_ceiling() {
        let mut policy = SoftCapPolicy {
            knee: 1000,
            fraction: 0.5,
            per_kill_cap: 30,
        };
        let ctx = RewardContext {
            total_credited: 0,
            kills: 0,
        };
        assert_eq!(policy.credit(100, &ctx), 30);
    }
}
