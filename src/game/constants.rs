/// Frame stepping constants
pub mod frame {
    /// Target frame duration in seconds (60 Hz render cadence)
    pub const TARGET_DT: f32 = 1.0 / 60.0;
    /// Maximum delta time accepted for one step, in seconds
    /// Longer wall-clock gaps (pauses, debugger stops) are clamped to this
    /// so integration distances stay bounded
    pub const MAX_DELTA: f32 = 0.1;
    /// Target frame budget in milliseconds (observability threshold)
    pub const BUDGET_MS: f32 = 16.0;
    /// Rolling window length for frame timing statistics
    pub const TIMING_WINDOW: usize = 120;
}

/// Playfield constants
pub mod field {
    /// Default playfield width in world units
    pub const WIDTH: f32 = 1280.0;
    /// Default playfield height in world units
    pub const HEIGHT: f32 = 720.0;
    /// Margin beyond the playfield edge before a projectile counts as gone
    /// Lets shots visibly leave the screen instead of popping at the border
    pub const OUT_OF_BOUNDS_MARGIN: f32 = 64.0;
}

/// Spatial grid constants
pub mod grid {
    /// Cell edge length in world units
    /// Sized so a typical query radius touches at most the 3x3 neighborhood
    pub const CELL_SIZE: f32 = 64.0;
    /// Initial capacity of each cell's entry vector
    pub const CELL_CAPACITY: usize = 8;
    /// Initial capacity of the cell map
    pub const INITIAL_CELLS: usize = 64;
}

/// Combat resolution constants
pub mod combat {
    /// Fraction of direct damage dealt to splash victims
    pub const SPLASH_DAMAGE_FACTOR: f32 = 0.5;
    /// Seconds a combat event stays in the log before pruning
    /// Matches the on-screen float-and-fade duration of damage text
    pub const EVENT_DISPLAY_WINDOW: f64 = 2.0;
    /// Default projectile lifetime in seconds
    pub const DEFAULT_LIFETIME: f32 = 8.0;
    /// Segment lengths below this are treated as stationary for sweep tests
    pub const SWEEP_EPSILON: f32 = 1e-6;
}

/// Pooling constants
pub mod pooling {
    /// Free-list cap for pooled simulation projectiles
    /// Releases beyond this are discarded rather than retained
    pub const PROJECTILE_CAP: usize = 256;
    /// Fallback cap for pool kinds that do not specify one
    pub const DEFAULT_CAP: usize = 128;
    /// Inline capacity of per-frame hit buffers before they spill to the heap
    pub const HIT_BUFFER_INLINE: usize = 8;
}

/// Splash damage for a given direct-hit amount
#[inline]
pub fn splash_damage(direct: f32) -> f32 {
    (direct * combat::SPLASH_DAMAGE_FACTOR).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_bounds_ordering() {
        assert!(frame::TARGET_DT < frame::MAX_DELTA);
        assert!(frame::MAX_DELTA < 1.0);
        assert!(frame::TIMING_WINDOW > 0);
    }

    #[test]
    fn test_splash_factor_is_a_fraction() {
        assert!(combat::SPLASH_DAMAGE_FACTOR > 0.0);
        assert!(combat::SPLASH_DAMAGE_FACTOR < 1.0);
    }

    #[test]
    fn test_splash_damage_halves() {
        assert!((splash_damage(10.0) - 5.0).abs() < 0.001);
        assert_eq!(splash_damage(0.0), 0.0);
    }

    #[test]
    fn test_splash_damage_never_negative() {
        assert_eq!(splash_damage(-4.0), 0.0);
    }

    #[test]
    fn test_grid_cell_size_positive() {
        assert!(grid::CELL_SIZE > 0.0);
        assert!(grid::CELL_CAPACITY > 0);
    }

    #[test]
    fn test_field_larger_than_margin() {
        assert!(field::WIDTH > field::OUT_OF_BOUNDS_MARGIN * 2.0);
        assert!(field::HEIGHT > field::OUT_OF_BOUNDS_MARGIN * 2.0);
    }

    #[test]
    fn test_pool_caps_nonzero() {
        assert!(pooling::PROJECTILE_CAP > 0);
        assert!(pooling::DEFAULT_CAP > 0);
    }
}
