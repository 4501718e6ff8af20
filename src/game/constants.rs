/// Physics constants - CRITICAL: FRICTION is a per-tick coefficient applied
/// against the current velocity, NOT a multiplicative decay factor.
pub mod physics {
    /// Friction coefficient: each tick an opposing acceleration of
    /// `speed * FRICTION` is applied along the current heading.
    pub const FRICTION: f32 = 0.1;
    /// Speeds below this snap to exactly zero after integration,
    /// preventing asymptotic creep.
    pub const VELOCITY_SNAP: f32 = 0.01;
    /// Entities mid-deletion-animation move at half speed.
    pub const DYING_SPEED_FACTOR: f32 = 0.5;
    /// Acceleration damp applied when running into walls or bases.
    /// The knockback impulse is scaled up by the inverse.
    pub const WALL_ACCEL_DAMP: f32 = 0.3;
    /// Server tick rate in Hz
    pub const TICK_RATE: u32 = 25;
    /// Tick duration in milliseconds
    pub const TICK_DURATION_MS: u64 = 1000 / TICK_RATE as u64;
}

/// Deletion animation constants
pub mod animation {
    /// Frame the animation starts on; it counts down to 0, then -1 (terminal).
    pub const START_FRAME: i32 = 5;
    /// Opacity lost per animation frame.
    pub const OPACITY_STEP: f32 = 1.0 / 6.0;
    /// Size growth factor per animation frame (dying entities swell).
    pub const SIZE_GROWTH: f32 = 1.1;
}

/// Spatial index (quadtree) constants
pub mod spatial {
    /// A leaf subdivides when it holds exactly this many objects.
    pub const SPLIT_OBJECTS: usize = 5;
    /// Nodes deeper than this never subdivide, bounding tree height.
    pub const MAX_SPLIT_DEPTH: u32 = 9;
}

/// Arena defaults (overridable via SimConfig / environment)
pub mod arena {
    /// Default half-extent of the square arena on both axes.
    pub const DEFAULT_HALF_EXTENT: f32 = 11_150.0;
    /// Default margin beyond nominal bounds within which entities may
    /// still roam before being clamped.
    pub const DEFAULT_PADDING: f32 = 200.0;
    /// Default entity slot capacity.
    pub const DEFAULT_CAPACITY: usize = 16_384;
}

/// Acceleration per tick required to hold a steady speed against friction.
///
/// Friction removes `speed * FRICTION` each tick, so feeding the same
/// amount back converges velocity onto `max_speed`.
#[inline]
pub fn maintain_accel(max_speed: f32) -> f32 {
    max_speed * physics::FRICTION
}

/// Steady-state speed reached when `accel` is applied every tick.
#[inline]
pub fn steady_speed(accel: f32) -> f32 {
    accel / physics::FRICTION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_friction_snap_relationship() {
        // The snap threshold must be far below any speed friction alone
        // could hold, or entities would stutter at low speeds.
        assert!(physics::VELOCITY_SNAP < physics::FRICTION);
        assert!(physics::FRICTION > 0.0 && physics::FRICTION < 1.0);
    }

    #[test]
    fn test_tick_rate() {
        assert_eq!(physics::TICK_RATE, 25);
        assert_eq!(physics::TICK_DURATION_MS, 40);
    }

    #[test]
    fn test_animation_covers_full_opacity() {
        // Six frames of fading (including the entry knock-down) reach zero.
        let total = animation::OPACITY_STEP * 6.0;
        assert!((total - 1.0).abs() < 1e-6);
        assert_eq!(animation::START_FRAME, 5);
        assert!(animation::SIZE_GROWTH > 1.0);
    }

    #[test]
    fn test_spatial_constants() {
        assert_eq!(spatial::SPLIT_OBJECTS, 5);
        assert_eq!(spatial::MAX_SPLIT_DEPTH, 9);
    }

    #[test]
    fn test_maintain_steady_roundtrip() {
        let accel = maintain_accel(300.0);
        assert!((accel - 30.0).abs() < 1e-6);
        assert!((steady_speed(accel) - 300.0).abs() < 1e-4);
    }

    #[test]
    fn test_arena_defaults_sane() {
        assert!(arena::DEFAULT_PADDING > 0.0);
        assert!(arena::DEFAULT_HALF_EXTENT > arena::DEFAULT_PADDING);
        assert!(arena::DEFAULT_CAPACITY > 0);
    }
}
