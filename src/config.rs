use thiserror::Error;

use crate::game::constants::{arena, physics};

/// Simulation configuration
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Half-extent of the square arena on both axes
    pub arena_half_extent: f32,
    /// Margin beyond the nominal bounds within which entities may roam
    pub arena_padding: f32,
    /// Entity slot capacity (hard limit, spawning past it panics)
    pub capacity: usize,
    /// Simulation tick rate in Hz
    pub tick_rate: u32,
    /// Fixed RNG seed for reproducible runs; None seeds from entropy
    pub rng_seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            arena_half_extent: arena::DEFAULT_HALF_EXTENT,
            arena_padding: arena::DEFAULT_PADDING,
            capacity: arena::DEFAULT_CAPACITY,
            tick_rate: physics::TICK_RATE,
            rng_seed: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("arena_half_extent must be positive, got {0}")]
    InvalidArenaSize(f32),
    #[error("arena_padding cannot be negative, got {0}")]
    InvalidPadding(f32),
    #[error("capacity must be at least 1")]
    ZeroCapacity,
    #[error("tick_rate must be 1-1000, got {0}")]
    InvalidTickRate(u32),
}

impl SimConfig {
    /// Load config from environment or use defaults
    pub fn load_or_default() -> Self {
        let mut config = Self::default();

        if let Ok(extent) = std::env::var("ARENA_HALF_EXTENT") {
            if let Ok(parsed) = extent.parse::<f32>() {
                if parsed > 0.0 {
                    config.arena_half_extent = parsed;
                } else {
                    tracing::warn!("ARENA_HALF_EXTENT must be > 0, using default");
                }
            } else {
                tracing::warn!("Invalid ARENA_HALF_EXTENT '{}', using default", extent);
            }
        }

        if let Ok(padding) = std::env::var("ARENA_PADDING") {
            if let Ok(parsed) = padding.parse::<f32>() {
                if parsed >= 0.0 {
                    config.arena_padding = parsed;
                } else {
                    tracing::warn!("ARENA_PADDING cannot be negative, using default");
                }
            } else {
                tracing::warn!("Invalid ARENA_PADDING '{}', using default", padding);
            }
        }

        if let Ok(capacity) = std::env::var("ENTITY_CAPACITY") {
            if let Ok(parsed) = capacity.parse::<usize>() {
                if parsed > 0 {
                    config.capacity = parsed;
                } else {
                    tracing::warn!("ENTITY_CAPACITY must be > 0, using default");
                }
            } else {
                tracing::warn!("Invalid ENTITY_CAPACITY '{}', using default", capacity);
            }
        }

        if let Ok(rate) = std::env::var("TICK_RATE") {
            if let Ok(parsed) = rate.parse::<u32>() {
                if parsed > 0 {
                    config.tick_rate = parsed;
                } else {
                    tracing::warn!("TICK_RATE must be > 0, using default");
                }
            } else {
                tracing::warn!("Invalid TICK_RATE '{}', using default", rate);
            }
        }

        if let Ok(seed) = std::env::var("RNG_SEED") {
            if let Ok(parsed) = seed.parse::<u64>() {
                config.rng_seed = Some(parsed);
            } else {
                tracing::warn!("Invalid RNG_SEED '{}', seeding from entropy", seed);
            }
        }

        config
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.arena_half_extent <= 0.0 {
            return Err(ConfigError::InvalidArenaSize(self.arena_half_extent));
        }
        if self.arena_padding < 0.0 {
            return Err(ConfigError::InvalidPadding(self.arena_padding));
        }
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.tick_rate == 0 || self.tick_rate > 1000 {
            return Err(ConfigError::InvalidTickRate(self.tick_rate));
        }
        Ok(())
    }
}
