mod config;
mod game;
mod runner;
mod util;

use std::f32::consts::TAU;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::SimConfig;
use crate::game::constants::maintain_accel;
use crate::game::fields::{Color, ObjectFlags};
use crate::game::game_loop::GameLoop;
use crate::game::world::World;
use crate::runner::RunnerStats;

/// Populates a fresh arena: a ring of drifting polygons around the center
/// and a square of walls guarding it.
fn seed_arena(world: &mut World, polygons: usize) {
    let spread = world.bounds().right_x * 0.6;
    for i in 0..polygons {
        let id = world.spawn();
        let angle = i as f32 / polygons as f32 * TAU;
        let radius = spread * (0.2 + 0.75 * ((i * 7 % polygons) as f32 / polygons as f32));
        let entity = &mut world[id];
        entity.physics.set_sides(3 + (i % 3) as u32 * 2);
        entity.physics.set_size(25.0 + (i % 5) as f32 * 10.0);
        entity.style.set_color(match i % 3 {
            0 => Color::EnemyTriangle,
            1 => Color::EnemyPentagon,
            _ => Color::EnemySquare,
        });
        entity.set_position(angle.cos() * radius, angle.sin() * radius);
        entity.is_viewed = true;
        entity.set_velocity(angle + TAU / 4.0, 3.0);
        entity.add_acceleration(angle + TAU / 4.0, maintain_accel(3.0), false);
    }

    let wall_offset = world.bounds().right_x * 0.25;
    for (x, y, size, width) in [
        (0.0, -wall_offset, 800.0, 160.0),
        (0.0, wall_offset, 800.0, 160.0),
        (-wall_offset, 0.0, 160.0, 800.0),
        (wall_offset, 0.0, 160.0, 800.0),
    ] {
        let id = world.spawn();
        let entity = &mut world[id];
        entity.physics.set_sides(2);
        entity.physics.set_size(size);
        entity.physics.set_width(width);
        entity.physics.set_push_factor(2.0);
        entity.physics.set_object_flag(ObjectFlags::WALL, true);
        entity.style.set_color(Color::Box);
        entity.set_position(x, y);
        entity.is_viewed = true;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .init();

    info!("Polyarena Server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = SimConfig::load_or_default();
    config.validate()?;
    info!(
        "Configuration loaded: arena ±{} (+{} padding), capacity {}, {} Hz",
        config.arena_half_extent, config.arena_padding, config.capacity, config.tick_rate
    );

    let mut game = GameLoop::new(&config);
    let polygons: usize = std::env::var("SEED_POLYGONS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(64);
    seed_arena(game.world_mut(), polygons);
    info!(
        "Arena {} seeded with {} entities",
        game.world().uuid(),
        game.world().live_count()
    );

    let stats = Arc::new(RwLock::new(RunnerStats::default()));

    // Shutdown signal handler
    let shutdown = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
        info!("Shutdown signal received");
    };

    let game = runner::run(game, config.tick_rate, stats.clone(), shutdown).await;

    let stats = stats.read();
    info!(
        "Server stopped after {} ticks, {} entities live",
        stats.ticks,
        game.world().live_count()
    );

    Ok(())
}
