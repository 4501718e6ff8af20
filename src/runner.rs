//! Async tick runner - drives a `GameLoop` at the fixed simulation rate.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::time::{interval, Instant};
use tracing::{info, warn};

use crate::game::game_loop::GameLoop;
use crate::game::performance::PerformanceStatus;

/// Snapshot of runner progress, shared with observers outside the loop.
#[derive(Debug, Clone, Default)]
pub struct RunnerStats {
    pub ticks: u64,
    pub live_entities: usize,
    pub budget_usage_percent: f32,
}

/// Drives the game loop at the configured rate until `shutdown` resolves.
///
/// Missed ticks are skipped, not replayed: after a stall the simulation
/// continues at the nominal cadence instead of bursting to catch up.
pub async fn run(
    mut game: GameLoop,
    tick_rate: u32,
    stats: Arc<RwLock<RunnerStats>>,
    shutdown: impl Future<Output = ()>,
) -> GameLoop {
    let tick_duration = Duration::from_millis(1000 / tick_rate as u64);
    let mut ticker = interval(tick_duration);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    info!("Tick loop started at {} Hz", tick_rate);
    let start = Instant::now();
    let mut tick_count: u64 = 0;

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Tick loop stopping after {} ticks", tick_count);
                break;
            }
            _ = ticker.tick() => {
                tick_count += 1;
                game.tick();

                {
                    let mut stats = stats.write();
                    stats.ticks = tick_count;
                    stats.live_entities = game.world().live_count();
                    stats.budget_usage_percent = game.performance().budget_usage_percent();
                }

                // Log stats periodically (every 30 seconds)
                if tick_count % (tick_rate as u64 * 30) == 0 {
                    let elapsed = start.elapsed().as_secs();
                    info!(
                        "Arena: {}s, tick {}, {} entities | Perf: {}",
                        elapsed,
                        game.world().current_tick(),
                        game.world().live_count(),
                        game.performance().status_message(),
                    );
                    if !matches!(
                        game.performance().status(),
                        PerformanceStatus::Excellent | PerformanceStatus::Good
                    ) {
                        warn!(
                            "Tick budget under pressure: p95 {:?}",
                            game.performance().p95_tick_duration()
                        );
                    }
                }
            }
        }
    }

    game
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;

    fn test_config() -> SimConfig {
        SimConfig {
            arena_half_extent: 1000.0,
            arena_padding: 100.0,
            capacity: 64,
            tick_rate: 25,
            rng_seed: Some(5),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_runner_ticks_until_shutdown() {
        let mut game = GameLoop::new(&test_config());
        let id = game.world_mut().spawn();
        {
            let entity = &mut game.world_mut()[id];
            entity.physics.set_sides(3);
            entity.physics.set_size(10.0);
            entity.is_viewed = true;
            entity.set_velocity(0.0, 5.0);
        }

        let stats = Arc::new(RwLock::new(RunnerStats::default()));
        let game = run(
            game,
            25,
            stats.clone(),
            tokio::time::sleep(Duration::from_millis(400)),
        )
        .await;

        let stats = stats.read();
        assert!(stats.ticks >= 5);
        assert_eq!(stats.ticks, game.world().current_tick());
        // The seeded velocity actually moved the entity.
        assert!(game.world()[id].position.x() > 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_runner_returns_loop_on_shutdown() {
        let game = GameLoop::new(&test_config());
        let stats = Arc::new(RwLock::new(RunnerStats::default()));

        let game = run(
            game,
            25,
            stats,
            tokio::time::sleep(Duration::from_millis(80)),
        )
        .await;

        // Arena token survives the whole run.
        assert!(game.world().live_count() >= 1);
    }
}
