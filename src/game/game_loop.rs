//! Ties one world to its command queue and performance monitor.
//!
//! `GameLoop::tick` is the synchronous unit of simulation; the async runner
//! calls it on the fixed-rate schedule, but tests and benchmarks drive it
//! directly.

use crate::config::SimConfig;
use crate::game::commands::{CommandQueue, CommandSender};
use crate::game::performance::PerformanceMonitor;
use crate::game::world::{TickEvent, World};

pub struct GameLoop {
    world: World,
    commands: CommandQueue,
    performance: PerformanceMonitor,
}

impl GameLoop {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            world: World::new(config),
            commands: CommandQueue::default(),
            performance: PerformanceMonitor::new(config.tick_rate),
        }
    }

    /// One full tick: drain queued commands, step the world, surface the
    /// structural events, all under the performance timer.
    pub fn tick(&mut self) -> Vec<TickEvent> {
        self.performance.tick_start();
        self.commands.apply_all(&mut self.world);
        self.world.tick();
        let events = self.world.take_events();
        self.performance.tick_end(self.world.live_count());
        events
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Producer handle for threads outside the tick loop.
    pub fn command_sender(&self) -> CommandSender {
        self.commands.sender()
    }

    pub fn performance(&self) -> &PerformanceMonitor {
        &self.performance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::commands::Command;

    fn test_config() -> SimConfig {
        SimConfig {
            arena_half_extent: 1000.0,
            arena_padding: 100.0,
            capacity: 64,
            tick_rate: 25,
            rng_seed: Some(9),
        }
    }

    #[test]
    fn test_commands_land_before_integration() {
        let mut game = GameLoop::new(&test_config());
        let id = game.world_mut().spawn();
        {
            let entity = &mut game.world_mut()[id];
            entity.physics.set_sides(3);
            entity.physics.set_size(10.0);
            entity.is_viewed = true;
        }

        let sender = game.command_sender();
        sender
            .try_send(Command::SetVelocity {
                target: id,
                angle: 0.0,
                magnitude: 10.0,
            })
            .unwrap();

        // The queued velocity applies at the top of this tick, so the entity
        // has already moved by the end of it.
        game.tick();
        assert!(game.world()[id].position.x() > 0.0);
    }

    #[test]
    fn test_tick_surfaces_events() {
        let mut game = GameLoop::new(&test_config());
        let id = game.world_mut().spawn();

        let sender = game.command_sender();
        sender
            .try_send(Command::Destroy {
                target: id,
                animate: false,
            })
            .unwrap();

        let events = game.tick();
        assert!(events.contains(&TickEvent::Freed(id)));
    }

    #[test]
    fn test_performance_samples_accumulate() {
        let mut game = GameLoop::new(&test_config());
        for _ in 0..5 {
            game.tick();
        }
        // Arena token only.
        assert_eq!(game.performance().last_entity_count(), 1);
    }
}
