//! Lock-free command queue feeding the simulation.
//!
//! Uses crossbeam-channel for lock-free MPSC communication from outside
//! threads (network handlers, admin tooling) to the tick loop, which drains
//! everything pending at the start of each tick.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use tracing::debug;

use crate::game::entity::EntityId;
use crate::game::world::World;

/// A mutation requested from outside the tick loop, applied at the start of
/// the next tick. Every command targets an entity by handle; stale handles
/// are dropped silently when applied.
#[derive(Debug, Clone, Copy)]
pub enum Command {
    /// Override the target's velocity (heading in radians, magnitude).
    SetVelocity {
        target: EntityId,
        angle: f32,
        magnitude: f32,
    },
    /// Add a one-tick impulse to the target's acceleration accumulator.
    AddAcceleration {
        target: EntityId,
        angle: f32,
        magnitude: f32,
    },
    /// Move the target without implying velocity.
    Teleport { target: EntityId, x: f32, y: f32 },
    SetTeam {
        target: EntityId,
        team: Option<EntityId>,
    },
    SetOwner {
        target: EntityId,
        owner: Option<EntityId>,
    },
    /// Destroy the target, optionally with the pop-and-fade animation.
    Destroy { target: EntityId, animate: bool },
}

impl Command {
    fn target(&self) -> EntityId {
        match *self {
            Command::SetVelocity { target, .. }
            | Command::AddAcceleration { target, .. }
            | Command::Teleport { target, .. }
            | Command::SetTeam { target, .. }
            | Command::SetOwner { target, .. }
            | Command::Destroy { target, .. } => target,
        }
    }
}

/// Command queue errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// Queue is full (backpressure)
    #[error("command queue full")]
    Full,
    /// Channel disconnected (tick loop stopped)
    #[error("command queue disconnected")]
    Disconnected,
}

/// Bounded MPSC command queue.
///
/// Multiple producers submit without blocking; the tick loop drains all
/// pending commands once per tick so every mutation lands on a tick
/// boundary in submission order.
pub struct CommandQueue {
    sender: Sender<Command>,
    receiver: Receiver<Command>,
    capacity: usize,
}

impl CommandQueue {
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// New producer handle; each outside thread holds its own clone.
    pub fn sender(&self) -> CommandSender {
        CommandSender {
            sender: self.sender.clone(),
        }
    }

    /// Try to submit a command (non-blocking).
    #[inline]
    pub fn try_submit(&self, command: Command) -> bool {
        self.sender.try_send(command).is_ok()
    }

    /// Drains every pending command into the world.
    ///
    /// Commands addressing entities freed since submission are logged and
    /// skipped; a handle can go stale in flight and that is not an error.
    pub fn apply_all(&self, world: &mut World) -> usize {
        let mut applied = 0;
        for command in self.receiver.try_iter() {
            if !world.exists(command.target()) {
                debug!("dropping command for stale entity {}", command.target());
                continue;
            }
            apply(world, command);
            applied += 1;
        }
        applied
    }

    #[inline]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for CommandQueue {
    fn default() -> Self {
        // Roomy enough for a full arena's worth of per-tick mutations.
        Self::new(4096)
    }
}

fn apply(world: &mut World, command: Command) {
    match command {
        Command::SetVelocity {
            target,
            angle,
            magnitude,
        } => world[target].set_velocity(angle, magnitude),
        Command::AddAcceleration {
            target,
            angle,
            magnitude,
        } => world[target].add_acceleration(angle, magnitude, false),
        Command::Teleport { target, x, y } => world[target].set_position(x, y),
        Command::SetTeam { target, team } => world[target].relations.set_team(team),
        Command::SetOwner { target, owner } => world[target].relations.set_owner(owner),
        Command::Destroy { target, animate } => world.destroy(target, animate),
    }
}

/// Clonable producer handle.
#[derive(Clone)]
pub struct CommandSender {
    sender: Sender<Command>,
}

impl CommandSender {
    /// Submit a command (non-blocking).
    #[inline]
    pub fn try_send(&self, command: Command) -> Result<(), CommandError> {
        self.sender.try_send(command).map_err(|e| match e {
            TrySendError::Full(_) => CommandError::Full,
            TrySendError::Disconnected(_) => CommandError::Disconnected,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::util::vec2::Vec2;

    fn test_world() -> World {
        let config = SimConfig {
            arena_half_extent: 1000.0,
            arena_padding: 100.0,
            capacity: 64,
            tick_rate: 25,
            rng_seed: Some(1),
        };
        World::new(&config)
    }

    #[test]
    fn test_submit_and_apply() {
        let mut world = test_world();
        let id = world.spawn();
        let queue = CommandQueue::new(16);

        assert!(queue.try_submit(Command::Teleport {
            target: id,
            x: 100.0,
            y: -50.0,
        }));
        assert!(queue.try_submit(Command::SetVelocity {
            target: id,
            angle: 0.0,
            magnitude: 5.0,
        }));
        assert_eq!(queue.pending_count(), 2);

        let applied = queue.apply_all(&mut world);
        assert_eq!(applied, 2);
        assert!(queue.is_empty());
        assert_eq!(world[id].position.x(), 100.0);
        assert_eq!(world[id].velocity.vector(), Vec2::new(5.0, 0.0));
    }

    #[test]
    fn test_stale_target_dropped() {
        let mut world = test_world();
        let id = world.spawn();
        let queue = CommandQueue::new(16);

        queue.try_submit(Command::Teleport {
            target: id,
            x: 1.0,
            y: 1.0,
        });
        world.destroy(id, false);

        // Applying must not panic, and the stale command does not count.
        assert_eq!(queue.apply_all(&mut world), 0);
    }

    #[test]
    fn test_backpressure() {
        let queue = CommandQueue::new(2);
        let mut world = test_world();
        let id = world.spawn();
        let destroy = Command::Destroy {
            target: id,
            animate: false,
        };

        assert!(queue.try_submit(destroy));
        assert!(queue.try_submit(destroy));
        assert!(!queue.try_submit(destroy));

        let sender = queue.sender();
        assert_eq!(sender.try_send(destroy), Err(CommandError::Full));
    }

    #[test]
    fn test_sender_clones_share_queue() {
        let mut world = test_world();
        let a = world.spawn();
        let b = world.spawn();
        let queue = CommandQueue::new(16);

        let sender1 = queue.sender();
        let sender2 = queue.sender();
        sender1
            .try_send(Command::SetTeam {
                target: a,
                team: Some(b),
            })
            .unwrap();
        sender2
            .try_send(Command::SetOwner {
                target: b,
                owner: Some(a),
            })
            .unwrap();

        assert_eq!(queue.apply_all(&mut world), 2);
        assert_eq!(world[a].relations.team(), Some(b));
        assert_eq!(world[b].relations.owner(), Some(a));
    }

    #[test]
    fn test_destroy_command_animates() {
        let mut world = test_world();
        let id = world.spawn();
        let queue = CommandQueue::new(16);

        queue.try_submit(Command::Destroy {
            target: id,
            animate: true,
        });
        queue.apply_all(&mut world);
        assert!(world[id].is_dying());
    }
}
