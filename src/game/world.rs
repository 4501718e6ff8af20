//! The simulation instance: entity slot table, spatial index and tick driver.
//!
//! One `World` is one arena. Everything a tick mutates (slots, quadtree,
//! z-index counter, RNG) is owned here, so multiple arenas can run side by
//! side and tests never touch shared state.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::debug;
use uuid::Uuid;

use crate::config::SimConfig;
use crate::game::entity::EntityId;
use crate::game::object::{AnimationStep, DeletionAnimation, ObjectEntity};
use crate::game::spatial::{QuadTree, QuadTreeEntry, QuadTreeStats};
use crate::game::systems::{collision, knockback, physics};
use crate::util::vec2::Vec2;

/// Arena rectangle plus the roaming margin used by position clamping.
#[derive(Debug, Clone, Copy)]
pub struct ArenaBounds {
    pub left_x: f32,
    pub top_y: f32,
    pub right_x: f32,
    pub bottom_y: f32,
    pub padding: f32,
}

impl ArenaBounds {
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            left_x: -config.arena_half_extent,
            top_y: -config.arena_half_extent,
            right_x: config.arena_half_extent,
            bottom_y: config.arena_half_extent,
            padding: config.arena_padding,
        }
    }
}

/// Structural events collected during a tick for the rules layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickEvent {
    /// An entity entered its deletion animation.
    DeletionStarted(EntityId),
    /// An entity's slot was released for reuse.
    Freed(EntityId),
}

struct Slot {
    entity: Option<ObjectEntity>,
    /// Generation last handed out for this slot; the live entity's hash.
    generation: u32,
}

/// The authoritative simulation state for one arena.
pub struct World {
    id: Uuid,
    slots: Vec<Slot>,
    /// Free slot indices; lowest-first so id assignment is deterministic.
    free_slots: BinaryHeap<Reverse<u32>>,
    /// Lowest slot index never handed out.
    next_fresh: u32,
    /// Highest slot index ever occupied; bulk iteration scans up to here.
    last_id: u32,
    /// Monotonic render/processing order key, never reused.
    z_index: u32,
    current_tick: u64,
    bounds: ArenaBounds,
    quadtree: QuadTree,
    rng: SmallRng,
    /// The arena's own entity, doubling as the neutral team token.
    arena_token: EntityId,
    events: Vec<TickEvent>,
}

impl World {
    pub fn new(config: &SimConfig) -> Self {
        let bounds = ArenaBounds::from_config(config);
        let index_half = config.arena_half_extent + config.arena_padding;
        let mut slots = Vec::with_capacity(config.capacity);
        slots.resize_with(config.capacity, || Slot {
            entity: None,
            generation: 0,
        });

        let rng = match config.rng_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };

        let mut world = Self {
            id: Uuid::new_v4(),
            slots,
            free_slots: BinaryHeap::new(),
            next_fresh: 0,
            last_id: 0,
            z_index: 0,
            current_tick: 0,
            bounds,
            quadtree: QuadTree::new(index_half, index_half),
            rng,
            arena_token: EntityId::new(0, 0), // replaced below
            events: Vec::new(),
        };

        // Slot 0 is the arena itself: sides 0, never moves, never collides.
        // Its handle is the neutral team token.
        let arena = world.spawn();
        world[arena].relations.set_team(Some(arena));
        world.arena_token = arena;
        debug!(world = %world.id, "world created, arena token {}", arena);
        world
    }

    pub fn uuid(&self) -> Uuid {
        self.id
    }

    pub fn current_tick(&self) -> u64 {
        self.current_tick
    }

    pub fn bounds(&self) -> ArenaBounds {
        self.bounds
    }

    pub fn arena_token(&self) -> EntityId {
        self.arena_token
    }

    // ------------------------------------------------------------------
    // Slot table
    // ------------------------------------------------------------------

    /// Creates a live entity in the lowest free slot and registers it for
    /// ticking.
    ///
    /// # Panics
    ///
    /// Panics when the slot table is full; capacity is a hard config limit.
    pub fn spawn(&mut self) -> EntityId {
        let index = match self.free_slots.pop() {
            Some(Reverse(index)) => index,
            None => {
                let index = self.next_fresh;
                assert!(
                    (index as usize) < self.slots.len(),
                    "entity capacity {} exhausted",
                    self.slots.len()
                );
                self.next_fresh += 1;
                index
            }
        };

        let slot = &mut self.slots[index as usize];
        // Generations stay non-zero so a live hash never reads as dead.
        slot.generation = match slot.generation.wrapping_add(1) {
            0 => 1,
            generation => generation,
        };
        let id = EntityId::new(index, slot.generation);
        slot.entity = Some(ObjectEntity::new(id, self.z_index));
        self.z_index += 1;
        self.last_id = self.last_id.max(index);
        debug!(world = %self.id, "spawned entity {}", id);
        id
    }

    /// Generation-match liveness check: true only while the slot still holds
    /// the entity this handle was captured from.
    pub fn exists(&self, id: EntityId) -> bool {
        self.slots
            .get(id.index())
            .and_then(|slot| slot.entity.as_ref())
            .is_some_and(|entity| entity.id() == id)
    }

    pub fn get(&self, id: EntityId) -> Option<&ObjectEntity> {
        self.slots
            .get(id.index())
            .and_then(|slot| slot.entity.as_ref())
            .filter(|entity| entity.id() == id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut ObjectEntity> {
        self.slots
            .get_mut(id.index())
            .and_then(|slot| slot.entity.as_mut())
            .filter(|entity| entity.id() == id)
    }

    /// Live entity handles in ascending id order, scanning every slot up to
    /// the highest ever assigned. Admin/bulk tooling iterates this way.
    pub fn live_ids(&self) -> Vec<EntityId> {
        let mut out = Vec::new();
        for index in 0..=self.last_id {
            if let Some(entity) = self.slots[index as usize].entity.as_ref() {
                out.push(entity.id());
            }
        }
        out
    }

    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.entity.is_some()).count()
    }

    pub fn last_id(&self) -> u32 {
        self.last_id
    }

    /// Uniform random angle for degenerate knockback geometry.
    pub(crate) fn random_angle(&mut self) -> f32 {
        self.rng.gen_range(0.0..std::f32::consts::TAU)
    }

    pub(crate) fn push_event(&mut self, event: TickEvent) {
        self.events.push(event);
    }

    /// Drains the structural events recorded since the last call.
    pub fn take_events(&mut self) -> Vec<TickEvent> {
        std::mem::take(&mut self.events)
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Starts the deletion animation, or with `animate == false` unlinks and
    /// frees the slot immediately. Stale handles are a no-op.
    pub fn destroy(&mut self, id: EntityId, animate: bool) {
        if !self.exists(id) {
            return;
        }
        if animate {
            if self[id].deletion_animation.is_none() {
                self[id].deletion_animation = Some(DeletionAnimation::new());
                self.push_event(TickEvent::DeletionStarted(id));
            }
        } else {
            self[id].deletion_animation = None;
            self.free(id);
        }
    }

    /// Releases the slot, unlinking from the hierarchy first. A freed root
    /// takes all of its children with it.
    fn free(&mut self, id: EntityId) {
        let (is_child, root_parent, children) = {
            let entity = &mut self[id];
            (
                entity.is_child,
                entity.root_parent,
                std::mem::take(&mut entity.children),
            )
        };

        if is_child {
            if let Some(root) = self.get_mut(root_parent) {
                if let Some(index) = root.children.iter().position(|child| *child == id) {
                    root.children.swap_remove(index);
                }
            }
        } else {
            for child in children {
                if self.exists(child) {
                    self[child].is_child = false;
                    self.free(child);
                }
            }
        }

        self.slots[id.index()].entity = None;
        self.free_slots.push(Reverse(id.id()));
        self.push_event(TickEvent::Freed(id));
        debug!(world = %self.id, "freed entity {}", id);
    }

    /// Links `child` under `parent`: the child joins the root's flat child
    /// list, stops being physical and from now on ticks with its root.
    ///
    /// # Panics
    ///
    /// Panics when either handle is stale; parenting dead entities is a
    /// lifecycle bug.
    pub fn set_parent(&mut self, child: EntityId, parent: EntityId) {
        let root = self[parent].root_parent;
        let entity = &mut self[child];
        entity.relations.set_parent(Some(parent));
        entity.root_parent = root;
        entity.is_child = true;
        entity.is_physical = false;
        self[root].children.push(child);
    }

    /// Absolute coordinates resolved through the parent chain. Each hop
    /// rotates the accumulated offset by the child's angle unless the parent
    /// demands absolute rotation, then translates by the parent's position.
    pub fn world_position(&self, id: EntityId) -> Option<Vec2> {
        let mut entity = self.get(id)?;
        let mut pos = entity.position_vec();
        while let Some(parent) = entity.relations.parent().and_then(|p| self.get(p)) {
            if !parent.position.motion().absolute_rotation() {
                pos = pos.rotate(entity.position.angle());
            }
            entity = parent;
            pos += entity.position_vec();
        }
        Some(pos)
    }

    // ------------------------------------------------------------------
    // Tick driver
    // ------------------------------------------------------------------

    /// One fixed-timestep step: integrate physics, rebuild the spatial
    /// index, then per root entity (ascending id) animate deletions, resolve
    /// collisions and recurse into children.
    pub fn tick(&mut self) {
        // Pre-incremented so tick 0 always means "never cached".
        self.current_tick += 1;

        for index in 0..=self.last_id {
            let bounds = self.bounds;
            if let Some(entity) = self.slots[index as usize].entity.as_mut() {
                if entity.is_physical {
                    physics::integrate(entity, &bounds);
                }
            }
        }

        self.rebuild_quadtree();

        for index in 0..=self.last_id {
            let id = match self.slots[index as usize].entity.as_ref() {
                Some(entity) if !entity.is_child => entity.id(),
                _ => continue,
            };
            self.tick_entity(id);
        }
    }

    /// Per-entity tick step, shared between roots and (recursively) their
    /// children.
    fn tick_entity(&mut self, id: EntityId) {
        let step = {
            let Some(entity) = self.get_mut(id) else {
                return;
            };
            match entity.deletion_animation.take() {
                Some(mut animation) => {
                    let step = animation.tick(&mut entity.physics, &mut entity.style);
                    if step == AnimationStep::Continue {
                        entity.deletion_animation = Some(animation);
                    }
                    Some(step)
                }
                None => None,
            }
        };
        if step == Some(AnimationStep::Delete) {
            self.free(id);
            return;
        }

        let (is_physical, is_dying) = {
            let entity = &self[id];
            (entity.is_physical, entity.is_dying())
        };
        if is_physical && !is_dying {
            let collisions = collision::find_collisions(self, id);
            for other in collisions {
                knockback::receive_knockback(self, id, other);
            }
        }

        // Children always tick inside the viewed root's call; their own
        // isViewed is irrelevant because visibility flows top-down.
        if self.get(id).is_some_and(|entity| entity.is_viewed) {
            let mut index = 0;
            loop {
                let child = match self.get(id).and_then(|e| e.children.get(index).copied()) {
                    Some(child) => child,
                    None => break,
                };
                self.tick_entity(child);
                index += 1;
            }
        }
    }

    /// Rebuilds the quadtree from every live physical entity's current
    /// bounding box.
    fn rebuild_quadtree(&mut self) {
        self.quadtree.reset();
        for index in 0..=self.last_id {
            if let Some(entity) = self.slots[index as usize].entity.as_ref() {
                if !entity.is_physical {
                    continue;
                }
                let (radi_w, radi_h) = entity.bounding_half_extents();
                self.quadtree.insert(QuadTreeEntry {
                    id: entity.id(),
                    x: entity.position.x(),
                    y: entity.position.y(),
                    radi_w,
                    radi_h,
                });
            }
        }
    }

    /// Broad-phase query: de-duplicated handles from the index, filtered
    /// down to entities that are still alive.
    pub fn retrieve_overlapping(&self, x: f32, y: f32, radi_w: f32, radi_h: f32) -> Vec<EntityId> {
        self.quadtree
            .retrieve(x, y, radi_w, radi_h)
            .into_iter()
            .filter(|id| self.exists(*id))
            .collect()
    }

    pub fn quadtree_stats(&self) -> QuadTreeStats {
        self.quadtree.stats()
    }
}

impl std::ops::Index<EntityId> for World {
    type Output = ObjectEntity;

    /// # Panics
    ///
    /// Panics on a stale handle: mutating a dead entity is a lifecycle bug,
    /// not a recoverable condition.
    fn index(&self, id: EntityId) -> &ObjectEntity {
        match self.get(id) {
            Some(entity) => entity,
            None => panic!("stale entity handle {id}"),
        }
    }
}

impl std::ops::IndexMut<EntityId> for World {
    fn index_mut(&mut self, id: EntityId) -> &mut ObjectEntity {
        match self.get_mut(id) {
            Some(entity) => entity,
            None => panic!("stale entity handle {id}"),
        }
    }
}
