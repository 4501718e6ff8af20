//! The physical entity: field groups plus motion state.
//!
//! `ObjectEntity` is plain owned data; all cross-entity behavior (parenting,
//! collision, knockback, the tick itself) lives in `World` and the system
//! functions, which read and write these fields through the slot table.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::game::constants::{animation, physics};
use crate::game::entity::EntityId;
use crate::game::fields::{PhysicsGroup, PositionGroup, RelationsGroup, StyleGroup};
use crate::util::vec2::Vec2;

/// A position-anchored velocity vector.
///
/// The vector itself is the per-tick displacement. Re-anchoring to a new
/// position replaces the vector with the delta from the previous anchor, so
/// externally-imposed position changes (teleports, clamps undone by game
/// rules) show up as implied velocity on the next integration pass.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Velocity {
    vector: Vec2,
    anchor: Vec2,
}

impl Velocity {
    pub fn new(anchor: Vec2) -> Self {
        Self {
            vector: Vec2::ZERO,
            anchor,
        }
    }

    /// Re-anchors to `position`: the vector becomes the displacement since
    /// the last anchor. An unchanged position is a no-op, so an explicit
    /// velocity set survives until the entity actually moves.
    pub fn set_position(&mut self, position: Vec2) {
        if position == self.anchor {
            return;
        }
        self.vector = position - self.anchor;
        self.anchor = position;
    }

    /// Moves the anchor on one axis without touching the vector. Used by
    /// arena clamping so the clamp itself never reads back as velocity.
    pub fn re_anchor_x(&mut self, x: f32) {
        self.anchor.x = x;
    }

    pub fn re_anchor_y(&mut self, y: f32) {
        self.anchor.y = y;
    }

    pub fn anchor(&self) -> Vec2 {
        self.anchor
    }

    pub fn vector(&self) -> Vec2 {
        self.vector
    }

    pub fn set(&mut self, vector: Vec2) {
        self.vector = vector;
    }

    pub fn add(&mut self, delta: Vec2) {
        self.vector += delta;
    }

    pub fn magnitude(&self) -> f32 {
        self.vector.length()
    }

    /// Rescales the vector to `magnitude`, preserving heading. A zero vector
    /// keeps heading 0, which only matters when the new magnitude is nonzero.
    pub fn set_magnitude(&mut self, magnitude: f32) {
        let angle = self.vector.angle();
        self.vector = Vec2::from_polar(angle, magnitude);
    }

    pub fn angle(&self) -> f32 {
        self.vector.angle()
    }

    /// Signed component of the vector along `angle`.
    pub fn angle_component(&self, angle: f32) -> f32 {
        self.magnitude() * (self.angle() - angle).cos()
    }
}

/// Outcome of advancing a deletion animation by one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationStep {
    /// Keep animating next tick.
    Continue,
    /// Terminal frame reached; the entity must be freed now.
    Delete,
}

/// The pop-and-fade state machine entities run through when destroyed.
///
/// Frames count 5 down to 0, then -1 (terminal). Each frame grows the size
/// and knocks opacity down one step, so a dying entity stays collidable and
/// visibly swells for exactly six ticks before it is freed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DeletionAnimation {
    frame: i32,
}

impl DeletionAnimation {
    pub fn new() -> Self {
        Self {
            frame: animation::START_FRAME,
        }
    }

    pub fn frame(&self) -> i32 {
        self.frame
    }

    /// Advances one frame, mutating the entity's size and opacity.
    ///
    /// # Panics
    ///
    /// Panics when called past the terminal frame. The driver frees the
    /// entity on [`AnimationStep::Delete`]; ticking again means a lifecycle
    /// bug upstream.
    pub fn tick(&mut self, physics: &mut PhysicsGroup, style: &mut StyleGroup) -> AnimationStep {
        match self.frame {
            -1 => panic!("deletion animation ticked past terminal frame"),
            0 => {
                self.frame = -1;
                return AnimationStep::Delete;
            }
            frame => {
                if frame == animation::START_FRAME {
                    style.set_opacity(1.0 - animation::OPACITY_STEP);
                }
                physics.set_size(physics.size() * animation::SIZE_GROWTH);
                let opacity = (style.opacity() - animation::OPACITY_STEP).max(0.0);
                style.set_opacity(opacity);
            }
        }
        self.frame -= 1;
        AnimationStep::Continue
    }
}

impl Default for DeletionAnimation {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything visible in the arena: the four field groups plus motion state,
/// hierarchy links and the per-tick collision cache.
#[derive(Debug, Clone)]
pub struct ObjectEntity {
    id: EntityId,
    pub relations: RelationsGroup,
    pub physics: PhysicsGroup,
    pub position: PositionGroup,
    pub style: StyleGroup,
    /// Per-tick displacement, anchored to the last integrated position.
    pub velocity: Velocity,
    /// Single-tick force accumulator, zeroed every integration pass.
    pub accel: Vec2,
    /// Non-None while the entity is dying but still addressable.
    pub deletion_animation: Option<DeletionAnimation>,
    /// False once parented: children move with their root and never
    /// independently integrate or collide.
    pub is_physical: bool,
    pub is_child: bool,
    /// Visibility gate: non-viewed entities skip motion and stay anchored.
    pub is_viewed: bool,
    /// Flat list of all transitive descendants, kept on the root only.
    pub(crate) children: Vec<EntityId>,
    /// Topmost ancestor; self when unparented.
    pub(crate) root_parent: EntityId,
    pub(crate) cached_collisions: SmallVec<[EntityId; 8]>,
    pub(crate) cached_tick: u64,
}

impl ObjectEntity {
    pub(crate) fn new(id: EntityId, z_index: u32) -> Self {
        let mut style = StyleGroup::default();
        style.set_z_index(z_index);
        Self {
            id,
            relations: RelationsGroup::default(),
            physics: PhysicsGroup::default(),
            position: PositionGroup::default(),
            style,
            velocity: Velocity::default(),
            accel: Vec2::ZERO,
            deletion_animation: None,
            is_physical: true,
            is_child: false,
            is_viewed: false,
            children: Vec::new(),
            root_parent: id,
            cached_collisions: SmallVec::new(),
            cached_tick: 0,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn root_parent(&self) -> EntityId {
        self.root_parent
    }

    pub fn children(&self) -> &[EntityId] {
        &self.children
    }

    /// Local position as a vector (parent-relative for children).
    pub fn position_vec(&self) -> Vec2 {
        Vec2::new(self.position.x(), self.position.y())
    }

    /// Moves the entity and re-anchors its velocity so the jump never reads
    /// back as implied motion. Teleports and spawns go through here; direct
    /// `position` setters deliberately do not re-anchor, so game-rule moves
    /// show up as implied velocity on the next integration pass.
    pub fn set_position(&mut self, x: f32, y: f32) {
        self.position.set_x(x);
        self.position.set_y(y);
        self.velocity.re_anchor_x(x);
        self.velocity.re_anchor_y(y);
    }

    /// Adds a polar impulse to the accel accumulator. With `negate_friction`
    /// the magnitude is padded by the friction that will oppose it, so the
    /// full impulse survives the next integration pass.
    pub fn add_acceleration(&mut self, angle: f32, mut magnitude: f32, negate_friction: bool) {
        if negate_friction {
            magnitude += self.velocity.angle_component(angle) * physics::FRICTION;
        }
        self.accel += Vec2::from_polar(angle, magnitude);
    }

    /// Instantaneous velocity override, bypassing the accumulator.
    pub fn set_velocity(&mut self, angle: f32, magnitude: f32) {
        self.velocity.set_position(self.position_vec());
        self.velocity.set(Vec2::from_polar(angle, magnitude));
    }

    /// Feeds just enough acceleration each tick to hold `max_speed` against
    /// friction.
    pub fn maintain_velocity(&mut self, angle: f32, max_speed: f32) {
        self.accel += Vec2::from_polar(angle, max_speed * physics::FRICTION);
    }

    /// True while the entity is mid-deletion-animation.
    pub fn is_dying(&self) -> bool {
        self.deletion_animation.is_some()
    }

    /// Half-extents of the axis-aligned bounding box used by the spatial
    /// index: rectangles use half their side lengths, everything else a
    /// bounding square around the circle.
    pub fn bounding_half_extents(&self) -> (f32, f32) {
        if self.physics.sides() == 2 {
            (self.physics.size() / 2.0, self.physics.width() / 2.0)
        } else {
            (self.physics.size(), self.physics.size())
        }
    }
}
