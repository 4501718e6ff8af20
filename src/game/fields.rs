//! Field groups: the attribute blocks every arena object carries.
//!
//! Each group tracks which of its fields changed since the last `wipe()` so
//! the sync layer can emit deltas instead of full snapshots. Setters only
//! mark a field dirty when the stored value actually changes; dirty state
//! never feeds back into simulation behavior.

use serde::{Deserialize, Serialize};

use crate::game::entity::EntityId;

// ============================================================================
// FLAG SETS
// ============================================================================

/// Behavior bits carried by the physics group.
///
/// Bit positions are part of the wire contract and must not be renumbered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectFlags(pub u16);

impl ObjectFlags {
    pub const IS_TRAPEZOID: u16 = 1 << 0;
    pub const MINIMAP: u16 = 1 << 1;
    pub const NO_OWN_TEAM_COLLISION: u16 = 1 << 3;
    pub const WALL: u16 = 1 << 4;
    pub const ONLY_SAME_OWNER_COLLISION: u16 = 1 << 5;
    pub const BASE: u16 = 1 << 6;
    pub const CAN_ESCAPE_ARENA: u16 = 1 << 8;

    pub fn contains(&self, flag: u16) -> bool {
        self.0 & flag != 0
    }

    pub fn is_wall(&self) -> bool {
        self.0 & Self::WALL != 0
    }

    pub fn is_base(&self) -> bool {
        self.0 & Self::BASE != 0
    }

    pub fn no_own_team_collision(&self) -> bool {
        self.0 & Self::NO_OWN_TEAM_COLLISION != 0
    }

    pub fn only_same_owner_collision(&self) -> bool {
        self.0 & Self::ONLY_SAME_OWNER_COLLISION != 0
    }

    pub fn can_escape_arena(&self) -> bool {
        self.0 & Self::CAN_ESCAPE_ARENA != 0
    }

    pub fn set(&mut self, flag: u16, value: bool) {
        if value {
            self.0 |= flag;
        } else {
            self.0 &= !flag;
        }
    }
}

/// Movement bits carried by the position group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotionFlags(pub u16);

impl MotionFlags {
    pub const ABSOLUTE_ROTATION: u16 = 1 << 0;
    pub const CAN_MOVE_THROUGH_WALLS: u16 = 1 << 1;

    pub fn absolute_rotation(&self) -> bool {
        self.0 & Self::ABSOLUTE_ROTATION != 0
    }

    pub fn can_move_through_walls(&self) -> bool {
        self.0 & Self::CAN_MOVE_THROUGH_WALLS != 0
    }

    pub fn set(&mut self, flag: u16, value: bool) {
        if value {
            self.0 |= flag;
        } else {
            self.0 &= !flag;
        }
    }
}

/// Rendering bits carried by the style group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleFlags(pub u16);

impl StyleFlags {
    pub const VISIBLE: u16 = 1 << 0;
    pub const HAS_BEEN_DAMAGED: u16 = 1 << 1;
    pub const INVINCIBILITY: u16 = 1 << 2;
    pub const SHOW_ON_MINIMAP: u16 = 1 << 3;
    pub const STAR: u16 = 1 << 4;
    pub const TRAP: u16 = 1 << 5;
    pub const ABOVE_PARENT: u16 = 1 << 6;
    pub const NO_DAMAGE_INDICATOR: u16 = 1 << 7;

    pub fn is_visible(&self) -> bool {
        self.0 & Self::VISIBLE != 0
    }

    pub fn contains(&self, flag: u16) -> bool {
        self.0 & flag != 0
    }

    pub fn set(&mut self, flag: u16, value: bool) {
        if value {
            self.0 |= flag;
        } else {
            self.0 &= !flag;
        }
    }
}

impl Default for StyleFlags {
    fn default() -> Self {
        StyleFlags(Self::VISIBLE)
    }
}

// ============================================================================
// COLOR PALETTE
// ============================================================================

/// Palette indices shared by every renderable object.
///
/// Team colors double as team identity in game-rule code, so the discriminant
/// values are fixed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Color {
    #[default]
    Border = 0,
    Barrel = 1,
    Tank = 2,
    TeamBlue = 3,
    TeamRed = 4,
    TeamPurple = 5,
    TeamGreen = 6,
    Shiny = 7,
    EnemySquare = 8,
    EnemyTriangle = 9,
    EnemyPentagon = 10,
    EnemyCrasher = 11,
    Neutral = 12,
    ScoreboardBar = 13,
    Box = 14,
    EnemyTank = 15,
    NecromancerSquare = 16,
    Fallen = 17,
}

impl Color {
    pub const COUNT: usize = 18;

    /// 0x00RRGGBB hex code rendered for this palette slot.
    pub fn hex(self) -> u32 {
        match self {
            Color::Border => 0x555555,
            Color::Barrel => 0x999999,
            Color::Tank => 0x00B2E1,
            Color::TeamBlue => 0x00B2E1,
            Color::TeamRed => 0xF14E54,
            Color::TeamPurple => 0xBF7FF5,
            Color::TeamGreen => 0x00E16E,
            Color::Shiny => 0x8AFF69,
            Color::EnemySquare => 0xFFE869,
            Color::EnemyTriangle => 0xFC7677,
            Color::EnemyPentagon => 0x768DFC,
            Color::EnemyCrasher => 0xF177DD,
            Color::Neutral => 0xFFE869,
            Color::ScoreboardBar => 0x43FF91,
            Color::Box => 0xBBBBBB,
            Color::EnemyTank => 0xF14E54,
            Color::NecromancerSquare => 0xFCC376,
            Color::Fallen => 0xC0C0C0,
        }
    }
}

// ============================================================================
// RELATIONS GROUP
// ============================================================================

/// Weak links to other entities: who owns this object, who parents it, and
/// which team token it belongs to. All three are generation-guarded handles;
/// holders must re-check liveness before dereferencing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelationsGroup {
    owner: Option<EntityId>,
    parent: Option<EntityId>,
    team: Option<EntityId>,
    #[serde(skip)]
    dirty: u8,
}

impl RelationsGroup {
    pub const F_OWNER: u8 = 1 << 0;
    pub const F_PARENT: u8 = 1 << 1;
    pub const F_TEAM: u8 = 1 << 2;

    pub fn owner(&self) -> Option<EntityId> {
        self.owner
    }

    pub fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    pub fn team(&self) -> Option<EntityId> {
        self.team
    }

    pub fn set_owner(&mut self, owner: Option<EntityId>) {
        if self.owner != owner {
            self.owner = owner;
            self.dirty |= Self::F_OWNER;
        }
    }

    pub fn set_parent(&mut self, parent: Option<EntityId>) {
        if self.parent != parent {
            self.parent = parent;
            self.dirty |= Self::F_PARENT;
        }
    }

    pub fn set_team(&mut self, team: Option<EntityId>) {
        if self.team != team {
            self.team = team;
            self.dirty |= Self::F_TEAM;
        }
    }

    pub fn dirty(&self) -> u8 {
        self.dirty
    }

    pub fn wipe(&mut self) {
        self.dirty = 0;
    }
}

// ============================================================================
// PHYSICS GROUP
// ============================================================================

/// Shape and collision-response parameters.
///
/// `sides` doubles as the shape descriptor: 0 is non-colliding, 2 is a
/// rectangle of `size` by `width`, and 3 or more is a regular polygon treated
/// as a circle of radius `size` for collision purposes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicsGroup {
    sides: u32,
    size: f32,
    width: f32,
    absorption_factor: f32,
    push_factor: f32,
    object_flags: ObjectFlags,
    #[serde(skip)]
    dirty: u8,
}

impl PhysicsGroup {
    pub const F_SIDES: u8 = 1 << 0;
    pub const F_SIZE: u8 = 1 << 1;
    pub const F_WIDTH: u8 = 1 << 2;
    pub const F_ABSORPTION_FACTOR: u8 = 1 << 3;
    pub const F_PUSH_FACTOR: u8 = 1 << 4;
    pub const F_OBJECT_FLAGS: u8 = 1 << 5;

    pub fn sides(&self) -> u32 {
        self.sides
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn absorption_factor(&self) -> f32 {
        self.absorption_factor
    }

    pub fn push_factor(&self) -> f32 {
        self.push_factor
    }

    pub fn object_flags(&self) -> ObjectFlags {
        self.object_flags
    }

    pub fn set_sides(&mut self, sides: u32) {
        if self.sides != sides {
            self.sides = sides;
            self.dirty |= Self::F_SIDES;
        }
    }

    pub fn set_size(&mut self, size: f32) {
        if self.size != size {
            self.size = size;
            self.dirty |= Self::F_SIZE;
        }
    }

    pub fn set_width(&mut self, width: f32) {
        if self.width != width {
            self.width = width;
            self.dirty |= Self::F_WIDTH;
        }
    }

    pub fn set_absorption_factor(&mut self, factor: f32) {
        if self.absorption_factor != factor {
            self.absorption_factor = factor;
            self.dirty |= Self::F_ABSORPTION_FACTOR;
        }
    }

    pub fn set_push_factor(&mut self, factor: f32) {
        if self.push_factor != factor {
            self.push_factor = factor;
            self.dirty |= Self::F_PUSH_FACTOR;
        }
    }

    pub fn set_object_flags(&mut self, flags: ObjectFlags) {
        if self.object_flags != flags {
            self.object_flags = flags;
            self.dirty |= Self::F_OBJECT_FLAGS;
        }
    }

    /// Flips one behavior bit, marking the group dirty only on change.
    pub fn set_object_flag(&mut self, flag: u16, value: bool) {
        let mut flags = self.object_flags;
        flags.set(flag, value);
        self.set_object_flags(flags);
    }

    pub fn dirty(&self) -> u8 {
        self.dirty
    }

    pub fn wipe(&mut self) {
        self.dirty = 0;
    }
}

impl Default for PhysicsGroup {
    fn default() -> Self {
        PhysicsGroup {
            sides: 0,
            size: 0.0,
            width: 0.0,
            absorption_factor: 1.0,
            push_factor: 8.0,
            object_flags: ObjectFlags::default(),
            dirty: 0,
        }
    }
}

// ============================================================================
// POSITION GROUP
// ============================================================================

/// World-space placement. For children these are parent-relative until the
/// world resolves them (see `World::world_position`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PositionGroup {
    x: f32,
    y: f32,
    angle: f32,
    motion: MotionFlags,
    #[serde(skip)]
    dirty: u8,
}

impl PositionGroup {
    pub const F_X: u8 = 1 << 0;
    pub const F_Y: u8 = 1 << 1;
    pub const F_ANGLE: u8 = 1 << 2;
    pub const F_MOTION: u8 = 1 << 3;

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn motion(&self) -> MotionFlags {
        self.motion
    }

    pub fn set_x(&mut self, x: f32) {
        if self.x != x {
            self.x = x;
            self.dirty |= Self::F_X;
        }
    }

    pub fn set_y(&mut self, y: f32) {
        if self.y != y {
            self.y = y;
            self.dirty |= Self::F_Y;
        }
    }

    pub fn set_angle(&mut self, angle: f32) {
        if self.angle != angle {
            self.angle = angle;
            self.dirty |= Self::F_ANGLE;
        }
    }

    pub fn set_motion(&mut self, motion: MotionFlags) {
        if self.motion != motion {
            self.motion = motion;
            self.dirty |= Self::F_MOTION;
        }
    }

    pub fn set_motion_flag(&mut self, flag: u16, value: bool) {
        let mut motion = self.motion;
        motion.set(flag, value);
        self.set_motion(motion);
    }

    pub fn dirty(&self) -> u8 {
        self.dirty
    }

    pub fn wipe(&mut self) {
        self.dirty = 0;
    }
}

// ============================================================================
// STYLE GROUP
// ============================================================================

/// Rendering attributes. `z_index` is assigned once at spawn from the world's
/// monotonic counter and is never reused, so it doubles as a stable ordering
/// key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleGroup {
    color: Color,
    opacity: f32,
    z_index: u32,
    style_flags: StyleFlags,
    #[serde(skip)]
    dirty: u8,
}

impl StyleGroup {
    pub const F_COLOR: u8 = 1 << 0;
    pub const F_OPACITY: u8 = 1 << 1;
    pub const F_Z_INDEX: u8 = 1 << 2;
    pub const F_STYLE_FLAGS: u8 = 1 << 3;

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn z_index(&self) -> u32 {
        self.z_index
    }

    pub fn style_flags(&self) -> StyleFlags {
        self.style_flags
    }

    pub fn set_color(&mut self, color: Color) {
        if self.color != color {
            self.color = color;
            self.dirty |= Self::F_COLOR;
        }
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        if self.opacity != opacity {
            self.opacity = opacity;
            self.dirty |= Self::F_OPACITY;
        }
    }

    pub fn set_z_index(&mut self, z_index: u32) {
        if self.z_index != z_index {
            self.z_index = z_index;
            self.dirty |= Self::F_Z_INDEX;
        }
    }

    pub fn set_style_flags(&mut self, flags: StyleFlags) {
        if self.style_flags != flags {
            self.style_flags = flags;
            self.dirty |= Self::F_STYLE_FLAGS;
        }
    }

    pub fn set_style_flag(&mut self, flag: u16, value: bool) {
        let mut flags = self.style_flags;
        flags.set(flag, value);
        self.set_style_flags(flags);
    }

    pub fn dirty(&self) -> u8 {
        self.dirty
    }

    pub fn wipe(&mut self) {
        self.dirty = 0;
    }
}

impl Default for StyleGroup {
    fn default() -> Self {
        StyleGroup {
            color: Color::default(),
            opacity: 1.0,
            z_index: 0,
            style_flags: StyleFlags::default(),
            dirty: 0,
        }
    }
}
