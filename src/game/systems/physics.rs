//! Motion integration: friction, accumulated acceleration, position advance
//! and arena clamping, once per tick per physical entity.

use crate::game::constants::physics::{DYING_SPEED_FACTOR, FRICTION, VELOCITY_SNAP};
use crate::game::object::ObjectEntity;
use crate::game::world::ArenaBounds;
use crate::util::vec2::Vec2;

/// Advances one entity by one tick.
///
/// Non-viewed entities are frozen: their velocity stays anchored to the
/// current position and pending acceleration is discarded, so nothing moves
/// off-screen and no phantom velocity builds up while hidden.
pub fn integrate(entity: &mut ObjectEntity, bounds: &ArenaBounds) {
    if !entity.is_viewed {
        entity.velocity.set_position(entity.position_vec());
        entity.accel = Vec2::ZERO;
        return;
    }

    entity.velocity.set_position(entity.position_vec());

    // Friction is an opposing acceleration along the current heading, folded
    // into the same accumulator as deliberate forces.
    let angle = entity.velocity.angle();
    let drag = entity.velocity.magnitude() * -FRICTION;
    entity.add_acceleration(angle, drag, false);

    entity.velocity.add(entity.accel);
    if entity.velocity.magnitude() < VELOCITY_SNAP {
        entity.velocity.set_magnitude(0.0);
    } else if entity.is_dying() {
        let halved = entity.velocity.magnitude() * DYING_SPEED_FACTOR;
        entity.velocity.set_magnitude(halved);
    }

    entity
        .position
        .set_x(entity.position.x() + entity.velocity.vector().x);
    entity
        .position
        .set_y(entity.position.y() + entity.velocity.vector().y);

    // Forces never persist across ticks.
    entity.accel = Vec2::ZERO;

    if !entity.physics.object_flags().can_escape_arena() {
        clamp_to_arena(entity, bounds);
    }
}

/// Clamps the position into the padded arena rectangle. A clamp on an axis
/// re-anchors the velocity on that axis so the correction does not read back
/// as motion next tick.
fn clamp_to_arena(entity: &mut ObjectEntity, bounds: &ArenaBounds) {
    let min_x = bounds.left_x - bounds.padding;
    let max_x = bounds.right_x + bounds.padding;
    let min_y = bounds.top_y - bounds.padding;
    let max_y = bounds.bottom_y + bounds.padding;

    let x = entity.position.x();
    if x < min_x {
        entity.position.set_x(min_x);
        entity.velocity.re_anchor_x(min_x);
    } else if x > max_x {
        entity.position.set_x(max_x);
        entity.velocity.re_anchor_x(max_x);
    }

    let y = entity.position.y();
    if y < min_y {
        entity.position.set_y(min_y);
        entity.velocity.re_anchor_y(min_y);
    } else if y > max_y {
        entity.position.set_y(max_y);
        entity.velocity.re_anchor_y(max_y);
    }
}
