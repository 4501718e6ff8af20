//! Knockback resolution: the impulse one entity receives from touching
//! another, plus the wall special cases.

use std::f32::consts::{FRAC_PI_2, PI};

use crate::game::constants::physics::WALL_ACCEL_DAMP;
use crate::game::entity::EntityId;
use crate::game::world::World;

/// Applies the impulse `this` receives from overlapping `other`.
///
/// The magnitude is `this.absorption_factor * other.push_factor`, aimed
/// along the center line away from `other`. Coincident centers push in a
/// random direction so stacked spawns separate instead of sticking.
///
/// Walls and bases additionally damp the victim's accumulated acceleration;
/// the knockback itself is scaled up by the inverse so the shove still
/// lands at full strength after the damp. Rectangles snap the push to the
/// dominant axis, and owned projectiles hitting a hostile wall are destroyed
/// outright instead of bouncing.
pub fn receive_knockback(world: &mut World, this_id: EntityId, other_id: EntityId) {
    let (this_pos, this_absorption, this_motion, this_owner, this_team) = {
        let Some(entity) = world.get(this_id) else {
            return;
        };
        (
            entity.position_vec(),
            entity.physics.absorption_factor(),
            entity.position.motion(),
            entity.relations.owner(),
            entity.relations.team(),
        )
    };
    let (other_pos, other_push, other_flags, other_sides, other_size, other_width, other_team) = {
        let Some(entity) = world.get(other_id) else {
            return;
        };
        (
            entity.position_vec(),
            entity.physics.push_factor(),
            entity.physics.object_flags(),
            entity.physics.sides(),
            entity.physics.size(),
            entity.physics.width(),
            entity.relations.team(),
        )
    };

    let mut kb = this_absorption * other_push;

    let delta = this_pos - other_pos;
    let kb_angle = if delta.x == 0.0 && delta.y == 0.0 {
        world.random_angle()
    } else {
        delta.angle()
    };

    // Immovable obstacles soak up most of whatever momentum the victim had
    // built, then shove at inversely scaled strength.
    if (other_flags.is_wall() || other_flags.is_base()) && !this_motion.can_move_through_walls() {
        let entity = &mut world[this_id];
        entity.accel = entity.accel * WALL_ACCEL_DAMP;
        kb /= WALL_ACCEL_DAMP;
    }

    if other_sides == 2 {
        if this_motion.can_move_through_walls() {
            return;
        }

        // A live team token shared with the rectangle shields the owner's
        // projectiles from absorption.
        let team_shields = this_team.is_some_and(|team| world.exists(team))
            && this_team == other_team;
        if (!other_flags.is_base() || other_push != 0.0) && this_owner.is_some() && !team_shields {
            world[this_id].set_velocity(0.0, 0.0);
            world.destroy(this_id, true);
            return;
        }

        // Snap the push to the rectangle axis the contact is most aligned
        // with, normalizing each component by the rectangle's extent.
        let rel_a = kb_angle.cos() / other_size;
        let rel_b = kb_angle.sin() / other_width;
        let snapped = if rel_a.abs() <= rel_b.abs() {
            if rel_b < 0.0 {
                3.0 * FRAC_PI_2
            } else {
                FRAC_PI_2
            }
        } else if rel_a < 0.0 {
            PI
        } else {
            0.0
        };
        world[this_id].add_acceleration(snapped, kb, false);
    } else {
        world[this_id].add_acceleration(kb_angle, kb, false);
    }
}
