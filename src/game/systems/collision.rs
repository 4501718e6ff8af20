//! Narrow-phase collision detection over quadtree candidates.
//!
//! `find_collisions` is idempotent within a tick: results are cached on the
//! entity and replayed until the next tick bumps the counter.

use smallvec::SmallVec;

use crate::game::entity::EntityId;
use crate::game::world::World;

/// Shape descriptor snapshot used by the overlap tests.
#[derive(Debug, Clone, Copy)]
struct Shape {
    x: f32,
    y: f32,
    sides: u32,
    size: f32,
    width: f32,
}

/// Exact overlap test between two shapes.
///
/// Rectangle vs rectangle never collides: walls must ignore each other, and
/// no game rule ever needs that pair. Polygons (3+ sides) collide as
/// circles of radius `size`.
fn shapes_overlap(a: &Shape, b: &Shape) -> bool {
    match (a.sides, b.sides) {
        (2, 2) => false,
        (_, 2) => circle_rect_overlap(a, b),
        (2, _) => circle_rect_overlap(b, a),
        _ => {
            let dx = b.x - a.x;
            let dy = b.y - a.y;
            let reach = a.size + b.size;
            dx * dx + dy * dy <= reach * reach
        }
    }
}

/// Clamps the circle center onto the rectangle's half-extents and compares
/// the closest point against the radius.
fn circle_rect_overlap(circle: &Shape, rect: &Shape) -> bool {
    let dx = (circle.x).clamp(rect.x - rect.size / 2.0, rect.x + rect.size / 2.0) - circle.x;
    let dy = (circle.y).clamp(rect.y - rect.width / 2.0, rect.y + rect.width / 2.0) - circle.y;
    dx * dx + dy * dy <= circle.size * circle.size
}

/// All entities overlapping `id` this tick, after team/owner filtering.
///
/// Dead handles and non-colliding shapes (`sides == 0`) report nothing.
/// Results are cached per tick, so repeated queries are free and stable
/// even while knockback mutates positions.
pub fn find_collisions(world: &mut World, id: EntityId) -> SmallVec<[EntityId; 8]> {
    let tick = world.current_tick();
    let Some(entity) = world.get(id) else {
        return SmallVec::new();
    };
    if entity.cached_tick == tick {
        return entity.cached_collisions.clone();
    }

    let this_shape = Shape {
        x: entity.position.x(),
        y: entity.position.y(),
        sides: entity.physics.sides(),
        size: entity.physics.size(),
        width: entity.physics.width(),
    };
    let this_flags = entity.physics.object_flags();
    let this_team = entity.relations.team();
    let this_owner = entity.relations.owner();
    let (radi_w, radi_h) = entity.bounding_half_extents();

    {
        let entity = &mut world[id];
        entity.cached_tick = tick;
        entity.cached_collisions.clear();
    }
    if this_shape.sides == 0 {
        return SmallVec::new();
    }

    let arena_team = world.arena_token();
    let candidates = world.retrieve_overlapping(this_shape.x, this_shape.y, radi_w, radi_h);

    let mut hits: SmallVec<[EntityId; 8]> = SmallVec::new();
    for candidate in candidates {
        if candidate == id {
            continue;
        }
        let Some(other) = world.get(candidate) else {
            continue;
        };
        if other.is_dying() {
            continue;
        }

        let other_flags = other.physics.object_flags();
        if other.relations.team() == this_team {
            if other_flags.no_own_team_collision() || this_flags.no_own_team_collision() {
                continue;
            }
            if other.relations.owner() != this_owner
                && (other_flags.only_same_owner_collision()
                    || this_flags.only_same_owner_collision())
            {
                continue;
            }
        }
        // Arena-owned entities never collide with bases.
        if this_team == Some(arena_team) && other_flags.is_base() {
            continue;
        }
        if other.physics.sides() == 0 {
            continue;
        }

        let other_shape = Shape {
            x: other.position.x(),
            y: other.position.y(),
            sides: other.physics.sides(),
            size: other.physics.size(),
            width: other.physics.width(),
        };
        if shapes_overlap(&this_shape, &other_shape) {
            hits.push(candidate);
        }
    }

    world[id].cached_collisions = hits.clone();
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::game::fields::ObjectFlags;

    fn test_world() -> World {
        let config = SimConfig {
            arena_half_extent: 1000.0,
            arena_padding: 100.0,
            capacity: 64,
            tick_rate: 25,
            rng_seed: Some(7),
        };
        World::new(&config)
    }

    fn spawn_shape(world: &mut World, x: f32, y: f32, sides: u32, size: f32, width: f32) -> EntityId {
        let id = world.spawn();
        let entity = &mut world[id];
        entity.physics.set_sides(sides);
        entity.physics.set_size(size);
        entity.physics.set_width(width);
        entity.set_position(x, y);
        entity.is_viewed = true;
        id
    }

    /// Distinct team tokens so the pair is never filtered as same-team.
    fn opposing_teams(world: &mut World, a: EntityId, b: EntityId) {
        let blue = world.spawn();
        let red = world.spawn();
        world[a].relations.set_team(Some(blue));
        world[b].relations.set_team(Some(red));
    }

    #[test]
    fn test_circle_circle_within_radius_sum() {
        let mut world = test_world();
        let a = spawn_shape(&mut world, 0.0, 0.0, 3, 10.0, 0.0);
        let b = spawn_shape(&mut world, 15.0, 0.0, 3, 10.0, 0.0);
        opposing_teams(&mut world, a, b);
        world.tick();

        let hits = find_collisions(&mut world, a);
        assert_eq!(hits.as_slice(), &[b]);
        let hits = find_collisions(&mut world, b);
        assert_eq!(hits.as_slice(), &[a]);
    }

    #[test]
    fn test_circle_circle_apart() {
        let mut world = test_world();
        let a = spawn_shape(&mut world, 0.0, 0.0, 3, 10.0, 0.0);
        let b = spawn_shape(&mut world, 25.0, 0.0, 3, 10.0, 0.0);
        opposing_teams(&mut world, a, b);
        world.tick();

        assert!(find_collisions(&mut world, a).is_empty());
    }

    #[test]
    fn test_circle_rect_closest_point() {
        let mut world = test_world();
        // Circle r=5 at origin; 20x10 rectangle centered at (12, 0): the
        // clamped closest point is (10, 0), squared distance 4 < 25.
        let circle = spawn_shape(&mut world, 0.0, 0.0, 3, 5.0, 0.0);
        let rect = spawn_shape(&mut world, 12.0, 0.0, 2, 20.0, 10.0);
        opposing_teams(&mut world, circle, rect);
        world.tick();

        assert_eq!(find_collisions(&mut world, circle).as_slice(), &[rect]);
    }

    #[test]
    fn test_circle_rect_out_of_reach() {
        let mut world = test_world();
        // Rectangle moved to (20, 0): closest point (10, 0) is 10 away,
        // beyond the radius of 5.
        let circle = spawn_shape(&mut world, 0.0, 0.0, 3, 5.0, 0.0);
        let rect = spawn_shape(&mut world, 20.0, 0.0, 2, 20.0, 10.0);
        opposing_teams(&mut world, circle, rect);
        world.tick();

        assert!(find_collisions(&mut world, circle).is_empty());
    }

    #[test]
    fn test_rect_rect_never_collides() {
        let mut world = test_world();
        let a = spawn_shape(&mut world, 0.0, 0.0, 2, 50.0, 50.0);
        let b = spawn_shape(&mut world, 1.0, 0.0, 2, 50.0, 50.0);
        opposing_teams(&mut world, a, b);
        world.tick();

        // Fully overlapping rectangles still report nothing.
        assert!(find_collisions(&mut world, a).is_empty());
        assert!(find_collisions(&mut world, b).is_empty());
    }

    #[test]
    fn test_sides_zero_reports_nothing_either_way() {
        let mut world = test_world();
        let marker = spawn_shape(&mut world, 0.0, 0.0, 0, 50.0, 0.0);
        let circle = spawn_shape(&mut world, 0.0, 0.0, 3, 50.0, 0.0);
        opposing_teams(&mut world, marker, circle);
        world.tick();

        assert!(find_collisions(&mut world, marker).is_empty());
        assert!(find_collisions(&mut world, circle).is_empty());
    }

    #[test]
    fn test_same_team_no_own_team_collision() {
        let mut world = test_world();
        let a = spawn_shape(&mut world, 0.0, 0.0, 3, 10.0, 0.0);
        let b = spawn_shape(&mut world, 5.0, 0.0, 3, 10.0, 0.0);
        let team = world.spawn();
        world[a].relations.set_team(Some(team));
        world[b].relations.set_team(Some(team));
        world[a]
            .physics
            .set_object_flag(ObjectFlags::NO_OWN_TEAM_COLLISION, true);
        world.tick();

        // The flag on either side suppresses the pair.
        assert!(find_collisions(&mut world, a).is_empty());
        assert!(find_collisions(&mut world, b).is_empty());
    }

    #[test]
    fn test_same_team_without_flag_still_collides() {
        let mut world = test_world();
        let a = spawn_shape(&mut world, 0.0, 0.0, 3, 10.0, 0.0);
        let b = spawn_shape(&mut world, 5.0, 0.0, 3, 10.0, 0.0);
        let team = world.spawn();
        world[a].relations.set_team(Some(team));
        world[b].relations.set_team(Some(team));
        world.tick();

        assert_eq!(find_collisions(&mut world, a).as_slice(), &[b]);
    }

    #[test]
    fn test_only_same_owner_collision() {
        let mut world = test_world();
        let a = spawn_shape(&mut world, 0.0, 0.0, 3, 10.0, 0.0);
        let b = spawn_shape(&mut world, 5.0, 0.0, 3, 10.0, 0.0);
        let team = world.spawn();
        let owner_a = world.spawn();
        let owner_b = world.spawn();
        world[a].relations.set_team(Some(team));
        world[b].relations.set_team(Some(team));
        world[a].relations.set_owner(Some(owner_a));
        world[b].relations.set_owner(Some(owner_b));
        world[a]
            .physics
            .set_object_flag(ObjectFlags::ONLY_SAME_OWNER_COLLISION, true);
        world.tick();

        // Same team, different owners, flag set: suppressed.
        assert!(find_collisions(&mut world, a).is_empty());

        // Same owner on both: the owner rule no longer applies.
        world[b].relations.set_owner(Some(owner_a));
        world.tick();
        assert_eq!(find_collisions(&mut world, a).as_slice(), &[b]);
    }

    #[test]
    fn test_dying_candidates_skipped() {
        let mut world = test_world();
        let a = spawn_shape(&mut world, 0.0, 0.0, 3, 10.0, 0.0);
        let b = spawn_shape(&mut world, 5.0, 0.0, 3, 10.0, 0.0);
        opposing_teams(&mut world, a, b);
        world.tick();
        assert!(!find_collisions(&mut world, a).is_empty());

        world.destroy(b, true);
        world.tick();
        assert!(find_collisions(&mut world, a).is_empty());
    }

    #[test]
    fn test_cache_is_per_tick() {
        let mut world = test_world();
        let a = spawn_shape(&mut world, 0.0, 0.0, 3, 10.0, 0.0);
        let b = spawn_shape(&mut world, 5.0, 0.0, 3, 10.0, 0.0);
        opposing_teams(&mut world, a, b);
        world.tick();

        let first = find_collisions(&mut world, a);
        // Moving the candidate does not change the answer within a tick.
        world[b].set_position(500.0, 500.0);
        let second = find_collisions(&mut world, a);
        assert_eq!(first, second);

        // The next tick recomputes against the new positions.
        world.tick();
        assert!(find_collisions(&mut world, a).is_empty());
    }

    #[test]
    fn test_stale_handle_reports_nothing() {
        let mut world = test_world();
        let a = spawn_shape(&mut world, 0.0, 0.0, 3, 10.0, 0.0);
        world.tick();
        world.destroy(a, false);
        assert!(find_collisions(&mut world, a).is_empty());
    }
}
