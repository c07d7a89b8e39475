use glam::Vec2;

use crate::model::Obstacle;

/// Below this planar distance the push-out direction is undefined
const COINCIDENT_EPSILON: f32 = 1e-6;

/// The obstacle a move was resolved against
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub index: usize,
    /// Unit vector from the obstacle center towards the player
    pub normal: Vec2,
}

/// Resolve a planar move of a circular body against circular obstacles.
///
/// The first obstacle overlapping `attempted` wins: the body is pushed out along the
/// center-to-body normal until the circles just touch, then the tangential part of the
/// attempted displacement is applied so the body slides around the obstacle. Later
/// obstacles are not checked.
pub fn resolve_move(
    previous: Vec2,
    attempted: Vec2,
    body_radius: f32,
    obstacles: &[Obstacle],
) -> (Vec2, Option<Contact>) {
    for (index, obstacle) in obstacles.iter().enumerate() {
        let offset = attempted - obstacle.center;
        let distance = offset.length();
        let min_distance = obstacle.radius + body_radius;
        if distance >= min_distance {
            continue;
        }

        let normal = if distance > COINCIDENT_EPSILON {
            offset / distance
        } else {
            Vec2::X
        };
        let pushed = obstacle.center + normal * min_distance;

        let displacement = attempted - previous;
        let tangential = displacement - normal * displacement.dot(normal);

        return (pushed + tangential, Some(Contact { index, normal }));
    }
    (attempted, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mountain(x: f32, z: f32, r: f32) -> Obstacle {
        Obstacle::new(Vec2::new(x, z), r, 20.0)
    }

    #[test]
    fn free_move_is_untouched() {
        let obstacles = [mountain(10.0, 0.0, 2.0)];
        let (pos, contact) = resolve_move(Vec2::ZERO, Vec2::new(0.0, -0.2), 0.5, &obstacles);
        assert_eq!(pos, Vec2::new(0.0, -0.2));
        assert!(contact.is_none());
    }

    #[test]
    fn head_on_move_stops_at_surface() {
        let obstacles = [mountain(0.0, -3.0, 2.0)];
        let previous = Vec2::new(0.0, -0.4);
        let attempted = Vec2::new(0.0, -0.6);
        let (pos, contact) = resolve_move(previous, attempted, 0.5, &obstacles);

        let contact = contact.expect("should collide");
        assert_eq!(contact.index, 0);
        assert!(pos.abs_diff_eq(Vec2::new(0.0, -0.5), 1e-5), "{pos:?}");
    }

    #[test]
    fn glancing_move_slides_and_never_penetrates() {
        let obstacle = mountain(0.0, 0.0, 2.0);
        let min = 2.5;
        for i in 0..32 {
            let angle = i as f32 / 32.0 * std::f32::consts::TAU;
            let outward = Vec2::new(angle.cos(), angle.sin());
            let tangent = outward.perp();
            let previous = outward * (min + 0.05);
            // Diagonal step into the surface with a sideways component
            let attempted = previous - outward * 0.2 + tangent * 0.15;

            let (pos, contact) = resolve_move(previous, attempted, 0.5, &[obstacle]);
            assert!(contact.is_some());
            assert!(pos.length() >= min - 1e-4, "penetrated at step {i}: {}", pos.length());

            let moved = pos - previous;
            let contact_tangent = contact.unwrap().normal.perp();
            assert!(moved.dot(contact_tangent).abs() > 1e-3, "slide lost at step {i}");
            assert!(moved.dot(tangent) > 0.0, "slide reversed at step {i}");
        }
    }

    #[test]
    fn coincident_center_pushes_along_x() {
        let obstacles = [mountain(4.0, 4.0, 1.0)];
        let (pos, contact) = resolve_move(Vec2::new(4.0, 4.0), Vec2::new(4.0, 4.0), 0.5, &obstacles);
        assert_eq!(contact.map(|c| c.normal), Some(Vec2::X));
        assert!(pos.is_finite());
        assert!((pos.distance(Vec2::new(4.0, 4.0)) - 1.5).abs() < 1e-5);
    }

    #[test]
    fn only_first_overlap_is_resolved() {
        let obstacles = [mountain(-1.0, 0.0, 1.0), mountain(1.0, 0.0, 1.0)];
        let (_, contact) = resolve_move(Vec2::new(0.0, 2.0), Vec2::new(0.0, 0.0), 0.5, &obstacles);
        assert_eq!(contact.map(|c| c.index), Some(0));
    }
}
