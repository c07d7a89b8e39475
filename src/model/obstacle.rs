use glam::{Vec2, Vec3};
use rand::Rng;

use crate::config::FieldConfig;

/// A mountain: circular footprint on the ground plane plus a purely visual height
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    /// Center on the ground plane (x, z)
    pub center: Vec2,
    pub radius: f32,
    pub height: f32,
}

impl Obstacle {
    pub fn new(center: Vec2, radius: f32, height: f32) -> Self {
        debug_assert!(radius > 0.0, "obstacle radius must be positive");
        Self { center, radius, height }
    }

    /// World position of the shape's center; the cone sits on the ground
    pub fn position(&self) -> Vec3 {
        Vec3::new(self.center.x, self.height / 2.0, self.center.y)
    }
}

/// Anchor positions for the ring-and-cross layout.
///
/// Walks x from `-boundary` to `boundary` in `spacing` steps, emitting anchors at
/// `z = -B, +B, -B+O, +B-O`, then walks z the same way emitting anchors at
/// `x = -B, +B, -B+O, +B-O`. Corner anchors appear twice, as the two walks overlap.
pub fn anchors(boundary: f32, spacing: f32, offset: f32) -> Vec<Vec2> {
    if spacing <= 0.0 || boundary < 0.0 {
        return Vec::new();
    }

    // Integer step count keeps the walk free of accumulated float drift
    let steps = ((2.0 * boundary) / spacing + 1e-4).floor() as usize;
    let edges = [-boundary, boundary, -boundary + offset, boundary - offset];

    let mut out = Vec::with_capacity((steps + 1) * edges.len() * 2);
    for i in 0..=steps {
        let x = -boundary + i as f32 * spacing;
        for z in edges {
            out.push(Vec2::new(x, z));
        }
    }
    for i in 0..=steps {
        let z = -boundary + i as f32 * spacing;
        for x in edges {
            out.push(Vec2::new(x, z));
        }
    }
    out
}

/// Read-only set of obstacles consulted by the player controller
#[derive(Debug, Clone, Default)]
pub struct ObstacleField {
    obstacles: Vec<Obstacle>,
}

impl ObstacleField {
    /// Place one randomly sized mountain on every anchor of the layout
    pub fn generate<R: Rng>(cfg: &FieldConfig, rng: &mut R) -> Self {
        let obstacles = anchors(cfg.boundary, cfg.spacing, cfg.offset)
            .into_iter()
            .map(|center| {
                let height = cfg.base_height + jitter(rng, cfg.height_jitter);
                let width = cfg.base_width + jitter(rng, cfg.width_jitter);
                Obstacle::new(center, width, height)
            })
            .collect::<Vec<_>>();

        tracing::debug!(count = obstacles.len(), "generated obstacle field");
        Self { obstacles }
    }

    pub fn from_obstacles(obstacles: Vec<Obstacle>) -> Self {
        Self { obstacles }
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }
}

fn jitter<R: Rng>(rng: &mut R, amplitude: f32) -> f32 {
    if amplitude > 0.0 {
        rng.random_range(-amplitude..amplitude)
    } else {
        0.0
    }
}
