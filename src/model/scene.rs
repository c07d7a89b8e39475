use glam::{Quat, Vec3};

use crate::config::{FieldConfig, ViewConfig};
use crate::model::obstacle::ObstacleField;
use crate::model::transform::{NodeId, Transform, TransformGraph};

/// Geometry of a renderable object, in the object's local space
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    /// Axis-aligned box centered on the origin
    Cuboid { size: Vec3 },
    /// Upright cone centered on the origin, base at `-height / 2`
    Cone { radius: f32, height: f32 },
    /// Square in the xz plane
    Plane { size: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneObject {
    pub node: NodeId,
    pub shape: Shape,
    /// 0xRRGGBB
    pub color: u32,
}

/// Ambient term plus one directional light
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lighting {
    pub ambient: f32,
    /// Direction towards the light
    pub sun_dir: Vec3,
    pub sun_intensity: f32,
}

impl Lighting {
    pub fn from_config(cfg: &ViewConfig) -> Self {
        Self {
            ambient: cfg.ambient,
            sun_dir: cfg.sun_position.normalize_or_zero(),
            sun_intensity: cfg.sun_intensity,
        }
    }
}

/// Everything a renderer needs to draw one viewport
#[derive(Debug, Clone)]
pub struct Scene {
    pub graph: TransformGraph,
    pub objects: Vec<SceneObject>,
    pub lighting: Lighting,
    pub background: u32,
}

impl Scene {
    pub fn new(view: &ViewConfig) -> Self {
        Self {
            graph: TransformGraph::new(),
            objects: Vec::new(),
            lighting: Lighting::from_config(view),
            background: view.sky_color,
        }
    }

    /// Add a node without geometry, e.g. a pivot
    pub fn add_node(&mut self, parent: Option<NodeId>, local: Transform) -> NodeId {
        match parent {
            Some(p) => self.graph.add_child(p, local),
            None => self.graph.add_root(local),
        }
    }

    pub fn add_object(&mut self, parent: Option<NodeId>, local: Transform, shape: Shape, color: u32) -> NodeId {
        let node = self.add_node(parent, local);
        self.objects.push(SceneObject { node, shape, color });
        node
    }

    /// Ground plane plus one cone per obstacle
    pub fn add_terrain(&mut self, field: &ObstacleField, field_cfg: &FieldConfig, view: &ViewConfig) {
        self.add_object(
            None,
            Transform::IDENTITY,
            Shape::Plane { size: field_cfg.ground_size() },
            view.ground_color,
        );
        for obstacle in field.obstacles() {
            self.add_object(
                None,
                Transform {
                    translation: obstacle.position(),
                    rotation: Quat::IDENTITY,
                    scale: Vec3::ONE,
                },
                Shape::Cone { radius: obstacle.radius, height: obstacle.height },
                view.obstacle_color,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::obstacle::Obstacle;
    use glam::Vec2;

    #[test]
    fn terrain_has_ground_and_one_cone_per_obstacle() {
        let view = ViewConfig::default();
        let field = ObstacleField::from_obstacles(vec![
            Obstacle::new(Vec2::new(10.0, 0.0), 4.0, 20.0),
            Obstacle::new(Vec2::new(-10.0, 5.0), 6.0, 14.0),
        ]);
        let mut scene = Scene::new(&view);
        scene.add_terrain(&field, &FieldConfig::default(), &view);

        assert_eq!(scene.objects.len(), 3);
        assert!(matches!(scene.objects[0].shape, Shape::Plane { .. }));
        let cone = scene.objects[2];
        assert_eq!(cone.shape, Shape::Cone { radius: 6.0, height: 14.0 });
        assert!(scene.graph.world_position(cone.node).abs_diff_eq(Vec3::new(-10.0, 7.0, 5.0), 1e-6));
    }
}
