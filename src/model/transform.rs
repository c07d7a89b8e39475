use glam::{Mat4, Quat, Vec3};

/// Position, orientation and scale of a node relative to its parent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_translation(translation: Vec3) -> Self {
        Self { translation, ..Self::IDENTITY }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
struct Node {
    local: Transform,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena of transform nodes. A node's world matrix is the product of its ancestors' local
/// matrices, so anything attached under another node follows it automatically.
#[derive(Debug, Clone, Default)]
pub struct TransformGraph {
    nodes: Vec<Node>,
}

impl TransformGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_root(&mut self, local: Transform) -> NodeId {
        self.push(local, None)
    }

    pub fn add_child(&mut self, parent: NodeId, local: Transform) -> NodeId {
        let id = self.push(local, Some(parent));
        self.nodes[parent.0].children.push(id);
        id
    }

    fn push(&mut self, local: Transform, parent: Option<NodeId>) -> NodeId {
        self.nodes.push(Node { local, parent, children: Vec::new() });
        NodeId(self.nodes.len() - 1)
    }

    pub fn local(&self, id: NodeId) -> &Transform {
        &self.nodes[id.0].local
    }

    pub fn local_mut(&mut self, id: NodeId) -> &mut Transform {
        &mut self.nodes[id.0].local
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn world_matrix(&self, id: NodeId) -> Mat4 {
        let mut m = self.nodes[id.0].local.matrix();
        let mut cur = self.nodes[id.0].parent;
        while let Some(p) = cur {
            m = self.nodes[p.0].local.matrix() * m;
            cur = self.nodes[p.0].parent;
        }
        m
    }

    pub fn world_position(&self, id: NodeId) -> Vec3 {
        self.world_matrix(id).transform_point3(Vec3::ZERO)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_inherits_parent_translation() {
        let mut g = TransformGraph::new();
        let body = g.add_root(Transform::from_translation(Vec3::new(5.0, 1.0, -3.0)));
        let eye = g.add_child(body, Transform::from_translation(Vec3::new(0.0, 0.7, 0.0)));

        assert!(g.world_position(eye).abs_diff_eq(Vec3::new(5.0, 1.7, -3.0), 1e-6));

        g.local_mut(body).translation = Vec3::new(-2.0, 0.5, 4.0);
        assert!(g.world_position(eye).abs_diff_eq(Vec3::new(-2.0, 1.2, 4.0), 1e-6));
        assert_eq!(g.parent(eye), Some(body));
        assert_eq!(g.children(body), &[eye]);
    }

    #[test]
    fn nested_rotations_compose() {
        let mut g = TransformGraph::new();
        let yaw = g.add_root(Transform {
            rotation: Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
            ..Transform::IDENTITY
        });
        let tip = g.add_child(yaw, Transform::from_translation(Vec3::new(0.0, 0.0, -1.0)));

        // -z rotated a quarter turn about +y points at -x
        assert!(g.world_position(tip).abs_diff_eq(Vec3::new(-1.0, 0.0, 0.0), 1e-6));
    }
}
