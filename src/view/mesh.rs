use bytemuck::NoUninit;
use glam::Vec3;
use wgpu::util::DeviceExt;

use crate::config::color_to_rgba;
use crate::model::Shape;

/// Sides on a cone's base ring
pub const CONE_SEGMENTS: usize = 24;

#[repr(C)]
#[derive(Debug, Clone, Copy, NoUninit)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
}

pub struct MeshBuffer {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

#[derive(Debug, Clone)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn empty() -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.indices.is_empty()
    }

    /// Flat-shaded geometry for a shape, with the color baked into every vertex
    pub fn for_shape(shape: &Shape, color: u32) -> Self {
        let color = linear_color(color);
        match *shape {
            Shape::Cuboid { size } => cuboid(size, color),
            Shape::Cone { radius, height } => cone(radius, height, CONE_SEGMENTS, color),
            Shape::Plane { size } => plane(size, color),
        }
    }

    fn push_triangle(&mut self, a: Vec3, b: Vec3, c: Vec3, color: [f32; 4]) {
        let normal = (b - a).cross(c - a).normalize_or_zero().to_array();
        let base = self.vertices.len() as u32;
        for p in [a, b, c] {
            self.vertices.push(Vertex { pos: p.to_array(), normal, color });
        }
        self.indices.extend_from_slice(&[base, base + 1, base + 2]);
    }

    /// Quad spanned by `u` and `v` around `center`; faces the side `u x v` points to
    fn push_quad(&mut self, center: Vec3, u: Vec3, v: Vec3, color: [f32; 4]) {
        let normal = u.cross(v).normalize_or_zero().to_array();
        let base = self.vertices.len() as u32;
        for p in [center - u - v, center + u - v, center + u + v, center - u + v] {
            self.vertices.push(Vertex { pos: p.to_array(), normal, color });
        }
        self.indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    pub fn upload(&self, device: &wgpu::Device) -> MeshBuffer {
        let vertices = bytemuck::cast_slice(&self.vertices);
        let indices = bytemuck::cast_slice(&self.indices);

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Vertex Buffer"),
            contents: vertices,
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Index Buffer"),
            contents: indices,
            usage: wgpu::BufferUsages::INDEX,
        });

        MeshBuffer {
            vertex_buffer,
            index_buffer,
            index_count: self.indices.len() as u32,
        }
    }
}

/// Box centered on the origin
pub fn cuboid(size: Vec3, color: [f32; 4]) -> Mesh {
    let half = size / 2.0;
    let mut mesh = Mesh::empty();
    for n in [Vec3::X, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y, Vec3::Z, Vec3::NEG_Z] {
        let v = if n.y.abs() > 0.5 { Vec3::Z } else { Vec3::Y };
        // u x v == n keeps every face counter-clockwise from outside
        let u = v.cross(n);
        mesh.push_quad(n * half, u * half, v * half, color);
    }
    mesh
}

/// Upright cone centered on the origin: apex at `+height / 2`, base at `-height / 2`
pub fn cone(radius: f32, height: f32, segments: usize, color: [f32; 4]) -> Mesh {
    let segments = segments.max(3);
    let apex = Vec3::new(0.0, height / 2.0, 0.0);
    let base_center = Vec3::new(0.0, -height / 2.0, 0.0);
    let ring = |i: usize| {
        let theta = i as f32 / segments as f32 * std::f32::consts::TAU;
        Vec3::new(theta.cos() * radius, -height / 2.0, theta.sin() * radius)
    };

    let mut mesh = Mesh::empty();
    for i in 0..segments {
        let (a, b) = (ring(i), ring(i + 1));
        mesh.push_triangle(apex, b, a, color);
        mesh.push_triangle(base_center, a, b, color);
    }
    mesh
}

/// Square ground tile in the xz plane, facing up
pub fn plane(size: f32, color: [f32; 4]) -> Mesh {
    let half = size / 2.0;
    let mut mesh = Mesh::empty();
    mesh.push_quad(Vec3::ZERO, Vec3::NEG_X * half, Vec3::Z * half, color);
    mesh
}

/// 0xRRGGBB codes are sRGB; the surface expects linear values
pub fn linear_color(code: u32) -> [f32; 4] {
    let [r, g, b, a] = color_to_rgba(code);
    [r.powf(2.2), g.powf(2.2), b.powf(2.2), a]
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

    fn triangles(mesh: &Mesh) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        let at = |i: u32| Vec3::from_array(mesh.vertices[i as usize].pos);
        mesh.indices.chunks(3).map(move |t| [at(t[0]), at(t[1]), at(t[2])])
    }

    fn assert_outward(mesh: &Mesh, center: Vec3) {
        for [a, b, c] in triangles(mesh) {
            let winding_normal = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(winding_normal.dot(centroid - center) > 0.0, "inward face at {centroid:?}");
        }
    }

    #[test]
    fn cuboid_has_six_outward_faces() {
        let mesh = cuboid(Vec3::new(1.0, 2.0, 1.0), WHITE);
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.indices.len(), 36);
        assert_outward(&mesh, Vec3::ZERO);

        let max_y = mesh.vertices.iter().map(|v| v.pos[1]).fold(f32::MIN, f32::max);
        assert_eq!(max_y, 1.0);
    }

    #[test]
    fn cone_faces_point_outward() {
        let mesh = cone(3.0, 10.0, 12, WHITE);
        assert_eq!(mesh.vertices.len(), 12 * 6);
        assert_outward(&mesh, Vec3::ZERO);
        for v in &mesh.vertices {
            assert!((Vec3::from_array(v.normal).length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn plane_faces_up() {
        let mesh = plane(20.0, WHITE);
        assert_eq!(mesh.indices.len(), 6);
        for [a, b, c] in triangles(&mesh) {
            assert!((b - a).cross(c - a).y > 0.0);
        }
        assert!(mesh.vertices.iter().all(|v| v.pos[0].abs() == 10.0 && v.pos[2].abs() == 10.0));
    }

    #[test]
    fn shape_dispatch_bakes_color() {
        let mesh = Mesh::for_shape(&Shape::Cone { radius: 1.0, height: 2.0 }, 0xffffff);
        assert!(!mesh.is_empty());
        assert!(mesh.vertices.iter().all(|v| v.color == [1.0, 1.0, 1.0, 1.0]));
    }
}
