// VIEW: Rendering and graphics
pub mod mesh;
pub mod render;
pub mod gpu_init;

pub use mesh::{Mesh, MeshBuffer, Vertex};
pub use render::{RenderState, CameraResources, EguiFrame};
pub use gpu_init::GpuContext;
