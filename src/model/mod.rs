// MODEL: Game state and data
pub mod obstacle;
pub mod player;
pub mod transform;
pub mod camera;
pub mod scene;

pub use obstacle::{Obstacle, ObstacleField};
pub use player::{Player, Stance, VerticalMotion};
pub use transform::{NodeId, Transform, TransformGraph};
pub use camera::Camera;
pub use scene::{Scene, SceneObject, Shape, Lighting};
