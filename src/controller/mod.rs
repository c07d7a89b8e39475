// CONTROLLER: Input, game logic, and update loop
pub mod input;
pub mod collision;
pub mod player_controller;
pub mod session;
pub mod frame_loop;

pub use input::{InputEvent, InputState, KeyBindings};
pub use player_controller::PlayerController;
pub use session::{Mode, MenuPanel, Session, UiAction, Viewport};
pub use frame_loop::{advance_frame, FrameStats, CameraUniform, LightingUniform, NodeUniform};
#[cfg(target_arch = "wasm32")]
pub use frame_loop::FrameLoopContext;
