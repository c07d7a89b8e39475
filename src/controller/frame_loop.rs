use glam::{Mat4, Vec3};

use crate::controller::session::{Session, Viewport};
use crate::model::camera::orbit_eye;
use crate::model::Lighting;

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightingUniform {
    pub sun_dir: [f32; 3],
    pub sun_intensity: f32,
    pub ambient: f32,
    pub _pad: [f32; 3],
}

impl From<&Lighting> for LightingUniform {
    fn from(l: &Lighting) -> Self {
        Self {
            sun_dir: l.sun_dir.to_array(),
            sun_intensity: l.sun_intensity,
            ambient: l.ambient,
            _pad: [0.0; 3],
        }
    }
}

/// Per-object model matrix plus the matrix used to carry normals into world space
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct NodeUniform {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
}

impl NodeUniform {
    pub fn from_world(world: Mat4) -> Self {
        Self {
            model: world.to_cols_array_2d(),
            normal: world.inverse().transpose().to_cols_array_2d(),
        }
    }
}

/// Smoothed frame rate, fed with the host's millisecond clock
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameStats {
    last_ms: Option<f64>,
    pub dt_ms: f64,
    pub fps: f32,
}

impl FrameStats {
    pub fn record(&mut self, now_ms: f64) {
        if let Some(last) = self.last_ms {
            self.dt_ms = (now_ms - last).max(0.0);
            if self.dt_ms > 0.0 {
                let instant = (1000.0 / self.dt_ms) as f32;
                self.fps = if self.fps == 0.0 { instant } else { self.fps * 0.9 + instant * 0.1 };
            }
        }
        self.last_ms = Some(now_ms);
    }
}

/// One tick of the frame driver. The menu orbits its camera around the origin,
/// the game advances the player. Returns the viewport that should be drawn.
pub fn advance_frame(session: &mut Session, now_ms: f64) -> Viewport {
    let viewport = session.visible_viewport();
    match viewport {
        Viewport::Menu => {
            let orbit = session.cfg.menu_orbit;
            let angle = (session.elapsed_ms(now_ms) * orbit.angular_speed as f64) as f32;
            let eye = orbit_eye(orbit.radius, orbit.height, angle);
            session.menu.camera.look_at(eye, Vec3::ZERO);
        }
        Viewport::Game => session.tick_player(),
    }
    viewport
}

#[cfg(target_arch = "wasm32")]
pub use self::wasm::FrameLoopContext;

#[cfg(target_arch = "wasm32")]
mod wasm {
    use std::cell::RefCell;
    use std::rc::Rc;
    use web_sys::{Document, HtmlCanvasElement, Window};

    use super::{advance_frame, FrameStats};
    use crate::controller::session::{Session, UiAction};
    use crate::ui;
    use crate::view::{EguiFrame, GpuContext, RenderState};

    /// Everything the requestAnimationFrame callback owns
    pub struct FrameLoopContext {
        pub session: Rc<RefCell<Session>>,
        pub gpu: GpuContext,
        pub render_state: RenderState,
        pub egui_ctx: egui::Context,
        pub egui_events: Rc<RefCell<Vec<egui::Event>>>,
        pub stats: FrameStats,
        pub window: Window,
        pub document: Document,
        pub canvas: HtmlCanvasElement,
    }

    impl FrameLoopContext {
        pub fn frame(&mut self) {
            let now = self.window.performance().map(|p| p.now()).unwrap_or(0.0);
            self.stats.record(now);

            self.handle_resize();
            let viewport = advance_frame(&mut self.session.borrow_mut(), now);
            let egui_frame = self.run_ui(now);

            let session = self.session.borrow();
            let (scene, camera) = session.view();
            self.render_state.draw_frame(
                self.gpu.device.as_ref(),
                self.gpu.queue.as_ref(),
                &self.gpu.surface,
                viewport,
                scene,
                camera,
                Some(egui_frame),
            );
        }

        /// Polled every frame, so it also picks up the size change after a fullscreen toggle
        fn handle_resize(&mut self) {
            let dpr = self.window.device_pixel_ratio();
            let (Ok(w), Ok(h)) = (self.window.inner_width(), self.window.inner_height()) else {
                return;
            };
            let nw = (w.as_f64().unwrap_or(800.0) * dpr) as u32;
            let nh = (h.as_f64().unwrap_or(600.0) * dpr) as u32;
            if nw == 0 || nh == 0 || (nw == self.render_state.width && nh == self.render_state.height) {
                return;
            }

            self.canvas.set_width(nw);
            self.canvas.set_height(nh);
            self.render_state.resize(self.gpu.device.as_ref(), &self.gpu.surface, nw, nh);
            self.session.borrow_mut().resize(nw, nh);
        }

        fn run_ui(&mut self, now: f64) -> EguiFrame {
            let dpr = self.window.device_pixel_ratio() as f32;
            let mut raw_input = egui::RawInput::default();
            raw_input.time = Some(now / 1000.0);
            raw_input.screen_rect = Some(egui::Rect::from_min_size(
                egui::Pos2::new(0.0, 0.0),
                egui::vec2(
                    self.render_state.width as f32 / dpr,
                    self.render_state.height as f32 / dpr,
                ),
            ));
            raw_input.events.extend(self.egui_events.borrow_mut().drain(..));
            self.egui_ctx.set_pixels_per_point(dpr);

            let (mut full_output, actions) = {
                let session = self.session.borrow();
                ui::build_ui(&self.egui_ctx, raw_input, &session, &self.stats)
            };

            for action in actions {
                match action {
                    UiAction::ToggleFullscreen => crate::toggle_fullscreen(&self.document),
                    other => self.session.borrow_mut().apply(other),
                }
            }

            let primitives = self
                .egui_ctx
                .tessellate(std::mem::take(&mut full_output.shapes), full_output.pixels_per_point);
            EguiFrame {
                primitives,
                textures_delta: full_output.textures_delta,
                pixels_per_point: full_output.pixels_per_point,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::controller::input::InputEvent;

    fn session() -> Session {
        Session::new(GameConfig::default(), 3, 800, 600, 0.0)
    }

    #[test]
    fn uniform_layouts_match_shader() {
        assert_eq!(std::mem::size_of::<CameraUniform>(), 64);
        assert_eq!(std::mem::size_of::<LightingUniform>(), 32);
        assert_eq!(std::mem::size_of::<NodeUniform>(), 128);
    }

    #[test]
    fn menu_camera_orbits_origin() {
        let mut s = session();
        assert_eq!(advance_frame(&mut s, 0.0), Viewport::Menu);
        let start = s.menu.camera.eye();
        assert!(start.abs_diff_eq(Vec3::new(150.0, 75.0, 0.0), 1e-3));

        // A quarter turn at 0.0002 rad/ms
        let quarter = std::f64::consts::FRAC_PI_2 / 0.0002;
        advance_frame(&mut s, quarter);
        let eye = s.menu.camera.eye();
        assert!(eye.abs_diff_eq(Vec3::new(0.0, 75.0, 150.0), 1e-2), "eye = {eye:?}");

        let to_origin = (-eye).normalize();
        assert!(s.menu.camera.forward().abs_diff_eq(to_origin, 1e-4));
    }

    #[test]
    fn game_branch_walks_the_player() {
        let mut s = session();
        s.start_game();
        s.handle_input(&InputEvent::PointerLockChanged { locked: true });
        s.handle_input(&InputEvent::KeyDown("w".into()));

        for i in 0..10 {
            assert_eq!(advance_frame(&mut s, i as f64 * 16.0), Viewport::Game);
        }
        let game = s.game.as_ref().unwrap();
        assert!((game.player.position.z - -2.0).abs() < 1e-4);
        assert!(game.camera.eye().z < -1.9);
    }

    #[test]
    fn game_branch_is_frozen_without_capture() {
        let mut s = session();
        s.start_game();
        s.handle_input(&InputEvent::KeyDown("w".into()));
        advance_frame(&mut s, 16.0);
        assert_eq!(s.game.as_ref().unwrap().player.position.z, 0.0);
    }

    #[test]
    fn frame_stats_smooth_fps() {
        let mut stats = FrameStats::default();
        stats.record(0.0);
        assert_eq!(stats.fps, 0.0);
        stats.record(20.0);
        assert!((stats.fps - 50.0).abs() < 1e-3);
        stats.record(30.0);
        assert!((stats.fps - 55.0).abs() < 1e-3);
    }
}
