use anyhow::Context as _;
use winit::{
    event::*,
    event_loop::EventLoop,
    keyboard::PhysicalKey,
    window::{CursorGrabMode, Fullscreen, Window},
};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

// Import from the library crate
use ridgewalk::{
    config::GameConfig,
    controller::{self, FrameStats, InputEvent, KeyBindings, Session, UiAction},
    logging, ui,
    view::{EguiFrame, GpuContext, RenderState},
};
use controller::input::native::key_name;

struct App {
    window: Arc<Window>,
    gpu: GpuContext,
    render_state: RenderState,

    // egui
    egui_state: egui_winit::State,
    egui_ctx: egui::Context,

    // Game state
    session: Session,
    bindings: KeyBindings,

    // Frame timing
    started: Instant,
    stats: FrameStats,
}

impl App {
    async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let size = window.inner_size();
        let gpu = GpuContext::for_window(window.clone(), size.width, size.height).await?;
        let render_state = RenderState::new(
            gpu.device.as_ref(),
            gpu.format,
            gpu.config.alpha_mode,
            gpu.config.width,
            gpu.config.height,
        );

        // Initialize egui
        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            None,
            None,
            None,
        );

        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default();
        let session = Session::new(GameConfig::default(), seed, gpu.config.width, gpu.config.height, 0.0);
        let bindings = session.input.bindings().clone();

        Ok(Self {
            window,
            gpu,
            render_state,
            egui_state,
            egui_ctx,
            session,
            bindings,
            started: Instant::now(),
            stats: FrameStats::default(),
        })
    }

    fn now_ms(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1000.0
    }

    fn input(&mut self, event: &WindowEvent) -> bool {
        // Let egui see the event first, unless the cursor belongs to the game
        if !self.session.input.pointer_locked {
            let egui_captured = self.egui_state.on_window_event(self.window.as_ref(), event).consumed;
            if egui_captured {
                return true;
            }
        }

        match event {
            WindowEvent::KeyboardInput { event: KeyEvent { state, physical_key, repeat, .. }, .. } => {
                let PhysicalKey::Code(code) = physical_key else {
                    return false;
                };
                let Some(name) = key_name(*code) else {
                    return false;
                };
                match state {
                    ElementState::Pressed => {
                        if self.bindings.is_escape(name) {
                            self.release_cursor();
                        } else if self.bindings.wants_to_toggle_fullscreen(name) && !repeat {
                            self.toggle_fullscreen();
                        }
                        self.session.handle_input(&InputEvent::KeyDown(name.to_string()));
                    }
                    ElementState::Released => {
                        self.session.handle_input(&InputEvent::KeyUp(name.to_string()));
                    }
                }
                true
            }
            WindowEvent::MouseInput { state: ElementState::Pressed, button: MouseButton::Left, .. } => {
                if self.session.is_playing() && !self.session.input.pointer_locked {
                    self.capture_cursor();
                }
                true
            }
            WindowEvent::Focused(false) => {
                self.session.handle_input(&InputEvent::FocusLost);
                self.release_cursor();
                false
            }
            WindowEvent::Occluded(occluded) => {
                self.session.handle_input(&InputEvent::VisibilityChanged { visible: !occluded });
                false
            }
            _ => false,
        }
    }

    fn capture_cursor(&mut self) {
        let grabbed = self
            .window
            .set_cursor_grab(CursorGrabMode::Locked)
            .or_else(|_| self.window.set_cursor_grab(CursorGrabMode::Confined));
        match grabbed {
            Ok(()) => {
                self.window.set_cursor_visible(false);
                tracing::info!("cursor captured");
                self.session.handle_input(&InputEvent::PointerLockChanged { locked: true });
            }
            Err(e) => tracing::warn!("cursor grab failed: {e}"),
        }
    }

    fn release_cursor(&mut self) {
        if !self.session.input.pointer_locked {
            return;
        }
        if let Err(e) = self.window.set_cursor_grab(CursorGrabMode::None) {
            tracing::warn!("cursor release failed: {e}");
        }
        self.window.set_cursor_visible(true);
        tracing::info!("cursor released");
        self.session.handle_input(&InputEvent::PointerLockChanged { locked: false });
    }

    fn toggle_fullscreen(&self) {
        if self.window.fullscreen().is_some() {
            self.window.set_fullscreen(None);
            tracing::info!("leaving fullscreen");
        } else {
            self.window.set_fullscreen(Some(Fullscreen::Borderless(None)));
            tracing::info!("entering fullscreen");
        }
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.render_state
                .resize(self.gpu.device.as_ref(), &self.gpu.surface, new_size.width, new_size.height);
            self.session.resize(new_size.width, new_size.height);
        }
    }

    fn handle_mouse_motion(&mut self, dx: f64, dy: f64) {
        self.session.handle_input(&InputEvent::MouseMove { dx: dx as f32, dy: dy as f32 });
    }

    fn render_ui(&mut self) -> EguiFrame {
        let raw_input = self.egui_state.take_egui_input(&self.window);
        let (mut output, actions) = ui::build_ui(&self.egui_ctx, raw_input, &self.session, &self.stats);

        for action in actions {
            match action {
                UiAction::ToggleFullscreen => self.toggle_fullscreen(),
                other => self.session.apply(other),
            }
        }

        self.egui_state.handle_platform_output(&self.window, std::mem::take(&mut output.platform_output));
        let primitives = self.egui_ctx.tessellate(std::mem::take(&mut output.shapes), output.pixels_per_point);
        EguiFrame {
            primitives,
            textures_delta: output.textures_delta,
            pixels_per_point: output.pixels_per_point,
        }
    }

    fn redraw(&mut self) {
        let now = self.now_ms();
        self.stats.record(now);

        let viewport = controller::advance_frame(&mut self.session, now);
        let egui_frame = self.render_ui();

        let (scene, camera) = self.session.view();
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
}

#[allow(deprecated)]
fn main() -> anyhow::Result<()> {
    logging::init();

    let event_loop = EventLoop::new().context("failed to create event loop")?;
    let window_attributes = Window::default_attributes()
        .with_title("Ridgewalk")
        .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));
    let window = Arc::new(event_loop.create_window(window_attributes).context("failed to create window")?);

    let mut app = pollster::block_on(App::new(window))?;
    tracing::info!("native window ready");

    event_loop.run(move |event, elwt| {
        match event {
            Event::WindowEvent {
                ref event,
                window_id,
            } if window_id == app.window.id() => {
                if !app.input(event) {
                    match event {
                        WindowEvent::CloseRequested => elwt.exit(),
                        WindowEvent::Resized(physical_size) => app.resize(*physical_size),
                        WindowEvent::RedrawRequested => app.redraw(),
                        _ => {}
                    }
                }
            }
            Event::DeviceEvent { event: DeviceEvent::MouseMotion { delta }, .. } => {
                app.handle_mouse_motion(delta.0, delta.1);
            }
            Event::AboutToWait => {
                app.window.request_redraw();
            }
            _ => {}
        }
    })?;

    Ok(())
}
