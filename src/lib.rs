// Re-export all public modules so they can be used from main.rs
pub mod config;
pub mod logging;
pub mod ui;

// MVC Architecture
pub mod model;
pub mod view;
pub mod controller;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::closure::Closure;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::{JsCast, JsValue, prelude::wasm_bindgen};
#[cfg(target_arch = "wasm32")]
use web_sys::{Window, Document, HtmlCanvasElement, KeyboardEvent, MouseEvent, Event};
#[cfg(target_arch = "wasm32")]
use std::rc::Rc;
#[cfg(target_arch = "wasm32")]
use std::cell::RefCell;

#[cfg(target_arch = "wasm32")]
use config::GameConfig;
#[cfg(target_arch = "wasm32")]
use controller::{FrameLoopContext, FrameStats, InputEvent, Session};
#[cfg(target_arch = "wasm32")]
use controller::input::wasm::{keyboard_event_to_input, mouse_move_to_input};
#[cfg(target_arch = "wasm32")]
use view::{GpuContext, RenderState};


#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn start() -> Result<(), JsValue> {
    logging::init();
    let (window, document, canvas) = init_canvas()?;
    setup_app(window, document, canvas).await
}

/// Main application setup for WASM
#[cfg(target_arch = "wasm32")]
async fn setup_app(window: Window, document: Document, canvas: HtmlCanvasElement) -> Result<(), JsValue> {
    let (width, height) = (canvas.width(), canvas.height());

    // Initialize GPU
    let gpu = GpuContext::for_canvas(&canvas, width, height)
        .await
        .map_err(|e| js_error(format!("GPU init failed: {e:#}")))?;

    let now = window.performance().map(|p| p.now()).unwrap_or(0.0);
    let seed = (js_sys::Math::random() * u64::MAX as f64) as u64;
    let session = Rc::new(RefCell::new(Session::new(GameConfig::default(), seed, width, height, now)));

    let render_state = RenderState::new(gpu.device.as_ref(), gpu.format, gpu.config.alpha_mode, width, height);
    let egui_events: Rc<RefCell<Vec<egui::Event>>> = Rc::new(RefCell::new(Vec::new()));

    setup_input_listeners(&document, &window, &canvas, session.clone(), egui_events.clone())?;

    let mut frame_ctx = FrameLoopContext {
        session,
        gpu,
        render_state,
        egui_ctx: egui::Context::default(),
        egui_events,
        stats: FrameStats::default(),
        window: window.clone(),
        document,
        canvas,
    };

    // Continuous redraw using requestAnimationFrame
    RcCellCallback::new(window, move || frame_ctx.frame()).start()
}

/// Request fullscreen on the document, or leave it. Failures are logged and otherwise ignored.
#[cfg(target_arch = "wasm32")]
pub(crate) fn toggle_fullscreen(document: &Document) {
    if document.fullscreen_element().is_some() {
        document.exit_fullscreen();
        tracing::info!("leaving fullscreen");
        return;
    }
    let result = match document.document_element() {
        Some(el) => el.request_fullscreen(),
        None => Err(js_error("no document element")),
    };
    match result {
        Ok(()) => tracing::info!("entering fullscreen"),
        Err(e) => tracing::warn!("fullscreen request failed: {e:?}"),
    }
}

#[cfg(target_arch = "wasm32")]
fn pointer_button(button: i16) -> Option<egui::PointerButton> {
    match button {
        0 => Some(egui::PointerButton::Primary),
        1 => Some(egui::PointerButton::Middle),
        2 => Some(egui::PointerButton::Secondary),
        _ => None,
    }
}

/// Setup all input event listeners. Handlers only feed the session's input state and egui's queue.
#[cfg(target_arch = "wasm32")]
fn setup_input_listeners(
    document: &Document,
    window: &Window,
    canvas: &HtmlCanvasElement,
    session: Rc<RefCell<Session>>,
    egui_events: Rc<RefCell<Vec<egui::Event>>>,
) -> Result<(), JsValue> {
    let bindings = session.borrow().input.bindings().clone();

    // Keyboard down
    {
        let session = session.clone();
        let document_for_keys = document.clone();
        let bindings = bindings.clone();
        let keydown = Closure::wrap(Box::new(move |e: KeyboardEvent| {
            let key = e.key();

            if bindings.is_escape(&key) {
                document_for_keys.exit_pointer_lock();
            } else if bindings.wants_to_toggle_fullscreen(&key) {
                if !e.repeat() {
                    toggle_fullscreen(&document_for_keys);
                }
                e.prevent_default();
            }

            // Keep arrows and space from scrolling the page
            if bindings.is_bound(&key) {
                e.prevent_default();
            }

            session.borrow_mut().handle_input(&keyboard_event_to_input(&e, true));
        }) as Box<dyn FnMut(KeyboardEvent)>);
        document.add_event_listener_with_callback("keydown", keydown.as_ref().unchecked_ref())?;
        keydown.forget();
    }

    // Keyboard up
    {
        let session = session.clone();
        let keyup = Closure::wrap(Box::new(move |e: KeyboardEvent| {
            session.borrow_mut().handle_input(&keyboard_event_to_input(&e, false));
        }) as Box<dyn FnMut(KeyboardEvent)>);
        document.add_event_listener_with_callback("keyup", keyup.as_ref().unchecked_ref())?;
        keyup.forget();
    }

    // Focus loss - clear all keys
    {
        let session = session.clone();
        let blur = Closure::wrap(Box::new(move |_e: Event| {
            session.borrow_mut().handle_input(&InputEvent::FocusLost);
        }) as Box<dyn FnMut(Event)>);
        window.add_event_listener_with_callback("blur", blur.as_ref().unchecked_ref())?;
        blur.forget();
    }

    // Visibility change - clear all keys
    {
        let session = session.clone();
        let doc_vis = document.clone();
        let visibility = Closure::wrap(Box::new(move |_e: Event| {
            let visible = !doc_vis.hidden();
            session.borrow_mut().handle_input(&InputEvent::VisibilityChanged { visible });
        }) as Box<dyn FnMut(Event)>);
        document.add_event_listener_with_callback("visibilitychange", visibility.as_ref().unchecked_ref())?;
        visibility.forget();
    }

    // Pointer lock change: the only place the capture flag is written
    {
        let session = session.clone();
        let doc_pl = document.clone();
        let plc = Closure::wrap(Box::new(move |_e: Event| {
            let locked = doc_pl.pointer_lock_element().is_some();
            tracing::info!(locked, "pointer lock changed");
            session.borrow_mut().handle_input(&InputEvent::PointerLockChanged { locked });
        }) as Box<dyn FnMut(Event)>);
        document.add_event_listener_with_callback("pointerlockchange", plc.as_ref().unchecked_ref())?;
        plc.forget();
    }

    // Canvas click enters pointer lock once the game runs
    {
        let session = session.clone();
        let canvas_click = canvas.clone();
        let click = Closure::wrap(Box::new(move |_e: MouseEvent| {
            let s = session.borrow();
            if s.is_playing() && !s.input.pointer_locked {
                canvas_click.request_pointer_lock();
            }
        }) as Box<dyn FnMut(MouseEvent)>);
        canvas.add_event_listener_with_callback("click", click.as_ref().unchecked_ref())?;
        click.forget();
    }

    // Mouse move: look while captured, otherwise drive the egui cursor
    {
        let session = session.clone();
        let egui_events_q = egui_events.clone();
        let mm = Closure::wrap(Box::new(move |e: MouseEvent| {
            if session.borrow().input.pointer_locked {
                session.borrow_mut().handle_input(&mouse_move_to_input(&e));
            } else {
                let pos = egui::pos2(e.client_x() as f32, e.client_y() as f32);
                egui_events_q.borrow_mut().push(egui::Event::PointerMoved(pos));
            }
        }) as Box<dyn FnMut(MouseEvent)>);
        document.add_event_listener_with_callback("mousemove", mm.as_ref().unchecked_ref())?;
        mm.forget();
    }

    // Mouse buttons go to egui while the cursor is free
    for (event_name, pressed) in [("mousedown", true), ("mouseup", false)] {
        let session = session.clone();
        let egui_events_q = egui_events.clone();
        let handler = Closure::wrap(Box::new(move |e: MouseEvent| {
            if session.borrow().input.pointer_locked {
                return;
            }
            let Some(button) = pointer_button(e.button()) else {
                return;
            };
            egui_events_q.borrow_mut().push(egui::Event::PointerButton {
                pos: egui::pos2(e.client_x() as f32, e.client_y() as f32),
                button,
                pressed,
                modifiers: egui::Modifiers::default(),
            });
        }) as Box<dyn FnMut(MouseEvent)>);
        document.add_event_listener_with_callback(event_name, handler.as_ref().unchecked_ref())?;
        handler.forget();
    }

    // Context menu prevention
    {
        let contextmenu = Closure::wrap(Box::new(move |e: MouseEvent| {
            e.prevent_default();
        }) as Box<dyn FnMut(MouseEvent)>);
        document.add_event_listener_with_callback("contextmenu", contextmenu.as_ref().unchecked_ref())?;
        contextmenu.forget();
    }

    Ok(())
}

/// Full-window canvas sized in physical pixels
#[cfg(target_arch = "wasm32")]
fn init_canvas() -> Result<(Window, Document, HtmlCanvasElement), JsValue> {
    let window = web_sys::window().ok_or(js_error("no global `window`"))?;
    let document = window.document().ok_or(js_error("no document on window"))?;
    let body = document.body().ok_or(js_error("no body on document"))?;
    let canvas_el = document
        .create_element("canvas")?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| js_error("failed to create canvas"))?;

    let dpr = window.device_pixel_ratio();
    let css_w = window.inner_width()?.as_f64().unwrap_or(800.0);
    let css_h = window.inner_height()?.as_f64().unwrap_or(600.0);
    canvas_el.set_width((css_w * dpr) as u32);
    canvas_el.set_height((css_h * dpr) as u32);

    let style = canvas_el.style();
    style.set_property("width", "100vw")?;
    style.set_property("height", "100vh")?;
    style.set_property("display", "block")?;
    body.style().set_property("margin", "0")?;
    body.style().set_property("overflow", "hidden")?;

    body.append_child(&canvas_el)?;
    tracing::info!(width = canvas_el.width(), height = canvas_el.height(), "canvas created");
    Ok((window, document, canvas_el))
}

#[cfg(target_arch = "wasm32")]
fn js_error<E: Into<String>>(msg: E) -> JsValue {
    JsValue::from_str(&msg.into())
}

#[cfg(target_arch = "wasm32")]
struct RcCellCallback {
    inner: Rc<RefCell<Box<dyn FnMut()>>>,
    window: Window,
}

#[cfg(target_arch = "wasm32")]
impl RcCellCallback {
    fn new(window: Window, f: impl FnMut() + 'static) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Box::new(f))),
            window,
        }
    }

    fn start(self) -> Result<(), JsValue> {
        let inner = self.inner.clone();
        let window = self.window.clone();

        let callback = Rc::new(RefCell::new(None::<Closure<dyn FnMut()>>));
        let callback_clone = callback.clone();

        *callback.borrow_mut() = Some(Closure::wrap(Box::new(move || {
            inner.borrow_mut().as_mut()();

            // Recursively schedule next frame
            if let Some(cb) = callback_clone.borrow().as_ref() {
                if let Err(e) = window.request_animation_frame(cb.as_ref().unchecked_ref()) {
                    tracing::error!("requestAnimationFrame failed, frame loop stopped: {e:?}");
                }
            }
        }) as Box<dyn FnMut()>));

        if let Some(cb) = callback.borrow().as_ref() {
            self.window.request_animation_frame(cb.as_ref().unchecked_ref())?;
        }

        // Leak the closure to keep it alive
        std::mem::forget(callback);
        Ok(())
    }
}
