//! Platform-agnostic input handling system

/// Platform-independent input events
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    // Keyboard events, by logical key name ("w", " ", "Shift", "ArrowUp", ...)
    KeyDown(String),
    KeyUp(String),

    // Raw pointer motion while captured
    MouseMove { dx: f32, dy: f32 },

    // Window events
    FocusLost,
    VisibilityChanged { visible: bool },
    PointerLockChanged { locked: bool },
}

/// The six held keys the player controller reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKey {
    Forward,
    Back,
    Left,
    Right,
    Crouch,
    Jump,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MovementFlags {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub crouch: bool,
    pub jump: bool,
}

impl MovementFlags {
    pub fn set(&mut self, key: MoveKey, down: bool) {
        match key {
            MoveKey::Forward => self.forward = down,
            MoveKey::Back => self.back = down,
            MoveKey::Left => self.left = down,
            MoveKey::Right => self.right = down,
            MoveKey::Crouch => self.crouch = down,
            MoveKey::Jump => self.jump = down,
        }
    }
}

/// Unified input state, written by event handlers and read once per tick
#[derive(Debug, Clone)]
pub struct InputState {
    pub keys: MovementFlags,
    pub look_delta: (f32, f32),
    pub pointer_locked: bool,
    bindings: KeyBindings,
}

impl Default for InputState {
    fn default() -> Self {
        Self::new(KeyBindings::default())
    }
}

impl InputState {
    pub fn new(bindings: KeyBindings) -> Self {
        Self {
            keys: MovementFlags::default(),
            look_delta: (0.0, 0.0),
            pointer_locked: false,
            bindings,
        }
    }

    /// Process an input event and update state. Unknown keys are ignored.
    pub fn process_event(&mut self, event: &InputEvent) {
        match event {
            InputEvent::KeyDown(key) => {
                if let Some(k) = self.bindings.action_for(key) {
                    self.keys.set(k, true);
                }
            }
            InputEvent::KeyUp(key) => {
                if let Some(k) = self.bindings.action_for(key) {
                    self.keys.set(k, false);
                }
            }
            InputEvent::MouseMove { dx, dy } => {
                self.look_delta.0 += dx;
                self.look_delta.1 += dy;
            }
            InputEvent::FocusLost | InputEvent::VisibilityChanged { .. } => {
                self.clear_keys();
            }
            InputEvent::PointerLockChanged { locked } => {
                if self.pointer_locked != *locked {
                    tracing::debug!(locked, "pointer lock changed");
                }
                self.pointer_locked = *locked;
                if !locked {
                    self.look_delta = (0.0, 0.0);
                }
            }
        }
    }

    pub fn clear_keys(&mut self) {
        self.keys = MovementFlags::default();
    }

    /// Take the motion accumulated since the last tick
    pub fn consume_look(&mut self) -> (f32, f32) {
        std::mem::take(&mut self.look_delta)
    }

    pub fn bindings(&self) -> &KeyBindings {
        &self.bindings
    }
}

/// Key mapping configuration
#[derive(Debug, Clone)]
pub struct KeyBindings {
    pub forward: Vec<String>,
    pub back: Vec<String>,
    pub left: Vec<String>,
    pub right: Vec<String>,
    pub crouch: Vec<String>,
    pub jump: Vec<String>,
    pub toggle_fullscreen: String,
    pub escape: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let keys = |names: &[&str]| names.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self {
            forward: keys(&["w", "ArrowUp"]),
            back: keys(&["s", "ArrowDown"]),
            left: keys(&["a", "ArrowLeft"]),
            right: keys(&["d", "ArrowRight"]),
            crouch: keys(&["Shift"]),
            jump: keys(&[" "]),
            toggle_fullscreen: "f".to_string(),
            escape: "Escape".to_string(),
        }
    }
}

impl KeyBindings {
    pub fn action_for(&self, key: &str) -> Option<MoveKey> {
        let key = normalize_key(key);
        let bound = |names: &[String]| names.iter().any(|n| normalize_key(n) == key);

        if bound(&self.forward) {
            Some(MoveKey::Forward)
        } else if bound(&self.back) {
            Some(MoveKey::Back)
        } else if bound(&self.left) {
            Some(MoveKey::Left)
        } else if bound(&self.right) {
            Some(MoveKey::Right)
        } else if bound(&self.crouch) {
            Some(MoveKey::Crouch)
        } else if bound(&self.jump) {
            Some(MoveKey::Jump)
        } else {
            None
        }
    }

    pub fn wants_to_toggle_fullscreen(&self, key: &str) -> bool {
        normalize_key(key) == normalize_key(&self.toggle_fullscreen)
    }

    pub fn is_escape(&self, key: &str) -> bool {
        key == self.escape
    }

    /// Keys whose browser default (scrolling, find-as-you-type) should be suppressed
    pub fn is_bound(&self, key: &str) -> bool {
        self.action_for(key).is_some()
    }
}

/// Single characters compare case-insensitively so a held Shift turns "w" into "W" harmlessly
fn normalize_key(key: &str) -> String {
    let mut chars = key.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => c.to_lowercase().collect(),
        _ => key.to_string(),
    }
}

#[cfg(target_arch = "wasm32")]
pub mod wasm {
    use super::*;
    use web_sys::{KeyboardEvent, MouseEvent};

    pub fn keyboard_event_to_input(e: &KeyboardEvent, is_down: bool) -> InputEvent {
        let key = e.key();
        if is_down {
            InputEvent::KeyDown(key)
        } else {
            InputEvent::KeyUp(key)
        }
    }

    pub fn mouse_move_to_input(e: &MouseEvent) -> InputEvent {
        InputEvent::MouseMove {
            dx: e.movement_x() as f32,
            dy: e.movement_y() as f32,
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub mod native {
    use winit::keyboard::KeyCode;

    /// Logical key name matching what the browser reports for the same key
    pub fn key_name(code: KeyCode) -> Option<&'static str> {
        let name = match code {
            KeyCode::KeyW => "w",
            KeyCode::KeyA => "a",
            KeyCode::KeyS => "s",
            KeyCode::KeyD => "d",
            KeyCode::KeyF => "f",
            KeyCode::ArrowUp => "ArrowUp",
            KeyCode::ArrowDown => "ArrowDown",
            KeyCode::ArrowLeft => "ArrowLeft",
            KeyCode::ArrowRight => "ArrowRight",
            KeyCode::ShiftLeft | KeyCode::ShiftRight => "Shift",
            KeyCode::Space => " ",
            KeyCode::Escape => "Escape",
            _ => return None,
        };
        Some(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn down(key: &str) -> InputEvent {
        InputEvent::KeyDown(key.to_string())
    }

    fn up(key: &str) -> InputEvent {
        InputEvent::KeyUp(key.to_string())
    }

    #[test]
    fn key_transitions_set_and_clear_flags() {
        let mut input = InputState::default();
        input.process_event(&down("w"));
        input.process_event(&down("Shift"));
        input.process_event(&down(" "));
        assert!(input.keys.forward && input.keys.crouch && input.keys.jump);

        input.process_event(&up("w"));
        assert!(!input.keys.forward);
        assert!(input.keys.crouch);
    }

    #[test]
    fn shifted_letters_still_match() {
        let mut input = InputState::default();
        input.process_event(&down("Shift"));
        input.process_event(&down("D"));
        assert!(input.keys.right);
        input.process_event(&up("d"));
        assert!(!input.keys.right);
    }

    #[test]
    fn arrows_alias_wasd() {
        let mut input = InputState::default();
        input.process_event(&down("ArrowLeft"));
        input.process_event(&down("ArrowDown"));
        assert!(input.keys.left && input.keys.back);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let mut input = InputState::default();
        input.process_event(&down("q"));
        input.process_event(&down("Enter"));
        assert_eq!(input.keys, MovementFlags::default());
    }

    #[test]
    fn look_delta_accumulates_until_consumed() {
        let mut input = InputState::default();
        input.process_event(&InputEvent::MouseMove { dx: 3.0, dy: -1.0 });
        input.process_event(&InputEvent::MouseMove { dx: 2.0, dy: 4.0 });
        assert_eq!(input.consume_look(), (5.0, 3.0));
        assert_eq!(input.consume_look(), (0.0, 0.0));
    }

    #[test]
    fn focus_loss_releases_everything() {
        let mut input = InputState::default();
        input.process_event(&down("w"));
        input.process_event(&down("a"));
        input.process_event(&InputEvent::FocusLost);
        assert_eq!(input.keys, MovementFlags::default());
    }

    #[test]
    fn pointer_lock_follows_platform() {
        let mut input = InputState::default();
        input.process_event(&InputEvent::PointerLockChanged { locked: true });
        assert!(input.pointer_locked);
        input.process_event(&InputEvent::MouseMove { dx: 1.0, dy: 1.0 });
        input.process_event(&InputEvent::PointerLockChanged { locked: false });
        assert!(!input.pointer_locked);
        assert_eq!(input.consume_look(), (0.0, 0.0));
    }

    #[test]
    fn fullscreen_toggle_key() {
        let b = KeyBindings::default();
        assert!(b.wants_to_toggle_fullscreen("F"));
        assert!(!b.wants_to_toggle_fullscreen("g"));
        assert!(b.is_escape("Escape"));
    }
}
