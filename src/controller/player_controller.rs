use glam::{Quat, Vec2, Vec3};
use std::f32::consts::FRAC_PI_2;

use crate::config::PlayerConfig;
use crate::controller::collision::{resolve_move, Contact};
use crate::controller::input::{InputState, MovementFlags};
use crate::model::{Obstacle, Player, Stance, VerticalMotion};

/// Advances the player one frame from the current input: look, stance, jump, gravity,
/// walking and collision, in that order.
pub struct PlayerController {
    pub cfg: PlayerConfig,
}

impl PlayerController {
    pub fn new(cfg: PlayerConfig) -> Self {
        Self { cfg }
    }

    /// One simulation step. Does nothing while the pointer is not captured.
    pub fn tick(&self, player: &mut Player, input: &mut InputState, obstacles: &[Obstacle]) -> Option<Contact> {
        if !input.pointer_locked {
            return None;
        }

        let (dx, dy) = input.consume_look();
        let keys = input.keys;

        self.apply_look(player, dx, dy);
        self.update_stance(player, keys.crouch);
        if keys.jump {
            self.start_jump(player);
        }
        self.integrate_vertical(player);

        let previous = player.position;
        let attempted = previous + self.walk_displacement(player, &keys);
        let (planar, contact) = resolve_move(
            Vec2::new(previous.x, previous.z),
            Vec2::new(attempted.x, attempted.z),
            self.cfg.radius,
            obstacles,
        );
        player.position.x = planar.x;
        player.position.z = planar.y;

        contact
    }

    /// Apply mouse look delta; pitch is clamped to straight up / straight down
    pub fn apply_look(&self, player: &mut Player, dx: f32, dy: f32) {
        player.yaw -= dx * self.cfg.mouse_sensitivity;
        player.pitch = (player.pitch - dy * self.cfg.mouse_sensitivity).clamp(-FRAC_PI_2, FRAC_PI_2);
    }

    /// Crouch while the key is held, stand up as soon as it is released, airborne or not
    pub fn update_stance(&self, player: &mut Player, crouch_held: bool) {
        let target = if crouch_held { Stance::Crouching } else { Stance::Standing };
        if player.stance != target {
            player.stance = target;
            player.position.y = player.resting_height(&self.cfg);
        }
    }

    pub fn start_jump(&self, player: &mut Player) {
        if !player.motion.is_jumping() {
            player.motion = VerticalMotion::Jumping { velocity: self.cfg.jump_force };
        }
    }

    /// Explicit Euler, one fixed step per frame; lands on the stance's resting height
    pub fn integrate_vertical(&self, player: &mut Player) {
        let VerticalMotion::Jumping { velocity } = player.motion else {
            return;
        };

        player.position.y += velocity;
        let velocity = velocity - self.cfg.gravity;

        let rest = player.resting_height(&self.cfg);
        if player.position.y <= rest {
            player.position.y = rest;
            player.motion = VerticalMotion::Grounded;
        } else {
            player.motion = VerticalMotion::Jumping { velocity };
        }
    }

    /// Planar step for this frame, relative to the player's yaw. Forward is -z at yaw 0.
    pub fn walk_displacement(&self, player: &Player, keys: &MovementFlags) -> Vec3 {
        let axis = |pos: bool, neg: bool| (pos as i8 - neg as i8) as f32;
        let local = Vec3::new(axis(keys.right, keys.left), 0.0, axis(keys.back, keys.forward));

        let direction = local.normalize_or_zero();
        if direction == Vec3::ZERO {
            return Vec3::ZERO;
        }

        let mut speed = self.cfg.walk_speed;
        if player.is_crouching() {
            speed *= self.cfg.crouch_speed_factor;
        }
        Quat::from_rotation_y(player.yaw) * (direction * speed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::input::InputEvent;

    fn setup() -> (PlayerController, Player, InputState) {
        let cfg = PlayerConfig::default();
        let player = Player::new(&cfg, 0xff0000);
        let mut input = InputState::default();
        input.process_event(&InputEvent::PointerLockChanged { locked: true });
        (PlayerController::new(cfg), player, input)
    }

    fn press(input: &mut InputState, key: &str) {
        input.process_event(&InputEvent::KeyDown(key.to_string()));
    }

    fn release(input: &mut InputState, key: &str) {
        input.process_event(&InputEvent::KeyUp(key.to_string()));
    }

    #[test]
    fn frozen_without_pointer_lock() {
        let (ctl, mut player, mut input) = setup();
        input.process_event(&InputEvent::PointerLockChanged { locked: false });
        press(&mut input, "w");
        input.process_event(&InputEvent::MouseMove { dx: 100.0, dy: 0.0 });

        let before = player.clone();
        ctl.tick(&mut player, &mut input, &[]);
        assert_eq!(player.position, before.position);
        assert_eq!(player.yaw, before.yaw);
    }

    #[test]
    fn forward_walk_is_exact() {
        let (ctl, mut player, mut input) = setup();
        press(&mut input, "w");
        let n = 25;
        for _ in 0..n {
            ctl.tick(&mut player, &mut input, &[]);
        }
        assert!((player.position.z - -(n as f32) * 0.2).abs() < 1e-4, "z = {}", player.position.z);
        assert!(player.position.x.abs() < 1e-5);
    }

    #[test]
    fn diagonal_is_normalized_and_opposites_cancel() {
        let (ctl, mut player, mut input) = setup();
        press(&mut input, "w");
        press(&mut input, "d");
        ctl.tick(&mut player, &mut input, &[]);
        let planar = Vec2::new(player.position.x, player.position.z);
        assert!((planar.length() - 0.2).abs() < 1e-5);
        assert!(planar.x > 0.0 && planar.y < 0.0);

        press(&mut input, "s");
        press(&mut input, "a");
        let before = player.position;
        ctl.tick(&mut player, &mut input, &[]);
        assert_eq!(player.position, before);
    }

    #[test]
    fn movement_follows_yaw() {
        let (ctl, mut player, mut input) = setup();
        player.yaw = FRAC_PI_2;
        press(&mut input, "w");
        ctl.tick(&mut player, &mut input, &[]);
        // A quarter turn left: forward is now -x
        assert!((player.position.x - -0.2).abs() < 1e-5);
        assert!(player.position.z.abs() < 1e-5);
    }

    #[test]
    fn crouch_slows_walking() {
        let (ctl, mut player, mut input) = setup();
        press(&mut input, "Shift");
        press(&mut input, "w");
        ctl.tick(&mut player, &mut input, &[]);
        assert!((player.position.z - -0.2 * 0.33).abs() < 1e-5);
    }

    #[test]
    fn pitch_never_leaves_clamp() {
        let (ctl, mut player, mut input) = setup();
        let deltas = [5000.0, -12000.0, 300.0, -1.0, 99999.0, -99999.0, 0.5];
        for dy in deltas {
            input.process_event(&InputEvent::MouseMove { dx: dy * 0.3, dy });
            ctl.tick(&mut player, &mut input, &[]);
            assert!(player.pitch >= -FRAC_PI_2 && player.pitch <= FRAC_PI_2);
        }
        assert_eq!(player.pitch, FRAC_PI_2 - 0.5 * 0.002);
    }

    #[test]
    fn mouse_right_turns_right() {
        let (ctl, mut player, mut input) = setup();
        input.process_event(&InputEvent::MouseMove { dx: 50.0, dy: 10.0 });
        ctl.tick(&mut player, &mut input, &[]);
        assert!((player.yaw - -0.1).abs() < 1e-6);
        assert!((player.pitch - -0.02).abs() < 1e-6);
    }

    #[test]
    fn jump_round_trip_lands_exactly() {
        let (ctl, mut player, mut input) = setup();
        let rest = ctl.cfg.normal_height / 2.0;
        assert_eq!(player.position.y, rest);

        press(&mut input, " ");
        ctl.tick(&mut player, &mut input, &[]);
        release(&mut input, " ");
        assert!(player.position.y > rest);
        assert!(player.motion.is_jumping());

        let mut ticks = 0;
        let mut peak = player.position.y;
        while player.motion.is_jumping() {
            ctl.tick(&mut player, &mut input, &[]);
            peak = peak.max(player.position.y);
            ticks += 1;
            assert!(ticks < 1000, "never landed");
        }
        assert_eq!(player.position.y, rest);
        assert_eq!(player.motion.velocity(), 0.0);
        assert!(peak > rest + 1.0);
    }

    #[test]
    fn grounded_height_matches_stance() {
        let (ctl, mut player, mut input) = setup();
        let script: [(&str, bool); 6] = [
            ("Shift", true),
            (" ", true),
            ("Shift", false),
            (" ", false),
            ("Shift", true),
            ("Shift", false),
        ];
        for (key, down) in script {
            if down {
                press(&mut input, key);
            } else {
                release(&mut input, key);
            }
            for _ in 0..40 {
                ctl.tick(&mut player, &mut input, &[]);
                if player.is_grounded() {
                    let expected = match player.stance {
                        Stance::Standing => ctl.cfg.normal_height / 2.0,
                        Stance::Crouching => ctl.cfg.crouch_height / 2.0,
                    };
                    assert_eq!(player.position.y, expected);
                }
            }
        }
    }

    #[test]
    fn crouch_allowed_mid_air() {
        let (ctl, mut player, mut input) = setup();
        press(&mut input, " ");
        ctl.tick(&mut player, &mut input, &[]);
        release(&mut input, " ");
        press(&mut input, "Shift");
        ctl.tick(&mut player, &mut input, &[]);
        assert!(player.is_crouching());

        while player.motion.is_jumping() {
            ctl.tick(&mut player, &mut input, &[]);
        }
        assert_eq!(player.position.y, ctl.cfg.crouch_height / 2.0);
    }

    #[test]
    fn walking_into_a_mountain_slides_around_it() {
        let (ctl, mut player, mut input) = setup();
        let mountain = Obstacle::new(Vec2::new(0.3, -3.0), 2.0, 20.0);
        press(&mut input, "w");
        let mut touched = false;
        for _ in 0..60 {
            let contact = ctl.tick(&mut player, &mut input, &[mountain]);
            touched |= contact.is_some();
            let d = Vec2::new(player.position.x, player.position.z).distance(mountain.center);
            assert!(d >= 2.5 - 1e-4, "inside mountain: {d}");
        }
        assert!(touched);
        // Deflected to the side and carried past the obstacle
        assert!(player.position.x < -1.0);
        assert!(player.position.z < -3.0);
    }
}
