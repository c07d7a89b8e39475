use glam::Vec3;

/// Player movement and body tunables. Per-tick quantities assume one fixed step per frame.
#[derive(Debug, Clone, Copy)]
pub struct PlayerConfig {
    pub normal_height: f32,
    pub crouch_height: f32,
    pub radius: f32,
    pub walk_speed: f32,
    pub crouch_speed_factor: f32,
    pub jump_force: f32,
    pub gravity: f32,
    pub mouse_sensitivity: f32,
    /// Camera height above the player's center, as a fraction of the current body height
    pub eye_offset: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            normal_height: 2.0,
            crouch_height: 1.0,
            radius: 0.5,
            walk_speed: 0.2,
            crouch_speed_factor: 0.33,
            jump_force: 0.15,
            gravity: 0.006,
            mouse_sensitivity: 0.002,
            eye_offset: 0.35,
        }
    }
}

impl PlayerConfig {
    pub fn spawn_position(&self) -> Vec3 {
        Vec3::new(0.0, self.normal_height / 2.0, 0.0)
    }
}

/// Layout and size distribution of the mountain ring
#[derive(Debug, Clone, Copy)]
pub struct FieldConfig {
    pub boundary: f32,
    pub spacing: f32,
    pub offset: f32,
    pub base_height: f32,
    pub height_jitter: f32,
    pub base_width: f32,
    pub width_jitter: f32,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            boundary: 100.0,
            spacing: 10.0,
            offset: 10.0,
            base_height: 20.0,
            height_jitter: 7.5,
            base_width: 8.0,
            width_jitter: 3.0,
        }
    }
}

impl FieldConfig {
    /// Side length of the square ground plane, wide enough to hold the outer ring
    pub fn ground_size(&self) -> f32 {
        2.0 * self.boundary + 2.0 * self.offset
    }
}

/// Camera orbit shown behind the menu
#[derive(Debug, Clone, Copy)]
pub struct MenuOrbitConfig {
    pub radius: f32,
    pub height: f32,
    /// Radians per elapsed millisecond
    pub angular_speed: f32,
}

impl Default for MenuOrbitConfig {
    fn default() -> Self {
        Self {
            radius: 150.0,
            height: 75.0,
            angular_speed: 0.0002,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ViewConfig {
    pub fov_y: f32,
    pub z_near: f32,
    pub z_far: f32,
    pub ground_color: u32,
    pub obstacle_color: u32,
    pub sky_color: u32,
    pub ambient: f32,
    pub sun_intensity: f32,
    pub sun_position: Vec3,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            fov_y: 75f32.to_radians(),
            z_near: 0.1,
            z_far: 1000.0,
            ground_color: 0x3a7d44,
            obstacle_color: 0x8b7d6b,
            sky_color: 0x87ceeb,
            ambient: 0.4,
            sun_intensity: 0.8,
            sun_position: Vec3::new(50.0, 100.0, 50.0),
        }
    }
}

/// Everything a session needs to build its scenes and run its ticks
#[derive(Debug, Clone, Copy, Default)]
pub struct GameConfig {
    pub player: PlayerConfig,
    pub field: FieldConfig,
    pub menu_orbit: MenuOrbitConfig,
    pub view: ViewConfig,
}

/// Colors offered on the character screen, as 0xRRGGBB codes
pub const PLAYER_PALETTE: [u32; 6] = [0xe74c3c, 0x3498db, 0x2ecc71, 0xf1c40f, 0x9b59b6, 0xecf0f1];

/// Split a 0xRRGGBB code into linear-ish float channels
pub fn color_to_rgba(code: u32) -> [f32; 4] {
    [
        ((code >> 16) & 0xff) as f32 / 255.0,
        ((code >> 8) & 0xff) as f32 / 255.0,
        (code & 0xff) as f32 / 255.0,
        1.0,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_code_splits_into_channels() {
        assert_eq!(color_to_rgba(0xff0000), [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(color_to_rgba(0x00ff00), [0.0, 1.0, 0.0, 1.0]);
        assert_eq!(color_to_rgba(0x0000ff), [0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn crouch_is_half_of_standing() {
        let cfg = PlayerConfig::default();
        assert_eq!(cfg.crouch_height * 2.0, cfg.normal_height);
        assert_eq!(cfg.spawn_position().y, 1.0);
    }
}
