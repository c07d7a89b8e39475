use glam::Vec3;

use crate::config::PlayerConfig;

/// Crouch/stand axis, independent of jumping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stance {
    #[default]
    Standing,
    Crouching,
}

/// Vertical motion: on the ground, or airborne with a signed per-tick velocity
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum VerticalMotion {
    #[default]
    Grounded,
    Jumping { velocity: f32 },
}

impl VerticalMotion {
    pub fn is_jumping(&self) -> bool {
        matches!(self, VerticalMotion::Jumping { .. })
    }

    pub fn velocity(&self) -> f32 {
        match self {
            VerticalMotion::Grounded => 0.0,
            VerticalMotion::Jumping { velocity } => *velocity,
        }
    }
}

/// The one player of a session
#[derive(Debug, Clone)]
pub struct Player {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub stance: Stance,
    pub motion: VerticalMotion,
    color: u32,
}

impl Player {
    pub fn new(cfg: &PlayerConfig, color: u32) -> Self {
        Self {
            position: cfg.spawn_position(),
            yaw: 0.0,
            pitch: 0.0,
            stance: Stance::Standing,
            motion: VerticalMotion::Grounded,
            color,
        }
    }

    /// Chosen before the game starts and fixed afterwards
    pub fn color(&self) -> u32 {
        self.color
    }

    pub fn height(&self, cfg: &PlayerConfig) -> f32 {
        match self.stance {
            Stance::Standing => cfg.normal_height,
            Stance::Crouching => cfg.crouch_height,
        }
    }

    /// y of the player's center while grounded in the current stance
    pub fn resting_height(&self, cfg: &PlayerConfig) -> f32 {
        self.height(cfg) / 2.0
    }

    pub fn is_grounded(&self) -> bool {
        !self.motion.is_jumping()
    }

    pub fn is_crouching(&self) -> bool {
        self.stance == Stance::Crouching
    }
}
