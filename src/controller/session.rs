use glam::{Quat, Vec3};
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::config::{GameConfig, PLAYER_PALETTE};
use crate::controller::input::{InputEvent, InputState};
use crate::controller::player_controller::PlayerController;
use crate::model::{Camera, NodeId, ObstacleField, Player, Scene, Shape, Transform};

/// Which half of the session is live. Starts in `Menu`, moves to `Playing` once, never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Menu,
    Playing,
}

/// Panel shown over the menu backdrop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuPanel {
    Main,
    CharacterSelect,
}

/// The viewport currently shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewport {
    Menu,
    Game,
}

/// What the UI asks the session (or the platform layer) to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiAction {
    Play,
    OpenCharacterSelect,
    Back,
    SelectColor(u32),
    ConfirmCharacter,
    ToggleFullscreen,
}

/// Decorative scene orbited by the menu camera
pub struct MenuScene {
    pub scene: Scene,
    pub camera: Camera,
}

/// Nodes of the player and its camera rig: body -> yaw pivot -> pitch pivot -> camera
#[derive(Debug, Clone, Copy)]
pub struct CameraRig {
    pub body: NodeId,
    pub mesh: NodeId,
    pub yaw: NodeId,
    pub pitch: NodeId,
    pub camera: NodeId,
}

pub struct GameScene {
    pub scene: Scene,
    pub field: ObstacleField,
    pub player: Player,
    pub rig: CameraRig,
    pub camera: Camera,
}

impl GameScene {
    fn build(cfg: &GameConfig, color: u32, rng: &mut SmallRng, width: u32, height: u32) -> Self {
        let field = ObstacleField::generate(&cfg.field, rng);
        let player = Player::new(&cfg.player, color);

        let mut scene = Scene::new(&cfg.view);
        scene.add_terrain(&field, &cfg.field, &cfg.view);

        let body = scene.add_node(None, Transform::from_translation(player.position));
        let mesh = scene.add_object(
            Some(body),
            Transform::IDENTITY,
            Shape::Cuboid { size: Vec3::new(1.0, cfg.player.normal_height, 1.0) },
            color,
        );
        let yaw = scene.add_node(Some(body), Transform::IDENTITY);
        let pitch = scene.add_node(Some(yaw), Transform::IDENTITY);
        let camera = scene.add_node(Some(pitch), Transform::IDENTITY);

        let mut game = Self {
            scene,
            field,
            player,
            rig: CameraRig { body, mesh, yaw, pitch, camera },
            camera: Camera::new(&cfg.view, width, height),
        };
        game.sync_rig(cfg);
        game
    }

    /// Copy the player's transform into the scene graph and place the camera at the rig's end
    pub fn sync_rig(&mut self, cfg: &GameConfig) {
        let p = &self.player;
        let height = p.height(&cfg.player);
        let graph = &mut self.scene.graph;

        graph.local_mut(self.rig.body).translation = p.position;
        graph.local_mut(self.rig.mesh).scale = Vec3::new(1.0, height / cfg.player.normal_height, 1.0);

        let yaw = graph.local_mut(self.rig.yaw);
        yaw.translation = Vec3::new(0.0, height * cfg.player.eye_offset, 0.0);
        yaw.rotation = Quat::from_rotation_y(p.yaw);
        graph.local_mut(self.rig.pitch).rotation = Quat::from_rotation_x(p.pitch);

        let world = graph.world_matrix(self.rig.camera);
        self.camera.set_world_transform(world);
    }
}

/// All mutable state of one run: mode flag, input, both scenes and the player
pub struct Session {
    pub cfg: GameConfig,
    mode: Mode,
    pub panel: MenuPanel,
    pub input: InputState,
    selected_color: u32,
    pub menu: MenuScene,
    pub game: Option<GameScene>,
    controller: PlayerController,
    rng: SmallRng,
    started_at_ms: f64,
    viewport_size: (u32, u32),
}

impl Session {
    pub fn new(cfg: GameConfig, seed: u64, width: u32, height: u32, now_ms: f64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);

        // The backdrop gets its own field: same layout, its own sizes
        let backdrop = ObstacleField::generate(&cfg.field, &mut rng);
        let mut scene = Scene::new(&cfg.view);
        scene.add_terrain(&backdrop, &cfg.field, &cfg.view);

        tracing::info!(seed, width, height, "session created");

        Self {
            controller: PlayerController::new(cfg.player),
            mode: Mode::Menu,
            panel: MenuPanel::Main,
            input: InputState::default(),
            selected_color: PLAYER_PALETTE[0],
            menu: MenuScene { scene, camera: Camera::new(&cfg.view, width, height) },
            game: None,
            rng,
            started_at_ms: now_ms,
            viewport_size: (width, height),
            cfg,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_playing(&self) -> bool {
        self.mode == Mode::Playing
    }

    pub fn visible_viewport(&self) -> Viewport {
        match self.mode {
            Mode::Menu => Viewport::Menu,
            Mode::Playing => Viewport::Game,
        }
    }

    pub fn selected_color(&self) -> u32 {
        self.selected_color
    }

    pub fn controller(&self) -> &PlayerController {
        &self.controller
    }

    /// Milliseconds since the session was created
    pub fn elapsed_ms(&self, now_ms: f64) -> f64 {
        (now_ms - self.started_at_ms).max(0.0)
    }

    pub fn viewport_size(&self) -> (u32, u32) {
        self.viewport_size
    }

    /// Route a platform input event. Look motion only counts while playing with the pointer captured.
    pub fn handle_input(&mut self, event: &InputEvent) {
        if let InputEvent::MouseMove { .. } = event {
            if !(self.is_playing() && self.input.pointer_locked) {
                return;
            }
        }
        self.input.process_event(event);
    }

    /// Pick the player color; frozen once the game runs
    pub fn select_color(&mut self, color: u32) -> bool {
        if self.is_playing() {
            return false;
        }
        self.selected_color = color;
        true
    }

    /// Build the playable scene, attach the camera rig to the player and show the game viewport.
    /// Only the first call does anything; later calls are rejected and return `false`.
    pub fn start_game(&mut self) -> bool {
        if self.is_playing() {
            tracing::warn!("start requested while already playing; ignoring");
            return false;
        }

        let (w, h) = self.viewport_size;
        let game = GameScene::build(&self.cfg, self.selected_color, &mut self.rng, w, h);
        tracing::info!(
            color = %format!("{:06x}", self.selected_color),
            obstacles = game.field.len(),
            "game started"
        );

        self.game = Some(game);
        self.mode = Mode::Playing;
        true
    }

    pub fn apply(&mut self, action: UiAction) {
        match action {
            UiAction::Play | UiAction::ConfirmCharacter => {
                self.start_game();
            }
            UiAction::OpenCharacterSelect => self.panel = MenuPanel::CharacterSelect,
            UiAction::Back => self.panel = MenuPanel::Main,
            UiAction::SelectColor(color) => {
                self.select_color(color);
            }
            // Fullscreen belongs to the window, the platform layer handles it
            UiAction::ToggleFullscreen => {}
        }
    }

    /// Keep both cameras in step with the viewport
    pub fn resize(&mut self, width: u32, height: u32) {
        if (width, height) == self.viewport_size {
            return;
        }
        tracing::debug!(width, height, "viewport resized");
        self.viewport_size = (width, height);
        self.menu.camera.set_aspect(width, height);
        if let Some(game) = self.game.as_mut() {
            game.camera.set_aspect(width, height);
        }
    }

    /// Scene and camera for the viewport being shown
    pub fn view(&self) -> (&Scene, &Camera) {
        match (self.visible_viewport(), self.game.as_ref()) {
            (Viewport::Game, Some(game)) => (&game.scene, &game.camera),
            _ => (&self.menu.scene, &self.menu.camera),
        }
    }

    /// Run the player controller against the game's own field and update the rig
    pub(crate) fn tick_player(&mut self) {
        let Some(game) = self.game.as_mut() else {
            return;
        };
        self.controller.tick(&mut game.player, &mut self.input, game.field.obstacles());
        game.sync_rig(&self.cfg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(GameConfig::default(), 9, 800, 600, 1000.0)
    }

    #[test]
    fn starts_in_menu_without_player() {
        let s = session();
        assert_eq!(s.mode(), Mode::Menu);
        assert_eq!(s.visible_viewport(), Viewport::Menu);
        assert!(s.game.is_none());
        assert!(!s.menu.scene.objects.is_empty());
    }

    #[test]
    fn start_happens_exactly_once() {
        let mut s = session();
        assert!(s.start_game());
        let objects = s.game.as_ref().unwrap().scene.objects.len();

        assert!(!s.start_game());
        assert_eq!(s.game.as_ref().unwrap().scene.objects.len(), objects);
        assert_eq!(s.mode(), Mode::Playing);
        assert_eq!(s.visible_viewport(), Viewport::Game);
    }

    #[test]
    fn game_scene_holds_terrain_and_player() {
        let mut s = session();
        s.start_game();
        let game = s.game.as_ref().unwrap();
        // ground + one cone per obstacle + player body
        assert_eq!(game.scene.objects.len(), 1 + game.field.len() + 1);
        assert_eq!(game.field.len(), s.menu.scene.objects.len() - 1);
    }

    #[test]
    fn camera_rides_on_player() {
        let mut s = session();
        s.start_game();
        let game = s.game.as_mut().unwrap();
        game.player.position = Vec3::new(3.0, 1.0, -7.0);
        game.sync_rig(&s.cfg);

        let eye_y = 1.0 + s.cfg.player.normal_height * s.cfg.player.eye_offset;
        assert!(game.camera.eye().abs_diff_eq(Vec3::new(3.0, eye_y, -7.0), 1e-4));
        assert!(game.camera.forward().abs_diff_eq(Vec3::NEG_Z, 1e-5));

        game.player.yaw = std::f32::consts::PI;
        game.sync_rig(&s.cfg);
        assert!(game.camera.forward().abs_diff_eq(Vec3::Z, 1e-5));
    }

    #[test]
    fn color_chosen_before_start_sticks() {
        let mut s = session();
        s.apply(UiAction::OpenCharacterSelect);
        assert_eq!(s.panel, MenuPanel::CharacterSelect);
        s.apply(UiAction::SelectColor(0x123456));
        s.apply(UiAction::ConfirmCharacter);

        assert!(s.is_playing());
        assert_eq!(s.game.as_ref().unwrap().player.color(), 0x123456);
        assert!(!s.select_color(0xffffff));
        assert_eq!(s.selected_color(), 0x123456);
    }

    #[test]
    fn back_returns_to_main_panel() {
        let mut s = session();
        s.apply(UiAction::OpenCharacterSelect);
        s.apply(UiAction::Back);
        assert_eq!(s.panel, MenuPanel::Main);
        assert!(!s.is_playing());
    }

    #[test]
    fn look_ignored_until_playing_and_captured() {
        let mut s = session();
        s.handle_input(&InputEvent::PointerLockChanged { locked: true });
        s.handle_input(&InputEvent::MouseMove { dx: 10.0, dy: 0.0 });
        assert_eq!(s.input.look_delta, (0.0, 0.0));

        s.start_game();
        s.handle_input(&InputEvent::MouseMove { dx: 10.0, dy: 0.0 });
        assert_eq!(s.input.look_delta, (10.0, 0.0));

        s.handle_input(&InputEvent::PointerLockChanged { locked: false });
        s.handle_input(&InputEvent::MouseMove { dx: 10.0, dy: 0.0 });
        assert_eq!(s.input.look_delta, (0.0, 0.0));
    }

    #[test]
    fn resize_updates_both_cameras() {
        let mut s = session();
        s.start_game();
        s.resize(1600, 400);
        assert!((s.menu.camera.aspect - 4.0).abs() < 1e-6);
        assert!((s.game.as_ref().unwrap().camera.aspect - 4.0).abs() < 1e-6);
        assert_eq!(s.viewport_size(), (1600, 400));
    }
}
