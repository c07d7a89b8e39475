use egui::{Color32, Context, RawInput, RichText};

use crate::config::PLAYER_PALETTE;
use crate::controller::{FrameStats, MenuPanel, Session, UiAction};
use crate::model::{Stance, VerticalMotion};

/// Build the overlay for the current mode. Returns egui's output and the actions the user triggered.
pub fn build_ui(
    egui_ctx: &Context,
    raw_input: RawInput,
    session: &Session,
    stats: &FrameStats,
) -> (egui::FullOutput, Vec<UiAction>) {
    let mut actions = Vec::new();
    let output = egui_ctx.run(raw_input, |ctx| {
        // egui may run the closure more than once per frame
        actions.clear();
        if session.is_playing() {
            draw_crosshair(ctx);
            draw_status_window(ctx, session, stats);
        } else {
            match session.panel {
                MenuPanel::Main => draw_main_menu(ctx, &mut actions),
                MenuPanel::CharacterSelect => draw_character_select(ctx, session.selected_color(), &mut actions),
            }
        }
    });
    (output, actions)
}

/// 0xRRGGBB to an egui color
pub fn swatch(code: u32) -> Color32 {
    Color32::from_rgb((code >> 16) as u8, (code >> 8) as u8, code as u8)
}

fn menu_window(title: &str) -> egui::Window<'static> {
    egui::Window::new(title)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .collapsible(false)
        .resizable(false)
}

fn draw_main_menu(ctx: &Context, actions: &mut Vec<UiAction>) {
    menu_window("Ridgewalk").show(ctx, |ui| {
        ui.vertical_centered(|ui| {
            if ui.button(RichText::new("Play").heading()).clicked() {
                actions.push(UiAction::Play);
            }
            if ui.button("Choose character").clicked() {
                actions.push(UiAction::OpenCharacterSelect);
            }
            if ui.button("Fullscreen").clicked() {
                actions.push(UiAction::ToggleFullscreen);
            }
        });
    });
}

fn draw_character_select(ctx: &Context, selected: u32, actions: &mut Vec<UiAction>) {
    menu_window("Choose character").show(ctx, |ui| {
        ui.horizontal(|ui| {
            for code in PLAYER_PALETTE {
                let stroke = if code == selected {
                    egui::Stroke::new(3.0, Color32::YELLOW)
                } else {
                    egui::Stroke::new(0.5, Color32::BLACK)
                };
                let button = egui::Button::new("")
                    .fill(swatch(code))
                    .stroke(stroke)
                    .min_size(egui::vec2(36.0, 36.0));
                if ui.add(button).clicked() {
                    actions.push(UiAction::SelectColor(code));
                }
            }
        });
        ui.separator();
        ui.horizontal(|ui| {
            if ui.button("Start").clicked() {
                actions.push(UiAction::ConfirmCharacter);
            }
            if ui.button("Back").clicked() {
                actions.push(UiAction::Back);
            }
        });
    });
}

fn draw_crosshair(ctx: &Context) {
    let painter = ctx.layer_painter(egui::LayerId::new(egui::Order::TOP, egui::Id::new("crosshair")));
    let center = ctx.available_rect().center();
    let size = 10.0;
    let stroke = egui::Stroke::new(1.0, Color32::WHITE);
    painter.line_segment([center - egui::vec2(size, 0.0), center + egui::vec2(size, 0.0)], stroke);
    painter.line_segment([center - egui::vec2(0.0, size), center + egui::vec2(0.0, size)], stroke);
}

fn draw_status_window(ctx: &Context, session: &Session, stats: &FrameStats) {
    let Some(game) = session.game.as_ref() else {
        return;
    };
    let p = &game.player;

    egui::Window::new("Status")
        .default_pos([8.0, 8.0])
        .resizable(false)
        .show(ctx, |ui| {
            ui.label(RichText::new(format!("FPS: {:.0}", stats.fps)).small());
            ui.label(
                RichText::new(format!("Pos: x: {:.1} y: {:.2} z: {:.1}", p.position.x, p.position.y, p.position.z))
                    .small(),
            );
            ui.label(RichText::new(format!("Yaw: {:.0} Pitch: {:.0}", p.yaw.to_degrees(), p.pitch.to_degrees())).small());
            let stance = match p.stance {
                Stance::Standing => "standing",
                Stance::Crouching => "crouching",
            };
            let motion = match p.motion {
                VerticalMotion::Grounded => "grounded".to_string(),
                VerticalMotion::Jumping { velocity } => format!("jumping ({velocity:+.3})"),
            };
            ui.label(RichText::new(format!("{stance}, {motion}")).small());
            ui.separator();
            if session.input.pointer_locked {
                ui.label(RichText::new("WASD - Move, Space - Jump, Shift - Crouch").small());
                ui.label(RichText::new("Esc - Release mouse, F - Fullscreen").small());
            } else {
                ui.label(RichText::new("Click to capture the mouse").small().color(Color32::YELLOW));
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;

    fn session() -> Session {
        Session::new(GameConfig::default(), 1, 800, 600, 0.0)
    }

    fn input() -> RawInput {
        RawInput {
            screen_rect: Some(egui::Rect::from_min_size(egui::Pos2::ZERO, egui::vec2(800.0, 600.0))),
            ..Default::default()
        }
    }

    #[test]
    fn swatch_splits_channels() {
        assert_eq!(swatch(0x3498db), Color32::from_rgb(0x34, 0x98, 0xdb));
    }

    #[test]
    fn idle_frames_produce_no_actions() {
        let ctx = Context::default();
        let mut s = session();
        for panel in [MenuPanel::Main, MenuPanel::CharacterSelect] {
            s.panel = panel;
            // The first pass only sizes the window
            for _ in 0..2 {
                let (_, actions) = build_ui(&ctx, input(), &s, &FrameStats::default());
                assert!(actions.is_empty());
            }
            let (out, _) = build_ui(&ctx, input(), &s, &FrameStats::default());
            assert!(!out.shapes.is_empty());
        }
    }

    #[test]
    fn hud_draws_while_playing() {
        let ctx = Context::default();
        let mut s = session();
        s.start_game();
        let (out, actions) = build_ui(&ctx, input(), &s, &FrameStats::default());
        assert!(actions.is_empty());
        assert!(!out.shapes.is_empty());
    }
}
