//! UI module - egui HUD and keyboard handling.

mod panels;

use bevy::app::AppExit;
use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};
use whitespace_core::GameInput;

use crate::state::{Game, HudState};
use crate::world::{BevyRoomFactory, RoomAssets, RoomEntities};

/// Keys that drive the session.
const BINDINGS: [(KeyCode, GameInput); 7] = [
    (KeyCode::KeyA, GameInput::Left),
    (KeyCode::ArrowLeft, GameInput::Left),
    (KeyCode::KeyW, GameInput::Forward),
    (KeyCode::ArrowUp, GameInput::Forward),
    (KeyCode::KeyD, GameInput::Right),
    (KeyCode::ArrowRight, GameInput::Right),
    (KeyCode::KeyR, GameInput::Reset),
];

/// HUD system - renders all egui panels.
pub fn hud_system(
    mut contexts: EguiContexts,
    game: Option<Res<Game>>,
    mut hud: ResMut<HudState>,
    rooms: Res<RoomEntities>,
) {
    let ctx = contexts.ctx_mut();
    configure_style(ctx);

    // Side and bottom panels claim space before the floating windows.
    if let Some(game) = &game {
        if hud.show_legend {
            panels::render_legend(ctx, &game.session);
        }
    }
    panels::render_log_panel(ctx, &hud);

    match &game {
        Some(game) => panels::render_buffer_window(ctx, &game.session, rooms.registry()),
        None => panels::render_no_session(ctx),
    }

    if let Some(narrative) = &hud.narrative {
        panels::render_narrative(ctx, narrative);
    }
    panels::render_config_error(ctx, &mut hud);
}

/// Configure egui visual style.
fn configure_style(ctx: &egui::Context) {
    let mut style = (*ctx.style()).clone();

    use egui::{FontId, TextStyle};
    style.text_styles = [
        (TextStyle::Small, FontId::proportional(13.0)),
        (TextStyle::Body, FontId::proportional(16.0)),
        (TextStyle::Monospace, FontId::monospace(18.0)),
        (TextStyle::Button, FontId::proportional(16.0)),
        (TextStyle::Heading, FontId::proportional(22.0)),
    ]
    .into();

    // Pale, mostly transparent panels over the white rooms.
    let visuals = &mut style.visuals;
    visuals.dark_mode = true;
    visuals.override_text_color = Some(egui::Color32::from_rgb(235, 235, 235));
    visuals.window_fill = egui::Color32::from_rgba_unmultiplied(20, 20, 24, 210);
    visuals.panel_fill = egui::Color32::from_rgba_unmultiplied(20, 20, 24, 190);
    visuals.extreme_bg_color = egui::Color32::from_rgb(10, 10, 12);

    ctx.set_style(style);
}

/// Handle keyboard input for movement and shortcuts.
#[allow(clippy::too_many_arguments)]
pub fn handle_keyboard_input(
    keys: Res<ButtonInput<KeyCode>>,
    mut contexts: EguiContexts,
    mut commands: Commands,
    assets: Res<RoomAssets>,
    mut rooms: ResMut<RoomEntities>,
    game: Option<ResMut<Game>>,
    mut hud: ResMut<HudState>,
    mut exit: EventWriter<AppExit>,
) {
    // Ctrl+Q / Cmd+Q to quit
    let ctrl_pressed = keys.pressed(KeyCode::ControlLeft)
        || keys.pressed(KeyCode::ControlRight)
        || keys.pressed(KeyCode::SuperLeft)
        || keys.pressed(KeyCode::SuperRight);

    if ctrl_pressed && keys.just_pressed(KeyCode::KeyQ) {
        exit.send(AppExit::Success);
        return;
    }

    if contexts.ctx_mut().wants_keyboard_input() {
        return;
    }

    if keys.just_pressed(KeyCode::Tab) {
        hud.show_legend = !hud.show_legend;
    }

    let Some(mut game) = game else { return };

    if keys.just_pressed(KeyCode::Backspace) {
        if let Err(err) = game.session.backspace() {
            debug!("{err}");
        }
    }

    let mut factory = BevyRoomFactory::new(&mut commands, &assets, &mut rooms);
    for (key, input) in BINDINGS {
        if keys.just_pressed(key) {
            game.session.handle(input, &mut factory);
        }
    }
}
