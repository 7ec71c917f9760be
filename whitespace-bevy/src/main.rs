//! Whitespace - walk between white rooms to spell words.
//!
//! Turning left or right records a bit, walking forward reads the letter
//! those bits spell. Spell one of the exit words to leave.
//!
//! The game logic lives in `whitespace-core`; this binary renders the rooms
//! with Bevy, draws the HUD with egui and feeds keyboard input to the session.

mod state;
mod ui;
mod world;

use anyhow::Context;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy_egui::EguiPlugin;
use whitespace_core::rooms::RoomBlueprint;
use whitespace_core::{GameConfig, GameSession};

use crate::state::{Game, HudState, StartupConfig};
use crate::world::{BevyRoomFactory, RoomAssets, RoomEntities, Traveler};

/// Environment variable naming the config file.
const CONFIG_ENV: &str = "WHITESPACE_CONFIG";

/// Default log filter, overridden by `RUST_LOG`.
const LOG_FILTER: &str = "wgpu=error,naga=warn,whitespace_core=debug";

fn main() {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let startup = match load_config() {
        Ok((config, source)) => StartupConfig {
            config,
            source,
            error: None,
        },
        Err(err) => StartupConfig {
            config: GameConfig::default(),
            source: None,
            error: Some(format!("{err:#}")),
        },
    };

    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| LOG_FILTER.to_string());

    App::new()
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Whitespace".into(),
                        resolution: (1280., 800.).into(),
                        resizable: true,
                        ..default()
                    }),
                    ..default()
                })
                .set(LogPlugin {
                    filter,
                    ..default()
                }),
        )
        .add_plugins(EguiPlugin)
        .insert_resource(ClearColor(Color::BLACK))
        .insert_resource(AmbientLight {
            color: Color::WHITE,
            brightness: 400.0,
        })
        .insert_resource(startup)
        .init_resource::<HudState>()
        .add_systems(Startup, setup)
        .add_systems(
            Update,
            (
                ui::handle_keyboard_input,
                state::tick_session,
                world::sync_camera,
                ui::hud_system,
            )
                .chain(),
        )
        .run();
}

/// Read the config named by `WHITESPACE_CONFIG`, or use the defaults when
/// the variable is unset.
fn load_config() -> anyhow::Result<(GameConfig, Option<String>)> {
    let Ok(path) = std::env::var(CONFIG_ENV) else {
        return Ok((GameConfig::default(), None));
    };

    // `load` validates as well as parses.
    let config = GameConfig::load(&path).with_context(|| format!("failed to load config from {path}"))?;
    Ok((config, Some(path)))
}

/// Spawn the camera and the first rooms, then start the session.
fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    startup: Res<StartupConfig>,
    mut hud: ResMut<HudState>,
) {
    commands.spawn((Camera3d::default(), Traveler, Name::new("Traveler")));

    if let Some(source) = &startup.source {
        info!(config = %source, "loaded config");
        hud.config_source = source.clone();
    }
    if let Some(error) = &startup.error {
        error!("{error}; falling back to defaults");
        hud.config_error = Some(error.clone());
    }

    let assets = RoomAssets::new(&mut meshes, &mut materials);
    let mut rooms = RoomEntities::new(RoomBlueprint::default());

    let session = {
        let mut factory = BevyRoomFactory::new(&mut commands, &assets, &mut rooms);
        GameSession::new(startup.config.clone(), &mut factory)
    };

    match session {
        Ok(mut session) => {
            hud.record_all(session.drain_events());
            commands.insert_resource(Game { session });
        }
        Err(err) => error!("failed to start session: {err}"),
    }

    commands.insert_resource(assets);
    commands.insert_resource(rooms);
}
