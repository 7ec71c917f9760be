//! Application resources and the per-frame session tick.

use bevy::prelude::*;
use std::collections::VecDeque;
use whitespace_core::{GameConfig, GameEvent, GameSession};

use crate::world::{BevyRoomFactory, RoomAssets, RoomEntities};

/// How many event lines the HUD keeps.
const LOG_LINES: usize = 10;

/// The running game.
#[derive(Resource)]
pub struct Game {
    pub session: GameSession,
}

/// Config picked at startup and where it came from.
#[derive(Resource)]
pub struct StartupConfig {
    pub config: GameConfig,
    /// Path the config was read from, `None` for built-in defaults.
    pub source: Option<String>,
    /// Why the configured file was not used.
    pub error: Option<String>,
}

/// Everything the HUD shows that isn't read straight off the session.
#[derive(Resource)]
pub struct HudState {
    /// Recent events, newest last.
    pub log: VecDeque<String>,
    /// Narrative of the last keyword.
    pub narrative: Option<String>,
    pub show_legend: bool,
    pub config_source: String,
    pub config_error: Option<String>,
}

impl Default for HudState {
    fn default() -> Self {
        Self {
            log: VecDeque::with_capacity(LOG_LINES),
            narrative: None,
            show_legend: true,
            config_source: "built-in defaults".to_string(),
            config_error: None,
        }
    }
}

impl HudState {
    pub fn record(&mut self, event: &GameEvent) {
        let line = match event {
            GameEvent::BitInserted(bit) => format!("bit {}", u8::from(*bit)),
            GameEvent::BitRemoved(bit) => format!("removed bit {}", u8::from(*bit)),
            GameEvent::LetterDecoded(letter) => format!("letter {letter}"),
            GameEvent::SubmitOverflow => "no letter there".to_string(),
            GameEvent::SubmitIncomplete => "not enough bits".to_string(),
            GameEvent::KeywordMatched(hit) => {
                self.narrative = Some(hit.narrative.clone());
                format!("{} spoken", hit.keyword)
            }
            GameEvent::TransitionStarted { target, direction } => {
                format!("heading {direction:?} to {target}")
            }
            GameEvent::Arrived(room) => format!("arrived in {room}"),
            GameEvent::InputIgnored(input) => format!("{input:?} ignored while moving"),
            GameEvent::Reset(room) => {
                self.narrative = None;
                format!("woke up in {room}")
            }
        };

        if self.log.len() == LOG_LINES {
            self.log.pop_front();
        }
        self.log.push_back(line);
    }

    pub fn record_all(&mut self, events: impl IntoIterator<Item = GameEvent>) {
        for event in events {
            self.record(&event);
        }
    }
}

/// Advance the session by the frame time and collect its events.
pub fn tick_session(
    time: Res<Time>,
    mut commands: Commands,
    assets: Res<RoomAssets>,
    mut rooms: ResMut<RoomEntities>,
    game: Option<ResMut<Game>>,
    mut hud: ResMut<HudState>,
) {
    let Some(mut game) = game else { return };

    let mut factory = BevyRoomFactory::new(&mut commands, &assets, &mut rooms);
    game.session.tick(time.delta_secs(), &mut factory);
    hud.record_all(game.session.drain_events());
}

#[cfg(test)]
mod tests {
    use super::*;
    use whitespace_core::keywords::KeywordMatch;
    use whitespace_core::RoomId;

    #[test]
    fn test_log_keeps_newest_lines() {
        let mut hud = HudState::default();
        for _ in 0..LOG_LINES + 3 {
            hud.record(&GameEvent::BitInserted(true));
        }
        hud.record(&GameEvent::LetterDecoded('Q'));
        assert_eq!(hud.log.len(), LOG_LINES);
        assert_eq!(hud.log.back().map(String::as_str), Some("letter Q"));
    }

    #[test]
    fn test_keyword_sets_narrative_until_reset() {
        let mut hud = HudState::default();
        hud.record(&GameEvent::KeywordMatched(KeywordMatch {
            handler: "exit".to_string(),
            keyword: "OUT".to_string(),
            narrative: "You see the light, but don't trust it.".to_string(),
        }));
        assert!(hud.narrative.is_some());

        hud.record(&GameEvent::Reset(RoomId(4)));
        assert!(hud.narrative.is_none());
        assert_eq!(hud.log.back().map(String::as_str), Some("woke up in room#4"));
    }
}
