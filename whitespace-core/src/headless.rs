//! Headless game interface for programmatic use.
//!
//! Bundles a [`GameSession`] with the in-memory [`RoomRegistry`] so the game
//! can run without a window. It's designed for:
//! - Integration tests
//! - Scripted play-throughs
//!
//! # Example
//!
//! ```
//! use whitespace_core::config::GameConfig;
//! use whitespace_core::headless::HeadlessGame;
//!
//! let mut game = HeadlessGame::new(GameConfig::default().with_prefix_layout()).unwrap();
//! game.type_word("EXIT").unwrap();
//! assert_eq!(game.last_narrative(), Some("You see the light, but don't trust it."));
//! ```

use crate::config::GameConfig;
use crate::decoder::DecodeResult;
use crate::input::BufferError;
use crate::pose::Pose;
use crate::rooms::{RoomBlueprint, RoomId, RoomRegistry};
use crate::session::{GameEvent, GameInput, GameSession, SessionError};

/// Frame rate used when none is given.
pub const DEFAULT_FPS: f32 = 60.0;

/// Longest a single [`HeadlessGame::settle`] will simulate, in seconds.
const SETTLE_LIMIT: f32 = 120.0;

/// A game session driven by explicit calls instead of a frame loop.
pub struct HeadlessGame {
    session: GameSession,
    rooms: RoomRegistry,
    /// Simulated seconds since creation.
    clock: f32,
}

impl HeadlessGame {
    pub fn new(config: GameConfig) -> Result<Self, SessionError> {
        Self::with_blueprint(config, RoomBlueprint::default())
    }

    /// Use a custom room layout.
    pub fn with_blueprint(config: GameConfig, blueprint: RoomBlueprint) -> Result<Self, SessionError> {
        let mut rooms = RoomRegistry::new(blueprint);
        let session = GameSession::new(config, &mut rooms)?;
        Ok(Self {
            session,
            rooms,
            clock: 0.0,
        })
    }

    /// Send one command without advancing time.
    pub fn press(&mut self, input: GameInput) {
        self.session.handle(input, &mut self.rooms);
    }

    pub fn backspace(&mut self) -> Result<bool, BufferError> {
        self.session.backspace()
    }

    pub fn reset(&mut self) {
        self.press(GameInput::Reset);
    }

    /// Run one frame of `dt` seconds.
    pub fn step(&mut self, dt: f32) -> Option<RoomId> {
        self.clock += dt;
        self.session.tick(dt, &mut self.rooms)
    }

    /// Run `seconds` worth of frames at `fps`. Returns every arrival.
    pub fn advance(&mut self, seconds: f32, fps: f32) -> Vec<RoomId> {
        let dt = 1.0 / fps.max(1.0);
        let frames = (seconds / dt).round() as usize;
        (0..frames).filter_map(|_| self.step(dt)).collect()
    }

    /// Run frames until no transition is running.
    ///
    /// Returns false if the transition did not finish within two minutes of
    /// simulated time.
    pub fn settle(&mut self) -> bool {
        let dt = 1.0 / DEFAULT_FPS;
        let mut simulated = 0.0;
        while self.session.is_transitioning() {
            if simulated >= SETTLE_LIMIT {
                tracing::warn!(seconds = simulated, "transition did not settle");
                return false;
            }
            self.step(dt);
            simulated += dt;
        }
        true
    }

    /// Press and wait for the traveler to arrive.
    pub fn press_and_settle(&mut self, input: GameInput) -> bool {
        self.press(input);
        self.settle()
    }

    /// Walk the bits of `letter` and submit it.
    pub fn type_letter(&mut self, letter: char) -> Result<DecodeResult, SessionError> {
        let path = self
            .session
            .buffer()
            .trie()
            .path_for(letter)
            .ok_or(SessionError::Unspellable(letter))?;

        for bit in path {
            self.press_and_settle(if bit { GameInput::Right } else { GameInput::Left });
        }

        self.press_and_settle(GameInput::Forward);

        // Only arrivals follow the submit, so the newest submit outcome is ours.
        let result = self
            .session
            .events()
            .iter()
            .rev()
            .find_map(|event| match event {
                GameEvent::LetterDecoded(c) => Some(DecodeResult::Letter(*c)),
                GameEvent::SubmitOverflow => Some(DecodeResult::Overflow),
                GameEvent::SubmitIncomplete => Some(DecodeResult::Incomplete),
                _ => None,
            })
            .unwrap_or(DecodeResult::Incomplete);
        Ok(result)
    }

    /// Type every letter of `word` in order.
    pub fn type_word(&mut self, word: &str) -> Result<(), SessionError> {
        for letter in word.chars() {
            self.type_letter(letter)?;
        }
        Ok(())
    }

    // ========================================================================
    // Game State Queries
    // ========================================================================

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut GameSession {
        &mut self.session
    }

    pub fn rooms(&self) -> &RoomRegistry {
        &self.rooms
    }

    pub fn rooms_mut(&mut self) -> &mut RoomRegistry {
        &mut self.rooms
    }

    /// Simulated seconds since creation.
    pub fn clock(&self) -> f32 {
        self.clock
    }

    pub fn bit_string(&self) -> String {
        self.session.buffer().bit_string()
    }

    pub fn letters(&self) -> &str {
        self.session.buffer().letters()
    }

    pub fn history(&self) -> &[String] {
        self.session.buffer().history()
    }

    pub fn preview(&self) -> DecodeResult {
        self.session.preview()
    }

    pub fn current_room(&self) -> Option<RoomId> {
        self.session.current_room()
    }

    pub fn traveler(&self) -> Pose {
        self.session.traveler()
    }

    pub fn is_transitioning(&self) -> bool {
        self.session.is_transitioning()
    }

    pub fn last_narrative(&self) -> Option<&str> {
        self.session.last_narrative()
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.session.drain_events()
    }

    /// End the session, destroying its rooms. Returns the emptied registry.
    pub fn shutdown(self) -> RoomRegistry {
        let Self { session, mut rooms, .. } = self;
        session.shutdown(&mut rooms);
        rooms
    }
}
