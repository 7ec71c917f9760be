//! Testing utilities for the game.
//!
//! This module provides tools for integration testing:
//! - `TestHarness` for scripted scenarios on a fixed frame step
//! - `bits_for` and friends to turn letters into inputs
//! - Assertion helpers for poses and buffer state

use crate::config::GameConfig;
use crate::decoder::BitTrie;
use crate::headless::HeadlessGame;
use crate::keywords::KeywordMatch;
use crate::pose::Pose;
use crate::rooms::RoomId;
use crate::session::{GameEvent, GameInput, SessionError};
use bevy_math::Vec3;

/// Tolerance used by the pose assertions.
pub const POSE_EPSILON: f32 = 1e-3;

/// Bits that spell `letter`, oldest first.
pub fn bits_for(trie: &BitTrie, letter: char) -> Option<Vec<bool>> {
    trie.path_for(letter)
}

/// Left/Right presses for `letter`, followed by the Forward that submits it.
pub fn inputs_for(trie: &BitTrie, letter: char) -> Option<Vec<GameInput>> {
    let mut inputs: Vec<GameInput> = bits_for(trie, letter)?
        .into_iter()
        .map(|bit| if bit { GameInput::Right } else { GameInput::Left })
        .collect();
    inputs.push(GameInput::Forward);
    Some(inputs)
}

/// Inputs for every letter of `word`, or `None` if any letter is unspellable.
pub fn inputs_for_word(trie: &BitTrie, word: &str) -> Option<Vec<GameInput>> {
    word.chars().try_fold(Vec::new(), |mut all, letter| {
        all.extend(inputs_for(trie, letter)?);
        Some(all)
    })
}

/// Test harness for running scripted sessions.
///
/// Every event the session raises is kept in [`log`](Self::log), so tests can
/// inspect the whole run afterward.
pub struct TestHarness {
    pub game: HeadlessGame,
    /// Seconds per simulated frame.
    pub frame: f32,
    log: Vec<GameEvent>,
}

impl TestHarness {
    /// A harness on the default config with every letter spellable.
    pub fn new() -> Self {
        Self::with_config(GameConfig::default().with_prefix_layout())
            .unwrap_or_else(|e| panic!("default config rejected: {e}"))
    }

    pub fn with_config(config: GameConfig) -> Result<Self, SessionError> {
        let mut harness = Self {
            game: HeadlessGame::new(config)?,
            frame: 1.0 / 60.0,
            log: Vec::new(),
        };
        harness.collect();
        Ok(harness)
    }

    /// Press without advancing time.
    pub fn press(&mut self, input: GameInput) -> &mut Self {
        self.game.press(input);
        self.collect();
        self
    }

    /// Simulate `frames` fixed steps.
    pub fn frames(&mut self, frames: usize) -> &mut Self {
        for _ in 0..frames {
            self.game.step(self.frame);
        }
        self.collect();
        self
    }

    /// Simulate until the running transition ends.
    #[track_caller]
    pub fn settle(&mut self) -> &mut Self {
        assert!(self.game.settle(), "transition did not settle");
        self.collect();
        self
    }

    /// Press and settle each input in turn.
    pub fn play(&mut self, inputs: &[GameInput]) -> &mut Self {
        for input in inputs {
            self.press(*input).settle();
        }
        self
    }

    /// Spell `word` by walking rooms.
    #[track_caller]
    pub fn spell(&mut self, word: &str) -> &mut Self {
        let inputs = inputs_for_word(self.game.session().buffer().trie(), word)
            .unwrap_or_else(|| panic!("{word:?} cannot be spelled with this trie"));
        self.play(&inputs)
    }

    /// Every event raised since the harness was built.
    pub fn log(&self) -> &[GameEvent] {
        &self.log
    }

    pub fn keyword_hits(&self) -> Vec<&KeywordMatch> {
        self.log
            .iter()
            .filter_map(|event| match event {
                GameEvent::KeywordMatched(hit) => Some(hit),
                _ => None,
            })
            .collect()
    }

    pub fn arrivals(&self) -> Vec<RoomId> {
        self.log
            .iter()
            .filter_map(|event| match event {
                GameEvent::Arrived(room) => Some(*room),
                _ => None,
            })
            .collect()
    }

    pub fn letters(&self) -> &str {
        self.game.letters()
    }

    pub fn bit_string(&self) -> String {
        self.game.bit_string()
    }

    pub fn traveler(&self) -> Pose {
        self.game.traveler()
    }

    fn collect(&mut self) {
        self.log.extend(self.game.drain_events());
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Assertion Helpers
// ============================================================================

/// Assert two points are within [`POSE_EPSILON`].
#[track_caller]
pub fn assert_vec_near(actual: Vec3, expected: Vec3) {
    assert!(
        actual.distance(expected) < POSE_EPSILON,
        "Expected {expected:?}, got {actual:?}"
    );
}

/// Assert the traveler's yaw, in degrees, modulo a full turn.
#[track_caller]
pub fn assert_yaw_near(pose: Pose, expected: f32) {
    let yaw = pose.yaw();
    assert!(
        crate::pose::angle_delta(yaw, expected) < POSE_EPSILON * 10.0,
        "Expected yaw {expected}, got {yaw}"
    );
}

/// Assert position and rotation both match.
#[track_caller]
pub fn assert_pose_near(actual: Pose, expected: Pose) {
    assert_vec_near(actual.position, expected.position);
    assert!(
        actual.rotation.angle_between(expected.rotation) < POSE_EPSILON * 10.0,
        "Expected rotation {:?}, got {:?}",
        expected.rotation,
        actual.rotation
    );
}

/// Assert the accumulated letters.
#[track_caller]
pub fn assert_letters(harness: &TestHarness, expected: &str) {
    assert_eq!(
        harness.letters(),
        expected,
        "Expected letters {expected:?}, got {:?}",
        harness.letters()
    );
}

/// Assert the harness is idle and has no pending bits.
#[track_caller]
pub fn assert_idle(harness: &TestHarness) {
    assert!(!harness.game.is_transitioning(), "Expected no transition running");
    assert_eq!(harness.bit_string(), "", "Expected no pending bits");
}
