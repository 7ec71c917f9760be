//! Startup configuration.
//!
//! Every field has a default, so an empty JSON object is a valid config.
//!
//! ```json
//! {
//!   "trie": { "depth": 5, "layout": "prefix" },
//!   "movement": { "move_speed": 6.0, "interrupt": "ignore" }
//! }
//! ```

use crate::decoder::{BitTrie, TrieLayout};
use crate::input::InputBuffer;
use crate::keywords::{default_exit_keywords, validate_keyword, ExitAction, ExitHandler, KeywordError};
use crate::pose::Pose;
use crate::rooms::{NeighborLayout, NeighborPlacement};
use crate::transition::{PitchMode, TransitionSettings};
use bevy_math::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Deepest trie supported; 2^7 leaves is already far past the alphabet.
pub const MAX_TRIE_DEPTH: usize = 8;

/// Errors from loading or validating a config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),

    #[error("Invalid keyword: {0}")]
    Keyword(#[from] KeywordError),
}

/// What to do with directional input while a transition is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterruptPolicy {
    /// Drop the running transition and start the new one from mid-flight.
    #[default]
    Restart,
    /// Ignore the input until the traveler arrives.
    Ignore,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrieConfig {
    pub depth: usize,
    pub layout: TrieLayout,
}

impl Default for TrieConfig {
    fn default() -> Self {
        Self {
            depth: 5,
            layout: TrieLayout::Leaves,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Pending bits are kept strictly below this.
    pub capacity: usize,
    pub max_letters: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            capacity: 8,
            max_letters: 128,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    pub move_speed: f32,
    pub local_offset: [f32; 3],
    pub pitch: PitchMode,
    pub interrupt: InterruptPolicy,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            move_speed: 4.0,
            local_offset: [0.0, 1.6, 0.0],
            pitch: PitchMode::default(),
            interrupt: InterruptPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacementConfig {
    pub offset: [f32; 3],
    pub yaw: f32,
}

impl From<PlacementConfig> for NeighborPlacement {
    fn from(p: PlacementConfig) -> Self {
        NeighborPlacement {
            offset: Vec3::from_array(p.offset),
            yaw: p.yaw,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeighborsConfig {
    pub left: PlacementConfig,
    pub center: PlacementConfig,
    pub right: PlacementConfig,
}

impl Default for NeighborsConfig {
    fn default() -> Self {
        let layout = NeighborLayout::default();
        let placement = |p: NeighborPlacement| PlacementConfig {
            offset: p.offset.to_array(),
            yaw: p.yaw,
        };
        Self {
            left: placement(layout.left),
            center: placement(layout.center),
            right: placement(layout.right),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomsConfig {
    pub neighbors: NeighborsConfig,
    /// Where the first room is spawned.
    pub start_position: [f32; 3],
    pub start_yaw: f32,
}

/// All startup parameters of a game session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub trie: TrieConfig,
    pub buffer: BufferConfig,
    pub movement: MovementConfig,
    pub rooms: RoomsConfig,
    pub exit_keywords: BTreeMap<String, ExitAction>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            trie: TrieConfig::default(),
            buffer: BufferConfig::default(),
            movement: MovementConfig::default(),
            rooms: RoomsConfig::default(),
            exit_keywords: default_exit_keywords(),
        }
    }
}

impl GameConfig {
    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Use the letter-on-every-node layout.
    pub fn with_prefix_layout(mut self) -> Self {
        self.trie.layout = TrieLayout::Prefix;
        self
    }

    pub fn with_move_speed(mut self, speed: f32) -> Self {
        self.movement.move_speed = speed;
        self
    }

    pub fn with_interrupt(mut self, policy: InterruptPolicy) -> Self {
        self.movement.interrupt = policy;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let depth = self.trie.depth;
        if !(2..=MAX_TRIE_DEPTH).contains(&depth) {
            return Err(ConfigError::Invalid(format!(
                "trie.depth must be between 2 and {MAX_TRIE_DEPTH}, got {depth}"
            )));
        }
        if self.buffer.capacity < depth {
            return Err(ConfigError::Invalid(format!(
                "buffer.capacity ({}) must be at least trie.depth ({depth})",
                self.buffer.capacity
            )));
        }
        if self.buffer.max_letters == 0 {
            return Err(ConfigError::Invalid("buffer.max_letters must be positive".into()));
        }
        let speed = self.movement.move_speed;
        if !(speed.is_finite() && speed > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "movement.move_speed must be positive, got {speed}"
            )));
        }
        for keyword in self.exit_keywords.keys() {
            validate_keyword(keyword)?;
        }
        Ok(())
    }

    pub fn build_trie(&self) -> BitTrie {
        BitTrie::with_layout(self.trie.depth, self.trie.layout)
    }

    pub fn input_buffer(&self) -> InputBuffer {
        InputBuffer::new(self.build_trie(), self.buffer.capacity, self.buffer.max_letters)
    }

    pub fn exit_handler(&self) -> Result<ExitHandler, KeywordError> {
        ExitHandler::from_map(&self.exit_keywords)
    }

    pub fn transition_settings(&self) -> TransitionSettings {
        TransitionSettings {
            move_speed: self.movement.move_speed,
            local_offset: Vec3::from_array(self.movement.local_offset),
            pitch: self.movement.pitch,
        }
    }

    pub fn neighbor_layout(&self) -> NeighborLayout {
        NeighborLayout {
            left: self.rooms.neighbors.left.into(),
            center: self.rooms.neighbors.center.into(),
            right: self.rooms.neighbors.right.into(),
        }
    }

    pub fn start_room_pose(&self) -> Pose {
        Pose::from_yaw(Vec3::from_array(self.rooms.start_position), self.rooms.start_yaw)
    }

    /// Exit keywords that contain a letter the trie cannot produce.
    pub fn unreachable_keywords(&self) -> Vec<String> {
        let trie = self.build_trie();
        self.exit_keywords
            .keys()
            .filter(|k| k.chars().any(|c| trie.path_for(c).is_none()))
            .cloned()
            .collect()
    }
}
