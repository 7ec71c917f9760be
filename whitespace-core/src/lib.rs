//! Whitespace game engine: binary input, keywords and room-to-room travel.
//!
//! This crate provides:
//! - A fixed-depth bit trie that turns left/right choices into letters
//! - An input buffer and keyword dispatcher watching the typed letters
//! - A graph of procedurally spawned rooms and the timed camera transitions
//!   that move between them
//! - A headless session for tests and scripted play
//!
//! Rendering is left to the front end, which implements [`RoomFactory`].
//!
//! # Quick Start
//!
//! ```
//! use whitespace_core::{GameConfig, GameInput, GameSession, RoomRegistry};
//!
//! let mut rooms = RoomRegistry::default();
//! let mut session = GameSession::new(GameConfig::default(), &mut rooms).unwrap();
//!
//! session.handle(GameInput::Left, &mut rooms);
//! while session.is_transitioning() {
//!     session.tick(1.0 / 60.0, &mut rooms);
//! }
//! assert_eq!(session.buffer().bit_string(), "0");
//! ```

pub mod config;
pub mod decoder;
pub mod headless;
pub mod input;
pub mod keywords;
pub mod pose;
pub mod rooms;
pub mod session;
pub mod testing;
pub mod transition;

// Primary public API
pub use config::{ConfigError, GameConfig, InterruptPolicy};
pub use decoder::{BitTrie, DecodeResult, TrieLayout};
pub use headless::HeadlessGame;
pub use input::{BufferError, InputBuffer};
pub use keywords::{ExitAction, ExitHandler, KeywordDispatcher, KeywordHandler, KeywordMatch, KeywordTable};
pub use pose::Pose;
pub use rooms::{Direction, RoomBlueprint, RoomFactory, RoomGraph, RoomId, RoomRegistry, RoomSlot, Waypoint};
pub use session::{GameEvent, GameInput, GameSession, SessionError};
pub use testing::TestHarness;
pub use transition::{PitchMode, TransitionEngine, TransitionSettings, TransitionState};
