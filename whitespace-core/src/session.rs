//! GameSession - the service that owns one run of the game.
//!
//! Directional input does two things at once: it moves the traveler toward a
//! neighboring room, and it feeds the input buffer (left and right insert a
//! bit, forward submits). Frame ticks drive the transition; arrival promotes
//! the destination room and rebuilds the neighbors.
//!
//! The session never owns rooms. Every call that can create or destroy one
//! takes the [`RoomFactory`] as an argument.

use crate::config::{ConfigError, GameConfig, InterruptPolicy};
use crate::decoder::DecodeResult;
use crate::input::{BufferError, InputBuffer};
use crate::keywords::{KeywordDispatcher, KeywordError, KeywordHandler, KeywordMatch};
use crate::pose::Pose;
use crate::rooms::{Direction, RoomFactory, RoomGraph, RoomId};
use crate::transition::{plan_path, TransitionEngine, TransitionState};
use thiserror::Error;

/// Undrained events kept before the oldest are dropped.
pub const EVENT_BACKLOG: usize = 1024;

/// Errors from creating or driving a session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Keyword error: {0}")]
    Keyword(#[from] KeywordError),

    #[error("Letter {0:?} cannot be spelled with this trie")]
    Unspellable(char),
}

/// A player command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameInput {
    Left,
    Forward,
    Right,
    Reset,
}

impl GameInput {
    /// The room this input walks toward, if it is a move.
    pub fn direction(self) -> Option<Direction> {
        match self {
            GameInput::Left => Some(Direction::Left),
            GameInput::Forward => Some(Direction::Center),
            GameInput::Right => Some(Direction::Right),
            GameInput::Reset => None,
        }
    }
}

impl From<Direction> for GameInput {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Left => GameInput::Left,
            Direction::Center => GameInput::Forward,
            Direction::Right => GameInput::Right,
        }
    }
}

/// Something observable that happened inside the session.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    BitInserted(bool),
    BitRemoved(bool),
    LetterDecoded(char),
    /// A submit landed on a node with no letter.
    SubmitOverflow,
    /// A submit ran out of bits before reaching a leaf.
    SubmitIncomplete,
    KeywordMatched(KeywordMatch),
    TransitionStarted { target: RoomId, direction: Direction },
    Arrived(RoomId),
    /// Input dropped because a transition was running.
    InputIgnored(GameInput),
    Reset(RoomId),
}

/// One running game: buffer, keywords, rooms, traveler.
pub struct GameSession {
    config: GameConfig,
    buffer: InputBuffer,
    dispatcher: KeywordDispatcher,
    graph: RoomGraph,
    engine: TransitionEngine,
    traveler: Pose,
    events: Vec<GameEvent>,
    last_narrative: Option<String>,
}

impl GameSession {
    /// Build a session and spawn the start room with its neighbors.
    pub fn new(config: GameConfig, factory: &mut impl RoomFactory) -> Result<Self, SessionError> {
        config.validate()?;

        let mut dispatcher = KeywordDispatcher::new();
        dispatcher.register(config.exit_handler()?);

        for keyword in config.unreachable_keywords() {
            tracing::warn!(%keyword, "keyword uses letters this trie cannot produce");
        }

        let mut session = Self {
            buffer: config.input_buffer(),
            dispatcher,
            graph: RoomGraph::new(config.neighbor_layout(), config.start_room_pose()),
            engine: TransitionEngine::new(config.transition_settings()),
            traveler: Pose::IDENTITY,
            events: Vec::new(),
            last_narrative: None,
            config,
        };
        session.reset(factory);
        Ok(session)
    }

    /// Add another keyword handler after the exit handler.
    pub fn register_handler(&mut self, handler: impl KeywordHandler + 'static) {
        self.dispatcher.register(handler);
    }

    /// Route one player command.
    pub fn handle(&mut self, input: GameInput, factory: &mut impl RoomFactory) {
        match input.direction() {
            Some(direction) => self.step(direction, factory),
            None => self.reset(factory),
        }
    }

    /// Advance running transitions by `dt` seconds.
    ///
    /// Returns the room the traveler arrived in, if any.
    pub fn tick(&mut self, dt: f32, factory: &mut impl RoomFactory) -> Option<RoomId> {
        let dest = self.engine.tick(dt, &mut self.traveler)?;
        self.arrive(dest, factory);
        Some(dest)
    }

    /// Remove the newest pending bit.
    pub fn backspace(&mut self) -> Result<bool, BufferError> {
        let bit = self.buffer.backspace()?;
        self.push_event(GameEvent::BitRemoved(bit));
        Ok(bit)
    }

    /// Cancel any transition, clear the buffer and rebuild the rooms around
    /// a fresh start room.
    pub fn reset(&mut self, factory: &mut impl RoomFactory) {
        self.engine.cancel();
        self.buffer.clear();
        self.last_narrative = None;

        let start = self.graph.reset(factory);
        self.traveler = self.start_pose();

        tracing::info!(room = %start, "session reset");
        self.push_event(GameEvent::Reset(start));
    }

    /// Destroy every room this session spawned.
    pub fn shutdown(mut self, factory: &mut impl RoomFactory) {
        self.engine.cancel();
        self.graph.teardown(factory);
    }

    fn step(&mut self, direction: Direction, factory: &mut impl RoomFactory) {
        if self.engine.is_transitioning() && self.config.movement.interrupt == InterruptPolicy::Ignore {
            tracing::debug!(?direction, "transition running, input ignored");
            self.push_event(GameEvent::InputIgnored(direction.into()));
            return;
        }

        self.start_transition(direction, factory);

        match direction.bit() {
            Some(bit) => {
                self.buffer.insert(bit);
                self.push_event(GameEvent::BitInserted(bit));
            }
            None => self.submit(),
        }
    }

    fn start_transition(&mut self, direction: Direction, factory: &mut impl RoomFactory) {
        let Some(target) = self.graph.neighbor(direction) else {
            tracing::error!(?direction, "no neighbor room to move into");
            return;
        };

        let plan = plan_path(
            factory,
            self.engine.settings(),
            self.traveler,
            self.graph.current(),
            target,
            direction,
        );
        self.push_event(GameEvent::TransitionStarted { target, direction });

        if let Some(dest) = self.engine.begin(plan, &mut self.traveler) {
            self.arrive(dest, factory);
        }
    }

    fn submit(&mut self) {
        match self.buffer.submit() {
            DecodeResult::Letter(letter) => {
                self.push_event(GameEvent::LetterDecoded(letter));
                for hit in self.dispatcher.notify_all(&mut self.buffer) {
                    self.last_narrative = Some(hit.narrative.clone());
                    self.push_event(GameEvent::KeywordMatched(hit));
                }
            }
            DecodeResult::Overflow => self.push_event(GameEvent::SubmitOverflow),
            DecodeResult::Incomplete => self.push_event(GameEvent::SubmitIncomplete),
        }
    }

    fn push_event(&mut self, event: GameEvent) {
        if self.events.len() >= EVENT_BACKLOG {
            self.events.remove(0);
        }
        self.events.push(event);
    }

    fn arrive(&mut self, dest: RoomId, factory: &mut impl RoomFactory) {
        self.graph.advance(dest, factory);
        tracing::info!(room = %dest, "arrived");
        self.push_event(GameEvent::Arrived(dest));
    }

    // ========================================================================
    // State Queries
    // ========================================================================

    /// Where the traveler stands after a reset.
    pub fn start_pose(&self) -> Pose {
        self.engine
            .settings()
            .rest_pose(self.graph.start_pose(), Pose::IDENTITY)
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn buffer(&self) -> &InputBuffer {
        &self.buffer
    }

    pub fn dispatcher(&self) -> &KeywordDispatcher {
        &self.dispatcher
    }

    pub fn graph(&self) -> &RoomGraph {
        &self.graph
    }

    pub fn engine(&self) -> &TransitionEngine {
        &self.engine
    }

    pub fn state(&self) -> TransitionState {
        self.engine.state()
    }

    pub fn is_transitioning(&self) -> bool {
        self.engine.is_transitioning()
    }

    pub fn traveler(&self) -> Pose {
        self.traveler
    }

    pub fn current_room(&self) -> Option<RoomId> {
        self.graph.current()
    }

    /// What a submit would produce right now.
    pub fn preview(&self) -> DecodeResult {
        self.buffer.peek_decode()
    }

    /// Narrative of the most recent keyword since the last reset.
    pub fn last_narrative(&self) -> Option<&str> {
        self.last_narrative.as_deref()
    }

    /// Events not yet drained, oldest first.
    ///
    /// Callers are expected to [`drain_events`](Self::drain_events) once per
    /// frame. Past [`EVENT_BACKLOG`] undrained events the oldest are dropped.
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

impl std::fmt::Debug for GameSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSession")
            .field("bits", &self.buffer.bit_string())
            .field("letters", &self.buffer.letters())
            .field("graph", &self.graph)
            .field("engine", &self.engine)
            .field("traveler", &self.traveler)
            .finish()
    }
}
