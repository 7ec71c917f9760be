//! QA tests for full play-throughs using the headless API.
//!
//! These tests drive the game the way a player does, one move at a time:
//! - Spelling letters and keywords by walking between rooms
//! - Transition timing and interruption
//! - Reset from every state
//! - Room bookkeeping across many moves
//!
//! Run with: `cargo test -p whitespace-core --test qa_flow`

use bevy_math::Vec3;
use whitespace_core::config::{GameConfig, InterruptPolicy};
use whitespace_core::decoder::DecodeResult;
use whitespace_core::headless::HeadlessGame;
use whitespace_core::keywords::ExitAction;
use whitespace_core::rooms::{Direction, RoomSlot};
use whitespace_core::session::{GameEvent, GameInput};
use whitespace_core::testing::{
    assert_idle, assert_letters, assert_pose_near, assert_vec_near, assert_yaw_near, inputs_for,
    TestHarness,
};
use whitespace_core::transition::TransitionState;

// =============================================================================
// SPELLING
// =============================================================================

#[test]
fn test_spelling_exit_word_clears_letters() {
    let mut harness = TestHarness::new();
    harness.spell("SOMETEXIT");

    let hits = harness.keyword_hits();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].keyword, "EXIT");
    assert_eq!(hits[0].narrative, ExitAction::Easy.narrative());
    assert_letters(&harness, "");
    assert_eq!(harness.game.history(), &["EXIT".to_string()]);
    assert_idle(&harness);
}

#[test]
fn test_keyword_fires_as_soon_as_it_is_spelled() {
    let mut harness = TestHarness::new();
    harness.spell("EXITED");

    let hits = harness.keyword_hits();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].keyword, "EXIT");
    assert_letters(&harness, "ED");
}

#[test]
fn test_keywords_fire_again_after_clearing() {
    let mut harness = TestHarness::new();
    harness.spell("OPEN").spell("DEPART");

    let words: Vec<_> = harness.keyword_hits().iter().map(|h| h.keyword.clone()).collect();
    assert_eq!(words, vec!["OPEN", "DEPART"]);
    assert_eq!(
        harness.game.last_narrative(),
        Some(ExitAction::Medium.narrative())
    );
}

#[test]
fn test_leaves_layout_spells_first_sixteen_letters() {
    let mut game = HeadlessGame::new(GameConfig::default()).unwrap();
    game.type_word("GONE").unwrap();
    assert_eq!(game.last_narrative(), Some(ExitAction::Easy.narrative()));
    assert_eq!(game.letters(), "");
}

#[test]
fn test_preview_tracks_pending_bits() {
    let mut harness = TestHarness::new();
    let trie = harness.game.session().buffer().trie().clone();
    let inputs = inputs_for(&trie, 'N').unwrap();

    // Everything but the final Forward.
    harness.play(&inputs[..inputs.len() - 1]);
    assert_eq!(harness.game.preview(), DecodeResult::Letter('N'));
    assert_eq!(harness.bit_string(), "111");

    harness.play(&[GameInput::Forward]);
    assert_letters(&harness, "N");
    assert_eq!(harness.bit_string(), "");
}

#[test]
fn test_backspace_fixes_a_wrong_turn() {
    let mut harness = TestHarness::new();
    // Meant E (10) but went right twice.
    harness.play(&[GameInput::Right, GameInput::Right]);
    assert_eq!(harness.game.backspace(), Ok(true));
    harness.play(&[GameInput::Left, GameInput::Forward]);
    assert_letters(&harness, "E");
}

// =============================================================================
// TRANSITIONS
// =============================================================================

#[test]
fn test_forward_move_timing() {
    let mut game = HeadlessGame::new(GameConfig::default()).unwrap();
    let start = game.traveler();
    assert_vec_near(start.position, Vec3::new(0.0, 1.6, 0.0));

    // Center doorway (0,1.6,4), next room's far wall lines up with it,
    // rest point at (0,1.6,8): eight units at four per second.
    game.press(GameInput::Forward);
    let plan = game.session().engine().plan().unwrap().clone();
    assert!((plan.path.total_length() - 8.0).abs() < 1e-4);
    assert!((game.session().engine().duration().unwrap() - 2.0).abs() < 1e-4);

    game.step(0.5);
    assert_vec_near(game.traveler().position, Vec3::new(0.0, 1.6, 2.0));
    game.step(1.0);
    assert_vec_near(game.traveler().position, Vec3::new(0.0, 1.6, 6.0));
    assert!(game.is_transitioning());

    let arrived = game.step(0.6);
    assert_eq!(arrived, Some(plan.dest));
    assert_vec_near(game.traveler().position, Vec3::new(0.0, 1.6, 8.0));
    assert_yaw_near(game.traveler(), 0.0);
}

#[test]
fn test_left_move_ends_facing_new_room() {
    let mut harness = TestHarness::new();
    harness.play(&[GameInput::Left]);
    assert_vec_near(harness.traveler().position, Vec3::new(-7.0, 1.6, 1.0));
    assert_yaw_near(harness.traveler(), -90.0);
    let (_, pitch, roll) = harness.traveler().euler();
    assert!((pitch + 3.0).abs() < 1e-3);
    assert!(roll.abs() < 1e-3);
}

#[test]
fn test_neighbors_follow_current_room_orientation() {
    let mut harness = TestHarness::new();
    harness.play(&[GameInput::Right, GameInput::Right]);

    // Two right turns: facing -Z, standing at (7,0,1) + yaw(90) * (7,0,1).
    assert_vec_near(harness.traveler().position, Vec3::new(8.0, 1.6, -6.0));
    assert_yaw_near(harness.traveler(), 180.0);
}

#[test]
fn test_interrupt_restarts_from_mid_flight() {
    let mut harness = TestHarness::new();
    let right = harness
        .game
        .session()
        .graph()
        .neighbor(Direction::Right)
        .unwrap();

    harness.press(GameInput::Left).frames(20);
    let mid = harness.traveler().position;
    assert!(harness.game.is_transitioning());

    harness.press(GameInput::Right);
    let plan = harness.game.session().engine().plan().unwrap().clone();
    assert_eq!(plan.path.points()[0], mid);
    assert_eq!(
        harness.game.session().state(),
        TransitionState::Transitioning {
            target: right,
            direction: Direction::Right
        }
    );

    harness.settle();
    assert_eq!(harness.arrivals(), vec![right]);
    assert_eq!(harness.bit_string(), "01");
}

#[test]
fn test_ignore_policy_keeps_first_target() {
    let config = GameConfig::default().with_interrupt(InterruptPolicy::Ignore);
    let mut harness = TestHarness::with_config(config).unwrap();
    let left = harness.game.session().graph().neighbor(Direction::Left).unwrap();

    harness.press(GameInput::Left).frames(10);
    harness.press(GameInput::Forward).press(GameInput::Right).settle();

    assert_eq!(harness.arrivals(), vec![left]);
    assert_eq!(harness.bit_string(), "0");
    let ignored = harness
        .log()
        .iter()
        .filter(|e| matches!(e, GameEvent::InputIgnored(_)))
        .count();
    assert_eq!(ignored, 2);
}

// =============================================================================
// RESET
// =============================================================================

#[test]
fn test_reset_from_idle_mid_flight_and_after_moves() {
    let mut harness = TestHarness::new();
    let start_pose = harness.game.session().start_pose();

    // Idle with pending bits and letters.
    harness.spell("AB").play(&[GameInput::Right]);
    harness.press(GameInput::Reset);
    assert_idle(&harness);
    assert_letters(&harness, "");
    assert_pose_near(harness.traveler(), start_pose);

    // Mid-flight.
    harness.press(GameInput::Left).frames(5);
    harness.press(GameInput::Reset);
    assert_idle(&harness);
    assert_pose_near(harness.traveler(), start_pose);
    harness.frames(120);
    // Four moves spelling AB plus one more; the cancelled move never lands.
    assert_eq!(harness.arrivals().len(), 5);

    let current = harness.game.current_room().unwrap();
    assert_eq!(harness.game.rooms().slot(current), Some(RoomSlot::Current));
    assert_eq!(harness.game.rooms().len(), 4);
}

// =============================================================================
// ROOM BOOKKEEPING
// =============================================================================

#[test]
fn test_room_count_stays_bounded() {
    let mut harness = TestHarness::new();
    let moves = [GameInput::Left, GameInput::Forward, GameInput::Right];
    for i in 0..30 {
        harness.play(&[moves[i % 3]]);
        assert_eq!(harness.game.rooms().len(), 4);
        assert!(harness.game.rooms().rooms_in(RoomSlot::Old).is_empty());
    }
    assert_eq!(harness.arrivals().len(), 30);

    let rooms = harness.game.rooms();
    assert_eq!(rooms.spawned_total() - rooms.destroyed_total(), 4);
}

#[test]
fn test_old_rooms_survive_until_arrival() {
    let mut harness = TestHarness::new();
    let start = harness.game.current_room().unwrap();

    harness.press(GameInput::Forward).frames(30);
    assert!(harness.game.rooms().contains(start));
    assert_eq!(harness.game.rooms().slot(start), Some(RoomSlot::Current));

    harness.settle();
    assert!(!harness.game.rooms().contains(start));
}

#[test]
fn test_missing_waypoints_still_move() {
    let mut harness = TestHarness::new();
    let current = harness.game.current_room().unwrap();
    let target = harness
        .game
        .session()
        .graph()
        .neighbor(Direction::Center)
        .unwrap();

    let rooms = harness.game.rooms_mut();
    rooms.remove_waypoint(current, whitespace_core::rooms::Waypoint::Center);
    rooms.remove_waypoint(target, whitespace_core::rooms::Waypoint::End);

    harness.play(&[GameInput::Forward]);
    assert_eq!(harness.arrivals(), vec![target]);
    assert_vec_near(harness.traveler().position, Vec3::new(0.0, 1.6, 8.0));
}
