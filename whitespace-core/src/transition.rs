//! Timed camera transitions between rooms.
//!
//! A transition is two frame tasks sharing one timeline: a movement task that
//! walks a four-point polyline at constant speed, and a rotation task that
//! swings the yaw toward the next room's doorway and then to the room itself.
//! Both are resumed once per tick and are started and cancelled together.

use crate::pose::{euler_rotation, lerp_angle, Pose};
use crate::rooms::{Direction, RoomFactory, RoomId, Waypoint};
use bevy_math::Vec3;
use serde::{Deserialize, Serialize};

/// Paths shorter than this snap straight to the destination.
pub const MIN_PATH_LENGTH: f32 = 1e-5;

/// Speeds are clamped to at least this many units per second.
const MIN_SPEED: f32 = 1e-4;

/// Whether a frame task wants more frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Running,
    Completed,
}

/// A unit of work resumed once per frame with the time since the last one.
pub trait FrameTask: Send + Sync {
    fn resume(&mut self, dt: f32, traveler: &mut Pose) -> TaskStatus;
}

/// How pitch and roll are held while the yaw turns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PitchMode {
    /// Pin pitch to a constant tilt in degrees, roll to zero.
    Fixed { degrees: f32 },
    /// Keep whatever pitch and roll the traveler had when the transition began.
    Preserve,
}

impl Default for PitchMode {
    fn default() -> Self {
        PitchMode::Fixed { degrees: -3.0 }
    }
}

impl PitchMode {
    /// `(pitch, roll)` in degrees for a traveler currently at `pose`.
    pub fn attitude(self, pose: Pose) -> (f32, f32) {
        match self {
            PitchMode::Fixed { degrees } => (degrees, 0.0),
            PitchMode::Preserve => {
                let (_, pitch, roll) = pose.euler();
                (pitch, roll)
            }
        }
    }
}

/// Knobs for path construction and interpolation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionSettings {
    /// Units per second along the path.
    pub move_speed: f32,
    /// Traveler position inside a room, in the room's yaw frame.
    pub local_offset: Vec3,
    pub pitch: PitchMode,
}

impl Default for TransitionSettings {
    fn default() -> Self {
        Self {
            move_speed: 4.0,
            local_offset: Vec3::new(0.0, 1.6, 0.0),
            pitch: PitchMode::default(),
        }
    }
}

impl TransitionSettings {
    /// Where the traveler rests inside a room at `room`.
    pub fn rest_pose(&self, room: Pose, current: Pose) -> Pose {
        let (pitch, roll) = self.pitch.attitude(current);
        let yaw = room.yaw();
        Pose {
            position: room.position + room.yaw_only() * self.local_offset,
            rotation: euler_rotation(yaw, pitch, roll),
        }
    }

    fn speed(&self) -> f32 {
        self.move_speed.max(MIN_SPEED)
    }
}

/// Polyline with precomputed segment lengths.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    points: [Vec3; 4],
    segments: [f32; 3],
    total: f32,
}

impl Polyline {
    pub fn new(points: [Vec3; 4]) -> Self {
        let segments = [
            points[0].distance(points[1]),
            points[1].distance(points[2]),
            points[2].distance(points[3]),
        ];
        let total = segments.iter().sum();
        Self {
            points,
            segments,
            total,
        }
    }

    pub fn points(&self) -> &[Vec3; 4] {
        &self.points
    }

    pub fn segment_lengths(&self) -> &[f32; 3] {
        &self.segments
    }

    pub fn total_length(&self) -> f32 {
        self.total
    }

    /// The point `distance` units along the path, clamped to its ends.
    pub fn point_at(&self, distance: f32) -> Vec3 {
        let distance = distance.clamp(0.0, self.total);

        let mut acc = 0.0;
        let mut index = 0;
        while index < self.segments.len() - 1 && acc + self.segments[index] < distance {
            acc += self.segments[index];
            index += 1;
        }

        let len = self.segments[index];
        let t = if len > f32::EPSILON {
            ((distance - acc) / len).clamp(0.0, 1.0)
        } else {
            1.0
        };
        self.points[index].lerp(self.points[index + 1], t)
    }
}

/// Two-phase yaw schedule over a transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YawTimeline {
    pub start: f32,
    /// Reached at `entry_time`.
    pub entry: f32,
    pub end: f32,
    pub entry_time: f32,
    pub total_time: f32,
}

impl YawTimeline {
    pub fn yaw_at(&self, elapsed: f32) -> f32 {
        if self.total_time <= f32::EPSILON {
            return self.end;
        }

        if self.entry_time <= 0.0 {
            lerp_angle(self.start, self.end, elapsed / self.total_time)
        } else if elapsed <= self.entry_time {
            lerp_angle(self.start, self.entry, elapsed / self.entry_time)
        } else {
            let rest = (self.total_time - self.entry_time).max(MIN_SPEED);
            lerp_angle(self.entry, self.end, (elapsed - self.entry_time) / rest)
        }
    }
}

/// Moves the traveler along a polyline at constant speed.
#[derive(Debug, Clone)]
pub struct MoveTask {
    path: Polyline,
    speed: f32,
    traveled: f32,
}

impl MoveTask {
    pub fn new(path: Polyline, speed: f32) -> Self {
        Self {
            path,
            speed: speed.max(MIN_SPEED),
            traveled: 0.0,
        }
    }

    pub fn traveled(&self) -> f32 {
        self.traveled
    }
}

impl FrameTask for MoveTask {
    fn resume(&mut self, dt: f32, traveler: &mut Pose) -> TaskStatus {
        self.traveled = (self.traveled + self.speed * dt).min(self.path.total_length());
        traveler.position = self.path.point_at(self.traveled);

        if self.traveled >= self.path.total_length() {
            TaskStatus::Completed
        } else {
            TaskStatus::Running
        }
    }
}

/// Turns the traveler's yaw along a [`YawTimeline`].
#[derive(Debug, Clone)]
pub struct RotateTask {
    timeline: YawTimeline,
    pitch: f32,
    roll: f32,
    elapsed: f32,
}

impl RotateTask {
    pub fn new(timeline: YawTimeline, pitch: f32, roll: f32) -> Self {
        Self {
            timeline,
            pitch,
            roll,
            elapsed: 0.0,
        }
    }
}

impl FrameTask for RotateTask {
    fn resume(&mut self, dt: f32, traveler: &mut Pose) -> TaskStatus {
        self.elapsed += dt;
        let yaw = self.timeline.yaw_at(self.elapsed);
        traveler.rotation = euler_rotation(yaw, self.pitch, self.roll);

        if self.elapsed >= self.timeline.total_time {
            traveler.rotation = euler_rotation(self.timeline.end, self.pitch, self.roll);
            TaskStatus::Completed
        } else {
            TaskStatus::Running
        }
    }
}

/// Everything needed to run one transition.
#[derive(Debug, Clone, PartialEq)]
pub struct PathPlan {
    pub dest: RoomId,
    pub direction: Direction,
    pub path: Polyline,
    /// Yaw of the destination's `End` waypoint.
    pub exit_yaw: f32,
    pub final_yaw: f32,
    pub pitch: f32,
    pub roll: f32,
}

impl PathPlan {
    pub fn final_position(&self) -> Vec3 {
        self.path.points()[3]
    }

    pub fn final_pose(&self) -> Pose {
        Pose::new(
            self.final_position(),
            euler_rotation(self.final_yaw, self.pitch, self.roll),
        )
    }
}

/// Build the path from the traveler's pose into `dest`.
///
/// Missing authoring data never blocks movement: a missing waypoint falls
/// back to its room's pose, and a missing room falls back to the traveler.
pub fn plan_path(
    factory: &impl RoomFactory,
    settings: &TransitionSettings,
    traveler: Pose,
    current: Option<RoomId>,
    dest: RoomId,
    direction: Direction,
) -> PathPlan {
    let entry = anchor(factory, current, direction.waypoint(), traveler);
    let exit = anchor(factory, Some(dest), Waypoint::End, traveler);

    let rest = match factory.room_pose(dest) {
        Some(room) => settings.rest_pose(room, traveler),
        None => {
            tracing::error!(%dest, "destination room missing, staying on the traveler's pose");
            traveler
        }
    };
    let (pitch, roll) = settings.pitch.attitude(traveler);

    PathPlan {
        dest,
        direction,
        path: Polyline::new([traveler.position, entry.position, exit.position, rest.position]),
        exit_yaw: exit.yaw(),
        final_yaw: rest.yaw(),
        pitch,
        roll,
    }
}

fn anchor(
    factory: &impl RoomFactory,
    room: Option<RoomId>,
    waypoint: Waypoint,
    traveler: Pose,
) -> Pose {
    if let Some(room) = room {
        if let Some(pose) = factory.waypoint(room, waypoint) {
            return pose;
        }
        if let Some(pose) = factory.room_pose(room) {
            tracing::warn!(%room, waypoint = waypoint.name(), "waypoint missing, using room center");
            return pose;
        }
    }

    tracing::error!(
        room = ?room,
        waypoint = waypoint.name(),
        "no room for waypoint, using traveler pose"
    );
    traveler
}

/// Where the engine is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionState {
    Idle,
    Transitioning { target: RoomId, direction: Direction },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskKind {
    Movement,
    Rotation,
}

/// Drives the traveler between rooms. Never creates or destroys rooms.
pub struct TransitionEngine {
    settings: TransitionSettings,
    state: TransitionState,
    tasks: Vec<(TaskKind, Box<dyn FrameTask>)>,
    plan: Option<PathPlan>,
    elapsed: f32,
}

impl TransitionEngine {
    pub fn new(settings: TransitionSettings) -> Self {
        Self {
            settings,
            state: TransitionState::Idle,
            tasks: Vec::new(),
            plan: None,
            elapsed: 0.0,
        }
    }

    pub fn settings(&self) -> &TransitionSettings {
        &self.settings
    }

    pub fn state(&self) -> TransitionState {
        self.state
    }

    pub fn is_transitioning(&self) -> bool {
        matches!(self.state, TransitionState::Transitioning { .. })
    }

    /// The plan being executed, if any.
    pub fn plan(&self) -> Option<&PathPlan> {
        self.plan.as_ref()
    }

    /// Number of running frame tasks.
    pub fn active_tasks(&self) -> usize {
        self.tasks.len()
    }

    /// Seconds since the running transition began.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Total seconds the running transition takes.
    pub fn duration(&self) -> Option<f32> {
        self.plan
            .as_ref()
            .map(|p| p.path.total_length() / self.settings.speed())
    }

    /// Start a transition, replacing any in flight.
    ///
    /// Returns the destination straight away if the path is too short to
    /// animate; the traveler has then already been snapped.
    pub fn begin(&mut self, plan: PathPlan, traveler: &mut Pose) -> Option<RoomId> {
        self.cancel();

        let total_length = plan.path.total_length();
        if total_length <= MIN_PATH_LENGTH {
            tracing::debug!(dest = %plan.dest, "zero-length path, snapping");
            *traveler = plan.final_pose();
            return Some(plan.dest);
        }

        let speed = self.settings.speed();
        let total_time = total_length / speed;
        let entry_time = plan.path.segment_lengths()[0] / speed;
        let timeline = YawTimeline {
            start: traveler.yaw(),
            entry: plan.exit_yaw,
            end: plan.final_yaw,
            entry_time,
            total_time,
        };

        tracing::info!(
            direction = ?plan.direction,
            dest = %plan.dest,
            length = total_length,
            seconds = total_time,
            "transition started"
        );

        self.tasks.push((
            TaskKind::Movement,
            Box::new(MoveTask::new(plan.path.clone(), speed)),
        ));
        self.tasks.push((
            TaskKind::Rotation,
            Box::new(RotateTask::new(timeline, plan.pitch, plan.roll)),
        ));
        self.state = TransitionState::Transitioning {
            target: plan.dest,
            direction: plan.direction,
        };
        self.plan = Some(plan);
        None
    }

    /// Resume every running task once. Returns the destination on arrival.
    pub fn tick(&mut self, dt: f32, traveler: &mut Pose) -> Option<RoomId> {
        if self.tasks.is_empty() {
            return None;
        }

        self.elapsed += dt;
        let mut arrived = false;
        self.tasks.retain_mut(|(kind, task)| match task.resume(dt, traveler) {
            TaskStatus::Running => true,
            TaskStatus::Completed => {
                arrived |= *kind == TaskKind::Movement;
                false
            }
        });

        if !arrived {
            return None;
        }

        let plan = self.plan.take()?;
        *traveler = plan.final_pose();
        self.tasks.clear();
        self.state = TransitionState::Idle;
        self.elapsed = 0.0;
        tracing::info!(dest = %plan.dest, "transition finished");
        Some(plan.dest)
    }

    /// Drop any running tasks immediately and go idle.
    pub fn cancel(&mut self) {
        if self.is_transitioning() {
            tracing::debug!("cancelling transition in flight");
        }
        self.tasks.clear();
        self.plan = None;
        self.elapsed = 0.0;
        self.state = TransitionState::Idle;
    }
}

impl std::fmt::Debug for TransitionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionEngine")
            .field("settings", &self.settings)
            .field("state", &self.state)
            .field("tasks", &self.tasks.iter().map(|(k, _)| *k).collect::<Vec<_>>())
            .field("elapsed", &self.elapsed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rooms::{RoomRegistry, RoomSlot};

    fn near(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-3
    }

    fn flat_settings() -> TransitionSettings {
        TransitionSettings {
            move_speed: 4.0,
            local_offset: Vec3::ZERO,
            pitch: PitchMode::Fixed { degrees: 0.0 },
        }
    }

    /// Current room at the origin, target at (10,0,0) facing yaw 90, with
    /// the entry at (2,0,0) and the exit at (8,0,0).
    fn straight_corridor() -> (RoomRegistry, RoomId, RoomId) {
        let mut rooms = RoomRegistry::default();
        let current = rooms.spawn(RoomSlot::Current, Pose::IDENTITY);
        let target = rooms.spawn(RoomSlot::Right, Pose::from_yaw(Vec3::new(10.0, 0.0, 0.0), 90.0));
        rooms.set_waypoint(current, Waypoint::Right, Pose::from_yaw(Vec3::new(2.0, 0.0, 0.0), 0.0));
        rooms.set_waypoint(target, Waypoint::End, Pose::from_yaw(Vec3::new(8.0, 0.0, 0.0), 90.0));
        (rooms, current, target)
    }

    #[test]
    fn test_polyline_lengths_and_clamping() {
        let path = Polyline::new([
            Vec3::ZERO,
            Vec3::new(3.0, 0.0, 0.0),
            Vec3::new(3.0, 4.0, 0.0),
            Vec3::new(3.0, 4.0, 0.0),
        ]);
        assert_eq!(path.segment_lengths(), &[3.0, 4.0, 0.0]);
        assert_eq!(path.total_length(), 7.0);

        assert!(near(path.point_at(1.5), Vec3::new(1.5, 0.0, 0.0)));
        assert!(near(path.point_at(5.0), Vec3::new(3.0, 2.0, 0.0)));
        assert!(near(path.point_at(100.0), Vec3::new(3.0, 4.0, 0.0)));
        assert!(near(path.point_at(-1.0), Vec3::ZERO));
    }

    #[test]
    fn test_yaw_timeline_phases() {
        let timeline = YawTimeline {
            start: 0.0,
            entry: 90.0,
            end: 180.0,
            entry_time: 1.0,
            total_time: 3.0,
        };
        assert!((timeline.yaw_at(0.5) - 45.0).abs() < 1e-3);
        assert!((timeline.yaw_at(1.0) - 90.0).abs() < 1e-3);
        assert!((timeline.yaw_at(2.0) - 135.0).abs() < 1e-3);
        assert!((timeline.yaw_at(5.0) - 180.0).abs() < 1e-3);

        let single = YawTimeline {
            entry_time: 0.0,
            ..timeline
        };
        assert!((single.yaw_at(1.5) - 90.0).abs() < 1e-3);
    }

    #[test]
    fn test_corridor_moves_at_constant_speed() {
        let (rooms, current, target) = straight_corridor();
        let settings = flat_settings();
        let mut traveler = Pose::IDENTITY;
        let plan = plan_path(&rooms, &settings, traveler, Some(current), target, Direction::Right);

        let expected = 2.0 + 6.0 + 2.0;
        assert!((plan.path.total_length() - expected).abs() < 1e-4);

        let mut engine = TransitionEngine::new(settings);
        assert_eq!(engine.begin(plan, &mut traveler), None);
        assert!((engine.duration().unwrap() - expected / 4.0).abs() < 1e-4);
        assert_eq!(engine.active_tasks(), 2);

        assert_eq!(engine.tick(0.25, &mut traveler), None);
        assert!(near(traveler.position, Vec3::new(1.0, 0.0, 0.0)));
        // Halfway through phase one, heading toward the exit yaw.
        assert!((traveler.yaw() - 45.0).abs() < 1e-2);

        assert_eq!(engine.tick(0.75, &mut traveler), None);
        assert!(near(traveler.position, Vec3::new(4.0, 0.0, 0.0)));

        assert_eq!(engine.tick(1.0, &mut traveler), None);
        assert!(near(traveler.position, Vec3::new(8.0, 0.0, 0.0)));

        assert_eq!(engine.tick(1.0, &mut traveler), Some(target));
        assert!(near(traveler.position, Vec3::new(10.0, 0.0, 0.0)));
        assert!((traveler.yaw() - 90.0).abs() < 1e-3);
        assert_eq!(engine.state(), TransitionState::Idle);
        assert_eq!(engine.active_tasks(), 0);
    }

    #[test]
    fn test_move_task_clamps_distance() {
        let path = Polyline::new([
            Vec3::ZERO,
            Vec3::new(0.0, 0.0, 2.0),
            Vec3::new(0.0, 0.0, 4.0),
            Vec3::new(0.0, 0.0, 6.0),
        ]);
        let mut task = MoveTask::new(path, 4.0);
        let mut traveler = Pose::IDENTITY;

        assert_eq!(task.resume(0.5, &mut traveler), TaskStatus::Running);
        assert!((task.traveled() - 2.0).abs() < 1e-5);

        assert_eq!(task.resume(10.0, &mut traveler), TaskStatus::Completed);
        assert_eq!(task.traveled(), 6.0);
        assert!(near(traveler.position, Vec3::new(0.0, 0.0, 6.0)));
    }

    #[test]
    fn test_zero_length_path_snaps() {
        let mut rooms = RoomRegistry::default();
        let here = rooms.spawn(RoomSlot::Current, Pose::IDENTITY);
        rooms.set_waypoint(here, Waypoint::Center, Pose::IDENTITY);
        rooms.set_waypoint(here, Waypoint::End, Pose::IDENTITY);

        let settings = flat_settings();
        let mut traveler = Pose::IDENTITY;
        let plan = plan_path(&rooms, &settings, traveler, Some(here), here, Direction::Center);

        let mut engine = TransitionEngine::new(settings);
        assert_eq!(engine.begin(plan, &mut traveler), Some(here));
        assert!(!engine.is_transitioning());
        assert_eq!(traveler.position, Vec3::ZERO);
    }

    #[test]
    fn test_missing_waypoints_fall_back_to_room_pose() {
        let (mut rooms, current, target) = straight_corridor();
        rooms.remove_waypoint(current, Waypoint::Right);
        rooms.remove_waypoint(target, Waypoint::End);

        let plan = plan_path(
            &rooms,
            &flat_settings(),
            Pose::IDENTITY,
            Some(current),
            target,
            Direction::Right,
        );
        let points = plan.path.points();
        assert!(near(points[1], Vec3::ZERO));
        assert!(near(points[2], Vec3::new(10.0, 0.0, 0.0)));
        assert!((plan.exit_yaw - 90.0).abs() < 1e-3);
    }

    #[test]
    fn test_missing_rooms_fall_back_to_traveler() {
        let rooms = RoomRegistry::default();
        let traveler = Pose::from_yaw(Vec3::new(1.0, 2.0, 3.0), 30.0);

        let plan = plan_path(
            &rooms,
            &flat_settings(),
            traveler,
            None,
            RoomId(42),
            Direction::Left,
        );
        for point in plan.path.points() {
            assert!(near(*point, traveler.position));
        }
        assert!((plan.final_yaw - 30.0).abs() < 1e-3);
    }

    #[test]
    fn test_begin_replaces_transition_in_flight() {
        let (rooms, current, target) = straight_corridor();
        let settings = flat_settings();
        let mut traveler = Pose::IDENTITY;
        let mut engine = TransitionEngine::new(settings);

        let plan = plan_path(&rooms, &settings, traveler, Some(current), target, Direction::Right);
        engine.begin(plan, &mut traveler);
        engine.tick(0.75, &mut traveler);
        let mid = traveler.position;
        assert!(near(mid, Vec3::new(3.0, 0.0, 0.0)));

        let plan = plan_path(&rooms, &settings, traveler, Some(current), target, Direction::Right);
        assert!(near(plan.path.points()[0], mid));
        engine.begin(plan, &mut traveler);
        assert_eq!(engine.active_tasks(), 2);
        assert_eq!(engine.elapsed(), 0.0);

        // The new path starts where the old one was cut off.
        engine.tick(0.0, &mut traveler);
        assert!(near(traveler.position, mid));
    }

    #[test]
    fn test_fixed_and_preserved_pitch() {
        let tilted = Pose::new(Vec3::ZERO, euler_rotation(0.0, 12.0, 0.0));

        let fixed = PitchMode::Fixed { degrees: -3.0 };
        assert_eq!(fixed.attitude(tilted), (-3.0, 0.0));

        let (pitch, roll) = PitchMode::Preserve.attitude(tilted);
        assert!((pitch - 12.0).abs() < 1e-3);
        assert!(roll.abs() < 1e-3);
    }

    #[test]
    fn test_cancel_goes_idle() {
        let (rooms, current, target) = straight_corridor();
        let settings = flat_settings();
        let mut traveler = Pose::IDENTITY;
        let mut engine = TransitionEngine::new(settings);
        let plan = plan_path(&rooms, &settings, traveler, Some(current), target, Direction::Right);
        engine.begin(plan, &mut traveler);

        engine.cancel();
        assert_eq!(engine.state(), TransitionState::Idle);
        assert_eq!(engine.tick(10.0, &mut traveler), None);
    }
}
