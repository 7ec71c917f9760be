//! The room graph: one current room and three neighbors.
//!
//! Rooms are created and destroyed through a [`RoomFactory`], which stands in
//! for whatever actually instantiates them (meshes in the Bevy shell, plain
//! records in [`RoomRegistry`]). The graph only keeps ids.

use crate::pose::{euler_rotation, Pose};
use bevy_math::Vec3;
use std::collections::HashMap;
use std::fmt;

/// Handle to a spawned room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomId(pub u64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "room#{}", self.0)
    }
}

/// Which way the traveler can go from the current room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Center,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 3] = [Direction::Left, Direction::Center, Direction::Right];

    /// The bit this movement feeds into the input buffer. Center submits.
    pub fn bit(self) -> Option<bool> {
        match self {
            Direction::Left => Some(false),
            Direction::Center => None,
            Direction::Right => Some(true),
        }
    }

    fn index(self) -> usize {
        match self {
            Direction::Left => 0,
            Direction::Center => 1,
            Direction::Right => 2,
        }
    }

    pub fn slot(self) -> RoomSlot {
        match self {
            Direction::Left => RoomSlot::Left,
            Direction::Center => RoomSlot::Center,
            Direction::Right => RoomSlot::Right,
        }
    }

    /// The waypoint in the current room that leads this way.
    pub fn waypoint(self) -> Waypoint {
        match self {
            Direction::Left => Waypoint::Left,
            Direction::Center => Waypoint::Center,
            Direction::Right => Waypoint::Right,
        }
    }
}

/// Logical role of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoomSlot {
    Current,
    Left,
    Center,
    Right,
    /// Retired, waiting to be reaped.
    Old,
}

impl RoomSlot {
    /// Display name, e.g. `Room_Current` or `Old`.
    pub fn label(self) -> &'static str {
        match self {
            RoomSlot::Current => "Room_Current",
            RoomSlot::Left => "Room_Left",
            RoomSlot::Center => "Room_Center",
            RoomSlot::Right => "Room_Right",
            RoomSlot::Old => "Old",
        }
    }
}

/// Named anchors authored inside a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Waypoint {
    Left,
    Center,
    Right,
    /// Where a traveler arriving in this room passes through.
    End,
}

impl Waypoint {
    pub const ALL: [Waypoint; 4] = [Waypoint::Left, Waypoint::Center, Waypoint::Right, Waypoint::End];

    pub fn name(self) -> &'static str {
        match self {
            Waypoint::Left => "Left",
            Waypoint::Center => "Center",
            Waypoint::Right => "Right",
            Waypoint::End => "End",
        }
    }
}

/// Creates, destroys and describes rooms.
///
/// Spawned rooms must be queryable immediately.
pub trait RoomFactory {
    fn spawn(&mut self, slot: RoomSlot, pose: Pose) -> RoomId;

    fn destroy(&mut self, room: RoomId);

    /// Relabel a live room.
    fn retag(&mut self, room: RoomId, slot: RoomSlot);

    fn room_pose(&self, room: RoomId) -> Option<Pose>;

    /// World pose of a named waypoint, if the room has one.
    fn waypoint(&self, room: RoomId, waypoint: Waypoint) -> Option<Pose>;
}

/// Layout of an empty room: its size and waypoints in local space.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomBlueprint {
    /// Full extents of the room box.
    pub size: Vec3,
    pub waypoints: Vec<(Waypoint, Pose)>,
}

impl Default for RoomBlueprint {
    /// A 6 x 3.2 x 8 room with doorways matching the default neighbor layout.
    fn default() -> Self {
        let eye = 1.6;
        Self {
            size: Vec3::new(6.0, 3.2, 8.0),
            waypoints: vec![
                (Waypoint::Left, Pose::from_yaw(Vec3::new(-3.0, eye, 1.0), 0.0)),
                (Waypoint::Center, Pose::from_yaw(Vec3::new(0.0, eye, 4.0), 0.0)),
                (Waypoint::Right, Pose::from_yaw(Vec3::new(3.0, eye, 1.0), 0.0)),
                (Waypoint::End, Pose::from_yaw(Vec3::new(0.0, eye, -4.0), 0.0)),
            ],
        }
    }
}

#[derive(Debug, Clone)]
struct RoomRecord {
    slot: RoomSlot,
    pose: Pose,
    waypoints: HashMap<Waypoint, Pose>,
}

/// In-memory [`RoomFactory`] that stamps rooms out of a [`RoomBlueprint`].
#[derive(Debug, Clone, Default)]
pub struct RoomRegistry {
    blueprint: RoomBlueprint,
    rooms: HashMap<RoomId, RoomRecord>,
    next_id: u64,
    spawned: usize,
    destroyed: usize,
}

impl RoomRegistry {
    pub fn new(blueprint: RoomBlueprint) -> Self {
        Self {
            blueprint,
            ..Default::default()
        }
    }

    pub fn blueprint(&self) -> &RoomBlueprint {
        &self.blueprint
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn contains(&self, room: RoomId) -> bool {
        self.rooms.contains_key(&room)
    }

    pub fn slot(&self, room: RoomId) -> Option<RoomSlot> {
        self.rooms.get(&room).map(|r| r.slot)
    }

    /// Live rooms holding `slot`.
    pub fn rooms_in(&self, slot: RoomSlot) -> Vec<RoomId> {
        let mut ids: Vec<_> = self
            .rooms
            .iter()
            .filter(|(_, r)| r.slot == slot)
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }

    /// Total rooms ever spawned.
    pub fn spawned_total(&self) -> usize {
        self.spawned
    }

    /// Total rooms ever destroyed.
    pub fn destroyed_total(&self) -> usize {
        self.destroyed
    }

    /// Override a waypoint with an explicit world pose.
    pub fn set_waypoint(&mut self, room: RoomId, waypoint: Waypoint, pose: Pose) {
        if let Some(record) = self.rooms.get_mut(&room) {
            record.waypoints.insert(waypoint, pose);
        }
    }

    /// Drop a waypoint, as if it was never authored.
    pub fn remove_waypoint(&mut self, room: RoomId, waypoint: Waypoint) {
        if let Some(record) = self.rooms.get_mut(&room) {
            record.waypoints.remove(&waypoint);
        }
    }
}

impl RoomFactory for RoomRegistry {
    fn spawn(&mut self, slot: RoomSlot, pose: Pose) -> RoomId {
        let id = RoomId(self.next_id);
        self.next_id += 1;
        self.spawned += 1;

        let waypoints = self
            .blueprint
            .waypoints
            .iter()
            .map(|(wp, local)| (*wp, pose.compose(*local)))
            .collect();

        self.rooms.insert(
            id,
            RoomRecord {
                slot,
                pose,
                waypoints,
            },
        );
        id
    }

    fn destroy(&mut self, room: RoomId) {
        if self.rooms.remove(&room).is_some() {
            self.destroyed += 1;
        }
    }

    fn retag(&mut self, room: RoomId, slot: RoomSlot) {
        if let Some(record) = self.rooms.get_mut(&room) {
            record.slot = slot;
        }
    }

    fn room_pose(&self, room: RoomId) -> Option<Pose> {
        self.rooms.get(&room).map(|r| r.pose)
    }

    fn waypoint(&self, room: RoomId, waypoint: Waypoint) -> Option<Pose> {
        self.rooms.get(&room)?.waypoints.get(&waypoint).copied()
    }
}

/// Where a neighbor sits relative to the current room.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeighborPlacement {
    pub offset: Vec3,
    /// Degrees, relative to the current room.
    pub yaw: f32,
}

impl NeighborPlacement {
    fn world_pose(&self, current: Pose) -> Pose {
        Pose {
            position: current.transform_point(self.offset),
            rotation: current.rotation * euler_rotation(self.yaw, 0.0, 0.0),
        }
    }
}

/// Placement of the three neighbors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeighborLayout {
    pub left: NeighborPlacement,
    pub center: NeighborPlacement,
    pub right: NeighborPlacement,
}

impl Default for NeighborLayout {
    fn default() -> Self {
        Self {
            left: NeighborPlacement {
                offset: Vec3::new(-7.0, 0.0, 1.0),
                yaw: -90.0,
            },
            center: NeighborPlacement {
                offset: Vec3::new(0.0, 0.0, 8.0),
                yaw: 0.0,
            },
            right: NeighborPlacement {
                offset: Vec3::new(7.0, 0.0, 1.0),
                yaw: 90.0,
            },
        }
    }
}

impl NeighborLayout {
    pub fn placement(&self, direction: Direction) -> NeighborPlacement {
        match direction {
            Direction::Left => self.left,
            Direction::Center => self.center,
            Direction::Right => self.right,
        }
    }
}

/// Current room, its neighbors, and rooms waiting to be reaped.
#[derive(Debug, Clone)]
pub struct RoomGraph {
    layout: NeighborLayout,
    start: Pose,
    current: Option<RoomId>,
    neighbors: [Option<RoomId>; 3],
    stale: Vec<RoomId>,
}

impl RoomGraph {
    /// An empty graph. Call [`reset`](Self::reset) to spawn the start room.
    pub fn new(layout: NeighborLayout, start: Pose) -> Self {
        Self {
            layout,
            start,
            current: None,
            neighbors: [None; 3],
            stale: Vec::new(),
        }
    }

    pub fn current(&self) -> Option<RoomId> {
        self.current
    }

    pub fn neighbor(&self, direction: Direction) -> Option<RoomId> {
        self.neighbors[direction.index()]
    }

    /// Rooms tagged old and not yet reaped.
    pub fn stale(&self) -> &[RoomId] {
        &self.stale
    }

    /// Pose the start room is spawned at.
    pub fn start_pose(&self) -> Pose {
        self.start
    }

    /// The current room followed by its neighbors.
    pub fn live_rooms(&self) -> impl Iterator<Item = RoomId> + '_ {
        self.current.into_iter().chain(self.neighbors.iter().flatten().copied())
    }

    /// Throw away every room and rebuild around a fresh start room.
    pub fn reset(&mut self, factory: &mut impl RoomFactory) -> RoomId {
        self.retire_all_except(None, factory);
        self.reap_stale(factory);

        let start = factory.spawn(RoomSlot::Current, self.start);
        self.current = Some(start);
        self.spawn_neighbors(factory);
        start
    }

    /// Promote `dest` to current, reap everything else and spawn new
    /// neighbors around it. Only call once a transition has finished.
    pub fn advance(&mut self, dest: RoomId, factory: &mut impl RoomFactory) {
        self.begin_change(dest, factory);
        self.reap_stale(factory);
    }

    /// Tag every room but `dest` as old, promote `dest` and spawn its
    /// neighbors. Old rooms stay alive until [`reap_stale`](Self::reap_stale).
    pub fn begin_change(&mut self, dest: RoomId, factory: &mut impl RoomFactory) {
        self.retire_all_except(Some(dest), factory);

        self.current = Some(dest);
        factory.retag(dest, RoomSlot::Current);
        self.spawn_neighbors(factory);
    }

    /// Destroy every room tagged old. Returns how many went.
    pub fn reap_stale(&mut self, factory: &mut impl RoomFactory) -> usize {
        let count = self.stale.len();
        for room in self.stale.drain(..) {
            factory.destroy(room);
        }
        count
    }

    /// Destroy every room the graph knows about.
    pub fn teardown(&mut self, factory: &mut impl RoomFactory) {
        self.retire_all_except(None, factory);
        self.reap_stale(factory);
    }

    fn retire_all_except(&mut self, keep: Option<RoomId>, factory: &mut impl RoomFactory) {
        let live: Vec<RoomId> = self.live_rooms().collect();
        for room in live {
            if Some(room) != keep && !self.stale.contains(&room) {
                factory.retag(room, RoomSlot::Old);
                self.stale.push(room);
            }
        }
        self.stale.retain(|room| Some(*room) != keep);
        self.current = None;
        self.neighbors = [None; 3];
    }

    fn spawn_neighbors(&mut self, factory: &mut impl RoomFactory) {
        let Some(current) = self.current else {
            return;
        };
        let anchor = factory.room_pose(current).unwrap_or_else(|| {
            tracing::error!(%current, "current room has no pose, spawning neighbors at start pose");
            self.start
        });

        for direction in Direction::ALL {
            let pose = self.layout.placement(direction).world_pose(anchor);
            let room = factory.spawn(direction.slot(), pose);
            self.neighbors[direction.index()] = Some(room);
        }
    }
}
