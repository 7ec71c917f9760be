//! Room meshes, the Bevy-backed room factory and camera sync.
//!
//! The game core works in a left-handed frame (forward is +Z, right is +X).
//! Bevy is right-handed with cameras looking down -Z, so every pose crosses
//! over through [`to_bevy`], which mirrors the Z axis.

use bevy::prelude::*;
use std::collections::HashMap;
use whitespace_core::pose::Pose;
use whitespace_core::rooms::{RoomBlueprint, RoomFactory, RoomId, RoomRegistry, RoomSlot, Waypoint};

use crate::state::Game;

const WALL_THICKNESS: f32 = 0.1;
const DOOR_WIDTH: f32 = 1.4;
const DOOR_HEIGHT: f32 = 2.4;

/// Marker for the camera the session drives.
#[derive(Component)]
pub struct Traveler;

/// Root entity of a spawned room.
#[derive(Component, Debug, Clone, Copy)]
pub struct Room {
    pub id: RoomId,
    pub slot: RoomSlot,
}

/// Which material a room panel uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Floor,
    Wall,
    Ceiling,
}

/// Shared meshes and materials for every room.
#[derive(Resource)]
pub struct RoomAssets {
    cube: Handle<Mesh>,
    floor: Handle<StandardMaterial>,
    wall: Handle<StandardMaterial>,
    ceiling: Handle<StandardMaterial>,
}

impl RoomAssets {
    pub fn new(meshes: &mut Assets<Mesh>, materials: &mut Assets<StandardMaterial>) -> Self {
        let mut matte = |r, g, b| {
            materials.add(StandardMaterial {
                base_color: Color::srgb(r, g, b),
                perceptual_roughness: 0.95,
                ..default()
            })
        };
        Self {
            floor: matte(0.78, 0.78, 0.76),
            wall: matte(0.96, 0.96, 0.95),
            ceiling: matte(0.9, 0.9, 0.9),
            cube: meshes.add(Cuboid::new(1.0, 1.0, 1.0)),
        }
    }

    fn material(&self, surface: Surface) -> Handle<StandardMaterial> {
        match surface {
            Surface::Floor => self.floor.clone(),
            Surface::Wall => self.wall.clone(),
            Surface::Ceiling => self.ceiling.clone(),
        }
    }
}

/// The logical room registry plus the entity standing in for each room.
#[derive(Resource)]
pub struct RoomEntities {
    registry: RoomRegistry,
    entities: HashMap<RoomId, Entity>,
}

impl RoomEntities {
    pub fn new(blueprint: RoomBlueprint) -> Self {
        Self {
            registry: RoomRegistry::new(blueprint),
            entities: HashMap::new(),
        }
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }
}

/// [`RoomFactory`] that mirrors every logical room with a mesh hierarchy.
pub struct BevyRoomFactory<'a, 'w, 's> {
    commands: &'a mut Commands<'w, 's>,
    assets: &'a RoomAssets,
    rooms: &'a mut RoomEntities,
}

impl<'a, 'w, 's> BevyRoomFactory<'a, 'w, 's> {
    pub fn new(commands: &'a mut Commands<'w, 's>, assets: &'a RoomAssets, rooms: &'a mut RoomEntities) -> Self {
        Self {
            commands,
            assets,
            rooms,
        }
    }
}

impl RoomFactory for BevyRoomFactory<'_, '_, '_> {
    fn spawn(&mut self, slot: RoomSlot, pose: Pose) -> RoomId {
        let id = self.rooms.registry.spawn(slot, pose);
        let panels = room_panels(self.rooms.registry.blueprint());
        let light_height = self.rooms.registry.blueprint().size.y - 0.4;
        let assets = self.assets;

        let entity = self
            .commands
            .spawn((
                Room { id, slot },
                Name::new(room_name(id, slot)),
                to_bevy(pose),
                Visibility::default(),
            ))
            .with_children(|parent| {
                for panel in &panels {
                    parent.spawn((
                        Mesh3d(assets.cube.clone()),
                        MeshMaterial3d(assets.material(panel.surface)),
                        panel.transform(),
                    ));
                }
                parent.spawn((
                    PointLight {
                        intensity: 300_000.0,
                        range: 14.0,
                        ..default()
                    },
                    to_bevy(Pose::new(Vec3::new(0.0, light_height, 0.0), Quat::IDENTITY)),
                ));
            })
            .id();

        self.rooms.entities.insert(id, entity);
        debug!(room = %id, slot = slot.label(), "spawned room");
        id
    }

    fn destroy(&mut self, room: RoomId) {
        self.rooms.registry.destroy(room);
        if let Some(entity) = self.rooms.entities.remove(&room) {
            self.commands.entity(entity).despawn_recursive();
        }
    }

    fn retag(&mut self, room: RoomId, slot: RoomSlot) {
        self.rooms.registry.retag(room, slot);
        if let Some(entity) = self.rooms.entities.get(&room) {
            self.commands
                .entity(*entity)
                .insert((Room { id: room, slot }, Name::new(room_name(room, slot))));
        }
    }

    fn room_pose(&self, room: RoomId) -> Option<Pose> {
        self.rooms.registry.room_pose(room)
    }

    fn waypoint(&self, room: RoomId, waypoint: Waypoint) -> Option<Pose> {
        self.rooms.registry.waypoint(room, waypoint)
    }
}

fn room_name(id: RoomId, slot: RoomSlot) -> String {
    format!("{} ({id})", slot.label())
}

/// Convert a game pose to a Bevy transform.
pub fn to_bevy(pose: Pose) -> Transform {
    let p = pose.position;
    let q = pose.rotation;
    Transform {
        translation: Vec3::new(p.x, p.y, -p.z),
        rotation: Quat::from_xyzw(-q.x, -q.y, q.z, q.w),
        scale: Vec3::ONE,
    }
}

/// Keep the camera on the traveler's pose.
pub fn sync_camera(game: Option<Res<Game>>, mut cameras: Query<&mut Transform, With<Traveler>>) {
    let Some(game) = game else { return };
    let pose = to_bevy(game.session.traveler());
    for mut transform in &mut cameras {
        *transform = pose;
    }
}

/// One box of room geometry, in game coordinates relative to the room.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Panel {
    pub center: Vec3,
    pub size: Vec3,
    pub surface: Surface,
}

impl Panel {
    fn transform(&self) -> Transform {
        to_bevy(Pose::new(self.center, Quat::IDENTITY)).with_scale(self.size)
    }
}

/// Floor, ceiling and four walls, with a doorway cut wherever the blueprint
/// has the matching waypoint.
pub fn room_panels(blueprint: &RoomBlueprint) -> Vec<Panel> {
    let size = blueprint.size;
    let (half_w, half_d) = (size.x / 2.0, size.z / 2.0);
    let t = WALL_THICKNESS;
    let door = |waypoint: Waypoint| {
        blueprint
            .waypoints
            .iter()
            .find(|(wp, _)| *wp == waypoint)
            .map(|(_, pose)| pose.position)
    };

    let mut panels = vec![
        Panel {
            center: Vec3::new(0.0, -t / 2.0, 0.0),
            size: Vec3::new(size.x, t, size.z),
            surface: Surface::Floor,
        },
        Panel {
            center: Vec3::new(0.0, size.y + t / 2.0, 0.0),
            size: Vec3::new(size.x, t, size.z),
            surface: Surface::Ceiling,
        },
    ];

    // Front and back walls run along X, side walls along Z. Walls sit just
    // inside the room so neighbors sharing a doorway don't overlap.
    for (z, waypoint) in [(half_d - t / 2.0, Waypoint::Center), (-half_d + t / 2.0, Waypoint::End)] {
        for seg in wall_segments(size.x, size.y, door(waypoint).map(|p| p.x)) {
            panels.push(Panel {
                center: Vec3::new(seg.along, seg.y, z),
                size: Vec3::new(seg.len, seg.height, t),
                surface: Surface::Wall,
            });
        }
    }
    for (x, waypoint) in [(-half_w + t / 2.0, Waypoint::Left), (half_w - t / 2.0, Waypoint::Right)] {
        for seg in wall_segments(size.z, size.y, door(waypoint).map(|p| p.z)) {
            panels.push(Panel {
                center: Vec3::new(x, seg.y, seg.along),
                size: Vec3::new(t, seg.height, seg.len),
                surface: Surface::Wall,
            });
        }
    }

    panels
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Segment {
    along: f32,
    len: f32,
    y: f32,
    height: f32,
}

/// Split a wall of `length` around an optional doorway centered at `door`.
fn wall_segments(length: f32, height: f32, door: Option<f32>) -> Vec<Segment> {
    let half = length / 2.0;
    let full = |from: f32, to: f32| Segment {
        along: (from + to) / 2.0,
        len: to - from,
        y: height / 2.0,
        height,
    };

    let Some(door) = door else {
        return vec![full(-half, half)];
    };

    let lo = (door - DOOR_WIDTH / 2.0).max(-half);
    let hi = (door + DOOR_WIDTH / 2.0).min(half);
    let mut segments = Vec::new();
    if lo > -half {
        segments.push(full(-half, lo));
    }
    if hi < half {
        segments.push(full(hi, half));
    }
    if DOOR_HEIGHT < height && hi > lo {
        segments.push(Segment {
            along: (lo + hi) / 2.0,
            len: hi - lo,
            y: (DOOR_HEIGHT + height) / 2.0,
            height: height - DOOR_HEIGHT,
        });
    }
    segments
}
