//! Shelter layout: the ordered room list and elevator shafts.
//!
//! Rooms keep their construction order (power distribution depends on it) but
//! are addressed by permanent [`RoomId`]s, so removing a room never shifts the
//! identity of any other room.
//!
//! # Floors and shafts
//!
//! Rooms whose top edges line up (within `floor_tolerance`) share a floor.
//! Shaft rectangles with the same horizontal extent form one [`ShaftGroup`],
//! a vertical corridor between every floor its segments touch.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::NavConfig;
use crate::geometry::{Rect, Vec2};
use crate::room::{Room, RoomChange, RoomEvent, RoomFlags, RoomId, RoomKind};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("unknown {0}")]
    UnknownRoom(RoomId),
    #[error("{0} cannot be demolished")]
    Indestructible(RoomId),
    #[error("the Entrance cannot carry event tags")]
    EntranceEvent,
}

/// Point-to-room lookups. The layout answers them with a linear scan; a grid
/// or interval index can stand in once room counts grow.
pub trait SpatialQuery {
    /// Room whose rectangle contains `point`.
    fn room_at(&self, point: Vec2) -> Option<RoomId>;
    /// Room whose centre is closest to `point`, with that distance.
    fn nearest_room(&self, point: Vec2) -> Option<(RoomId, f32)>;
}

/// Elevator segments sharing one horizontal extent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShaftGroup {
    pub left: f32,
    pub right: f32,
    /// Segments ordered top to bottom.
    pub segments: Vec<Rect>,
}

impl ShaftGroup {
    pub fn center_x(&self) -> f32 {
        (self.left + self.right) / 2.0
    }

    pub fn contains(&self, point: Vec2) -> bool {
        self.segments.iter().any(|s| s.contains(point))
    }

    /// Whether `room` opens onto one of this group's segments: X ranges touch
    /// and the room's top edge lies within the segment's vertical span. A room
    /// whose top sits on a segment's bottom edge belongs to the floor below.
    pub fn is_adjacent(&self, room: &Rect, tolerance: f32) -> bool {
        self.segments.iter().any(|seg| {
            room.x_touches(seg, tolerance)
                && room.top() >= seg.top() - tolerance
                && room.top() < seg.bottom() - tolerance
        })
    }
}

/// Ordered rooms plus shafts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Layout {
    rooms: Vec<Room>,
    shafts: Vec<Rect>,
    next_id: u32,
}

impl Layout {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Mutation ────────────────────────────────────────────────────────

    /// Append a room in its default state.
    pub fn add_room(&mut self, kind: RoomKind, name: impl Into<String>, rect: Rect) -> RoomId {
        let id = RoomId(self.next_id);
        self.next_id += 1;
        self.rooms.push(Room::new(id, kind, name, rect));
        id
    }

    pub fn add_shaft(&mut self, rect: Rect) {
        self.shafts.push(rect);
    }

    /// Demolish a room. Rooms flagged indestructible (the Entrance) refuse.
    pub fn remove_room(&mut self, id: RoomId) -> Result<Room, LayoutError> {
        let index = self.index_of(id).ok_or(LayoutError::UnknownRoom(id))?;
        if !self.rooms[index].flags().destructible {
            return Err(LayoutError::Indestructible(id));
        }
        Ok(self.rooms.remove(index))
    }

    /// Apply a flag mutation through the room's state-update path.
    pub fn update_room(
        &mut self,
        id: RoomId,
        f: impl FnOnce(&mut RoomFlags),
    ) -> Result<Option<RoomChange>, LayoutError> {
        let room = self.room_mut(id).ok_or(LayoutError::UnknownRoom(id))?;
        Ok(room.update(f))
    }

    pub fn add_event(
        &mut self,
        id: RoomId,
        event: RoomEvent,
    ) -> Result<Option<RoomChange>, LayoutError> {
        let room = self.room_mut(id).ok_or(LayoutError::UnknownRoom(id))?;
        if room.is_entrance() {
            return Err(LayoutError::EntranceEvent);
        }
        Ok(room.add_event(event))
    }

    pub fn remove_event(
        &mut self,
        id: RoomId,
        event: RoomEvent,
    ) -> Result<Option<RoomChange>, LayoutError> {
        let room = self.room_mut(id).ok_or(LayoutError::UnknownRoom(id))?;
        Ok(room.remove_event(event))
    }

    // ── Lookup ──────────────────────────────────────────────────────────

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn shafts(&self) -> &[Rect] {
        &self.shafts
    }

    pub fn room(&self, id: RoomId) -> Option<&Room> {
        self.rooms.iter().find(|r| r.id == id)
    }

    pub(crate) fn room_mut(&mut self, id: RoomId) -> Option<&mut Room> {
        self.rooms.iter_mut().find(|r| r.id == id)
    }

    pub(crate) fn rooms_mut(&mut self) -> &mut [Room] {
        &mut self.rooms
    }

    /// Position of a room in construction order.
    pub fn index_of(&self, id: RoomId) -> Option<usize> {
        self.rooms.iter().position(|r| r.id == id)
    }

    pub fn entrance(&self) -> Option<&Room> {
        self.rooms.iter().find(|r| r.is_entrance())
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Rooms accepted by `filter`, nearest centre first. Ties keep
    /// construction order.
    pub fn rooms_by_distance(&self, from: Vec2, filter: impl Fn(&Room) -> bool) -> Vec<RoomId> {
        let mut ranked: Vec<(f32, RoomId)> = self
            .rooms
            .iter()
            .filter(|r| filter(r))
            .map(|r| (r.rect.center().distance_squared(&from), r.id))
            .collect();
        ranked.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        ranked.into_iter().map(|(_, id)| id).collect()
    }

    // ── Topology ────────────────────────────────────────────────────────

    pub fn same_floor(a: &Rect, b: &Rect, cfg: &NavConfig) -> bool {
        (a.top() - b.top()).abs() <= cfg.floor_tolerance
    }

    /// Same floor and touching left/right within the gap tolerance.
    pub fn rooms_adjacent(a: &Rect, b: &Rect, cfg: &NavConfig) -> bool {
        Self::same_floor(a, b, cfg)
            && ((a.right() - b.left()).abs() <= cfg.adjacency_gap
                || (b.right() - a.left()).abs() <= cfg.adjacency_gap)
    }

    /// X coordinate of the shared wall between two adjacent rooms.
    pub fn boundary_x(a: &Rect, b: &Rect) -> f32 {
        if a.center().x <= b.center().x {
            (a.right() + b.left()) / 2.0
        } else {
            (a.left() + b.right()) / 2.0
        }
    }

    pub fn is_in_shaft_x(&self, x: f32) -> bool {
        self.shafts.iter().any(|s| s.spans_x(x))
    }

    /// Group shaft segments whose horizontal extents match within tolerance.
    pub fn shaft_groups(&self, cfg: &NavConfig) -> Vec<ShaftGroup> {
        let tol = cfg.shaft_tolerance;
        let mut groups: Vec<ShaftGroup> = Vec::new();
        for shaft in &self.shafts {
            match groups.iter_mut().find(|g| {
                (g.left - shaft.left()).abs() <= tol && (g.right - shaft.right()).abs() <= tol
            }) {
                Some(group) => group.segments.push(*shaft),
                None => groups.push(ShaftGroup {
                    left: shaft.left(),
                    right: shaft.right(),
                    segments: vec![*shaft],
                }),
            }
        }
        for group in &mut groups {
            group
                .segments
                .sort_by(|a, b| a.top().partial_cmp(&b.top()).unwrap_or(std::cmp::Ordering::Equal));
        }
        groups
    }
}

impl SpatialQuery for Layout {
    fn room_at(&self, point: Vec2) -> Option<RoomId> {
        self.rooms
            .iter()
            .find(|r| r.rect.contains(point))
            .map(|r| r.id)
    }

    fn nearest_room(&self, point: Vec2) -> Option<(RoomId, f32)> {
        self.rooms
            .iter()
            .map(|r| (r.id, r.rect.center().distance(&point)))
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
    }
}
