//! Room occupancy and seat reservations.
//!
//! Every room exposes `slots_per_room` stop-points spread along its floor.
//! A reservation claims one stop-point plus whatever counter its kind uses:
//!
//! | Kind | Limit per room |
//! |------|----------------|
//! | Sleep | `sleep_capacity` beds |
//! | Lab seat | one holder per [`LabRole`], fixed seat index |
//! | Work | one worker per profession, unless the profession is unlimited |
//!
//! An agent holds at most one reservation; reserving again releases the old
//! one first. Releasing frees exactly what the reservation took.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::agent::AgentId;
use crate::config::OccupancyConfig;
use crate::geometry::{Rect, Vec2};
use crate::layout::Layout;
use crate::professions::{BehaviorPolicy, LabRole, Profession};
use crate::room::{Room, RoomId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReservationKind {
    Sleep,
    Work(Profession),
    Lab(LabRole),
}

/// A held claim on one stop-point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reservation {
    pub room: RoomId,
    pub slot: usize,
    pub kind: ReservationKind,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RoomOccupancy {
    slots: BTreeMap<usize, AgentId>,
    roles: BTreeMap<LabRole, AgentId>,
    workers: HashMap<Profession, usize>,
    sleepers: usize,
}

impl RoomOccupancy {
    fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn free_slot(&self, limit: usize) -> Option<usize> {
        (0..limit).find(|i| !self.slots.contains_key(i))
    }
}

/// Evenly spaced stop-points along the walkable line of `rect`.
pub fn stop_points(rect: &Rect, count: usize) -> Vec<Vec2> {
    let step = rect.width / (count as f32 + 1.0);
    (1..=count)
        .map(|i| Vec2::new(rect.left() + step * i as f32, rect.walk_y()))
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OccupancyTable {
    cfg: OccupancyConfig,
    rooms: HashMap<RoomId, RoomOccupancy>,
    holders: HashMap<AgentId, Reservation>,
}

impl OccupancyTable {
    pub fn new(cfg: &OccupancyConfig) -> Self {
        Self {
            cfg: cfg.clone(),
            rooms: HashMap::new(),
            holders: HashMap::new(),
        }
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub fn reservation(&self, agent: AgentId) -> Option<&Reservation> {
        self.holders.get(&agent)
    }

    pub fn sleepers(&self, room: RoomId) -> usize {
        self.rooms.get(&room).map_or(0, |o| o.sleepers)
    }

    pub fn workers(&self, room: RoomId, profession: Profession) -> usize {
        self.rooms
            .get(&room)
            .and_then(|o| o.workers.get(&profession).copied())
            .unwrap_or(0)
    }

    pub fn role_holder(&self, room: RoomId, role: LabRole) -> Option<AgentId> {
        self.rooms.get(&room).and_then(|o| o.roles.get(&role).copied())
    }

    /// Agents holding a stop-point in `room`, by slot index.
    pub fn occupants(&self, room: RoomId) -> Vec<AgentId> {
        self.rooms
            .get(&room)
            .map(|o| o.slots.values().copied().collect())
            .unwrap_or_default()
    }

    pub fn total_reservations(&self) -> usize {
        self.holders.len()
    }

    /// World position of a reservation's stop-point.
    pub fn stop_point(&self, layout: &Layout, reservation: &Reservation) -> Option<Vec2> {
        let room = layout.room(reservation.room)?;
        stop_points(&room.rect, self.cfg.slots_per_room)
            .get(reservation.slot)
            .copied()
    }

    // ── Reservations ────────────────────────────────────────────────────

    /// Nearest habitable sleeping room with a free bed.
    pub fn reserve_sleep(
        &mut self,
        layout: &Layout,
        agent: AgentId,
        from: Vec2,
    ) -> Option<Reservation> {
        self.release(agent);
        let beds = self.cfg.sleep_capacity.min(self.cfg.slots_per_room);
        let candidates =
            layout.rooms_by_distance(from, |r| r.kind.is_sleeping_room() && r.flags().habitable());
        for room in candidates {
            let occ = self.rooms.entry(room).or_default();
            if occ.sleepers >= beds {
                continue;
            }
            if let Some(slot) = occ.free_slot(beds) {
                occ.sleepers += 1;
                return Some(self.commit(agent, room, slot, ReservationKind::Sleep));
            }
        }
        None
    }

    /// Nearest workable room matching the profession's policy with a free
    /// seat of the right kind.
    pub fn reserve_work(
        &mut self,
        layout: &Layout,
        agent: AgentId,
        from: Vec2,
        profession: Profession,
        policy: &BehaviorPolicy,
    ) -> Option<Reservation> {
        self.release(agent);
        let kind = policy.work_room?;
        let candidates =
            layout.rooms_by_distance(from, |r: &Room| r.kind == kind && r.is_workable());
        let limit = self.cfg.slots_per_room;

        for room in candidates {
            let occ = self.rooms.entry(room).or_default();
            if let Some(role) = policy.lab_role {
                let seat = role.seat();
                if occ.roles.contains_key(&role) || occ.slots.contains_key(&seat) || seat >= limit {
                    continue;
                }
                occ.roles.insert(role, agent);
                return Some(self.commit(agent, room, seat, ReservationKind::Lab(role)));
            }
            if !policy.unlimited && occ.workers.get(&profession).copied().unwrap_or(0) > 0 {
                continue;
            }
            if let Some(slot) = occ.free_slot(limit) {
                *occ.workers.entry(profession).or_insert(0) += 1;
                return Some(self.commit(agent, room, slot, ReservationKind::Work(profession)));
            }
        }
        None
    }

    fn commit(
        &mut self,
        agent: AgentId,
        room: RoomId,
        slot: usize,
        kind: ReservationKind,
    ) -> Reservation {
        let reservation = Reservation { room, slot, kind };
        self.rooms.entry(room).or_default().slots.insert(slot, agent);
        self.holders.insert(agent, reservation);
        reservation
    }

    /// Free whatever `agent` holds.
    pub fn release(&mut self, agent: AgentId) -> Option<Reservation> {
        let reservation = self.holders.remove(&agent)?;
        if let Some(occ) = self.rooms.get_mut(&reservation.room) {
            occ.slots.remove(&reservation.slot);
            match reservation.kind {
                ReservationKind::Sleep => occ.sleepers = occ.sleepers.saturating_sub(1),
                ReservationKind::Lab(role) => {
                    occ.roles.remove(&role);
                }
                ReservationKind::Work(profession) => {
                    if let Some(count) = occ.workers.get_mut(&profession) {
                        *count = count.saturating_sub(1);
                        if *count == 0 {
                            occ.workers.remove(&profession);
                        }
                    }
                }
            }
            if occ.is_empty() {
                self.rooms.remove(&reservation.room);
            }
        }
        Some(reservation)
    }

    /// Drop every reservation in a demolished room. Returns the displaced
    /// holders.
    pub fn remove_room(&mut self, room: RoomId) -> Vec<AgentId> {
        let displaced = self.occupants(room);
        for agent in &displaced {
            self.holders.remove(agent);
        }
        self.rooms.remove(&room);
        displaced
    }
}
