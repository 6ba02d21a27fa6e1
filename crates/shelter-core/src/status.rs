//! Human-readable status lines and read-only snapshots for display.
//!
//! | Situation | Status |
//! |-----------|--------|
//! | dead | `dead` |
//! | outside for outdoor work | `away` |
//! | walking to the Entrance to leave | `heading outside` |
//! | attack lock, or standing on a target | `fighting #N` |
//! | hurt lock | `hurt` |
//! | walking after a target | `chasing #N` |
//! | walking | `walking to <room>` |
//! | idle on a bed | `sleeping in <room>` |
//! | idle on a seat | `working in <room>` |
//! | idle, sleep phase, no bed | `looking for a bed` |
//! | idle, work phase, no seat | `looking for work` |
//! | idle hostile | `prowling` |
//! | anything else | `resting` |

use hecs::{Entity, World};
use serde::{Deserialize, Serialize};
use shelter_logic::agent::{AgentId, AgentKind};
use shelter_logic::geometry::Vec2;
use shelter_logic::layout::{Layout, SpatialQuery};
use shelter_logic::occupancy::{OccupancyTable, Reservation, ReservationKind};
use shelter_logic::room::{RoomEvent, RoomFlags, RoomId, RoomKind};
use shelter_logic::schedule::SchedulePhase;

use crate::components::*;

/// Display view of one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub id: AgentId,
    pub name: String,
    pub kind: AgentKind,
    pub position: Vec2,
    pub health: f32,
    pub max_health: f32,
    pub room: Option<RoomId>,
    pub reservation: Option<Reservation>,
    pub target: Option<AgentId>,
    pub action: String,
    pub status: String,
}

/// Display view of one room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub id: RoomId,
    pub kind: RoomKind,
    pub name: String,
    pub flags: RoomFlags,
    pub events: Vec<RoomEvent>,
    pub sleepers: usize,
    /// Agents holding a stop-point here.
    pub reserved_by: Vec<AgentId>,
}

fn room_name(layout: &Layout, room: RoomId) -> String {
    layout
        .room(room)
        .map(|r| r.name.clone())
        .unwrap_or_else(|| room.to_string())
}

/// Status line for `entity`, or `None` when it is not an agent.
pub fn describe(
    world: &World,
    layout: &Layout,
    occupancy: &OccupancyTable,
    entity: Entity,
) -> Option<String> {
    let mut query = world
        .query_one::<(&Agent, &ActionState, Option<&Routine>, Option<&CombatTarget>)>(entity)
        .ok()?;
    let (agent, state, routine, target) = query.get()?;

    if state.is_dead() {
        return Some("dead".to_string());
    }
    match routine.map(|r| r.presence) {
        Some(Presence::Away) => return Some("away".to_string()),
        Some(Presence::Leaving) if target.is_none() => {
            return Some("heading outside".to_string())
        }
        _ => {}
    }

    let target = target.map(|t| t.0);
    let status = match (state, target) {
        (ActionState::Attacking { target, .. }, _) => format!("fighting {target}"),
        (ActionState::Hurt { .. }, _) => "hurt".to_string(),
        (ActionState::Walking(_), Some(target)) => format!("chasing {target}"),
        (ActionState::Walking(path), None) => {
            format!("walking to {}", room_name(layout, path.destination))
        }
        (_, Some(target)) => format!("fighting {target}"),
        (_, None) => match occupancy.reservation(agent.id) {
            Some(r) if r.kind == ReservationKind::Sleep => {
                format!("sleeping in {}", room_name(layout, r.room))
            }
            Some(r) => format!("working in {}", room_name(layout, r.room)),
            None if agent.kind.is_hostile() => "prowling".to_string(),
            None => match routine.and_then(|r| r.phase) {
                Some(SchedulePhase::Sleep) => "looking for a bed".to_string(),
                Some(SchedulePhase::Work) if agent.policy.work_room.is_some() => {
                    "looking for work".to_string()
                }
                _ => "resting".to_string(),
            },
        },
    };
    Some(status)
}

pub fn agent_snapshot(
    world: &World,
    layout: &Layout,
    occupancy: &OccupancyTable,
    entity: Entity,
) -> Option<AgentSnapshot> {
    let status = describe(world, layout, occupancy, entity)?;
    let mut query = world
        .query_one::<(&Agent, &Position, &Health, &ActionState, Option<&CombatTarget>)>(entity)
        .ok()?;
    let (agent, pos, health, state, target) = query.get()?;
    Some(AgentSnapshot {
        id: agent.id,
        name: agent.name.clone(),
        kind: agent.kind,
        position: pos.0,
        health: health.current,
        max_health: health.max,
        room: layout.room_at(pos.0),
        reservation: occupancy.reservation(agent.id).copied(),
        target: target.map(|t| t.0),
        action: state.label().to_string(),
        status,
    })
}

pub fn room_snapshot(
    layout: &Layout,
    occupancy: &OccupancyTable,
    id: RoomId,
) -> Option<RoomSnapshot> {
    let room = layout.room(id)?;
    Some(RoomSnapshot {
        id,
        kind: room.kind,
        name: room.name.clone(),
        flags: *room.flags(),
        events: room.events().copied().collect(),
        sleepers: occupancy.sleepers(id),
        reserved_by: occupancy.occupants(id),
    })
}
