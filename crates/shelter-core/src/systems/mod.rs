//! Systems - logic that operates on components
//!
//! Per-frame phase order, each phase reading what the previous one committed:
//!
//! 1. [`death_system`] - deaths from external health changes
//! 2. [`release_locks`] - expired attack / hurt locks return to idle
//! 3. [`detection_system`] - target acquisition and re-validation (throttled)
//! 4. [`movement_system`] - waypoint motion
//! 5. [`combat_system`] - chase, attack, damage, retaliation
//! 6. [`death_system`] - death cleanup and corpse removal
//! 7. [`recovery_system`] - stalled-agent re-seeding (throttled)
//!
//! [`schedule_system`] runs on the hourly tick instead.

mod combat;
mod death;
mod detection;
mod movement;
mod navigation;
mod recovery;
mod schedule;

pub use combat::*;
pub use death::*;
pub use detection::*;
pub use movement::*;
pub use navigation::*;
pub use recovery::*;
pub use schedule::*;

use hecs::{Entity, World};
use rand::rngs::StdRng;
use shelter_logic::combat::{Combatant, Seeker};
use shelter_logic::config::SimConfig;
use shelter_logic::layout::{Layout, SpatialQuery};
use shelter_logic::occupancy::OccupancyTable;
use shelter_logic::pathfinding::NavGraph;

use crate::components::{ActionState, Agent, Health, Position, Routine, Temperament};
use crate::events::EventQueue;
use crate::roster::Roster;

/// Everything a system may touch besides the world itself.
pub struct TickContext<'a> {
    pub cfg: &'a SimConfig,
    pub layout: &'a Layout,
    pub nav: &'a mut NavGraph,
    pub occupancy: &'a mut OccupancyTable,
    pub roster: &'a mut Roster,
    pub rng: &'a mut StdRng,
    pub events: &'a mut EventQueue,
    /// Simulation clock in seconds.
    pub now: f64,
}

/// Living, present agents as combat sees them this tick.
pub(crate) fn combatants(world: &World, ctx: &TickContext) -> Vec<Combatant> {
    ctx.roster
        .living_entities()
        .into_iter()
        .filter_map(|(id, entity)| {
            let mut query = world
                .query_one::<(&Agent, &Position, &Health, &Temperament, &ActionState, Option<&Routine>)>(
                    entity,
                )
                .ok()?;
            let (agent, pos, health, temperament, state, routine) = query.get()?;
            if state.is_dead() || routine.map_or(false, |r| r.is_away()) {
                return None;
            }
            Some(Combatant {
                id,
                allegiance: temperament.allegiance(&agent.kind),
                position: pos.0,
                room: ctx.layout.room_at(pos.0),
                alive: health.is_alive(),
            })
        })
        .collect()
}

/// The combat view of one agent as a seeker.
pub(crate) fn seeker(world: &World, ctx: &TickContext, entity: Entity) -> Option<Seeker> {
    let mut query = world
        .query_one::<(&Agent, &Position, &Temperament)>(entity)
        .ok()?;
    let (agent, pos, temperament) = query.get()?;
    Some(Seeker {
        allegiance: temperament.allegiance(&agent.kind),
        aggressive: temperament.aggressive,
        cowardly: temperament.cowardly,
        position: pos.0,
        room: ctx.layout.room_at(pos.0),
    })
}

/// Whether the agent is outside the shelter.
pub(crate) fn is_away(world: &World, entity: Entity) -> bool {
    world
        .get::<&Routine>(entity)
        .map(|r| r.is_away())
        .unwrap_or(false)
}
