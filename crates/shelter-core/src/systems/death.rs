//! Death system - terminal state, cleanup, corpse removal

use hecs::{Entity, World};
use shelter_logic::agent::AgentId;

use super::TickContext;
use crate::components::{ActionState, Agent, CombatTarget, Corpse, Health};
use crate::events::SimEvent;

/// Flip agents at zero health to `Dead` (exactly once), delist them, release
/// their seats and clear every target pointing at them. Corpses whose death
/// sequence has finished are despawned.
pub fn death_system(world: &mut World, ctx: &mut TickContext) {
    let mut fallen: Vec<(Entity, AgentId)> = Vec::new();
    for (id, entity) in ctx.roster.living_entities() {
        let Ok(mut query) = world.query_one::<(&Health, &ActionState)>(entity) else {
            continue;
        };
        if let Some((health, state)) = query.get() {
            if !health.is_alive() && !state.is_dead() {
                fallen.push((entity, id));
            }
        }
    }

    for (entity, id) in &fallen {
        if let Ok(mut state) = world.get::<&mut ActionState>(*entity) {
            *state = ActionState::Dead;
        }
        let _ = world.remove_one::<CombatTarget>(*entity);
        let _ = world.insert_one(*entity, Corpse { died_at: ctx.now });
        ctx.roster.mark_dead(*id);
        ctx.occupancy.release(*id);
        if let Ok(agent) = world.get::<&Agent>(*entity) {
            log::info!("{} ({id}) died", agent.name);
        }
        ctx.events.push(SimEvent::AgentDied(*id));
    }

    if !fallen.is_empty() {
        let dead: Vec<AgentId> = fallen.iter().map(|(_, id)| *id).collect();
        clear_targets_on(world, &dead);
    }

    let sequence = ctx.cfg.combat.death_sequence as f64;
    let finished: Vec<(Entity, AgentId)> = world
        .query::<(&Agent, &Corpse)>()
        .iter()
        .filter(|(_, (_, corpse))| ctx.now - corpse.died_at >= sequence)
        .map(|(entity, (agent, _))| (entity, agent.id))
        .collect();
    for (entity, id) in finished {
        let _ = world.despawn(entity);
        ctx.roster.forget(id);
        log::info!("{id} removed after death sequence");
        ctx.events.push(SimEvent::AgentRemoved(id));
    }
}

/// Drop every combat target that points at one of `ids`.
pub fn clear_targets_on(world: &mut World, ids: &[AgentId]) {
    let holders: Vec<Entity> = world
        .query::<&CombatTarget>()
        .iter()
        .filter(|(_, target)| ids.contains(&target.0))
        .map(|(entity, _)| entity)
        .collect();
    for entity in holders {
        let _ = world.remove_one::<CombatTarget>(entity);
    }
}
