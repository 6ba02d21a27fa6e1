//! Recovery system - re-seeds stalled agents
//!
//! An agent is stalled when it is idle, holds no combat target and is inside
//! the shelter. Agents with a reservation are only stalled while away from
//! their post; they walk back. Everyone else is handed a fresh target if one
//! is in scope, or a wander destination. Residents asleep without a bed stay
//! where they are.

use hecs::{Entity, World};
use shelter_logic::agent::AgentId;
use shelter_logic::schedule::SchedulePhase;

use super::{
    at_post, combatants, head_outside, is_away, pick_target, seeker, send_to_post, wander,
    TickContext,
};
use crate::components::{ActionState, CombatTarget, Presence, Routine};

pub fn recovery_system(world: &mut World, ctx: &mut TickContext) {
    let mut stalled: Vec<(Entity, AgentId)> = Vec::new();
    for (id, entity) in ctx.roster.living_entities() {
        let idle = world
            .get::<&ActionState>(entity)
            .map(|s| s.is_idle())
            .unwrap_or(false);
        if !idle || world.get::<&CombatTarget>(entity).is_ok() || is_away(world, entity) {
            continue;
        }
        stalled.push((entity, id));
    }
    if stalled.is_empty() {
        return;
    }

    let radius = ctx.cfg.combat.detection_radius;
    let field = combatants(world, ctx);

    for (entity, id) in stalled {
        if let Some(post) = ctx.occupancy.reservation(id).copied() {
            if !at_post(world, ctx, entity, &post) {
                log::debug!("{id} returning to its post in {}", post.room);
                send_to_post(world, ctx, entity, &post);
            }
            continue;
        }

        if let Some(me) = seeker(world, ctx, entity) {
            if let Some(target) = pick_target(ctx, &me, id, &field, radius) {
                log::debug!("{id} re-seeded with target {target}");
                let _ = world.insert_one(entity, CombatTarget(target));
                continue;
            }
        }

        let (phase, presence) = world
            .get::<&Routine>(entity)
            .map(|r| (r.phase, r.presence))
            .unwrap_or((None, Presence::Present));
        if phase == Some(SchedulePhase::Sleep) {
            continue;
        }
        if presence == Presence::Leaving {
            // Walk to the Entrance was interrupted; pick it up again.
            head_outside(world, ctx, entity, false);
            continue;
        }
        log::debug!("{id} stalled, wandering");
        wander(world, ctx, entity);
    }
}
