//! Detection system - acquires combat targets and drops stale ones
//!
//! Aggressive agents search the whole shelter (within `detection_radius` if
//! set), others only their own room. A held target is kept until it dies,
//! leaves, or drops out of scope. Insane residents pick uniformly at random
//! among the residents they can reach each time they re-acquire.

use hecs::{Entity, World};
use rand::seq::SliceRandom;
use shelter_logic::agent::AgentId;
use shelter_logic::combat::{self, Allegiance, Combatant, Seeker};

use super::{combatants, is_away, seeker, send_to_post, TickContext};
use crate::components::{ActionState, CombatTarget};

pub fn detection_system(world: &mut World, ctx: &mut TickContext) {
    let field = combatants(world, ctx);
    let radius = ctx.cfg.combat.detection_radius;

    let mut dropped: Vec<(Entity, AgentId)> = Vec::new();
    let mut acquired: Vec<(Entity, AgentId, AgentId)> = Vec::new();

    for (id, entity) in ctx.roster.living_entities() {
        if is_away(world, entity) {
            continue;
        }
        let dead = world
            .get::<&ActionState>(entity)
            .map(|s| s.is_dead())
            .unwrap_or(true);
        if dead {
            continue;
        }
        let Some(me) = seeker(world, ctx, entity) else {
            continue;
        };
        let held = world.get::<&CombatTarget>(entity).ok().map(|t| t.0);

        match held {
            Some(target) => {
                let still_valid = field
                    .iter()
                    .find(|c| c.id == target)
                    .map_or(false, |c| combat::can_detect(&me, c, radius));
                if !still_valid {
                    dropped.push((entity, id));
                }
            }
            None => {
                if let Some(target) = pick_target(ctx, &me, id, &field, radius) {
                    acquired.push((entity, id, target));
                }
            }
        }
    }

    for (entity, id) in dropped {
        let _ = world.remove_one::<CombatTarget>(entity);
        log::debug!("{id} lost its target");
        stand_down(world, ctx, entity, id);
    }
    for (entity, id, target) in acquired {
        log::debug!("{id} acquired target {target}");
        let _ = world.insert_one(entity, CombatTarget(target));
    }
}

/// Choose a target for an agent without one.
pub fn pick_target(
    ctx: &mut TickContext,
    me: &Seeker,
    id: AgentId,
    roster: &[Combatant],
    radius: Option<f32>,
) -> Option<AgentId> {
    if me.allegiance == Allegiance::Insane {
        let reachable: Vec<AgentId> = combat::detectable(me, roster, radius)
            .filter(|c| c.id != id)
            .map(|c| c.id)
            .collect();
        return reachable.choose(&mut *ctx.rng).copied();
    }
    combat::nearest_target(me, roster, radius)
}

/// After losing a target: stop chasing and head back to the reserved post.
/// A running attack lock is left alone; recovery picks the agent up later.
pub fn stand_down(world: &mut World, ctx: &mut TickContext, entity: Entity, id: AgentId) {
    let (chasing, locked) = match world.get::<&ActionState>(entity) {
        Ok(s) => (matches!(*s, ActionState::Walking(_)), s.is_locked(ctx.now) || s.is_dead()),
        Err(_) => return,
    };
    if locked {
        return;
    }
    if let Some(post) = ctx.occupancy.reservation(id).copied() {
        send_to_post(world, ctx, entity, &post);
    } else if chasing {
        if let Ok(mut state) = world.get::<&mut ActionState>(entity) {
            *state = ActionState::Idle;
        }
    }
}
