//! Movement system - advances walking agents along their waypoints

use hecs::World;

use super::{depart, TickContext};
use crate::components::{ActionState, Locomotion, Position, Presence, Routine};

/// Move walking agents. Each tick covers `speed * delta` but never more than
/// `max_step`; leftover distance carries over to the next waypoint. An agent
/// whose last waypoint is reached becomes idle.
pub fn movement_system(world: &mut World, ctx: &mut TickContext, delta_seconds: f32) {
    let mut arrived = Vec::new();
    let entrance = ctx.layout.entrance().map(|r| r.id);

    for (_, entity) in ctx.roster.living_entities() {
        let Ok((pos, state, locomotion, routine)) = world
            .query_one_mut::<(&mut Position, &mut ActionState, &Locomotion, Option<&Routine>)>(entity)
        else {
            continue;
        };
        if routine.map_or(false, |r| r.is_away()) {
            continue;
        }
        let ActionState::Walking(path) = state else {
            continue;
        };

        let mut budget = (locomotion.speed * delta_seconds).min(ctx.cfg.motion.max_step);
        while budget > 0.0 {
            let Some(next) = path.next() else {
                break;
            };
            let distance = pos.0.distance(&next);
            let (moved, reached) = pos.0.step_toward(next, budget);
            pos.0 = moved;
            if !reached {
                break;
            }
            budget -= distance;
            path.waypoints.pop_front();
        }

        if path.waypoints.is_empty() {
            let at_entrance = Some(path.destination) == entrance;
            *state = ActionState::Idle;
            if at_entrance && routine.map_or(false, |r| r.presence == Presence::Leaving) {
                arrived.push(entity);
            }
        }
    }

    // Outdoor workers that reached the Entrance leave the shelter.
    for entity in arrived {
        depart(world, ctx, entity);
    }
}
