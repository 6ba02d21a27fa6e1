//! Schedule system - hourly sleep / work / rest transitions for residents
//!
//! Entering a phase swaps the agent's reservation and, unless it is busy
//! fighting, sends it to the new stop-point. Agents that could not get a bed
//! or seat retry on every following hour of the same phase.

use hecs::{Entity, World};
use shelter_logic::agent::{AgentId, AgentKind};
use shelter_logic::schedule::{phase_at, SchedulePhase};

use super::{send_to, send_to_post, wander, TickContext};
use crate::components::{
    ActionState, Agent, CombatTarget, Position, Presence, Routine, Temperament,
};
use crate::events::SimEvent;

/// Re-evaluate every resident's phase for `hour`.
pub fn schedule_system(world: &mut World, ctx: &mut TickContext, hour: u8) {
    let mut transitions: Vec<(Entity, AgentId, SchedulePhase, bool)> = Vec::new();

    for (id, entity) in ctx.roster.living_entities() {
        let Ok(mut query) =
            world.query_one::<(&Agent, &Routine, &Temperament, &ActionState)>(entity)
        else {
            continue;
        };
        let Some((agent, routine, temperament, state)) = query.get() else {
            continue;
        };
        if state.is_dead() || temperament.insane {
            continue;
        }

        let phase = phase_at(routine.schedule, hour, routine.offset, agent.policy.can_work());
        if routine.phase == Some(phase) {
            let unplaced = routine.presence == Presence::Present
                && phase != SchedulePhase::Rest
                && !(phase == SchedulePhase::Work && agent.policy.outdoor)
                && ctx.occupancy.reservation(id).is_none();
            if unplaced {
                transitions.push((entity, id, phase, true));
            }
            continue;
        }
        transitions.push((entity, id, phase, false));
    }

    for (entity, id, phase, retry) in transitions {
        if phase != SchedulePhase::Work {
            return_home(world, ctx, entity);
        }
        if let Ok(mut routine) = world.get::<&mut Routine>(entity) {
            routine.phase = Some(phase);
        }
        if retry {
            log::debug!("{id} retrying {} placement", phase.label());
        }
        enter_phase(world, ctx, entity, phase);
    }
}

/// Apply the side effects of entering `phase`.
pub fn enter_phase(world: &mut World, ctx: &mut TickContext, entity: Entity, phase: SchedulePhase) {
    let Ok(mut query) = world.query_one::<(&Agent, &Position, &ActionState)>(entity) else {
        return;
    };
    let Some((agent, pos, state)) = query.get() else {
        return;
    };
    let id = agent.id;
    let policy = agent.policy;
    let profession = match agent.kind {
        AgentKind::Resident(p) => p,
        AgentKind::Hostile(_) => return,
    };
    let from = pos.0;
    let busy = state.is_locked(ctx.now) || world.get::<&CombatTarget>(entity).is_ok();
    drop(query);

    match phase {
        SchedulePhase::Sleep => match ctx.occupancy.reserve_sleep(ctx.layout, id, from) {
            Some(bed) => {
                log::debug!("{id} reserved bed {} in {}", bed.slot, bed.room);
                if !busy {
                    send_to_post(world, ctx, entity, &bed);
                }
            }
            None => {
                log::debug!("{id} found no free bed, staying put");
                if !busy {
                    if let Ok(mut state) = world.get::<&mut ActionState>(entity) {
                        *state = ActionState::Idle;
                    }
                }
            }
        },
        SchedulePhase::Work if policy.outdoor => {
            ctx.occupancy.release(id);
            head_outside(world, ctx, entity, busy);
        }
        SchedulePhase::Work => {
            match ctx
                .occupancy
                .reserve_work(ctx.layout, id, from, profession, &policy)
            {
                Some(seat) => {
                    log::debug!("{id} reserved seat {} in {}", seat.slot, seat.room);
                    if !busy {
                        send_to_post(world, ctx, entity, &seat);
                    }
                }
                None => {
                    log::debug!("{id} found no free {} seat, wandering", profession.label());
                    if !busy {
                        wander(world, ctx, entity);
                    }
                }
            }
        }
        SchedulePhase::Rest => {
            ctx.occupancy.release(id);
            if !busy {
                wander(world, ctx, entity);
            }
        }
    }
}

/// Start walking to the Entrance; leave at once if already there.
pub fn head_outside(world: &mut World, ctx: &mut TickContext, entity: Entity, busy: bool) {
    let Some(entrance) = ctx.layout.entrance().map(|r| (r.id, r.rect)) else {
        return;
    };
    if let Ok(mut routine) = world.get::<&mut Routine>(entity) {
        routine.presence = Presence::Leaving;
    }
    if busy {
        return;
    }
    let (room, rect) = entrance;
    let door = rect.center();
    if send_to(world, ctx, entity, room, door) {
        let idle = world
            .get::<&ActionState>(entity)
            .map(|s| s.is_idle())
            .unwrap_or(false);
        if idle {
            depart(world, ctx, entity);
        }
    }
}

/// Leave the shelter for outdoor work.
pub fn depart(world: &mut World, ctx: &mut TickContext, entity: Entity) {
    let Ok(mut routine) = world.get::<&mut Routine>(entity) else {
        return;
    };
    if routine.presence == Presence::Away {
        return;
    }
    routine.presence = Presence::Away;
    drop(routine);

    let _ = world.remove_one::<CombatTarget>(entity);
    if let Ok(mut state) = world.get::<&mut ActionState>(entity) {
        *state = ActionState::Idle;
    }
    if let Ok(agent) = world.get::<&Agent>(entity) {
        ctx.occupancy.release(agent.id);
        log::info!("{} ({}) left the shelter", agent.name, agent.id);
        ctx.events.push(SimEvent::AgentLeft(agent.id));
    }
}

/// Bring an away agent back in at the Entrance. Leaving agents simply stop.
pub fn return_home(world: &mut World, ctx: &mut TickContext, entity: Entity) {
    let Ok(mut routine) = world.get::<&mut Routine>(entity) else {
        return;
    };
    let was = routine.presence;
    routine.presence = Presence::Present;
    drop(routine);

    if was != Presence::Away {
        return;
    }
    if let Some(door) = ctx.layout.entrance().map(|r| r.rect.center()) {
        if let Ok(mut pos) = world.get::<&mut Position>(entity) {
            pos.0 = door;
        }
    }
    if let Ok(agent) = world.get::<&Agent>(entity) {
        log::info!("{} ({}) returned to the shelter", agent.name, agent.id);
        ctx.events.push(SimEvent::AgentReturned(agent.id));
    }
}
