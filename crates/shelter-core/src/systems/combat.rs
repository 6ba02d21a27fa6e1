//! Combat system - chase, attack, damage and retaliation
//!
//! One damage application per cooldown window: an attacker in range either
//! hits (and holds the `attack_lock`) or waits out its cooldown in the
//! attacking state. Hits are collected first and applied afterwards so every
//! attacker sees the same positions.

use hecs::{Entity, World};
use shelter_logic::agent::AgentId;
use shelter_logic::combat::{self, Allegiance};
use shelter_logic::geometry::Vec2;

use super::{current_room, is_away, send_to, stand_down, TickContext};
use crate::components::{
    ActionState, Agent, Combat, CombatTarget, Health, Position, Temperament,
};

struct Hit {
    attacker: AgentId,
    allegiance: Allegiance,
    target: Entity,
    damage: f32,
}

/// Expired attack and hurt locks drop back to idle.
pub fn release_locks(world: &mut World, ctx: &mut TickContext) {
    for (_, entity) in ctx.roster.living_entities() {
        if let Ok(mut state) = world.get::<&mut ActionState>(entity) {
            let expired = match *state {
                ActionState::Attacking { until, .. } | ActionState::Hurt { until } => until <= ctx.now,
                _ => false,
            };
            if expired {
                *state = ActionState::Idle;
            }
        }
    }
}

pub fn combat_system(world: &mut World, ctx: &mut TickContext) {
    let now = ctx.now;
    let mut hits: Vec<Hit> = Vec::new();
    let mut chases: Vec<(Entity, Vec2)> = Vec::new();
    let mut stale: Vec<(Entity, AgentId)> = Vec::new();

    for (id, entity) in ctx.roster.living_entities() {
        if is_away(world, entity) {
            continue;
        }
        let Ok(mut query) = world.query_one::<(
            &Agent,
            &Position,
            &mut ActionState,
            &mut Combat,
            &CombatTarget,
            &Temperament,
        )>(entity) else {
            continue;
        };
        let Some((agent, pos, state, fighter, target, temperament)) = query.get() else {
            continue;
        };
        if state.is_dead() || state.is_locked(now) {
            continue;
        }

        let target_id = target.0;
        let Some(target_pos) = living_position(world, ctx, target_id) else {
            stale.push((entity, id));
            continue;
        };

        if combat::in_range(pos.0, target_pos, fighter.stats.range) {
            if combat::attack_ready(now, fighter.last_attack, fighter.stats.cooldown) {
                fighter.last_attack = Some(now);
                *state = ActionState::Attacking {
                    target: target_id,
                    until: now + ctx.cfg.combat.attack_lock as f64,
                };
                if let Some(target) = ctx.roster.entity(target_id) {
                    hits.push(Hit {
                        attacker: id,
                        allegiance: temperament.allegiance(&agent.kind),
                        target,
                        damage: fighter.stats.damage,
                    });
                }
            } else {
                let ready_at = fighter.last_attack.unwrap_or(now) + fighter.stats.cooldown as f64;
                *state = ActionState::Attacking {
                    target: target_id,
                    until: ready_at,
                };
            }
            continue;
        }

        // Out of range: keep a chase path that still ends near the target.
        let on_track = state
            .path()
            .and_then(|p| p.end())
            .map_or(false, |end| end.distance(&target_pos) <= ctx.cfg.combat.repath_distance);
        if !on_track {
            chases.push((entity, target_pos));
        }
    }

    for (entity, id) in stale {
        log::warn!("{id} held a stale target, clearing it");
        let _ = world.remove_one::<CombatTarget>(entity);
        stand_down(world, ctx, entity, id);
    }

    for (entity, target_pos) in chases {
        if let Some(room) = current_room(ctx, target_pos) {
            send_to(world, ctx, entity, room, target_pos);
        }
    }

    for hit in hits {
        apply_hit(world, ctx, hit);
    }
}

fn apply_hit(world: &mut World, ctx: &mut TickContext, hit: Hit) {
    let Ok(mut health) = world.get::<&mut Health>(hit.target) else {
        return;
    };
    if !health.is_alive() {
        return;
    }
    health.apply(-hit.damage);
    let alive = health.is_alive();
    drop(health);

    let Ok(mut query) = world.query_one::<(
        &Agent,
        &mut ActionState,
        &Temperament,
        Option<&CombatTarget>,
    )>(hit.target) else {
        return;
    };
    let Some((victim, state, temperament, held)) = query.get() else {
        return;
    };
    log::debug!("{} hit {} for {:.1}", hit.attacker, victim.id, hit.damage);

    if alive && !matches!(*state, ActionState::Attacking { .. } | ActionState::Dead) {
        *state = ActionState::Hurt {
            until: ctx.now + ctx.cfg.combat.hurt_duration as f64,
        };
    }

    let fights_back = alive
        && held.is_none()
        && (!temperament.cowardly || temperament.insane)
        && temperament.allegiance(&victim.kind).is_enemy_of(hit.allegiance);
    drop(query);
    if fights_back {
        let _ = world.insert_one(hit.target, CombatTarget(hit.attacker));
    }
}

/// Position of a living, present agent.
fn living_position(world: &World, ctx: &TickContext, id: AgentId) -> Option<Vec2> {
    if !ctx.roster.is_living(id) {
        return None;
    }
    let entity = ctx.roster.entity(id)?;
    if is_away(world, entity) {
        return None;
    }
    let alive = world.get::<&Health>(entity).ok()?.is_alive();
    if !alive {
        return None;
    }
    world.get::<&Position>(entity).ok().map(|p| p.0)
}
