//! Route assignment shared by the schedule, combat and recovery systems.
//!
//! A failed route never touches the agent: whatever path it already had is
//! kept and the caller retries on a later tick.

use hecs::{Entity, World};
use rand::seq::SliceRandom;
use rand::Rng;
use shelter_logic::geometry::Vec2;
use shelter_logic::layout::SpatialQuery;
use shelter_logic::occupancy::Reservation;
use shelter_logic::room::RoomId;

use super::TickContext;
use crate::components::{ActionState, Path, Position};

/// Margin kept from the side walls when picking a point inside a room.
const WALL_MARGIN: f32 = 8.0;

/// Route `entity` to `point` inside `room`. Returns `false` (leaving the
/// agent untouched) when no route exists.
pub fn send_to(
    world: &mut World,
    ctx: &mut TickContext,
    entity: Entity,
    room: RoomId,
    point: Vec2,
) -> bool {
    let Ok(pos) = world.get::<&Position>(entity).map(|p| p.0) else {
        return false;
    };
    let Some(route) = ctx.nav.route_from(ctx.layout, pos, room, point) else {
        log::warn!(
            "no route from ({:.0}, {:.0}) to {room}, keeping current path",
            pos.x,
            pos.y
        );
        return false;
    };

    let mut from = pos;
    if let Some(snap) = route.snap_to {
        log::warn!(
            "agent at ({:.0}, {:.0}) outside every room, snapped into {}",
            pos.x,
            pos.y,
            route.origin
        );
        if let Ok(mut p) = world.get::<&mut Position>(entity) {
            p.0 = snap;
        }
        from = snap;
    }

    let mut waypoints = route.waypoints;
    if waypoints.is_empty() && from.distance(&point) > ctx.cfg.motion.arrive_epsilon {
        waypoints.push(point);
    }

    let next = if waypoints.is_empty() {
        ActionState::Idle
    } else {
        ActionState::Walking(Path::new(waypoints, room))
    };
    if let Ok(mut state) = world.get::<&mut ActionState>(entity) {
        *state = next;
    }
    true
}

/// Walk to the stop-point a reservation holds.
pub fn send_to_post(
    world: &mut World,
    ctx: &mut TickContext,
    entity: Entity,
    reservation: &Reservation,
) -> bool {
    match ctx.occupancy.stop_point(ctx.layout, reservation) {
        Some(point) => send_to(world, ctx, entity, reservation.room, point),
        None => false,
    }
}

/// Whether the agent stands on its reserved stop-point.
pub fn at_post(world: &World, ctx: &TickContext, entity: Entity, reservation: &Reservation) -> bool {
    let Some(point) = ctx.occupancy.stop_point(ctx.layout, reservation) else {
        return false;
    };
    world
        .get::<&Position>(entity)
        .map(|p| p.0.distance(&point) <= ctx.cfg.motion.arrive_epsilon.max(1.0))
        .unwrap_or(false)
}

/// Head for a random point in a random habitable room.
pub fn wander(world: &mut World, ctx: &mut TickContext, entity: Entity) -> bool {
    let candidates: Vec<RoomId> = ctx
        .layout
        .rooms()
        .iter()
        .filter(|r| r.flags().habitable())
        .map(|r| r.id)
        .collect();
    let Some(&room) = candidates.choose(&mut *ctx.rng) else {
        return false;
    };
    let Some(rect) = ctx.layout.room(room).map(|r| r.rect) else {
        return false;
    };
    let x = if rect.width > WALL_MARGIN * 2.0 {
        ctx.rng
            .gen_range(rect.left() + WALL_MARGIN..rect.right() - WALL_MARGIN)
    } else {
        rect.center().x
    };
    send_to(world, ctx, entity, room, Vec2::new(x, rect.walk_y()))
}

/// Room an agent stands in, or the routing origin when it is between rooms.
pub fn current_room(ctx: &TickContext, pos: Vec2) -> Option<RoomId> {
    ctx.layout
        .room_at(pos)
        .or_else(|| ctx.nav.locate(ctx.layout, pos).map(|l| l.room))
}
