//! Power distribution derived from construction order.
//!
//! Rooms built before `starter_rooms` always have power. Every
//! power-producing room beyond the starter set is a station supplying
//! `rooms_per_station` room-slots, one of which it spends on itself. The
//! remaining slots go to the other non-starter rooms strictly in construction
//! order. Lit always follows powered.

use crate::config::PowerConfig;
use crate::layout::Layout;
use crate::room::RoomChange;

/// Power-producing rooms beyond the starter set.
pub fn station_count(layout: &Layout, cfg: &PowerConfig) -> usize {
    layout
        .rooms()
        .iter()
        .skip(cfg.starter_rooms)
        .filter(|r| r.kind.produces_power())
        .count()
}

/// Room-slots available to non-starter rooms.
pub fn capacity(layout: &Layout, cfg: &PowerConfig) -> usize {
    station_count(layout, cfg) * cfg.rooms_per_station
}

/// Desired powered state of every room, in construction order.
pub fn plan(layout: &Layout, cfg: &PowerConfig) -> Vec<bool> {
    let stations = station_count(layout, cfg);
    let mut remaining = capacity(layout, cfg).saturating_sub(stations);

    layout
        .rooms()
        .iter()
        .enumerate()
        .map(|(index, room)| {
            if index < cfg.starter_rooms || room.kind.produces_power() {
                return true;
            }
            if remaining > 0 {
                remaining -= 1;
                true
            } else {
                false
            }
        })
        .collect()
}

/// Push the plan through each room's state-update path. Only rooms whose
/// flags actually moved are reported, so a second call returns nothing.
pub fn recompute(layout: &mut Layout, cfg: &PowerConfig) -> Vec<RoomChange> {
    let plan = plan(layout, cfg);
    layout
        .rooms_mut()
        .iter_mut()
        .zip(plan)
        .filter_map(|(room, powered)| {
            room.update(|flags| {
                flags.powered = powered;
                flags.lit = powered;
            })
        })
        .collect()
}
