//! Integration tests for the shelter rules working together.
//!
//! Exercises: Layout → NavGraph routes, Layout → power → workability →
//! OccupancyTable reservations.
//!
//! All tests are pure logic, no engine.

use shelter_logic::agent::AgentId;
use shelter_logic::config::{NavConfig, OccupancyConfig, PowerConfig, SimConfig};
use shelter_logic::geometry::{Rect, Vec2};
use shelter_logic::layout::Layout;
use shelter_logic::occupancy::OccupancyTable;
use shelter_logic::pathfinding::NavGraph;
use shelter_logic::power;
use shelter_logic::professions::Profession;
use shelter_logic::room::{RoomId, RoomKind};

const H: f32 = 60.0;

// ── Helpers ────────────────────────────────────────────────────────────

fn row(kinds: &[RoomKind], y: f32) -> Layout {
    let mut layout = Layout::new();
    for (i, kind) in kinds.iter().enumerate() {
        layout.add_room(*kind, kind.label(), Rect::new(i as f32 * 100.0, y, 100.0, H));
    }
    layout
}

/// Three floors, each five rooms wide, with shafts on both sides. The left
/// shaft only links floors 0 and 1; the right shaft links all three.
fn tower() -> Layout {
    let mut layout = Layout::new();
    for floor in 0..3 {
        let y = floor as f32 * H;
        for i in 0..5 {
            let kind = if floor == 0 && i == 0 {
                RoomKind::Entrance
            } else {
                RoomKind::Storage
            };
            layout.add_room(kind, kind.label(), Rect::new(40.0 + i as f32 * 100.0, y, 100.0, H));
        }
        layout.add_shaft(Rect::new(540.0, y, 40.0, H));
        if floor < 2 {
            layout.add_shaft(Rect::new(0.0, y, 40.0, H));
        }
    }
    layout
}

fn center(layout: &Layout, id: RoomId) -> Vec2 {
    layout.room(id).unwrap().rect.center()
}

fn vertical_segments(waypoints: &[Vec2]) -> Vec<(Vec2, Vec2)> {
    waypoints
        .windows(2)
        .filter(|w| (w[0].x - w[1].x).abs() < 0.01 && (w[0].y - w[1].y).abs() > 0.01)
        .map(|w| (w[0], w[1]))
        .collect()
}

// ── Routing ────────────────────────────────────────────────────────────

#[test]
fn entrance_to_bath_crosses_two_walls() {
    use RoomKind::*;
    let layout = row(&[Entrance, Quarters, DiningHall, Bathroom], 0.0);
    let mut nav = NavGraph::build(&layout, &NavConfig::default());
    let target = center(&layout, RoomId(3));
    let route = nav.find_route(RoomId(0), RoomId(3), target).unwrap();
    assert_eq!(route.len(), 3);
    assert_eq!(route[0].x, 200.0);
    assert_eq!(route[1].x, 300.0);
    assert_eq!(route[2], target);
}

#[test]
fn same_floor_routes_end_inside_destination() {
    use RoomKind::*;
    let layout = row(
        &[Entrance, Quarters, DiningHall, Bathroom, Kitchen, Workshop, Garden],
        0.0,
    );
    let mut nav = NavGraph::build(&layout, &NavConfig::default());
    for from in layout.rooms() {
        for to in layout.rooms() {
            if from.id == to.id {
                continue;
            }
            let route = nav
                .find_route(from.id, to.id, to.rect.center())
                .unwrap_or_else(|| panic!("no route {} -> {}", from.id, to.id));
            assert!(!route.is_empty());
            assert!(to.rect.contains(*route.last().unwrap()));
        }
    }
}

#[test]
fn cross_floor_routes_ride_exactly_one_shaft() {
    let layout = tower();
    let cfg = NavConfig::default();
    let mut nav = NavGraph::build(&layout, &cfg);
    let groups: Vec<f32> = nav.shaft_groups().map(|g| g.center_x()).collect();

    for from in layout.rooms() {
        for to in layout.rooms() {
            if Layout::same_floor(&from.rect, &to.rect, &cfg) {
                continue;
            }
            let route = nav.find_route(from.id, to.id, to.rect.center()).unwrap();
            let segments = vertical_segments(&route);
            assert_eq!(segments.len(), 1, "{} -> {}: {route:?}", from.id, to.id);
            let x = segments[0].0.x;
            assert!(groups.iter().any(|g| (g - x).abs() < 0.01));
        }
    }
}

#[test]
fn floor_zero_to_two_uses_the_tall_shaft() {
    let layout = tower();
    let mut nav = NavGraph::build(&layout, &NavConfig::default());
    // Leftmost room of floor 0 to leftmost of floor 2: only the right shaft
    // reaches floor 2.
    let from = RoomId(0);
    let to = RoomId(10);
    let route = nav.find_route(from, to, center(&layout, to)).unwrap();
    let segments = vertical_segments(&route);
    assert_eq!(segments[0].0.x, 560.0);
}

#[test]
fn disconnected_floors_have_no_route() {
    let mut layout = row(&[RoomKind::Entrance, RoomKind::Quarters], 0.0);
    layout.add_room(RoomKind::Storage, "Storage", Rect::new(0.0, H, 100.0, H));
    let mut nav = NavGraph::build(&layout, &NavConfig::default());
    assert!(nav.find_route(RoomId(0), RoomId(2), Vec2::new(50.0, 90.0)).is_none());
}

// ── Power ──────────────────────────────────────────────────────────────

#[test]
fn no_stations_leaves_late_rooms_dark() {
    use RoomKind::*;
    let mut layout = row(
        &[Entrance, Quarters, DiningHall, Bathroom, Kitchen, Workshop, Laboratory],
        0.0,
    );
    power::recompute(&mut layout, &PowerConfig::default());
    for room in layout.rooms().iter().skip(4) {
        assert!(!room.flags().powered && !room.flags().lit, "{} lit", room.name);
        assert!(!room.is_workable());
    }
}

#[test]
fn powered_rooms_are_always_the_earliest_built() {
    use RoomKind::*;
    let cfg = PowerConfig::default();
    let build_order = [
        Entrance, Quarters, DiningHall, Bathroom, Kitchen, Workshop, Generator, Garden,
        Infirmary, Storage, Laboratory, Generator, Quarters, Kitchen, Storage, Garden,
        Workshop, Storage,
    ];

    let mut layout = Layout::new();
    for (i, kind) in build_order.iter().enumerate() {
        layout.add_room(*kind, kind.label(), Rect::new(i as f32 * 100.0, 0.0, 100.0, H));
        power::recompute(&mut layout, &cfg);
        assert!(power::recompute(&mut layout, &cfg).is_empty());

        let stations = power::station_count(&layout, &cfg);
        let late: Vec<_> = layout.rooms().iter().skip(cfg.starter_rooms).collect();
        let powered = late.iter().filter(|r| r.flags().powered).count();
        assert!(powered <= cfg.rooms_per_station * stations);

        // Among non-generators, powered ones form a prefix of construction order.
        let consumers: Vec<bool> = late
            .iter()
            .filter(|r| !r.kind.produces_power())
            .map(|r| r.flags().powered)
            .collect();
        let first_dark = consumers.iter().position(|p| !p).unwrap_or(consumers.len());
        assert!(consumers[first_dark..].iter().all(|p| !p));
    }
}

#[test]
fn demolishing_a_generator_cuts_power() {
    use RoomKind::*;
    let cfg = PowerConfig::default();
    let mut layout = row(&[Entrance, Quarters, DiningHall, Bathroom, Generator, Kitchen], 0.0);
    power::recompute(&mut layout, &cfg);
    assert!(layout.room(RoomId(5)).unwrap().is_workable());

    layout.remove_room(RoomId(4)).unwrap();
    let changes = power::recompute(&mut layout, &cfg);
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].room, RoomId(5));
    assert!(changes[0].before.workable && !changes[0].after.workable);
}

// ── Occupancy ──────────────────────────────────────────────────────────

#[test]
fn reservation_caps_hold_under_churn() {
    use RoomKind::*;
    let mut layout = row(
        &[Entrance, Quarters, Laboratory, Quarters, Generator, Laboratory, Kitchen],
        0.0,
    );
    power::recompute(&mut layout, &PowerConfig::default());
    let cfg = OccupancyConfig::default();
    let mut table = OccupancyTable::new(&cfg);
    let professions = [
        Profession::Scientist,
        Profession::Chemist,
        Profession::Cook,
        Profession::Guard,
    ];

    for step in 0u32..400 {
        let agent = AgentId(step * 7 % 23);
        let from = Vec2::new((step * 37 % 700) as f32, 30.0);
        match step % 5 {
            0 | 1 => {
                table.reserve_sleep(&layout, agent, from);
            }
            2 | 3 => {
                let profession = professions[(step as usize / 5) % professions.len()];
                table.reserve_work(&layout, agent, from, profession, &profession.policy());
            }
            _ => {
                table.release(agent);
            }
        }

        for room in layout.rooms() {
            assert!(table.sleepers(room.id) <= cfg.sleep_capacity);
            assert!(table.occupants(room.id).len() <= cfg.slots_per_room);
            assert!(table.workers(room.id, Profession::Cook) <= 1);
            let mut holders = table.occupants(room.id);
            holders.sort();
            holders.dedup();
            assert_eq!(holders.len(), table.occupants(room.id).len());
        }
    }
}

#[test]
fn five_sleepers_four_beds() {
    let layout = row(&[RoomKind::Entrance, RoomKind::Quarters], 0.0);
    let mut table = OccupancyTable::new(&OccupancyConfig::default());
    let granted = (0..5)
        .filter(|i| table.reserve_sleep(&layout, AgentId(*i), Vec2::ZERO).is_some())
        .count();
    assert_eq!(granted, 4);
    assert_eq!(table.sleepers(RoomId(1)), 4);
}

// ── Config ─────────────────────────────────────────────────────────────

#[test]
fn partial_config_keeps_defaults() {
    let cfg = SimConfig::from_json(r#"{"occupancy": {"sleep_capacity": 3}, "seed": 9}"#).unwrap();
    assert_eq!(cfg.occupancy.sleep_capacity, 3);
    assert_eq!(cfg.occupancy.slots_per_room, 5);
    assert_eq!(cfg.power.starter_rooms, 4);
    assert_eq!(cfg.seed, 9);
}
