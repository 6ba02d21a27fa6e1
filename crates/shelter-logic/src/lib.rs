//! Pure rules for the shelter simulation.
//!
//! This crate holds every rule that is independent of the ECS engine: room
//! state, layout topology, routing, schedules, seat reservations, power and
//! combat. Functions take plain data and return results, so everything here
//! is unit-testable without a running simulation.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`agent`] | Agent ids, kinds and population records |
//! | [`combat`] | Allegiances, detection scope, cooldowns, damage |
//! | [`config`] | Balance configuration (`SimConfig`) and validation |
//! | [`geometry`] | `Vec2` / `Rect` primitives, y grows downward |
//! | [`layout`] | Ordered rooms, shafts, floors, adjacency, spatial queries |
//! | [`occupancy`] | Stop-points, sleep/work/lab reservations |
//! | [`pathfinding`] | Navigation graph and waypoint routes across floors |
//! | [`power`] | Powered/lit derivation from construction order |
//! | [`professions`] | Profession and hostile behavior-policy table |
//! | [`room`] | Room kinds, flags, event tags, derived workability |
//! | [`schedule`] | Hourly sleep/work/rest table per schedule type |

pub mod agent;
pub mod combat;
pub mod config;
pub mod geometry;
pub mod layout;
pub mod occupancy;
pub mod pathfinding;
pub mod power;
pub mod professions;
pub mod room;
pub mod schedule;
