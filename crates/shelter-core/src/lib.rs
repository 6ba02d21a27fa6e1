//! Shelter Core - Underground Shelter Simulation Engine
//!
//! An ECS-based simulation of a small underground shelter whose residents
//! sleep, work and rest on hourly schedules while hostile intruders roam
//! the rooms looking for a fight.
//!
//! # Architecture
//!
//! The simulation uses an Entity Component System (ECS) architecture via `hecs`:
//! - **Entities**: Residents and hostiles
//! - **Components**: Pure data attached to entities (Position, Health, Routine, ActionState, etc.)
//! - **Systems**: Logic that queries and updates components in a fixed phase order
//!
//! Rooms, routing, reservations and power are plain data from `shelter_logic`,
//! owned by the engine and lent to the systems each tick.
//!
//! # Example
//!
//! ```rust,no_run
//! use shelter_core::prelude::*;
//!
//! let mut sim = ShelterSim::new(SimConfig::default());
//! sim.add_room(RoomKind::Entrance, "Entrance", Rect::new(0.0, 0.0, 100.0, 60.0));
//! sim.add_room(RoomKind::Quarters, "Quarters", Rect::new(100.0, 0.0, 100.0, 60.0));
//! sim.spawn_agent(AgentSpec::new(1, "Vera", AgentKind::Resident(Profession::Cook)))
//!     .unwrap();
//!
//! // Run simulation
//! for hour in 0..24 {
//!     sim.tick_hour(hour);
//!     for _ in 0..60 {
//!         sim.update(1.0 / 60.0); // 60 FPS
//!     }
//! }
//! ```

pub mod components;
pub mod engine;
pub mod error;
pub mod events;
pub mod population;
pub mod roster;
pub mod status;
pub mod systems;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::engine::{ShelterSim, SyncReport};
    pub use crate::error::AgentError;
    pub use crate::events::SimEvent;
    pub use crate::population::AgentSpec;
    pub use crate::status::{AgentSnapshot, RoomSnapshot};
    pub use shelter_logic::agent::{AgentId, AgentKind, PopulationRecord};
    pub use shelter_logic::config::SimConfig;
    pub use shelter_logic::geometry::{Rect, Vec2};
    pub use shelter_logic::layout::LayoutError;
    pub use shelter_logic::professions::{HostileKind, Profession, Trait};
    pub use shelter_logic::room::{RoomEvent, RoomFlag, RoomId, RoomKind};
    pub use shelter_logic::schedule::SchedulePhase;
}
