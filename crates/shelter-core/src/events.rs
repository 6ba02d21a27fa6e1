//! Notifications queued for the surrounding game.
//!
//! The engine pushes events as state changes; the game drains them once per
//! frame to refresh visuals, capacity displays and its population records.

use serde::{Deserialize, Serialize};
use shelter_logic::agent::AgentId;
use shelter_logic::room::{RoomChange, RoomId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    /// A room's flags changed (including derived `workable`).
    RoomStateChanged(RoomChange),
    /// A room was built or demolished.
    LayoutChanged { added: Option<RoomId>, removed: Option<RoomId> },
    AgentSpawned(AgentId),
    /// Health reached zero. The corpse lingers until `AgentRemoved`.
    AgentDied(AgentId),
    /// The entity is gone; drop its record.
    AgentRemoved(AgentId),
    /// Left the shelter for outdoor work.
    AgentLeft(AgentId),
    AgentReturned(AgentId),
}

#[derive(Debug, Default)]
pub struct EventQueue {
    pending: Vec<SimEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: SimEvent) {
        self.pending.push(event);
    }

    pub fn extend_rooms(&mut self, changes: impl IntoIterator<Item = RoomChange>) {
        self.pending
            .extend(changes.into_iter().map(SimEvent::RoomStateChanged));
    }

    pub fn drain(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
