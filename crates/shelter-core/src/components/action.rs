//! The action lock: one tagged state per agent instead of loose optional
//! fields.
//!
//! | State | Who may change it |
//! |-------|-------------------|
//! | `Idle` | schedule, detection, recovery |
//! | `Walking` | movement (arrival), combat (re-path), schedule |
//! | `Attacking` | combat, once `until` has passed |
//! | `Hurt` | combat, once `until` has passed |
//! | `Dead` | nobody |

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use shelter_logic::agent::AgentId;
use shelter_logic::geometry::Vec2;
use shelter_logic::room::RoomId;

/// Remaining waypoints of a route and the room it ends in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    pub waypoints: VecDeque<Vec2>,
    pub destination: RoomId,
}

impl Path {
    pub fn new(waypoints: impl IntoIterator<Item = Vec2>, destination: RoomId) -> Self {
        Self {
            waypoints: waypoints.into_iter().collect(),
            destination,
        }
    }

    pub fn next(&self) -> Option<Vec2> {
        self.waypoints.front().copied()
    }

    pub fn end(&self) -> Option<Vec2> {
        self.waypoints.back().copied()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum ActionState {
    #[default]
    Idle,
    Walking(Path),
    Attacking {
        target: AgentId,
        until: f64,
    },
    Hurt {
        until: f64,
    },
    Dead,
}

impl ActionState {
    pub fn is_dead(&self) -> bool {
        matches!(self, ActionState::Dead)
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, ActionState::Idle)
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            ActionState::Walking(path) => Some(path),
            _ => None,
        }
    }

    /// Attacking or hurt with time left on the lock.
    pub fn is_locked(&self, now: f64) -> bool {
        match self {
            ActionState::Attacking { until, .. } | ActionState::Hurt { until } => *until > now,
            _ => false,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ActionState::Idle => "idle",
            ActionState::Walking(_) => "walking",
            ActionState::Attacking { .. } => "attacking",
            ActionState::Hurt { .. } => "hurt",
            ActionState::Dead => "dead",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_expiry() {
        let state = ActionState::Attacking {
            target: AgentId(3),
            until: 10.0,
        };
        assert!(state.is_locked(9.5));
        assert!(!state.is_locked(10.0));
        assert!(!ActionState::Dead.is_locked(0.0));
    }

    #[test]
    fn test_path_ends() {
        let path = Path::new([Vec2::new(1.0, 0.0), Vec2::new(5.0, 0.0)], RoomId(2));
        assert_eq!(path.next(), Some(Vec2::new(1.0, 0.0)));
        assert_eq!(path.end(), Some(Vec2::new(5.0, 0.0)));
    }
}
