//! Agent identity, body and disposition components.

use serde::{Deserialize, Serialize};
use shelter_logic::agent::{AgentId, AgentKind};
use shelter_logic::combat::{Allegiance, CombatStats};
use shelter_logic::geometry::Vec2;
use shelter_logic::professions::{BehaviorPolicy, Disposition, Trait};
use shelter_logic::schedule::{SchedulePhase, ScheduleType};

/// Identity of a resident or intruder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    pub kind: AgentKind,
    /// Resolved once from `kind` at creation (and again on profession change).
    pub policy: BehaviorPolicy,
}

impl Agent {
    pub fn new(id: AgentId, name: impl Into<String>, kind: AgentKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            policy: kind.policy(),
        }
    }
}

/// Live position in shelter space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position(pub Vec2);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Health {
    pub fn new(current: f32, max: f32) -> Self {
        Self {
            current: current.clamp(0.0, max),
            max,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0.0
    }

    /// Add `delta` (negative for damage), clamped to `0..=max`.
    pub fn apply(&mut self, delta: f32) {
        self.current = (self.current + delta).clamp(0.0, self.max);
    }
}

/// Attack stats plus the timestamp of the last damage application.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Combat {
    pub stats: CombatStats,
    pub last_attack: Option<f64>,
}

impl Combat {
    pub fn new(stats: CombatStats) -> Self {
        Self {
            stats,
            last_attack: None,
        }
    }
}

/// Aggression, cowardice and the insanity flip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Temperament {
    pub aggressive: bool,
    pub cowardly: bool,
    /// A resident that went insane attacks other residents.
    pub insane: bool,
    pub traits: Vec<Trait>,
}

impl Temperament {
    pub fn resolve(policy: &BehaviorPolicy, traits: &[Trait], insane: bool) -> Self {
        let Disposition {
            aggressive,
            cowardly,
        } = Disposition::resolve(policy, traits);
        Self {
            aggressive,
            cowardly,
            insane,
            traits: traits.to_vec(),
        }
    }

    pub fn allegiance(&self, kind: &AgentKind) -> Allegiance {
        kind.allegiance(self.insane)
    }
}

/// Whether a resident is inside the shelter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Presence {
    #[default]
    Present,
    /// Walking to the Entrance to work outdoors.
    Leaving,
    /// Outside; skipped by every per-frame system.
    Away,
}

/// Daily routine of a resident. Hostiles have none.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Routine {
    pub schedule: ScheduleType,
    /// Phase last entered, `None` until the first hourly tick.
    pub phase: Option<SchedulePhase>,
    /// Hour offset for erratic schedules.
    pub offset: u8,
    pub presence: Presence,
}

impl Routine {
    pub fn new(schedule: ScheduleType, offset: u8) -> Self {
        Self {
            schedule,
            phase: None,
            offset,
            presence: Presence::Present,
        }
    }

    pub fn is_away(&self) -> bool {
        self.presence == Presence::Away
    }
}

/// Walking speed in units per second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Locomotion {
    pub speed: f32,
}

/// The agent an entity is currently hunting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatTarget(pub AgentId);

/// Marks a dead agent waiting for its death sequence to finish.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Corpse {
    pub died_at: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelter_logic::professions::Profession;

    #[test]
    fn test_health_clamps() {
        let mut h = Health::new(150.0, 100.0);
        assert_eq!(h.current, 100.0);
        h.apply(-130.0);
        assert_eq!(h.current, 0.0);
        assert!(!h.is_alive());
    }

    #[test]
    fn test_temperament_traits() {
        let policy = Profession::Cook.policy();
        let t = Temperament::resolve(&policy, &[Trait::Coward], false);
        assert!(t.cowardly);
        assert!(!t.aggressive);
        let kind = AgentKind::Resident(Profession::Cook);
        assert_eq!(t.allegiance(&kind), Allegiance::Resident);
    }
}
