//! Agent identity and the records the population manager reports.

use serde::{Deserialize, Serialize};

use crate::combat::Allegiance;
use crate::professions::{BehaviorPolicy, HostileKind, Profession, Trait};

/// Plain integer agent identifier, shared with the surrounding game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(pub u32);

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentKind {
    Resident(Profession),
    Hostile(HostileKind),
}

impl AgentKind {
    pub fn policy(&self) -> BehaviorPolicy {
        match self {
            AgentKind::Resident(p) => p.policy(),
            AgentKind::Hostile(h) => h.policy(),
        }
    }

    pub fn is_hostile(&self) -> bool {
        matches!(self, AgentKind::Hostile(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            AgentKind::Resident(p) => p.label(),
            AgentKind::Hostile(h) => h.label(),
        }
    }

    /// Combat side. An insane resident fights like an intruder.
    pub fn allegiance(&self, insane: bool) -> Allegiance {
        match self {
            AgentKind::Hostile(_) => Allegiance::Intruder,
            AgentKind::Resident(_) if insane => Allegiance::Insane,
            AgentKind::Resident(_) => Allegiance::Resident,
        }
    }
}

/// One living resident or hostile as reported by the population manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationRecord {
    pub id: AgentId,
    pub name: String,
    pub kind: AgentKind,
    /// Health at first sighting. Later syncs leave the simulated value alone.
    pub health: f32,
    /// Behavioral intent: the resident has gone insane and attacks others.
    #[serde(default)]
    pub insane: bool,
    #[serde(default)]
    pub traits: Vec<Trait>,
}

impl PopulationRecord {
    pub fn resident(id: u32, name: impl Into<String>, profession: Profession) -> Self {
        let kind = AgentKind::Resident(profession);
        Self {
            id: AgentId(id),
            name: name.into(),
            health: kind.policy().max_health,
            kind,
            insane: false,
            traits: Vec::new(),
        }
    }

    pub fn hostile(id: u32, name: impl Into<String>, hostile: HostileKind) -> Self {
        let kind = AgentKind::Hostile(hostile);
        Self {
            id: AgentId(id),
            name: name.into(),
            health: kind.policy().max_health,
            kind,
            insane: false,
            traits: Vec::new(),
        }
    }

    pub fn with_traits(mut self, traits: &[Trait]) -> Self {
        self.traits = traits.to_vec();
        self
    }
}
