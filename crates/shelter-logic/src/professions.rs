//! Profession and hostile-archetype behavior policies.
//!
//! Each profession resolves once, at agent creation, to a [`BehaviorPolicy`]:
//! whether it hunts hostiles shelter-wide, where it works, how seats are
//! limited and which schedule it follows by default. Scheduling and combat
//! read the policy instead of special-casing professions.
//!
//! | Profession | Works in | Seat rule | Aggressive | Schedule |
//! |------------|----------|-----------|------------|----------|
//! | Guard | Guard Post | unlimited | yes | night shift |
//! | Scientist / Chemist | Laboratory | one per role | no | normal |
//! | Cook | Kitchen | one per room | no | normal |
//! | Doctor | Infirmary | one per room | no | normal |
//! | Engineer | Generator | one per room | no | normal |
//! | Mechanic | Workshop | one per room | no | normal |
//! | Farmer | Garden | one per room | no | normal |
//! | Scavenger | outdoors | n/a | no | erratic |
//! | Unassigned | n/a | n/a | no | normal |

use serde::{Deserialize, Serialize};

use crate::combat::CombatStats;
use crate::room::RoomKind;
use crate::schedule::ScheduleType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Profession {
    Unassigned,
    Guard,
    Scientist,
    Chemist,
    Cook,
    Doctor,
    Engineer,
    Mechanic,
    Farmer,
    Scavenger,
}

/// Exclusive lab seats: one holder per role per room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LabRole {
    Scientist,
    Chemist,
}

impl LabRole {
    /// Stop-point index reserved for this role inside a lab.
    pub fn seat(&self) -> usize {
        match self {
            LabRole::Scientist => 0,
            LabRole::Chemist => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HostileKind {
    Raider,
    Creature,
}

/// Personality tags reported by the population manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trait {
    /// Never seeks or engages hostiles.
    Coward,
    /// Hunts hostiles shelter-wide regardless of profession.
    Brave,
}

/// Capability descriptor resolved once per agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BehaviorPolicy {
    pub aggressive: bool,
    pub work_room: Option<RoomKind>,
    pub lab_role: Option<LabRole>,
    /// Any number of workers of this profession may share a room.
    pub unlimited: bool,
    /// Works outside the shelter.
    pub outdoor: bool,
    pub schedule: ScheduleType,
    pub stats: CombatStats,
    pub max_health: f32,
    pub speed_factor: f32,
}

impl BehaviorPolicy {
    pub fn can_work(&self) -> bool {
        self.outdoor || self.work_room.is_some()
    }
}

const RESIDENT_STATS: CombatStats = CombatStats {
    damage: 5.0,
    range: 30.0,
    cooldown: 1.2,
};

const GUARD_STATS: CombatStats = CombatStats {
    damage: 12.0,
    range: 40.0,
    cooldown: 1.0,
};

const fn resident(work_room: Option<RoomKind>) -> BehaviorPolicy {
    BehaviorPolicy {
        aggressive: false,
        work_room,
        lab_role: None,
        unlimited: false,
        outdoor: false,
        schedule: ScheduleType::Normal,
        stats: RESIDENT_STATS,
        max_health: 100.0,
        speed_factor: 1.0,
    }
}

impl Profession {
    pub fn policy(&self) -> BehaviorPolicy {
        match self {
            Profession::Unassigned => resident(None),
            Profession::Guard => BehaviorPolicy {
                aggressive: true,
                unlimited: true,
                schedule: ScheduleType::NightShift,
                stats: GUARD_STATS,
                max_health: 120.0,
                ..resident(Some(RoomKind::GuardPost))
            },
            Profession::Scientist => BehaviorPolicy {
                lab_role: Some(LabRole::Scientist),
                ..resident(Some(RoomKind::Laboratory))
            },
            Profession::Chemist => BehaviorPolicy {
                lab_role: Some(LabRole::Chemist),
                ..resident(Some(RoomKind::Laboratory))
            },
            Profession::Cook => resident(Some(RoomKind::Kitchen)),
            Profession::Doctor => resident(Some(RoomKind::Infirmary)),
            Profession::Engineer => resident(Some(RoomKind::Generator)),
            Profession::Mechanic => resident(Some(RoomKind::Workshop)),
            Profession::Farmer => resident(Some(RoomKind::Garden)),
            Profession::Scavenger => BehaviorPolicy {
                outdoor: true,
                schedule: ScheduleType::Erratic,
                speed_factor: 1.2,
                ..resident(None)
            },
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Profession::Unassigned => "unassigned",
            Profession::Guard => "guard",
            Profession::Scientist => "scientist",
            Profession::Chemist => "chemist",
            Profession::Cook => "cook",
            Profession::Doctor => "doctor",
            Profession::Engineer => "engineer",
            Profession::Mechanic => "mechanic",
            Profession::Farmer => "farmer",
            Profession::Scavenger => "scavenger",
        }
    }
}

impl HostileKind {
    /// Raiders sweep the whole shelter; creatures only notice what shares
    /// their room.
    pub fn policy(&self) -> BehaviorPolicy {
        match self {
            HostileKind::Raider => BehaviorPolicy {
                aggressive: true,
                stats: CombatStats {
                    damage: 8.0,
                    range: 35.0,
                    cooldown: 1.0,
                },
                max_health: 80.0,
                ..resident(None)
            },
            HostileKind::Creature => BehaviorPolicy {
                aggressive: false,
                stats: CombatStats {
                    damage: 6.0,
                    range: 25.0,
                    cooldown: 0.8,
                },
                max_health: 60.0,
                speed_factor: 0.8,
                ..resident(None)
            },
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HostileKind::Raider => "raider",
            HostileKind::Creature => "creature",
        }
    }
}

/// Final aggression/cowardice after traits are applied to a policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Disposition {
    pub aggressive: bool,
    pub cowardly: bool,
}

impl Disposition {
    pub fn resolve(policy: &BehaviorPolicy, traits: &[Trait]) -> Self {
        let cowardly = traits.contains(&Trait::Coward);
        let aggressive = !cowardly && (policy.aggressive || traits.contains(&Trait::Brave));
        Self {
            aggressive,
            cowardly,
        }
    }
}
