//! Combat rules: who fights whom, who can see whom, cooldowns and damage.
//!
//! Residents fight intruders and residents that have gone insane. Intruders
//! and insane residents both attack sane residents but leave each other
//! alone. Aggressive seekers (and insane residents) search the whole shelter;
//! everyone else only notices hostiles in their own room.

use serde::{Deserialize, Serialize};

use crate::agent::AgentId;
use crate::geometry::Vec2;
use crate::room::RoomId;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombatStats {
    pub damage: f32,
    /// Max distance at which an attack lands.
    pub range: f32,
    /// Seconds between two damage applications.
    pub cooldown: f32,
}

/// Which side an agent fights for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Allegiance {
    Resident,
    Intruder,
    /// A resident that turned hostile. Still a resident for bookkeeping.
    Insane,
}

impl Allegiance {
    pub fn is_hostile(&self) -> bool {
        !matches!(self, Allegiance::Resident)
    }

    pub fn is_enemy_of(&self, other: Allegiance) -> bool {
        match self {
            Allegiance::Resident => other.is_hostile(),
            Allegiance::Intruder | Allegiance::Insane => other == Allegiance::Resident,
        }
    }
}

/// The agent looking for a fight.
#[derive(Debug, Clone, Copy)]
pub struct Seeker {
    pub allegiance: Allegiance,
    pub aggressive: bool,
    pub cowardly: bool,
    pub position: Vec2,
    pub room: Option<RoomId>,
}

impl Seeker {
    /// Cowards never engage, unless they are the ones who went insane.
    pub fn will_engage(&self) -> bool {
        !self.cowardly || self.allegiance == Allegiance::Insane
    }

    fn searches_shelter(&self) -> bool {
        self.aggressive || self.allegiance == Allegiance::Insane
    }
}

/// A potential target as seen this tick.
#[derive(Debug, Clone, Copy)]
pub struct Combatant {
    pub id: AgentId,
    pub allegiance: Allegiance,
    pub position: Vec2,
    pub room: Option<RoomId>,
    pub alive: bool,
}

/// Whether `seeker` can detect (and keep) `target`.
pub fn can_detect(seeker: &Seeker, target: &Combatant, radius: Option<f32>) -> bool {
    if !target.alive || !seeker.will_engage() || !seeker.allegiance.is_enemy_of(target.allegiance)
    {
        return false;
    }
    if seeker.searches_shelter() {
        radius.map_or(true, |r| seeker.position.distance(&target.position) <= r)
    } else {
        seeker.room.is_some() && seeker.room == target.room
    }
}

/// Every candidate the seeker can detect, in candidate order.
pub fn detectable<'a>(
    seeker: &'a Seeker,
    candidates: &'a [Combatant],
    radius: Option<f32>,
) -> impl Iterator<Item = &'a Combatant> + 'a {
    candidates
        .iter()
        .filter(move |c| can_detect(seeker, c, radius))
}

/// Closest detectable candidate.
pub fn nearest_target(
    seeker: &Seeker,
    candidates: &[Combatant],
    radius: Option<f32>,
) -> Option<AgentId> {
    detectable(seeker, candidates, radius)
        .min_by(|a, b| {
            let da = a.position.distance_squared(&seeker.position);
            let db = b.position.distance_squared(&seeker.position);
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|c| c.id)
}

pub fn in_range(attacker: Vec2, target: Vec2, range: f32) -> bool {
    attacker.distance(&target) <= range
}

/// Cooldown gate: one attack per `cooldown` seconds.
pub fn attack_ready(now: f64, last_attack: Option<f64>, cooldown: f32) -> bool {
    last_attack.map_or(true, |last| now - last >= cooldown as f64)
}

/// Apply damage; returns the new health and whether this blow was fatal.
pub fn apply_damage(health: f32, damage: f32) -> (f32, bool) {
    let next = (health - damage.max(0.0)).max(0.0);
    (next, health > 0.0 && next <= 0.0)
}

pub fn is_dead(health: f32) -> bool {
    health <= 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeker(allegiance: Allegiance, aggressive: bool, room: u32) -> Seeker {
        Seeker {
            allegiance,
            aggressive,
            cowardly: false,
            position: Vec2::ZERO,
            room: Some(RoomId(room)),
        }
    }

    fn target(id: u32, allegiance: Allegiance, x: f32, room: u32) -> Combatant {
        Combatant {
            id: AgentId(id),
            allegiance,
            position: Vec2::new(x, 0.0),
            room: Some(RoomId(room)),
            alive: true,
        }
    }

    #[test]
    fn test_enemy_matrix() {
        use Allegiance::*;
        assert!(Resident.is_enemy_of(Intruder));
        assert!(Resident.is_enemy_of(Insane));
        assert!(!Resident.is_enemy_of(Resident));
        assert!(Intruder.is_enemy_of(Resident));
        assert!(!Intruder.is_enemy_of(Insane));
        assert!(Insane.is_enemy_of(Resident));
        assert!(!Insane.is_enemy_of(Intruder));
    }

    #[test]
    fn test_passive_seeker_only_sees_own_room() {
        let s = seeker(Allegiance::Resident, false, 1);
        assert!(can_detect(&s, &target(1, Allegiance::Intruder, 10.0, 1), None));
        assert!(!can_detect(&s, &target(2, Allegiance::Intruder, 10.0, 2), None));
    }

    #[test]
    fn test_aggressive_seeker_sees_whole_shelter() {
        let s = seeker(Allegiance::Resident, true, 1);
        assert!(can_detect(&s, &target(2, Allegiance::Intruder, 900.0, 7), None));
        assert!(!can_detect(&s, &target(2, Allegiance::Intruder, 900.0, 7), Some(100.0)));
    }

    #[test]
    fn test_coward_never_engages_unless_insane() {
        let mut s = seeker(Allegiance::Resident, true, 1);
        s.cowardly = true;
        assert!(!can_detect(&s, &target(1, Allegiance::Intruder, 5.0, 1), None));
        s.allegiance = Allegiance::Insane;
        assert!(can_detect(&s, &target(1, Allegiance::Resident, 5.0, 4), None));
    }

    #[test]
    fn test_dead_targets_are_invisible() {
        let s = seeker(Allegiance::Intruder, true, 1);
        let mut t = target(1, Allegiance::Resident, 5.0, 1);
        t.alive = false;
        assert!(!can_detect(&s, &t, None));
    }

    #[test]
    fn test_nearest_target() {
        let s = seeker(Allegiance::Intruder, true, 1);
        let candidates = [
            target(1, Allegiance::Resident, 50.0, 1),
            target(2, Allegiance::Resident, 20.0, 1),
            target(3, Allegiance::Intruder, 5.0, 1),
        ];
        assert_eq!(nearest_target(&s, &candidates, None), Some(AgentId(2)));
    }

    #[test]
    fn test_cooldown() {
        assert!(attack_ready(0.0, None, 1.0));
        assert!(!attack_ready(10.5, Some(10.0), 1.0));
        assert!(attack_ready(11.0, Some(10.0), 1.0));
    }

    #[test]
    fn test_apply_damage() {
        assert_eq!(apply_damage(10.0, 4.0), (6.0, false));
        assert_eq!(apply_damage(3.0, 4.0), (0.0, true));
        assert_eq!(apply_damage(0.0, 4.0), (0.0, false));
    }
}
