//! Agent spawning and population sync.
//!
//! The surrounding game owns the population records. The engine mirrors them
//! as entities: unseen records are spawned at the Entrance, missing ones are
//! removed, and changed professions, traits or insanity are applied in place.

use hecs::{Entity, World};
use rand::Rng;
use serde::{Deserialize, Serialize};
use shelter_logic::agent::{AgentId, AgentKind, PopulationRecord};
use shelter_logic::geometry::Vec2;
use shelter_logic::professions::Trait;
use shelter_logic::schedule::ScheduleType;

use crate::components::*;

/// Hours an erratic schedule may be shifted by.
const ERRATIC_OFFSET_HOURS: u8 = 24;

/// Everything needed to bring one agent into the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSpec {
    pub id: AgentId,
    pub name: String,
    pub kind: AgentKind,
    /// Starting health; the policy maximum when absent.
    pub health: Option<f32>,
    pub traits: Vec<Trait>,
    pub insane: bool,
    /// Spawn point; the Entrance centre when absent.
    pub position: Option<Vec2>,
}

impl AgentSpec {
    pub fn new(id: u32, name: impl Into<String>, kind: AgentKind) -> Self {
        Self {
            id: AgentId(id),
            name: name.into(),
            kind,
            health: None,
            traits: Vec::new(),
            insane: false,
            position: None,
        }
    }

    pub fn at(mut self, position: Vec2) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_health(mut self, health: f32) -> Self {
        self.health = Some(health);
        self
    }

    pub fn with_traits(mut self, traits: &[Trait]) -> Self {
        self.traits = traits.to_vec();
        self
    }

    pub fn insane(mut self) -> Self {
        self.insane = true;
        self
    }
}

impl From<&PopulationRecord> for AgentSpec {
    fn from(record: &PopulationRecord) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            kind: record.kind,
            health: Some(record.health),
            traits: record.traits.clone(),
            insane: record.insane,
            position: None,
        }
    }
}

/// Spawn the entity for `spec` at `at`. Residents get a routine; hostiles
/// do not.
pub fn spawn(
    world: &mut World,
    spec: &AgentSpec,
    at: Vec2,
    walk_speed: f32,
    rng: &mut impl Rng,
) -> Entity {
    let agent = Agent::new(spec.id, spec.name.clone(), spec.kind);
    let policy = agent.policy;
    let health = Health::new(spec.health.unwrap_or(policy.max_health), policy.max_health);
    let temperament = Temperament::resolve(&policy, &spec.traits, spec.insane);

    let entity = world.spawn((
        agent,
        Position(at),
        health,
        Combat::new(policy.stats),
        temperament,
        Locomotion {
            speed: walk_speed * policy.speed_factor,
        },
        ActionState::Idle,
    ));

    if !spec.kind.is_hostile() {
        let offset = match policy.schedule {
            ScheduleType::Erratic => rng.gen_range(0..ERRATIC_OFFSET_HOURS),
            _ => 0,
        };
        let _ = world.insert_one(entity, Routine::new(policy.schedule, offset));
    }
    entity
}

/// What a sync record changes about an existing agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordDelta {
    pub kind_changed: bool,
    pub traits_changed: bool,
    pub went_insane: bool,
    pub recovered: bool,
}

impl RecordDelta {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Apply a record's profession, trait and insanity to an existing entity.
/// Health is left alone. The simulated value is authoritative once spawned.
pub fn apply_record(world: &mut World, entity: Entity, record: &PopulationRecord) -> RecordDelta {
    let mut delta = RecordDelta::default();
    let Ok(mut query) =
        world.query_one::<(&mut Agent, &mut Temperament, &mut Combat)>(entity)
    else {
        return delta;
    };
    let Some((agent, temperament, combat)) = query.get() else {
        return delta;
    };

    if agent.kind != record.kind {
        *agent = Agent::new(agent.id, record.name.clone(), record.kind);
        combat.stats = agent.policy.stats;
        delta.kind_changed = true;
    } else if agent.name != record.name {
        agent.name = record.name.clone();
    }
    if temperament.traits != record.traits {
        delta.traits_changed = true;
    }
    delta.went_insane = record.insane && !temperament.insane;
    delta.recovered = !record.insane && temperament.insane;

    if delta.kind_changed || delta.traits_changed || delta.went_insane || delta.recovered {
        *temperament = Temperament::resolve(&agent.policy, &record.traits, record.insane);
    }
    let schedule = agent.policy.schedule;
    drop(query);

    if delta.kind_changed {
        if let Ok(mut routine) = world.get::<&mut Routine>(entity) {
            if routine.schedule != schedule {
                routine.schedule = schedule;
                routine.phase = None;
            }
        }
    }
    delta
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use shelter_logic::professions::{HostileKind, Profession};

    #[test]
    fn test_resident_gets_routine() {
        let mut world = World::new();
        let mut rng = StdRng::seed_from_u64(1);
        let spec = AgentSpec::new(1, "Ada", AgentKind::Resident(Profession::Cook));
        let e = spawn(&mut world, &spec, Vec2::ZERO, 60.0, &mut rng);
        assert!(world.get::<&Routine>(e).is_ok());
        assert_eq!(world.get::<&Health>(e).unwrap().current, 100.0);
    }

    #[test]
    fn test_hostile_has_no_routine() {
        let mut world = World::new();
        let mut rng = StdRng::seed_from_u64(1);
        let spec = AgentSpec::new(9, "Raider", AgentKind::Hostile(HostileKind::Raider));
        let e = spawn(&mut world, &spec, Vec2::ZERO, 60.0, &mut rng);
        assert!(world.get::<&Routine>(e).is_err());
        assert!(world.get::<&Temperament>(e).unwrap().aggressive);
    }

    #[test]
    fn test_erratic_offset_in_range() {
        let mut world = World::new();
        let mut rng = StdRng::seed_from_u64(3);
        for i in 0..20 {
            let spec = AgentSpec::new(i, "S", AgentKind::Resident(Profession::Scavenger));
            let e = spawn(&mut world, &spec, Vec2::ZERO, 60.0, &mut rng);
            assert!(world.get::<&Routine>(e).unwrap().offset < ERRATIC_OFFSET_HOURS);
        }
    }

    #[test]
    fn test_record_delta() {
        let mut world = World::new();
        let mut rng = StdRng::seed_from_u64(1);
        let spec = AgentSpec::new(1, "Ada", AgentKind::Resident(Profession::Cook));
        let e = spawn(&mut world, &spec, Vec2::ZERO, 60.0, &mut rng);

        let same = PopulationRecord::resident(1, "Ada", Profession::Cook);
        assert!(apply_record(&mut world, e, &same).is_empty());

        let mut mad = PopulationRecord::resident(1, "Ada", Profession::Guard);
        mad.insane = true;
        let delta = apply_record(&mut world, e, &mad);
        assert!(delta.kind_changed && delta.went_insane);
        assert!(world.get::<&Temperament>(e).unwrap().insane);
        assert_eq!(
            world.get::<&Routine>(e).unwrap().schedule,
            ScheduleType::NightShift
        );
    }
}
