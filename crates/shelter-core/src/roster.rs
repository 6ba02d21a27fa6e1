//! Stable agent ordering and id → entity lookup.
//!
//! Systems walk `living()` in spawn order so every tick processes agents in
//! the same sequence. Corpses keep their entity mapping until despawned.

use std::collections::{HashMap, HashSet};

use hecs::Entity;
use shelter_logic::agent::AgentId;

#[derive(Debug, Default)]
pub struct Roster {
    living: Vec<AgentId>,
    entities: HashMap<AgentId, Entity>,
    /// Ids that died here. A late population sync must not revive them.
    fallen: HashSet<AgentId>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: AgentId, entity: Entity) {
        self.living.push(id);
        self.entities.insert(id, entity);
        self.fallen.remove(&id);
    }

    pub fn entity(&self, id: AgentId) -> Option<Entity> {
        self.entities.get(&id).copied()
    }

    pub fn living(&self) -> &[AgentId] {
        &self.living
    }

    /// Living ids paired with their entities, in roster order.
    pub fn living_entities(&self) -> Vec<(AgentId, Entity)> {
        self.living
            .iter()
            .filter_map(|id| self.entities.get(id).map(|e| (*id, *e)))
            .collect()
    }

    pub fn is_living(&self, id: AgentId) -> bool {
        self.living.contains(&id)
    }

    pub fn has_fallen(&self, id: AgentId) -> bool {
        self.fallen.contains(&id)
    }

    pub fn contains(&self, id: AgentId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Delist from the active population; the entity stays until `forget`.
    pub fn mark_dead(&mut self, id: AgentId) {
        self.living.retain(|a| *a != id);
        self.fallen.insert(id);
    }

    /// Drop every trace of `id` except the fallen mark.
    pub fn forget(&mut self, id: AgentId) -> Option<Entity> {
        self.living.retain(|a| *a != id);
        self.entities.remove(&id)
    }

    pub fn living_count(&self) -> usize {
        self.living.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_and_death() {
        let mut world = hecs::World::new();
        let mut roster = Roster::new();
        for i in 0..3 {
            let e = world.spawn((i,));
            roster.insert(AgentId(i), e);
        }
        roster.mark_dead(AgentId(1));
        assert_eq!(roster.living(), &[AgentId(0), AgentId(2)]);
        assert!(roster.entity(AgentId(1)).is_some());
        assert!(roster.has_fallen(AgentId(1)));
        roster.forget(AgentId(1));
        assert!(!roster.contains(AgentId(1)));
        assert!(roster.has_fallen(AgentId(1)));
    }
}
