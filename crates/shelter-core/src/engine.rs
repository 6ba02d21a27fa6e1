//! Simulation engine - main entry point for running the shelter

use hecs::{Entity, World};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shelter_logic::agent::{AgentId, PopulationRecord};
use shelter_logic::config::SimConfig;
use shelter_logic::geometry::{Rect, Vec2};
use shelter_logic::layout::{Layout, LayoutError, SpatialQuery};
use shelter_logic::occupancy::{OccupancyTable, ReservationKind};
use shelter_logic::pathfinding::NavGraph;
use shelter_logic::power;
use shelter_logic::room::{Room, RoomChange, RoomEvent, RoomFlag, RoomId, RoomKind};
use shelter_logic::schedule::{phase_at, SchedulePhase};

use crate::components::*;
use crate::error::AgentError;
use crate::events::{EventQueue, SimEvent};
use crate::population::{self, AgentSpec};
use crate::roster::Roster;
use crate::status::{self, AgentSnapshot, RoomSnapshot};
use crate::systems::*;

/// Outcome of one population sync.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub spawned: Vec<AgentId>,
    pub removed: Vec<AgentId>,
    pub updated: Vec<AgentId>,
}

/// Main simulation engine
pub struct ShelterSim {
    world: World,
    cfg: SimConfig,
    layout: Layout,
    nav: NavGraph,
    occupancy: OccupancyTable,
    roster: Roster,
    rng: StdRng,
    events: EventQueue,
    /// Simulation clock in seconds since start
    now: f64,
    /// Hour of the last hourly tick
    hour: Option<u8>,

    // Update timing
    last_detection_update: f64,
    last_recovery_update: f64,
}

impl ShelterSim {
    /// Create an empty shelter
    pub fn new(cfg: SimConfig) -> Self {
        let layout = Layout::new();
        let nav = NavGraph::build(&layout, &cfg.nav);
        Self {
            world: World::new(),
            occupancy: OccupancyTable::new(&cfg.occupancy),
            rng: StdRng::seed_from_u64(cfg.seed),
            layout,
            nav,
            roster: Roster::new(),
            events: EventQueue::new(),
            now: 0.0,
            hour: None,
            last_detection_update: 0.0,
            last_recovery_update: 0.0,
            cfg,
        }
    }

    /// Split the engine into the world and the context systems run against.
    fn split(&mut self) -> (&mut World, TickContext<'_>) {
        let ctx = TickContext {
            cfg: &self.cfg,
            layout: &self.layout,
            nav: &mut self.nav,
            occupancy: &mut self.occupancy,
            roster: &mut self.roster,
            rng: &mut self.rng,
            events: &mut self.events,
            now: self.now,
        };
        (&mut self.world, ctx)
    }

    // ── Layout ─────────────────────────────────────────────────────────

    /// Build a room at the end of the construction order.
    pub fn add_room(&mut self, kind: RoomKind, name: impl Into<String>, rect: Rect) -> RoomId {
        let id = self.layout.add_room(kind, name, rect);
        log::info!("built {} ({id})", kind.label());
        self.layout_changed(Some(id), None);
        id
    }

    pub fn add_shaft(&mut self, rect: Rect) {
        self.layout.add_shaft(rect);
        self.nav = NavGraph::build(&self.layout, &self.cfg.nav);
    }

    /// Demolish a room. Reservations inside it are dropped, agents standing
    /// in it move to the nearest remaining room, and walks that end in it
    /// or pass through it are cancelled.
    pub fn remove_room(&mut self, id: RoomId) -> Result<Room, LayoutError> {
        let room = self.layout.remove_room(id)?;
        log::info!("demolished {} ({id})", room.kind.label());

        let displaced = self.occupancy.remove_room(id);
        let mut affected: Vec<Entity> = Vec::new();
        for (_, entity) in self.roster.living_entities() {
            let Ok((pos, state)) = self
                .world
                .query_one_mut::<(&mut Position, &mut ActionState)>(entity)
            else {
                continue;
            };
            let mut touched = false;
            if room.rect.contains(pos.0) {
                if let Some(rect) = self
                    .layout
                    .nearest_room(pos.0)
                    .and_then(|(near, _)| self.layout.room(near))
                    .map(|r| r.rect)
                {
                    pos.0 = Vec2::new(rect.center().x, rect.walk_y());
                }
                touched = true;
            }
            if let ActionState::Walking(path) = state {
                let through = path.destination == id
                    || path.waypoints.iter().any(|w| room.rect.contains(*w));
                if through {
                    *state = ActionState::Idle;
                    touched = true;
                }
            }
            if touched {
                affected.push(entity);
            }
        }

        self.layout_changed(None, Some(id));

        for (agent, entity) in self.roster.living_entities() {
            if displaced.contains(&agent) && !affected.contains(&entity) {
                affected.push(entity);
            }
        }
        for entity in affected {
            self.resume_phase(entity);
        }
        Ok(room)
    }

    /// Set an externally controlled flag on a room.
    pub fn set_room_flag(
        &mut self,
        id: RoomId,
        flag: RoomFlag,
        value: bool,
    ) -> Result<(), LayoutError> {
        let change = self.layout.update_room(id, |flags| flags.set(flag, value))?;
        self.room_changed(change, flag == RoomFlag::Accessible);
        Ok(())
    }

    pub fn add_room_event(&mut self, id: RoomId, event: RoomEvent) -> Result<(), LayoutError> {
        let change = self.layout.add_event(id, event)?;
        log::info!("{event:?} broke out in {id}");
        self.room_changed(change, false);
        Ok(())
    }

    pub fn remove_room_event(&mut self, id: RoomId, event: RoomEvent) -> Result<(), LayoutError> {
        let change = self.layout.remove_event(id, event)?;
        self.room_changed(change, false);
        Ok(())
    }

    /// Rebuild routing and power after a room was added or removed.
    fn layout_changed(&mut self, added: Option<RoomId>, removed: Option<RoomId>) {
        self.nav = NavGraph::build(&self.layout, &self.cfg.nav);
        let changes = power::recompute(&mut self.layout, &self.cfg.power);
        self.events.push(SimEvent::LayoutChanged { added, removed });
        self.revalidate(&changes);
        self.events.extend_rooms(changes);
    }

    fn room_changed(&mut self, change: Option<RoomChange>, topology: bool) {
        let Some(change) = change else {
            return;
        };
        if topology {
            self.nav = NavGraph::build(&self.layout, &self.cfg.nav);
        }
        self.revalidate(std::slice::from_ref(&change));
        self.events.push(SimEvent::RoomStateChanged(change));
    }

    /// Drop reservations in rooms that can no longer serve them and send
    /// their holders to look again.
    fn revalidate(&mut self, changes: &[RoomChange]) {
        let mut evicted: Vec<AgentId> = Vec::new();
        for change in changes {
            let lost_work = change.before.workable && !change.after.workable;
            let lost_habitat = change.before.habitable() && !change.after.habitable();
            if !lost_work && !lost_habitat {
                continue;
            }
            for agent in self.occupancy.occupants(change.room) {
                let Some(held) = self.occupancy.reservation(agent) else {
                    continue;
                };
                let invalid = match held.kind {
                    ReservationKind::Sleep => lost_habitat,
                    ReservationKind::Work(_) | ReservationKind::Lab(_) => lost_work,
                };
                if invalid {
                    self.occupancy.release(agent);
                    evicted.push(agent);
                }
            }
        }
        for agent in evicted {
            log::debug!("{agent} lost its reservation to a room change");
            if let Some(entity) = self.roster.entity(agent) {
                self.resume_phase(entity);
            }
        }
    }

    /// Re-enter the agent's current schedule phase, or idle it so recovery
    /// picks it up.
    fn resume_phase(&mut self, entity: Entity) {
        let phase = self
            .world
            .get::<&Routine>(entity)
            .ok()
            .and_then(|r| if r.is_away() { None } else { r.phase });
        let insane = self
            .world
            .get::<&Temperament>(entity)
            .map(|t| t.insane)
            .unwrap_or(false);
        let (world, mut ctx) = self.split();
        match phase {
            Some(phase) if !insane => enter_phase(world, &mut ctx, entity, phase),
            _ => {
                if let Ok(mut state) = world.get::<&mut ActionState>(entity) {
                    if !state.is_dead() && !state.is_locked(ctx.now) {
                        *state = ActionState::Idle;
                    }
                }
            }
        }
    }

    /// Put a freshly spawned or changed resident into the phase for the
    /// current hour.
    fn settle(&mut self, entity: Entity) {
        let Some(hour) = self.hour else {
            return;
        };
        let Ok(mut query) = self
            .world
            .query_one::<(&Agent, &mut Routine, &Temperament)>(entity)
        else {
            return;
        };
        let Some((agent, routine, temperament)) = query.get() else {
            return;
        };
        if temperament.insane {
            return;
        }
        let phase = phase_at(routine.schedule, hour, routine.offset, agent.policy.can_work());
        routine.phase = Some(phase);
        drop(query);

        let (world, mut ctx) = self.split();
        enter_phase(world, &mut ctx, entity, phase);
    }

    // ── Population ─────────────────────────────────────────────────────

    /// Bring a new agent into the shelter.
    pub fn spawn_agent(&mut self, spec: AgentSpec) -> Result<AgentId, AgentError> {
        if self.roster.contains(spec.id) {
            return Err(AgentError::Duplicate(spec.id));
        }
        if self.roster.has_fallen(spec.id) {
            return Err(AgentError::Fallen(spec.id));
        }
        let at = spec
            .position
            .or_else(|| self.layout.entrance().map(|r| r.rect.center()))
            .unwrap_or(Vec2::ZERO);
        let entity = population::spawn(
            &mut self.world,
            &spec,
            at,
            self.cfg.motion.walk_speed,
            &mut self.rng,
        );
        self.roster.insert(spec.id, entity);
        log::info!("{} ({}) arrived as {}", spec.name, spec.id, spec.kind.label());
        self.events.push(SimEvent::AgentSpawned(spec.id));
        self.settle(entity);
        Ok(spec.id)
    }

    /// Remove an agent at the game's request (eviction, departure).
    pub fn remove_agent(&mut self, id: AgentId) -> Result<(), AgentError> {
        let entity = self.roster.entity(id).ok_or(AgentError::Unknown(id))?;
        self.occupancy.release(id);
        let _ = self.world.despawn(entity);
        self.roster.forget(id);
        clear_targets_on(&mut self.world, &[id]);
        log::info!("{id} removed from the shelter");
        self.events.push(SimEvent::AgentRemoved(id));
        Ok(())
    }

    /// Reconcile agents against the population manager's living records.
    pub fn sync_population(&mut self, records: &[PopulationRecord]) -> SyncReport {
        let mut report = SyncReport::default();

        for record in records {
            match self.roster.entity(record.id) {
                Some(entity) if self.roster.is_living(record.id) => {
                    let delta = population::apply_record(&mut self.world, entity, record);
                    if delta.is_empty() {
                        continue;
                    }
                    if delta.went_insane {
                        log::info!("{} ({}) went insane", record.name, record.id);
                        self.occupancy.release(record.id);
                        let (world, mut ctx) = self.split();
                        return_home(world, &mut ctx, entity);
                        if let Ok(mut routine) = world.get::<&mut Routine>(entity) {
                            routine.phase = None;
                        }
                        if let Ok(mut state) = world.get::<&mut ActionState>(entity) {
                            if !state.is_locked(ctx.now) {
                                *state = ActionState::Idle;
                            }
                        }
                    } else {
                        self.settle(entity);
                    }
                    report.updated.push(record.id);
                }
                Some(_) => {}
                None if self.roster.has_fallen(record.id) => {
                    log::debug!("{} is dead here, ignoring its record", record.id);
                }
                None => {
                    if self.spawn_agent(AgentSpec::from(record)).is_ok() {
                        report.spawned.push(record.id);
                    }
                }
            }
        }

        let gone: Vec<AgentId> = self
            .roster
            .living()
            .iter()
            .copied()
            .filter(|id| !records.iter().any(|r| r.id == *id))
            .collect();
        for id in gone {
            if self.remove_agent(id).is_ok() {
                report.removed.push(id);
            }
        }
        report
    }

    fn living_entity(&self, id: AgentId) -> Result<Entity, AgentError> {
        let entity = self.roster.entity(id).ok_or(AgentError::Unknown(id))?;
        if !self.roster.is_living(id) {
            return Err(AgentError::Dead(id));
        }
        Ok(entity)
    }

    /// Apply an external health change. Returns the new health. A drop to
    /// zero is processed as a death before anything else runs on the next
    /// update.
    pub fn apply_health_delta(&mut self, id: AgentId, delta: f32) -> Result<f32, AgentError> {
        let entity = self.living_entity(id)?;
        let mut health = self
            .world
            .get::<&mut Health>(entity)
            .map_err(|_| AgentError::Unknown(id))?;
        health.apply(delta);
        Ok(health.current)
    }

    /// Move an agent by hand. Its walk, target and reservation are dropped
    /// so nothing stale resumes afterwards.
    pub fn reposition_agent(&mut self, id: AgentId, pos: Vec2) -> Result<(), AgentError> {
        let entity = self.living_entity(id)?;
        self.occupancy.release(id);
        let _ = self.world.remove_one::<CombatTarget>(entity);
        if let Ok((position, state)) = self
            .world
            .query_one_mut::<(&mut Position, &mut ActionState)>(entity)
        {
            position.0 = pos;
            *state = ActionState::Idle;
        }
        if let Ok(mut routine) = self.world.get::<&mut Routine>(entity) {
            routine.presence = Presence::Present;
        }
        log::debug!("{id} repositioned to ({:.0}, {:.0})", pos.x, pos.y);
        Ok(())
    }

    // ── Ticks ──────────────────────────────────────────────────────────

    /// Hourly tick: schedule transitions.
    pub fn tick_hour(&mut self, hour: u8) {
        let hour = hour % 24;
        self.hour = Some(hour);
        let (world, mut ctx) = self.split();
        schedule_system(world, &mut ctx, hour);
    }

    /// Per-frame tick.
    pub fn update(&mut self, delta_seconds: f32) {
        self.now += delta_seconds as f64;
        let run_detection = self.now - self.last_detection_update
            >= self.cfg.combat.detection_interval as f64;
        let run_recovery = self.now - self.last_recovery_update
            >= self.cfg.recovery.stuck_check_interval as f64;

        let (world, mut ctx) = self.split();

        // Deaths from external health changes since the last frame
        death_system(world, &mut ctx);
        release_locks(world, &mut ctx);

        // Target acquisition (throttled)
        if run_detection {
            detection_system(world, &mut ctx);
        }

        movement_system(world, &mut ctx, delta_seconds);
        combat_system(world, &mut ctx);
        death_system(world, &mut ctx);

        // Stalled agents (throttled)
        if run_recovery {
            recovery_system(world, &mut ctx);
        }

        if run_detection {
            self.last_detection_update = self.now;
        }
        if run_recovery {
            self.last_recovery_update = self.now;
        }
    }

    // ── Queries ────────────────────────────────────────────────────────

    pub fn status(&self, id: AgentId) -> Option<String> {
        let entity = self.roster.entity(id)?;
        status::describe(&self.world, &self.layout, &self.occupancy, entity)
    }

    pub fn agent_snapshot(&self, id: AgentId) -> Option<AgentSnapshot> {
        let entity = self.roster.entity(id)?;
        status::agent_snapshot(&self.world, &self.layout, &self.occupancy, entity)
    }

    pub fn room_snapshot(&self, id: RoomId) -> Option<RoomSnapshot> {
        status::room_snapshot(&self.layout, &self.occupancy, id)
    }

    /// Take every event queued since the last call.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        self.events.drain()
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn occupancy(&self) -> &OccupancyTable {
        &self.occupancy
    }

    pub fn nav(&self) -> &NavGraph {
        &self.nav
    }

    pub fn config(&self) -> &SimConfig {
        &self.cfg
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Entity backing an agent, including corpses still on the floor.
    pub fn entity(&self, id: AgentId) -> Option<Entity> {
        self.roster.entity(id)
    }

    pub fn living(&self) -> &[AgentId] {
        self.roster.living()
    }

    pub fn living_count(&self) -> usize {
        self.roster.living_count()
    }

    /// Simulation time in seconds
    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn hour(&self) -> Option<u8> {
        self.hour
    }

    /// Phase a resident is in, `None` for hostiles and before the first
    /// hourly tick.
    pub fn phase(&self, id: AgentId) -> Option<SchedulePhase> {
        let entity = self.roster.entity(id)?;
        self.world.get::<&Routine>(entity).ok()?.phase
    }

    pub fn position(&self, id: AgentId) -> Option<Vec2> {
        let entity = self.roster.entity(id)?;
        self.world.get::<&Position>(entity).ok().map(|p| p.0)
    }

    pub fn health(&self, id: AgentId) -> Option<f32> {
        let entity = self.roster.entity(id)?;
        self.world.get::<&Health>(entity).ok().map(|h| h.current)
    }

    pub fn action(&self, id: AgentId) -> Option<ActionState> {
        let entity = self.roster.entity(id)?;
        self.world.get::<&ActionState>(entity).ok().map(|s| (*s).clone())
    }
}

impl Default for ShelterSim {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelter_logic::agent::AgentKind;
    use shelter_logic::professions::Profession;

    fn starter() -> ShelterSim {
        let mut sim = ShelterSim::default();
        for (i, kind) in [
            RoomKind::Entrance,
            RoomKind::Quarters,
            RoomKind::DiningHall,
            RoomKind::Bathroom,
        ]
        .iter()
        .enumerate()
        {
            sim.add_room(*kind, kind.label(), Rect::new(i as f32 * 100.0, 0.0, 100.0, 60.0));
        }
        sim.drain_events();
        sim
    }

    #[test]
    fn test_engine_creation() {
        let sim = ShelterSim::default();
        assert_eq!(sim.living_count(), 0);
        assert_eq!(sim.now(), 0.0);
        assert!(sim.hour().is_none());
    }

    #[test]
    fn test_add_room_reports_layout_change() {
        let mut sim = starter();
        let id = sim.add_room(RoomKind::Kitchen, "Kitchen", Rect::new(400.0, 0.0, 100.0, 60.0));
        let events = sim.drain_events();
        assert!(events.contains(&SimEvent::LayoutChanged {
            added: Some(id),
            removed: None
        }));
        assert!(!sim.layout().room(id).unwrap().flags().powered);
    }

    #[test]
    fn test_entrance_cannot_be_demolished() {
        let mut sim = starter();
        assert_eq!(
            sim.remove_room(RoomId(0)).unwrap_err(),
            LayoutError::Indestructible(RoomId(0))
        );
    }

    #[test]
    fn test_spawn_rejects_duplicates() {
        let mut sim = starter();
        let cook = AgentKind::Resident(Profession::Cook);
        sim.spawn_agent(AgentSpec::new(1, "Ada", cook)).unwrap();
        assert_eq!(
            sim.spawn_agent(AgentSpec::new(1, "Ada", cook)),
            Err(AgentError::Duplicate(AgentId(1)))
        );
        assert_eq!(sim.position(AgentId(1)), Some(Vec2::new(50.0, 30.0)));
    }

    #[test]
    fn test_update_advances_clock() {
        let mut sim = starter();
        for _ in 0..60 {
            sim.update(1.0 / 60.0);
        }
        assert!((sim.now() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_health_delta_clamps() {
        let mut sim = starter();
        let cook = AgentKind::Resident(Profession::Cook);
        sim.spawn_agent(AgentSpec::new(1, "Ada", cook)).unwrap();
        assert_eq!(sim.apply_health_delta(AgentId(1), 50.0), Ok(100.0));
        assert_eq!(sim.apply_health_delta(AgentId(1), -30.0), Ok(70.0));
        assert_eq!(
            sim.apply_health_delta(AgentId(2), -1.0),
            Err(AgentError::Unknown(AgentId(2)))
        );
    }

    #[test]
    fn test_leaving_agent_departs_only_at_entrance() {
        let mut sim = starter();
        let kind = AgentKind::Resident(Profession::Scavenger);
        sim.spawn_agent(AgentSpec::new(3, "Ines", kind).at(Vec2::new(150.0, 30.0)))
            .unwrap();
        let entity = sim.entity(AgentId(3)).unwrap();
        sim.world.get::<&mut Routine>(entity).unwrap().presence = Presence::Leaving;
        *sim.world.get::<&mut ActionState>(entity).unwrap() =
            ActionState::Walking(Path::new([Vec2::new(180.0, 30.0)], RoomId(1)));
        sim.drain_events();

        for _ in 0..60 {
            sim.update(1.0 / 60.0);
        }
        assert_eq!(sim.action(AgentId(3)), Some(ActionState::Idle));
        assert_eq!(
            sim.world.get::<&Routine>(entity).unwrap().presence,
            Presence::Leaving
        );
        assert!(!sim.drain_events().contains(&SimEvent::AgentLeft(AgentId(3))));
    }

    #[test]
    fn test_external_kill_lands_before_detection() {
        let mut sim = starter();
        let kind = AgentKind::Resident(Profession::Cook);
        sim.spawn_agent(AgentSpec::new(1, "Ada", kind)).unwrap();
        sim.drain_events();

        sim.apply_health_delta(AgentId(1), -500.0).unwrap();
        sim.update(1.0 / 60.0);
        assert_eq!(sim.action(AgentId(1)), Some(ActionState::Dead));
        assert!(sim.drain_events().contains(&SimEvent::AgentDied(AgentId(1))));
        assert_eq!(sim.living_count(), 0);
    }
}
