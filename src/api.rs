//! Public API for the simulation.
//!
//! `SimWorld` owns the ECS world and schedule, exposing the coordination
//! layer to the driving game loop: spawn units, resolve attacks, emit
//! sounds, file sightings, broadcast alerts, record siege facts, and read
//! the derived state back per unit or per team.
//!
//! ## Fixed Timestep
//!
//! The simulation uses a fixed timestep internally (default 30 Hz). When
//! `step(dt)` is called, time accumulates and fixed updates run as needed,
//! so behavior is deterministic regardless of frame rate. Within one fixed
//! update all coordination systems complete, in dependency order, before
//! callers read anything - a unit's decision always sees this tick's
//! propagated alerts, sightings, and morale.

use crate::components::*;
use crate::spatial::{spatial_grid_update_system, SpatialGrid};
use crate::systems::*;
use crate::voxel::{has_line_of_sight, VoxelGrid, VoxelResource, LOS_MAX_RANGE};
use crate::world::Snapshot;
use bevy_ecs::prelude::*;

/// The main simulation world container.
pub struct SimWorld {
    world: World,
    schedule: Schedule,
    tick: u64,
    time: f32,
    /// Accumulated time for fixed timestep.
    time_accumulator: f32,
    next_unit_id: u32,
}

impl SimWorld {
    /// Create a new empty simulation world.
    pub fn new() -> Self {
        Self::with_config(SimConfig::default())
    }

    /// Create a new simulation world with custom configuration.
    pub fn with_config(config: SimConfig) -> Self {
        let mut world = World::new();

        world.insert_resource(DeltaTime(config.fixed_timestep));
        world.insert_resource(SimTime(0.0));
        world.insert_resource(SpatialGrid::new(16.0));
        world.insert_resource(SoundField::default());
        world.insert_resource(SightingBoard::new(config.rng_seed));
        world.insert_resource(AlertNet::default());
        world.insert_resource(MoraleTracker::default());
        world.insert_resource(SiegeState::default());
        world.insert_resource(FormationRegistry::default());
        world.insert_resource(config);

        // Coordination systems run in dependency order, leaves first.
        let mut schedule = Schedule::default();
        schedule.add_systems(spatial_grid_update_system);
        schedule.add_systems(
            (
                poise_regen_system,
                stagger_update_system,
                sound_sweep_system,
                sighting_relay_system,
                alert_sweep_system,
                morale_regression_system,
                siege_engine_census_system,
                escalation_update_system,
            )
                .chain()
                .after(spatial_grid_update_system),
        );

        Self {
            world,
            schedule,
            tick: 0,
            time: 0.0,
            time_accumulator: 0.0,
            next_unit_id: 0,
        }
    }

    /// Create a simulation world with a voxel grid for occlusion and
    /// line-of-sight queries.
    pub fn with_grid(config: SimConfig, grid: VoxelGrid) -> Self {
        let mut sim = Self::with_config(config);
        sim.world.insert_resource(VoxelResource::new(grid));
        sim
    }

    /// Step the simulation forward by `dt` seconds, running as many fixed
    /// updates as the accumulated time allows.
    pub fn step(&mut self, dt: f32) {
        let fixed_dt = self
            .world
            .get_resource::<SimConfig>()
            .map(|c| c.fixed_timestep)
            .unwrap_or(1.0 / 30.0);

        self.time_accumulator += dt;
        while self.time_accumulator >= fixed_dt {
            self.fixed_update(fixed_dt);
            self.time_accumulator -= fixed_dt;
        }
    }

    fn fixed_update(&mut self, dt: f32) {
        if let Some(mut dt_res) = self.world.get_resource_mut::<DeltaTime>() {
            dt_res.0 = dt;
        }
        self.time += dt;
        if let Some(mut time_res) = self.world.get_resource_mut::<SimTime>() {
            time_res.0 = self.time;
        }
        self.schedule.run(&mut self.world);
        self.tick += 1;
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    pub fn current_time(&self) -> f32 {
        self.time
    }

    // ------------------------------------------------------------------
    // Units
    // ------------------------------------------------------------------

    /// Spawn a unit and return its id.
    pub fn spawn_unit(&mut self, team: Team, role: UnitRole, x: f32, y: f32, z: f32) -> UnitId {
        let id = self.next_unit_id;
        self.next_unit_id += 1;
        self.world.spawn(UnitBundle::new(id, team, role, x, y, z));
        UnitId(id)
    }

    /// Entity handle for a unit id.
    pub fn entity_of(&mut self, unit: UnitId) -> Option<Entity> {
        let mut query = self.world.query::<(Entity, &UnitId)>();
        query
            .iter(&self.world)
            .find(|(_, id)| **id == unit)
            .map(|(e, _)| e)
    }

    /// Read-only views of every unit, used by army-wide operations.
    pub fn unit_views(&mut self) -> Vec<UnitView> {
        let mut query = self
            .world
            .query::<(Entity, &UnitId, &Team, &UnitRole, &Position, &Health)>();
        query
            .iter(&self.world)
            .map(|(entity, id, team, role, position, health)| UnitView {
                entity,
                id: *id,
                team: *team,
                role: *role,
                position: *position,
                alive: health.is_alive(),
            })
            .collect()
    }

    pub fn set_position(&mut self, unit: UnitId, x: f32, y: f32, z: f32) {
        if let Some(entity) = self.entity_of(unit) {
            if let Some(mut pos) = self.world.get_mut::<Position>(entity) {
                *pos = Position::new(x, y, z);
            }
        }
    }

    pub fn set_facing(&mut self, unit: UnitId, x: f32, y: f32, z: f32) {
        if let Some(entity) = self.entity_of(unit) {
            if let Some(mut facing) = self.world.get_mut::<Facing>(entity) {
                *facing = Facing::new(x, y, z);
            }
        }
    }

    pub fn is_alive(&mut self, unit: UnitId) -> bool {
        self.entity_of(unit)
            .and_then(|e| self.world.get::<Health>(e))
            .map(|h| h.is_alive())
            .unwrap_or(false)
    }

    pub fn is_staggered(&mut self, unit: UnitId) -> bool {
        self.entity_of(unit)
            .and_then(|e| self.world.get::<StaggerState>(e))
            .map(|s| s.is_staggered())
            .unwrap_or(false)
    }

    /// Kill a unit outright, recording the casualty and the morale hit on
    /// nearby allies. A commander's death raises the louder event and a
    /// team-wide alert.
    pub fn kill_unit(&mut self, unit: UnitId) {
        let Some(entity) = self.entity_of(unit) else {
            return;
        };
        let Some((team, role, position)) = self
            .world
            .get::<Team>(entity)
            .copied()
            .zip(self.world.get::<UnitRole>(entity).copied())
            .zip(self.world.get::<Position>(entity).copied())
            .map(|((t, r), p)| (t, r, p))
        else {
            return;
        };

        if let Some(mut health) = self.world.get_mut::<Health>(entity) {
            if !health.is_alive() {
                return;
            }
            health.current = 0.0;
        }

        self.on_unit_death(entity, team, role, position);
    }

    fn on_unit_death(&mut self, entity: Entity, team: Team, role: UnitRole, position: Position) {
        let now = self.time;
        let views = self.unit_views();

        if let Some(mut siege) = self.world.get_resource_mut::<SiegeState>() {
            siege.record_casualty(team);
        }

        let kind = if role == UnitRole::Commander {
            MoraleEventKind::CommanderDeath
        } else {
            MoraleEventKind::AllyDeath
        };
        if let Some(mut morale) = self.world.get_resource_mut::<MoraleTracker>() {
            morale.record_event(kind, position, team, Some(entity), &views);
        }

        if role == UnitRole::Commander {
            if let Some(mut net) = self.world.get_resource_mut::<AlertNet>() {
                net.broadcast_alert(entity, team, AlertType::CommanderDown, position, None, now);
            }
        }
    }

    // ------------------------------------------------------------------
    // Combat
    // ------------------------------------------------------------------

    /// Resolve a melee/ranged attack from one unit against another:
    /// damage table, positional modifiers, poise, and stagger. Deaths
    /// feed the casualty count and morale. `poise_damage` defaults to
    /// half the final HP damage. Returns `None` if either unit is
    /// missing or dead.
    pub fn resolve_attack(
        &mut self,
        attacker: UnitId,
        target: UnitId,
        base_damage: f32,
        damage_type: DamageType,
        is_charging: bool,
        poise_damage: Option<f32>,
    ) -> Option<CombatResult> {
        let attacker_entity = self.entity_of(attacker)?;
        let target_entity = self.entity_of(target)?;

        let attacker_ctx = AttackerContext {
            position: *self.world.get::<Position>(attacker_entity)?,
            attack_range: self.world.get::<AttackProfile>(attacker_entity)?.range,
        };
        if !self.world.get::<Health>(attacker_entity)?.is_alive() {
            return None;
        }

        let target_ctx = TargetContext {
            position: *self.world.get::<Position>(target_entity)?,
            facing: *self.world.get::<Facing>(target_entity)?,
            staggered: self.world.get::<StaggerState>(target_entity)?.is_staggered(),
        };
        let armor = *self.world.get::<ArmorClass>(target_entity)?;
        let mut health = *self.world.get::<Health>(target_entity)?;
        if !health.is_alive() {
            return None;
        }
        let mut poise = *self.world.get::<Poise>(target_entity)?;
        let mut stagger = *self.world.get::<StaggerState>(target_entity)?;

        let damage = calculate_damage(
            base_damage,
            damage_type,
            armor,
            Some(&attacker_ctx),
            Some(&target_ctx),
            is_charging,
        );
        let result = apply_damage(&mut health, &mut poise, &mut stagger, damage, poise_damage);

        *self.world.get_mut::<Health>(target_entity)? = health;
        *self.world.get_mut::<Poise>(target_entity)? = poise;
        *self.world.get_mut::<StaggerState>(target_entity)? = stagger;

        if result.killed {
            let team = *self.world.get::<Team>(target_entity)?;
            let role = *self.world.get::<UnitRole>(target_entity)?;
            self.on_unit_death(target_entity, team, role, target_ctx.position);
        }

        Some(result)
    }

    /// Apply area damage with linear falloff around a center point.
    /// The source unit, dead units, and units outside the radius are
    /// untouched. Returns the number of units hit.
    pub fn apply_aoe_damage(
        &mut self,
        center: Position,
        radius: f32,
        base_damage: f32,
        damage_type: DamageType,
        source: Option<UnitId>,
    ) -> usize {
        let source_entity = source.and_then(|s| self.entity_of(s));

        let mut query = self.world.query::<(Entity, &Position, &Health)>();
        let candidates: Vec<(Entity, f32)> = query
            .iter(&self.world)
            .filter(|(entity, _, health)| health.is_alive() && Some(*entity) != source_entity)
            .map(|(entity, pos, _)| (entity, pos.distance_to(&center)))
            .filter(|(_, dist)| *dist < radius)
            .collect();

        let mut hits = 0;
        let mut deaths = Vec::new();
        for (entity, dist) in candidates {
            let damage = aoe_damage_at(dist, radius, base_damage, damage_type);
            if damage <= 0.0 {
                continue;
            }
            let Some(mut h) = self.world.get::<Health>(entity).copied() else {
                continue;
            };
            let mut p = self.world.get::<Poise>(entity).copied().unwrap_or_default();
            let mut s = self
                .world
                .get::<StaggerState>(entity)
                .copied()
                .unwrap_or_default();
            let result = apply_damage(&mut h, &mut p, &mut s, damage, None);
            if let Some(mut health) = self.world.get_mut::<Health>(entity) {
                *health = h;
            }
            if let Some(mut poise) = self.world.get_mut::<Poise>(entity) {
                *poise = p;
            }
            if let Some(mut stagger) = self.world.get_mut::<StaggerState>(entity) {
                *stagger = s;
            }
            hits += 1;
            if result.killed {
                deaths.push(entity);
            }
        }

        for entity in deaths {
            if let (Some(team), Some(role), Some(position)) = (
                self.world.get::<Team>(entity).copied(),
                self.world.get::<UnitRole>(entity).copied(),
                self.world.get::<Position>(entity).copied(),
            ) {
                self.on_unit_death(entity, team, role, position);
            }
        }

        hits
    }

    // ------------------------------------------------------------------
    // Sound
    // ------------------------------------------------------------------

    /// Emit a sound at a position, optionally attributed to a unit.
    pub fn emit_sound(
        &mut self,
        kind: SoundType,
        position: Position,
        source: Option<UnitId>,
        intensity: f32,
    ) {
        let now = self.time;
        let source_entity = source.and_then(|s| self.entity_of(s));
        let team = source_entity.and_then(|e| self.world.get::<Team>(e).copied());
        if let Some(mut field) = self.world.get_resource_mut::<SoundField>() {
            field.emit(kind, position, source_entity, team, intensity, now);
        }
    }

    /// Full occlusion-aware sound intensity at a position.
    pub fn sound_intensity_at(&self, event: &SoundEvent, listener: Position) -> f32 {
        match self.world.get_resource::<VoxelResource>() {
            Some(grid) => intensity_at(event, &listener, grid),
            None => estimate_intensity(event, &listener),
        }
    }

    pub fn register_sound_listener(&mut self, listener: Box<dyn SoundListener>) {
        if let Some(mut field) = self.world.get_resource_mut::<SoundField>() {
            field.register_listener(listener);
        }
    }

    // ------------------------------------------------------------------
    // Sightings
    // ------------------------------------------------------------------

    /// File a first-hand sighting of `target` by `spotter` and start the
    /// relay chain toward allies in visual range with line of sight.
    pub fn report_sighting(
        &mut self,
        spotter: UnitId,
        target: UnitId,
        kind: SightingKind,
    ) -> Option<Sighting> {
        let now = self.time;
        let spotter_entity = self.entity_of(spotter)?;
        let target_entity = self.entity_of(target)?;
        let spotter_pos = *self.world.get::<Position>(spotter_entity)?;
        let team = *self.world.get::<Team>(spotter_entity)?;
        let target_pos = *self.world.get::<Position>(target_entity)?;

        let visual_range = self
            .world
            .get_resource::<SimConfig>()
            .map(|c| c.visual_range)
            .unwrap_or(24.0);

        let views = self.unit_views();
        let grid = self.world.get_resource::<VoxelResource>().cloned();
        let allies: Vec<Entity> = views
            .iter()
            .filter(|u| {
                u.alive
                    && u.team == team
                    && u.entity != spotter_entity
                    && u.position.distance_to(&spotter_pos) <= visual_range
                    && grid
                        .as_ref()
                        .map(|g| has_line_of_sight(g, &spotter_pos, &u.position, LOS_MAX_RANGE))
                        .unwrap_or(true)
            })
            .map(|u| u.entity)
            .collect();

        let mut board = self.world.get_resource_mut::<SightingBoard>()?;
        Some(board.report(kind, spotter_entity, target_entity, target_pos, team, &allies, now))
    }

    pub fn sightings_for_team(&self, team: Team) -> Vec<Sighting> {
        self.world
            .get_resource::<SightingBoard>()
            .map(|b| b.sightings_for_team(team, self.time))
            .unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // Alerts and commands
    // ------------------------------------------------------------------

    pub fn broadcast_alert(
        &mut self,
        source: UnitId,
        kind: AlertType,
        position: Position,
        target: Option<UnitId>,
    ) {
        let now = self.time;
        let Some(source_entity) = self.entity_of(source) else {
            return;
        };
        let Some(team) = self.world.get::<Team>(source_entity).copied() else {
            return;
        };
        let target_entity = target.and_then(|t| self.entity_of(t));
        if let Some(mut net) = self.world.get_resource_mut::<AlertNet>() {
            net.broadcast_alert(source_entity, team, kind, position, target_entity, now);
        }
    }

    pub fn issue_command(
        &mut self,
        commander: UnitId,
        kind: CommandKind,
        targets: &[UnitId],
        position: Option<Position>,
    ) {
        let now = self.time;
        let Some(commander_entity) = self.entity_of(commander) else {
            return;
        };
        let target_entities: Vec<Entity> =
            targets.iter().filter_map(|t| self.entity_of(*t)).collect();
        if let Some(mut net) = self.world.get_resource_mut::<AlertNet>() {
            net.issue_command(commander_entity, kind, target_entities, position, now);
        }
    }

    /// Command every living ally within `radius` of the commander.
    /// Returns how many units were targeted.
    pub fn issue_area_command(
        &mut self,
        commander: UnitId,
        kind: CommandKind,
        radius: f32,
        position: Option<Position>,
    ) -> usize {
        let now = self.time;
        let Some(commander_entity) = self.entity_of(commander) else {
            return 0;
        };
        let Some((team, commander_pos)) = self
            .world
            .get::<Team>(commander_entity)
            .copied()
            .zip(self.world.get::<Position>(commander_entity).copied())
        else {
            return 0;
        };
        let views = self.unit_views();
        let Some(mut net) = self.world.get_resource_mut::<AlertNet>() else {
            return 0;
        };
        net.issue_area_command(
            commander_entity,
            team,
            commander_pos,
            kind,
            radius,
            &views,
            position,
            now,
        )
    }

    pub fn alerts_near(&self, team: Team, position: Position, radius: f32) -> Vec<Alert> {
        self.world
            .get_resource::<AlertNet>()
            .map(|n| n.alerts_near(team, position, radius, self.time))
            .unwrap_or_default()
    }

    pub fn register_alert_listener(&mut self, listener: Box<dyn AlertListener>) {
        if let Some(mut net) = self.world.get_resource_mut::<AlertNet>() {
            net.register_listener(listener);
        }
    }

    // ------------------------------------------------------------------
    // Morale
    // ------------------------------------------------------------------

    /// Record a morale event affecting a team's units around a position.
    pub fn record_morale_event(
        &mut self,
        kind: MoraleEventKind,
        position: Position,
        affected_team: Team,
    ) {
        let views = self.unit_views();
        if let Some(mut tracker) = self.world.get_resource_mut::<MoraleTracker>() {
            tracker.record_event(kind, position, affected_team, None, &views);
        }
    }

    pub fn morale_of(&self, unit: UnitId) -> f32 {
        self.world
            .get_resource::<MoraleTracker>()
            .map(|t| t.morale_of(unit))
            .unwrap_or(MORALE_BASELINE)
    }

    pub fn morale_state_of(&self, unit: UnitId) -> MoraleState {
        MoraleState::from_value(self.morale_of(unit))
    }

    /// Morale including the commander-proximity bonus.
    pub fn effective_morale_of(&mut self, unit: UnitId) -> f32 {
        let aura_radius = self
            .world
            .get_resource::<SimConfig>()
            .map(|c| c.commander_aura_radius)
            .unwrap_or(12.0);
        let views = self.unit_views();
        let Some(view) = views.iter().find(|v| v.id == unit).copied() else {
            return MORALE_BASELINE;
        };
        self.world
            .get_resource::<MoraleTracker>()
            .map(|t| t.effective_morale(&view, &views, aura_radius))
            .unwrap_or(MORALE_BASELINE)
    }

    pub fn team_morale(&self, team: Team) -> f32 {
        self.world
            .get_resource::<MoraleTracker>()
            .map(|t| t.team_morale(team))
            .unwrap_or(MORALE_BASELINE)
    }

    // ------------------------------------------------------------------
    // Siege escalation
    // ------------------------------------------------------------------

    pub fn record_breach(&mut self, kind: BreachKind, position: Position, defending_team: Team) -> BreachId {
        let now = self.time;
        let mut siege = self.world.resource_mut::<SiegeState>();
        siege.record_breach(kind, position, defending_team, now)
    }

    pub fn seal_breach(&mut self, id: BreachId) {
        self.world.resource_mut::<SiegeState>().seal_breach(id);
    }

    pub fn assign_breach_defender(&mut self, id: BreachId) {
        self.world.resource_mut::<SiegeState>().assign_defender(id);
    }

    pub fn escalation_of(&self, team: Team) -> EscalationLevel {
        self.world
            .get_resource::<SiegeState>()
            .map(|s| s.level(team))
            .unwrap_or_default()
    }

    pub fn should_rush_to_breach(&self, team: Team) -> bool {
        self.world
            .get_resource::<SiegeState>()
            .map(|s| s.should_rush_to_breach(team))
            .unwrap_or(false)
    }

    pub fn should_prioritize_siege_engines(&self, team: Team) -> bool {
        self.world
            .get_resource::<SiegeState>()
            .map(|s| s.should_prioritize_siege_engines(team))
            .unwrap_or(false)
    }

    pub fn commander_should_retreat(&self, team: Team) -> bool {
        self.world
            .get_resource::<SiegeState>()
            .map(|s| s.commander_should_retreat(team))
            .unwrap_or(false)
    }

    pub fn should_rally_to_commander(&self, team: Team) -> bool {
        self.world
            .get_resource::<SiegeState>()
            .map(|s| s.should_rally_to_commander(team))
            .unwrap_or(false)
    }

    /// Pin the hostile engine count threatening a defending team. The
    /// pinned value takes precedence over the per-tick census of living
    /// `SiegeEngine` units, for engines the driver models outside the ECS.
    pub fn set_siege_engine_count(&mut self, defending_team: Team, count: u32) {
        self.world
            .resource_mut::<SiegeState>()
            .set_siege_engine_count(defending_team, count);
    }

    /// Drop a pinned engine count; the census applies again.
    pub fn clear_siege_engine_override(&mut self, defending_team: Team) {
        self.world
            .resource_mut::<SiegeState>()
            .clear_siege_engine_override(defending_team);
    }

    pub fn siege_engine_count(&self, defending_team: Team) -> u32 {
        self.world
            .get_resource::<SiegeState>()
            .map(|s| s.siege_engine_count(defending_team))
            .unwrap_or(0)
    }

    pub fn reset_escalation(&mut self, team: Team) {
        self.world.resource_mut::<SiegeState>().reset(team);
    }

    // ------------------------------------------------------------------
    // Formations
    // ------------------------------------------------------------------

    /// Create a formation and assign the given units as its members, in
    /// slot order.
    pub fn create_formation(
        &mut self,
        formation_type: FormationType,
        center: Position,
        facing: Facing,
        members: &[UnitId],
    ) -> FormationId {
        let member_entities: Vec<Entity> =
            members.iter().filter_map(|m| self.entity_of(*m)).collect();

        let id = {
            let mut registry = self.world.resource_mut::<FormationRegistry>();
            let id = registry.create(formation_type, center, facing);
            if let Some(formation) = registry.get_mut(id) {
                for entity in &member_entities {
                    formation.add_member(*entity);
                }
            }
            id
        };

        for (slot, entity) in member_entities.iter().enumerate() {
            self.world.entity_mut(*entity).insert(FormationAssignment {
                formation: id,
                slot: Some(slot),
            });
        }

        id
    }

    /// Remove a unit from its formation. The remaining members keep
    /// their order and are reassigned compacted slot indices, so every
    /// assigned slot stays `< member count`.
    pub fn remove_from_formation(&mut self, unit: UnitId) {
        let Some(entity) = self.entity_of(unit) else {
            return;
        };
        let Some(assignment) = self.world.get::<FormationAssignment>(entity).copied() else {
            return;
        };

        let remaining = {
            let mut registry = self.world.resource_mut::<FormationRegistry>();
            match registry.get_mut(assignment.formation) {
                Some(formation) => {
                    formation.remove_member(entity);
                    formation.members().to_vec()
                }
                None => Vec::new(),
            }
        };

        self.world.entity_mut(entity).remove::<FormationAssignment>();
        for (slot, member) in remaining.iter().enumerate() {
            if let Some(mut a) = self.world.get_mut::<FormationAssignment>(*member) {
                a.slot = Some(slot);
            }
        }
    }

    /// Target position for a unit's formation slot.
    pub fn formation_slot_of(&mut self, unit: UnitId) -> Option<Position> {
        let entity = self.entity_of(unit)?;
        let assignment = *self.world.get::<FormationAssignment>(entity)?;
        let slot = assignment.slot?;
        let mut registry = self.world.resource_mut::<FormationRegistry>();
        registry.get_mut(assignment.formation)?.slot_for(slot)
    }

    /// True iff every member of the formation is within `tolerance` of
    /// its slot.
    pub fn is_formation_intact(&mut self, id: FormationId, tolerance: f32) -> bool {
        let members = match self
            .world
            .get_resource::<FormationRegistry>()
            .and_then(|r| r.get(id))
        {
            Some(f) => f.members().to_vec(),
            None => return false,
        };
        let positions: Vec<Option<Position>> = members
            .iter()
            .map(|e| self.world.get::<Position>(*e).copied())
            .collect();
        let mut registry = self.world.resource_mut::<FormationRegistry>();
        match registry.get_mut(id) {
            Some(f) => f.is_intact(tolerance, &positions),
            None => false,
        }
    }

    // ------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------

    /// Get a snapshot of the current simulation state.
    pub fn snapshot(&mut self) -> Snapshot {
        Snapshot::from_world(&mut self.world, self.tick, self.time)
    }

    /// Get the snapshot as a JSON string.
    pub fn snapshot_json(&mut self) -> String {
        self.snapshot().to_json().unwrap_or_else(|_| "{}".to_string())
    }

    /// Get direct access to the ECS world (for advanced usage).
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Get mutable access to the ECS world (for advanced usage).
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new()
    }
}
