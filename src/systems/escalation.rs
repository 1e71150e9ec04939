//! Siege escalation - per-defending-team battle-phase ratchet.
//!
//! Each tick the appropriate level is re-derived from current facts
//! (active breaches, casualties, hostile siege engines), but the stored
//! level only ever advances. A siege never de-escalates on its own;
//! `reset` is the sole way back down.

use crate::components::{Health, Position, Team, UnitRole};
use bevy_ecs::prelude::*;
use std::collections::HashMap;

/// Casualties a defender must suffer before the fight counts as begun.
const SIEGE_BEGUN_CASUALTIES: u32 = 10;
/// Breach count that marks a full assault on the castle.
const ASSAULT_BREACH_COUNT: usize = 3;
/// Casualties that, with any active breach, mark a full assault.
const ASSAULT_CASUALTIES: u32 = 25;
/// Casualties that, with any active breach, mark the final stand.
const FINAL_STAND_CASUALTIES: u32 = 40;

/// Ordered battle severity for a defending team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum EscalationLevel {
    #[default]
    Standoff,
    Skirmish,
    SiegeBegun,
    WallBreach,
    GateBreach,
    CastleAssault,
    FinalStand,
}

/// What was broken open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BreachKind {
    Wall,
    Gate,
}

/// A hole in a castle's defenses. Mutated only via seal/assign.
#[derive(Debug, Clone, Copy)]
pub struct Breach {
    pub kind: BreachKind,
    pub position: Position,
    pub defending_team: Team,
    pub created_at: f32,
    pub sealed: bool,
    pub defenders_assigned: u32,
}

/// Stable handle to a breach record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BreachId(pub usize);

/// Resource holding escalation levels and the facts they derive from.
#[derive(Resource, Debug, Default)]
pub struct SiegeState {
    levels: HashMap<Team, EscalationLevel>,
    breaches: Vec<Breach>,
    casualties: HashMap<Team, u32>,
    /// Hostile siege engines threatening each defending team, as counted
    /// by the per-tick census.
    census_engines: HashMap<Team, u32>,
    /// Manually pinned engine counts; these win over the census.
    engine_overrides: HashMap<Team, u32>,
}

impl SiegeState {
    /// Current (ratcheted) level for a defending team.
    pub fn level(&self, team: Team) -> EscalationLevel {
        self.levels.get(&team).copied().unwrap_or_default()
    }

    pub fn record_breach(
        &mut self,
        kind: BreachKind,
        position: Position,
        defending_team: Team,
        now: f32,
    ) -> BreachId {
        self.breaches.push(Breach {
            kind,
            position,
            defending_team,
            created_at: now,
            sealed: false,
            defenders_assigned: 0,
        });
        BreachId(self.breaches.len() - 1)
    }

    /// Mark a breach sealed. It leaves active queries but stays in history.
    pub fn seal_breach(&mut self, id: BreachId) {
        if let Some(breach) = self.breaches.get_mut(id.0) {
            breach.sealed = true;
        }
    }

    /// Count a defender toward a breach.
    pub fn assign_defender(&mut self, id: BreachId) {
        if let Some(breach) = self.breaches.get_mut(id.0) {
            breach.defenders_assigned += 1;
        }
    }

    pub fn breach(&self, id: BreachId) -> Option<&Breach> {
        self.breaches.get(id.0)
    }

    /// Unsealed breaches against a defending team.
    pub fn active_breaches(&self, team: Team) -> Vec<(BreachId, Breach)> {
        self.breaches
            .iter()
            .enumerate()
            .filter(|(_, b)| b.defending_team == team && !b.sealed)
            .map(|(i, b)| (BreachId(i), *b))
            .collect()
    }

    /// All breaches ever recorded against a team, sealed included.
    pub fn breach_history(&self, team: Team) -> Vec<Breach> {
        self.breaches
            .iter()
            .filter(|b| b.defending_team == team)
            .copied()
            .collect()
    }

    pub fn record_casualty(&mut self, team: Team) {
        *self.casualties.entry(team).or_insert(0) += 1;
    }

    pub fn casualties(&self, team: Team) -> u32 {
        self.casualties.get(&team).copied().unwrap_or(0)
    }

    /// Pin the hostile engine count for a defending team. The pinned
    /// value takes precedence over the per-tick census until cleared,
    /// for drivers whose siege engines are not ECS units.
    pub fn set_siege_engine_count(&mut self, defending_team: Team, count: u32) {
        self.engine_overrides.insert(defending_team, count);
    }

    /// Drop a pinned engine count; the census value applies again.
    pub fn clear_siege_engine_override(&mut self, defending_team: Team) {
        self.engine_overrides.remove(&defending_team);
    }

    /// Record the census count of hostile engines for a defending team.
    pub fn record_engine_census(&mut self, defending_team: Team, count: u32) {
        self.census_engines.insert(defending_team, count);
    }

    pub fn siege_engine_count(&self, defending_team: Team) -> u32 {
        self.engine_overrides
            .get(&defending_team)
            .or_else(|| self.census_engines.get(&defending_team))
            .copied()
            .unwrap_or(0)
    }

    /// Derive the level the current facts justify, ignoring the ratchet.
    pub fn calculate_escalation(&self, team: Team) -> EscalationLevel {
        let casualties = self.casualties(team);
        let engines = self.siege_engine_count(team);
        let active = self.active_breaches(team);
        let has_breach = !active.is_empty();
        let has_gate = active.iter().any(|(_, b)| b.kind == BreachKind::Gate);
        let has_wall = active.iter().any(|(_, b)| b.kind == BreachKind::Wall);

        if has_breach && casualties >= FINAL_STAND_CASUALTIES {
            EscalationLevel::FinalStand
        } else if active.len() >= ASSAULT_BREACH_COUNT
            || (has_breach && casualties >= ASSAULT_CASUALTIES)
        {
            EscalationLevel::CastleAssault
        } else if has_gate {
            EscalationLevel::GateBreach
        } else if has_wall {
            EscalationLevel::WallBreach
        } else if engines > 0 || casualties >= SIEGE_BEGUN_CASUALTIES {
            EscalationLevel::SiegeBegun
        } else if casualties > 0 {
            EscalationLevel::Skirmish
        } else {
            EscalationLevel::Standoff
        }
    }

    /// Advance the stored level if the derived level is strictly higher.
    /// Never retreats.
    pub fn update_level(&mut self, team: Team) -> EscalationLevel {
        let derived = self.calculate_escalation(team);
        let entry = self.levels.entry(team).or_default();
        if derived > *entry {
            *entry = derived;
        }
        *entry
    }

    /// Explicitly clear a team's level and facts back to a standoff.
    /// The team's breach records are sealed, not deleted; history and
    /// existing `BreachId` handles remain valid.
    pub fn reset(&mut self, team: Team) {
        self.levels.insert(team, EscalationLevel::Standoff);
        self.casualties.insert(team, 0);
        self.census_engines.insert(team, 0);
        self.engine_overrides.remove(&team);
        for breach in self.breaches.iter_mut() {
            if breach.defending_team == team {
                breach.sealed = true;
            }
        }
    }

    // AI-facing gates

    /// Attackers focus siege engines while the siege is forming up.
    pub fn should_prioritize_siege_engines(&self, team: Team) -> bool {
        matches!(
            self.level(team),
            EscalationLevel::Skirmish | EscalationLevel::SiegeBegun
        )
    }

    /// Units pour through once a wall or gate is open.
    pub fn should_rush_to_breach(&self, team: Team) -> bool {
        self.level(team) >= EscalationLevel::WallBreach
    }

    /// The defending commander pulls back once the castle is under assault.
    pub fn commander_should_retreat(&self, team: Team) -> bool {
        self.level(team) >= EscalationLevel::CastleAssault
    }

    /// Every defender rallies to the commander only at the final stand.
    pub fn should_rally_to_commander(&self, team: Team) -> bool {
        self.level(team) == EscalationLevel::FinalStand
    }
}

/// System that counts living hostile siege engines per defending team.
pub fn siege_engine_census_system(
    mut state: ResMut<SiegeState>,
    query: Query<(&Team, &UnitRole, &Health)>,
) {
    let mut white_engines = 0;
    let mut black_engines = 0;
    for (team, role, health) in query.iter() {
        if *role == UnitRole::SiegeEngine && health.is_alive() {
            match team {
                Team::White => white_engines += 1,
                Team::Black => black_engines += 1,
            }
        }
    }
    // A team's engines threaten the opposing defenders
    state.record_engine_census(Team::White, black_engines);
    state.record_engine_census(Team::Black, white_engines);
}

/// System that advances each team's ratchet from current facts.
pub fn escalation_update_system(mut state: ResMut<SiegeState>) {
    state.update_level(Team::White);
    state.update_level(Team::Black);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(EscalationLevel::Standoff < EscalationLevel::Skirmish);
        assert!(EscalationLevel::Skirmish < EscalationLevel::SiegeBegun);
        assert!(EscalationLevel::SiegeBegun < EscalationLevel::WallBreach);
        assert!(EscalationLevel::WallBreach < EscalationLevel::GateBreach);
        assert!(EscalationLevel::GateBreach < EscalationLevel::CastleAssault);
        assert!(EscalationLevel::CastleAssault < EscalationLevel::FinalStand);
    }

    #[test]
    fn test_derivation_from_facts() {
        let mut state = SiegeState::default();
        assert_eq!(state.calculate_escalation(Team::White), EscalationLevel::Standoff);

        state.record_casualty(Team::White);
        assert_eq!(state.calculate_escalation(Team::White), EscalationLevel::Skirmish);

        state.set_siege_engine_count(Team::White, 2);
        assert_eq!(state.calculate_escalation(Team::White), EscalationLevel::SiegeBegun);

        let wall = state.record_breach(BreachKind::Wall, Position::default(), Team::White, 0.0);
        assert_eq!(state.calculate_escalation(Team::White), EscalationLevel::WallBreach);

        let gate = state.record_breach(BreachKind::Gate, Position::default(), Team::White, 1.0);
        assert_eq!(state.calculate_escalation(Team::White), EscalationLevel::GateBreach);

        // Sealing the gate drops the derived level back to the wall breach
        state.seal_breach(gate);
        assert_eq!(state.calculate_escalation(Team::White), EscalationLevel::WallBreach);
        let _ = wall;
    }

    #[test]
    fn test_casualties_escalate_breaches() {
        let mut state = SiegeState::default();
        state.record_breach(BreachKind::Wall, Position::default(), Team::White, 0.0);
        for _ in 0..ASSAULT_CASUALTIES {
            state.record_casualty(Team::White);
        }
        assert_eq!(state.calculate_escalation(Team::White), EscalationLevel::CastleAssault);

        for _ in 0..(FINAL_STAND_CASUALTIES - ASSAULT_CASUALTIES) {
            state.record_casualty(Team::White);
        }
        assert_eq!(state.calculate_escalation(Team::White), EscalationLevel::FinalStand);
    }

    #[test]
    fn test_three_breaches_mean_assault() {
        let mut state = SiegeState::default();
        for _ in 0..3 {
            state.record_breach(BreachKind::Wall, Position::default(), Team::Black, 0.0);
        }
        assert_eq!(state.calculate_escalation(Team::Black), EscalationLevel::CastleAssault);
    }

    #[test]
    fn test_ratchet_never_retreats() {
        let mut state = SiegeState::default();
        let gate = state.record_breach(BreachKind::Gate, Position::default(), Team::White, 0.0);
        state.update_level(Team::White);
        assert_eq!(state.level(Team::White), EscalationLevel::GateBreach);

        // Facts become less severe; level holds
        state.seal_breach(gate);
        for _ in 0..10 {
            state.update_level(Team::White);
        }
        assert_eq!(state.level(Team::White), EscalationLevel::GateBreach);

        // Only reset goes down
        state.reset(Team::White);
        assert_eq!(state.level(Team::White), EscalationLevel::Standoff);
    }

    #[test]
    fn test_teams_are_independent() {
        let mut state = SiegeState::default();
        state.record_breach(BreachKind::Gate, Position::default(), Team::White, 0.0);
        state.update_level(Team::White);
        state.update_level(Team::Black);
        assert_eq!(state.level(Team::White), EscalationLevel::GateBreach);
        assert_eq!(state.level(Team::Black), EscalationLevel::Standoff);
    }

    #[test]
    fn test_sealed_breach_stays_in_history() {
        let mut state = SiegeState::default();
        let id = state.record_breach(BreachKind::Wall, Position::default(), Team::White, 0.0);
        state.seal_breach(id);
        assert!(state.active_breaches(Team::White).is_empty());
        assert_eq!(state.breach_history(Team::White).len(), 1);
        assert!(state.breach_history(Team::White)[0].sealed);
    }

    #[test]
    fn test_assign_defender() {
        let mut state = SiegeState::default();
        let id = state.record_breach(BreachKind::Wall, Position::default(), Team::White, 0.0);
        state.assign_defender(id);
        state.assign_defender(id);
        assert_eq!(state.breach(id).unwrap().defenders_assigned, 2);
    }

    #[test]
    fn test_ai_gates() {
        let mut state = SiegeState::default();

        state.record_casualty(Team::White);
        state.update_level(Team::White);
        assert!(state.should_prioritize_siege_engines(Team::White));
        assert!(!state.should_rush_to_breach(Team::White));

        state.record_breach(BreachKind::Wall, Position::default(), Team::White, 0.0);
        state.update_level(Team::White);
        assert!(!state.should_prioritize_siege_engines(Team::White));
        assert!(state.should_rush_to_breach(Team::White));
        assert!(!state.commander_should_retreat(Team::White));

        for _ in 0..ASSAULT_CASUALTIES {
            state.record_casualty(Team::White);
        }
        state.update_level(Team::White);
        assert!(state.commander_should_retreat(Team::White));
        assert!(!state.should_rally_to_commander(Team::White));

        for _ in 0..FINAL_STAND_CASUALTIES {
            state.record_casualty(Team::White);
        }
        state.update_level(Team::White);
        assert!(state.should_rally_to_commander(Team::White));
    }

    #[test]
    fn test_pinned_engine_count_survives_census() {
        let mut world = World::new();
        let mut state = SiegeState::default();
        state.set_siege_engine_count(Team::White, 3);
        world.insert_resource(state);

        // No SiegeEngine entities exist, so the census counts zero
        let mut schedule = Schedule::default();
        schedule.add_systems((siege_engine_census_system, escalation_update_system).chain());
        schedule.run(&mut world);

        {
            let state = world.resource::<SiegeState>();
            assert_eq!(state.siege_engine_count(Team::White), 3);
            assert_eq!(state.level(Team::White), EscalationLevel::SiegeBegun);
        }

        // Dropping the pin hands the count back to the census
        world
            .resource_mut::<SiegeState>()
            .clear_siege_engine_override(Team::White);
        schedule.run(&mut world);
        let state = world.resource::<SiegeState>();
        assert_eq!(state.siege_engine_count(Team::White), 0);
        // The ratchet holds even though the engines are gone
        assert_eq!(state.level(Team::White), EscalationLevel::SiegeBegun);
    }

    #[test]
    fn test_system_ratchets_both_teams() {
        let mut world = World::new();
        let mut state = SiegeState::default();
        state.record_breach(BreachKind::Gate, Position::default(), Team::Black, 0.0);
        world.insert_resource(state);

        let mut schedule = Schedule::default();
        schedule.add_systems(escalation_update_system);
        schedule.run(&mut world);

        let state = world.resource::<SiegeState>();
        assert_eq!(state.level(Team::Black), EscalationLevel::GateBreach);
        assert_eq!(state.level(Team::White), EscalationLevel::Standoff);
    }
}
