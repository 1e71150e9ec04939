//! Environmental awareness - per-unit and per-team morale.
//!
//! Morale is a scalar in [0, 1], defaulting to 0.5. Events apply
//! distance-weighted deltas to units of the affected team (Victory/Defeat
//! also hit the opposing team with the negated, halved effect), and a
//! heavily damped copy adjusts the per-team aggregate. Each tick morale
//! drifts back toward the baseline, faster upward than downward.

use crate::components::{Position, Team, UnitId, UnitRole, UnitView};
use crate::systems::DeltaTime;
use bevy_ecs::prelude::*;
use std::collections::HashMap;

/// Resting morale value; passive regression drifts toward this.
pub const MORALE_BASELINE: f32 = 0.5;
/// Upward drift rate per second; downward drift is half this.
const REGRESSION_RATE: f32 = 0.02;
/// Damping applied to the per-team aggregate adjustment.
const TEAM_DAMPING: f32 = 0.3;
/// Flat bonus when a living allied commander is nearby.
const COMMANDER_AURA_BONUS: f32 = 0.2;

/// Morale bands derived from the scalar value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoraleState {
    Broken,
    Low,
    Normal,
    High,
}

impl MoraleState {
    /// Band thresholds: Broken <= 0.15 < Low <= 0.3 < Normal < 0.7 <= High.
    pub fn from_value(value: f32) -> Self {
        if value <= 0.15 {
            MoraleState::Broken
        } else if value <= 0.3 {
            MoraleState::Low
        } else if value < 0.7 {
            MoraleState::Normal
        } else {
            MoraleState::High
        }
    }

    pub fn damage_multiplier(&self) -> f32 {
        match self {
            MoraleState::High => 1.2,
            MoraleState::Normal => 1.0,
            MoraleState::Low => 0.8,
            MoraleState::Broken => 0.6,
        }
    }

    pub fn speed_multiplier(&self) -> f32 {
        match self {
            MoraleState::High => 1.1,
            MoraleState::Normal => 1.0,
            MoraleState::Low => 0.9,
            MoraleState::Broken => 0.8,
        }
    }
}

/// Events that move morale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoraleEventKind {
    AllyDeath,
    EnemyDeath,
    Victory,
    Defeat,
    Rally,
    CommanderDeath,
}

impl MoraleEventKind {
    /// Signed morale impact at zero distance.
    pub fn impact(&self) -> f32 {
        match self {
            MoraleEventKind::AllyDeath => -0.15,
            MoraleEventKind::EnemyDeath => 0.1,
            MoraleEventKind::Victory => 0.25,
            MoraleEventKind::Defeat => -0.25,
            MoraleEventKind::Rally => 0.2,
            MoraleEventKind::CommanderDeath => -0.3,
        }
    }

    /// Radius of effect in world units.
    pub fn radius(&self) -> f32 {
        match self {
            MoraleEventKind::AllyDeath => 15.0,
            MoraleEventKind::EnemyDeath => 15.0,
            MoraleEventKind::Victory => 40.0,
            MoraleEventKind::Defeat => 40.0,
            MoraleEventKind::Rally => 20.0,
            MoraleEventKind::CommanderDeath => 30.0,
        }
    }

    /// Victory and Defeat spill onto the opposing team, negated and halved.
    fn affects_opposing(&self) -> bool {
        matches!(self, MoraleEventKind::Victory | MoraleEventKind::Defeat)
    }
}

/// Resource tracking per-unit and per-team morale.
#[derive(Resource, Debug, Default)]
pub struct MoraleTracker {
    unit_morale: HashMap<UnitId, f32>,
    team_morale: HashMap<Team, f32>,
}

impl MoraleTracker {
    /// A unit's morale. Unknown units read as the baseline.
    pub fn morale_of(&self, unit: UnitId) -> f32 {
        self.unit_morale.get(&unit).copied().unwrap_or(MORALE_BASELINE)
    }

    /// A team's aggregate morale. Unknown teams read as the baseline.
    pub fn team_morale(&self, team: Team) -> f32 {
        self.team_morale.get(&team).copied().unwrap_or(MORALE_BASELINE)
    }

    pub fn morale_state_of(&self, unit: UnitId) -> MoraleState {
        MoraleState::from_value(self.morale_of(unit))
    }

    pub fn should_consider_fleeing(&self, unit: UnitId) -> bool {
        self.morale_state_of(unit) == MoraleState::Broken
    }

    /// Adjust a unit's morale by a signed delta, clamped to [0, 1].
    /// Lazily initializes the unit at the baseline.
    pub fn adjust(&mut self, unit: UnitId, delta: f32) {
        let value = self.unit_morale.entry(unit).or_insert(MORALE_BASELINE);
        *value = (*value + delta).clamp(0.0, 1.0);
    }

    fn adjust_team(&mut self, team: Team, delta: f32) {
        let value = self.team_morale.entry(team).or_insert(MORALE_BASELINE);
        *value = (*value + delta).clamp(0.0, 1.0);
    }

    /// Apply an event at `position` for `affected_team` to every living
    /// unit in radius, with linear distance falloff. The source unit (the
    /// dying ally, the rallying commander) is not re-affected.
    pub fn record_event(
        &mut self,
        kind: MoraleEventKind,
        position: Position,
        affected_team: Team,
        source: Option<Entity>,
        all_units: &[UnitView],
    ) {
        let radius = kind.radius();
        let impact = kind.impact();

        for unit in all_units {
            if !unit.alive || Some(unit.entity) == source {
                continue;
            }
            let dist = unit.position.distance_to(&position);
            if dist >= radius {
                continue;
            }
            let weight = 1.0 - dist / radius;
            if unit.team == affected_team {
                self.adjust(unit.id, impact * weight);
            } else if kind.affects_opposing() {
                self.adjust(unit.id, -impact * 0.5 * weight);
            }
        }

        // Damped team-wide adjustment
        self.adjust_team(affected_team, impact * TEAM_DAMPING);
        if kind.affects_opposing() {
            self.adjust_team(affected_team.opposing(), -impact * 0.5 * TEAM_DAMPING);
        }
    }

    /// Morale including the commander-proximity bonus: +0.2 when any
    /// living allied commander is within `aura_radius`, clamped to 1.0.
    pub fn effective_morale(
        &self,
        unit: &UnitView,
        all_units: &[UnitView],
        aura_radius: f32,
    ) -> f32 {
        let base = self.morale_of(unit.id);
        let near_commander = all_units.iter().any(|u| {
            u.alive
                && u.team == unit.team
                && u.role == UnitRole::Commander
                && u.entity != unit.entity
                && u.position.distance_to(&unit.position) <= aura_radius
        });
        if near_commander {
            (base + COMMANDER_AURA_BONUS).min(1.0)
        } else {
            base
        }
    }

    fn regress(value: &mut f32, delta: f32) {
        if *value < MORALE_BASELINE {
            *value = (*value + REGRESSION_RATE * delta).min(MORALE_BASELINE);
        } else if *value > MORALE_BASELINE {
            *value = (*value - REGRESSION_RATE * 0.5 * delta).max(MORALE_BASELINE);
        }
    }

    fn regress_all(&mut self, delta: f32) {
        for value in self.unit_morale.values_mut() {
            Self::regress(value, delta);
        }
        for value in self.team_morale.values_mut() {
            Self::regress(value, delta);
        }
    }

    /// Drop a unit's entry (cleanup after despawn).
    pub fn forget(&mut self, unit: UnitId) {
        self.unit_morale.remove(&unit);
    }

    pub fn tracked_count(&self) -> usize {
        self.unit_morale.len()
    }
}

/// System that drifts all morale values toward the baseline each tick:
/// recovery upward runs at the full rate, decay downward at half rate.
pub fn morale_regression_system(dt: Res<DeltaTime>, mut tracker: ResMut<MoraleTracker>) {
    tracker.regress_all(dt.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::UnitRole;

    fn unit(raw: u32, team: Team, x: f32) -> UnitView {
        UnitView {
            entity: Entity::from_raw(raw),
            id: UnitId(raw),
            team,
            role: UnitRole::Infantry,
            position: Position::new(x, 0.0, 0.0),
            alive: true,
        }
    }

    #[test]
    fn test_state_thresholds_exact() {
        assert_eq!(MoraleState::from_value(0.0), MoraleState::Broken);
        assert_eq!(MoraleState::from_value(0.15), MoraleState::Broken);
        assert_eq!(MoraleState::from_value(0.151), MoraleState::Low);
        assert_eq!(MoraleState::from_value(0.3), MoraleState::Low);
        assert_eq!(MoraleState::from_value(0.301), MoraleState::Normal);
        assert_eq!(MoraleState::from_value(0.699), MoraleState::Normal);
        assert_eq!(MoraleState::from_value(0.7), MoraleState::High);
        assert_eq!(MoraleState::from_value(1.0), MoraleState::High);
    }

    #[test]
    fn test_multipliers() {
        assert_eq!(MoraleState::High.damage_multiplier(), 1.2);
        assert_eq!(MoraleState::Normal.damage_multiplier(), 1.0);
        assert_eq!(MoraleState::Low.damage_multiplier(), 0.8);
        assert_eq!(MoraleState::Broken.damage_multiplier(), 0.6);
        assert_eq!(MoraleState::High.speed_multiplier(), 1.1);
        assert_eq!(MoraleState::Broken.speed_multiplier(), 0.8);
    }

    #[test]
    fn test_unknown_unit_reads_baseline() {
        let tracker = MoraleTracker::default();
        assert_eq!(tracker.morale_of(UnitId(99)), MORALE_BASELINE);
        assert_eq!(tracker.team_morale(Team::Black), MORALE_BASELINE);
        assert_eq!(tracker.morale_state_of(UnitId(99)), MoraleState::Normal);
    }

    #[test]
    fn test_ally_death_distance_weighting() {
        let mut tracker = MoraleTracker::default();
        let near = unit(1, Team::White, 5.0);
        let far = unit(2, Team::White, 20.0);
        let units = vec![near, far];

        tracker.record_event(
            MoraleEventKind::AllyDeath,
            Position::new(0.0, 0.0, 0.0),
            Team::White,
            None,
            &units,
        );

        // 0.15 * (1 - 5/15) = 0.10 loss at 5 units
        assert!((tracker.morale_of(UnitId(1)) - 0.4).abs() < 1e-5);
        // Out of the 15-unit radius: unaffected
        assert_eq!(tracker.morale_of(UnitId(2)), MORALE_BASELINE);
    }

    #[test]
    fn test_victory_spills_to_opposing_team() {
        let mut tracker = MoraleTracker::default();
        let winner = unit(1, Team::White, 0.0);
        let loser = unit(2, Team::Black, 0.0);
        let units = vec![winner, loser];

        tracker.record_event(
            MoraleEventKind::Victory,
            Position::new(0.0, 0.0, 0.0),
            Team::White,
            None,
            &units,
        );

        assert!((tracker.morale_of(UnitId(1)) - 0.75).abs() < 1e-5);
        // Negated, halved: -0.125
        assert!((tracker.morale_of(UnitId(2)) - 0.375).abs() < 1e-5);
    }

    #[test]
    fn test_ally_death_does_not_touch_enemy() {
        let mut tracker = MoraleTracker::default();
        let enemy = unit(1, Team::Black, 2.0);
        tracker.record_event(
            MoraleEventKind::AllyDeath,
            Position::new(0.0, 0.0, 0.0),
            Team::White,
            None,
            &[enemy],
        );
        assert_eq!(tracker.morale_of(UnitId(1)), MORALE_BASELINE);
    }

    #[test]
    fn test_team_aggregate_is_damped() {
        let mut tracker = MoraleTracker::default();
        tracker.record_event(
            MoraleEventKind::Defeat,
            Position::default(),
            Team::White,
            None,
            &[],
        );
        // -0.25 * 0.3 = -0.075
        assert!((tracker.team_morale(Team::White) - 0.425).abs() < 1e-5);
        // Opposing gets +0.125 * 0.3
        assert!((tracker.team_morale(Team::Black) - 0.5375).abs() < 1e-5);
    }

    #[test]
    fn test_dead_units_ignore_events() {
        let mut tracker = MoraleTracker::default();
        let mut corpse = unit(1, Team::White, 1.0);
        corpse.alive = false;
        tracker.record_event(
            MoraleEventKind::Rally,
            Position::default(),
            Team::White,
            None,
            &[corpse],
        );
        assert_eq!(tracker.morale_of(UnitId(1)), MORALE_BASELINE);
    }

    #[test]
    fn test_morale_clamped_under_event_storm() {
        let mut tracker = MoraleTracker::default();
        let u = unit(1, Team::White, 0.0);
        for _ in 0..50 {
            tracker.record_event(
                MoraleEventKind::CommanderDeath,
                Position::default(),
                Team::White,
                None,
                &[u],
            );
        }
        assert_eq!(tracker.morale_of(UnitId(1)), 0.0);
        for _ in 0..100 {
            tracker.record_event(
                MoraleEventKind::Rally,
                Position::default(),
                Team::White,
                None,
                &[u],
            );
        }
        assert_eq!(tracker.morale_of(UnitId(1)), 1.0);
    }

    #[test]
    fn test_regression_asymmetric() {
        let mut world = World::new();
        world.insert_resource(DeltaTime(1.0));
        let mut tracker = MoraleTracker::default();
        tracker.adjust(UnitId(1), -0.2); // 0.3, below baseline
        tracker.adjust(UnitId(2), 0.2); // 0.7, above baseline
        world.insert_resource(tracker);

        let mut schedule = Schedule::default();
        schedule.add_systems(morale_regression_system);
        schedule.run(&mut world);

        let tracker = world.resource::<MoraleTracker>();
        // Upward at full rate, downward at half rate
        assert!((tracker.morale_of(UnitId(1)) - 0.32).abs() < 1e-5);
        assert!((tracker.morale_of(UnitId(2)) - 0.69).abs() < 1e-5);
    }

    #[test]
    fn test_regression_never_overshoots_baseline() {
        let mut world = World::new();
        world.insert_resource(DeltaTime(100.0));
        let mut tracker = MoraleTracker::default();
        tracker.adjust(UnitId(1), -0.1);
        tracker.adjust(UnitId(2), 0.1);
        world.insert_resource(tracker);

        let mut schedule = Schedule::default();
        schedule.add_systems(morale_regression_system);
        schedule.run(&mut world);

        let tracker = world.resource::<MoraleTracker>();
        assert_eq!(tracker.morale_of(UnitId(1)), MORALE_BASELINE);
        assert_eq!(tracker.morale_of(UnitId(2)), MORALE_BASELINE);
    }

    #[test]
    fn test_commander_aura() {
        let tracker = MoraleTracker::default();
        let infantry = unit(1, Team::White, 0.0);
        let mut commander = unit(2, Team::White, 5.0);
        commander.role = UnitRole::Commander;
        let units = vec![infantry, commander];

        let with_aura = tracker.effective_morale(&infantry, &units, 12.0);
        assert!((with_aura - 0.7).abs() < 1e-5);

        // Commander out of the aura radius
        let mut far_commander = commander;
        far_commander.position = Position::new(50.0, 0.0, 0.0);
        let units = vec![infantry, far_commander];
        let without = tracker.effective_morale(&infantry, &units, 12.0);
        assert!((without - MORALE_BASELINE).abs() < 1e-5);

        // Dead commanders project no aura
        let mut dead_commander = commander;
        dead_commander.alive = false;
        let units = vec![infantry, dead_commander];
        assert!((tracker.effective_morale(&infantry, &units, 12.0) - MORALE_BASELINE).abs() < 1e-5);

        // Enemy commanders do not help
        let mut enemy_commander = commander;
        enemy_commander.team = Team::Black;
        let units = vec![infantry, enemy_commander];
        assert!((tracker.effective_morale(&infantry, &units, 12.0) - MORALE_BASELINE).abs() < 1e-5);
    }
}
