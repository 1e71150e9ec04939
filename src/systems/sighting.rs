//! Sighting relay - multi-hop visual report propagation.
//!
//! A spotter's report starts a breadth-first, time-delayed broadcast tree:
//! allies with line of sight receive a delayed relay, each hop producing a
//! *new* sighting with decayed accuracy and an incremented hop count. The
//! original sighting is never mutated; `Sighting::relayed` is a pure copy.
//! The tree is bounded by a hop cap and a per-unit relay cooldown.

use crate::components::{Health, Position, Team};
use crate::spatial::SpatialGrid;
use crate::systems::{SimConfig, SimTime};
use crate::voxel::{has_line_of_sight, VoxelResource, LOS_MAX_RANGE};
use bevy_ecs::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;

/// Accuracy lost per relay hop.
pub const ACCURACY_DECAY: f32 = 0.15;
/// Accuracy never decays below this floor.
pub const MIN_ACCURACY: f32 = 0.1;
/// A sighting stops relaying once it has travelled this many hops.
pub const MAX_RELAY_HOPS: u32 = 5;
/// Seconds a unit must wait between relaying sightings.
pub const RELAY_COOLDOWN: f32 = 3.0;
/// A new sighting of the same target within this window refreshes the
/// existing entry instead of inserting a duplicate.
const DUPLICATE_WINDOW: f32 = 2.0;
/// Position error in units per point of missing accuracy.
const POSITION_ERROR_SCALE: f32 = 5.0;
/// No position error is applied at or above this accuracy.
const ACCURATE_THRESHOLD: f32 = 0.95;
/// Relays fire after the kind's delay scaled by this factor.
const RELAY_DELAY_FACTOR: f32 = 0.5;

/// What was spotted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SightingKind {
    Enemy,
    Commander,
    SiegeEngine,
    Breach,
}

impl SightingKind {
    /// Base delay before an ally passes the report on.
    pub fn relay_delay(&self) -> f32 {
        match self {
            SightingKind::Enemy => 1.0,
            SightingKind::Commander => 0.8,
            SightingKind::SiegeEngine => 1.2,
            SightingKind::Breach => 0.5,
        }
    }

    /// How long the report stays actionable.
    pub fn lifetime(&self) -> f32 {
        match self {
            SightingKind::Enemy => 10.0,
            SightingKind::Commander => 15.0,
            SightingKind::SiegeEngine => 20.0,
            SightingKind::Breach => 30.0,
        }
    }
}

/// An immutable visual report. Relay hops produce new values via
/// [`Sighting::relayed`]; accuracy only ever decreases and hops only
/// ever increase across copies.
#[derive(Debug, Clone, Copy)]
pub struct Sighting {
    pub kind: SightingKind,
    pub target: Entity,
    /// Last known position of the target (degrades with accuracy).
    pub position: Position,
    pub team: Team,
    /// The unit that made the original report.
    pub spotter: Entity,
    /// Information fidelity in (0, 1]; 1.0 for a direct report.
    pub accuracy: f32,
    pub hops: u32,
    pub reported_at: f32,
    pub expires_at: f32,
}

impl Sighting {
    /// A direct, first-hand report: full accuracy, zero hops.
    pub fn new(
        kind: SightingKind,
        target: Entity,
        position: Position,
        team: Team,
        spotter: Entity,
        now: f32,
    ) -> Self {
        Self {
            kind,
            target,
            position,
            team,
            spotter,
            accuracy: 1.0,
            hops: 0,
            reported_at: now,
            expires_at: now + kind.lifetime(),
        }
    }

    pub fn is_expired(&self, now: f32) -> bool {
        now >= self.expires_at
    }

    /// Produce the degraded copy an ally would hold after one relay hop:
    /// accuracy drops by the fixed decay (floored), hop count increments,
    /// and below the accuracy threshold the reported position picks up an
    /// error proportional to the missing accuracy.
    pub fn relayed(&self, now: f32, rng: &mut impl Rng) -> Sighting {
        let accuracy = (self.accuracy - ACCURACY_DECAY).max(MIN_ACCURACY);
        let mut position = self.position;
        if accuracy < ACCURATE_THRESHOLD {
            let error = (1.0 - accuracy) * POSITION_ERROR_SCALE;
            let angle = rng.gen::<f32>() * std::f32::consts::TAU;
            position.x += error * angle.cos();
            position.z += error * angle.sin();
        }
        Sighting {
            position,
            accuracy,
            hops: self.hops + 1,
            reported_at: now,
            expires_at: now + self.kind.lifetime(),
            ..*self
        }
    }
}

/// A relay waiting for its delay to elapse.
#[derive(Debug, Clone, Copy)]
struct PendingRelay {
    sighting: Sighting,
    relayer: Entity,
    fire_at: f32,
}

/// Resource owning all sightings, pending relays, and relay cooldowns.
#[derive(Resource)]
pub struct SightingBoard {
    sightings: Vec<Sighting>,
    pending: Vec<PendingRelay>,
    cooldown_until: HashMap<Entity, f32>,
    rng: ChaCha8Rng,
}

impl Default for SightingBoard {
    fn default() -> Self {
        Self::new(0)
    }
}

impl SightingBoard {
    pub fn new(seed: u64) -> Self {
        Self {
            sightings: Vec::new(),
            pending: Vec::new(),
            cooldown_until: HashMap::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// File a direct report and schedule the first round of relays to the
    /// given allies (already filtered for range and line of sight).
    pub fn report(
        &mut self,
        kind: SightingKind,
        spotter: Entity,
        target: Entity,
        target_position: Position,
        team: Team,
        allies: &[Entity],
        now: f32,
    ) -> Sighting {
        let sighting = Sighting::new(kind, target, target_position, team, spotter, now);
        self.insert(sighting, now);
        self.schedule_relays(&sighting, allies, now);
        sighting
    }

    /// Insert a sighting, suppressing duplicates: a report of the same
    /// target for the same team within the duplicate window refreshes the
    /// existing entry's expiry instead. Returns true if a new entry was
    /// added.
    pub fn insert(&mut self, sighting: Sighting, now: f32) -> bool {
        for existing in self.sightings.iter_mut() {
            if existing.team == sighting.team
                && existing.target == sighting.target
                && now - existing.reported_at < DUPLICATE_WINDOW
            {
                existing.expires_at = existing.expires_at.max(sighting.expires_at);
                return false;
            }
        }
        self.sightings.push(sighting);
        true
    }

    /// Queue delayed relays of `sighting` through each ally, honoring the
    /// hop cap and per-unit cooldown.
    pub fn schedule_relays(&mut self, sighting: &Sighting, allies: &[Entity], now: f32) {
        if sighting.hops >= MAX_RELAY_HOPS {
            return;
        }
        let fire_at = now + sighting.kind.relay_delay() * RELAY_DELAY_FACTOR;
        for &ally in allies {
            if ally == sighting.spotter {
                continue;
            }
            if self.cooldown_until.get(&ally).copied().unwrap_or(0.0) > now {
                continue;
            }
            self.cooldown_until.insert(ally, now + RELAY_COOLDOWN);
            self.pending.push(PendingRelay {
                sighting: *sighting,
                relayer: ally,
                fire_at,
            });
        }
    }

    /// Remove and return the relays due at `now`.
    fn take_due_relays(&mut self, now: f32) -> Vec<PendingRelay> {
        let mut due = Vec::new();
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].fire_at <= now {
                due.push(self.pending.swap_remove(i));
            } else {
                i += 1;
            }
        }
        due
    }

    /// Live sightings visible to a team.
    pub fn sightings_for_team(&self, team: Team, now: f32) -> Vec<Sighting> {
        self.sightings
            .iter()
            .filter(|s| s.team == team && !s.is_expired(now))
            .copied()
            .collect()
    }

    /// The most accurate live sighting of a target held by a team.
    pub fn best_sighting_of(&self, team: Team, target: Entity, now: f32) -> Option<Sighting> {
        self.sightings
            .iter()
            .filter(|s| s.team == team && s.target == target && !s.is_expired(now))
            .max_by(|a, b| {
                a.accuracy
                    .partial_cmp(&b.accuracy)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .copied()
    }

    pub fn sighting_count(&self) -> usize {
        self.sightings.len()
    }

    pub fn pending_relay_count(&self) -> usize {
        self.pending.len()
    }

    fn sweep(&mut self, now: f32) {
        self.sightings.retain(|s| !s.is_expired(now));
        self.cooldown_until.retain(|_, until| *until > now);
    }
}

/// System that fires due relays and purges expired sightings.
///
/// When a relay fires, the relayer creates its degraded copy and attempts
/// to pass it on to its own allies in visual range with line of sight,
/// continuing the broadcast tree.
pub fn sighting_relay_system(
    time: Res<SimTime>,
    config: Res<SimConfig>,
    grid: Option<Res<VoxelResource>>,
    spatial: Res<SpatialGrid>,
    mut board: ResMut<SightingBoard>,
    units: Query<(&Position, &Health)>,
) {
    let now = time.0;
    let due = board.take_due_relays(now);

    for relay in due {
        // Relayer must still be alive to pass the report on.
        let relayer_pos = match units.get(relay.relayer) {
            Ok((pos, health)) if health.is_alive() => *pos,
            _ => continue,
        };

        let rng = &mut board.rng;
        let relayed = relay.sighting.relayed(now, rng);
        board.insert(relayed, now);

        if relayed.hops >= MAX_RELAY_HOPS {
            continue;
        }

        let allies: Vec<Entity> = spatial
            .query_allies(
                relayer_pos.x,
                relayer_pos.y,
                relayer_pos.z,
                config.visual_range,
                relayed.team,
            )
            .into_iter()
            .filter(|entry| {
                if entry.entity == relay.relayer {
                    return false;
                }
                match &grid {
                    Some(voxels) => has_line_of_sight(
                        &**voxels,
                        &relayer_pos,
                        &Position::new(entry.x, entry.y, entry.z),
                        LOS_MAX_RANGE,
                    ),
                    None => true,
                }
            })
            .map(|entry| entry.entity)
            .collect();

        board.schedule_relays(&relayed, &allies, now);
    }

    board.sweep(now);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sighting(now: f32) -> Sighting {
        Sighting::new(
            SightingKind::Enemy,
            Entity::from_raw(10),
            Position::new(5.0, 0.0, 5.0),
            Team::White,
            Entity::from_raw(1),
            now,
        )
    }

    #[test]
    fn test_accuracy_decay_formula() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut s = sighting(0.0);
        for n in 1..=8u32 {
            s = s.relayed(0.0, &mut rng);
            let expected = (1.0 - ACCURACY_DECAY * n as f32).max(MIN_ACCURACY);
            assert!((s.accuracy - expected).abs() < 1e-5, "hop {}", n);
            assert_eq!(s.hops, n);
        }
    }

    #[test]
    fn test_relayed_never_mutates_original() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let original = sighting(0.0);
        let copy = original.relayed(0.0, &mut rng);
        assert_eq!(original.hops, 0);
        assert_eq!(original.accuracy, 1.0);
        assert_eq!(copy.hops, 1);
        assert!(copy.accuracy < original.accuracy);
    }

    #[test]
    fn test_position_error_grows_with_hops() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let original = sighting(0.0);

        // First hop: accuracy 0.85 < 0.95, error up to (1-0.85)*5 = 0.75
        let one = original.relayed(0.0, &mut rng);
        let err = one.position.distance_to(&original.position);
        assert!(err > 0.0 && err <= 0.75 + 1e-4);

        // Vertical coordinate is untouched (horizontal error only)
        assert_eq!(one.position.y, original.position.y);
    }

    #[test]
    fn test_position_error_is_seed_deterministic() {
        let mut rng_a = ChaCha8Rng::seed_from_u64(42);
        let mut rng_b = ChaCha8Rng::seed_from_u64(42);
        let original = sighting(0.0);
        let a = original.relayed(0.0, &mut rng_a);
        let b = original.relayed(0.0, &mut rng_b);
        assert_eq!(a.position.x, b.position.x);
        assert_eq!(a.position.z, b.position.z);
    }

    #[test]
    fn test_duplicate_suppression_window() {
        let mut board = SightingBoard::new(0);
        let first = sighting(0.0);
        assert!(board.insert(first, 0.0));

        // Same target, same team, 1s later: refresh, no insert
        let dup = sighting(1.0);
        assert!(!board.insert(dup, 1.0));
        assert_eq!(board.sighting_count(), 1);

        // Other team's report of the same target is independent
        let mut other = sighting(1.0);
        other.team = Team::Black;
        assert!(board.insert(other, 1.0));

        // Past the window: new entry
        let late = sighting(3.0);
        assert!(board.insert(late, 3.0));
        assert_eq!(board.sighting_count(), 3);
    }

    #[test]
    fn test_duplicate_refreshes_expiry() {
        let mut board = SightingBoard::new(0);
        board.insert(sighting(0.0), 0.0);
        let before = board.sightings_for_team(Team::White, 0.0)[0].expires_at;

        board.insert(sighting(1.0), 1.0);
        let after = board.sightings_for_team(Team::White, 1.0)[0].expires_at;
        assert!(after > before);
    }

    #[test]
    fn test_no_relay_at_hop_cap() {
        let mut board = SightingBoard::new(0);
        let mut s = sighting(0.0);
        s.hops = MAX_RELAY_HOPS;
        board.schedule_relays(&s, &[Entity::from_raw(2)], 0.0);
        assert_eq!(board.pending_relay_count(), 0);
    }

    #[test]
    fn test_relay_cooldown_blocks_second_schedule() {
        let mut board = SightingBoard::new(0);
        let s = sighting(0.0);
        let ally = Entity::from_raw(2);

        board.schedule_relays(&s, &[ally], 0.0);
        assert_eq!(board.pending_relay_count(), 1);

        // Within the cooldown: not scheduled again
        board.schedule_relays(&s, &[ally], 1.0);
        assert_eq!(board.pending_relay_count(), 1);

        // After the cooldown
        board.schedule_relays(&s, &[ally], RELAY_COOLDOWN + 0.1);
        assert_eq!(board.pending_relay_count(), 2);
    }

    #[test]
    fn test_spotter_never_relays_to_itself() {
        let mut board = SightingBoard::new(0);
        let s = sighting(0.0);
        board.schedule_relays(&s, &[s.spotter], 0.0);
        assert_eq!(board.pending_relay_count(), 0);
    }

    #[test]
    fn test_relay_chain_through_system() {
        let mut world = World::new();
        world.insert_resource(SimTime(0.0));
        world.insert_resource(crate::systems::DeltaTime(0.1));
        world.insert_resource(SimConfig::default());
        world.insert_resource(SpatialGrid::default());
        world.insert_resource(SightingBoard::new(1));

        // Spotter at origin, one ally in range, a second ally near the first
        let spotter = world
            .spawn((Position::new(0.0, 0.0, 0.0), Team::White, Health::new(100.0)))
            .id();
        let ally_a = world
            .spawn((Position::new(10.0, 0.0, 0.0), Team::White, Health::new(100.0)))
            .id();
        let ally_b = world
            .spawn((Position::new(20.0, 0.0, 0.0), Team::White, Health::new(100.0)))
            .id();
        let enemy = world
            .spawn((Position::new(5.0, 0.0, 5.0), Team::Black, Health::new(100.0)))
            .id();

        // Populate the spatial grid
        let mut schedule = Schedule::default();
        schedule.add_systems((
            crate::spatial::spatial_grid_update_system,
            sighting_relay_system,
        ).chain());
        schedule.run(&mut world);

        // File the report with ally_a as the first-round recipient
        {
            let mut board = world.resource_mut::<SightingBoard>();
            board.report(
                SightingKind::Enemy,
                spotter,
                enemy,
                Position::new(5.0, 0.0, 5.0),
                Team::White,
                &[ally_a],
                0.0,
            );
            assert_eq!(board.pending_relay_count(), 1);
        }

        // Advance past the relay delay (Enemy: 1.0 * 0.5 = 0.5s)
        world.resource_mut::<SimTime>().0 = 0.6;
        schedule.run(&mut world);

        let board = world.resource::<SightingBoard>();
        // ally_a fired its relay and scheduled onward hops toward allies
        // in its own visual range (spotter is on cooldown-free but allowed;
        // ally_b is fresh).
        assert!(board.pending_relay_count() >= 1);
        let _ = ally_b;
        let sightings = board.sightings_for_team(Team::White, 0.6);
        assert!(!sightings.is_empty());
    }
}
