//! Coordination systems for the siege simulation.
//!
//! Seven cooperating systems, each owning one slice of process-wide
//! simulation state, ticked once per fixed update in dependency order:
//!
//! 1. `combat` - damage/poise/stagger resolution (timers only per tick)
//! 2. `formation` - per-group slot geometry (lazy, no per-tick work)
//! 3. `sound` - sound event emission and expiry sweep
//! 4. `sighting` - multi-hop visual-report relay chain
//! 5. `alert` - team broadcast and command distribution
//! 6. `morale` - per-unit and per-team morale
//! 7. `escalation` - per-team battle-phase ratchet
//!
//! All coordination updates complete before any unit's individual AI runs,
//! so a unit's decision always sees this tick's propagated state.

use bevy_ecs::prelude::*;

pub mod alert;
pub mod combat;
pub mod escalation;
pub mod formation;
pub mod morale;
pub mod sighting;
pub mod sound;

pub use alert::*;
pub use combat::*;
pub use escalation::*;
pub use formation::*;
pub use morale::*;
pub use sighting::*;
pub use sound::*;

/// Resource containing the delta time for the current tick.
#[derive(Resource, Default)]
pub struct DeltaTime(pub f32);

/// Elapsed simulation time in seconds. Alerts, sightings, and sounds
/// expire against this clock.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct SimTime(pub f32);

/// Configuration for the coordination layer.
#[derive(Resource, Debug, Clone)]
pub struct SimConfig {
    /// Fixed timestep in seconds (e.g., 1/30 = 0.0333 for 30 Hz).
    pub fixed_timestep: f32,
    /// How far a unit can see for sighting relays.
    pub visual_range: f32,
    /// Radius of the commander morale aura.
    pub commander_aura_radius: f32,
    /// Seed for the relay position-error RNG (replay-deterministic).
    pub rng_seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            fixed_timestep: 1.0 / 30.0,
            visual_range: 24.0,
            commander_aura_radius: 12.0,
            rng_seed: 0x5EED_CA57,
        }
    }
}
