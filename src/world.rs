//! Snapshot types - a serializable view of the simulation state.
//!
//! The snapshot is the diagnostic and client-facing channel: unit state,
//! per-team morale and escalation, and live event counts, exported as JSON.

use crate::components::*;
use crate::systems::{AlertNet, EscalationLevel, MoraleTracker, SiegeState, SightingBoard, SoundField};
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Snapshot of a single unit's state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitSnapshot {
    pub id: u32,
    pub team: String,
    pub role: String,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub health: f32,
    pub health_max: f32,
    pub poise: f32,
    pub staggered: bool,
    pub morale: f32,
}

/// Snapshot of one team's army-wide state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamSnapshot {
    pub team: String,
    pub escalation: String,
    pub morale: f32,
    pub casualties: u32,
    pub active_breaches: usize,
}

/// Complete simulation state snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Current simulation tick.
    pub tick: u64,
    /// Elapsed simulation time in seconds.
    pub time: f32,
    pub units: Vec<UnitSnapshot>,
    pub teams: Vec<TeamSnapshot>,
    pub active_alerts: usize,
    pub active_sightings: usize,
    pub active_sounds: usize,
}

fn team_name(team: Team) -> &'static str {
    match team {
        Team::White => "White",
        Team::Black => "Black",
    }
}

fn role_name(role: UnitRole) -> &'static str {
    match role {
        UnitRole::Infantry => "Infantry",
        UnitRole::Archer => "Archer",
        UnitRole::Assassin => "Assassin",
        UnitRole::Guard => "Guard",
        UnitRole::Commander => "Commander",
        UnitRole::SiegeEngine => "SiegeEngine",
    }
}

fn escalation_name(level: EscalationLevel) -> &'static str {
    match level {
        EscalationLevel::Standoff => "Standoff",
        EscalationLevel::Skirmish => "Skirmish",
        EscalationLevel::SiegeBegun => "SiegeBegun",
        EscalationLevel::WallBreach => "WallBreach",
        EscalationLevel::GateBreach => "GateBreach",
        EscalationLevel::CastleAssault => "CastleAssault",
        EscalationLevel::FinalStand => "FinalStand",
    }
}

impl Snapshot {
    /// Create a snapshot from the ECS world.
    pub fn from_world(world: &mut World, tick: u64, time: f32) -> Self {
        let mut units = Vec::new();

        let mut query = world.query::<(
            &UnitId,
            &Team,
            &UnitRole,
            &Position,
            &Health,
            &Poise,
            &StaggerState,
        )>();

        // Collect into plain rows first; morale lookups need the resource.
        let rows: Vec<_> = query
            .iter(world)
            .map(|(id, team, role, pos, health, poise, stagger)| {
                (*id, *team, *role, *pos, *health, *poise, *stagger)
            })
            .collect();

        let morale = world.get_resource::<MoraleTracker>();
        for (id, team, role, pos, health, poise, stagger) in rows {
            units.push(UnitSnapshot {
                id: id.0,
                team: team_name(team).to_string(),
                role: role_name(role).to_string(),
                x: pos.x,
                y: pos.y,
                z: pos.z,
                health: health.current,
                health_max: health.max,
                poise: poise.current,
                staggered: stagger.staggered,
                morale: morale.map(|m| m.morale_of(id)).unwrap_or(0.5),
            });
        }

        let mut teams = Vec::new();
        if let (Some(siege), Some(morale)) = (
            world.get_resource::<SiegeState>(),
            world.get_resource::<MoraleTracker>(),
        ) {
            for team in [Team::White, Team::Black] {
                teams.push(TeamSnapshot {
                    team: team_name(team).to_string(),
                    escalation: escalation_name(siege.level(team)).to_string(),
                    morale: morale.team_morale(team),
                    casualties: siege.casualties(team),
                    active_breaches: siege.active_breaches(team).len(),
                });
            }
        }

        let active_alerts = world
            .get_resource::<AlertNet>()
            .map(|n| n.alert_count())
            .unwrap_or(0);
        let active_sightings = world
            .get_resource::<SightingBoard>()
            .map(|b| b.sighting_count())
            .unwrap_or(0);
        let active_sounds = world
            .get_resource::<SoundField>()
            .map(|f| f.event_count())
            .unwrap_or(0);

        Self {
            tick,
            time,
            units,
            teams,
            active_alerts,
            active_sightings,
            active_sounds,
        }
    }

    /// Serialize to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from a JSON string.
    pub fn from_json(data: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(data)
    }
}
