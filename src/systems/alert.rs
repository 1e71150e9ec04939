//! Alert network - team broadcast and command distribution.
//!
//! Alerts are immediate push notifications to same-team listeners in range,
//! unlike the relay system's delayed chain. Commands are one-shot
//! notifications to specific units, retained for history queries; they
//! never expire. Alerts expire by timestamp and are swept each tick.

use crate::components::{Position, Team, UnitView};
use crate::systems::SimTime;
use bevy_ecs::prelude::*;

/// Kinds of alert a unit can raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertType {
    EnemySpotted,
    UnderAttack,
    BreachAlarm,
    CommanderDown,
    Rally,
    FallBack,
}

impl AlertType {
    /// How far the alert reaches.
    pub fn range(&self) -> f32 {
        match self {
            AlertType::EnemySpotted => 30.0,
            AlertType::UnderAttack => 25.0,
            AlertType::BreachAlarm => 60.0,
            AlertType::CommanderDown => 80.0,
            AlertType::Rally => 50.0,
            AlertType::FallBack => 50.0,
        }
    }

    /// How long the alert stays active.
    pub fn duration(&self) -> f32 {
        match self {
            AlertType::EnemySpotted => 8.0,
            AlertType::UnderAttack => 6.0,
            AlertType::BreachAlarm => 20.0,
            AlertType::CommanderDown => 30.0,
            AlertType::Rally => 15.0,
            AlertType::FallBack => 15.0,
        }
    }
}

/// A broadcast alert. Immutable after creation.
#[derive(Debug, Clone, Copy)]
pub struct Alert {
    pub kind: AlertType,
    pub position: Position,
    pub source: Entity,
    pub team: Team,
    pub expires_at: f32,
    pub target: Option<Entity>,
}

impl Alert {
    pub fn is_expired(&self, now: f32) -> bool {
        now >= self.expires_at
    }
}

/// Orders a commander can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Attack,
    Defend,
    Retreat,
    Rally,
    Move,
}

/// A command issued to specific units. Retained for history; never expires.
#[derive(Debug, Clone)]
pub struct ActiveCommand {
    pub commander: Entity,
    pub kind: CommandKind,
    pub targets: Vec<Entity>,
    pub position: Option<Position>,
    pub issued_at: f32,
}

/// Push-style listener units implement to receive alerts and commands.
pub trait AlertListener: Send + Sync {
    fn team(&self) -> Team;
    fn position(&self) -> Position;
    fn unit(&self) -> Entity;
    fn on_alert(&mut self, alert: &Alert);
    fn on_command(&mut self, command: &ActiveCommand);
}

/// Resource owning active alerts, command history, and listeners.
#[derive(Resource, Default)]
pub struct AlertNet {
    alerts: Vec<Alert>,
    commands: Vec<ActiveCommand>,
    listeners: Vec<Box<dyn AlertListener>>,
}

impl AlertNet {
    /// Broadcast an alert, immediately notifying same-team listeners
    /// within the alert type's range.
    pub fn broadcast_alert(
        &mut self,
        source: Entity,
        team: Team,
        kind: AlertType,
        position: Position,
        target: Option<Entity>,
        now: f32,
    ) -> Alert {
        let alert = Alert {
            kind,
            position,
            source,
            team,
            expires_at: now + kind.duration(),
            target,
        };
        self.alerts.push(alert);

        let range = kind.range();
        for listener in self.listeners.iter_mut() {
            if listener.unit() == source || listener.team() != team {
                continue;
            }
            if listener.position().distance_to(&position) <= range {
                listener.on_alert(&alert);
            }
        }

        alert
    }

    /// Issue a command to an explicit target list. Each targeted listener
    /// gets a one-shot notification; the command is kept for queries.
    pub fn issue_command(
        &mut self,
        commander: Entity,
        kind: CommandKind,
        targets: Vec<Entity>,
        position: Option<Position>,
        now: f32,
    ) {
        let command = ActiveCommand {
            commander,
            kind,
            targets,
            position,
            issued_at: now,
        };
        for listener in self.listeners.iter_mut() {
            if command.targets.contains(&listener.unit()) {
                listener.on_command(&command);
            }
        }
        self.commands.push(command);
    }

    /// Issue a command to every living allied unit within `radius` of the
    /// commander's position (the commander itself is not a target).
    pub fn issue_area_command(
        &mut self,
        commander: Entity,
        commander_team: Team,
        commander_position: Position,
        kind: CommandKind,
        radius: f32,
        all_units: &[UnitView],
        position: Option<Position>,
        now: f32,
    ) -> usize {
        let targets: Vec<Entity> = all_units
            .iter()
            .filter(|u| {
                u.alive
                    && u.entity != commander
                    && u.team == commander_team
                    && u.position.distance_to(&commander_position) <= radius
            })
            .map(|u| u.entity)
            .collect();
        let count = targets.len();
        self.issue_command(commander, kind, targets, position, now);
        count
    }

    pub fn register_listener(&mut self, listener: Box<dyn AlertListener>) {
        self.listeners.push(listener);
    }

    /// Live alerts for a team.
    pub fn alerts_for_team(&self, team: Team, now: f32) -> Vec<Alert> {
        self.alerts
            .iter()
            .filter(|a| a.team == team && !a.is_expired(now))
            .copied()
            .collect()
    }

    /// Live alerts for a team within `radius` of a position.
    pub fn alerts_near(&self, team: Team, position: Position, radius: f32, now: f32) -> Vec<Alert> {
        self.alerts
            .iter()
            .filter(|a| {
                a.team == team
                    && !a.is_expired(now)
                    && a.position.distance_to(&position) <= radius
            })
            .copied()
            .collect()
    }

    /// Full command history, oldest first.
    pub fn command_history(&self) -> &[ActiveCommand] {
        &self.commands
    }

    /// Commands ever issued to a unit, oldest first.
    pub fn commands_for(&self, unit: Entity) -> Vec<&ActiveCommand> {
        self.commands
            .iter()
            .filter(|c| c.targets.contains(&unit))
            .collect()
    }

    pub fn alert_count(&self) -> usize {
        self.alerts.len()
    }

    fn sweep(&mut self, now: f32) {
        self.alerts.retain(|a| !a.is_expired(now));
    }
}

/// System that purges expired alerts each tick. Commands are never swept.
pub fn alert_sweep_system(time: Res<SimTime>, mut net: ResMut<AlertNet>) {
    net.sweep(time.0);
}
