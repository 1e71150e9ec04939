//! ECS Components for the siege simulation.
//!
//! Components are pure data containers attached to unit entities.
//! All coordination logic lives in systems and resources that query them.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

// ============================================================================
// SPATIAL COMPONENTS
// ============================================================================

/// 3D position in the voxel world (x = east/west, y = up/down, z = north/south).
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn distance_to(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Distance ignoring the vertical axis.
    pub fn horizontal_distance_to(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dz = self.z - other.z;
        (dx * dx + dz * dz).sqrt()
    }
}

/// Facing direction (unit vector). Stored normalized; a degenerate input
/// falls back to +z rather than producing NaN.
#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Facing {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Default for Facing {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0, z: 1.0 }
    }
}

impl Facing {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        let mag = (x * x + y * y + z * z).sqrt();
        if mag < 0.0001 {
            Self::default()
        } else {
            Self {
                x: x / mag,
                y: y / mag,
                z: z / mag,
            }
        }
    }

    /// Angle in degrees between this facing and the direction from `from`
    /// toward `target`, measured in the horizontal plane.
    pub fn horizontal_angle_to(&self, from: &Position, target: &Position) -> f32 {
        let dx = target.x - from.x;
        let dz = target.z - from.z;
        let mag = (dx * dx + dz * dz).sqrt();
        if mag < 0.0001 {
            return 0.0;
        }
        let fmag = (self.x * self.x + self.z * self.z).sqrt();
        if fmag < 0.0001 {
            return 0.0;
        }
        let dot = (self.x * dx + self.z * dz) / (mag * fmag);
        dot.clamp(-1.0, 1.0).acos().to_degrees()
    }
}

// ============================================================================
// IDENTITY COMPONENTS
// ============================================================================

/// Unique identifier for a unit.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct UnitId(pub u32);

/// The two besieging armies.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    White,
    Black,
}

impl Team {
    pub fn opposing(&self) -> Team {
        match self {
            Team::White => Team::Black,
            Team::Black => Team::White,
        }
    }
}

impl Default for Team {
    fn default() -> Self {
        Self::White
    }
}

/// Capability/role tag set at construction. Replaces runtime type dispatch
/// for commander detection, siege-engine targeting, and armor inference.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UnitRole {
    #[default]
    Infantry,
    Archer,
    Assassin,
    Guard,
    Commander,
    SiegeEngine,
}

impl UnitRole {
    pub fn is_commander(&self) -> bool {
        matches!(self, UnitRole::Commander)
    }

    pub fn is_siege_engine(&self) -> bool {
        matches!(self, UnitRole::SiegeEngine)
    }
}

// ============================================================================
// COMBAT COMPONENTS
// ============================================================================

/// Hit points of a unit.
#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    pub fn fraction(&self) -> f32 {
        if self.max <= 0.0 {
            0.0
        } else {
            (self.current / self.max).clamp(0.0, 1.0)
        }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0.0
    }

    pub fn damage(&mut self, amount: f32) {
        self.current = (self.current - amount).max(0.0);
    }

    pub fn heal(&mut self, amount: f32) {
        self.current = (self.current + amount).min(self.max);
    }
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100.0)
    }
}

/// Stamina pool spent by sprints, charges, and special attacks.
#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Stamina {
    pub current: f32,
    pub max: f32,
}

impl Stamina {
    pub fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    /// Spend stamina if available. Returns false (and spends nothing)
    /// when the pool is too low.
    pub fn spend(&mut self, amount: f32) -> bool {
        if self.current >= amount {
            self.current -= amount;
            true
        } else {
            false
        }
    }

    pub fn regen(&mut self, amount: f32) {
        self.current = (self.current + amount).min(self.max);
    }
}

impl Default for Stamina {
    fn default() -> Self {
        Self::new(100.0)
    }
}

/// Melee/ranged attack parameters.
#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AttackProfile {
    /// Maximum attack reach (units).
    pub range: f32,
    /// Seconds between attacks.
    pub cooldown: f32,
    /// Time remaining until the next attack is allowed.
    pub cooldown_remaining: f32,
}

impl Default for AttackProfile {
    fn default() -> Self {
        Self {
            range: 2.0,
            cooldown: 1.0,
            cooldown_remaining: 0.0,
        }
    }
}

/// Armor class used by the damage table.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ArmorClass {
    #[default]
    Unarmored,
    /// Interpolates between Unarmored and Heavy in the damage table.
    Light,
    Heavy,
    /// Gates, walls, siege engines.
    Fortified,
}

/// Secondary health-like pool; exhausting it staggers the unit.
#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Poise {
    pub current: f32,
    pub max: f32,
    /// Seconds before regeneration resumes after taking poise damage.
    pub regen_delay: f32,
}

impl Poise {
    pub fn new(max: f32) -> Self {
        Self {
            current: max,
            max,
            regen_delay: 0.0,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.current <= 0.0
    }
}

impl Default for Poise {
    fn default() -> Self {
        Self::new(50.0)
    }
}

/// Temporary incapacitated state entered when poise reaches zero.
#[derive(Component, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StaggerState {
    pub staggered: bool,
    /// Seconds of stagger remaining.
    pub remaining: f32,
}

impl StaggerState {
    pub fn is_staggered(&self) -> bool {
        self.staggered
    }
}

// ============================================================================
// BUNDLE HELPERS
// ============================================================================

/// Bundle for spawning a complete unit entity.
#[derive(Bundle, Default)]
pub struct UnitBundle {
    pub unit_id: UnitId,
    pub team: Team,
    pub role: UnitRole,
    pub position: Position,
    pub facing: Facing,
    pub health: Health,
    pub stamina: Stamina,
    pub attack: AttackProfile,
    pub armor: ArmorClass,
    pub poise: Poise,
    pub stagger: StaggerState,
}

impl UnitBundle {
    pub fn new(id: u32, team: Team, role: UnitRole, x: f32, y: f32, z: f32) -> Self {
        let armor = match role {
            UnitRole::Archer | UnitRole::Assassin => ArmorClass::Light,
            UnitRole::Guard | UnitRole::Commander => ArmorClass::Heavy,
            UnitRole::SiegeEngine => ArmorClass::Fortified,
            UnitRole::Infantry => ArmorClass::Unarmored,
        };
        Self {
            unit_id: UnitId(id),
            team,
            role,
            position: Position::new(x, y, z),
            armor,
            ..Default::default()
        }
    }
}

/// Lightweight read-only view of a unit, collected from queries and passed
/// into resource methods that need army-wide context.
#[derive(Debug, Clone, Copy)]
pub struct UnitView {
    pub entity: Entity,
    pub id: UnitId,
    pub team: Team,
    pub role: UnitRole,
    pub position: Position,
    pub alive: bool,
}
