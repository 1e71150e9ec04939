//! Combat resolver - damage, poise, and stagger math.
//!
//! Pure functions compute damage from the type-vs-armor table plus
//! positional modifiers (backstab, charge, stagger bonus); `apply_damage`
//! mutates health/poise/stagger and reports what happened. Two per-tick
//! systems run the poise-regen and stagger-clear timers.

use crate::components::*;
use crate::systems::DeltaTime;
use bevy_ecs::prelude::*;

/// Backstab damage multiplier.
const BACKSTAB_MULTIPLIER: f32 = 2.5;
/// Minimum angle (degrees) between target facing and the target-to-attacker
/// direction for a hit to count as a backstab (180 - 60).
const BACKSTAB_ANGLE: f32 = 120.0;
/// Backstab only applies within this factor of the attacker's reach.
const BACKSTAB_RANGE_FACTOR: f32 = 1.5;
/// Charge attack damage multiplier.
const CHARGE_MULTIPLIER: f32 = 3.0;
/// Bonus multiplier against a staggered target.
const STAGGER_BONUS_MULTIPLIER: f32 = 1.5;
/// Fraction of HP damage applied to poise when no explicit value is given.
const DEFAULT_POISE_FRACTION: f32 = 0.5;
/// Seconds after taking poise damage before regeneration resumes.
pub const POISE_REGEN_DELAY: f32 = 2.0;
/// Poise regenerated per second once the delay has elapsed.
pub const POISE_REGEN_RATE: f32 = 10.0;
/// How long a stagger lasts before auto-clearing.
pub const STAGGER_DURATION: f32 = 1.5;

/// Damage types dealt by weapons and siege equipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DamageType {
    Slash,
    Pierce,
    Blunt,
    Siege,
}

impl DamageType {
    /// Multiplier against unarmored targets.
    fn vs_unarmored(&self) -> f32 {
        match self {
            DamageType::Slash => 1.25,
            DamageType::Pierce => 1.1,
            DamageType::Blunt => 0.9,
            DamageType::Siege => 0.8,
        }
    }

    /// Multiplier against heavy armor.
    fn vs_heavy(&self) -> f32 {
        match self {
            DamageType::Slash => 0.6,
            DamageType::Pierce => 0.9,
            DamageType::Blunt => 1.3,
            DamageType::Siege => 0.8,
        }
    }

    /// Multiplier against fortifications (gates, walls, engines).
    fn vs_fortified(&self) -> f32 {
        match self {
            DamageType::Slash => 0.2,
            DamageType::Pierce => 0.1,
            DamageType::Blunt => 0.6,
            DamageType::Siege => 2.5,
        }
    }

    /// How effective this type is against grouped targets (AoE scaling).
    pub fn group_multiplier(&self) -> f32 {
        match self {
            DamageType::Slash => 1.0,
            DamageType::Pierce => 0.7,
            DamageType::Blunt => 1.2,
            DamageType::Siege => 1.5,
        }
    }
}

/// Damage multiplier for a damage type against an armor class.
/// Light armor interpolates as the average of unarmored and heavy.
pub fn armor_multiplier(damage_type: DamageType, armor: ArmorClass) -> f32 {
    match armor {
        ArmorClass::Unarmored => damage_type.vs_unarmored(),
        ArmorClass::Light => (damage_type.vs_unarmored() + damage_type.vs_heavy()) / 2.0,
        ArmorClass::Heavy => damage_type.vs_heavy(),
        ArmorClass::Fortified => damage_type.vs_fortified(),
    }
}

/// Attacker state needed for positional modifiers.
#[derive(Debug, Clone, Copy)]
pub struct AttackerContext {
    pub position: Position,
    pub attack_range: f32,
}

/// Target state needed for positional modifiers.
#[derive(Debug, Clone, Copy)]
pub struct TargetContext {
    pub position: Position,
    pub facing: Facing,
    pub staggered: bool,
}

/// Whether the attacker is behind the target and close enough for a backstab.
fn is_backstab(attacker: &AttackerContext, target: &TargetContext) -> bool {
    let dist = attacker.position.distance_to(&target.position);
    if dist > attacker.attack_range * BACKSTAB_RANGE_FACTOR {
        return false;
    }
    let angle = target
        .facing
        .horizontal_angle_to(&target.position, &attacker.position);
    angle > BACKSTAB_ANGLE
}

/// Calculate final damage from base damage and modifiers, applied in order:
/// type-vs-armor table, backstab, charge, stagger bonus.
pub fn calculate_damage(
    base: f32,
    damage_type: DamageType,
    armor: ArmorClass,
    attacker: Option<&AttackerContext>,
    target: Option<&TargetContext>,
    is_charging: bool,
) -> f32 {
    let mut damage = base * armor_multiplier(damage_type, armor);

    if let (Some(attacker), Some(target)) = (attacker, target) {
        if is_backstab(attacker, target) {
            damage *= BACKSTAB_MULTIPLIER;
        }
    }

    if is_charging {
        damage *= CHARGE_MULTIPLIER;
    }

    if target.map(|t| t.staggered).unwrap_or(false) {
        damage *= STAGGER_BONUS_MULTIPLIER;
    }

    damage
}

/// Outcome of a single `apply_damage` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CombatResult {
    pub damage_dealt: f32,
    pub killed: bool,
    /// True only on the call that caused the stagger transition.
    pub staggered: bool,
    pub was_already_staggered: bool,
}

/// Apply damage to a unit's health and poise pools.
///
/// Poise damage defaults to half the HP damage. The stagger transition
/// fires exactly once, on the call that first drains poise to zero; a
/// target that is already staggered never re-triggers it.
pub fn apply_damage(
    health: &mut Health,
    poise: &mut Poise,
    stagger: &mut StaggerState,
    damage: f32,
    poise_damage: Option<f32>,
) -> CombatResult {
    let was_already_staggered = stagger.staggered;
    health.damage(damage);
    let killed = !health.is_alive();

    let mut newly_staggered = false;
    let poise_damage = poise_damage.unwrap_or(damage * DEFAULT_POISE_FRACTION);
    if !killed && poise_damage > 0.0 {
        poise.current = (poise.current - poise_damage).max(0.0);
        poise.regen_delay = POISE_REGEN_DELAY;
        if poise.is_exhausted() && !stagger.staggered {
            stagger.staggered = true;
            stagger.remaining = STAGGER_DURATION;
            newly_staggered = true;
        }
    }

    CombatResult {
        damage_dealt: damage,
        killed,
        staggered: newly_staggered,
        was_already_staggered,
    }
}

/// Area damage at `distance` from the blast center: linear falloff scaled
/// by the damage type's group multiplier. Zero at or beyond the radius.
pub fn aoe_damage_at(distance: f32, radius: f32, base_damage: f32, damage_type: DamageType) -> f32 {
    if radius <= 0.0 || distance >= radius {
        return 0.0;
    }
    let falloff = 1.0 - distance / radius;
    base_damage * falloff * damage_type.group_multiplier()
}

/// System that regenerates poise after the post-hit delay. Staggered units
/// do not regenerate.
pub fn poise_regen_system(dt: Res<DeltaTime>, mut query: Query<(&mut Poise, &StaggerState)>) {
    let delta = dt.0;
    for (mut poise, stagger) in query.iter_mut() {
        if stagger.staggered {
            continue;
        }
        if poise.regen_delay > 0.0 {
            poise.regen_delay = (poise.regen_delay - delta).max(0.0);
            continue;
        }
        if poise.current < poise.max {
            poise.current = (poise.current + POISE_REGEN_RATE * delta).min(poise.max);
        }
    }
}

/// System that counts down stagger and clears it when the timer expires.
/// Poise is restored to full on recovery.
pub fn stagger_update_system(dt: Res<DeltaTime>, mut query: Query<(&mut StaggerState, &mut Poise)>) {
    let delta = dt.0;
    for (mut stagger, mut poise) in query.iter_mut() {
        if !stagger.staggered {
            continue;
        }
        stagger.remaining -= delta;
        if stagger.remaining <= 0.0 {
            stagger.staggered = false;
            stagger.remaining = 0.0;
            poise.current = poise.max;
            poise.regen_delay = 0.0;
        }
    }
}
