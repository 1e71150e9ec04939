//! Formation layout - per-group slot geometry.
//!
//! Slot positions are cached and guarded by a dirty flag: membership,
//! center, facing, or formation-type changes mark the cache dirty, and
//! `slots()` recomputes on the next read. Nothing here runs per tick.

use crate::components::{Facing, Position};
use bevy_ecs::prelude::*;
use std::collections::HashMap;

/// Spacing between adjacent slots in world units.
const SLOT_SPACING: f32 = 2.0;
/// Number of units per row in the square formation.
const SQUARE_WIDTH: usize = 5;
/// Golden angle in degrees, used by the scattered layout.
const GOLDEN_ANGLE_DEG: f32 = 137.5;

/// Available formation shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormationType {
    Line,
    Wedge,
    Square,
    Column,
    Scattered,
}

/// Identifier for a formation in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FormationId(pub u32);

/// A unit's membership in a formation. `slot` is `None` until assigned
/// and is always `< member count` when set.
#[derive(Component, Debug, Clone, Copy)]
pub struct FormationAssignment {
    pub formation: FormationId,
    pub slot: Option<usize>,
}

/// A group of units holding a geometric shape.
#[derive(Debug, Clone)]
pub struct Formation {
    formation_type: FormationType,
    center: Position,
    facing: Facing,
    members: Vec<Entity>,
    slots: Vec<Position>,
    dirty: bool,
}

impl Formation {
    pub fn new(formation_type: FormationType, center: Position, facing: Facing) -> Self {
        Self {
            formation_type,
            center,
            facing,
            members: Vec::new(),
            slots: Vec::new(),
            dirty: true,
        }
    }

    pub fn formation_type(&self) -> FormationType {
        self.formation_type
    }

    pub fn center(&self) -> Position {
        self.center
    }

    pub fn members(&self) -> &[Entity] {
        &self.members
    }

    pub fn set_formation_type(&mut self, formation_type: FormationType) {
        if self.formation_type != formation_type {
            self.formation_type = formation_type;
            self.dirty = true;
        }
    }

    pub fn set_center(&mut self, center: Position) {
        if self.center != center {
            self.center = center;
            self.dirty = true;
        }
    }

    pub fn set_facing(&mut self, facing: Facing) {
        self.facing = facing;
        self.dirty = true;
    }

    pub fn add_member(&mut self, entity: Entity) {
        if !self.members.contains(&entity) {
            self.members.push(entity);
            self.dirty = true;
        }
    }

    pub fn remove_member(&mut self, entity: Entity) {
        let before = self.members.len();
        self.members.retain(|m| *m != entity);
        if self.members.len() != before {
            self.dirty = true;
        }
    }

    /// Target position for a member index, recomputing the slot cache if
    /// anything changed since the last read.
    pub fn slot_for(&mut self, index: usize) -> Option<Position> {
        self.slots().get(index).copied()
    }

    /// All slot positions, one per member index. Lazily recomputed.
    pub fn slots(&mut self) -> &[Position] {
        if self.dirty {
            self.recompute_slots();
            self.dirty = false;
        }
        &self.slots
    }

    /// True iff every member is within `tolerance` of its slot.
    /// `positions` is indexed like `members`; a missing position (dead or
    /// despawned member) counts as out of place.
    pub fn is_intact(&mut self, tolerance: f32, positions: &[Option<Position>]) -> bool {
        let slots = self.slots().to_vec();
        for (i, slot) in slots.iter().enumerate() {
            match positions.get(i).copied().flatten() {
                Some(pos) if pos.distance_to(slot) <= tolerance => {}
                _ => return false,
            }
        }
        true
    }

    fn recompute_slots(&mut self) {
        let count = self.members.len();
        self.slots.clear();
        self.slots.reserve(count);

        // Horizontal right vector perpendicular to facing.
        let (fx, fz) = horizontal_facing(&self.facing);
        let (rx, rz) = (fz, -fx);
        let c = self.center;

        match self.formation_type {
            FormationType::Line => {
                // Symmetric about the center along the right axis.
                let half = (count as f32 - 1.0) / 2.0;
                for i in 0..count {
                    let offset = (i as f32 - half) * SLOT_SPACING;
                    self.slots.push(Position::new(
                        c.x + rx * offset,
                        c.y,
                        c.z + rz * offset,
                    ));
                }
            }
            FormationType::Wedge => {
                // Member 0 at the tip; the rest alternate left/right in
                // progressively wider rows behind it.
                for i in 0..count {
                    if i == 0 {
                        self.slots.push(c);
                        continue;
                    }
                    let row = (i + 1) / 2;
                    let side = if i % 2 == 1 { 1.0 } else { -1.0 };
                    let back = row as f32 * SLOT_SPACING;
                    let out = side * row as f32 * SLOT_SPACING;
                    self.slots.push(Position::new(
                        c.x - fx * back + rx * out,
                        c.y,
                        c.z - fz * back + rz * out,
                    ));
                }
            }
            FormationType::Square => {
                let half = (SQUARE_WIDTH as f32 - 1.0) / 2.0;
                for i in 0..count {
                    let row = i / SQUARE_WIDTH;
                    let col = i % SQUARE_WIDTH;
                    let out = (col as f32 - half) * SLOT_SPACING;
                    let back = row as f32 * SLOT_SPACING;
                    self.slots.push(Position::new(
                        c.x + rx * out - fx * back,
                        c.y,
                        c.z + rz * out - fz * back,
                    ));
                }
            }
            FormationType::Column => {
                // Single file behind the leader.
                for i in 0..count {
                    let back = i as f32 * SLOT_SPACING;
                    self.slots.push(Position::new(
                        c.x - fx * back,
                        c.y,
                        c.z - fz * back,
                    ));
                }
            }
            FormationType::Scattered => {
                // Golden-angle spiral: deterministic pseudo-random spacing.
                for i in 0..count {
                    let angle = (i as f32 * GOLDEN_ANGLE_DEG).to_radians();
                    let radius = SLOT_SPACING * (i as f32).sqrt();
                    self.slots.push(Position::new(
                        c.x + radius * angle.cos(),
                        c.y,
                        c.z + radius * angle.sin(),
                    ));
                }
            }
        }
    }
}

/// Horizontal unit vector for a facing; falls back to +z when the facing
/// is vertical.
fn horizontal_facing(facing: &Facing) -> (f32, f32) {
    let mag = (facing.x * facing.x + facing.z * facing.z).sqrt();
    if mag < 0.0001 {
        (0.0, 1.0)
    } else {
        (facing.x / mag, facing.z / mag)
    }
}

/// Resource holding all active formations.
#[derive(Resource, Debug, Default)]
pub struct FormationRegistry {
    formations: HashMap<FormationId, Formation>,
    next_id: u32,
}

impl FormationRegistry {
    pub fn create(
        &mut self,
        formation_type: FormationType,
        center: Position,
        facing: Facing,
    ) -> FormationId {
        let id = FormationId(self.next_id);
        self.next_id += 1;
        self.formations
            .insert(id, Formation::new(formation_type, center, facing));
        id
    }

    pub fn get(&self, id: FormationId) -> Option<&Formation> {
        self.formations.get(&id)
    }

    pub fn get_mut(&mut self, id: FormationId) -> Option<&mut Formation> {
        self.formations.get_mut(&id)
    }

    pub fn disband(&mut self, id: FormationId) {
        self.formations.remove(&id);
    }

    pub fn count(&self) -> usize {
        self.formations.len()
    }
}
