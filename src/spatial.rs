//! Spatial partitioning for efficient neighbor queries.
//!
//! Provides O(1) cell lookup and O(k) neighbor queries where k is the number
//! of entities in nearby cells, rather than O(n) for brute force. Cells are
//! keyed on the horizontal plane; the vertical coordinate is kept per entry
//! and participates in the distance test.

use crate::components::Team;
use bevy_ecs::prelude::*;
use std::collections::HashMap;

/// Grid-based spatial partitioning structure.
///
/// Divides the battlefield into cells and tracks which entities are in each
/// cell. Enables fast neighbor queries by only checking nearby cells.
#[derive(Resource, Debug)]
pub struct SpatialGrid {
    /// Cell size in world units.
    pub cell_size: f32,
    /// Map from cell coordinates to list of entities in that cell.
    cells: HashMap<(i32, i32), Vec<SpatialEntry>>,
    /// Reverse lookup: entity to cell.
    entity_cells: HashMap<Entity, (i32, i32)>,
}

/// Entry in a spatial cell.
#[derive(Debug, Clone, Copy)]
pub struct SpatialEntry {
    pub entity: Entity,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub team: Team,
}

impl Default for SpatialGrid {
    fn default() -> Self {
        Self::new(16.0)
    }
}

impl SpatialGrid {
    /// Create a new spatial grid with the given cell size.
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            cells: HashMap::new(),
            entity_cells: HashMap::new(),
        }
    }

    /// Convert world coordinates to cell coordinates.
    #[inline]
    pub fn world_to_cell(&self, x: f32, z: f32) -> (i32, i32) {
        (
            (x / self.cell_size).floor() as i32,
            (z / self.cell_size).floor() as i32,
        )
    }

    /// Clear all entries (call at the start of each tick before rebuilding).
    pub fn clear(&mut self) {
        self.cells.clear();
        self.entity_cells.clear();
    }

    /// Insert an entity at a position.
    pub fn insert(&mut self, entity: Entity, x: f32, y: f32, z: f32, team: Team) {
        let cell = self.world_to_cell(x, z);

        // Remove from old cell if moved
        if let Some(&old_cell) = self.entity_cells.get(&entity) {
            if old_cell != cell {
                if let Some(entries) = self.cells.get_mut(&old_cell) {
                    entries.retain(|e| e.entity != entity);
                }
            }
        }

        let entry = SpatialEntry { entity, x, y, z, team };
        self.cells.entry(cell).or_default().push(entry);
        self.entity_cells.insert(entity, cell);
    }

    /// Remove an entity from the grid.
    pub fn remove(&mut self, entity: Entity) {
        if let Some(cell) = self.entity_cells.remove(&entity) {
            if let Some(entries) = self.cells.get_mut(&cell) {
                entries.retain(|e| e.entity != entity);
            }
        }
    }

    /// Query all entities within a radius of a point.
    /// Returns entries sorted by distance (closest first).
    pub fn query_radius(&self, x: f32, y: f32, z: f32, radius: f32) -> Vec<SpatialEntry> {
        let radius_sq = radius * radius;
        let cells_to_check = (radius / self.cell_size).ceil() as i32 + 1;
        let center_cell = self.world_to_cell(x, z);

        let mut results = Vec::new();

        for dx in -cells_to_check..=cells_to_check {
            for dz in -cells_to_check..=cells_to_check {
                let cell = (center_cell.0 + dx, center_cell.1 + dz);
                if let Some(entries) = self.cells.get(&cell) {
                    for entry in entries {
                        let dist_sq = (entry.x - x).powi(2)
                            + (entry.y - y).powi(2)
                            + (entry.z - z).powi(2);
                        if dist_sq <= radius_sq {
                            results.push(*entry);
                        }
                    }
                }
            }
        }

        results.sort_by(|a, b| {
            let dist_a = (a.x - x).powi(2) + (a.y - y).powi(2) + (a.z - z).powi(2);
            let dist_b = (b.x - x).powi(2) + (b.y - y).powi(2) + (b.z - z).powi(2);
            dist_a.partial_cmp(&dist_b).unwrap_or(std::cmp::Ordering::Equal)
        });

        results
    }

    /// Query enemies within radius (team != given team).
    pub fn query_enemies(&self, x: f32, y: f32, z: f32, radius: f32, team: Team) -> Vec<SpatialEntry> {
        let mut results = self.query_radius(x, y, z, radius);
        results.retain(|e| e.team != team);
        results
    }

    /// Query allies within radius (team == given team).
    pub fn query_allies(&self, x: f32, y: f32, z: f32, radius: f32, team: Team) -> Vec<SpatialEntry> {
        let mut results = self.query_radius(x, y, z, radius);
        results.retain(|e| e.team == team);
        results
    }

    /// Get the nearest enemy to a position.
    pub fn nearest_enemy(&self, x: f32, y: f32, z: f32, max_radius: f32, team: Team) -> Option<SpatialEntry> {
        self.query_enemies(x, y, z, max_radius, team).into_iter().next()
    }

    /// Get total entity count.
    pub fn total_count(&self) -> usize {
        self.entity_cells.len()
    }
}

/// System that rebuilds the spatial grid each tick from living units.
pub fn spatial_grid_update_system(
    mut grid: ResMut<SpatialGrid>,
    query: Query<(
        Entity,
        &crate::components::Position,
        &crate::components::Team,
        &crate::components::Health,
    )>,
) {
    grid.clear();

    for (entity, pos, team, health) in query.iter() {
        if !health.is_alive() {
            continue;
        }
        grid.insert(entity, pos.x, pos.y, pos.z, *team);
    }
}
