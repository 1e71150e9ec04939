//! Voxel grid queries - block classification, occlusion, and line of sight.
//!
//! The coordination layer never owns world generation; it consumes the grid
//! through the [`OcclusionGrid`] trait. [`VoxelGrid`] is a reference
//! implementation backing tests and demos.

use crate::components::Position;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Maximum ray-march range for line-of-sight checks (world units).
pub const LOS_MAX_RANGE: f32 = 48.0;

/// Block kinds the coordination layer distinguishes. Anything beyond
/// solidity and opacity (texture, material health) is out of scope here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Block {
    #[default]
    Air,
    Stone,
    Wood,
    Dirt,
    /// Solid but see-through.
    Window,
    /// Climbable and see-through.
    Stairs,
}

impl Block {
    /// Whether the block physically fills its cell (blocks sound).
    pub fn is_solid(&self) -> bool {
        !matches!(self, Block::Air)
    }

    /// Whether the block blocks vision. Windows and stairs are solid
    /// but transparent.
    pub fn is_opaque(&self) -> bool {
        matches!(self, Block::Stone | Block::Wood | Block::Dirt)
    }
}

/// Grid-occlusion query consumed by the sighting and sound systems.
pub trait OcclusionGrid {
    fn block_at(&self, x: f32, y: f32, z: f32) -> Block;

    fn is_solid_at(&self, x: f32, y: f32, z: f32) -> bool {
        self.block_at(x, y, z).is_solid()
    }

    fn is_opaque_at(&self, x: f32, y: f32, z: f32) -> bool {
        self.block_at(x, y, z).is_opaque()
    }
}

/// Dense axis-aligned block grid. Coordinates outside the grid read as air.
#[derive(Debug, Clone)]
pub struct VoxelGrid {
    width: usize,
    height: usize,
    depth: usize,
    /// World position of the grid's minimum corner.
    origin: Position,
    blocks: Vec<Block>,
}

impl VoxelGrid {
    /// Create an all-air grid of `width × height × depth` cells (1 unit each).
    pub fn new(width: usize, height: usize, depth: usize, origin: Position) -> Self {
        Self {
            width,
            height,
            depth,
            origin,
            blocks: vec![Block::Air; width * height * depth],
        }
    }

    fn index(&self, x: f32, y: f32, z: f32) -> Option<usize> {
        let cx = (x - self.origin.x).floor();
        let cy = (y - self.origin.y).floor();
        let cz = (z - self.origin.z).floor();
        if cx < 0.0 || cy < 0.0 || cz < 0.0 {
            return None;
        }
        let (cx, cy, cz) = (cx as usize, cy as usize, cz as usize);
        if cx >= self.width || cy >= self.height || cz >= self.depth {
            return None;
        }
        Some((cy * self.depth + cz) * self.width + cx)
    }

    pub fn set_block(&mut self, x: f32, y: f32, z: f32, block: Block) {
        if let Some(i) = self.index(x, y, z) {
            self.blocks[i] = block;
        }
    }

    /// Fill an axis-aligned box of cells, inclusive of both corners.
    pub fn fill(&mut self, min: Position, max: Position, block: Block) {
        let mut y = min.y;
        while y <= max.y {
            let mut z = min.z;
            while z <= max.z {
                let mut x = min.x;
                while x <= max.x {
                    self.set_block(x, y, z, block);
                    x += 1.0;
                }
                z += 1.0;
            }
            y += 1.0;
        }
    }
}

impl OcclusionGrid for VoxelGrid {
    fn block_at(&self, x: f32, y: f32, z: f32) -> Block {
        self.index(x, y, z)
            .map(|i| self.blocks[i])
            .unwrap_or(Block::Air)
    }
}

/// Resource wrapper allowing shared grid access from ECS systems.
#[derive(Resource, Clone)]
pub struct VoxelResource(pub Arc<std::sync::RwLock<VoxelGrid>>);

impl VoxelResource {
    pub fn new(grid: VoxelGrid) -> Self {
        Self(Arc::new(std::sync::RwLock::new(grid)))
    }

    pub fn block_at(&self, x: f32, y: f32, z: f32) -> Block {
        self.0
            .read()
            .map(|g| g.block_at(x, y, z))
            .unwrap_or(Block::Air)
    }

    pub fn has_line_of_sight(&self, from: &Position, to: &Position) -> bool {
        self.0
            .read()
            .map(|g| has_line_of_sight(&*g, from, to, LOS_MAX_RANGE))
            .unwrap_or(true)
    }
}

impl OcclusionGrid for VoxelResource {
    fn block_at(&self, x: f32, y: f32, z: f32) -> Block {
        VoxelResource::block_at(self, x, y, z)
    }
}

/// Ray-march in unit steps from `from` to `to`, rejecting when any sampled
/// block is opaque. Targets beyond `max_range` are never visible.
pub fn has_line_of_sight(
    grid: &impl OcclusionGrid,
    from: &Position,
    to: &Position,
    max_range: f32,
) -> bool {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let dz = to.z - from.z;
    let dist = (dx * dx + dy * dy + dz * dz).sqrt();

    if dist > max_range {
        return false;
    }
    if dist < 1.0 {
        return true;
    }

    let steps = dist.floor() as usize;
    for i in 1..=steps {
        let t = i as f32 / dist;
        let x = from.x + dx * t;
        let y = from.y + dy * t;
        let z = from.z + dz * t;
        if grid.is_opaque_at(x, y, z) {
            return false;
        }
    }

    true
}
