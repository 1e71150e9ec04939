//! Siege Sim - Tactical Coordination Core
//!
//! A fixed-timestep ECS simulation of the army-scale intelligence behind a
//! castle siege: combat resolution, formation geometry, sound propagation,
//! sighting relays, alert broadcast, morale, and siege escalation. Uses
//! `bevy_ecs` for the entity-component-system architecture; rendering,
//! pathfinding, and per-unit behavior live in the consuming game loop.

pub mod api;
pub mod components;
pub mod spatial;
pub mod systems;
pub mod voxel;
pub mod world;

pub use api::SimWorld;
pub use components::*;
pub use spatial::{SpatialEntry, SpatialGrid};
pub use systems::*;
pub use voxel::{has_line_of_sight, Block, OcclusionGrid, VoxelGrid, VoxelResource};
pub use world::Snapshot;
