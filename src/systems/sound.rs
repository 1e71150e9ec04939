//! Sound propagation - emission, attenuation, and occlusion.
//!
//! Events are immutable once emitted; intensity at a listener position is
//! computed on demand, never cached. Registered listeners get a push
//! notification at emit time using a cheap distance-only estimate; callers
//! wanting the full occluded value use [`intensity_at`].

use crate::components::{Position, Team};
use crate::systems::SimTime;
use crate::voxel::OcclusionGrid;
use bevy_ecs::prelude::*;

/// Vertical distance weight: sound attenuates faster up/down than sideways.
const VERTICAL_ATTENUATION: f32 = 1.5;
/// Maximum number of occlusion samples along the source-listener segment.
const MAX_OCCLUSION_SAMPLES: usize = 30;
/// Each solid block sampled multiplies occlusion by this factor.
const OCCLUSION_PER_BLOCK: f32 = 0.5;
/// Occlusion below this floors to zero (fully muffled).
const OCCLUSION_FLOOR: f32 = 0.1;
/// Minimum estimated intensity for a listener to be notified.
const NOTIFY_THRESHOLD: f32 = 0.1;

/// Kinds of sound the battle produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundType {
    Combat,
    Explosion,
    Footsteps,
    GateImpact,
    Horn,
    Construction,
}

impl SoundType {
    /// Base audible radius in world units (scaled by event intensity).
    pub fn base_radius(&self) -> f32 {
        match self {
            SoundType::Combat => 20.0,
            SoundType::Explosion => 50.0,
            SoundType::Footsteps => 8.0,
            SoundType::GateImpact => 40.0,
            SoundType::Horn => 60.0,
            SoundType::Construction => 15.0,
        }
    }

    /// How long the event stays live in seconds.
    pub fn lifetime(&self) -> f32 {
        match self {
            SoundType::Combat => 2.0,
            SoundType::Explosion => 4.0,
            SoundType::Footsteps => 0.5,
            SoundType::GateImpact => 3.0,
            SoundType::Horn => 5.0,
            SoundType::Construction => 2.0,
        }
    }
}

/// A sound emitted into the world. Immutable after creation.
#[derive(Debug, Clone, Copy)]
pub struct SoundEvent {
    pub kind: SoundType,
    pub position: Position,
    pub source: Option<Entity>,
    /// Team of the source, when the source is a unit.
    pub team: Option<Team>,
    /// Intensity multiplier applied to radius and heard volume.
    pub intensity: f32,
    pub emitted_at: f32,
    pub expires_at: f32,
}

impl SoundEvent {
    pub fn is_expired(&self, now: f32) -> bool {
        now >= self.expires_at
    }
}

/// Push-style listener for sounds. Units implement this to react without
/// polling the event list.
pub trait SoundListener: Send + Sync {
    fn position(&self) -> Position;
    fn unit(&self) -> Option<Entity>;
    fn on_sound_heard(&mut self, event: &SoundEvent, estimated_intensity: f32);
}

/// Horizontal distance with the vertical component weighted heavier.
fn effective_distance(a: &Position, b: &Position) -> f32 {
    let horiz = a.horizontal_distance_to(b);
    let vert = (a.y - b.y) * VERTICAL_ATTENUATION;
    (horiz * horiz + vert * vert).sqrt()
}

/// Distance-only intensity estimate, no occlusion. Used for the listener
/// notification gate.
pub fn estimate_intensity(event: &SoundEvent, listener: &Position) -> f32 {
    let radius = event.kind.base_radius() * event.intensity;
    if radius <= 0.0 {
        return 0.0;
    }
    let dist = effective_distance(&event.position, listener);
    if dist >= radius {
        return 0.0;
    }
    (1.0 - dist / radius) * event.intensity
}

/// Occlusion factor between two points: samples up to 30 points along the
/// straight line, halving for every solid block and flooring to zero once
/// below 0.1.
pub fn occlusion_between(grid: &impl OcclusionGrid, from: &Position, to: &Position) -> f32 {
    let dist = from.distance_to(to);
    if dist < 1.0 {
        return 1.0;
    }
    let samples = (dist.ceil() as usize).min(MAX_OCCLUSION_SAMPLES);
    let mut occlusion = 1.0;
    for i in 1..=samples {
        let t = i as f32 / (samples + 1) as f32;
        let x = from.x + (to.x - from.x) * t;
        let y = from.y + (to.y - from.y) * t;
        let z = from.z + (to.z - from.z) * t;
        if grid.is_solid_at(x, y, z) {
            occlusion *= OCCLUSION_PER_BLOCK;
            if occlusion < OCCLUSION_FLOOR {
                return 0.0;
            }
        }
    }
    occlusion
}

/// Full intensity of an event at a listener position, in [0, 1].
pub fn intensity_at(
    event: &SoundEvent,
    listener: &Position,
    grid: &impl OcclusionGrid,
) -> f32 {
    let radius = event.kind.base_radius() * event.intensity;
    if radius <= 0.0 {
        return 0.0;
    }
    let dist = effective_distance(&event.position, listener);
    if dist >= radius {
        return 0.0;
    }
    let occlusion = occlusion_between(grid, &event.position, listener);
    ((1.0 - dist / radius) * occlusion * event.intensity).clamp(0.0, 1.0)
}

/// Resource owning the live sound events and registered listeners.
#[derive(Resource, Default)]
pub struct SoundField {
    events: Vec<SoundEvent>,
    listeners: Vec<Box<dyn SoundListener>>,
}

impl SoundField {
    /// Record a sound event and push-notify listeners whose estimated
    /// (distance-only) intensity clears the notify threshold.
    pub fn emit(
        &mut self,
        kind: SoundType,
        position: Position,
        source: Option<Entity>,
        team: Option<Team>,
        intensity: f32,
        now: f32,
    ) -> SoundEvent {
        let event = SoundEvent {
            kind,
            position,
            source,
            team,
            intensity,
            emitted_at: now,
            expires_at: now + kind.lifetime(),
        };
        self.events.push(event);

        for listener in self.listeners.iter_mut() {
            if listener.unit().is_some() && listener.unit() == source {
                continue;
            }
            let estimated = estimate_intensity(&event, &listener.position());
            if estimated >= NOTIFY_THRESHOLD {
                listener.on_sound_heard(&event, estimated);
            }
        }

        event
    }

    pub fn register_listener(&mut self, listener: Box<dyn SoundListener>) {
        self.listeners.push(listener);
    }

    /// Live (unexpired) events.
    pub fn active_events(&self, now: f32) -> impl Iterator<Item = &SoundEvent> {
        self.events.iter().filter(move |e| !e.is_expired(now))
    }

    /// Live events audible (by distance estimate) at a position.
    pub fn audible_at(&self, position: Position, now: f32) -> Vec<(SoundEvent, f32)> {
        self.active_events(now)
            .filter_map(|e| {
                let est = estimate_intensity(e, &position);
                (est > 0.0).then_some((*e, est))
            })
            .collect()
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    fn sweep(&mut self, now: f32) {
        self.events.retain(|e| !e.is_expired(now));
    }
}

/// System that purges expired sound events each tick.
pub fn sound_sweep_system(time: Res<SimTime>, mut field: ResMut<SoundField>) {
    field.sweep(time.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voxel::{Block, VoxelGrid};
    use std::sync::{Arc, Mutex};

    fn open_field() -> VoxelGrid {
        VoxelGrid::new(96, 16, 96, Position::new(-48.0, 0.0, -48.0))
    }

    fn event_at(kind: SoundType, x: f32, z: f32, intensity: f32) -> SoundEvent {
        SoundEvent {
            kind,
            position: Position::new(x, 2.0, z),
            source: None,
            team: None,
            intensity,
            emitted_at: 0.0,
            expires_at: kind.lifetime(),
        }
    }

    #[test]
    fn test_intensity_zero_beyond_radius() {
        let grid = open_field();
        let event = event_at(SoundType::Combat, 0.0, 0.0, 1.0);
        // Combat radius is 20
        let inside = intensity_at(&event, &Position::new(10.0, 2.0, 0.0), &grid);
        let outside = intensity_at(&event, &Position::new(25.0, 2.0, 0.0), &grid);
        assert!(inside > 0.0);
        assert_eq!(outside, 0.0);
    }

    #[test]
    fn test_intensity_scales_radius() {
        let grid = open_field();
        // Half intensity shrinks a 20-radius to 10
        let event = event_at(SoundType::Combat, 0.0, 0.0, 0.5);
        assert_eq!(intensity_at(&event, &Position::new(12.0, 2.0, 0.0), &grid), 0.0);
        assert!(intensity_at(&event, &Position::new(8.0, 2.0, 0.0), &grid) > 0.0);
    }

    #[test]
    fn test_vertical_attenuates_faster() {
        let grid = open_field();
        let event = event_at(SoundType::Combat, 0.0, 0.0, 1.0);
        let level = intensity_at(&event, &Position::new(10.0, 2.0, 0.0), &grid);
        let above = intensity_at(&event, &Position::new(0.0, 12.0, 0.0), &grid);
        assert!(above < level, "10 units up should be quieter than 10 sideways");
    }

    #[test]
    fn test_occlusion_halves_per_block() {
        let mut grid = open_field();
        // One-block-thick wall between source and listener
        grid.fill(
            Position::new(5.0, 0.0, -2.0),
            Position::new(5.0, 8.0, 2.0),
            Block::Stone,
        );
        let from = Position::new(0.0, 2.0, 0.0);
        let to = Position::new(10.0, 2.0, 0.0);
        let occlusion = occlusion_between(&grid, &from, &to);
        assert!((occlusion - 0.5).abs() < 0.26, "roughly one sample in the wall");
        assert!(occlusion < 1.0);
    }

    #[test]
    fn test_occlusion_floors_to_zero() {
        let mut grid = open_field();
        // Thick wall: at least 4 solid samples, 0.5^4 < 0.1
        grid.fill(
            Position::new(3.0, 0.0, -2.0),
            Position::new(12.0, 8.0, 2.0),
            Block::Stone,
        );
        let from = Position::new(0.0, 2.0, 0.0);
        let to = Position::new(16.0, 2.0, 0.0);
        assert_eq!(occlusion_between(&grid, &from, &to), 0.0);
    }

    #[test]
    fn test_estimate_ignores_occlusion() {
        let mut grid = open_field();
        grid.fill(
            Position::new(3.0, 0.0, -2.0),
            Position::new(12.0, 8.0, 2.0),
            Block::Stone,
        );
        let event = event_at(SoundType::Explosion, 0.0, 0.0, 1.0);
        let listener = Position::new(16.0, 2.0, 0.0);
        assert!(estimate_intensity(&event, &listener) > 0.0);
        assert_eq!(intensity_at(&event, &listener, &grid), 0.0);
    }

    struct RecordingListener {
        position: Position,
        heard: Arc<Mutex<Vec<(SoundType, f32)>>>,
    }

    impl SoundListener for RecordingListener {
        fn position(&self) -> Position {
            self.position
        }
        fn unit(&self) -> Option<Entity> {
            None
        }
        fn on_sound_heard(&mut self, event: &SoundEvent, estimated: f32) {
            self.heard.lock().unwrap().push((event.kind, estimated));
        }
    }

    #[test]
    fn test_emit_notifies_listeners_in_range() {
        let mut field = SoundField::default();
        let near_heard = Arc::new(Mutex::new(Vec::new()));
        let far_heard = Arc::new(Mutex::new(Vec::new()));

        field.register_listener(Box::new(RecordingListener {
            position: Position::new(5.0, 0.0, 0.0),
            heard: near_heard.clone(),
        }));
        field.register_listener(Box::new(RecordingListener {
            position: Position::new(500.0, 0.0, 0.0),
            heard: far_heard.clone(),
        }));

        field.emit(SoundType::Horn, Position::new(0.0, 0.0, 0.0), None, None, 1.0, 0.0);

        assert_eq!(near_heard.lock().unwrap().len(), 1);
        assert_eq!(near_heard.lock().unwrap()[0].0, SoundType::Horn);
        assert!(far_heard.lock().unwrap().is_empty());
    }

    #[test]
    fn test_sweep_purges_expired() {
        let mut world = World::new();
        world.insert_resource(SimTime(0.0));
        let mut field = SoundField::default();
        field.emit(SoundType::Footsteps, Position::default(), None, None, 1.0, 0.0);
        field.emit(SoundType::Horn, Position::default(), None, None, 1.0, 0.0);
        world.insert_resource(field);

        let mut schedule = Schedule::default();
        schedule.add_systems(sound_sweep_system);

        // Footsteps expire at 0.5s, horn at 5s
        world.resource_mut::<SimTime>().0 = 1.0;
        schedule.run(&mut world);
        assert_eq!(world.resource::<SoundField>().event_count(), 1);

        world.resource_mut::<SimTime>().0 = 6.0;
        schedule.run(&mut world);
        assert_eq!(world.resource::<SoundField>().event_count(), 0);
    }
}
