//! Basic demonstration of the siege coordination layer.
//!
//! Run with: cargo run --example basic_demo

use siege_sim::{
    AlertType, BreachKind, DamageType, Facing, FormationType, MoraleEventKind, Position, SimConfig,
    SimWorld, SightingKind, SoundType, Team, UnitRole, VoxelGrid,
};

fn main() {
    println!("=== Siege Sim - Coordination Layer Demo ===\n");

    // A 128x32x128 battlefield with a castle wall for White to defend
    let mut grid = VoxelGrid::new(128, 32, 128, Position::new(-64.0, 0.0, -64.0));
    grid.fill(
        Position::new(-30.0, 0.0, 20.0),
        Position::new(30.0, 8.0, 21.0),
        siege_sim::Block::Stone,
    );

    let mut sim = SimWorld::with_grid(SimConfig::default(), grid);

    // White defends the castle behind the wall
    let white_commander = sim.spawn_unit(Team::White, UnitRole::Commander, 0.0, 0.0, 35.0);
    let mut white_units = vec![white_commander];
    for i in 0..8 {
        let x = -14.0 + (i as f32) * 4.0;
        white_units.push(sim.spawn_unit(Team::White, UnitRole::Guard, x, 0.0, 28.0));
    }

    // Black besieges from the south with a ram
    let black_commander = sim.spawn_unit(Team::Black, UnitRole::Commander, 0.0, 0.0, -35.0);
    let ram = sim.spawn_unit(Team::Black, UnitRole::SiegeEngine, 0.0, 0.0, -20.0);
    let mut black_units = vec![black_commander, ram];
    for i in 0..8 {
        let x = -14.0 + (i as f32) * 4.0;
        black_units.push(sim.spawn_unit(Team::Black, UnitRole::Infantry, x, 0.0, -28.0));
    }

    // Black advances in a wedge behind the ram
    sim.create_formation(
        FormationType::Wedge,
        Position::new(0.0, 0.0, -20.0),
        Facing::new(0.0, 0.0, 1.0),
        &black_units[2..],
    );

    println!("Standoff: escalation (White) = {:?}", sim.escalation_of(Team::White));

    // A White guard spots the ram and the report relays down the wall
    sim.report_sighting(white_units[1], ram, SightingKind::SiegeEngine);
    sim.emit_sound(SoundType::Horn, Position::new(0.0, 0.0, 28.0), Some(white_units[1]), 1.0);
    sim.broadcast_alert(
        white_units[1],
        AlertType::EnemySpotted,
        Position::new(0.0, 0.0, -20.0),
        Some(ram),
    );

    run_for(&mut sim, 2.0);
    println!(
        "After first contact: escalation (White) = {:?}, sightings = {}",
        sim.escalation_of(Team::White),
        sim.sightings_for_team(Team::White).len()
    );

    // Skirmishing at the wall
    for _ in 0..3 {
        let _ = sim.resolve_attack(
            black_units[2],
            white_units[2],
            25.0,
            DamageType::Pierce,
            false,
            None,
        );
        run_for(&mut sim, 0.5);
    }

    // The ram smashes the gate
    sim.emit_sound(SoundType::GateImpact, Position::new(0.0, 0.0, 20.0), Some(ram), 1.0);
    sim.record_breach(BreachKind::Gate, Position::new(0.0, 0.0, 20.0), Team::White);
    sim.record_morale_event(MoraleEventKind::Defeat, Position::new(0.0, 0.0, 25.0), Team::White);
    run_for(&mut sim, 1.0);

    println!(
        "Gate down: escalation (White) = {:?}, rush breach = {}, team morale = {:.2}",
        sim.escalation_of(Team::White),
        sim.should_rush_to_breach(Team::White),
        sim.team_morale(Team::White)
    );

    // Blast at the breach
    let hits = sim.apply_aoe_damage(
        Position::new(0.0, 0.0, 24.0),
        12.0,
        35.0,
        DamageType::Siege,
        Some(ram),
    );
    println!("Siege blast at the breach hit {} units", hits);
    run_for(&mut sim, 2.0);

    println!("\n=== Final State (JSON) ===\n");
    println!("{}", sim.snapshot().to_json_pretty().unwrap_or_default());
}

fn run_for(sim: &mut SimWorld, seconds: f32) {
    let mut remaining = seconds;
    while remaining > 0.0 {
        sim.step(1.0 / 30.0);
        remaining -= 1.0 / 30.0;
    }
}
