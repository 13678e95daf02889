//! Force tests
//!
//! Pressure acceleration, viscous decay and vorticity confinement driven
//! through full solver updates.

use atmos3d::{AtmosSimulation3D, Axis, FlowDirection, Species, Vec3};

fn with_pressure_step(width: usize) -> AtmosSimulation3D {
    let mut sim = AtmosSimulation3D::new(width, 5, 5, 0.1);
    sim.fill_species_with(Species::Primary, |x, y, z| {
        if (x, y, z) == (2, 2, 2) {
            50.0
        } else {
            0.0
        }
    });
    sim.fill_species_with(Species::Secondary, |x, y, z| {
        if (x, y, z) == (2, 2, 2) {
            30.0
        } else {
            0.0
        }
    });
    sim.species_mut().swap();
    sim.set_pressure_accel(1.0);
    sim
}

/// Velocity at the shared face points from high pressure toward low pressure
#[test]
fn test_pressure_drives_flow_to_low_pressure() {
    let mut sim = with_pressure_step(7);
    assert!(sim.pressure(2, 2, 2) > sim.pressure(3, 2, 2));

    sim.update(0.1);

    let high = sim.velocity(2, 2, 2);
    let low = sim.velocity(3, 2, 2);
    assert!(high.x > 0.0, "high-pressure cell should push +x, got {}", high.x);
    assert!(
        high.x + low.x > 0.0,
        "net flow across the face should be +x, got {} + {}",
        high.x,
        low.x
    );

    // 80 * dt * scale on each face of the seeded cell
    assert!((high.x - 16.0).abs() < 1e-4, "vx = {}", high.x);
    assert!((low.x + 8.0).abs() < 1e-4, "vx = {}", low.x);
}

/// Impulses are equal and opposite, so the summed velocity stays zero
#[test]
fn test_pressure_impulse_sums_to_zero() {
    let mut sim = with_pressure_step(7);
    sim.update(0.1);

    for axis in Axis::ALL {
        let total = sim.velocity_field().axis(axis).source().sum();
        assert!(total.abs() < 1e-4, "{:?} total = {}", axis, total);
    }
}

/// No impulse crosses a wall
#[test]
fn test_wall_blocks_pressure_impulse() {
    let mut sim = with_pressure_step(7);
    sim.solids_mut().block_face(2, 2, 2, FlowDirection::X_PLUS);

    sim.update(0.1);

    assert_eq!(sim.velocity(3, 2, 2).x, 0.0);
    // The -x face is still open
    assert!(sim.velocity(2, 2, 2).x > 0.0);
}

/// Decay shrinks velocity by (1 - decay)^dt each update
#[test]
fn test_decay_is_exponential() {
    let mut sim = AtmosSimulation3D::new(5, 5, 5, 0.5);
    sim.velocity_mut().properties.decay = 0.5;
    sim.fill_velocity_with(Axis::Y, |_, _, _| 4.0);
    sim.velocity_mut().swap_axis(Axis::Y);

    sim.step();
    sim.step();

    let expected = 4.0 * 0.5f32.powf(0.5) * 0.5f32.powf(0.5);
    let vy = sim.velocity(2, 2, 2).y;
    assert!((vy - expected).abs() < 1e-5, "vy = {}, expected {}", vy, expected);
}

/// Confinement adds a bounded correction to a sheared flow
#[test]
fn test_vorticity_confinement_bounded() {
    let mut sim = AtmosSimulation3D::new(9, 9, 9, 0.1);
    sim.set_vorticity(0.5);
    sim.fill_velocity_with(Axis::X, |_, y, _| if y < 4 { -1.0 } else { 1.0 });
    sim.velocity_mut().swap_axis(Axis::X);

    sim.update(0.1);

    let mut changed = false;
    for z in 0..9 {
        for y in 0..9 {
            for x in 0..9 {
                let v = sim.velocity(x, y, z);
                assert!(v.is_finite(), "non-finite velocity at ({}, {}, {})", x, y, z);
                // Correction is at most |curl| * scale = 1 * 0.5 per axis
                assert!(v.abs().max_element() <= 1.5 + 1e-5, "v = {:?}", v);
                if v.y != 0.0 {
                    changed = true;
                }
            }
        }
    }
    assert!(changed, "confinement should add a y component somewhere");
}

/// All rates at zero leave the velocity untouched
#[test]
fn test_forces_off_by_default() {
    let mut sim = AtmosSimulation3D::new(6, 6, 6, 0.1);
    sim.fill_velocity_with(Axis::Z, |x, y, z| (x + 2 * y + 3 * z) as f32 * 0.1);
    sim.velocity_mut().swap_axis(Axis::Z);
    let before = sim.velocity(2, 3, 4);

    sim.update(0.1);

    assert_eq!(sim.velocity(2, 3, 4), before);
    assert_eq!(before, Vec3::new(0.0, 0.0, 2.0));
}
