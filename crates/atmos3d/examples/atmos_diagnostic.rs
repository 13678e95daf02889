//! Contaminant leak diagnostic.
//!
//! A sealed room split by a wall with one doorway. Contaminant is released in
//! the left half; the run logs how much has crossed into the right half and
//! checks that every species keeps its total.
//!
//! Usage: `cargo run --example atmos_diagnostic [params.json]`

use atmos3d::{uniform_distribution, AtmosParams, AtmosSimulation3D, FlowDirection, Species};
use rand::rngs::StdRng;
use rand::SeedableRng;

const STEPS: usize = 200;

fn right_half_share(sim: &AtmosSimulation3D, species: Species, wall_x: usize) -> f64 {
    let (w, h, d) = sim.dims();
    let mut right = 0.0;
    for z in 0..d {
        for y in 0..h {
            for x in wall_x + 1..w {
                right += sim.concentration(species, x, y, z) as f64;
            }
        }
    }
    right / sim.total_mass(species).max(f64::EPSILON)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let params = match std::env::args().nth(1) {
        Some(path) => AtmosParams::load_json(&path)?,
        None => AtmosParams::with_interior(24, 8, 16),
    };
    log::info!("params: {:?}", params);

    let mut sim = params.build();
    let (w, h, d) = sim.dims();
    let wall_x = w / 2;

    // Wall across the room with a doorway near the floor
    for z in 1..d - 1 {
        for y in 1..h - 1 {
            let doorway = y <= 2 && z.abs_diff(d / 2) <= 1;
            if !doorway {
                sim.solids_mut()
                    .block_face(wall_x, y, z, FlowDirection::X_PLUS);
            }
        }
    }

    // Background air everywhere, contaminant puff in the left half
    let mut rng = StdRng::seed_from_u64(1);
    sim.fill_species_with(Species::Primary, uniform_distribution(&mut rng, 200.0..210.0));
    sim.fill_species_with(Species::Secondary, uniform_distribution(&mut rng, 780.0..790.0));
    sim.fill_species_with(Species::Tertiary, |_, _, _| 1.0);
    let source = (wall_x / 2, h / 2, d / 2);
    sim.fill_species_with(Species::Contaminant, |x, y, z| {
        if (x, y, z) == source {
            5000.0
        } else {
            0.0
        }
    });
    sim.species_mut().swap();

    let initial: Vec<f64> = Species::ALL.iter().map(|&s| sim.total_mass(s)).collect();

    for step in 0..STEPS {
        sim.step();

        if step % 20 == 0 || step == STEPS - 1 {
            let share = right_half_share(&sim, Species::Contaminant, wall_x);
            let v = sim.velocity(wall_x, 1, d / 2);
            log::info!(
                "step {:4}: contaminant past wall {:6.2}%, doorway v = ({:+.3}, {:+.3}, {:+.3})",
                step,
                share * 100.0,
                v.x,
                v.y,
                v.z
            );
        }
    }

    for (species, &start) in Species::ALL.iter().zip(&initial) {
        let end = sim.total_mass(*species);
        let drift = (end - start).abs() / start.max(1.0);
        if drift > 1e-4 {
            log::warn!("{} drifted {:.3e} ({} -> {})", species.name(), drift, start, end);
        } else {
            log::info!("{} conserved ({:.1})", species.name(), end);
        }
    }

    Ok(())
}
