//! Explicit 6-neighbour diffusion restricted to open faces.

use rayon::prelude::*;

use crate::constants::is_nearly_zero;
use crate::field::{Field, SpeciesField, VelocityField};
use crate::grid::Grid3D;
use crate::solid::{FlowDirection, SolidMap};

/// Per-iteration diffusion strength, or `None` when the pass should be skipped.
///
/// A non-positive or negligible `dt * diffusion / iterations` is a no-op,
/// including the swap.
pub fn diffusion_force(diffusion: f32, iterations: u32, dt: f32) -> Option<f32> {
    if iterations == 0 || is_nearly_zero(diffusion) {
        return None;
    }

    let force = dt * diffusion / iterations as f32;
    if force <= 0.0 || is_nearly_zero(force) {
        None
    } else {
        Some(force)
    }
}

/// One diffusion step from `src` into `dst`.
///
/// `dst[c] = src[c] + force * (sum of open neighbours - open count * src[c])`.
/// Solid cells, the boundary shell included, keep their value.
pub fn diffuse_grid(src: &Grid3D<f32>, dst: &mut Grid3D<f32>, solids: &SolidMap, force: f32) {
    let (width, height, depth) = src.dims();

    for k in 0..depth {
        for j in 0..height {
            for i in 0..width {
                let center = src.element(i, j, k);

                if solids.is_blocked(i, j, k, FlowDirection::SELF) {
                    dst[(i, j, k)] = center;
                    continue;
                }

                let mut sum = 0.0;
                let mut open = 0.0;
                for dir in FlowDirection::FACES {
                    if !solids.is_face_open(i, j, k, dir) {
                        continue;
                    }
                    if let Some(neighbor) = solids.neighbor(i, j, k, dir) {
                        sum += src[neighbor];
                        open += 1.0;
                    }
                }

                dst[(i, j, k)] = center + force * (sum - open * center);
            }
        }
    }
}

fn diffuse_field(field: &mut Field, solids: &SolidMap, force: f32) {
    let (src, dst) = field.split_mut();
    diffuse_grid(src, dst, solids, force);
}

/// Diffuse the three velocity axes, swapping each axis after every iteration.
pub fn diffuse_velocity(velocity: &mut VelocityField, solids: &SolidMap, iterations: u32, dt: f32) {
    let Some(force) = diffusion_force(velocity.properties.diffusion, iterations, dt) else {
        return;
    };

    for _ in 0..iterations {
        velocity.axes_mut().par_iter_mut().for_each(|field| {
            diffuse_field(field, solids, force);
            field.swap();
        });
    }
}

/// Diffuse the four species, swapping them together after every iteration.
pub fn diffuse_species(species: &mut SpeciesField, solids: &SolidMap, iterations: u32, dt: f32) {
    let Some(force) = diffusion_force(species.properties.diffusion, iterations, dt) else {
        return;
    };

    for _ in 0..iterations {
        species
            .fields_mut()
            .par_iter_mut()
            .for_each(|field| diffuse_field(field, solids, force));
        species.swap();
    }
}
