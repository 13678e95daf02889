//! Body forces on the velocity field: viscous decay, pressure acceleration
//! and vorticity confinement.

use crate::constants::{is_nearly_zero, CURL_EPSILON};
use crate::field::{Axis, SpeciesField, VelocityField};
use crate::grid::Grid3D;
use crate::solid::{FlowDirection, SolidMap};

/// Multiply every velocity source cell by `(1 - decay)^dt`.
pub fn apply_decay(velocity: &mut VelocityField, dt: f32) {
    let decay = velocity.properties.decay;
    if is_nearly_zero(decay) {
        return;
    }

    let factor = (1.0 - decay).powf(dt);
    for axis in Axis::ALL {
        *velocity.axis_mut(axis).source_mut() *= factor;
    }
}

/// Push velocity across open faces from high to low species pressure.
///
/// Every face between two interior cells gets an equal and opposite impulse
/// `dt * scale * (P(c) - P(n))`, so the summed velocity change is zero.
pub fn apply_pressure_acceleration(
    velocity: &mut VelocityField,
    species: &SpeciesField,
    solids: &SolidMap,
    scale: f32,
    dt: f32,
) {
    if is_nearly_zero(scale) {
        return;
    }

    let force = dt * scale;
    let pressure = species.pressure_grid();
    let (width, height, depth) = pressure.dims();

    for axis in Axis::ALL {
        velocity.axis_mut(axis).copy_source_to_destination();
    }

    for k in 1..depth.saturating_sub(1) {
        for j in 1..height.saturating_sub(1) {
            for i in 1..width.saturating_sub(1) {
                let here = pressure.element(i, j, k);

                for axis in Axis::ALL {
                    let (ni, nj, nk) = match axis {
                        Axis::X => (i + 1, j, k),
                        Axis::Y => (i, j + 1, k),
                        Axis::Z => (i, j, k + 1),
                    };
                    if solids.is_boundary(ni, nj, nk)
                        || !solids.is_face_open(i, j, k, FlowDirection::toward(axis, true))
                    {
                        continue;
                    }

                    let impulse = force * (here - pressure.element(ni, nj, nk));
                    let dst = velocity.axis_mut(axis).destination_mut();
                    dst[(i, j, k)] += impulse;
                    dst[(ni, nj, nk)] -= impulse;
                }
            }
        }
    }

    velocity.swap();
}

/// Signed curl at an interior cell, from centred differences of the velocity source.
pub fn curl(velocity: &VelocityField, x: usize, y: usize, z: usize) -> f32 {
    let flow = velocity.flow();
    let x_term = (flow.x.element(x, y + 1, z) - flow.x.element(x, y - 1, z)) * 0.5;
    let y_term = (flow.y.element(x + 1, y, z) - flow.y.element(x - 1, y, z)) * 0.5;
    let z_term = (flow.z.element(x, y, z + 1) - flow.z.element(x, y, z - 1)) * 0.5;
    x_term - y_term - z_term
}

/// Vorticity confinement.
///
/// `curl_magnitude` is scratch space; it ends up holding `|curl|` at interior
/// cells and zero elsewhere.
pub fn apply_vorticity_confinement(
    velocity: &mut VelocityField,
    curl_magnitude: &mut Grid3D<f32>,
    scale: f32,
) {
    if is_nearly_zero(scale) {
        return;
    }

    let (width, height, depth) = curl_magnitude.dims();
    curl_magnitude.fill(0.0);
    for k in 1..depth.saturating_sub(1) {
        for j in 1..height.saturating_sub(1) {
            for i in 1..width.saturating_sub(1) {
                curl_magnitude[(i, j, k)] = curl(velocity, i, j, k).abs();
            }
        }
    }

    for axis in Axis::ALL {
        velocity.axis_mut(axis).destination_mut().fill(0.0);
    }

    for k in 1..depth.saturating_sub(1) {
        for j in 1..height.saturating_sub(1) {
            for i in 1..width.saturating_sub(1) {
                let mut gx = (curl_magnitude.element(i + 1, j, k)
                    - curl_magnitude.element(i - 1, j, k))
                    * 0.5;
                let mut gy = (curl_magnitude.element(i, j + 1, k)
                    - curl_magnitude.element(i, j - 1, k))
                    * 0.5;
                let mut gz = (curl_magnitude.element(i, j, k + 1)
                    - curl_magnitude.element(i, j, k - 1))
                    * 0.5;

                let length = (gx * gx + gy * gy + gz * gz).sqrt() + CURL_EPSILON;
                gx /= length;
                gy /= length;
                gz /= length;

                let magnitude = curl(velocity, i, j, k);
                velocity.axis_mut(Axis::X).destination_mut()[(i, j, k)] = -gy * magnitude;
                velocity.axis_mut(Axis::Y).destination_mut()[(i, j, k)] = gx * magnitude;
                velocity.axis_mut(Axis::Z).destination_mut()[(i, j, k)] = gz * magnitude;
            }
        }
    }

    for axis in Axis::ALL {
        let field = velocity.axis_mut(axis);
        let (src, dst) = field.split_mut();
        *dst *= scale;
        *dst += src;
        field.swap();
    }
}
