//! Semi-Lagrangian transport on the cell grid.
//!
//! Each interior cell with a non-zero velocity is traced to a target position,
//! the target is clamped by [`collide`], and its trilinear stencil is stored in
//! an [`AdvectionPlan`]. The same plan then moves every field that shares the
//! velocity, so displacement always comes from the velocity as it was when the
//! plan was built.
//!
//! ```text
//!      C________D          A = base          E = base + z
//!      |\       |\         B = base + x      F = base + x + z
//!      | \G_____|_\H       C = base + y      G = base + y + z
//!      |  |     |  |       D = base + x + y  H = base + x + y + z
//!      A--|-----B  |
//!       \ |      \ |
//!        \E_______\F
//! ```

use glam::Vec3;
use rayon::prelude::*;

use crate::constants::{is_nearly_zero, MAX_ADVECT, NEARLY_ZERO, STD_DIMENSION};
use crate::field::{Axis, FlowView, SpeciesField, VelocityField};
use crate::grid::Grid3D;
use crate::solid::{FlowDirection, SolidMap};

type Cell = (usize, usize, usize);

/// Corner offsets in A..H order.
const CORNERS: [Cell; 8] = [
    (0, 0, 0),
    (1, 0, 0),
    (0, 1, 0),
    (1, 1, 0),
    (0, 0, 1),
    (1, 0, 1),
    (0, 1, 1),
    (1, 1, 1),
];

/// Scale that keeps advection speed comparable across grid sizes.
///
/// A grid averaging 100 cells per axis gets 1.0.
pub fn advection_scale(width: usize, height: usize, depth: usize) -> f32 {
    ((width + height + depth) as f32 / 3.0) / STD_DIMENSION
}

/// Clamp an advection target against the grid interior and solid flags.
///
/// Returns the corrected target and whether any axis was pulled back.
/// Applying it again to its own output changes nothing.
pub fn collide(solids: &SolidMap, (x, y, z): Cell, target: Vec3) -> (Vec3, bool) {
    let origin = Vec3::new(x as f32, y as f32, z as f32);
    let (width, height, depth) = solids.dims();
    let upper = Vec3::new(width as f32, height as f32, depth as f32) - 2.0;

    let delta = (target - origin).clamp(Vec3::splat(-MAX_ADVECT), Vec3::splat(MAX_ADVECT));
    let mut result = origin + delta;
    let mut collided = false;

    for axis in Axis::ALL {
        let i = axis.index();
        if result[i] < 1.0 || result[i] > upper[i] {
            result[i] = origin[i];
            collided = true;
        }
    }

    if solids.is_blocked(x, y, z, FlowDirection::SELF) {
        return (origin, true);
    }

    for axis in Axis::ALL {
        let i = axis.index();
        let dir = FlowDirection::toward(axis, delta[i] > 0.0);
        if delta[i].abs() > 1.0 && solids.is_blocked(x, y, z, dir) {
            result[i] = origin[i];
            collided = true;
        }
    }

    (result, collided)
}

/// Base cell and the eight corner weights of a position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Trilinear {
    pub base: Cell,
    pub weights: [f32; 8],
}

impl Trilinear {
    /// Stencil of a non-negative position.
    pub fn at(position: Vec3) -> Self {
        let floor = position.floor();
        let frac = position - floor;

        let mut weights = [0.0; 8];
        for (weight, &(dx, dy, dz)) in weights.iter_mut().zip(CORNERS.iter()) {
            let wx = if dx == 0 { 1.0 - frac.x } else { frac.x };
            let wy = if dy == 0 { 1.0 - frac.y } else { frac.y };
            let wz = if dz == 0 { 1.0 - frac.z } else { frac.z };
            *weight = wx * wy * wz;
        }

        Self {
            base: (floor.x as usize, floor.y as usize, floor.z as usize),
            weights,
        }
    }

    /// Corner cells paired with their weights.
    pub fn corners(&self) -> impl Iterator<Item = (Cell, f32)> {
        let (bx, by, bz) = self.base;
        CORNERS
            .iter()
            .zip(self.weights)
            .map(move |(&(dx, dy, dz), w)| ((bx + dx, by + dy, bz + dz), w))
    }
}

#[derive(Clone, Copy, Debug)]
struct PlanEntry {
    origin: Cell,
    stencil: Trilinear,
    collided: bool,
}

/// Precomputed stencils for one velocity field and one signed step length.
#[derive(Clone, Debug)]
pub struct AdvectionPlan {
    entries: Vec<PlanEntry>,
    /// Total weight requested from each cell, used to ration the reverse pass
    requested: Grid3D<f32>,
}

impl AdvectionPlan {
    /// Trace every interior cell by `velocity * force`.
    ///
    /// A near-zero `force` gives an empty plan, which makes every pass a copy.
    pub fn build(flow: FlowView<'_>, solids: &SolidMap, force: f32) -> Self {
        let (width, height, depth) = flow.dims();
        let mut plan = Self {
            entries: Vec::new(),
            requested: Grid3D::new(width, height, depth, 0.0),
        };

        if is_nearly_zero(force) {
            return plan;
        }

        for k in 1..depth.saturating_sub(1) {
            for j in 1..height.saturating_sub(1) {
                for i in 1..width.saturating_sub(1) {
                    let velocity = flow.at(i, j, k);
                    if velocity.abs().max_element() <= NEARLY_ZERO {
                        continue;
                    }

                    let origin = Vec3::new(i as f32, j as f32, k as f32);
                    let (target, collided) = collide(solids, (i, j, k), origin + velocity * force);
                    let stencil = Trilinear::at(target);
                    for (corner, w) in stencil.corners() {
                        plan.requested[corner] += w;
                    }

                    plan.entries.push(PlanEntry {
                        origin: (i, j, k),
                        stencil,
                        collided,
                    });
                }
            }
        }

        plan
    }

    /// Number of cells that move.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of cells whose target was pulled back.
    pub fn collisions(&self) -> usize {
        self.entries.iter().filter(|e| e.collided).count()
    }

    /// Forward advection: push each cell's value into its stencil corners.
    pub fn forward(&self, src: &Grid3D<f32>, dst: &mut Grid3D<f32>) {
        dst.copy_from(src);

        for entry in &self.entries {
            let value = src[entry.origin];
            let mut moved = 0.0;
            for (corner, w) in entry.stencil.corners() {
                let amount = w * value;
                dst[corner] += amount;
                moved += amount;
            }
            dst[entry.origin] -= moved;
        }
    }

    /// Signed reverse advection: pull amounts back out of the stencil corners.
    ///
    /// Works for fields with either sign. Whatever an origin gains, its
    /// corners lose, collision or not.
    pub fn reverse_signed(&self, advected: &Grid3D<f32>, out: &mut Grid3D<f32>) {
        out.copy_from(advected);

        for entry in &self.entries {
            let mut gathered = 0.0;
            for (corner, w) in entry.stencil.corners() {
                let amount = w * advected[corner];
                out[corner] -= amount;
                gathered += amount;
            }
            out[entry.origin] += gathered;
        }
    }

    /// Mass-redistributing reverse advection.
    ///
    /// A corner asked for more than its whole value splits it in proportion
    /// to the requests, so no cell gives away more than it holds.
    pub fn reverse(&self, src: &Grid3D<f32>, dst: &mut Grid3D<f32>) {
        dst.copy_from(src);

        for entry in &self.entries {
            let mut gained = 0.0;
            for (corner, w) in entry.stencil.corners() {
                let granted = w / self.requested[corner].max(1.0);
                let amount = granted * src[corner];
                dst[corner] -= amount;
                gained += amount;
            }
            dst[entry.origin] += gained;
        }
    }
}

/// Self-advect velocity: forward then signed reverse on each axis.
pub fn advect_velocity(velocity: &mut VelocityField, solids: &SolidMap, force: f32) {
    let forward = AdvectionPlan::build(velocity.flow(), solids, force);
    let backward = AdvectionPlan::build(velocity.flow(), solids, -force);

    velocity.axes_mut().par_iter_mut().for_each(|field| {
        let (src, dst) = field.split_mut();
        forward.forward(src, dst);
        field.swap();

        let (src, dst) = field.split_mut();
        backward.reverse_signed(src, dst);
        field.swap();
    });
}

/// Advect all species along the current velocity: forward, swap, reverse, swap.
pub fn advect_species(
    species: &mut SpeciesField,
    flow: FlowView<'_>,
    solids: &SolidMap,
    force: f32,
) {
    let forward = AdvectionPlan::build(flow, solids, force);
    let backward = AdvectionPlan::build(flow, solids, -force);

    species.fields_mut().par_iter_mut().for_each(|field| {
        let (src, dst) = field.split_mut();
        forward.forward(src, dst);
    });
    species.swap();

    species.fields_mut().par_iter_mut().for_each(|field| {
        let (src, dst) = field.split_mut();
        backward.reverse(src, dst);
    });
    species.swap();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform_flow(dims: Cell, v: Vec3) -> [Grid3D<f32>; 3] {
        let (w, h, d) = dims;
        [
            Grid3D::new(w, h, d, v.x),
            Grid3D::new(w, h, d, v.y),
            Grid3D::new(w, h, d, v.z),
        ]
    }

    fn view(grids: &[Grid3D<f32>; 3]) -> FlowView<'_> {
        FlowView {
            x: &grids[0],
            y: &grids[1],
            z: &grids[2],
        }
    }

    #[test]
    fn test_advection_scale() {
        assert!((advection_scale(100, 100, 100) - 1.0).abs() < 1e-6);
        assert!((advection_scale(10, 20, 30) - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_trilinear_weights_sum_to_one() {
        let stencil = Trilinear::at(Vec3::new(2.25, 3.5, 1.75));
        assert_eq!(stencil.base, (2, 3, 1));
        let total: f32 = stencil.weights.iter().sum();
        assert!((total - 1.0).abs() < 1e-6, "weights sum = {}", total);
        // A corner gets (1-fx)(1-fy)(1-fz)
        assert!((stencil.weights[0] - 0.75 * 0.5 * 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_collide_in_range_untouched() {
        let solids = SolidMap::new(8, 8, 8);
        let target = Vec3::new(3.4, 4.0, 2.6);
        let (result, collided) = collide(&solids, (3, 4, 3), target);
        assert_eq!(result, target);
        assert!(!collided);
    }

    #[test]
    fn test_collide_clamps_displacement() {
        let solids = SolidMap::new(10, 10, 10);
        let (result, collided) = collide(&solids, (4, 4, 4), Vec3::new(9.0, 4.0, 4.0));
        assert!(
            (result.x - (4.0 + MAX_ADVECT)).abs() < 1e-6,
            "x = {}",
            result.x
        );
        assert!(!collided);
    }

    #[test]
    fn test_collide_pulls_back_at_boundary() {
        let solids = SolidMap::new(6, 6, 6);
        let (result, collided) = collide(&solids, (4, 2, 1), Vec3::new(5.2, 2.5, 0.3));
        assert_eq!(result, Vec3::new(4.0, 2.5, 1.0));
        assert!(collided);
    }

    #[test]
    fn test_collide_respects_wall() {
        let mut solids = SolidMap::new(8, 8, 8);
        solids.block_face(3, 3, 3, FlowDirection::Y_PLUS);

        // Within one cell the wall is not consulted
        let (short, _) = collide(&solids, (3, 3, 3), Vec3::new(3.0, 3.8, 3.0));
        assert_eq!(short.y, 3.8);

        let (long, collided) = collide(&solids, (3, 3, 3), Vec3::new(3.0, 4.3, 3.0));
        assert_eq!(long.y, 3.0);
        assert!(collided);
    }

    #[test]
    fn test_collide_solid_origin() {
        let mut solids = SolidMap::new(8, 8, 8);
        solids.block_cell(3, 3, 3);
        let (result, collided) = collide(&solids, (3, 3, 3), Vec3::new(3.5, 3.5, 3.5));
        assert_eq!(result, Vec3::splat(3.0));
        assert!(collided);
    }

    #[test]
    fn test_zero_force_plan_is_empty() {
        let solids = SolidMap::new(5, 5, 5);
        let grids = uniform_flow((5, 5, 5), Vec3::ONE);
        let plan = AdvectionPlan::build(view(&grids), &solids, 0.0);
        assert!(plan.is_empty());

        let mut src = Grid3D::new(5, 5, 5, 0.0f32);
        src.fill_with(|x, y, z| (x + y * 2 + z * 3) as f32);
        let mut dst = Grid3D::new(5, 5, 5, -1.0f32);
        plan.forward(&src, &mut dst);
        assert_eq!(dst, src);
    }

    #[test]
    fn test_forward_moves_value_downstream() {
        let solids = SolidMap::new(6, 5, 5);
        let grids = uniform_flow((6, 5, 5), Vec3::new(1.0, 0.0, 0.0));
        let plan = AdvectionPlan::build(view(&grids), &solids, 0.5);

        let mut src = Grid3D::new(6, 5, 5, 0.0f32);
        src[(2, 2, 2)] = 8.0;
        let mut dst = Grid3D::new(6, 5, 5, 0.0f32);
        plan.forward(&src, &mut dst);

        assert!((dst.element(2, 2, 2) - 4.0).abs() < 1e-6);
        assert!((dst.element(3, 2, 2) - 4.0).abs() < 1e-6);
        assert!((dst.sum() - 8.0).abs() < 1e-5);
    }

    #[test]
    fn test_reverse_rations_contended_cell() {
        let solids = SolidMap::new(7, 5, 5);
        // Every interior cell pulls from one cell upstream
        let grids = uniform_flow((7, 5, 5), Vec3::new(1.0, 0.0, 0.0));
        let plan = AdvectionPlan::build(view(&grids), &solids, -1.0);

        // Cell 1 is claimed by itself (pulled back at the wall) and by cell 2
        let mut src = Grid3D::new(7, 5, 5, 0.0f32);
        src[(1, 2, 2)] = 5.0;
        let mut dst = Grid3D::new(7, 5, 5, 0.0f32);
        plan.reverse(&src, &mut dst);

        assert!(
            (dst.element(1, 2, 2) - 2.5).abs() < 1e-5,
            "donor kept {}",
            dst.element(1, 2, 2)
        );
        assert!((dst.element(2, 2, 2) - 2.5).abs() < 1e-5);
        assert!((dst.sum() - 5.0).abs() < 1e-5, "sum = {}", dst.sum());
    }

    #[test]
    fn test_reverse_signed_conserves_signed_total() {
        let solids = SolidMap::new(6, 6, 6);
        let grids = uniform_flow((6, 6, 6), Vec3::new(0.4, -0.7, 0.2));
        let plan = AdvectionPlan::build(view(&grids), &solids, -1.0);

        let mut advected = Grid3D::new(6, 6, 6, 0.0f32);
        advected.fill_with(|x, y, z| x as f32 - y as f32 * 0.5 + z as f32 * 0.25);
        let mut out = Grid3D::new(6, 6, 6, 0.0f32);
        plan.reverse_signed(&advected, &mut out);

        assert!(
            (out.sum() - advected.sum()).abs() < 1e-3,
            "before {} after {}",
            advected.sum(),
            out.sum()
        );
    }
}
