//! Double-buffered scalar fields and their aggregates.
//!
//! A [`Field`] holds two same-shaped grids. Readers always go through
//! [`Field::source`]; solver passes write [`Field::destination`] and then call
//! [`Field::swap`], which only flips an index.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::grid::Grid3D;

/// Per-field tuning scalars. No validation is applied.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FluidProperties {
    /// Diffusion rate per unit time
    pub diffusion: f32,
    /// Advection rate multiplier
    pub advection: f32,
    /// Free force multiplier (unused by the built-in passes)
    pub force: f32,
    /// Fraction of velocity lost per unit time
    pub decay: f32,
}

/// Velocity component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Gas species tracked by the solver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Species {
    Primary,
    Secondary,
    Tertiary,
    Contaminant,
}

impl Species {
    pub const ALL: [Species; 4] = [
        Species::Primary,
        Species::Secondary,
        Species::Tertiary,
        Species::Contaminant,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Species::Primary => "primary",
            Species::Secondary => "secondary",
            Species::Tertiary => "tertiary",
            Species::Contaminant => "contaminant",
        }
    }
}

/// Source/destination pair of scalar grids.
#[derive(Clone, Debug)]
pub struct Field {
    buffers: [Grid3D<f32>; 2],
    current: usize,
    pub properties: FluidProperties,
}

impl Field {
    pub fn new(width: usize, height: usize, depth: usize) -> Self {
        let grid = Grid3D::new(width, height, depth, 0.0);
        Self {
            buffers: [grid.clone(), grid],
            current: 0,
            properties: FluidProperties::default(),
        }
    }

    #[inline]
    pub fn source(&self) -> &Grid3D<f32> {
        &self.buffers[self.current]
    }

    #[inline]
    pub fn source_mut(&mut self) -> &mut Grid3D<f32> {
        &mut self.buffers[self.current]
    }

    #[inline]
    pub fn destination(&self) -> &Grid3D<f32> {
        &self.buffers[1 - self.current]
    }

    #[inline]
    pub fn destination_mut(&mut self) -> &mut Grid3D<f32> {
        &mut self.buffers[1 - self.current]
    }

    /// Borrow the source for reading and the destination for writing at once.
    pub fn split_mut(&mut self) -> (&Grid3D<f32>, &mut Grid3D<f32>) {
        let (first, second) = self.buffers.split_at_mut(1);
        if self.current == 0 {
            (&first[0], &mut second[0])
        } else {
            (&second[0], &mut first[0])
        }
    }

    /// Exchange source and destination roles.
    #[inline]
    pub fn swap(&mut self) {
        self.current = 1 - self.current;
    }

    /// Fill both buffers with `value`.
    pub fn reset(&mut self, value: f32) {
        for buffer in &mut self.buffers {
            buffer.fill(value);
        }
    }

    /// Make the destination an exact copy of the source.
    pub fn copy_source_to_destination(&mut self) {
        let (src, dst) = self.split_mut();
        dst.copy_from(src);
    }
}

/// Read-only view of the three velocity source grids.
#[derive(Clone, Copy, Debug)]
pub struct FlowView<'a> {
    pub x: &'a Grid3D<f32>,
    pub y: &'a Grid3D<f32>,
    pub z: &'a Grid3D<f32>,
}

impl FlowView<'_> {
    #[inline]
    pub fn at(&self, x: usize, y: usize, z: usize) -> Vec3 {
        Vec3::new(
            self.x.element(x, y, z),
            self.y.element(x, y, z),
            self.z.element(x, y, z),
        )
    }

    #[inline]
    pub fn dims(&self) -> (usize, usize, usize) {
        self.x.dims()
    }
}

/// Three velocity components sharing one property block.
#[derive(Clone, Debug)]
pub struct VelocityField {
    axes: [Field; 3],
    pub properties: FluidProperties,
}

impl VelocityField {
    pub fn new(width: usize, height: usize, depth: usize) -> Self {
        Self {
            axes: [
                Field::new(width, height, depth),
                Field::new(width, height, depth),
                Field::new(width, height, depth),
            ],
            properties: FluidProperties::default(),
        }
    }

    #[inline]
    pub fn axis(&self, axis: Axis) -> &Field {
        &self.axes[axis.index()]
    }

    #[inline]
    pub fn axis_mut(&mut self, axis: Axis) -> &mut Field {
        &mut self.axes[axis.index()]
    }

    pub fn axes_mut(&mut self) -> &mut [Field; 3] {
        &mut self.axes
    }

    /// Velocity vector read from the three source grids.
    #[inline]
    pub fn source_vector(&self, x: usize, y: usize, z: usize) -> Vec3 {
        self.flow().at(x, y, z)
    }

    pub fn flow(&self) -> FlowView<'_> {
        FlowView {
            x: self.axes[0].source(),
            y: self.axes[1].source(),
            z: self.axes[2].source(),
        }
    }

    /// Swap all three axes.
    pub fn swap(&mut self) {
        for field in &mut self.axes {
            field.swap();
        }
    }

    pub fn swap_axis(&mut self, axis: Axis) {
        self.axes[axis.index()].swap();
    }

    pub fn reset(&mut self, value: f32) {
        for field in &mut self.axes {
            field.reset(value);
        }
    }
}

/// Four species concentrations sharing one property block.
#[derive(Clone, Debug)]
pub struct SpeciesField {
    species: [Field; 4],
    pub properties: FluidProperties,
}

impl SpeciesField {
    pub fn new(width: usize, height: usize, depth: usize) -> Self {
        Self {
            species: [
                Field::new(width, height, depth),
                Field::new(width, height, depth),
                Field::new(width, height, depth),
                Field::new(width, height, depth),
            ],
            properties: FluidProperties::default(),
        }
    }

    #[inline]
    pub fn species(&self, species: Species) -> &Field {
        &self.species[species.index()]
    }

    #[inline]
    pub fn species_mut(&mut self, species: Species) -> &mut Field {
        &mut self.species[species.index()]
    }

    pub fn fields_mut(&mut self) -> &mut [Field; 4] {
        &mut self.species
    }

    /// Swap all four species together.
    pub fn swap(&mut self) {
        for field in &mut self.species {
            field.swap();
        }
    }

    pub fn reset(&mut self, value: f32) {
        for field in &mut self.species {
            field.reset(value);
        }
    }

    /// Sum of the four source concentrations at a cell.
    #[inline]
    pub fn pressure_at(&self, x: usize, y: usize, z: usize) -> f32 {
        self.species
            .iter()
            .map(|field| field.source().element(x, y, z))
            .sum()
    }

    /// Species sum over the whole grid, built with elementwise grid ops.
    pub fn pressure_grid(&self) -> Grid3D<f32> {
        let [first, rest @ ..] = &self.species;
        rest.iter()
            .fold(first.source().clone(), |acc, field| acc + field.source())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swap_exchanges_roles() {
        let mut field = Field::new(3, 3, 3);
        field.destination_mut()[(1, 1, 1)] = 42.0;
        assert_eq!(field.source().element(1, 1, 1), 0.0);

        field.swap();
        assert_eq!(field.source().element(1, 1, 1), 42.0);
        assert_eq!(field.destination().element(1, 1, 1), 0.0);

        field.swap();
        assert_eq!(field.source().element(1, 1, 1), 0.0);
    }

    #[test]
    fn test_split_mut_tracks_current() {
        let mut field = Field::new(2, 2, 2);
        field.source_mut().fill(1.0);
        field.swap();
        field.source_mut().fill(2.0);

        let (src, dst) = field.split_mut();
        assert_eq!(src.element(0, 0, 0), 2.0);
        dst.fill(3.0);
        assert_eq!(field.destination().element(1, 1, 1), 3.0);
    }

    #[test]
    fn test_reset_fills_both() {
        let mut field = Field::new(2, 2, 2);
        field.reset(5.0);
        assert_eq!(field.source().sum(), 40.0);
        assert_eq!(field.destination().sum(), 40.0);
    }

    #[test]
    fn test_velocity_swap_axis_independent() {
        let mut velocity = VelocityField::new(3, 3, 3);
        velocity.axis_mut(Axis::Y).destination_mut()[(1, 1, 1)] = 2.0;
        velocity.swap_axis(Axis::Y);

        assert_eq!(velocity.source_vector(1, 1, 1), Vec3::new(0.0, 2.0, 0.0));

        velocity.axis_mut(Axis::X).destination_mut()[(1, 1, 1)] = 1.0;
        velocity.swap();
        // Y swapped back to its zero buffer, X picked up the write
        assert_eq!(velocity.source_vector(1, 1, 1), Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_species_pressure() {
        let mut species = SpeciesField::new(3, 3, 3);
        for (i, s) in Species::ALL.into_iter().enumerate() {
            species.species_mut(s).source_mut()[(1, 2, 0)] = (i + 1) as f32;
        }

        assert_eq!(species.pressure_at(1, 2, 0), 10.0);
        assert_eq!(species.pressure_grid().element(1, 2, 0), 10.0);
        assert_eq!(species.pressure_grid().element(0, 0, 0), 0.0);
    }
}
