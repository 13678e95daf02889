//! Immutable copies of a completed frame, for readers on other threads.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::field::{Axis, Species};
use crate::grid::Grid3D;

/// Concentrations of all four species at one cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AtmosSample {
    pub primary: f32,
    pub secondary: f32,
    pub tertiary: f32,
    pub contaminant: f32,
}

impl AtmosSample {
    /// Total pressure (sum of species).
    pub fn total(&self) -> f32 {
        self.primary + self.secondary + self.tertiary + self.contaminant
    }

    pub fn get(&self, species: Species) -> f32 {
        match species {
            Species::Primary => self.primary,
            Species::Secondary => self.secondary,
            Species::Tertiary => self.tertiary,
            Species::Contaminant => self.contaminant,
        }
    }
}

/// Source grids of one frame.
#[derive(Clone, Debug)]
pub struct AtmosSnapshot {
    pub frame: u64,
    pub species: [Grid3D<f32>; 4],
    pub velocity: [Grid3D<f32>; 3],
}

impl AtmosSnapshot {
    pub fn dims(&self) -> (usize, usize, usize) {
        self.species[0].dims()
    }

    /// Species at a cell, or `None` outside the grid.
    pub fn sample(&self, x: usize, y: usize, z: usize) -> Option<AtmosSample> {
        if !self.species[0].in_bounds(x, y, z) {
            return None;
        }

        let at = |s: Species| self.species[s.index()].element(x, y, z);
        Some(AtmosSample {
            primary: at(Species::Primary),
            secondary: at(Species::Secondary),
            tertiary: at(Species::Tertiary),
            contaminant: at(Species::Contaminant),
        })
    }

    /// Velocity at a cell, or `None` outside the grid.
    pub fn velocity(&self, x: usize, y: usize, z: usize) -> Option<Vec3> {
        if !self.velocity[0].in_bounds(x, y, z) {
            return None;
        }

        let at = |a: Axis| self.velocity[a.index()].element(x, y, z);
        Some(Vec3::new(at(Axis::X), at(Axis::Y), at(Axis::Z)))
    }

    pub fn total_mass(&self, species: Species) -> f64 {
        self.species[species.index()].sum()
    }
}
