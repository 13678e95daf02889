//! Solver tuning, loadable from JSON.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ParamsError;
use crate::field::FluidProperties;
use crate::AtmosSimulation3D;

/// Everything needed to construct and tune a solver.
///
/// Missing JSON keys fall back to [`AtmosParams::default`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtmosParams {
    /// Grid size in cells, including the boundary shell
    pub dims: [usize; 3],
    /// Time step used by `step()`
    pub dt: f32,
    pub diffusion_iterations: u32,
    pub vorticity: f32,
    pub pressure_accel: f32,
    pub species: FluidProperties,
    pub velocity: FluidProperties,
    /// Background update rate
    pub update_hz: f32,
}

impl Default for AtmosParams {
    fn default() -> Self {
        Self {
            dims: [32, 16, 32],
            dt: 0.1,
            diffusion_iterations: 15,
            vorticity: 0.03,
            pressure_accel: 1.0,
            species: FluidProperties {
                diffusion: 1.0,
                advection: 1.0,
                ..Default::default()
            },
            velocity: FluidProperties {
                diffusion: 1.0,
                advection: 1.0,
                decay: 0.5,
                ..Default::default()
            },
            update_hz: 30.0,
        }
    }
}

impl AtmosParams {
    /// Params for a room of `interior` cells; one boundary cell is added on every side.
    pub fn with_interior(width: usize, height: usize, depth: usize) -> Self {
        Self {
            dims: [width + 2, height + 2, depth + 2],
            ..Default::default()
        }
    }

    /// Driver interval for `update_hz`.
    pub fn update_interval(&self) -> Duration {
        assert!(
            self.update_hz > 0.0 && self.update_hz.is_finite(),
            "update rate must be positive, got {}",
            self.update_hz
        );
        Duration::from_secs_f32(1.0 / self.update_hz)
    }

    /// Construct a solver with these params applied.
    pub fn build(&self) -> AtmosSimulation3D {
        let [width, height, depth] = self.dims;
        let mut sim = AtmosSimulation3D::new(width, height, depth, self.dt);
        sim.apply_params(self);
        sim
    }

    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), ParamsError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ParamsError> {
        let json = std::fs::read_to_string(path)?;
        let params = serde_json::from_str(&json)?;
        Ok(params)
    }
}
