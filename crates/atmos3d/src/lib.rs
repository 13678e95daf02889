//! Multi-species 3D Eulerian gas simulation
//!
//! A dense-grid solver that moves four gas species and a velocity field
//! forward in time under diffusion, pressure acceleration, viscous decay,
//! vorticity confinement and mass-conserving advection.
//!
//! # Example
//!
//! ```
//! use atmos3d::{AtmosSimulation3D, Species};
//!
//! let mut sim = AtmosSimulation3D::new(8, 8, 8, 0.1);
//! sim.species_mut().properties.diffusion = 1.0;
//!
//! // Seed a puff of contaminant in the middle of the room
//! sim.fill_species_with(Species::Contaminant, |x, y, z| {
//!     if (x, y, z) == (4, 4, 4) { 100.0 } else { 0.0 }
//! });
//! sim.species_mut().swap();
//!
//! sim.step();
//! assert!(sim.concentration(Species::Contaminant, 4, 4, 4) < 100.0);
//! ```

pub mod advection;
pub mod constants;
pub mod diffusion;
pub mod driver;
pub mod error;
pub mod field;
pub mod forces;
pub mod grid;
pub mod params;
pub mod seed;
pub mod snapshot;
pub mod solid;

pub use driver::{DriverConfig, SimulationDriver};
pub use error::{DriverError, DriverResult, ParamsError};
pub use field::{Axis, Field, FluidProperties, Species, SpeciesField, VelocityField};
pub use glam::Vec3;
pub use grid::Grid3D;
pub use params::AtmosParams;
pub use seed::uniform_distribution;
pub use snapshot::{AtmosSample, AtmosSnapshot};
pub use solid::{FlowDirection, SolidMap};

/// 3D gas simulation.
#[derive(Clone, Debug)]
pub struct AtmosSimulation3D {
    velocity: VelocityField,
    species: SpeciesField,
    /// Scratch for curl magnitude during vorticity confinement
    curl: Grid3D<f32>,
    solids: SolidMap,

    diffusion_iterations: u32,
    vorticity: f32,
    pressure_accel: f32,
    /// Time step used by `step()`
    dt: f32,

    frame: u64,
}

fn assert_valid_dt(dt: f32) {
    assert!(
        dt.is_finite() && dt >= 0.0,
        "time step must be finite and non-negative, got {}",
        dt
    );
}

impl AtmosSimulation3D {
    /// Create a simulation with the given grid dimensions.
    ///
    /// All fields start at zero, no solids are stored and every rate is zero.
    pub fn new(width: usize, height: usize, depth: usize, dt: f32) -> Self {
        assert_valid_dt(dt);
        log::debug!("atmos grid {}x{}x{}, dt {}", width, height, depth, dt);

        Self {
            velocity: VelocityField::new(width, height, depth),
            species: SpeciesField::new(width, height, depth),
            curl: Grid3D::new(width, height, depth, 0.0),
            solids: SolidMap::new(width, height, depth),
            diffusion_iterations: 1,
            vorticity: 0.0,
            pressure_accel: 0.0,
            dt,
            frame: 0,
        }
    }

    /// Advance one step with the stored time step.
    pub fn step(&mut self) {
        self.update(self.dt);
    }

    /// Advance one step of length `dt`: diffusion, then forces, then advection.
    pub fn update(&mut self, dt: f32) {
        assert_valid_dt(dt);

        // 1. Diffusion
        diffusion::diffuse_velocity(
            &mut self.velocity,
            &self.solids,
            self.diffusion_iterations,
            dt,
        );
        diffusion::diffuse_species(
            &mut self.species,
            &self.solids,
            self.diffusion_iterations,
            dt,
        );

        // 2. Forces
        forces::apply_decay(&mut self.velocity, dt);
        forces::apply_pressure_acceleration(
            &mut self.velocity,
            &self.species,
            &self.solids,
            self.pressure_accel,
            dt,
        );
        forces::apply_vorticity_confinement(&mut self.velocity, &mut self.curl, self.vorticity);

        // 3. Advection, velocity first so species ride the updated flow
        let scale = advection::advection_scale(self.width(), self.height(), self.depth()) * dt;
        let velocity_force = self.velocity.properties.advection * scale;
        advection::advect_velocity(&mut self.velocity, &self.solids, velocity_force);

        let species_force = self.species.properties.advection * scale;
        advection::advect_species(
            &mut self.species,
            self.velocity.flow(),
            &self.solids,
            species_force,
        );

        self.frame += 1;
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.curl.width()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.curl.height()
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.curl.depth()
    }

    pub fn dims(&self) -> (usize, usize, usize) {
        self.curl.dims()
    }

    /// Number of completed updates.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }

    pub fn set_dt(&mut self, dt: f32) {
        assert_valid_dt(dt);
        self.dt = dt;
    }

    pub fn diffusion_iterations(&self) -> u32 {
        self.diffusion_iterations
    }

    pub fn set_diffusion_iterations(&mut self, iterations: u32) {
        self.diffusion_iterations = iterations;
    }

    pub fn vorticity(&self) -> f32 {
        self.vorticity
    }

    pub fn set_vorticity(&mut self, vorticity: f32) {
        self.vorticity = vorticity;
    }

    pub fn pressure_accel(&self) -> f32 {
        self.pressure_accel
    }

    pub fn set_pressure_accel(&mut self, pressure_accel: f32) {
        self.pressure_accel = pressure_accel;
    }

    pub fn velocity_field(&self) -> &VelocityField {
        &self.velocity
    }

    pub fn velocity_mut(&mut self) -> &mut VelocityField {
        &mut self.velocity
    }

    pub fn species_field(&self) -> &SpeciesField {
        &self.species
    }

    pub fn species_mut(&mut self) -> &mut SpeciesField {
        &mut self.species
    }

    pub fn solids(&self) -> &SolidMap {
        &self.solids
    }

    pub fn solids_mut(&mut self) -> &mut SolidMap {
        &mut self.solids
    }

    /// Velocity at a cell.
    pub fn velocity(&self, x: usize, y: usize, z: usize) -> Vec3 {
        self.velocity.source_vector(x, y, z)
    }

    /// Concentration of one species at a cell.
    pub fn concentration(&self, species: Species, x: usize, y: usize, z: usize) -> f32 {
        self.species.species(species).source().element(x, y, z)
    }

    /// All four species at a cell.
    pub fn sample(&self, x: usize, y: usize, z: usize) -> AtmosSample {
        AtmosSample {
            primary: self.concentration(Species::Primary, x, y, z),
            secondary: self.concentration(Species::Secondary, x, y, z),
            tertiary: self.concentration(Species::Tertiary, x, y, z),
            contaminant: self.concentration(Species::Contaminant, x, y, z),
        }
    }

    /// Total pressure (species sum) at a cell.
    pub fn pressure(&self, x: usize, y: usize, z: usize) -> f32 {
        self.species.pressure_at(x, y, z)
    }

    /// Sum of one species over the whole grid.
    pub fn total_mass(&self, species: Species) -> f64 {
        self.species.species(species).source().sum()
    }

    /// Sum of all species over the whole grid.
    pub fn total_pressure(&self) -> f64 {
        Species::ALL.iter().map(|&s| self.total_mass(s)).sum()
    }

    /// Write a species' destination grid from a generator.
    ///
    /// Nothing is visible until `species_mut().swap()`.
    pub fn fill_species_with<F>(&mut self, species: Species, generator: F)
    where
        F: FnMut(usize, usize, usize) -> f32,
    {
        self.species
            .species_mut(species)
            .destination_mut()
            .fill_with(generator);
    }

    /// Write a velocity axis' destination grid from a generator.
    ///
    /// Nothing is visible until the axis is swapped.
    pub fn fill_velocity_with<F>(&mut self, axis: Axis, generator: F)
    where
        F: FnMut(usize, usize, usize) -> f32,
    {
        self.velocity
            .axis_mut(axis)
            .destination_mut()
            .fill_with(generator);
    }

    /// Zero every field and remove all solids. Tuning is kept.
    pub fn reset(&mut self) {
        self.velocity.reset(0.0);
        self.species.reset(0.0);
        self.curl.fill(0.0);
        self.solids.clear();
        self.frame = 0;
    }

    /// Copy tuning from `params`. Grid dimensions cannot change.
    pub fn apply_params(&mut self, params: &AtmosParams) {
        let [width, height, depth] = params.dims;
        if (width, height, depth) != self.dims() {
            log::warn!(
                "params grid {:?} ignored, simulation is {:?}",
                params.dims,
                self.dims()
            );
        }

        self.set_dt(params.dt);
        self.diffusion_iterations = params.diffusion_iterations;
        self.vorticity = params.vorticity;
        self.pressure_accel = params.pressure_accel;
        self.species.properties = params.species;
        self.velocity.properties = params.velocity;
    }

    /// Copy of the current source grids.
    pub fn snapshot(&self) -> AtmosSnapshot {
        AtmosSnapshot {
            frame: self.frame,
            species: Species::ALL.map(|s| self.species.species(s).source().clone()),
            velocity: Axis::ALL.map(|a| self.velocity.axis(a).source().clone()),
        }
    }
}
