//! Background update thread with snapshot publication.
//!
//! The worker owns the simulation outright. After every completed update it
//! publishes a fresh [`AtmosSnapshot`] behind an `Arc`, so readers never see a
//! half-swapped frame. Shutdown is cooperative: the stop flag is checked
//! between steps and the simulation is handed back on join.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use glam::Vec3;
use parking_lot::RwLock;

use crate::error::{DriverError, DriverResult};
use crate::params::AtmosParams;
use crate::snapshot::{AtmosSample, AtmosSnapshot};
use crate::AtmosSimulation3D;

/// How the worker paces itself.
#[derive(Clone, Debug)]
pub struct DriverConfig {
    /// Minimum wall time between steps
    pub interval: Duration,
    /// Feed measured wall time to `update` instead of the stored dt
    pub variable_dt: bool,
    /// Upper bound on a measured dt (after a stall)
    pub max_dt: f32,
    pub thread_name: String,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs_f32(1.0 / 30.0),
            variable_dt: true,
            max_dt: 0.5,
            thread_name: "atmos-sim".to_string(),
        }
    }
}

impl DriverConfig {
    pub fn from_params(params: &AtmosParams) -> Self {
        Self {
            interval: params.update_interval(),
            ..Default::default()
        }
    }
}

struct Shared {
    stop: AtomicBool,
    latest: RwLock<Arc<AtmosSnapshot>>,
}

/// Runs an [`AtmosSimulation3D`] on its own thread.
pub struct SimulationDriver {
    shared: Arc<Shared>,
    handle: Option<JoinHandle<AtmosSimulation3D>>,
}

impl SimulationDriver {
    /// Move `sim` onto a new thread and start stepping it.
    pub fn start(sim: AtmosSimulation3D, config: DriverConfig) -> DriverResult<Self> {
        let shared = Arc::new(Shared {
            stop: AtomicBool::new(false),
            latest: RwLock::new(Arc::new(sim.snapshot())),
        });

        let worker = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || run(sim, config, worker))
            .map_err(DriverError::Spawn)?;

        log::info!("atmos driver started");
        Ok(Self {
            shared,
            handle: Some(handle),
        })
    }

    /// Most recently completed frame.
    pub fn latest(&self) -> Arc<AtmosSnapshot> {
        Arc::clone(&self.shared.latest.read())
    }

    pub fn frame(&self) -> u64 {
        self.latest().frame
    }

    /// Species at a cell; zero outside the grid.
    pub fn sample_cell(&self, x: i32, y: i32, z: i32) -> AtmosSample {
        cell(x, y, z)
            .and_then(|(x, y, z)| self.latest().sample(x, y, z))
            .unwrap_or_default()
    }

    /// Velocity at a cell; zero outside the grid.
    pub fn velocity_cell(&self, x: i32, y: i32, z: i32) -> Vec3 {
        cell(x, y, z)
            .and_then(|(x, y, z)| self.latest().velocity(x, y, z))
            .unwrap_or_default()
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop the worker and take the simulation back.
    pub fn stop(mut self) -> DriverResult<AtmosSimulation3D> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> DriverResult<AtmosSimulation3D> {
        self.shared.stop.store(true, Ordering::Release);
        let handle = self.handle.take().ok_or(DriverError::AlreadyStopped)?;
        handle.join().map_err(|_| {
            log::error!("atmos simulation thread panicked");
            DriverError::WorkerPanicked
        })
    }
}

impl Drop for SimulationDriver {
    fn drop(&mut self) {
        if self.handle.is_some() {
            if let Err(e) = self.shutdown() {
                log::error!("atmos driver shutdown failed: {}", e);
            }
        }
    }
}

fn cell(x: i32, y: i32, z: i32) -> Option<(usize, usize, usize)> {
    Some((
        usize::try_from(x).ok()?,
        usize::try_from(y).ok()?,
        usize::try_from(z).ok()?,
    ))
}

fn run(mut sim: AtmosSimulation3D, config: DriverConfig, shared: Arc<Shared>) -> AtmosSimulation3D {
    let mut last = Instant::now();

    while !shared.stop.load(Ordering::Acquire) {
        let elapsed = last.elapsed();
        if elapsed < config.interval {
            thread::sleep(config.interval - elapsed);
        }

        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f32();
        last = now;

        if config.variable_dt {
            sim.update(dt.min(config.max_dt));
        } else {
            sim.step();
        }

        *shared.latest.write() = Arc::new(sim.snapshot());
    }

    log::info!("atmos driver exited after {} frames", sim.frame());
    sim
}
