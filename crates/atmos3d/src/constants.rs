//! Numerical constants for the gas solver.

/// Magnitudes below this are treated as zero when deciding to skip work.
pub const NEARLY_ZERO: f32 = 1e-8;

/// Small margin used by the collision clamp.
pub const KINDA_SMALL: f32 = 1e-4;

/// Largest per-axis displacement an advection step may take, in cells.
pub const MAX_ADVECT: f32 = 1.5 - KINDA_SMALL;

/// Grid edge length that maps to an advection scale of 1.0.
pub const STD_DIMENSION: f32 = 100.0;

/// Keeps the curl gradient normalisation finite on flat regions.
pub const CURL_EPSILON: f32 = 1e-6;

/// Returns true if `value` is close enough to zero to skip a pass.
#[inline]
pub fn is_nearly_zero(value: f32) -> bool {
    value.abs() <= NEARLY_ZERO
}
