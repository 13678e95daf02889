//! Generators for initial field contents.

use std::ops::Range;

use rand::Rng;

/// Cell generator drawing each value uniformly from `range`.
///
/// Feed it to `fill_species_with` and swap, the same as any generator.
pub fn uniform_distribution<R: Rng>(
    rng: &mut R,
    range: Range<f32>,
) -> impl FnMut(usize, usize, usize) -> f32 + '_ {
    assert!(
        range.start < range.end,
        "empty concentration range {:?}",
        range
    );
    move |_, _, _| rng.gen_range(range.clone())
}

/// Range the room initializer draws concentrations from.
pub const DEFAULT_CONCENTRATION: Range<f32> = 10.0..1200.0;
