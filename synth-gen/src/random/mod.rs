//! Domain randomization policy.
//!
//! Every sampler draws from one explicitly-threaded [`StdRng`]; there is no
//! global random state anywhere in the crate, so a fixed seed reproduces the
//! full sample sequence.

use crate::common::*;

pub use camera::*;
pub mod camera;

pub use environment::*;
pub mod environment;

pub use lighting::*;
pub mod lighting;

pub use material::*;
pub mod material;

/// Sample uniformly from a closed range, inclusive of both bounds.
pub(crate) fn sample_range(rng: &mut StdRng, (min, max): (R64, R64)) -> f64 {
    rng.gen_range(min.raw()..=max.raw())
}
