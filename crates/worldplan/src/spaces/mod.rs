//! Observation and action space types.
//!
//! Only bounded continuous vector spaces are needed by the planner, so this
//! module provides a single `Box` space plus the `Space` trait it implements.

mod r#box;

pub use r#box::Box;

use rand::Rng;

/// A set of values an environment accepts or produces.
pub trait Space: Clone + Send + Sync {
    type Sample;

    /// Draw a value uniformly from the space.
    fn sample<R: Rng>(&self, rng: &mut R) -> Self::Sample;

    fn contains(&self, value: &Self::Sample) -> bool;
}
