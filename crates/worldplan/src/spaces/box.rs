//! Box (continuous) observation/action space

use super::Space;
use crate::{PlanError, Result};
use ndarray::{Array1, Array3, Axis, Zip};
use rand::Rng;
use rand_distr::{Distribution, Uniform};

/// Box space for continuous vectors with finite per-dimension bounds.
///
/// Invariants: `low` and `high` have the same length, every bound is finite
/// and `low <= high` element-wise. `low == high` is allowed and describes a
/// degenerate dimension with a single admissible value.
#[derive(Clone, Debug, PartialEq)]
pub struct Box {
    low: Array1<f32>,
    high: Array1<f32>,
}

impl Box {
    /// Create a new box space with given bounds
    pub fn new(low: Array1<f32>, high: Array1<f32>) -> Result<Self> {
        if low.len() != high.len() {
            return Err(PlanError::invalid(format!(
                "low has {} dimensions but high has {}",
                low.len(),
                high.len()
            )));
        }
        for (i, (&l, &h)) in low.iter().zip(high.iter()).enumerate() {
            if !l.is_finite() || !h.is_finite() {
                return Err(PlanError::invalid(format!(
                    "bounds must be finite, dimension {} is [{}, {}]",
                    i, l, h
                )));
            }
            if l > h {
                return Err(PlanError::invalid(format!(
                    "low > high in dimension {}: {} > {}",
                    i, l, h
                )));
            }
        }
        Ok(Self { low, high })
    }

    /// Create a box space with the same bounds in every dimension
    pub fn uniform(dim: usize, low: f32, high: f32) -> Result<Self> {
        Self::new(Array1::from_elem(dim, low), Array1::from_elem(dim, high))
    }

    /// Create a symmetric box [-1, 1] for all elements
    pub fn symmetric(dim: usize) -> Self {
        Self {
            low: Array1::from_elem(dim, -1.0),
            high: Array1::from_elem(dim, 1.0),
        }
    }

    /// Lower bound for each element
    pub fn low(&self) -> &Array1<f32> {
        &self.low
    }

    /// Upper bound for each element
    pub fn high(&self) -> &Array1<f32> {
        &self.high
    }

    /// Number of dimensions
    pub fn dim(&self) -> usize {
        self.low.len()
    }

    /// Center of the box, `(high + low) / 2`
    pub fn midpoint(&self) -> Array1<f32> {
        (&self.high + &self.low) / 2.0
    }

    /// Half the extent of the box, `(high - low) / 2`
    pub fn half_range(&self) -> Array1<f32> {
        (&self.high - &self.low) / 2.0
    }

    /// Clip a `[batch, horizon, dim]` batch of action sequences in place.
    pub fn clip_sequences(&self, actions: &mut Array3<f32>) {
        for mut lane in actions.lanes_mut(Axis(2)) {
            Zip::from(&mut lane)
                .and(&self.low)
                .and(&self.high)
                .for_each(|v, &l, &h| *v = v.clamp(l, h));
        }
    }
}

impl Space for Box {
    type Sample = Array1<f32>;

    fn sample<R: Rng>(&self, rng: &mut R) -> Self::Sample {
        let mut result = Array1::zeros(self.dim());
        for ((&l, &h), r) in self.low.iter().zip(self.high.iter()).zip(result.iter_mut()) {
            let dist = Uniform::new_inclusive(l, h);
            *r = dist.sample(rng);
        }
        result
    }

    fn contains(&self, value: &Self::Sample) -> bool {
        if value.len() != self.dim() {
            return false;
        }
        value
            .iter()
            .zip(self.low.iter())
            .zip(self.high.iter())
            .all(|((&v, &l), &h)| v >= l && v <= h)
    }
}
