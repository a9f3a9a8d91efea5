//! ndarray-backed latent states for feature-vector world models.

use super::model::{LatentSequence, LatentState};
use crate::{PlanError, Result};
use ndarray::{concatenate, Array2, Array3, Axis};

/// Latent state as a `[batch, features]` matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct TensorState {
    pub features: Array2<f32>,
}

impl TensorState {
    pub fn new(features: Array2<f32>) -> Self {
        Self { features }
    }

    pub fn feature_dim(&self) -> usize {
        self.features.ncols()
    }
}

impl LatentState for TensorState {
    fn batch_size(&self) -> usize {
        self.features.nrows()
    }

    fn tile(&self, copies: usize) -> Self {
        let rows = self.features.nrows();
        let features =
            Array2::from_shape_fn((rows * copies, self.features.ncols()), |(i, j)| {
                self.features[[i % rows, j]]
            });
        Self { features }
    }
}

/// Latent trajectory as a `[batch, time, features]` tensor.
#[derive(Clone, Debug, PartialEq)]
pub struct TensorSequence {
    pub features: Array3<f32>,
}

impl TensorSequence {
    pub fn new(features: Array3<f32>) -> Self {
        Self { features }
    }

    pub fn feature_dim(&self) -> usize {
        self.features.dim().2
    }

    /// State at timestep `t`, if it exists.
    pub fn step(&self, t: usize) -> Option<TensorState> {
        (t < self.horizon()).then(|| TensorState {
            features: self.features.index_axis(Axis(1), t).to_owned(),
        })
    }
}

impl LatentSequence for TensorSequence {
    type State = TensorState;

    fn batch_size(&self) -> usize {
        self.features.dim().0
    }

    fn horizon(&self) -> usize {
        self.features.dim().1
    }

    fn last(&self) -> Option<TensorState> {
        self.horizon().checked_sub(1).and_then(|t| self.step(t))
    }

    fn concat_time(&self, other: &Self) -> Result<Self> {
        let (b, _, f) = self.features.dim();
        let (ob, ot, of) = other.features.dim();
        if b != ob || f != of {
            return Err(PlanError::shape(&[b, ot, f], &[ob, ot, of]));
        }
        let features = concatenate(Axis(1), &[self.features.view(), other.features.view()])
            .map_err(|e| PlanError::Model(e.to_string()))?;
        Ok(Self { features })
    }
}
