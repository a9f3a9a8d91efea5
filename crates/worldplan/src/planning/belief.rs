//! Gaussian belief over action sequences.

use super::cem::VARIANCE_FLOOR;
use crate::spaces::Box as BoxSpace;
use crate::{PlanError, Result};
use ndarray::{concatenate, s, Array1, Array2, ArrayView3, Axis};
use serde::{Deserialize, Serialize};

/// Per-timestep, per-dimension mean and standard deviation of a diagonal
/// Gaussian over `[horizon, action_dim]` action sequences.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Belief {
    pub mean: Array2<f32>,
    pub std_dev: Array2<f32>,
}

impl Belief {
    pub fn new(mean: Array2<f32>, std_dev: Array2<f32>) -> Result<Self> {
        if mean.shape() != std_dev.shape() {
            return Err(PlanError::invalid(format!(
                "mean has shape {:?} but std_dev has shape {:?}",
                mean.shape(),
                std_dev.shape()
            )));
        }
        Ok(Self { mean, std_dev })
    }

    /// Uninformed belief: the box midpoint with half its range as standard
    /// deviation, repeated for every step of the horizon.
    pub fn from_action_space(space: &BoxSpace, horizon: usize) -> Self {
        Self {
            mean: tile_rows(&space.midpoint(), horizon),
            std_dev: tile_rows(&space.half_range(), horizon),
        }
    }

    pub fn horizon(&self) -> usize {
        self.mean.nrows()
    }

    pub fn action_dim(&self) -> usize {
        self.mean.ncols()
    }

    /// Mean action of the first step.
    pub fn first_action(&self) -> Option<Array1<f32>> {
        (self.horizon() > 0).then(|| self.mean.row(0).to_owned())
    }

    /// The first `horizon` steps of this belief.
    pub fn truncated(&self, horizon: usize) -> Result<Self> {
        if self.horizon() < horizon {
            return Err(PlanError::invalid(format!(
                "prior covers {} steps but the planning horizon is {}",
                self.horizon(),
                horizon
            )));
        }
        Ok(Self {
            mean: self.mean.slice(s![..horizon, ..]).to_owned(),
            std_dev: self.std_dev.slice(s![..horizon, ..]).to_owned(),
        })
    }

    /// Drop the executed first step and append an uninformed one, keeping
    /// the horizon.
    pub fn shifted(&self, space: &BoxSpace) -> Result<Self> {
        if self.action_dim() != space.dim() {
            return Err(PlanError::invalid(format!(
                "belief has {} action dimensions, action space has {}",
                self.action_dim(),
                space.dim()
            )));
        }
        if self.horizon() == 0 {
            return Ok(self.clone());
        }
        let tail = |values: &Array2<f32>, fill: &Array1<f32>| {
            concatenate(
                Axis(0),
                &[values.slice(s![1.., ..]), fill.view().insert_axis(Axis(0))],
            )
            .map_err(|e| PlanError::Model(e.to_string()))
        };
        Ok(Self {
            mean: tail(&self.mean, &space.midpoint())?,
            std_dev: tail(&self.std_dev, &space.half_range())?,
        })
    }

    /// Fit mean and population standard deviation to `[k, horizon, dim]`
    /// elite sequences. The floor keeps the deviation strictly positive.
    pub(crate) fn refit(elites: ArrayView3<'_, f32>) -> Result<Self> {
        let mean = elites
            .mean_axis(Axis(0))
            .ok_or_else(|| PlanError::invalid("cannot refit a belief to zero elites"))?;
        let std_dev = elites
            .var_axis(Axis(0), 0.0)
            .mapv(|v| (v + VARIANCE_FLOOR).sqrt());
        Ok(Self { mean, std_dev })
    }
}

fn tile_rows(row: &Array1<f32>, count: usize) -> Array2<f32> {
    Array2::from_shape_fn((count, row.len()), |(_, j)| row[j])
}
