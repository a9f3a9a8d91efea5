//! Small deterministic collaborators for planner unit tests.

use super::model::{DynamicsModel, ObjectiveDecoder};
use super::state::{TensorSequence, TensorState};
use crate::{PlanError, Result};
use ndarray::{s, Array2, Array3, ArrayView3, Axis};

/// Latent state is the running sum of all actions taken so far.
pub(crate) struct Accumulator {
    dim: usize,
    truncate: bool,
}

impl Accumulator {
    pub(crate) fn new(dim: usize) -> Self {
        Self {
            dim,
            truncate: false,
        }
    }

    /// Drop the last predicted step, to exercise shape checks.
    pub(crate) fn truncating(mut self) -> Self {
        self.truncate = true;
        self
    }
}

impl DynamicsModel for Accumulator {
    type State = TensorState;
    type Sequence = TensorSequence;

    fn initial_state(&self, batch: usize) -> TensorState {
        TensorState::new(Array2::zeros((batch, self.dim)))
    }

    fn open_loop(
        &self,
        actions: ArrayView3<'_, f32>,
        initial_state: &TensorState,
    ) -> Result<TensorSequence> {
        let (batch, horizon, dim) = actions.dim();
        if initial_state.features.dim() != (batch, dim) || dim != self.dim {
            return Err(PlanError::Model(format!(
                "accumulator got state {:?} for actions {:?}",
                initial_state.features.dim(),
                actions.dim()
            )));
        }
        let mut states = Array3::zeros((batch, horizon, dim));
        let mut current = initial_state.features.clone();
        for t in 0..horizon {
            current += &actions.index_axis(Axis(1), t);
            states.slice_mut(s![.., t, ..]).assign(&current);
        }
        if self.truncate && horizon > 0 {
            states = states.slice(s![.., ..horizon - 1, ..]).to_owned();
        }
        Ok(TensorSequence::new(states))
    }

    fn closed_loop(
        &self,
        embedded: ArrayView3<'_, f32>,
        actions: ArrayView3<'_, f32>,
        initial_state: Option<&TensorState>,
    ) -> Result<(TensorSequence, TensorSequence)> {
        let batch = embedded.dim().0;
        let start = initial_state
            .cloned()
            .unwrap_or_else(|| self.initial_state(batch));
        let mut prior = embedded.to_owned();
        let mut previous = start.features;
        for t in 0..embedded.dim().1 {
            let predicted = &previous + &actions.index_axis(Axis(1), t);
            prior.slice_mut(s![.., t, ..]).assign(&predicted);
            previous = embedded.index_axis(Axis(1), t).to_owned();
        }
        Ok((
            TensorSequence::new(prior),
            TensorSequence::new(embedded.to_owned()),
        ))
    }
}

/// Objective is the first latent feature at every step.
pub(crate) struct FirstFeature;

impl ObjectiveDecoder<TensorSequence> for FirstFeature {
    fn decode(&self, states: &TensorSequence) -> Result<Array2<f32>> {
        Ok(states.features.index_axis(Axis(2), 0).to_owned())
    }
}

/// Decoder that always fails.
pub(crate) struct Broken;

impl ObjectiveDecoder<TensorSequence> for Broken {
    fn decode(&self, _states: &TensorSequence) -> Result<Array2<f32>> {
        Err(PlanError::Model("decoder offline".into()))
    }
}
