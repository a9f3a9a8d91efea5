//! Cross-Entropy Method trajectory optimization.
//!
//! Each iteration samples `amount` action sequences from a diagonal Gaussian
//! belief, clips them into the action space, rolls them out through the
//! dynamics model, scores them, and refits the belief to the `top_k` best.

use super::belief::Belief;
use super::diagnostics::{CemObserver, IterationSnapshot};
use super::model::{DynamicsModel, ObjectiveDecoder};
use super::objective::Objective;
use super::simulate::simulate;
use crate::spaces::Box as BoxSpace;
use crate::{PlanError, Result};
use ndarray::{Array1, Array3, Axis};
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

/// Added to the elite variance before taking the square root.
pub const VARIANCE_FLOOR: f32 = 1e-6;

/// Search parameters of the optimizer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CemConfig {
    /// Number of steps in each candidate action sequence
    pub horizon: usize,
    /// Candidates sampled per iteration
    pub amount: usize,
    /// Elites kept for refitting
    pub top_k: usize,
    /// Sample/refit passes per planning call
    pub iterations: usize,
}

impl Default for CemConfig {
    fn default() -> Self {
        Self {
            horizon: 12,
            amount: 1000,
            top_k: 100,
            iterations: 10,
        }
    }
}

impl CemConfig {
    pub fn with_horizon(mut self, horizon: usize) -> Self {
        self.horizon = horizon;
        self
    }

    pub fn with_amount(mut self, amount: usize) -> Self {
        self.amount = amount;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.horizon == 0 {
            return Err(PlanError::invalid("horizon must be positive"));
        }
        if self.amount == 0 {
            return Err(PlanError::invalid("amount must be positive"));
        }
        if self.top_k == 0 || self.top_k > self.amount {
            return Err(PlanError::invalid(format!(
                "top_k must be in 1..={}, got {}",
                self.amount, self.top_k
            )));
        }
        if self.iterations == 0 {
            return Err(PlanError::invalid("iterations must be at least 1"));
        }
        Ok(())
    }
}

/// Optimize an action sequence starting from `initial_state`.
///
/// `initial_state` must have batch size 1. Without a `prior` the search
/// starts from the action space midpoint with half its range as standard
/// deviation; a prior is truncated to `config.horizon` steps. All randomness
/// comes from `rng`, so a seeded generator gives reproducible plans.
pub fn cross_entropy_method<M, D, R>(
    initial_state: &M::State,
    model: &M,
    objective: &Objective<D>,
    action_space: &BoxSpace,
    config: &CemConfig,
    prior: Option<&Belief>,
    rng: &mut R,
) -> Result<Belief>
where
    M: DynamicsModel,
    D: ObjectiveDecoder<M::Sequence>,
    R: Rng + ?Sized,
{
    plan_with_observer(
        initial_state,
        model,
        objective,
        action_space,
        config,
        prior,
        rng,
        None,
    )
}

/// Same as [`cross_entropy_method`], reporting every iteration's elites to
/// `observer`.
#[allow(clippy::too_many_arguments)]
pub fn plan_with_observer<M, D, R>(
    initial_state: &M::State,
    model: &M,
    objective: &Objective<D>,
    action_space: &BoxSpace,
    config: &CemConfig,
    prior: Option<&Belief>,
    rng: &mut R,
    observer: Option<&dyn CemObserver>,
) -> Result<Belief>
where
    M: DynamicsModel,
    D: ObjectiveDecoder<M::Sequence>,
    R: Rng + ?Sized,
{
    config.validate()?;
    let mut belief = initial_belief(action_space, config.horizon, prior)?;
    let shape = (config.amount, config.horizon, action_space.dim());

    for iteration in 0..config.iterations {
        // Sample proposals from the belief.
        let mut actions: Array3<f32> =
            Array3::from_shape_simple_fn(shape, || rng.sample(StandardNormal));
        actions *= &belief.std_dev;
        actions += &belief.mean;
        action_space.clip_sequences(&mut actions);

        let states = simulate(actions.view(), model, initial_state)?;
        let scores = objective.score(&states)?;

        // Refit to the best candidates.
        let elite_idx = top_k_indices(&scores, config.top_k);
        let elite_actions = actions.select(Axis(0), &elite_idx);
        let elite_scores = scores.select(Axis(0), &elite_idx);
        belief = Belief::refit(elite_actions.view())?;

        tracing::debug!(
            iteration,
            best_score = elite_scores.iter().copied().fold(f32::NEG_INFINITY, f32::max),
            mean_elite_score = elite_scores.mean().unwrap_or(f32::NAN),
            mean_std = belief.std_dev.mean().unwrap_or(f32::NAN),
            "cem iteration"
        );

        if let Some(observer) = observer {
            observer.on_iteration(&IterationSnapshot {
                iteration,
                elite_actions,
                elite_scores,
            });
        }
    }

    Ok(belief)
}

fn initial_belief(space: &BoxSpace, horizon: usize, prior: Option<&Belief>) -> Result<Belief> {
    let Some(prior) = prior else {
        return Ok(Belief::from_action_space(space, horizon));
    };
    if prior.mean.shape() != prior.std_dev.shape() {
        return Err(PlanError::invalid(format!(
            "prior mean has shape {:?} but std_dev has shape {:?}",
            prior.mean.shape(),
            prior.std_dev.shape()
        )));
    }
    if prior.action_dim() != space.dim() {
        return Err(PlanError::invalid(format!(
            "prior has {} action dimensions, action space has {}",
            prior.action_dim(),
            space.dim()
        )));
    }
    prior.truncated(horizon)
}

/// Indices of the `k` highest scores, in no particular order. NaN ranks
/// below every number.
fn top_k_indices(scores: &Array1<f32>, k: usize) -> Vec<usize> {
    let rank = |i: usize| {
        let s = scores[i];
        if s.is_nan() {
            f32::NEG_INFINITY
        } else {
            s
        }
    };
    let mut indices: Vec<usize> = (0..scores.len()).collect();
    if k < indices.len() {
        indices.select_nth_unstable_by(k - 1, |&a, &b| rank(b).total_cmp(&rank(a)));
        indices.truncate(k);
    }
    indices
}
