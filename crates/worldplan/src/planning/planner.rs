//! Planner interface and the CEM planner.

use super::belief::Belief;
use super::cem::{plan_with_observer, CemConfig};
use super::diagnostics::CemObserver;
use super::model::{DynamicsModel, ObjectiveDecoder};
use super::objective::{Aggregation, Objective};
use crate::spaces::Box as BoxSpace;
use crate::{PlanError, Result};
use ndarray::Array1;
use rand::Rng;
use std::sync::Arc;

/// Something that turns a latent state into an action plan.
pub trait Planner: Send + Sync {
    type Model: DynamicsModel;

    /// The dynamics model plans are rolled out in.
    fn model(&self) -> &Self::Model;

    fn action_space(&self) -> &BoxSpace;

    /// Number of steps in every returned plan.
    fn horizon(&self) -> usize;

    /// Optimize a plan from `initial_state` (batch size 1), optionally
    /// starting from `prior`.
    fn get_plan<R: Rng + ?Sized>(
        &self,
        initial_state: &<Self::Model as DynamicsModel>::State,
        prior: Option<&Belief>,
        rng: &mut R,
    ) -> Result<Belief>;

    /// First action of the optimized plan.
    fn get_action<R: Rng + ?Sized>(
        &self,
        initial_state: &<Self::Model as DynamicsModel>::State,
        rng: &mut R,
    ) -> Result<Array1<f32>> {
        self.get_plan(initial_state, None, rng)?
            .first_action()
            .ok_or_else(|| PlanError::invalid("plan has no steps"))
    }
}

/// Cross-Entropy Method planner over a dynamics model and objective decoder.
///
/// Holds no state between calls; warm starting is done by passing the
/// previous plan as `prior`.
pub struct CrossEntropyMethod<M, D> {
    model: M,
    objective: Objective<D>,
    action_space: BoxSpace,
    config: CemConfig,
    observer: Option<Arc<dyn CemObserver>>,
}

impl<M, D> CrossEntropyMethod<M, D>
where
    M: DynamicsModel,
    D: ObjectiveDecoder<M::Sequence>,
{
    pub fn new(model: M, decoder: D, action_space: BoxSpace, config: CemConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            model,
            objective: Objective::new(decoder, Aggregation::default())?,
            action_space,
            config,
            observer: None,
        })
    }

    /// Replace the default sum-of-rewards aggregation.
    pub fn with_aggregation(self, aggregation: Aggregation) -> Result<Self> {
        let Self {
            model,
            objective,
            action_space,
            config,
            observer,
        } = self;
        let decoder = objective.into_decoder();
        Ok(Self {
            model,
            objective: Objective::new(decoder, aggregation)?,
            action_space,
            config,
            observer,
        })
    }

    /// Report every iteration of every planning call to `observer`.
    pub fn with_observer(mut self, observer: Arc<dyn CemObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn config(&self) -> &CemConfig {
        &self.config
    }

    pub fn objective(&self) -> &Objective<D> {
        &self.objective
    }
}

impl<M, D> Planner for CrossEntropyMethod<M, D>
where
    M: DynamicsModel,
    D: ObjectiveDecoder<M::Sequence>,
{
    type Model = M;

    fn model(&self) -> &M {
        &self.model
    }

    fn action_space(&self) -> &BoxSpace {
        &self.action_space
    }

    fn horizon(&self) -> usize {
        self.config.horizon
    }

    fn get_plan<R: Rng + ?Sized>(
        &self,
        initial_state: &M::State,
        prior: Option<&Belief>,
        rng: &mut R,
    ) -> Result<Belief> {
        plan_with_observer(
            initial_state,
            &self.model,
            &self.objective,
            &self.action_space,
            &self.config,
            prior,
            rng,
            self.observer.as_deref(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planning::testing::{Accumulator, FirstFeature};
    use crate::planning::TensorState;
    use ndarray::array;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn planner() -> CrossEntropyMethod<Accumulator, FirstFeature> {
        let config = CemConfig::default()
            .with_horizon(3)
            .with_amount(100)
            .with_top_k(10)
            .with_iterations(5);
        CrossEntropyMethod::new(Accumulator::new(1), FirstFeature, BoxSpace::symmetric(1), config)
            .unwrap()
    }

    #[test]
    fn test_new_validates_config() {
        let config = CemConfig::default().with_top_k(2000);
        assert!(matches!(
            CrossEntropyMethod::new(Accumulator::new(1), FirstFeature, BoxSpace::symmetric(1), config),
            Err(PlanError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_get_action_is_first_mean_step() {
        let planner = planner();
        let state = TensorState::new(array![[0.0]]);

        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let plan = planner.get_plan(&state, None, &mut rng).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let action = planner.get_action(&state, &mut rng).unwrap();

        assert_eq!(plan.mean.row(0).to_owned(), action);
        assert_eq!(planner.horizon(), 3);
    }

    #[test]
    fn test_same_seed_same_plan() {
        let planner = planner();
        let state = TensorState::new(array![[0.0]]);
        let plan = |seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            planner.get_plan(&state, None, &mut rng).unwrap()
        };
        assert_eq!(plan(21), plan(21));
    }

    #[test]
    fn test_with_aggregation_rejects_bad_gamma() {
        assert!(planner()
            .with_aggregation(Aggregation::Discounted { gamma: 2.0 })
            .is_err());
        let planner = planner()
            .with_aggregation(Aggregation::Discounted { gamma: 0.9 })
            .unwrap();
        assert_eq!(
            planner.objective().aggregation(),
            Aggregation::Discounted { gamma: 0.9 }
        );
    }
}
