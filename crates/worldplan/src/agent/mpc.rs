use super::Agent;
use crate::planning::{Belief, DynamicsModel, LatentSequence, ObservationEncoder, Planner};
use crate::{PlanError, Result};
use ndarray::{Array1, Array3};
use rand::Rng;

type StateOf<P> = <<P as Planner>::Model as DynamicsModel>::State;

/// Model-predictive control agent.
///
/// Every step embeds the observation, updates the latent belief with one
/// `closed_loop` step (using the previous action), plans from the filtered
/// state and executes the first planned action. With warm starting, the
/// previous plan shifted by one step seeds the next search.
pub struct MpcAgent<P: Planner, E> {
    planner: P,
    encoder: E,
    warm_start: bool,
    state: Option<StateOf<P>>,
    previous_action: Array1<f32>,
    plan: Option<Belief>,
}

impl<P: Planner, E: ObservationEncoder> MpcAgent<P, E> {
    pub fn new(planner: P, encoder: E) -> Self {
        let action_dim = planner.action_space().dim();
        Self {
            planner,
            encoder,
            warm_start: false,
            state: None,
            previous_action: Array1::zeros(action_dim),
            plan: None,
        }
    }

    pub fn with_warm_start(mut self, warm_start: bool) -> Self {
        self.warm_start = warm_start;
        self
    }

    pub fn planner(&self) -> &P {
        &self.planner
    }

    /// Plan found at the most recent step, kept only when warm starting.
    pub fn last_plan(&self) -> Option<&Belief> {
        self.plan.as_ref()
    }

    /// Filtered latent state after the most recent observation.
    pub fn state(&self) -> Option<&StateOf<P>> {
        self.state.as_ref()
    }

    fn filter(&self, observation: &Array1<f32>) -> Result<StateOf<P>> {
        let embedded = self.encoder.embed(observation.view())?;
        let dim = embedded.len();
        let embedded = embedded
            .into_shape((1, 1, dim))
            .map_err(|e| PlanError::Model(e.to_string()))?;
        let actions = Array3::from_shape_vec(
            (1, 1, self.previous_action.len()),
            self.previous_action.to_vec(),
        )
        .map_err(|e| PlanError::Model(e.to_string()))?;

        let (_, posterior) = self.planner.model().closed_loop(
            embedded.view(),
            actions.view(),
            self.state.as_ref(),
        )?;
        posterior
            .last()
            .ok_or_else(|| PlanError::shape(&[1, 1], &[posterior.batch_size(), 0]))
    }
}

impl<P: Planner, E: ObservationEncoder> Agent for MpcAgent<P, E> {
    fn reset(&mut self) {
        self.state = None;
        self.previous_action.fill(0.0);
        self.plan = None;
    }

    fn act<R: Rng>(&mut self, observation: &Array1<f32>, rng: &mut R) -> Result<Array1<f32>> {
        let state = self.filter(observation)?;

        let prior = match (&self.plan, self.warm_start) {
            (Some(plan), true) => Some(plan.shifted(self.planner.action_space())?),
            _ => None,
        };
        let plan = self.planner.get_plan(&state, prior.as_ref(), rng)?;
        let action = plan
            .first_action()
            .ok_or_else(|| PlanError::invalid("plan has no steps"))?;

        self.state = Some(state);
        self.previous_action.assign(&action);
        if self.warm_start {
            self.plan = Some(plan);
        }
        Ok(action)
    }
}
