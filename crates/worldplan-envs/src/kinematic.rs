//! Exact latent model of `PointNav` motion.
//!
//! Stands in for a learned world model: the latent state is the robot pose
//! plus the goal, `[x, y, heading, goal_x, goal_y]`, and imagination applies
//! the same steering kinematics as the environment. Obstacles are not
//! modelled.

use ndarray::{s, Array1, Array2, Array3, ArrayView1, ArrayView2, ArrayView3, Axis};
use std::f32::consts::FRAC_PI_2;
use worldplan::planning::{
    DynamicsModel, LatentState, ObjectiveDecoder, ObservationEncoder, TensorSequence, TensorState,
};
use worldplan::{PlanError, Result};

/// Number of latent features.
pub const FEATURE_DIM: usize = 5;

/// Kinematic dynamics model over `[x, y, heading, goal_x, goal_y]` states.
#[derive(Clone, Debug)]
pub struct KinematicModel {
    forward_step: f32,
}

impl Default for KinematicModel {
    fn default() -> Self {
        Self::new(0.25)
    }
}

impl KinematicModel {
    pub fn new(forward_step: f32) -> Self {
        Self { forward_step }
    }

    pub fn forward_step(&self) -> f32 {
        self.forward_step
    }

    /// Advance every row of `state` by one steering action.
    fn advance(&self, state: &mut Array2<f32>, actions: ArrayView2<'_, f32>) {
        for (mut row, action) in state.outer_iter_mut().zip(actions.outer_iter()) {
            let steer = action[0].clamp(-1.0, 1.0);
            let turn = steer * FRAC_PI_2;
            let mid = row[2] + turn / 2.0;
            row[0] += mid.cos() * self.forward_step;
            row[1] += mid.sin() * self.forward_step;
            row[2] += turn;
        }
    }

    fn check_actions(&self, actions: &ArrayView3<'_, f32>) -> Result<()> {
        let (batch, steps, dim) = actions.dim();
        if dim != 1 {
            return Err(PlanError::ShapeMismatch {
                expected: vec![batch, steps, 1],
                actual: vec![batch, steps, dim],
            });
        }
        Ok(())
    }

    fn check(&self, batch: usize, state: &TensorState) -> Result<()> {
        let (rows, cols) = state.features.dim();
        if rows != batch || cols != FEATURE_DIM {
            return Err(PlanError::ShapeMismatch {
                expected: vec![batch, FEATURE_DIM],
                actual: vec![rows, cols],
            });
        }
        Ok(())
    }
}

impl DynamicsModel for KinematicModel {
    type State = TensorState;
    type Sequence = TensorSequence;

    fn initial_state(&self, batch: usize) -> TensorState {
        TensorState::new(Array2::zeros((batch, FEATURE_DIM)))
    }

    fn open_loop(
        &self,
        actions: ArrayView3<'_, f32>,
        initial_state: &TensorState,
    ) -> Result<TensorSequence> {
        let (batch, horizon, _) = actions.dim();
        self.check_actions(&actions)?;
        self.check(batch, initial_state)?;

        let mut current = initial_state.features.clone();
        let mut states = Array3::zeros((batch, horizon, FEATURE_DIM));
        for t in 0..horizon {
            self.advance(&mut current, actions.index_axis(Axis(1), t));
            states.slice_mut(s![.., t, ..]).assign(&current);
        }
        Ok(TensorSequence::new(states))
    }

    fn closed_loop(
        &self,
        embedded: ArrayView3<'_, f32>,
        actions: ArrayView3<'_, f32>,
        initial_state: Option<&TensorState>,
    ) -> Result<(TensorSequence, TensorSequence)> {
        let (batch, steps, dim) = embedded.dim();
        if dim != FEATURE_DIM || actions.dim().0 != batch || actions.dim().1 != steps {
            return Err(PlanError::ShapeMismatch {
                expected: vec![batch, steps, FEATURE_DIM],
                actual: vec![actions.dim().0, actions.dim().1, dim],
            });
        }
        self.check_actions(&actions)?;
        let mut previous = match initial_state {
            Some(state) => {
                self.check(batch, state)?;
                state.features.clone()
            }
            None => self.initial_state(batch).features,
        };

        let mut prior = Array3::zeros((batch, steps, FEATURE_DIM));
        for t in 0..steps {
            self.advance(&mut previous, actions.index_axis(Axis(1), t));
            prior.slice_mut(s![.., t, ..]).assign(&previous);
            // The observation is exact, so the posterior is the embedding.
            previous = embedded.index_axis(Axis(1), t).to_owned();
        }
        Ok((TensorSequence::new(prior), TensorSequence::new(embedded.to_owned())))
    }
}

/// Maps `PointNav` observations to latent features.
#[derive(Clone, Debug, Default)]
pub struct ObservationEmbedder;

impl ObservationEncoder for ObservationEmbedder {
    fn embed(&self, observation: ArrayView1<'_, f32>) -> Result<Array1<f32>> {
        if observation.len() != crate::point_nav::OBSERVATION_DIM {
            return Err(PlanError::ShapeMismatch {
                expected: vec![crate::point_nav::OBSERVATION_DIM],
                actual: vec![observation.len()],
            });
        }
        let heading = observation[3].atan2(observation[2]);
        Ok(Array1::from(vec![
            observation[0],
            observation[1],
            heading,
            observation[4],
            observation[5],
        ]))
    }
}

/// Objective decoder scoring each imagined step by its negative distance to
/// the goal.
#[derive(Clone, Debug, Default)]
pub struct GoalDistanceDecoder;

impl ObjectiveDecoder<TensorSequence> for GoalDistanceDecoder {
    fn decode(&self, states: &TensorSequence) -> Result<Array2<f32>> {
        if states.feature_dim() != FEATURE_DIM {
            return Err(PlanError::ShapeMismatch {
                expected: vec![FEATURE_DIM],
                actual: vec![states.feature_dim()],
            });
        }
        Ok(states
            .features
            .map_axis(Axis(2), |f| -(f[3] - f[0]).hypot(f[4] - f[1])))
    }
}

/// Latent state for a single observation.
pub fn state_from_observation(observation: ArrayView1<'_, f32>) -> Result<TensorState> {
    let features = ObservationEmbedder.embed(observation)?;
    let state = TensorState::new(features.insert_axis(Axis(0)));
    debug_assert_eq!(state.batch_size(), 1);
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use worldplan::planning::LatentSequence;

    #[test]
    fn test_open_loop_straight_and_turning() {
        let model = KinematicModel::default();
        let start = model.initial_state(2);
        let actions = Array3::from_shape_vec((2, 2, 1), vec![0.0, 0.0, 1.0, -1.0]).unwrap();
        let seq = model.open_loop(actions.view(), &start).unwrap();
        assert_eq!(seq.horizon(), 2);

        let straight = &seq.features;
        assert!((straight[[0, 1, 0]] - 0.5).abs() < 1e-6);
        assert!(straight[[0, 1, 1]].abs() < 1e-6);

        // Left then right returns the heading to zero.
        assert!(seq.features[[1, 1, 2]].abs() < 1e-6);
    }

    #[test]
    fn test_open_loop_rejects_wrong_state() {
        let model = KinematicModel::default();
        let start = TensorState::new(Array2::zeros((1, 3)));
        let actions = Array3::zeros((1, 2, 1));
        assert!(model.open_loop(actions.view(), &start).is_err());
    }

    #[test]
    fn test_rejects_non_steering_actions() {
        let model = KinematicModel::default();
        let start = model.initial_state(1);
        for dim in [0, 2] {
            let actions = Array3::zeros((1, 3, dim));
            assert!(matches!(
                model.open_loop(actions.view(), &start),
                Err(PlanError::ShapeMismatch { .. })
            ));
            let embedded = Array3::zeros((1, 3, FEATURE_DIM));
            assert!(matches!(
                model.closed_loop(embedded.view(), actions.view(), None),
                Err(PlanError::ShapeMismatch { .. })
            ));
        }
    }

    #[test]
    fn test_closed_loop_posterior_is_observation() {
        let model = KinematicModel::default();
        let embedded =
            Array3::from_shape_vec((1, 1, 5), vec![0.25, 0.0, 0.0, 1.0, 0.0]).unwrap();
        let actions = Array3::zeros((1, 1, 1));
        let (prior, posterior) = model
            .closed_loop(embedded.view(), actions.view(), None)
            .unwrap();
        assert_eq!(posterior.features, embedded);
        // From the origin, a straight step predicts the observed pose.
        assert!((prior.features[[0, 0, 0]] - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_embedder_recovers_heading() {
        let angle = 0.7f32;
        let obs = array![1.0, 2.0, angle.cos(), angle.sin(), 3.0, 4.0];
        let features = ObservationEmbedder.embed(obs.view()).unwrap();
        assert!((features[2] - angle).abs() < 1e-6);
        assert_eq!(features[3], 3.0);
        assert!(ObservationEmbedder.embed(array![1.0].view()).is_err());
    }

    #[test]
    fn test_goal_distance_decoder() {
        let seq = TensorSequence::new(
            Array3::from_shape_vec((1, 1, 5), vec![0.0, 0.0, 0.0, 3.0, 4.0]).unwrap(),
        );
        assert_eq!(GoalDistanceDecoder.decode(&seq).unwrap(), array![[-5.0]]);
    }
}
