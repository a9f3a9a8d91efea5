//! Agents that act in navigation environments.
//!
//! - `RandomAgent` samples uniformly from the action space, for data
//!   collection and as a baseline
//! - `MpcAgent` filters observations through the dynamics model and replans
//!   with a `Planner` at every control step

mod episode;
mod mpc;
mod random;

pub use episode::{run_episode, Episode};
pub use mpc::MpcAgent;
pub use random::RandomAgent;

use crate::Result;
use ndarray::Array1;
use rand::Rng;

/// A policy that maps observations to actions.
pub trait Agent {
    /// Forget everything about the current episode.
    fn reset(&mut self);

    /// Choose the action for `observation`.
    fn act<R: Rng>(&mut self, observation: &Array1<f32>, rng: &mut R) -> Result<Array1<f32>>;
}
