//! Contracts for the learned collaborators the planner drives.
//!
//! The planner never looks inside a latent state. It needs to know the batch
//! size, to tile a single state into a batch, and to hand states back to the
//! model and decoder that produced them.

use crate::Result;
use ndarray::{Array1, Array2, ArrayView1, ArrayView3};

/// A batch of latent states at a single timestep.
pub trait LatentState: Clone + Send + Sync {
    /// Leading batch dimension.
    fn batch_size(&self) -> usize;

    /// Repeat a state `copies` times along the batch dimension.
    ///
    /// Tiling a batch of `n` states produces `n * copies` states, copies of the
    /// whole batch laid out one after another.
    fn tile(&self, copies: usize) -> Self;
}

/// A batch of latent state trajectories, `[batch, time, ...]`.
pub trait LatentSequence: Clone + Send + Sync + Sized {
    /// State type of a single timestep.
    type State: LatentState;

    fn batch_size(&self) -> usize;

    /// Number of timesteps.
    fn horizon(&self) -> usize;

    /// The final timestep, or `None` for an empty sequence.
    fn last(&self) -> Option<Self::State>;

    /// Join two sequences along the time axis.
    fn concat_time(&self, other: &Self) -> Result<Self>;
}

/// Latent dynamics model (the RSSM of PlaNet/Dreamer or any equivalent).
///
/// Implementations must be deterministic for fixed inputs; they are shared
/// read-only across planning calls.
pub trait DynamicsModel: Send + Sync {
    type State: LatentState;
    type Sequence: LatentSequence<State = Self::State>;

    /// The state a fresh episode starts from, for `batch` parallel episodes.
    fn initial_state(&self, batch: usize) -> Self::State;

    /// Roll the model forward on actions alone.
    ///
    /// `actions` is `[batch, horizon, action_dim]` and `initial_state` has the
    /// same batch size. Returns one state per action.
    fn open_loop(
        &self,
        actions: ArrayView3<'_, f32>,
        initial_state: &Self::State,
    ) -> Result<Self::Sequence>;

    /// Filter a sequence of embedded observations.
    ///
    /// `embedded` is `[batch, time, embedding]` and `actions` is
    /// `[batch, time, action_dim]`, where `actions[:, t]` is the action taken
    /// before `embedded[:, t]` was observed. Returns `(prior, posterior)`.
    fn closed_loop(
        &self,
        embedded: ArrayView3<'_, f32>,
        actions: ArrayView3<'_, f32>,
        initial_state: Option<&Self::State>,
    ) -> Result<(Self::Sequence, Self::Sequence)>;
}

/// Decodes a scalar objective (typically predicted reward) from every step of
/// a latent trajectory. Output shape is `[batch, horizon]`.
pub trait ObjectiveDecoder<S>: Send + Sync {
    fn decode(&self, states: &S) -> Result<Array2<f32>>;
}

/// Maps a raw observation to the embedding the dynamics model filters.
pub trait ObservationEncoder: Send + Sync {
    fn embed(&self, observation: ArrayView1<'_, f32>) -> Result<Array1<f32>>;
}
