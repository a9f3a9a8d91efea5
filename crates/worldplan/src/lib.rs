//! # worldplan
//!
//! Model-predictive planning over learned latent dynamics models.
//!
//! ## Overview
//!
//! worldplan provides:
//! - A Cross-Entropy Method (CEM) trajectory optimizer that searches action
//!   sequences by rolling out a latent dynamics model
//! - Narrow traits for the external collaborators (`DynamicsModel`,
//!   `ObjectiveDecoder`, `ObservationEncoder`)
//! - Navigation reward terms that compose into a single objective
//! - Agents that replan at every control step (MPC) or act randomly
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use worldplan::prelude::*;
//! use rand::SeedableRng;
//!
//! let config = CemConfig::default().with_horizon(12).with_iterations(10);
//! let planner = CrossEntropyMethod::new(model, decoder, action_space, config)?;
//!
//! let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(42);
//! let action = planner.get_action(&current_state, &mut rng)?;
//! ```

pub mod agent;
pub mod env;
pub mod log;
pub mod planning;
pub mod rewards;
pub mod spaces;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::agent::{run_episode, Agent, Episode, MpcAgent, RandomAgent};
    pub use crate::env::{EnvInfo, EpisodeStats, NavEnv, NavigationMetrics, RewardWrapper, StepResult};
    pub use crate::planning::{
        cross_entropy_method, simulate, simulate_plan, Aggregation, Belief, CemConfig,
        CemObserver, CrossEntropyMethod, DynamicsModel, LatentSequence, LatentState, Objective,
        ObjectiveDecoder, ObservationEncoder, Planner, TensorSequence, TensorState,
        TrajectoryPlotter,
    };
    pub use crate::rewards::Reward;
    pub use crate::spaces::{Box as BoxSpace, Space};

    pub use crate::log::{CompositeLogger, ConsoleLogger, MetricLogger, NoOpLogger};
    pub use crate::utils::Statistics;

    pub use crate::{PlanError, Result};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Error types for the library
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// Failure reported by a dynamics model, decoder or encoder.
    #[error("Model error: {0}")]
    Model(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PlanError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        PlanError::InvalidArgument(message.into())
    }

    pub(crate) fn shape(expected: &[usize], actual: &[usize]) -> Self {
        PlanError::ShapeMismatch {
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }
}

pub type Result<T> = core::result::Result<T, PlanError>;
