//! Environment traits and wrappers.
//!
//! Provides the `NavEnv` trait that navigation simulators implement, the
//! `NavigationMetrics` queries reward terms read, and wrappers for episode
//! statistics and reward shaping.

mod traits;
mod wrappers;

pub use traits::{EnvInfo, NavEnv, NavigationMetrics, StepResult};
pub use wrappers::{EpisodeStats, RewardWrapper};
