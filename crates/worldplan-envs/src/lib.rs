//! Reference navigation environment and world model for worldplan.
//!
//! Provides:
//! - `PointNav` - planar point robot steering to a goal around obstacles
//! - `KinematicModel` - exact latent dynamics of `PointNav` motion
//! - `ObservationEmbedder` / `GoalDistanceDecoder` - the matching encoder and
//!   objective decoder

mod kinematic;
mod point_nav;

pub use kinematic::{
    state_from_observation, GoalDistanceDecoder, KinematicModel, ObservationEmbedder, FEATURE_DIM,
};
pub use point_nav::{Obstacle, PointNav, PointNavConfig, OBSERVATION_DIM};
