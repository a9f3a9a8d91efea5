//! Model-predictive planning over a latent dynamics model.
//!
//! This module provides:
//! - Collaborator traits: `DynamicsModel`, `ObjectiveDecoder`,
//!   `ObservationEncoder`
//! - The trajectory simulator (`simulate`, `imagine_from_context`)
//! - The objective adapter (`Objective`, `Aggregation`)
//! - The CEM optimizer (`cross_entropy_method`) and planner
//!   (`CrossEntropyMethod`)
//! - Optional iteration diagnostics (`CemObserver`, `TrajectoryPlotter`)

mod belief;
mod cem;
mod diagnostics;
mod model;
mod objective;
mod planner;
mod simulate;
mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use belief::Belief;
pub use cem::{cross_entropy_method, plan_with_observer, CemConfig, VARIANCE_FLOOR};
pub use diagnostics::{
    frame_name, normalize_scores, render_svg, CemObserver, IterationSnapshot, TrajectoryPlotter,
};
pub use model::{
    DynamicsModel, LatentSequence, LatentState, ObjectiveDecoder, ObservationEncoder,
};
pub use objective::{Aggregation, Objective};
pub use planner::{CrossEntropyMethod, Planner};
pub use simulate::{imagine_from_context, simulate, simulate_plan};
pub use state::{TensorSequence, TensorState};
