//! Environment traits shared by simulators, wrappers and agents.

use crate::spaces::Box as BoxSpace;
use ndarray::Array1;
use smallvec::SmallVec;

/// Side information attached to a step.
///
/// `episode_return` and `episode_length` are filled in by `EpisodeStats` on
/// the final step of an episode. Simulators add their own measurements
/// (distance to goal, collision flag) as `extra` entries.
#[derive(Clone, Debug, Default)]
pub struct EnvInfo {
    pub episode_return: Option<f32>,
    pub episode_length: Option<u32>,
    pub extra: SmallVec<[(&'static str, f32); 4]>,
}

impl EnvInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_episode_stats(mut self, episode_return: f32, episode_length: u32) -> Self {
        self.episode_return = Some(episode_return);
        self.episode_length = Some(episode_length);
        self
    }

    pub fn with_extra(mut self, key: &'static str, value: f32) -> Self {
        self.extra.push((key, value));
        self
    }

    /// Look up an episode statistic or an extra measurement by name.
    pub fn get(&self, key: &str) -> Option<f32> {
        match key {
            "episode_return" => self.episode_return,
            "episode_length" => self.episode_length.map(|len| len as f32),
            _ => self
                .extra
                .iter()
                .find_map(|&(name, value)| (name == key).then_some(value)),
        }
    }
}

/// Outcome of one `NavEnv::step`.
#[derive(Clone, Debug)]
pub struct StepResult {
    pub observation: Array1<f32>,
    pub reward: f32,
    /// The goal was reached
    pub terminated: bool,
    /// The step limit was hit first
    pub truncated: bool,
    pub info: EnvInfo,
}

impl StepResult {
    pub fn done(&self) -> bool {
        self.terminated || self.truncated
    }
}

/// Core trait for navigation environments driven by continuous actions.
///
/// Observations and actions are flat `f32` vectors described by `Box` spaces.
pub trait NavEnv: Send {
    fn observation_space(&self) -> BoxSpace;

    fn action_space(&self) -> BoxSpace;

    /// Start a new episode. A seed makes the episode (goal, obstacles)
    /// reproducible.
    fn reset(&mut self, seed: Option<u64>) -> (Array1<f32>, EnvInfo);

    /// Apply `action` for one control step.
    fn step(&mut self, action: &Array1<f32>) -> StepResult;

    /// One-line text description of the current state.
    fn render(&self) -> Option<String> {
        None
    }

    fn close(&mut self) {}

    /// Whether the current episode has ended.
    fn is_done(&self) -> bool {
        false
    }
}

/// Queries a navigation simulator answers about the current episode.
///
/// Reward terms are computed from these measurements rather than from raw
/// observations, so any simulator exposing them can be scored.
pub trait NavigationMetrics {
    /// Current distance from the agent to the goal.
    fn distance_to_target(&self) -> f32;

    /// Whether the agent is within the success radius of the goal.
    fn episode_success(&self) -> bool;

    /// Shortest-path distance from the episode start to the goal.
    fn geodesic_distance(&self) -> f32;

    /// Whether the last step was blocked by an obstacle.
    fn previous_step_collided(&self) -> bool;

    /// Distance from the agent's center to the nearest obstacle surface,
    /// capped at `max_search`.
    fn distance_to_closest_obstacle(&self, max_search: f32) -> f32;

    /// Radius of the agent's body.
    fn agent_radius(&self) -> f32;

    /// Distance covered by one forward step.
    fn forward_step_size(&self) -> f32;
}
