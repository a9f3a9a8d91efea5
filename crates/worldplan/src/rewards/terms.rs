//! Individual navigation reward terms.

use crate::env::NavigationMetrics;
use crate::{PlanError, Result};
use serde::{Deserialize, Serialize};

/// Dense progress reward.
///
/// Each step pays `slack_reward`, plus `distance_scaling` times the reduction
/// in distance to the goal since the previous step, plus `success_reward`
/// once the goal is reached.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DenseReward {
    pub slack_reward: f32,
    pub success_reward: f32,
    pub distance_scaling: f32,
    #[serde(skip)]
    previous_target_distance: Option<f32>,
}

impl Default for DenseReward {
    fn default() -> Self {
        Self::new(-0.01, 10.0, 1.0)
    }
}

impl DenseReward {
    pub fn new(slack_reward: f32, success_reward: f32, distance_scaling: f32) -> Self {
        Self {
            slack_reward,
            success_reward,
            distance_scaling,
            previous_target_distance: None,
        }
    }

    pub fn reward_range<E: NavigationMetrics + ?Sized>(&self, env: &E) -> (f32, f32) {
        let step_size = env.forward_step_size();
        (
            self.slack_reward - step_size,
            self.success_reward + step_size,
        )
    }

    pub fn reward<E: NavigationMetrics + ?Sized>(&mut self, env: &E) -> f32 {
        // A new episode measures progress from the start position.
        let previous = *self
            .previous_target_distance
            .get_or_insert_with(|| env.geodesic_distance());

        let current = env.distance_to_target();
        let mut reward = self.slack_reward + self.distance_scaling * (previous - current);
        self.previous_target_distance = Some(current);

        if env.episode_success() {
            reward += self.success_reward;
        }
        reward
    }

    pub fn reset(&mut self) {
        self.previous_target_distance = None;
    }

    fn validate(&self) -> Result<()> {
        ensure_finite("dense.slack_reward", self.slack_reward)?;
        ensure_finite("dense.success_reward", self.success_reward)?;
        ensure_finite("dense.distance_scaling", self.distance_scaling)
    }
}

/// Sparse success reward proportional to the optimal path length.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimalPathLengthReward {
    pub scaling: f32,
}

impl Default for OptimalPathLengthReward {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl OptimalPathLengthReward {
    pub fn new(scaling: f32) -> Self {
        Self { scaling }
    }

    pub fn reward_range(&self) -> (f32, f32) {
        (0.0, f32::INFINITY)
    }

    pub fn reward<E: NavigationMetrics + ?Sized>(&self, env: &E) -> f32 {
        if env.episode_success() {
            self.scaling * env.geodesic_distance()
        } else {
            0.0
        }
    }

    fn validate(&self) -> Result<()> {
        ensure_finite("optimal_path_length.scaling", self.scaling)
    }
}

/// Constant penalty for every step blocked by an obstacle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionPenalty {
    pub scaling: f32,
}

impl Default for CollisionPenalty {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl CollisionPenalty {
    pub fn new(scaling: f32) -> Self {
        Self { scaling }
    }

    pub fn reward_range(&self) -> (f32, f32) {
        (-self.scaling, 0.0)
    }

    pub fn reward<E: NavigationMetrics + ?Sized>(&self, env: &E) -> f32 {
        if env.previous_step_collided() {
            -self.scaling
        } else {
            0.0
        }
    }

    fn validate(&self) -> Result<()> {
        ensure_finite("collision_penalty.scaling", self.scaling)
    }
}

/// Penalty for getting closer than `threshold` to an obstacle.
///
/// The distance is measured from the agent's surface (its radius is
/// subtracted) and the penalty grows linearly to `scaling` at contact.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleDistancePenalty {
    pub threshold: f32,
    pub scaling: f32,
}

impl Default for ObstacleDistancePenalty {
    fn default() -> Self {
        Self {
            threshold: 1.0,
            scaling: 1.0,
        }
    }
}

impl ObstacleDistancePenalty {
    pub fn new(threshold: f32, scaling: f32) -> Result<Self> {
        let penalty = Self { threshold, scaling };
        penalty.validate()?;
        Ok(penalty)
    }

    pub fn reward_range(&self) -> (f32, f32) {
        (-self.scaling, 0.0)
    }

    pub fn reward<E: NavigationMetrics + ?Sized>(&self, env: &E) -> f32 {
        let radius = env.agent_radius();
        let distance = env.distance_to_closest_obstacle(self.threshold + radius) - radius;
        if distance < self.threshold {
            self.scaling * (distance / self.threshold - 1.0)
        } else {
            0.0
        }
    }

    fn validate(&self) -> Result<()> {
        ensure_finite("obstacle_distance_penalty.scaling", self.scaling)?;
        if !(self.threshold.is_finite() && self.threshold > 0.0) {
            return Err(PlanError::invalid(format!(
                "obstacle_distance_penalty.threshold must be positive, got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}

pub(super) fn validate_term(term: &super::Reward) -> Result<()> {
    use super::Reward;
    match term {
        Reward::Dense(r) => r.validate(),
        Reward::OptimalPathLength(r) => r.validate(),
        Reward::CollisionPenalty(r) => r.validate(),
        Reward::ObstacleDistancePenalty(r) => r.validate(),
        Reward::Combined(c) => c.rewards.iter().try_for_each(validate_term),
    }
}

fn ensure_finite(name: &str, value: f32) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(PlanError::invalid(format!("{} must be finite, got {}", name, value)))
    }
}
