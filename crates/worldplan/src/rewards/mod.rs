//! Navigation reward functions.
//!
//! `Reward` is a closed set of terms. `Combined` holds an ordered list of
//! rewards and is itself a reward, so combinations nest. Every variant answers
//! the same three questions: its range, its value after a step, and how to
//! clear per-episode state.
//!
//! Rewards deserialize from tagged JSON:
//!
//! ```json
//! {"type": "combined", "rewards": [
//!     {"type": "dense", "slack_reward": -0.01},
//!     {"type": "collision_penalty", "scaling": 0.5}
//! ]}
//! ```

mod terms;

pub use terms::{CollisionPenalty, DenseReward, ObstacleDistancePenalty, OptimalPathLengthReward};

use crate::env::NavigationMetrics;
use crate::Result;
use serde::{Deserialize, Serialize};

/// A navigation reward function.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Reward {
    Dense(DenseReward),
    OptimalPathLength(OptimalPathLengthReward),
    CollisionPenalty(CollisionPenalty),
    ObstacleDistancePenalty(ObstacleDistancePenalty),
    Combined(CombinedRewards),
}

/// Sum of an ordered list of rewards.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CombinedRewards {
    pub rewards: Vec<Reward>,
}

impl Reward {
    /// Combine several rewards into one that sums them.
    pub fn combine(rewards: Vec<Reward>) -> Self {
        Reward::Combined(CombinedRewards { rewards })
    }

    /// Check every parameter, recursing into combinations.
    pub fn validate(&self) -> Result<()> {
        terms::validate_term(self)
    }

    /// Lower and upper bound of a single step's reward.
    pub fn reward_range<E: NavigationMetrics + ?Sized>(&self, env: &E) -> (f32, f32) {
        match self {
            Reward::Dense(r) => r.reward_range(env),
            Reward::OptimalPathLength(r) => r.reward_range(),
            Reward::CollisionPenalty(r) => r.reward_range(),
            Reward::ObstacleDistancePenalty(r) => r.reward_range(),
            Reward::Combined(c) => c.rewards.iter().fold((0.0, 0.0), |(lower, upper), r| {
                let (a, b) = r.reward_range(env);
                (lower + a, upper + b)
            }),
        }
    }

    /// Reward for the step the environment just took.
    pub fn reward<E: NavigationMetrics + ?Sized>(&mut self, env: &E) -> f32 {
        match self {
            Reward::Dense(r) => r.reward(env),
            Reward::OptimalPathLength(r) => r.reward(env),
            Reward::CollisionPenalty(r) => r.reward(env),
            Reward::ObstacleDistancePenalty(r) => r.reward(env),
            Reward::Combined(c) => c.rewards.iter_mut().map(|r| r.reward(env)).sum(),
        }
    }

    /// Clear per-episode state.
    pub fn reset(&mut self) {
        match self {
            Reward::Dense(r) => r.reset(),
            Reward::Combined(c) => c.rewards.iter_mut().for_each(Reward::reset),
            Reward::OptimalPathLength(_)
            | Reward::CollisionPenalty(_)
            | Reward::ObstacleDistancePenalty(_) => {}
        }
    }
}

impl Default for Reward {
    fn default() -> Self {
        Reward::Dense(DenseReward::default())
    }
}

impl From<DenseReward> for Reward {
    fn from(reward: DenseReward) -> Self {
        Reward::Dense(reward)
    }
}

impl From<OptimalPathLengthReward> for Reward {
    fn from(reward: OptimalPathLengthReward) -> Self {
        Reward::OptimalPathLength(reward)
    }
}

impl From<CollisionPenalty> for Reward {
    fn from(reward: CollisionPenalty) -> Self {
        Reward::CollisionPenalty(reward)
    }
}

impl From<ObstacleDistancePenalty> for Reward {
    fn from(reward: ObstacleDistancePenalty) -> Self {
        Reward::ObstacleDistancePenalty(reward)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PlanError;

    #[derive(Default)]
    struct FixedMetrics {
        distance: f32,
        geodesic: f32,
        success: bool,
        collided: bool,
        obstacle: f32,
    }

    impl NavigationMetrics for FixedMetrics {
        fn distance_to_target(&self) -> f32 {
            self.distance
        }

        fn episode_success(&self) -> bool {
            self.success
        }

        fn geodesic_distance(&self) -> f32 {
            self.geodesic
        }

        fn previous_step_collided(&self) -> bool {
            self.collided
        }

        fn distance_to_closest_obstacle(&self, max_search: f32) -> f32 {
            self.obstacle.min(max_search)
        }

        fn agent_radius(&self) -> f32 {
            0.25
        }

        fn forward_step_size(&self) -> f32 {
            0.5
        }
    }

    #[test]
    fn test_dense_tracks_progress() {
        let mut reward = Reward::from(DenseReward::new(-0.25, 10.0, 2.0));
        let mut env = FixedMetrics {
            distance: 3.0,
            geodesic: 4.0,
            ..Default::default()
        };

        // First call measures from the geodesic start distance.
        assert_eq!(reward.reward(&env), -0.25 + 2.0 * 1.0);

        env.distance = 3.5;
        assert_eq!(reward.reward(&env), -0.25 + 2.0 * -0.5);

        env.distance = 0.0;
        env.success = true;
        assert_eq!(reward.reward(&env), -0.25 + 2.0 * 3.5 + 10.0);
        assert_eq!(reward.reward_range(&env), (-0.75, 10.5));
    }

    #[test]
    fn test_optimal_path_length_is_sparse() {
        let mut reward = Reward::from(OptimalPathLengthReward::new(0.5));
        let mut env = FixedMetrics {
            geodesic: 6.0,
            ..Default::default()
        };
        assert_eq!(reward.reward(&env), 0.0);
        env.success = true;
        assert_eq!(reward.reward(&env), 3.0);
        assert_eq!(reward.reward_range(&env), (0.0, f32::INFINITY));
    }

    #[test]
    fn test_collision_penalty() {
        let mut reward = Reward::from(CollisionPenalty::new(2.0));
        let mut env = FixedMetrics::default();
        assert_eq!(reward.reward(&env), 0.0);
        env.collided = true;
        assert_eq!(reward.reward(&env), -2.0);
        assert_eq!(reward.reward_range(&env), (-2.0, 0.0));
    }

    #[test]
    fn test_obstacle_distance_penalty_is_linear() {
        let mut reward = Reward::from(ObstacleDistancePenalty::new(1.0, 4.0).unwrap());
        let mut env = FixedMetrics {
            obstacle: 10.0,
            ..Default::default()
        };
        // Capped search distance minus radius is still past the threshold.
        assert_eq!(reward.reward(&env), 0.0);

        env.obstacle = 0.75;
        assert_eq!(reward.reward(&env), 4.0 * (0.5 - 1.0));

        env.obstacle = 0.25;
        assert_eq!(reward.reward(&env), -4.0);
    }

    #[test]
    fn test_obstacle_distance_penalty_rejects_bad_threshold() {
        assert!(matches!(
            ObstacleDistancePenalty::new(0.0, 1.0),
            Err(PlanError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_combined_sums_and_nests() {
        let inner = Reward::combine(vec![
            CollisionPenalty::new(1.0).into(),
            OptimalPathLengthReward::new(1.0).into(),
        ]);
        let mut reward = Reward::combine(vec![DenseReward::new(-0.5, 1.0, 1.0).into(), inner]);
        let env = FixedMetrics {
            distance: 1.0,
            geodesic: 2.0,
            success: true,
            collided: true,
            ..Default::default()
        };

        // dense: -0.5 + 1.0 + 1.0, collision: -1.0, path length: 2.0
        assert_eq!(reward.reward(&env), 2.5);
        assert_eq!(reward.reward_range(&env), (-0.5 - 0.5 - 1.0, f32::INFINITY));
    }

    #[test]
    fn test_combined_reset_reaches_nested_dense() {
        let mut reward = Reward::combine(vec![Reward::combine(vec![DenseReward::new(
            0.0, 0.0, 1.0,
        )
        .into()])]);
        let mut env = FixedMetrics {
            distance: 2.0,
            geodesic: 2.0,
            ..Default::default()
        };
        reward.reward(&env);
        env.distance = 1.0;
        assert_eq!(reward.reward(&env), 1.0);

        reward.reset();
        env.geodesic = 5.0;
        assert_eq!(reward.reward(&env), 4.0);
    }

    #[test]
    fn test_deserialize_tagged_config() {
        let json = r#"{"type": "combined", "rewards": [
            {"type": "dense", "slack_reward": -0.05},
            {"type": "obstacle_distance_penalty", "threshold": 0.5}
        ]}"#;
        let reward: Reward = serde_json::from_str(json).unwrap();
        reward.validate().unwrap();

        let expected = Reward::combine(vec![
            DenseReward::new(-0.05, 10.0, 1.0).into(),
            ObstacleDistancePenalty::new(0.5, 1.0).unwrap().into(),
        ]);
        assert_eq!(reward, expected);
    }

    #[test]
    fn test_validate_recurses() {
        let reward = Reward::combine(vec![Reward::ObstacleDistancePenalty(
            ObstacleDistancePenalty {
                threshold: -1.0,
                scaling: 1.0,
            },
        )]);
        assert!(reward.validate().is_err());
    }
}
