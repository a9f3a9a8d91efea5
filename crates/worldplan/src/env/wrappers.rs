//! Environment wrappers for episode statistics and reward shaping.

use super::{EnvInfo, NavEnv, NavigationMetrics, StepResult};
use crate::rewards::Reward;
use crate::spaces::Box as BoxSpace;
use ndarray::Array1;

/// Accumulates the return and length of the running episode and reports
/// them in the info of its final step.
pub struct EpisodeStats<E: NavEnv> {
    env: E,
    running_return: f32,
    steps: u32,
}

impl<E: NavEnv> EpisodeStats<E> {
    pub fn new(env: E) -> Self {
        Self {
            env,
            running_return: 0.0,
            steps: 0,
        }
    }

    pub fn inner(&self) -> &E {
        &self.env
    }

    pub fn inner_mut(&mut self) -> &mut E {
        &mut self.env
    }
}

impl<E: NavEnv> NavEnv for EpisodeStats<E> {
    fn observation_space(&self) -> BoxSpace {
        self.env.observation_space()
    }

    fn action_space(&self) -> BoxSpace {
        self.env.action_space()
    }

    fn reset(&mut self, seed: Option<u64>) -> (Array1<f32>, EnvInfo) {
        self.running_return = 0.0;
        self.steps = 0;
        self.env.reset(seed)
    }

    fn step(&mut self, action: &Array1<f32>) -> StepResult {
        let mut result = self.env.step(action);
        self.running_return += result.reward;
        self.steps += 1;

        if result.done() {
            let info = std::mem::take(&mut result.info);
            result.info = info.with_episode_stats(self.running_return, self.steps);
            self.running_return = 0.0;
            self.steps = 0;
        }
        result
    }

    fn render(&self) -> Option<String> {
        self.env.render()
    }

    fn close(&mut self) {
        self.env.close()
    }

    fn is_done(&self) -> bool {
        self.env.is_done()
    }
}

impl<E: NavEnv + NavigationMetrics> NavigationMetrics for EpisodeStats<E> {
    fn distance_to_target(&self) -> f32 {
        self.env.distance_to_target()
    }

    fn episode_success(&self) -> bool {
        self.env.episode_success()
    }

    fn geodesic_distance(&self) -> f32 {
        self.env.geodesic_distance()
    }

    fn previous_step_collided(&self) -> bool {
        self.env.previous_step_collided()
    }

    fn distance_to_closest_obstacle(&self, max_search: f32) -> f32 {
        self.env.distance_to_closest_obstacle(max_search)
    }

    fn agent_radius(&self) -> f32 {
        self.env.agent_radius()
    }

    fn forward_step_size(&self) -> f32 {
        self.env.forward_step_size()
    }
}

/// Wrapper that replaces the environment's native reward with a `Reward`.
///
/// The reward is evaluated after every step against the wrapped simulator and
/// its per-episode state is cleared on reset.
pub struct RewardWrapper<E> {
    env: E,
    reward: Reward,
}

impl<E: NavEnv + NavigationMetrics> RewardWrapper<E> {
    pub fn new(env: E, reward: Reward) -> Self {
        Self { env, reward }
    }

    /// Bounds of the per-step reward for the wrapped environment.
    pub fn reward_range(&self) -> (f32, f32) {
        self.reward.reward_range(&self.env)
    }

    pub fn inner(&self) -> &E {
        &self.env
    }
}

impl<E: NavEnv + NavigationMetrics> NavEnv for RewardWrapper<E> {
    fn observation_space(&self) -> BoxSpace {
        self.env.observation_space()
    }

    fn action_space(&self) -> BoxSpace {
        self.env.action_space()
    }

    fn reset(&mut self, seed: Option<u64>) -> (Array1<f32>, EnvInfo) {
        self.reward.reset();
        self.env.reset(seed)
    }

    fn step(&mut self, action: &Array1<f32>) -> StepResult {
        let mut result = self.env.step(action);
        result.reward = self.reward.reward(&self.env);
        result
    }

    fn render(&self) -> Option<String> {
        self.env.render()
    }

    fn close(&mut self) {
        self.env.close()
    }

    fn is_done(&self) -> bool {
        self.env.is_done()
    }
}

impl<E: NavEnv + NavigationMetrics> NavigationMetrics for RewardWrapper<E> {
    fn distance_to_target(&self) -> f32 {
        self.env.distance_to_target()
    }

    fn episode_success(&self) -> bool {
        self.env.episode_success()
    }

    fn geodesic_distance(&self) -> f32 {
        self.env.geodesic_distance()
    }

    fn previous_step_collided(&self) -> bool {
        self.env.previous_step_collided()
    }

    fn distance_to_closest_obstacle(&self, max_search: f32) -> f32 {
        self.env.distance_to_closest_obstacle(max_search)
    }

    fn agent_radius(&self) -> f32 {
        self.env.agent_radius()
    }

    fn forward_step_size(&self) -> f32 {
        self.env.forward_step_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewards::{CollisionPenalty, DenseReward};

    // Walks one unit towards a goal 5 units away per step; collides on step 2.
    struct LineEnv {
        position: f32,
        step_count: u32,
    }

    impl NavEnv for LineEnv {
        fn observation_space(&self) -> BoxSpace {
            BoxSpace::symmetric(1)
        }

        fn action_space(&self) -> BoxSpace {
            BoxSpace::symmetric(1)
        }

        fn reset(&mut self, _seed: Option<u64>) -> (Array1<f32>, EnvInfo) {
            self.position = 0.0;
            self.step_count = 0;
            (Array1::zeros(1), EnvInfo::new())
        }

        fn step(&mut self, _action: &Array1<f32>) -> StepResult {
            self.step_count += 1;
            self.position += 1.0;
            StepResult {
                observation: Array1::from_elem(1, self.position),
                reward: 1.0,
                terminated: self.step_count >= 5,
                truncated: false,
                info: EnvInfo::new(),
            }
        }
    }

    impl NavigationMetrics for LineEnv {
        fn distance_to_target(&self) -> f32 {
            5.0 - self.position
        }

        fn episode_success(&self) -> bool {
            self.position >= 5.0
        }

        fn geodesic_distance(&self) -> f32 {
            5.0
        }

        fn previous_step_collided(&self) -> bool {
            self.step_count == 2
        }

        fn distance_to_closest_obstacle(&self, max_search: f32) -> f32 {
            max_search
        }

        fn agent_radius(&self) -> f32 {
            0.1
        }

        fn forward_step_size(&self) -> f32 {
            1.0
        }
    }

    fn line_env() -> LineEnv {
        LineEnv {
            position: 0.0,
            step_count: 0,
        }
    }

    #[test]
    fn test_episode_stats() {
        let mut wrapped = EpisodeStats::new(line_env());

        wrapped.reset(None);

        let action = Array1::zeros(1);
        for _ in 0..4 {
            let result = wrapped.step(&action);
            assert!(!result.done());
            assert!(result.info.get("episode_return").is_none());
        }

        // 5th step should terminate
        let result = wrapped.step(&action);
        assert!(result.done());
        assert_eq!(result.info.get("episode_return"), Some(5.0));
        assert_eq!(result.info.get("episode_length"), Some(5.0));
    }

    #[test]
    fn test_reward_wrapper_replaces_native_reward() {
        let reward = Reward::combine(vec![
            DenseReward::new(-0.5, 10.0, 1.0).into(),
            CollisionPenalty::new(2.0).into(),
        ]);
        let mut env = RewardWrapper::new(line_env(), reward);
        env.reset(None);

        let action = Array1::zeros(1);
        // Progress of one unit, minus slack.
        assert_eq!(env.step(&action).reward, 0.5);
        // Collision on the second step.
        assert_eq!(env.step(&action).reward, -1.5);
        env.step(&action);
        env.step(&action);
        // Final step reaches the goal.
        assert_eq!(env.step(&action).reward, 10.5);
    }

    #[test]
    fn test_episode_stats_sums_replaced_reward() {
        let reward = Reward::combine(vec![CollisionPenalty::new(2.0).into()]);
        let mut env = EpisodeStats::new(RewardWrapper::new(line_env(), reward));
        env.reset(None);

        let action = Array1::zeros(1);
        let mut total = 0.0;
        loop {
            let result = env.step(&action);
            total += result.reward;
            if result.done() {
                assert_eq!(result.info.episode_return, Some(total));
                break;
            }
        }
        // Only the collision on step 2 is penalized; the native reward would sum to 5.
        assert_eq!(total, -2.0);
    }

    #[test]
    fn test_reward_wrapper_resets_dense_state() {
        let mut env = RewardWrapper::new(line_env(), DenseReward::default().into());
        env.reset(None);
        let action = Array1::zeros(1);
        env.step(&action);
        env.step(&action);

        env.reset(None);
        let first = env.step(&action).reward;
        // Distance baseline restarts from the geodesic distance.
        assert!((first - (-0.01 + 1.0)).abs() < 1e-6);
    }
}
