//! Planar point-robot navigation environment.

use ndarray::Array1;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, PI};
use worldplan::env::{EnvInfo, NavEnv, NavigationMetrics, StepResult};
use worldplan::spaces::Box as BoxSpace;
use worldplan::{PlanError, Result};

/// Dimension of the observation vector.
pub const OBSERVATION_DIM: usize = 6;

/// Circular obstacle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub center: [f32; 2],
    pub radius: f32,
}

impl Obstacle {
    pub fn new(center: [f32; 2], radius: f32) -> Self {
        Self { center, radius }
    }

    /// Distance from `point` to the obstacle surface (negative inside).
    pub fn surface_distance(&self, point: [f32; 2]) -> f32 {
        (point[0] - self.center[0]).hypot(point[1] - self.center[1]) - self.radius
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointNavConfig {
    /// Distance moved per step
    pub forward_step: f32,
    pub agent_radius: f32,
    /// Goal counts as reached within this distance
    pub success_distance: f32,
    /// Episodes truncate after this many steps
    pub max_steps: u32,
    /// Range the start-to-goal distance is drawn from
    pub goal_distance: [f32; 2],
    /// Use this goal instead of sampling one
    pub fixed_goal: Option<[f32; 2]>,
    pub obstacles: Vec<Obstacle>,
    /// Extra obstacles placed at random on every reset
    pub num_random_obstacles: usize,
    pub random_obstacle_radius: f32,
}

impl Default for PointNavConfig {
    fn default() -> Self {
        Self {
            forward_step: 0.25,
            agent_radius: 0.1,
            success_distance: 0.3,
            max_steps: 100,
            goal_distance: [1.0, 3.0],
            fixed_goal: None,
            obstacles: Vec::new(),
            num_random_obstacles: 0,
            random_obstacle_radius: 0.2,
        }
    }
}

impl PointNavConfig {
    pub fn with_fixed_goal(mut self, goal: [f32; 2]) -> Self {
        self.fixed_goal = Some(goal);
        self
    }

    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_obstacle(mut self, obstacle: Obstacle) -> Self {
        self.obstacles.push(obstacle);
        self
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("forward_step", self.forward_step),
            ("success_distance", self.success_distance),
            ("random_obstacle_radius", self.random_obstacle_radius),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(PlanError::InvalidArgument(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }
        if !(self.agent_radius.is_finite() && self.agent_radius >= 0.0) {
            return Err(PlanError::InvalidArgument(format!(
                "agent_radius must be non-negative, got {}",
                self.agent_radius
            )));
        }
        if self.max_steps == 0 {
            return Err(PlanError::InvalidArgument("max_steps must be positive".into()));
        }
        let [lo, hi] = self.goal_distance;
        if !(lo.is_finite() && hi.is_finite() && 0.0 < lo && lo <= hi) {
            return Err(PlanError::InvalidArgument(format!(
                "goal_distance must satisfy 0 < min <= max, got [{}, {}]",
                lo, hi
            )));
        }
        if self.obstacles.iter().any(|o| !(o.radius > 0.0)) {
            return Err(PlanError::InvalidArgument("obstacle radius must be positive".into()));
        }
        Ok(())
    }
}

/// Planar robot steering towards a goal.
///
/// The robot starts each episode at the origin facing `+x`. An action
/// `a` in `[-1, 1]` turns the heading by `a * pi/2` and then moves
/// `forward_step` along the mid-angle of the turn. A move that would overlap
/// an obstacle is blocked: the pose stays unchanged and the step counts as a
/// collision.
///
/// Observation: `[x, y, cos(heading), sin(heading), goal_x, goal_y]`
/// Action: `[steer]`
pub struct PointNav {
    config: PointNavConfig,
    rng: ChaCha8Rng,
    position: [f32; 2],
    heading: f32,
    goal: [f32; 2],
    start_distance: f32,
    obstacles: Vec<Obstacle>,
    steps: u32,
    collided: bool,
    done: bool,
}

impl PointNav {
    pub fn new(config: PointNavConfig) -> Result<Self> {
        config.validate()?;
        let obstacles = config.obstacles.clone();
        let goal = config.fixed_goal.unwrap_or([config.goal_distance[0], 0.0]);
        Ok(Self {
            start_distance: goal[0].hypot(goal[1]),
            config,
            rng: ChaCha8Rng::from_entropy(),
            position: [0.0; 2],
            heading: 0.0,
            goal,
            obstacles,
            steps: 0,
            collided: false,
            done: false,
        })
    }

    pub fn config(&self) -> &PointNavConfig {
        &self.config
    }

    pub fn goal(&self) -> [f32; 2] {
        self.goal
    }

    pub fn position(&self) -> [f32; 2] {
        self.position
    }

    pub fn heading(&self) -> f32 {
        self.heading
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    fn observation(&self) -> Array1<f32> {
        Array1::from(vec![
            self.position[0],
            self.position[1],
            self.heading.cos(),
            self.heading.sin(),
            self.goal[0],
            self.goal[1],
        ])
    }

    fn sample_goal(&mut self) -> [f32; 2] {
        if let Some(goal) = self.config.fixed_goal {
            return goal;
        }
        let [lo, hi] = self.config.goal_distance;
        let distance = self.rng.gen_range(lo..=hi);
        let angle = self.rng.gen_range(-PI..PI);
        [distance * angle.cos(), distance * angle.sin()]
    }

    fn place_random_obstacles(&mut self) {
        let radius = self.config.random_obstacle_radius;
        let clearance = radius + self.config.agent_radius + self.config.success_distance;
        let extent = self.start_distance + radius;
        let mut placed = 0;
        for _ in 0..self.config.num_random_obstacles * 20 {
            if placed == self.config.num_random_obstacles {
                break;
            }
            let center = [
                self.rng.gen_range(-extent..=extent),
                self.rng.gen_range(-extent..=extent),
            ];
            let candidate = Obstacle::new(center, radius);
            if candidate.surface_distance([0.0, 0.0]) > clearance - radius
                && candidate.surface_distance(self.goal) > clearance - radius
            {
                self.obstacles.push(candidate);
                placed += 1;
            }
        }
    }

    fn blocked(&self, point: [f32; 2]) -> bool {
        self.obstacles
            .iter()
            .any(|o| o.surface_distance(point) < self.config.agent_radius)
    }
}

impl NavEnv for PointNav {
    fn observation_space(&self) -> BoxSpace {
        let bound = self.config.goal_distance[1].max(self.start_distance)
            + self.config.max_steps as f32 * self.config.forward_step;
        BoxSpace::uniform(OBSERVATION_DIM, -bound, bound)
            .unwrap_or_else(|_| BoxSpace::symmetric(OBSERVATION_DIM))
    }

    fn action_space(&self) -> BoxSpace {
        BoxSpace::symmetric(1)
    }

    fn reset(&mut self, seed: Option<u64>) -> (Array1<f32>, EnvInfo) {
        if let Some(s) = seed {
            self.rng = ChaCha8Rng::seed_from_u64(s);
        }
        self.position = [0.0; 2];
        self.heading = 0.0;
        self.goal = self.sample_goal();
        self.start_distance = self.goal[0].hypot(self.goal[1]);
        self.obstacles = self.config.obstacles.clone();
        self.place_random_obstacles();
        self.steps = 0;
        self.collided = false;
        self.done = false;

        (self.observation(), EnvInfo::new())
    }

    fn step(&mut self, action: &Array1<f32>) -> StepResult {
        let steer = action.get(0).copied().unwrap_or(0.0).clamp(-1.0, 1.0);
        let previous_distance = self.distance_to_target();

        let turn = steer * FRAC_PI_2;
        let mid = self.heading + turn / 2.0;
        let next = [
            self.position[0] + mid.cos() * self.config.forward_step,
            self.position[1] + mid.sin() * self.config.forward_step,
        ];
        self.collided = self.blocked(next);
        if !self.collided {
            self.position = next;
            self.heading += turn;
        }
        self.steps += 1;

        let distance = self.distance_to_target();
        let terminated = self.episode_success();
        let truncated = !terminated && self.steps >= self.config.max_steps;
        self.done = terminated || truncated;

        let info = EnvInfo::new()
            .with_extra("distance", distance)
            .with_extra("collided", if self.collided { 1.0 } else { 0.0 });

        StepResult {
            observation: self.observation(),
            reward: previous_distance - distance,
            terminated,
            truncated,
            info,
        }
    }

    fn render(&self) -> Option<String> {
        Some(format!(
            "pos=({:.2}, {:.2}) heading={:.2} goal=({:.2}, {:.2}) distance={:.2}{}",
            self.position[0],
            self.position[1],
            self.heading,
            self.goal[0],
            self.goal[1],
            self.distance_to_target(),
            if self.collided { " [collision]" } else { "" }
        ))
    }

    fn is_done(&self) -> bool {
        self.done
    }
}

impl NavigationMetrics for PointNav {
    fn distance_to_target(&self) -> f32 {
        (self.goal[0] - self.position[0]).hypot(self.goal[1] - self.position[1])
    }

    fn episode_success(&self) -> bool {
        self.distance_to_target() < self.config.success_distance
    }

    fn geodesic_distance(&self) -> f32 {
        self.start_distance
    }

    fn previous_step_collided(&self) -> bool {
        self.collided
    }

    fn distance_to_closest_obstacle(&self, max_search: f32) -> f32 {
        self.obstacles
            .iter()
            .map(|o| o.surface_distance(self.position).max(0.0))
            .fold(max_search, f32::min)
    }

    fn agent_radius(&self) -> f32 {
        self.config.agent_radius
    }

    fn forward_step_size(&self) -> f32 {
        self.config.forward_step
    }
}
