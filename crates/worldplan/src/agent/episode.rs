use super::Agent;
use crate::env::{NavEnv, NavigationMetrics};
use crate::log::Metrics;
use crate::Result;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A recorded episode.
///
/// `observations` has one more entry than `actions` and `rewards`: the
/// observation after reset comes first.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub observations: Vec<Vec<f32>>,
    pub actions: Vec<Vec<f32>>,
    pub rewards: Vec<f32>,
    pub success: bool,
    pub collisions: u32,
    pub final_distance: f32,
    pub geodesic_distance: f32,
}

impl Episode {
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn total_reward(&self) -> f32 {
        self.rewards.iter().sum()
    }

    /// Summary metrics of the episode.
    pub fn metrics(&self) -> Metrics {
        let mut metrics = Metrics::new();
        metrics.insert("return".into(), self.total_reward());
        metrics.insert("length".into(), self.len() as f32);
        metrics.insert("success".into(), if self.success { 1.0 } else { 0.0 });
        metrics.insert("collisions".into(), self.collisions as f32);
        metrics.insert("final_distance".into(), self.final_distance);
        metrics
    }
}

/// Run one episode of `agent` in `env` until it terminates or truncates.
pub fn run_episode<E, A, R>(
    env: &mut E,
    agent: &mut A,
    seed: Option<u64>,
    rng: &mut R,
) -> Result<Episode>
where
    E: NavEnv + NavigationMetrics,
    A: Agent,
    R: Rng,
{
    let (mut observation, _) = env.reset(seed);
    agent.reset();

    let mut episode = Episode {
        geodesic_distance: env.geodesic_distance(),
        ..Default::default()
    };
    episode.observations.push(observation.to_vec());

    loop {
        let action = agent.act(&observation, rng)?;
        let result = env.step(&action);
        if env.previous_step_collided() {
            episode.collisions += 1;
        }

        episode.actions.push(action.to_vec());
        episode.rewards.push(result.reward);
        episode.observations.push(result.observation.to_vec());
        let done = result.done();
        observation = result.observation;

        if done {
            let info = &result.info;
            if let (Some(ret), Some(len)) = (info.episode_return, info.episode_length) {
                tracing::debug!(episode_return = ret, episode_length = len, "episode stats");
            }
            break;
        }
    }

    episode.success = env.episode_success();
    episode.final_distance = env.distance_to_target();
    tracing::info!(
        steps = episode.len(),
        success = episode.success,
        collisions = episode.collisions,
        final_distance = episode.final_distance,
        "episode finished"
    );
    Ok(episode)
}
