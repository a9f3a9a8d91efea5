//! Run configuration shared by the subcommands.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use worldplan::planning::{Aggregation, CemConfig};
use worldplan::rewards::Reward;
use worldplan_envs::PointNavConfig;

/// Everything a planning or evaluation run needs, loadable from JSON.
///
/// Missing fields take their defaults, so a file may override only the
/// parts it cares about.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Base seed; command-line `--seed` takes precedence
    pub seed: Option<u64>,
    pub planner: CemConfig,
    pub aggregation: Aggregation,
    /// Reward reported by the environment during evaluation
    pub reward: Reward,
    pub env: PointNavConfig,
    /// Seed each planning call with the previous plan
    pub warm_start: bool,
}

impl RunConfig {
    /// Defaults, or the contents of `path` when given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("parsing config {}", path.display()))?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.planner.validate().context("invalid planner config")?;
        self.aggregation.validate().context("invalid aggregation")?;
        self.reward.validate().context("invalid reward")?;
        self.env.validate().context("invalid env config")?;
        Ok(())
    }
}
