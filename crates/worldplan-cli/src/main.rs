//! worldplan CLI
//!
//! Plan, evaluate and collect episodes in the point navigation task.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use ndarray::ArrayView1;
use rayon::prelude::*;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use worldplan::prelude::*;
use worldplan::utils::{derive_seed, format_duration, seeded_rng};
use worldplan_envs::{
    state_from_observation, GoalDistanceDecoder, KinematicModel, ObservationEmbedder, PointNav,
};

mod config;

use config::RunConfig;

type PointNavPlanner = CrossEntropyMethod<KinematicModel, GoalDistanceDecoder>;

#[derive(Parser)]
#[command(name = "worldplan")]
#[command(version, about = "worldplan - CEM planning in latent world models", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan once from a fresh episode and print the plan
    Plan {
        /// Episode seed
        #[arg(long)]
        seed: Option<u64>,

        /// JSON run configuration
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write one SVG of the elite trajectories per iteration into DIR
        #[arg(long, value_name = "DIR")]
        visualize: Option<PathBuf>,
    },

    /// Run evaluation episodes and summarize their metrics
    Eval {
        /// Number of episodes
        #[arg(long, default_value = "10")]
        episodes: usize,

        /// Acting policy
        #[arg(long, value_enum, default_value_t = AgentKind::Mpc)]
        agent: AgentKind,

        /// Base seed, each episode derives its own
        #[arg(long)]
        seed: Option<u64>,

        /// JSON run configuration
        #[arg(long)]
        config: Option<PathBuf>,

        /// Seed every planning call with the previous plan
        #[arg(long)]
        warm_start: bool,

        /// Run episodes in parallel
        #[arg(long)]
        parallel: bool,

        /// Also write per-episode metrics to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Hide the progress bar and per-episode metrics
        #[arg(long)]
        quiet: bool,
    },

    /// Record random-policy episodes as JSON
    Collect {
        /// Output directory
        #[arg(long)]
        outdir: PathBuf,

        /// Number of episodes
        #[arg(long, default_value = "10")]
        episodes: usize,

        /// Base seed, each episode derives its own
        #[arg(long)]
        seed: Option<u64>,

        /// JSON run configuration
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print the default run configuration
    Config,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum AgentKind {
    /// Replan with CEM at every step
    Mpc,
    /// Uniformly random actions
    Random,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Plan {
            seed,
            config,
            visualize,
        } => {
            plan(seed, config.as_deref(), visualize)?;
        }
        Commands::Eval {
            episodes,
            agent,
            seed,
            config,
            warm_start,
            parallel,
            csv,
            quiet,
        } => {
            let options = EvalOptions {
                episodes,
                agent,
                seed,
                warm_start,
                parallel,
                csv,
                quiet,
            };
            eval(&options, config.as_deref())?;
        }
        Commands::Collect {
            outdir,
            episodes,
            seed,
            config,
        } => {
            collect(&outdir, episodes, seed, config.as_deref())?;
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&RunConfig::default())?);
        }
    }

    Ok(())
}

fn build_planner(config: &RunConfig, action_space: BoxSpace) -> Result<PointNavPlanner> {
    let model = KinematicModel::new(config.env.forward_step);
    let planner = CrossEntropyMethod::new(
        model,
        GoalDistanceDecoder,
        action_space,
        config.planner.clone(),
    )?
    .with_aggregation(config.aggregation)?;
    Ok(planner)
}

fn format_row(row: ArrayView1<'_, f32>) -> String {
    let values: Vec<String> = row.iter().map(|v| format!("{:+.3}", v)).collect();
    format!("[{}]", values.join(", "))
}

fn plan(seed: Option<u64>, config: Option<&Path>, visualize: Option<PathBuf>) -> Result<()> {
    let config = RunConfig::load(config)?;
    let seed = seed.or(config.seed);

    let mut env = PointNav::new(config.env.clone())?;
    let (observation, _) = env.reset(seed);
    let state = state_from_observation(observation.view())?;

    let mut planner = build_planner(&config, env.action_space())?;
    let plotter = match visualize {
        Some(dir) => {
            let plotter = Arc::new(TrajectoryPlotter::new(&dir, env.goal())?);
            planner = planner.with_observer(plotter.clone());
            Some(plotter)
        }
        None => None,
    };

    tracing::info!(
        horizon = config.planner.horizon,
        amount = config.planner.amount,
        top_k = config.planner.top_k,
        iterations = config.planner.iterations,
        "Starting planning"
    );

    let mut rng = seeded_rng(seed);
    let start = Instant::now();
    let plan = planner.get_plan(&state, None, &mut rng)?;
    let elapsed = start.elapsed().as_secs_f64();

    if let Some(plotter) = &plotter {
        plotter.flush().context("writing plots")?;
        tracing::info!(dir = %plotter.dir().display(), "Plots written");
    }

    let goal = env.goal();
    println!("goal: ({:.3}, {:.3})", goal[0], goal[1]);
    println!("planned in {}", format_duration(elapsed));
    println!("plan ({} steps):", plan.horizon());
    for (t, (mean, std_dev)) in plan
        .mean
        .outer_iter()
        .zip(plan.std_dev.outer_iter())
        .enumerate()
    {
        println!(
            "  t={:<3} mean={} std={}",
            t,
            format_row(mean),
            format_row(std_dev)
        );
    }
    let action = plan.first_action().context("plan has no steps")?;
    println!("first action: {}", format_row(action.view()));

    Ok(())
}

struct EvalOptions {
    episodes: usize,
    agent: AgentKind,
    seed: Option<u64>,
    warm_start: bool,
    parallel: bool,
    csv: Option<PathBuf>,
    quiet: bool,
}

/// One evaluation episode with its own environment, agent and RNG.
fn run_one(config: &RunConfig, agent: AgentKind, seed: u64, warm_start: bool) -> Result<Episode> {
    let env = PointNav::new(config.env.clone())?;
    let action_space = env.action_space();
    let mut env = EpisodeStats::new(RewardWrapper::new(env, config.reward.clone()));
    let mut rng = seeded_rng(Some(seed));

    let episode = match agent {
        AgentKind::Random => {
            let mut agent = RandomAgent::new(action_space);
            run_episode(&mut env, &mut agent, Some(seed), &mut rng)?
        }
        AgentKind::Mpc => {
            let planner = build_planner(config, action_space)?;
            let mut agent = MpcAgent::new(planner, ObservationEmbedder).with_warm_start(warm_start);
            run_episode(&mut env, &mut agent, Some(seed), &mut rng)?
        }
    };
    Ok(episode)
}

fn eval(options: &EvalOptions, config: Option<&Path>) -> Result<()> {
    let config = RunConfig::load(config)?;
    let base_seed = options.seed.or(config.seed).unwrap_or(0);
    let warm_start = options.warm_start || config.warm_start;

    tracing::info!(
        episodes = options.episodes,
        agent = ?options.agent,
        parallel = options.parallel,
        warm_start,
        "Starting evaluation"
    );

    let progress = if options.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(options.episodes as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")?
                .progress_chars("#>-"),
        );
        pb
    };

    let start = Instant::now();
    let run = |index: usize| -> Result<Episode> {
        let seed = derive_seed(base_seed, index as u64);
        let episode = run_one(&config, options.agent, seed, warm_start)
            .with_context(|| format!("episode {}", index))?;
        progress.inc(1);
        Ok(episode)
    };
    let episodes: Vec<Episode> = if options.parallel {
        (0..options.episodes)
            .into_par_iter()
            .map(run)
            .collect::<Result<_>>()?
    } else {
        (0..options.episodes).map(run).collect::<Result<_>>()?
    };
    progress.finish_with_message("done");

    let logger: Box<dyn MetricLogger> = if options.quiet {
        Box::new(NoOpLogger)
    } else {
        Box::new(ConsoleLogger::with_prefix(
            format!("{:?}", options.agent).to_lowercase(),
        ))
    };
    let keys: Vec<String> = Episode::default().metrics().into_keys().collect();
    let mut statistics = Statistics::new(keys);
    if let Some(path) = &options.csv {
        statistics = statistics
            .with_csv(path)
            .with_context(|| format!("creating {}", path.display()))?;
    }

    for (index, episode) in episodes.iter().enumerate() {
        let metrics = episode.metrics();
        logger.log_metrics(&metrics, index as u64);
        statistics.update(&metrics)?;
    }
    logger.close();

    tracing::info!(
        episodes = episodes.len(),
        elapsed = %format_duration(start.elapsed().as_secs_f64()),
        "Evaluation complete"
    );
    println!("{}", statistics.render());

    Ok(())
}

fn collect(outdir: &Path, episodes: usize, seed: Option<u64>, config: Option<&Path>) -> Result<()> {
    let config = RunConfig::load(config)?;
    let base_seed = seed.or(config.seed).unwrap_or(0);
    std::fs::create_dir_all(outdir)
        .with_context(|| format!("creating {}", outdir.display()))?;

    tracing::info!(episodes, outdir = %outdir.display(), "Starting collection");

    for index in 0..episodes {
        let episode = run_one(
            &config,
            AgentKind::Random,
            derive_seed(base_seed, index as u64),
            false,
        )?;
        let path = outdir.join(format!("episode_{:03}.json", index));
        let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &episode)?;
        tracing::debug!(path = %path.display(), steps = episode.len(), "episode saved");
    }

    tracing::info!(episodes, "Collection complete");
    Ok(())
}
