//! The kinematic model, environment and planner working together.

use ndarray::{s, Array3};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use worldplan::prelude::*;
use worldplan::rewards::{CollisionPenalty, DenseReward};
use worldplan_envs::{
    state_from_observation, GoalDistanceDecoder, KinematicModel, ObservationEmbedder, PointNav,
    PointNavConfig,
};

fn planner(horizon: usize) -> CrossEntropyMethod<KinematicModel, GoalDistanceDecoder> {
    let config = CemConfig::default()
        .with_horizon(horizon)
        .with_amount(200)
        .with_top_k(20)
        .with_iterations(5);
    CrossEntropyMethod::new(
        KinematicModel::default(),
        GoalDistanceDecoder,
        BoxSpace::symmetric(1),
        config,
    )
    .unwrap()
}

#[test]
fn kinematic_model_matches_plan_simulation() {
    let model = KinematicModel::default();
    let actions = Array3::from_shape_fn((4, 6, 1), |(b, t, _)| ((b + t) as f32 * 0.37).sin());

    let positions = simulate_plan(actions.view()).unwrap();
    let states = simulate(actions.view(), &model, &model.initial_state(1)).unwrap();

    let from_model = states.features.slice(s![.., .., 0..2]);
    let from_plan = positions.slice(s![.., 1.., ..]);
    for (a, b) in from_model.iter().zip(from_plan.iter()) {
        assert!((a - b).abs() < 1e-5, "{} vs {}", a, b);
    }
}

#[test]
fn environment_follows_model_prediction() {
    let config = PointNavConfig::default().with_fixed_goal([2.0, 1.0]);
    let mut env = PointNav::new(config).unwrap();
    let (obs, _) = env.reset(Some(0));
    let model = KinematicModel::default();
    let state = state_from_observation(obs.view()).unwrap();

    let steering = [0.5f32, -0.25, 1.0, 0.0];
    let actions = Array3::from_shape_fn((1, 4, 1), |(_, t, _)| steering[t]);
    let imagined = model.open_loop(actions.view(), &state).unwrap();

    for (t, &steer) in steering.iter().enumerate() {
        env.step(&ndarray::array![steer]);
        let [x, y] = env.position();
        assert!((imagined.features[[0, t, 0]] - x).abs() < 1e-5);
        assert!((imagined.features[[0, t, 1]] - y).abs() < 1e-5);
    }
}

#[test]
fn mpc_agent_reaches_goal() {
    let config = PointNavConfig::default()
        .with_fixed_goal([0.5, 1.4])
        .with_max_steps(40);
    let env = PointNav::new(config).unwrap();
    let mut env = EpisodeStats::new(RewardWrapper::new(
        env,
        Reward::combine(vec![
            DenseReward::default().into(),
            CollisionPenalty::default().into(),
        ]),
    ));
    let mut agent = MpcAgent::new(planner(8), ObservationEmbedder).with_warm_start(true);
    let mut rng = ChaCha8Rng::seed_from_u64(3);

    let episode = run_episode(&mut env, &mut agent, Some(3), &mut rng).unwrap();
    assert!(episode.success, "final distance {}", episode.final_distance);
    assert!(episode.len() < 40);
    assert!(episode.total_reward() > 0.0);
}

#[test]
fn random_agent_rarely_succeeds_but_terminates() {
    let config = PointNavConfig::default().with_max_steps(20);
    let mut env = PointNav::new(config).unwrap();
    let mut agent = RandomAgent::new(env.action_space());
    let mut rng = ChaCha8Rng::seed_from_u64(0);

    let episode = run_episode(&mut env, &mut agent, Some(0), &mut rng).unwrap();
    assert!(episode.len() <= 20);
    assert_eq!(episode.observations.len(), episode.len() + 1);
}
