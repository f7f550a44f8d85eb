//! Deep Q-network training on the Blob grid world.
//!
//! All configuration lives in the constants below; run with
//! `RUST_LOG=info cargo run --release --bin blob_dqn`.

use std::{fs, path::Path};

use anyhow::Result;
use burn::{
    backend::{ndarray::NdArrayDevice, Autodiff, NdArray},
    tensor::backend::Backend,
};
use log::info;
use once_cell::sync::Lazy;
use qtrain::{
    algo::dqn::{default_agent_config, BlobNet, BlobNetConfig, DQNAgent, DQNAgentConfig},
    decay,
    env::Report,
    exploration::EpsilonGreedy,
    gym::{blob::BlobAction, BlobWorld},
    memory::ReplayMemory,
    snapshot,
    stats::{CsvRecorder, Recorder, RewardHistory},
};
use strum::VariantArray;

type DQNBackend = Autodiff<NdArray>;

static DEVICE: Lazy<NdArrayDevice> = Lazy::new(NdArrayDevice::default);

const EPISODES: u32 = 20_000;
const FIELD_SIZE: usize = 10;
const REPLAY_CAPACITY: usize = 50_000;
const MIN_REPLAY_SIZE: usize = 1_000;
const MINIBATCH_SIZE: usize = 64;
const DISCOUNT: f32 = 0.99;
const LEARNING_RATE: f32 = 1e-3;
const TARGET_UPDATE_EVERY: u32 = 5;
const EPSILON_DECAY: f32 = 0.99975;
const MIN_EPSILON: f32 = 0.001;
const AGGREGATE_EVERY: u32 = 50;
// A model snapshot is only worth keeping once the trailing average clears this
const MIN_AVG_REWARD: f64 = -200.0;
const SHOW_PREVIEW: bool = false;
const SEED: u64 = 1;
const MODEL_NAME: &str = "256x2";
const MODEL_DIR: &str = "models";
const METRICS_FILE: &str = "blob_dqn_metrics.csv";

fn main() -> Result<()> {
    env_logger::init();
    DQNBackend::seed(SEED);
    fs::create_dir_all(MODEL_DIR)?;

    let mut env = BlobWorld::<FIELD_SIZE>::new(SEED);
    let model = BlobNetConfig::new(BlobAction::VARIANTS.len()).init::<DQNBackend>(&*DEVICE);
    let config = DQNAgentConfig {
        memory: ReplayMemory::new(REPLAY_CAPACITY, MINIBATCH_SIZE),
        exploration: EpsilonGreedy::new(
            decay::Geometric::new(EPSILON_DECAY, 1.0, MIN_EPSILON).map_err(anyhow::Error::msg)?,
        ),
        gamma: DISCOUNT,
        lr: LEARNING_RATE,
        min_replay_size: MIN_REPLAY_SIZE,
        target_update_every: TARGET_UPDATE_EVERY,
        seed: SEED,
        ..default_agent_config()
    };
    let mut agent: DQNAgent<DQNBackend, BlobNet<DQNBackend>, BlobWorld<FIELD_SIZE>, 4, _> =
        DQNAgent::new(model, config, &*DEVICE);

    let mut history = RewardHistory::new();
    let mut recorder = CsvRecorder::create(METRICS_FILE)?;
    let mut totals = Report::new(env.report.keys());
    let mut interval_episodes = 0u32;

    for episode in 1..=EPISODES {
        let render = SHOW_PREVIEW && episode % AGGREGATE_EVERY == 0;
        let reward = agent.go(&mut env, render);
        history.push(reward);
        for (key, value) in env.report.take() {
            *totals.entry(key) += value;
        }
        interval_episodes += 1;

        if episode == 1 || episode % AGGREGATE_EVERY == 0 {
            if let Some(agg) = history.aggregate(AGGREGATE_EVERY as usize) {
                let epsilon = agent.epsilon() as f64;
                let mut metrics = vec![
                    ("reward_avg", agg.avg),
                    ("reward_min", agg.min),
                    ("reward_max", agg.max),
                    ("epsilon", epsilon),
                ];
                // Per-episode means of the env's report scalars over the interval
                for (key, total) in totals.take() {
                    metrics.push((key, total / interval_episodes as f64));
                }
                interval_episodes = 0;
                recorder.record(episode, &metrics)?;
                info!(
                    "episode {episode} avg {:.2} min {:.2} max {:.2} epsilon {epsilon:.3}",
                    agg.avg, agg.min, agg.max
                );

                if agg.avg >= MIN_AVG_REWARD {
                    let path =
                        Path::new(MODEL_DIR).join(snapshot::model_file_stem(MODEL_NAME, &agg));
                    agent.save(path)?;
                }
            }
        }
    }

    Ok(())
}
