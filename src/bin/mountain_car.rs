//! Tabular Q-learning on the MountainCar classic control task.
//!
//! All configuration lives in the constants below; run with
//! `RUST_LOG=info cargo run --release --bin mountain_car`.

use anyhow::Result;
use log::info;
use qtrain::{
    algo::tabular::{QTableAgent, QTableAgentConfig},
    decay,
    env::Report,
    exploration::EpsilonGreedy,
    gym::MountainCar,
    snapshot,
    stats::{CsvRecorder, Recorder, RewardHistory},
};

const EPISODES: u32 = 2_500;
const LEARNING_RATE: f32 = 0.1;
const DISCOUNT: f32 = 0.95;
const BUCKETS: usize = 20;
const INITIAL_EPSILON: f32 = 0.5;
const SHOW_EVERY: u32 = 100;
const SAVE_EVERY: u32 = 10;
const SEED: u64 = 1;
const TABLE_DIR: &str = "qtables";
const METRICS_FILE: &str = "mountain_car_metrics.csv";

fn main() -> Result<()> {
    env_logger::init();

    let mut env = MountainCar::new(SEED);

    // Epsilon reaches zero halfway through training
    let decay_rate = INITIAL_EPSILON / (EPISODES / 2) as f32;
    let config = QTableAgentConfig {
        exploration: EpsilonGreedy::new(
            decay::Linear::new(decay_rate, INITIAL_EPSILON, 0.0).map_err(anyhow::Error::msg)?,
        ),
        alpha: LEARNING_RATE,
        gamma: DISCOUNT,
        buckets: BUCKETS,
        seed: SEED,
    };
    let mut agent = QTableAgent::new(&env, config);

    let mut history = RewardHistory::new();
    let mut recorder = CsvRecorder::create(METRICS_FILE)?;
    let mut totals = Report::new(env.report.keys());
    let mut interval_episodes = 0u32;

    for episode in 0..EPISODES {
        let render = episode % SHOW_EVERY == 0;
        let reward = agent.go(&mut env, render);
        history.push(reward);
        for (key, value) in env.report.take() {
            *totals.entry(key) += value;
        }
        interval_episodes += 1;

        if episode % SAVE_EVERY == 0 {
            snapshot::save_q_table(TABLE_DIR, episode, agent.table())?;
        }

        if episode % SHOW_EVERY == 0 {
            if let Some(agg) = history.aggregate(SHOW_EVERY as usize) {
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
            }
        }
    }

    Ok(())
}
