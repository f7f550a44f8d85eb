use std::marker::PhantomData;

use log::info;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::{
    assert_interval, decay,
    env::{BoundedStateSpace, DiscreteActionSpace, Environment, GoalAware},
    exploration::{Choice, EpsilonGreedy},
    util::argmax,
};

use super::StateDiscretizer;

/// A dense action-value table over a discretized state grid
///
/// Values are stored row-major over the grid dimensions with the action index
/// as the innermost axis, and initialized to small random negative values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QTable {
    dims: Vec<usize>,
    n_actions: usize,
    values: Vec<f32>,
}

impl QTable {
    pub fn new(dims: Vec<usize>, n_actions: usize, rng: &mut impl Rng) -> Self {
        let len = dims.iter().product::<usize>() * n_actions;
        let values = (0..len).map(|_| rng.gen_range(-2.0..0.0)).collect();
        Self {
            dims,
            n_actions,
            values,
        }
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn n_actions(&self) -> usize {
        self.n_actions
    }

    /// Flat offset of the action-value row for a discretized state
    ///
    /// **Panics** if `state` does not match the grid dimensions
    fn offset(&self, state: &[usize]) -> usize {
        assert_eq!(state.len(), self.dims.len(), "state has wrong dimension");
        let cell = state.iter().zip(&self.dims).fold(0, |acc, (&ix, &dim)| {
            assert!(ix < dim, "state index {ix} out of range for dimension {dim}");
            acc * dim + ix
        });
        cell * self.n_actions
    }

    /// The action-value row for a discretized state
    pub fn lookup(&self, state: &[usize]) -> &[f32] {
        let offset = self.offset(state);
        &self.values[offset..offset + self.n_actions]
    }

    /// Overwrite a single entry
    pub fn set(&mut self, state: &[usize], action: usize, value: f32) {
        let offset = self.offset(state);
        self.values[offset + action] = value;
    }

    /// Apply the Q-learning update rule to a single entry
    ///
    /// The target is `reward` when the transition was terminal (`next_state` is
    /// `None`), else `reward + gamma * max(lookup(next_state))`, and the entry
    /// moves toward it by the convex blend `(1 - alpha) * old + alpha * target`.
    pub fn update(
        &mut self,
        state: &[usize],
        action: usize,
        reward: f32,
        next_state: Option<&[usize]>,
        alpha: f32,
        gamma: f32,
    ) {
        let max_next = next_state.map_or(0.0, |ns| {
            self.lookup(ns)
                .iter()
                .fold(f32::NEG_INFINITY, |a, &b| a.max(b))
        });
        let target = reward + gamma * max_next;

        let offset = self.offset(state) + action;
        let old = self.values[offset];
        self.values[offset] = (1.0 - alpha) * old + alpha * target;
    }
}

/// Configuration for the [`QTableAgent`]
pub struct QTableAgentConfig {
    pub exploration: EpsilonGreedy<decay::Linear>,
    pub alpha: f32,
    pub gamma: f32,
    pub buckets: usize,
    pub seed: u64,
}

impl Default for QTableAgentConfig {
    fn default() -> Self {
        Self {
            exploration: EpsilonGreedy::new(decay::Linear::new(4e-4, 0.5, 0.0).unwrap()),
            alpha: 0.1,
            gamma: 0.95,
            buckets: 20,
            seed: 0,
        }
    }
}

/// A Q-learning agent over a discretized state grid
///
/// ### Generics
/// - `E` - The [`Environment`] in which the agent will learn
///     - The state must expose a continuous bounded vector for the discretizer,
///       and actions must map to and from their index in the action set
pub struct QTableAgent<E>
where
    E: Environment + DiscreteActionSpace + BoundedStateSpace + GoalAware,
    E::State: AsRef<[f32]>,
    E::Action: Copy + Into<usize> + From<usize>,
{
    table: QTable,
    discretizer: StateDiscretizer,
    exploration: EpsilonGreedy<decay::Linear>,
    alpha: f32, // learning rate
    gamma: f32, // discount factor
    rng: StdRng,
    episode: u32, // current episode
    marker: PhantomData<E>,
}

impl<E> QTableAgent<E>
where
    E: Environment + DiscreteActionSpace + BoundedStateSpace + GoalAware,
    E::State: AsRef<[f32]>,
    E::Action: Copy + Into<usize> + From<usize>,
{
    /// Initialize a new `QTableAgent`, sizing the table from the environment's
    /// observation bounds and action set
    ///
    /// **Panics** if `alpha` or `gamma` is not in the interval `[0,1]`
    pub fn new(env: &E, config: QTableAgentConfig) -> Self {
        assert_interval!(config.alpha, 0.0, 1.0);
        assert_interval!(config.gamma, 0.0, 1.0);

        let discretizer = StateDiscretizer::new(
            &env.observation_low(),
            &env.observation_high(),
            config.buckets,
        );
        let mut rng = StdRng::seed_from_u64(config.seed);
        let table = QTable::new(discretizer.dims(), env.actions().len(), &mut rng);

        Self {
            table,
            discretizer,
            exploration: config.exploration,
            alpha: config.alpha,
            gamma: config.gamma,
            rng,
            episode: 0,
            marker: PhantomData,
        }
    }

    pub fn table(&self) -> &QTable {
        &self.table
    }

    /// Current exploration threshold
    pub fn epsilon(&self) -> f32 {
        self.exploration.threshold(self.episode)
    }

    fn act(&mut self, env: &E, state: &[usize]) -> E::Action {
        match self.exploration.choose(self.episode, &mut self.rng) {
            Choice::Explore => env.random_action(&mut self.rng),
            Choice::Exploit => E::Action::from(argmax(self.table.lookup(state))),
        }
    }

    /// Deploy the agent into the environment for one episode
    ///
    /// **Returns** the cumulative episode reward
    pub fn go(&mut self, env: &mut E, render: bool) -> f64 {
        let mut episode_reward = 0.0;
        let state = env.reset();
        let mut state_ix = self.discretizer.discretize(state.as_ref());

        loop {
            let action = self.act(env, &state_ix);
            let (next, reward) = env.step(action);
            episode_reward += reward as f64;

            if render {
                env.render();
            }

            match next {
                Some(next_state) => {
                    let next_ix = self.discretizer.discretize(next_state.as_ref());
                    self.table.update(
                        &state_ix,
                        action.into(),
                        reward,
                        Some(&next_ix),
                        self.alpha,
                        self.gamma,
                    );
                    state_ix = next_ix;
                }
                None => {
                    if env.reached_goal() {
                        // The step just before the goal is maximally good
                        self.table.set(&state_ix, action.into(), 0.0);
                        info!("goal reached on episode {}", self.episode);
                    } else {
                        self.table.update(
                            &state_ix,
                            action.into(),
                            reward,
                            None,
                            self.alpha,
                            self.gamma,
                        );
                    }
                    break;
                }
            }
        }

        self.episode += 1;
        episode_reward
    }
}

#[cfg(test)]
mod tests {
    use crate::gym::MountainCar;

    use super::*;

    fn zeroed_table() -> QTable {
        let mut rng = StdRng::seed_from_u64(0);
        let mut table = QTable::new(vec![20, 20], 3, &mut rng);
        for a in 0..3 {
            table.set(&[4, 7], a, 0.0);
        }
        table
    }

    #[test]
    fn table_initialized_with_small_negative_values() {
        let mut rng = StdRng::seed_from_u64(3);
        let table = QTable::new(vec![4, 4], 2, &mut rng);
        for i in 0..4 {
            for j in 0..4 {
                for &v in table.lookup(&[i, j]) {
                    assert!((-2.0..0.0).contains(&v));
                }
            }
        }
    }

    #[test]
    fn update_is_convex_combination() {
        let mut table = zeroed_table();
        table.set(&[4, 7], 1, -1.5);

        // alpha = 0 leaves the entry unchanged
        table.update(&[4, 7], 1, 10.0, None, 0.0, 0.95);
        assert_eq!(table.lookup(&[4, 7])[1], -1.5);

        // alpha = 1 overwrites with the exact target
        table.update(&[4, 7], 1, 10.0, None, 1.0, 0.95);
        assert_eq!(table.lookup(&[4, 7])[1], 10.0);
    }

    #[test]
    fn terminal_update_targets_raw_reward() {
        let mut table = zeroed_table();
        table.update(&[4, 7], 0, -7.0, None, 1.0, 0.95);
        assert_eq!(table.lookup(&[4, 7])[0], -7.0);
    }

    #[test]
    fn repeated_updates_converge_to_fixed_point() {
        // Self-loop transition with all next-state values starting at zero:
        // the entry climbs monotonically toward reward / (1 - gamma).
        let mut table = zeroed_table();
        let fixed_point = 1.0 / (1.0 - 0.95);

        let mut prev = 0.0;
        for _ in 0..5 {
            table.update(&[4, 7], 2, 1.0, Some(&[4, 7]), 0.1, 0.95);
            let v = table.lookup(&[4, 7])[2];
            assert!(v > prev, "entry increases monotonically");
            assert!(v < fixed_point, "entry never overshoots the fixed point");
            prev = v;
        }
    }

    #[test]
    #[should_panic]
    fn lookup_rejects_out_of_range_index() {
        let table = zeroed_table();
        table.lookup(&[20, 0]);
    }

    #[test]
    fn agent_runs_episodes_and_decays_epsilon() {
        let mut env = MountainCar::new(5);
        let mut agent = QTableAgent::new(&env, QTableAgentConfig::default());

        let mut prev_epsilon = f32::INFINITY;
        for _ in 0..5 {
            let reward = agent.go(&mut env, false);
            assert!(reward < 0.0, "every step is penalized");
            let epsilon = agent.epsilon();
            assert!(epsilon <= prev_epsilon, "epsilon never increases");
            prev_epsilon = epsilon;
        }
    }
}
