use std::{fmt::Debug, path::PathBuf};

use burn::{
    module::AutodiffModule,
    optim::{AdamWConfig, GradientsParams, Optimizer},
    prelude::*,
    record::{BinFileRecorder, FullPrecisionSettings},
    tensor::backend::AutodiffBackend,
};
use nn::loss::{MseLoss, Reduction};
use rand::{rngs::StdRng, SeedableRng};

use crate::{
    decay,
    env::{DiscreteActionSpace, Environment, ToTensor},
    exploration::{Choice, EpsilonGreedy},
    memory::{Exp, ReplayMemory},
    snapshot::SnapshotError,
};

mod model;

pub use model::{BlobNet, BlobNetConfig};

/// A burn module used with a Deep Q network agent
///
/// ### Generics
/// - `B`: A burn backend
/// - `D`: The dimension of the input tensor
pub trait DQNModel<B: AutodiffBackend, const D: usize>: AutodiffModule<B> {
    /// Forward pass through the model
    fn forward(&self, input: Tensor<B, D>) -> Tensor<B, 2>;
}

/// Configuration for the [`DQNAgent`] (see for information on generic types)
pub struct DQNAgentConfig<E, O>
where
    E: Environment,
{
    /// A [`ReplayMemory`] to store and sample the agent's past experiences
    pub memory: ReplayMemory<E>,
    /// The [`Optimizer`] to train the online network with
    pub optimizer: O,
    /// The exploration policy, currently limited to epsilon greedy
    pub exploration: EpsilonGreedy<decay::Geometric>,
    /// The discount factor
    pub gamma: f32,
    /// The learning rate for the optimizer
    pub lr: f32,
    /// Training is skipped until the replay memory holds this many experiences
    pub min_replay_size: usize,
    /// Number of trained episodes between target network synchronizations
    pub target_update_every: u32,
    /// Seed for action sampling and replay sampling
    pub seed: u64,
}

/// A [`DQNAgentConfig`] with an AdamW optimizer and standard hyperparameters
///
/// Individual fields can be overridden with struct update syntax. The
/// optimizer type stays opaque because burn's optimizer configs return
/// `impl Optimizer`.
pub fn default_agent_config<B, M, E>() -> DQNAgentConfig<E, impl Optimizer<M, B>>
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
    E: Environment,
{
    DQNAgentConfig {
        memory: ReplayMemory::new(50_000, 64),
        optimizer: AdamWConfig::new().init(),
        exploration: EpsilonGreedy::new(decay::Geometric::new(0.99975, 1.0, 0.001).unwrap()),
        gamma: 0.99,
        lr: 1e-3,
        min_replay_size: 1_000,
        target_update_every: 5,
        seed: 1,
    }
}

/// A Deep Q Network agent with a periodically synchronized target network
///
/// ### Generics
/// - `B`: A burn backend
/// - `M`: The [`DQNModel`] used for the online and target networks
/// - `E`: The [`Environment`] in which the agent will learn
///     - The environment's action space must be discrete, since the online network
///       produces a Q value for each action.
///     - The state and action types' implementations of [`Clone`] should be very
///       lightweight, as they are cloned often. Ideally, both types are [`Copy`].
/// - `O`: An [`Optimizer`]
/// - `D`: The dimension of the input
pub struct DQNAgent<B, M, E, const D: usize, O>
where
    B: AutodiffBackend,
    E: Environment,
{
    online_net: Option<M>,
    target_net: Option<M>,
    device: &'static B::Device,
    memory: ReplayMemory<E>,
    optimizer: O,
    loss: MseLoss<B>,
    exploration: EpsilonGreedy<decay::Geometric>,
    gamma: f32,
    lr: f32,
    min_replay_size: usize,
    target_update_every: u32,
    target_update_counter: u32,
    rng: StdRng,
    episode: u32,
}

impl<B, M, E, const D: usize, O> DQNAgent<B, M, E, D, O>
where
    B: AutodiffBackend,
    M: DQNModel<B, D>,
    E: Environment + DiscreteActionSpace,
    O: Optimizer<M, B>,
    Vec<E::State>: ToTensor<B, D, Float>,
    Vec<E::Action>: ToTensor<B, 2, Int>,
    E::Action: Copy + From<usize>,
    B::IntElem: TryInto<usize, Error: Debug>,
{
    /// Initialize a new `DQNAgent`
    ///
    /// The target network starts as an exact copy of `model`.
    ///
    /// ### Arguments
    /// - `model` A [`DQNModel`] to be used as the online and target networks
    /// - `config` A [`DQNAgentConfig`] containing components and hyperparameters for the agent
    /// - `device` A static reference to the device used for the `model`
    pub fn new(model: M, config: DQNAgentConfig<E, O>, device: &'static B::Device) -> Self {
        let model_clone = model.clone();
        Self {
            online_net: Some(model),
            target_net: Some(model_clone),
            device,
            memory: config.memory,
            optimizer: config.optimizer,
            loss: MseLoss::new(),
            exploration: config.exploration,
            gamma: config.gamma,
            lr: config.lr,
            min_replay_size: config.min_replay_size,
            target_update_every: config.target_update_every,
            target_update_counter: 0,
            rng: StdRng::seed_from_u64(config.seed),
            episode: 0,
        }
    }

    /// Current exploration threshold
    pub fn epsilon(&self) -> f32 {
        self.exploration.threshold(self.episode)
    }

    /// Invoke the agent's policy along with the exploration strategy to choose an action from the given state
    fn act(&mut self, env: &E, state: E::State) -> E::Action {
        match self.exploration.choose(self.episode, &mut self.rng) {
            Choice::Explore => env.random_action(&mut self.rng),
            Choice::Exploit => {
                let input = vec![state].to_tensor(self.device);
                let output = self
                    .online_net
                    .as_ref()
                    .unwrap()
                    .forward(input)
                    .argmax(1)
                    .into_scalar();
                E::Action::from(output.try_into().unwrap())
            }
        }
    }

    /// Perform one DQN learning step, fitting the online network toward the
    /// Bellman targets computed from the target network
    ///
    /// Skipped entirely until the replay memory holds `min_replay_size`
    /// experiences.
    ///
    /// **Returns** whether a gradient step was taken
    fn learn(&mut self) -> bool {
        if self.memory.len() < self.min_replay_size {
            return false;
        }

        // Sample a batch of memories to train on
        let Some(batch) = self.memory.sample_zipped(&mut self.rng) else {
            return false;
        };
        let batch_size = self.memory.batch_size;

        // Create a boolean mask for non-terminal next states so tensor shapes can match in the Bellman Equation
        let non_terminal_mask = Tensor::<B, 1, Bool>::from_bool(
            batch
                .next_states
                .iter()
                .map(Option::is_some)
                .collect::<Vec<_>>()
                .as_slice()
                .into(),
            self.device,
        )
        .unsqueeze_dim(1);

        // Terminal rows get their current state as a stand-in so every batch row
        // has a next state to forward; the mask zeroes their future value below
        let next_states = batch
            .next_states
            .iter()
            .zip(&batch.states)
            .map(|(next, current)| next.clone().unwrap_or_else(|| current.clone()))
            .collect::<Vec<_>>()
            .to_tensor(self.device);

        // Tensor conversions
        let states = batch.states.to_tensor(self.device);
        let actions = batch.actions.to_tensor(self.device);
        let rewards =
            Tensor::<B, 1>::from_floats(batch.rewards.as_slice(), self.device).unsqueeze_dim(1);

        let online_net = self.online_net.take().unwrap();
        let target_net = self.target_net.take().unwrap();

        // Calculate the Q values of the chosen actions in each state
        let q_values = online_net.forward(states).gather(1, actions);

        // Calculate the maximum Q values obtainable from each next state; terminal
        // transitions keep a zero future value so their target is the raw reward
        let expected_q_values = Tensor::<B, 2>::zeros([batch_size, 1], self.device).mask_where(
            non_terminal_mask,
            target_net.forward(next_states).max_dim(1).detach(),
        );

        let discounted_expected_return = rewards + (expected_q_values * self.gamma);

        // Calculate loss between actual Q values and expected return
        let loss = self
            .loss
            .forward(q_values, discounted_expected_return, Reduction::Mean);

        // Perform backpropagation on the online net only; the target net is
        // never trained directly
        let grads = GradientsParams::from_grads(loss.backward(), &online_net);
        self.online_net = Some(self.optimizer.step(self.lr.into(), online_net, grads));
        self.target_net = Some(target_net);

        true
    }

    /// Copy the online network's parameters into the target network
    fn sync_target(&mut self) {
        self.target_net = self.online_net.clone();
    }

    /// Advance the target synchronization schedule at an episode boundary
    ///
    /// The counter only moves for episodes in which at least one fit occurred.
    fn end_episode(&mut self, trained: bool) {
        if trained {
            self.target_update_counter += 1;
        }
        if self.target_update_counter > self.target_update_every {
            self.sync_target();
            self.target_update_counter = 0;
        }
        self.episode += 1;
    }

    /// Deploy the `DQNAgent` into the environment for one episode
    ///
    /// **Returns** the cumulative episode reward
    pub fn go(&mut self, env: &mut E, render: bool) -> f64 {
        let mut next_state = Some(env.reset());
        let mut episode_reward = 0.0;
        let mut trained = false;

        while let Some(state) = next_state {
            let action = self.act(env, state.clone());
            let (next, reward) = env.step(action);
            next_state = next;
            episode_reward += reward as f64;

            if render {
                env.render();
            }

            self.memory.push(Exp {
                state,
                action,
                next_state: next_state.clone(),
                reward,
            });

            trained |= self.learn();
        }

        self.end_episode(trained);
        episode_reward
    }

    /// Persist the online network's parameters and architecture to disk
    pub fn save(&self, path: PathBuf) -> Result<(), SnapshotError> {
        let recorder = BinFileRecorder::<FullPrecisionSettings>::new();
        self.online_net
            .as_ref()
            .unwrap()
            .clone()
            .save_file(path, &recorder)?;
        Ok(())
    }
}
