use std::mem;

use burn::{
    prelude::*,
    tensor::{BasicOps, Element},
};
use rand::{seq::SliceRandom, Rng};

/// Represents a Markov decision process, defining the dynamics of an environment
/// in which an agent can operate.
///
/// This base trait represents the common case of a discrete-time MDP with one agent
/// and a finite state space and action space.
pub trait Environment {
    /// A representation of the state of the environment to be passed to an agent
    type State: Clone;

    /// A representation of an action that an agent can take to affect the environment
    type Action: Clone;

    /// Update the environment in response to an action taken by an agent
    ///
    /// **Returns** `(next_state, reward)`, where `next_state` is `None` if the episode ended
    fn step(&mut self, action: Self::Action) -> (Option<Self::State>, f32);

    /// Reset the environment to an initial state
    ///
    /// **Returns** the state
    fn reset(&mut self) -> Self::State;

    /// Display the current state of the environment, however the environment sees fit
    fn render(&self) {}
}

/// An [`Environment`] with a finite action set
pub trait DiscreteActionSpace: Environment {
    /// Get the available actions for the current state
    ///
    /// The returned vec should never be empty, instead specify an action that represents
    /// doing nothing if necessary.
    fn actions(&self) -> Vec<Self::Action>;

    /// Draw a uniformly random action
    fn random_action(&self, rng: &mut impl Rng) -> Self::Action {
        self.actions()
            .choose(rng)
            .expect("there is always at least one action available")
            .clone()
    }
}

/// An [`Environment`] with a continuous state vector bounded per dimension
pub trait BoundedStateSpace: Environment {
    /// Lower observation bound per dimension
    fn observation_low(&self) -> Vec<f32>;

    /// Upper observation bound per dimension
    fn observation_high(&self) -> Vec<f32>;
}

/// An [`Environment`] whose episodes can terminate by reaching a goal rather than
/// by running out of steps
pub trait GoalAware: Environment {
    /// Whether the most recent terminal step ended with the goal condition met
    fn reached_goal(&self) -> bool;
}

/// A set of named per-episode scalars accumulated by an environment and drained
/// by the training loop after each episode
#[derive(Debug, Clone, Default)]
pub struct Report {
    entries: Vec<(&'static str, f64)>,
}

impl Report {
    pub fn new(keys: Vec<&'static str>) -> Self {
        Self {
            entries: keys.into_iter().map(|k| (k, 0.0)).collect(),
        }
    }

    pub fn keys(&self) -> Vec<&'static str> {
        self.entries.iter().map(|(k, _)| *k).collect()
    }

    /// Mutable access to the scalar registered under `key`
    ///
    /// **Panics** if `key` was not registered at construction
    pub fn entry(&mut self, key: &'static str) -> &mut f64 {
        self.entries
            .iter_mut()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
            .unwrap_or_else(|| panic!("unknown report key `{key}`"))
    }

    /// Drain the accumulated values, resetting all entries to zero
    pub fn take(&mut self) -> Vec<(&'static str, f64)> {
        let keys = self.keys();
        mem::replace(&mut self.entries, keys.into_iter().map(|k| (k, 0.0)).collect())
    }
}

/// A trait for converting items to tensors
///
/// Commonly implemented for `Vec<T>` to convert batches of `T` to a tensor of dimension `D`
pub trait ToTensor<B: Backend, const D: usize, K: BasicOps<B>> {
    fn to_tensor(self, device: &B::Device) -> Tensor<B, D, K>;
}

impl<B, E, K> ToTensor<B, 1, K> for Vec<E>
where
    B: Backend,
    E: Element,
    K: BasicOps<B, Elem = E>,
{
    fn to_tensor(self, device: &B::Device) -> Tensor<B, 1, K> {
        let len = self.len();
        Tensor::from_data(Data::new(self, [len].into()), device)
    }
}

impl<B, E, K, const A: usize> ToTensor<B, 2, K> for Vec<[E; A]>
where
    B: Backend,
    E: Element,
    K: BasicOps<B, Elem = E>,
{
    fn to_tensor(self, device: &B::Device) -> Tensor<B, 2, K> {
        let len = self.len();
        let data = Data::new(
            self.into_iter().flatten().collect::<Vec<_>>(),
            [len * A].into(),
        );
        Tensor::from_data(data, device).reshape([-1, A as i32])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_accumulates_and_drains() {
        let mut report = Report::new(vec!["reward", "steps"]);
        *report.entry("reward") += 2.5;
        *report.entry("reward") += 1.0;
        *report.entry("steps") += 1.0;

        let taken = report.take();
        assert_eq!(taken, vec![("reward", 3.5), ("steps", 1.0)]);
        assert_eq!(report.take(), vec![("reward", 0.0), ("steps", 0.0)], "reset after take");
    }

    #[test]
    #[should_panic]
    fn report_rejects_unknown_key() {
        let mut report = Report::new(vec!["reward"]);
        report.entry("loss");
    }
}
