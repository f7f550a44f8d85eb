use rand::{seq::SliceRandom, Rng};

use crate::{ds::RingBuffer, env::Environment};

use super::{Exp, ExpBatch};

/// A fixed-size memory storage for reinforcement learning experiences
///
/// This structure uses a ring buffer to store experiences, which are tuples of
/// (state, action, next state, reward). It automatically overwrites the oldest
/// experiences once it reaches its capacity.
pub struct ReplayMemory<E: Environment> {
    memory: RingBuffer<Exp<E>>,
    /// The number of experiences drawn by one call to [`sample_zipped`](Self::sample_zipped)
    pub batch_size: usize,
}

impl<E: Environment> ReplayMemory<E> {
    pub fn new(capacity: usize, batch_size: usize) -> Self {
        Self {
            memory: RingBuffer::new(capacity),
            batch_size,
        }
    }

    pub fn len(&self) -> usize {
        self.memory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memory.len() == 0
    }

    /// Add a new experience to the memory, evicting the oldest if full
    pub fn push(&mut self, exp: Exp<E>) {
        self.memory.push(exp);
    }

    /// Sample a uniform random batch of distinct experiences and zip it into a
    /// tuple of vectors
    ///
    /// ### Returns
    /// - `Some(batch)` if the buffer holds at least `batch_size` experiences
    /// - `None` otherwise
    pub fn sample_zipped(&self, rng: &mut impl Rng) -> Option<ExpBatch<E>> {
        if self.batch_size <= self.memory.len() {
            let experiences = self
                .memory
                .as_slice()
                .choose_multiple(rng, self.batch_size)
                .cloned();
            let batch = ExpBatch::from_iter(experiences, self.batch_size);
            Some(batch)
        } else {
            None
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    pub(crate) struct MockEnv;

    impl Environment for MockEnv {
        type State = i32;
        type Action = i32;

        fn step(&mut self, _action: Self::Action) -> (Option<Self::State>, f32) {
            (None, 0.0)
        }

        fn reset(&mut self) -> Self::State {
            0
        }
    }

    const MEMORY_CAP: usize = 4;
    const BATCH_SIZE: usize = 2;

    fn create_mock_exp_vec() -> Vec<Exp<MockEnv>> {
        (0..4)
            .map(|i| Exp {
                state: i,
                action: i + 1,
                next_state: Some(i + 1),
                reward: 1.0,
            })
            .collect()
    }

    #[test]
    fn replay_memory_functional() {
        let experiences = create_mock_exp_vec();
        let mut memory = ReplayMemory::new(MEMORY_CAP, BATCH_SIZE);
        let mut rng = StdRng::seed_from_u64(0);

        assert!(
            memory.sample_zipped(&mut rng).is_none(),
            "sample_zipped none when too few experiences"
        );

        for exp in experiences {
            memory.push(exp);
        }

        assert!(
            memory
                .sample_zipped(&mut rng)
                .is_some_and(|b| b.states.len() == BATCH_SIZE),
            "sample_zipped works"
        );
    }

    #[test]
    fn replay_memory_samples_distinct_experiences() {
        let mut memory = ReplayMemory::<MockEnv>::new(8, 8);
        let mut rng = StdRng::seed_from_u64(7);

        for i in 0..8 {
            memory.push(Exp {
                state: i,
                action: 0,
                next_state: None,
                reward: 0.0,
            });
        }

        let mut states = memory.sample_zipped(&mut rng).unwrap().states;
        states.sort_unstable();
        assert_eq!(states, (0..8).collect::<Vec<_>>(), "sampled without replacement");
    }

    #[test]
    fn replay_memory_bounded_by_capacity() {
        let mut memory = ReplayMemory::<MockEnv>::new(MEMORY_CAP, BATCH_SIZE);
        for i in 0..100 {
            memory.push(Exp {
                state: i,
                action: 0,
                next_state: None,
                reward: 0.0,
            });
            assert!(memory.len() <= MEMORY_CAP);
        }
    }
}
