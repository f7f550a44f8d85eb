use rand::Rng;

use crate::decay::Decay;

use super::Choice;

/// Epsilon greedy exploration policy with time-decaying epsilon threshold
pub struct EpsilonGreedy<D: Decay> {
    epsilon: D,
}

impl<D: Decay> EpsilonGreedy<D> {
    /// Initialize epsilon greedy policy with a decay strategy
    pub fn new(decay: D) -> Self {
        Self { epsilon: decay }
    }

    /// Current epsilon threshold at time `t`
    pub fn threshold(&self, t: u32) -> f32 {
        self.epsilon.evaluate(t as f32)
    }

    /// Invoke epsilon greedy policy for time `t`
    pub fn choose(&self, t: u32, rng: &mut impl Rng) -> Choice {
        if rng.gen::<f32>() > self.threshold(t) {
            Choice::Exploit
        } else {
            Choice::Explore
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use crate::decay;

    use super::*;

    #[test]
    fn zero_epsilon_always_exploits() {
        let policy = EpsilonGreedy::new(decay::Constant::new(0.0));
        let mut rng = StdRng::seed_from_u64(0);
        for t in 0..1000 {
            assert!(matches!(policy.choose(t, &mut rng), Choice::Exploit));
        }
    }

    #[test]
    fn full_epsilon_always_explores() {
        let policy = EpsilonGreedy::new(decay::Constant::new(1.0));
        let mut rng = StdRng::seed_from_u64(0);
        for t in 0..1000 {
            assert!(matches!(policy.choose(t, &mut rng), Choice::Explore));
        }
    }

    #[test]
    fn decayed_threshold_reaches_floor() {
        let policy = EpsilonGreedy::new(decay::Geometric::new(0.5, 1.0, 0.01).unwrap());
        assert_eq!(policy.threshold(0), 1.0);
        assert_eq!(policy.threshold(1), 0.5);
        assert_eq!(policy.threshold(100), 0.01);
    }
}
