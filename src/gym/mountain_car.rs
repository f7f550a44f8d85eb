use log::debug;
use rand::{rngs::StdRng, Rng, SeedableRng};
use strum::{EnumIter, FromRepr, VariantArray};

use crate::env::{BoundedStateSpace, DiscreteActionSpace, Environment, GoalAware, Report};

const MIN_POSITION: f32 = -1.2;
const MAX_POSITION: f32 = 0.6;
const MAX_SPEED: f32 = 0.07;
const GOAL_POSITION: f32 = 0.5;
const FORCE: f32 = 0.001;
const GRAVITY: f32 = 0.0025;
const MAX_STEPS: u32 = 200;

/// Actions for the [`MountainCar`] environment, applying a directed force to the car
#[derive(FromRepr, EnumIter, VariantArray, Clone, Copy, PartialEq, Eq, Debug)]
pub enum MCAction {
    Left = 0,
    Coast = 1,
    Right = 2,
}

impl From<usize> for MCAction {
    fn from(value: usize) -> Self {
        Self::from_repr(value).expect("MCAction::from is only called with valid values [0, 2]")
    }
}

impl From<MCAction> for usize {
    fn from(value: MCAction) -> Self {
        value as usize
    }
}

/// The classic MountainCar reinforcement learning environment
///
/// An underpowered car sits in a valley and must rock back and forth to build
/// enough momentum to reach the flag on the right hill. The state is
/// `[position, velocity]` and every step is rewarded with -1 until the episode
/// ends by reaching the goal or running out of steps.
pub struct MountainCar {
    position: f32,
    velocity: f32,
    steps: u32,
    rng: StdRng,
    pub report: Report,
}

impl MountainCar {
    pub fn new(seed: u64) -> Self {
        Self {
            position: -0.5,
            velocity: 0.0,
            steps: 0,
            rng: StdRng::seed_from_u64(seed),
            report: Report::new(vec!["steps", "goal"]),
        }
    }

    fn observe(&self) -> [f32; 2] {
        [self.position, self.velocity]
    }
}

impl Environment for MountainCar {
    type State = [f32; 2];
    type Action = MCAction;

    fn step(&mut self, action: Self::Action) -> (Option<Self::State>, f32) {
        self.steps += 1;
        *self.report.entry("steps") += 1.0;

        self.velocity += (action as isize - 1) as f32 * FORCE
            + (3.0 * self.position).cos() * (-GRAVITY);
        self.velocity = self.velocity.clamp(-MAX_SPEED, MAX_SPEED);
        self.position += self.velocity;
        self.position = self.position.clamp(MIN_POSITION, MAX_POSITION);
        if self.position <= MIN_POSITION && self.velocity < 0.0 {
            self.velocity = 0.0;
        }

        if self.position >= GOAL_POSITION {
            *self.report.entry("goal") += 1.0;
        }

        let done = self.position >= GOAL_POSITION || self.steps >= MAX_STEPS;
        let next_state = if done { None } else { Some(self.observe()) };

        (next_state, -1.0)
    }

    fn reset(&mut self) -> Self::State {
        self.position = self.rng.gen_range(-0.6..-0.4);
        self.velocity = 0.0;
        self.steps = 0;
        self.observe()
    }

    fn render(&self) {
        let span = MAX_POSITION - MIN_POSITION;
        let cell = (((self.position - MIN_POSITION) / span) * 40.0) as usize;
        let mut track = vec!['_'; 41];
        track[40] = '>';
        track[cell.min(40)] = 'C';
        debug!("|{}|", track.into_iter().collect::<String>());
    }
}

impl DiscreteActionSpace for MountainCar {
    fn actions(&self) -> Vec<Self::Action> {
        MCAction::VARIANTS.to_vec()
    }
}

impl BoundedStateSpace for MountainCar {
    fn observation_low(&self) -> Vec<f32> {
        vec![MIN_POSITION, -MAX_SPEED]
    }

    fn observation_high(&self) -> Vec<f32> {
        vec![MAX_POSITION, MAX_SPEED]
    }
}

impl GoalAware for MountainCar {
    fn reached_goal(&self) -> bool {
        self.position >= GOAL_POSITION
    }
}
