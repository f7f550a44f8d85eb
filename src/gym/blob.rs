use burn::prelude::*;
use log::debug;
use rand::{rngs::StdRng, Rng, SeedableRng};
use strum::{EnumIter, FromRepr, VariantArray};

use crate::env::{DiscreteActionSpace, Environment, Report, ToTensor};

const MOVE_PENALTY: f32 = -1.0;
const ENEMY_PENALTY: f32 = -300.0;
const FOOD_REWARD: f32 = 25.0;
const MAX_STEPS: u32 = 200;

// Channel intensities for the rendered observation, scaled by 1/255
const PLAYER_COLOR: [u8; 3] = [255, 175, 0];
const FOOD_COLOR: [u8; 3] = [0, 255, 0];
const ENEMY_COLOR: [u8; 3] = [0, 0, 255];

/// A channels-first image observation of the field, values in `[0, 1]`
pub type BlobImage<const S: usize> = [[[f32; S]; S]; 3];

/// Actions for the [`BlobWorld`] environment, moving the player blob to one of
/// its eight neighboring cells or leaving it in place
#[derive(FromRepr, EnumIter, VariantArray, Clone, Copy, PartialEq, Eq, Debug)]
pub enum BlobAction {
    Up = 0,
    Down = 1,
    Left = 2,
    Right = 3,
    UpLeft = 4,
    UpRight = 5,
    DownLeft = 6,
    DownRight = 7,
    Stay = 8,
}

impl BlobAction {
    fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
            Self::UpLeft => (-1, -1),
            Self::UpRight => (1, -1),
            Self::DownLeft => (-1, 1),
            Self::DownRight => (1, 1),
            Self::Stay => (0, 0),
        }
    }
}

impl From<usize> for BlobAction {
    fn from(value: usize) -> Self {
        Self::from_repr(value).expect("BlobAction::from is only called with valid values [0, 8]")
    }
}

impl<B: Backend> ToTensor<B, 2, Int> for Vec<BlobAction> {
    fn to_tensor(self, device: &B::Device) -> Tensor<B, 2, Int> {
        let len = self.len();
        let data = Data::new(
            self.into_iter().map(|x| x as i32).collect::<Vec<_>>(),
            [len].into(),
        );
        Tensor::from_ints(data, device).unsqueeze_dim(1)
    }
}

impl<B: Backend, const S: usize> ToTensor<B, 4, Float> for Vec<BlobImage<S>> {
    fn to_tensor(self, device: &B::Device) -> Tensor<B, 4, Float> {
        let len = self.len();
        let data = Data::new(
            self.into_iter()
                .flatten()
                .flatten()
                .flatten()
                .collect::<Vec<f32>>(),
            [len * 3 * S * S].into(),
        );
        Tensor::from_floats(data, device).reshape([len, 3, S, S])
    }
}

/// Position on the field
type Pos = (i32, i32);

/// A grid world in which a player blob hunts a food blob while avoiding an
/// enemy blob
///
/// Every move costs a small penalty, reaching the food ends the episode with a
/// large reward, and colliding with the enemy ends it with a large penalty.
/// The observation is an RGB-style image of the field.
pub struct BlobWorld<const S: usize> {
    player: Pos,
    food: Pos,
    enemy: Pos,
    steps: u32,
    rng: StdRng,
    pub report: Report,
}

impl<const S: usize> BlobWorld<S> {
    pub fn new(seed: u64) -> Self {
        let mut world = Self {
            player: (0, 0),
            food: (0, 0),
            enemy: (0, 0),
            steps: 0,
            rng: StdRng::seed_from_u64(seed),
            report: Report::new(vec!["steps", "food"]),
        };
        world.scatter();
        world
    }

    /// Place the three blobs on random distinct cells
    fn scatter(&mut self) {
        let side = S as i32;
        self.player = (self.rng.gen_range(0..side), self.rng.gen_range(0..side));
        self.food = self.player;
        while self.food == self.player {
            self.food = (self.rng.gen_range(0..side), self.rng.gen_range(0..side));
        }
        self.enemy = self.player;
        while self.enemy == self.player || self.enemy == self.food {
            self.enemy = (self.rng.gen_range(0..side), self.rng.gen_range(0..side));
        }
    }

    fn paint(image: &mut BlobImage<S>, pos: Pos, color: [u8; 3]) {
        for (c, &intensity) in color.iter().enumerate() {
            image[c][pos.1 as usize][pos.0 as usize] = intensity as f32 / 255.0;
        }
    }

    fn observe(&self) -> BlobImage<S> {
        let mut image = [[[0.0; S]; S]; 3];
        Self::paint(&mut image, self.food, FOOD_COLOR);
        Self::paint(&mut image, self.enemy, ENEMY_COLOR);
        Self::paint(&mut image, self.player, PLAYER_COLOR);
        image
    }
}

impl<const S: usize> Environment for BlobWorld<S> {
    type State = BlobImage<S>;
    type Action = BlobAction;

    fn step(&mut self, action: Self::Action) -> (Option<Self::State>, f32) {
        self.steps += 1;
        *self.report.entry("steps") += 1.0;

        let (dx, dy) = action.delta();
        let side = S as i32 - 1;
        self.player = (
            (self.player.0 + dx).clamp(0, side),
            (self.player.1 + dy).clamp(0, side),
        );

        let reward = if self.player == self.enemy {
            ENEMY_PENALTY
        } else if self.player == self.food {
            *self.report.entry("food") += 1.0;
            FOOD_REWARD
        } else {
            MOVE_PENALTY
        };

        let done = reward == ENEMY_PENALTY || reward == FOOD_REWARD || self.steps >= MAX_STEPS;
        let next_state = if done { None } else { Some(self.observe()) };

        (next_state, reward)
    }

    fn reset(&mut self) -> Self::State {
        self.scatter();
        self.steps = 0;
        self.observe()
    }

    fn render(&self) {
        for y in 0..S as i32 {
            let row = (0..S as i32)
                .map(|x| match (x, y) {
                    p if p == self.player => 'P',
                    p if p == self.food => 'F',
                    p if p == self.enemy => 'E',
                    _ => '.',
                })
                .collect::<String>();
            debug!("{row}");
        }
    }
}

impl<const S: usize> DiscreteActionSpace for BlobWorld<S> {
    fn actions(&self) -> Vec<Self::Action> {
        BlobAction::VARIANTS.to_vec()
    }
}
