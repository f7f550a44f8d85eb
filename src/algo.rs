pub mod dqn;
pub mod tabular;
