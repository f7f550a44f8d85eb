/// Implemented RL algorithms
pub mod algo;

/// Implementations of strategies for time-decaying hyperparameters
pub mod decay;

/// Data structures
pub mod ds;

/// Environment
pub mod env;

/// Exploration policies
pub mod exploration;

/// Training environments
pub mod gym;

/// Experience replay
pub mod memory;

/// Checkpoint I/O
pub mod snapshot;

/// Episode statistics and metrics recording
pub mod stats;

mod util;

pub use util::argmax;
