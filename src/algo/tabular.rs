mod discretize;
mod q_table;

pub use discretize::StateDiscretizer;
pub use q_table::{QTable, QTableAgent, QTableAgentConfig};
