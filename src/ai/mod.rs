//! Computer players: the shared [`Agent`] interface, a random baseline,
//! depth-limited minimax, and the tabular Q-learning agent with its reward
//! shaping and state encoding.

mod agent;
pub mod minimax;
pub mod qlearning;
mod random;
pub mod reward;
pub mod state_encoding;

pub use agent::Agent;
pub use minimax::{CheckersHeuristic, Heuristic, MinimaxAgent, MinimaxConfig};
pub use qlearning::{AgentStats, QLearningAgent, QLearningConfig, QTable, StatsSnapshot};
pub use random::RandomAgent;
pub use reward::{calc_reward, RewardConfig, RewardContext};
pub use state_encoding::state_key;
