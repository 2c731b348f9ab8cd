//! Training infrastructure: training and evaluation episodes, rolling metrics,
//! and the trainer that keeps the learning state on disk current.

pub mod episode;
pub mod metrics;
pub mod trainer;

pub use episode::{
    evaluate, play_eval_game, play_match, play_training_episode, EvalReport, OpponentKind,
};
pub use metrics::{EpisodeResult, TrainingMetrics};
pub use trainer::{Trainer, TrainerConfig};
