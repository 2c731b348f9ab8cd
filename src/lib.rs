//! # ML Checkers
//!
//! Checkers on a small board (4x4 by default) with two computer players: a
//! depth-limited minimax search and a tabular Q-learning agent whose table and
//! statistics persist between runs.
//!
//! ## Modules
//!
//! - [`game`]: Core game logic: pieces, board and move generation, match controller
//! - [`ai`]: Agent trait, random baseline, minimax, Q-learning, reward shaping
//! - [`training`]: Training episodes, evaluation games, metrics collection
//! - [`persistence`]: Versioned JSON storage for the Q-table and statistics
//! - [`config`]: TOML configuration loading and validation
//! - [`error`]: Structured error types

pub mod ai;
pub mod config;
pub mod error;
pub mod game;
pub mod persistence;
pub mod training;
