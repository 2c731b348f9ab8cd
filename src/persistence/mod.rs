//! Durable learning state: the Q-table and agent statistics, each stored as a
//! versioned JSON document and rewritten wholesale after every game.

mod document;
mod store;

pub use document::{Document, SCHEMA_VERSION};
pub use store::{LearningStore, PersistenceConfig};
