//! Error types for the chainfinder-pathfind crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PathfindError {
    #[error("System not found in scenario: {name}")]
    UnknownSystem { name: String },

    #[error("Hop bound must be non-negative, got {max_hops}")]
    NegativeHopBound { max_hops: i64 },
}

pub type Result<T> = std::result::Result<T, PathfindError>;
