use thiserror::Error;

/// Errors raised while building or loading a scenario.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Duplicate system name: {name}")]
    DuplicateSystem { name: String },

    #[error("Duplicate exploit name: {name}")]
    DuplicateExploit { name: String },

    #[error("Route from {from} points to undeclared system {to}")]
    DanglingRoute { from: String, to: String },

    #[error("Route declared on system {owner} claims source {from}")]
    RouteSourceMismatch { owner: String, from: String },

    #[error("Scenario parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
