//! chainfinder-core: Scenario model, loading, configuration, and error handling.
//!
//! This crate provides the read-only inputs of an intrusion chain search:
//! - Systems, routes, and exploits of a modeled network
//! - Privilege levels and exploit reuse policies
//! - The indexed `Scenario` and the JSON scenario document loader
//! - Configuration management
//! - Common error types

pub mod config;
pub mod error;
pub mod scenario;
pub mod types;

pub use error::CoreError;
pub use scenario::{Scenario, ScenarioDocument};
pub use types::{Exploit, Privilege, ReusePolicy, Route, ServiceRequirement, System, LOCAL_SENTINEL};
