//! chainfinder-pathfind: Intrusion chain enumeration over a static scenario.
//!
//! Given a scenario of systems, routes, and an exploit catalog, enumerates
//! every ordered sequence of exploit applications that takes an attacker
//! from a start system to a target system within a hop bound. Output is
//! deterministically ordered and fingerprinted.

pub mod effects;
pub mod error;
pub mod ordering;
pub mod precondition;
pub mod report;
pub mod search;
pub mod state;
pub mod types;

pub use error::PathfindError;
pub use types::{Chain, Hop, SearchRequest, SearchResult, SearchStats};

use std::time::Instant;

use chainfinder_core::{Scenario, System};

/// Enumerate every chain from `start` to `target` within `max_hops` hops,
/// ordered canonically.
///
/// Errors only when a system is missing from the scenario or the hop bound
/// is negative; an unreachable target yields an empty list.
pub fn find_chains(
    scenario: &Scenario,
    start: &str,
    target: &str,
    max_hops: i64,
) -> error::Result<Vec<Chain>> {
    ChainFinder::new(scenario).find_chains(start, target, max_hops)
}

/// The chain search engine bound to one scenario.
pub struct ChainFinder<'s> {
    scenario: &'s Scenario,
    parallel: bool,
}

impl<'s> ChainFinder<'s> {
    /// Create a sequential engine.
    pub fn new(scenario: &'s Scenario) -> Self {
        Self {
            scenario,
            parallel: false,
        }
    }

    /// Fork the search across threads at the first hop.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Ordered chains only.
    pub fn find_chains(&self, start: &str, target: &str, max_hops: i64) -> error::Result<Vec<Chain>> {
        let (start, target, bound) = self.resolve(start, target, max_hops)?;
        Ok(self.dispatch(start, target, bound).chains)
    }

    /// Run a search and return chains with stats and digest.
    pub fn run(&self, request: &SearchRequest) -> error::Result<SearchResult> {
        let clock = Instant::now();
        let (start, target, bound) =
            self.resolve(&request.start, &request.target, request.max_hops)?;

        tracing::debug!(
            start = %start.name,
            target = %target.name,
            max_hops = bound,
            parallel = self.parallel,
            exploits = self.scenario.exploit_count(),
            "Starting chain search"
        );

        let outcome = self.dispatch(start, target, bound);
        let digest = ordering::digest(&outcome.chains);
        let computation_ms = clock.elapsed().as_millis() as u64;

        tracing::debug!(
            chains = outcome.chains.len(),
            states = outcome.stats.states_explored,
            computation_ms,
            "Chain search finished"
        );

        Ok(SearchResult {
            start: start.name.clone(),
            target: target.name.clone(),
            max_hops: request.max_hops,
            chains: outcome.chains,
            stats: outcome.stats,
            digest,
            computation_ms,
        })
    }

    fn resolve(
        &self,
        start: &str,
        target: &str,
        max_hops: i64,
    ) -> error::Result<(&'s System, &'s System, usize)> {
        let bound = usize::try_from(max_hops)
            .map_err(|_| PathfindError::NegativeHopBound { max_hops })?;
        let start = self.lookup(start)?;
        let target = self.lookup(target)?;
        Ok((start, target, bound))
    }

    fn lookup(&self, name: &str) -> error::Result<&'s System> {
        self.scenario
            .system(name)
            .ok_or_else(|| PathfindError::UnknownSystem {
                name: name.to_string(),
            })
    }

    fn dispatch(&self, start: &System, target: &System, max_hops: usize) -> search::SearchOutcome {
        if self.parallel {
            search::search_parallel(self.scenario, start, target, max_hops)
        } else {
            search::search(self.scenario, start, target, max_hops)
        }
    }
}
