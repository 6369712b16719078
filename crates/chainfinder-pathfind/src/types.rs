//! Request and response types for chain searches.

use std::fmt;

use serde::{Deserialize, Serialize};

use chainfinder_core::ServiceRequirement;

/// One exploit application: local (no movement) or lateral (across a route).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Hop {
    pub from: String,
    /// Equal to `from` for local hops.
    pub to: String,
    pub exploit: String,
    /// The service used, or the local sentinel.
    pub via: ServiceRequirement,
}

impl Hop {
    pub fn is_local(&self) -> bool {
        self.via.is_local()
    }

    /// Canonical ordering key for this hop.
    ///
    /// Names are free text, so distinct hops can share a key.
    pub fn key(&self) -> String {
        format!("{}|{}|{}|{}", self.from, self.via, self.exploit, self.to)
    }
}

impl fmt::Display for Hop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -[{}/{}]-> {}", self.from, self.exploit, self.via, self.to)
    }
}

/// An ordered, non-empty sequence of hops ending at the target system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Chain {
    hops: Vec<Hop>,
}

impl Chain {
    pub(crate) fn new(hops: Vec<Hop>) -> Self {
        Self { hops }
    }

    pub fn hops(&self) -> &[Hop] {
        &self.hops
    }

    pub fn len(&self) -> usize {
        self.hops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Hop> {
        self.hops.iter()
    }

    /// Canonical key: per-hop keys joined in chain order.
    pub fn key(&self) -> String {
        self.hops
            .iter()
            .map(Hop::key)
            .collect::<Vec<_>>()
            .join(";")
    }
}

impl<'a> IntoIterator for &'a Chain {
    type Item = &'a Hop;
    type IntoIter = std::slice::Iter<'a, Hop>;

    fn into_iter(self) -> Self::IntoIter {
        self.hops.iter()
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, hop) in self.hops.iter().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            write!(f, "{hop}")?;
        }
        Ok(())
    }
}

/// Request to enumerate chains between two systems.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub start: String,
    pub target: String,
    pub max_hops: i64,
}

/// Counters collected while searching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    /// States entered by the traversal, including the initial one.
    pub states_explored: u64,
    /// Branches cut off by the hop bound.
    pub depth_cutoffs: u64,
    /// Solutions recorded before deduplication.
    pub raw_solutions: u64,
}

impl SearchStats {
    pub(crate) fn merge(&mut self, other: &SearchStats) {
        self.states_explored += other.states_explored;
        self.depth_cutoffs += other.depth_cutoffs;
        self.raw_solutions += other.raw_solutions;
    }
}

/// Complete result of a chain search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub start: String,
    pub target: String,
    pub max_hops: i64,
    pub chains: Vec<Chain>,
    pub stats: SearchStats,
    /// BLAKE3 hex digest of the ordered chain keys.
    pub digest: String,
    pub computation_ms: u64,
}
