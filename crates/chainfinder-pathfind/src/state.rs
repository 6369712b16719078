//! Branch-local attacker state.
//!
//! Every recursive step of the search receives its own `AttackerState`.
//! Deriving a child clones the parent, so sibling branches never observe
//! each other's effects.

use std::collections::{BTreeMap, BTreeSet};

use chainfinder_core::{Privilege, System};

/// What the attacker holds at one point of one chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttackerState {
    pub(crate) privileges: BTreeMap<String, Privilege>,
    pub(crate) credentials: BTreeSet<String>,
    pub(crate) reuse_counts: BTreeMap<String, u32>,
    pub(crate) used_per_system: BTreeMap<String, BTreeSet<String>>,
    pub(crate) visited: BTreeSet<String>,
}

impl AttackerState {
    /// State at the start of a search: standing on `start`, holding its
    /// credentials.
    pub fn initial(start: &System) -> Self {
        let mut state = Self::default();
        state.credentials.extend(start.creds.iter().cloned());
        state.visited.insert(start.name.clone());
        state
    }

    /// Privilege held on `system`; untouched systems report their initial level.
    pub fn privilege_on(&self, system: &System) -> Privilege {
        self.privileges
            .get(&system.name)
            .copied()
            .unwrap_or(system.privilege)
    }

    pub fn credentials(&self) -> &BTreeSet<String> {
        &self.credentials
    }

    pub fn holds_cred_with_prefix(&self, prefix: &str) -> bool {
        self.credentials.iter().any(|c| c.starts_with(prefix))
    }

    /// Successful uses of a LIMITED exploit so far.
    pub fn reuse_count(&self, exploit: &str) -> u32 {
        self.reuse_counts.get(exploit).copied().unwrap_or(0)
    }

    /// Whether a ONCE_PER_SYSTEM exploit was already used against `target`.
    pub fn used_against(&self, exploit: &str, target: &str) -> bool {
        self.used_per_system
            .get(exploit)
            .is_some_and(|targets| targets.contains(target))
    }

    pub fn has_visited(&self, system: &str) -> bool {
        self.visited.contains(system)
    }

    /// Mark `system` as entered by a lateral hop.
    pub fn entering(mut self, system: &str) -> Self {
        self.visited.insert(system.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_holds_start_foothold() {
        let start = System::new("A", "Linux")
            .with_creds(&["key:a"])
            .with_privilege(Privilege::User);
        let state = AttackerState::initial(&start);

        assert!(state.has_visited("A"));
        assert!(state.holds_cred_with_prefix("key:"));
        assert_eq!(state.privilege_on(&start), Privilege::User);
    }

    #[test]
    fn test_untouched_system_reports_initial_privilege() {
        let state = AttackerState::default();
        let plain = System::new("B", "");
        let owned = System::new("C", "").with_privilege(Privilege::Admin);
        assert_eq!(state.privilege_on(&plain), Privilege::None);
        assert_eq!(state.privilege_on(&owned), Privilege::Admin);
    }

    #[test]
    fn test_entering_does_not_touch_parent() {
        let parent = AttackerState::initial(&System::new("A", ""));
        let child = parent.clone().entering("B");
        assert!(child.has_visited("B"));
        assert!(!parent.has_visited("B"));
    }
}
