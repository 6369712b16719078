//! Exploit effects on attacker state.

use chainfinder_core::{Exploit, ReusePolicy, System};

use crate::state::AttackerState;

/// Attacker state after `exploit` succeeds against `target`.
///
/// The input state is left untouched. Privilege on the target only ever
/// rises; credentials are harvested after the privilege gain.
pub fn apply(target: &System, exploit: &Exploit, state: &AttackerState) -> AttackerState {
    let mut next = state.clone();

    if let Some(gain) = exploit.gain_priv_on_target {
        if gain.outranks(state.privilege_on(target)) {
            next.privileges.insert(target.name.clone(), gain);
        }
    }

    if exploit.add_creds_on_target {
        next.credentials.extend(target.creds.iter().cloned());
    }

    match exploit.reuse_policy {
        ReusePolicy::Unlimited => {}
        ReusePolicy::OncePerSystem => {
            next.used_per_system
                .entry(exploit.name.clone())
                .or_default()
                .insert(target.name.clone());
        }
        ReusePolicy::Limited { .. } => {
            *next.reuse_counts.entry(exploit.name.clone()).or_insert(0) += 1;
        }
    }

    next
}
