//! Exploit applicability checks.

use chainfinder_core::{Exploit, ReusePolicy, System};

use crate::state::AttackerState;

/// Decide whether `exploit` may be launched from `current` against `target`.
///
/// Checks privilege on the source, OS match, credential match, then reuse
/// limits, stopping at the first unmet requirement. Has no side effects.
pub fn is_applicable(
    current: &System,
    exploit: &Exploit,
    target: &System,
    state: &AttackerState,
) -> bool {
    if !state
        .privilege_on(current)
        .satisfies(exploit.required_priv_on_source)
    {
        return false;
    }

    if let Some(fragment) = &exploit.os_contains {
        if !target.os.contains(fragment.as_str()) {
            return false;
        }
    }

    if let Some(tag) = &exploit.required_cred_tag {
        if !state.holds_cred_with_prefix(tag) {
            return false;
        }
    }

    within_reuse_limit(exploit, target, state)
}

fn within_reuse_limit(exploit: &Exploit, target: &System, state: &AttackerState) -> bool {
    match exploit.reuse_policy {
        ReusePolicy::Unlimited => true,
        ReusePolicy::OncePerSystem => !state.used_against(&exploit.name, &target.name),
        ReusePolicy::Limited { limit } => i64::from(state.reuse_count(&exploit.name)) < limit,
    }
}
