//! Backtracking chain enumeration: sequential and parallel.
//!
//! At each system the traversal tries every exploit in catalog order. Local
//! exploits stay on the current system; lateral exploits walk the outbound
//! routes sorted by destination name. Each recursive call owns a derived
//! chain prefix and attacker state, and solutions are collected into an
//! explicit per-call collector that is merged by the caller.

use rayon::prelude::*;

use chainfinder_core::{Exploit, Route, Scenario, System};

use crate::effects;
use crate::ordering;
use crate::precondition::is_applicable;
use crate::state::AttackerState;
use crate::types::{Chain, Hop, SearchStats};

/// Ordered chains plus traversal counters.
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    pub chains: Vec<Chain>,
    pub stats: SearchStats,
}

/// A legal move out of the current system.
#[derive(Debug, Clone, Copy)]
struct Move<'s> {
    exploit: &'s Exploit,
    target: &'s System,
}

/// Read-only inputs shared by every branch.
struct SearchContext<'s> {
    scenario: &'s Scenario,
    target: &'s str,
    max_hops: usize,
}

/// Solutions and counters gathered by one subtree.
#[derive(Default)]
struct Collector {
    solutions: Vec<Chain>,
    stats: SearchStats,
}

impl Collector {
    fn merge(&mut self, other: Collector) {
        self.solutions.extend(other.solutions);
        self.stats.merge(&other.stats);
    }

    fn finish(self) -> SearchOutcome {
        SearchOutcome {
            chains: ordering::order(self.solutions),
            stats: self.stats,
        }
    }
}

/// Enumerate every chain from `start` to `target` of at most `max_hops` hops.
///
/// A chain stops at its first arrival on the target. Starting on the target
/// yields no chains.
pub fn search(scenario: &Scenario, start: &System, target: &System, max_hops: usize) -> SearchOutcome {
    let ctx = SearchContext {
        scenario,
        target: &target.name,
        max_hops,
    };
    let mut out = Collector::default();

    if start.name == target.name {
        return out.finish();
    }

    let root = AttackerState::initial(start);
    explore(&ctx, start, &[], &root, &mut out);
    out.finish()
}

/// Same result as [`search`], forking at the moves available from `start`.
pub fn search_parallel(
    scenario: &Scenario,
    start: &System,
    target: &System,
    max_hops: usize,
) -> SearchOutcome {
    let ctx = SearchContext {
        scenario,
        target: &target.name,
        max_hops,
    };
    let mut out = Collector::default();

    if start.name == target.name {
        return out.finish();
    }

    let root = AttackerState::initial(start);
    out.stats.states_explored += 1;
    if max_hops == 0 {
        out.stats.depth_cutoffs += 1;
        return out.finish();
    }

    let moves = candidate_moves(scenario, start, &root);
    let partials: Vec<Collector> = moves
        .par_iter()
        .map(|mv| {
            let mut branch = Collector::default();
            let (chain, state) = step(start, mv, &[], &root);
            explore(&ctx, mv.target, &chain, &state, &mut branch);
            branch
        })
        .collect();

    for partial in partials {
        out.merge(partial);
    }
    out.finish()
}

fn explore(
    ctx: &SearchContext<'_>,
    current: &System,
    chain: &[Hop],
    state: &AttackerState,
    out: &mut Collector,
) {
    out.stats.states_explored += 1;

    if current.name == ctx.target {
        tracing::trace!(hops = chain.len(), "Chain reached target");
        out.solutions.push(Chain::new(chain.to_vec()));
        out.stats.raw_solutions += 1;
        return;
    }

    if chain.len() >= ctx.max_hops {
        out.stats.depth_cutoffs += 1;
        return;
    }

    for mv in candidate_moves(ctx.scenario, current, state) {
        let (next_chain, next_state) = step(current, &mv, chain, state);
        explore(ctx, mv.target, &next_chain, &next_state, out);
    }
}

/// Every applicable move from `current`, in catalog order then route order.
fn candidate_moves<'s>(
    scenario: &'s Scenario,
    current: &'s System,
    state: &AttackerState,
) -> Vec<Move<'s>> {
    let mut routes: Vec<&Route> = current.routes.iter().collect();
    routes.sort_by(|a, b| a.to.cmp(&b.to));

    let mut moves = Vec::new();
    for exploit in scenario.exploits() {
        let Some(service) = exploit.required_service.service() else {
            if is_applicable(current, exploit, current, state) {
                moves.push(Move {
                    exploit,
                    target: current,
                });
            }
            continue;
        };

        for route in &routes {
            if state.has_visited(&route.to) || !route.allows(service) {
                continue;
            }
            // Dangling routes never match.
            let Some(destination) = scenario.system(&route.to) else {
                continue;
            };
            if !destination.exposes(service) {
                continue;
            }
            if is_applicable(current, exploit, destination, state) {
                moves.push(Move {
                    exploit,
                    target: destination,
                });
            }
        }
    }
    moves
}

/// Derive the chain prefix and attacker state after taking `mv`.
fn step(
    current: &System,
    mv: &Move<'_>,
    chain: &[Hop],
    state: &AttackerState,
) -> (Vec<Hop>, AttackerState) {
    let applied = effects::apply(mv.target, mv.exploit, state);
    let next_state = if mv.exploit.is_local() {
        applied
    } else {
        applied.entering(&mv.target.name)
    };

    let mut next_chain = Vec::with_capacity(chain.len() + 1);
    next_chain.extend_from_slice(chain);
    next_chain.push(Hop {
        from: current.name.clone(),
        to: mv.target.name.clone(),
        exploit: mv.exploit.name.clone(),
        via: mv.exploit.required_service.clone(),
    });

    (next_chain, next_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainfinder_core::{Privilege, ReusePolicy};

    /// ```text
    /// A --ssh--> B --ssh--> C
    /// ```
    ///
    /// `e1` is a local USER grant, `e2` an ssh hop needing USER on the source.
    fn linear_scenario() -> Scenario {
        let systems = vec![
            System::new("A", "Linux")
                .with_services(&["ssh"])
                .with_route("B", &["ssh"]),
            System::new("B", "Linux")
                .with_services(&["ssh"])
                .with_route("C", &["ssh"]),
            System::new("C", "Linux").with_services(&["ssh"]),
        ];
        let exploits = vec![
            Exploit::local("e1").grants(Privilege::User),
            Exploit::lateral("e2", "ssh")
                .requires_priv(Privilege::User)
                .grants(Privilege::User),
        ];
        Scenario::new(systems, exploits)
    }

    fn run(scenario: &Scenario, start: &str, target: &str, max_hops: usize) -> SearchOutcome {
        let start = scenario.system(start).unwrap();
        let target = scenario.system(target).unwrap();
        search(scenario, start, target, max_hops)
    }

    fn keys(outcome: &SearchOutcome) -> Vec<String> {
        outcome.chains.iter().map(Chain::key).collect()
    }

    #[test]
    fn test_linear_chain_found() {
        let scenario = linear_scenario();
        let outcome = run(&scenario, "A", "C", 4);

        // e2 grants USER on B, so the local escalation on B is optional and
        // the repeated e1 on A fits the bound too.
        assert_eq!(
            keys(&outcome),
            vec![
                "A|local|e1|A;A|local|e1|A;A|ssh|e2|B;B|ssh|e2|C".to_string(),
                "A|local|e1|A;A|ssh|e2|B;B|local|e1|B;B|ssh|e2|C".to_string(),
                "A|local|e1|A;A|ssh|e2|B;B|ssh|e2|C".to_string(),
            ]
        );

        let full = &outcome.chains[1];
        assert!(full.hops()[0].is_local());
        assert_eq!(full.hops()[1].via.as_str(), "ssh");
        assert_eq!(full.hops()[3].to, "C");
    }

    #[test]
    fn test_hop_bound_prunes() {
        let scenario = linear_scenario();
        let outcome = run(&scenario, "A", "C", 1);
        assert!(outcome.chains.is_empty());
        assert!(outcome.stats.depth_cutoffs > 0);
    }

    #[test]
    fn test_zero_hops_yields_nothing() {
        let scenario = linear_scenario();
        let outcome = run(&scenario, "A", "B", 0);
        assert!(outcome.chains.is_empty());
        assert_eq!(outcome.stats.states_explored, 1);
    }

    #[test]
    fn test_start_equals_target_yields_nothing() {
        let scenario = linear_scenario();
        assert!(run(&scenario, "A", "A", 4).chains.is_empty());
    }

    #[test]
    fn test_route_policy_must_allow_service() {
        let systems = vec![
            System::new("A", "").with_route("B", &["http"]),
            System::new("B", "").with_services(&["ssh", "http"]),
        ];
        let scenario = Scenario::new(systems, vec![Exploit::lateral("e", "ssh")]);
        assert!(run(&scenario, "A", "B", 3).chains.is_empty());
    }

    #[test]
    fn test_destination_must_expose_service() {
        let systems = vec![
            System::new("A", "").with_route("B", &["ssh"]),
            System::new("B", "").with_services(&["http"]),
        ];
        let scenario = Scenario::new(systems, vec![Exploit::lateral("e", "ssh")]);
        assert!(run(&scenario, "A", "B", 3).chains.is_empty());
    }

    #[test]
    fn test_dangling_route_never_matches() {
        let systems = vec![
            System::new("A", "")
                .with_route("ghost", &["ssh"])
                .with_route("B", &["ssh"]),
            System::new("B", "").with_services(&["ssh"]),
        ];
        let scenario = Scenario::new(systems, vec![Exploit::lateral("e", "ssh")]);
        let outcome = run(&scenario, "A", "B", 2);
        assert_eq!(outcome.chains.len(), 1);
    }

    #[test]
    fn test_no_revisit_via_lateral_hop() {
        // A <-> B cycle with target C behind B.
        let systems = vec![
            System::new("A", "")
                .with_services(&["ssh"])
                .with_route("B", &["ssh"]),
            System::new("B", "")
                .with_services(&["ssh"])
                .with_route("A", &["ssh"])
                .with_route("C", &["ssh"]),
            System::new("C", "").with_services(&["ssh"]),
        ];
        let scenario = Scenario::new(systems, vec![Exploit::lateral("e", "ssh")]);
        let outcome = run(&scenario, "A", "C", 6);
        assert_eq!(outcome.chains.len(), 1);
        assert_eq!(outcome.chains[0].len(), 2);
    }

    #[test]
    fn test_once_per_system_never_repeats_on_same_target() {
        let build = |policy: ReusePolicy| {
            let systems = vec![
                System::new("A", "").with_route("B", &["ssh"]),
                System::new("B", "").with_services(&["ssh"]),
            ];
            let exploits = vec![
                Exploit::local("noise").with_reuse(policy),
                Exploit::lateral("jump", "ssh"),
            ];
            Scenario::new(systems, exploits)
        };

        // Unlimited: jump / noise,jump / noise,noise,jump.
        let unlimited = build(ReusePolicy::Unlimited);
        assert_eq!(run(&unlimited, "A", "B", 3).chains.len(), 3);

        // The chain applying noise twice against A disappears.
        let once = build(ReusePolicy::OncePerSystem);
        let outcome = run(&once, "A", "B", 3);
        assert_eq!(outcome.chains.len(), 2);
        for chain in &outcome.chains {
            let uses = chain.iter().filter(|h| h.exploit == "noise").count();
            assert!(uses <= 1);
        }
    }

    #[test]
    fn test_limited_exploit_used_at_most_n_times() {
        let systems = vec![
            System::new("A", "").with_route("B", &["ssh"]),
            System::new("B", "").with_services(&["ssh"]),
        ];
        let exploits = vec![
            Exploit::local("noise").with_reuse(ReusePolicy::Limited { limit: 1 }),
            Exploit::lateral("jump", "ssh"),
        ];
        let scenario = Scenario::new(systems, exploits);
        let outcome = run(&scenario, "A", "B", 5);

        // jump, or noise then jump.
        assert_eq!(outcome.chains.len(), 2);
        for chain in &outcome.chains {
            let uses = chain.iter().filter(|h| h.exploit == "noise").count();
            assert!(uses <= 1);
        }
    }

    #[test]
    fn test_credentials_unlock_lateral_move() {
        let systems = vec![
            System::new("A", "")
                .with_services(&["smb"])
                .with_route("B", &["smb"])
                .with_route("C", &["smb"]),
            System::new("B", "")
                .with_services(&["smb"])
                .with_creds(&["ntlm:domain_admin"])
                .with_route("C", &["smb"]),
            System::new("C", "Windows Server").with_services(&["smb"]),
        ];
        let exploits = vec![
            Exploit::lateral("share-read", "smb").harvests_creds(),
            Exploit::lateral("pass-the-hash", "smb")
                .requires_cred_tag("ntlm:")
                .requires_os("Windows"),
        ];
        let scenario = Scenario::new(systems, exploits);
        let outcome = run(&scenario, "A", "C", 3);

        assert_eq!(
            keys(&outcome),
            vec![
                "A|smb|share-read|B;B|smb|pass-the-hash|C".to_string(),
                "A|smb|share-read|B;B|smb|share-read|C".to_string(),
                "A|smb|share-read|C".to_string(),
            ]
        );
    }

    #[test]
    fn test_sibling_branches_do_not_share_state() {
        // Harvesting on B must not leak into the branch that goes straight to C.
        let systems = vec![
            System::new("A", "")
                .with_route("B", &["smb"])
                .with_route("C", &["smb"]),
            System::new("B", "")
                .with_services(&["smb"])
                .with_creds(&["ntlm:x"]),
            System::new("C", "").with_services(&["smb"]),
        ];
        let exploits = vec![
            Exploit::lateral("pth", "smb").requires_cred_tag("ntlm:"),
            Exploit::lateral("dump", "smb").harvests_creds(),
        ];
        let scenario = Scenario::new(systems, exploits);
        let outcome = run(&scenario, "A", "C", 3);

        assert_eq!(keys(&outcome), vec!["A|smb|dump|C".to_string()]);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let scenario = linear_scenario();
        let a = scenario.system("A").unwrap();
        let c = scenario.system("C").unwrap();
        for max_hops in 0..6 {
            let seq = search(&scenario, a, c, max_hops);
            let par = search_parallel(&scenario, a, c, max_hops);
            assert_eq!(seq.chains, par.chains);
            assert_eq!(seq.stats, par.stats);
        }
    }
}
