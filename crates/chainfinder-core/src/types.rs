//! Core domain types for the scenario model.
//!
//! Systems, routes, and exploits are the read-only inputs of a chain search.
//! They deserialize from the scenario document format described in
//! [`crate::scenario`].

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Service identifier that marks an exploit as local (no movement).
pub const LOCAL_SENTINEL: &str = "local";

// ── Privilege ─────────────────────────────────────────────────────

/// Privilege level an attacker holds on a system.
///
/// Totally ordered by [`Privilege::rank`]: `None < User < Admin`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Privilege {
    #[default]
    None,
    User,
    Admin,
}

impl Privilege {
    /// Numeric rank used for every privilege comparison.
    pub fn rank(self) -> u8 {
        match self {
            Self::None => 0,
            Self::User => 1,
            Self::Admin => 2,
        }
    }

    /// True if `self` is strictly higher than `other`.
    pub fn outranks(self, other: Privilege) -> bool {
        self.rank() > other.rank()
    }

    /// True if `self` meets or exceeds `required`.
    pub fn satisfies(self, required: Privilege) -> bool {
        self.rank() >= required.rank()
    }
}

impl PartialOrd for Privilege {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Privilege {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl fmt::Display for Privilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "NONE",
            Self::User => "USER",
            Self::Admin => "ADMIN",
        };
        f.write_str(s)
    }
}

// ── Reuse Policy ──────────────────────────────────────────────────

/// How often an exploit may be successfully applied within one chain.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReusePolicy {
    /// No restriction.
    #[default]
    Unlimited,
    /// At most once against each distinct target system.
    OncePerSystem,
    /// At most `limit` successful uses across the whole chain.
    /// A limit of zero or below means the exploit is never usable.
    Limited { limit: i64 },
}

// ── Service Requirement ───────────────────────────────────────────

/// The service an exploit needs on its target.
///
/// Serialized as a plain string; [`LOCAL_SENTINEL`] denotes a local
/// privilege-escalation exploit applied to the attacker's current system.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ServiceRequirement {
    Local,
    Service(String),
}

impl ServiceRequirement {
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local)
    }

    /// The service name for lateral exploits, `None` for local ones.
    pub fn service(&self) -> Option<&str> {
        match self {
            Self::Local => None,
            Self::Service(s) => Some(s),
        }
    }

    /// The identifier recorded on a hop: the service or the local sentinel.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Local => LOCAL_SENTINEL,
            Self::Service(s) => s,
        }
    }
}

impl From<String> for ServiceRequirement {
    fn from(s: String) -> Self {
        if s == LOCAL_SENTINEL {
            Self::Local
        } else {
            Self::Service(s)
        }
    }
}

impl From<&str> for ServiceRequirement {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<ServiceRequirement> for String {
    fn from(req: ServiceRequirement) -> Self {
        match req {
            ServiceRequirement::Local => LOCAL_SENTINEL.to_string(),
            ServiceRequirement::Service(s) => s,
        }
    }
}

impl fmt::Display for ServiceRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Systems and Routes ────────────────────────────────────────────

/// A directed network edge permitting traffic for a set of services.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Route {
    /// Source system. Implied by the owning system when omitted.
    #[serde(default)]
    pub from: String,
    pub to: String,
    /// Services this edge lets through, independent of what `to` exposes.
    #[serde(default)]
    pub allow: BTreeSet<String>,
}

impl Route {
    pub fn new(from: &str, to: &str, allow: &[&str]) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            allow: allow.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn allows(&self, service: &str) -> bool {
        self.allow.contains(service)
    }
}

/// A host in the modeled network.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct System {
    pub name: String,
    #[serde(default)]
    pub os: String,
    #[serde(default)]
    pub services: BTreeSet<String>,
    #[serde(default)]
    pub creds: BTreeSet<String>,
    /// Privilege an attacker holds here before any exploit.
    #[serde(rename = "priv", default)]
    pub privilege: Privilege,
    #[serde(default)]
    pub routes: Vec<Route>,
}

impl System {
    pub fn new(name: &str, os: &str) -> Self {
        Self {
            name: name.to_string(),
            os: os.to_string(),
            services: BTreeSet::new(),
            creds: BTreeSet::new(),
            privilege: Privilege::None,
            routes: Vec::new(),
        }
    }

    pub fn with_services(mut self, services: &[&str]) -> Self {
        self.services.extend(services.iter().map(|s| s.to_string()));
        self
    }

    pub fn with_creds(mut self, creds: &[&str]) -> Self {
        self.creds.extend(creds.iter().map(|s| s.to_string()));
        self
    }

    pub fn with_privilege(mut self, privilege: Privilege) -> Self {
        self.privilege = privilege;
        self
    }

    /// Add an outbound route from this system.
    pub fn with_route(mut self, to: &str, allow: &[&str]) -> Self {
        let route = Route::new(&self.name, to, allow);
        self.routes.push(route);
        self
    }

    pub fn exposes(&self, service: &str) -> bool {
        self.services.contains(service)
    }
}

// ── Exploits ──────────────────────────────────────────────────────

/// An entry of the exploit catalog: preconditions plus effects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Exploit {
    pub name: String,
    pub required_service: ServiceRequirement,
    pub required_priv_on_source: Privilege,
    /// Prefix at least one held credential must start with.
    #[serde(default)]
    pub required_cred_tag: Option<String>,
    /// Substring the target's OS descriptor must contain.
    #[serde(default)]
    pub os_contains: Option<String>,
    #[serde(default)]
    pub gain_priv_on_target: Option<Privilege>,
    /// Harvest every credential present on the target.
    #[serde(default)]
    pub add_creds_on_target: bool,
    #[serde(default)]
    pub reuse_policy: ReusePolicy,
}

impl Exploit {
    /// A local exploit with no preconditions and no effects.
    pub fn local(name: &str) -> Self {
        Self::new(name, ServiceRequirement::Local)
    }

    /// A lateral exploit over `service` with no preconditions and no effects.
    pub fn lateral(name: &str, service: &str) -> Self {
        Self::new(name, ServiceRequirement::Service(service.to_string()))
    }

    fn new(name: &str, required_service: ServiceRequirement) -> Self {
        Self {
            name: name.to_string(),
            required_service,
            required_priv_on_source: Privilege::None,
            required_cred_tag: None,
            os_contains: None,
            gain_priv_on_target: None,
            add_creds_on_target: false,
            reuse_policy: ReusePolicy::Unlimited,
        }
    }

    pub fn requires_priv(mut self, privilege: Privilege) -> Self {
        self.required_priv_on_source = privilege;
        self
    }

    pub fn requires_cred_tag(mut self, tag: &str) -> Self {
        self.required_cred_tag = Some(tag.to_string());
        self
    }

    pub fn requires_os(mut self, fragment: &str) -> Self {
        self.os_contains = Some(fragment.to_string());
        self
    }

    pub fn grants(mut self, privilege: Privilege) -> Self {
        self.gain_priv_on_target = Some(privilege);
        self
    }

    pub fn harvests_creds(mut self) -> Self {
        self.add_creds_on_target = true;
        self
    }

    pub fn with_reuse(mut self, policy: ReusePolicy) -> Self {
        self.reuse_policy = policy;
        self
    }

    pub fn is_local(&self) -> bool {
        self.required_service.is_local()
    }
}
