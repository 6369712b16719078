//! Indexed scenario representation and the JSON scenario document loader.
//!
//! A [`ScenarioDocument`] is the on-disk shape; [`ScenarioDocument::into_scenario`]
//! validates it and produces the immutable [`Scenario`] the search runs over.

use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::types::{Exploit, System};

/// A scenario as written in a JSON document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScenarioDocument {
    #[serde(default)]
    pub systems: Vec<System>,
    #[serde(default)]
    pub exploits: Vec<Exploit>,
}

impl ScenarioDocument {
    /// Parse a document from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse a document from any reader (file, stdin).
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Read and parse a document from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Validate the document and build the indexed scenario.
    ///
    /// Route sources are filled in from the owning system. Duplicate names,
    /// dangling routes, and routes claiming a foreign source are rejected.
    /// Exploits requiring a service no system exposes are only logged.
    pub fn into_scenario(self) -> Result<Scenario> {
        self.validate()?;

        let systems = self
            .systems
            .into_iter()
            .map(|mut system| {
                for route in &mut system.routes {
                    if route.from.is_empty() {
                        route.from = system.name.clone();
                    }
                }
                system
            })
            .collect();

        Ok(Scenario::new(systems, self.exploits))
    }

    fn validate(&self) -> Result<()> {
        let mut names = HashSet::with_capacity(self.systems.len());
        for system in &self.systems {
            if !names.insert(system.name.as_str()) {
                return Err(CoreError::DuplicateSystem {
                    name: system.name.clone(),
                });
            }
        }

        let mut exploit_names = HashSet::with_capacity(self.exploits.len());
        for exploit in &self.exploits {
            if !exploit_names.insert(exploit.name.as_str()) {
                return Err(CoreError::DuplicateExploit {
                    name: exploit.name.clone(),
                });
            }
        }

        for system in &self.systems {
            for route in &system.routes {
                if !route.from.is_empty() && route.from != system.name {
                    return Err(CoreError::RouteSourceMismatch {
                        owner: system.name.clone(),
                        from: route.from.clone(),
                    });
                }
                if !names.contains(route.to.as_str()) {
                    return Err(CoreError::DanglingRoute {
                        from: system.name.clone(),
                        to: route.to.clone(),
                    });
                }
            }
        }

        let exposed: HashSet<&str> = self
            .systems
            .iter()
            .flat_map(|s| s.services.iter().map(String::as_str))
            .collect();
        for exploit in &self.exploits {
            if let Some(service) = exploit.required_service.service() {
                if !exposed.contains(service) {
                    tracing::warn!(
                        exploit = %exploit.name,
                        service,
                        "Exploit requires a service no system exposes"
                    );
                }
            }
        }

        Ok(())
    }
}

/// The immutable input of a chain search.
///
/// Systems are looked up by name through a dense index; the exploit
/// catalog keeps its declared order.
#[derive(Debug, Clone)]
pub struct Scenario {
    systems: Vec<System>,
    exploits: Vec<Exploit>,
    index: HashMap<String, usize>,
}

impl Scenario {
    /// Build a scenario without validation.
    ///
    /// On duplicate system names the first declaration wins. Routes that
    /// point to undeclared systems are kept and never match during search.
    pub fn new(systems: Vec<System>, exploits: Vec<Exploit>) -> Self {
        let mut index = HashMap::with_capacity(systems.len());
        for (i, system) in systems.iter().enumerate() {
            index.entry(system.name.clone()).or_insert(i);
        }
        Self {
            systems,
            exploits,
            index,
        }
    }

    /// Parse and validate a scenario from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        ScenarioDocument::from_json_str(json)?.into_scenario()
    }

    /// Read, parse, and validate a scenario file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        ScenarioDocument::load(path)?.into_scenario()
    }

    pub fn system(&self, name: &str) -> Option<&System> {
        self.index.get(name).map(|&i| &self.systems[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn systems(&self) -> &[System] {
        &self.systems
    }

    /// The exploit catalog in declared order.
    pub fn exploits(&self) -> &[Exploit] {
        &self.exploits
    }

    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    pub fn route_count(&self) -> usize {
        self.systems.iter().map(|s| s.routes.len()).sum()
    }

    pub fn exploit_count(&self) -> usize {
        self.exploits.len()
    }
}
