//! Host Registry
//!
//! Static mapping from logical host names to physical hostnames and their
//! derived regions. Built once at startup, read-only thereafter, and
//! passed explicitly into every component that needs host information;
//! there is no ambient global host table.

use crate::ae_interface::{ConfigError, Host};
use indexmap::IndexMap;
use log::debug;
use serde::Deserialize;
use thiserror::Error;

/// Errors raised while loading the registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The hosts file is not well-formed YAML
    #[error("malformed hosts file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// An entry's logical name violates the naming convention
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// On-disk shape of one hosts-file entry.
#[derive(Debug, Deserialize)]
struct HostEntry {
    hostname: String,
}

/// Immutable registry of experiment hosts.
///
/// Iteration order is the insertion order of the source, and that order is
/// a contract: the topology generator selects "the first R hosts" by it.
#[derive(Debug, Clone, Default)]
pub struct HostRegistry {
    hosts: IndexMap<String, Host>,
}

impl HostRegistry {
    /// Build a registry from already-constructed hosts, keeping their order.
    pub fn from_hosts(hosts: impl IntoIterator<Item = Host>) -> Self {
        let hosts = hosts
            .into_iter()
            .map(|h| (h.name.clone(), h))
            .collect::<IndexMap<_, _>>();
        HostRegistry { hosts }
    }

    /// Build a registry from `(logical name, hostname)` pairs.
    pub fn from_pairs<N, H>(pairs: impl IntoIterator<Item = (N, H)>) -> Result<Self, ConfigError>
    where
        N: Into<String>,
        H: Into<String>,
    {
        let mut hosts = IndexMap::new();
        for (name, hostname) in pairs {
            let host = Host::new(name, hostname)?;
            hosts.insert(host.name.clone(), host);
        }
        Ok(HostRegistry { hosts })
    }

    /// Load a registry from hosts-file YAML: a mapping from logical name
    /// to `{hostname: ...}`.
    pub fn from_yaml(text: &str) -> Result<Self, RegistryError> {
        let entries: IndexMap<String, HostEntry> = serde_yaml::from_str(text)?;
        let mut hosts = IndexMap::with_capacity(entries.len());
        for (name, entry) in entries {
            let host = Host::new(name, entry.hostname)?;
            hosts.insert(host.name.clone(), host);
        }
        debug!("loaded {} hosts from registry", hosts.len());
        Ok(HostRegistry { hosts })
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// Look up a host by logical name.
    pub fn get(&self, name: &str) -> Option<&Host> {
        self.hosts.get(name)
    }

    /// All hosts in registry order.
    pub fn hosts(&self) -> impl Iterator<Item = &Host> {
        self.hosts.values()
    }

    /// All distinct regions in ascending name order.
    pub fn regions(&self) -> Vec<String> {
        let mut regions: Vec<String> = self.hosts.values().map(|h| h.region.clone()).collect();
        regions.sort();
        regions.dedup();
        regions
    }

    /// Hosts in the given region, in registry order.
    pub fn hosts_in_region(&self, region: &str) -> Vec<&Host> {
        self.hosts.values().filter(|h| h.region == region).collect()
    }

    /// Region of a registered host.
    pub fn region_of(&self, name: &str) -> Option<&str> {
        self.hosts.get(name).map(|h| h.region.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> HostRegistry {
        HostRegistry::from_pairs([
            ("bbc-virginia-01", "virginia-01.example.com"),
            ("bbc-virginia-02", "virginia-02.example.com"),
            ("bbc-oregon-01", "oregon-01.example.com"),
            ("bbc-sao-paulo-01", "sao-paulo-01.example.com"),
        ])
        .unwrap()
    }

    #[test]
    fn test_regions_sorted_and_deduped() {
        let reg = registry();
        assert_eq!(reg.regions(), vec!["oregon", "sao paulo", "virginia"]);
    }

    #[test]
    fn test_hosts_in_region_keep_registry_order() {
        let reg = registry();
        let names: Vec<&str> = reg
            .hosts_in_region("virginia")
            .iter()
            .map(|h| h.name.as_str())
            .collect();
        assert_eq!(names, vec!["bbc-virginia-01", "bbc-virginia-02"]);
    }

    #[test]
    fn test_from_yaml_preserves_order() {
        let text = "\
bbc-virginia-02:
  hostname: virginia-02.example.com
bbc-virginia-01:
  hostname: virginia-01.example.com
";
        let reg = HostRegistry::from_yaml(text).unwrap();
        let names: Vec<&str> = reg.hosts().map(|h| h.name.as_str()).collect();
        // File order, not alphabetical
        assert_eq!(names, vec!["bbc-virginia-02", "bbc-virginia-01"]);
    }

    #[test]
    fn test_from_yaml_rejects_regionless_name() {
        let text = "nevis:\n  hostname: nevis.cs.umd.edu\n";
        assert!(HostRegistry::from_yaml(text).is_err());
    }

    #[test]
    fn test_region_lookup() {
        let reg = registry();
        assert_eq!(reg.region_of("bbc-sao-paulo-01"), Some("sao paulo"));
        assert_eq!(reg.region_of("unknown-host-99"), None);
    }
}
