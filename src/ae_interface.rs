//! Shared Domain Vocabulary
//!
//! Types used across the topology generator and the convergence analysis
//! engine: hosts and their derived regions, write identities, and the
//! per-replica visibility observations the analyzer consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Process id a replica runs under, derived from its host name.
pub type Pid = u64;

// ============================================================================
// Configuration Errors
// ============================================================================

/// Errors raised while interpreting configuration inputs.
///
/// These are fatal to the call that produced them; per-record parse
/// failures during log ingestion never surface through this type.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Textual boolean that matches none of the accepted encodings
    #[error("invalid boolean value '{0}'")]
    InvalidBool(String),

    /// Host name that does not follow the `site-region-NN` convention
    #[error("cannot derive a region from host name '{0}'")]
    NoRegion(String),

    /// Host name whose trailing segment is not a numeric process id
    #[error("cannot derive a process id from host name '{0}'")]
    NoPid(String),
}

/// Parse a textual boolean the one way the whole crate accepts.
///
/// Accepts `y`, `yes`, `t`, `true`, `on`, `1` and `n`, `no`, `f`, `false`,
/// `off`, `0`, ignoring case and surrounding whitespace. Anything else is
/// a `ConfigError`, never a silent default.
pub fn parse_bool(text: &str) -> Result<bool, ConfigError> {
    match text.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" | "t" | "true" | "on" | "1" => Ok(true),
        "n" | "no" | "f" | "false" | "off" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidBool(text.to_string())),
    }
}

// ============================================================================
// Hosts and Regions
// ============================================================================

/// Derive the region label from a logical host name.
///
/// The region is the set of `-`-delimited tokens between the first and
/// last segment, joined with spaces: `bbc-virginia-03` is in `virginia`,
/// `bbc-sao-paulo-01` is in `sao paulo`. Returns `None` when the name has
/// no middle segments.
pub fn derive_region(name: &str) -> Option<String> {
    let parts: Vec<&str> = name.split('-').collect();
    if parts.len() < 3 {
        return None;
    }
    Some(parts[1..parts.len() - 1].join(" "))
}

/// Derive the replica process id from a logical host name.
///
/// The trailing `-`-delimited segment is the process id:
/// `bbc-virginia-03` runs as pid 3.
pub fn derive_pid(name: &str) -> Option<Pid> {
    name.rsplit('-').next()?.parse().ok()
}

/// A physical machine the experiment can place work on.
///
/// Immutable once loaded; the registry builds these at startup and no
/// component mutates them afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Host {
    /// Logical name, the key the registry and all reports use
    pub name: String,

    /// Physical address the external launcher connects to
    pub hostname: String,

    /// Region derived from the logical name
    pub region: String,
}

impl Host {
    /// Build a host, deriving its region from the logical name.
    pub fn new(name: impl Into<String>, hostname: impl Into<String>) -> Result<Self, ConfigError> {
        let name = name.into();
        let region = derive_region(&name).ok_or_else(|| ConfigError::NoRegion(name.clone()))?;
        Ok(Host {
            name,
            hostname: hostname.into(),
            region,
        })
    }
}

// ============================================================================
// Write Identity and Visibility Observations
// ============================================================================

/// Identity of a single write: the key plus the canonical text of the
/// version number the store assigned to it.
///
/// The version is kept as its canonical decimal text because grouping and
/// report ordering are defined over the `(key, version-text)` string pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WriteIdentity {
    pub key: String,
    pub version: String,
}

impl WriteIdentity {
    pub fn new(key: impl Into<String>, version: impl Into<String>) -> Self {
        WriteIdentity {
            key: key.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for WriteIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.key, self.version)
    }
}

/// One replica's report that it has seen a particular write.
///
/// Produced by ingestion from a replica's visibility log; a host may
/// report the same write more than once and every occurrence is valid
/// evidence of replication.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibilityRecord {
    /// Key that was written
    pub key: String,

    /// Canonical text of the version number
    pub version: String,

    /// When this host first logged the write
    pub timestamp: DateTime<Utc>,

    /// Logical name of the observing host
    pub host: String,
}

impl VisibilityRecord {
    /// The write this observation is evidence for.
    pub fn identity(&self) -> WriteIdentity {
        WriteIdentity::new(self.key.clone(), self.version.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_from_simple_name() {
        assert_eq!(derive_region("bbc-virginia-03"), Some("virginia".to_string()));
    }

    #[test]
    fn test_region_joins_middle_segments() {
        assert_eq!(derive_region("bbc-sao-paulo-01"), Some("sao paulo".to_string()));
    }

    #[test]
    fn test_region_requires_middle_segments() {
        assert_eq!(derive_region("localhost"), None);
        assert_eq!(derive_region("nevis-01"), None);
    }

    #[test]
    fn test_region_is_deterministic() {
        // Identical names always yield identical regions
        let a = derive_region("bbc-oregon-11");
        let b = derive_region("bbc-oregon-11");
        assert_eq!(a, b);
    }

    #[test]
    fn test_pid_from_trailing_segment() {
        assert_eq!(derive_pid("bbc-virginia-03"), Some(3));
        assert_eq!(derive_pid("bbc-virginia-three"), None);
    }

    #[test]
    fn test_host_new_rejects_regionless_name() {
        let err = Host::new("nevis", "nevis.cs.umd.edu").unwrap_err();
        assert_eq!(err, ConfigError::NoRegion("nevis".to_string()));
    }

    #[test]
    fn test_parse_bool_accepted_encodings() {
        assert_eq!(parse_bool(" On "), Ok(true));
        assert_eq!(parse_bool("YES"), Ok(true));
        assert_eq!(parse_bool("1"), Ok(true));
        assert_eq!(parse_bool("off"), Ok(false));
        assert_eq!(parse_bool("F"), Ok(false));
        assert_eq!(parse_bool("0"), Ok(false));
    }

    #[test]
    fn test_parse_bool_rejects_everything_else() {
        assert!(parse_bool("maybe").is_err());
        assert!(parse_bool("").is_err());
    }

    #[test]
    fn test_write_identity_orders_by_version_text() {
        // Version text ordering, not numeric: "10" sorts before "2"
        let a = WriteIdentity::new("FOO", "10");
        let b = WriteIdentity::new("FOO", "2");
        assert!(a < b);
    }
}
