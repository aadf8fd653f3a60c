//! Convergence Analyzer
//!
//! Groups visibility records from every host in the experiment by write
//! identity and computes how far and how fast each write propagated:
//! distinct-replica counts, visibility percentage, and the latency between
//! a write's first and last observation across the cluster.
//!
//! The input is already-collected, in-memory data; the analyzer never
//! waits on the network. Records from independent host logs can be
//! ingested concurrently and merged by concatenation before analysis;
//! ordering is only guaranteed on the sorted output.

use crate::ae_interface::{VisibilityRecord, WriteIdentity};
use chrono::{DateTime, Duration, Utc};
use hashbrown::HashMap;
use log::debug;
use std::collections::BTreeMap;
use thiserror::Error;

/// Fatal analysis configuration failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// Visibility percentage has no meaning without any hosts
    #[error("visibility percentage is undefined for a cluster of zero hosts")]
    ZeroHosts,
}

// ============================================================================
// Visibility Groups
// ============================================================================

/// All evidence for one write: the earliest observation from each host
/// that saw it.
///
/// Invariants: at least one observation; `created <= updated`; duplicate
/// reports from a host collapse to its earliest timestamp, so they never
/// inflate the replica count or stretch the latency window.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibilityGroup {
    /// The write this group describes
    pub identity: WriteIdentity,

    /// First observation per host, ordered by host name
    pub observations: BTreeMap<String, DateTime<Utc>>,

    /// Earliest observation across all hosts
    pub created: DateTime<Utc>,

    /// Latest first-observation across all hosts
    pub updated: DateTime<Utc>,
}

impl VisibilityGroup {
    /// Number of distinct hosts that observed the write.
    pub fn replicated(&self) -> usize {
        self.observations.len()
    }

    /// Fraction of the cluster that observed the write, as a percentage.
    pub fn visibility_pct(&self, total_hosts: usize) -> f64 {
        100.0 * self.replicated() as f64 / total_hosts as f64
    }

    /// Elapsed time between the first and last observation; zero when the
    /// whole cluster saw the write simultaneously.
    pub fn latency(&self) -> Duration {
        self.updated - self.created
    }

    /// Latency in seconds, for report rows.
    pub fn latency_seconds(&self) -> f64 {
        let latency = self.latency();
        match latency.num_microseconds() {
            Some(us) => us as f64 / 1_000_000.0,
            None => latency.num_milliseconds() as f64 / 1_000.0,
        }
    }

    /// Hosts that observed the write, in name order.
    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.observations.keys().map(|h| h.as_str())
    }
}

// ============================================================================
// Analysis
// ============================================================================

/// Result of analyzing one experiment's merged visibility logs.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvergenceAnalysis {
    /// Total replicas in the experiment, the base for percentages
    pub total_hosts: usize,

    /// One group per distinct write, sorted by `(key, version)` text
    pub groups: Vec<VisibilityGroup>,
}

/// Group records by write identity and compute per-write convergence.
///
/// `total_hosts` is the experiment's replica count N; zero hosts is a
/// configuration error, not a divisor. Output is sorted ascending by the
/// `(key, version-text)` pair so reports are reproducible across runs.
/// A write observed by a single host stays in the output: partial
/// replication is the primary signal under study.
pub fn analyze(
    records: impl IntoIterator<Item = VisibilityRecord>,
    total_hosts: usize,
) -> Result<ConvergenceAnalysis, AnalysisError> {
    if total_hosts == 0 {
        return Err(AnalysisError::ZeroHosts);
    }

    // First observation per host, per write.
    let mut writes: HashMap<WriteIdentity, BTreeMap<String, DateTime<Utc>>> = HashMap::new();
    for record in records {
        let identity = WriteIdentity::new(record.key, record.version);
        writes
            .entry(identity)
            .or_default()
            .entry(record.host)
            .and_modify(|seen| {
                if record.timestamp < *seen {
                    *seen = record.timestamp;
                }
            })
            .or_insert(record.timestamp);
    }

    let mut groups = Vec::with_capacity(writes.len());
    for (identity, observations) in writes {
        let created = observations.values().min().copied();
        let updated = observations.values().max().copied();
        if let (Some(created), Some(updated)) = (created, updated) {
            groups.push(VisibilityGroup {
                identity,
                observations,
                created,
                updated,
            });
        }
    }

    groups.sort_by(|a, b| a.identity.cmp(&b.identity));
    debug!(
        "analyzed {} distinct writes across {} hosts",
        groups.len(),
        total_hosts
    );

    Ok(ConvergenceAnalysis {
        total_hosts,
        groups,
    })
}
