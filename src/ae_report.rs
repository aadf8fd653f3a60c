//! Visibility Report Rows
//!
//! Turns a [`ConvergenceAnalysis`] into the ordered rows an external
//! renderer consumes, and produces the per-region breakdown that makes
//! hotspot regions visually prominent. This module owns the numeric
//! precision contract (two decimal digits on percentages and latencies);
//! it never changes the analyzer's numbers, only presents them.

use crate::ae_convergence::ConvergenceAnalysis;
use crate::ae_interface::{derive_region, WriteIdentity};
use crate::ae_registry::HostRegistry;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// Region Summarizer
// ============================================================================

/// Count the hosts that observed a write by region.
///
/// Returns `(region, count)` pairs sorted descending by count, ties broken
/// by region name ascending. Hosts the registry does not know are counted
/// under the region derived from their own name.
pub fn summarize_regions<'a>(
    hosts: impl IntoIterator<Item = &'a str>,
    registry: &HostRegistry,
) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for host in hosts {
        let region = registry
            .region_of(host)
            .map(str::to_string)
            .or_else(|| derive_region(host))
            .unwrap_or_else(|| host.to_string());
        *counts.entry(region).or_insert(0) += 1;
    }

    let mut breakdown: Vec<(String, usize)> = counts.into_iter().collect();
    breakdown.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    breakdown
}

// ============================================================================
// Report Rows
// ============================================================================

/// Round to the report's canonical two decimal digits.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// One row of the visibility report, in renderer-ready order.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    /// The write the row describes
    pub identity: WriteIdentity,

    /// Distinct hosts that observed the write
    pub replicated: usize,

    /// Percentage of the cluster that observed it, two decimals
    pub visibility_pct: f64,

    /// Seconds between first and last observation, two decimals
    pub latency_seconds: f64,

    /// First observation across the cluster
    pub created: DateTime<Utc>,

    /// Last first-observation across the cluster
    pub updated: DateTime<Utc>,

    /// Region breakdown, descending by count
    pub regions: Vec<(String, usize)>,
}

impl fmt::Display for ReportRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let regions = self
            .regions
            .iter()
            .map(|(region, count)| format!("{}: {}", region, count))
            .collect::<Vec<_>>()
            .join(", ");

        write!(
            f,
            "{} replicated={} visibility={:.2}% latency={:.2}s created={} updated={} regions=[{}]",
            self.identity,
            self.replicated,
            self.visibility_pct,
            self.latency_seconds,
            self.created.to_rfc3339(),
            self.updated.to_rfc3339(),
            regions,
        )
    }
}

/// Build report rows from an analysis, keeping its sorted order.
pub fn report_rows(analysis: &ConvergenceAnalysis, registry: &HostRegistry) -> Vec<ReportRow> {
    analysis
        .groups
        .iter()
        .map(|group| ReportRow {
            identity: group.identity.clone(),
            replicated: group.replicated(),
            visibility_pct: round2(group.visibility_pct(analysis.total_hosts)),
            latency_seconds: round2(group.latency_seconds()),
            created: group.created,
            updated: group.updated,
            regions: summarize_regions(group.hosts(), registry),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ae_convergence::analyze;
    use crate::ae_interface::VisibilityRecord;
    use chrono::{Duration, TimeZone};

    fn registry() -> HostRegistry {
        HostRegistry::from_pairs([
            ("bbc-virginia-01", "virginia-01.example.com"),
            ("bbc-virginia-02", "virginia-02.example.com"),
            ("bbc-oregon-01", "oregon-01.example.com"),
            ("bbc-tokyo-01", "tokyo-01.example.com"),
        ])
        .unwrap()
    }

    fn record(host: &str, key: &str, offset_secs: i64) -> VisibilityRecord {
        let base = Utc.with_ymd_and_hms(2017, 6, 14, 12, 0, 0).unwrap();
        VisibilityRecord {
            key: key.to_string(),
            version: "1".to_string(),
            timestamp: base + Duration::seconds(offset_secs),
            host: host.to_string(),
        }
    }

    #[test]
    fn test_breakdown_descending_by_count() {
        let reg = registry();
        let hosts = ["bbc-virginia-01", "bbc-virginia-02", "bbc-oregon-01"];
        let breakdown = summarize_regions(hosts, &reg);
        assert_eq!(
            breakdown,
            vec![("virginia".to_string(), 2), ("oregon".to_string(), 1)]
        );
    }

    #[test]
    fn test_breakdown_ties_break_by_region_name() {
        let reg = registry();
        let hosts = ["bbc-tokyo-01", "bbc-oregon-01"];
        let breakdown = summarize_regions(hosts, &reg);
        assert_eq!(
            breakdown,
            vec![("oregon".to_string(), 1), ("tokyo".to_string(), 1)]
        );
    }

    #[test]
    fn test_unregistered_host_uses_derived_region() {
        let reg = registry();
        let breakdown = summarize_regions(["bbc-ireland-07"], &reg);
        assert_eq!(breakdown, vec![("ireland".to_string(), 1)]);
    }

    #[test]
    fn test_rows_carry_two_decimal_precision() {
        let reg = registry();
        let records = vec![record("bbc-virginia-01", "FOO", 0)];
        let analysis = analyze(records, 3).unwrap();
        let rows = report_rows(&analysis, &reg);

        // 100/3 rounds to the canonical two decimals
        assert_eq!(rows[0].visibility_pct, 33.33);
        assert_eq!(rows[0].latency_seconds, 0.0);
    }

    #[test]
    fn test_row_display_is_plain_ordered_fields() {
        let reg = registry();
        let records = vec![
            record("bbc-virginia-01", "FOO", 0),
            record("bbc-virginia-02", "FOO", 1),
            record("bbc-oregon-01", "FOO", 3),
        ];
        let analysis = analyze(records, 4).unwrap();
        let rows = report_rows(&analysis, &reg);
        let line = rows[0].to_string();

        assert!(line.starts_with("FOO-1 replicated=3"));
        assert!(line.contains("visibility=75.00%"));
        assert!(line.contains("latency=3.00s"));
        assert!(line.contains("regions=[virginia: 2, oregon: 1]"));
    }

    #[test]
    fn test_rows_keep_analysis_order() {
        let reg = registry();
        let records = vec![
            record("bbc-virginia-01", "ZED", 0),
            record("bbc-virginia-01", "ACK", 0),
        ];
        let analysis = analyze(records, 4).unwrap();
        let rows = report_rows(&analysis, &reg);
        assert_eq!(rows[0].identity.key, "ACK");
        assert_eq!(rows[1].identity.key, "ZED");
    }
}
