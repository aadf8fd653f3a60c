//! # entropy-lab - Anti-Entropy Experiment Analysis
//!
//! Core engine for running convergence experiments against an
//! anti-entropy replicated key-value store. The store itself, remote
//! command execution, and file transfer live outside this crate; what
//! lives here is everything an experiment needs before launch and after
//! log collection:
//!
//! ## Core Components
//!
//! - **HostRegistry**: immutable logical-host to hostname/region mapping
//! - **TopologyGenerator**: replica/client placement across regions plus
//!   the bandit peer-selection strategy, emitted as an `ExperimentConfig`
//! - **ObservationIngestion**: per-host visibility logs (newline-delimited
//!   JSON) into `VisibilityRecord`s, tolerating truncated logs
//! - **ConvergenceAnalyzer**: per-write replication counts, visibility
//!   percentages, and convergence latency
//! - **Report rows**: renderer-ready ordered rows with region breakdowns
//! - **KeyLatestResolver**: max-version resolution of a key across hosts
//!
//! ## Usage
//!
//! ```no_run
//! use ae_lab::{ae_convergence, ae_ingest, ae_registry::HostRegistry, ae_report};
//!
//! let registry = HostRegistry::from_pairs([
//!     ("bbc-virginia-01", "virginia-01.example.com"),
//!     ("bbc-virginia-02", "virginia-02.example.com"),
//! ]).unwrap();
//!
//! // One log per host, fetched by the external collaborator
//! let log = r#"{"Key": "FOO", "Version": 1, "Timestamp": "2017-06-14T09:30:00-04:00"}"#;
//! let records: Vec<_> = ae_ingest::ingest_lines("bbc-virginia-01", log.lines()).collect();
//!
//! let analysis = ae_convergence::analyze(records, registry.len()).unwrap();
//! for row in ae_report::report_rows(&analysis, &registry) {
//!     println!("{}", row);
//! }
//! ```

// Domain vocabulary and configuration parsing
pub mod ae_interface;

// Experiment setup
pub mod ae_registry;
pub mod ae_topology;

// Analysis engine
pub mod ae_convergence;
pub mod ae_ingest;
pub mod ae_report;
pub mod ae_resolver;

// Benchmark workload support
pub mod ae_throughput;
pub mod ae_workload;

// Re-export commonly used types
pub use ae_convergence::{analyze, AnalysisError, ConvergenceAnalysis, VisibilityGroup};
pub use ae_interface::{parse_bool, ConfigError, Host, VisibilityRecord, WriteIdentity};
pub use ae_registry::HostRegistry;
pub use ae_report::{report_rows, summarize_regions, ReportRow};
pub use ae_resolver::{resolve_latest, KeyResolution};
pub use ae_topology::{
    generate, BanditStrategy, ExperimentConfig, TopologyError, TopologyRequest,
};
