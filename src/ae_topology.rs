//! Experiment Topology Generator
//!
//! Assigns replica and client roles to registry hosts, region by region,
//! and binds the peer-selection bandit strategy the replicas gossip with.
//! Generation is a one-shot, side-effect-free computation: it either
//! produces a complete [`ExperimentConfig`] or fails a pre-flight check
//! before any remote action is attempted.

use crate::ae_interface::{derive_pid, Pid};
use crate::ae_registry::HostRegistry;
use indexmap::IndexMap;
use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Port replicas listen on for anti-entropy gossip.
pub const DEFAULT_PEER_PORT: u16 = 3264;

// ============================================================================
// Errors
// ============================================================================

/// Fatal pre-flight failures of topology generation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TopologyError {
    /// A region cannot supply the requested number of hosts for a role
    #[error("not enough hosts in {region} for {requested} {role}s ({available} available)")]
    Capacity {
        region: String,
        role: &'static str,
        requested: usize,
        available: usize,
    },

    /// Epsilon-greedy selected with an epsilon outside (0, 1]
    #[error("epsilon must be in (0, 1], got {0}")]
    InvalidEpsilon(f64),

    /// A selected replica's name does not yield a process id
    #[error("cannot derive a process id from host name '{0}'")]
    HostPid(String),
}

// ============================================================================
// Bandit Strategy
// ============================================================================

/// Peer-selection policy the replicas use for anti-entropy exchange.
///
/// Exactly one strategy is bound per experiment; the variant carries its
/// own parameters, so an invalid combination (epsilon without
/// epsilon-greedy, or two strategies at once) cannot be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "kebab-case")]
pub enum BanditStrategy {
    /// Uniform random peer selection
    Uniform,

    /// Annealing exploration schedule
    Annealing,

    /// Epsilon-greedy with a fixed exploration rate in (0, 1]
    EpsilonGreedy { epsilon: f64 },
}

impl BanditStrategy {
    /// Build an epsilon-greedy strategy, validating the exploration rate.
    pub fn epsilon_greedy(epsilon: f64) -> Result<Self, TopologyError> {
        let strategy = BanditStrategy::EpsilonGreedy { epsilon };
        strategy.validate()?;
        Ok(strategy)
    }

    /// Re-check parameter ranges; deserialized values come through here too.
    pub fn validate(&self) -> Result<(), TopologyError> {
        if let BanditStrategy::EpsilonGreedy { epsilon } = *self {
            if !(epsilon > 0.0 && epsilon <= 1.0) {
                return Err(TopologyError::InvalidEpsilon(epsilon));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Requests and Generated Configuration
// ============================================================================

/// What the operator asked for: counts per region, an optional region
/// subset, and the bandit strategy.
#[derive(Debug, Clone)]
pub struct TopologyRequest {
    /// Replicas per selected region; zero is legal and yields no replicas
    pub replicas: usize,

    /// Clients per selected region; zero is legal and yields no clients
    pub clients: usize,

    /// Regions to place on; `None` selects every registry region
    pub regions: Option<Vec<String>>,

    /// Peer-selection strategy to bind
    pub bandit: BanditStrategy,

    /// Gossip port used when building replica peer lists
    pub peer_port: u16,
}

impl TopologyRequest {
    pub fn new(replicas: usize, clients: usize, bandit: BanditStrategy) -> Self {
        TopologyRequest {
            replicas,
            clients,
            regions: None,
            bandit,
            peer_port: DEFAULT_PEER_PORT,
        }
    }
}

/// One replica's launch assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicaAssignment {
    /// Logical host name
    pub host: String,

    /// Physical address
    pub hostname: String,

    /// Process id, the trailing numeric segment of the logical name
    pub pid: Pid,

    /// Gossip addresses of every other replica, `hostname:port`
    pub peers: Vec<String>,
}

/// The structured configuration an experiment is launched with.
///
/// Consumed by an external process-launch collaborator; flag names and
/// command syntax are its concern, not this crate's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Peer-selection strategy for every replica
    pub bandit: BanditStrategy,

    /// Replica assignments in selection order
    pub replicas: Vec<ReplicaAssignment>,

    /// Client host to workload label, in selection order
    pub clients: IndexMap<String, char>,
}

// ============================================================================
// Generation
// ============================================================================

/// Label for the i-th selected client: `A` through `Z`, wrapping after 26.
///
/// The index runs across all regions in selection order, never resetting
/// per region, so labeling is stable for a fixed region processing order.
pub fn client_label(index: usize) -> char {
    (b'A' + (index % 26) as u8) as char
}

/// Number of workload items host `idx` receives when splitting `n` items
/// round-robin across `hosts` ordered hosts.
///
/// Every host gets `n / hosts`, and the first `n % hosts` hosts get one
/// extra, so the counts differ by at most one.
pub fn round_robin_share(n: usize, idx: usize, hosts: usize) -> usize {
    if hosts == 0 {
        return 0;
    }
    n / hosts + usize::from(idx < n % hosts)
}

/// Generate an experiment topology from the registry and a request.
///
/// Regions are processed in ascending name order. Within a region the
/// first `replicas` hosts (registry order) become replicas and the first
/// `clients` hosts become clients; a host may hold both roles when the
/// requested counts make the prefixes overlap. Fails with a capacity
/// error if any selected region cannot supply a requested count; a
/// region absent from the registry simply has zero hosts available.
pub fn generate(
    registry: &HostRegistry,
    request: &TopologyRequest,
) -> Result<ExperimentConfig, TopologyError> {
    request.bandit.validate()?;

    // Fixed alphabetical region processing order for reproducible output.
    let mut regions = match &request.regions {
        Some(subset) => subset.clone(),
        None => registry.regions(),
    };
    regions.sort();
    regions.dedup();

    let mut replica_hosts = Vec::new();
    let mut client_hosts = Vec::new();

    for region in &regions {
        let available = registry.hosts_in_region(region);

        if request.replicas > available.len() {
            return Err(TopologyError::Capacity {
                region: region.clone(),
                role: "replica",
                requested: request.replicas,
                available: available.len(),
            });
        }

        if request.clients > available.len() {
            return Err(TopologyError::Capacity {
                region: region.clone(),
                role: "client",
                requested: request.clients,
                available: available.len(),
            });
        }

        replica_hosts.extend(available[..request.replicas].iter().copied());
        client_hosts.extend(available[..request.clients].iter().copied());
    }

    // Replica assignments need the full replica set for their peer lists.
    let mut replicas = Vec::with_capacity(replica_hosts.len());
    for host in &replica_hosts {
        let pid = derive_pid(&host.name).ok_or_else(|| TopologyError::HostPid(host.name.clone()))?;
        let peers = replica_hosts
            .iter()
            .filter(|peer| peer.name != host.name)
            .map(|peer| format!("{}:{}", peer.hostname, request.peer_port))
            .collect();

        replicas.push(ReplicaAssignment {
            host: host.name.clone(),
            hostname: host.hostname.clone(),
            pid,
            peers,
        });
    }

    let clients: IndexMap<String, char> = client_hosts
        .iter()
        .enumerate()
        .map(|(idx, host)| (host.name.clone(), client_label(idx)))
        .collect();

    info!(
        "generated topology: {} replicas, {} clients across {} regions",
        replicas.len(),
        clients.len(),
        regions.len()
    );

    Ok(ExperimentConfig {
        bandit: request.bandit,
        replicas,
        clients,
    })
}
