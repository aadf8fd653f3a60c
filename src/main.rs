// Experiment CLI - topology generation and post-run analysis
//
// Usage:
//   entropy-lab topology hosts.yaml --replicas 3 --clients 1 --uniform
//   entropy-lab visibility data/ --hosts hosts.yaml
//   entropy-lab latest FOO responses.yaml
//   entropy-lab throughput data/bbc-virginia-01/metrics.csv

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process;

use log::info;
use simple_logger::SimpleLogger;

use ae_lab::ae_convergence::analyze;
use ae_lab::ae_ingest::ingest_log;
use ae_lab::ae_interface::parse_bool;
use ae_lab::ae_registry::HostRegistry;
use ae_lab::ae_report::report_rows;
use ae_lab::ae_resolver::resolve_latest;
use ae_lab::ae_throughput::{ingest_samples, summarize};
use ae_lab::ae_topology::{generate, BanditStrategy, TopologyRequest, DEFAULT_PEER_PORT};

fn usage() {
    eprintln!("Usage: entropy-lab <command> [options]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  topology <hosts.yaml>    generate an experiment topology");
    eprintln!("      --replicas N         replicas per region (default 3)");
    eprintln!("      --clients N          clients per region (default 1)");
    eprintln!("      --regions a,b        regions to use (default all)");
    eprintln!("      --uniform            uniform bandit");
    eprintln!("      --annealing          annealing bandit");
    eprintln!("      --epsilon E          epsilon-greedy bandit with rate E");
    eprintln!("      --port P             gossip port (default {})", DEFAULT_PEER_PORT);
    eprintln!("      --out PATH           write YAML here instead of stdout");
    eprintln!();
    eprintln!("  visibility <data-dir>    analyze per-host visibility logs");
    eprintln!("      --hosts PATH         hosts.yaml for region breakdowns");
    eprintln!("      --replicas N         total replica count (default: log count)");
    eprintln!("      --breakdown BOOL     include region breakdowns (default on)");
    eprintln!();
    eprintln!("  latest <key> <responses.yaml>   resolve a key's latest version");
    eprintln!("      --rows BOOL          print per-host rows (default on)");
    eprintln!();
    eprintln!("  throughput <file> [...]  summarize benchmark latency samples");
}

fn fatal(message: impl AsRef<str>) -> ! {
    eprintln!("Error: {}", message.as_ref());
    process::exit(1);
}

fn main() {
    SimpleLogger::new().init().unwrap();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        usage();
        process::exit(1);
    }

    match args[1].as_str() {
        "topology" => cmd_topology(&args[2..]),
        "visibility" => cmd_visibility(&args[2..]),
        "latest" => cmd_latest(&args[2..]),
        "throughput" => cmd_throughput(&args[2..]),
        other => {
            eprintln!("Unknown command '{}'", other);
            usage();
            process::exit(1);
        }
    }
}

// ============================================================================
// Argument Helpers
// ============================================================================

/// Value of the flag at `idx`, or exit with a message naming the flag.
fn flag_value<'a>(args: &'a [String], idx: usize) -> &'a str {
    match args.get(idx + 1) {
        Some(value) => value,
        None => fatal(format!("{} requires a value", args[idx])),
    }
}

fn parse_flag<T: std::str::FromStr>(args: &[String], idx: usize) -> T {
    let value = flag_value(args, idx);
    match value.parse() {
        Ok(parsed) => parsed,
        Err(_) => fatal(format!("invalid value '{}' for {}", value, args[idx])),
    }
}

fn bool_flag(args: &[String], idx: usize) -> bool {
    match parse_bool(flag_value(args, idx)) {
        Ok(value) => value,
        Err(err) => fatal(err.to_string()),
    }
}

fn load_registry(path: &str) -> HostRegistry {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => fatal(format!("failed to read {}: {}", path, err)),
    };
    match HostRegistry::from_yaml(&text) {
        Ok(registry) => registry,
        Err(err) => fatal(format!("failed to load {}: {}", path, err)),
    }
}

// ============================================================================
// topology
// ============================================================================

fn cmd_topology(args: &[String]) {
    let mut hosts_path: Option<&str> = None;
    let mut replicas = 3usize;
    let mut clients = 1usize;
    let mut regions: Option<Vec<String>> = None;
    let mut bandit: Option<BanditStrategy> = None;
    let mut port = DEFAULT_PEER_PORT;
    let mut out: Option<PathBuf> = None;

    // Exactly one bandit strategy may be selected.
    let select = |slot: &mut Option<BanditStrategy>, strategy: BanditStrategy| {
        if slot.is_some() {
            fatal("choose exactly one of --uniform, --annealing, --epsilon");
        }
        *slot = Some(strategy);
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--replicas" => {
                replicas = parse_flag(args, i);
                i += 2;
            }
            "--clients" => {
                clients = parse_flag(args, i);
                i += 2;
            }
            "--regions" => {
                let list = flag_value(args, i)
                    .split(',')
                    .map(|r| r.trim().to_string())
                    .filter(|r| !r.is_empty())
                    .collect();
                regions = Some(list);
                i += 2;
            }
            "--uniform" => {
                select(&mut bandit, BanditStrategy::Uniform);
                i += 1;
            }
            "--annealing" => {
                select(&mut bandit, BanditStrategy::Annealing);
                i += 1;
            }
            "--epsilon" => {
                let epsilon: f64 = parse_flag(args, i);
                match BanditStrategy::epsilon_greedy(epsilon) {
                    Ok(strategy) => select(&mut bandit, strategy),
                    Err(err) => fatal(err.to_string()),
                }
                i += 2;
            }
            "--port" => {
                port = parse_flag(args, i);
                i += 2;
            }
            "--out" => {
                out = Some(PathBuf::from(flag_value(args, i)));
                i += 2;
            }
            positional if hosts_path.is_none() && !positional.starts_with("--") => {
                hosts_path = Some(positional);
                i += 1;
            }
            other => fatal(format!("unexpected argument '{}'", other)),
        }
    }

    let hosts_path = hosts_path.unwrap_or_else(|| fatal("topology requires a hosts.yaml path"));
    let bandit = bandit
        .unwrap_or_else(|| fatal("choose exactly one of --uniform, --annealing, --epsilon"));

    let registry = load_registry(hosts_path);
    let mut request = TopologyRequest::new(replicas, clients, bandit);
    request.regions = regions;
    request.peer_port = port;

    let config = match generate(&registry, &request) {
        Ok(config) => config,
        Err(err) => fatal(err.to_string()),
    };

    let yaml = match serde_yaml::to_string(&config) {
        Ok(yaml) => yaml,
        Err(err) => fatal(format!("failed to serialize topology: {}", err)),
    };

    match out {
        Some(path) => {
            if let Err(err) = fs::write(&path, yaml) {
                fatal(format!("failed to write {}: {}", path.display(), err));
            }
            info!("wrote topology to {}", path.display());
        }
        None => print!("{}", yaml),
    }
}

// ============================================================================
// visibility
// ============================================================================

fn cmd_visibility(args: &[String]) {
    let mut data_dir: Option<&str> = None;
    let mut hosts_path: Option<&str> = None;
    let mut replicas: Option<usize> = None;
    let mut breakdown = true;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--hosts" => {
                hosts_path = Some(flag_value(args, i));
                i += 2;
            }
            "--replicas" => {
                replicas = Some(parse_flag(args, i));
                i += 2;
            }
            "--breakdown" => {
                breakdown = bool_flag(args, i);
                i += 2;
            }
            positional if data_dir.is_none() && !positional.starts_with("--") => {
                data_dir = Some(positional);
                i += 1;
            }
            other => fatal(format!("unexpected argument '{}'", other)),
        }
    }

    let data_dir = data_dir.unwrap_or_else(|| fatal("visibility requires a data directory"));
    let logs = find_logs(Path::new(data_dir));
    if logs.is_empty() {
        fatal(format!("no .jsonl logs found in {}", data_dir));
    }

    let mut records = Vec::new();
    for path in &logs {
        let host = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default()
            .to_string();
        let file = match fs::File::open(path) {
            Ok(file) => file,
            Err(err) => fatal(format!("failed to open {}: {}", path.display(), err)),
        };
        records.extend(ingest_log(&host, BufReader::new(file)));
    }
    info!("ingested {} records from {} host logs", records.len(), logs.len());

    let total_hosts = replicas.unwrap_or(logs.len());
    let analysis = match analyze(records, total_hosts) {
        Ok(analysis) => analysis,
        Err(err) => fatal(err.to_string()),
    };

    let registry = match hosts_path {
        Some(path) => load_registry(path),
        None => HostRegistry::default(),
    };

    for row in report_rows(&analysis, &registry) {
        if breakdown {
            println!("{}", row);
        } else {
            println!(
                "{} replicated={} visibility={:.2}% latency={:.2}s",
                row.identity, row.replicated, row.visibility_pct, row.latency_seconds
            );
        }
    }
}

/// All .jsonl files directly in the data directory, sorted by path.
fn find_logs(dir: &Path) -> Vec<PathBuf> {
    let mut logs = Vec::new();
    if let Ok(entries) = fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some("jsonl") {
                logs.push(path);
            }
        }
    }
    logs.sort();
    logs
}

// ============================================================================
// latest
// ============================================================================

fn cmd_latest(args: &[String]) {
    let mut positionals: Vec<&str> = Vec::new();
    let mut rows = true;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--rows" => {
                rows = bool_flag(args, i);
                i += 2;
            }
            positional if !positional.starts_with("--") => {
                positionals.push(positional);
                i += 1;
            }
            other => fatal(format!("unexpected argument '{}'", other)),
        }
    }

    if positionals.len() != 2 {
        fatal("latest requires a key and a responses.yaml path");
    }
    let (key, responses_path) = (positionals[0], positionals[1]);

    let text = match fs::read_to_string(responses_path) {
        Ok(text) => text,
        Err(err) => fatal(format!("failed to read {}: {}", responses_path, err)),
    };
    let responses: BTreeMap<String, String> = match serde_yaml::from_str(&text) {
        Ok(responses) => responses,
        Err(err) => fatal(format!("failed to parse {}: {}", responses_path, err)),
    };

    let resolution = resolve_latest(key, responses);
    println!(
        "{} resolved to version {} with value: {}",
        resolution.key, resolution.version, resolution.value
    );

    if rows {
        for row in &resolution.rows {
            if row.parsed() {
                println!("  {}: version {}", row.host, row.version);
            } else {
                println!("  {}: unparsable response: {}", row.host, row.raw);
            }
        }
    }
}

// ============================================================================
// throughput
// ============================================================================

fn cmd_throughput(args: &[String]) {
    if args.is_empty() {
        fatal("throughput requires at least one samples file");
    }

    for path in args {
        let file = match fs::File::open(path) {
            Ok(file) => file,
            Err(err) => fatal(format!("failed to open {}: {}", path, err)),
        };

        let samples = ingest_samples(BufReader::new(file));
        let summary = summarize(&samples);
        println!("{}: {}", path, summary);
        println!(
            "  successes={} mean={:.4}s stddev={:.4}s",
            summary.successes, summary.mean_latency, summary.stddev_latency
        );
    }
}
