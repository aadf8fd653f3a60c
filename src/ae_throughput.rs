//! Benchmark Throughput Aggregation
//!
//! Parses the per-message latency rows benchmark clients write
//! (`msgid,key,version,ts,latency,bytes,success`) and aggregates them
//! into the throughput summary an experiment report lists per client.
//! Like visibility ingestion, a malformed row drops that row only.

use crate::ae_interface::parse_bool;
use chrono::{DateTime, Duration, Utc};
use log::debug;
use std::fmt;
use std::io::BufRead;

/// Round-trip measurement of a single benchmark message.
#[derive(Debug, Clone, PartialEq)]
pub struct LatencySample {
    /// Sequence number of the message within its client
    pub message: u64,

    /// Key that was written
    pub key: String,

    /// Version the store assigned, as reported
    pub version: String,

    /// When the message was sent
    pub start: DateTime<Utc>,

    /// Round-trip time of the write
    pub delay: Duration,

    /// Payload size in bytes
    pub bytes: usize,

    /// Whether the write succeeded
    pub success: bool,
}

impl LatencySample {
    pub fn delay_seconds(&self) -> f64 {
        match self.delay.num_nanoseconds() {
            Some(ns) => ns as f64 / 1_000_000_000.0,
            None => self.delay.num_milliseconds() as f64 / 1_000.0,
        }
    }
}

/// Parse one `msgid,key,version,ts,latency,bytes,success` row.
pub fn parse_sample(line: &str) -> Option<LatencySample> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() != 7 {
        debug!("dropping malformed latency row: {}", line);
        return None;
    }

    let message = fields[0].parse().ok()?;
    let start = DateTime::parse_from_rfc3339(fields[3])
        .ok()?
        .with_timezone(&Utc);
    let delay = Duration::nanoseconds(fields[4].parse().ok()?);
    let bytes = fields[5].parse().ok()?;
    let success = parse_bool(fields[6]).ok()?;

    Some(LatencySample {
        message,
        key: fields[1].to_string(),
        version: fields[2].to_string(),
        start,
        delay,
        bytes,
        success,
    })
}

/// Ingest a results file, dropping malformed rows.
pub fn ingest_samples(reader: impl BufRead) -> Vec<LatencySample> {
    reader
        .lines()
        .map_while(Result::ok)
        .filter_map(|line| parse_sample(&line))
        .collect()
}

/// Aggregate write statistics for one client's benchmark run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThroughputSummary {
    /// Messages measured
    pub messages: usize,

    /// Messages the store acknowledged as successful
    pub successes: usize,

    /// Cumulative round-trip time across all messages, seconds
    pub total_delay_seconds: f64,

    /// Messages per second of cumulative round-trip time
    pub throughput: f64,

    /// Mean round-trip time, seconds
    pub mean_latency: f64,

    /// Population standard deviation of round-trip time, seconds
    pub stddev_latency: f64,
}

impl fmt::Display for ThroughputSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} messages sent in {:.4}s ({:.4} msg/sec)",
            self.messages, self.total_delay_seconds, self.throughput
        )
    }
}

/// Summarize a client's latency samples; empty input yields a zeroed
/// summary rather than an error.
pub fn summarize(samples: &[LatencySample]) -> ThroughputSummary {
    if samples.is_empty() {
        return ThroughputSummary::default();
    }

    let messages = samples.len();
    let successes = samples.iter().filter(|s| s.success).count();
    let delays: Vec<f64> = samples.iter().map(|s| s.delay_seconds()).collect();

    let total: f64 = delays.iter().sum();
    let mean = total / messages as f64;
    let variance = delays.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / messages as f64;

    let throughput = if total > 0.0 {
        messages as f64 / total
    } else {
        0.0
    };

    ThroughputSummary {
        messages,
        successes,
        total_delay_seconds: total,
        throughput,
        mean_latency: mean,
        stddev_latency: variance.sqrt(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROW: &str = "1,FOO,1.1,2017-06-14T09:30:00.123456789-04:00,500000000,64,true";

    fn sample(delay_ms: i64) -> LatencySample {
        parse_sample(ROW).map(|mut s| {
            s.delay = Duration::milliseconds(delay_ms);
            s
        })
        .unwrap()
    }

    #[test]
    fn test_parse_row() {
        let sample = parse_sample(ROW).unwrap();
        assert_eq!(sample.message, 1);
        assert_eq!(sample.key, "FOO");
        assert_eq!(sample.version, "1.1");
        assert_eq!(sample.delay, Duration::nanoseconds(500_000_000));
        assert_eq!(sample.bytes, 64);
        assert!(sample.success);
    }

    #[test]
    fn test_malformed_rows_are_dropped() {
        let input = format!("{}\nnot,a,row\n\n", ROW);
        let samples = ingest_samples(input.as_bytes());
        assert_eq!(samples.len(), 1);
    }

    #[test]
    fn test_throughput_over_cumulative_delay() {
        // Five messages totalling 2.5s of round-trip time: 2 msg/sec
        let samples: Vec<LatencySample> = (0..5).map(|_| sample(500)).collect();
        let summary = summarize(&samples);

        assert_eq!(summary.messages, 5);
        assert!((summary.total_delay_seconds - 2.5).abs() < 1e-9);
        assert!((summary.throughput - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_mean_and_stddev() {
        let samples = vec![sample(100), sample(300)];
        let summary = summarize(&samples);

        assert!((summary.mean_latency - 0.2).abs() < 1e-9);
        assert!((summary.stddev_latency - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_empty_input_is_zeroed_not_fatal() {
        let summary = summarize(&[]);
        assert_eq!(summary, ThroughputSummary::default());
    }
}
