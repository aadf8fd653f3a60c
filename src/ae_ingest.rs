//! Observation Ingestion
//!
//! Parses per-host visibility logs (one JSON object per line with `Key`,
//! `Version`, and `Timestamp` fields) into [`VisibilityRecord`]s. The
//! logs come from an at-least-once writer and may be truncated mid-line,
//! so ingestion never aborts on a bad record: blank lines are skipped and
//! malformed lines drop that record only.

use crate::ae_interface::VisibilityRecord;
use chrono::{DateTime, Utc};
use log::debug;
use serde::Deserialize;
use std::io::BufRead;

/// Wire shape of one visibility log line.
#[derive(Debug, Deserialize)]
struct RawObservation {
    #[serde(rename = "Key")]
    key: String,

    #[serde(rename = "Version")]
    version: serde_json::Number,

    #[serde(rename = "Timestamp")]
    timestamp: String,
}

/// Parse a single log line into a record.
///
/// Returns `None` for blank lines and for anything that is not a
/// well-formed observation: unparsable JSON, a missing or non-numeric
/// field, or a timestamp that is not ISO-8601 with an offset.
pub fn parse_observation(host: &str, line: &str) -> Option<VisibilityRecord> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let raw: RawObservation = match serde_json::from_str(line) {
        Ok(raw) => raw,
        Err(err) => {
            debug!("dropping malformed observation from {}: {}", host, err);
            return None;
        }
    };

    let timestamp = match DateTime::parse_from_rfc3339(&raw.timestamp) {
        Ok(ts) => ts.with_timezone(&Utc),
        Err(err) => {
            debug!(
                "dropping observation from {} with bad timestamp '{}': {}",
                host, raw.timestamp, err
            );
            return None;
        }
    };

    Some(VisibilityRecord {
        key: raw.key,
        version: raw.version.to_string(),
        timestamp,
        host: host.to_string(),
    })
}

/// Lazily ingest raw lines from one host's log.
pub fn ingest_lines<'a, I>(host: &'a str, lines: I) -> impl Iterator<Item = VisibilityRecord> + 'a
where
    I: IntoIterator + 'a,
    I::Item: AsRef<str>,
{
    lines
        .into_iter()
        .filter_map(move |line| parse_observation(host, line.as_ref()))
}

/// Ingest an entire log from a reader.
///
/// An I/O error mid-stream is treated like a truncated log: the records
/// read so far are returned and the rest is abandoned.
pub fn ingest_log(host: &str, reader: impl BufRead) -> Vec<VisibilityRecord> {
    reader
        .lines()
        .map_while(Result::ok)
        .filter_map(|line| parse_observation(host, &line))
        .collect()
}
