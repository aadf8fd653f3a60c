//! Key Latest-Version Resolver
//!
//! Resolves the most recent version of a single key from per-host
//! `version <V>, value: <text>` responses collected by an external
//! command runner. Hosts that answer with anything else still appear in
//! the output: their raw text is preserved for diagnostic display, and
//! they contribute version 0.0 to the resolution.

use log::debug;

/// One host's answer for the key.
#[derive(Debug, Clone, PartialEq)]
pub struct HostResponse {
    /// Logical host name
    pub host: String,

    /// Parsed version, 0.0 when the response did not parse
    pub version: f64,

    /// Parsed value text, `None` when the response did not parse
    pub value: Option<String>,

    /// The raw response exactly as the host returned it
    pub raw: String,
}

impl HostResponse {
    pub fn parsed(&self) -> bool {
        self.value.is_some()
    }
}

/// The resolved state of a key across the cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyResolution {
    /// Key that was queried
    pub key: String,

    /// Maximum version any host reported, 0.0 if none parsed
    pub version: f64,

    /// Value paired with the maximum version; when no response parsed,
    /// the raw text of one failing response, documenting the failure
    pub value: String,

    /// Hosts whose responses failed to parse
    pub failures: Vec<String>,

    /// Every host's answer, sorted by host name
    pub rows: Vec<HostResponse>,
}

/// Parse a `version <V>, value: <text>` response.
fn parse_response(raw: &str) -> Option<(f64, String)> {
    let rest = raw.trim().strip_prefix("version ")?;
    let (version, value) = rest.split_once(", value: ")?;
    let version: f64 = version.trim().parse::<f64>().ok().filter(|v| v.is_finite())?;
    Some((version, value.to_string()))
}

/// Resolve the latest version of `key` from per-host responses.
///
/// The maximum parsed version wins; on a tie the first host in name order
/// keeps it. Rows come back sorted by host name for reproducible display.
pub fn resolve_latest(
    key: &str,
    responses: impl IntoIterator<Item = (String, String)>,
) -> KeyResolution {
    let mut rows: Vec<HostResponse> = responses
        .into_iter()
        .map(|(host, raw)| match parse_response(&raw) {
            Some((version, value)) => HostResponse {
                host,
                version,
                value: Some(value),
                raw,
            },
            None => {
                debug!("response from {} for key {} did not parse", host, key);
                HostResponse {
                    host,
                    version: 0.0,
                    value: None,
                    raw,
                }
            }
        })
        .collect();

    rows.sort_by(|a, b| a.host.cmp(&b.host));

    let failures: Vec<String> = rows
        .iter()
        .filter(|row| !row.parsed())
        .map(|row| row.host.clone())
        .collect();

    let mut version = 0.0;
    let mut value: Option<String> = None;
    for row in &rows {
        if let Some(text) = &row.value {
            if value.is_none() || row.version > version {
                version = row.version;
                value = Some(text.clone());
            }
        }
    }

    // No host parsed: surface one raw response rather than hiding the
    // failure behind an empty result.
    let value = value
        .or_else(|| rows.first().map(|row| row.raw.clone()))
        .unwrap_or_default();

    KeyResolution {
        key: key.to_string(),
        version,
        value,
        failures,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn responses(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(h, r)| (h.to_string(), r.to_string()))
            .collect()
    }

    #[test]
    fn test_resolves_max_version_and_records_failure() {
        let resolution = resolve_latest(
            "FOO",
            responses(&[("h1", "version 1.0, value: \"x\""), ("h2", "garbage")]),
        );

        assert_eq!(resolution.version, 1.0);
        assert_eq!(resolution.value, "\"x\"");
        assert_eq!(resolution.failures, vec!["h2".to_string()]);
    }

    #[test]
    fn test_highest_version_wins() {
        let resolution = resolve_latest(
            "FOO",
            responses(&[
                ("h1", "version 1.2, value: old"),
                ("h2", "version 3.1, value: new"),
                ("h3", "version 2.2, value: mid"),
            ]),
        );

        assert_eq!(resolution.version, 3.1);
        assert_eq!(resolution.value, "new");
        assert!(resolution.failures.is_empty());
    }

    #[test]
    fn test_rows_sorted_by_host_name() {
        let resolution = resolve_latest(
            "FOO",
            responses(&[
                ("h3", "version 1.1, value: c"),
                ("h1", "version 1.3, value: a"),
                ("h2", "garbage"),
            ]),
        );

        let hosts: Vec<&str> = resolution.rows.iter().map(|r| r.host.as_str()).collect();
        assert_eq!(hosts, vec!["h1", "h2", "h3"]);
    }

    #[test]
    fn test_unparsed_rows_keep_raw_text() {
        let resolution = resolve_latest("FOO", responses(&[("h1", "connection refused")]));
        let row = &resolution.rows[0];

        assert!(!row.parsed());
        assert_eq!(row.version, 0.0);
        assert_eq!(row.raw, "connection refused");
    }

    #[test]
    fn test_no_parsable_response_documents_the_failure() {
        let resolution = resolve_latest(
            "FOO",
            responses(&[("h1", "connection refused"), ("h2", "timeout")]),
        );

        assert_eq!(resolution.version, 0.0);
        // The value is the literal text of one failing response
        assert_eq!(resolution.value, "connection refused");
        assert_eq!(resolution.failures.len(), 2);
    }

    #[test]
    fn test_empty_input() {
        let resolution = resolve_latest("FOO", vec![]);
        assert_eq!(resolution.version, 0.0);
        assert_eq!(resolution.value, "");
        assert!(resolution.rows.is_empty());
    }
}
