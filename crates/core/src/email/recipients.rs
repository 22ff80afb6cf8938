//! Recipient list parsing and address validation.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use tracing::debug;

use crate::metrics;

static EMAIL_ADDRESS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[_A-Za-z0-9-]+(\.[_A-Za-z0-9-]+)*@[A-Za-z0-9-]+(\.[A-Za-z0-9]+)*(\.[A-Za-z]{2,})$",
    )
    .unwrap()
});

pub fn is_valid_address(address: &str) -> bool {
    EMAIL_ADDRESS.is_match(address)
}

/// Split a recipient list into valid addresses.
///
/// Accepts a single address, a comma-separated list, or a JSON array of
/// strings. Entries are trimmed; invalid ones are dropped.
pub fn parse_recipients(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    let joined;
    let list = match json_array_recipients(raw) {
        Some(entries) => {
            joined = entries.join(",");
            joined.as_str()
        }
        None => raw,
    };

    list.split(',')
        .map(str::trim)
        .filter(|candidate| {
            let valid = is_valid_address(candidate);
            if !valid && !candidate.is_empty() {
                debug!(address = *candidate, "Removing invalid address");
                metrics::RECIPIENTS_DROPPED.inc();
            }
            valid
        })
        .map(str::to_string)
        .collect()
}

/// Valid addresses joined with `,`.
pub fn validate_recipients(raw: &str) -> String {
    parse_recipients(raw).join(",")
}

/// String entries of a JSON array, or `None` if `raw` is not one.
fn json_array_recipients(raw: &str) -> Option<Vec<String>> {
    if !raw.starts_with('[') {
        return None;
    }
    let values: Vec<serde_json::Value> = serde_json::from_str(raw).ok()?;
    Some(
        values
            .into_iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
    )
}
