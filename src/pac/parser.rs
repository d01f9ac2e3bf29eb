//! Output parsers for `pac auth list`, `pac admin list`, and `pac solution list`.
//!
//! Pure text parsers (no I/O). The tool's tabular output is whitespace-aligned,
//! not delimiter-escaped, so tabular parsing is best-effort: lines are split on
//! runs of whitespace and anything unrecognizable is dropped.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::StudioError;

/// Marker the tool prints on the row of the currently selected profile.
const ACTIVE_MARKER: char = '*';

/// Header token of the tabular `solution list` output.
const SOLUTION_HEADER: &str = "Solution Name";

const URL_SCHEME: &str = "https://";

/// A credential/session profile registered with the tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthProfile {
    pub name: String,
    pub url: String,
    pub is_active: bool,
    pub kind: String,
}

/// An environment visible to the active profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Environment {
    pub display_name: String,
    pub url: String,
}

/// A solution installed in the active environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Solution {
    pub unique_name: String,
    pub friendly_name: String,
}

/// Parse `auth list` output into profiles.
///
/// Only lines containing `https://` are considered. The URL is the first token
/// starting with `https://`; the name is the first token with `*` removed (or
/// the next non-URL token when the first is only the marker). A line with no
/// other token is named by its first token. A line is active iff it contains
/// `*` anywhere. Never fails.
pub fn parse_auth_profiles(text: &str) -> Vec<AuthProfile> {
    let mut profiles = Vec::new();

    for line in text.lines() {
        if !line.contains(URL_SCHEME) {
            continue;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some(url) = tokens.iter().find(|t| t.starts_with(URL_SCHEME)) else {
            continue;
        };

        let name = tokens
            .iter()
            .filter(|t| !t.starts_with(URL_SCHEME))
            .map(|t| t.replace(ACTIVE_MARKER, ""))
            .find(|t| !t.is_empty())
            .or_else(|| tokens.first().map(|t| t.replace(ACTIVE_MARKER, "")))
            .filter(|t| !t.is_empty());
        let Some(name) = name else {
            continue;
        };

        profiles.push(AuthProfile {
            name,
            url: url.to_string(),
            is_active: line.contains(ACTIVE_MARKER),
            kind: "PowerPlatform".to_string(),
        });
    }

    profiles
}

/// Parse `admin list` JSON output into environments.
///
/// Empty output is an empty list. Anything that is not a JSON array fails with
/// `MalformedOutput`; there is no tabular fallback for this command.
pub fn parse_environments(text: &str) -> crate::Result<Vec<Environment>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let value: Value = serde_json::from_str(text)
        .map_err(|e| StudioError::MalformedOutput("admin list".to_string(), e.to_string()))?;

    let Value::Array(items) = value else {
        return Err(StudioError::MalformedOutput(
            "admin list".to_string(),
            "expected a JSON array".to_string(),
        ));
    };

    Ok(items
        .iter()
        .filter_map(Value::as_object)
        .map(|obj| Environment {
            display_name: string_field(obj, &["DisplayName", "displayName", "name"]),
            url: string_field(obj, &["Url", "url"]),
        })
        .collect())
}

/// Parse `solution list` output: JSON first, tabular fallback. Never fails.
///
/// Only text that fails to decode as JSON reaches the tabular parser.
pub fn parse_solutions(text: &str) -> Vec<Solution> {
    match serde_json::from_str::<Value>(text) {
        Ok(value) => solutions_from_json(&value),
        Err(_) => parse_solutions_table(text),
    }
}

/// Objects in a top-level array become solutions; anything else is skipped.
fn solutions_from_json(value: &Value) -> Vec<Solution> {
    let Value::Array(items) = value else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(Value::as_object)
        .map(|obj| Solution {
            unique_name: string_field(obj, &["uniqueName", "UniqueName", "name"]),
            friendly_name: string_field(obj, &["friendlyName", "FriendlyName", "displayName"]),
        })
        .collect()
}

/// First token is the unique name; the rest, single-space joined, the friendly name.
fn parse_solutions_table(text: &str) -> Vec<Solution> {
    let mut solutions = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() || line.contains(SOLUTION_HEADER) {
            continue;
        }

        let mut tokens = line.split_whitespace();
        let Some(unique_name) = tokens.next() else {
            continue;
        };
        let friendly_name = tokens.collect::<Vec<_>>().join(" ");
        if friendly_name.is_empty() {
            continue;
        }

        solutions.push(Solution {
            unique_name: unique_name.to_string(),
            friendly_name,
        });
    }

    solutions
}

/// First non-empty string value among `keys`, or the empty string.
fn string_field(obj: &Map<String, Value>, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|k| obj.get(*k).and_then(Value::as_str))
        .find(|s| !s.is_empty())
        .unwrap_or_default()
        .to_string()
}
