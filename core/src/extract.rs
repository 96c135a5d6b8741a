//! Hostname extraction from the JSON artifacts (crt.sh, certspotter, ffuf).
//!
//! The names are cleaned the same way for every source: split on newlines,
//! every `*.` wildcard marker dropped, blanks removed, sorted and unique.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use ionicsub_common::error::StepError;
use serde::Deserialize;
use serde_json::Value;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JsonSource {
    /// `.[].name_value`
    CrtSh,
    /// `.[].dns_names[]`
    Certspotter,
    /// `.results[].input.FUZZ`, suffixed with `.<domain>`
    Ffuf { domain: String },
}

#[derive(Deserialize)]
struct CrtEntry {
    #[serde(default)]
    name_value: Option<String>,
}

#[derive(Deserialize)]
struct Issuance {
    #[serde(default)]
    dns_names: Vec<String>,
}

#[derive(Deserialize)]
struct FfufReport {
    #[serde(default)]
    results: Vec<FfufResult>,
}

#[derive(Deserialize)]
struct FfufResult {
    #[serde(default)]
    input: BTreeMap<String, Value>,
}

/// Parses `input` and returns the cleaned set of hostnames it mentions.
pub fn extract_hostnames(source: &JsonSource, input: &Path) -> Result<BTreeSet<String>, StepError> {
    let raw = std::fs::read(input).map_err(|e| StepError::io(input, e))?;
    let json_err = |source| StepError::Json {
        path: input.to_path_buf(),
        source,
    };

    let names: Vec<String> = match source {
        JsonSource::CrtSh => serde_json::from_slice::<Vec<CrtEntry>>(&raw)
            .map_err(json_err)?
            .into_iter()
            .filter_map(|entry| entry.name_value)
            .collect(),
        JsonSource::Certspotter => serde_json::from_slice::<Vec<Issuance>>(&raw)
            .map_err(json_err)?
            .into_iter()
            .flat_map(|issuance| issuance.dns_names)
            .collect(),
        JsonSource::Ffuf { domain } => serde_json::from_slice::<FfufReport>(&raw)
            .map_err(json_err)?
            .results
            .into_iter()
            .filter_map(|result| match result.input.get("FUZZ") {
                Some(Value::String(word)) => Some(format!("{word}.{domain}")),
                _ => None,
            })
            .collect(),
    };

    Ok(clean_names(names))
}

pub fn clean_names<I>(names: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = String>,
{
    names
        .into_iter()
        .flat_map(|value| {
            value
                .lines()
                .map(|line| line.replace("*.", "").trim().to_string())
                .collect::<Vec<String>>()
        })
        .filter(|name| !name.is_empty())
        .collect()
}

/// Writes one entry per line, replacing the file.
pub fn write_lines<'a, I>(path: &Path, lines: I) -> Result<usize, StepError>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut out = String::new();
    let mut count = 0;
    for line in lines {
        out.push_str(line);
        out.push('\n');
        count += 1;
    }
    std::fs::write(path, out).map_err(|e| StepError::io(path, e))?;
    Ok(count)
}
