//! # Aggregator
//!
//! Merges the collector lists into one sorted unique list, appends resolved
//! permutations to it and turns the live-host probe output into per-status
//! partitions.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};

use ionicsub_common::error::StepError;
use tracing::{debug, warn};

use crate::extract::write_lines;

/// Reads a line list. `Ok(None)` when the file does not exist.
/// Bytes that are not UTF-8 are replaced, never rejected.
fn read_lines(path: &Path) -> Result<Option<Vec<String>>, StepError> {
    let raw = match std::fs::read(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StepError::io(path, e)),
    };

    let content = String::from_utf8_lossy(&raw);
    if let Cow::Owned(_) = content {
        warn!("{} contains invalid UTF-8, bad bytes replaced", path.display());
    }

    Ok(Some(
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
    ))
}

/// Writes the sorted, duplicate-free union of `inputs` to `output`.
///
/// Inputs that do not exist are skipped. Returns the number of entries.
pub fn merge_unique(inputs: &[PathBuf], output: &Path) -> Result<usize, StepError> {
    let mut merged: BTreeSet<String> = BTreeSet::new();

    for input in inputs {
        match read_lines(input)? {
            Some(lines) => merged.extend(lines),
            None => debug!("{} does not exist, skipping", input.display()),
        }
    }

    write_lines(output, &merged)
}

/// Appends the lines of `source` that `target` does not contain yet.
///
/// Order of `source` is kept. Returns how many lines were appended.
pub fn append_unique(source: &Path, target: &Path) -> Result<usize, StepError> {
    let Some(candidates) = read_lines(source)? else {
        debug!("{} does not exist, nothing to append", source.display());
        return Ok(0);
    };

    let mut known: HashSet<String> = read_lines(target)?.unwrap_or_default().into_iter().collect();
    let fresh: Vec<String> = candidates
        .into_iter()
        .filter(|line| known.insert(line.clone()))
        .collect();

    if fresh.is_empty() {
        return Ok(0);
    }

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(target)
        .map_err(|e| StepError::io(target, e))?;
    for line in &fresh {
        writeln!(file, "{line}").map_err(|e| StepError::io(target, e))?;
    }

    Ok(fresh.len())
}

/// One line of live-host probe output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProbedHost {
    pub host: String,
    pub status: String,
}

/// Parses `https://a.example.com [200]` into host and status code.
///
/// Returns `None` for lines without a bracketed status.
pub fn parse_probe_line(line: &str) -> Option<ProbedHost> {
    let line = strip_ansi(line);
    let mut fields = line.split_whitespace();

    let url = fields.next()?;
    let status = fields
        .find_map(|field| field.strip_prefix('[')?.strip_suffix(']'))?
        .trim();
    if status.is_empty() {
        return None;
    }

    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let host = without_scheme.split('/').next().unwrap_or(without_scheme);
    if host.is_empty() {
        return None;
    }

    Some(ProbedHost {
        host: host.to_string(),
        status: status.to_string(),
    })
}

/// Removes `ESC [ ... <letter>` sequences some probers emit even with colour off.
fn strip_ansi(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            for next in chars.by_ref() {
                if next.is_ascii_alphabetic() {
                    break;
                }
            }
        } else {
            result.push(c);
        }
    }
    result
}

/// Annotates the probe output as `host code` lines and partitions them.
///
/// `status_file` receives every parsed line. For each distinct code,
/// `partition(code)` receives exactly the lines whose code equals it.
/// Previous `*_domains.txt` partitions in `partition_dir` are removed first.
/// Returns the number of hosts per code.
pub fn classify_status<F>(
    live: &Path,
    status_file: &Path,
    partition_dir: &Path,
    partition: F,
) -> Result<BTreeMap<String, usize>, StepError>
where
    F: Fn(&str) -> PathBuf,
{
    let lines = read_lines(live)?.ok_or_else(|| {
        StepError::io(
            live,
            std::io::Error::new(std::io::ErrorKind::NotFound, "live host list is missing"),
        )
    })?;

    let probed: Vec<ProbedHost> = lines.iter().filter_map(|l| parse_probe_line(l)).collect();

    let annotated: Vec<String> = probed
        .iter()
        .map(|p| format!("{} {}", p.host, p.status))
        .collect();
    write_lines(status_file, &annotated)?;

    std::fs::create_dir_all(partition_dir).map_err(|e| StepError::io(partition_dir, e))?;
    clear_partitions(partition_dir)?;

    let mut by_status: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (probe, line) in probed.iter().zip(&annotated) {
        by_status
            .entry(probe.status.clone())
            .or_default()
            .push(line.clone());
    }

    let mut counts = BTreeMap::new();
    for (status, entries) in &by_status {
        write_lines(&partition(status.as_str()), entries)?;
        counts.insert(status.clone(), entries.len());
    }

    Ok(counts)
}

fn clear_partitions(dir: &Path) -> Result<(), StepError> {
    let entries = std::fs::read_dir(dir).map_err(|e| StepError::io(dir, e))?;
    for entry in entries.flatten() {
        let path = entry.path();
        let is_partition = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with("_domains.txt"));
        if is_partition && path.is_file() {
            std::fs::remove_file(&path).map_err(|e| StepError::io(&path, e))?;
        }
    }
    Ok(())
}

/// Counts the non-empty lines of a file, zero when it does not exist.
pub fn count_lines(path: &Path) -> usize {
    read_lines(path).ok().flatten().map_or(0, |lines| lines.len())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
