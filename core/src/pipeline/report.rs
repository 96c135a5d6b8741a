use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use ionicsub_common::config::StepId;
use ionicsub_common::workspace::{self as files, RunDirectory};

use crate::aggregate::count_lines;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    Completed,
    /// Best-effort step that failed, with the rendered error chain.
    Failed(String),
    Skipped(String),
}

#[derive(Clone, Debug)]
pub struct StepReport {
    pub id: StepId,
    pub outcome: StepOutcome,
    pub elapsed: Duration,
}

/// What a finished run left on disk.
#[derive(Clone, Debug)]
pub struct RunReport {
    pub run_dir: PathBuf,
    pub steps: Vec<StepReport>,
    pub subdomains: usize,
    pub live_hosts: usize,
    pub status_counts: BTreeMap<String, usize>,
}

impl RunReport {
    /// Counts are read back from the artifacts, not tracked in memory.
    pub fn summarize(run: &RunDirectory, steps: Vec<StepReport>) -> Self {
        Self {
            run_dir: run.root().to_path_buf(),
            steps,
            subdomains: count_lines(&run.file(files::ALL_SUBDOMAINS)),
            live_hosts: count_lines(&run.file(files::LIVE_SUBDOMAINS)),
            status_counts: partition_counts(run),
        }
    }

    pub fn outcome(&self, id: StepId) -> Option<&StepOutcome> {
        self.steps.iter().find(|s| s.id == id).map(|s| &s.outcome)
    }

    pub fn failed(&self) -> impl Iterator<Item = &StepReport> {
        self.steps
            .iter()
            .filter(|s| matches!(s.outcome, StepOutcome::Failed(_)))
    }
}

fn partition_counts(run: &RunDirectory) -> BTreeMap<String, usize> {
    let Ok(entries) = std::fs::read_dir(run.httpx_dir()) else {
        return BTreeMap::new();
    };

    entries
        .flatten()
        .filter_map(|entry| {
            let name = entry.file_name().into_string().ok()?;
            let code = name.strip_suffix("_domains.txt")?.to_string();
            Some((code, count_lines(&entry.path())))
        })
        .collect()
}
