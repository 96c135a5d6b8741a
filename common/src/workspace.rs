//! # Run Directory
//!
//! Every run writes into its own directory so two scans never share files.
//! By default it lives at `<output_root>/<domain>-<timestamp>-<pid>`, with a
//! `-<n>` suffix for further runs of the same process. An explicit directory
//! can be pinned instead.
//!
//! All artifact file names are fixed and listed here, the pipeline never
//! builds a path on its own.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Local};

use crate::config::Config;
use crate::error::StepError;
use crate::target::Domain;

pub const SUBFINDER_OUTPUT: &str = "subfinder_output.txt";
pub const AMASS_OUTPUT: &str = "amass_output.txt";
pub const ASSETFINDER_OUTPUT: &str = "assetfinder_output.txt";
pub const SUBLIST3R_OUTPUT: &str = "sublist3r_output.txt";
pub const CRT_OUTPUT: &str = "crt_output.txt";
pub const CRT_SUBS: &str = "crt_subs.txt";
pub const CERTSPOTTER_OUTPUT: &str = "certspotter_output.txt";
pub const CERTSPOTTER_SUBS: &str = "certspotter_subs.txt";
pub const FFUF_OUTPUT: &str = "ffuf_output.json";
pub const FFUF_SUBS: &str = "ffuf_subs.txt";
pub const ALL_SUBDOMAINS: &str = "all_subdomains.txt";
pub const PERMUTATIONS: &str = "permutations.txt";
pub const RESOLVED_PERMUTATIONS: &str = "resolved_permutations.txt";
pub const LIVE_SUBDOMAINS: &str = "live_subdomains.txt";
pub const STATUS_CODES: &str = "status_codes.txt";
pub const HTTPX_DIR: &str = "httpx";

/// Subdomain lists merged into [`ALL_SUBDOMAINS`]. Raw JSON never is.
pub const AGGREGATE_INPUTS: &[&str] = &[
    SUBFINDER_OUTPUT,
    AMASS_OUTPUT,
    ASSETFINDER_OUTPUT,
    SUBLIST3R_OUTPUT,
    CRT_SUBS,
    CERTSPOTTER_SUBS,
    FFUF_SUBS,
];

const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Runs named so far by this process.
static RUN_SEQUENCE: AtomicUsize = AtomicUsize::new(0);

#[derive(Clone, Debug)]
pub struct RunDirectory {
    root: PathBuf,
}

impl RunDirectory {
    /// Names the per-run directory `<output_root>/<domain>-<timestamp>-<pid>`.
    ///
    /// The pid keeps concurrent processes apart, the sequence number keeps
    /// runs of one process apart.
    pub fn for_run(output_root: &Path, domain: &Domain, started: DateTime<Local>) -> Self {
        let mut name = format!(
            "{}-{}-{}",
            domain,
            started.format(TIMESTAMP_FORMAT),
            std::process::id()
        );
        let seq = RUN_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        if seq > 0 {
            name.push_str(&format!("-{seq}"));
        }

        Self {
            root: output_root.join(name),
        }
    }

    pub fn pinned(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The pinned directory when one is configured, a fresh per-run one otherwise.
    pub fn from_config(cfg: &Config, domain: &Domain) -> Self {
        match &cfg.output_dir {
            Some(dir) => Self::pinned(dir),
            None => Self::for_run(&cfg.output_root, domain, Local::now()),
        }
    }

    /// Creates the directory tree if absent. Existing content is left alone.
    pub fn create(&self) -> Result<(), StepError> {
        std::fs::create_dir_all(&self.root).map_err(|e| StepError::io(&self.root, e))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn httpx_dir(&self) -> PathBuf {
        self.root.join(HTTPX_DIR)
    }

    /// `httpx/<code>_domains.txt`
    pub fn status_partition(&self, code: &str) -> PathBuf {
        self.httpx_dir().join(format!("{code}_domains.txt"))
    }

    pub fn aggregate_inputs(&self) -> Vec<PathBuf> {
        AGGREGATE_INPUTS.iter().map(|name| self.file(name)).collect()
    }
}
