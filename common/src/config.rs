use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_OUTPUT_ROOT: &str = "OUTPUT";
pub const DEFAULT_JOBS: usize = 4;
pub const DEFAULT_PROBE_THREADS: u32 = 100;

/// What a failing step does to the rest of the run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Abort the run, exit non-zero.
    Fatal,
    /// Log the failure and move on to the next step.
    BestEffort,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fatal" => Ok(Self::Fatal),
            "best-effort" | "best_effort" | "besteffort" => Ok(Self::BestEffort),
            _ => Err(format!("unknown policy '{s}', expected 'fatal' or 'best-effort'")),
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePolicy::Fatal => f.write_str("fatal"),
            FailurePolicy::BestEffort => f.write_str("best-effort"),
        }
    }
}

/// Every step of the enumeration pipeline, in plan order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StepId {
    Subfinder,
    Amass,
    Assetfinder,
    Sublist3r,
    Crt,
    Certspotter,
    Ffuf,
    Aggregate,
    Alterx,
    Dnsx,
    MergePermutations,
    Httpx,
    Classify,
}

impl StepId {
    pub const ALL: [StepId; 13] = [
        StepId::Subfinder,
        StepId::Amass,
        StepId::Assetfinder,
        StepId::Sublist3r,
        StepId::Crt,
        StepId::Certspotter,
        StepId::Ffuf,
        StepId::Aggregate,
        StepId::Alterx,
        StepId::Dnsx,
        StepId::MergePermutations,
        StepId::Httpx,
        StepId::Classify,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StepId::Subfinder => "subfinder",
            StepId::Amass => "amass",
            StepId::Assetfinder => "assetfinder",
            StepId::Sublist3r => "sublist3r",
            StepId::Crt => "crt",
            StepId::Certspotter => "certspotter",
            StepId::Ffuf => "ffuf",
            StepId::Aggregate => "aggregate",
            StepId::Alterx => "alterx",
            StepId::Dnsx => "dnsx",
            StepId::MergePermutations => "merge-permutations",
            StepId::Httpx => "httpx",
            StepId::Classify => "classify",
        }
    }

    /// The external binary this step runs, if any.
    pub fn tool(&self) -> Option<&'static str> {
        match self {
            StepId::Subfinder
            | StepId::Amass
            | StepId::Assetfinder
            | StepId::Sublist3r
            | StepId::Ffuf
            | StepId::Alterx
            | StepId::Dnsx
            | StepId::Httpx => Some(self.as_str()),
            StepId::Crt
            | StepId::Certspotter
            | StepId::Aggregate
            | StepId::MergePermutations
            | StepId::Classify => None,
        }
    }

    /// Policy used when neither the config file nor the command line set one.
    pub fn default_policy(&self) -> FailurePolicy {
        match self {
            StepId::Assetfinder
            | StepId::Crt
            | StepId::Certspotter
            | StepId::Aggregate
            | StepId::Httpx
            | StepId::Classify => FailurePolicy::Fatal,
            StepId::Subfinder
            | StepId::Amass
            | StepId::Sublist3r
            | StepId::Ffuf
            | StepId::Alterx
            | StepId::Dnsx
            | StepId::MergePermutations => FailurePolicy::BestEffort,
        }
    }

    fn valid_names() -> String {
        Self::ALL
            .iter()
            .map(StepId::as_str)
            .collect::<Vec<&str>>()
            .join(", ")
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|step| step.as_str() == lower)
            .ok_or_else(|| format!("unknown step '{s}' (valid: {})", Self::valid_names()))
    }
}

/// A `STEP=POLICY` pair as given on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PolicyOverride {
    pub step: StepId,
    pub policy: FailurePolicy,
}

impl FromStr for PolicyOverride {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((step, policy)) = s.split_once('=') else {
            return Err(format!("expected STEP=POLICY, got '{s}'"));
        };
        Ok(Self {
            step: step.parse()?,
            policy: policy.trim().parse()?,
        })
    }
}

/// Settings of a single enumeration run.
#[derive(Clone, Debug)]
pub struct Config {
    /// Parent directory of the per-run output directories.
    pub output_root: PathBuf,
    /// Exact run directory. Disables the `<domain>-<timestamp>` naming.
    pub output_dir: Option<PathBuf>,
    /// Wordlist for the brute-force step. `ffuf` is skipped without one.
    pub wordlist: Option<PathBuf>,
    /// Number of collectors allowed to run at the same time.
    pub jobs: usize,
    /// Worker threads handed to the live-host prober.
    pub threads: u32,
    /// Skips the install pass entirely.
    pub skip_install: bool,
    pub skipped: BTreeSet<StepId>,
    pub policies: BTreeMap<StepId, FailurePolicy>,
    /// Suppresses banner and section headers.
    pub quiet: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from(DEFAULT_OUTPUT_ROOT),
            output_dir: None,
            wordlist: None,
            jobs: DEFAULT_JOBS,
            threads: DEFAULT_PROBE_THREADS,
            skip_install: false,
            skipped: BTreeSet::new(),
            policies: BTreeMap::new(),
            quiet: false,
        }
    }
}

impl Config {
    pub fn policy(&self, step: StepId) -> FailurePolicy {
        self.policies
            .get(&step)
            .copied()
            .unwrap_or_else(|| step.default_policy())
    }

    pub fn is_skipped(&self, step: StepId) -> bool {
        self.skipped.contains(&step)
    }

    /// Layers the values of a config file over the current settings.
    pub fn merge_file(&mut self, file: ConfigFile) -> anyhow::Result<()> {
        if let Some(output_root) = file.output_root {
            self.output_root = output_root;
        }
        if let Some(wordlist) = file.wordlist {
            self.wordlist = Some(wordlist);
        }
        if let Some(jobs) = file.jobs {
            self.jobs = jobs;
        }
        if let Some(threads) = file.threads {
            self.threads = threads;
        }
        if let Some(skip_install) = file.skip_install {
            self.skip_install = skip_install;
        }
        for name in &file.skip {
            let step = StepId::from_str(name).map_err(anyhow::Error::msg)?;
            self.skipped.insert(step);
        }
        for (name, policy) in file.policy {
            let step = StepId::from_str(&name).map_err(anyhow::Error::msg)?;
            self.policies.insert(step, policy);
        }
        Ok(())
    }
}

/// On-disk representation of [`Config`], every field optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub output_root: Option<PathBuf>,
    pub wordlist: Option<PathBuf>,
    pub jobs: Option<usize>,
    pub threads: Option<u32>,
    pub skip_install: Option<bool>,
    #[serde(default)]
    pub skip: Vec<String>,
    #[serde(default)]
    pub policy: BTreeMap<String, FailurePolicy>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing config file {}", path.display()))
    }
}
