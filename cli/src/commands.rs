pub mod enumerate;

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use ionicsub_common::config::{Config, ConfigFile, PolicyOverride, StepId};
use ionicsub_common::target::Domain;

#[derive(Parser, Debug)]
#[command(name = "ionicsub")]
#[command(version, about = "Chains subdomain enumeration tools against a domain.")]
pub struct CommandLine {
    /// Target domain (e.g. example.com)
    pub domain: Domain,

    /// Wordlist for the ffuf brute-force step
    #[arg(short, long, env = "IONICSUB_WORDLIST", value_name = "PATH")]
    pub wordlist: Option<PathBuf>,

    /// Parent directory of the per-run output directories [default: OUTPUT]
    #[arg(short, long, env = "IONICSUB_OUTPUT_ROOT", value_name = "DIR")]
    pub output_root: Option<PathBuf>,

    /// Write into exactly this directory instead of a new per-run one
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Collectors allowed to run at the same time [default: 4]
    #[arg(short, long, value_parser = clap::value_parser!(usize))]
    pub jobs: Option<usize>,

    /// Worker threads of the live-host prober [default: 100]
    #[arg(short, long)]
    pub threads: Option<u32>,

    /// Do not check for or install missing tools
    #[arg(long)]
    pub skip_install: bool,

    /// Disable a step (repeatable)
    #[arg(long = "skip", value_name = "STEP")]
    pub skip: Vec<StepId>,

    /// Override a step's failure policy, e.g. `ffuf=fatal` (repeatable)
    #[arg(long = "policy", value_name = "STEP=POLICY")]
    pub policy: Vec<PolicyOverride>,

    /// TOML config file
    #[arg(short, long, env = "IONICSUB_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Hide banner and section headers
    #[arg(short, long)]
    pub quiet: bool,

    /// More output, -vv for tracing of every tool line
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl CommandLine {
    /// Defaults, then the config file, then the command line.
    pub fn to_config(&self) -> anyhow::Result<Config> {
        let mut cfg = Config::default();

        if let Some(path) = &self.config {
            cfg.merge_file(ConfigFile::load(path)?)?;
        }

        if let Some(output_root) = &self.output_root {
            cfg.output_root = output_root.clone();
        }
        if let Some(output_dir) = &self.output_dir {
            cfg.output_dir = Some(output_dir.clone());
        }
        if let Some(wordlist) = &self.wordlist {
            cfg.wordlist = Some(wordlist.clone());
        }
        if let Some(jobs) = self.jobs {
            cfg.jobs = jobs;
        }
        if let Some(threads) = self.threads {
            cfg.threads = threads;
        }

        cfg.skip_install |= self.skip_install;
        cfg.quiet = self.quiet;
        cfg.skipped.extend(self.skip.iter().copied());
        for PolicyOverride { step, policy } in &self.policy {
            cfg.policies.insert(*step, *policy);
        }

        anyhow::ensure!(cfg.jobs > 0, "jobs must be at least 1");
        Ok(cfg)
    }
}
