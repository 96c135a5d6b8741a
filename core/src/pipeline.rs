//! # Enumeration Pipeline
//!
//! Drives the fixed [`Plan`] against one domain.
//!
//! Collectors (subfinder, amass, certificate logs, ...) are independent and
//! run concurrently on a worker pool bounded by `Config::jobs`. Once all of
//! them are joined, the merge steps run one after the other: aggregation,
//! permutations, probing and classification.
//!
//! Every step carries a [`FailurePolicy`]. A best-effort step that fails is
//! logged and the plan goes on, a fatal one cancels whatever is still
//! running and bubbles up as an error.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use ionicsub_common::config::{Config, FailurePolicy};
use ionicsub_common::error::StepError;
use ionicsub_common::target::Domain;
use ionicsub_common::workspace::{self as files, RunDirectory};
use ionicsub_common::{error, info, success, warn};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{Instrument, info_span};

use crate::aggregate;
use crate::extract;
use crate::fetch::{self, HttpFetch, ReqwestFetcher};
use crate::installer::{self, InstallReport};
use crate::process::{ProcessRunner, SystemRunner};

mod plan;
mod report;

pub use plan::{Action, Plan, Step};
pub use report::{RunReport, StepOutcome, StepReport};

/// Entry point of the engine, owns the process and HTTP backends.
#[derive(Clone)]
pub struct Engine {
    runner: Arc<dyn ProcessRunner>,
    fetcher: Arc<dyn HttpFetch>,
}

struct RunContext {
    run: RunDirectory,
    cfg: Config,
    runner: Arc<dyn ProcessRunner>,
    fetcher: Arc<dyn HttpFetch>,
}

impl Engine {
    pub fn new(runner: Arc<dyn ProcessRunner>, fetcher: Arc<dyn HttpFetch>) -> Self {
        Self { runner, fetcher }
    }

    /// Real processes and real HTTP.
    pub fn system() -> Self {
        Self::new(Arc::new(SystemRunner), Arc::new(ReqwestFetcher::new()))
    }

    /// Installs the tools the enabled steps need.
    pub async fn install(&self, cfg: &Config) -> anyhow::Result<InstallReport> {
        let tools = installer::required_tools(cfg);
        installer::ensure_installed(&tools, self.runner.as_ref()).await
    }

    /// Runs the whole plan, writing every artifact below `run`.
    pub async fn enumerate(
        &self,
        domain: &Domain,
        run: RunDirectory,
        cfg: &Config,
    ) -> anyhow::Result<RunReport> {
        run.create().context("failed to create the output directory")?;
        info!("Starting subdomain enumeration for {domain}");
        info!("Writing results to {}", run.root().display());

        let plan = Plan::build(domain, &run, cfg);
        let ctx = Arc::new(RunContext {
            run,
            cfg: cfg.clone(),
            runner: self.runner.clone(),
            fetcher: self.fetcher.clone(),
        });

        let mut reports = collect(ctx.clone(), plan.collectors).await?;
        for step in plan.merge {
            reports.push(run_step(&ctx, step).await?);
        }

        Ok(RunReport::summarize(&ctx.run, reports))
    }
}

/// Runs the collectors on a bounded pool and waits for all of them.
async fn collect(ctx: Arc<RunContext>, steps: Vec<Step>) -> anyhow::Result<Vec<StepReport>> {
    let permits = Arc::new(Semaphore::new(ctx.cfg.jobs.max(1)));
    let mut set: JoinSet<(usize, anyhow::Result<StepReport>)> = JoinSet::new();

    for (idx, step) in steps.into_iter().enumerate() {
        let ctx = ctx.clone();
        let permits = permits.clone();
        set.spawn(async move {
            let _permit = permits.acquire_owned().await;
            (idx, run_step(&ctx, step).await)
        });
    }

    let mut finished: Vec<(usize, StepReport)> = Vec::new();
    while let Some(joined) = set.join_next().await {
        let (idx, result) = joined.context("collector task panicked")?;
        match result {
            Ok(report) => finished.push((idx, report)),
            Err(err) => {
                // Dropping the set kills the children of the other collectors.
                set.abort_all();
                return Err(err);
            }
        }
    }

    finished.sort_by_key(|(idx, _)| *idx);
    Ok(finished.into_iter().map(|(_, report)| report).collect())
}

/// Runs one step and applies its failure policy.
///
/// Only a failed fatal step produces an `Err`.
async fn run_step(ctx: &RunContext, step: Step) -> anyhow::Result<StepReport> {
    let started = Instant::now();
    let report = |outcome| StepReport {
        id: step.id,
        outcome,
        elapsed: started.elapsed(),
    };

    if ctx.cfg.is_skipped(step.id) {
        info!("Skipping {} (disabled)", step.id);
        return Ok(report(StepOutcome::Skipped("disabled".into())));
    }

    if let Some(reason) = &step.unavailable {
        warn!("Skipping {}: {reason}", step.id);
        return Ok(report(StepOutcome::Skipped(reason.clone())));
    }

    let span = info_span!("step", name = %step.id, indicatif.pb_show = true);
    let result = execute_all(ctx, &step.actions).instrument(span).await;

    match result {
        Ok(()) => {
            success!("{} finished in {:.2}s", step.id, started.elapsed().as_secs_f64());
            Ok(report(StepOutcome::Completed))
        }
        Err(err) => {
            let err = anyhow::Error::from(err);
            match ctx.cfg.policy(step.id) {
                FailurePolicy::Fatal => {
                    error!("Failed to run {}: {err:#}", step.id);
                    Err(err.context(format!("step '{}' failed", step.id)))
                }
                FailurePolicy::BestEffort => {
                    warn!("Failed to run {}: {err:#}", step.id);
                    Ok(report(StepOutcome::Failed(format!("{err:#}"))))
                }
            }
        }
    }
}

async fn execute_all(ctx: &RunContext, actions: &[Action]) -> Result<(), StepError> {
    for action in actions {
        execute(ctx, action).await?;
    }
    Ok(())
}

async fn execute(ctx: &RunContext, action: &Action) -> Result<(), StepError> {
    match action {
        Action::Tool(invocation) => ctx.runner.run(invocation).await,
        Action::Fetch { url, output } => {
            if let Err(err) = fetch::fetch_to_file(ctx.fetcher.as_ref(), url, output).await {
                warn!("Failed to fetch data from {url}: {err}");
            }
            Ok(())
        }
        Action::Extract {
            source,
            input,
            output,
        } => {
            let names = extract::extract_hostnames(source, input)?;
            let count = extract::write_lines(output, &names)?;
            info!("Extracted {count} names into {}", output.display());
            Ok(())
        }
        Action::Merge { inputs, output } => {
            let count = aggregate::merge_unique(inputs, output)?;
            info!("{count} unique subdomains collected");
            Ok(())
        }
        Action::Append { source, target } => {
            let count = aggregate::append_unique(source, target)?;
            info!("{count} resolved permutations added");
            Ok(())
        }
        Action::Classify { live } => {
            let run = &ctx.run;
            let counts = aggregate::classify_status(
                live,
                &run.file(files::STATUS_CODES),
                &run.httpx_dir(),
                |code| run.status_partition(code),
            )?;
            for (code, hosts) in &counts {
                info!("HTTP {code}: {hosts} hosts");
            }
            Ok(())
        }
    }
}
