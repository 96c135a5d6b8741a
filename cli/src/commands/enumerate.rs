use std::time::Instant;

use colored::*;
use ionicsub_common::config::Config;
use ionicsub_common::target::Domain;
use ionicsub_common::workspace::{HTTPX_DIR, LIVE_SUBDOMAINS, RunDirectory};
use ionicsub_common::{info, success, warn};
use ionicsub_core::installer::InstallOutcome;
use ionicsub_core::{Engine, RunReport, StepOutcome};

use crate::terminal::{colors, print};

type Detail = (String, ColoredString);

pub async fn enumerate(domain: Domain, cfg: &Config) -> anyhow::Result<()> {
    let engine = Engine::system();
    let started = Instant::now();

    if cfg.skip_install {
        info!("Skipping tool installation");
    } else {
        print::header("checking tools", cfg.quiet);
        let report = engine.install(cfg).await?;
        let installed = report
            .tools
            .iter()
            .filter(|(_, outcome)| *outcome == InstallOutcome::Installed)
            .count();
        info!("{} tools ready, {installed} newly installed", report.tools.len());
    }

    let run = RunDirectory::from_config(cfg, &domain);
    print::header("enumerating subdomains", cfg.quiet);
    let report = engine.enumerate(&domain, run, cfg).await?;

    print_summary(&report, cfg);

    let failed = report.failed().count();
    if failed > 0 {
        warn!("{failed} best-effort steps failed, results may be incomplete");
    }

    let elapsed: ColoredString = format!("{:.2}s", started.elapsed().as_secs_f64())
        .bold()
        .yellow();
    if !cfg.quiet {
        print::fat_separator();
        print::centerln(&format!("Finished in {elapsed}"));
    }
    success!("Subdomain Enumeration Completed!");
    success!(
        "Results saved in {}",
        report.run_dir.join(LIVE_SUBDOMAINS).display()
    );
    info!(
        "Hosts by status code in {}",
        report.run_dir.join(HTTPX_DIR).display()
    );
    print::end_of_program();
    Ok(())
}

fn print_summary(report: &RunReport, cfg: &Config) {
    print::header("summary", cfg.quiet);

    let codes: Vec<String> = report
        .status_counts
        .keys()
        .map(|code| format!("HTTP {code}"))
        .collect();
    print::set_key_width(
        ["Directory", "Subdomains", "Live hosts"]
            .into_iter()
            .chain(codes.iter().map(String::as_str)),
    );

    print::aligned_line(
        "Directory",
        report.run_dir.display().to_string().color(colors::ACCENT),
    );
    print::aligned_line("Subdomains", report.subdomains.to_string().bold().green());
    print::aligned_line("Live hosts", report.live_hosts.to_string().bold().green());
    for (key, count) in codes.iter().zip(report.status_counts.values()) {
        print::aligned_line(key, count.to_string());
    }

    print::print_status("Steps");
    print::as_tree_one_level(step_details(report));
}

fn step_details(report: &RunReport) -> Vec<Detail> {
    report
        .steps
        .iter()
        .map(|step| {
            let value = match &step.outcome {
                StepOutcome::Completed => format!("done in {:.2}s", step.elapsed.as_secs_f64())
                    .color(colors::SUCCESS),
                StepOutcome::Failed(reason) => format!("failed: {reason}").color(colors::FAILURE),
                StepOutcome::Skipped(reason) => {
                    format!("skipped: {reason}").color(colors::SKIPPED)
                }
            };
            (step.id.to_string(), value)
        })
        .collect()
}
