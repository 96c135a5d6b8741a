//! # Installer
//!
//! Makes sure every required tool is on `PATH` before the pipeline starts.
//! A missing tool gets exactly one install attempt, there is no retry and no
//! check that the install actually produced a working binary.

use anyhow::Context;
use ionicsub_common::config::{Config, FailurePolicy, StepId};
use ionicsub_common::tool::{self, ToolDescriptor};
use ionicsub_common::{error, info, success, warn};

use crate::process::{Invocation, ProcessRunner};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InstallOutcome {
    AlreadyPresent,
    Installed,
    Failed(String),
}

#[derive(Clone, Debug, Default)]
pub struct InstallReport {
    pub tools: Vec<(&'static str, InstallOutcome)>,
}

impl InstallReport {
    pub fn outcome(&self, name: &str) -> Option<&InstallOutcome> {
        self.tools
            .iter()
            .find(|(tool, _)| *tool == name)
            .map(|(_, outcome)| outcome)
    }
}

/// Registry entries needed by the steps that are not disabled.
pub fn required_tools(cfg: &Config) -> Vec<&'static ToolDescriptor> {
    StepId::ALL
        .iter()
        .filter(|step| !cfg.is_skipped(**step))
        .filter_map(|step| step.tool())
        .filter_map(tool::find)
        .collect()
}

/// Checks each tool and installs the missing ones.
///
/// A failed install of a tool whose policy is [`FailurePolicy::Fatal`] stops
/// the pass and is returned as an error.
pub async fn ensure_installed(
    tools: &[&'static ToolDescriptor],
    runner: &dyn ProcessRunner,
) -> anyhow::Result<InstallReport> {
    let mut report = InstallReport::default();

    for tool in tools {
        if runner.locate(tool.name).is_some() {
            info!("{} is already installed.", tool.name);
            report.tools.push((tool.name, InstallOutcome::AlreadyPresent));
            continue;
        }

        warn!("{} not found! Installing...", tool.name);
        let invocation = Invocation::new(tool.install.program(), tool.install.args());

        match runner.run(&invocation).await {
            Ok(()) => {
                success!("Installed {}", tool.name);
                report.tools.push((tool.name, InstallOutcome::Installed));
            }
            Err(err) => {
                let err = anyhow::Error::from(err);
                match tool.install_policy {
                    FailurePolicy::Fatal => {
                        return Err(err)
                            .with_context(|| format!("failed to install {} ({invocation})", tool.name));
                    }
                    FailurePolicy::BestEffort => {
                        error!("Failed to install {}: {err:#}", tool.name);
                        report
                            .tools
                            .push((tool.name, InstallOutcome::Failed(format!("{err:#}"))));
                    }
                }
            }
        }
    }

    Ok(report)
}
