//! # Tool Registry
//!
//! Static list of the external binaries the pipeline drives, together with
//! the one command that installs each of them.

use crate::config::FailurePolicy;

/// How a missing tool gets installed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstallCommand {
    /// `go install <package>`
    Go { package: &'static str },
    /// `pip3 install <package>`
    Pip { package: &'static str },
}

impl InstallCommand {
    pub fn program(&self) -> &'static str {
        match self {
            InstallCommand::Go { .. } => "go",
            InstallCommand::Pip { .. } => "pip3",
        }
    }

    pub fn args(&self) -> Vec<String> {
        match self {
            InstallCommand::Go { package } | InstallCommand::Pip { package } => {
                vec!["install".to_string(), package.to_string()]
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ToolDescriptor {
    /// Executable name looked up on `PATH`.
    pub name: &'static str,
    pub install: InstallCommand,
    /// What happens when `install` fails.
    pub install_policy: FailurePolicy,
}

const fn go(name: &'static str, package: &'static str) -> ToolDescriptor {
    ToolDescriptor {
        name,
        install: InstallCommand::Go { package },
        install_policy: FailurePolicy::Fatal,
    }
}

pub const REQUIRED_TOOLS: &[ToolDescriptor] = &[
    go("subfinder", "github.com/projectdiscovery/subfinder/v2/cmd/subfinder@latest"),
    go("amass", "github.com/owasp-amass/amass/v4/...@master"),
    go("assetfinder", "github.com/tomnomnom/assetfinder@latest"),
    ToolDescriptor {
        name: "sublist3r",
        install: InstallCommand::Pip { package: "sublist3r" },
        install_policy: FailurePolicy::BestEffort,
    },
    go("httpx", "github.com/projectdiscovery/httpx/cmd/httpx@latest"),
    go("ffuf", "github.com/ffuf/ffuf/v2@latest"),
    go("alterx", "github.com/projectdiscovery/alterx/cmd/alterx@latest"),
    go("dnsx", "github.com/projectdiscovery/dnsx/cmd/dnsx@latest"),
];

pub fn find(name: &str) -> Option<&'static ToolDescriptor> {
    REQUIRED_TOOLS.iter().find(|tool| tool.name == name)
}
