//! Launching external tools.
//!
//! Everything the pipeline runs goes through [`ProcessRunner`], so the
//! engine can be driven by a fake in tests. The system implementation
//! forwards tool output line by line to the log at `DEBUG`, unless stdout
//! is redirected into an artifact file.

use std::ffi::OsStr;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use ionicsub_common::error::StepError;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::debug;

/// A single external command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Truncates this file and writes the tool's stdout into it.
    pub stdout: Option<PathBuf>,
}

impl Invocation {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            stdout: None,
        }
    }

    pub fn stdout_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdout = Some(path.into());
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        if let Some(path) = &self.stdout {
            write!(f, " > {}", path.display())?;
        }
        Ok(())
    }
}

#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Resolves `program` on the executable search path.
    fn locate(&self, program: &str) -> Option<PathBuf>;

    /// Runs the invocation to completion. A non-zero exit is an error.
    async fn run(&self, invocation: &Invocation) -> Result<(), StepError>;
}

/// Runs real processes through `tokio::process`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemRunner;

#[async_trait]
impl ProcessRunner for SystemRunner {
    fn locate(&self, program: &str) -> Option<PathBuf> {
        find_in_path(program, std::env::var_os("PATH").as_deref())
    }

    async fn run(&self, invocation: &Invocation) -> Result<(), StepError> {
        let tool: &str = &invocation.program;
        debug!("Executing: {invocation}");

        let mut command = Command::new(tool);
        command
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        match &invocation.stdout {
            Some(path) => {
                let file = tokio::fs::File::create(path)
                    .await
                    .map_err(|e| StepError::io(path, e))?
                    .into_std()
                    .await;
                command.stdout(Stdio::from(file));
            }
            None => {
                command.stdout(Stdio::piped());
            }
        }

        let mut child = command.spawn().map_err(|source| match source.kind() {
            ErrorKind::NotFound => StepError::NotInstalled {
                tool: tool.to_string(),
            },
            _ => StepError::Spawn {
                tool: tool.to_string(),
                source,
            },
        })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let (status, _, _) = tokio::join!(
            child.wait(),
            forward_lines(tool, stdout),
            forward_lines(tool, stderr)
        );

        let status = status.map_err(|source| StepError::Spawn {
            tool: tool.to_string(),
            source,
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(StepError::ToolFailed {
                tool: tool.to_string(),
                status,
            })
        }
    }
}

async fn forward_lines<R>(tool: &str, reader: Option<R>)
where
    R: AsyncRead + Unpin,
{
    let Some(reader) = reader else {
        return;
    };
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        debug!(tool, "{line}");
    }
}

/// Looks `program` up in a `PATH`-style list of directories.
///
/// A name containing a path separator is checked as given.
pub fn find_in_path(program: &str, path_var: Option<&OsStr>) -> Option<PathBuf> {
    if program.contains(std::path::MAIN_SEPARATOR) || program.contains('/') {
        let candidate = PathBuf::from(program);
        return is_executable(&candidate).then_some(candidate);
    }

    std::env::split_paths(path_var?)
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file() || path.with_extension("exe").is_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invocation_renders_as_command_line() {
        let inv = Invocation::new("assetfinder", ["--subs-only", "example.com"])
            .stdout_to("out/assetfinder_output.txt");
        assert_eq!(
            inv.to_string(),
            "assetfinder --subs-only example.com > out/assetfinder_output.txt"
        );
    }

    #[test]
    fn missing_path_finds_nothing() {
        assert_eq!(find_in_path("subfinder", None), None);
        assert_eq!(find_in_path("subfinder", Some(OsStr::new(""))), None);
    }

    #[cfg(unix)]
    #[test]
    fn finds_only_executable_files() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("subfinder");
        let plain = dir.path().join("amass");
        std::fs::write(&tool, "#!/bin/sh\n").unwrap();
        std::fs::write(&plain, "").unwrap();
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();
        std::fs::set_permissions(&plain, std::fs::Permissions::from_mode(0o644)).unwrap();

        let path_var = std::env::join_paths([dir.path()]).unwrap();
        assert_eq!(find_in_path("subfinder", Some(path_var.as_os_str())), Some(tool));
        assert_eq!(find_in_path("amass", Some(path_var.as_os_str())), None);
        assert_eq!(find_in_path("httpx", Some(path_var.as_os_str())), None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn system_runner_redirects_stdout_and_reports_exit_codes() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.txt");
        std::fs::write(&out, "stale\n").unwrap();

        let echo = Invocation::new("sh", ["-c", "echo a.example.com"]).stdout_to(&out);
        SystemRunner.run(&echo).await.unwrap();
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "a.example.com\n");

        let failing = Invocation::new("sh", ["-c", "echo oops >&2; exit 3"]);
        let err = SystemRunner.run(&failing).await.unwrap_err();
        assert!(matches!(err, StepError::ToolFailed { .. }), "{err:?}");

        let missing = Invocation::new("ionicsub-no-such-tool", Vec::<String>::new());
        let err = SystemRunner.run(&missing).await.unwrap_err();
        assert!(matches!(err, StepError::NotInstalled { .. }), "{err:?}");
    }
}
