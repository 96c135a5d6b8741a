use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ionicsub_common::config::{Config, FailurePolicy, StepId};
use ionicsub_common::error::StepError;
use ionicsub_common::target::Domain;
use ionicsub_common::workspace::{self as files, RunDirectory};
use ionicsub_core::fetch::{FetchedBody, HttpFetch};
use ionicsub_core::process::{Invocation, ProcessRunner};
use ionicsub_core::{Engine, StepOutcome};

/// What a scripted tool does when it is run.
#[derive(Clone)]
enum Script {
    Writes(&'static str),
    Missing,
}

/// Writes canned output to wherever the invocation points (`-o` or stdout).
struct ScriptedRunner {
    scripts: HashMap<&'static str, Script>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    fn new(scripts: &[(&'static str, Script)]) -> Self {
        Self {
            scripts: scripts.iter().cloned().collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

fn output_of(invocation: &Invocation) -> Option<PathBuf> {
    if let Some(path) = &invocation.stdout {
        return Some(path.clone());
    }
    let idx = invocation.args.iter().position(|a| a == "-o")?;
    invocation.args.get(idx + 1).map(PathBuf::from)
}

#[async_trait]
impl ProcessRunner for ScriptedRunner {
    fn locate(&self, program: &str) -> Option<PathBuf> {
        match self.scripts.get(program) {
            Some(Script::Writes(_)) => Some(PathBuf::from("/usr/bin").join(program)),
            _ => None,
        }
    }

    async fn run(&self, invocation: &Invocation) -> Result<(), StepError> {
        self.calls.lock().unwrap().push(invocation.program.clone());

        match self.scripts.get(invocation.program.as_str()) {
            Some(Script::Writes(content)) => {
                if let Some(path) = output_of(invocation) {
                    fs::write(&path, content).map_err(|e| StepError::io(&path, e))?;
                }
                Ok(())
            }
            Some(Script::Missing) | None => Err(StepError::NotInstalled {
                tool: invocation.program.clone(),
            }),
        }
    }
}

struct CannedFeeds {
    crt: Option<&'static str>,
    certspotter: Option<&'static str>,
}

#[async_trait]
impl HttpFetch for CannedFeeds {
    async fn get(&self, url: &str) -> Result<FetchedBody, StepError> {
        let body = if url.contains("crt.sh") {
            self.crt
        } else {
            self.certspotter
        };
        body.map(|b| FetchedBody {
            status: 200,
            body: b.as_bytes().to_vec(),
        })
        .ok_or_else(|| StepError::Http {
            url: url.to_string(),
            reason: "connection refused".to_string(),
        })
    }
}

const CRT_JSON: &str = r#"[{"name_value":"*.example.com\nmail.example.com"},{"name_value":"www.example.com"}]"#;
const CERTSPOTTER_JSON: &str = r#"[{"dns_names":["api.example.com","*.dev.example.com"]}]"#;
const FFUF_JSON: &str = r#"{"results":[{"input":{"FUZZ":"admin"}}]}"#;
const HTTPX_LIVE: &str = "https://www.example.com [200]\n\
https://api.example.com [301]\n\
https://mail.example.com [200]\n\
https://dev.example.com [404]\n";

fn healthy_tools() -> Vec<(&'static str, Script)> {
    vec![
        ("subfinder", Script::Writes("www.example.com\napi.example.com\n")),
        ("amass", Script::Writes("mail.example.com\n")),
        ("assetfinder", Script::Writes("www.example.com\nshop.example.com\n")),
        ("sublist3r", Script::Writes("blog.example.com\n")),
        ("ffuf", Script::Writes(FFUF_JSON)),
        ("alterx", Script::Writes("www1.example.com\nwww2.example.com\n")),
        ("dnsx", Script::Writes("www1.example.com\n")),
        ("httpx", Script::Writes(HTTPX_LIVE)),
    ]
}

fn feeds() -> Arc<CannedFeeds> {
    Arc::new(CannedFeeds {
        crt: Some(CRT_JSON),
        certspotter: Some(CERTSPOTTER_JSON),
    })
}

fn domain() -> Domain {
    Domain::from_str("example.com").unwrap()
}

fn lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn full_run_produces_every_artifact() {
    let tmp = tempfile::tempdir().unwrap();
    let run = RunDirectory::pinned(tmp.path().join("scan"));
    let cfg = Config {
        wordlist: Some(PathBuf::from("/opt/words.txt")),
        ..Config::default()
    };
    let runner = Arc::new(ScriptedRunner::new(&healthy_tools()));
    let engine = Engine::new(runner.clone(), feeds());

    let report = engine.enumerate(&domain(), run.clone(), &cfg).await.unwrap();

    assert_eq!(
        lines(&run.file(files::CRT_SUBS)),
        ["example.com", "mail.example.com", "www.example.com"]
    );
    assert_eq!(
        lines(&run.file(files::FFUF_SUBS)),
        ["admin.example.com"]
    );

    // Sorted union of every list plus the one resolved permutation.
    assert_eq!(
        lines(&run.file(files::ALL_SUBDOMAINS)),
        [
            "admin.example.com",
            "api.example.com",
            "blog.example.com",
            "dev.example.com",
            "example.com",
            "mail.example.com",
            "shop.example.com",
            "www.example.com",
            "www1.example.com",
        ]
    );

    assert_eq!(
        lines(&run.status_partition("200")),
        ["www.example.com 200", "mail.example.com 200"]
    );
    assert_eq!(lines(&run.status_partition("301")), ["api.example.com 301"]);
    assert_eq!(lines(&run.file(files::STATUS_CODES)).len(), 4);

    assert_eq!(report.subdomains, 9);
    assert_eq!(report.live_hosts, 4);
    assert_eq!(report.status_counts.get("200"), Some(&2));
    assert_eq!(report.status_counts.get("404"), Some(&1));
    assert!(report.steps.iter().all(|s| s.outcome == StepOutcome::Completed));
    assert_eq!(report.steps.len(), StepId::ALL.len());

    // Merge steps run in order after every collector.
    let calls = runner.calls();
    let tail: Vec<&str> = calls[calls.len() - 3..].iter().map(String::as_str).collect();
    assert_eq!(tail, ["alterx", "dnsx", "httpx"]);
}

#[tokio::test]
async fn best_effort_failures_do_not_stop_the_run() {
    let tmp = tempfile::tempdir().unwrap();
    let run = RunDirectory::pinned(tmp.path());
    let mut tools = healthy_tools();
    for (name, script) in tools.iter_mut() {
        if matches!(*name, "subfinder" | "amass" | "alterx" | "dnsx") {
            *script = Script::Missing;
        }
    }
    let engine = Engine::new(Arc::new(ScriptedRunner::new(&tools)), feeds());

    let report = engine.enumerate(&domain(), run.clone(), &Config::default()).await.unwrap();

    assert!(matches!(report.outcome(StepId::Subfinder), Some(StepOutcome::Failed(_))));
    assert!(matches!(report.outcome(StepId::Dnsx), Some(StepOutcome::Failed(_))));
    // No resolved permutations file, nothing to append.
    assert_eq!(
        report.outcome(StepId::MergePermutations),
        Some(&StepOutcome::Completed)
    );
    assert!(matches!(report.outcome(StepId::Ffuf), Some(StepOutcome::Skipped(_))));
    assert_eq!(report.outcome(StepId::Classify), Some(&StepOutcome::Completed));
    assert!(lines(&run.file(files::ALL_SUBDOMAINS)).contains(&"shop.example.com".to_string()));
    assert!(!run.file(files::FFUF_OUTPUT).exists());
}

#[tokio::test]
async fn fatal_failure_aborts_before_merging() {
    let tmp = tempfile::tempdir().unwrap();
    let run = RunDirectory::pinned(tmp.path().join("scan"));
    let mut tools = healthy_tools();
    tools.retain(|(name, _)| *name != "assetfinder");
    let runner = Arc::new(ScriptedRunner::new(&tools));
    let engine = Engine::new(runner.clone(), feeds());

    let err = engine
        .enumerate(&domain(), run.clone(), &Config::default())
        .await
        .unwrap_err();

    assert!(format!("{err:#}").contains("assetfinder"), "{err:#}");
    assert!(run.root().is_dir());
    assert!(!run.file(files::ALL_SUBDOMAINS).exists());
    assert!(!runner.calls().iter().any(|c| c == "httpx"));
}

#[tokio::test]
async fn policy_override_makes_a_step_fatal() {
    let tmp = tempfile::tempdir().unwrap();
    let run = RunDirectory::pinned(tmp.path());
    let mut tools = healthy_tools();
    tools.retain(|(name, _)| *name != "sublist3r");
    let mut cfg = Config::default();
    cfg.policies.insert(StepId::Sublist3r, FailurePolicy::Fatal);

    let engine = Engine::new(Arc::new(ScriptedRunner::new(&tools)), feeds());
    assert!(engine.enumerate(&domain(), run, &cfg).await.is_err());
}

#[tokio::test]
async fn unreachable_feed_is_logged_and_extraction_decides() {
    let tmp = tempfile::tempdir().unwrap();
    let run = RunDirectory::pinned(tmp.path());
    let engine = Engine::new(
        Arc::new(ScriptedRunner::new(&healthy_tools())),
        Arc::new(CannedFeeds {
            crt: Some(CRT_JSON),
            certspotter: None,
        }),
    );

    // The fetch error itself is swallowed, the missing body then fails
    // extraction and certspotter is fatal by default.
    let err = engine
        .enumerate(&domain(), run.clone(), &Config::default())
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("certspotter"), "{err:#}");

    let mut cfg = Config::default();
    cfg.policies.insert(StepId::Certspotter, FailurePolicy::BestEffort);
    let report = engine.enumerate(&domain(), run, &cfg).await.unwrap();
    assert!(matches!(report.outcome(StepId::Certspotter), Some(StepOutcome::Failed(_))));
    assert_eq!(report.outcome(StepId::Crt), Some(&StepOutcome::Completed));
}

#[tokio::test]
async fn skipped_steps_never_run() {
    let tmp = tempfile::tempdir().unwrap();
    let run = RunDirectory::pinned(tmp.path());
    let runner = Arc::new(ScriptedRunner::new(&healthy_tools()));
    let engine = Engine::new(runner.clone(), feeds());
    let mut cfg = Config::default();
    cfg.skipped.extend([StepId::Amass, StepId::Alterx, StepId::Dnsx]);

    let report = engine.enumerate(&domain(), run, &cfg).await.unwrap();

    let calls = runner.calls();
    assert!(!calls.iter().any(|c| c == "amass" || c == "alterx" || c == "dnsx"));
    assert!(matches!(report.outcome(StepId::Amass), Some(StepOutcome::Skipped(_))));
}

#[tokio::test]
async fn existing_run_directory_is_reused() {
    let tmp = tempfile::tempdir().unwrap();
    let run = RunDirectory::pinned(tmp.path());
    fs::write(tmp.path().join("notes.txt"), "keep me\n").unwrap();
    fs::create_dir_all(run.httpx_dir()).unwrap();
    fs::write(run.status_partition("500"), "old.example.com 500\n").unwrap();

    let engine = Engine::new(Arc::new(ScriptedRunner::new(&healthy_tools())), feeds());
    let report = engine.enumerate(&domain(), run.clone(), &Config::default()).await.unwrap();

    assert_eq!(fs::read_to_string(tmp.path().join("notes.txt")).unwrap(), "keep me\n");
    assert!(!run.status_partition("500").exists());
    assert!(!report.status_counts.contains_key("500"));
}

#[tokio::test]
async fn install_runs_once_per_missing_tool() {
    let mut tools = healthy_tools();
    tools.retain(|(name, _)| *name != "dnsx");
    // `go` itself succeeds at installing.
    tools.push(("go", Script::Writes("")));
    let runner = Arc::new(ScriptedRunner::new(&tools));
    let engine = Engine::new(runner.clone(), feeds());

    engine.install(&Config::default()).await.unwrap();

    assert_eq!(runner.calls(), ["go"]);
}

#[tokio::test]
async fn rerun_into_the_same_directory_overwrites_outputs() {
    let tmp = tempfile::tempdir().unwrap();
    let run = RunDirectory::pinned(tmp.path().join("scan"));
    let engine = Engine::new(Arc::new(ScriptedRunner::new(&healthy_tools())), feeds());
    let cfg = Config::default();

    engine.enumerate(&domain(), run.clone(), &cfg).await.unwrap();
    let all = lines(&run.file(files::ALL_SUBDOMAINS));
    let status = lines(&run.file(files::STATUS_CODES));
    let ok = lines(&run.status_partition("200"));

    engine.enumerate(&domain(), run.clone(), &cfg).await.unwrap();

    assert_eq!(lines(&run.file(files::ALL_SUBDOMAINS)), all);
    assert_eq!(lines(&run.file(files::STATUS_CODES)), status);
    assert_eq!(lines(&run.status_partition("200")), ok);
    let appended = all.iter().filter(|l| *l == "www1.example.com").count();
    assert_eq!(appended, 1);
}
