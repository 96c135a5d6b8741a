//! The fixed step plan of an enumeration run.

use std::path::PathBuf;

use ionicsub_common::config::{Config, StepId};
use ionicsub_common::target::Domain;
use ionicsub_common::workspace::{self as files, RunDirectory};

use crate::extract::JsonSource;
use crate::fetch;
use crate::process::Invocation;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Tool(Invocation),
    /// Transport errors are logged and skipped regardless of the step policy.
    Fetch { url: String, output: PathBuf },
    Extract {
        source: JsonSource,
        input: PathBuf,
        output: PathBuf,
    },
    Merge { inputs: Vec<PathBuf>, output: PathBuf },
    Append { source: PathBuf, target: PathBuf },
    Classify { live: PathBuf },
}

#[derive(Clone, Debug)]
pub struct Step {
    pub id: StepId,
    pub actions: Vec<Action>,
    /// Set when the step cannot run with the current configuration.
    pub unavailable: Option<String>,
}

impl Step {
    fn new(id: StepId, actions: Vec<Action>) -> Self {
        Self {
            id,
            actions,
            unavailable: None,
        }
    }

    fn tool(id: StepId, args: Vec<String>) -> Self {
        let program = id.tool().unwrap_or(id.as_str());
        Self::new(id, vec![Action::Tool(Invocation::new(program, args))])
    }
}

/// Collectors are independent of each other and write disjoint files.
/// Merge steps depend on everything before them and run in order.
#[derive(Clone, Debug)]
pub struct Plan {
    pub collectors: Vec<Step>,
    pub merge: Vec<Step>,
}

fn path(p: PathBuf) -> String {
    p.display().to_string()
}

impl Plan {
    pub fn build(domain: &Domain, run: &RunDirectory, cfg: &Config) -> Self {
        let d: String = domain.to_string();

        let assetfinder = Step::new(
            StepId::Assetfinder,
            vec![Action::Tool(
                Invocation::new("assetfinder", ["--subs-only", d.as_str()])
                    .stdout_to(run.file(files::ASSETFINDER_OUTPUT)),
            )],
        );

        let crt = Step::new(
            StepId::Crt,
            vec![
                Action::Fetch {
                    url: fetch::crt_sh_url(&d),
                    output: run.file(files::CRT_OUTPUT),
                },
                Action::Extract {
                    source: JsonSource::CrtSh,
                    input: run.file(files::CRT_OUTPUT),
                    output: run.file(files::CRT_SUBS),
                },
            ],
        );

        let certspotter = Step::new(
            StepId::Certspotter,
            vec![
                Action::Fetch {
                    url: fetch::certspotter_url(&d),
                    output: run.file(files::CERTSPOTTER_OUTPUT),
                },
                Action::Extract {
                    source: JsonSource::Certspotter,
                    input: run.file(files::CERTSPOTTER_OUTPUT),
                    output: run.file(files::CERTSPOTTER_SUBS),
                },
            ],
        );

        let collectors = vec![
            Step::tool(
                StepId::Subfinder,
                vec!["-d".into(), d.clone(), "-all".into(), "-o".into(), path(run.file(files::SUBFINDER_OUTPUT))],
            ),
            Step::tool(
                StepId::Amass,
                vec![
                    "enum".into(),
                    "-active".into(),
                    "-brute".into(),
                    "-d".into(),
                    d.clone(),
                    "-o".into(),
                    path(run.file(files::AMASS_OUTPUT)),
                ],
            ),
            assetfinder,
            Step::tool(
                StepId::Sublist3r,
                vec!["-d".into(), d.clone(), "-o".into(), path(run.file(files::SUBLIST3R_OUTPUT))],
            ),
            crt,
            certspotter,
            ffuf_step(&d, run, cfg),
        ];

        let all = run.file(files::ALL_SUBDOMAINS);
        let merge = vec![
            Step::new(
                StepId::Aggregate,
                vec![Action::Merge {
                    inputs: run.aggregate_inputs(),
                    output: all.clone(),
                }],
            ),
            Step::tool(
                StepId::Alterx,
                vec!["-l".into(), path(all.clone()), "-silent".into(), "-o".into(), path(run.file(files::PERMUTATIONS))],
            ),
            Step::tool(
                StepId::Dnsx,
                vec![
                    "-l".into(),
                    path(run.file(files::PERMUTATIONS)),
                    "-silent".into(),
                    "-o".into(),
                    path(run.file(files::RESOLVED_PERMUTATIONS)),
                ],
            ),
            Step::new(
                StepId::MergePermutations,
                vec![Action::Append {
                    source: run.file(files::RESOLVED_PERMUTATIONS),
                    target: all.clone(),
                }],
            ),
            Step::tool(
                StepId::Httpx,
                vec![
                    "-l".into(),
                    path(all),
                    "-silent".into(),
                    "-threads".into(),
                    cfg.threads.to_string(),
                    "-status-code".into(),
                    "-no-color".into(),
                    "-o".into(),
                    path(run.file(files::LIVE_SUBDOMAINS)),
                ],
            ),
            Step::new(
                StepId::Classify,
                vec![Action::Classify {
                    live: run.file(files::LIVE_SUBDOMAINS),
                }],
            ),
        ];

        Self { collectors, merge }
    }

    pub fn steps(&self) -> impl Iterator<Item = &Step> {
        self.collectors.iter().chain(self.merge.iter())
    }
}

fn ffuf_step(domain: &str, run: &RunDirectory, cfg: &Config) -> Step {
    let Some(wordlist) = &cfg.wordlist else {
        return Step {
            id: StepId::Ffuf,
            actions: Vec::new(),
            unavailable: Some("no wordlist configured (--wordlist or IONICSUB_WORDLIST)".into()),
        };
    };

    Step::new(
        StepId::Ffuf,
        vec![
            Action::Tool(Invocation::new(
                "ffuf",
                [
                    "-w".to_string(),
                    wordlist.display().to_string(),
                    "-u".to_string(),
                    format!("https://FUZZ.{domain}"),
                    "-of".to_string(),
                    "json".to_string(),
                    "-o".to_string(),
                    path(run.file(files::FFUF_OUTPUT)),
                ],
            )),
            Action::Extract {
                source: JsonSource::Ffuf {
                    domain: domain.to_string(),
                },
                input: run.file(files::FFUF_OUTPUT),
                output: run.file(files::FFUF_SUBS),
            },
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn build(cfg: &Config) -> (Plan, RunDirectory) {
        let domain = Domain::from_str("example.com").unwrap();
        let run = RunDirectory::pinned("out");
        (Plan::build(&domain, &run, cfg), run)
    }

    #[test]
    fn every_step_appears_once_in_order() {
        let (plan, _) = build(&Config::default());
        let ids: Vec<StepId> = plan.steps().map(|s| s.id).collect();
        assert_eq!(ids, StepId::ALL);
        assert_eq!(plan.collectors.len(), 7);
    }

    #[test]
    fn assetfinder_redirects_stdout() {
        let (plan, run) = build(&Config::default());
        let step = plan.steps().find(|s| s.id == StepId::Assetfinder).unwrap();
        let Action::Tool(inv) = &step.actions[0] else {
            panic!("assetfinder must run a tool");
        };
        assert_eq!(inv.args, ["--subs-only", "example.com"]);
        assert_eq!(inv.stdout, Some(run.file(files::ASSETFINDER_OUTPUT)));
    }

    #[test]
    fn probe_threads_come_from_config() {
        let cfg = Config {
            threads: 25,
            ..Config::default()
        };
        let (plan, _) = build(&cfg);
        let step = plan.steps().find(|s| s.id == StepId::Httpx).unwrap();
        let Action::Tool(inv) = &step.actions[0] else {
            panic!("httpx must run a tool");
        };
        let idx = inv.args.iter().position(|a| a == "-threads").unwrap();
        assert_eq!(inv.args[idx + 1], "25");
    }

    #[test]
    fn ffuf_needs_a_wordlist() {
        let (plan, _) = build(&Config::default());
        let ffuf = plan.steps().find(|s| s.id == StepId::Ffuf).unwrap();
        assert!(ffuf.unavailable.is_some());

        let cfg = Config {
            wordlist: Some(PathBuf::from("/opt/words.txt")),
            ..Config::default()
        };
        let (plan, _) = build(&cfg);
        let ffuf = plan.steps().find(|s| s.id == StepId::Ffuf).unwrap();
        assert!(ffuf.unavailable.is_none());
        let Action::Tool(inv) = &ffuf.actions[0] else {
            panic!("ffuf must run a tool");
        };
        assert!(inv.args.contains(&"/opt/words.txt".to_string()));
        assert!(inv.args.contains(&"https://FUZZ.example.com".to_string()));
    }
}
