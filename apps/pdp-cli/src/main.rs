use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use pdp::PdpModule;
use pdp_sdk::{FlatRequest, Outcome, PolicyDecisionClient, Request, RuleEngine};
use rego_pdp_plugin::RegoEngine;
use tracing_subscriber::EnvFilter;

mod config;

use config::{AppConfig, Overrides};

const EXIT_DENIED: u8 = 1;
const EXIT_MALFORMED: u8 = 2;
const EXIT_ENGINE_FAILURE: u8 = 3;

#[derive(Parser, Debug)]
#[command(name = "pdp-cli", version, about = "Evaluate authorization requests against a policy bundle")]
struct Cli {
    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate one request and print the outcome as JSON
    Eval(EvalCommand),
    /// Load the bundle and check the query without evaluating a request
    CheckBundle(ConfigArgs),
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Policy bundle location, overrides the configuration
    #[arg(long)]
    bundle: Option<PathBuf>,

    /// Query to evaluate, overrides the configuration
    #[arg(long)]
    query: Option<String>,
}

#[derive(Args, Debug)]
struct EvalCommand {
    /// Request document, or `-` for stdin
    #[arg(long)]
    input: PathBuf,

    /// Input uses the flat transport shape instead of the nested request
    #[arg(long)]
    flat: bool,

    #[command(flatten)]
    config: ConfigArgs,
}

impl ConfigArgs {
    fn load(&self) -> anyhow::Result<AppConfig> {
        AppConfig::load(
            self.config.as_deref(),
            &Overrides {
                bundle: self.bundle.clone(),
                query: self.query.clone(),
            },
        )
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    match cli.command {
        Commands::Eval(cmd) => eval(&cmd).await,
        Commands::CheckBundle(args) => check_bundle(&args).await,
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn eval(cmd: &EvalCommand) -> ExitCode {
    let request = match read_request(&cmd.input, cmd.flat) {
        Ok(request) => request,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "unreadable request");
            return ExitCode::from(EXIT_MALFORMED);
        }
    };

    let evaluation = match evaluate(&cmd.config, &request).await {
        Ok(evaluation) => evaluation,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "policy decision point unavailable");
            return ExitCode::from(EXIT_ENGINE_FAILURE);
        }
    };

    match serde_json::to_string_pretty(&evaluation.report()) {
        Ok(json) => println!("{json}"),
        Err(e) => tracing::error!(error = %e, "failed to render evaluation"),
    }

    match evaluation.decision.outcome() {
        Outcome::Allowed => ExitCode::SUCCESS,
        Outcome::Denied | Outcome::Undefined => ExitCode::from(EXIT_DENIED),
        Outcome::Malformed => ExitCode::from(EXIT_MALFORMED),
        Outcome::EngineFailure => ExitCode::from(EXIT_ENGINE_FAILURE),
    }
}

async fn evaluate(args: &ConfigArgs, request: &Request) -> anyhow::Result<pdp_sdk::Evaluation> {
    let cfg = args.load()?;
    let rules: Arc<dyn RuleEngine> = Arc::new(RegoEngine::new(cfg.rego_pdp_plugin));
    let module = PdpModule::new();
    let client = module.init(rules, &cfg.pdp).await?;
    Ok(client.evaluate(request).await)
}

async fn check_bundle(args: &ConfigArgs) -> ExitCode {
    let result = async {
        let cfg = args.load()?;
        let rules = RegoEngine::new(cfg.rego_pdp_plugin);
        pdp::DecisionEngine::prepare(&rules, &cfg.pdp).await?;
        anyhow::Ok(cfg.pdp.bundle_path)
    }
    .await;

    match result {
        Ok(bundle) => {
            println!("bundle {} is ready", bundle.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "bundle check failed");
            ExitCode::from(EXIT_ENGINE_FAILURE)
        }
    }
}

fn read_request(input: &Path, flat: bool) -> anyhow::Result<Request> {
    let raw = if input == Path::new("-") {
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .context("failed to read request from stdin")?;
        raw
    } else {
        std::fs::read_to_string(input)
            .with_context(|| format!("failed to read {}", input.display()))?
    };

    if flat {
        let flat: FlatRequest =
            serde_json::from_str(&raw).context("request is not a flat request document")?;
        Ok(flat.into())
    } else {
        serde_json::from_str(&raw).context("request is not a request document")
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use pdp_sdk::{Operation, SubjectKind};
    use tracing_test::traced_test;

    #[test]
    fn cli_parses_eval_flags() {
        let cli = Cli::try_parse_from([
            "pdp-cli", "eval", "--input", "-", "--flat", "--bundle", "/srv/bundle",
        ])
        .unwrap();
        let Commands::Eval(cmd) = cli.command else {
            panic!("expected eval");
        };
        assert!(cmd.flat);
        assert_eq!(cmd.input, PathBuf::from("-"));
        assert_eq!(cmd.config.bundle, Some(PathBuf::from("/srv/bundle")));
    }

    #[test]
    fn reads_flat_request_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("req.json");
        std::fs::write(
            &path,
            r#"{"resource": "post", "subject_type": "bot", "subject_id": "b1", "action": "read", "resource_team_id": "t1"}"#,
        )
        .unwrap();

        let request = read_request(&path, true).unwrap();
        let subject = request.subject.unwrap();
        assert_eq!(subject.kind, SubjectKind::NonPersonEntity);
        assert_eq!(subject.id, "b1");
        assert_eq!(request.operation, Some(Operation::Read));
    }

    #[test]
    fn rejects_non_json_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("req.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(read_request(&path, false).is_err());
    }

    const POLICY: &str = r#"
package application.authz

import rego.v1

default allow := false

allow if {
	input.operation == "read"
	input.resource.attributes.owner == input.subject.id
}
"#;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn eval_command(input: PathBuf, bundle: PathBuf) -> EvalCommand {
        EvalCommand {
            input,
            flat: false,
            config: ConfigArgs {
                config: None,
                bundle: Some(bundle),
                query: None,
            },
        }
    }

    fn read_request_doc(subject: &str, owner: &str) -> String {
        format!(
            r#"{{
                "subject": {{"type": "person", "id": "{subject}", "attributes": {{}}}},
                "operation": "read",
                "resource": {{"type": "post", "attributes": {{"owner": "{owner}"}}}}
            }}"#
        )
    }

    #[tokio::test]
    async fn eval_exit_codes_follow_the_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = write(dir.path(), "policy.rego", POLICY);

        let allowed = write(dir.path(), "allowed.json", &read_request_doc("u1", "u1"));
        assert_eq!(
            eval(&eval_command(allowed, bundle.clone())).await,
            ExitCode::SUCCESS
        );

        let denied = write(dir.path(), "denied.json", &read_request_doc("u2", "u1"));
        assert_eq!(
            eval(&eval_command(denied, bundle.clone())).await,
            ExitCode::from(EXIT_DENIED)
        );

        let malformed = write(
            dir.path(),
            "malformed.json",
            r#"{"operation": "read", "resource": {"type": "post", "attributes": {}}}"#,
        );
        assert_eq!(
            eval(&eval_command(malformed, bundle.clone())).await,
            ExitCode::from(EXIT_MALFORMED)
        );

        let garbage = write(dir.path(), "garbage.json", "not json");
        assert_eq!(
            eval(&eval_command(garbage, bundle)).await,
            ExitCode::from(EXIT_MALFORMED)
        );
    }

    #[tokio::test]
    async fn eval_against_unpreparable_bundle_is_an_engine_failure() {
        let dir = tempfile::tempdir().unwrap();
        let input = write(dir.path(), "req.json", &read_request_doc("u1", "u1"));
        let broken = write(dir.path(), "broken.rego", "package application.authz\n\nallow {{{");

        assert_eq!(
            eval(&eval_command(input.clone(), broken)).await,
            ExitCode::from(EXIT_ENGINE_FAILURE)
        );
        assert_eq!(
            eval(&eval_command(input, dir.path().join("absent"))).await,
            ExitCode::from(EXIT_ENGINE_FAILURE)
        );
    }

    #[tokio::test]
    async fn check_bundle_accepts_valid_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = write(dir.path(), "policy.rego", POLICY);
        let code = check_bundle(&ConfigArgs {
            config: None,
            bundle: Some(bundle),
            query: None,
        })
        .await;
        assert_eq!(code, ExitCode::SUCCESS);
    }

    #[tokio::test]
    #[traced_test]
    async fn missing_bundle_is_an_engine_failure() {
        let dir = tempfile::tempdir().unwrap();
        let code = check_bundle(&ConfigArgs {
            config: None,
            bundle: Some(dir.path().join("absent")),
            query: None,
        })
        .await;
        assert_eq!(code, ExitCode::from(EXIT_ENGINE_FAILURE));
        assert!(logs_contain("bundle check failed"));
    }
}
