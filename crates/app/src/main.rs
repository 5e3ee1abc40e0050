//! Cadastre acceptance runner.
//!
//! Runs the role suites against the configured deployment, prints one
//! report per suite and exits with status 1 if any scenario failed.

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use cadastre_acceptance::{Suite, run_all};
use cadastre_application::TestScenarioHarness;
use cadastre_domain::{ScenarioOutcome, SuiteReport};
use cadastre_infrastructure::{ReqwestTransport, Settings, TestRunner, logging};
use clap::Parser;
use tracing::info;

/// Black-box acceptance run against a cadastre deployment
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Suites to run, in the given order; every suite when omitted
    suites: Vec<String>,

    /// Settings file; takes precedence over `CADASTRE_CONFIG`
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Service root; takes precedence over the settings file
    #[arg(long)]
    base_url: Option<String>,

    /// Stop checking a response at its first failed assertion
    #[arg(long)]
    stop_on_failure: bool,

    /// Print the suite names and exit
    #[arg(long)]
    list: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    logging::init();
    let args = Args::parse();

    if args.list {
        for suite in Suite::ALL {
            println!("{suite}");
        }
        return Ok(());
    }

    let suites = select(&args.suites)?;
    let settings = settings(&args)?;
    info!(base_url = %settings.base_url, suites = suites.len(), "starting acceptance run");

    let transport = Arc::new(ReqwestTransport::new(settings.timeout())?);
    let verifier = Arc::new(TestRunner::new().with_stop_on_failure(args.stop_on_failure));
    let mut harness = TestScenarioHarness::new(transport, verifier, settings.base_url.clone());

    let reports = run_all(&mut harness, &settings, &suites).await?;
    for report in &reports {
        println!("{report}");
    }
    let failed = summarize(&reports);
    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn select(names: &[String]) -> Result<Vec<Suite>, String> {
    if names.is_empty() {
        return Ok(Suite::ALL.to_vec());
    }
    names
        .iter()
        .map(|name| Suite::from_name(name).ok_or_else(|| format!("unknown suite: {name}")))
        .collect()
}

fn settings(args: &Args) -> Result<Settings, Box<dyn Error>> {
    let mut settings = match &args.config {
        Some(path) => {
            let mut settings = Settings::from_file(path)?;
            settings.apply_overrides(|key| std::env::var(key).ok())?;
            settings
        }
        None => Settings::load()?,
    };
    if let Some(base_url) = &args.base_url {
        settings.base_url.clone_from(base_url);
    }
    Ok(settings)
}

/// Prints the run totals and returns the number of failed scenarios.
fn summarize(reports: &[SuiteReport]) -> usize {
    let count = |outcome| reports.iter().map(|r| r.count(outcome)).sum::<usize>();
    let (passed, failed, skipped) = (
        count(ScenarioOutcome::Passed),
        count(ScenarioOutcome::Failed),
        count(ScenarioOutcome::Skipped),
    );
    println!("== total: {passed} passed, {failed} failed, {skipped} skipped");
    failed
}
