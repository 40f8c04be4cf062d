use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::Serialize;

use report_lens::config::Config;
use report_lens::credential::{self, LOCAL_CONFIG_FILE};
use report_lens::{
    Diagnostics, InsightClient, ResultLoader, RunSummary, TestResultRecord, VideoLocator, report,
};

/// Summarize an Allure test run and optionally ask an LLM about its failures
#[derive(Parser)]
#[command(name = "report-lens")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding the `*-result.json` artifacts
    #[arg(long)]
    results: Option<PathBuf>,

    /// Directory holding the recorded test videos
    #[arg(long)]
    videos: Option<PathBuf>,

    /// Config file (defaults to ./report-lens.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also ask for insights on this test
    #[arg(long)]
    test: Option<String>,

    /// Skip the LLM entirely
    #[arg(long)]
    no_ai: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable report blocks
    Text,
    /// One JSON document on stdout
    Json,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    summary: RunSummary,
    failures: Vec<&'a TestResultRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure_analysis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    test_insight: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let diagnostics = Arc::new(Diagnostics::new());
    let workspace = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let config = match cli.config {
        Some(ref path) => Config::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::load(&workspace, &diagnostics),
    };

    let results_dir = cli.results.clone().unwrap_or(config.paths.results);
    let videos_dir = cli.videos.clone().unwrap_or(config.paths.videos);

    let loader = ResultLoader::new(
        &results_dir,
        VideoLocator::new(&videos_dir),
        Arc::clone(&diagnostics),
    );
    let records = loader.load();

    let client = if cli.no_ai {
        InsightClient::disabled(Arc::clone(&diagnostics))
    } else {
        let credential = credential::resolve(
            |name| std::env::var(name).ok(),
            &local_config_path(&workspace, cli.config.as_deref()),
            &diagnostics,
        );
        InsightClient::connect(credential, &config.insight, Arc::clone(&diagnostics)).await
    };

    let failure_analysis = if client.is_enabled() {
        Some(client.analyze_failures(&records).await)
    } else {
        None
    };
    let test_insight = match cli.test {
        Some(ref name) => Some(client.insight_for_test(&records, name).await),
        None => None,
    };

    match cli.format {
        OutputFormat::Text => {
            println!("{}", report::summarize(&records));
            println!();
            println!("{}", report::failure_report(&records));
            if let Some(analysis) = failure_analysis {
                println!("--- LLM Analysis of Failures ---");
                println!("{}", analysis);
            }
            if let (Some(name), Some(insight)) = (cli.test.as_deref(), test_insight) {
                println!("--- LLM Insight for Test: {} ---", name);
                println!("{}", insight);
            }
        }
        OutputFormat::Json => {
            let doc = JsonReport {
                summary: RunSummary::from_records(&records),
                failures: report::failed(&records).collect(),
                failure_analysis,
                test_insight,
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&doc).context("failed to serialize report")?
            );
        }
    }

    Ok(())
}

/// The git-ignored credential file sits next to the config file in use.
fn local_config_path(workspace: &Path, config: Option<&Path>) -> PathBuf {
    config
        .and_then(Path::parent)
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(workspace)
        .join(LOCAL_CONFIG_FILE)
}

#[cfg(test)]
mod tests {
    use report_lens::config::CONFIG_FILE;

    use super::*;

    #[test]
    fn local_config_follows_explicit_config() {
        let workspace = Path::new("/work");
        assert_eq!(
            local_config_path(workspace, None),
            PathBuf::from("/work").join(LOCAL_CONFIG_FILE)
        );
        assert_eq!(
            local_config_path(workspace, Some(Path::new("/etc/lens/").join(CONFIG_FILE).as_path())),
            PathBuf::from("/etc/lens").join(LOCAL_CONFIG_FILE)
        );
        assert_eq!(
            local_config_path(workspace, Some(Path::new(CONFIG_FILE))),
            PathBuf::from("/work").join(LOCAL_CONFIG_FILE)
        );
    }

    #[test]
    fn cli_parses_flags() {
        let cli = Cli::parse_from([
            "report-lens",
            "--results",
            "out/allure-results",
            "--test",
            "Seek to near end of video and validate end state",
            "--format",
            "json",
            "--no-ai",
        ]);
        assert_eq!(cli.results, Some(PathBuf::from("out/allure-results")));
        assert!(cli.no_ai);
        assert!(matches!(cli.format, OutputFormat::Json));
    }
}
