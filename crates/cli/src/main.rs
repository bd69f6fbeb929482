//! pmapi-verify - Main Entry Point
//!
//! Runs the smoke and approval-workflow checks against a live
//! project-management API and exits non-zero when anything fails.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use pmapi_verify::{Harness, HarnessConfig, Suite, TransportKind, DEFAULT_BASE_URL};

mod output;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TransportArg {
    /// In-process HTTP client
    Native,
    /// External curl process
    Curl,
}

impl From<TransportArg> for TransportKind {
    fn from(arg: TransportArg) -> Self {
        match arg {
            TransportArg::Native => TransportKind::Native,
            TransportArg::Curl => TransportKind::Curl,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SuiteArg {
    Approvals,
    Smoke,
    All,
}

impl From<SuiteArg> for Suite {
    fn from(arg: SuiteArg) -> Self {
        match arg {
            SuiteArg::Approvals => Suite::Approvals,
            SuiteArg::Smoke => Suite::Smoke,
            SuiteArg::All => Suite::All,
        }
    }
}

/// Verification harness for the project-management REST API
#[derive(Parser)]
#[command(name = "pmapi-verify")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// API base URL including the version prefix
    #[arg(long, env = "PMAPI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// HTTP transport
    #[arg(long, value_enum, default_value = "native")]
    transport: TransportArg,

    /// curl executable for the curl transport
    #[arg(long, default_value = "curl")]
    curl_binary: PathBuf,

    /// Which checks to run
    #[arg(long, value_enum, default_value = "all")]
    suite: SuiteArg,

    /// Prefix for the generated account email
    #[arg(long, default_value = "approver")]
    email_prefix: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

impl Cli {
    fn config(&self) -> HarnessConfig {
        HarnessConfig {
            base_url: self.base_url.clone(),
            transport: self.transport.into(),
            curl_binary: self.curl_binary.clone(),
            suite: self.suite.into(),
            email_prefix: self.email_prefix.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
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

    match run(&cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("❌ {:#}", e);
            ExitCode::from(2)
        }
    }
}

async fn run(cli: &Cli) -> anyhow::Result<bool> {
    let harness = Harness::new(cli.config())?;
    tracing::info!(base_url = %cli.base_url, "Starting verification");

    let mut reporter = output::ConsoleReporter::new(cli.no_color);
    let summary = harness.run(&mut reporter).await;

    Ok(summary.success())
}
