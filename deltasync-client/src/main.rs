//! Deltasync - Main entry point
//!
//! Runs one pull or push session against a remote sync service.

use anyhow::Result;
use clap::{CommandFactory, Parser};
use deltasync_client::{
    config::Config,
    session::validate_local_root,
    shutdown::ShutdownCoordinator,
    sync::FastRsyncEngine,
    utils,
    Direction, HttpTransport, SyncClient, SyncError, SyncSession,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Remote sync service URL (http or https)
    #[arg(short, long, value_name = "URL")]
    target: String,

    /// Local directory to synchronize
    #[arg(short, long, value_name = "DIR")]
    source: PathBuf,

    /// Base path on the remote side
    #[arg(short, long, value_name = "PATH")]
    base: Option<String>,

    /// Direction: f (pull, remote to local) or b (push, local to remote)
    #[arg(short, long, default_value = "f")]
    direction: String,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    // Load configuration
    let config = if let Some(config_path) = &args.config {
        Config::from_file(config_path)?
    } else {
        Config::default()
    };

    // Initialize logging
    let log_level = args.log_level.as_deref().unwrap_or(&config.log.level);
    utils::logger::init(log_level)?;

    let (session, transport) = match prepare(&args, &config) {
        Ok(prepared) => prepared,
        Err(e) => {
            eprintln!("Error: {}\n", e);
            eprintln!("{}", Args::command().render_usage());
            return Ok(ExitCode::from(e.exit_code()));
        }
    };

    tracing::info!(
        "Starting deltasync v{} ({} {})",
        env!("CARGO_PKG_VERSION"),
        session.direction(),
        transport.url()
    );

    let engine = FastRsyncEngine::new(config.sync.block_options());
    let client = SyncClient::new(transport, engine).with_timeout(config.remote.timeout());

    // Create shutdown coordinator
    let shutdown_coordinator = ShutdownCoordinator::new();
    let listener = shutdown_coordinator.listen();
    let cancel = shutdown_coordinator.token();

    let outcome = client.run_session(&session, &cancel).await;

    // Stop the signal listener
    shutdown_coordinator.trigger();
    let _ = listener.await;

    match outcome {
        Ok(report) => {
            println!(
                "{}: {} entries scanned, {} changes applied, {} signatures sent",
                report.direction,
                report.files_scanned + report.directories_scanned,
                report.changes_applied(),
                report.signatures_sent
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            tracing::error!("Sync failed: {}", e);
            eprintln!("Error: {}", e);
            Ok(ExitCode::from(e.exit_code()))
        }
    }
}

/// Validate arguments before any network or filesystem work.
fn prepare(args: &Args, config: &Config) -> Result<(SyncSession, HttpTransport), SyncError> {
    let transport = HttpTransport::new(&args.target, &config.remote)?;
    validate_local_root(&args.source)?;
    let direction: Direction = args.direction.parse()?;
    let session = SyncSession::new(direction, &args.source, args.base.clone())?;
    Ok((session, transport))
}
