use alloy_primitives::{Address, Bytes};
use clap::{Parser, Subcommand};
use eyre::Result;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ccip_data::settings::ReaderSettings;

mod commands;

use commands::Lane;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration directory
    #[arg(long, default_value = "./configs/dev")]
    config_path: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the contract's self-description
    TypeAndVersion {
        #[arg(long)]
        address: Address,
    },
    /// Print accepted commit reports covering a sequence number
    CommitReports {
        #[arg(long)]
        address: Address,
        #[arg(long)]
        seq_num: u64,
    },
    /// Print an off-ramp's aggregate rate limiter, projected to now
    RateLimiter {
        #[arg(long)]
        address: Address,
    },
    /// Decode a commit report blob with the commit store's codec
    DecodeCommitReport {
        #[arg(long)]
        address: Address,
        #[arg(long)]
        hex: Bytes,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let settings_path = PathBuf::from(&cli.config_path).join("reader.json");
    let settings = if settings_path.exists() {
        ReaderSettings::load_from_file(&settings_path).await?.with_env_overrides()
    } else {
        tracing::warn!(path = %settings_path.display(), "reader.json not found, using defaults");
        ReaderSettings::default().with_env_overrides()
    };

    tracing::info!(
        rpc_url = %settings.rpc_url,
        poll_secs = settings.poll_interval_secs,
        confirmations = ?settings.confirmations(),
        "Settings loaded"
    );

    let lane = Lane::connect(&settings)?;

    match cli.command {
        Command::TypeAndVersion { address } => lane.type_and_version(address).await,
        Command::CommitReports { address, seq_num } => lane.commit_reports(address, seq_num).await,
        Command::RateLimiter { address } => lane.rate_limiter(address).await,
        Command::DecodeCommitReport { address, hex } => lane.decode_commit_report(address, &hex).await,
    }
}
