use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "pvsync")]
#[command(about = "Publish archived PV statuses missing from PVOutput", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile one day: upload every archived status PVOutput lacks
    Sync(commands::sync::SyncArgs),

    /// Print the upload limits in effect for the station
    Limits {
        /// Layered config paths in merge order
        #[arg(long = "config")]
        config_paths: Vec<String>,

        #[arg(long)]
        api_key: Option<String>,

        #[arg(long)]
        system_id: Option<String>,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> site -> host...)
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env.local if present (dev convenience).
    // Silent if the file does not exist; production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Sync(args) => commands::sync::run_sync(args).await?,
        Commands::Limits {
            config_paths,
            api_key,
            system_id,
        } => commands::run_limits(config_paths, api_key, system_id).await?,
        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = pvs_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }
    }

    Ok(())
}

/// Logs go to stderr so `sync --json` keeps stdout machine-readable.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}
