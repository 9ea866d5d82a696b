use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::Args;
use pvs_archive::{ArchiveSchema, SqliteArchive, ENV_ARCHIVE_URL};
use pvs_config::{CredentialOverrides, PvsConfig};
use pvs_reconcile::{
    AlwaysAccept, Epsilon, InteractionMode, Prompt, ReconcileDay, ReconciliationReport,
    Reconciler, RunParams,
};
use tracing::info;
use uuid::Uuid;

use super::prompt::StdinPrompt;

#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Day to reconcile (YYYY-MM-DD, station time). Defaults to today.
    #[arg(long)]
    pub date: Option<String>,

    /// Match tolerance in seconds (overrides reconcile.epsilon_secs).
    #[arg(long, allow_negative_numbers = true)]
    pub epsilon_secs: Option<i64>,

    /// Report what would be published without uploading.
    #[arg(long, conflicts_with = "interactive")]
    pub dry_run: bool,

    /// Ask before publishing each missing status.
    #[arg(long)]
    pub interactive: bool,

    #[arg(long)]
    pub api_key: Option<String>,

    #[arg(long)]
    pub system_id: Option<String>,

    /// Layered config paths in merge order.
    #[arg(long = "config")]
    pub config_paths: Vec<String>,

    /// SQLite URL of the archive (overrides archive.url and PVSYNC_ARCHIVE_URL).
    #[arg(long)]
    pub archive: Option<String>,

    /// Print the report as JSON on stdout.
    #[arg(long)]
    pub json: bool,
}

impl SyncArgs {
    fn mode(&self) -> InteractionMode {
        if self.dry_run {
            InteractionMode::DryRun
        } else if self.interactive {
            InteractionMode::Interactive
        } else {
            InteractionMode::Automatic
        }
    }
}

fn archive_url(flag: Option<String>, config: &PvsConfig) -> Result<String> {
    flag.or_else(|| config.archive.url.clone())
        .or_else(|| std::env::var(ENV_ARCHIVE_URL).ok())
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| {
            anyhow!("no archive configured: pass --archive, set archive.url or {ENV_ARCHIVE_URL}")
        })
}

pub async fn run_sync(args: SyncArgs) -> Result<()> {
    // Everything that can be checked offline is checked before the archive
    // or PVOutput is touched.
    let loaded = super::load_config(&args.config_paths)?;
    let config = &loaded.config;
    let tz = config.station.tz()?;
    let date = super::parse_date(args.date.as_deref(), &tz)?;
    let day = ReconcileDay::in_zone(date, &tz)?;

    let epsilon = match args.epsilon_secs {
        Some(secs) => Epsilon::new(secs).context("invalid --epsilon-secs")?,
        None => config.reconcile.epsilon()?,
    };
    let required_fields = config.reconcile.required_fields()?;

    let creds = pvs_config::resolve_credentials(
        config,
        CredentialOverrides {
            api_key: args.api_key.clone(),
            system_id: args.system_id.clone(),
        },
    )?;

    let url = archive_url(args.archive.clone(), config)?;
    let schema = ArchiveSchema::new(
        &config.archive.table,
        &config.archive.timestamp_column,
        config.archive.field_columns()?,
        config.archive.cumulative_energy,
    )?;

    let mode = args.mode();
    let run_id = Uuid::new_v4();
    info!(
        %run_id,
        config_hash = %loaded.config_hash,
        date = %day.date,
        ?mode,
        "sync starting"
    );

    let archive = SqliteArchive::connect(&url, schema).await?;
    let client = super::build_client(config, creds)?;

    let mut prompt: Box<dyn Prompt> = match mode {
        InteractionMode::Interactive => Box::new(StdinPrompt::new(tz)),
        InteractionMode::Automatic | InteractionMode::DryRun => Box::new(AlwaysAccept),
    };

    let params = RunParams {
        epsilon,
        now: Utc::now().timestamp(),
        required_fields,
        mode,
    };

    let report = Reconciler::new(&archive, &client, &client, prompt.as_mut())
        .run(&day, &params)
        .await?;

    if args.json {
        let out = serde_json::json!({
            "run_id": run_id.to_string(),
            "config_hash": loaded.config_hash,
            "report": report,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print_report(&run_id, &report);
    }

    Ok(())
}

fn print_report(run_id: &Uuid, report: &ReconciliationReport) {
    println!("run_id={run_id}");
    println!("date={}", report.date());
    println!("local_found={}", report.local_found());
    println!("remote_found={}", report.remote_found());
    println!("missing={}", report.missing());
    println!("filtered_too_old={}", report.filtered_too_old());
    println!("filtered_no_data={}", report.filtered_no_data());
    println!("skipped={}", report.skipped());
    println!("accepted={}", report.accepted());
    println!("batches={}", report.batches());
    println!("published={}", report.published());
    println!("failed={}", report.failed());
    for n in report.skipped_records() {
        println!("skipped_record ts={} reason={}", n.timestamp, n.reason);
    }
    for n in report.failed_records() {
        println!("failed_record ts={} reason={}", n.timestamp, n.reason);
    }
    println!("{}", report.summary());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_flag_wins_over_config() {
        let mut config = PvsConfig::default();
        config.archive.url = Some("sqlite://from-config.sdb".into());
        let url = archive_url(Some("sqlite://flag.sdb".into()), &config).unwrap();
        assert_eq!(url, "sqlite://flag.sdb");

        let url = archive_url(None, &config).unwrap();
        assert_eq!(url, "sqlite://from-config.sdb");
    }
}
