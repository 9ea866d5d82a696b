//! pvs-archive
//!
//! Read-only access to a weeWX-style SQLite archive: one row per archive
//! interval, keyed by an epoch-seconds timestamp column.

mod schema;

pub use schema::ArchiveSchema;

use std::str::FromStr;

use anyhow::{bail, Context, Result};
use pvs_reconcile::{Field, Instant, LocalArchive, ReconcileDay, Record};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use tracing::debug;

pub const ENV_ARCHIVE_URL: &str = "PVSYNC_ARCHIVE_URL";

/// Open the archive read-only. The weather/PV logger owns the file; we never
/// write to it.
pub async fn connect(url: &str) -> Result<SqlitePool> {
    let opts = SqliteConnectOptions::from_str(url)
        .with_context(|| format!("invalid archive url: {url}"))?
        .read_only(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(opts)
        .await
        .with_context(|| format!("failed to open archive: {url}"))?;

    Ok(pool)
}

pub struct SqliteArchive {
    pool: SqlitePool,
    schema: ArchiveSchema,
}

impl SqliteArchive {
    pub async fn connect(url: &str, schema: ArchiveSchema) -> Result<Self> {
        Ok(Self::from_pool(connect(url).await?, schema))
    }

    pub fn from_pool(pool: SqlitePool, schema: ArchiveSchema) -> Self {
        Self { pool, schema }
    }

    pub fn schema(&self) -> &ArchiveSchema {
        &self.schema
    }

    async fn day_energy(
        &self,
        day: &ReconcileDay,
        ts: Instant,
        column: &str,
    ) -> Result<Option<f64>> {
        let total: Option<f64> = sqlx::query_scalar(&self.schema.day_energy_sql(column))
            .bind(day.start)
            .bind(ts)
            .fetch_one(&self.pool)
            .await
            .context("archive day energy query failed")?;
        Ok(total)
    }
}

#[async_trait::async_trait]
impl LocalArchive for SqliteArchive {
    async fn list_timestamps(&self, day: &ReconcileDay) -> Result<Vec<Instant>> {
        let rows: Vec<i64> = sqlx::query_scalar(&self.schema.list_sql())
            .bind(day.start)
            .bind(day.end)
            .fetch_all(&self.pool)
            .await
            .context("archive list query failed")?;

        debug!(date = %day.date, count = rows.len(), "archive timestamps");
        Ok(rows)
    }

    async fn fetch_records(&self, day: &ReconcileDay, ts: Instant) -> Result<Vec<Record>> {
        let rows = sqlx::query(&self.schema.record_sql())
            .bind(ts)
            .fetch_all(&self.pool)
            .await
            .context("archive record query failed")?;
        if rows.is_empty() {
            bail!("no archive record at {ts}");
        }

        // PVOutput wants energy generated so far today, the archive holds
        // per-interval energy.
        let day_energy = match self.schema.energy_column() {
            Some(column) if self.schema.cumulative_energy() => {
                Some(self.day_energy(day, ts, column).await?)
            }
            _ => None,
        };

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let mut record = Record::new(ts);
            for (idx, (field, column)) in self.schema.columns().iter().enumerate() {
                let v: Option<f64> = row
                    .try_get(idx)
                    .with_context(|| format!("archive column {column}"))?;
                record.set(*field, v);
            }
            if let Some(total) = day_energy {
                if record.has(Field::Energy) {
                    record.set(Field::Energy, total);
                }
            }
            records.push(record);
        }

        debug!(ts, count = records.len(), "archive records");
        Ok(records)
    }
}
