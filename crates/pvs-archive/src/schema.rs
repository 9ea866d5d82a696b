use anyhow::{bail, Result};
use pvs_reconcile::Field;

/// Where records live inside the archive database.
///
/// Table and column names come from operator config and are spliced into
/// SQL, so they are restricted to plain identifiers and always quoted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSchema {
    table: String,
    timestamp_column: String,
    columns: Vec<(Field, String)>,
    cumulative_energy: bool,
}

impl ArchiveSchema {
    pub fn new(
        table: &str,
        timestamp_column: &str,
        columns: Vec<(Field, String)>,
        cumulative_energy: bool,
    ) -> Result<Self> {
        check_ident("table", table)?;
        check_ident("timestamp column", timestamp_column)?;
        if columns.is_empty() {
            bail!("archive field map is empty; nothing could ever be published");
        }
        for (field, column) in &columns {
            check_ident(field.key(), column)?;
        }
        let mut columns = columns;
        columns.sort_by_key(|(f, _)| *f);
        columns.dedup_by_key(|(f, _)| *f);

        Ok(Self {
            table: table.to_string(),
            timestamp_column: timestamp_column.to_string(),
            columns,
            cumulative_energy,
        })
    }

    /// weeWX defaults: `archive` table keyed by `dateTime`.
    pub fn weewx(columns: Vec<(Field, String)>) -> Result<Self> {
        Self::new("archive", "dateTime", columns, true)
    }

    pub fn columns(&self) -> &[(Field, String)] {
        &self.columns
    }

    pub fn cumulative_energy(&self) -> bool {
        self.cumulative_energy
    }

    pub(crate) fn energy_column(&self) -> Option<&str> {
        self.columns
            .iter()
            .find(|(f, _)| *f == Field::Energy)
            .map(|(_, c)| c.as_str())
    }

    pub(crate) fn list_sql(&self) -> String {
        let ts = quote(&self.timestamp_column);
        format!(
            "SELECT {ts} FROM {table} WHERE {ts} >= ?1 AND {ts} < ?2 ORDER BY {ts}",
            table = quote(&self.table)
        )
    }

    pub(crate) fn record_sql(&self) -> String {
        let cols: Vec<String> = self
            .columns
            .iter()
            .map(|(_, c)| format!("CAST({} AS REAL)", quote(c)))
            .collect();
        format!(
            "SELECT {cols} FROM {table} WHERE {ts} = ?1",
            cols = cols.join(", "),
            table = quote(&self.table),
            ts = quote(&self.timestamp_column)
        )
    }

    /// Running energy total from `?1` up to and including `?2`.
    pub(crate) fn day_energy_sql(&self, energy_column: &str) -> String {
        let ts = quote(&self.timestamp_column);
        format!(
            "SELECT SUM(CAST({col} AS REAL)) FROM {table} WHERE {ts} >= ?1 AND {ts} <= ?2",
            col = quote(energy_column),
            table = quote(&self.table)
        )
    }
}

fn check_ident(what: &str, s: &str) -> Result<()> {
    let mut chars = s.chars();
    let ok = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !ok {
        bail!("archive {what}: '{s}' is not a plain SQL identifier");
    }
    Ok(())
}

fn quote(ident: &str) -> String {
    format!("\"{ident}\"")
}
