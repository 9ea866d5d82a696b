use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroUsize;

use chrono::{Days, NaiveDate, TimeZone};
use serde::Serialize;

use crate::RunError;

/// Absolute point in time, seconds since the Unix epoch (UTC).
pub type Instant = i64;

pub const SECS_PER_DAY: i64 = 86_400;

// ---------------------------------------------------------------------------
// Epsilon + fuzzy timestamps
// ---------------------------------------------------------------------------

/// Matching tolerance in seconds.
///
/// Chosen once per run and passed explicitly to everything that compares
/// timestamps. There is no process-wide default held in mutable state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Epsilon(i64);

impl Epsilon {
    pub const DEFAULT_SECS: i64 = 120;

    pub fn new(secs: i64) -> Result<Self, RunError> {
        if secs < 0 {
            return Err(RunError::Config(format!(
                "epsilon must be >= 0 seconds, got {secs}"
            )));
        }
        Ok(Self(secs))
    }

    pub fn secs(self) -> i64 {
        self.0
    }
}

impl Default for Epsilon {
    fn default() -> Self {
        Self(Self::DEFAULT_SECS)
    }
}

/// `true` iff `|a - b| <= epsilon`.
///
/// Reflexive and symmetric, NOT transitive: 100 ~ 200 and 200 ~ 300 under a
/// 100s tolerance, but 100 and 300 are not equivalent.
pub fn equivalent(a: Instant, b: Instant, epsilon: Epsilon) -> bool {
    // abs_diff cannot overflow even for i64::MIN vs i64::MAX.
    a.abs_diff(b) <= epsilon.0 as u64
}

/// An instant that is compared fuzzily for matching but ordered exactly.
///
/// `Eq`/`Ord` are raw instant comparisons and exist for sorting only. Whether
/// two timestamps denote the same status is answered by
/// [`FuzzyTimestamp::equivalent`]. No `Hash` impl: the fuzzy relation does
/// not partition instants, so hashed membership would give wrong answers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct FuzzyTimestamp(Instant);

impl FuzzyTimestamp {
    pub fn new(instant: Instant) -> Self {
        Self(instant)
    }

    pub fn instant(self) -> Instant {
        self.0
    }

    pub fn equivalent(self, other: FuzzyTimestamp, epsilon: Epsilon) -> bool {
        equivalent(self.0, other.0, epsilon)
    }
}

impl From<Instant> for FuzzyTimestamp {
    fn from(instant: Instant) -> Self {
        Self(instant)
    }
}

impl fmt::Display for FuzzyTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Record manifest
// ---------------------------------------------------------------------------

/// Known record fields. The order here is the order of the PVOutput status
/// value slots (v1..v12).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Energy,
    GridPower,
    EnergyConsumption,
    PowerConsumption,
    InverterTemp,
    GridVoltage,
    Extended1,
    Extended2,
    Extended3,
    Extended4,
    Extended5,
    Extended6,
}

impl Field {
    pub const ALL: [Field; 12] = [
        Field::Energy,
        Field::GridPower,
        Field::EnergyConsumption,
        Field::PowerConsumption,
        Field::InverterTemp,
        Field::GridVoltage,
        Field::Extended1,
        Field::Extended2,
        Field::Extended3,
        Field::Extended4,
        Field::Extended5,
        Field::Extended6,
    ];

    /// Stable config key.
    pub fn key(&self) -> &'static str {
        match self {
            Field::Energy => "energy",
            Field::GridPower => "grid_power",
            Field::EnergyConsumption => "energy_consumption",
            Field::PowerConsumption => "power_consumption",
            Field::InverterTemp => "inverter_temp",
            Field::GridVoltage => "grid_voltage",
            Field::Extended1 => "extended1",
            Field::Extended2 => "extended2",
            Field::Extended3 => "extended3",
            Field::Extended4 => "extended4",
            Field::Extended5 => "extended5",
            Field::Extended6 => "extended6",
        }
    }

    pub fn parse(s: &str) -> Result<Self, RunError> {
        let k = s.trim().to_ascii_lowercase();
        Field::ALL
            .iter()
            .copied()
            .find(|f| f.key() == k)
            .ok_or_else(|| {
                RunError::Config(format!(
                    "unknown record field '{}'. expected one of: {}",
                    s.trim(),
                    Field::ALL.map(|f| f.key()).join(" | ")
                ))
            })
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One archive interval: a timestamp plus whatever fields the archive had.
///
/// Absent fields are simply not in the map; `get` returns `None` for them.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Record {
    timestamp: Instant,
    values: BTreeMap<Field, f64>,
}

impl Record {
    pub fn new(timestamp: Instant) -> Self {
        Self {
            timestamp,
            values: BTreeMap::new(),
        }
    }

    /// Builder form of [`Record::set`].
    pub fn with(mut self, field: Field, value: f64) -> Self {
        self.set(field, Some(value));
        self
    }

    /// Set or clear a field. Non-finite values are stored as absent.
    pub fn set(&mut self, field: Field, value: Option<f64>) {
        match value {
            Some(v) if v.is_finite() => {
                self.values.insert(field, v);
            }
            _ => {
                self.values.remove(&field);
            }
        }
    }

    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }

    pub fn get(&self, field: Field) -> Option<f64> {
        self.values.get(&field).copied()
    }

    pub fn has(&self, field: Field) -> bool {
        self.values.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Present fields in manifest order.
    pub fn fields(&self) -> impl Iterator<Item = (Field, f64)> + '_ {
        self.values.iter().map(|(f, v)| (*f, *v))
    }
}

// ---------------------------------------------------------------------------
// Limits + day window
// ---------------------------------------------------------------------------

/// Upload limits in effect for the station's account tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct StationLimits {
    pub max_batch_size: NonZeroUsize,
    pub max_age_days: u32,
}

impl StationLimits {
    pub fn new(max_batch_size: usize, max_age_days: u32) -> Result<Self, RunError> {
        let max_batch_size = NonZeroUsize::new(max_batch_size).ok_or_else(|| {
            RunError::Config("max_batch_size must be >= 1".to_string())
        })?;
        Ok(Self {
            max_batch_size,
            max_age_days,
        })
    }

    /// Apply operator caps. Caps only ever lower a limit.
    pub fn capped(self, max_batch_size: Option<usize>, max_age_days: Option<u32>) -> Self {
        let max_batch_size = max_batch_size
            .and_then(NonZeroUsize::new)
            .map(|cap| cap.min(self.max_batch_size))
            .unwrap_or(self.max_batch_size);
        let max_age_days = max_age_days
            .map(|cap| cap.min(self.max_age_days))
            .unwrap_or(self.max_age_days);
        Self {
            max_batch_size,
            max_age_days,
        }
    }
}

/// The date being reconciled and its `[start, end)` window in the station's
/// time zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ReconcileDay {
    pub date: NaiveDate,
    pub start: Instant,
    pub end: Instant,
}

impl ReconcileDay {
    /// Resolve local midnight-to-midnight for `date` in `tz`.
    ///
    /// On a DST transition the earliest valid local midnight is used, so a
    /// 23h or 25h day is represented exactly.
    pub fn in_zone<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Result<Self, RunError> {
        let next = date
            .checked_add_days(Days::new(1))
            .ok_or_else(|| RunError::Config(format!("date out of range: {date}")))?;
        let start = local_midnight(date, tz)?;
        let end = local_midnight(next, tz)?;
        Ok(Self { date, start, end })
    }

    pub fn contains(&self, ts: Instant) -> bool {
        ts >= self.start && ts < self.end
    }
}

fn local_midnight<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Result<Instant, RunError> {
    let naive = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| RunError::Config(format!("invalid date: {date}")))?;
    tz.from_local_datetime(&naive)
        .earliest()
        // Midnight skipped by DST: fall back to 01:00 local.
        .or_else(|| {
            date.and_hms_opt(1, 0, 0)
                .and_then(|n| tz.from_local_datetime(&n).earliest())
        })
        .map(|dt| dt.timestamp())
        .ok_or_else(|| RunError::Config(format!("no local midnight for {date}")))
}
