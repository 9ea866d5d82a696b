//! PVOutput's CSV dialect.
//!
//! Rows are separated by `;`, columns by `,`, and `NaN` stands for "no value".
//! Dates are `YYYYMMDD` and times `HH:MM`, both local to the station.

use std::num::NonZeroUsize;

use chrono::{LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use chrono_tz::Tz;
use pvs_reconcile::{Batch, Field, Instant, Record, StationLimits};

use crate::PvOutputError;

pub const DATE_FMT: &str = "%Y%m%d";
pub const TIME_FMT: &str = "%H:%M";

/// Split a reply into rows of columns. Empty rows are dropped.
pub fn parse_rows(body: &str) -> Vec<Vec<Option<&str>>> {
    body.trim()
        .split(';')
        .filter(|row| !row.trim().is_empty())
        .map(|row| {
            row.split(',')
                .map(str::trim)
                .map(|c| if c == "NaN" { None } else { Some(c) })
                .collect()
        })
        .collect()
}

/// Instants a `date,time` pair can denote in the station zone.
///
/// PVOutput keys statuses by local wall clock, so during a DST fall-back the
/// repeated hour is one slot covering two instants. Both are returned.
pub fn parse_local(date: &str, time: &str, tz: &Tz) -> Result<Vec<Instant>, PvOutputError> {
    let d = NaiveDate::parse_from_str(date, DATE_FMT)
        .map_err(|e| PvOutputError::Decode(format!("bad date '{date}': {e}")))?;
    let t = NaiveTime::parse_from_str(time, TIME_FMT)
        .map_err(|e| PvOutputError::Decode(format!("bad time '{time}': {e}")))?;
    match tz.from_local_datetime(&NaiveDateTime::new(d, t)) {
        LocalResult::Single(dt) => Ok(vec![dt.timestamp()]),
        LocalResult::Ambiguous(first, second) => Ok(vec![first.timestamp(), second.timestamp()]),
        LocalResult::None => Err(PvOutputError::Decode(format!(
            "{date} {time} does not exist in {tz}"
        ))),
    }
}

/// Timestamps of a `getstatus.jsp?h=1` reply.
pub fn parse_history(body: &str, tz: &Tz) -> Result<Vec<Instant>, PvOutputError> {
    let mut out = Vec::new();
    for row in parse_rows(body) {
        match (row.first(), row.get(1)) {
            (Some(Some(d)), Some(Some(t))) => out.extend(parse_local(d, t, tz)?),
            _ => {
                return Err(PvOutputError::Decode(format!(
                    "history row without date and time: {row:?}"
                )))
            }
        }
    }
    Ok(out)
}

/// Number of statuses an `addbatchstatus.jsp` reply marks as added.
///
/// Each row is `date,time,flag`; flag `1` means added.
pub fn parse_batch_reply(body: &str) -> Result<usize, PvOutputError> {
    let mut added = 0;
    for row in parse_rows(body) {
        match row.get(2) {
            Some(Some("1")) => added += 1,
            Some(_) => {}
            None => {
                return Err(PvOutputError::Decode(format!(
                    "batch reply row without flag: {row:?}"
                )))
            }
        }
    }
    Ok(added)
}

/// Donor flag from a `getsystem.jsp?donations=1` reply: the last section.
pub fn parse_donor(body: &str) -> Result<bool, PvOutputError> {
    let body = body.trim();
    if body.is_empty() {
        return Err(PvOutputError::Decode("empty getsystem reply".to_string()));
    }
    match body.rsplit(';').next().map(str::trim) {
        Some("1") => Ok(true),
        Some("0") | Some("") => Ok(false),
        Some(other) => Err(PvOutputError::Decode(format!(
            "unexpected donation flag '{other}'"
        ))),
        None => Ok(false),
    }
}

const DONOR_BATCH: NonZeroUsize = match NonZeroUsize::new(100) {
    Some(n) => n,
    None => NonZeroUsize::MIN,
};
const STANDARD_BATCH: NonZeroUsize = match NonZeroUsize::new(30) {
    Some(n) => n,
    None => NonZeroUsize::MIN,
};

/// Account-tier limits.
pub fn tier_limits(donor: bool) -> StationLimits {
    if donor {
        StationLimits {
            max_batch_size: DONOR_BATCH,
            max_age_days: 90,
        }
    } else {
        StationLimits {
            max_batch_size: STANDARD_BATCH,
            max_age_days: 14,
        }
    }
}

/// Position of a field in a status row: v1..v12.
fn param_index(field: Field) -> usize {
    match field {
        Field::Energy => 0,
        Field::GridPower => 1,
        Field::EnergyConsumption => 2,
        Field::PowerConsumption => 3,
        Field::InverterTemp => 4,
        Field::GridVoltage => 5,
        Field::Extended1 => 6,
        Field::Extended2 => 7,
        Field::Extended3 => 8,
        Field::Extended4 => 9,
        Field::Extended5 => 10,
        Field::Extended6 => 11,
    }
}

fn format_value(field: Field, v: f64) -> String {
    match field {
        // Wh and W are integers on the wire.
        Field::Energy | Field::GridPower | Field::EnergyConsumption | Field::PowerConsumption => {
            format!("{}", v.round() as i64)
        }
        _ => format!("{v}"),
    }
}

/// One status as `YYYYMMDD,HH:MM,v1,...,v12` with trailing blanks trimmed.
pub fn encode_status(record: &Record, tz: &Tz) -> Result<String, PvOutputError> {
    let local = tz
        .timestamp_opt(record.timestamp(), 0)
        .single()
        .ok_or_else(|| PvOutputError::Decode(format!("bad timestamp {}", record.timestamp())))?;

    let mut values = vec![String::new(); 12];
    for (field, v) in record.fields() {
        values[param_index(field)] = format_value(field, v);
    }
    while values.last().is_some_and(String::is_empty) {
        values.pop();
    }

    let mut cols = vec![
        local.format(DATE_FMT).to_string(),
        local.format(TIME_FMT).to_string(),
    ];
    cols.extend(values);
    Ok(cols.join(","))
}

/// Form value for `addbatchstatus.jsp`'s `data` parameter.
pub fn encode_batch(batch: &Batch, tz: &Tz) -> Result<String, PvOutputError> {
    let rows = batch
        .records()
        .iter()
        .map(|r| encode_status(r, tz))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows.join(";"))
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2024-06-01T10:00:00Z
    const TEN_UTC: i64 = 1_717_236_000;

    #[test]
    fn rows_columns_and_nan() {
        let rows = parse_rows("20240601,10:00,NaN,5;20240601,10:05,1,2;");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec![Some("20240601"), Some("10:00"), None, Some("5")]);
    }

    #[test]
    fn history_times_are_station_local() {
        let tz: Tz = "Australia/Brisbane".parse().unwrap();
        // 20:00 Brisbane (UTC+10) is 10:00 UTC.
        let got = parse_history("20240601,20:00,1234,NaN,500", &tz).unwrap();
        assert_eq!(got, vec![TEN_UTC]);
    }

    #[test]
    fn repeated_fall_back_hour_covers_both_instants() {
        let tz: Tz = "Europe/Berlin".parse().unwrap();
        // 2024-10-27 02:30 happens at 00:30Z (CEST) and again at 01:30Z (CET).
        let got = parse_history("20241027,02:30,100,NaN,50", &tz).unwrap();
        assert_eq!(got, vec![1_729_989_000, 1_729_992_600]);
    }

    #[test]
    fn skipped_spring_forward_time_is_a_decode_error() {
        let tz: Tz = "Europe/Berlin".parse().unwrap();
        let err = parse_history("20240331,02:30,100", &tz).unwrap_err();
        assert!(err.to_string().contains("does not exist"), "{err}");
    }

    #[test]
    fn malformed_history_is_a_decode_error() {
        let err = parse_history("20240601", &chrono_tz::UTC).unwrap_err();
        assert!(matches!(err, PvOutputError::Decode(_)));
        assert!(parse_history("2024-06-01,10:00", &chrono_tz::UTC).is_err());
    }

    #[test]
    fn batch_reply_counts_added_flags() {
        let n = parse_batch_reply("20240601,10:00,1;20240601,10:05,0;20240601,10:10,1").unwrap();
        assert_eq!(n, 2);
        assert_eq!(parse_batch_reply("").unwrap(), 0);
        assert!(parse_batch_reply("20240601,10:00").is_err());
    }

    #[test]
    fn donor_is_last_section() {
        let system = "My PV,3000,4000,12,250,X,1,3000,Y,N,20,No,,-27.4,153.0,5";
        assert!(parse_donor(&format!("{system};;1")).unwrap());
        assert!(!parse_donor(&format!("{system};;0")).unwrap());
        assert!(parse_donor("").is_err());
    }

    #[test]
    fn tiers() {
        assert_eq!(tier_limits(true).max_batch_size.get(), 100);
        assert_eq!(tier_limits(true).max_age_days, 90);
        assert_eq!(tier_limits(false).max_batch_size.get(), 30);
        assert_eq!(tier_limits(false).max_age_days, 14);
    }

    #[test]
    fn status_row_layout() {
        let r = Record::new(TEN_UTC)
            .with(Field::Energy, 1234.4)
            .with(Field::GridPower, 500.6)
            .with(Field::GridVoltage, 240.5);
        assert_eq!(
            encode_status(&r, &chrono_tz::UTC).unwrap(),
            "20240601,10:00,1234,501,,,,240.5"
        );
    }

    #[test]
    fn status_row_extended_values_keep_interior_blanks() {
        let r = Record::new(TEN_UTC)
            .with(Field::Energy, 10.0)
            .with(Field::Extended2, 0.5);
        assert_eq!(
            encode_status(&r, &chrono_tz::UTC).unwrap(),
            "20240601,10:00,10,,,,,,,0.5"
        );
    }
}
