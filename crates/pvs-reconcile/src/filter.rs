use serde::Serialize;

use crate::{Field, Instant, Record, SECS_PER_DAY};

/// Result of running a record through [`RecordFilter`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterVerdict {
    Accept,
    /// At or beyond the remote's age limit. The remote would refuse it.
    TooOld,
    /// None of the required fields carries a value.
    NoData,
}

/// Age + data-presence policy for candidate records.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordFilter {
    max_age_days: u32,
    required_fields: Vec<Field>,
}

impl RecordFilter {
    pub fn new(max_age_days: u32, required_fields: impl Into<Vec<Field>>) -> Self {
        Self {
            max_age_days,
            required_fields: required_fields.into(),
        }
    }

    pub fn max_age_days(&self) -> u32 {
        self.max_age_days
    }

    pub fn required_fields(&self) -> &[Field] {
        &self.required_fields
    }

    /// Records must be strictly newer than this instant.
    pub fn oldest_allowed(&self, now: Instant) -> Instant {
        now.saturating_sub(i64::from(self.max_age_days) * SECS_PER_DAY)
    }

    /// Age is checked first, so a record that is both stale and empty is
    /// reported as [`FilterVerdict::TooOld`].
    pub fn verdict(&self, record: &Record, now: Instant) -> FilterVerdict {
        if record.timestamp() <= self.oldest_allowed(now) {
            return FilterVerdict::TooOld;
        }
        if !self.required_fields.iter().any(|f| record.has(*f)) {
            return FilterVerdict::NoData;
        }
        FilterVerdict::Accept
    }

    pub fn accepts(&self, record: &Record, now: Instant) -> bool {
        self.verdict(record, now) == FilterVerdict::Accept
    }
}

/// Free-function form of [`RecordFilter::accepts`].
pub fn accepts(
    record: &Record,
    now: Instant,
    max_age_days: u32,
    required_fields: &[Field],
) -> bool {
    RecordFilter::new(max_age_days, required_fields).accepts(record, now)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: Instant = 1_700_000_000;

    fn filter() -> RecordFilter {
        RecordFilter::new(14, vec![Field::Energy])
    }

    #[test]
    fn fresh_record_with_energy_is_accepted() {
        let r = Record::new(NOW - 300).with(Field::Energy, 1250.0);
        assert_eq!(filter().verdict(&r, NOW), FilterVerdict::Accept);
    }

    #[test]
    fn exactly_max_age_is_too_old() {
        let r = Record::new(NOW - 14 * SECS_PER_DAY).with(Field::Energy, 1.0);
        assert_eq!(filter().verdict(&r, NOW), FilterVerdict::TooOld);

        let r = Record::new(NOW - 14 * SECS_PER_DAY + 1).with(Field::Energy, 1.0);
        assert_eq!(filter().verdict(&r, NOW), FilterVerdict::Accept);
    }

    #[test]
    fn secondary_fields_alone_are_not_enough() {
        let r = Record::new(NOW)
            .with(Field::InverterTemp, 41.5)
            .with(Field::GridVoltage, 239.0);
        assert_eq!(filter().verdict(&r, NOW), FilterVerdict::NoData);
    }

    #[test]
    fn any_one_required_field_suffices() {
        let f = RecordFilter::new(14, vec![Field::Energy, Field::GridPower]);
        let r = Record::new(NOW).with(Field::GridPower, 800.0);
        assert!(f.accepts(&r, NOW));
    }

    #[test]
    fn stale_and_empty_reports_too_old() {
        let r = Record::new(0);
        assert_eq!(filter().verdict(&r, NOW), FilterVerdict::TooOld);
    }

    #[test]
    fn free_function_matches_method() {
        let r = Record::new(NOW - 10).with(Field::Energy, 3.0);
        assert!(accepts(&r, NOW, 14, &[Field::Energy]));
        assert!(!accepts(&r, NOW, 14, &[Field::GridVoltage]));
        assert!(!accepts(&r, NOW, 0, &[Field::Energy]));
    }
}
