use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::SeriesError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalUnit {
    Day,
    Week,
}

impl IntervalUnit {
    pub fn step(self) -> Duration {
        match self {
            IntervalUnit::Day => Duration::days(1),
            IntervalUnit::Week => Duration::days(7),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            IntervalUnit::Day => "day",
            IntervalUnit::Week => "week",
        }
    }
}

impl FromStr for IntervalUnit {
    type Err = SeriesError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "day" => Ok(IntervalUnit::Day),
            "week" => Ok(IntervalUnit::Week),
            other => Err(SeriesError::InvalidInterval(other.to_string())),
        }
    }
}

impl fmt::Display for IntervalUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Start of the bucket containing `t`: midnight, and for weeks the preceding Monday.
/// `None` when that Monday lies before the first representable date.
pub fn align_start(t: NaiveDateTime, unit: IntervalUnit) -> Option<NaiveDateTime> {
    let midnight = t.date().and_time(NaiveTime::MIN);
    match unit {
        IntervalUnit::Day => Some(midnight),
        IntervalUnit::Week => midnight
            .checked_sub_signed(Duration::days(i64::from(t.weekday().num_days_from_monday()))),
    }
}

/// Fixed-step bucket starts covering a request.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketGrid {
    unit: IntervalUnit,
    starts: Vec<NaiveDateTime>,
    end: NaiveDateTime,
}

impl BucketGrid {
    pub fn len(&self) -> usize {
        self.starts.len()
    }

    pub fn starts(&self) -> &[NaiveDateTime] {
        &self.starts
    }

    pub fn date_at(&self, index: usize) -> Option<NaiveDate> {
        self.starts.get(index).map(|start| start.date())
    }

    /// Half-open span `[first start, last start + step)`.
    pub fn span(&self) -> (NaiveDateTime, NaiveDateTime) {
        (self.starts[0], self.end)
    }

    /// Bucket holding `t`, or `None` when `t` falls outside the span.
    pub fn index_of(&self, t: NaiveDateTime) -> Option<usize> {
        let (start, end) = self.span();
        if t < start || t >= end {
            return None;
        }
        let offset = (t - start).num_seconds() / self.unit.step().num_seconds();
        usize::try_from(offset).ok()
    }
}

/// Builds the bucket grid for `[since, until]`, refusing grids longer than
/// `max_points` before allocating them.
///
/// Bounds whose buckets cannot be represented (the first Monday or the end
/// of the last bucket falls outside chrono's range) are an `InvalidRange`.
pub fn build_grid(
    since: NaiveDateTime,
    until: NaiveDateTime,
    unit: IntervalUnit,
    max_points: usize,
) -> Result<BucketGrid, SeriesError> {
    let unrepresentable = || SeriesError::InvalidRange { since, until };
    let start = align_start(since, unit).ok_or_else(unrepresentable)?;
    let last = align_start(until, unit).ok_or_else(unrepresentable)?.max(start);
    let step = unit.step();

    let points = (last - start).num_days() / step.num_days() + 1;
    if points > max_points as i64 {
        return Err(SeriesError::RangeTooLarge { points, max_points });
    }
    let end = last.checked_add_signed(step).ok_or_else(unrepresentable)?;

    let mut starts = Vec::with_capacity(points as usize);
    let mut cursor = Some(start);
    while let Some(bucket) = cursor.filter(|bucket| *bucket <= last) {
        starts.push(bucket);
        cursor = bucket.checked_add_signed(step);
    }
    if starts.is_empty() {
        starts.push(start);
    }

    Ok(BucketGrid { unit, starts, end })
}
