use tracing::debug;

use crate::interval::BucketGrid;
use crate::models::{PerRole, Role, ScoreEvent};
use crate::score::clamp_score;

/// Per-bucket mean per role; `None` marks a bucket nobody rated.
pub type RoleSeries = PerRole<Vec<Option<f64>>>;

#[derive(Debug, Clone)]
struct Accumulator {
    sum: Vec<f64>,
    count: Vec<u32>,
}

impl Accumulator {
    fn new(len: usize) -> Self {
        Self {
            sum: vec![0.0; len],
            count: vec![0; len],
        }
    }

    fn add(&mut self, index: usize, value: f64) {
        self.sum[index] += value;
        self.count[index] += 1;
    }

    fn means(self) -> Vec<Option<f64>> {
        self.sum
            .into_iter()
            .zip(self.count)
            .map(|(sum, count)| (count > 0).then(|| sum / f64::from(count)))
            .collect()
    }
}

pub fn aggregate_by_role(grid: &BucketGrid, events: &[ScoreEvent]) -> RoleSeries {
    let mut acc = PerRole {
        student: Accumulator::new(grid.len()),
        teacher: Accumulator::new(grid.len()),
        mentor: Accumulator::new(grid.len()),
    };
    let mut dropped = 0usize;

    for event in events {
        let Some(role) = Role::from_label(&event.rater_role) else {
            dropped += 1;
            continue;
        };
        let Some(index) = grid.index_of(event.occurred_at) else {
            dropped += 1;
            continue;
        };
        acc.get_mut(role).add(index, clamp_score(event.value_raw));
    }

    if dropped > 0 {
        debug!(dropped, total = events.len(), "dropped score events outside grid or role set");
    }

    acc.map(Accumulator::means)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::{build_grid, IntervalUnit};
    use chrono::{NaiveDate, NaiveDateTime};

    fn day(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 2, d)
            .and_then(|date| date.and_hms_opt(h, 0, 0))
            .expect("valid timestamp")
    }

    fn event(role: &str, value: f64, occurred_at: NaiveDateTime) -> ScoreEvent {
        ScoreEvent {
            track_id: "track-1".to_string(),
            student_id: "stu-1".to_string(),
            metric_id: "focus".to_string(),
            rater_role: role.to_string(),
            value_raw: value,
            occurred_at,
        }
    }

    fn grid() -> BucketGrid {
        build_grid(day(2, 0), day(4, 0), IntervalUnit::Day, 10).expect("grid fits")
    }

    #[test]
    fn averages_clamped_values_per_bucket() {
        let events = vec![
            event("teacher", 80.0, day(2, 9)),
            event("teacher", 120.0, day(2, 15)),
            event("student", -10.0, day(3, 9)),
            event("student", 40.0, day(3, 11)),
        ];

        let series = aggregate_by_role(&grid(), &events);
        assert_eq!(series.teacher, vec![Some(90.0), None, None]);
        assert_eq!(series.student, vec![None, Some(20.0), None]);
        assert_eq!(series.mentor, vec![None, None, None]);
    }

    #[test]
    fn drops_unknown_roles_and_out_of_span_events() {
        let events = vec![
            event("parent", 70.0, day(2, 9)),
            event("mentor", 50.0, day(1, 23)),
            event("mentor", 50.0, day(5, 0)),
            event(" Mentor ", 60.0, day(4, 23)),
        ];

        let series = aggregate_by_role(&grid(), &events);
        assert_eq!(series.mentor, vec![None, None, Some(60.0)]);
        assert!(series.teacher.iter().all(Option::is_none));
        assert!(series.student.iter().all(Option::is_none));
    }

    #[test]
    fn observed_zero_is_not_missing() {
        let series = aggregate_by_role(&grid(), &[event("teacher", 0.0, day(3, 8))]);
        assert_eq!(series.teacher, vec![None, Some(0.0), None]);
    }
}
