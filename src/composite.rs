use crate::interval::BucketGrid;
use crate::models::{PerRole, SeriesPoint};
use crate::score::{clamp_score, round2};

/// Role weights normalized to sum to one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositeWeights {
    pub teacher: f64,
    pub mentor: f64,
    pub student: f64,
}

impl CompositeWeights {
    /// Returns `None` when the raw weights cannot be normalized: any negative
    /// or non-finite weight, or a zero total.
    pub fn normalize(teacher: f64, mentor: f64, student: f64) -> Option<Self> {
        let raw = [teacher, mentor, student];
        if raw.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return None;
        }
        let total: f64 = raw.iter().sum();
        if total <= 0.0 {
            return None;
        }
        Some(Self {
            teacher: teacher / total,
            mentor: mentor / total,
            student: student / total,
        })
    }

    pub fn blend(&self, teacher: f64, mentor: f64, student: f64) -> f64 {
        clamp_score(teacher * self.teacher + mentor * self.mentor + student * self.student)
    }
}

/// Combines the smoothed role series into output points, one per bucket.
pub fn compose(
    grid: &BucketGrid,
    smoothed: &PerRole<Vec<f64>>,
    weights: &CompositeWeights,
) -> Vec<SeriesPoint> {
    (0..grid.len())
        .filter_map(|i| {
            let date = grid.date_at(i)?;
            let student = clamp_score(*smoothed.student.get(i)?);
            let teacher = clamp_score(*smoothed.teacher.get(i)?);
            let mentor = clamp_score(*smoothed.mentor.get(i)?);
            Some(SeriesPoint {
                t: date.format("%Y-%m-%d").to_string(),
                self_weighted: round2(student),
                teacher_weighted: round2(teacher),
                mentor_weighted: round2(mentor),
                composite: round2(weights.blend(teacher, mentor, student)),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::{build_grid, IntervalUnit};
    use chrono::NaiveDate;

    fn weights() -> CompositeWeights {
        CompositeWeights::normalize(0.5, 0.3, 0.2).expect("valid weights")
    }

    fn grid(len: u32) -> BucketGrid {
        let since = NaiveDate::from_ymd_opt(2026, 4, 6)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("valid timestamp");
        let until = since + chrono::Duration::days(i64::from(len) - 1);
        build_grid(since, until, IntervalUnit::Day, 100).expect("grid fits")
    }

    #[test]
    fn normalized_weights_sum_to_one() {
        for (t, m, s) in [(5.0, 3.0, 2.0), (1.0, 1.0, 1.0), (0.0, 0.0, 7.0), (0.2, 0.7, 0.4)] {
            let w = CompositeWeights::normalize(t, m, s).expect("valid weights");
            assert!((w.teacher + w.mentor + w.student - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn rejects_unusable_weights() {
        assert!(CompositeWeights::normalize(0.0, 0.0, 0.0).is_none());
        assert!(CompositeWeights::normalize(-1.0, 1.0, 1.0).is_none());
        assert!(CompositeWeights::normalize(f64::NAN, 1.0, 1.0).is_none());
    }

    #[test]
    fn extremes_compose_to_extremes() {
        let w = weights();
        assert_eq!(w.blend(100.0, 100.0, 100.0), 100.0);
        assert_eq!(w.blend(0.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn composes_weighted_points_with_dates() {
        let smoothed = PerRole {
            student: vec![60.0, 33.333_333],
            teacher: vec![80.0, 90.0],
            mentor: vec![0.0, 50.0],
        };

        let points = compose(&grid(2), &smoothed, &weights());
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].t, "2026-04-06");
        assert!((points[0].composite - 52.0).abs() < 1e-9);
        assert_eq!(points[1].t, "2026-04-07");
        assert_eq!(points[1].self_weighted, 33.33);
        assert!((points[1].composite - 66.67).abs() < 1e-9);
    }
}
