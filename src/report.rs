use std::fmt::Write;

use crate::models::{SeriesPoint, SeriesResponse};

#[derive(Debug, Clone, PartialEq)]
pub struct CompositeSummary {
    pub first: f64,
    pub last: f64,
    pub min: f64,
    pub max: f64,
}

impl CompositeSummary {
    pub fn change(&self) -> f64 {
        self.last - self.first
    }
}

pub fn summarize(points: &[SeriesPoint]) -> Option<CompositeSummary> {
    let first = points.first()?.composite;
    let last = points.last()?.composite;
    let (min, max) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.composite), hi.max(p.composite))
        });
    Some(CompositeSummary {
        first,
        last,
        min,
        max,
    })
}

pub fn build_report(track_id: &str, student_id: Option<&str>, series: &SeriesResponse) -> String {
    let mut output = String::new();
    let scope = student_id.unwrap_or("all students");

    let _ = writeln!(output, "# Track Score Series");
    let _ = writeln!(
        output,
        "Track {} for {} ({} buckets)",
        track_id, scope, series.interval
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Summary");

    match summarize(&series.points) {
        None => {
            let _ = writeln!(output, "No buckets in this window.");
        }
        Some(summary) => {
            let _ = writeln!(
                output,
                "- Composite moved from {:.2} to {:.2} ({:+.2})",
                summary.first,
                summary.last,
                summary.change()
            );
            let _ = writeln!(output, "- Range {:.2} to {:.2}", summary.min, summary.max);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Buckets");

    if series.points.is_empty() {
        let _ = writeln!(output, "No buckets in this window.");
    } else {
        let _ = writeln!(output, "| Bucket | Self | Teacher | Mentor | Composite |");
        let _ = writeln!(output, "|---|---:|---:|---:|---:|");
        for point in &series.points {
            let _ = writeln!(
                output,
                "| {} | {:.2} | {:.2} | {:.2} | {:.2} |",
                point.t,
                point.self_weighted,
                point.teacher_weighted,
                point.mentor_weighted,
                point.composite
            );
        }
    }

    output
}
