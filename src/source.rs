use chrono::NaiveDateTime;

use crate::models::{ScoreEvent, TrackWindow};

/// Filters for one raw score fetch. `until` is exclusive.
#[derive(Debug, Clone)]
pub struct EventQuery<'a> {
    pub track_id: &'a str,
    pub student_id: Option<&'a str>,
    pub metric_id: Option<&'a str>,
    pub since: NaiveDateTime,
    pub until: NaiveDateTime,
}

/// Read-only view over rating data and track metadata.
pub trait ScoreSource {
    async fn fetch_score_events(&self, query: &EventQuery<'_>)
        -> Result<Vec<ScoreEvent>, sqlx::Error>;

    /// `None` when the track does not exist.
    async fn track_window(&self, track_id: &str) -> Result<Option<TrackWindow>, sqlx::Error>;

    async fn is_teacher_of_track(&self, track_id: &str, user_id: &str)
        -> Result<bool, sqlx::Error>;
}
