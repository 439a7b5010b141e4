use chrono::NaiveDateTime;
use thiserror::Error;

/// Every way a series request can fail. None of these degrade to an empty series.
#[derive(Debug, Error)]
pub enum SeriesError {
    #[error("invalid interval `{0}`: expected `day` or `week`")]
    InvalidInterval(String),

    #[error("invalid max_points {requested}: must be between 1 and {ceiling}")]
    InvalidMaxPoints { requested: i64, ceiling: usize },

    #[error("range covers {points} buckets, more than max_points {max_points}")]
    RangeTooLarge { points: i64, max_points: usize },

    #[error("invalid range: until {until} is earlier than since {since}")]
    InvalidRange {
        since: NaiveDateTime,
        until: NaiveDateTime,
    },

    #[error("track {0} not found")]
    TrackNotFound(String),

    #[error("caller may not view this track scope")]
    Forbidden,

    #[error("score source query failed: {0}")]
    UpstreamFetchFailed(#[source] sqlx::Error),
}
