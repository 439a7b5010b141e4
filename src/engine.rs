use chrono::NaiveDateTime;
use tracing::{debug, info};

use crate::access;
use crate::aggregate::aggregate_by_role;
use crate::composite::compose;
use crate::config::EngineConfig;
use crate::error::SeriesError;
use crate::gapfill::fill_gaps;
use crate::interval::{build_grid, IntervalUnit};
use crate::models::{Caller, SeriesResponse};
use crate::smooth::ema;
use crate::source::{EventQuery, ScoreSource};
use crate::time::now_naive_utc;

/// One chart request. `interval` and `max_points` are kept as the caller sent
/// them so the engine can reject bad values itself.
#[derive(Debug, Clone, Default)]
pub struct SeriesRequest {
    pub track_id: String,
    pub student_id: Option<String>,
    pub metric_id: Option<String>,
    pub since: Option<NaiveDateTime>,
    pub until: Option<NaiveDateTime>,
    pub interval: Option<String>,
    pub max_points: Option<i64>,
}

pub struct SeriesEngine<S> {
    config: EngineConfig,
    source: S,
}

impl<S: ScoreSource> SeriesEngine<S> {
    pub fn new(config: EngineConfig, source: S) -> Self {
        Self { config, source }
    }

    pub async fn compute(
        &self,
        request: &SeriesRequest,
        caller: &Caller,
    ) -> Result<SeriesResponse, SeriesError> {
        self.compute_at(request, caller, now_naive_utc()).await
    }

    /// Same as [`compute`](Self::compute) with "now" pinned, for open track windows.
    pub async fn compute_at(
        &self,
        request: &SeriesRequest,
        caller: &Caller,
        now: NaiveDateTime,
    ) -> Result<SeriesResponse, SeriesError> {
        let track_id = request.track_id.as_str();
        let student_id = request.student_id.as_deref();

        // validating
        let unit = match request.interval.as_deref() {
            Some(value) => value.parse::<IntervalUnit>()?,
            None => self.config.default_interval,
        };
        let max_points = self.resolve_max_points(request.max_points)?;
        access::authorize(&self.source, caller, track_id, student_id).await?;

        // resolving_range
        let window = self
            .source
            .track_window(track_id)
            .await
            .map_err(SeriesError::UpstreamFetchFailed)?
            .ok_or_else(|| SeriesError::TrackNotFound(track_id.to_string()))?;
        debug!(
            track_id = %window.track_id,
            start_at = ?window.start_at,
            end_at = ?window.end_at,
            "track window resolved"
        );
        let since = request.since.or(window.start_at).unwrap_or(now);
        let until = request.until.or(window.end_at).unwrap_or(now);
        if until < since {
            return Err(SeriesError::InvalidRange { since, until });
        }
        let grid = build_grid(since, until, unit, max_points)?;
        let (span_start, span_end) = grid.span();
        debug!(track_id, %unit, buckets = grid.len(), %span_start, %span_end, "bucket grid ready");

        // fetching
        let query = EventQuery {
            track_id,
            student_id,
            metric_id: request.metric_id.as_deref(),
            since: span_start,
            until: span_end,
        };
        let mut events = self
            .source
            .fetch_score_events(&query)
            .await
            .map_err(SeriesError::UpstreamFetchFailed)?;
        let fetched = events.len();
        events.retain(|event| event.track_id == track_id);
        if events.len() < fetched {
            debug!(track_id, foreign = fetched - events.len(), "dropped events from other tracks");
        }

        // aggregating, filling, smoothing
        let strategy = self.config.gap_strategy;
        let alpha = self.config.alpha;
        let smoothed = aggregate_by_role(&grid, &events)
            .map(|sparse| ema(&fill_gaps(&sparse, strategy), alpha));

        // composing
        let points = compose(&grid, &smoothed, &self.config.weights);
        info!(
            track_id,
            events = events.len(),
            points = points.len(),
            "score series computed"
        );

        Ok(SeriesResponse {
            interval: unit.as_str(),
            points,
        })
    }

    fn resolve_max_points(&self, requested: Option<i64>) -> Result<usize, SeriesError> {
        let ceiling = self.config.max_points_ceiling;
        let Some(requested) = requested else {
            return Ok(self.config.default_max_points);
        };
        match usize::try_from(requested) {
            Ok(value) if value >= 1 && value <= ceiling => Ok(value),
            _ => Err(SeriesError::InvalidMaxPoints { requested, ceiling }),
        }
    }
}
