use tracing::debug;

use crate::error::SeriesError;
use crate::models::{Caller, CallerKind};
use crate::source::ScoreSource;

/// Decides whether `caller` may view `(track_id, student_id)`.
///
/// Servers always pass. Clients pass when asking for their own student id or
/// when they teach the track. Everyone else is rejected.
pub async fn authorize<S: ScoreSource>(
    source: &S,
    caller: &Caller,
    track_id: &str,
    student_id: Option<&str>,
) -> Result<(), SeriesError> {
    match caller.kind {
        CallerKind::Server => Ok(()),
        CallerKind::Client => {
            let Some(user_id) = caller.user_id.as_deref() else {
                return Err(SeriesError::Forbidden);
            };
            if student_id == Some(user_id) {
                return Ok(());
            }
            let is_teacher = source
                .is_teacher_of_track(track_id, user_id)
                .await
                .map_err(SeriesError::UpstreamFetchFailed)?;
            if is_teacher {
                Ok(())
            } else {
                debug!(track_id, user_id, "client is neither the student nor a track teacher");
                Err(SeriesError::Forbidden)
            }
        }
        CallerKind::Demo => Err(SeriesError::Forbidden),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ScoreEvent, TrackWindow};
    use crate::source::EventQuery;

    struct Membership {
        teachers: Vec<(&'static str, &'static str)>,
    }

    impl ScoreSource for Membership {
        async fn fetch_score_events(
            &self,
            _query: &EventQuery<'_>,
        ) -> Result<Vec<ScoreEvent>, sqlx::Error> {
            Ok(Vec::new())
        }

        async fn track_window(&self, _track_id: &str) -> Result<Option<TrackWindow>, sqlx::Error> {
            Ok(None)
        }

        async fn is_teacher_of_track(
            &self,
            track_id: &str,
            user_id: &str,
        ) -> Result<bool, sqlx::Error> {
            Ok(self
                .teachers
                .iter()
                .any(|(track, user)| *track == track_id && *user == user_id))
        }
    }

    fn membership() -> Membership {
        Membership {
            teachers: vec![("track-1", "teacher-9")],
        }
    }

    #[tokio::test]
    async fn server_is_always_allowed() {
        let result = authorize(&membership(), &Caller::server(), "track-1", Some("stu-1")).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn client_may_view_own_series() {
        let caller = Caller::client("stu-1");
        assert!(authorize(&membership(), &caller, "track-1", Some("stu-1")).await.is_ok());
    }

    #[tokio::test]
    async fn teacher_may_view_any_student_on_track() {
        let caller = Caller::client("teacher-9");
        assert!(authorize(&membership(), &caller, "track-1", Some("stu-1")).await.is_ok());
        assert!(authorize(&membership(), &caller, "track-1", None).await.is_ok());
        assert!(matches!(
            authorize(&membership(), &caller, "track-2", Some("stu-1")).await,
            Err(SeriesError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn client_cannot_view_another_student() {
        let caller = Caller::client("stu-2");
        assert!(matches!(
            authorize(&membership(), &caller, "track-1", Some("stu-1")).await,
            Err(SeriesError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn demo_and_anonymous_clients_are_rejected() {
        let demo = Caller {
            kind: CallerKind::Demo,
            user_id: None,
        };
        let anonymous = Caller {
            kind: CallerKind::Client,
            user_id: None,
        };
        for caller in [demo, anonymous] {
            assert!(matches!(
                authorize(&membership(), &caller, "track-1", Some("stu-1")).await,
                Err(SeriesError::Forbidden)
            ));
        }
    }
}
