use anyhow::Context;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use sqlx::{PgPool, Row};
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{Role, ScoreEvent, TrackWindow};
use crate::source::{EventQuery, ScoreSource};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Postgres-backed reads for the series engine.
#[derive(Clone)]
pub struct PgScoreSource {
    pool: PgPool,
}

impl PgScoreSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl ScoreSource for PgScoreSource {
    async fn fetch_score_events(
        &self,
        query: &EventQuery<'_>,
    ) -> Result<Vec<ScoreEvent>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT ts.track_id, sms.student_id, sms.metric_id, sms.role_at_rate,
                   sms.value AS value_raw, ts.occurred_at
            FROM track_scores.step_metric_scores sms
            JOIN track_scores.track_steps ts ON ts.step_id = sms.step_id
            WHERE ts.track_id = $1
              AND ($2::text IS NULL OR sms.student_id = $2)
              AND ($3::text IS NULL OR sms.metric_id = $3)
              AND ts.occurred_at >= $4
              AND ts.occurred_at < $5
            ORDER BY ts.occurred_at ASC
            "#,
        )
        .bind(query.track_id)
        .bind(query.student_id)
        .bind(query.metric_id)
        .bind(query.since)
        .bind(query.until)
        .fetch_all(&self.pool)
        .await?;

        let mut events = Vec::with_capacity(rows.len());
        for row in rows {
            events.push(ScoreEvent {
                track_id: row.try_get("track_id")?,
                student_id: row.try_get("student_id")?,
                metric_id: row.try_get("metric_id")?,
                rater_role: row.try_get("role_at_rate")?,
                value_raw: row.try_get("value_raw")?,
                occurred_at: row.try_get("occurred_at")?,
            });
        }

        debug!(track_id = query.track_id, rows = events.len(), "fetched score events");
        Ok(events)
    }

    async fn track_window(&self, track_id: &str) -> Result<Option<TrackWindow>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT track_id, start_at, end_at FROM track_scores.tracks WHERE track_id = $1",
        )
        .bind(track_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| -> Result<TrackWindow, sqlx::Error> {
            Ok(TrackWindow {
                track_id: row.try_get("track_id")?,
                start_at: row.try_get("start_at")?,
                end_at: row.try_get("end_at")?,
            })
        })
        .transpose()
    }

    async fn is_teacher_of_track(
        &self,
        track_id: &str,
        user_id: &str,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM track_scores.track_participants
                WHERE track_id = $1 AND user_id = $2 AND role_in_track = 'teacher'
            )
            "#,
        )
        .bind(track_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
    }
}

async fn upsert_track(
    pool: &PgPool,
    track_id: &str,
    title: &str,
    start_at: Option<NaiveDateTime>,
    end_at: Option<NaiveDateTime>,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO track_scores.tracks (track_id, title, start_at, end_at)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (track_id) DO NOTHING
        "#,
    )
    .bind(track_id)
    .bind(title)
    .bind(start_at)
    .bind(end_at)
    .execute(pool)
    .await?;
    Ok(())
}

async fn upsert_step(
    pool: &PgPool,
    step_id: &str,
    track_id: &str,
    occurred_at: NaiveDateTime,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO track_scores.track_steps (step_id, track_id, occurred_at)
        VALUES ($1, $2, $3)
        ON CONFLICT (step_id) DO NOTHING
        "#,
    )
    .bind(step_id)
    .bind(track_id)
    .bind(occurred_at)
    .execute(pool)
    .await?;
    Ok(())
}

struct NewScore<'a> {
    step_id: &'a str,
    student_id: &'a str,
    metric_id: &'a str,
    value: f64,
    rater_user_id: Option<&'a str>,
    role: &'a str,
    source_key: &'a str,
}

/// Returns whether a row was written; duplicates by `source_key` are skipped.
async fn insert_score(pool: &PgPool, score: &NewScore<'_>) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO track_scores.step_metric_scores
        (score_id, step_id, student_id, metric_id, value, rater_user_id, role_at_rate, source_key)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (source_key) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(score.step_id)
    .bind(score.student_id)
    .bind(score.metric_id)
    .bind(score.value)
    .bind(score.rater_user_id)
    .bind(score.role)
    .bind(score.source_key)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let track_id = "track-robotics-2026";
    let start = NaiveDate::from_ymd_opt(2026, 1, 5)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .context("invalid date")?;
    let end = start + Duration::weeks(6);
    upsert_track(pool, track_id, "Robotics Lab 2026", Some(start), Some(end)).await?;

    let participants = [
        ("avery.lee", Role::Student),
        ("jules.moreno", Role::Teacher),
        ("kiara.patel", Role::Mentor),
    ];
    for (user_id, role) in participants {
        sqlx::query(
            r#"
            INSERT INTO track_scores.track_participants (track_id, user_id, role_in_track)
            VALUES ($1, $2, $3)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(track_id)
        .bind(user_id)
        .bind(role.as_str())
        .execute(pool)
        .await?;
    }

    // Twice-weekly sessions; the mentor only shows up every other week.
    let ratings: [(i64, Option<f64>, Option<f64>, Option<f64>); 8] = [
        (1, Some(62.0), Some(70.0), Some(65.0)),
        (4, Some(58.0), Some(72.0), None),
        (8, Some(66.0), Some(75.0), None),
        (11, Some(71.0), None, None),
        (15, Some(69.0), Some(78.0), Some(74.0)),
        (22, Some(74.0), Some(81.0), None),
        (29, Some(80.0), Some(84.0), Some(79.0)),
        (36, Some(83.0), Some(88.0), None),
    ];

    for (offset, student, teacher, mentor) in ratings {
        let step_id = format!("{track_id}-step-{offset:02}");
        upsert_step(pool, &step_id, track_id, start + Duration::days(offset) + Duration::hours(14))
            .await?;

        let rated = [
            ("avery.lee", Role::Student, student),
            ("jules.moreno", Role::Teacher, teacher),
            ("kiara.patel", Role::Mentor, mentor),
        ];
        for (rater, role, value) in rated {
            let Some(value) = value else { continue };
            let source_key = format!("seed-{step_id}-{role}");
            insert_score(
                pool,
                &NewScore {
                    step_id: &step_id,
                    student_id: "avery.lee",
                    metric_id: "teamwork",
                    value,
                    rater_user_id: Some(rater),
                    role: role.as_str(),
                    source_key: &source_key,
                },
            )
            .await?;
        }
    }

    info!(track_id, "seed data ready");
    Ok(())
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        track_id: String,
        step_id: String,
        occurred_at: NaiveDateTime,
        student_id: String,
        metric_id: String,
        rater_role: String,
        rater_user_id: Option<String>,
        value: f64,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        upsert_track(pool, &row.track_id, &row.track_id, None, None).await?;
        upsert_step(pool, &row.step_id, &row.track_id, row.occurred_at).await?;

        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        let written = insert_score(
            pool,
            &NewScore {
                step_id: &row.step_id,
                student_id: &row.student_id,
                metric_id: &row.metric_id,
                value: row.value,
                rater_user_id: row.rater_user_id.as_deref(),
                role: &row.rater_role,
                source_key: &source_key,
            },
        )
        .await?;

        if written {
            inserted += 1;
        }
    }

    Ok(inserted)
}
