use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDateTime;
use clap::{Args, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod access;
mod aggregate;
mod composite;
mod config;
mod db;
mod engine;
mod error;
mod gapfill;
mod interval;
mod models;
mod report;
mod score;
mod smooth;
mod source;
mod time;

use config::EngineConfig;
use engine::{SeriesEngine, SeriesRequest};
use models::{Caller, CallerKind};

#[derive(Parser)]
#[command(name = "track-score-series")]
#[command(about = "Smoothed multi-role score series for learning tracks", long_about = None)]
struct Cli {
    /// TOML deployment config; built-in defaults apply when absent
    #[arg(long, global = true, env = "SCORE_SERIES_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load a demo track with a few weeks of ratings
    Seed,
    /// Import score events from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Print the smoothed series as JSON
    Series(SeriesArgs),
    /// Write the smoothed series as a markdown report
    Report {
        #[command(flatten)]
        series: SeriesArgs,
        #[arg(long, default_value = "series-report.md")]
        out: PathBuf,
    },
}

#[derive(Args)]
struct SeriesArgs {
    #[arg(long)]
    track: String,
    #[arg(long)]
    student: Option<String>,
    #[arg(long)]
    metric: Option<String>,
    #[arg(long, value_parser = time::parse_timestamp)]
    since: Option<NaiveDateTime>,
    #[arg(long, value_parser = time::parse_timestamp)]
    until: Option<NaiveDateTime>,
    /// `day` or `week`
    #[arg(long)]
    interval: Option<String>,
    #[arg(long, allow_negative_numbers = true)]
    max_points: Option<i64>,
    #[arg(long, default_value = "server")]
    caller: CallerKind,
    /// User id bound to a client caller
    #[arg(long)]
    caller_user: Option<String>,
}

impl SeriesArgs {
    fn request(&self) -> SeriesRequest {
        SeriesRequest {
            track_id: self.track.clone(),
            student_id: self.student.clone(),
            metric_id: self.metric.clone(),
            since: self.since,
            until: self.until,
            interval: self.interval.clone(),
            max_points: self.max_points,
        }
    }

    fn caller(&self) -> Caller {
        Caller {
            kind: self.caller,
            user_id: self.caller_user.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let engine_config =
        EngineConfig::load(cli.config.as_deref()).context("invalid series configuration")?;
    info!(
        alpha = engine_config.alpha,
        relaxed = engine_config.relaxed,
        strategy = engine_config.gap_strategy.as_str(),
        interval = %engine_config.default_interval,
        default_max_points = engine_config.default_max_points,
        max_points_ceiling = engine_config.max_points_ceiling,
        w_teacher = engine_config.weights.teacher,
        w_mentor = engine_config.weights.mentor,
        w_student = engine_config.weights.student,
        "series config loaded"
    );

    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a production Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Inserted {inserted} scores from {}.", csv.display());
        }
        Commands::Series(args) => {
            let engine = SeriesEngine::new(engine_config, db::PgScoreSource::new(pool));
            let series = engine.compute(&args.request(), &args.caller()).await?;
            println!("{}", serde_json::to_string_pretty(&series)?);
        }
        Commands::Report { series: args, out } => {
            let engine = SeriesEngine::new(engine_config, db::PgScoreSource::new(pool));
            let series = engine.compute(&args.request(), &args.caller()).await?;
            let report = report::build_report(&args.track, args.student.as_deref(), &series);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
