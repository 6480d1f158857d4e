use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing_subscriber::EnvFilter;

use dojang_evaluation::{db, import, report};

#[derive(Parser)]
#[command(name = "dojang-evaluation", version)]
#[command(about = "Belt promotion evaluation scoring for taekwondo schools", long_about = None)]
struct Cli {
    /// Postgres connection string
    #[arg(long, env = "DATABASE_URL", global = true, hide_env_values = true)]
    database_url: Option<String>,

    /// Connection pool size
    #[arg(long, env = "DATABASE_MAX_CONNECTIONS", default_value_t = 5, global = true)]
    max_connections: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load sample students and evaluations
    Seed,
    /// Import evaluations from a CSV sheet
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Score a CSV sheet without touching the database
    Grade {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Generate a markdown report
    #[command(group(
        ArgGroup::new("scope")
            .args(["belt", "email"])
            .multiple(false)
    ))]
    Report {
        #[arg(long)]
        belt: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long, default_value_t = 30)]
        since_days: i64,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("dojang_evaluation=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::InitDb => {
            let pool = connect(cli.database_url.as_deref(), cli.max_connections).await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let pool = connect(cli.database_url.as_deref(), cli.max_connections).await?;
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let pool = connect(cli.database_url.as_deref(), cli.max_connections).await?;
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Inserted {inserted} evaluations from {}.", csv.display());
        }
        Commands::Grade { csv, format } => {
            let rows = import::read_evaluations(&csv)?;
            let graded = import::grade_rows(&rows);

            match format {
                OutputFormat::Json => {
                    let json = serde_json::to_string_pretty(&graded)
                        .context("failed to serialize evaluations")?;
                    println!("{json}");
                }
                OutputFormat::Text => {
                    if graded.is_empty() {
                        println!("No evaluations in {}.", csv.display());
                        return Ok(());
                    }
                    for row in &graded {
                        println!(
                            "- {} ({}, {} belt) total {} grade {} {} [{}]",
                            row.full_name,
                            row.email,
                            row.belt,
                            row.evaluation.total_score,
                            row.evaluation.grade,
                            if row.evaluation.passed { "PASS" } else { "FAIL" },
                            row.status
                        );
                    }
                }
            }
        }
        Commands::Report {
            belt,
            email,
            since_days,
            out,
        } => {
            let pool = connect(cli.database_url.as_deref(), cli.max_connections).await?;
            let since_date = report::cutoff_date(since_days);
            let evaluations = db::fetch_evaluations(
                &pool,
                since_date,
                belt.as_deref(),
                email.as_deref(),
            )
            .await?;
            let report = report::build_report(
                belt.as_deref().or(email.as_deref()),
                since_date,
                &evaluations,
            );
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write report to {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

async fn connect(database_url: Option<&str>, max_connections: u32) -> anyhow::Result<PgPool> {
    let database_url = database_url
        .context("DATABASE_URL must be set (or pass --database-url) for database commands")?;

    tracing::debug!(max_connections, "connecting to Postgres");
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .context("failed to connect to Postgres")
}
