use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod activity;
mod db;
mod dedupe;
mod error;
mod models;
mod report;
mod validate;

use error::SubmitError;
use models::{AgentDraft, AgentRecord, AgentRole, DailyNote};

#[derive(Parser)]
#[command(name = "panchayath-agent-tracker")]
#[command(about = "Field agent records and inactivity reporting for panchayath operations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Add an agent record
    Add {
        /// coordinator, supervisor, group-leader, or pro
        #[arg(long)]
        role: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        mobile: String,
        #[arg(long)]
        ward: i32,
        #[arg(long)]
        panchayath: String,
        /// Coordinator rating, 1 to 5
        #[arg(long)]
        rating: Option<i32>,
        /// Group leader's mobile number (PRO records)
        #[arg(long)]
        group_leader: Option<String>,
    },
    /// Edit an existing agent record
    Update {
        /// coordinator, supervisor, group-leader, or pro
        #[arg(long)]
        role: String,
        #[arg(long)]
        id: Uuid,
        #[arg(long)]
        name: String,
        #[arg(long)]
        mobile: String,
        #[arg(long)]
        ward: i32,
        #[arg(long)]
        panchayath: String,
        /// Coordinator rating, 1 to 5
        #[arg(long)]
        rating: Option<i32>,
        /// Group leader's mobile number (PRO records)
        #[arg(long)]
        group_leader: Option<String>,
    },
    /// Record one daily activity note
    Note {
        #[arg(long)]
        mobile: String,
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        leave: bool,
        #[arg(long, default_value = "")]
        activity: String,
    },
    /// Import daily notes from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Show one agent's activity summary for a month
    Status {
        #[arg(long)]
        mobile: String,
        /// Month selector, YYYY-MM
        #[arg(long)]
        month: String,
    },
    /// Generate the monthly panchayath report
    Report {
        #[arg(long)]
        panchayath: String,
        /// Month selector, YYYY-MM
        #[arg(long)]
        month: String,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
        /// Print JSON to stdout instead of writing markdown
        #[arg(long)]
        json: bool,
    },
}

/// Resolved after validation so a rejected draft never reaches the network.
async fn resolve_group_leader(pool: &PgPool, draft: &AgentDraft) -> anyhow::Result<Option<Uuid>> {
    match (draft.role, draft.group_leader_mobile.as_deref()) {
        (AgentRole::Pro, Some(gl_mobile)) => {
            let normalized = validate::normalize_mobile(gl_mobile);
            let id = db::find_group_leader(pool, &normalized)
                .await?
                .with_context(|| format!("no group leader with mobile {gl_mobile}"))?;
            Ok(Some(id))
        }
        _ => Ok(None),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
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
        Commands::Add {
            role,
            name,
            mobile,
            ward,
            panchayath,
            rating,
            group_leader,
        } => {
            let role: AgentRole = role.parse().map_err(anyhow::Error::msg)?;
            let panchayath = db::fetch_panchayath(&pool, &panchayath)
                .await?
                .with_context(|| format!("unknown panchayath {panchayath:?}"))?;
            let draft = AgentDraft {
                role,
                name,
                mobile_number: mobile,
                ward,
                rating,
                group_leader_mobile: group_leader,
            };
            let mobile = validate::validate_draft(&draft, &panchayath)?;
            let group_leader_id = resolve_group_leader(&pool, &draft).await?;

            let check = db::check_duplicate(&pool, &mobile, None, role).await?;
            if let Some(table) = check.table {
                return Err(SubmitError::DuplicateMobile { table }.into());
            }

            let agent = AgentRecord {
                id: Uuid::new_v4(),
                role,
                name: draft.name.trim().to_string(),
                mobile_number: mobile,
                ward: draft.ward,
                panchayath_id: panchayath.id,
                rating: draft.rating,
                group_leader_id,
            };
            db::insert_agent(&pool, &agent).await?;
            println!(
                "{} added: {} ({}), ward {} of {}.",
                role.label(),
                agent.name,
                agent.mobile_number,
                agent.ward,
                panchayath.name
            );
        }
        Commands::Update {
            role,
            id,
            name,
            mobile,
            ward,
            panchayath,
            rating,
            group_leader,
        } => {
            let role: AgentRole = role.parse().map_err(anyhow::Error::msg)?;
            let existing = db::fetch_agent(&pool, role, id)
                .await?
                .with_context(|| format!("no {} with id {id}", role.label()))?;
            let panchayath = db::fetch_panchayath(&pool, &panchayath)
                .await?
                .with_context(|| format!("unknown panchayath {panchayath:?}"))?;
            let draft = AgentDraft {
                role,
                name,
                mobile_number: mobile,
                ward,
                rating,
                group_leader_mobile: group_leader,
            };
            let mobile = validate::validate_draft(&draft, &panchayath)?;
            let group_leader_id = resolve_group_leader(&pool, &draft).await?;

            let check = db::check_duplicate(&pool, &mobile, Some(existing.id), role).await?;
            if let Some(table) = check.table {
                return Err(SubmitError::DuplicateMobile { table }.into());
            }

            let agent = AgentRecord {
                id: existing.id,
                role,
                name: draft.name.trim().to_string(),
                mobile_number: mobile,
                ward: draft.ward,
                panchayath_id: panchayath.id,
                rating: draft.rating,
                group_leader_id,
            };
            db::update_agent(&pool, &agent).await?;
            println!("{} updated: {} ({}).", role.label(), agent.name, agent.mobile_number);
        }
        Commands::Note {
            mobile,
            date,
            leave,
            activity,
        } => {
            let mobile = validate::normalize_mobile(&mobile);
            anyhow::ensure!(
                mobile.len() == validate::MOBILE_DIGITS,
                "mobile number must be exactly 10 digits"
            );
            let note = DailyNote {
                mobile_number: mobile.clone(),
                note_date: date,
                is_leave: leave,
                activity,
            };
            db::upsert_note(&pool, &note).await?;
            println!("Note recorded for {mobile} on {date}.");
        }
        Commands::Import { csv } => {
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Inserted {inserted} notes from {}.", csv.display());
        }
        Commands::Status { mobile, month } => {
            let (start, end) = activity::month_bounds(&month)
                .with_context(|| format!("invalid month {month:?}; expected YYYY-MM"))?;
            let mobile = validate::normalize_mobile(&mobile);
            let notes = db::fetch_notes(&pool, &mobile, start, end).await?;
            let summary = activity::analyze_notes(&notes, start, end, Utc::now().date_naive());

            println!("Activity for {mobile} in {month}:");
            println!("- consecutive leave days: {}", summary.consecutive_leave_days);
            println!(
                "- inactive: {}",
                if summary.is_inactive { "yes" } else { "no" }
            );
            match summary.last_activity_date {
                Some(date) => println!("- last active: {date}"),
                None => println!("- last active: never in this window"),
            }
            println!("- notes recorded: {}", summary.total_notes);
        }
        Commands::Report {
            panchayath,
            month,
            out,
            json,
        } => {
            let (start, end) = activity::month_bounds(&month)
                .with_context(|| format!("invalid month {month:?}; expected YYYY-MM"))?;
            let panchayath = db::fetch_panchayath(&pool, &panchayath)
                .await?
                .with_context(|| format!("unknown panchayath {panchayath:?}"))?;

            let agents = db::fetch_agents(&pool, panchayath.id).await?;
            let today = Utc::now().date_naive();
            let mut performances = Vec::new();
            for agent in &agents {
                let notes = db::fetch_notes(&pool, &agent.mobile_number, start, end).await?;
                let summary = activity::analyze_notes(&notes, start, end, today);
                performances.push(activity::performance(agent, summary));
            }

            let report = report::assemble(&panchayath.name, start, end, performances);
            tracing::info!(
                panchayath = %report.panchayath,
                agents = report.total_agents,
                inactive = report.inactive_agents,
                "report generated"
            );

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                std::fs::write(&out, report::render_markdown(&report))?;
                println!("Report written to {}.", out.display());
            }
        }
    }

    Ok(())
}
