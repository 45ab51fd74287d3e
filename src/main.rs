use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgGroup, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

mod classify;
mod config;
mod db;
mod mapping;
mod models;
mod report;
mod roadmap;
mod telemetry;

use classify::CandidateFilter;
use config::AppConfig;
use mapping::{JsonFileMappingStore, MappingStore, PgMappingStore};
use models::FeedbackAssessment;
use roadmap::COURSE_CATALOG;

#[derive(Parser)]
#[command(name = "hire-signal")]
#[command(about = "Recruiting dashboard: positions, candidates and remedial roadmaps", long_about = None)]
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
    /// Import completed interview responses from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// List positions with candidate counts
    Positions {
        #[arg(long)]
        organization: String,
        #[arg(long)]
        user: Option<String>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Show one position with its statistics
    Position {
        #[arg(long)]
        id: Uuid,
    },
    /// List candidates for a position
    Candidates {
        #[arg(long)]
        position: Uuid,
        #[arg(long, value_enum, default_value_t = CandidateFilter::All)]
        filter: CandidateFilter,
        #[arg(long)]
        limit: Option<usize>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Show the candidate behind a call
    Call {
        #[arg(long)]
        call_id: String,
    },
    /// Decide whether a candidate needs a learning roadmap and which courses fit
    #[command(group(
        ArgGroup::new("source")
            .args(["call_id", "feedback"])
            .required(true)
            .multiple(false)
    ))]
    Roadmap {
        #[arg(long)]
        call_id: Option<String>,
        /// Feedback JSON file; no database needed
        #[arg(long)]
        feedback: Option<PathBuf>,
    },
    /// Manage cached AI feedback
    Feedback {
        #[command(subcommand)]
        command: FeedbackCommand,
    },
    /// Manage interview to resume file mappings
    Mapping {
        /// Use a JSON file instead of the database
        #[arg(long, global = true)]
        file: bool,
        #[command(subcommand)]
        command: MappingCommand,
    },
    /// Generate a markdown report for a position
    Report {
        #[arg(long)]
        position: Uuid,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[derive(Subcommand)]
enum FeedbackCommand {
    /// Cache feedback JSON for a call, replacing any previous entry
    Store {
        #[arg(long)]
        call_id: String,
        #[arg(long)]
        interview_id: String,
        #[arg(long)]
        file: PathBuf,
    },
    /// Print cached feedback for a call
    Show {
        #[arg(long)]
        call_id: String,
    },
    /// Remove cached feedback for a call
    Delete {
        #[arg(long)]
        call_id: String,
    },
    /// List calls with cached feedback for an interview
    List {
        #[arg(long)]
        interview_id: String,
    },
}

#[derive(Subcommand)]
enum MappingCommand {
    Set {
        #[arg(long)]
        interview_id: String,
        #[arg(long)]
        path: String,
    },
    Get {
        #[arg(long)]
        interview_id: String,
    },
    Remove {
        #[arg(long)]
        interview_id: String,
    },
    List,
}

fn read_feedback(path: &std::path::Path) -> anyhow::Result<FeedbackAssessment> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("{} is not valid feedback", path.display()))
}

fn print_roadmap(subject: &str, feedback: Option<&FeedbackAssessment>) {
    print!("{}", report::roadmap_report(subject, feedback, &COURSE_CATALOG));
}

async fn run_mapping<S: MappingStore>(store: &S, command: MappingCommand) -> anyhow::Result<()> {
    match command {
        MappingCommand::Set { interview_id, path } => {
            store.set(&interview_id, &path).await?;
            println!("Mapped {interview_id} -> {path}.");
        }
        MappingCommand::Get { interview_id } => match store.get(&interview_id).await? {
            Some(path) => println!("{path}"),
            None => println!("No resume mapped for {interview_id}."),
        },
        MappingCommand::Remove { interview_id } => {
            if store.remove(&interview_id).await? {
                println!("Removed mapping for {interview_id}.");
            } else {
                println!("No resume mapped for {interview_id}.");
            }
        }
        MappingCommand::List => {
            let mappings = store.all().await?;
            if mappings.is_empty() {
                println!("No resume mappings.");
            }
            for (interview_id, path) in mappings {
                println!("- {interview_id} -> {path}");
            }
        }
    }

    Ok(())
}

async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    let database_url = config.require_database_url()?;

    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(database_url)
        .await
        .context("failed to connect to Postgres")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    telemetry::init(&config.log_level)?;

    match cli.command {
        Commands::Roadmap {
            feedback: Some(path),
            ..
        } => {
            let feedback = read_feedback(&path)?;
            print_roadmap(&path.display().to_string(), Some(&feedback));
            Ok(())
        }
        Commands::Mapping {
            file: true,
            command,
        } => {
            let store = JsonFileMappingStore::new(config.mapping_file.clone());
            run_mapping(&store, command).await
        }
        command => run(&config, command).await,
    }
}

async fn run(config: &AppConfig, command: Commands) -> anyhow::Result<()> {
    let pool = connect(config).await?;

    match command {
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
            println!("Inserted {inserted} responses from {}.", csv.display());
        }
        Commands::Positions {
            organization,
            user,
            json,
        } => {
            let positions = db::fetch_positions(&pool, &organization, user.as_deref()).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&positions)?);
                return Ok(());
            }

            if positions.is_empty() {
                println!("No active positions.");
                return Ok(());
            }

            for position in positions.iter() {
                let counts = &position.counts;
                println!(
                    "- {} [{}] total {} / selected {} / potential {} / not selected {} / no status {}",
                    position.name,
                    position.id,
                    counts.total_candidates,
                    counts.hired_count,
                    counts.interviewed_count,
                    counts.rejected_count,
                    counts.pending_count
                );
            }
        }
        Commands::Position { id } => {
            let (position, responses) = db::fetch_position(&pool, id)
                .await?
                .with_context(|| format!("position {id} not found"))?;
            let stats = classify::position_stats(&classify::display_records(&responses));

            println!("{} ({})", position.name, position.organization_id);
            println!(
                "Total {} / selected {} / potential {} / not selected {} / no status {}",
                stats.counts.total_candidates,
                stats.counts.hired_count,
                stats.counts.interviewed_count,
                stats.counts.rejected_count,
                stats.counts.pending_count
            );
            println!("Average score {}", stats.average_score);
            for candidate in stats.top_performers.iter() {
                println!("- {} score {}", candidate.name, candidate.score);
            }
        }
        Commands::Candidates {
            position,
            filter,
            limit,
            json,
        } => {
            let responses = db::load_responses(&pool, position).await;
            let candidates = classify::display_records(&responses);
            let mut filtered = classify::filter_candidates(&candidates, filter);
            if let Some(limit) = limit {
                filtered.truncate(limit);
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&filtered)?);
                return Ok(());
            }

            if filtered.is_empty() {
                println!("No candidates match this filter.");
                return Ok(());
            }

            for candidate in filtered.iter() {
                println!(
                    "- {} ({}) score {} {} [{}] {} call {}",
                    candidate.name,
                    candidate.email,
                    candidate.score,
                    candidate.status.slug(),
                    candidate.performance_rating.label(),
                    candidate.interview_date,
                    candidate.call_id
                );
            }
        }
        Commands::Call { call_id } => {
            let response = db::fetch_response_by_call(&pool, &call_id)
                .await?
                .with_context(|| format!("no response recorded for call {call_id}"))?;
            let candidate = classify::display_record(&response);

            println!("{} ({})", candidate.name, candidate.email);
            println!("Response {} for position {}", response.id, response.interview_id);
            println!(
                "Score {} ({}, {} band)",
                candidate.score,
                candidate.performance_rating.label(),
                classify::score_band(candidate.score).label()
            );
            println!("Status {}", candidate.status.label());
            println!("Interviewed {}", candidate.interview_date);
            println!("Duration {}", report::format_duration(candidate.duration));
            if let Some(switches) = candidate.tab_switch_count {
                println!("Tab switches {switches}");
            }
            if !candidate.skills.is_empty() {
                println!("Skills {}", candidate.skills.join(", "));
            }
        }
        Commands::Roadmap { call_id, .. } => {
            let call_id = call_id.context("--call-id or --feedback is required")?;
            let feedback = match db::get_cached_feedback(&pool, &call_id).await {
                Ok(feedback) => feedback,
                Err(err) => {
                    warn!(call_id = %call_id, error = %err, "cached feedback unavailable");
                    None
                }
            };
            print_roadmap(&call_id, feedback.as_ref());
        }
        Commands::Feedback { command } => match command {
            FeedbackCommand::Store {
                call_id,
                interview_id,
                file,
            } => {
                let feedback = read_feedback(&file)?;
                let replacing = db::has_cached_feedback(&pool, &call_id).await?;
                db::cache_feedback(&pool, &call_id, &interview_id, &feedback).await?;
                if replacing {
                    println!("Replaced cached feedback for {call_id}.");
                } else {
                    println!("Cached feedback for {call_id}.");
                }
            }
            FeedbackCommand::Show { call_id } => {
                match db::get_cached_feedback(&pool, &call_id).await? {
                    Some(feedback) => print!("{}", report::feedback_summary(&call_id, &feedback)),
                    None => println!("No cached feedback for {call_id}."),
                }
            }
            FeedbackCommand::Delete { call_id } => {
                if db::delete_cached_feedback(&pool, &call_id).await? {
                    println!("Deleted cached feedback for {call_id}.");
                } else {
                    println!("No cached feedback for {call_id}.");
                }
            }
            FeedbackCommand::List { interview_id } => {
                let entries = db::cached_feedback_by_interview(&pool, &interview_id).await?;
                if entries.is_empty() {
                    println!("No cached feedback for interview {interview_id}.");
                }
                for (call_id, feedback) in entries {
                    let flag = if roadmap::should_show_roadmap(&feedback) {
                        "roadmap"
                    } else {
                        "on track"
                    };
                    let ats = feedback
                        .ats_score
                        .as_ref()
                        .and_then(|ats| ats.score)
                        .map(|score| score.to_string())
                        .unwrap_or_else(|| "n/a".to_string());
                    println!("- {call_id}: ATS {ats}, {flag}");
                }
            }
        },
        Commands::Mapping { command, .. } => {
            let store = PgMappingStore::new(pool);
            run_mapping(&store, command).await?;
        }
        Commands::Report { position, out } => {
            let (position, responses) = db::fetch_position(&pool, position)
                .await?
                .with_context(|| format!("position {position} not found"))?;
            let candidates = classify::display_records(&responses);
            let report = report::position_report(&position, &candidates);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
