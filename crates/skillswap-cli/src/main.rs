//! SkillSwap CLI - operator console for the session marketplace core

use clap::{CommandFactory, Parser, Subcommand};
use skillswap_core::config::Config;
use skillswap_core::domain::session::{SessionRepository, SessionStatus};
use skillswap_core::domain::user::{UserDirectory, UserRepository};
use skillswap_core::storage::{Database, DatabaseConfig};
use tracing::info;

#[derive(Parser)]
#[command(name = "skillswap")]
#[command(author, version, about = "Operator console for the SkillSwap core", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Clone, Copy, Default, PartialEq, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect sessions
    Sessions {
        #[command(subcommand)]
        action: SessionAction,
    },

    /// Inspect users
    Users {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Run health check
    Doctor,
}

#[derive(Subcommand)]
enum SessionAction {
    /// List sessions, newest start first
    List {
        /// Filter by status (pending, confirmed, completed, cancelled)
        #[arg(short, long)]
        status: Option<String>,
        /// Maximum number of sessions to show
        #[arg(short, long)]
        limit: Option<i32>,
    },
    /// Show session details
    Show { id: String },
    /// Show a session's status history
    History { id: String },
}

#[derive(Subcommand)]
enum UserAction {
    /// List users, newest first
    List {
        /// Maximum number of users to show
        #[arg(short, long)]
        limit: Option<i32>,
    },
    /// Show user details by ID or email
    Show { id: String },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
    /// List all configuration values
    List,
    /// Show the config file path
    Path,
    /// Reset configuration to defaults
    Reset,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("skillswap=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Sessions { action } => {
            let db = open_database().await?;
            cmd_sessions(&db, action, cli.format, cli.quiet).await
        }

        Commands::Users { action } => {
            let db = open_database().await?;
            cmd_users(&db, action, cli.format, cli.quiet).await
        }

        Commands::Config { action } => cmd_config(action, cli.quiet),

        Commands::Doctor => cmd_doctor(cli.quiet).await,
    }
}

async fn open_database() -> anyhow::Result<Database> {
    let config = Config::load()?;
    let db_config = match &config.database.path {
        Some(path) => DatabaseConfig::with_path(path).max_connections(config.database.max_connections),
        None => DatabaseConfig::default().max_connections(config.database.max_connections),
    };
    Database::new(db_config).await
}

// ============================================================================
// Command Implementations
// ============================================================================

async fn cmd_sessions(
    db: &Database,
    action: SessionAction,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    let repo = SessionRepository::new(db.pool().clone());

    match action {
        SessionAction::List { status, limit } => {
            let status_filter = match status.as_deref() {
                Some(raw) => Some(
                    SessionStatus::parse(raw)
                        .ok_or_else(|| anyhow::anyhow!("Invalid status: {}", raw))?,
                ),
                None => None,
            };

            let mut sessions = repo.list_all(limit).await?;
            if let Some(filter) = status_filter {
                sessions.retain(|s| s.status == filter);
            }

            if format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&sessions)?);
                return Ok(());
            }

            if sessions.is_empty() {
                if !quiet {
                    println!("No sessions found.");
                }
            } else {
                if !quiet {
                    println!("Sessions:");
                }
                for s in sessions {
                    println!(
                        "  {} - {} [{}] {} -> {}",
                        &s.id.to_string()[..8],
                        s.skill,
                        s.status,
                        s.start_time.format("%Y-%m-%d %H:%M"),
                        s.end_time.format("%H:%M"),
                    );
                }
            }
        }
        SessionAction::Show { id } => {
            let session_id = uuid::Uuid::parse_str(&id)
                .map_err(|_| anyhow::anyhow!("Invalid session ID: {}", id))?;
            let session = repo
                .get(session_id)
                .await?
                .ok_or_else(|| anyhow::anyhow!("Session '{}' not found", id))?;

            if format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&session)?);
                return Ok(());
            }

            println!("Session: {}", session.id);
            println!("  Skill: {}", session.skill);
            println!("  Status: {}", session.status);
            println!(
                "  Window: {} -> {}",
                session.start_time.format("%Y-%m-%d %H:%M:%S"),
                session.end_time.format("%Y-%m-%d %H:%M:%S")
            );
            println!("  Student: {}", session.student_id);
            println!("  Teacher: {}", session.teacher_id);
            if let Some(link) = &session.meeting_link {
                println!("  Meeting link: {}", link);
            }
            if let Some(notes) = &session.notes {
                println!("  Notes: {}", notes);
            }
            if let Some(review) = &session.student_review {
                println!("  Student review: {}/5 - {}", review.rating, review.comment);
            }
            if let Some(review) = &session.teacher_review {
                println!("  Teacher review: {}/5 - {}", review.rating, review.comment);
            }
            println!("  Created: {}", session.created_at.format("%Y-%m-%d %H:%M:%S"));
            println!("  Updated: {}", session.updated_at.format("%Y-%m-%d %H:%M:%S"));
        }
        SessionAction::History { id } => {
            let session_id = uuid::Uuid::parse_str(&id)
                .map_err(|_| anyhow::anyhow!("Invalid session ID: {}", id))?;
            let history = repo.history(session_id).await?;

            if format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&history)?);
                return Ok(());
            }

            if history.is_empty() {
                if !quiet {
                    println!("No status changes recorded.");
                }
            } else {
                if !quiet {
                    println!("Status history:");
                }
                for entry in history {
                    println!(
                        "  {} -> {} (by {})",
                        entry.changed_at.format("%Y-%m-%d %H:%M:%S"),
                        entry.status,
                        entry.changed_by,
                    );
                }
            }
        }
    }
    Ok(())
}

async fn cmd_users(
    db: &Database,
    action: UserAction,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    let repo = UserRepository::new(db.pool().clone());

    match action {
        UserAction::List { limit } => {
            let users = repo.list(limit).await?;

            if format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&users)?);
                return Ok(());
            }

            if users.is_empty() {
                if !quiet {
                    println!("No users found.");
                }
            } else {
                if !quiet {
                    println!("Users:");
                }
                for u in users {
                    let rating = if u.rating_count > 0 {
                        format!("{:.1} ({} reviews)", u.rating, u.rating_count)
                    } else {
                        "unrated".to_string()
                    };
                    println!(
                        "  {} - {} <{}> [{}] {}",
                        &u.id.to_string()[..8],
                        u.name,
                        u.email,
                        u.role,
                        rating,
                    );
                }
            }
        }
        UserAction::Show { id } => {
            // Try by ID first, then by email
            let user = match uuid::Uuid::parse_str(&id) {
                Ok(user_id) => repo.get(user_id).await?,
                Err(_) => repo.get_by_email(&id).await?,
            };
            let user = user.ok_or_else(|| anyhow::anyhow!("User '{}' not found", id))?;

            if format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&user)?);
                return Ok(());
            }

            println!("User: {}", user.name);
            println!("  ID: {}", user.id);
            println!("  Email: {}", user.email);
            println!("  Role: {}", user.role);
            if let Some(bio) = &user.bio {
                println!("  Bio: {}", bio);
            }
            if user.skills.is_empty() {
                println!("  Skills: (none)");
            } else {
                println!("  Skills:");
                for skill in &user.skills {
                    println!("    {} ({})", skill.name, skill.level);
                }
            }
            if user.rating_count > 0 {
                println!("  Rating: {:.1} from {} reviews", user.rating, user.rating_count);
            } else {
                println!("  Rating: unrated");
            }
            println!("  Created: {}", user.created_at.format("%Y-%m-%d %H:%M:%S"));
        }
    }
    Ok(())
}

fn cmd_config(action: ConfigAction, quiet: bool) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            println!("{}", config.get(&key)?);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            if !quiet {
                println!("Set {} = {}", key, value);
            }
        }
        ConfigAction::List => {
            let config = Config::load()?;
            for (key, value) in config.list()? {
                println!("{} = {}", key, value);
            }
        }
        ConfigAction::Path => {
            let path = Config::config_path()?;
            println!("{}", path.display());
        }
        ConfigAction::Reset => {
            Config::reset()?;
            if !quiet {
                println!("Configuration reset to defaults.");
            }
        }
    }
    Ok(())
}

async fn cmd_doctor(quiet: bool) -> anyhow::Result<()> {
    if !quiet {
        println!("SkillSwap Health Check");
        println!("======================");
        println!();
    }

    let mut all_ok = true;

    // Check configuration
    match Config::load() {
        Ok(_) => {
            if !quiet {
                println!("[OK] Configuration: Valid");
            }
        }
        Err(e) => {
            all_ok = false;
            if !quiet {
                println!("[!!] Configuration: Error - {}", e);
            }
        }
    }

    // Check config file location
    if !quiet {
        match Config::config_path() {
            Ok(path) => {
                if path.exists() {
                    println!("[OK] Config file: {}", path.display());
                } else {
                    println!("[--] Config file: {} (using defaults)", path.display());
                }
            }
            Err(e) => {
                println!("[!!] Config file: Error - {}", e);
            }
        }
    }

    // Check database
    match open_database().await {
        Ok(db) => match db.health_check().await {
            Ok(()) => {
                if !quiet {
                    println!("[OK] Database: Connected");
                    println!("     Path: {}", db.path().display());

                    match db.migration_status().await {
                        Ok(status) => {
                            if status.needs_migration {
                                println!(
                                    "[!!] Database: Migrations pending (v{} -> v{})",
                                    status.current_version, status.target_version
                                );
                            } else {
                                println!("[OK] Database: Schema v{}", status.current_version);
                            }
                        }
                        Err(e) => {
                            println!("[!!] Database: Migration check failed - {}", e);
                        }
                    }

                    // Session counts per status
                    let repo = SessionRepository::new(db.pool().clone());
                    for status in [
                        SessionStatus::Pending,
                        SessionStatus::Confirmed,
                        SessionStatus::Completed,
                        SessionStatus::Cancelled,
                    ] {
                        let count = repo.count_by_status(status).await.unwrap_or(0);
                        println!("     {}: {}", status, count);
                    }
                }
            }
            Err(e) => {
                all_ok = false;
                println!("[!!] Database: Health check failed - {}", e);
            }
        },
        Err(e) => {
            all_ok = false;
            println!("[!!] Database: Failed to initialize - {}", e);
        }
    }

    // Summary
    if !quiet {
        println!();
        if all_ok {
            println!("All checks passed!");
            info!("Health check passed");
        } else {
            println!("Some checks failed. See above for details.");
        }
    }

    Ok(())
}
