use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use lms_core::model::{NotificationId, User};
use lms_core::routes::Route;
use services::{
    AppServices, Clock, CourseListQuery, LmsConfig, RequestMethod, Routed, SponsorDashboardQuery,
};

mod seed;

#[derive(Parser)]
#[command(name = "lms", about = "Learning management system tools", long_about = None)]
struct Cli {
    /// Database URL; overrides LMS_DB_URL
    #[arg(long, global = true)]
    db: Option<String>,

    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    Migrate,
    /// Load demo users, courses, enrollments and sponsorships
    Seed,
    /// Show the dashboard a user lands on
    Dashboard {
        #[arg(long)]
        user: String,
    },
    /// Show a sponsor's dashboard
    SponsorDashboard {
        #[arg(long)]
        user: String,
        /// all | completed
        #[arg(long)]
        status: Option<String>,
        /// all | high_progress | low_progress
        #[arg(long)]
        progress: Option<String>,
        #[arg(long)]
        page: Option<String>,
    },
    /// Search the course catalogue
    Courses {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        difficulty: Option<String>,
        #[arg(long)]
        instructor: Option<String>,
        #[arg(long)]
        page: Option<String>,
    },
    /// List a user's notifications (marks them read)
    Notifications {
        #[arg(long)]
        user: String,
        /// Only show the unread badge summary
        #[arg(long)]
        unread: bool,
    },
    /// Mark one notification as read
    MarkRead {
        #[arg(long)]
        user: String,
        #[arg(long)]
        id: NotificationId,
        #[arg(long, default_value = "POST")]
        method: String,
    },
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_env("LMS_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose >= 2)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == "sqlite::memory:" || trimmed.starts_with("sqlite://") {
        return trimmed.to_owned();
    }

    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Creates the database file and its directory so the pool can open it.
fn prepare_sqlite_file(db_url: &str) -> Result<()> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let Some(path) = db_url.strip_prefix("sqlite://") else {
        bail!("invalid database url: {db_url}");
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        bail!("invalid database url: {db_url}");
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("creating {}", path.display()))?;
    }
    Ok(())
}

async fn find_user(app: &AppServices, username: &str) -> Result<User> {
    app.storage()
        .users
        .find_user_by_username(username)
        .await?
        .with_context(|| format!("no user named {username:?}"))
}

async fn show_dashboard(app: &AppServices, user: &User) -> Result<()> {
    let dashboards = app.dashboards();
    match dashboards.redirect(Some(user)) {
        Route::AdminDashboard => print_json(&dashboards.admin(user).await?),
        Route::StudentDashboard => print_json(&dashboards.student(user).await?),
        Route::InstructorDashboard => print_json(&dashboards.instructor(user).await?),
        Route::SponsorDashboard => print_json(
            &app.sponsor_dashboard()
                .dashboard(user, SponsorDashboardQuery::default())
                .await?,
        ),
        other => print_json(&Routed::<()>::Redirect(other)),
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = LmsConfig::from_env();
    if let Some(db) = cli.db {
        config = config.with_database_url(db);
    }
    config.database_url = normalize_sqlite_url(&config.database_url);

    prepare_sqlite_file(&config.database_url)?;
    let clock = Clock::default();
    let app = AppServices::new_sqlite(&config, clock)
        .await
        .with_context(|| format!("opening {}", config.database_url))?;
    tracing::debug!(db = %config.database_url, "storage ready");

    match cli.command {
        Commands::Migrate => {
            tracing::info!(db = %config.database_url, "database is up to date");
        }
        Commands::Seed => {
            let summary = seed::run(&app, clock).await?;
            print_json(&summary)?;
        }
        Commands::Dashboard { user } => {
            let user = find_user(&app, &user).await?;
            show_dashboard(&app, &user).await?;
        }
        Commands::SponsorDashboard {
            user,
            status,
            progress,
            page,
        } => {
            let user = find_user(&app, &user).await?;
            let query = SponsorDashboardQuery::from_raw(
                status.as_deref(),
                progress.as_deref(),
                page.as_deref(),
            );
            print_json(&app.sponsor_dashboard().dashboard(&user, query).await?)?;
        }
        Commands::Courses {
            search,
            difficulty,
            instructor,
            page,
        } => {
            let query = CourseListQuery::from_raw(
                search.as_deref(),
                difficulty.as_deref(),
                instructor.as_deref(),
                page.as_deref(),
            );
            print_json(&app.courses().list(&query).await?)?;
        }
        Commands::Notifications { user, unread } => {
            let user = find_user(&app, &user).await?;
            if unread {
                print_json(&app.notifications().unread_summary(&user).await?)?;
            } else {
                print_json(&app.notifications().list(&user).await?)?;
            }
        }
        Commands::MarkRead { user, id, method } => {
            let user = find_user(&app, &user).await?;
            let method: RequestMethod = method.parse()?;
            print_json(&app.notifications().mark_as_read(&user, method, id).await?)?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(cli).await {
        eprintln!("error: {err:#}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_memory_and_absolute_urls() {
        assert_eq!(normalize_sqlite_url("sqlite::memory:"), "sqlite::memory:");
        assert_eq!(normalize_sqlite_url("sqlite:///tmp/lms.db"), "sqlite:///tmp/lms.db");
        assert_eq!(normalize_sqlite_url("sqlite:/tmp/lms.db"), "sqlite:///tmp/lms.db");
    }

    #[test]
    fn parses_sponsor_dashboard_flags() {
        let cli = Cli::try_parse_from([
            "lms",
            "--db",
            "sqlite::memory:",
            "sponsor-dashboard",
            "--user",
            "acme",
            "--progress",
            "high_progress",
        ])
        .unwrap();
        assert_eq!(cli.db.as_deref(), Some("sqlite::memory:"));
        match cli.command {
            Commands::SponsorDashboard { user, progress, .. } => {
                assert_eq!(user, "acme");
                assert_eq!(progress.as_deref(), Some("high_progress"));
            }
            _ => panic!("expected sponsor-dashboard"),
        }
    }
}
