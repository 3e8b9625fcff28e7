//! Event Check-in Backend
//!
//! Admin check-in service for hackathon applicants: resolves scanned user ids
//! to emails behind an admin session, serves applicant forms and records meal
//! attendance. The same binary carries the organizer console.

mod api;
mod auth;
mod config;
mod console;
mod db;
mod errors;
mod identity;
mod models;
mod provision;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use clap::{Args, Parser, Subcommand};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use config::Config;
use console::{run_watch, CheckinConsole, HttpBackend, SubmitOutcome};
use db::Repository;
use identity::{IdentityProvider, LocalIdentityProvider};
use models::MealField;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub identity: Arc<dyn IdentityProvider>,
}

#[derive(Debug, Parser)]
#[command(name = "checkin", version, about = "Event check-in backend and admin console")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Create or update a user
    AddUser {
        #[arg(long)]
        uid: String,
        #[arg(long)]
        email: Option<String>,
        /// Grant the admin claim
        #[arg(long)]
        admin: bool,
    },
    /// Issue a session for a user and print the `__session` cookie value
    IssueSession {
        #[arg(long)]
        uid: String,
        /// Defaults to CHECKIN_SESSION_TTL_HOURS
        #[arg(long)]
        ttl_hours: Option<i64>,
    },
    /// Upsert applicant forms from a JSON array file
    ImportForms { path: PathBuf },
    /// Look up an applicant by scanned uid or by email
    Lookup {
        #[command(flatten)]
        remote: RemoteArgs,
        #[arg(long, conflicts_with = "email", required_unless_present = "email")]
        uid: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// Record meals for a fully accepted applicant
    UpdateFood {
        #[command(flatten)]
        remote: RemoteArgs,
        #[arg(long)]
        email: String,
        /// Mark a meal as eaten (repeatable)
        #[arg(long = "eat")]
        eat: Vec<MealField>,
        /// Mark a meal as not eaten (repeatable)
        #[arg(long = "uneat")]
        uneat: Vec<MealField>,
    },
    /// Read scanned codes and commands from standard input
    Watch {
        #[command(flatten)]
        remote: RemoteArgs,
    },
}

#[derive(Debug, Args)]
struct RemoteArgs {
    /// Base URL of the check-in server
    #[arg(long, env = "CHECKIN_SERVER_URL", default_value = "http://127.0.0.1:8080")]
    server: String,
    /// Value of the organizer's `__session` cookie
    #[arg(long, env = "CHECKIN_SESSION", hide_env_values = true)]
    session: String,
}

impl RemoteArgs {
    fn console(&self) -> Result<CheckinConsole<HttpBackend>, console::ClientError> {
        Ok(CheckinConsole::new(HttpBackend::new(
            &self.server,
            self.session.clone(),
        )?))
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env()?;

    init_logging(&config);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await?,
        Command::AddUser { uid, email, admin } => {
            let repo = open_repository(&config).await?;
            let user = provision::add_user(&repo, &uid, email.as_deref(), admin).await?;
            println!(
                "{} email={} admin={}",
                user.uid,
                user.email.as_deref().unwrap_or("-"),
                user.admin
            );
        }
        Command::IssueSession { uid, ttl_hours } => {
            let repo = open_repository(&config).await?;
            let ttl_hours = ttl_hours.unwrap_or(config.session_ttl_hours);
            let session = provision::issue_session(&repo, &uid, ttl_hours).await?;
            println!("{}", session.cookie_value());
        }
        Command::ImportForms { path } => {
            let repo = open_repository(&config).await?;
            let count = provision::import_forms(&repo, &path).await?;
            println!("Imported {} forms", count);
        }
        Command::Lookup { remote, uid, email } => {
            let mut console = remote.console()?;
            let outcome = match uid {
                Some(uid) => console.lookup_scanned(&uid).await,
                None => console.lookup_email(email.as_deref().unwrap_or("")).await,
            };
            println!("{}", outcome.message());
            match console.current() {
                Some(current) => print!("{}", current.render()),
                None => return Ok(ExitCode::FAILURE),
            }
        }
        Command::UpdateFood {
            remote,
            email,
            eat,
            uneat,
        } => {
            let mut console = remote.console()?;
            let outcome = console.lookup_email(&email).await;
            if !outcome.is_ready() {
                println!("{}", outcome.message());
                return Ok(ExitCode::FAILURE);
            }
            for field in eat {
                console.set_meal(field, true);
            }
            for field in uneat {
                console.set_meal(field, false);
            }
            let submitted = console.submit().await;
            println!("{}", submitted.message());
            if submitted != SubmitOutcome::Updated {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Watch { remote } => {
            let mut console = remote.console()?;
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            let mut stdout = std::io::stdout();
            run_watch(&mut console, stdin, &mut stdout).await?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Initialize logging. Logs go to stderr so console output stays clean.
fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let fmt_layer = if config.log_json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

async fn open_repository(config: &Config) -> Result<Repository, sqlx::Error> {
    tracing::debug!("Database path: {:?}", config.db_path);
    let pool = db::init_database(&config.db_path).await?;
    Ok(Repository::new(pool))
}

async fn serve(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Starting check-in backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    let repo = Arc::new(open_repository(&config).await?);

    let purged = repo.delete_expired_sessions().await?;
    tracing::info!("Purged {} expired sessions", purged);

    let state = AppState {
        identity: Arc::new(LocalIdentityProvider::new(repo.clone())),
        repo,
    };

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Every API route checks the admin session through its extractor
    let api_routes = Router::new()
        .route("/auth/get-user-email", post(api::get_user_email))
        .route("/auth/update-food", post(api::update_food))
        .route("/forms/{email}", get(api::get_form));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
