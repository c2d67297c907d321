use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;
use request_auth::{AuthConfig, AuthType, MemoryUserStore, api};

#[derive(Parser)]
#[command(name = "request-auth")]
#[command(about = "Pluggable HTTP request authentication server")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API guarded by the configured authenticator.
    ///
    /// Settings not given on the command line are read from AUTH_TYPE,
    /// SESSION_NAME, SESSION_DURATION and SESSION_STORE_PATH.
    Serve {
        /// Bind address, e.g. 0.0.0.0:5000
        #[arg(long, default_value = "0.0.0.0:5000")]
        bind: String,
        /// basic_auth, session_auth, session_exp_auth or session_db_auth
        #[arg(long)]
        auth_type: Option<AuthType>,
        /// Session cookie name
        #[arg(long)]
        session_name: Option<String>,
        /// Session lifetime in seconds (0 = never expires)
        #[arg(long)]
        session_duration: Option<i64>,
        /// JSON file for persisted sessions
        #[arg(long)]
        session_store_path: Option<PathBuf>,
    },
    /// Print the Argon2id hash of a password
    HashPassword { password: String },
}

fn build_auth_config(
    auth_type: Option<AuthType>,
    session_name: Option<String>,
    session_duration: Option<i64>,
    session_store_path: Option<PathBuf>,
) -> AuthConfig {
    let mut config = AuthConfig::from_env();
    if let Some(auth_type) = auth_type {
        config.auth_type = auth_type;
    }
    if let Some(name) = session_name.filter(|n| !n.trim().is_empty()) {
        config.session_name = name;
    }
    if let Some(duration) = session_duration {
        config.session_duration = duration;
    }
    if let Some(path) = session_store_path {
        config.session_store_path = path;
    }
    config
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("request_auth=info".parse()?),
        )
        .with_max_level(Level::INFO)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            bind,
            auth_type,
            session_name,
            session_duration,
            session_store_path,
        } => {
            let config =
                build_auth_config(auth_type, session_name, session_duration, session_store_path);
            info!(
                "Starting API on {} with {} authentication",
                bind, config.auth_type
            );

            let users = Arc::new(MemoryUserStore::new());
            let state = api::AppState::from_config(&config, users)?;
            let app = api::create_router(state);

            let listener = tokio::net::TcpListener::bind(&bind).await?;
            info!("Listening on http://{}", bind);
            axum::serve(listener, app).await?;
        }
        Commands::HashPassword { password } => {
            let hash = request_auth::auth::password::hash_password(&password)?;
            println!("{}", hash);
        }
    }

    Ok(())
}
