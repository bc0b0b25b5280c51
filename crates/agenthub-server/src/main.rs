//! # Agent Hub Server
//!
//! Single binary for the whole hub:
//! - REST API (HTTP), including inbound platform webhooks
//! - WebSocket gateway (new-message notifications)
//! - maintenance commands (migrations, database check, first admin)

use std::net::SocketAddr;

use agenthub_api::{AppState, build_router};
use agenthub_common::{config::AppConfig, events::HubEvent, ids, models::UserRole};
use agenthub_db::{Database, repository::users};
use agenthub_gateway::GatewayState;
use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tokio::sync::broadcast;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "agenthub", version, about = "Agent Hub, a multi-channel messaging hub")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the REST API and the WebSocket gateway (default).
    Serve,
    /// Apply pending database migrations and exit.
    Migrate,
    /// Check that the database is reachable.
    CheckDb,
    /// Create an administrator account.
    CreateAdmin { username: String, password: String },
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("agenthub=debug,tower_http=debug"));

    if config.server.log_format.eq_ignore_ascii_case("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = agenthub_common::config::load().context("Failed to load configuration")?;
    init_tracing(&config);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::Migrate => {
            let db = Database::connect(&config.database).await?;
            db.migrate().await
        }
        Commands::CheckDb => {
            let db = Database::connect(&config.database).await?;
            if !agenthub_db::postgres::health_check(&db.pool).await {
                bail!("Database is not responding");
            }
            tracing::info!("Database connection OK");
            Ok(())
        }
        Commands::CreateAdmin { username, password } => {
            let db = Database::connect(&config.database).await?;
            db.migrate().await?;
            create_admin(&db, &username, &password).await
        }
    }
}

async fn create_admin(db: &Database, username: &str, password: &str) -> anyhow::Result<()> {
    let username = username.trim();
    if username.is_empty() || password.len() < 8 {
        bail!("Username must not be blank and the password needs at least 8 characters");
    }
    if users::find_by_username(&db.pool, username).await?.is_some() {
        bail!("User '{username}' already exists");
    }

    let hashed = agenthub_api::auth::hash_password(password)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;
    let user = users::create_user(
        &db.pool,
        &ids::generate(ids::USER),
        username,
        None,
        None,
        &hashed,
        UserRole::Admin,
    )
    .await?;

    tracing::info!(user_id = %user.id, %username, "Admin user created");
    Ok(())
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    tracing::info!("Starting Agent Hub v{}", env!("CARGO_PKG_VERSION"));

    let db = Database::connect(&config.database).await?;
    db.migrate().await?;

    // Bridge between the REST API and the gateway: stored messages become
    // events that connected web clients receive.
    let (events_tx, _) = broadcast::channel::<HubEvent>(config.gateway.broadcast_capacity.max(1));

    let host = config.server.host.parse()?;
    let api_addr = SocketAddr::new(host, config.server.port);
    let gateway_addr = SocketAddr::new(host, config.server.gateway_port);

    let gateway_state = GatewayState::with_broadcast(db.clone(), events_tx.clone(), &config.gateway);
    let gateway_router = agenthub_gateway::build_router(gateway_state);

    let api_state = AppState::new(db, config, events_tx)?;
    let api_router = build_router(api_state);

    tracing::info!("REST API listening on http://{api_addr}");
    tracing::info!("Gateway listening on ws://{gateway_addr}");

    tokio::try_join!(
        async {
            let listener = tokio::net::TcpListener::bind(api_addr).await?;
            axum::serve(listener, api_router).await?;
            Ok::<_, anyhow::Error>(())
        },
        async {
            let listener = tokio::net::TcpListener::bind(gateway_addr).await?;
            axum::serve(listener, gateway_router).await?;
            Ok::<_, anyhow::Error>(())
        },
    )?;

    Ok(())
}
