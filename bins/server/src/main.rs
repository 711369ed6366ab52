//! ReelPay API Server
//!
//! Main entry point for the ReelPay wallet and access service.

use anyhow::Context;
use reelpay_api::{AppState, create_router};
use reelpay_core::{RetryPolicy, WalletPolicy};
use reelpay_db::connect_with;
use reelpay_db::migration::{Migrator, MigratorTrait};
use reelpay_shared::{AppConfig, JwtConfig, JwtService};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reelpay=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = connect_with(&config.database)
        .await
        .context("Failed to connect to database")?;
    info!(
        max_connections = config.database.max_connections,
        "Connected to database"
    );

    Migrator::up(&db, None)
        .await
        .context("Failed to run migrations")?;

    let jwt_service = JwtService::new(JwtConfig {
        secret: config.jwt.secret.clone(),
        access_token_expires_secs: i64::try_from(config.jwt.access_token_expiry_secs)
            .context("jwt.access_token_expiry_secs is too large")?,
    });

    let policy = WalletPolicy::from(config.wallet);
    let retry = RetryPolicy::from(config.retry);
    info!(
        starting_balance = policy.starting_balance.value(),
        max_top_up = policy.max_top_up.value(),
        max_attempts = retry.max_attempts,
        "Wallet policy loaded"
    );

    let app = create_router(AppState::new(db, jwt_service, policy, retry));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
