mod config;
mod db;
mod error;
mod mail;
mod media;
mod rate_limit;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::config::{Cli, Config};
use crate::mail::Mailer;
use crate::media::MediaStore;
use crate::rate_limit::OtpRateLimiter;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Local .env files carry the third-party credentials in development
    dotenvy::dotenv().ok();

    // Parse CLI args and load config
    let cli = Cli::parse();
    let config = Config::load(&cli)?;

    // Connect to the document store and ensure the unique user indexes
    let db = db::connect(&config.database).await?;
    db::ensure_indexes(&db).await?;

    // Third-party adapters
    let media = Arc::new(MediaStore::new(&config.media));
    let mailer = Arc::new(Mailer::new(&config.mail)?);
    let otp_limiter = Arc::new(OtpRateLimiter::new(
        config.otp.max_requests,
        Duration::from_secs(config.otp.window_secs),
    ));

    // Build app state and router
    let state = AppState {
        db,
        config: config.clone(),
        media,
        mailer,
        otp_limiter,
    };
    let app = routes::app(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
