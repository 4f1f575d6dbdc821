use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

use roster_api::AppStateInner;
use roster_core::{Roster, RosterConfig};
use roster_db::queries::users;

/// Admin passwords that MUST NOT be used.
const PLACEHOLDER_PASSWORDS: &[&str] = &["admin", "change-me", "password"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roster=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let db_path = std::env::var("ROSTER_DB_PATH").unwrap_or_else(|_| "roster.db".into());
    let host = std::env::var("ROSTER_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("ROSTER_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    let mut config = RosterConfig::default();
    if let Ok(id) = std::env::var("ROSTER_PUBLIC_ACCOUNT_ID") {
        config.public_account_id = id.parse::<Uuid>()?;
    }
    if let Ok(len) = std::env::var("ROSTER_MIN_PASSWORD_LENGTH") {
        config.min_password_length = len.parse()?;
    }

    let db = roster_db::Database::open(&PathBuf::from(&db_path))?;
    let roster = Roster::new(db, config);

    // System administrator
    let admin_username = std::env::var("ROSTER_ADMIN_USERNAME").unwrap_or_else(|_| "admin".into());
    let admin_password = std::env::var("ROSTER_ADMIN_PASSWORD").unwrap_or_default();
    if roster.db().with_conn(users::system_admin_exists)? {
        if !admin_password.is_empty() {
            warn!("ROSTER_ADMIN_PASSWORD ignored: the system administrator already exists");
        }
    } else {
        if admin_password.is_empty() || PLACEHOLDER_PASSWORDS.contains(&admin_password.as_str()) {
            eprintln!("FATAL: ROSTER_ADMIN_PASSWORD is unset or still a placeholder.");
            eprintln!("       It is needed once to create the system administrator.");
            eprintln!("       Set it in your .env file and restart.");
            std::process::exit(1);
        }
        roster.bootstrap_system_admin(&admin_username, &admin_password)?;
        info!("Created system administrator {}", admin_username);
    }

    let app = roster_api::router(Arc::new(AppStateInner { roster }))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Roster server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
