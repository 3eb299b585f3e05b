mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{HeaderValue, Method, header::CONTENT_TYPE};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use quillbox_api::{AppStateInner, routes};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quillbox=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    let db = quillbox_db::Database::open(&config.db_path)?;
    let files = quillbox_files::Storage::new(config.upload_dir.clone()).await?;

    let state = Arc::new(AppStateInner {
        db,
        files,
        secret: config.secret.clone(),
        cookie_secure: config.cookie_secure,
    });

    let mut app = routes::router(state).layer(TraceLayer::new_for_http());

    // CORS only for an explicitly configured origin; never a wildcard
    // combined with credentials.
    if let Some(origin) = &config.allowed_origin {
        let origin: HeaderValue = origin.parse()?;
        let cors = CorsLayer::new()
            .allow_origin(AllowOrigin::exact(origin))
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([CONTENT_TYPE])
            .allow_credentials(true);
        app = app.layer(cors);
    }

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Quillbox listening on {}", addr);

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
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
