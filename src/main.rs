// Social blog server

use std::path::Path;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use social_blog::{app_state::AppState, config::Config, entities::EntSession, routes::create_app_router};

/// Creates the parent directory of a file-backed SQLite URL.
fn ensure_database_dir(url: &str) -> std::io::Result<()> {
    let path = url.trim_start_matches("sqlite:").trim_start_matches("//");
    if path.is_empty() || path.starts_with(":memory:") {
        return Ok(());
    }
    let path = path.split('?').next().unwrap_or(path);
    match Path::new(path).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("social_blog=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;
    ensure_database_dir(&config.database.url)?;
    std::fs::create_dir_all(&config.media.root)?;

    let app_state = AppState::new(config.clone()).await?;
    let purged = EntSession::purge_expired(&app_state.db).await?;
    if purged > 0 {
        info!("Purged {} expired sessions", purged);
    }
    let app = create_app_router(app_state);

    let addr = config.server_address();
    info!("Social blog listening on http://{}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
