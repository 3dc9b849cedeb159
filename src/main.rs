use std::sync::Arc;
use std::time::Duration;

use freight_market::auth::SessionKeys;
use freight_market::config::Config;
use freight_market::error::AppError;
use freight_market::observability::logging;
use freight_market::state::AppState;
use freight_market::{api, db};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;
    logging::init(&config.log_level, config.log_format);

    let pool = db::init_pool(
        &config.database_url,
        config.database_max_connections,
        Duration::from_millis(config.database_busy_timeout_ms),
    )
    .await?;

    let sessions = SessionKeys::new(&config.session_secret, config.session_cookie_name.clone());
    let shared_state = Arc::new(AppState::new(pool.clone(), sessions, config.event_buffer_size));

    let app = api::rest::router(shared_state);

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(
        http_port = config.http_port,
        database_url = %config.database_url,
        "http server started"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::Internal(format!("server error: {err}")))?;

    pool.close().await;
    tracing::info!("http server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
