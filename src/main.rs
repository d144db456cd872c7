mod config;
mod db;
mod routes;
mod services;
mod state;

use std::sync::Arc;

use services::memory::MemoryStore;
use services::persistence::PgStore;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = config::ServerConfig::from_env();
    let addr = match config.bind_addr() {
        Ok(addr) => addr,
        Err(e) => fail("invalid configuration", &e),
    };

    let state = if let Some(database_url) = config.database_url.clone() {
        let pool = match db::init_pool(&database_url, config.db_max_connections).await {
            Ok(pool) => pool,
            Err(e) => fail("database init failed", &e),
        };
        tracing::info!(max_connections = config.db_max_connections, "event store: postgres");
        state::AppState::with_backend(Arc::new(PgStore::new(pool)), config)
    } else {
        let store = if config.memory_boards.is_empty() {
            tracing::warn!("DATABASE_URL not set; events kept in memory, every board id accepted");
            MemoryStore::open()
        } else {
            tracing::warn!(boards = config.memory_boards.len(), "DATABASE_URL not set; events kept in memory");
            MemoryStore::with_boards(config.memory_boards.clone())
        };
        state::AppState::with_backend(Arc::new(store), config)
    };

    let app = routes::app(state);
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => fail("failed to bind", &e),
    };

    tracing::info!(%addr, "inkboard listening");
    if let Err(e) = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await {
        fail("server failed", &e);
    }
    tracing::info!("inkboard stopped");
}

/// Log a startup or serve failure and exit non-zero.
fn fail(context: &str, err: &dyn std::fmt::Display) -> ! {
    tracing::error!(error = %err, "{context}");
    std::process::exit(1);
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "ctrl-c handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
