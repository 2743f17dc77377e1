use axum::{http::StatusCode, response::Html, routing::get, Router};
use log::{error, info};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::api::{self, AppState};
use crate::database::Database;
use crate::error::AppError;

pub struct WebServer {
    host: String,
    port: u16,
    db: Database,
}

impl WebServer {
    pub fn new(host: String, port: u16, db: Database) -> Self {
        Self { host, port, db }
    }

    pub async fn start(self) -> Result<(), AppError> {
        let addr: SocketAddr = format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Error(format!("Invalid address: {}", e)))?;

        let app = create_router(AppState::new(self.db));

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| AppError::Error(format!("Failed to bind to {}: {}", addr, e)))?;

        println!("DeliveryDesk server listening on http://{}", addr);
        info!("Server ready to handle requests on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                shutdown_signal().await;
                println!("\nShutdown signal received - stopping server gracefully...");
            })
            .await
            .map_err(|e| AppError::Error(format!("Server error: {}", e)))?;

        info!("Server shutdown complete");
        Ok(())
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Address endpoints
        .route("/api/addresses", get(api::addresses::list_addresses))
        // Task endpoints
        .route("/api/tasks", get(api::tasks::list_tasks))
        .route("/api/tasks/status-counts", get(api::tasks::get_status_counts))
        .route(
            "/api/tasks/priority-counts",
            get(api::tasks::get_priority_counts),
        )
        .with_state(state)
}

async fn health_check() -> (StatusCode, Html<&'static str>) {
    (
        StatusCode::OK,
        Html("<h1>DeliveryDesk Server</h1><p>Server is running</p>"),
    )
}

/// Waits for a shutdown signal (SIGTERM or SIGINT)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C)");
        },
        _ = terminate => {
            info!("Received SIGTERM");
        },
    }
}
