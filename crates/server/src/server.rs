use std::time::Instant;

use axum::{Json, Router, extract::State, routing::get};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

const RUNNING: &str = "Bot financeiro está rodando!";

#[derive(Clone)]
struct ServerState {
    started_at: Instant,
}

#[derive(Serialize)]
struct Status {
    status: &'static str,
    /// Seconds since the server started.
    uptime: u64,
    timestamp: String,
}

async fn index() -> &'static str {
    RUNNING
}

async fn status(State(state): State<ServerState>) -> Json<Status> {
    Json(Status {
        status: "online",
        uptime: state.started_at.elapsed().as_secs(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

pub fn router() -> Router {
    let state = ServerState {
        started_at: Instant::now(),
    };

    Router::new()
        .route("/", get(index))
        .route("/status", get(status))
        .with_state(state)
}

pub async fn run(bind: &str, port: u16) {
    let listener = match tokio::net::TcpListener::bind((bind, port)).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener on {bind}:{port}: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(listener: tokio::net::TcpListener) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router()).await
}

pub fn spawn_with_listener(
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
