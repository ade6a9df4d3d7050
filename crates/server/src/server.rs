use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
};
use chrono::NaiveDate;
use serde_json::{Value, json};

use std::sync::Arc;

use crate::{auth, categories, expenses, farm, goals};
use engine::{Engine, ReceiptClassifier};

/// Receipt photos are larger than axum's default body limit.
const RECEIPT_BODY_LIMIT: usize = 10 * 1024 * 1024;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub classifier: Arc<dyn ReceiptClassifier>,
}

/// Calendar date used for login days, weeks and receipt dates.
pub(crate) fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

async fn home() -> Json<Value> {
    Json(json!({
        "message": "antfarm API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "auth": "/api/auth",
            "expenses": "/api/expenses",
            "farm": "/api/farm",
            "goals": "/api/goals",
            "categories": "/api/categories",
        }
    }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/api/auth/login", put(auth::login))
        .route("/api/auth/register", post(auth::register))
        .route("/api/expenses", post(expenses::create))
        .route("/api/expenses/{id}", delete(expenses::remove))
        .route("/api/expenses/weekly/{user_id}", get(expenses::weekly))
        .route("/api/expenses/summary/{user_id}", get(expenses::summary))
        .route(
            "/api/expenses/analyze",
            post(expenses::analyze).layer(DefaultBodyLimit::max(RECEIPT_BODY_LIMIT)),
        )
        .route("/api/farm/ants", get(farm::ants))
        .route("/api/farm/{user_id}", get(farm::get))
        .route("/api/farm/{user_id}/ants/{ant_id}", put(farm::add_ant))
        .route("/api/farm/{user_id}/leaves", put(farm::adjust_leaves))
        .route("/api/goals/{user_id}", get(goals::list))
        .route("/api/goals/bulk/{user_id}", put(goals::update))
        .route("/api/categories", get(categories::list))
        .with_state(state)
}

pub async fn run_with_listener(
    engine: Engine,
    classifier: Arc<dyn ReceiptClassifier>,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
        classifier,
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    classifier: Arc<dyn ReceiptClassifier>,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, classifier, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
