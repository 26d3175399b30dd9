use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use sheet_cutter::config::OptimizerConfig;
use sheet_cutter::observation::{Info, Observation, fitness};
use sheet_cutter::optimizer::Optimizer;
use sheet_cutter::types::Action;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

type SharedOptimizer = Arc<Mutex<Optimizer>>;

#[derive(Deserialize, Serialize)]
struct ActionRequest {
    #[serde(flatten)]
    observation: Observation,
    #[serde(default)]
    info: Option<Info>,
}

#[derive(Serialize)]
struct ActionResponse {
    action: Action,
    patterns: usize,
    /// `None` while the optimizer has no solution.
    best_value: Option<f64>,
    fitness: Option<f64>,
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

fn lock(
    state: &SharedOptimizer,
) -> Result<std::sync::MutexGuard<'_, Optimizer>, (StatusCode, String)> {
    state.lock().map_err(|_| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "optimizer state poisoned".to_string(),
        )
    })
}

async fn action(
    State(state): State<SharedOptimizer>,
    Json(req): Json<ActionRequest>,
) -> Result<Json<ActionResponse>, (StatusCode, String)> {
    tracing::info!(
        products = req.observation.products.len(),
        stocks = req.observation.stocks.len(),
        "POST /action"
    );

    let mut optimizer = lock(&state)?;
    let action = optimizer
        .decide(&req.observation)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    Ok(Json(ActionResponse {
        action,
        patterns: optimizer.pattern_count(),
        best_value: finite(optimizer.best_value()),
        fitness: req
            .info
            .and_then(|info| finite(fitness(&req.observation, &info))),
    }))
}

/// Replaces the optimizer. An empty body means default settings.
async fn reset(
    State(state): State<SharedOptimizer>,
    body: Bytes,
) -> Result<StatusCode, (StatusCode, String)> {
    let config: OptimizerConfig = if body.is_empty() {
        OptimizerConfig::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?
    };
    tracing::info!(?config, "POST /reset");
    *lock(&state)? = Optimizer::new(config);
    Ok(StatusCode::NO_CONTENT)
}

#[tokio::main]
async fn main() {
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open("development.log")
        .expect("failed to open development.log");

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_target(false)
        .with_ansi(false)
        .with_max_level(Level::INFO)
        .init();

    let _sentry = std::env::var("SENTRY_DSN").ok().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    let port = std::env::var("PORT").unwrap_or_else(|_| "3001".to_string());
    let addr = format!("0.0.0.0:{port}");

    let state: SharedOptimizer = Arc::new(Mutex::new(Optimizer::new(OptimizerConfig::default())));

    let app = Router::new()
        .route("/up", get(|| async { "ok" }))
        .route("/action", post(action))
        .route("/reset", post(reset))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    eprintln!("Listening on {addr}");
    axum::serve(listener, app).await.unwrap();
}
