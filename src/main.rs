use axum::{
    extract::{Path, State},
    http::{header, Method},
    routing::get,
    Json, Router,
};
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

mod config;
mod dictionary;
mod error;
mod logging;
mod models;
mod msgpack;
mod placeholders;
mod projections;
mod storage;
mod timefmt;


use config::AppConfig;
use dictionary::Dictionary;
use error::ApiError;
use models::{RenderedLogEntry, RoundSummary};
use projections::{RoundDecoder, RoundIndexSummarizer};
use storage::RoundStore;
use timefmt::DisplayZone;

/// Read-only HTTP API over stored match rounds
/// The dictionary is loaded before the listener binds and never changes afterwards
#[derive(Clone)]
struct AppState {
    dictionary: Arc<Dictionary>,
    store: RoundStore,
    zone: DisplayZone,
    summary_template: Option<Arc<str>>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logging();

    let config = AppConfig::from_env()?;

    let dictionary = Dictionary::load(&config.dictionary_path).with_context(|| {
        format!(
            "failed to load dictionary from {}",
            config.dictionary_path.display()
        )
    })?;
    tracing::info!(
        path = %config.dictionary_path.display(),
        maps = dictionary.map_count(),
        events = dictionary.event_count(),
        "dictionary loaded"
    );

    let state = AppState {
        dictionary: Arc::new(dictionary),
        store: RoundStore::new(config.rounds_path.clone()),
        zone: config.display_zone,
        summary_template: config.summary_template.as_deref().map(Arc::from),
    };

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!(
        addr = %config.listen_addr,
        rounds = %config.rounds_path.display(),
        "server listening"
    );
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/api/rounds", get(list_rounds))
        .route("/api/rounds/:round_id", get(round_logs))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> &'static str {
    concat!("Round Log API v", env!("CARGO_PKG_VERSION"))
}

/// Liveness plus what the process is serving from
async fn health_check(state: State<AppState>) -> Json<serde_json::Value> {
    let rounds_dir = state.store.dir();
    let rounds_readable = tokio::fs::metadata(rounds_dir)
        .await
        .is_ok_and(|meta| meta.is_dir());

    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "dictionary": {
            "maps": state.dictionary.map_count(),
            "events": state.dictionary.event_count(),
        },
        "rounds": {
            "path": rounds_dir.display().to_string(),
            "readable": rounds_readable,
        },
    }))
}

/// One summary line per readable round file
async fn list_rounds(state: State<AppState>) -> Result<Json<Vec<RoundSummary>>, ApiError> {
    let records = state.store.load_all().await.map_err(|err| {
        tracing::error!(dir = %state.store.dir().display(), error = ?err, "error reading rounds data");
        ApiError::RoundsData
    })?;

    let summarizer = RoundIndexSummarizer::new(&state.dictionary, state.zone)
        .with_template(state.summary_template.as_deref());

    Ok(Json(summarizer.summarize(&records)))
}

/// Rendered event log of one round
async fn round_logs(
    state: State<AppState>,
    Path(round_id): Path<String>,
) -> Result<Json<Vec<RenderedLogEntry>>, ApiError> {
    let record = state.store.load_round(&round_id).await.map_err(|err| {
        tracing::error!(round_id = %round_id, error = ?err, "error reading logs");
        ApiError::Logs
    })?;

    let decoder = RoundDecoder::new(&state.dictionary, state.zone);

    Ok(Json(decoder.decode(&record)))
}
