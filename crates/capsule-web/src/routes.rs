//! API routes.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, State},
    response::Json,
    routing::{get, post},
};
use chrono::Utc;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

use capsule_delivery::{DeliveryError, LetterStore, OpenService, SweepReport, Sweeper};
use capsule_letter::{LetterId, OpenOutcome};

use crate::WebError;

/// Shared state for the API server.
pub struct AppState {
    pub store: Arc<dyn LetterStore>,
    pub sweeper: Sweeper,
    pub opener: OpenService,
}

impl AppState {
    pub fn new(store: Arc<dyn LetterStore>, sweeper: Sweeper) -> Self {
        let opener = OpenService::new(store.clone());
        Self {
            store,
            sweeper,
            opener,
        }
    }
}

/// Create the API router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/letters/{id}", get(letter_status))
        .route("/api/letters/{id}/open", post(open_letter))
        .route("/api/cron/scheduled", post(cron_scheduled))
        .route("/api/cron/recurring", post(cron_recurring))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Letter delivery status. Never includes content.
async fn letter_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<LetterId>,
) -> Result<Json<Value>, WebError> {
    let letter = state
        .store
        .get(id)
        .await
        .map_err(DeliveryError::from)?
        .ok_or(DeliveryError::NotFound(id))?;

    let now = Utc::now();
    Ok(Json(json!({
        "id": letter.id,
        "status": letter.status,
        "is_locked": letter.is_locked(now),
        "created_at": letter.created_at,
        "unlock_at": letter.unlock_at,
        "opened_at": letter.opened_at,
    })))
}

/// Reveal a letter. Repeat opens return 200 with `already_opened = true`;
/// locked letters get 423 `LETTER_LOCKED`.
async fn open_letter(
    State(state): State<Arc<AppState>>,
    Path(id): Path<LetterId>,
) -> Result<Json<Value>, WebError> {
    let (letter, outcome) = state.opener.open(id, Utc::now()).await?;
    Ok(Json(json!({
        "id": letter.id,
        "status": letter.status,
        "opened_at": letter.opened_at,
        "already_opened": outcome == OpenOutcome::AlreadyOpened,
    })))
}

fn report_json(report: &SweepReport) -> Json<Value> {
    Json(json!({
        "processed": report.notified,
        "skipped": report.skipped,
        "failed": report.failed(),
    }))
}

/// Cron trigger: deliver due scheduled letters.
async fn cron_scheduled(State(state): State<Arc<AppState>>) -> Result<Json<Value>, WebError> {
    let report = state.sweeper.process_scheduled(Utc::now()).await?;
    Ok(report_json(&report))
}

/// Cron trigger: re-notify recurring letters due today.
async fn cron_recurring(State(state): State<Arc<AppState>>) -> Result<Json<Value>, WebError> {
    let report = state.sweeper.process_recurring(Utc::now()).await?;
    Ok(report_json(&report))
}
