//! JSON HTTP API over sessions, commands and forecast data

pub mod error;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::app::App;
use crate::models::VisitorRecord;
use crate::pages::PageView;
use crate::session::Command;

pub use error::{ApiError, AppError};

type HandlerResult<T> = std::result::Result<T, AppError>;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionCreated {
    pub session_id: Uuid,
    pub view: PageView,
}

/// Routes without middleware; see [`crate::web::build_router`]
pub fn router(app: Arc<App>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/{id}", get(get_session).delete(delete_session))
        .route("/api/sessions/{id}/commands", post(post_command))
        .route("/api/sessions/{id}/itinerary.csv", get(download_itinerary))
        .route("/api/forecasts/{country}", get(get_forecast))
        .with_state(app)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
    })
}

async fn create_session(State(app): State<Arc<App>>) -> (StatusCode, Json<SessionCreated>) {
    let (session_id, view) = app.create_session().await;
    info!(%session_id, "Session started");
    (StatusCode::CREATED, Json(SessionCreated { session_id, view }))
}

async fn get_session(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
) -> HandlerResult<Json<PageView>> {
    app.view(id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::session_not_found(id))
}

async fn post_command(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
    Json(command): Json<Command>,
) -> HandlerResult<Json<PageView>> {
    app.dispatch(id, command)
        .await
        .map(Json)
        .ok_or_else(|| AppError::session_not_found(id))
}

async fn delete_session(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
) -> HandlerResult<StatusCode> {
    if app.end_session(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::session_not_found(id))
    }
}

async fn download_itinerary(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
) -> HandlerResult<Response> {
    let export = app
        .itinerary_csv(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no itinerary for session {id}")))?;

    let disposition = format!(
        "attachment; filename*=UTF-8''{}",
        urlencoding::encode(&export.filename)
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        export.csv,
    )
        .into_response())
}

async fn get_forecast(
    State(app): State<Arc<App>>,
    Path(country): Path<String>,
) -> HandlerResult<Json<Vec<VisitorRecord>>> {
    let records = app.forecast_records(&country);
    if records.is_empty() {
        return Err(AppError::NotFound(format!("no arrivals recorded for {country}")));
    }
    Ok(Json(records))
}
