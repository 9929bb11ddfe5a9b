// REST API - axum router, shared state, and error responses

pub mod courses;
pub mod health;
pub mod reports;
pub mod students;

use crate::error::{AppError, AppResult};
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use rusqlite::Connection;
use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tower_http::LatencyUnit;
use tracing::{error, Level};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Connection>>,
    started_at: Instant,
    environment: Arc<str>,
    database_label: Arc<str>,
}

impl AppState {
    pub fn new(conn: Connection, environment: &str, database_label: &str) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            started_at: Instant::now(),
            environment: Arc::from(environment),
            database_label: Arc::from(database_label),
        }
    }

    /// Exclusive access to the store for the duration of one handler
    pub fn conn(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.db
            .lock()
            .map_err(|_| AppError::Internal("database lock poisoned".to_string()))
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn database_label(&self) -> &str {
        &self.database_label
    }

    pub fn uptime(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }
}

/// `{ "message": ... }` body used for errors and confirmations
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) | AppError::Conflict(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = if self.is_client_error() {
            self.to_string()
        } else {
            error!(error = %self, "Request failed");
            "Internal server error".to_string()
        };

        (status, MessageResponse::new(message)).into_response()
    }
}

/// Malformed JSON bodies are client errors (400), not axum's default 422
pub(crate) fn parse_body<T>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}

async fn not_found() -> AppError {
    AppError::not_found("Not found")
}

/// All API and health routes
pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/courses", get(courses::list).post(courses::create))
        .route(
            "/courses/:id",
            get(courses::fetch).put(courses::update).delete(courses::remove),
        )
        .route("/students", get(students::list).post(students::create))
        .route("/students/search", get(students::search))
        .route(
            "/students/:id",
            get(students::fetch).put(students::update).delete(students::remove),
        )
        .route(
            "/students/:id/grades",
            get(students::grades).put(students::update_grades),
        )
        .route("/dashboard/stats", get(reports::dashboard_stats))
        .route("/reports/course-passing-rates", get(reports::course_passing_rates));

    Router::new()
        .route("/health", get(health::health))
        .route("/health/detailed", get(health::health_detailed))
        .nest("/api", api_routes)
        .with_state(state)
}

/// Full application: routes, static presentation files, CORS, request logging
pub fn app(state: AppState, static_dir: Option<&Path>) -> Router {
    let routes = router(state);

    let routes = match static_dir {
        Some(dir) => routes.fallback_service(ServeDir::new(dir)),
        None => routes.fallback(not_found),
    };

    routes.layer(CorsLayer::permissive()).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_response(
                DefaultOnResponse::new()
                    .level(Level::INFO)
                    .latency_unit(LatencyUnit::Millis),
            ),
    )
}
