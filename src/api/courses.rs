// Course routes: /api/courses

use super::{parse_body, AppState, MessageResponse};
use crate::db;
use crate::entities::{Course, CourseInput};
use crate::error::{AppError, AppResult};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use tracing::{info, warn};

/// GET /api/courses - all courses, ascending by name
pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<Course>>> {
    let conn = state.conn()?;
    let courses = db::get_all_courses(&conn)?;

    info!(count = courses.len(), "Retrieved courses");
    Ok(Json(courses))
}

/// POST /api/courses
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<CourseInput>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Course>)> {
    let input = parse_body(payload)?;
    let conn = state.conn()?;
    let course = db::create_course(&conn, input)?;

    Ok((StatusCode::CREATED, Json(course)))
}

/// GET /api/courses/:id
pub async fn fetch(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Course>> {
    let conn = state.conn()?;
    db::get_course(&conn, &id)?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Course not found"))
}

/// PUT /api/courses/:id - partial update
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<CourseInput>, JsonRejection>,
) -> AppResult<Json<Course>> {
    let input = parse_body(payload)?;
    let conn = state.conn()?;

    match db::update_course(&conn, &id, input) {
        Err(AppError::NotFound(msg)) => {
            warn!(course_id = %id, "Course not found for update");
            Err(AppError::NotFound(msg))
        }
        result => result.map(Json),
    }
}

/// DELETE /api/courses/:id - refused while students are enrolled
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let conn = state.conn()?;

    match db::delete_course(&conn, &id) {
        Ok(_) => Ok(MessageResponse::new("Course deleted successfully")),
        Err(AppError::NotFound(msg)) => {
            warn!(course_id = %id, "Course not found for deletion");
            Err(AppError::NotFound(msg))
        }
        Err(e) => Err(e),
    }
}
