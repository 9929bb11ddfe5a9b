// Student routes: /api/students, search, and the grade sheet

use super::{parse_body, AppState, MessageResponse};
use crate::db;
use crate::entities::{Student, StudentInput, NO_GRADE};
use crate::error::{AppError, AppResult};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

/// Grades for every active course ("none" when not graded)
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeSheet {
    pub student_id: String,
    pub student_name: String,
    pub grades: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct GradeUpdateRequest {
    pub grades: Option<BTreeMap<String, Value>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeUpdateResponse {
    pub message: String,
    pub student_id: String,
    pub student_name: String,
}

/// GET /api/students - newest first
pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<Student>>> {
    let conn = state.conn()?;
    let students = db::get_all_students(&conn)?;

    info!(count = students.len(), "Retrieved students");
    Ok(Json(students))
}

/// POST /api/students
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<StudentInput>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Student>)> {
    let input = parse_body(payload)?;
    let conn = state.conn()?;
    let student = db::create_student(&conn, input)?;

    Ok((StatusCode::CREATED, Json(student)))
}

/// GET /api/students/search?q=term
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<Vec<Student>>> {
    let conn = state.conn()?;
    let students = db::search_students(&conn, &params.q)?;

    info!(search_term = %params.q, results = students.len(), "Student search completed");
    Ok(Json(students))
}

/// GET /api/students/:id
pub async fn fetch(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Student>> {
    let conn = state.conn()?;
    db::get_student(&conn, &id)?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Student not found"))
}

/// PUT /api/students/:id - partial update
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<StudentInput>, JsonRejection>,
) -> AppResult<Json<Student>> {
    let input = parse_body(payload)?;
    let conn = state.conn()?;

    match db::update_student(&conn, &id, input) {
        Err(AppError::NotFound(msg)) => {
            warn!(student_id = %id, "Student not found for update");
            Err(AppError::NotFound(msg))
        }
        result => result.map(Json),
    }
}

/// DELETE /api/students/:id
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let conn = state.conn()?;

    match db::delete_student(&conn, &id) {
        Ok(_) => Ok(MessageResponse::new("Student deleted successfully")),
        Err(AppError::NotFound(msg)) => {
            warn!(student_id = %id, "Student not found for deletion");
            Err(AppError::NotFound(msg))
        }
        Err(e) => Err(e),
    }
}

/// GET /api/students/:id/grades
pub async fn grades(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<GradeSheet>> {
    let conn = state.conn()?;
    let student =
        db::get_student(&conn, &id)?.ok_or_else(|| AppError::not_found("Student not found"))?;
    let courses = db::get_active_courses(&conn)?;

    let grades = courses
        .iter()
        .map(|course| {
            let grade = student.grades.get(&course.id).unwrap_or(NO_GRADE);
            (course.id.clone(), grade.to_string())
        })
        .collect();

    info!(
        student_id = %student.id,
        courses = courses.len(),
        "Grades retrieved for student"
    );
    Ok(Json(GradeSheet {
        student_id: student.id,
        student_name: student.student_name,
        grades,
    }))
}

/// PUT /api/students/:id/grades - additive merge
pub async fn update_grades(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<GradeUpdateRequest>, JsonRejection>,
) -> AppResult<Json<GradeUpdateResponse>> {
    let proposed = parse_body(payload)?
        .grades
        .ok_or_else(|| AppError::validation("grades is required"))?;
    let conn = state.conn()?;
    let (student, _) = db::update_student_grades(&conn, &id, &proposed)?;

    Ok(Json(GradeUpdateResponse {
        message: "Grades updated successfully".to_string(),
        student_id: student.id,
        student_name: student.student_name,
    }))
}
