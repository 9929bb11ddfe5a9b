// Dashboard and report routes, backed by the stats engine

use super::AppState;
use crate::db;
use crate::error::AppResult;
use crate::stats::{self, CoursePassingRate, DashboardStats};
use axum::{extract::State, Json};
use tracing::info;

/// GET /api/dashboard/stats
pub async fn dashboard_stats(State(state): State<AppState>) -> AppResult<Json<DashboardStats>> {
    let conn = state.conn()?;
    let students = db::get_all_students(&conn)?;
    let courses = db::get_all_courses(&conn)?;

    let summary = stats::dashboard_summary(&students, &courses);
    info!(
        total_students = summary.total_students,
        graduates = summary.graduates,
        "Dashboard statistics retrieved"
    );
    Ok(Json(summary))
}

/// GET /api/reports/course-passing-rates
pub async fn course_passing_rates(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<CoursePassingRate>>> {
    let conn = state.conn()?;
    let courses = db::get_active_courses(&conn)?;
    let students = db::get_all_students(&conn)?;

    let report = stats::course_passing_rates(&courses, &students);
    info!(courses = report.len(), "Course passing rates calculated");
    Ok(Json(report))
}
