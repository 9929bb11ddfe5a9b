// 📚 Course Entity
//
// Name is unique across the catalog (enforced by the store). A course can be
// edited freely but not deleted while students reference it.

use super::status::Status;
use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// COURSE ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    /// Stable identity (UUID), generated on create
    #[serde(rename = "_id")]
    pub id: String,

    pub course_name: String,
    pub description: String,

    /// Duration in time units (weeks in the sample data)
    pub duration: f64,

    pub status: Status,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Course {
    pub fn new(course_name: String, description: String, duration: f64) -> Self {
        let now = Utc::now();

        Course {
            id: uuid::Uuid::new_v4().to_string(),
            course_name,
            description,
            duration,
            status: Status::Active,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

// ============================================================================
// REQUEST INPUT
// ============================================================================

/// Course fields as sent by clients. Every field is optional so the same
/// shape serves create (all required) and partial update (merge).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseInput {
    pub course_name: Option<String>,
    pub description: Option<String>,
    pub duration: Option<f64>,
    pub status: Option<Status>,
}

impl CourseInput {
    /// Build a new course, requiring name, description and duration
    pub fn into_course(self) -> AppResult<Course> {
        let course_name = required_text("courseName", self.course_name)?;
        let description = required_text("description", self.description)?;
        let duration = self
            .duration
            .ok_or_else(|| AppError::validation("duration is required"))
            .and_then(checked_duration)?;

        let mut course = Course::new(course_name, description, duration);
        if let Some(status) = self.status {
            course.status = status;
        }
        Ok(course)
    }

    /// Merge present fields into an existing course
    pub fn apply_to(self, course: &mut Course) -> AppResult<()> {
        if let Some(name) = self.course_name {
            course.course_name = required_text("courseName", Some(name))?;
        }
        if let Some(description) = self.description {
            course.description = required_text("description", Some(description))?;
        }
        if let Some(duration) = self.duration {
            course.duration = checked_duration(duration)?;
        }
        if let Some(status) = self.status {
            course.status = status;
        }
        course.updated_at = Utc::now();
        Ok(())
    }
}

pub(crate) fn required_text(field: &str, value: Option<String>) -> AppResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AppError::validation(format!("{} is required", field))),
    }
}

fn checked_duration(duration: f64) -> AppResult<f64> {
    if duration.is_finite() {
        Ok(duration)
    } else {
        Err(AppError::validation("duration must be a number"))
    }
}
