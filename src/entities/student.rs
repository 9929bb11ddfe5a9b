// 🎓 Student Entity
//
// Email is unique across all students (enforced by the store). The course
// field references a Course by identifier but is not a foreign key: only
// course deletion checks it.

use super::course::required_text;
use super::grade::GradeBook;
use super::status::Status;
use crate::error::{AppError, AppResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// ============================================================================
// STUDENT ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    /// Stable identity (UUID), generated on create
    #[serde(rename = "_id")]
    pub id: String,

    pub student_name: String,
    pub email: String,

    /// Identifier of the course the student is enrolled in
    pub course: String,

    pub enrollment_date: DateTime<Utc>,
    pub status: Status,

    /// course identifier -> grade
    #[serde(default)]
    pub grades: GradeBook,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Student {
    pub fn new(
        student_name: String,
        email: String,
        course: String,
        enrollment_date: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();

        Student {
            id: uuid::Uuid::new_v4().to_string(),
            student_name,
            email,
            course,
            enrollment_date,
            status: Status::Active,
            grades: GradeBook::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Case-insensitive substring match on name, course identifier, or email.
    /// `needle` must already be lowercase.
    pub fn matches(&self, needle: &str) -> bool {
        self.student_name.to_lowercase().contains(needle)
            || self.course.to_lowercase().contains(needle)
            || self.email.to_lowercase().contains(needle)
    }
}

/// Accepts RFC 3339 timestamps or plain `YYYY-MM-DD` dates (midnight UTC)
pub fn parse_enrollment_date(raw: &str) -> AppResult<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| AppError::validation(format!("Invalid enrollmentDate: {}", raw)))
}

// ============================================================================
// REQUEST INPUT
// ============================================================================

/// Student fields as sent by clients (create and partial update)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentInput {
    pub student_name: Option<String>,
    pub email: Option<String>,
    pub course: Option<String>,
    pub enrollment_date: Option<String>,
    pub status: Option<Status>,
    /// Checked like a grade update; only letter grades are stored
    pub grades: Option<BTreeMap<String, Value>>,
}

impl StudentInput {
    pub fn into_student(self) -> AppResult<Student> {
        let student_name = required_text("studentName", self.student_name)?;
        let email = required_text("email", self.email)?;
        let course = required_text("course", self.course)?;
        let enrollment_date = match self.enrollment_date {
            Some(raw) if !raw.trim().is_empty() => parse_enrollment_date(&raw)?,
            _ => return Err(AppError::validation("enrollmentDate is required")),
        };

        let grades = self
            .grades
            .as_ref()
            .map(GradeBook::from_submitted)
            .transpose()?;

        let mut student = Student::new(student_name, email, course, enrollment_date);
        if let Some(status) = self.status {
            student.status = status;
        }
        if let Some(grades) = grades {
            student.grades = grades;
        }
        Ok(student)
    }

    /// Merge present fields into an existing student. A `grades` object
    /// replaces the whole grade book; use the grade update for merging.
    pub fn apply_to(self, student: &mut Student) -> AppResult<()> {
        let mut updated = student.clone();

        if let Some(name) = self.student_name {
            updated.student_name = required_text("studentName", Some(name))?;
        }
        if let Some(email) = self.email {
            updated.email = required_text("email", Some(email))?;
        }
        if let Some(course) = self.course {
            updated.course = required_text("course", Some(course))?;
        }
        if let Some(raw) = self.enrollment_date {
            updated.enrollment_date = parse_enrollment_date(&raw)?;
        }
        if let Some(status) = self.status {
            updated.status = status;
        }
        if let Some(grades) = &self.grades {
            updated.grades = GradeBook::from_submitted(grades)?;
        }
        updated.updated_at = Utc::now();

        *student = updated;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn input() -> StudentInput {
        StudentInput {
            student_name: Some("Ada Lovelace".to_string()),
            email: Some("ada@example.com".to_string()),
            course: Some("course-1".to_string()),
            enrollment_date: Some("2024-09-01".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_student_creation() {
        let student = input().into_student().unwrap();

        assert!(!student.id.is_empty());
        assert_eq!(student.status, Status::Active);
        assert!(student.grades.is_empty());
        assert_eq!(student.enrollment_date.year(), 2024);
        assert_eq!(student.enrollment_date.hour(), 0);
    }

    #[test]
    fn test_student_requires_fields() {
        let mut missing_email = input();
        missing_email.email = None;
        assert_eq!(
            missing_email.into_student().unwrap_err().to_string(),
            "email is required"
        );

        let mut missing_date = input();
        missing_date.enrollment_date = Some("  ".to_string());
        assert_eq!(
            missing_date.into_student().unwrap_err().to_string(),
            "enrollmentDate is required"
        );

        let mut bad_date = input();
        bad_date.enrollment_date = Some("yesterday".to_string());
        assert!(matches!(bad_date.into_student(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_parse_enrollment_date_formats() {
        let dt = parse_enrollment_date("2024-09-01T10:30:00Z").unwrap();
        assert_eq!(dt.hour(), 10);

        let dt = parse_enrollment_date("2024-09-01T10:30:00+02:00").unwrap();
        assert_eq!(dt.hour(), 8);

        assert!(parse_enrollment_date("09/01/2024").is_err());
    }

    #[test]
    fn test_student_partial_update_is_all_or_nothing() {
        let mut student = input().into_student().unwrap();

        let result = StudentInput {
            student_name: Some("Ada King".to_string()),
            enrollment_date: Some("not a date".to_string()),
            ..Default::default()
        }
        .apply_to(&mut student);

        assert!(result.is_err());
        assert_eq!(student.student_name, "Ada Lovelace");

        StudentInput {
            status: Some(Status::Inactive),
            ..Default::default()
        }
        .apply_to(&mut student)
        .unwrap();

        assert_eq!(student.student_name, "Ada Lovelace");
        assert!(!student.is_active());
    }

    #[test]
    fn test_student_grades_must_be_letter_grades() {
        let mut bad = input();
        bad.grades = Some(BTreeMap::from([("x".to_string(), Value::from("ZZZ"))]));
        assert!(matches!(bad.into_student(), Err(AppError::Validation(_))));

        let mut good = input();
        good.grades = Some(BTreeMap::from([
            ("x".to_string(), Value::from("A-")),
            ("y".to_string(), Value::from("none")),
        ]));
        let mut student = good.into_student().unwrap();
        assert_eq!(student.grades.len(), 1);
        assert_eq!(student.grades.get("x"), Some("A-"));

        let result = StudentInput {
            grades: Some(BTreeMap::from([("x".to_string(), Value::from(42))])),
            ..Default::default()
        }
        .apply_to(&mut student);
        assert!(result.is_err());
        assert_eq!(student.grades.get("x"), Some("A-"));
    }

    #[test]
    fn test_student_matches_case_insensitive() {
        let student = input().into_student().unwrap();

        assert!(student.matches("ada"));
        assert!(student.matches("example.com"));
        assert!(student.matches("course-1"));
        assert!(!student.matches("grace"));
    }

    #[test]
    fn test_student_wire_format() {
        let student = input().into_student().unwrap();
        let value = serde_json::to_value(&student).unwrap();

        assert_eq!(value["studentName"], "Ada Lovelace");
        assert_eq!(value["grades"], serde_json::json!({}));
        assert!(value.get("_id").is_some());
        assert!(value.get("enrollmentDate").is_some());
    }
}
