// 🌱 Test data import
//
// Loads courses and students from JSON arrays shaped like the API's wire
// records. Seed records may carry their own `_id` so students can point at
// seeded courses; anything else missing gets the usual defaults.

use crate::db;
use crate::entities::{parse_enrollment_date, Course, GradeBook, Status, Student};
use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedCourse {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    pub course_name: String,
    pub description: String,
    pub duration: f64,
    #[serde(default)]
    pub status: Status,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl SeedCourse {
    fn into_course(self) -> Course {
        let mut course = Course::new(self.course_name, self.description, self.duration);
        if let Some(id) = self.id {
            course.id = id;
        }
        course.status = self.status;
        if let Some(created_at) = self.created_at {
            course.created_at = created_at;
        }
        course.updated_at = self.updated_at.unwrap_or(course.created_at);
        course
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedStudent {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    pub student_name: String,
    pub email: String,
    pub course: String,
    pub enrollment_date: String,
    #[serde(default)]
    pub status: Status,
    /// Raw document values; non-string grades are kept and never pass
    #[serde(default)]
    pub grades: GradeBook,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl SeedStudent {
    fn into_student(self) -> AppResult<Student> {
        let enrollment_date = parse_enrollment_date(&self.enrollment_date)?;
        let mut student = Student::new(self.student_name, self.email, self.course, enrollment_date);
        if let Some(id) = self.id {
            student.id = id;
        }
        student.status = self.status;
        student.grades = self.grades;
        if let Some(created_at) = self.created_at {
            student.created_at = created_at;
        }
        student.updated_at = self.updated_at.unwrap_or(student.created_at);
        Ok(student)
    }
}

/// Counts of records written by an import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub courses: usize,
    pub students: usize,
}

pub fn load_courses(path: &Path) -> AppResult<Vec<SeedCourse>> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

pub fn load_students(path: &Path) -> AppResult<Vec<SeedStudent>> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Insert seed records inside one SQLite transaction: all or nothing
pub fn import_records(
    conn: &mut Connection,
    courses: Vec<SeedCourse>,
    students: Vec<SeedStudent>,
) -> AppResult<ImportSummary> {
    let tx = conn.transaction()?;
    let mut summary = ImportSummary::default();

    for seed in courses {
        db::insert_course(&tx, &seed.into_course())?;
        summary.courses += 1;
    }
    for seed in students {
        db::insert_student(&tx, &seed.into_student()?)?;
        summary.students += 1;
    }

    tx.commit()?;
    Ok(summary)
}

/// Import whichever files are given, regardless of existing data
pub fn import_files(
    conn: &mut Connection,
    courses_path: Option<&Path>,
    students_path: Option<&Path>,
) -> AppResult<ImportSummary> {
    let courses = match courses_path {
        Some(path) => load_courses(path)?,
        None => Vec::new(),
    };
    let students = match students_path {
        Some(path) => load_students(path)?,
        None => Vec::new(),
    };

    import_records(conn, courses, students)
}

/// Import test data only when both collections are empty.
///
/// Missing files are logged and skipped. Returns `None` when the store
/// already held data.
pub fn seed_if_empty(
    conn: &mut Connection,
    courses_path: Option<&Path>,
    students_path: Option<&Path>,
) -> AppResult<Option<ImportSummary>> {
    let course_count = db::count_courses(conn)?;
    let student_count = db::count_students(conn)?;

    if course_count > 0 || student_count > 0 {
        info!(
            courses = course_count,
            students = student_count,
            "Database already has data, skipping test data import"
        );
        return Ok(None);
    }

    let courses_path = existing_file(courses_path, "courses");
    let students_path = existing_file(students_path, "students");

    let summary = import_files(conn, courses_path, students_path)?;
    info!(
        courses = summary.courses,
        students = summary.students,
        "Test data import completed"
    );
    Ok(Some(summary))
}

fn existing_file<'a>(path: Option<&'a Path>, kind: &str) -> Option<&'a Path> {
    let path = path?;
    if path.exists() {
        Some(path)
    } else {
        warn!(path = %path.display(), kind, "Seed file not found");
        None
    }
}

/// Reject an import that would leave nothing behind
pub fn ensure_not_empty(summary: &ImportSummary) -> AppResult<()> {
    if summary.courses == 0 && summary.students == 0 {
        return Err(AppError::validation("Nothing to import"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        db::setup_database(&conn).unwrap();
        conn
    }

    fn write_json(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    const COURSES: &str = r#"[
        {"_id": "algo", "courseName": "Algorithms", "description": "Sorting", "duration": 12},
        {"courseName": "Databases", "description": "SQL", "duration": 8, "status": "inactive"}
    ]"#;

    const STUDENTS: &str = r#"[
        {
            "studentName": "Ada", "email": "ada@example.com", "course": "algo",
            "enrollmentDate": "2024-09-01T00:00:00.000Z",
            "grades": {"algo": "A", "x": "B", "y": 3}
        },
        {
            "studentName": "Grace", "email": "grace@example.com", "course": "algo",
            "enrollmentDate": "2024-09-02", "status": "inactive"
        }
    ]"#;

    #[test]
    fn test_seed_if_empty_imports_both_files() {
        let mut conn = test_conn();
        let courses = write_json(COURSES);
        let students = write_json(STUDENTS);

        let summary = seed_if_empty(&mut conn, Some(courses.path()), Some(students.path()))
            .unwrap()
            .unwrap();
        assert_eq!(summary, ImportSummary { courses: 2, students: 2 });

        let algo = db::get_course(&conn, "algo").unwrap().unwrap();
        assert_eq!(algo.course_name, "Algorithms");

        let all = db::get_all_students(&conn).unwrap();
        let ada = all.iter().find(|s| s.student_name == "Ada").unwrap();
        assert_eq!(ada.grades.len(), 3);
        assert_eq!(ada.grades.passing_count(), 2);
    }

    #[test]
    fn test_seed_skipped_when_data_exists() {
        let mut conn = test_conn();
        let courses = write_json(COURSES);
        seed_if_empty(&mut conn, Some(courses.path()), None).unwrap();

        let again = seed_if_empty(&mut conn, Some(courses.path()), None).unwrap();
        assert!(again.is_none());
        assert_eq!(db::count_courses(&conn).unwrap(), 2);
    }

    #[test]
    fn test_seed_missing_file_is_skipped() {
        let mut conn = test_conn();
        let summary = seed_if_empty(&mut conn, Some(Path::new("/nonexistent/courses.json")), None)
            .unwrap()
            .unwrap();

        assert_eq!(summary, ImportSummary::default());
        assert!(ensure_not_empty(&summary).is_err());
    }

    #[test]
    fn test_import_is_all_or_nothing() {
        let mut conn = test_conn();
        let duplicate = write_json(
            r#"[
                {"courseName": "Algorithms", "description": "a", "duration": 1},
                {"courseName": "Algorithms", "description": "b", "duration": 2}
            ]"#,
        );

        let err = import_files(&mut conn, Some(duplicate.path()), None).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(db::count_courses(&conn).unwrap(), 0);
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        let mut conn = test_conn();
        let broken = write_json("{ not json");

        let err = import_files(&mut conn, Some(broken.path()), None).unwrap_err();
        assert!(matches!(err, AppError::Serialization(_)));
    }
}
