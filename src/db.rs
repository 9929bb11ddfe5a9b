use crate::entities::{Course, CourseInput, GradeBook, Status, Student, StudentInput};
use crate::error::{AppError, AppResult};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

const COURSE_COLUMNS: &str =
    "id, course_name, description, duration, status, created_at, updated_at";

const STUDENT_COLUMNS: &str =
    "id, student_name, email, course, enrollment_date, status, grades, created_at, updated_at";

/// Open (or create) the database file and make sure the schema exists
pub fn open_database(path: &Path) -> AppResult<Connection> {
    let conn = Connection::open(path)?;
    setup_database(&conn)?;
    Ok(conn)
}

pub fn setup_database(conn: &Connection) -> AppResult<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // ==========================================================================
    // Courses Table (course_name is the natural unique key)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS courses (
            id TEXT PRIMARY KEY NOT NULL,
            course_name TEXT UNIQUE NOT NULL,
            description TEXT NOT NULL,
            duration REAL NOT NULL,
            status TEXT NOT NULL DEFAULT 'active',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Students Table (grades kept as a JSON document: course id -> grade)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS students (
            id TEXT PRIMARY KEY NOT NULL,
            student_name TEXT NOT NULL,
            email TEXT UNIQUE NOT NULL,
            course TEXT NOT NULL,
            enrollment_date TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'active',
            grades TEXT NOT NULL DEFAULT '{}',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_students_course ON students(course)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_students_created_at ON students(created_at)",
        [],
    )?;

    Ok(())
}

/// Store connectivity check
pub fn ping(conn: &Connection) -> AppResult<()> {
    conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
    Ok(())
}

// ============================================================================
// ROW MAPPING
// ============================================================================

/// Fixed-width RFC 3339 so that text ordering matches time ordering
fn timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn get_timestamp(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn get_status(row: &Row, idx: usize) -> rusqlite::Result<Status> {
    let raw: String = row.get(idx)?;
    raw.parse::<Status>().map_err(|msg| {
        conversion_error(idx, std::io::Error::new(std::io::ErrorKind::InvalidData, msg))
    })
}

fn get_grades(row: &Row, idx: usize) -> rusqlite::Result<GradeBook> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| conversion_error(idx, e))
}

fn course_from_row(row: &Row) -> rusqlite::Result<Course> {
    Ok(Course {
        id: row.get(0)?,
        course_name: row.get(1)?,
        description: row.get(2)?,
        duration: row.get(3)?,
        status: get_status(row, 4)?,
        created_at: get_timestamp(row, 5)?,
        updated_at: get_timestamp(row, 6)?,
    })
}

fn student_from_row(row: &Row) -> rusqlite::Result<Student> {
    Ok(Student {
        id: row.get(0)?,
        student_name: row.get(1)?,
        email: row.get(2)?,
        course: row.get(3)?,
        enrollment_date: get_timestamp(row, 4)?,
        status: get_status(row, 5)?,
        grades: get_grades(row, 6)?,
        created_at: get_timestamp(row, 7)?,
        updated_at: get_timestamp(row, 8)?,
    })
}

/// Turn UNIQUE violations into client-facing validation errors
fn map_unique_violation(err: rusqlite::Error) -> AppError {
    if let rusqlite::Error::SqliteFailure(failure, Some(msg)) = &err {
        if failure.code == ErrorCode::ConstraintViolation && msg.contains("UNIQUE") {
            let message = if msg.contains("students.email") {
                "A student with this email already exists"
            } else if msg.contains("courses.course_name") {
                "A course with this name already exists"
            } else {
                "A record with this _id already exists"
            };
            return AppError::validation(message);
        }
    }
    err.into()
}

// ============================================================================
// COURSES
// ============================================================================

pub fn insert_course(conn: &Connection, course: &Course) -> AppResult<()> {
    conn.execute(
        "INSERT INTO courses (id, course_name, description, duration, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            course.id,
            course.course_name,
            course.description,
            course.duration,
            course.status.as_str(),
            timestamp(&course.created_at),
            timestamp(&course.updated_at),
        ],
    )
    .map_err(map_unique_violation)?;

    Ok(())
}

/// All courses, ascending by name
pub fn get_all_courses(conn: &Connection) -> AppResult<Vec<Course>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM courses ORDER BY course_name ASC",
        COURSE_COLUMNS
    ))?;

    let courses = stmt
        .query_map([], course_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(courses)
}

pub fn get_active_courses(conn: &Connection) -> AppResult<Vec<Course>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM courses WHERE status = 'active' ORDER BY course_name ASC",
        COURSE_COLUMNS
    ))?;

    let courses = stmt
        .query_map([], course_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(courses)
}

pub fn get_course(conn: &Connection, id: &str) -> AppResult<Option<Course>> {
    let course = conn
        .query_row(
            &format!("SELECT {} FROM courses WHERE id = ?1", COURSE_COLUMNS),
            [id],
            course_from_row,
        )
        .optional()?;

    Ok(course)
}

fn require_course(conn: &Connection, id: &str) -> AppResult<Course> {
    get_course(conn, id)?.ok_or_else(|| AppError::not_found("Course not found"))
}

pub fn create_course(conn: &Connection, input: CourseInput) -> AppResult<Course> {
    let course = input.into_course()?;
    insert_course(conn, &course)?;

    info!(course_id = %course.id, course_name = %course.course_name, "New course created");
    Ok(course)
}

/// Partial update: only fields present in `input` change
pub fn update_course(conn: &Connection, id: &str, input: CourseInput) -> AppResult<Course> {
    let mut course = require_course(conn, id)?;
    input.apply_to(&mut course)?;

    conn.execute(
        "UPDATE courses
         SET course_name = ?2, description = ?3, duration = ?4, status = ?5, updated_at = ?6
         WHERE id = ?1",
        params![
            course.id,
            course.course_name,
            course.description,
            course.duration,
            course.status.as_str(),
            timestamp(&course.updated_at),
        ],
    )
    .map_err(map_unique_violation)?;

    info!(course_id = %course.id, course_name = %course.course_name, "Course updated");
    Ok(course)
}

pub fn count_students_in_course(conn: &Connection, course_id: &str) -> AppResult<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM students WHERE course = ?1",
        [course_id],
        |row| row.get(0),
    )?;

    Ok(count)
}

/// Delete a course unless students are still enrolled in it.
///
/// NOTE: check-then-delete is not atomic; a student created between the
/// count and the delete ends up referencing a missing course.
pub fn delete_course(conn: &Connection, id: &str) -> AppResult<Course> {
    let enrolled = count_students_in_course(conn, id)?;
    if enrolled > 0 {
        warn!(course_id = %id, enrolled, "Attempted to delete course with enrolled students");
        return Err(AppError::Conflict(
            "Cannot delete course with enrolled students".to_string(),
        ));
    }

    let course = require_course(conn, id)?;
    conn.execute("DELETE FROM courses WHERE id = ?1", [id])?;

    info!(course_id = %course.id, course_name = %course.course_name, "Course deleted");
    Ok(course)
}

pub fn count_courses(conn: &Connection) -> AppResult<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM courses", [], |row| row.get(0))?;
    Ok(count)
}

// ============================================================================
// STUDENTS
// ============================================================================

pub fn insert_student(conn: &Connection, student: &Student) -> AppResult<()> {
    let grades_json = serde_json::to_string(&student.grades)?;

    conn.execute(
        "INSERT INTO students (
            id, student_name, email, course, enrollment_date, status, grades, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            student.id,
            student.student_name,
            student.email,
            student.course,
            timestamp(&student.enrollment_date),
            student.status.as_str(),
            grades_json,
            timestamp(&student.created_at),
            timestamp(&student.updated_at),
        ],
    )
    .map_err(map_unique_violation)?;

    Ok(())
}

/// All students, newest first
pub fn get_all_students(conn: &Connection) -> AppResult<Vec<Student>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM students ORDER BY created_at DESC, rowid DESC",
        STUDENT_COLUMNS
    ))?;

    let students = stmt
        .query_map([], student_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(students)
}

pub fn get_student(conn: &Connection, id: &str) -> AppResult<Option<Student>> {
    let student = conn
        .query_row(
            &format!("SELECT {} FROM students WHERE id = ?1", STUDENT_COLUMNS),
            [id],
            student_from_row,
        )
        .optional()?;

    Ok(student)
}

fn require_student(conn: &Connection, id: &str) -> AppResult<Student> {
    get_student(conn, id)?.ok_or_else(|| AppError::not_found("Student not found"))
}

pub fn create_student(conn: &Connection, input: StudentInput) -> AppResult<Student> {
    let student = input.into_student()?;
    insert_student(conn, &student)?;

    info!(
        student_id = %student.id,
        student_name = %student.student_name,
        course = %student.course,
        "New student created"
    );
    Ok(student)
}

fn write_student(conn: &Connection, student: &Student) -> AppResult<()> {
    let grades_json = serde_json::to_string(&student.grades)?;

    conn.execute(
        "UPDATE students
         SET student_name = ?2, email = ?3, course = ?4, enrollment_date = ?5,
             status = ?6, grades = ?7, updated_at = ?8
         WHERE id = ?1",
        params![
            student.id,
            student.student_name,
            student.email,
            student.course,
            timestamp(&student.enrollment_date),
            student.status.as_str(),
            grades_json,
            timestamp(&student.updated_at),
        ],
    )
    .map_err(map_unique_violation)?;

    Ok(())
}

/// Partial update: only fields present in `input` change
pub fn update_student(conn: &Connection, id: &str, input: StudentInput) -> AppResult<Student> {
    let mut student = require_student(conn, id)?;
    input.apply_to(&mut student)?;
    write_student(conn, &student)?;

    info!(
        student_id = %student.id,
        student_name = %student.student_name,
        course = %student.course,
        "Student updated"
    );
    Ok(student)
}

/// Deleting a student never touches courses
pub fn delete_student(conn: &Connection, id: &str) -> AppResult<Student> {
    let student = require_student(conn, id)?;
    conn.execute("DELETE FROM students WHERE id = ?1", [id])?;

    info!(
        student_id = %student.id,
        student_name = %student.student_name,
        course = %student.course,
        "Student deleted"
    );
    Ok(student)
}

/// Case-insensitive substring search over name, course id and email.
/// An empty term matches every student; whitespace is matched literally.
pub fn search_students(conn: &Connection, term: &str) -> AppResult<Vec<Student>> {
    let needle = term.to_lowercase();
    let students = get_all_students(conn)?;

    Ok(students
        .into_iter()
        .filter(|s| needle.is_empty() || s.matches(&needle))
        .collect())
}

/// Additive grade merge (see `GradeBook::merge`). Returns the saved student
/// and how many grades were written.
pub fn update_student_grades(
    conn: &Connection,
    id: &str,
    proposed: &BTreeMap<String, Value>,
) -> AppResult<(Student, usize)> {
    let mut student = require_student(conn, id)?;
    let written = student.grades.merge(proposed)?;

    if written > 0 {
        student.updated_at = Utc::now();
        write_student(conn, &student)?;
    }

    info!(
        student_id = %student.id,
        student_name = %student.student_name,
        submitted = proposed.len(),
        written,
        "Grades updated for student"
    );
    Ok((student, written))
}

pub fn count_students(conn: &Connection) -> AppResult<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM students", [], |row| row.get(0))?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    fn course_input(name: &str) -> CourseInput {
        CourseInput {
            course_name: Some(name.to_string()),
            description: Some(format!("{} description", name)),
            duration: Some(12.0),
            status: None,
        }
    }

    fn student_input(name: &str, email: &str, course: &str) -> StudentInput {
        StudentInput {
            student_name: Some(name.to_string()),
            email: Some(email.to_string()),
            course: Some(course.to_string()),
            enrollment_date: Some("2024-09-01".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_course_roundtrip() {
        let conn = test_conn();
        let created = create_course(&conn, course_input("Algorithms")).unwrap();

        let loaded = get_course(&conn, &created.id).unwrap().unwrap();
        assert_eq!(loaded, created);
        assert!(get_course(&conn, "missing").unwrap().is_none());
    }

    #[test]
    fn test_courses_sorted_by_name() {
        let conn = test_conn();
        for name in ["Databases", "Algorithms", "Compilers"] {
            create_course(&conn, course_input(name)).unwrap();
        }

        let names: Vec<String> = get_all_courses(&conn)
            .unwrap()
            .into_iter()
            .map(|c| c.course_name)
            .collect();
        assert_eq!(names, vec!["Algorithms", "Compilers", "Databases"]);
    }

    #[test]
    fn test_course_name_is_unique() {
        let conn = test_conn();
        create_course(&conn, course_input("Algorithms")).unwrap();

        let err = create_course(&conn, course_input("Algorithms")).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(err.to_string(), "A course with this name already exists");
        assert_eq!(count_courses(&conn).unwrap(), 1);
    }

    #[test]
    fn test_update_course_rename_collision() {
        let conn = test_conn();
        create_course(&conn, course_input("Algorithms")).unwrap();
        let db = create_course(&conn, course_input("Databases")).unwrap();

        let err = update_course(&conn, &db.id, course_input("Algorithms")).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = update_course(&conn, "missing", CourseInput::default()).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_active_courses_filter() {
        let conn = test_conn();
        create_course(&conn, course_input("Algorithms")).unwrap();
        let mut retired = course_input("Fortran");
        retired.status = Some(Status::Inactive);
        create_course(&conn, retired).unwrap();

        let active = get_active_courses(&conn).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].course_name, "Algorithms");
    }

    #[test]
    fn test_delete_course_guard() {
        let conn = test_conn();
        let course = create_course(&conn, course_input("Algorithms")).unwrap();
        let student =
            create_student(&conn, student_input("Ada", "ada@example.com", &course.id)).unwrap();

        let err = delete_course(&conn, &course.id).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert!(get_course(&conn, &course.id).unwrap().is_some());

        delete_student(&conn, &student.id).unwrap();
        let deleted = delete_course(&conn, &course.id).unwrap();
        assert_eq!(deleted.id, course.id);
        assert!(get_course(&conn, &course.id).unwrap().is_none());

        let err = delete_course(&conn, &course.id).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_student_email_is_unique() {
        let conn = test_conn();
        create_student(&conn, student_input("Ada", "ada@example.com", "c1")).unwrap();

        let err =
            create_student(&conn, student_input("Other", "ada@example.com", "c1")).unwrap_err();
        assert_eq!(err.to_string(), "A student with this email already exists");
        assert_eq!(count_students(&conn).unwrap(), 1);
    }

    #[test]
    fn test_students_newest_first() {
        let conn = test_conn();
        let first = create_student(&conn, student_input("Ada", "ada@example.com", "c1")).unwrap();
        let second =
            create_student(&conn, student_input("Grace", "grace@example.com", "c1")).unwrap();

        let students = get_all_students(&conn).unwrap();
        assert_eq!(students[0].id, second.id);
        assert_eq!(students[1].id, first.id);
    }

    #[test]
    fn test_search_students() {
        let conn = test_conn();
        create_student(&conn, student_input("Ada Lovelace", "ada@example.com", "math-101")).unwrap();
        create_student(&conn, student_input("Grace Hopper", "grace@navy.mil", "cs-201")).unwrap();

        assert_eq!(search_students(&conn, "LOVELACE").unwrap().len(), 1);
        assert_eq!(search_students(&conn, "navy").unwrap().len(), 1);
        assert_eq!(search_students(&conn, "CS-2").unwrap().len(), 1);
        assert_eq!(search_students(&conn, "e").unwrap().len(), 2);
        assert_eq!(search_students(&conn, "").unwrap().len(), 2);
        assert!(search_students(&conn, "turing").unwrap().is_empty());

        // Whitespace is part of the term
        assert_eq!(search_students(&conn, "a l").unwrap().len(), 1);
        assert_eq!(search_students(&conn, " ").unwrap().len(), 2);
        assert!(search_students(&conn, "  ").unwrap().is_empty());
    }

    #[test]
    fn test_update_student_grades_is_additive() {
        let conn = test_conn();
        let student = create_student(&conn, student_input("Ada", "ada@example.com", "c1")).unwrap();

        let proposed: BTreeMap<String, Value> =
            [("c1".to_string(), json!("B"))].into_iter().collect();
        update_student_grades(&conn, &student.id, &proposed).unwrap();

        let proposed: BTreeMap<String, Value> = [
            ("c1".to_string(), json!("none")),
            ("c2".to_string(), json!("")),
        ]
        .into_iter()
        .collect();
        let (_, written) = update_student_grades(&conn, &student.id, &proposed).unwrap();
        assert_eq!(written, 0);

        let loaded = get_student(&conn, &student.id).unwrap().unwrap();
        assert_eq!(loaded.grades.get("c1"), Some("B"));
        assert_eq!(loaded.grades.len(), 1);

        let err = update_student_grades(&conn, "missing", &proposed).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_update_student_partial() {
        let conn = test_conn();
        let student = create_student(&conn, student_input("Ada", "ada@example.com", "c1")).unwrap();

        let updated = update_student(
            &conn,
            &student.id,
            StudentInput {
                course: Some("c2".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(updated.student_name, "Ada");
        assert_eq!(updated.course, "c2");
        assert_eq!(get_student(&conn, &student.id).unwrap().unwrap(), updated);
    }

    #[test]
    fn test_ping() {
        let conn = test_conn();
        assert!(ping(&conn).is_ok());
    }
}
