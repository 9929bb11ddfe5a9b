// 📊 Stats Engine - dashboard summary and course passing-rate report
//
// Both computations rescan the full collections on every call. They assume
// consistent data and never repair it: grades for deleted or inactive courses
// still count toward a student's graduate status.

use crate::entities::{Course, Student};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::debug;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

// ============================================================================
// DASHBOARD SUMMARY
// ============================================================================

/// Enrollment count for one course identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseCount {
    #[serde(rename = "_id")]
    pub course_id: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_students: usize,
    pub active_students: usize,
    pub total_courses: usize,
    pub active_courses: usize,
    pub graduates: usize,
    pub course_counts: Vec<CourseCount>,
    /// Whole percentage of students who are graduates
    pub success_rate: u32,
}

pub fn dashboard_summary(students: &[Student], courses: &[Course]) -> DashboardStats {
    let total_students = students.len();
    let active_students = students.iter().filter(|s| s.is_active()).count();
    let total_courses = courses.len();
    let active_courses = courses.iter().filter(|c| c.is_active()).count();
    let graduates = students.iter().filter(|s| s.grades.is_graduate()).count();

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for student in students {
        *counts.entry(student.course.as_str()).or_insert(0) += 1;
    }
    let course_counts = counts
        .into_iter()
        .map(|(course_id, count)| CourseCount {
            course_id: course_id.to_string(),
            count,
        })
        .collect();

    let stats = DashboardStats {
        total_students,
        active_students,
        total_courses,
        active_courses,
        graduates,
        course_counts,
        success_rate: success_rate(graduates, total_students),
    };

    debug!(
        total_students,
        graduates,
        success_rate = stats.success_rate,
        "Dashboard statistics computed"
    );
    stats
}

/// round(graduates / total * 100), 0 for an empty roster
fn success_rate(graduates: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((graduates as f64 / total as f64) * 100.0).round() as u32
}

// ============================================================================
// COURSE PASSING-RATE REPORT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoursePassingRate {
    pub course_id: String,
    pub course_name: String,
    pub total_students: usize,
    pub passing_students: usize,
    /// Percentage with one decimal place
    pub passing_rate: f64,
}

/// One entry per active course, ordered by course name.
///
/// A student counts toward a course when their `course` field equals the
/// course id; they pass when their grade for that same course passes.
pub fn course_passing_rates(courses: &[Course], students: &[Student]) -> Vec<CoursePassingRate> {
    let mut report: Vec<CoursePassingRate> = courses
        .iter()
        .filter(|c| c.is_active())
        .map(|course| {
            let enrolled: Vec<&Student> = students
                .iter()
                .filter(|s| s.course == course.id)
                .collect();
            let passing = enrolled
                .iter()
                .filter(|s| s.grades.passes(&course.id))
                .count();

            CoursePassingRate {
                course_id: course.id.clone(),
                course_name: course.course_name.clone(),
                total_students: enrolled.len(),
                passing_students: passing,
                passing_rate: passing_rate(passing, enrolled.len()),
            }
        })
        .collect();

    report.sort_by(|a, b| compare_names(&a.course_name, &b.course_name));

    debug!(courses = report.len(), "Course passing rates computed");
    report
}

/// round(passing / total * 1000) / 10, 0.0 when nobody is enrolled
fn passing_rate(passing: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    ((passing as f64 / total as f64) * 100.0 * 10.0).round() / 10.0
}

/// Human ordering for names. Letters compare without accents or case first,
/// then unaccented before accented, then lowercase before uppercase.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    base_letters(a)
        .cmp(&base_letters(b))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| b.cmp(a))
}

/// Lowercase with diacritics stripped ("Économie" -> "economie")
fn base_letters(name: &str) -> String {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}
