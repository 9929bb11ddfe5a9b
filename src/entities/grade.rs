// 📝 Grades - letter grades and the per-student grade book
//
// A grade book maps course identifier -> grade. Values are kept as raw JSON
// because imported documents are not guaranteed to hold strings; anything
// that is not a string simply never counts as passing.

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Sentinel meaning "not graded"
pub const NO_GRADE: &str = "none";

/// Number of passing grades that makes a student a graduate
pub const GRADUATION_THRESHOLD: usize = 3;

// ============================================================================
// LETTER GRADE
// ============================================================================

/// Letter grades, best first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LetterGrade {
    APlus,
    A,
    AMinus,
    BPlus,
    B,
    BMinus,
    CPlus,
    C,
    CMinus,
    DPlus,
    D,
    DMinus,
    F,
}

impl LetterGrade {
    pub const ALL: [LetterGrade; 13] = [
        LetterGrade::APlus,
        LetterGrade::A,
        LetterGrade::AMinus,
        LetterGrade::BPlus,
        LetterGrade::B,
        LetterGrade::BMinus,
        LetterGrade::CPlus,
        LetterGrade::C,
        LetterGrade::CMinus,
        LetterGrade::DPlus,
        LetterGrade::D,
        LetterGrade::DMinus,
        LetterGrade::F,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LetterGrade::APlus => "A+",
            LetterGrade::A => "A",
            LetterGrade::AMinus => "A-",
            LetterGrade::BPlus => "B+",
            LetterGrade::B => "B",
            LetterGrade::BMinus => "B-",
            LetterGrade::CPlus => "C+",
            LetterGrade::C => "C",
            LetterGrade::CMinus => "C-",
            LetterGrade::DPlus => "D+",
            LetterGrade::D => "D",
            LetterGrade::DMinus => "D-",
            LetterGrade::F => "F",
        }
    }

    pub fn parse(s: &str) -> Option<LetterGrade> {
        Self::ALL.iter().copied().find(|g| g.as_str() == s)
    }

    pub fn is_passing(&self) -> bool {
        *self != LetterGrade::F
    }
}

impl fmt::Display for LetterGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recorded grade passes iff it is a non-empty string other than "F" and "none"
pub fn is_passing_value(value: &Value) -> bool {
    match value.as_str() {
        Some(grade) => !grade.is_empty() && grade != "F" && grade != NO_GRADE,
        None => false,
    }
}

// ============================================================================
// GRADE BOOK
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GradeBook(BTreeMap<String, Value>);

impl GradeBook {
    pub fn new() -> Self {
        GradeBook(BTreeMap::new())
    }

    /// Grade recorded for a course, if it is a string
    pub fn get(&self, course_id: &str) -> Option<&str> {
        self.0.get(course_id).and_then(Value::as_str)
    }

    pub fn set(&mut self, course_id: &str, grade: LetterGrade) {
        self.0
            .insert(course_id.to_string(), Value::String(grade.as_str().to_string()));
    }

    /// Whether the grade recorded for this specific course passes
    pub fn passes(&self, course_id: &str) -> bool {
        self.0.get(course_id).map(is_passing_value).unwrap_or(false)
    }

    /// Passing entries across every course in the book
    pub fn passing_count(&self) -> usize {
        self.0.values().filter(|v| is_passing_value(v)).count()
    }

    pub fn is_graduate(&self) -> bool {
        self.passing_count() >= GRADUATION_THRESHOLD
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Additive merge of proposed grades.
    ///
    /// Values are trimmed; empty strings and "none" leave the existing entry
    /// untouched. Every value is checked before anything is written, so a
    /// rejected request never half-applies. Returns the number of grades set.
    pub fn merge(&mut self, proposed: &BTreeMap<String, Value>) -> AppResult<usize> {
        let mut accepted = Vec::new();

        for (course_id, value) in proposed {
            let raw = value.as_str().ok_or_else(|| {
                AppError::validation(format!("Grade for course {} must be a string", course_id))
            })?;
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed == NO_GRADE {
                continue;
            }
            let grade = LetterGrade::parse(trimmed).ok_or_else(|| {
                AppError::validation(format!(
                    "Invalid grade `{}` for course {}",
                    trimmed, course_id
                ))
            })?;
            accepted.push((course_id.as_str(), grade));
        }

        for (course_id, grade) in &accepted {
            self.set(course_id, *grade);
        }

        Ok(accepted.len())
    }

    /// Build a grade book from client-submitted values, with the same checks
    /// as `merge`. Blank and "none" entries are dropped.
    pub fn from_submitted(proposed: &BTreeMap<String, Value>) -> AppResult<GradeBook> {
        let mut book = GradeBook::new();
        book.merge(proposed)?;
        Ok(book)
    }
}

impl From<BTreeMap<String, Value>> for GradeBook {
    fn from(map: BTreeMap<String, Value>) -> Self {
        GradeBook(map)
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for GradeBook {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        GradeBook(
            iter.into_iter()
                .map(|(course, grade)| (course.to_string(), Value::String(grade.to_string())))
                .collect(),
        )
    }
}
