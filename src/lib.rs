// Student Admin - Core Library
// Exposes all modules for use in the CLI, the API server, and tests

pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod logging;
pub mod seed;
pub mod stats;

// Only compile the REST layer when the server feature is enabled
#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use config::ServerConfig;
pub use db::{
    open_database, setup_database,
    get_all_courses, get_active_courses, get_course, create_course, update_course, delete_course,
    get_all_students, get_student, create_student, update_student, delete_student,
    search_students, update_student_grades,
};
pub use entities::{
    Course, CourseInput, GradeBook, LetterGrade, Status, Student, StudentInput, NO_GRADE,
};
pub use error::{AppError, AppResult};
pub use logging::init_tracing;
pub use seed::{import_files, seed_if_empty, ImportSummary};
pub use stats::{course_passing_rates, dashboard_summary, CoursePassingRate, DashboardStats};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
