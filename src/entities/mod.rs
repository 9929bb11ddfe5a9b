// Entity Models
// Course and Student records plus the grade vocabulary they share

pub mod course;
pub mod grade;
pub mod status;
pub mod student;

pub use course::{Course, CourseInput};
pub use grade::{is_passing_value, GradeBook, LetterGrade, GRADUATION_THRESHOLD, NO_GRADE};
pub use status::Status;
pub use student::{parse_enrollment_date, Student, StudentInput};
