mod learning;
mod question;
mod role;

pub use learning::{Assignment, ContentType, Lesson, ProgressRecord, QuizResult};
pub use question::{Question, Quiz};
pub use role::{Dashboard, Role};

/// Which screen the terminal front end is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Welcome,
    Quiz,
    Result,
}
