//! Timed quiz attempts.

mod countdown;
mod session;

pub use countdown::{Countdown, Tick};
pub use session::{
    format_clock, score_percent, Completion, CompletionReason, ExpiryPolicy, QuizSession,
    QuizState,
};
