//! Per-attempt quiz progression.
//!
//! Actions that are not valid in the current state are ignored and report
//! `false`, so racing input events never corrupt the session.

use std::sync::Arc;

use tracing::{debug, info};

use crate::models::{Question, Quiz};

/// What happens when the countdown reaches zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpiryPolicy {
    /// Complete the quiz with the answers recorded so far.
    #[default]
    AutoComplete,
    /// Let the learner keep going with the clock at zero.
    KeepOpen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionReason {
    Finished,
    TimeExpired,
}

/// Final snapshot of a completed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub answers: Vec<Option<usize>>,
    pub correct: usize,
    pub total: usize,
    /// Percentage, rounded half up.
    pub score: u32,
    pub reason: CompletionReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizState {
    InProgress {
        index: usize,
        selection: Option<usize>,
        revealed: bool,
    },
    Completed(Completion),
}

impl QuizState {
    fn start() -> Self {
        QuizState::InProgress {
            index: 0,
            selection: None,
            revealed: false,
        }
    }
}

pub struct QuizSession {
    quiz: Arc<Quiz>,
    state: QuizState,
    answers: Vec<Option<usize>>,
    remaining: u32,
    expiry: ExpiryPolicy,
}

impl QuizSession {
    pub fn new(quiz: Arc<Quiz>) -> Self {
        Self::with_policy(quiz, ExpiryPolicy::default())
    }

    pub fn with_policy(quiz: Arc<Quiz>, expiry: ExpiryPolicy) -> Self {
        let mut session = Self {
            answers: vec![None; quiz.total_questions()],
            remaining: quiz.time_limit,
            state: QuizState::start(),
            quiz,
            expiry,
        };
        if session.quiz.questions.is_empty() {
            session.complete(CompletionReason::Finished);
        }
        session
    }

    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    pub fn state(&self) -> &QuizState {
        &self.state
    }

    pub fn answers(&self) -> &[Option<usize>] {
        &self.answers
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.state, QuizState::Completed(_))
    }

    pub fn completion(&self) -> Option<&Completion> {
        match &self.state {
            QuizState::Completed(completion) => Some(completion),
            QuizState::InProgress { .. } => None,
        }
    }

    pub fn current_index(&self) -> Option<usize> {
        match self.state {
            QuizState::InProgress { index, .. } => Some(index),
            QuizState::Completed(_) => None,
        }
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.current_index().and_then(|i| self.quiz.questions.get(i))
    }

    pub fn selection(&self) -> Option<usize> {
        match self.state {
            QuizState::InProgress { selection, .. } => selection,
            QuizState::Completed(_) => None,
        }
    }

    pub fn is_revealed(&self) -> bool {
        matches!(self.state, QuizState::InProgress { revealed: true, .. })
    }

    pub fn is_last_question(&self) -> bool {
        self.current_index().map(|i| i + 1) == Some(self.quiz.total_questions())
    }

    /// Choose an option for the current question. Ignored after the answer
    /// has been revealed.
    pub fn select_option(&mut self, option: usize) -> bool {
        let QuizState::InProgress {
            index,
            selection,
            revealed: false,
        } = &mut self.state
        else {
            return false;
        };

        let in_range = self
            .quiz
            .questions
            .get(*index)
            .is_some_and(|q| option < q.options.len());
        if !in_range {
            return false;
        }

        *selection = Some(option);
        self.answers[*index] = Some(option);
        true
    }

    /// Reveal correctness and explanation. Needs a selection.
    pub fn check_answer(&mut self) -> bool {
        match &mut self.state {
            QuizState::InProgress {
                selection: Some(_),
                revealed,
                ..
            } if !*revealed => {
                *revealed = true;
                true
            }
            _ => false,
        }
    }

    /// Move past a revealed question, completing the quiz after the last one.
    pub fn next_question(&mut self) -> bool {
        let QuizState::InProgress {
            index,
            revealed: true,
            ..
        } = self.state
        else {
            return false;
        };

        if index + 1 >= self.quiz.total_questions() {
            self.complete(CompletionReason::Finished);
        } else {
            self.state = QuizState::InProgress {
                index: index + 1,
                selection: None,
                revealed: false,
            };
        }
        true
    }

    /// Go back one question, showing the answer recorded for it.
    pub fn previous(&mut self) -> bool {
        let QuizState::InProgress { index, .. } = self.state else {
            return false;
        };
        if index == 0 {
            return false;
        }

        let index = index - 1;
        self.state = QuizState::InProgress {
            index,
            selection: self.answers[index],
            revealed: false,
        };
        true
    }

    /// Start over: first question, no answers, full clock.
    pub fn retake(&mut self) {
        debug!(quiz = %self.quiz.id, "retaking quiz");
        self.answers = vec![None; self.quiz.total_questions()];
        self.remaining = self.quiz.time_limit;
        self.state = QuizState::start();
        if self.quiz.questions.is_empty() {
            self.complete(CompletionReason::Finished);
        }
    }

    /// Advance the clock by one second. Returns the seconds left.
    pub fn tick(&mut self) -> u32 {
        if self.is_completed() {
            return self.remaining;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 && self.expiry == ExpiryPolicy::AutoComplete {
            self.complete(CompletionReason::TimeExpired);
        }
        self.remaining
    }

    pub fn correct_count(&self) -> usize {
        self.answers
            .iter()
            .zip(self.quiz.questions.iter())
            .filter(|(answer, question)| question.is_correct(**answer))
            .count()
    }

    pub fn score(&self) -> u32 {
        score_percent(self.correct_count(), self.quiz.total_questions())
    }

    fn complete(&mut self, reason: CompletionReason) {
        let completion = Completion {
            answers: self.answers.clone(),
            correct: self.correct_count(),
            total: self.quiz.total_questions(),
            score: self.score(),
            reason,
        };
        info!(
            quiz = %self.quiz.id,
            score = completion.score,
            correct = completion.correct,
            total = completion.total,
            ?reason,
            "quiz completed"
        );
        self.state = QuizState::Completed(completion);
    }
}

/// `round(100 * correct / total)`, with 0 for an empty quiz.
pub fn score_percent(correct: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((200 * correct + total) / (2 * total)) as u32
}

/// Render seconds as `M:SS`.
pub fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: usize, correct: usize) -> Question {
        Question {
            id: id.to_string(),
            text: format!("Question {}", id),
            options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            correct_answer: correct,
            explanation: String::new(),
        }
    }

    fn quiz(n: usize) -> Arc<Quiz> {
        Arc::new(Quiz {
            id: "q".to_string(),
            title: "Test".to_string(),
            description: String::new(),
            time_limit: 90,
            questions: (0..n).map(|i| question(i, i % 4)).collect(),
        })
    }

    fn answer(session: &mut QuizSession, option: usize) {
        assert!(session.select_option(option));
        assert!(session.check_answer());
        assert!(session.next_question());
    }

    #[test]
    fn test_initial_state() {
        let session = QuizSession::new(quiz(3));
        assert_eq!(
            session.state(),
            &QuizState::InProgress {
                index: 0,
                selection: None,
                revealed: false
            }
        );
        assert_eq!(session.answers(), &[None, None, None]);
        assert_eq!(session.remaining_seconds(), 90);
    }

    #[test]
    fn test_reselect_before_check_overwrites() {
        let mut session = QuizSession::new(quiz(2));
        session.select_option(1);
        session.select_option(3);
        assert_eq!(session.answers()[0], Some(3));
        assert_eq!(session.selection(), Some(3));
    }

    #[test]
    fn test_select_after_check_is_ignored() {
        let mut session = QuizSession::new(quiz(2));
        session.select_option(1);
        session.check_answer();
        assert!(!session.select_option(2));
        assert_eq!(session.answers()[0], Some(1));
        assert!(session.is_revealed());
    }

    #[test]
    fn test_select_out_of_range_is_ignored() {
        let mut session = QuizSession::new(quiz(1));
        assert!(!session.select_option(4));
        assert_eq!(session.selection(), None);
    }

    #[test]
    fn test_check_requires_selection() {
        let mut session = QuizSession::new(quiz(2));
        assert!(!session.check_answer());
        assert!(!session.is_revealed());
    }

    #[test]
    fn test_next_requires_reveal() {
        let mut session = QuizSession::new(quiz(2));
        session.select_option(0);
        assert!(!session.next_question());
        assert_eq!(session.current_index(), Some(0));
    }

    #[test]
    fn test_next_clears_selection_and_reveal() {
        let mut session = QuizSession::new(quiz(3));
        answer(&mut session, 0);
        assert_eq!(
            session.state(),
            &QuizState::InProgress {
                index: 1,
                selection: None,
                revealed: false
            }
        );
    }

    #[test]
    fn test_score_for_three_of_five() {
        // Correct answers are i % 4; positions 1 and 3 get wrong answers.
        let mut session = QuizSession::new(quiz(5));
        for (i, option) in [0, 0, 2, 0, 0].into_iter().enumerate() {
            assert_eq!(session.current_index(), Some(i));
            answer(&mut session, option);
        }

        let completion = session.completion().unwrap();
        assert_eq!(completion.correct, 3);
        assert_eq!(completion.score, 60);
        assert_eq!(completion.reason, CompletionReason::Finished);
        assert_eq!(completion.answers, vec![Some(0), Some(0), Some(2), Some(0), Some(0)]);
    }

    #[test]
    fn test_completed_session_ignores_navigation() {
        let mut session = QuizSession::new(quiz(1));
        answer(&mut session, 0);
        assert!(session.is_completed());

        assert!(!session.select_option(1));
        assert!(!session.check_answer());
        assert!(!session.next_question());
        assert!(!session.previous());
        assert_eq!(session.tick(), 90);
        assert_eq!(session.completion().unwrap().score, 100);
    }

    #[test]
    fn test_previous_at_first_question() {
        let mut session = QuizSession::new(quiz(3));
        assert!(!session.previous());
        assert_eq!(session.current_index(), Some(0));
    }

    #[test]
    fn test_previous_restores_recorded_answer() {
        let mut session = QuizSession::new(quiz(3));
        answer(&mut session, 2);
        session.select_option(1);
        session.check_answer();

        assert!(session.previous());
        assert_eq!(
            session.state(),
            &QuizState::InProgress {
                index: 0,
                selection: Some(2),
                revealed: false
            }
        );
        assert_eq!(session.answers(), &[Some(2), Some(1), None]);
    }

    #[test]
    fn test_retake_resets_everything() {
        let mut session = QuizSession::new(quiz(2));
        session.tick();
        answer(&mut session, 0);
        answer(&mut session, 1);
        assert!(session.is_completed());

        session.retake();
        assert_eq!(session.current_index(), Some(0));
        assert_eq!(session.answers(), &[None, None]);
        assert_eq!(session.remaining_seconds(), 90);
        assert_eq!(session.selection(), None);
    }

    #[test]
    fn test_expiry_auto_completes() {
        let mut session = QuizSession::new(quiz(3));
        session.select_option(0);
        for _ in 0..89 {
            session.tick();
        }
        assert!(!session.is_completed());
        assert_eq!(session.tick(), 0);

        let completion = session.completion().unwrap();
        assert_eq!(completion.reason, CompletionReason::TimeExpired);
        assert_eq!(completion.correct, 1);
        assert_eq!(completion.score, 33);
    }

    #[test]
    fn test_expiry_keep_open() {
        let mut session = QuizSession::with_policy(quiz(1), ExpiryPolicy::KeepOpen);
        for _ in 0..200 {
            session.tick();
        }
        assert_eq!(session.remaining_seconds(), 0);
        assert!(!session.is_completed());
        assert!(session.select_option(0));
    }

    #[test]
    fn test_empty_quiz_starts_completed() {
        let session = QuizSession::new(quiz(0));
        assert_eq!(session.completion().map(|c| c.score), Some(0));
    }

    #[test]
    fn test_score_percent_rounding() {
        assert_eq!(score_percent(0, 0), 0);
        assert_eq!(score_percent(1, 3), 33);
        assert_eq!(score_percent(2, 3), 67);
        assert_eq!(score_percent(1, 8), 13);
        assert_eq!(score_percent(5, 5), 100);
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(600), "10:00");
        assert_eq!(format_clock(65), "1:05");
        assert_eq!(format_clock(9), "0:09");
    }
}
