use std::sync::Arc;

use tokio::sync::mpsc;

use crate::models::{AppState, Question, Quiz};
use crate::quiz::{Completion, Countdown, ExpiryPolicy, QuizSession, Tick};

pub struct App {
    pub state: AppState,
    session: QuizSession,
    cursor: usize,
    result_scroll: usize,
    countdown: Option<Countdown>,
    ticks_tx: mpsc::UnboundedSender<Tick>,
    ticks_rx: mpsc::UnboundedReceiver<Tick>,
}

impl App {
    pub fn new(quiz: Quiz, expiry: ExpiryPolicy) -> Self {
        let (ticks_tx, ticks_rx) = mpsc::unbounded_channel();

        Self {
            state: AppState::Welcome,
            session: QuizSession::with_policy(Arc::new(quiz), expiry),
            cursor: 0,
            result_scroll: 0,
            countdown: None,
            ticks_tx,
            ticks_rx,
        }
    }

    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    pub fn quiz(&self) -> &Quiz {
        self.session.quiz()
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.session.current_question()
    }

    pub fn current_question_number(&self) -> usize {
        self.session.current_index().map_or(0, |i| i + 1)
    }

    pub fn total_questions(&self) -> usize {
        self.quiz().total_questions()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn result_scroll(&self) -> usize {
        self.result_scroll
    }

    pub fn completion(&self) -> Option<&Completion> {
        self.session.completion()
    }

    fn option_count(&self) -> usize {
        self.current_question().map_or(0, |q| q.options.len())
    }

    pub fn move_cursor_down(&mut self) {
        let count = self.option_count();
        if count > 0 {
            self.cursor = (self.cursor + 1) % count;
        }
    }

    pub fn move_cursor_up(&mut self) {
        let count = self.option_count();
        if count > 0 {
            self.cursor = (self.cursor + count - 1) % count;
        }
    }

    pub fn start_quiz(&mut self) {
        self.state = AppState::Quiz;
        self.cursor = 0;
        self.restart_countdown();
        self.sync_screen();
    }

    /// Enter walks a question forward: pick the option under the cursor,
    /// then check it, then move on.
    pub fn confirm(&mut self) {
        if self.session.is_revealed() {
            self.next_question();
        } else if self.session.selection() == Some(self.cursor) {
            self.session.check_answer();
        } else {
            self.session.select_option(self.cursor);
        }
    }

    pub fn check_answer(&mut self) {
        self.session.check_answer();
    }

    pub fn next_question(&mut self) {
        if self.session.next_question() {
            self.cursor = 0;
        }
        self.sync_screen();
    }

    pub fn previous_question(&mut self) {
        if self.session.previous() {
            self.cursor = self.session.selection().unwrap_or(0);
        }
    }

    pub fn retake(&mut self) {
        self.session.retake();
        self.cursor = 0;
        self.result_scroll = 0;
        self.state = AppState::Quiz;
        self.restart_countdown();
        self.sync_screen();
    }

    /// Apply countdown ticks that arrived since the last call.
    pub fn drain_ticks(&mut self) {
        while let Ok(tick) = self.ticks_rx.try_recv() {
            let current = self.countdown.as_ref().is_some_and(|c| c.accepts(tick));
            if current {
                self.session.tick();
            }
        }
        self.sync_screen();
    }

    pub fn scroll_results_down(&mut self) {
        let max_scroll = self.total_questions().saturating_sub(1);
        self.result_scroll = (self.result_scroll + 1).min(max_scroll);
    }

    pub fn scroll_results_up(&mut self) {
        self.result_scroll = self.result_scroll.saturating_sub(1);
    }

    /// Stop the clock; used when leaving the quiz.
    pub fn stop(&mut self) {
        self.countdown = None;
    }

    fn restart_countdown(&mut self) {
        // Dropping the old countdown aborts its task.
        self.countdown = Some(Countdown::start(self.ticks_tx.clone()));
    }

    fn sync_screen(&mut self) {
        if self.state == AppState::Quiz && self.session.is_completed() {
            self.state = AppState::Result;
            self.countdown = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::builtin_quiz;
    use std::time::Duration;

    fn app() -> App {
        App::new(builtin_quiz().unwrap(), ExpiryPolicy::AutoComplete)
    }

    #[tokio::test]
    async fn test_confirm_walks_select_check_next() {
        let mut app = app();
        app.start_quiz();
        app.move_cursor_down();
        app.move_cursor_down();

        app.confirm();
        assert_eq!(app.session().selection(), Some(2));
        app.confirm();
        assert!(app.session().is_revealed());
        app.confirm();
        assert_eq!(app.current_question_number(), 2);
        assert_eq!(app.cursor(), 0);
    }

    #[tokio::test]
    async fn test_cursor_wraps() {
        let mut app = app();
        app.start_quiz();
        app.move_cursor_up();
        assert_eq!(app.cursor(), 3);
        app.move_cursor_down();
        assert_eq!(app.cursor(), 0);
    }

    #[tokio::test]
    async fn test_finishing_moves_to_results_and_stops_clock() {
        let mut app = app();
        app.start_quiz();
        for _ in 0..app.total_questions() {
            app.move_cursor_down();
            app.move_cursor_down();
            app.confirm();
            app.confirm();
            app.confirm();
        }

        assert_eq!(app.state, AppState::Result);
        assert!(app.countdown.is_none());
        // Every answer is option 2; question 3 expects option 3.
        assert_eq!(app.completion().map(|c| c.score), Some(80));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_count_down() {
        let mut app = app();
        app.start_quiz();
        tokio::time::sleep(Duration::from_millis(2500)).await;
        app.drain_ticks();
        assert_eq!(app.session().remaining_seconds(), 598);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retake_ignores_old_ticks() {
        let mut app = app();
        app.start_quiz();
        tokio::time::sleep(Duration::from_millis(1500)).await;

        app.retake();
        app.drain_ticks();
        assert_eq!(app.session().remaining_seconds(), 600);
        assert_eq!(app.state, AppState::Quiz);
    }
}
