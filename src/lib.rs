//! # health-learn
//!
//! Health education for learners: a timed multiple-choice quiz in the
//! terminal, plus topic, lesson and progress reads against a hosted record
//! store.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use health_learn::{AppError, ExpiryPolicy, QuizRunner};
//!
//! # async fn demo() -> Result<(), AppError> {
//! let runner = QuizRunner::builtin(ExpiryPolicy::AutoComplete)?;
//! if let Some(completion) = runner.run().await? {
//!     println!("scored {}%", completion.score);
//! }
//! # Ok(())
//! # }
//! ```

mod app;
pub mod auth;
pub mod catalog;
pub mod config;
mod data;
mod error;
pub mod models;
pub mod progress;
pub mod query;
pub mod quiz;
pub mod store;
pub mod terminal;
mod ui;

use std::path::Path;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use tracing::debug;

pub use app::App;
pub use data::{LoadError, builtin_quiz, load_quiz_from_json, parse_quiz};
pub use error::AppError;
pub use models::{AppState, Question, Quiz};
pub use quiz::{Completion, CompletionReason, ExpiryPolicy, QuizSession};

const INPUT_POLL: Duration = Duration::from_millis(100);

/// A quiz that can be taken in the terminal.
pub struct QuizRunner {
    app: App,
}

impl QuizRunner {
    pub fn new(quiz: Quiz, expiry: ExpiryPolicy) -> Self {
        Self {
            app: App::new(quiz, expiry),
        }
    }

    /// Load the quiz from a JSON file.
    pub fn from_json<P: AsRef<Path>>(path: P, expiry: ExpiryPolicy) -> Result<Self, AppError> {
        let quiz = load_quiz_from_json(path)?;
        Ok(Self::new(quiz, expiry))
    }

    /// The quiz that ships with the binary.
    pub fn builtin(expiry: ExpiryPolicy) -> Result<Self, AppError> {
        Ok(Self::new(builtin_quiz()?, expiry))
    }

    /// Take over the terminal until the user quits.
    ///
    /// Returns the last completed attempt, or `None` when the user left
    /// before finishing. Must be called inside a Tokio runtime; the
    /// countdown runs as a task on it.
    pub async fn run(mut self) -> Result<Option<Completion>, AppError> {
        let mut term = terminal::init()?;
        let result = run_event_loop(&mut term, &mut self.app);
        self.app.stop();
        terminal::restore()?;
        result?;
        Ok(self.app.completion().cloned())
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    pub fn app_mut(&mut self) -> &mut App {
        &mut self.app
    }
}

fn run_event_loop(terminal: &mut terminal::AppTerminal, app: &mut App) -> Result<(), AppError> {
    loop {
        app.drain_ticks();
        terminal.draw(|frame| ui::render(frame, app))?;

        if !event::poll(INPUT_POLL)? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }

            if handle_input(app, key.code) {
                debug!(state = ?app.state, "quit requested");
                break;
            }
        }
    }

    Ok(())
}

/// Returns true if the app should exit.
fn handle_input(app: &mut App, key: KeyCode) -> bool {
    if matches!(key, KeyCode::Char('q') | KeyCode::Char('Q')) {
        return true;
    }

    match app.state {
        AppState::Welcome => handle_welcome_input(app, key),
        AppState::Quiz => handle_quiz_input(app, key),
        AppState::Result => handle_result_input(app, key),
    }
    false
}

fn handle_welcome_input(app: &mut App, key: KeyCode) {
    if matches!(key, KeyCode::Enter | KeyCode::Char(' ')) {
        app.start_quiz();
    }
}

fn handle_quiz_input(app: &mut App, key: KeyCode) {
    match key {
        KeyCode::Up | KeyCode::Char('k') => app.move_cursor_up(),
        KeyCode::Down | KeyCode::Char('j') => app.move_cursor_down(),
        KeyCode::Enter | KeyCode::Char(' ') => app.confirm(),
        KeyCode::Char('c') => app.check_answer(),
        KeyCode::Char('n') | KeyCode::Right => app.next_question(),
        KeyCode::Char('p') | KeyCode::Left => app.previous_question(),
        KeyCode::Char('r') => app.retake(),
        _ => {}
    }
}

fn handle_result_input(app: &mut App, key: KeyCode) {
    match key {
        KeyCode::Down | KeyCode::Char('j') => app.scroll_results_down(),
        KeyCode::Up | KeyCode::Char('k') => app.scroll_results_up(),
        KeyCode::Char('r') | KeyCode::Char('R') => app.retake(),
        _ => {}
    }
}
