use std::fs;
use std::path::Path;

use crate::models::Quiz;

const BUILTIN_QUIZ: &str = include_str!("nutrition_basics.json");

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{origin}: {reason}")]
    Invalid { origin: String, reason: String },
}

/// The "Nutrition Basics" quiz bundled with the crate.
pub fn builtin_quiz() -> Result<Quiz, LoadError> {
    parse_quiz(BUILTIN_QUIZ, "built-in quiz")
}

pub fn load_quiz_from_json<P: AsRef<Path>>(path: P) -> Result<Quiz, LoadError> {
    let path = path.as_ref();
    let json = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_quiz(&json, &path.display().to_string())
}

/// Parse and validate a quiz. `origin` names the source in error messages.
pub fn parse_quiz(json: &str, origin: &str) -> Result<Quiz, LoadError> {
    let quiz: Quiz = serde_json::from_str(json).map_err(|source| LoadError::Parse {
        origin: origin.to_string(),
        source,
    })?;

    let invalid = |reason: String| LoadError::Invalid {
        origin: origin.to_string(),
        reason,
    };

    if quiz.questions.is_empty() {
        return Err(invalid("a quiz must contain at least one question".to_string()));
    }

    for (i, question) in quiz.questions.iter().enumerate() {
        if question.options.len() < 2 {
            return Err(invalid(format!(
                "question {} has {} option(s), at least 2 are required",
                i + 1,
                question.options.len()
            )));
        }
        if question.correct_answer >= question.options.len() {
            return Err(invalid(format!(
                "question {} marks option {} as correct but has only {} options",
                i + 1,
                question.correct_answer,
                question.options.len()
            )));
        }
    }

    Ok(quiz)
}
