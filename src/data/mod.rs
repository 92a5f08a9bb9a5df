mod loader;

pub use loader::{builtin_quiz, load_quiz_from_json, parse_quiz, LoadError};
