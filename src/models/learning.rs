//! Records stored in the learning collections.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a learner prefers lessons to be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Video,
    #[default]
    Text,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Video => "video",
            ContentType::Text => "text",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "video" => Ok(ContentType::Video),
            "text" => Ok(ContentType::Text),
            other => Err(format!("unknown content type '{}', expected video or text", other)),
        }
    }
}

/// A row of `course_content`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: String,
    pub topic_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content_type: ContentType,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// A row of `assignments`; quizzes are matched to topics by title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: String,
    #[serde(default)]
    pub title: String,
}

/// A row of `student_progress`, unique per (student, content).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub student_id: Uuid,
    pub content_id: String,
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub preferred_content_type: Option<ContentType>,
}

/// A row of `quiz_results`, unique per (student, quiz).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizResult {
    pub student_id: Uuid,
    pub quiz_id: String,
    pub score: u32,
    pub correct: usize,
    pub total: usize,
    pub completed_at: String,
}
