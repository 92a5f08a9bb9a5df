//! Learner progress: completed lessons and quiz scores.
//!
//! Writes are upserts keyed by (learner, content), so repeating one never
//! creates a duplicate row.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Deserialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::info;

use crate::auth::{Identity, SessionProvider};
use crate::error::AppError;
use crate::models::{ContentType, ProgressRecord, QuizResult};
use crate::query::QueryRequest;
use crate::quiz::{Completion, score_percent};
use crate::store::{RecordStore, decode_records, encode_record};

const PROGRESS: &str = "student_progress";
const QUIZ_RESULTS: &str = "quiz_results";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopicProgress {
    pub completed: usize,
    pub total: usize,
}

impl TopicProgress {
    pub fn percent(&self) -> u32 {
        score_percent(self.completed, self.total)
    }
}

#[derive(Deserialize)]
struct IdRow {
    id: String,
}

#[derive(Deserialize)]
struct ContentIdRow {
    content_id: String,
}

pub struct ProgressTracker {
    store: Arc<dyn RecordStore>,
    session: SessionProvider,
}

impl ProgressTracker {
    pub fn new(store: Arc<dyn RecordStore>, session: SessionProvider) -> Self {
        Self { store, session }
    }

    fn learner(&self) -> Result<Identity, AppError> {
        self.session.current().ok_or(AppError::NotSignedIn)
    }

    pub async fn mark_completed(
        &self,
        content_id: &str,
        preference: ContentType,
    ) -> Result<(), AppError> {
        let learner = self.learner()?;
        let record = ProgressRecord {
            student_id: learner.id,
            content_id: content_id.to_string(),
            completed: true,
            completed_at: Some(now_rfc3339()),
            preferred_content_type: Some(preference),
        };

        self.store
            .upsert(PROGRESS, &["student_id", "content_id"], encode_record(&record)?)
            .await?;
        info!(user = %learner.id, content_id, "lesson marked completed");
        Ok(())
    }

    pub async fn record_quiz_score(
        &self,
        quiz_id: &str,
        completion: &Completion,
    ) -> Result<(), AppError> {
        let learner = self.learner()?;
        let record = QuizResult {
            student_id: learner.id,
            quiz_id: quiz_id.to_string(),
            score: completion.score,
            correct: completion.correct,
            total: completion.total,
            completed_at: now_rfc3339(),
        };

        self.store
            .upsert(QUIZ_RESULTS, &["student_id", "quiz_id"], encode_record(&record)?)
            .await?;
        info!(user = %learner.id, quiz_id, score = completion.score, "quiz score saved");
        Ok(())
    }

    /// Completed lessons out of all lessons in a topic.
    pub async fn topic_progress(&self, topic_id: &str) -> Result<TopicProgress, AppError> {
        let learner = self.learner()?;

        let lessons = QueryRequest::new("course_content")?
            .columns(["id"])
            .eq("topic_id", topic_id);
        let lessons: Vec<IdRow> = decode_records(self.store.select(&lessons).await?)?;

        let done = QueryRequest::new(PROGRESS)?
            .columns(["content_id"])
            .eq("student_id", learner.id.to_string())
            .eq("completed", true);
        let done: HashSet<String> = decode_records::<ContentIdRow>(self.store.select(&done).await?)?
            .into_iter()
            .map(|row| row.content_id)
            .collect();

        Ok(TopicProgress {
            completed: lessons.iter().filter(|l| done.contains(&l.id)).count(),
            total: lessons.len(),
        })
    }
}

fn now_rfc3339() -> String {
    let now = OffsetDateTime::now_utc();
    now.format(&Rfc3339)
        .unwrap_or_else(|_| now.unix_timestamp().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::quiz::CompletionReason;
    use crate::store::MemoryStore;
    use serde_json::json;
    use uuid::Uuid;

    fn setup() -> (Arc<MemoryStore>, SessionProvider, Identity) {
        let store = MemoryStore::from_json(
            &json!({
                "course_content": [
                    {"id": "n1", "topic_id": "nutrition"},
                    {"id": "n2", "topic_id": "nutrition"},
                    {"id": "n3", "topic_id": "nutrition"},
                    {"id": "m1", "topic_id": "mental-health"}
                ],
                "student_progress": [],
                "quiz_results": []
            })
            .to_string(),
        )
        .unwrap();
        let identity = Identity::new(Uuid::new_v4(), Role::Student);
        let session = SessionProvider::signed_in(identity.clone());
        (Arc::new(store), session, identity)
    }

    #[tokio::test]
    async fn test_mark_completed_is_idempotent() {
        let (store, session, _) = setup();
        let tracker = ProgressTracker::new(store.clone(), session);

        tracker.mark_completed("n1", ContentType::Text).await.unwrap();
        tracker.mark_completed("n1", ContentType::Video).await.unwrap();

        let rows = store.rows(PROGRESS);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["preferred_content_type"], json!("video"));
    }

    #[tokio::test]
    async fn test_topic_progress() {
        let (store, session, _) = setup();
        let tracker = ProgressTracker::new(store.clone(), session);

        tracker.mark_completed("n1", ContentType::Text).await.unwrap();
        tracker.mark_completed("n3", ContentType::Text).await.unwrap();
        tracker.mark_completed("m1", ContentType::Text).await.unwrap();

        let progress = tracker.topic_progress("nutrition").await.unwrap();
        assert_eq!(progress, TopicProgress { completed: 2, total: 3 });
        assert_eq!(progress.percent(), 67);

        let empty = tracker.topic_progress("first-aid").await.unwrap();
        assert_eq!(empty.percent(), 0);
    }

    #[tokio::test]
    async fn test_record_quiz_score_overwrites() {
        let (store, session, identity) = setup();
        let tracker = ProgressTracker::new(store.clone(), session);
        let mut completion = Completion {
            answers: vec![Some(0), None],
            correct: 1,
            total: 2,
            score: 50,
            reason: CompletionReason::TimeExpired,
        };

        tracker.record_quiz_score("nutrition-basics", &completion).await.unwrap();
        completion.score = 100;
        completion.correct = 2;
        tracker.record_quiz_score("nutrition-basics", &completion).await.unwrap();

        let rows = store.rows(QUIZ_RESULTS);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["score"], json!(100));
        assert_eq!(rows[0]["student_id"], json!(identity.id.to_string()));
    }

    #[tokio::test]
    async fn test_requires_session() {
        let (store, session, _) = setup();
        session.sign_out();
        let tracker = ProgressTracker::new(store, session);

        let err = tracker.mark_completed("n1", ContentType::Text).await.unwrap_err();
        assert!(matches!(err, AppError::NotSignedIn));
    }
}
