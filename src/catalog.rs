//! Topic listing and lesson lookup over `course_content` and `assignments`.

use futures_util::future::{try_join, try_join_all};
use serde::Deserialize;

use crate::error::AppError;
use crate::models::{Assignment, ContentType, Lesson};
use crate::query::QueryRequest;
use crate::store::{decode_records, RecordStore};

pub const DEFAULT_TOPIC_LIMIT: usize = 10;
const FEATURED_COUNT: usize = 2;

const KNOWN_TOPICS: [(&str, &str, &str); 6] = [
    (
        "nutrition",
        "Nutrition & Healthy Eating",
        "Learn about balanced diets, nutrients, and making healthy food choices.",
    ),
    (
        "physical-activity",
        "Physical Activity & Fitness",
        "Discover the importance of exercise, different types of physical activities, and fitness tips.",
    ),
    (
        "mental-health",
        "Mental Health & Wellbeing",
        "Explore mental health topics, stress management, and emotional wellbeing strategies.",
    ),
    (
        "personal-hygiene",
        "Personal Hygiene",
        "Learn about proper hygiene practices, disease prevention, and staying healthy.",
    ),
    (
        "first-aid",
        "First Aid & Safety",
        "Basic first aid knowledge, emergency responses, and safety precautions.",
    ),
    (
        "health-literacy",
        "Health Literacy",
        "Understanding health information, making informed health decisions, and navigating health systems.",
    ),
];

const GENERIC_DESCRIPTION: &str = "Explore this health education topic to learn more.";

/// Display title and blurb for a topic id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicInfo {
    pub title: String,
    pub description: String,
}

impl TopicInfo {
    pub fn for_id(topic_id: &str) -> Self {
        match KNOWN_TOPICS.iter().find(|(id, _, _)| *id == topic_id) {
            Some((_, title, description)) => Self {
                title: title.to_string(),
                description: description.to_string(),
            },
            None => Self {
                title: title_case(topic_id),
                description: GENERIC_DESCRIPTION.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSummary {
    pub id: String,
    pub title: String,
    pub description: String,
    pub lessons: usize,
    pub quizzes: usize,
}

#[derive(Deserialize)]
struct TopicRow {
    topic_id: String,
}

/// Distinct topics found in `course_content`, each with its lesson and quiz
/// counts. Topics are ordered by id; `limit` caps the rows scanned.
pub async fn list_topics(
    store: &dyn RecordStore,
    limit: usize,
) -> Result<Vec<TopicSummary>, AppError> {
    let request = QueryRequest::new("course_content")?
        .columns(["topic_id"])
        .order_by("topic_id", true)
        .limit(limit);

    let rows: Vec<TopicRow> = decode_records(store.select(&request).await?)?;
    let mut ids: Vec<String> = Vec::new();
    for row in rows {
        if !ids.contains(&row.topic_id) {
            ids.push(row.topic_id);
        }
    }

    try_join_all(ids.into_iter().map(|id| topic_summary(store, id))).await
}

async fn topic_summary(store: &dyn RecordStore, id: String) -> Result<TopicSummary, AppError> {
    let lessons = QueryRequest::new("course_content")?
        .columns(["id", "content_type"])
        .eq("topic_id", id.as_str());
    let quizzes = QueryRequest::new("assignments")?
        .columns(["id"])
        .ilike("title", format!("%{}%", id));

    let (lessons, quizzes) = try_join(store.select(&lessons), store.select(&quizzes)).await?;
    let info = TopicInfo::for_id(&id);

    Ok(TopicSummary {
        id,
        title: info.title,
        description: info.description,
        lessons: lessons.len(),
        quizzes: quizzes.len(),
    })
}

/// The most recently added lessons.
pub async fn featured_content(store: &dyn RecordStore) -> Result<Vec<Lesson>, AppError> {
    let request = QueryRequest::new("course_content")?
        .order_by("created_at", false)
        .limit(FEATURED_COUNT);
    Ok(decode_records(store.select(&request).await?)?)
}

/// Read for the lessons of one topic, oldest first.
pub fn topic_lessons_request(topic_id: &str) -> Result<QueryRequest, AppError> {
    Ok(QueryRequest::new("course_content")?
        .eq("topic_id", topic_id)
        .order_by("created_at", true))
}

/// Quizzes whose title mentions the topic.
pub async fn topic_quizzes(
    store: &dyn RecordStore,
    topic_id: &str,
) -> Result<Vec<Assignment>, AppError> {
    let request = QueryRequest::new("assignments")?
        .ilike("title", format!("%{}%", topic_id));
    Ok(decode_records(store.select(&request).await?)?)
}

/// Lessons matching the learner's preferred presentation.
pub fn lessons_for(lessons: &[Lesson], preference: ContentType) -> Vec<&Lesson> {
    lessons
        .iter()
        .filter(|lesson| lesson.content_type == preference)
        .collect()
}

fn title_case(topic_id: &str) -> String {
    topic_id
        .split('-')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
