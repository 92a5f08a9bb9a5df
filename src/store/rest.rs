//! PostgREST-backed record store.
//!
//! Requests become PostgREST query parameters (`select=`, `col=eq.value`,
//! `order=col.asc`, `limit=`), handed to ureq for encoding. ureq is
//! blocking, so every call runs on the blocking pool.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{Record, RecordStore, StoreError};
use crate::query::{Filter, QueryRequest};

/// Error body returned by PostgREST.
#[derive(Debug, Deserialize)]
struct ApiError {
    code: Option<String>,
    message: Option<String>,
}

#[derive(Clone)]
pub struct RestStore {
    base_url: String,
    api_key: String,
    access_token: Option<String>,
    agent: ureq::Agent,
}

impl RestStore {
    /// `base_url` is the project URL; tables live under `/rest/v1/`.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build();

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            access_token: None,
            agent: config.into(),
        }
    }

    /// Authorize requests as a signed-in user instead of the anonymous key.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token.as_deref().unwrap_or(&self.api_key))
    }

    /// Endpoint of a table. Names are plain identifiers, so they go into the
    /// path as they are.
    fn table_url(&self, collection: &str) -> Result<String, StoreError> {
        let plain = collection
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !plain {
            return Err(StoreError::UnknownCollection(collection.to_string()));
        }
        Ok(format!("{}/rest/v1/{}", self.base_url, collection))
    }
}

/// PostgREST query parameters for a read. ureq percent-encodes them.
fn select_params(request: &QueryRequest) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), request.projection().to_select())];

    for (field, filter) in request.filters() {
        let condition = match filter {
            Filter::Eq(Value::Null) => "is.null".to_string(),
            Filter::Eq(value) => format!("eq.{}", plain_value(value)),
            Filter::ILike(pattern) => format!("ilike.{}", pattern.replace('%', "*")),
        };
        params.push((field.clone(), condition));
    }

    if let Some(order) = request.order() {
        let direction = if order.ascending { "asc" } else { "desc" };
        params.push(("order".to_string(), format!("{}.{}", order.column, direction)));
    }

    if let Some(limit) = request.row_limit() {
        params.push(("limit".to_string(), limit.to_string()));
    }

    params
}

#[async_trait]
impl RecordStore for RestStore {
    async fn select(&self, request: &QueryRequest) -> Result<Vec<Record>, StoreError> {
        let url = self.table_url(request.collection())?;
        let params = select_params(request);
        let store = self.clone();
        debug!(%url, ?params, "selecting from record store");

        tokio::task::spawn_blocking(move || {
            let response = store
                .agent
                .get(&url)
                .query_pairs(params.iter().map(|(k, v)| (k.as_str(), v.as_str())))
                .header("apikey", &store.api_key)
                .header("Authorization", &store.bearer())
                .header("Accept", "application/json")
                .call()
                .map_err(|e| StoreError::Transport(e.to_string()))?;

            let status = response.status();
            let body = response
                .into_body()
                .read_to_string()
                .map_err(|e| StoreError::Transport(e.to_string()))?;

            if !status.is_success() {
                return Err(rejection(status.as_u16(), &body));
            }

            serde_json::from_str::<Vec<Record>>(&body).map_err(|e| StoreError::Decode(e.to_string()))
        })
        .await
        .map_err(|e| StoreError::Transport(format!("task join error: {}", e)))?
    }

    async fn upsert(
        &self,
        collection: &str,
        conflict_keys: &[&str],
        record: Record,
    ) -> Result<(), StoreError> {
        let url = self.table_url(collection)?;
        let on_conflict = conflict_keys.join(",");
        let store = self.clone();
        debug!(%url, "upserting into record store");

        tokio::task::spawn_blocking(move || {
            let mut builder = store.agent.post(&url);
            if !on_conflict.is_empty() {
                builder = builder.query("on_conflict", &on_conflict);
            }
            let response = builder
                .header("apikey", &store.api_key)
                .header("Authorization", &store.bearer())
                .header("Prefer", "resolution=merge-duplicates,return=minimal")
                .send_json(&record)
                .map_err(|e| StoreError::Transport(e.to_string()))?;

            let status = response.status();
            if status.is_success() {
                return Ok(());
            }

            let body = response.into_body().read_to_string().unwrap_or_default();
            Err(rejection(status.as_u16(), &body))
        })
        .await
        .map_err(|e| StoreError::Transport(format!("task join error: {}", e)))?
    }
}

fn rejection(status: u16, body: &str) -> StoreError {
    let parsed = serde_json::from_str::<ApiError>(body).ok();
    let code = parsed
        .as_ref()
        .and_then(|e| e.code.clone())
        .unwrap_or_else(|| status.to_string());
    let message = parsed
        .and_then(|e| e.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("request failed with HTTP {}", status));

    StoreError::Rejected { code, message }
}

fn plain_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(params: &[(String, String)]) -> Vec<(&str, &str)> {
        params.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
    }

    #[test]
    fn test_select_params() {
        let request = QueryRequest::new("course_content")
            .unwrap()
            .columns(["id", "content_type"])
            .eq("topic_id", "first aid")
            .order_by("created_at", false)
            .limit(2);

        assert_eq!(
            pairs(&select_params(&request)),
            vec![
                ("select", "id,content_type"),
                ("topic_id", "eq.first aid"),
                ("order", "created_at.desc"),
                ("limit", "2"),
            ]
        );
    }

    #[test]
    fn test_select_params_ilike_null_and_booleans() {
        let request = QueryRequest::new("assignments")
            .unwrap()
            .ilike("title", "%nutrition%")
            .eq("published", true)
            .eq("archived_at", Value::Null);

        assert_eq!(
            pairs(&select_params(&request)),
            vec![
                ("select", "*"),
                ("archived_at", "is.null"),
                ("published", "eq.true"),
                ("title", "ilike.*nutrition*"),
            ]
        );
    }

    #[test]
    fn test_table_url() {
        let store = RestStore::new("https://example.supabase.co/", "anon");
        assert_eq!(
            store.table_url("student_progress").unwrap(),
            "https://example.supabase.co/rest/v1/student_progress"
        );
        assert_eq!(
            store.table_url("quiz_results?select=*"),
            Err(StoreError::UnknownCollection("quiz_results?select=*".to_string()))
        );
    }

    #[test]
    fn test_rejection_reads_postgrest_body() {
        let err = rejection(404, r#"{"code":"42P01","message":"relation does not exist"}"#);
        assert_eq!(
            err,
            StoreError::Rejected {
                code: "42P01".to_string(),
                message: "relation does not exist".to_string(),
            }
        );

        let err = rejection(502, "<html>bad gateway</html>");
        assert_eq!(err.to_string(), "request failed with HTTP 502 (code 502)");
    }

    #[test]
    fn test_bearer_prefers_access_token() {
        let store = RestStore::new("http://localhost", "anon");
        assert_eq!(store.bearer(), "Bearer anon");
        let store = store.with_access_token("jwt");
        assert_eq!(store.bearer(), "Bearer jwt");
    }
}
