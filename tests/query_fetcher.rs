mod common;

use common::{GatedStore, signed_in, student};
use health_learn::auth::SessionProvider;
use health_learn::query::{QueryFetcher, QueryRequest, QueryState};
use health_learn::store::StoreError;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct Lesson {
    id: String,
}

fn ids(state: &QueryState<Lesson>) -> Vec<String> {
    state
        .data()
        .map(|rows| rows.iter().map(|r| r.id.clone()).collect())
        .unwrap_or_default()
}

fn lessons() -> QueryRequest {
    QueryRequest::new("course_content").unwrap()
}

#[tokio::test]
async fn test_latest_attempt_wins_when_resolved_out_of_order() {
    let (store, mut pending) = GatedStore::new();
    let fetcher: QueryFetcher<Lesson> = QueryFetcher::new(store.clone(), signed_in(), lessons());

    let first = fetcher.sync().unwrap();
    let second = fetcher
        .set_request(lessons().eq("topic_id", "nutrition"))
        .unwrap();

    let first_read = pending.recv().await.unwrap();
    let second_read = pending.recv().await.unwrap();
    assert!(first_read.request.filters().is_empty());
    assert_eq!(second_read.request.filters().len(), 1);

    second_read.respond(vec![json!({"id": "n1"})]);
    second.await.unwrap();
    assert_eq!(ids(&fetcher.state()), vec!["n1"]);

    // The older read finishing late must not overwrite the newer result.
    first_read.respond(vec![json!({"id": "n1"}), json!({"id": "m1"})]);
    first.await.unwrap();
    assert_eq!(ids(&fetcher.state()), vec!["n1"]);
    assert_eq!(store.calls(), 2);
}

#[tokio::test]
async fn test_stale_error_is_discarded() {
    let (store, mut pending) = GatedStore::new();
    let fetcher: QueryFetcher<Lesson> = QueryFetcher::new(store, signed_in(), lessons());

    let first = fetcher.sync().unwrap();
    let second = fetcher.refetch().unwrap();
    let first_read = pending.recv().await.unwrap();
    let second_read = pending.recv().await.unwrap();

    first_read.fail(StoreError::Transport("timeout".into()));
    first.await.unwrap();
    assert!(fetcher.state().is_loading());

    second_read.respond(vec![json!({"id": "a"})]);
    second.await.unwrap();
    assert_eq!(ids(&fetcher.state()), vec!["a"]);
}

#[tokio::test]
async fn test_no_read_without_session() {
    let (store, _pending) = GatedStore::new();
    let fetcher: QueryFetcher<Lesson> =
        QueryFetcher::new(store.clone(), SessionProvider::new(), lessons());

    assert!(fetcher.sync().is_none());
    assert!(fetcher.refetch().is_none());
    assert!(fetcher.set_dependencies(["nutrition"]).is_none());
    assert_eq!(store.calls(), 0);
    assert!(fetcher.settled().await.is_loading());
}

#[tokio::test]
async fn test_follow_session_fetches_on_sign_in() {
    let (store, mut pending) = GatedStore::new();
    let session = SessionProvider::new();
    let fetcher: QueryFetcher<Lesson> = QueryFetcher::new(store.clone(), session.clone(), lessons());
    let follower = fetcher.follow_session();

    assert!(fetcher.sync().is_none());
    session.sign_in(student());
    pending.recv().await.unwrap().respond(vec![json!({"id": "a"})]);
    assert_eq!(ids(&fetcher.settled().await), vec!["a"]);

    // Signing out leaves the last result in place.
    session.sign_out();
    tokio::task::yield_now().await;
    assert_eq!(ids(&fetcher.state()), vec!["a"]);

    session.sign_in(student());
    pending.recv().await.unwrap().respond(vec![json!({"id": "b"})]);
    assert_eq!(ids(&fetcher.settled().await), vec!["b"]);
    assert_eq!(store.calls(), 2);

    follower.abort();
}

#[tokio::test]
async fn test_each_attempt_goes_through_loading() {
    let (store, mut pending) = GatedStore::new();
    let fetcher: QueryFetcher<Lesson> = QueryFetcher::new(store, signed_in(), lessons());
    let mut states = fetcher.subscribe();

    let handle = fetcher.sync().unwrap();
    let read = pending.recv().await.unwrap();
    assert!(states.borrow_and_update().is_loading());

    read.fail(StoreError::Rejected {
        code: "42501".into(),
        message: String::new(),
    });
    handle.await.unwrap();
    states.changed().await.unwrap();
    assert_eq!(
        states.borrow_and_update().error(),
        Some("Failed to load data from course_content")
    );

    let handle = fetcher.refetch().unwrap();
    assert!(fetcher.state().is_loading());
    pending.recv().await.unwrap().respond(vec![]);
    handle.await.unwrap();
    assert_eq!(fetcher.state(), QueryState::Success(vec![]));
}

#[tokio::test]
async fn test_sign_out_discards_read_in_flight() {
    let (store, mut pending) = GatedStore::new();
    let session = signed_in();
    let fetcher: QueryFetcher<Lesson> = QueryFetcher::new(store, session.clone(), lessons());

    let handle = fetcher.sync().unwrap();
    let read = pending.recv().await.unwrap();

    session.sign_out();
    assert!(fetcher.sync().is_none());

    read.respond(vec![json!({"id": "previous-learner-row"})]);
    handle.await.unwrap();
    assert!(fetcher.state().is_loading());
}
