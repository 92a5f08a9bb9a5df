use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{QueryRequest, QueryState};
use crate::auth::SessionProvider;
use crate::store::{Record, RecordStore, StoreError};

/// Everything a fetch depends on. A new attempt starts whenever this changes.
#[derive(Debug, Clone, PartialEq)]
struct FetchKey {
    request: QueryRequest,
    identity: Option<Uuid>,
    dependencies: Vec<Value>,
}

struct Inputs {
    request: QueryRequest,
    dependencies: Vec<Value>,
    /// Key observed by the last `sync`, whether or not it fetched.
    seen: Option<FetchKey>,
    /// Tag of the most recently issued attempt.
    latest_attempt: u64,
}

struct Shared<T> {
    inputs: Mutex<Inputs>,
    state: watch::Sender<QueryState<T>>,
}

impl<T> Shared<T> {
    fn inputs(&self) -> MutexGuard<'_, Inputs> {
        self.inputs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publish the outcome of attempt `tag` unless a newer one was issued.
    fn resolve(&self, tag: u64, outcome: QueryState<T>) -> bool {
        let inputs = self.inputs();
        if inputs.latest_attempt != tag {
            debug!(
                attempt = tag,
                latest = inputs.latest_attempt,
                "discarding stale fetch result"
            );
            return false;
        }
        self.state.send_replace(outcome);
        true
    }
}

/// Keeps a [`QueryState`] in step with a request against the record store.
pub struct QueryFetcher<T> {
    store: Arc<dyn RecordStore>,
    session: SessionProvider,
    shared: Arc<Shared<T>>,
}

impl<T> Clone for QueryFetcher<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            session: self.session.clone(),
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> QueryFetcher<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    /// Create a fetcher in the `Loading` state. Nothing is read until
    /// [`sync`](Self::sync) is called.
    pub fn new(store: Arc<dyn RecordStore>, session: SessionProvider, request: QueryRequest) -> Self {
        let (state, _) = watch::channel(QueryState::Loading);
        Self {
            store,
            session,
            shared: Arc::new(Shared {
                inputs: Mutex::new(Inputs {
                    request,
                    dependencies: Vec::new(),
                    seen: None,
                    latest_attempt: 0,
                }),
                state,
            }),
        }
    }

    pub fn state(&self) -> QueryState<T>
    where
        T: Clone,
    {
        self.shared.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<QueryState<T>> {
        self.shared.state.subscribe()
    }

    pub fn request(&self) -> QueryRequest {
        self.shared.inputs().request.clone()
    }

    /// Replace the request and re-fetch if it differs from the last one.
    pub fn set_request(&self, request: QueryRequest) -> Option<JoinHandle<()>> {
        self.shared.inputs().request = request;
        self.sync()
    }

    /// Replace the extra dependencies and re-fetch if they changed.
    pub fn set_dependencies<I, V>(&self, dependencies: I) -> Option<JoinHandle<()>>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.shared.inputs().dependencies = dependencies.into_iter().map(Into::into).collect();
        self.sync()
    }

    /// Start an attempt if any input changed since the last call.
    ///
    /// Returns the handle of the spawned attempt, or `None` if nothing
    /// changed or nobody is signed in.
    pub fn sync(&self) -> Option<JoinHandle<()>> {
        let key = self.current_key();
        {
            let mut inputs = self.shared.inputs();
            if inputs.seen.as_ref() == Some(&key) {
                return None;
            }
            inputs.seen = Some(key.clone());
        }
        self.start_attempt(key)
    }

    /// Start a new attempt even if no input changed.
    pub fn refetch(&self) -> Option<JoinHandle<()>> {
        let key = self.current_key();
        self.shared.inputs().seen = Some(key.clone());
        self.start_attempt(key)
    }

    /// Re-sync whenever the session identity changes. The task holds a
    /// handle to the session, so it runs until aborted.
    pub fn follow_session(&self) -> JoinHandle<()> {
        let fetcher = self.clone();
        let mut changes = self.session.subscribe();
        tokio::spawn(async move {
            while changes.changed().await.is_ok() {
                fetcher.sync();
            }
        })
    }

    /// Wait until the current attempt resolves. Returns the current state
    /// right away when nobody is signed in, since no attempt will run.
    pub async fn settled(&self) -> QueryState<T>
    where
        T: Clone,
    {
        if self.session.current().is_none() {
            return self.state();
        }
        let mut rx = self.subscribe();
        match rx.wait_for(|state| !state.is_loading()).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        }
    }

    fn current_key(&self) -> FetchKey {
        let identity = self.session.current().map(|identity| identity.id);
        let inputs = self.shared.inputs();
        FetchKey {
            request: inputs.request.clone(),
            identity,
            dependencies: inputs.dependencies.clone(),
        }
    }

    fn start_attempt(&self, key: FetchKey) -> Option<JoinHandle<()>> {
        if key.identity.is_none() {
            // Retire any read issued for the previous identity; the published
            // state stays as it was.
            self.shared.inputs().latest_attempt += 1;
            debug!(collection = key.request.collection(), "no session, skipping fetch");
            return None;
        }

        let tag = {
            let mut inputs = self.shared.inputs();
            inputs.latest_attempt += 1;
            self.shared.state.send_replace(QueryState::Loading);
            inputs.latest_attempt
        };
        debug!(collection = key.request.collection(), attempt = tag, "starting fetch");

        let store = Arc::clone(&self.store);
        let shared = Arc::clone(&self.shared);
        let request = key.request;

        Some(tokio::spawn(async move {
            let outcome = match store.select(&request).await {
                Ok(rows) => decode_rows(request.collection(), rows),
                Err(err) => {
                    warn!(collection = request.collection(), error = %err, "fetch failed");
                    QueryState::Error(error_message(request.collection(), &err))
                }
            };
            shared.resolve(tag, outcome);
        }))
    }
}

fn decode_rows<T: DeserializeOwned>(collection: &str, rows: Vec<Record>) -> QueryState<T> {
    let decoded: Result<Vec<T>, _> = rows
        .into_iter()
        .map(|row| serde_json::from_value(Value::Object(row)))
        .collect();

    match decoded {
        Ok(rows) => QueryState::Success(rows),
        Err(err) => {
            warn!(collection, error = %err, "could not decode fetched rows");
            QueryState::Error(format!("could not decode records from {}: {}", collection, err))
        }
    }
}

fn error_message(collection: &str, err: &StoreError) -> String {
    match err {
        StoreError::Rejected { message, .. } if message.trim().is_empty() => {
            format!("Failed to load data from {}", collection)
        }
        other => other.to_string(),
    }
}
