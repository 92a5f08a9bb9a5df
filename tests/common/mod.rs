use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use health_learn::auth::{Identity, SessionProvider};
use health_learn::models::Role;
use health_learn::query::QueryRequest;
use health_learn::store::{Record, RecordStore, StoreError};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

type Reply = Result<Vec<Record>, StoreError>;

/// A read held open until the test answers it.
pub struct Pending {
    pub request: QueryRequest,
    reply: oneshot::Sender<Reply>,
}

impl Pending {
    pub fn respond(self, rows: Vec<Value>) {
        let rows = rows
            .into_iter()
            .filter_map(|row| row.as_object().cloned())
            .collect();
        let _ = self.reply.send(Ok(rows));
    }

    pub fn fail(self, err: StoreError) {
        let _ = self.reply.send(Err(err));
    }
}

/// Store whose reads resolve only when the test says so, in any order.
pub struct GatedStore {
    calls: AtomicUsize,
    pending: mpsc::UnboundedSender<Pending>,
}

impl GatedStore {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<Pending>) {
        let (pending, rx) = mpsc::unbounded_channel();
        let store = Self {
            calls: AtomicUsize::new(0),
            pending,
        };
        (Arc::new(store), rx)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordStore for GatedStore {
    async fn select(&self, request: &QueryRequest) -> Result<Vec<Record>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let (reply, rx) = oneshot::channel();
        let _ = self.pending.send(Pending {
            request: request.clone(),
            reply,
        });
        rx.await
            .unwrap_or_else(|_| Err(StoreError::Transport("reply dropped".into())))
    }

    async fn upsert(
        &self,
        _collection: &str,
        _conflict_keys: &[&str],
        _record: Record,
    ) -> Result<(), StoreError> {
        Ok(())
    }
}

pub fn student() -> Identity {
    Identity::new(Uuid::new_v4(), Role::Student)
}

pub fn signed_in() -> SessionProvider {
    SessionProvider::signed_in(student())
}
