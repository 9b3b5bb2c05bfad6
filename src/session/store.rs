//! Session store — per-user state with atomic read-modify-write.
//!
//! Storage is pluggable through [`SessionBackend`]; the store itself owns
//! the per-user critical sections so a backend only needs plain get/put.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use super::model::{Session, UserId};

/// Keyed storage for sessions.
#[async_trait]
pub trait SessionBackend: Send + Sync {
    /// Load the stored session for a user, if any.
    async fn load(&self, user_id: &UserId) -> Option<Session>;

    /// Replace the stored session for a user.
    async fn save(&self, user_id: &UserId, session: Session);

    /// Forget a user entirely.
    async fn remove(&self, user_id: &UserId);
}

/// Process-local backend. Entries live as long as the process.
#[derive(Default)]
pub struct InMemorySessionBackend {
    sessions: RwLock<HashMap<UserId, Session>>,
}

impl InMemorySessionBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of users with a stored session.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionBackend for InMemorySessionBackend {
    async fn load(&self, user_id: &UserId) -> Option<Session> {
        self.sessions.read().await.get(user_id).cloned()
    }

    async fn save(&self, user_id: &UserId, session: Session) {
        self.sessions.write().await.insert(user_id.clone(), session);
    }

    async fn remove(&self, user_id: &UserId) {
        self.sessions.write().await.remove(user_id);
    }
}

/// Session store with lazy creation and per-user serialized updates.
///
/// Updates for the same user run one at a time; updates for different
/// users never wait on each other beyond the brief lock-table lookup.
pub struct SessionStore {
    backend: Arc<dyn SessionBackend>,
    locks: Mutex<HashMap<UserId, Arc<Mutex<()>>>>,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn SessionBackend>) -> Self {
        Self {
            backend,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Store backed by [`InMemorySessionBackend`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemorySessionBackend::new()))
    }

    async fn user_lock(&self, user_id: &UserId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        Arc::clone(locks.entry(user_id.clone()).or_default())
    }

    /// Get a user's session, creating a default one on first access.
    pub async fn get(&self, user_id: &UserId) -> Session {
        let lock = self.user_lock(user_id).await;
        let _guard = lock.lock().await;
        self.load_or_create(user_id).await
    }

    async fn load_or_create(&self, user_id: &UserId) -> Session {
        match self.backend.load(user_id).await {
            Some(session) => session,
            None => {
                debug!(user_id = %user_id, "Creating session");
                let session = Session::default();
                self.backend.save(user_id, session.clone()).await;
                session
            }
        }
    }

    /// Apply a state transition to a user's session.
    ///
    /// `transition` receives the current session (created if absent) and
    /// returns the replacement plus an arbitrary result. The read, the
    /// transition, and the write happen inside the user's critical section.
    pub async fn update<T, F>(&self, user_id: &UserId, transition: F) -> T
    where
        F: FnOnce(Session) -> (Session, T),
    {
        let lock = self.user_lock(user_id).await;
        let _guard = lock.lock().await;
        let current = self.load_or_create(user_id).await;
        let (next, result) = transition(current);
        self.backend.save(user_id, next).await;
        result
    }

    /// Discard a user's session. The next access starts from defaults.
    pub async fn reset(&self, user_id: &UserId) {
        let lock = self.user_lock(user_id).await;
        let _guard = lock.lock().await;
        self.backend.remove(user_id).await;
        debug!(user_id = %user_id, "Session reset");
    }
}
