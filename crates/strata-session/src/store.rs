use crate::error::{Result, SessionError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};
use strata_core::Context;

/// Backend storage for sessions
#[async_trait]
pub trait Store<Id, V>: Send + Sync + 'static {
    /// Look up the session identified by `id`
    ///
    /// Returns `Ok(None)` if there is no such session. Lookups performing I/O
    /// should honour the deadline of `cx`.
    async fn fetch(&self, cx: &Context, id: &Id) -> Result<Option<V>>;
}

#[async_trait]
impl<Id, V, S> Store<Id, V> for Arc<S>
where
    Id: Sync + 'static,
    V: 'static,
    S: Store<Id, V> + ?Sized,
{
    async fn fetch(&self, cx: &Context, id: &Id) -> Result<Option<V>> {
        (**self).fetch(cx, id).await
    }
}

/// In-memory session store (not persistent, for testing/dev)
#[derive(Debug)]
pub struct MemoryStore<Id, V> {
    sessions: Arc<Mutex<HashMap<Id, V>>>,
}

impl<Id, V> Clone for MemoryStore<Id, V> {
    fn clone(&self) -> Self {
        Self {
            sessions: self.sessions.clone(),
        }
    }
}

impl<Id, V> Default for MemoryStore<Id, V> {
    fn default() -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<Id: Eq + Hash, V> MemoryStore<Id, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `id`, returning the previous session if any
    pub fn insert(&self, id: Id, value: V) -> Result<Option<V>> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|_| SessionError::store("lock poisoned"))?;
        Ok(sessions.insert(id, value))
    }

    /// Remove the session stored under `id`
    pub fn remove(&self, id: &Id) -> Result<Option<V>> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|_| SessionError::store("lock poisoned"))?;
        Ok(sessions.remove(id))
    }

    /// Number of stored sessions, still readable after a poisoned lock
    pub fn len(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl<Id, V> Store<Id, V> for MemoryStore<Id, V>
where
    Id: Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    async fn fetch(&self, _cx: &Context, id: &Id) -> Result<Option<V>> {
        let sessions = self
            .sessions
            .lock()
            .map_err(|_| SessionError::store("lock poisoned"))?;
        Ok(sessions.get(id).cloned())
    }
}
