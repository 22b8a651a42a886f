//! In-memory session registry

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;
use uuid::Uuid;

use super::SessionState;
use crate::pages::PageView;

/// State of one session plus the last view rendered for it
#[derive(Debug, Default)]
pub struct SessionEntry {
    pub state: SessionState,
    pub last_view: Option<PageView>,
}

#[derive(Debug)]
struct Slot {
    entry: Arc<Mutex<SessionEntry>>,
    last_access: Instant,
}

impl Slot {
    fn is_idle(&self, now: Instant, ttl: Duration) -> bool {
        now.duration_since(self.last_access) >= ttl
    }
}

/// Sessions keyed by id. Each entry sits behind its own mutex so commands for one
/// session are applied one at a time while other sessions proceed. Sessions not
/// touched within `idle_ttl` are dropped.
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Slot>>,
    idle_ttl: Duration,
}

impl SessionStore {
    #[must_use]
    pub fn new(idle_ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_ttl,
        }
    }

    pub async fn create(&self) -> (Uuid, Arc<Mutex<SessionEntry>>) {
        let id = Uuid::new_v4();
        let entry = Arc::new(Mutex::new(SessionEntry::default()));
        let now = Instant::now();

        let mut sessions = self.sessions.write().await;
        evict_idle(&mut sessions, now, self.idle_ttl);
        sessions.insert(
            id,
            Slot {
                entry: Arc::clone(&entry),
                last_access: now,
            },
        );
        debug!(%id, "Session created");
        (id, entry)
    }

    /// Looks up a live session and marks it as used
    pub async fn get(&self, id: Uuid) -> Option<Arc<Mutex<SessionEntry>>> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let slot = sessions.get_mut(&id)?;
        if slot.is_idle(now, self.idle_ttl) {
            sessions.remove(&id);
            debug!(%id, "Idle session expired");
            return None;
        }
        slot.last_access = now;
        Some(Arc::clone(&slot.entry))
    }

    /// Returns whether the session existed
    pub async fn remove(&self, id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&id).is_some();
        if removed {
            debug!(%id, "Session removed");
        }
        removed
    }

    /// Drops every idle session, returning how many were dropped
    pub async fn purge_idle(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        evict_idle(&mut sessions, Instant::now(), self.idle_ttl)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

fn evict_idle(sessions: &mut HashMap<Uuid, Slot>, now: Instant, ttl: Duration) -> usize {
    let before = sessions.len();
    sessions.retain(|_, slot| !slot.is_idle(now, ttl));
    let evicted = before - sessions.len();
    if evicted > 0 {
        debug!(evicted, "Idle sessions evicted");
    }
    evicted
}
