//! Live practice sessions held by the HTTP layer
//!
//! Sessions idle longer than the TTL are dropped on every insert and by the
//! periodic sweep started in `main`. When the map is full the least recently
//! used session makes room for the new one.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::session::Session;

pub const DEFAULT_SESSION_IDLE_TTL: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_MAX_SESSIONS: usize = 1000;

struct Entry {
    session: Arc<Mutex<Session>>,
    last_used: Instant,
}

pub struct SessionRegistry {
    entries: RwLock<HashMap<Uuid, Entry>>,
    idle_ttl: Duration,
    max_sessions: usize,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_IDLE_TTL, DEFAULT_MAX_SESSIONS)
    }
}

impl SessionRegistry {
    /// `max_sessions` of 0 is treated as 1
    pub fn new(idle_ttl: Duration, max_sessions: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            idle_ttl,
            max_sessions: max_sessions.max(1),
        }
    }

    pub fn idle_ttl(&self) -> Duration {
        self.idle_ttl
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Register a new session, making room if needed
    pub async fn insert(&self, session: Session) -> Arc<Mutex<Session>> {
        let id = session.id;
        let session = Arc::new(Mutex::new(session));
        let now = Instant::now();

        let mut entries = self.entries.write().await;
        let expired = remove_idle(&mut entries, now, self.idle_ttl);

        let mut evicted = 0;
        while entries.len() >= self.max_sessions {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(id, _)| *id);
            match oldest {
                Some(oldest) => {
                    entries.remove(&oldest);
                    evicted += 1;
                }
                None => break,
            }
        }

        if expired + evicted > 0 {
            tracing::debug!(expired, evicted, live = entries.len(), "Sessions dropped");
        }

        entries.insert(
            id,
            Entry {
                session: Arc::clone(&session),
                last_used: now,
            },
        );
        session
    }

    /// Look up a session and mark it used. Idle sessions are gone even before
    /// the sweep reaches them.
    pub async fn get(&self, id: &Uuid) -> Option<Arc<Mutex<Session>>> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;

        let expired = entries
            .get(id)
            .map(|entry| now.saturating_duration_since(entry.last_used) > self.idle_ttl)?;
        if expired {
            entries.remove(id);
            return None;
        }

        entries.get_mut(id).map(|entry| {
            entry.last_used = now;
            Arc::clone(&entry.session)
        })
    }

    /// Drop every idle session; returns how many went
    pub async fn evict_idle(&self) -> usize {
        let mut entries = self.entries.write().await;
        remove_idle(&mut entries, Instant::now(), self.idle_ttl)
    }

    /// Periodic [`evict_idle`](Self::evict_idle) until the runtime shuts down
    pub fn spawn_sweeper(self: Arc<Self>, period: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                let removed = self.evict_idle().await;
                if removed > 0 {
                    tracing::info!(removed, "Idle sessions evicted");
                }
            }
        })
    }
}

fn remove_idle(entries: &mut HashMap<Uuid, Entry>, now: Instant, idle_ttl: Duration) -> usize {
    let before = entries.len();
    entries.retain(|_, entry| now.saturating_duration_since(entry.last_used) <= idle_ttl);
    before - entries.len()
}
