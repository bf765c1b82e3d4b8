use lru::LruCache;
use sift_llm::Conversation;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::SearchSession;

/// Configuration for the session manager
#[derive(Clone, Debug, Default)]
pub struct SessionManagerConfig {
    /// Maximum number of stored sessions, least recently used evicted first (None = unlimited)
    pub max_sessions: Option<usize>,
    /// Drop sessions idle for longer than this (None = keep for the process lifetime)
    pub idle_ttl: Option<Duration>,
}

struct Entry {
    session: Arc<SearchSession>,
    last_used: Instant,
}

/// Session manager - maps session ids to live conversations
/// Constructed once at startup and shared through the server state
pub struct SessionManager {
    sessions: Mutex<LruCache<String, Entry>>,
    idle_ttl: Option<Duration>,
}

impl SessionManager {
    pub fn new(config: SessionManagerConfig) -> Self {
        let sessions = match config.max_sessions.and_then(NonZeroUsize::new) {
            Some(cap) => LruCache::new(cap),
            None => LruCache::unbounded(),
        };

        Self {
            sessions: Mutex::new(sessions),
            idle_ttl: config.idle_ttl,
        }
    }

    /// Wrap a fresh conversation in a session with a new random id
    /// The session is not stored until `insert` is called
    pub fn new_session(&self, conversation: Box<dyn Conversation>) -> SearchSession {
        SearchSession::new(Uuid::new_v4().to_string(), conversation)
    }

    /// Store a session, evicting expired and least recently used ones as needed
    pub async fn insert(&self, http_request_id: &str, session: SearchSession) -> Arc<SearchSession> {
        let session = Arc::new(session);
        let mut sessions = self.sessions.lock().await;

        self.prune_expired(http_request_id, &mut sessions);

        let entry = Entry {
            session: session.clone(),
            last_used: Instant::now(),
        };
        if let Some((evicted, _)) = sessions.push(session.session_id.clone(), entry) {
            if evicted != session.session_id {
                warn!("[{}] - [{}] Session store full, evicted least recently used session", http_request_id, evicted);
            }
        }

        info!("[{}] - [{}] Session stored ({} active)", http_request_id, session.session_id, sessions.len());
        session
    }

    /// Look up a session, refreshing its position and idle timer
    pub async fn get_session(&self, http_request_id: &str, session_id: &str) -> Option<Arc<SearchSession>> {
        let mut sessions = self.sessions.lock().await;

        let expired = match sessions.get_mut(session_id) {
            Some(entry) if self.is_expired(entry) => true,
            Some(entry) => {
                entry.last_used = Instant::now();
                debug!("[{}] - [{}] Using existing session", http_request_id, session_id);
                return Some(entry.session.clone());
            }
            None => false,
        };

        if expired {
            sessions.pop(session_id);
            info!("[{}] - [{}] Session expired", http_request_id, session_id);
        }
        None
    }

    /// Get the number of stored sessions that have not expired
    pub async fn session_count(&self) -> usize {
        let sessions = self.sessions.lock().await;
        sessions.iter().filter(|(_, entry)| !self.is_expired(entry)).count()
    }

    fn is_expired(&self, entry: &Entry) -> bool {
        self.idle_ttl
            .is_some_and(|ttl| entry.last_used.elapsed() > ttl)
    }

    // LRU order matches last_used order, so expired entries sit at the tail
    fn prune_expired(&self, http_request_id: &str, sessions: &mut LruCache<String, Entry>) {
        while let Some((_, entry)) = sessions.peek_lru() {
            if !self.is_expired(entry) {
                break;
            }
            if let Some((session_id, _)) = sessions.pop_lru() {
                debug!("[{}] - [{}] Session expired", http_request_id, session_id);
            }
        }
    }
}
