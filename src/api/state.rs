use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::dispatch::Dispatch;

/// Open WebSocket session
#[derive(Debug)]
pub struct ConnectedSession {
    pub connected_at: Instant,
}

/// Shared state of the connection manager
pub struct AppState {
    /// Open sessions: session_id -> session info
    pub sessions: DashMap<String, ConnectedSession>,

    /// Queue into the tree-owning dispatch thread
    pub dispatch: Arc<Dispatch>,

    /// Total sessions accepted since start
    connection_count: AtomicUsize,
}

impl AppState {
    pub fn new(dispatch: Arc<Dispatch>) -> Self {
        Self {
            sessions: DashMap::new(),
            dispatch,
            connection_count: AtomicUsize::new(0),
        }
    }

    pub fn session_opened(&self, session_id: &str) {
        self.sessions.insert(
            session_id.to_string(),
            ConnectedSession {
                connected_at: Instant::now(),
            },
        );
        let count = self.connection_count.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!(
            "Session {} opened (total: {}, active: {})",
            session_id,
            count,
            self.sessions.len()
        );
    }

    pub fn session_closed(&self, session_id: &str) {
        if let Some((_, session)) = self.sessions.remove(session_id) {
            tracing::debug!(
                "Session {} closed after {:?} (active: {})",
                session_id,
                session.connected_at.elapsed(),
                self.sessions.len()
            );
        }
    }

    pub fn active_session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn total_session_count(&self) -> usize {
        self.connection_count.load(Ordering::Relaxed)
    }
}
