use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::chat::session::{ChatSession, ChatSettings};

pub type SharedSession = Arc<Mutex<ChatSession>>;

/// Registry of live chat sessions, keyed by session id.
///
/// The map lock is only held for lookup and insert; each session has its own
/// async mutex, so a slow model call in one session never blocks another.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, SharedSession>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, settings: &ChatSettings) -> Uuid {
        let session = ChatSession::new(settings);
        let id = session.id;
        self.write().insert(id, Arc::new(Mutex::new(session)));
        info!(session_id = %id, "Chat session created");
        id
    }

    pub fn get(&self, id: Uuid) -> Option<SharedSession> {
        self.read().get(&id).cloned()
    }

    pub fn remove(&self, id: Uuid) -> bool {
        let removed = self.write().remove(&id).is_some();
        if removed {
            info!(session_id = %id, "Chat session removed");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    // A poisoned lock only means another handler panicked mid-insert; the map itself is intact.
    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<Uuid, SharedSession>> {
        self.sessions.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<Uuid, SharedSession>> {
        self.sessions.write().unwrap_or_else(|e| e.into_inner())
    }
}
