//! Registry of connected sessions for to-one-client messages

use dashmap::DashMap;
use tokio::sync::mpsc;

use crate::game::PlayerId;
use crate::ws::protocol::ServerMsg;

/// Direct messages a session may have queued before it is considered stuck
const DIRECT_BUFFER: usize = 32;

/// Live sessions by player id.
///
/// World-wide events travel over the arena broadcast; this only carries what a
/// single client must see, such as its `init`.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<PlayerId, mpsc::Sender<ServerMsg>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session and return its direct inbox
    pub fn register(&self, player_id: PlayerId) -> mpsc::Receiver<ServerMsg> {
        let (tx, rx) = mpsc::channel(DIRECT_BUFFER);
        self.sessions.insert(player_id, tx);
        rx
    }

    pub fn unregister(&self, player_id: &str) {
        self.sessions.remove(player_id);
    }

    /// Queue a message without waiting; false when the session is gone or full
    pub fn send_to(&self, player_id: &str, msg: ServerMsg) -> bool {
        match self.sessions.get(player_id) {
            Some(tx) => tx.try_send(msg).is_ok(),
            None => false,
        }
    }

    /// Number of open connections
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
