//! Non-durable leaderboard backend

use parking_lot::Mutex;

use super::{LeaderboardStore, Standings, StoreError};

/// Keeps the last saved standings in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    saved: Mutex<Standings>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing standings
    #[cfg(test)]
    pub fn with_standings(standings: Standings) -> Self {
        Self {
            saved: Mutex::new(standings),
        }
    }
}

impl LeaderboardStore for MemoryStore {
    fn load(&self) -> Result<Standings, StoreError> {
        Ok(self.saved.lock().clone())
    }

    fn save(&self, standings: &Standings) -> Result<(), StoreError> {
        *self.saved.lock() = standings.clone();
        Ok(())
    }
}
