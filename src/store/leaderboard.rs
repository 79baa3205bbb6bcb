//! Cross-round win counts keyed by display name

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{error, info, warn};

use super::{LeaderboardStore, Standings};

/// In-memory standings backed by a persistent store
pub struct Leaderboard {
    standings: RwLock<Standings>,
    store: Box<dyn LeaderboardStore>,
}

impl Leaderboard {
    /// Load standings from the store, starting empty if that fails
    pub fn open(store: Box<dyn LeaderboardStore>) -> Arc<Self> {
        let standings = match store.load() {
            Ok(standings) => {
                info!(entries = standings.len(), "Leaderboard loaded");
                standings
            }
            Err(e) => {
                warn!(error = %e, "Failed to load leaderboard, starting empty");
                Standings::new()
            }
        };

        Arc::new(Self {
            standings: RwLock::new(standings),
            store,
        })
    }

    /// Copy of the current standings
    pub fn snapshot(&self) -> Standings {
        self.standings.read().clone()
    }

    #[cfg(test)]
    pub fn wins(&self, name: &str) -> u32 {
        self.standings.read().get(name).copied().unwrap_or(0)
    }

    /// Credit one round win to `name` and persist. Returns the new total.
    ///
    /// A failed save is logged; the in-memory count is kept either way.
    pub fn record_win(&self, name: &str) -> u32 {
        let mut standings = self.standings.write();
        let wins = standings.entry(name.to_string()).or_insert(0);
        *wins += 1;
        let total = *wins;

        if let Err(e) = self.store.save(&standings) {
            error!(name, error = %e, "Failed to save leaderboard");
        }

        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, StoreError};

    struct BrokenStore;

    impl LeaderboardStore for BrokenStore {
        fn load(&self) -> Result<Standings, StoreError> {
            Err(StoreError::Io(std::io::Error::other("disk on fire")))
        }

        fn save(&self, _standings: &Standings) -> Result<(), StoreError> {
            Err(StoreError::Io(std::io::Error::other("disk on fire")))
        }
    }

    #[test]
    fn loads_existing_standings() {
        let mut existing = Standings::new();
        existing.insert("Alice".to_string(), 4);
        let board = Leaderboard::open(Box::new(MemoryStore::with_standings(existing)));
        assert_eq!(board.wins("Alice"), 4);
        assert_eq!(board.wins("Nobody"), 0);
    }

    #[test]
    fn record_win_increments_from_zero() {
        let board = Leaderboard::open(Box::new(MemoryStore::new()));
        assert_eq!(board.record_win("Bob"), 1);
        assert_eq!(board.record_win("Bob"), 2);
        assert_eq!(board.snapshot().get("Bob"), Some(&2));
    }

    #[test]
    fn failing_store_degrades_to_memory() {
        let board = Leaderboard::open(Box::new(BrokenStore));
        assert!(board.snapshot().is_empty());
        assert_eq!(board.record_win("Carol"), 1);
        assert_eq!(board.wins("Carol"), 1);
    }
}
