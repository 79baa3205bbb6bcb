//! Leaderboard persistence

pub mod file;
pub mod leaderboard;
pub mod memory;

use std::collections::BTreeMap;

pub use file::JsonFileStore;
pub use leaderboard::Leaderboard;
pub use memory::MemoryStore;

/// Display name -> round wins
pub type Standings = BTreeMap<String, u32>;

/// Durable home of the standings
pub trait LeaderboardStore: Send + Sync {
    fn load(&self) -> Result<Standings, StoreError>;
    fn save(&self, standings: &Standings) -> Result<(), StoreError>;
}

/// Store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed leaderboard data: {0}")]
    Parse(#[from] serde_json::Error),
}
