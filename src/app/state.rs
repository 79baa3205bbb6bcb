//! Application state shared across routes

use std::sync::Arc;

use tracing::info;

use crate::config::Config;
use crate::game::{Arena, ArenaHandle, World};
use crate::store::{JsonFileStore, Leaderboard, LeaderboardStore, MemoryStore};
use crate::ws::SessionRegistry;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub leaderboard: Arc<Leaderboard>,
    pub sessions: Arc<SessionRegistry>,
    pub arena: ArenaHandle,
}

impl AppState {
    /// Build the shared state and the arena it talks to.
    ///
    /// The caller spawns the returned [`Arena`].
    pub fn new(config: Config) -> (Self, Arena) {
        let config = Arc::new(config);

        // Initialize leaderboard persistence
        let store: Box<dyn LeaderboardStore> = match &config.leaderboard_path {
            Some(path) => {
                let store = JsonFileStore::new(path.clone());
                info!(path = %store.path().display(), "Leaderboard stored on disk");
                Box::new(store)
            }
            None => {
                info!("Leaderboard kept in memory only");
                Box::new(MemoryStore::new())
            }
        };
        let leaderboard = Leaderboard::open(store);

        // Initialize the world
        let seed = config.world_seed.unwrap_or_else(rand::random);
        info!(seed, "World seeded");
        let world = World::new(config.world.clone(), seed, leaderboard.clone());

        let sessions = Arc::new(SessionRegistry::new());
        let (arena, handle) = Arena::new(world, sessions.clone());

        let state = Self {
            config,
            leaderboard,
            sessions,
            arena: handle,
        };

        (state, arena)
    }
}
