//! Game simulation modules

pub mod arena;
pub mod bots;
pub mod combat;
pub mod commands;
pub mod engine;
pub mod geometry;
pub mod obstacles;
pub mod snapshot;
pub mod world;

pub use arena::{Arena, ArenaHandle, Outbound};
pub use world::{PlayerId, World};

use crate::ws::protocol::{ClientMsg, ServerMsg};

/// Input to the arena task
#[derive(Debug, Clone)]
pub enum GameCommand {
    /// A connection opened
    Join { player_id: PlayerId },
    /// A connection closed
    Leave { player_id: PlayerId },
    /// A parsed client message
    Client { player_id: PlayerId, msg: ClientMsg },
    /// Deferred respawn coming due
    Respawn { player_id: PlayerId },
}

/// Side effects produced by world mutations, carried out by the arena task
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Send to every connected client
    Broadcast(ServerMsg),
    /// Send to every connected client but one
    BroadcastExcept { except: PlayerId, msg: ServerMsg },
    /// Send to a single client
    Send { to: PlayerId, msg: ServerMsg },
    /// Bring a downed player back after the respawn delay
    ScheduleRespawn { player_id: PlayerId },
}
