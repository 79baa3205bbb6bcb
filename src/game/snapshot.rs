//! Snapshot building for network transmission

use crate::ws::protocol::{ObstacleInfo, PlayerInfo, ServerMsg, SnowballInfo};

use super::world::World;

impl World {
    pub fn player_infos(&self) -> Vec<PlayerInfo> {
        self.players.iter().map(PlayerInfo::from).collect()
    }

    pub fn snowball_infos(&self) -> Vec<SnowballInfo> {
        self.projectiles.iter().map(SnowballInfo::from).collect()
    }

    pub fn obstacle_infos(&self) -> Vec<ObstacleInfo> {
        self.obstacles.iter().map(ObstacleInfo::from).collect()
    }

    /// The per-tick `state` broadcast
    pub fn state_message(&self) -> ServerMsg {
        ServerMsg::State {
            players: self.player_infos(),
            snowballs: self.snowball_infos(),
            obstacles: self.obstacle_infos(),
        }
    }

    /// Everything a freshly connected client needs, including the leaderboard
    pub fn init_message(&self, id: &str) -> ServerMsg {
        ServerMsg::Init {
            id: id.to_string(),
            players: self.player_infos(),
            snowballs: self.snowball_infos(),
            obstacles: self.obstacle_infos(),
            leaderboard: self.leaderboard.snapshot(),
        }
    }

    pub fn leaderboard_message(&self) -> ServerMsg {
        ServerMsg::Leaderboard(self.leaderboard.snapshot())
    }
}
