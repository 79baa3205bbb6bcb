//! WebSocket protocol message definitions
//! These are the wire types for client-server communication.
//!
//! Every frame is a JSON envelope `{"event": <name>, "data": <payload>}`.

use serde::{Deserialize, Serialize};

use crate::game::combat::Projectile;
use crate::game::world::{Obstacle, Player};
use crate::store::Standings;

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientMsg {
    /// Requested position, clamped to the map by the server
    Move { x: f32, y: f32 },

    /// Throw toward a direction; the vector is normalized server-side
    ThrowSnowball {
        #[serde(default)]
        dx: f32,
        #[serde(default)]
        dy: f32,
    },

    /// Display name, optionally with a color
    SetName(NamePayload),

    /// Absolute bot target, clamped to the configured maximum
    AddBots {
        #[serde(default)]
        count: i64,
    },

    RestartGame,
}

/// `setName` accepts either a bare string or `{name, color}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NamePayload {
    Plain(String),
    Styled {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        color: Option<String>,
    },
}

impl NamePayload {
    pub fn into_parts(self) -> (Option<String>, Option<String>) {
        match self {
            NamePayload::Plain(name) => (Some(name), None),
            NamePayload::Styled { name, color } => (name, color),
        }
    }
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerMsg {
    /// Full world view, sent only to the connecting client
    Init {
        id: String,
        players: Vec<PlayerInfo>,
        snowballs: Vec<SnowballInfo>,
        obstacles: Vec<ObstacleInfo>,
        leaderboard: Standings,
    },

    PlayerJoined(PlayerInfo),

    PlayerLeft { id: String },

    PlayerUpdated(PlayerInfo),

    /// Whole name -> wins mapping
    Leaderboard(Standings),

    SnowballCreated(SnowballInfo),

    ObstacleDestroyed { id: String },

    /// `id` is null when the round was won by the bot side
    RoundEnded { id: Option<String>, name: String },

    /// Acknowledges a bot target; `pending` means it applies on restart
    BotsUpdated { count: usize, pending: bool },

    /// Per-tick snapshot
    State {
        players: Vec<PlayerInfo>,
        snowballs: Vec<SnowballInfo>,
        obstacles: Vec<ObstacleInfo>,
    },

    Error { code: String, message: String },
}

/// Player as seen by clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerInfo {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub health: i32,
    pub score: u32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub color: Option<String>,
    pub is_bot: bool,
}

/// Snowballs are sent without velocity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnowballInfo {
    pub id: String,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleInfo {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub hp: i32,
}

impl From<&Player> for PlayerInfo {
    fn from(p: &Player) -> Self {
        Self {
            id: p.id.clone(),
            x: p.x,
            y: p.y,
            health: p.health,
            score: p.score,
            name: p.name.clone(),
            color: p.color.clone(),
            is_bot: p.is_bot,
        }
    }
}

impl From<&Projectile> for SnowballInfo {
    fn from(s: &Projectile) -> Self {
        Self {
            id: s.id.to_string(),
            x: s.x,
            y: s.y,
        }
    }
}

impl From<&Obstacle> for ObstacleInfo {
    fn from(o: &Obstacle) -> Self {
        Self {
            id: o.id.clone(),
            x: o.rect.x,
            y: o.rect.y,
            w: o.rect.w,
            h: o.rect.h,
            hp: o.hp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_move_and_throw() {
        let msg: ClientMsg =
            serde_json::from_value(json!({"event": "move", "data": {"x": 10.5, "y": 20}})).unwrap();
        assert!(matches!(msg, ClientMsg::Move { x, y } if x == 10.5 && y == 20.0));

        let msg: ClientMsg =
            serde_json::from_value(json!({"event": "throwSnowball", "data": {"dx": 1.0}})).unwrap();
        assert!(matches!(msg, ClientMsg::ThrowSnowball { dx, dy } if dx == 1.0 && dy == 0.0));
    }

    #[test]
    fn set_name_accepts_string_or_object() {
        let msg: ClientMsg =
            serde_json::from_value(json!({"event": "setName", "data": "Frosty"})).unwrap();
        match msg {
            ClientMsg::SetName(payload) => {
                assert_eq!(payload.into_parts(), (Some("Frosty".to_string()), None))
            }
            other => panic!("unexpected {other:?}"),
        }

        let msg: ClientMsg = serde_json::from_value(
            json!({"event": "setName", "data": {"name": "Frosty", "color": "#0af"}}),
        )
        .unwrap();
        match msg {
            ClientMsg::SetName(payload) => assert_eq!(
                payload.into_parts(),
                (Some("Frosty".to_string()), Some("#0af".to_string()))
            ),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn add_bots_count_defaults_to_zero() {
        let msg: ClientMsg =
            serde_json::from_value(json!({"event": "addBots", "data": {}})).unwrap();
        assert!(matches!(msg, ClientMsg::AddBots { count: 0 }));
    }

    #[test]
    fn restart_has_no_payload() {
        let msg: ClientMsg = serde_json::from_value(json!({"event": "restartGame"})).unwrap();
        assert!(matches!(msg, ClientMsg::RestartGame));
    }

    #[test]
    fn server_messages_use_event_envelope() {
        let msg = ServerMsg::RoundEnded {
            id: Some("abc".to_string()),
            name: "Frosty".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"event": "roundEnded", "data": {"id": "abc", "name": "Frosty"}})
        );

        let player = PlayerInfo {
            id: "bot_1".to_string(),
            x: 1.0,
            y: 2.0,
            health: 100,
            score: 0,
            name: None,
            color: None,
            is_bot: true,
        };
        assert_eq!(
            serde_json::to_value(ServerMsg::PlayerJoined(player)).unwrap(),
            json!({"event": "playerJoined", "data": {
                "id": "bot_1", "x": 1.0, "y": 2.0, "health": 100, "score": 0, "isBot": true
            }})
        );
    }
}
