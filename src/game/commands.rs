//! Session command handlers
//!
//! Each handler runs to completion on the arena task and reports what clients
//! must hear as [`Effect`]s.

use tracing::{debug, info, warn};

use crate::ws::protocol::{ClientMsg, NamePayload, PlayerInfo, ServerMsg, SnowballInfo};

use super::combat::{Projectile, MAX_HEALTH};
use super::world::{Player, PlayerId, World, MAX_NAME_LEN};
use super::{Effect, GameCommand};

impl World {
    /// Apply one command from the session layer or the respawn timer
    pub fn handle_command(&mut self, command: GameCommand) -> Vec<Effect> {
        match command {
            GameCommand::Join { player_id } => self.join(player_id),
            GameCommand::Leave { player_id } => self.leave(&player_id),
            GameCommand::Client { player_id, msg } => self.handle_client(&player_id, msg),
            GameCommand::Respawn { player_id } => self.respawn(&player_id),
        }
    }

    fn handle_client(&mut self, player_id: &str, msg: ClientMsg) -> Vec<Effect> {
        match msg {
            ClientMsg::Move { x, y } => self.move_player(player_id, x, y),
            ClientMsg::ThrowSnowball { dx, dy } => self.throw_snowball(player_id, dx, dy),
            ClientMsg::SetName(payload) => self.set_name(player_id, payload),
            ClientMsg::AddBots { count } => self.set_bot_target(count),
            ClientMsg::RestartGame => self.restart(),
        }
    }

    /// New connection: fresh cover, a spawn point, the full view for the
    /// newcomer and a join notice for everyone else
    pub fn join(&mut self, player_id: PlayerId) -> Vec<Effect> {
        if self.player(&player_id).is_some() {
            warn!(player_id = %player_id, "Player already in arena");
            return Vec::new();
        }

        self.regenerate_obstacles();
        let (x, y) = self.random_spawn();
        let player = Player::human(player_id.clone(), x, y);
        let joined = PlayerInfo::from(&player);
        self.add_player(player);

        info!(player_id = %player_id, players = self.players.len(), "Player joined");

        vec![
            Effect::Send {
                to: player_id.clone(),
                msg: self.init_message(&player_id),
            },
            Effect::BroadcastExcept {
                except: player_id,
                msg: ServerMsg::PlayerJoined(joined),
            },
        ]
    }

    pub fn leave(&mut self, player_id: &str) -> Vec<Effect> {
        match self.remove_player(player_id) {
            Some(player) => {
                info!(player_id = %player.id, players = self.players.len(), "Player left");
                vec![Effect::Broadcast(ServerMsg::PlayerLeft { id: player.id })]
            }
            None => Vec::new(),
        }
    }

    /// Clamp to the map, then refuse positions inside cover.
    /// Downed players stay where they fell until they respawn.
    fn move_player(&mut self, player_id: &str, x: f32, y: f32) -> Vec<Effect> {
        if !(x.is_finite() && y.is_finite()) {
            debug!(player_id, "Ignoring non-finite move");
            return Vec::new();
        }

        let (x, y) = self.bounds.clamp(x, y);
        if self.in_cover(x, y) {
            return Vec::new();
        }

        if let Some(player) = self.player_mut(player_id) {
            if player.is_alive() {
                player.x = x;
                player.y = y;
            }
        }
        Vec::new()
    }

    /// Ignored while the round is paused and for downed players
    fn throw_snowball(&mut self, player_id: &str, dx: f32, dy: f32) -> Vec<Effect> {
        if !self.round_active {
            return Vec::new();
        }
        let Some(thrower) = self.player(player_id).filter(|p| p.is_alive()) else {
            return Vec::new();
        };

        let dx = if dx.is_finite() { dx } else { 0.0 };
        let dy = if dy.is_finite() { dy } else { 0.0 };
        let snowball = Projectile::thrown(&thrower.id, thrower.x, thrower.y, dx, dy);

        debug!(player_id, snowball_id = %snowball.id, dx, dy, "Snowball thrown");

        let created = SnowballInfo::from(&snowball);
        self.push_projectile(snowball);
        vec![Effect::Broadcast(ServerMsg::SnowballCreated(created))]
    }

    fn set_name(&mut self, player_id: &str, payload: NamePayload) -> Vec<Effect> {
        let (name, color) = payload.into_parts();
        let Some(player) = self.player_mut(player_id) else {
            return Vec::new();
        };

        if let Some(name) = name.filter(|n| !n.is_empty()) {
            player.name = Some(name.chars().take(MAX_NAME_LEN).collect());
        }
        if let Some(color) = color.filter(|c| !c.is_empty()) {
            player.color = Some(color);
        }

        info!(player_id, name = ?player.name, "Player renamed");

        let updated = PlayerInfo::from(&*player);
        vec![
            Effect::Broadcast(ServerMsg::PlayerUpdated(updated)),
            Effect::Broadcast(self.leaderboard_message()),
        ]
    }

    /// Deferred respawn; the player may have left in the meantime
    pub fn respawn(&mut self, player_id: &str) -> Vec<Effect> {
        if self.player(player_id).is_none() {
            debug!(player_id, "Respawn target gone");
            return Vec::new();
        }

        let (x, y) = self.random_spawn();
        if let Some(player) = self.player_mut(player_id) {
            player.x = x;
            player.y = y;
            player.health = MAX_HEALTH;
            debug!(player_id, x, y, "Player respawned");
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::geometry::Rect;
    use crate::game::world::tests::test_world;
    use crate::game::world::Obstacle;

    fn open_world() -> World {
        let mut world = test_world();
        world.replace_obstacles(Vec::new());
        world
    }

    fn client(world: &mut World, id: &str, msg: ClientMsg) -> Vec<Effect> {
        world.handle_command(GameCommand::Client {
            player_id: id.to_string(),
            msg,
        })
    }

    #[test]
    fn join_sends_init_to_newcomer_and_announces_to_others() {
        let mut world = test_world();
        world.join("a".into());
        let effects = world.join("b".into());

        assert_eq!(effects.len(), 2);
        match &effects[0] {
            Effect::Send {
                to,
                msg: ServerMsg::Init { id, players, obstacles, .. },
            } => {
                assert_eq!(to, "b");
                assert_eq!(id, "b");
                assert_eq!(players.len(), 2);
                assert!(!obstacles.is_empty());
            }
            other => panic!("unexpected {other:?}"),
        }
        match &effects[1] {
            Effect::BroadcastExcept {
                except,
                msg: ServerMsg::PlayerJoined(info),
            } => {
                assert_eq!(except, "b");
                assert_eq!(info.id, "b");
                assert_eq!(info.health, MAX_HEALTH);
                assert!(!info.is_bot);
            }
            other => panic!("unexpected {other:?}"),
        }

        let b = world.player("b").unwrap();
        assert!(world.bounds().contains(b.x, b.y));
        assert!(!world.in_cover(b.x, b.y));
    }

    #[test]
    fn join_lays_out_fresh_cover() {
        let mut world = test_world();
        let before: Vec<String> = world.obstacles().iter().map(|o| o.id.clone()).collect();
        world.join("a".into());
        assert!(world.obstacles().iter().all(|o| !before.contains(&o.id)));
    }

    #[test]
    fn duplicate_join_is_ignored() {
        let mut world = test_world();
        world.join("a".into());
        assert!(world.join("a".into()).is_empty());
        assert_eq!(world.players().len(), 1);
    }

    #[test]
    fn leave_broadcasts_departure_once() {
        let mut world = test_world();
        world.join("a".into());
        let effects = world.handle_command(GameCommand::Leave {
            player_id: "a".into(),
        });
        assert_eq!(effects, vec![Effect::Broadcast(ServerMsg::PlayerLeft { id: "a".into() })]);
        assert!(world.leave("a").is_empty());
    }

    #[test]
    fn moves_are_clamped_to_the_map() {
        let mut world = open_world();
        world.add_player(Player::human("a".into(), 100.0, 100.0));

        client(&mut world, "a", ClientMsg::Move { x: -40.0, y: 5000.0 });
        let a = world.player("a").unwrap();
        assert_eq!((a.x, a.y), (0.0, 900.0));

        client(&mut world, "a", ClientMsg::Move { x: 300.5, y: 200.25 });
        let a = world.player("a").unwrap();
        assert_eq!((a.x, a.y), (300.5, 200.25));
    }

    #[test]
    fn moves_into_cover_are_rejected() {
        let mut world = open_world();
        world.replace_obstacles(vec![Obstacle {
            id: "wall".into(),
            rect: Rect::new(200.0, 200.0, 100.0, 40.0),
            hp: 100,
        }]);
        world.add_player(Player::human("a".into(), 100.0, 100.0));

        client(&mut world, "a", ClientMsg::Move { x: 250.0, y: 220.0 });
        client(&mut world, "a", ClientMsg::Move { x: 200.0, y: 240.0 });
        let a = world.player("a").unwrap();
        assert_eq!((a.x, a.y), (100.0, 100.0));
    }

    #[test]
    fn bad_moves_are_ignored() {
        let mut world = open_world();
        world.add_player(Player::human("a".into(), 100.0, 100.0));
        world.add_player(Player::human("down".into(), 100.0, 100.0));
        world.player_mut("down").unwrap().health = 0;

        client(&mut world, "a", ClientMsg::Move { x: f32::NAN, y: 10.0 });
        client(&mut world, "down", ClientMsg::Move { x: 500.0, y: 500.0 });
        client(&mut world, "ghost", ClientMsg::Move { x: 500.0, y: 500.0 });

        assert_eq!(world.player("a").unwrap().x, 100.0);
        assert_eq!(world.player("down").unwrap().x, 100.0);
    }

    #[test]
    fn throw_spawns_a_snowball_at_the_thrower() {
        let mut world = open_world();
        world.add_player(Player::human("a".into(), 100.0, 200.0));

        let effects = client(&mut world, "a", ClientMsg::ThrowSnowball { dx: 3.0, dy: 4.0 });

        assert_eq!(world.projectiles().len(), 1);
        let s = &world.projectiles()[0];
        assert_eq!(s.owner_id, "a");
        assert_eq!((s.x, s.y), (100.0, 200.0));
        assert!((s.vel_x - 3.6).abs() < 1e-4);
        assert!((s.vel_y - 4.8).abs() < 1e-4);
        assert_eq!(
            effects,
            vec![Effect::Broadcast(ServerMsg::SnowballCreated(SnowballInfo {
                id: s.id.to_string(),
                x: 100.0,
                y: 200.0,
            }))]
        );
    }

    #[test]
    fn zero_length_throw_does_not_produce_nan() {
        let mut world = open_world();
        world.add_player(Player::human("a".into(), 100.0, 200.0));

        client(&mut world, "a", ClientMsg::ThrowSnowball { dx: 0.0, dy: 0.0 });
        client(&mut world, "a", ClientMsg::ThrowSnowball { dx: f32::INFINITY, dy: 1.0 });

        for s in world.projectiles() {
            assert!(s.vel_x.is_finite() && s.vel_y.is_finite());
        }
        assert_eq!(world.projectiles().len(), 2);
    }

    #[test]
    fn no_throws_while_paused_or_down() {
        let mut world = open_world();
        world.add_player(Player::human("a".into(), 100.0, 200.0));
        world.add_player(Player::human("down".into(), 300.0, 200.0));
        world.player_mut("down").unwrap().health = 0;

        assert!(client(&mut world, "down", ClientMsg::ThrowSnowball { dx: 1.0, dy: 0.0 }).is_empty());
        assert!(client(&mut world, "ghost", ClientMsg::ThrowSnowball { dx: 1.0, dy: 0.0 }).is_empty());

        world.set_round_active(false);
        assert!(client(&mut world, "a", ClientMsg::ThrowSnowball { dx: 1.0, dy: 0.0 }).is_empty());
        assert!(world.projectiles().is_empty());
    }

    #[test]
    fn set_name_truncates_and_broadcasts_leaderboard() {
        let mut world = open_world();
        world.add_player(Player::human("a".into(), 100.0, 200.0));
        world.leaderboard().record_win("Someone");

        let long = "x".repeat(40);
        let effects = client(&mut world, "a", ClientMsg::SetName(NamePayload::Plain(long)));

        let a = world.player("a").unwrap();
        assert_eq!(a.name.as_deref().map(str::len), Some(MAX_NAME_LEN));
        assert_eq!(effects.len(), 2);
        assert!(matches!(&effects[0], Effect::Broadcast(ServerMsg::PlayerUpdated(info)) if info.id == "a"));
        assert!(matches!(
            &effects[1],
            Effect::Broadcast(ServerMsg::Leaderboard(l)) if l.get("Someone") == Some(&1)
        ));
    }

    #[test]
    fn set_name_accepts_name_and_color() {
        let mut world = open_world();
        world.add_player(Player::human("a".into(), 100.0, 200.0));

        client(
            &mut world,
            "a",
            ClientMsg::SetName(NamePayload::Styled {
                name: Some("Frosty".into()),
                color: Some("#ff0000".into()),
            }),
        );
        // Color alone keeps the name
        client(
            &mut world,
            "a",
            ClientMsg::SetName(NamePayload::Styled {
                name: None,
                color: Some("#00ff00".into()),
            }),
        );

        let a = world.player("a").unwrap();
        assert_eq!(a.name.as_deref(), Some("Frosty"));
        assert_eq!(a.color.as_deref(), Some("#00ff00"));
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let mut world = open_world();
        world.add_player(Player::human("a".into(), 100.0, 200.0));

        client(&mut world, "a", ClientMsg::SetName(NamePayload::Plain("❄".repeat(30))));

        assert_eq!(world.player("a").unwrap().name.as_ref().unwrap().chars().count(), MAX_NAME_LEN);
    }

    #[test]
    fn add_bots_routes_to_the_bot_target() {
        let mut world = open_world();
        client(&mut world, "a", ClientMsg::AddBots { count: 2 });
        assert_eq!(world.bot_count(), 2);
    }

    #[test]
    fn respawn_heals_and_tolerates_missing_players() {
        let mut world = test_world();
        world.add_player(Player::human("a".into(), 100.0, 200.0));
        world.player_mut("a").unwrap().health = 0;

        world.handle_command(GameCommand::Respawn { player_id: "a".into() });
        let a = world.player("a").unwrap();
        assert_eq!(a.health, MAX_HEALTH);
        assert!(!world.in_cover(a.x, a.y));

        assert!(world
            .handle_command(GameCommand::Respawn { player_id: "gone".into() })
            .is_empty());
    }
}
