//! Canonical world state (owned by the arena task)

use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use uuid::Uuid;

use crate::config::WorldConfig;
use crate::store::Leaderboard;

use super::combat::{Projectile, MAX_HEALTH};
use super::geometry::{Bounds, Rect};
use super::obstacles;

/// Stable identity of a connection or bot
pub type PlayerId = String;

/// Spawn points stay this far from the map edge
const SPAWN_MARGIN: f32 = 50.0;
/// Attempts to find a spawn point outside every obstacle
const SPAWN_ATTEMPTS: usize = 32;
/// Longest accepted display name, in characters
pub const MAX_NAME_LEN: usize = 24;

/// Player state (authoritative). Humans and bots share this type.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub x: f32,
    pub y: f32,
    pub health: i32,
    pub score: u32,
    pub name: Option<String>,
    pub color: Option<String>,
    pub is_bot: bool,
}

impl Player {
    pub fn human(id: PlayerId, x: f32, y: f32) -> Self {
        Self {
            id,
            x,
            y,
            health: MAX_HEALTH,
            score: 0,
            name: None,
            color: None,
            is_bot: false,
        }
    }

    pub fn bot(ordinal: usize, x: f32, y: f32) -> Self {
        Self {
            id: format!("bot_{}", Uuid::new_v4().simple()),
            x,
            y,
            health: MAX_HEALTH,
            score: 0,
            name: Some(format!("Bot{}", ordinal)),
            color: Some("#888".to_string()),
            is_bot: true,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Name credited on the leaderboard
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Player")
    }
}

/// Destructible cover
#[derive(Debug, Clone, PartialEq)]
pub struct Obstacle {
    pub id: String,
    pub rect: Rect,
    pub hp: i32,
}

/// The one shared world: players, snowballs, obstacles and round state.
///
/// The store only holds data; callers validate and clamp before mutating.
pub struct World {
    pub(super) config: WorldConfig,
    pub(super) bounds: Bounds,
    pub(super) players: Vec<Player>,
    pub(super) projectiles: Vec<Projectile>,
    pub(super) obstacles: Vec<Obstacle>,
    pub(super) round_active: bool,
    pub(super) pending_bots: Option<usize>,
    pub(super) tick: u64,
    pub(super) next_obstacle_id: u64,
    pub(super) rng: ChaCha8Rng,
    pub(super) leaderboard: Arc<Leaderboard>,
}

impl World {
    pub fn new(config: WorldConfig, seed: u64, leaderboard: Arc<Leaderboard>) -> Self {
        let bounds = Bounds::new(config.width, config.height);
        let mut world = Self {
            config,
            bounds,
            players: Vec::new(),
            projectiles: Vec::new(),
            obstacles: Vec::new(),
            round_active: true,
            pending_bots: None,
            tick: 0,
            next_obstacle_id: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
            leaderboard,
        };
        world.regenerate_obstacles();
        world
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    #[cfg(test)]
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn leaderboard(&self) -> &Arc<Leaderboard> {
        &self.leaderboard
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    // ------------------------------------------------------------------
    // Players
    // ------------------------------------------------------------------

    /// Add a player; a player with the same id is replaced
    pub fn add_player(&mut self, player: Player) {
        match self.players.iter_mut().find(|p| p.id == player.id) {
            Some(existing) => *existing = player,
            None => self.players.push(player),
        }
    }

    pub fn remove_player(&mut self, id: &str) -> Option<Player> {
        let idx = self.players.iter().position(|p| p.id == id)?;
        Some(self.players.remove(idx))
    }

    pub fn player(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    /// All players in join order
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Players matching a predicate, in join order
    pub fn players_where<F>(&self, pred: F) -> impl Iterator<Item = &Player>
    where
        F: Fn(&Player) -> bool,
    {
        self.players.iter().filter(move |p| pred(p))
    }

    pub fn has_bots(&self) -> bool {
        self.players.iter().any(|p| p.is_bot)
    }

    pub fn bot_count(&self) -> usize {
        self.players.iter().filter(|p| p.is_bot).count()
    }

    /// Remove every bot, returning the removed ids
    pub fn remove_bots(&mut self) -> Vec<PlayerId> {
        let removed = self
            .players
            .iter()
            .filter(|p| p.is_bot)
            .map(|p| p.id.clone())
            .collect();
        self.players.retain(|p| !p.is_bot);
        removed
    }

    // ------------------------------------------------------------------
    // Snowballs
    // ------------------------------------------------------------------

    pub fn push_projectile(&mut self, projectile: Projectile) {
        self.projectiles.push(projectile);
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn clear_projectiles(&mut self) {
        self.projectiles.clear();
    }

    // ------------------------------------------------------------------
    // Obstacles
    // ------------------------------------------------------------------

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    #[cfg(test)]
    pub fn replace_obstacles(&mut self, obstacles: Vec<Obstacle>) {
        self.obstacles = obstacles;
    }

    /// Swap in a fresh random layout
    pub fn regenerate_obstacles(&mut self) {
        let layout = obstacles::random_layout(&self.bounds, &mut self.rng, &mut self.next_obstacle_id);
        self.obstacles = layout;
    }

    /// True when the point lies inside any obstacle (edges included)
    pub fn in_cover(&self, x: f32, y: f32) -> bool {
        self.obstacles.iter().any(|o| o.rect.contains(x, y))
    }

    // ------------------------------------------------------------------
    // Round state
    // ------------------------------------------------------------------

    pub fn round_active(&self) -> bool {
        self.round_active
    }

    #[cfg(test)]
    pub fn set_round_active(&mut self, active: bool) {
        self.round_active = active;
    }

    pub fn pending_bots(&self) -> Option<usize> {
        self.pending_bots
    }

    pub fn set_pending_bots(&mut self, count: Option<usize>) {
        self.pending_bots = count;
    }

    // ------------------------------------------------------------------
    // Spawning
    // ------------------------------------------------------------------

    /// Random in-bounds point, preferring spots outside every obstacle
    pub fn random_spawn(&mut self) -> (f32, f32) {
        let mut point = self.random_point();
        for _ in 0..SPAWN_ATTEMPTS {
            if !self.in_cover(point.0, point.1) {
                break;
            }
            point = self.random_point();
        }
        point
    }

    fn random_point(&mut self) -> (f32, f32) {
        let x = sample_axis(&mut self.rng, self.bounds.width);
        let y = sample_axis(&mut self.rng, self.bounds.height);
        (x, y)
    }
}

fn sample_axis<R: Rng + ?Sized>(rng: &mut R, extent: f32) -> f32 {
    if extent > SPAWN_MARGIN * 2.0 {
        rng.gen_range(SPAWN_MARGIN..extent - SPAWN_MARGIN)
    } else {
        extent / 2.0
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::store::MemoryStore;

    pub(crate) fn test_world() -> World {
        let leaderboard = Leaderboard::open(Box::new(MemoryStore::new()));
        World::new(WorldConfig::default(), 7, leaderboard)
    }

    #[test]
    fn new_world_is_active_with_obstacles() {
        let world = test_world();
        assert!(world.round_active());
        assert!(!world.obstacles().is_empty());
        assert!(world.players().is_empty());
        assert_eq!(world.pending_bots(), None);
    }

    #[test]
    fn players_keep_join_order() {
        let mut world = test_world();
        world.add_player(Player::human("a".into(), 10.0, 10.0));
        world.add_player(Player::human("b".into(), 20.0, 20.0));
        world.add_player(Player::bot(1, 30.0, 30.0));

        let ids: Vec<&str> = world.players().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(&ids[..2], &["a", "b"]);
        assert!(world.has_bots());
        assert_eq!(world.players_where(|p| !p.is_bot).count(), 2);

        assert!(world.remove_player("a").is_some());
        assert!(world.remove_player("a").is_none());
        assert_eq!(world.players()[0].id, "b");
    }

    #[test]
    fn remove_bots_leaves_humans() {
        let mut world = test_world();
        world.add_player(Player::human("a".into(), 10.0, 10.0));
        world.add_player(Player::bot(1, 30.0, 30.0));
        world.add_player(Player::bot(2, 40.0, 40.0));

        assert_eq!(world.remove_bots().len(), 2);
        assert_eq!(world.bot_count(), 0);
        assert_eq!(world.players().len(), 1);
    }

    #[test]
    fn spawns_land_in_bounds_and_out_of_cover() {
        let mut world = test_world();
        for _ in 0..200 {
            let (x, y) = world.random_spawn();
            assert!((SPAWN_MARGIN..=1600.0 - SPAWN_MARGIN).contains(&x));
            assert!((SPAWN_MARGIN..=900.0 - SPAWN_MARGIN).contains(&y));
            assert!(!world.in_cover(x, y));
        }
    }

    #[test]
    fn display_name_falls_back() {
        let mut p = Player::human("a".into(), 0.0, 0.0);
        assert_eq!(p.display_name(), "Player");
        p.name = Some("Frosty".into());
        assert_eq!(p.display_name(), "Frosty");
    }
}
