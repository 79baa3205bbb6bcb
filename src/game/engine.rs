//! Authoritative tick: bots, snowball flight, hits, round end

use tracing::{debug, info};

use crate::ws::protocol::{PlayerInfo, ServerMsg, SnowballInfo};

use super::bots;
use super::combat::{CombatSystem, Projectile, MAX_HEALTH, OBSTACLE_DAMAGE, SNOWBALL_DAMAGE};
use super::world::{Player, PlayerId, World};
use super::Effect;

/// Winner name used when the bot side takes the round
const BOTS_WINNER: &str = "Bots";
/// Winner name used when nobody is left standing
const NOBODY_WINNER: &str = "Player";

/// Result of testing one snowball against the players
enum PlayerHit {
    Miss,
    Hit,
    /// The hit ended the round; every snowball is gone
    RoundOver,
}

impl World {
    /// Advance the world by one tick.
    ///
    /// The returned effects end with the `state` snapshot for this tick.
    pub fn tick(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        self.tick += 1;

        if self.round_active {
            self.run_bots(&mut effects);
        }
        self.advance_projectiles(&mut effects);

        effects.push(Effect::Broadcast(self.state_message()));
        effects
    }

    fn run_bots(&mut self, effects: &mut Vec<Effect>) {
        let targets: Vec<(f32, f32)> = self
            .players
            .iter()
            .filter(|p| !p.is_bot && p.is_alive())
            .map(|p| (p.x, p.y))
            .collect();

        let mut thrown = Vec::new();
        bots::tick_bots(
            self.players.iter_mut().filter(|p| p.is_bot && p.is_alive()),
            &targets,
            &self.obstacles,
            &self.bounds,
            &mut self.rng,
            |snowball| thrown.push(snowball),
        );

        for snowball in thrown {
            effects.push(Effect::Broadcast(ServerMsg::SnowballCreated(
                SnowballInfo::from(&snowball),
            )));
            self.projectiles.push(snowball);
        }
    }

    /// Move every snowball and resolve what it runs into.
    ///
    /// The live list is taken out and rebuilt from survivors so removals during
    /// the pass never skip or repeat an entry.
    fn advance_projectiles(&mut self, effects: &mut Vec<Effect>) {
        let in_flight = std::mem::take(&mut self.projectiles);
        let mut survivors = Vec::with_capacity(in_flight.len());

        for mut snowball in in_flight {
            if !snowball.update(&self.bounds) {
                debug!(snowball_id = %snowball.id, x = snowball.x, y = snowball.y, "Snowball left the field");
                continue;
            }

            match self.resolve_player_hit(&snowball, effects) {
                PlayerHit::Miss => {}
                PlayerHit::Hit => continue,
                PlayerHit::RoundOver => return,
            }

            if self.resolve_obstacle_hit(&snowball, effects) {
                continue;
            }

            survivors.push(snowball);
        }

        self.projectiles = survivors;
    }

    fn resolve_player_hit(&mut self, snowball: &Projectile, effects: &mut Vec<Effect>) -> PlayerHit {
        let victim_idx = self.players.iter().position(|p| {
            p.id != snowball.owner_id
                && !self.in_cover(p.x, p.y)
                && snowball.check_hit(p.x, p.y)
        });
        let Some(idx) = victim_idx else {
            return PlayerHit::Miss;
        };

        // Decided before anyone is removed by this hit
        let bot_match = self.has_bots();

        let victim = &mut self.players[idx];
        let was_alive = victim.is_alive();
        let (health, down) = CombatSystem::apply_damage(victim.health, SNOWBALL_DAMAGE);
        victim.health = health;
        let victim_id = victim.id.clone();
        let victim_is_bot = victim.is_bot;

        if let Some(owner) = self.player_mut(&snowball.owner_id) {
            owner.score += 1;
        }

        debug!(
            victim_id = %victim_id,
            thrower_id = %snowball.owner_id,
            snowball_id = %snowball.id,
            victim_health = health,
            "Player hit"
        );

        let round_over = self.round_active && self.check_round_end(&snowball.owner_id, bot_match, effects);

        // Players already down still absorb snowballs but are only knocked out once
        if down && was_alive {
            self.knock_out(victim_id, victim_is_bot, bot_match, effects);
        }

        if round_over {
            PlayerHit::RoundOver
        } else {
            PlayerHit::Hit
        }
    }

    /// Score threshold in all-human rounds, elimination once any bot takes part
    fn check_round_end(&mut self, thrower_id: &str, bot_match: bool, effects: &mut Vec<Effect>) -> bool {
        if !bot_match {
            let Some(thrower) = self.player(thrower_id) else {
                return false;
            };
            if thrower.score < self.config.win_score {
                return false;
            }

            let winner_id = thrower.id.clone();
            let winner_name = thrower.display_name().to_string();
            self.leaderboard.record_win(&winner_name);
            effects.push(Effect::Broadcast(self.leaderboard_message()));
            self.finish_round(Some(winner_id), winner_name, effects);
            return true;
        }

        let living_bots = self.players_where(|p| p.is_bot && p.is_alive()).count();
        let living_humans = self.players_where(|p| !p.is_bot && p.is_alive()).count();
        if living_bots > 0 && living_humans > 0 {
            return false;
        }

        let (winner_id, winner_name) = if living_humans == 0 && living_bots > 0 {
            (None, BOTS_WINNER.to_string())
        } else if let Some(top) = self.top_living_human() {
            (Some(top.id.clone()), top.display_name().to_string())
        } else {
            (None, NOBODY_WINNER.to_string())
        };

        if winner_id.is_some() {
            self.leaderboard.record_win(&winner_name);
            effects.push(Effect::Broadcast(self.leaderboard_message()));
        }
        self.finish_round(winner_id, winner_name, effects);
        true
    }

    /// Highest-scoring living human; the earliest joiner wins ties
    fn top_living_human(&self) -> Option<&Player> {
        self.players_where(|p| !p.is_bot && p.is_alive())
            .fold(None, |best: Option<&Player>, p| match best {
                Some(b) if b.score >= p.score => Some(b),
                _ => Some(p),
            })
    }

    /// Pause the round until a restart; positions and obstacles stay as they are
    fn finish_round(&mut self, winner_id: Option<PlayerId>, winner_name: String, effects: &mut Vec<Effect>) {
        info!(winner = %winner_name, winner_id = ?winner_id, tick = self.tick, "Round ended");
        self.round_active = false;
        self.clear_projectiles();
        effects.push(Effect::Broadcast(ServerMsg::RoundEnded {
            id: winner_id,
            name: winner_name,
        }));
    }

    fn knock_out(&mut self, victim_id: PlayerId, victim_is_bot: bool, bot_match: bool, effects: &mut Vec<Effect>) {
        if !bot_match {
            effects.push(Effect::ScheduleRespawn { player_id: victim_id });
        } else if victim_is_bot {
            self.remove_player(&victim_id);
            info!(bot_id = %victim_id, "Bot eliminated");
            effects.push(Effect::Broadcast(ServerMsg::PlayerLeft { id: victim_id }));
        }
        // A downed human in a bot round stays at zero health until the restart
    }

    /// First obstacle containing the snowball takes the hit
    fn resolve_obstacle_hit(&mut self, snowball: &Projectile, effects: &mut Vec<Effect>) -> bool {
        let Some(idx) = self
            .obstacles
            .iter()
            .position(|o| o.rect.contains(snowball.x, snowball.y))
        else {
            return false;
        };

        let obstacle = &mut self.obstacles[idx];
        let (hp, destroyed) = CombatSystem::chip_obstacle(obstacle.hp, OBSTACLE_DAMAGE);
        obstacle.hp = hp;

        if destroyed {
            let obstacle = self.obstacles.remove(idx);
            info!(obstacle_id = %obstacle.id, "Obstacle destroyed");
            effects.push(Effect::Broadcast(ServerMsg::ObstacleDestroyed { id: obstacle.id }));
        }

        true
    }

    /// Start a fresh round: full health, zero score, new positions and cover.
    /// A bot target requested during the pause is applied now.
    pub fn restart(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();

        self.round_active = true;
        self.clear_projectiles();
        self.regenerate_obstacles();

        for idx in 0..self.players.len() {
            let (x, y) = self.random_spawn();
            let player = &mut self.players[idx];
            player.health = MAX_HEALTH;
            player.score = 0;
            player.x = x;
            player.y = y;
        }

        if let Some(target) = self.pending_bots.take() {
            self.replace_bots(target, &mut effects);
            effects.push(Effect::Broadcast(ServerMsg::BotsUpdated {
                count: target,
                pending: false,
            }));
        }

        info!(players = self.players.len(), bots = self.bot_count(), "Round restarted");
        effects.push(Effect::Broadcast(self.state_message()));
        effects
    }

    /// Treat `requested` as the absolute number of bots wanted.
    ///
    /// Existing bots are always dropped; replacements appear now during a
    /// round, or at the next restart while paused.
    pub fn set_bot_target(&mut self, requested: i64) -> Vec<Effect> {
        let mut effects = Vec::new();
        let target = requested.clamp(0, self.config.max_bots as i64) as usize;

        if self.round_active {
            self.set_pending_bots(None);
            self.replace_bots(target, &mut effects);
        } else {
            for id in self.remove_bots() {
                effects.push(Effect::Broadcast(ServerMsg::PlayerLeft { id }));
            }
            self.set_pending_bots(Some(target));
        }

        info!(requested, target, pending = !self.round_active, "Bot target set");
        effects.push(Effect::Broadcast(ServerMsg::BotsUpdated {
            count: target,
            pending: !self.round_active,
        }));
        effects
    }

    fn replace_bots(&mut self, target: usize, effects: &mut Vec<Effect>) {
        for id in self.remove_bots() {
            effects.push(Effect::Broadcast(ServerMsg::PlayerLeft { id }));
        }

        for ordinal in 1..=target {
            let (x, y) = self.random_spawn();
            let bot = Player::bot(ordinal, x, y);
            effects.push(Effect::Broadcast(ServerMsg::PlayerJoined(PlayerInfo::from(&bot))));
            self.add_player(bot);
        }
    }
}
