//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Allowed client origins for CORS, `*` allows any
    pub client_origin: String,
    /// Leaderboard JSON file; `None` keeps the leaderboard in memory only
    pub leaderboard_path: Option<PathBuf>,
    /// Seed for the world RNG (random when unset)
    pub world_seed: Option<u64>,
    /// Simulation tunables
    pub world: WorldConfig,
}

/// Tunables consumed by the game modules
#[derive(Clone, Debug)]
pub struct WorldConfig {
    pub width: f32,
    pub height: f32,
    /// Score needed to win an all-human round
    pub win_score: u32,
    /// Upper bound for `addBots`
    pub max_bots: usize,
    pub tick_period: Duration,
    /// Delay before a downed player comes back in all-human rounds
    pub respawn_delay: Duration,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 1600.0,
            height: 900.0,
            win_score: 5,
            max_bots: 6,
            tick_period: tick_period(30),
            respawn_delay: Duration::from_millis(2000),
        }
    }
}

/// Period of one tick at the given rate
pub fn tick_period(ticks_per_second: u32) -> Duration {
    Duration::from_micros(1_000_000 / u64::from(ticks_per_second.max(1)))
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Hosting platforms provide PORT, fall back to SERVER_ADDR or default
        let server_addr = match lookup("PORT") {
            Some(port) => format!("0.0.0.0:{}", port),
            None => lookup("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:3001".to_string()),
        };

        let leaderboard_path = match lookup("LEADERBOARD_PATH") {
            Some(path) if path.trim().is_empty() => None,
            Some(path) => Some(PathBuf::from(path)),
            None => Some(PathBuf::from("data/leaderboard.json")),
        };

        let world_seed = match lookup("WORLD_SEED") {
            Some(raw) => Some(
                raw.trim()
                    .parse()
                    .map_err(|_| ConfigError::Invalid("WORLD_SEED"))?,
            ),
            None => None,
        };

        let defaults = WorldConfig::default();
        let width: f32 = parse_or(&lookup, "MAP_WIDTH", defaults.width)?;
        let height: f32 = parse_or(&lookup, "MAP_HEIGHT", defaults.height)?;
        let win_score: u32 = parse_or(&lookup, "WIN_SCORE", defaults.win_score)?;
        let max_bots: usize = parse_or(&lookup, "MAX_BOTS", defaults.max_bots)?;
        let tick_rate: u32 = parse_or(&lookup, "TICK_RATE", 30)?;
        let respawn_delay_ms: u64 = parse_or(&lookup, "RESPAWN_DELAY_MS", 2000)?;

        if !(width.is_finite() && width > 0.0) {
            return Err(ConfigError::Invalid("MAP_WIDTH"));
        }
        if !(height.is_finite() && height > 0.0) {
            return Err(ConfigError::Invalid("MAP_HEIGHT"));
        }
        if win_score == 0 {
            return Err(ConfigError::Invalid("WIN_SCORE"));
        }
        if tick_rate == 0 {
            return Err(ConfigError::Invalid("TICK_RATE"));
        }

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            client_origin: lookup("CLIENT_ORIGIN").unwrap_or_else(|| "*".to_string()),
            leaderboard_path,
            world_seed,
            world: WorldConfig {
                width,
                height,
                win_score,
                max_bots,
                tick_period: tick_period(tick_rate),
                respawn_delay: Duration::from_millis(respawn_delay_ms),
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Invalid server address format")]
    InvalidAddress,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_match_the_classic_arena() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.server_addr.port(), 3001);
        assert_eq!(config.world.width, 1600.0);
        assert_eq!(config.world.height, 900.0);
        assert_eq!(config.world.win_score, 5);
        assert_eq!(config.world.max_bots, 6);
        assert_eq!(config.world.tick_period, Duration::from_micros(33_333));
        assert_eq!(config.world.respawn_delay, Duration::from_secs(2));
        assert_eq!(
            config.leaderboard_path,
            Some(PathBuf::from("data/leaderboard.json"))
        );
        assert!(config.world_seed.is_none());
    }

    #[test]
    fn port_takes_precedence_over_server_addr() {
        let config = config_from(&[("PORT", "9000"), ("SERVER_ADDR", "127.0.0.1:1234")]).unwrap();
        assert_eq!(config.server_addr.port(), 9000);
    }

    #[test]
    fn empty_leaderboard_path_disables_persistence() {
        let config = config_from(&[("LEADERBOARD_PATH", "  ")]).unwrap();
        assert!(config.leaderboard_path.is_none());
    }

    #[test]
    fn overrides_are_parsed() {
        let config = config_from(&[
            ("MAP_WIDTH", "800"),
            ("WIN_SCORE", "3"),
            ("TICK_RATE", "60"),
            ("WORLD_SEED", "42"),
        ])
        .unwrap();
        assert_eq!(config.world.width, 800.0);
        assert_eq!(config.world.win_score, 3);
        assert_eq!(config.world.tick_period, Duration::from_micros(16_666));
        assert_eq!(config.world_seed, Some(42));
    }

    #[test]
    fn malformed_values_are_rejected() {
        assert!(matches!(
            config_from(&[("WIN_SCORE", "lots")]),
            Err(ConfigError::Invalid("WIN_SCORE"))
        ));
        assert!(matches!(
            config_from(&[("TICK_RATE", "0")]),
            Err(ConfigError::Invalid("TICK_RATE"))
        ));
        assert!(matches!(
            config_from(&[("SERVER_ADDR", "nowhere")]),
            Err(ConfigError::InvalidAddress)
        ));
    }
}
