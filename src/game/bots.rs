//! Server-side bots: chase the nearest human, lob the occasional snowball

use rand::Rng;
use tracing::debug;

use super::combat::Projectile;
use super::geometry::{distance_sq, normalize, Bounds};
use super::world::{Obstacle, Player};

/// Distance units a bot covers per tick (humans move faster)
pub const BOT_SPEED: f32 = 1.8;
/// Chance per tick that a bot throws
pub const BOT_THROW_CHANCE: f64 = 0.02;
/// Obstacles are inflated by roughly a body radius when checking paths
const BOT_CLEARANCE: f32 = 12.0;
/// Points sampled along each candidate step
const PATH_SAMPLES: usize = 5;

/// What one bot does this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BotAction {
    /// New position, `None` when every candidate step was blocked
    pub position: Option<(f32, f32)>,
    /// Unit throw direction
    pub throw: Option<(f32, f32)>,
}

#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("bot {0} has a non-finite position")]
    NonFinite(String),
}

/// Run every bot once.
///
/// `targets` are the positions of living humans; with none left the bots idle.
/// A bot that fails to decide is skipped without affecting the others.
pub fn tick_bots<'a, I, R, F>(
    bots: I,
    targets: &[(f32, f32)],
    obstacles: &[Obstacle],
    bounds: &Bounds,
    rng: &mut R,
    mut spawn: F,
) where
    I: IntoIterator<Item = &'a mut Player>,
    R: Rng + ?Sized,
    F: FnMut(Projectile),
{
    if targets.is_empty() {
        return;
    }

    for bot in bots {
        match decide(bot, targets, obstacles, bounds, rng) {
            Ok(Some(action)) => {
                if let Some((x, y)) = action.position {
                    bot.x = x;
                    bot.y = y;
                }
                if let Some((dx, dy)) = action.throw {
                    spawn(Projectile::thrown(&bot.id, bot.x, bot.y, dx, dy));
                }
            }
            Ok(None) => {}
            Err(e) => debug!(bot_id = %bot.id, error = %e, "Bot skipped this tick"),
        }
    }
}

/// Decide one bot's move and throw. `None` when there is nobody to chase.
///
/// A bot standing on its target does not move but may still throw; that
/// snowball has no heading and rests where it was thrown.
pub fn decide<R: Rng + ?Sized>(
    bot: &Player,
    targets: &[(f32, f32)],
    obstacles: &[Obstacle],
    bounds: &Bounds,
    rng: &mut R,
) -> Result<Option<BotAction>, BotError> {
    if !(bot.x.is_finite() && bot.y.is_finite()) {
        return Err(BotError::NonFinite(bot.id.clone()));
    }

    let Some((tx, ty)) = nearest(bot.x, bot.y, targets) else {
        return Ok(None);
    };

    let (nx, ny) = normalize(tx - bot.x, ty - bot.y);
    let has_heading = nx != 0.0 || ny != 0.0;

    let position = if has_heading {
        // Straight ahead first, then the two side-steps
        [(nx, ny), (-ny, nx), (ny, -nx)]
            .into_iter()
            .map(|(sx, sy)| bounds.clamp(bot.x + sx * BOT_SPEED, bot.y + sy * BOT_SPEED))
            .find(|&(x, y)| path_clear((bot.x, bot.y), (x, y), obstacles))
    } else {
        None
    };

    // Aim uses the heading from before the move
    let throw = rng.gen_bool(BOT_THROW_CHANCE).then_some((nx, ny));

    Ok(Some(BotAction { position, throw }))
}

/// Closest target by squared distance; the first of equally close targets wins
fn nearest(x: f32, y: f32, targets: &[(f32, f32)]) -> Option<(f32, f32)> {
    let mut best: Option<((f32, f32), f32)> = None;
    for &(tx, ty) in targets {
        let d2 = distance_sq(x, y, tx, ty);
        if best.map_or(true, |(_, best_d2)| d2 < best_d2) {
            best = Some(((tx, ty), d2));
        }
    }
    best.map(|(target, _)| target)
}

/// Sample points along the segment and reject it if any is inside padded cover
fn path_clear(from: (f32, f32), to: (f32, f32), obstacles: &[Obstacle]) -> bool {
    (1..=PATH_SAMPLES).all(|i| {
        let t = i as f32 / PATH_SAMPLES as f32;
        let x = from.0 + (to.0 - from.0) * t;
        let y = from.1 + (to.1 - from.1) * t;
        !obstacles
            .iter()
            .any(|o| o.rect.expand(BOT_CLEARANCE).contains(x, y))
    })
}
