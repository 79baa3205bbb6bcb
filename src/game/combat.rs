//! Combat system - snowballs, damage, hit detection

use uuid::Uuid;

use super::geometry::{normalize, within_radius, Bounds};

/// Health of a fresh or respawned player
pub const MAX_HEALTH: i32 = 100;
/// Health removed from a player per snowball hit
pub const SNOWBALL_DAMAGE: i32 = 20;
/// Hit points removed from an obstacle per snowball hit
pub const OBSTACLE_DAMAGE: i32 = 20;
/// Distance units a snowball travels per tick
pub const THROW_SPEED: f32 = 6.0;
/// Snowball-to-player hit radius
pub const HIT_RADIUS: f32 = 18.0;
/// Snowballs survive this far outside the map before being dropped
pub const OUT_OF_BOUNDS_MARGIN: f32 = 50.0;

/// Active snowball in the world
#[derive(Debug, Clone)]
pub struct Projectile {
    pub id: Uuid,
    pub owner_id: String,
    pub x: f32,
    pub y: f32,
    pub vel_x: f32,
    pub vel_y: f32,
}

impl Projectile {
    /// Create a snowball at `(x, y)` heading along `(dx, dy)` at throw speed
    pub fn thrown(owner_id: &str, x: f32, y: f32, dx: f32, dy: f32) -> Self {
        let (nx, ny) = normalize(dx, dy);
        Self {
            id: Uuid::new_v4(),
            owner_id: owner_id.to_string(),
            x,
            y,
            vel_x: nx * THROW_SPEED,
            vel_y: ny * THROW_SPEED,
        }
    }

    /// Advance one tick, returns false once the snowball has left the field
    pub fn update(&mut self, bounds: &Bounds) -> bool {
        self.x += self.vel_x;
        self.y += self.vel_y;
        bounds.contains_with_margin(self.x, self.y, OUT_OF_BOUNDS_MARGIN)
    }

    /// Check collision with a player centered at `(target_x, target_y)`
    pub fn check_hit(&self, target_x: f32, target_y: f32) -> bool {
        within_radius(self.x, self.y, target_x, target_y, HIT_RADIUS)
    }
}

/// Combat rules shared by the tick engine
pub struct CombatSystem;

impl CombatSystem {
    /// Apply damage to health, returns (new_health, is_down)
    ///
    /// Health never drops below zero.
    pub fn apply_damage(current_health: i32, damage: i32) -> (i32, bool) {
        let new_health = (current_health - damage).max(0);
        (new_health, new_health <= 0)
    }

    /// Apply a hit to an obstacle, returns (new_hp, is_destroyed)
    pub fn chip_obstacle(current_hp: i32, damage: i32) -> (i32, bool) {
        let new_hp = current_hp - damage;
        (new_hp, new_hp <= 0)
    }
}
