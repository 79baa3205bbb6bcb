//! Randomized obstacle layouts

use rand::seq::SliceRandom;
use rand::Rng;

use super::geometry::{Bounds, Rect};
use super::world::Obstacle;

/// Shape and durability of one obstacle in a layout
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObstacleTemplate {
    pub w: f32,
    pub h: f32,
    pub hp: i32,
}

const fn t(w: f32, h: f32, hp: i32) -> ObstacleTemplate {
    ObstacleTemplate { w, h, hp }
}

/// The classic three-block arena
pub const CLASSIC: &[ObstacleTemplate] = &[t(120.0, 40.0, 100), t(200.0, 60.0, 150), t(160.0, 80.0, 120)];

pub const SCATTERED: &[ObstacleTemplate] = &[
    t(80.0, 80.0, 80),
    t(80.0, 80.0, 80),
    t(60.0, 120.0, 100),
    t(120.0, 60.0, 100),
    t(90.0, 90.0, 120),
];

pub const WALLS: &[ObstacleTemplate] = &[
    t(260.0, 30.0, 140),
    t(30.0, 220.0, 140),
    t(260.0, 30.0, 140),
    t(30.0, 220.0, 140),
];

pub const FORTS: &[ObstacleTemplate] = &[
    t(140.0, 140.0, 200),
    t(140.0, 140.0, 200),
    t(70.0, 70.0, 60),
    t(70.0, 70.0, 60),
];

pub const PRESETS: &[&[ObstacleTemplate]] = &[CLASSIC, SCATTERED, WALLS, FORTS];

/// Keep obstacles this far from the map edge
const EDGE_MARGIN: f32 = 40.0;
/// Minimum clearance around each obstacle when checking overlap
const OVERLAP_PAD: f32 = 16.0;
/// Placement attempts per obstacle before falling back to the center
const MAX_PLACEMENT_ATTEMPTS: usize = 200;

/// Pick one preset uniformly and lay it out
pub fn random_layout<R: Rng + ?Sized>(
    bounds: &Bounds,
    rng: &mut R,
    next_id: &mut u64,
) -> Vec<Obstacle> {
    let templates = PRESETS.choose(rng).copied().unwrap_or(CLASSIC);
    generate(templates, bounds, rng, next_id)
}

/// Place one obstacle per template so that padded boxes do not overlap.
///
/// Always returns exactly `templates.len()` obstacles: a template that cannot
/// be placed within the attempt budget lands at the map center instead.
pub fn generate<R: Rng + ?Sized>(
    templates: &[ObstacleTemplate],
    bounds: &Bounds,
    rng: &mut R,
    next_id: &mut u64,
) -> Vec<Obstacle> {
    let mut placed: Vec<Obstacle> = Vec::with_capacity(templates.len());

    for template in templates {
        let rect = find_spot(template, bounds, &placed, rng)
            .unwrap_or_else(|| centered(template, bounds));

        *next_id += 1;
        placed.push(Obstacle {
            id: format!("obs{}", next_id),
            rect,
            hp: template.hp,
        });
    }

    placed
}

fn find_spot<R: Rng + ?Sized>(
    template: &ObstacleTemplate,
    bounds: &Bounds,
    placed: &[Obstacle],
    rng: &mut R,
) -> Option<Rect> {
    let max_x = bounds.width - EDGE_MARGIN - template.w;
    let max_y = bounds.height - EDGE_MARGIN - template.h;
    if max_x < EDGE_MARGIN || max_y < EDGE_MARGIN {
        return None;
    }

    for _ in 0..MAX_PLACEMENT_ATTEMPTS {
        let candidate = Rect::new(
            rng.gen_range(EDGE_MARGIN..=max_x),
            rng.gen_range(EDGE_MARGIN..=max_y),
            template.w,
            template.h,
        );
        let padded = candidate.expand(OVERLAP_PAD);
        if !placed
            .iter()
            .any(|o| o.rect.expand(OVERLAP_PAD).intersects(&padded))
        {
            return Some(candidate);
        }
    }

    None
}

fn centered(template: &ObstacleTemplate, bounds: &Bounds) -> Rect {
    Rect::new(
        ((bounds.width - template.w) / 2.0).max(0.0),
        ((bounds.height - template.h) / 2.0).max(0.0),
        template.w,
        template.h,
    )
}
