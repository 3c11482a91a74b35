//! Collision Detection
//!
//! Axis-aligned box overlap for pickups, plus a Chebyshev proximity
//! test for callers that only need a radius check.

use crate::core::vec2::Vec2;
use crate::game::state::{PlayerId, WorldState};

/// Axis-aligned rectangle given by its top-left corner and size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    /// Left edge
    pub x: f64,
    /// Top edge
    pub y: f64,
    /// Width
    pub w: f64,
    /// Height
    pub h: f64,
}

impl Rect {
    /// Create a rectangle.
    #[inline]
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Square of side `size` anchored at `origin`.
    #[inline]
    pub const fn square(origin: Vec2, size: f64) -> Self {
        Self::new(origin.x, origin.y, size, size)
    }
}

/// Check if two rectangles overlap.
///
/// Edges that only touch do not count.
#[inline]
pub fn aabb_overlap(a: Rect, b: Rect) -> bool {
    a.x < b.x + b.w
        && a.x + a.w > b.x
        && a.y < b.y + b.h
        && a.y + a.h > b.y
}

/// Check if two points are within `radius` of each other on both axes.
#[inline]
pub fn proximity(a: Vec2, b: Vec2, radius: f64) -> bool {
    a.chebyshev_distance(b) <= radius
}

/// Find the player picking up the collectible this tick, if any.
///
/// Players are checked in identity order and the first overlap wins;
/// at most one pickup is granted per tick.
pub fn find_pickup(world: &WorldState) -> Option<PlayerId> {
    let config = world.config();
    let target = world.collectible().rect(config.collectible_size);

    world.players()
        .find(|player| aabb_overlap(player.rect(config.player_size), target))
        .map(|player| player.id)
}
