use crate::level::Level;
use crate::types::{Direction, Vec2};

pub(super) fn offset(pos: Vec2, dir: Direction) -> Vec2 {
    match dir {
        Direction::Up => Vec2 {
            x: pos.x,
            y: pos.y - 1,
        },
        Direction::Down => Vec2 {
            x: pos.x,
            y: pos.y + 1,
        },
        Direction::Left => Vec2 {
            x: pos.x - 1,
            y: pos.y,
        },
        Direction::Right => Vec2 {
            x: pos.x + 1,
            y: pos.y,
        },
        Direction::None => pos,
    }
}

pub(super) fn manhattan(a: Vec2, b: Vec2) -> i32 {
    (a.x - b.x).abs() + (a.y - b.y).abs()
}

/// Euclidean distance on grid coordinates. On tunnel rows the horizontal
/// span may be shorter through the wrap; take whichever is smaller.
pub(super) fn tunnel_distance(level: &Level, a: Vec2, b: Vec2) -> f64 {
    let direct = (a.x - b.x).abs();
    let dx = if level.is_tunnel_row(a.y) || level.is_tunnel_row(b.y) {
        direct.min(level.width() - direct)
    } else {
        direct
    } as f64;
    let dy = (a.y - b.y) as f64;
    (dx * dx + dy * dy).sqrt()
}
