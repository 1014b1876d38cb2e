use crate::geometry::math::same_point;
use crate::geometry::tolerance::step_sign;
use crate::layout::NodeLayout;
use crate::model::Point;
use std::collections::HashMap;

pub const MAX_PLACEMENT_ATTEMPTS: usize = 256;

pub fn snap_to_grid(p: Point, grid: f64) -> Point {
    if !(grid.is_finite() && grid > 0.0) {
        return p;
    }
    Point { x: (p.x / grid).round() * grid, y: (p.y / grid).round() * grid }
}

/// Moves `candidate` off any node sitting exactly on it, one grid step at a
/// time along the dominant axis toward `original` (the raw click before
/// snapping). Ties go to +x. The direction is fixed after the first step.
pub fn find_non_colliding_position(
    candidate: Point,
    original: Point,
    nodes: &HashMap<String, NodeLayout>,
    grid: f64,
) -> Point {
    let step = if grid.is_finite() && grid > 0.0 { grid } else { 1.0 };
    let dx = original.x - candidate.x;
    let dy = original.y - candidate.y;
    let (sx, sy) = if dx.abs() >= dy.abs() { (step_sign(dx) * step, 0.0) } else { (0.0, step_sign(dy) * step) };
    let mut p = candidate;
    for _ in 0..MAX_PLACEMENT_ATTEMPTS {
        if !nodes.values().any(|n| same_point(n.position, p)) {
            return p;
        }
        p = Point { x: p.x + sx, y: p.y + sy };
    }
    p
}
