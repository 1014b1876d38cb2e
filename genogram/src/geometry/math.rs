use super::tolerance::{approx_eq, EPS_POS};
use crate::model::Point;

/// Squared distance from `p` to segment `a`-`b`, and the clamped projection parameter.
pub fn seg_distance_sq(p: Point, a: Point, b: Point) -> (f64, f64) {
    let vx = b.x - a.x; let vy = b.y - a.y;
    let wx = p.x - a.x; let wy = p.y - a.y;
    let vv = vx*vx + vy*vy;
    let t = if vv > 0.0 { ((wx*vx + wy*vy) / vv).clamp(0.0, 1.0) } else { 0.0 };
    let dx = p.x - (a.x + t * vx); let dy = p.y - (a.y + t * vy);
    (dx*dx + dy*dy, t)
}

pub fn midpoint(a: Point, b: Point) -> Point {
    Point { x: 0.5 * (a.x + b.x), y: 0.5 * (a.y + b.y) }
}

pub fn same_point(a: Point, b: Point) -> bool {
    approx_eq(a.x, b.x, EPS_POS) && approx_eq(a.y, b.y, EPS_POS)
}

/// Axis-aligned rectangle normalised so that `min <= max` on both axes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub min: Point,
    pub max: Point,
}

impl Rect {
    pub fn from_corners(a: Point, b: Point) -> Self {
        Rect {
            min: Point { x: a.x.min(b.x), y: a.y.min(b.y) },
            max: Point { x: a.x.max(b.x), y: a.y.max(b.y) },
        }
    }

    pub fn around(c: Point, half_w: f64, half_h: f64) -> Self {
        Rect {
            min: Point { x: c.x - half_w, y: c.y - half_h },
            max: Point { x: c.x + half_w, y: c.y + half_h },
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn intersects(&self, o: &Rect) -> bool {
        self.min.x <= o.max.x && o.min.x <= self.max.x && self.min.y <= o.max.y && o.min.y <= self.max.y
    }

    pub fn width(&self) -> f64 { self.max.x - self.min.x }
    pub fn height(&self) -> f64 { self.max.y - self.min.y }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seg_distance_clamps_to_endpoints() {
        let (d2, t) = seg_distance_sq(Point::new(-3.0, 4.0), Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        assert_eq!(t, 0.0);
        assert!((d2 - 25.0).abs() < 1e-9);
        let (d2, t) = seg_distance_sq(Point::new(5.0, 2.0), Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        assert!((t - 0.5).abs() < 1e-9);
        assert!((d2 - 4.0).abs() < 1e-9);
    }

    #[test]
    fn rect_normalises_corners() {
        let r = Rect::from_corners(Point::new(10.0, 0.0), Point::new(0.0, 10.0));
        assert!(r.contains(Point::new(5.0, 5.0)));
        assert_eq!(r.width(), 10.0);
    }
}
