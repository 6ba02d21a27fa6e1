//! Shelter-space geometry: points and axis-aligned rectangles.
//!
//! All rooms, shafts and agents share one coordinate space with the origin at
//! the Entrance room. `y` grows downward, so a room's `top` is its smallest `y`
//! and deeper floors have larger `y` values.

use serde::{Deserialize, Serialize};

/// 2D point / vector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_squared(&self, other: &Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn distance(&self, other: &Self) -> f32 {
        self.distance_squared(other).sqrt()
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len > 0.0 {
            Self {
                x: self.x / len,
                y: self.y / len,
            }
        } else {
            Self::ZERO
        }
    }

    /// Move toward `target` by at most `max_step`. Returns the new point and
    /// whether the target was reached.
    pub fn step_toward(&self, target: Vec2, max_step: f32) -> (Vec2, bool) {
        let diff = target - *self;
        let distance = diff.length();
        if distance <= max_step {
            (target, true)
        } else {
            (*self + diff.normalize() * max_step, false)
        }
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl std::ops::Mul<f32> for Vec2 {
    type Output = Self;
    fn mul(self, scalar: f32) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }
}

/// Axis-aligned rectangle given by its top-left corner and size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Height at which agents walk through the rectangle.
    pub fn walk_y(&self) -> f32 {
        self.center().y
    }

    /// Inclusive containment test.
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.left()
            && point.x <= self.right()
            && point.y >= self.top()
            && point.y <= self.bottom()
    }

    /// Whether `x` falls inside the horizontal extent.
    pub fn spans_x(&self, x: f32) -> bool {
        x >= self.left() && x <= self.right()
    }

    /// Whether the horizontal extents overlap or touch within `tolerance`.
    pub fn x_touches(&self, other: &Rect, tolerance: f32) -> bool {
        self.left() <= other.right() + tolerance && other.left() <= self.right() + tolerance
    }

    /// Clamp a point into the rectangle, keeping `margin` away from each side
    /// where the rectangle is wide enough.
    pub fn clamp_inside(&self, point: Vec2, margin: f32) -> Vec2 {
        let mx = margin.min(self.width / 2.0);
        let my = margin.min(self.height / 2.0);
        Vec2::new(
            point.x.clamp(self.left() + mx, self.right() - mx),
            point.y.clamp(self.top() + my, self.bottom() - my),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec2_operations() {
        let a = Vec2::new(1.0, 2.0);
        let b = Vec2::new(4.0, 6.0);

        let sum = a + b;
        assert_eq!(sum, Vec2::new(5.0, 8.0));
        assert_eq!((b - a).length(), 5.0);
        assert_eq!((a * 2.0).y, 4.0);
    }

    #[test]
    fn test_step_toward() {
        let start = Vec2::ZERO;
        let (next, arrived) = start.step_toward(Vec2::new(10.0, 0.0), 4.0);
        assert!(!arrived);
        assert!((next.x - 4.0).abs() < 0.001);

        let (next, arrived) = next.step_toward(Vec2::new(6.0, 0.0), 4.0);
        assert!(arrived);
        assert_eq!(next, Vec2::new(6.0, 0.0));
    }

    #[test]
    fn test_rect_edges() {
        let r = Rect::new(10.0, 20.0, 100.0, 50.0);
        assert_eq!(r.right(), 110.0);
        assert_eq!(r.bottom(), 70.0);
        assert_eq!(r.center(), Vec2::new(60.0, 45.0));
        assert!(r.contains(Vec2::new(10.0, 20.0)));
        assert!(!r.contains(Vec2::new(111.0, 30.0)));
    }

    #[test]
    fn test_x_touches() {
        let a = Rect::new(0.0, 0.0, 100.0, 50.0);
        let b = Rect::new(104.0, 0.0, 100.0, 50.0);
        assert!(a.x_touches(&b, 5.0));
        assert!(!a.x_touches(&b, 2.0));
    }

    #[test]
    fn test_clamp_inside() {
        let r = Rect::new(0.0, 0.0, 100.0, 50.0);
        let p = r.clamp_inside(Vec2::new(-20.0, 80.0), 5.0);
        assert_eq!(p, Vec2::new(5.0, 45.0));
    }
}
