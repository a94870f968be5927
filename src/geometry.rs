//! Plain geometry value types shared by input, drag and output state

use serde::{Deserialize, Serialize};

/// A position in compositor or surface-local coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Offset from `other` to `self`
    pub fn delta_from(&self, other: Point) -> (f64, f64) {
        (self.x - other.x, self.y - other.y)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Rectangle for output geometry
///
/// Width and height are signed so that whatever the hardware discovery layer
/// reports is stored literally, including degenerate rectangles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_loc_and_size((x, y): (i32, i32), (width, height): (i32, i32)) -> Self {
        Self::new(x, y, width, height)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn contains(&self, point: Point) -> bool {
        !self.is_empty()
            && point.x >= self.x as f64
            && point.y >= self.y as f64
            && point.x < (self.x as i64 + self.width as i64) as f64
            && point.y < (self.y as i64 + self.height as i64) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_contains() {
        let rect = Rect::new(0, 0, 1920, 1080);
        assert!(rect.contains(Point::new(0.0, 0.0)));
        assert!(rect.contains(Point::new(1919.5, 1079.0)));
        assert!(!rect.contains(Point::new(1920.0, 10.0)));
        assert!(!rect.contains(Point::new(-1.0, 10.0)));
    }

    #[test]
    fn test_degenerate_rect_contains_nothing() {
        let rect = Rect::new(10, 10, 0, -5);
        assert!(rect.is_empty());
        assert!(!rect.contains(Point::new(10.0, 10.0)));
    }

    #[test]
    fn test_point_delta() {
        let a = Point::new(10.0, 20.0);
        let b = Point::new(4.0, 25.0);
        assert_eq!(a.delta_from(b), (6.0, -5.0));
    }
}
