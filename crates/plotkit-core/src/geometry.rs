//! Plot geometry primitives
//!
//! Points are in millimeters once they leave the optimizer's scale stage and in
//! SVG user units before that. Paths are plain point vectors whose order is the
//! pen-down drawing order.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Sub};

/// A 2D point or vector
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl Point {
    /// Create a new point
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Point) -> f64 {
        (*self - *other).length()
    }

    /// Length when read as a vector
    pub fn length(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Dot product when read as vectors
    pub fn dot(&self, other: &Point) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Unit vector in the same direction, or zero for a zero vector
    pub fn normalize(&self) -> Point {
        let len = self.length();
        if len == 0.0 {
            Point::default()
        } else {
            Point::new(self.x / len, self.y / len)
        }
    }

    /// Linear interpolation towards `other`
    pub fn lerp(&self, other: &Point, t: f64) -> Point {
        *self + (*other - *self) * t
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;

    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3})", self.x, self.y)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Point::new(x, y)
    }
}

/// A pen-down polyline
pub type Path = Vec<Point>;

/// Paths in plot order
pub type PathList = Vec<Path>;

/// Total polyline length of a path
pub fn path_length(path: &[Point]) -> f64 {
    path.windows(2).map(|w| w[0].distance(&w[1])).sum()
}

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Minimum X
    pub min_x: f64,
    /// Minimum Y
    pub min_y: f64,
    /// Maximum X
    pub max_x: f64,
    /// Maximum Y
    pub max_y: f64,
}

impl Bounds {
    /// Create bounds from two corners
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Create bounds from origin and size
    pub fn from_rect(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    /// Smallest bounds covering every point of every path, `None` when empty
    pub fn of_paths(paths: &[Path]) -> Option<Self> {
        let mut points = paths.iter().flatten();
        let first = points.next()?;
        let mut bounds = Bounds::new(first.x, first.y, first.x, first.y);
        for p in points {
            bounds.include(p);
        }
        Some(bounds)
    }

    /// Grow to include a point
    pub fn include(&mut self, p: &Point) {
        self.min_x = self.min_x.min(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_x = self.max_x.max(p.x);
        self.max_y = self.max_y.max(p.y);
    }

    /// Width
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Center point
    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Check if a point lies inside (inclusive)
    pub fn contains(&self, p: &Point) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }
}
