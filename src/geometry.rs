//! Geometry value types for layout metadata
//!
//! Pure presentation data with no graph semantics. All types serialize with
//! `serde` so the layout codec can embed them in property lists.

use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// A point in 2D editor space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

// Vector-style arithmetic. The reference implementation's subtraction helper
// observably added its operands; this port implements true subtraction
// (see DESIGN.md).
impl Add for Point2D {
    type Output = Point2D;

    fn add(self, rhs: Point2D) -> Point2D {
        Point2D::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point2D {
    type Output = Point2D;

    fn sub(self, rhs: Point2D) -> Point2D {
        Point2D::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Width and height of a layout element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size2D {
    pub width: f64,
    pub height: f64,
}

impl Size2D {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub origin: Point2D,
    pub size: Size2D,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            origin: Point2D::new(x, y),
            size: Size2D::new(width, height),
        }
    }

    /// Centre point of the rectangle.
    pub fn center(&self) -> Point2D {
        Point2D::new(
            self.origin.x + self.size.width / 2.0,
            self.origin.y + self.size.height / 2.0,
        )
    }
}

/// An ellipse inscribed in a bounding rectangle (closed-state rendering).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Ellipse {
    pub frame: Rect,
}

/// A cubic bezier segment used for transition paths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BezierPath {
    pub start: Point2D,
    pub control1: Point2D,
    pub control2: Point2D,
    pub end: Point2D,
}

impl BezierPath {
    /// A straight segment between two points, control points at the thirds.
    pub fn straight(start: Point2D, end: Point2D) -> Self {
        let delta = end - start;
        Self {
            start,
            control1: start + Point2D::new(delta.x / 3.0, delta.y / 3.0),
            control2: start + Point2D::new(2.0 * delta.x / 3.0, 2.0 * delta.y / 3.0),
            end,
        }
    }
}
