//! Board-to-screen geometry.

use std::ops::{Add, Mul, Sub};

use crate::snapshot::{Hole, Snapshot};

/// A point (or offset) in screen units.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length_squared(self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    pub fn distance_squared(self, other: Point) -> f64 {
        (other - self).length_squared()
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

/// Maps board coordinates to screen coordinates.
///
/// The defaults describe an 800x400 canvas with the board centred on it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoardLayout {
    /// Screen position of board coordinate (0, 0)
    pub origin: Point,
    /// Screen units per board unit
    pub spacing: f64,
    /// Radius of a drawn hole, used for hit testing
    pub hole_radius: f64,
    /// Radius of a drawn stone, used for hit testing
    pub stone_radius: f64,
}

impl Default for BoardLayout {
    fn default() -> Self {
        Self {
            origin: Point::new(400.0, 200.0),
            spacing: 75.0,
            hole_radius: 35.0,
            stone_radius: 10.0,
        }
    }
}

impl BoardLayout {
    /// Nominal screen coordinate of a hole's centre.
    pub fn hole_center(&self, hole: &Hole) -> Point {
        self.origin + Point::new(hole.x, hole.y) * self.spacing
    }

    /// Index of the hole drawn under `point`, if any.
    pub fn hole_at(&self, snapshot: &Snapshot, point: Point) -> Option<usize> {
        let radius_sq = self.hole_radius * self.hole_radius;
        snapshot
            .board
            .holes
            .iter()
            .position(|hole| self.hole_center(hole).distance_squared(point) <= radius_sq)
    }
}

/// Offset inside a disc of `radius`, from two uniform samples in `[0, 1)`.
///
/// The square root keeps the spread even over the disc's area.
pub fn jitter_offset(radius: f64, u: f64, v: f64) -> Point {
    let r = radius * u.clamp(0.0, 1.0).sqrt();
    let theta = std::f64::consts::TAU * v;
    Point::new(r * theta.cos(), r * theta.sin())
}
