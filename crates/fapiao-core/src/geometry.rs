//! Axis-aligned rectangles over document coordinates.
//!
//! OCR boxes arrive as raw `[left, top, right, bottom]` lists. Nothing here
//! enforces `left <= right` or `top <= bottom`; degenerate rectangles are legal
//! and simply match less.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A rectangle in document pixel units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    /// Create a rectangle from its four edges.
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Build a rectangle from a raw `[left, top, right, bottom]` box.
    ///
    /// Returns `None` unless the slice has exactly four values.
    pub fn from_bbox(bbox: &[i32]) -> Option<Self> {
        match *bbox {
            [left, top, right, bottom] => Some(Self::new(left, top, right, bottom)),
            _ => None,
        }
    }

    /// Check whether a raw box lies entirely inside this rectangle.
    ///
    /// Edges may coincide. A box of the wrong arity is never contained.
    pub fn contains(&self, bbox: &[i32]) -> bool {
        Self::from_bbox(bbox).is_some_and(|other| self.contains_rect(&other))
    }

    /// Check whether another rectangle lies entirely inside this one.
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.left >= self.left
            && other.top >= self.top
            && other.right <= self.right
            && other.bottom <= self.bottom
    }

    /// Check whether two rectangles overlap. Touching edges count as overlap.
    pub fn intersects(&self, other: &Rect) -> bool {
        !(self.left > other.right
            || self.top > other.bottom
            || self.bottom < other.top
            || self.right < other.left)
    }

    /// Horizontal extent (may be negative for degenerate rectangles).
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    /// Vertical extent (may be negative for degenerate rectangles).
    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {}, {}",
            self.left, self.top, self.right, self.bottom
        )
    }
}

/// A rectangle expressed as percentages (0-100) of a reference rectangle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelativeRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl RelativeRect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }
}

/// Resolve a relative rectangle to absolute coordinates inside `reference`.
///
/// Each edge is `origin + floor(extent * percent / 100)`. A missing relative
/// rectangle resolves to the zero rectangle.
pub fn resolve(reference: &Rect, relative: Option<&RelativeRect>) -> Rect {
    let Some(relative) = relative else {
        return Rect::default();
    };

    let width = i64::from(reference.width());
    let height = i64::from(reference.height());

    Rect::new(
        interpolate(reference.left, width, relative.left),
        interpolate(reference.top, height, relative.top),
        interpolate(reference.left, width, relative.right),
        interpolate(reference.top, height, relative.bottom),
    )
}

fn interpolate(origin: i32, extent: i64, percent: i32) -> i32 {
    let offset = (extent * i64::from(percent)).div_euclid(100);
    (i64::from(origin) + offset).clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}
