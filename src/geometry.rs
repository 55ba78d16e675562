//! Integer pixel geometry shared by the region controller, the selector and the renderer.
use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

/// A pixel position in frame coordinates.
pub type Point = Point2<i32>;

/// Componentwise displacement between two points.
pub type Offset = Vector2<i32>;

/// Axis-aligned box in (tlwh) format, frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingBox {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Build from corner coordinates, truncating towards zero.
    pub fn from_tlbr(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        let (x, y) = (x1 as i32, y1 as i32);
        Self::new(x, y, (x2 - x1) as i32, (y2 - y1) as i32)
    }

    /// Zero or negative extents cannot anchor a tracker.
    pub fn is_well_formed(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    pub fn top_left(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn bottom_right(&self) -> Point {
        Point::new(self.x + self.width, self.y + self.height)
    }
}

/// Horizontal bound a point can violate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Horizontal {
    Left,
    Right,
}

/// Vertical bound a point can violate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Vertical {
    Top,
    Bottom,
}

/// One side of a rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

/// The bounds a point lies beyond.
///
/// A point can only be past one bound per axis, so at most two sides are set
/// (a diagonal position yields one horizontal and one vertical flag).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Sides {
    pub horizontal: Option<Horizontal>,
    pub vertical: Option<Vertical>,
}

impl Sides {
    pub fn is_empty(&self) -> bool {
        self.horizontal.is_none() && self.vertical.is_none()
    }

    pub fn contains(&self, side: Side) -> bool {
        self.iter().any(|s| s == side)
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Horizontal flag first, then vertical.
    pub fn iter(&self) -> impl Iterator<Item = Side> {
        let h = self.horizontal.map(|h| match h {
            Horizontal::Left => Side::Left,
            Horizontal::Right => Side::Right,
        });
        let v = self.vertical.map(|v| match v {
            Vertical::Top => Side::Top,
            Vertical::Bottom => Side::Bottom,
        });
        h.into_iter().chain(v)
    }
}

/// Integer midpoint of a box, floor semantics.
pub fn center(bbox: &BoundingBox) -> Point {
    Point::new(
        bbox.x + bbox.width.div_euclid(2),
        bbox.y + bbox.height.div_euclid(2),
    )
}

/// Inclusive containment of `point` in the rectangle spanned by `top_left` and `bottom_right`.
pub fn contains(top_left: &Point, bottom_right: &Point, point: &Point) -> bool {
    (top_left.x..=bottom_right.x).contains(&point.x)
        && (top_left.y..=bottom_right.y).contains(&point.y)
}

/// `to - from`, componentwise.
pub fn offset(from: &Point, to: &Point) -> Offset {
    *to - *from
}

/// Which bound(s) of the rectangle the point violates. Empty when inside.
pub fn outside_side(top_left: &Point, bottom_right: &Point, point: &Point) -> Sides {
    let horizontal = if point.x < top_left.x {
        Some(Horizontal::Left)
    } else if point.x > bottom_right.x {
        Some(Horizontal::Right)
    } else {
        None
    };
    let vertical = if point.y < top_left.y {
        Some(Vertical::Top)
    } else if point.y > bottom_right.y {
        Some(Vertical::Bottom)
    } else {
        None
    };
    Sides { horizontal, vertical }
}
