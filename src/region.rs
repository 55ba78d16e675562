use serde::Serialize;

use crate::geometry::{self, Offset, Point, Sides};

/// Where the target center lies relative to the reference region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "sides", rename_all = "lowercase")]
pub enum Classification {
    Inside,
    Outside(Sides),
}

impl Classification {
    pub fn is_inside(&self) -> bool {
        matches!(self, Classification::Inside)
    }
}

/// Fixed-size square the target should stay within.
///
/// Created once per session around the frame center; afterwards it is only
/// shifted, never resized or snapped back to an absolute position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReferenceRegion {
    top_left: Point,
    bottom_right: Point,
}

impl ReferenceRegion {
    /// Square of `side` pixels centered in a `width` x `height` frame.
    pub fn centered_in(width: i32, height: i32, side: i32) -> Self {
        let top_left = Point::new((width - side).div_euclid(2), (height - side).div_euclid(2));
        Self {
            top_left,
            bottom_right: top_left + Offset::new(side, side),
        }
    }

    pub fn top_left(&self) -> Point {
        self.top_left
    }

    pub fn bottom_right(&self) -> Point {
        self.bottom_right
    }

    pub fn side(&self) -> i32 {
        self.bottom_right.x - self.top_left.x
    }

    /// Integer midpoint of the two corners.
    pub fn center(&self) -> Point {
        Point::new(
            (self.top_left.x + self.bottom_right.x).div_euclid(2),
            (self.top_left.y + self.bottom_right.y).div_euclid(2),
        )
    }

    /// Shift both corners. No clamping to the frame is applied.
    pub fn recenter_by(&mut self, offset: Offset) {
        self.top_left += offset;
        self.bottom_right += offset;
    }

    pub fn classify(&self, point: &Point) -> Classification {
        if geometry::contains(&self.top_left, &self.bottom_right, point) {
            Classification::Inside
        } else {
            Classification::Outside(geometry::outside_side(
                &self.top_left,
                &self.bottom_right,
                point,
            ))
        }
    }
}
