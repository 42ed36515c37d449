//! Geometry primitives shared by the editor and the page model
//!
//! All values are in points. Screen-side spaces (overlay, page view) are y-down;
//! page space is y-up with the origin at the bottom-left of the page. The types
//! here are space-agnostic; which space a value lives in is decided by the caller.

use serde::{Deserialize, Serialize};

/// A point in some 2-D coordinate space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    /// Create a new point
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Calculate distance to another point
    pub fn distance_to(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Width and height
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const ZERO: Size = Size { width: 0.0, height: 0.0 };

    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Multiply both dimensions by the same factor
    pub fn scaled(self, factor: f32) -> Self {
        Self::new(self.width * factor, self.height * factor)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Width divided by height, `None` when the height is zero
    pub fn aspect_ratio(&self) -> Option<f32> {
        if self.height == 0.0 {
            return None;
        }
        Some(self.width / self.height)
    }
}

/// Axis-aligned rectangle defined by its minimum corner and size
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub const ZERO: Rect = Rect { origin: Point::ZERO, size: Size::ZERO };

    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { origin: Point::new(x, y), size: Size::new(width, height) }
    }

    /// Rectangle of `size` whose midpoint is `center`
    pub fn from_center(center: Point, size: Size) -> Self {
        Self::new(center.x - size.width / 2.0, center.y - size.height / 2.0, size.width, size.height)
    }

    /// Smallest rectangle containing both points
    pub fn from_corners(a: Point, b: Point) -> Self {
        let min_x = a.x.min(b.x);
        let min_y = a.y.min(b.y);
        Self::new(min_x, min_y, (a.x - b.x).abs(), (a.y - b.y).abs())
    }

    pub fn min_x(&self) -> f32 {
        self.origin.x.min(self.origin.x + self.size.width)
    }

    pub fn max_x(&self) -> f32 {
        self.origin.x.max(self.origin.x + self.size.width)
    }

    pub fn min_y(&self) -> f32 {
        self.origin.y.min(self.origin.y + self.size.height)
    }

    pub fn max_y(&self) -> f32 {
        self.origin.y.max(self.origin.y + self.size.height)
    }

    pub fn mid_x(&self) -> f32 {
        self.origin.x + self.size.width / 2.0
    }

    pub fn mid_y(&self) -> f32 {
        self.origin.y + self.size.height / 2.0
    }

    pub fn width(&self) -> f32 {
        self.size.width.abs()
    }

    pub fn height(&self) -> f32 {
        self.size.height.abs()
    }

    pub fn center(&self) -> Point {
        Point::new(self.mid_x(), self.mid_y())
    }

    /// Same rectangle with non-negative width and height
    pub fn standardized(&self) -> Self {
        Self::new(self.min_x(), self.min_y(), self.width(), self.height())
    }

    /// Half-open containment: the min edges are inside, the max edges are not
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.min_x()
            && point.x < self.max_x()
            && point.y >= self.min_y()
            && point.y < self.max_y()
    }

    /// Shrink by `dx` on the left and right and `dy` on the top and bottom.
    ///
    /// The result never has a negative size; an over-inset collapses onto the center.
    pub fn inset(&self, dx: f32, dy: f32) -> Self {
        let rect = self.standardized();
        let size = Size::new((rect.size.width - 2.0 * dx).max(0.0), (rect.size.height - 2.0 * dy).max(0.0));
        Self::from_center(rect.center(), size)
    }

    /// The four corners, starting at the origin and going around
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.min_x(), self.min_y()),
            Point::new(self.max_x(), self.min_y()),
            Point::new(self.max_x(), self.max_y()),
            Point::new(self.min_x(), self.max_y()),
        ]
    }

    pub fn approx_eq(&self, other: &Rect, tolerance: f32) -> bool {
        (self.origin.x - other.origin.x).abs() <= tolerance
            && (self.origin.y - other.origin.y).abs() <= tolerance
            && (self.size.width - other.size.width).abs() <= tolerance
            && (self.size.height - other.size.height).abs() <= tolerance
    }
}

/// 2-D affine transform
///
/// Maps `(x, y)` to `(a*x + c*y + tx, b*x + d*y + ty)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub tx: f32,
    pub ty: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform { a: 1.0, b: 0.0, c: 0.0, d: 1.0, tx: 0.0, ty: 0.0 };

    pub fn translation(tx: f32, ty: f32) -> Self {
        Self { tx, ty, ..Self::IDENTITY }
    }

    /// Rotation by `radians` about the origin
    pub fn rotation(radians: f32) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self { a: cos, b: sin, c: -sin, d: cos, tx: 0.0, ty: 0.0 }
    }

    pub fn scale(sx: f32, sy: f32) -> Self {
        Self { a: sx, d: sy, ..Self::IDENTITY }
    }

    /// Rotation by `radians` about `pivot`
    pub fn rotation_about(pivot: Point, radians: f32) -> Self {
        Self::translation(-pivot.x, -pivot.y)
            .then(&Self::rotation(radians))
            .then(&Self::translation(pivot.x, pivot.y))
    }

    /// Transform that applies `self` first, then `next`
    pub fn then(&self, next: &Transform) -> Self {
        Self {
            a: self.a * next.a + self.b * next.c,
            b: self.a * next.b + self.b * next.d,
            c: self.c * next.a + self.d * next.c,
            d: self.c * next.b + self.d * next.d,
            tx: self.tx * next.a + self.ty * next.c + next.tx,
            ty: self.tx * next.b + self.ty * next.d + next.ty,
        }
    }

    pub fn determinant(&self) -> f32 {
        self.a * self.d - self.b * self.c
    }

    /// Inverse transform, `None` when the transform is singular
    pub fn inverse(&self) -> Option<Self> {
        let det = self.determinant();
        if det.abs() < f32::EPSILON {
            return None;
        }

        Some(Self {
            a: self.d / det,
            b: -self.b / det,
            c: -self.c / det,
            d: self.a / det,
            tx: (self.c * self.ty - self.d * self.tx) / det,
            ty: (self.b * self.tx - self.a * self.ty) / det,
        })
    }

    pub fn apply(&self, point: Point) -> Point {
        Point::new(
            self.a * point.x + self.c * point.y + self.tx,
            self.b * point.x + self.d * point.y + self.ty,
        )
    }

    /// Axis-aligned bounding box of the transformed rectangle
    pub fn apply_rect(&self, rect: Rect) -> Rect {
        let corners = rect.corners().map(|corner| self.apply(corner));
        let mut min = corners[0];
        let mut max = corners[0];
        for corner in &corners[1..] {
            min.x = min.x.min(corner.x);
            min.y = min.y.min(corner.y);
            max.x = max.x.max(corner.x);
            max.y = max.y.max(corner.y);
        }
        Rect::from_corners(min, max)
    }

    /// Rotation angle encoded in the linear part
    pub fn rotation_angle(&self) -> f32 {
        self.b.atan2(self.a)
    }
}
