//! Screen geometry used by element snapshots, spatial filtering and hint placement.
//!
//! All coordinates are global screen coordinates with the origin at the top-left
//! of the primary display and `y` growing downwards.

/// A point in global screen coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: i32,
    /// Vertical coordinate.
    pub y: i32,
}

impl Point {
    /// Construct a point.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Translate by the given deltas, saturating at the `i32` range.
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }
}

/// Width and height of an element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Size {
    /// Horizontal extent.
    pub width: i32,
    /// Vertical extent.
    pub height: i32,
}

impl Size {
    /// Construct a size.
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// True when either side is zero or negative.
    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

/// Axis-aligned rectangle covering `[min, max)` on both axes.
///
/// Frames reported by accessibility bindings can be arbitrarily large, so edge
/// arithmetic saturates instead of overflowing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    /// Top-left corner.
    pub origin: Point,
    /// Extent from the origin.
    pub size: Size,
}

impl Rect {
    /// Construct a rectangle from origin and extent.
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    /// Construct a rectangle from an origin point and a size.
    pub const fn from_parts(origin: Point, size: Size) -> Self {
        Self { origin, size }
    }

    /// Left edge (inclusive).
    pub const fn min_x(&self) -> i32 {
        self.origin.x
    }

    /// Top edge (inclusive).
    pub const fn min_y(&self) -> i32 {
        self.origin.y
    }

    /// Right edge (exclusive).
    pub const fn max_x(&self) -> i32 {
        self.origin.x.saturating_add(self.size.width)
    }

    /// Bottom edge (exclusive).
    pub const fn max_y(&self) -> i32 {
        self.origin.y.saturating_add(self.size.height)
    }

    /// Width of the rectangle.
    pub const fn width(&self) -> i32 {
        self.size.width
    }

    /// Height of the rectangle.
    pub const fn height(&self) -> i32 {
        self.size.height
    }

    /// True when the rectangle has no area.
    pub const fn is_empty(&self) -> bool {
        self.size.is_empty()
    }

    /// Centre point, rounded towards the origin.
    pub const fn center(&self) -> Point {
        Point::new(
            self.origin.x.saturating_add(self.size.width / 2),
            self.origin.y.saturating_add(self.size.height / 2),
        )
    }

    /// True when both rectangles have area and share at least one interior point.
    pub const fn overlaps(&self, other: &Self) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.min_x() < other.max_x()
            && other.min_x() < self.max_x()
            && self.min_y() < other.max_y()
            && other.min_y() < self.max_y()
    }

    /// True when `p` lies inside the rectangle.
    pub const fn contains(&self, p: Point) -> bool {
        p.x >= self.min_x() && p.x < self.max_x() && p.y >= self.min_y() && p.y < self.max_y()
    }

    /// Grow the rectangle by `pad` on every side.
    pub const fn expand(&self, pad: i32) -> Self {
        Self::new(
            self.origin.x.saturating_sub(pad),
            self.origin.y.saturating_sub(pad),
            self.size.width.saturating_add(pad.saturating_mul(2)),
            self.size.height.saturating_add(pad.saturating_mul(2)),
        )
    }
}
