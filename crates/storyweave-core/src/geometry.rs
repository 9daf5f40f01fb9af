//! Geometric primitives for scenario layout and positioning.
//!
//! # Overview
//!
//! - [`Point`] - A 2D coordinate in canvas space
//! - [`Size`] - Width and height dimensions
//! - [`Bounds`] - A rectangular bounding box defined by minimum and maximum coordinates
//! - [`Insets`] - Padding/margin values for four sides
//!
//! # Coordinate System
//!
//! Storyweave uses a coordinate system consistent with SVG:
//!
//! ```text
//!   (0,0) ────────► +X
//!     │
//!     │
//!     ▼
//!    +Y
//! ```
//!
//! Every node position produced by the
//! layout engine is the **top-left** corner of the node box.

/// A 2D point representing a position in canvas coordinate space.
///
/// # Examples
///
/// ```
/// # use storyweave_core::geometry::Point;
/// let p1 = Point::new(10.0, 20.0);
/// let p2 = Point::new(5.0, 5.0);
///
/// let sum = p1.add_point(p2);
/// assert_eq!(sum.x(), 15.0);
/// assert_eq!(sum.y(), 25.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    x: f32,
    y: f32,
}

impl Point {
    /// Creates a new point with the specified coordinates
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns the x-coordinate of the point
    pub fn x(self) -> f32 {
        self.x
    }

    /// Returns the y-coordinate of the point
    pub fn y(self) -> f32 {
        self.y
    }

    /// Creates a new point with the specified x-coordinate
    pub fn with_x(mut self, x: f32) -> Self {
        self.x = x;
        self
    }

    /// Creates a new point with the specified y-coordinate
    pub fn with_y(mut self, y: f32) -> Self {
        self.y = y;
        self
    }

    /// Adds another point to this point, returning a new point.
    pub fn add_point(self, other: Point) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

/// Represents the dimensions of an element with width and height
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    width: f32,
    height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Returns the width dimension of this size
    pub fn width(self) -> f32 {
        self.width
    }

    /// Returns the height dimension of this size
    pub fn height(self) -> f32 {
        self.height
    }
}

/// Represents a rectangular bounding box with minimum and maximum coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
}

impl Bounds {
    /// Creates a new bounds from a top-left point and a size
    pub fn new_from_top_left(top_left: Point, size: Size) -> Self {
        Self {
            min_x: top_left.x,
            min_y: top_left.y,
            max_x: top_left.x + size.width,
            max_y: top_left.y + size.height,
        }
    }

    /// Creates the smallest bounds containing both points
    pub fn new_from_points(a: Point, b: Point) -> Self {
        Self {
            min_x: a.x.min(b.x),
            min_y: a.y.min(b.y),
            max_x: a.x.max(b.x),
            max_y: a.y.max(b.y),
        }
    }

    /// Returns the minimum x-coordinate of the bounds
    pub fn min_x(self) -> f32 {
        self.min_x
    }

    /// Returns the minimum y-coordinate of the bounds
    pub fn min_y(self) -> f32 {
        self.min_y
    }

    /// Returns the maximum x-coordinate of the bounds
    pub fn max_x(self) -> f32 {
        self.max_x
    }

    /// Returns the maximum y-coordinate of the bounds
    pub fn max_y(self) -> f32 {
        self.max_y
    }

    /// Returns the width of the bounds
    pub fn width(self) -> f32 {
        self.max_x - self.min_x
    }

    /// Returns the height of the bounds
    pub fn height(self) -> f32 {
        self.max_y - self.min_y
    }

    /// Returns the top-left corner as a Point
    pub fn min_point(self) -> Point {
        Point {
            x: self.min_x,
            y: self.min_y,
        }
    }

    /// Merges two bounds to create a larger bounds that contains both.
    ///
    /// # Examples
    ///
    /// ```
    /// # use storyweave_core::geometry::{Bounds, Point, Size};
    /// let root = Bounds::new_from_top_left(Point::new(0.0, 0.0), Size::new(121.0, 32.0));
    /// let child = Bounds::new_from_top_left(Point::new(150.0, 88.0), Size::new(121.0, 32.0));
    ///
    /// let combined = root.merge(&child);
    /// assert_eq!(combined.width(), 271.0);
    /// assert_eq!(combined.height(), 120.0);
    /// ```
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Expands the bounds by adding insets.
    pub fn add_padding(&self, insets: Insets) -> Self {
        Self {
            min_x: self.min_x - insets.left(),
            min_y: self.min_y - insets.top(),
            max_x: self.max_x + insets.right(),
            max_y: self.max_y + insets.bottom(),
        }
    }
}

/// Represents spacing around an element (padding, margin, etc.)
/// with potentially different values for each side
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Insets {
    top: f32,
    right: f32,
    bottom: f32,
    left: f32,
}

impl Insets {
    /// Creates new insets with specified values for each side
    pub fn new(top: f32, right: f32, bottom: f32, left: f32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Creates uniform insets with the same value for all sides
    pub fn uniform(value: f32) -> Self {
        Self::new(value, value, value, value)
    }

    /// Returns the top inset value
    pub fn top(self) -> f32 {
        self.top
    }

    /// Returns the right inset value
    pub fn right(self) -> f32 {
        self.right
    }

    /// Returns the bottom inset value
    pub fn bottom(self) -> f32 {
        self.bottom
    }

    /// Returns the left inset value
    pub fn left(self) -> f32 {
        self.left
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    #[test]
    fn test_point_new() {
        let point = Point::new(3.5, 4.2);
        assert_approx_eq!(f32, point.x(), 3.5);
        assert_approx_eq!(f32, point.y(), 4.2);
    }

    #[test]
    fn test_point_with_coordinates() {
        let point = Point::new(1.0, 2.0).with_x(10.0).with_y(20.0);
        assert_eq!(point, Point::new(10.0, 20.0));
    }

    #[test]
    fn test_bounds_from_top_left() {
        let bounds = Bounds::new_from_top_left(Point::new(5.0, 10.0), Size::new(121.0, 32.0));
        assert_approx_eq!(f32, bounds.min_x(), 5.0);
        assert_approx_eq!(f32, bounds.min_y(), 10.0);
        assert_approx_eq!(f32, bounds.max_x(), 126.0);
        assert_approx_eq!(f32, bounds.max_y(), 42.0);
        assert_eq!(bounds.min_point(), Point::new(5.0, 10.0));
    }

    #[test]
    fn test_bounds_from_points_normalizes_order() {
        let bounds = Bounds::new_from_points(Point::new(50.0, 10.0), Point::new(20.0, 80.0));
        assert_approx_eq!(f32, bounds.min_x(), 20.0);
        assert_approx_eq!(f32, bounds.min_y(), 10.0);
        assert_approx_eq!(f32, bounds.width(), 30.0);
        assert_approx_eq!(f32, bounds.height(), 70.0);
    }

    #[test]
    fn test_bounds_padding() {
        let bounds = Bounds::new_from_top_left(Point::new(5.0, -5.0), Size::new(10.0, 10.0))
            .add_padding(Insets::new(1.0, 2.0, 3.0, 4.0));

        assert_approx_eq!(f32, bounds.min_x(), 1.0);
        assert_approx_eq!(f32, bounds.min_y(), -6.0);
        assert_approx_eq!(f32, bounds.max_x(), 17.0);
        assert_approx_eq!(f32, bounds.max_y(), 8.0);
    }

    #[test]
    fn test_insets_uniform() {
        let insets = Insets::uniform(7.0);
        assert_eq!(insets, Insets::new(7.0, 7.0, 7.0, 7.0));
    }
}

#[cfg(test)]
mod proptest_tests {
    use float_cmp::approx_eq;
    use proptest::prelude::*;

    use super::*;

    fn bounds_strategy() -> impl Strategy<Value = Bounds> {
        (
            -1000.0f32..1000.0,
            -1000.0f32..1000.0,
            1.0f32..500.0,
            1.0f32..500.0,
        )
            .prop_map(|(x, y, w, h)| Bounds::new_from_top_left(Point::new(x, y), Size::new(w, h)))
    }

    /// Bounds merge should be commutative: a.merge(b) == b.merge(a).
    fn check_bounds_merge_is_commutative(b1: Bounds, b2: Bounds) -> Result<(), TestCaseError> {
        let merged1 = b1.merge(&b2);
        let merged2 = b2.merge(&b1);

        prop_assert!(approx_eq!(f32, merged1.min_x(), merged2.min_x()));
        prop_assert!(approx_eq!(f32, merged1.min_y(), merged2.min_y()));
        prop_assert!(approx_eq!(f32, merged1.max_x(), merged2.max_x()));
        prop_assert!(approx_eq!(f32, merged1.max_y(), merged2.max_y()));
        Ok(())
    }

    /// Merged bounds should contain both original bounds.
    fn check_bounds_merge_contains_both(b1: Bounds, b2: Bounds) -> Result<(), TestCaseError> {
        let merged = b1.merge(&b2);

        for b in [b1, b2] {
            prop_assert!(merged.min_x() <= b.min_x() + 0.001);
            prop_assert!(merged.min_y() <= b.min_y() + 0.001);
            prop_assert!(merged.max_x() >= b.max_x() - 0.001);
            prop_assert!(merged.max_y() >= b.max_y() - 0.001);
        }
        Ok(())
    }

    proptest! {
        #[test]
        fn bounds_merge_is_commutative(b1 in bounds_strategy(), b2 in bounds_strategy()) {
            check_bounds_merge_is_commutative(b1, b2)?;
        }

        #[test]
        fn bounds_merge_contains_both(b1 in bounds_strategy(), b2 in bounds_strategy()) {
            check_bounds_merge_contains_both(b1, b2)?;
        }
    }
}
