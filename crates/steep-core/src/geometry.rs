//! Rectangle, point, and size primitives used by the layout resolver and the
//! widget manager.
//!
//! All coordinates are terminal cells. Rectangles use half-open semantics:
//! the cell at `(right(), y)` is *outside* the rectangle, so adjacent
//! rectangles partition space without sharing boundary cells.

/// Errors raised when building geometry from untrusted, signed input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeometryError {
    /// Width or height was negative.
    #[error("invalid rectangle dimension {width}x{height}: extents must be non-negative")]
    InvalidDimension {
        /// The requested width.
        width: i32,
        /// The requested height.
        height: i32,
    },
}

/// A cell position.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    /// Column, 0-indexed.
    pub x: u16,
    /// Row, 0-indexed.
    pub y: u16,
}

impl Point {
    /// Create a point.
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }
}

/// A width/height pair, typically the terminal dimensions.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Size {
    /// Number of columns.
    pub width: u16,
    /// Number of rows.
    pub height: u16,
}

impl Size {
    /// Create a size.
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

/// Space reserved around the inside edge of a [`Rect`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Margin {
    /// Columns removed from both the left and the right edge.
    pub horizontal: u16,
    /// Rows removed from both the top and the bottom edge.
    pub vertical: u16,
}

impl Margin {
    /// Create a margin.
    pub const fn new(horizontal: u16, vertical: u16) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }

    /// The same margin on every side.
    pub const fn uniform(value: u16) -> Self {
        Self::new(value, value)
    }
}

/// An axis-aligned rectangle of terminal cells.
///
/// Zero-area rectangles are valid and mean "no space allocated".
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    /// Left column.
    pub x: u16,
    /// Top row.
    pub y: u16,
    /// Number of columns.
    pub width: u16,
    /// Number of rows.
    pub height: u16,
}

impl Rect {
    /// Create a rectangle from unsigned extents.
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build a rectangle from signed values, rejecting negative extents.
    ///
    /// Origins are clamped into `u16` range; extents that are negative yield
    /// [`GeometryError::InvalidDimension`].
    pub fn try_new(x: i32, y: i32, width: i32, height: i32) -> Result<Self, GeometryError> {
        if width < 0 || height < 0 {
            return Err(GeometryError::InvalidDimension { width, height });
        }
        let clamp = |v: i32| v.clamp(0, i32::from(u16::MAX)) as u16;
        Ok(Self::new(clamp(x), clamp(y), clamp(width), clamp(height)))
    }

    /// A rectangle anchored at the origin covering `size`.
    pub const fn from_size(size: Size) -> Self {
        Self::new(0, 0, size.width, size.height)
    }

    /// The rectangle's dimensions.
    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Number of cells covered.
    pub const fn area(&self) -> u32 {
        self.width as u32 * self.height as u32
    }

    /// Whether the rectangle covers no cells.
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// First column past the right edge.
    pub const fn right(&self) -> u16 {
        self.x.saturating_add(self.width)
    }

    /// First row past the bottom edge.
    pub const fn bottom(&self) -> u16 {
        self.y.saturating_add(self.height)
    }

    /// The center cell, rounded toward the origin.
    pub const fn center(&self) -> Point {
        Point::new(
            self.x.saturating_add(self.width / 2),
            self.y.saturating_add(self.height / 2),
        )
    }

    /// Whether `point` lies inside. Right and bottom edges are excluded.
    pub const fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    /// The overlapping region, or `None` when the rectangles share no area.
    ///
    /// Rectangles that merely touch along an edge do not overlap.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= x || bottom <= y {
            return None;
        }
        Some(Rect::new(x, y, right - x, bottom - y))
    }

    /// Whether the two rectangles share at least one cell.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.intersect(other).is_some()
    }

    /// The smallest rectangle covering both.
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(x, y, right - x, bottom - y)
    }

    /// Shrink by `margin` on every side, saturating at zero area.
    pub fn inner(&self, margin: Margin) -> Rect {
        let dx = margin.horizontal.saturating_mul(2);
        let dy = margin.vertical.saturating_mul(2);
        if self.width < dx || self.height < dy {
            return Rect::new(self.x, self.y, 0, 0);
        }
        Rect::new(
            self.x + margin.horizontal,
            self.y + margin.vertical,
            self.width - dx,
            self.height - dy,
        )
    }

    /// Grow by `margin` on every side, saturating at the coordinate limits.
    pub fn outer(&self, margin: Margin) -> Rect {
        let x = self.x.saturating_sub(margin.horizontal);
        let y = self.y.saturating_sub(margin.vertical);
        let right = self.right().saturating_add(margin.horizontal);
        let bottom = self.bottom().saturating_add(margin.vertical);
        Rect::new(x, y, right - x, bottom - y)
    }
}

impl From<ratatui::layout::Rect> for Rect {
    fn from(r: ratatui::layout::Rect) -> Self {
        Rect::new(r.x, r.y, r.width, r.height)
    }
}

impl From<Rect> for ratatui::layout::Rect {
    fn from(r: Rect) -> Self {
        ratatui::layout::Rect::new(r.x, r.y, r.width, r.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_extent_is_rejected() {
        assert_eq!(
            Rect::try_new(0, 0, -1, 5),
            Err(GeometryError::InvalidDimension {
                width: -1,
                height: 5
            })
        );
        assert!(Rect::try_new(0, 0, 3, -2).is_err());
    }

    #[test]
    fn zero_area_is_valid() {
        let r = Rect::try_new(4, 4, 0, 0).unwrap();
        assert!(r.is_empty());
        assert_eq!(r.area(), 0);
    }

    #[test]
    fn contains_is_half_open() {
        let r = Rect::new(0, 0, 10, 10);
        assert!(r.contains(Point::new(9, 9)));
        assert!(r.contains(Point::new(0, 0)));
        assert!(!r.contains(Point::new(10, 9)));
        assert!(!r.contains(Point::new(9, 10)));
    }

    #[test]
    fn adjacent_rects_do_not_overlap() {
        let left = Rect::new(0, 0, 5, 5);
        let right = Rect::new(5, 0, 5, 5);
        assert_eq!(left.intersect(&right), None);
        assert!(!left.intersects(&right));
    }

    #[test]
    fn overlapping_intersection() {
        let a = Rect::new(0, 0, 6, 6);
        let b = Rect::new(4, 2, 6, 6);
        assert_eq!(a.intersect(&b), Some(Rect::new(4, 2, 2, 4)));
    }

    #[test]
    fn union_covers_both() {
        let a = Rect::new(1, 1, 2, 2);
        let b = Rect::new(5, 0, 1, 6);
        assert_eq!(a.union(&b), Rect::new(1, 0, 5, 6));
    }

    #[test]
    fn right_bottom_center() {
        let r = Rect::new(2, 3, 10, 4);
        assert_eq!(r.right(), 12);
        assert_eq!(r.bottom(), 7);
        assert_eq!(r.center(), Point::new(7, 5));
    }

    #[test]
    fn inner_margin_saturates() {
        let r = Rect::new(0, 0, 10, 4);
        assert_eq!(r.inner(Margin::new(1, 1)), Rect::new(1, 1, 8, 2));
        assert!(r.inner(Margin::uniform(3)).is_empty());
    }

    #[test]
    fn outer_margin_grows() {
        let r = Rect::new(1, 1, 8, 2);
        assert_eq!(r.outer(Margin::new(1, 1)), Rect::new(0, 0, 10, 4));
        assert_eq!(r.outer(Margin::uniform(5)).x, 0);
    }

    #[test]
    fn ratatui_round_trip() {
        let r = Rect::new(3, 4, 5, 6);
        let rr: ratatui::layout::Rect = r.into();
        assert_eq!(Rect::from(rr), r);
    }
}
