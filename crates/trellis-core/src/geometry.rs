//! Cell geometry: parent-relative placement and absolute screen rectangles.

/// A component's resolved placement.
///
/// `x`/`y` are offsets from the parent's origin (the root's offset is
/// absolute). Extents are whole terminal cells.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub width: u16,
    pub height: u16,
}

impl Geometry {
    pub const fn new(x: i32, y: i32, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Place this geometry at an absolute origin.
    pub fn at(&self, origin_x: i32, origin_y: i32) -> Bounds {
        Bounds {
            x: origin_x,
            y: origin_y,
            width: self.width,
            height: self.height,
        }
    }
}

/// An absolute rectangle on the screen.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: u16,
    pub height: u16,
}

impl Bounds {
    pub const fn new(x: i32, y: i32, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn right(&self) -> i32 {
        self.x + i32::from(self.width)
    }

    pub fn bottom(&self) -> i32 {
        self.y + i32::from(self.height)
    }

    /// `true` when `other` lies entirely inside `self` (shared edges count).
    ///
    /// An empty rectangle never contains anything and is never contained.
    pub fn contains(&self, other: &Bounds) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// `true` when the cell at `(x, y)` lies inside the rectangle.
    pub fn contains_cell(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// `true` when the two rectangles share at least one cell.
    pub fn intersects(&self, other: &Bounds) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}
