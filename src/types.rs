//! Core types for spark-widgets.
//!
//! Geometry, size policies and colour. Everything in the tree, the layout
//! algorithms and the painter interface is expressed in these terms.

// =============================================================================
// Geometry
// =============================================================================

/// A point in some widget's coordinate space.
pub type Point = taffy::geometry::Point<f32>;

/// A width/height pair.
pub type Size = taffy::geometry::Size<f32>;

/// Per-edge insets (padding). `left`/`right`/`top`/`bottom`.
pub type Insets = taffy::geometry::Rect<f32>;

/// Shorthand constructor for [`Point`].
#[inline]
pub const fn point(x: f32, y: f32) -> Point {
    Point { x, y }
}

/// Shorthand constructor for [`Size`].
#[inline]
pub const fn size(width: f32, height: f32) -> Size {
    Size { width, height }
}

/// Same inset on every edge.
#[inline]
pub const fn insets(all: f32) -> Insets {
    Insets {
        left: all,
        right: all,
        top: all,
        bottom: all,
    }
}

/// Zero insets.
pub const NO_INSETS: Insets = insets(0.0);

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// A zero-sized rect at the origin.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    /// Create a new rectangle.
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle from an origin and a size.
    pub const fn from_origin_size(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn origin(&self) -> Point {
        point(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        size(self.width, self.height)
    }

    /// Half-open containment: the right and bottom edges are outside.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    /// True if the two rectangles overlap by a non-zero area.
    pub fn intersects(&self, other: &Self) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    pub fn translate(&self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Shrink by per-edge insets. Never produces a negative extent.
    pub fn inset(&self, by: Insets) -> Self {
        Self::new(
            self.x + by.left,
            self.y + by.top,
            (self.width - by.left - by.right).max(0.0),
            (self.height - by.top - by.bottom).max(0.0),
        )
    }
}

// =============================================================================
// Size policy / axis
// =============================================================================

/// How a widget's extent along one axis is decided during layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SizePolicy {
    /// Explicit size set with `resize`.
    #[default]
    Fixed,
    /// Claims leftover space in proportion to its flex weight.
    Expanding,
    /// Sized to whatever `measure` reports.
    Content,
}

/// Layout direction of a linear container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    /// The other axis.
    pub const fn cross(self) -> Self {
        match self {
            Self::Horizontal => Self::Vertical,
            Self::Vertical => Self::Horizontal,
        }
    }

    /// Extent of `s` along this axis.
    #[inline]
    pub fn of(self, s: Size) -> f32 {
        match self {
            Self::Horizontal => s.width,
            Self::Vertical => s.height,
        }
    }

    /// Coordinate of `p` along this axis.
    #[inline]
    pub fn coord(self, p: Point) -> f32 {
        match self {
            Self::Horizontal => p.x,
            Self::Vertical => p.y,
        }
    }

    /// Build a size from main/cross extents.
    #[inline]
    pub fn pack_size(self, main: f32, cross: f32) -> Size {
        match self {
            Self::Horizontal => size(main, cross),
            Self::Vertical => size(cross, main),
        }
    }

    /// Build a point from main/cross coordinates.
    #[inline]
    pub fn pack_point(self, main: f32, cross: f32) -> Point {
        match self {
            Self::Horizontal => point(main, cross),
            Self::Vertical => point(cross, main),
        }
    }

    /// Leading and trailing inset along this axis.
    #[inline]
    pub fn insets(self, i: Insets) -> (f32, f32) {
        match self {
            Self::Horizontal => (i.left, i.right),
            Self::Vertical => (i.top, i.bottom),
        }
    }
}

// =============================================================================
// Color
// =============================================================================

/// RGBA color with 8-bit channels.
///
/// Alpha 255 = fully opaque, 0 = fully transparent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque RGB color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const GRAY: Self = Self::rgb(128, 128, 128);

    #[inline]
    pub const fn is_opaque(&self) -> bool {
        self.a == 255
    }

    #[inline]
    pub const fn is_transparent(&self) -> bool {
        self.a == 0
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Alpha blend src over dst (Porter-Duff "over").
    pub fn blend(src: Self, dst: Self) -> Self {
        if src.is_opaque() {
            return src;
        }
        if src.is_transparent() {
            return dst;
        }

        let sa = i32::from(src.a);
        let da = i32::from(dst.a);
        let inv_sa = 255 - sa;

        // out_a = src_a + dst_a * (1 - src_a)
        let out_a = sa + (da * inv_sa) / 255;
        if out_a == 0 {
            return Self::TRANSPARENT;
        }

        let channel = |s: u8, d: u8| -> u8 {
            let v = (i32::from(s) * sa + i32::from(d) * da * inv_sa / 255) / out_a;
            v.clamp(0, 255) as u8
        };

        Self {
            r: channel(src.r, dst.r),
            g: channel(src.g, dst.g),
            b: channel(src.b, dst.b),
            a: out_a.clamp(0, 255) as u8,
        }
    }

    /// Linear interpolation between two colors, `t` clamped to `[0, 1]`.
    pub fn lerp(a: Self, b: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |x: u8, y: u8| -> u8 {
            (f32::from(x) + (f32::from(y) - f32::from(x)) * t).round() as u8
        };
        Self {
            r: mix(a.r, b.r),
            g: mix(a.g, b.g),
            b: mix(a.b, b.b),
            a: mix(a.a, b.a),
        }
    }

    /// Move towards white by `amount` (0.0 = unchanged, 1.0 = white). Alpha kept.
    pub fn lighten(self, amount: f32) -> Self {
        Self::lerp(self, Self::WHITE.with_alpha(self.a), amount)
    }

    /// Move towards black by `amount` (0.0 = unchanged, 1.0 = black). Alpha kept.
    pub fn darken(self, amount: f32) -> Self {
        Self::lerp(self, Self::BLACK.with_alpha(self.a), amount)
    }
}
