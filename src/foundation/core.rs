pub use kurbo::{Point, Vec2};

/// Interior dimensions of a block in pixels (border excluded).
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct BlockSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl BlockSize {
    /// Create a size from `width` and `height`.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Size grown by `border` pixels on all four sides.
    pub fn extended(self, border: u32) -> Self {
        Self {
            width: self.width + 2 * border,
            height: self.height + 2 * border,
        }
    }

    /// Number of pixels covered by this size.
    pub fn area(self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    pub(crate) fn as_i32(self) -> [i32; 2] {
        [self.width as i32, self.height as i32]
    }
}

impl std::fmt::Display for BlockSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.width, self.height)
    }
}

/// Integer position of a block's top-left interior pixel in parent image space.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct PixelOffset {
    /// Horizontal offset in pixels.
    pub x: i32,
    /// Vertical offset in pixels.
    pub y: i32,
}

impl PixelOffset {
    /// Create an offset from `x` and `y`.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Offset moved up-left by `border` pixels (the anchor of the padded buffer).
    pub(crate) fn padded_anchor(self, border: u32) -> [i32; 2] {
        [self.x - border as i32, self.y - border as i32]
    }
}

impl std::fmt::Display for PixelOffset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.x, self.y)
    }
}
