// File: crates/export-skia/src/types.rs
// Summary: Shared chart sizes and paddings, in logical pixels.

/// Default logical chart width.
pub const WIDTH: u32 = 800;
/// Default logical chart height.
pub const HEIGHT: u32 = 450;

/// Margins around the plot area, in logical pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Insets {
    pub left: u32,
    pub right: u32,
    pub top: u32,
    pub bottom: u32,
}

impl Insets {
    pub const fn new(left: u32, right: u32, top: u32, bottom: u32) -> Self {
        Self { left, right, top, bottom }
    }
    /// Total horizontal inset (left + right).
    pub const fn hsum(&self) -> u32 { self.left + self.right }
    /// Total vertical inset (top + bottom).
    pub const fn vsum(&self) -> u32 { self.top + self.bottom }
}

impl Default for Insets {
    /// Room for y tick labels on the left, the title on top, x ticks below.
    fn default() -> Self {
        Self::new(64, 24, 44, 40)
    }
}
