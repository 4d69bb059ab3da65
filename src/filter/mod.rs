//! Reconstruction filters consumed by image blocks.
//!
//! Blocks only see the [`ReconstructionFilter`] contract. The concrete kernels here cover the
//! common cases and double as fixtures for tests and benches.

mod discretized;
mod kernels;

pub use discretized::{Discretized, FILTER_RESOLUTION};
pub use kernels::{BoxFilter, GaussianFilter, TentFilter};

/// Radius of the box filter. Blocks treat a filter with exactly this radius as absent.
pub const BOX_FILTER_RADIUS: f32 = 0.5;

/// Separable 1D reconstruction filter.
///
/// The 2D weight of a pixel at offset `(dx, dy)` from a sample is `eval(dx) * eval(dy)`.
pub trait ReconstructionFilter: std::fmt::Debug + Send + Sync {
    /// Support radius: `eval(x)` is zero for `|x| >= radius()`.
    fn radius(&self) -> f32;

    /// Padding a block needs on each side to splat samples near its edge.
    fn border_size(&self) -> u32 {
        (self.radius() - 0.5).ceil().max(0.0) as u32
    }

    /// Evaluate the filter at offset `x`.
    fn eval(&self, x: f32) -> f32;

    /// Table-based approximation of [`eval`](Self::eval), used by scalar accumulation.
    fn eval_discretized(&self, x: f32) -> f32 {
        self.eval(x)
    }
}
