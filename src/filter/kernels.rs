use super::{BOX_FILTER_RADIUS, ReconstructionFilter};

/// One-pixel box filter.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoxFilter;

impl ReconstructionFilter for BoxFilter {
    fn radius(&self) -> f32 {
        BOX_FILTER_RADIUS
    }

    fn eval(&self, x: f32) -> f32 {
        if x.abs() <= BOX_FILTER_RADIUS { 1.0 } else { 0.0 }
    }
}

/// Triangle ("tent") filter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TentFilter {
    radius: f32,
}

impl TentFilter {
    /// Tent filter with the given support radius (must be > 0).
    pub fn new(radius: f32) -> Self {
        Self { radius }
    }
}

impl Default for TentFilter {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl ReconstructionFilter for TentFilter {
    fn radius(&self) -> f32 {
        self.radius
    }

    fn eval(&self, x: f32) -> f32 {
        (1.0 - x.abs() / self.radius).max(0.0)
    }
}

/// Truncated Gaussian, shifted down so it reaches zero exactly at `4 * stddev`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GaussianFilter {
    stddev: f32,
    radius: f32,
    alpha: f32,
    bias: f32,
}

impl GaussianFilter {
    /// Gaussian with standard deviation `stddev` (must be > 0).
    pub fn new(stddev: f32) -> Self {
        let radius = 4.0 * stddev;
        let alpha = -1.0 / (2.0 * stddev * stddev);
        let bias = (alpha * radius * radius).exp();
        Self {
            stddev,
            radius,
            alpha,
            bias,
        }
    }

    /// Standard deviation in pixels.
    pub fn stddev(&self) -> f32 {
        self.stddev
    }
}

impl Default for GaussianFilter {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl ReconstructionFilter for GaussianFilter {
    fn radius(&self) -> f32 {
        self.radius
    }

    fn eval(&self, x: f32) -> f32 {
        ((self.alpha * x * x).exp() - self.bias).max(0.0)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/filter/kernels.rs"]
mod tests;
