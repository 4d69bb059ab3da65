use super::ReconstructionFilter;

/// Number of table entries covering `[0, radius)`.
pub const FILTER_RESOLUTION: usize = 31;

/// Wraps a filter with a precomputed lookup table for
/// [`eval_discretized`](ReconstructionFilter::eval_discretized).
///
/// [`eval`](ReconstructionFilter::eval) still forwards to the wrapped filter, so batched and
/// traced accumulation keep using the continuous curve.
#[derive(Clone, Debug)]
pub struct Discretized<F> {
    inner: F,
    scale: f32,
    values: [f32; FILTER_RESOLUTION + 1],
}

impl<F: ReconstructionFilter> Discretized<F> {
    /// Tabulate `inner` over its support radius.
    pub fn new(inner: F) -> Self {
        let scale = FILTER_RESOLUTION as f32 / inner.radius();
        let mut values = [0.0f32; FILTER_RESOLUTION + 1];
        for (i, v) in values.iter_mut().take(FILTER_RESOLUTION).enumerate() {
            *v = inner.eval(i as f32 / scale);
        }
        Self {
            inner,
            scale,
            values,
        }
    }

    /// The wrapped filter.
    pub fn inner(&self) -> &F {
        &self.inner
    }
}

impl<F: ReconstructionFilter> ReconstructionFilter for Discretized<F> {
    fn radius(&self) -> f32 {
        self.inner.radius()
    }

    fn border_size(&self) -> u32 {
        self.inner.border_size()
    }

    fn eval(&self, x: f32) -> f32 {
        self.inner.eval(x)
    }

    fn eval_discretized(&self, x: f32) -> f32 {
        let idx = ((x * self.scale).abs() as usize).min(FILTER_RESOLUTION);
        self.values[idx]
    }
}

#[cfg(test)]
#[path = "../../tests/unit/filter/discretized.rs"]
mod tests;
