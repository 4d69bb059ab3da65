/// Per-block accumulation options.
///
/// Deserializes from JSON with every field optional, e.g. `{"normalize": true}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BlockOpts {
    /// Pad the block with `filter.border_size()` pixels on every side.
    pub border: bool,
    /// Rescale every splat (and gather) by the reciprocal of its total filter weight.
    pub normalize: bool,
    /// Use the fixed, position-snapped footprint for batched scatter.
    pub coalesce: bool,
    /// Warn about active samples with values below `-1e-5`.
    pub warn_negative: bool,
    /// Warn about active samples with non-finite values.
    pub warn_invalid: bool,
}

impl Default for BlockOpts {
    fn default() -> Self {
        Self {
            border: true,
            normalize: false,
            coalesce: false,
            warn_negative: false,
            warn_invalid: false,
        }
    }
}

/// What the caller's execution context can do, consulted once per batch call.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(default)]
pub struct ExecCaps {
    /// Samples may be processed concurrently and scatter into the same pixel.
    pub concurrent_scatter: bool,
    /// The per-sample loop must be a replayable trace with a data-independent trip count.
    pub trace_replay: bool,
}

impl ExecCaps {
    /// One sample at a time, plain adds.
    pub const SCALAR: Self = Self {
        concurrent_scatter: false,
        trace_replay: false,
    };
    /// Parallel, fully unrolled per-sample loops with atomic adds.
    pub const VECTORIZED: Self = Self {
        concurrent_scatter: true,
        trace_replay: false,
    };
    /// Parallel replay of a recorded uniform loop trace with atomic adds.
    pub const TRACED: Self = Self {
        concurrent_scatter: true,
        trace_replay: true,
    };
}

/// Accumulation strategy derived from [`ExecCaps`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecStrategy {
    /// Exact per-sample footprint, discretized filter weights, plain adds.
    Scalar,
    /// Conservative footprint with masked taps, continuous weights, atomic adds.
    Vectorized,
    /// Conservative footprint replayed from a [`LoopTrace`](crate::LoopTrace), atomic adds.
    Traced,
}

impl ExecStrategy {
    /// Pick the strategy for a call.
    pub fn select(caps: ExecCaps) -> Self {
        match (caps.concurrent_scatter, caps.trace_replay) {
            (_, true) => Self::Traced,
            (true, false) => Self::Vectorized,
            (false, false) => Self::Scalar,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/block/opts.rs"]
mod tests;
