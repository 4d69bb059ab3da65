//! splatfilm accumulates point-sampled contributions into filtered image tiles.
//!
//! An [`ImageBlock`] is a border-padded, channel-interleaved buffer. Renderers:
//!
//! - [`put`](ImageBlock::put) samples at continuous positions, weighted by a
//!   [`ReconstructionFilter`]
//! - [`read`](ImageBlock::read) filtered values back at continuous positions
//! - [`merge`](ImageBlock::merge) per-thread tiles into a larger film
//!
//! Batched calls ([`ImageBlock::put_batch`], [`ImageBlock::read_batch`]) pick a scalar,
//! vectorized or trace-replay strategy from [`ExecCaps`]; all three agree numerically.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod block;
/// Reconstruction filter contract and reference kernels.
pub mod filter;
mod foundation;
mod storage;

pub use crate::block::batch::{GatherBatch, SampleBatch, Splatter};
pub use crate::block::diag::{CollectingSink, DiagnosticSink, TracingSink};
pub use crate::block::image_block::ImageBlock;
pub use crate::block::opts::{BlockOpts, ExecCaps, ExecStrategy};
pub use crate::block::trace::{LoopTrace, TraceKind};
pub use crate::filter::{
    BoxFilter, Discretized, GaussianFilter, ReconstructionFilter, TentFilter,
};
pub use crate::foundation::core::{BlockSize, PixelOffset, Point, Vec2};
pub use crate::foundation::error::{FilmError, FilmResult};
pub use crate::storage::tensor::TensorXf;
