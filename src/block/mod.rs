//! Accumulation blocks: splat, gather and merge over a bordered tile.

pub(crate) mod batch;
pub(crate) mod diag;
pub(crate) mod footprint;
pub(crate) mod gather;
pub(crate) mod image_block;
pub(crate) mod merge;
pub(crate) mod opts;
pub(crate) mod splat;
pub(crate) mod trace;
