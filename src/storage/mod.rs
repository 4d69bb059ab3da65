//! Flat f32 storage: the caller-facing tensor and the block-owned accumulation buffer.

pub(crate) mod buffer;
mod interop;
pub(crate) mod tensor;
