use smallvec::SmallVec;

use crate::foundation::error::{FilmError, FilmResult};

/// Dense row-major f32 tensor of arbitrary rank.
///
/// Image blocks exchange data as rank-3 tensors shaped `(height, width, channels)`.
#[derive(Clone, Debug, PartialEq)]
pub struct TensorXf {
    shape: SmallVec<[usize; 4]>,
    data: Vec<f32>,
}

impl TensorXf {
    /// Wrap `data` with `shape`, checking that the element counts agree.
    pub fn new(shape: &[usize], data: Vec<f32>) -> FilmResult<Self> {
        let expected = shape
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .ok_or_else(|| FilmError::configuration("tensor shape overflows usize"))?;
        if expected != data.len() {
            return Err(FilmError::configuration(format!(
                "tensor shape {shape:?} expects {expected} elements, got {}",
                data.len()
            )));
        }
        Ok(Self {
            shape: SmallVec::from_slice(shape),
            data,
        })
    }

    /// Zero-filled tensor with `shape`.
    pub fn zeros(shape: &[usize]) -> Self {
        let len = shape.iter().product();
        Self {
            shape: SmallVec::from_slice(shape),
            data: vec![0.0; len],
        }
    }

    /// Number of dimensions.
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Extent of every dimension, outermost first.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Flat row-major contents.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Mutable flat row-major contents.
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Consume the tensor and return its flat contents.
    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }
}

#[cfg(test)]
#[path = "../../tests/unit/storage/tensor.rs"]
mod tests;
