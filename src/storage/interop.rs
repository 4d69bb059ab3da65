use image::{Rgb32FImage, Rgba32FImage};

use super::tensor::TensorXf;
use crate::foundation::error::{FilmError, FilmResult};

impl TensorXf {
    /// Copy a linear RGB float image into a `(height, width, 3)` tensor.
    pub fn from_rgb32f(img: &Rgb32FImage) -> Self {
        let shape = [img.height() as usize, img.width() as usize, 3];
        Self::new(&shape, img.as_raw().clone())
            .unwrap_or_else(|_| unreachable!("Rgb32FImage buffers always hold w*h*3 floats"))
    }

    /// Convert a `(height, width, channels)` tensor into an RGBA float image.
    ///
    /// One channel is replicated to gray, three channels get an opaque alpha, four are copied.
    pub fn to_rgba32f(&self) -> FilmResult<Rgba32FImage> {
        let &[height, width, channels] = self.shape() else {
            return Err(FilmError::configuration(format!(
                "to_rgba32f expects a 3D tensor (height x width x channels), got rank {}",
                self.ndim()
            )));
        };

        let mut rgba = Vec::with_capacity(height * width * 4);
        for px in self.as_slice().chunks_exact(channels.max(1)) {
            match channels {
                1 => rgba.extend_from_slice(&[px[0], px[0], px[0], 1.0]),
                3 => rgba.extend_from_slice(&[px[0], px[1], px[2], 1.0]),
                4 => rgba.extend_from_slice(px),
                n => {
                    return Err(FilmError::configuration(format!(
                        "to_rgba32f supports 1, 3 or 4 channels, got {n}"
                    )));
                }
            }
        }

        let w = u32::try_from(width).map_err(anyhow::Error::from)?;
        let h = u32::try_from(height).map_err(anyhow::Error::from)?;
        Rgba32FImage::from_raw(w, h, rgba)
            .ok_or_else(|| anyhow::anyhow!("rgba buffer does not match {w}x{h}").into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/storage/interop.rs"]
mod tests;
