use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Flat f32 accumulation storage with both exclusive and atomic adds.
///
/// Values are stored as `AtomicU32` bit patterns so that a shared borrow can still accumulate
/// concurrently (`atomic_add`), while an exclusive borrow uses plain arithmetic (`add`).
#[derive(Debug)]
pub(crate) struct AccumBuffer {
    cells: Vec<AtomicU32>,
    // Set until the first write; lets merge copy instead of add.
    pristine: AtomicBool,
}

impl AccumBuffer {
    pub(crate) fn zeroed(len: usize) -> Self {
        let mut cells = Vec::with_capacity(len);
        cells.resize_with(len, || AtomicU32::new(0));
        Self {
            cells,
            pristine: AtomicBool::new(true),
        }
    }

    pub(crate) fn from_slice(values: &[f32]) -> Self {
        Self {
            cells: values.iter().map(|v| AtomicU32::new(v.to_bits())).collect(),
            pristine: AtomicBool::new(values.iter().all(|&v| v == 0.0)),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.cells.len()
    }

    pub(crate) fn is_pristine(&self) -> bool {
        self.pristine.load(Ordering::Relaxed)
    }

    pub(crate) fn get(&self, index: usize) -> f32 {
        f32::from_bits(self.cells[index].load(Ordering::Relaxed))
    }

    /// Add with exclusive access; no read-modify-write race is possible.
    pub(crate) fn add(&mut self, index: usize, value: f32) {
        let cell = self.cells[index].get_mut();
        *cell = (f32::from_bits(*cell) + value).to_bits();
        *self.pristine.get_mut() = false;
    }

    /// Add through a shared borrow using a compare-and-swap loop.
    pub(crate) fn atomic_add(&self, index: usize, value: f32) {
        // The closure always returns `Some`, so `fetch_update` cannot fail.
        let _ = self.cells[index].fetch_update(Ordering::Relaxed, Ordering::Relaxed, |bits| {
            Some((f32::from_bits(bits) + value).to_bits())
        });
        if self.pristine.load(Ordering::Relaxed) {
            self.pristine.store(false, Ordering::Relaxed);
        }
    }

    /// Overwrite every cell with `other`'s contents. Lengths must match.
    pub(crate) fn copy_from(&mut self, other: &AccumBuffer) {
        assert_eq!(self.len(), other.len(), "copy_from requires equal lengths");
        for (dst, src) in self.cells.iter_mut().zip(&other.cells) {
            *dst.get_mut() = src.load(Ordering::Relaxed);
        }
        *self.pristine.get_mut() = other.is_pristine();
    }

    pub(crate) fn to_vec(&self) -> Vec<f32> {
        self.cells
            .iter()
            .map(|c| f32::from_bits(c.load(Ordering::Relaxed)))
            .collect()
    }

    pub(crate) fn sum(&self) -> f64 {
        self.cells
            .iter()
            .map(|c| f64::from(f32::from_bits(c.load(Ordering::Relaxed))))
            .sum()
    }
}

/// Destination of per-pixel accumulation inside the splat kernels.
pub(crate) trait ScatterTarget {
    fn scatter_add(&mut self, index: usize, value: f32);
}

/// Plain adds through an exclusive borrow.
pub(crate) struct Exclusive<'a>(pub(crate) &'a mut AccumBuffer);

impl ScatterTarget for Exclusive<'_> {
    fn scatter_add(&mut self, index: usize, value: f32) {
        self.0.add(index, value);
    }
}

/// Atomic adds through a shared borrow; safe under concurrent writers.
#[derive(Clone, Copy)]
pub(crate) struct Atomic<'a>(pub(crate) &'a AccumBuffer);

impl ScatterTarget for Atomic<'_> {
    fn scatter_add(&mut self, index: usize, value: f32) {
        self.0.atomic_add(index, value);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/storage/buffer.rs"]
mod tests;
