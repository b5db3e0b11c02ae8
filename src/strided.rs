//! Strided 2-D views over caller-owned sample buffers.
//!
//! A plane is a (slice, base offset, signed stride) triple: row `y` starts at
//! `base + y * stride`. Strides may be smaller than, equal to or larger than
//! the block width, odd, or negative.

use crate::include::common::bitdepth::Pixel;
use crate::include::common::validate::validate_input;
use crate::src::error::Error;
use crate::src::safe_simd::pixel_access::row_slice;
use crate::src::safe_simd::pixel_access::row_slice_mut;

#[inline(always)]
fn row_offset(base: usize, stride: isize, y: usize) -> usize {
    let off = base as isize + y as isize * stride;
    debug_assert!(off >= 0, "row {y} starts before the buffer");
    off as usize
}

/// Span of sample indices touched by a `width`x`height` rectangle.
fn extent(base: usize, stride: isize, width: usize, height: usize) -> (isize, isize) {
    let first = base as isize;
    let last = base as isize + (height.max(1) as isize - 1) * stride;
    (first.min(last), first.max(last) + width as isize)
}

fn check_extent(
    len: usize,
    base: usize,
    stride: isize,
    width: usize,
    height: usize,
) -> Result<(), Error> {
    let (lo, hi) = extent(base, stride, width, height);
    let needed = hi.max(0) as usize;
    validate_input!(lo >= 0, Error::BufferTooSmall { needed, len });
    validate_input!(needed <= len, Error::BufferTooSmall { needed, len });
    Ok(())
}

/// Read-only plane view.
#[derive(Clone, Copy, Debug)]
pub struct PlaneRef<'a, P> {
    data: &'a [P],
    base: usize,
    stride: isize,
}

impl<'a, P: Pixel> PlaneRef<'a, P> {
    /// Rows are only bounds-checked when they are read.
    #[inline(always)]
    pub fn new(data: &'a [P], base: usize, stride: isize) -> Self {
        Self { data, base, stride }
    }

    /// Plane whose first row starts at index 0.
    #[inline(always)]
    pub fn contiguous(data: &'a [P], stride: usize) -> Self {
        Self::new(data, 0, stride as isize)
    }

    /// Validates that a `width`x`height` rectangle lies inside `data`.
    pub fn checked(
        data: &'a [P],
        base: usize,
        stride: isize,
        width: usize,
        height: usize,
    ) -> Result<Self, Error> {
        check_extent(data.len(), base, stride, width, height)?;
        Ok(Self::new(data, base, stride))
    }

    #[inline(always)]
    pub fn stride(&self) -> isize {
        self.stride
    }

    #[inline(always)]
    pub fn base(&self) -> usize {
        self.base
    }

    #[inline(always)]
    pub fn data(&self) -> &'a [P] {
        self.data
    }

    /// The first `width` samples of row `y`.
    #[inline(always)]
    pub(crate) fn row(&self, y: usize, width: usize) -> &'a [P] {
        row_slice(self.data, row_offset(self.base, self.stride, y), width)
    }

    pub fn with_stride(self, stride: isize) -> Self {
        Self { stride, ..self }
    }

    /// Moves the base by `delta` samples.
    pub fn offset(self, delta: isize) -> Self {
        let base = self.base as isize + delta;
        debug_assert!(base >= 0);
        Self {
            base: base as usize,
            ..self
        }
    }

    pub fn fits(&self, width: usize, height: usize) -> bool {
        check_extent(self.data.len(), self.base, self.stride, width, height).is_ok()
    }

    #[inline(always)]
    pub(crate) fn debug_assert_fits(&self, width: usize, height: usize) {
        debug_assert!(
            self.fits(width, height),
            "{width}x{height} block at base {} stride {} exceeds buffer of {}",
            self.base,
            self.stride,
            self.data.len()
        );
    }
}

/// Writable plane view.
#[derive(Debug)]
pub struct PlaneMut<'a, P> {
    data: &'a mut [P],
    base: usize,
    stride: isize,
}

impl<'a, P: Pixel> PlaneMut<'a, P> {
    #[inline(always)]
    pub fn new(data: &'a mut [P], base: usize, stride: isize) -> Self {
        Self { data, base, stride }
    }

    #[inline(always)]
    pub fn contiguous(data: &'a mut [P], stride: usize) -> Self {
        Self::new(data, 0, stride as isize)
    }

    pub fn checked(
        data: &'a mut [P],
        base: usize,
        stride: isize,
        width: usize,
        height: usize,
    ) -> Result<Self, Error> {
        check_extent(data.len(), base, stride, width, height)?;
        Ok(Self::new(data, base, stride))
    }

    #[inline(always)]
    pub fn stride(&self) -> isize {
        self.stride
    }

    #[inline(always)]
    pub(crate) fn row_mut(&mut self, y: usize, width: usize) -> &mut [P] {
        row_slice_mut(self.data, row_offset(self.base, self.stride, y), width)
    }

    #[inline(always)]
    pub(crate) fn row(&self, y: usize, width: usize) -> &[P] {
        row_slice(self.data, row_offset(self.base, self.stride, y), width)
    }

    /// Shorter-lived view of the same rectangle.
    #[inline(always)]
    pub fn reborrow(&mut self) -> PlaneMut<'_, P> {
        PlaneMut {
            data: &mut *self.data,
            base: self.base,
            stride: self.stride,
        }
    }

    pub fn view(&self) -> PlaneRef<'_, P> {
        PlaneRef::new(self.data, self.base, self.stride)
    }

    pub fn fits(&self, width: usize, height: usize) -> bool {
        check_extent(self.data.len(), self.base, self.stride, width, height).is_ok()
    }

    #[inline(always)]
    pub(crate) fn debug_assert_fits(&self, width: usize, height: usize) {
        debug_assert!(
            self.fits(width, height),
            "{width}x{height} block at base {} stride {} exceeds buffer of {}",
            self.base,
            self.stride,
            self.data.len()
        );
    }
}
