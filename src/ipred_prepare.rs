//! Border context for intra prediction.

use crate::include::common::bitdepth::Depth;
use crate::include::common::bitdepth::Pixel;
use crate::include::common::validate::validate_input;
use crate::src::error::Error;
use crate::src::levels::BlockSize;
use crate::src::levels::IntraKernel;
use crate::src::levels::IntraMode;
use crate::src::levels::KernelKind;
use crate::src::safe_simd::pixel_access::row_slice;

/// Largest intra block side.
pub const MAX_INTRA_SIZE: usize = 32;

/// Read-only neighbors of the block being predicted.
///
/// `above` starts at the sample directly above the first column. D45 reads
/// `2n` above samples, every other mode at most `n`. Non-DC modes read the
/// edges regardless of availability; callers substitute missing neighbors
/// first (see [`EdgeBuffer`]).
#[derive(Clone, Copy, Debug)]
pub struct IntraEdge<'a, P> {
    pub top_left: P,
    pub above: &'a [P],
    pub left: &'a [P],
    pub have_above: bool,
    pub have_left: bool,
}

impl<'a, P: Pixel> IntraEdge<'a, P> {
    /// Edge with both neighbors available.
    pub fn new(top_left: P, above: &'a [P], left: &'a [P]) -> Self {
        Self {
            top_left,
            above,
            left,
            have_above: true,
            have_left: true,
        }
    }

    pub fn with_availability(self, have_above: bool, have_left: bool) -> Self {
        Self {
            have_above,
            have_left,
            ..self
        }
    }

    #[inline(always)]
    pub(crate) fn above(&self, n: usize) -> &'a [P] {
        row_slice(self.above, 0, n)
    }

    #[inline(always)]
    pub(crate) fn left(&self, n: usize) -> &'a [P] {
        row_slice(self.left, 0, n)
    }

    /// The table kernel realizing `mode` for this edge's availability.
    pub fn kernel_for(&self, mode: IntraMode) -> IntraKernel {
        match (mode, self.have_above, self.have_left) {
            (IntraMode::Dc, true, true) => IntraKernel::Dc,
            (IntraMode::Dc, true, false) => IntraKernel::DcTop,
            (IntraMode::Dc, false, true) => IntraKernel::DcLeft,
            (IntraMode::Dc, false, false) => IntraKernel::Dc128,
            (mode, _, _) => IntraKernel::from(mode),
        }
    }

    /// Checks that the edge holds every sample `kernel` reads at `bsize`.
    pub fn check(&self, kernel: IntraKernel, bsize: BlockSize) -> Result<(), Error> {
        KernelKind::Intra(kernel).check(bsize)?;
        let n = bsize.width();
        let above_len = kernel.above_len(n);
        let left_len = kernel.left_len(n);
        validate_input!(
            self.above.len() >= above_len,
            Error::BufferTooSmall {
                needed: above_len,
                len: self.above.len(),
            }
        );
        validate_input!(
            self.left.len() >= left_len,
            Error::BufferTooSmall {
                needed: left_len,
                len: self.left.len(),
            }
        );
        Ok(())
    }

    #[inline(always)]
    pub(crate) fn debug_assert_fits(&self, kernel: IntraKernel, n: usize) {
        debug_assert!(self.above.len() >= kernel.above_len(n));
        debug_assert!(self.left.len() >= kernel.left_len(n));
    }
}

/// Owned, complete border built from whatever neighbors exist.
///
/// Missing above rows read as `2^(bd-1) - 1`, missing left columns as
/// `2^(bd-1) + 1`, and the above row is extended to `2n` samples by
/// repeating its last available sample.
#[derive(Clone, Debug)]
pub struct EdgeBuffer<P> {
    top_left: P,
    above: [P; 2 * MAX_INTRA_SIZE],
    left: [P; MAX_INTRA_SIZE],
    n: usize,
    have_above: bool,
    have_left: bool,
}

impl<P: Pixel> EdgeBuffer<P> {
    /// `top_left` is only used when both neighbors exist.
    pub fn build(
        depth: Depth,
        bsize: BlockSize,
        above: Option<&[P]>,
        left: Option<&[P]>,
        top_left: P,
    ) -> Result<Self, Error> {
        KernelKind::Intra(IntraKernel::Dc).check(bsize)?;
        validate_input!(P::stores(depth), Error::StorageMismatch { depth });
        let n = bsize.width();
        let below_mid = P::from_u32(depth.mid_value() - 1);
        let above_mid = P::from_u32(depth.mid_value() + 1);

        let mut buf = Self {
            top_left: below_mid,
            above: [below_mid; 2 * MAX_INTRA_SIZE],
            left: [above_mid; MAX_INTRA_SIZE],
            n,
            have_above: false,
            have_left: false,
        };

        if let Some(row) = above.filter(|row| !row.is_empty()) {
            let len = row.len().min(2 * n);
            buf.above[..len].copy_from_slice(&row[..len]);
            let last = row[len - 1];
            buf.above[len..2 * n].fill(last);
            buf.have_above = true;
        }
        if let Some(col) = left.filter(|col| !col.is_empty()) {
            let len = col.len().min(n);
            buf.left[..len].copy_from_slice(&col[..len]);
            let last = col[len - 1];
            buf.left[len..n].fill(last);
            buf.have_left = true;
        }
        buf.top_left = match (buf.have_above, buf.have_left) {
            (false, _) => below_mid,
            (true, false) => above_mid,
            (true, true) => top_left,
        };
        Ok(buf)
    }

    pub fn edge(&self) -> IntraEdge<'_, P> {
        IntraEdge {
            top_left: self.top_left,
            above: &self.above[..2 * self.n],
            left: &self.left[..self.n],
            have_above: self.have_above,
            have_left: self.have_left,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dc_variant_follows_availability() {
        let above = [0u8; 8];
        let left = [0u8; 4];
        let edge = IntraEdge::new(0, &above, &left);
        assert_eq!(edge.kernel_for(IntraMode::Dc), IntraKernel::Dc);
        let edge = edge.with_availability(false, true);
        assert_eq!(edge.kernel_for(IntraMode::Dc), IntraKernel::DcLeft);
        let edge = edge.with_availability(true, false);
        assert_eq!(edge.kernel_for(IntraMode::Dc), IntraKernel::DcTop);
        let edge = edge.with_availability(false, false);
        assert_eq!(edge.kernel_for(IntraMode::Dc), IntraKernel::Dc128);
        assert_eq!(edge.kernel_for(IntraMode::Tm), IntraKernel::Tm);
    }

    #[test]
    fn check_reports_short_edges() {
        let above = [0u16; 4];
        let left = [0u16; 4];
        let edge = IntraEdge::new(0, &above, &left);
        assert!(edge.check(IntraKernel::V, BlockSize::Block4x4).is_ok());
        assert_eq!(
            edge.check(IntraKernel::D45, BlockSize::Block4x4),
            Err(Error::BufferTooSmall { needed: 8, len: 4 })
        );
        assert!(edge.check(IntraKernel::V, BlockSize::Block8x4).is_err());
    }

    #[test]
    fn missing_neighbors_use_vp8_fill() {
        let buf = EdgeBuffer::<u8>::build(Depth::Eight, BlockSize::Block4x4, None, None, 50)
            .unwrap();
        let edge = buf.edge();
        assert_eq!(edge.top_left, 127);
        assert!(edge.above.iter().all(|&v| v == 127));
        assert!(edge.left.iter().all(|&v| v == 129));
        assert!(!edge.have_above && !edge.have_left);

        let above = [400u16, 401, 402, 403];
        let buf = EdgeBuffer::build(
            Depth::Ten,
            BlockSize::Block4x4,
            Some(&above[..]),
            None,
            7,
        )
        .unwrap();
        let edge = buf.edge();
        assert_eq!(edge.top_left, 513);
        assert_eq!(edge.above, &[400, 401, 402, 403, 403, 403, 403, 403]);
        assert!(edge.left.iter().all(|&v| v == 513));
    }

    #[test]
    fn build_rejects_wrong_storage() {
        assert_eq!(
            EdgeBuffer::<u8>::build(Depth::Twelve, BlockSize::Block8x8, None, None, 0)
                .unwrap_err(),
            Error::StorageMismatch {
                depth: Depth::Twelve
            }
        );
    }
}
