//! Sum-of-absolute-differences kernels, portable versions.
//!
//! One monomorphized function per block size, so the dispatch table holds
//! plain function pointers with no size arguments.

use crate::include::common::bitdepth::Pixel;
use crate::include::common::intops::avg2;
use crate::src::strided::PlaneRef;

/// `sad(src, ref)` with the block size fixed by the implementation.
pub type SadFn<P> = fn(src: PlaneRef<'_, P>, reference: PlaneRef<'_, P>) -> u32;

/// Exact when the SAD is at most `max_cost`, otherwise some value above it.
pub type SadBoundedFn<P> =
    fn(src: PlaneRef<'_, P>, reference: PlaneRef<'_, P>, max_cost: u32) -> u32;

/// Exact SADs against four references sharing one stride.
pub type SadX4Fn<P> = fn(src: PlaneRef<'_, P>, refs: &[PlaneRef<'_, P>; 4]) -> [u32; 4];

/// SAD against `(ref + second_pred + 1) >> 1`, with `second_pred` packed at
/// stride = block width.
pub type SadAvgFn<P> =
    fn(src: PlaneRef<'_, P>, reference: PlaneRef<'_, P>, second_pred: &[P]) -> u32;

/// Expands to a `match` over every catalog size, instantiating
/// `$f::<$P, W, H>` as a `$T` function pointer.
macro_rules! for_each_block_size {
    ($bsize:expr, $f:ident, $P:ty, $T:ty) => {
        match $bsize {
            BlockSize::Block4x4 => $f::<$P, 4, 4> as $T,
            BlockSize::Block4x8 => $f::<$P, 4, 8> as $T,
            BlockSize::Block8x4 => $f::<$P, 8, 4> as $T,
            BlockSize::Block8x8 => $f::<$P, 8, 8> as $T,
            BlockSize::Block8x16 => $f::<$P, 8, 16> as $T,
            BlockSize::Block16x8 => $f::<$P, 16, 8> as $T,
            BlockSize::Block16x16 => $f::<$P, 16, 16> as $T,
            BlockSize::Block16x32 => $f::<$P, 16, 32> as $T,
            BlockSize::Block32x16 => $f::<$P, 32, 16> as $T,
            BlockSize::Block32x32 => $f::<$P, 32, 32> as $T,
            BlockSize::Block32x64 => $f::<$P, 32, 64> as $T,
            BlockSize::Block64x32 => $f::<$P, 64, 32> as $T,
            BlockSize::Block64x64 => $f::<$P, 64, 64> as $T,
        }
    };
}

pub(crate) use for_each_block_size;

#[inline(always)]
fn row_sad<P: Pixel>(src: &[P], reference: &[P]) -> u32 {
    src.iter()
        .zip(reference)
        .map(|(&s, &r)| s.to_u32().abs_diff(r.to_u32()))
        .sum()
}

#[inline(always)]
fn row_sad_avg<P: Pixel>(src: &[P], reference: &[P], second_pred: &[P]) -> u32 {
    src.iter()
        .zip(reference)
        .zip(second_pred)
        .map(|((&s, &r), &p)| s.to_u32().abs_diff(avg2(r.to_u32(), p.to_u32())))
        .sum()
}

pub(crate) fn sad_rust<P: Pixel, const W: usize, const H: usize>(
    src: PlaneRef<'_, P>,
    reference: PlaneRef<'_, P>,
) -> u32 {
    src.debug_assert_fits(W, H);
    reference.debug_assert_fits(W, H);
    (0..H).map(|y| row_sad(src.row(y, W), reference.row(y, W))).sum()
}

/// Stops after the first row that pushes the running sum past `max_cost`.
pub(crate) fn sad_bounded_rust<P: Pixel, const W: usize, const H: usize>(
    src: PlaneRef<'_, P>,
    reference: PlaneRef<'_, P>,
    max_cost: u32,
) -> u32 {
    src.debug_assert_fits(W, H);
    reference.debug_assert_fits(W, H);
    let mut sad = 0;
    for y in 0..H {
        sad += row_sad(src.row(y, W), reference.row(y, W));
        if sad > max_cost {
            break;
        }
    }
    sad
}

pub(crate) fn sad_x4_rust<P: Pixel, const W: usize, const H: usize>(
    src: PlaneRef<'_, P>,
    refs: &[PlaneRef<'_, P>; 4],
) -> [u32; 4] {
    debug_assert!(refs.iter().all(|r| r.stride() == refs[0].stride()));
    (*refs).map(|reference| sad_rust::<P, W, H>(src, reference))
}

pub(crate) fn sad_avg_rust<P: Pixel, const W: usize, const H: usize>(
    src: PlaneRef<'_, P>,
    reference: PlaneRef<'_, P>,
    second_pred: &[P],
) -> u32 {
    src.debug_assert_fits(W, H);
    reference.debug_assert_fits(W, H);
    debug_assert!(second_pred.len() >= W * H);
    (0..H)
        .map(|y| {
            row_sad_avg(
                src.row(y, W),
                reference.row(y, W),
                &second_pred[y * W..][..W],
            )
        })
        .sum()
}
