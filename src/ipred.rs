//! Intra prediction, portable versions.
//!
//! Kernels are generic over the bit depth class and the square block side
//! `N`, and write exactly `N`x`N` samples into `dst`.

use crate::include::common::bitdepth::BitDepth;
use crate::include::common::bitdepth::Pixel;
use crate::include::common::intops::avg2;
use crate::include::common::intops::avg3;
use crate::include::common::intops::round2;
use crate::include::common::intops::ulog2;
use crate::src::ipred_prepare::IntraEdge;
use crate::src::levels::BlockSize;
use crate::src::levels::IntraKernel;
use crate::src::strided::PlaneMut;

pub type IntraFn<P> = fn(dst: PlaneMut<'_, P>, edge: &IntraEdge<'_, P>, bitdepth_max: u32);

/// Expands to `Some($f::<$BD, N> as $T)` for the intra block sizes, `None`
/// otherwise.
macro_rules! for_each_intra_size {
    ($bsize:expr, $f:ident, $BD:ty, $T:ty) => {
        match $bsize {
            BlockSize::Block4x4 => Some($f::<$BD, 4> as $T),
            BlockSize::Block8x8 => Some($f::<$BD, 8> as $T),
            BlockSize::Block16x16 => Some($f::<$BD, 16> as $T),
            BlockSize::Block32x32 => Some($f::<$BD, 32> as $T),
            _ => None,
        }
    };
}

pub(crate) use for_each_intra_size;

#[inline(always)]
fn fill<P: Pixel, const N: usize>(mut dst: PlaneMut<'_, P>, value: P) {
    for y in 0..N {
        dst.row_mut(y, N).fill(value);
    }
}

#[inline(always)]
fn write_block<P: Pixel, const N: usize>(mut dst: PlaneMut<'_, P>, block: &[[P; N]; N]) {
    for (y, row) in block.iter().enumerate() {
        dst.row_mut(y, N).copy_from_slice(row);
    }
}

#[inline(always)]
pub(crate) fn sum<P: Pixel>(samples: &[P]) -> u32 {
    samples.iter().map(|&v| v.to_u32()).sum()
}

pub(crate) fn ipred_dc_rust<BD: BitDepth, const N: usize>(
    dst: PlaneMut<'_, BD::Pixel>,
    edge: &IntraEdge<'_, BD::Pixel>,
    _bitdepth_max: u32,
) {
    dst.debug_assert_fits(N, N);
    edge.debug_assert_fits(IntraKernel::Dc, N);
    let total = sum(edge.above(N)) + sum(edge.left(N));
    let dc = round2(total, ulog2(2 * N as u32));
    fill::<_, N>(dst, BD::Pixel::from_u32(dc));
}

pub(crate) fn ipred_dc_left_rust<BD: BitDepth, const N: usize>(
    dst: PlaneMut<'_, BD::Pixel>,
    edge: &IntraEdge<'_, BD::Pixel>,
    _bitdepth_max: u32,
) {
    dst.debug_assert_fits(N, N);
    edge.debug_assert_fits(IntraKernel::DcLeft, N);
    let dc = round2(sum(edge.left(N)), ulog2(N as u32));
    fill::<_, N>(dst, BD::Pixel::from_u32(dc));
}

pub(crate) fn ipred_dc_top_rust<BD: BitDepth, const N: usize>(
    dst: PlaneMut<'_, BD::Pixel>,
    edge: &IntraEdge<'_, BD::Pixel>,
    _bitdepth_max: u32,
) {
    dst.debug_assert_fits(N, N);
    edge.debug_assert_fits(IntraKernel::DcTop, N);
    let dc = round2(sum(edge.above(N)), ulog2(N as u32));
    fill::<_, N>(dst, BD::Pixel::from_u32(dc));
}

pub(crate) fn ipred_dc_128_rust<BD: BitDepth, const N: usize>(
    dst: PlaneMut<'_, BD::Pixel>,
    _edge: &IntraEdge<'_, BD::Pixel>,
    bitdepth_max: u32,
) {
    dst.debug_assert_fits(N, N);
    let bd = BD::new(bitdepth_max);
    fill::<_, N>(dst, bd.mid_pixel());
}

pub(crate) fn ipred_v_rust<BD: BitDepth, const N: usize>(
    mut dst: PlaneMut<'_, BD::Pixel>,
    edge: &IntraEdge<'_, BD::Pixel>,
    _bitdepth_max: u32,
) {
    dst.debug_assert_fits(N, N);
    edge.debug_assert_fits(IntraKernel::V, N);
    let above = edge.above(N);
    for y in 0..N {
        dst.row_mut(y, N).copy_from_slice(above);
    }
}

pub(crate) fn ipred_h_rust<BD: BitDepth, const N: usize>(
    mut dst: PlaneMut<'_, BD::Pixel>,
    edge: &IntraEdge<'_, BD::Pixel>,
    _bitdepth_max: u32,
) {
    dst.debug_assert_fits(N, N);
    edge.debug_assert_fits(IntraKernel::H, N);
    for (y, &l) in edge.left(N).iter().enumerate() {
        dst.row_mut(y, N).fill(l);
    }
}

pub(crate) fn ipred_tm_rust<BD: BitDepth, const N: usize>(
    mut dst: PlaneMut<'_, BD::Pixel>,
    edge: &IntraEdge<'_, BD::Pixel>,
    bitdepth_max: u32,
) {
    dst.debug_assert_fits(N, N);
    edge.debug_assert_fits(IntraKernel::Tm, N);
    let bd = BD::new(bitdepth_max);
    let above = edge.above(N);
    let top_left = edge.top_left.to_u32() as i32;
    for (y, &l) in edge.left(N).iter().enumerate() {
        let base = l.to_u32() as i32 - top_left;
        for (out, &a) in dst.row_mut(y, N).iter_mut().zip(above) {
            *out = bd.iclip_pixel(a.to_u32() as i32 + base);
        }
    }
}

fn ipred_d45_rust<BD: BitDepth, const N: usize>(
    dst: PlaneMut<'_, BD::Pixel>,
    edge: &IntraEdge<'_, BD::Pixel>,
    _bitdepth_max: u32,
) {
    dst.debug_assert_fits(N, N);
    edge.debug_assert_fits(IntraKernel::D45, N);
    let above = edge.above(2 * N);
    let a = |i: usize| above[i].to_u32();
    let last = above[2 * N - 1];
    let mut block = [[BD::Pixel::default(); N]; N];
    for (r, row) in block.iter_mut().enumerate() {
        for (c, out) in row.iter_mut().enumerate() {
            *out = if r + c + 2 < 2 * N {
                BD::Pixel::from_u32(avg3(a(r + c), a(r + c + 1), a(r + c + 2)))
            } else {
                last
            };
        }
    }
    write_block(dst, &block);
}

fn ipred_d117_rust<BD: BitDepth, const N: usize>(
    dst: PlaneMut<'_, BD::Pixel>,
    edge: &IntraEdge<'_, BD::Pixel>,
    _bitdepth_max: u32,
) {
    dst.debug_assert_fits(N, N);
    edge.debug_assert_fits(IntraKernel::D117, N);
    let above = edge.above(N);
    let left = edge.left(N);
    let tl = edge.top_left.to_u32();
    // A[-1] is the corner.
    let a = |i: isize| {
        if i < 0 {
            tl
        } else {
            above[i as usize].to_u32()
        }
    };
    let l = |i: usize| left[i].to_u32();
    let px = BD::Pixel::from_u32;

    let mut block = [[BD::Pixel::default(); N]; N];
    for c in 0..N {
        let c = c as isize;
        block[0][c as usize] = px(avg2(a(c - 1), a(c)));
    }
    block[1][0] = px(avg3(l(0), tl, a(0)));
    for c in 1..N {
        let c = c as isize;
        block[1][c as usize] = px(avg3(a(c - 2), a(c - 1), a(c)));
    }
    block[2][0] = px(avg3(tl, l(0), l(1)));
    for r in 3..N {
        block[r][0] = px(avg3(l(r - 3), l(r - 2), l(r - 1)));
    }
    for r in 2..N {
        for c in 1..N {
            block[r][c] = block[r - 2][c - 1];
        }
    }
    write_block(dst, &block);
}

fn ipred_d135_rust<BD: BitDepth, const N: usize>(
    dst: PlaneMut<'_, BD::Pixel>,
    edge: &IntraEdge<'_, BD::Pixel>,
    _bitdepth_max: u32,
) {
    dst.debug_assert_fits(N, N);
    edge.debug_assert_fits(IntraKernel::D135, N);
    let above = edge.above(N);
    let left = edge.left(N);
    let tl = edge.top_left.to_u32();
    let a = |i: isize| {
        if i < 0 {
            tl
        } else {
            above[i as usize].to_u32()
        }
    };
    let l = |i: usize| left[i].to_u32();
    let px = BD::Pixel::from_u32;

    let mut block = [[BD::Pixel::default(); N]; N];
    block[0][0] = px(avg3(l(0), tl, a(0)));
    for c in 1..N {
        let c = c as isize;
        block[0][c as usize] = px(avg3(a(c - 2), a(c - 1), a(c)));
    }
    block[1][0] = px(avg3(tl, l(0), l(1)));
    for r in 2..N {
        block[r][0] = px(avg3(l(r - 2), l(r - 1), l(r)));
    }
    for r in 1..N {
        for c in 1..N {
            block[r][c] = block[r - 1][c - 1];
        }
    }
    write_block(dst, &block);
}

/// The portable kernel for `kernel` at `bsize`, if `bsize` is an intra size.
pub(crate) fn ipred_rust<BD: BitDepth>(
    kernel: IntraKernel,
    bsize: BlockSize,
) -> Option<IntraFn<BD::Pixel>> {
    match kernel {
        IntraKernel::Dc => for_each_intra_size!(bsize, ipred_dc_rust, BD, IntraFn<BD::Pixel>),
        IntraKernel::DcLeft => {
            for_each_intra_size!(bsize, ipred_dc_left_rust, BD, IntraFn<BD::Pixel>)
        }
        IntraKernel::DcTop => {
            for_each_intra_size!(bsize, ipred_dc_top_rust, BD, IntraFn<BD::Pixel>)
        }
        IntraKernel::Dc128 => {
            for_each_intra_size!(bsize, ipred_dc_128_rust, BD, IntraFn<BD::Pixel>)
        }
        IntraKernel::V => for_each_intra_size!(bsize, ipred_v_rust, BD, IntraFn<BD::Pixel>),
        IntraKernel::H => for_each_intra_size!(bsize, ipred_h_rust, BD, IntraFn<BD::Pixel>),
        IntraKernel::Tm => for_each_intra_size!(bsize, ipred_tm_rust, BD, IntraFn<BD::Pixel>),
        IntraKernel::D45 => for_each_intra_size!(bsize, ipred_d45_rust, BD, IntraFn<BD::Pixel>),
        IntraKernel::D117 => {
            for_each_intra_size!(bsize, ipred_d117_rust, BD, IntraFn<BD::Pixel>)
        }
        IntraKernel::D135 => {
            for_each_intra_size!(bsize, ipred_d135_rust, BD, IntraFn<BD::Pixel>)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::include::common::bitdepth::BitDepth16;
    use crate::include::common::bitdepth::BitDepth8;

    const ABOVE: [u8; 8] = [10, 20, 30, 40, 50, 60, 70, 70];
    const LEFT: [u8; 4] = [10, 5, 15, 25];
    const TL: u8 = 10;

    fn predict8(kernel: IntraKernel) -> [[u8; 4]; 4] {
        let mut out = [0u8; 16];
        let edge = IntraEdge::new(TL, &ABOVE, &LEFT);
        let f = ipred_rust::<BitDepth8>(kernel, BlockSize::Block4x4).unwrap();
        f(PlaneMut::contiguous(&mut out, 4), &edge, 0xff);
        std::array::from_fn(|r| std::array::from_fn(|c| out[r * 4 + c]))
    }

    #[test]
    fn dc_4x4_rounds() {
        assert_eq!(predict8(IntraKernel::Dc), [[19; 4]; 4]);
        // (55 + 2) >> 2 = 14, (100 + 2) >> 2 = 25
        assert_eq!(predict8(IntraKernel::DcLeft), [[14; 4]; 4]);
        assert_eq!(predict8(IntraKernel::DcTop), [[25; 4]; 4]);
        assert_eq!(predict8(IntraKernel::Dc128), [[128; 4]; 4]);
    }

    #[test]
    fn tm_clamps() {
        let got = predict8(IntraKernel::Tm);
        assert_eq!(got[0], [10, 20, 30, 40]);
        assert_eq!(got[1], [5, 15, 25, 35]);
        assert_eq!(got[3], [25, 35, 45, 55]);

        let above = [1000u16; 4];
        let left = [1020u16, 0, 500, 512];
        let mut out = [0u16; 16];
        let edge = IntraEdge::new(512, &above, &left);
        let f = ipred_rust::<BitDepth16>(IntraKernel::Tm, BlockSize::Block4x4).unwrap();
        f(PlaneMut::contiguous(&mut out, 4), &edge, 0x3ff);
        assert_eq!(&out[..4], &[1023; 4]);
        assert_eq!(&out[4..8], &[488; 4]);
        assert_eq!(&out[12..], &[1000; 4]);
    }

    #[test]
    fn d45_4x4() {
        // avg3 over A = 10 20 30 40 50 60 70 70
        let got = predict8(IntraKernel::D45);
        assert_eq!(got[0], [20, 30, 40, 50]);
        assert_eq!(got[1], [30, 40, 50, 60]);
        assert_eq!(got[2], [40, 50, 60, 68]);
        assert_eq!(got[3], [50, 60, 68, 70]);
    }

    #[test]
    fn d117_4x4() {
        let got = predict8(IntraKernel::D117);
        // row 0: avg2(A[c-1], A[c]) with A[-1] = 10
        assert_eq!(got[0], [10, 15, 25, 35]);
        // row 1: avg3(L0, TL, A0) then avg3(A[c-2], A[c-1], A[c])
        assert_eq!(got[1], [10, 13, 20, 30]);
        // col 0: avg3(TL, L0, L1) = 9, avg3(L0, L1, L2) = 9
        assert_eq!(got[2], [9, 10, 15, 25]);
        assert_eq!(got[3], [9, 10, 13, 20]);
    }

    #[test]
    fn d135_4x4() {
        let got = predict8(IntraKernel::D135);
        assert_eq!(got[0], [10, 13, 20, 30]);
        assert_eq!(got[1], [9, 10, 13, 20]);
        assert_eq!(got[2], [9, 9, 10, 13]);
        assert_eq!(got[3], [15, 9, 9, 10]);
    }

    #[test]
    fn writes_only_block() {
        let mut out = [7u8; 8 * 10];
        let above = [1u8; 16];
        let left = [2u8; 8];
        let edge = IntraEdge::new(0, &above, &left);
        let f = ipred_rust::<BitDepth8>(IntraKernel::D45, BlockSize::Block8x8).unwrap();
        f(PlaneMut::new(&mut out, 1, 10), &edge, 0xff);
        for y in 0..8 {
            assert_eq!(out[y * 10], 7);
            assert_eq!(out[y * 10 + 9], 7);
            assert!(out[y * 10 + 1..y * 10 + 9].iter().all(|&v| v == 1));
        }
    }

    #[test]
    fn unsupported_size_has_no_kernel() {
        assert!(ipred_rust::<BitDepth8>(IntraKernel::V, BlockSize::Block64x64).is_none());
        assert!(ipred_rust::<BitDepth8>(IntraKernel::V, BlockSize::Block8x16).is_none());
    }
}
