//! Safe SIMD implementations of intra prediction.
//!
//! Covers the non-directional modes for 16x16 and 32x32 blocks. DC values
//! are summed in scalar code; the fill and the per-row arithmetic run in
//! 256-bit registers.

#![cfg_attr(not(feature = "unchecked"), forbid(unsafe_code))]

use core::arch::x86_64::*;

use archmage::arcane;
use archmage::Desktop64;

use crate::include::common::bitdepth::BitDepth;
use crate::include::common::bitdepth::BitDepth16;
use crate::include::common::bitdepth::BitDepth8;
use crate::include::common::bitdepth::Depth;
use crate::include::common::intops::round2;
use crate::include::common::intops::ulog2;
use crate::src::cpu::summon_avx2;
use crate::src::cpu::CpuFlags;
use crate::src::dsp::KernelFn;
use crate::src::dsp::Registry;
use crate::src::error::Error;
use crate::src::ipred::ipred_dc_128_rust;
use crate::src::ipred::ipred_dc_left_rust;
use crate::src::ipred::ipred_dc_rust;
use crate::src::ipred::ipred_dc_top_rust;
use crate::src::ipred::ipred_h_rust;
use crate::src::ipred::ipred_tm_rust;
use crate::src::ipred::ipred_v_rust;
use crate::src::ipred::sum;
use crate::src::ipred::IntraFn;
use crate::src::ipred_prepare::IntraEdge;
use crate::src::levels::BlockSize;
use crate::src::levels::IntraKernel;
use crate::src::levels::KernelKind;
use crate::src::safe_simd::pixel_access::loadu_128;
use crate::src::safe_simd::pixel_access::loadu_256;
use crate::src::safe_simd::pixel_access::storeu_128;
use crate::src::safe_simd::pixel_access::storeu_256;
use crate::src::strided::PlaneMut;

macro_rules! for_each_wide_intra_size {
    ($bsize:expr, $f:ident, $T:ty) => {
        match $bsize {
            BlockSize::Block16x16 => Some($f::<16> as $T),
            BlockSize::Block32x32 => Some($f::<32> as $T),
            _ => None,
        }
    };
}

// ============================================================================
// 8bpc
// ============================================================================

#[arcane]
fn fill_8bpc_inner(_token: Desktop64, dst: PlaneMut<'_, u8>, value: u8, n: usize) {
    let mut dst = dst;
    let v = _mm256_set1_epi8(value as i8);
    for y in 0..n {
        let row = dst.row_mut(y, n);
        if n == 16 {
            storeu_128!(row, [u8; 16], _mm256_castsi256_si128(v));
        } else {
            for x in (0..n).step_by(32) {
                storeu_256!(&mut row[x..x + 32], [u8; 32], v);
            }
        }
    }
}

#[arcane]
fn v_8bpc_inner(_token: Desktop64, dst: PlaneMut<'_, u8>, above: &[u8], n: usize) {
    let mut dst = dst;
    if n == 16 {
        let t = loadu_128!(&above[..16], [u8; 16]);
        for y in 0..n {
            storeu_128!(dst.row_mut(y, n), [u8; 16], t);
        }
    } else {
        let t = loadu_256!(&above[..32], [u8; 32]);
        for y in 0..n {
            storeu_256!(dst.row_mut(y, n), [u8; 32], t);
        }
    }
}

#[arcane]
fn h_8bpc_inner(_token: Desktop64, dst: PlaneMut<'_, u8>, left: &[u8], n: usize) {
    let mut dst = dst;
    for y in 0..n {
        let v = _mm256_set1_epi8(left[y] as i8);
        let row = dst.row_mut(y, n);
        if n == 16 {
            storeu_128!(row, [u8; 16], _mm256_castsi256_si128(v));
        } else {
            storeu_256!(row, [u8; 32], v);
        }
    }
}

/// `clip(above + left - top_left)`, 16 columns per step widened to i16.
#[arcane]
fn tm_8bpc_inner(
    _token: Desktop64,
    dst: PlaneMut<'_, u8>,
    above: &[u8],
    left: &[u8],
    top_left: u8,
    n: usize,
) {
    let mut dst = dst;
    let mut top = [_mm256_setzero_si256(); 2];
    for (i, t) in top.iter_mut().enumerate().take(n / 16) {
        *t = _mm256_cvtepu8_epi16(loadu_128!(&above[i * 16..i * 16 + 16], [u8; 16]));
    }
    for y in 0..n {
        let base = _mm256_set1_epi16(left[y] as i16 - top_left as i16);
        let row = dst.row_mut(y, n);
        for (i, t) in top.iter().enumerate().take(n / 16) {
            let sum = _mm256_add_epi16(*t, base);
            let packed = _mm256_packus_epi16(sum, sum);
            let packed = _mm256_permute4x64_epi64::<0b00_00_10_00>(packed);
            storeu_128!(
                &mut row[i * 16..i * 16 + 16],
                [u8; 16],
                _mm256_castsi256_si128(packed)
            );
        }
    }
}

fn ipred_dc_8bpc_avx2<const N: usize>(
    dst: PlaneMut<'_, u8>,
    edge: &IntraEdge<'_, u8>,
    bitdepth_max: u32,
) {
    dst.debug_assert_fits(N, N);
    edge.debug_assert_fits(IntraKernel::Dc, N);
    match summon_avx2() {
        Some(token) => {
            let total = sum(edge.above(N)) + sum(edge.left(N));
            let dc = round2(total, ulog2(2 * N as u32));
            fill_8bpc_inner(token, dst, dc as u8, N)
        }
        None => ipred_dc_rust::<BitDepth8, N>(dst, edge, bitdepth_max),
    }
}

fn ipred_dc_left_8bpc_avx2<const N: usize>(
    dst: PlaneMut<'_, u8>,
    edge: &IntraEdge<'_, u8>,
    bitdepth_max: u32,
) {
    dst.debug_assert_fits(N, N);
    edge.debug_assert_fits(IntraKernel::DcLeft, N);
    match summon_avx2() {
        Some(token) => {
            let dc = round2(sum(edge.left(N)), ulog2(N as u32));
            fill_8bpc_inner(token, dst, dc as u8, N)
        }
        None => ipred_dc_left_rust::<BitDepth8, N>(dst, edge, bitdepth_max),
    }
}

fn ipred_dc_top_8bpc_avx2<const N: usize>(
    dst: PlaneMut<'_, u8>,
    edge: &IntraEdge<'_, u8>,
    bitdepth_max: u32,
) {
    dst.debug_assert_fits(N, N);
    edge.debug_assert_fits(IntraKernel::DcTop, N);
    match summon_avx2() {
        Some(token) => {
            let dc = round2(sum(edge.above(N)), ulog2(N as u32));
            fill_8bpc_inner(token, dst, dc as u8, N)
        }
        None => ipred_dc_top_rust::<BitDepth8, N>(dst, edge, bitdepth_max),
    }
}

fn ipred_dc_128_8bpc_avx2<const N: usize>(
    dst: PlaneMut<'_, u8>,
    edge: &IntraEdge<'_, u8>,
    bitdepth_max: u32,
) {
    dst.debug_assert_fits(N, N);
    match summon_avx2() {
        Some(token) => fill_8bpc_inner(token, dst, 128, N),
        None => ipred_dc_128_rust::<BitDepth8, N>(dst, edge, bitdepth_max),
    }
}

fn ipred_v_8bpc_avx2<const N: usize>(
    dst: PlaneMut<'_, u8>,
    edge: &IntraEdge<'_, u8>,
    bitdepth_max: u32,
) {
    dst.debug_assert_fits(N, N);
    edge.debug_assert_fits(IntraKernel::V, N);
    match summon_avx2() {
        Some(token) => v_8bpc_inner(token, dst, edge.above(N), N),
        None => ipred_v_rust::<BitDepth8, N>(dst, edge, bitdepth_max),
    }
}

fn ipred_h_8bpc_avx2<const N: usize>(
    dst: PlaneMut<'_, u8>,
    edge: &IntraEdge<'_, u8>,
    bitdepth_max: u32,
) {
    dst.debug_assert_fits(N, N);
    edge.debug_assert_fits(IntraKernel::H, N);
    match summon_avx2() {
        Some(token) => h_8bpc_inner(token, dst, edge.left(N), N),
        None => ipred_h_rust::<BitDepth8, N>(dst, edge, bitdepth_max),
    }
}

fn ipred_tm_8bpc_avx2<const N: usize>(
    dst: PlaneMut<'_, u8>,
    edge: &IntraEdge<'_, u8>,
    bitdepth_max: u32,
) {
    dst.debug_assert_fits(N, N);
    edge.debug_assert_fits(IntraKernel::Tm, N);
    match summon_avx2() {
        Some(token) => tm_8bpc_inner(token, dst, edge.above(N), edge.left(N), edge.top_left, N),
        None => ipred_tm_rust::<BitDepth8, N>(dst, edge, bitdepth_max),
    }
}

fn lookup_8bpc(kernel: IntraKernel, bsize: BlockSize) -> Option<IntraFn<u8>> {
    match kernel {
        IntraKernel::Dc => for_each_wide_intra_size!(bsize, ipred_dc_8bpc_avx2, IntraFn<u8>),
        IntraKernel::DcLeft => {
            for_each_wide_intra_size!(bsize, ipred_dc_left_8bpc_avx2, IntraFn<u8>)
        }
        IntraKernel::DcTop => {
            for_each_wide_intra_size!(bsize, ipred_dc_top_8bpc_avx2, IntraFn<u8>)
        }
        IntraKernel::Dc128 => {
            for_each_wide_intra_size!(bsize, ipred_dc_128_8bpc_avx2, IntraFn<u8>)
        }
        IntraKernel::V => for_each_wide_intra_size!(bsize, ipred_v_8bpc_avx2, IntraFn<u8>),
        IntraKernel::H => for_each_wide_intra_size!(bsize, ipred_h_8bpc_avx2, IntraFn<u8>),
        IntraKernel::Tm => for_each_wide_intra_size!(bsize, ipred_tm_8bpc_avx2, IntraFn<u8>),
        IntraKernel::D45 | IntraKernel::D117 | IntraKernel::D135 => None,
    }
}

// ============================================================================
// 16bpc (10 and 12 bit share kernels; the clip bound comes from bitdepth_max)
// ============================================================================

#[arcane]
fn fill_16bpc_inner(_token: Desktop64, dst: PlaneMut<'_, u16>, value: u16, n: usize) {
    let mut dst = dst;
    let v = _mm256_set1_epi16(value as i16);
    for y in 0..n {
        let row = dst.row_mut(y, n);
        for x in (0..n).step_by(16) {
            storeu_256!(&mut row[x..x + 16], [u16; 16], v);
        }
    }
}

#[arcane]
fn v_16bpc_inner(_token: Desktop64, dst: PlaneMut<'_, u16>, above: &[u16], n: usize) {
    let mut dst = dst;
    let mut top = [_mm256_setzero_si256(); 2];
    for (i, t) in top.iter_mut().enumerate().take(n / 16) {
        *t = loadu_256!(&above[i * 16..i * 16 + 16], [u16; 16]);
    }
    for y in 0..n {
        let row = dst.row_mut(y, n);
        for (i, t) in top.iter().enumerate().take(n / 16) {
            storeu_256!(&mut row[i * 16..i * 16 + 16], [u16; 16], *t);
        }
    }
}

#[arcane]
fn h_16bpc_inner(_token: Desktop64, dst: PlaneMut<'_, u16>, left: &[u16], n: usize) {
    let mut dst = dst;
    for y in 0..n {
        let v = _mm256_set1_epi16(left[y] as i16);
        let row = dst.row_mut(y, n);
        for x in (0..n).step_by(16) {
            storeu_256!(&mut row[x..x + 16], [u16; 16], v);
        }
    }
}

/// Samples are at most 12 bits, so `above + left - top_left` fits in i16.
#[arcane]
fn tm_16bpc_inner(
    _token: Desktop64,
    dst: PlaneMut<'_, u16>,
    above: &[u16],
    left: &[u16],
    top_left: u16,
    n: usize,
    bitdepth_max: u32,
) {
    let mut dst = dst;
    let zero = _mm256_setzero_si256();
    let max = _mm256_set1_epi16(bitdepth_max as i16);
    let mut top = [zero; 2];
    for (i, t) in top.iter_mut().enumerate().take(n / 16) {
        *t = loadu_256!(&above[i * 16..i * 16 + 16], [u16; 16]);
    }
    for y in 0..n {
        let base = _mm256_set1_epi16(left[y] as i16 - top_left as i16);
        let row = dst.row_mut(y, n);
        for (i, t) in top.iter().enumerate().take(n / 16) {
            let v = _mm256_add_epi16(*t, base);
            let v = _mm256_min_epi16(_mm256_max_epi16(v, zero), max);
            storeu_256!(&mut row[i * 16..i * 16 + 16], [u16; 16], v);
        }
    }
}

fn ipred_dc_16bpc_avx2<const N: usize>(
    dst: PlaneMut<'_, u16>,
    edge: &IntraEdge<'_, u16>,
    bitdepth_max: u32,
) {
    dst.debug_assert_fits(N, N);
    edge.debug_assert_fits(IntraKernel::Dc, N);
    match summon_avx2() {
        Some(token) => {
            let total = sum(edge.above(N)) + sum(edge.left(N));
            let dc = round2(total, ulog2(2 * N as u32));
            fill_16bpc_inner(token, dst, dc as u16, N)
        }
        None => ipred_dc_rust::<BitDepth16, N>(dst, edge, bitdepth_max),
    }
}

fn ipred_dc_left_16bpc_avx2<const N: usize>(
    dst: PlaneMut<'_, u16>,
    edge: &IntraEdge<'_, u16>,
    bitdepth_max: u32,
) {
    dst.debug_assert_fits(N, N);
    edge.debug_assert_fits(IntraKernel::DcLeft, N);
    match summon_avx2() {
        Some(token) => {
            let dc = round2(sum(edge.left(N)), ulog2(N as u32));
            fill_16bpc_inner(token, dst, dc as u16, N)
        }
        None => ipred_dc_left_rust::<BitDepth16, N>(dst, edge, bitdepth_max),
    }
}

fn ipred_dc_top_16bpc_avx2<const N: usize>(
    dst: PlaneMut<'_, u16>,
    edge: &IntraEdge<'_, u16>,
    bitdepth_max: u32,
) {
    dst.debug_assert_fits(N, N);
    edge.debug_assert_fits(IntraKernel::DcTop, N);
    match summon_avx2() {
        Some(token) => {
            let dc = round2(sum(edge.above(N)), ulog2(N as u32));
            fill_16bpc_inner(token, dst, dc as u16, N)
        }
        None => ipred_dc_top_rust::<BitDepth16, N>(dst, edge, bitdepth_max),
    }
}

fn ipred_dc_128_16bpc_avx2<const N: usize>(
    dst: PlaneMut<'_, u16>,
    edge: &IntraEdge<'_, u16>,
    bitdepth_max: u32,
) {
    dst.debug_assert_fits(N, N);
    match summon_avx2() {
        Some(token) => {
            let mid = BitDepth16::new(bitdepth_max).mid_pixel();
            fill_16bpc_inner(token, dst, mid, N)
        }
        None => ipred_dc_128_rust::<BitDepth16, N>(dst, edge, bitdepth_max),
    }
}

fn ipred_v_16bpc_avx2<const N: usize>(
    dst: PlaneMut<'_, u16>,
    edge: &IntraEdge<'_, u16>,
    bitdepth_max: u32,
) {
    dst.debug_assert_fits(N, N);
    edge.debug_assert_fits(IntraKernel::V, N);
    match summon_avx2() {
        Some(token) => v_16bpc_inner(token, dst, edge.above(N), N),
        None => ipred_v_rust::<BitDepth16, N>(dst, edge, bitdepth_max),
    }
}

fn ipred_h_16bpc_avx2<const N: usize>(
    dst: PlaneMut<'_, u16>,
    edge: &IntraEdge<'_, u16>,
    bitdepth_max: u32,
) {
    dst.debug_assert_fits(N, N);
    edge.debug_assert_fits(IntraKernel::H, N);
    match summon_avx2() {
        Some(token) => h_16bpc_inner(token, dst, edge.left(N), N),
        None => ipred_h_rust::<BitDepth16, N>(dst, edge, bitdepth_max),
    }
}

fn ipred_tm_16bpc_avx2<const N: usize>(
    dst: PlaneMut<'_, u16>,
    edge: &IntraEdge<'_, u16>,
    bitdepth_max: u32,
) {
    dst.debug_assert_fits(N, N);
    edge.debug_assert_fits(IntraKernel::Tm, N);
    match summon_avx2() {
        Some(token) => tm_16bpc_inner(
            token,
            dst,
            edge.above(N),
            edge.left(N),
            edge.top_left,
            N,
            bitdepth_max,
        ),
        None => ipred_tm_rust::<BitDepth16, N>(dst, edge, bitdepth_max),
    }
}

fn lookup_16bpc(kernel: IntraKernel, bsize: BlockSize) -> Option<IntraFn<u16>> {
    match kernel {
        IntraKernel::Dc => for_each_wide_intra_size!(bsize, ipred_dc_16bpc_avx2, IntraFn<u16>),
        IntraKernel::DcLeft => {
            for_each_wide_intra_size!(bsize, ipred_dc_left_16bpc_avx2, IntraFn<u16>)
        }
        IntraKernel::DcTop => {
            for_each_wide_intra_size!(bsize, ipred_dc_top_16bpc_avx2, IntraFn<u16>)
        }
        IntraKernel::Dc128 => {
            for_each_wide_intra_size!(bsize, ipred_dc_128_16bpc_avx2, IntraFn<u16>)
        }
        IntraKernel::V => for_each_wide_intra_size!(bsize, ipred_v_16bpc_avx2, IntraFn<u16>),
        IntraKernel::H => for_each_wide_intra_size!(bsize, ipred_h_16bpc_avx2, IntraFn<u16>),
        IntraKernel::Tm => for_each_wide_intra_size!(bsize, ipred_tm_16bpc_avx2, IntraFn<u16>),
        IntraKernel::D45 | IntraKernel::D117 | IntraKernel::D135 => None,
    }
}

// ============================================================================
// Registration
// ============================================================================

pub(crate) fn register_8bpc_avx2(registry: &mut Registry<u8>) -> Result<(), Error> {
    register_with(registry, Depth::Eight, lookup_8bpc)
}

pub(crate) fn register_16bpc_avx2(registry: &mut Registry<u16>) -> Result<(), Error> {
    let depth = registry.depth();
    register_with(registry, depth, lookup_16bpc)
}

fn register_with<P: crate::include::common::bitdepth::Pixel>(
    registry: &mut Registry<P>,
    depth: Depth,
    lookup: fn(IntraKernel, BlockSize) -> Option<IntraFn<P>>,
) -> Result<(), Error> {
    use strum::IntoEnumIterator as _;

    for kernel in IntraKernel::iter() {
        let kind = KernelKind::Intra(kernel);
        for bsize in kind.sizes() {
            if let Some(f) = lookup(kernel, bsize) {
                registry.register_implementation(
                    kind,
                    bsize,
                    depth,
                    CpuFlags::AVX2,
                    "avx2",
                    KernelFn::Intra(f),
                )?;
            }
        }
    }
    Ok(())
}
