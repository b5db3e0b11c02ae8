//! Safe SIMD implementations of the SAD kernels.
//!
//! 8-bit rows use `psadbw`; 16-bit rows take the saturating difference both
//! ways and widen through `pmaddwd`, which is exact for samples up to 12 bits.

#![cfg_attr(not(feature = "unchecked"), forbid(unsafe_code))]

use core::arch::x86_64::*;

use archmage::arcane;
use archmage::Desktop64;

use crate::include::common::bitdepth::Depth;
use crate::src::cpu::summon_avx2;
use crate::src::cpu::CpuFlags;
use crate::src::dsp::KernelFn;
use crate::src::dsp::Registry;
use crate::src::error::Error;
use crate::src::levels::BlockSize;
use crate::src::levels::KernelKind;
use crate::src::sad::sad_avg_rust;
use crate::src::sad::sad_bounded_rust;
use crate::src::sad::sad_rust;
use crate::src::sad::sad_x4_rust;
use crate::src::sad::SadAvgFn;
use crate::src::sad::SadBoundedFn;
use crate::src::sad::SadFn;
use crate::src::sad::SadX4Fn;
use crate::src::safe_simd::pixel_access::loadu_128;
use crate::src::safe_simd::pixel_access::loadu_256;
use crate::src::strided::PlaneRef;

/// Sum of the four 64-bit lanes.
macro_rules! hsum_epi64 {
    ($v:expr) => {{
        let v = $v;
        let s = _mm_add_epi64(_mm256_castsi256_si128(v), _mm256_extracti128_si256::<1>(v));
        let s = _mm_add_epi64(s, _mm_unpackhi_epi64(s, s));
        _mm_cvtsi128_si64(s) as u32
    }};
}

/// Sum of the eight 32-bit lanes.
macro_rules! hsum_epi32 {
    ($v:expr) => {{
        let v = $v;
        let s = _mm_add_epi32(_mm256_castsi256_si128(v), _mm256_extracti128_si256::<1>(v));
        let s = _mm_add_epi32(s, _mm_shuffle_epi32::<0b01_00_11_10>(s));
        let s = _mm_add_epi32(s, _mm_shuffle_epi32::<0b10_11_00_01>(s));
        _mm_cvtsi128_si32(s) as u32
    }};
}

/// `psadbw` over one row, `w` a multiple of 16.
macro_rules! row_sad_8bpc {
    ($acc:expr, $s:expr, $r:expr, $w:expr) => {{
        let (s, r, w) = ($s, $r, $w);
        if w == 16 {
            let d = _mm_sad_epu8(loadu_128!(s, [u8; 16]), loadu_128!(r, [u8; 16]));
            $acc = _mm256_add_epi64($acc, _mm256_zextsi128_si256(d));
        } else {
            for x in (0..w).step_by(32) {
                let a = loadu_256!(&s[x..x + 32], [u8; 32]);
                let b = loadu_256!(&r[x..x + 32], [u8; 32]);
                $acc = _mm256_add_epi64($acc, _mm256_sad_epu8(a, b));
            }
        }
    }};
}

/// `|a - b|` per 16-bit lane, widened and pair-summed into 32-bit lanes.
macro_rules! row_sad_16bpc {
    ($acc:expr, $s:expr, $r:expr, $w:expr) => {{
        let (s, r, w) = ($s, $r, $w);
        let ones = _mm256_set1_epi16(1);
        for x in (0..w).step_by(16) {
            let a = loadu_256!(&s[x..x + 16], [u16; 16]);
            let b = loadu_256!(&r[x..x + 16], [u16; 16]);
            let d = _mm256_or_si256(_mm256_subs_epu16(a, b), _mm256_subs_epu16(b, a));
            $acc = _mm256_add_epi32($acc, _mm256_madd_epi16(d, ones));
        }
    }};
}

#[arcane]
fn sad_8bpc_avx2_inner(
    _token: Desktop64,
    src: PlaneRef<'_, u8>,
    reference: PlaneRef<'_, u8>,
    w: usize,
    h: usize,
) -> u32 {
    let mut acc = _mm256_setzero_si256();
    for y in 0..h {
        row_sad_8bpc!(acc, src.row(y, w), reference.row(y, w), w);
    }
    hsum_epi64!(acc)
}

#[arcane]
fn sad_x4_8bpc_avx2_inner(
    _token: Desktop64,
    src: PlaneRef<'_, u8>,
    refs: &[PlaneRef<'_, u8>; 4],
    w: usize,
    h: usize,
) -> [u32; 4] {
    let mut acc = [_mm256_setzero_si256(); 4];
    for y in 0..h {
        let s = src.row(y, w);
        for i in 0..4 {
            row_sad_8bpc!(acc[i], s, refs[i].row(y, w), w);
        }
    }
    [
        hsum_epi64!(acc[0]),
        hsum_epi64!(acc[1]),
        hsum_epi64!(acc[2]),
        hsum_epi64!(acc[3]),
    ]
}

#[arcane]
fn sad_avg_8bpc_avx2_inner(
    _token: Desktop64,
    src: PlaneRef<'_, u8>,
    reference: PlaneRef<'_, u8>,
    second_pred: &[u8],
    w: usize,
    h: usize,
) -> u32 {
    let mut acc = _mm256_setzero_si256();
    for y in 0..h {
        let s = src.row(y, w);
        let r = reference.row(y, w);
        let p = &second_pred[y * w..][..w];
        if w == 16 {
            let comp = _mm_avg_epu8(loadu_128!(r, [u8; 16]), loadu_128!(p, [u8; 16]));
            let d = _mm_sad_epu8(loadu_128!(s, [u8; 16]), comp);
            acc = _mm256_add_epi64(acc, _mm256_zextsi128_si256(d));
        } else {
            for x in (0..w).step_by(32) {
                let comp = _mm256_avg_epu8(
                    loadu_256!(&r[x..x + 32], [u8; 32]),
                    loadu_256!(&p[x..x + 32], [u8; 32]),
                );
                let a = loadu_256!(&s[x..x + 32], [u8; 32]);
                acc = _mm256_add_epi64(acc, _mm256_sad_epu8(a, comp));
            }
        }
    }
    hsum_epi64!(acc)
}

#[arcane]
fn sad_16bpc_avx2_inner(
    _token: Desktop64,
    src: PlaneRef<'_, u16>,
    reference: PlaneRef<'_, u16>,
    w: usize,
    h: usize,
) -> u32 {
    let mut acc = _mm256_setzero_si256();
    for y in 0..h {
        row_sad_16bpc!(acc, src.row(y, w), reference.row(y, w), w);
    }
    hsum_epi32!(acc)
}

#[arcane]
fn sad_x4_16bpc_avx2_inner(
    _token: Desktop64,
    src: PlaneRef<'_, u16>,
    refs: &[PlaneRef<'_, u16>; 4],
    w: usize,
    h: usize,
) -> [u32; 4] {
    let mut acc = [_mm256_setzero_si256(); 4];
    for y in 0..h {
        let s = src.row(y, w);
        for i in 0..4 {
            row_sad_16bpc!(acc[i], s, refs[i].row(y, w), w);
        }
    }
    [
        hsum_epi32!(acc[0]),
        hsum_epi32!(acc[1]),
        hsum_epi32!(acc[2]),
        hsum_epi32!(acc[3]),
    ]
}

#[arcane]
fn sad_avg_16bpc_avx2_inner(
    _token: Desktop64,
    src: PlaneRef<'_, u16>,
    reference: PlaneRef<'_, u16>,
    second_pred: &[u16],
    w: usize,
    h: usize,
) -> u32 {
    let ones = _mm256_set1_epi16(1);
    let mut acc = _mm256_setzero_si256();
    for y in 0..h {
        let s = src.row(y, w);
        let r = reference.row(y, w);
        let p = &second_pred[y * w..][..w];
        for x in (0..w).step_by(16) {
            let comp = _mm256_avg_epu16(
                loadu_256!(&r[x..x + 16], [u16; 16]),
                loadu_256!(&p[x..x + 16], [u16; 16]),
            );
            let a = loadu_256!(&s[x..x + 16], [u16; 16]);
            let d = _mm256_or_si256(_mm256_subs_epu16(a, comp), _mm256_subs_epu16(comp, a));
            acc = _mm256_add_epi32(acc, _mm256_madd_epi16(d, ones));
        }
    }
    hsum_epi32!(acc)
}

// Table entry points. Block size is fixed per instantiation.

fn sad_8bpc_avx2<const W: usize, const H: usize>(
    src: PlaneRef<'_, u8>,
    reference: PlaneRef<'_, u8>,
) -> u32 {
    src.debug_assert_fits(W, H);
    reference.debug_assert_fits(W, H);
    match summon_avx2() {
        Some(token) => sad_8bpc_avx2_inner(token, src, reference, W, H),
        None => sad_rust::<u8, W, H>(src, reference),
    }
}

/// Computes the full SAD, which satisfies the bound contract without
/// branching per row.
fn sad_bounded_8bpc_avx2<const W: usize, const H: usize>(
    src: PlaneRef<'_, u8>,
    reference: PlaneRef<'_, u8>,
    max_cost: u32,
) -> u32 {
    src.debug_assert_fits(W, H);
    reference.debug_assert_fits(W, H);
    match summon_avx2() {
        Some(token) => sad_8bpc_avx2_inner(token, src, reference, W, H),
        None => sad_bounded_rust::<u8, W, H>(src, reference, max_cost),
    }
}

fn sad_x4_8bpc_avx2<const W: usize, const H: usize>(
    src: PlaneRef<'_, u8>,
    refs: &[PlaneRef<'_, u8>; 4],
) -> [u32; 4] {
    src.debug_assert_fits(W, H);
    for r in refs {
        r.debug_assert_fits(W, H);
    }
    match summon_avx2() {
        Some(token) => sad_x4_8bpc_avx2_inner(token, src, refs, W, H),
        None => sad_x4_rust::<u8, W, H>(src, refs),
    }
}

fn sad_avg_8bpc_avx2<const W: usize, const H: usize>(
    src: PlaneRef<'_, u8>,
    reference: PlaneRef<'_, u8>,
    second_pred: &[u8],
) -> u32 {
    src.debug_assert_fits(W, H);
    reference.debug_assert_fits(W, H);
    debug_assert!(second_pred.len() >= W * H);
    match summon_avx2() {
        Some(token) => sad_avg_8bpc_avx2_inner(token, src, reference, second_pred, W, H),
        None => sad_avg_rust::<u8, W, H>(src, reference, second_pred),
    }
}

fn sad_16bpc_avx2<const W: usize, const H: usize>(
    src: PlaneRef<'_, u16>,
    reference: PlaneRef<'_, u16>,
) -> u32 {
    src.debug_assert_fits(W, H);
    reference.debug_assert_fits(W, H);
    match summon_avx2() {
        Some(token) => sad_16bpc_avx2_inner(token, src, reference, W, H),
        None => sad_rust::<u16, W, H>(src, reference),
    }
}

fn sad_bounded_16bpc_avx2<const W: usize, const H: usize>(
    src: PlaneRef<'_, u16>,
    reference: PlaneRef<'_, u16>,
    max_cost: u32,
) -> u32 {
    src.debug_assert_fits(W, H);
    reference.debug_assert_fits(W, H);
    match summon_avx2() {
        Some(token) => sad_16bpc_avx2_inner(token, src, reference, W, H),
        None => sad_bounded_rust::<u16, W, H>(src, reference, max_cost),
    }
}

fn sad_x4_16bpc_avx2<const W: usize, const H: usize>(
    src: PlaneRef<'_, u16>,
    refs: &[PlaneRef<'_, u16>; 4],
) -> [u32; 4] {
    src.debug_assert_fits(W, H);
    for r in refs {
        r.debug_assert_fits(W, H);
    }
    match summon_avx2() {
        Some(token) => sad_x4_16bpc_avx2_inner(token, src, refs, W, H),
        None => sad_x4_rust::<u16, W, H>(src, refs),
    }
}

fn sad_avg_16bpc_avx2<const W: usize, const H: usize>(
    src: PlaneRef<'_, u16>,
    reference: PlaneRef<'_, u16>,
    second_pred: &[u16],
) -> u32 {
    src.debug_assert_fits(W, H);
    reference.debug_assert_fits(W, H);
    debug_assert!(second_pred.len() >= W * H);
    match summon_avx2() {
        Some(token) => sad_avg_16bpc_avx2_inner(token, src, reference, second_pred, W, H),
        None => sad_avg_rust::<u16, W, H>(src, reference, second_pred),
    }
}

const NAME: &str = "avx2";

pub(crate) fn register_8bpc_avx2(registry: &mut Registry<u8>) -> Result<(), Error> {
    let depth = Depth::Eight;
    for bsize in KernelKind::Sad.sizes() {
        if let Some(f) = for_each_wide_size!(bsize, sad_8bpc_avx2, SadFn<u8>) {
            registry.register_implementation(
                KernelKind::Sad,
                bsize,
                depth,
                CpuFlags::AVX2,
                NAME,
                KernelFn::Sad(f),
            )?;
        }
    }
    for bsize in KernelKind::SadBounded.sizes() {
        if let Some(f) = for_each_wide_size!(bsize, sad_bounded_8bpc_avx2, SadBoundedFn<u8>) {
            registry.register_implementation(
                KernelKind::SadBounded,
                bsize,
                depth,
                CpuFlags::AVX2,
                NAME,
                KernelFn::SadBounded(f),
            )?;
        }
    }
    for bsize in KernelKind::SadX4.sizes() {
        if let Some(f) = for_each_wide_size!(bsize, sad_x4_8bpc_avx2, SadX4Fn<u8>) {
            registry.register_implementation(
                KernelKind::SadX4,
                bsize,
                depth,
                CpuFlags::AVX2,
                NAME,
                KernelFn::SadX4(f),
            )?;
        }
    }
    for bsize in KernelKind::SadAvg.sizes() {
        if let Some(f) = for_each_wide_size!(bsize, sad_avg_8bpc_avx2, SadAvgFn<u8>) {
            registry.register_implementation(
                KernelKind::SadAvg,
                bsize,
                depth,
                CpuFlags::AVX2,
                NAME,
                KernelFn::SadAvg(f),
            )?;
        }
    }
    Ok(())
}

pub(crate) fn register_16bpc_avx2(registry: &mut Registry<u16>) -> Result<(), Error> {
    let depth = registry.depth();
    for bsize in KernelKind::Sad.sizes() {
        if let Some(f) = for_each_wide_size!(bsize, sad_16bpc_avx2, SadFn<u16>) {
            registry.register_implementation(
                KernelKind::Sad,
                bsize,
                depth,
                CpuFlags::AVX2,
                NAME,
                KernelFn::Sad(f),
            )?;
        }
    }
    for bsize in KernelKind::SadBounded.sizes() {
        if let Some(f) = for_each_wide_size!(bsize, sad_bounded_16bpc_avx2, SadBoundedFn<u16>)
        {
            registry.register_implementation(
                KernelKind::SadBounded,
                bsize,
                depth,
                CpuFlags::AVX2,
                NAME,
                KernelFn::SadBounded(f),
            )?;
        }
    }
    for bsize in KernelKind::SadX4.sizes() {
        if let Some(f) = for_each_wide_size!(bsize, sad_x4_16bpc_avx2, SadX4Fn<u16>) {
            registry.register_implementation(
                KernelKind::SadX4,
                bsize,
                depth,
                CpuFlags::AVX2,
                NAME,
                KernelFn::SadX4(f),
            )?;
        }
    }
    for bsize in KernelKind::SadAvg.sizes() {
        if let Some(f) = for_each_wide_size!(bsize, sad_avg_16bpc_avx2, SadAvgFn<u16>) {
            registry.register_implementation(
                KernelKind::SadAvg,
                bsize,
                depth,
                CpuFlags::AVX2,
                NAME,
                KernelFn::SadAvg(f),
            )?;
        }
    }
    Ok(())
}
