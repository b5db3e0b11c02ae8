//! Safe SIMD implementations using Rust intrinsics.
//!
//! Kernels here are registered next to the portable ones and selected by
//! the dispatch table when the CPU has the flags they require. Every wrapper
//! falls back to the portable kernel if its token cannot be summoned.
//!
//! Implemented so far (x86_64 AVX2, blocks at least 16 wide):
//! - SAD: single, bounded, x4 and compound average at every storage width
//! - Intra: DC (all four variants), V, H and TM
//!
//! Directional intra modes and blocks narrower than 16 use the portable
//! kernels on every target.

#![cfg_attr(not(feature = "unchecked"), forbid(unsafe_code))]

use crate::src::dsp::Registry;
use crate::src::error::Error;
use cfg_if::cfg_if;

pub mod pixel_access;

/// Expands to `Some($f::<W, H> as $T)` for the sizes at least 16 wide,
/// `None` otherwise.
#[cfg(target_arch = "x86_64")]
macro_rules! for_each_wide_size {
    ($bsize:expr, $f:ident, $T:ty) => {
        match $bsize {
            BlockSize::Block16x8 => Some($f::<16, 8> as $T),
            BlockSize::Block16x16 => Some($f::<16, 16> as $T),
            BlockSize::Block16x32 => Some($f::<16, 32> as $T),
            BlockSize::Block32x16 => Some($f::<32, 16> as $T),
            BlockSize::Block32x32 => Some($f::<32, 32> as $T),
            BlockSize::Block32x64 => Some($f::<32, 64> as $T),
            BlockSize::Block64x32 => Some($f::<64, 32> as $T),
            BlockSize::Block64x64 => Some($f::<64, 64> as $T),
            _ => None,
        }
    };
}

#[cfg(target_arch = "x86_64")]
pub mod ipred;

#[cfg(target_arch = "x86_64")]
pub mod sad;

cfg_if! {
    if #[cfg(target_arch = "x86_64")] {
        pub(crate) fn register_8bpc(registry: &mut Registry<u8>) -> Result<(), Error> {
            sad::register_8bpc_avx2(registry)?;
            ipred::register_8bpc_avx2(registry)
        }

        pub(crate) fn register_16bpc(registry: &mut Registry<u16>) -> Result<(), Error> {
            sad::register_16bpc_avx2(registry)?;
            ipred::register_16bpc_avx2(registry)
        }
    } else {
        pub(crate) fn register_8bpc(_registry: &mut Registry<u8>) -> Result<(), Error> {
            Ok(())
        }

        pub(crate) fn register_16bpc(_registry: &mut Registry<u16>) -> Result<(), Error> {
            Ok(())
        }
    }
}
