//! Row access helpers shared by the plane views and the SIMD kernels.
//!
//! When the `unchecked` feature is enabled, these use unchecked indexing
//! in release builds. Otherwise, they use normal bounds-checked indexing.
//! Debug builds always assert the range.

#![cfg_attr(not(feature = "unchecked"), deny(unsafe_code))]

/// Get an immutable slice from a buffer at a given offset.
#[inline(always)]
pub fn row_slice<T>(buf: &[T], offset: usize, len: usize) -> &[T] {
    #[cfg(feature = "unchecked")]
    {
        debug_assert!(offset + len <= buf.len());
        // SAFETY: plane views are validated by the caller before kernels run;
        // debug builds check every row here.
        #[allow(unsafe_code)]
        unsafe {
            buf.get_unchecked(offset..offset + len)
        }
    }
    #[cfg(not(feature = "unchecked"))]
    &buf[offset..offset + len]
}

/// Get a mutable slice from a buffer at a given offset.
#[inline(always)]
pub fn row_slice_mut<T>(buf: &mut [T], offset: usize, len: usize) -> &mut [T] {
    #[cfg(feature = "unchecked")]
    {
        debug_assert!(offset + len <= buf.len());
        // SAFETY: as for `row_slice`.
        #[allow(unsafe_code)]
        unsafe {
            buf.get_unchecked_mut(offset..offset + len)
        }
    }
    #[cfg(not(feature = "unchecked"))]
    &mut buf[offset..offset + len]
}

/// Unaligned 256-bit load from a slice of exactly 32 bytes worth of `$T` elements.
#[cfg(target_arch = "x86_64")]
macro_rules! loadu_256 {
    ($src:expr, [$T:ty; $N:literal]) => {{
        let arr: &[$T; $N] = ($src).try_into().unwrap();
        safe_unaligned_simd::x86_64::_mm256_loadu_si256(arr)
    }};
}

/// Unaligned 256-bit store into a slice of exactly 32 bytes worth of `$T` elements.
#[cfg(target_arch = "x86_64")]
macro_rules! storeu_256 {
    ($dst:expr, [$T:ty; $N:literal], $v:expr) => {{
        let arr: &mut [$T; $N] = ($dst).try_into().unwrap();
        safe_unaligned_simd::x86_64::_mm256_storeu_si256(arr, $v)
    }};
}

/// Unaligned 128-bit load.
#[cfg(target_arch = "x86_64")]
macro_rules! loadu_128 {
    ($src:expr, [$T:ty; $N:literal]) => {{
        let arr: &[$T; $N] = ($src).try_into().unwrap();
        safe_unaligned_simd::x86_64::_mm_loadu_si128(arr)
    }};
}

/// Unaligned 128-bit store.
#[cfg(target_arch = "x86_64")]
macro_rules! storeu_128 {
    ($dst:expr, [$T:ty; $N:literal], $v:expr) => {{
        let arr: &mut [$T; $N] = ($dst).try_into().unwrap();
        safe_unaligned_simd::x86_64::_mm_storeu_si128(arr, $v)
    }};
}

#[cfg(target_arch = "x86_64")]
pub(crate) use {loadu_128, loadu_256, storeu_128, storeu_256};
