use bitflags::bitflags;
use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;
use std::sync::Once;

#[cfg(not(any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")))]
bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct CpuFlags: u32 {}
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
bitflags! {
    /// Ordered by specialization; dispatch ranks a candidate by its
    /// highest bit.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct CpuFlags: u32 {
        const SSE2 = 1 << 0;
        const SSSE3 = 1 << 1;
        const SSE41 = 1 << 2;
        const AVX2 = 1 << 3;
        /// F/CD/BW/DQ/VL, the x86-64-v4 set.
        const AVX512 = 1 << 4;
    }
}

#[cfg(target_arch = "aarch64")]
bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct CpuFlags: u32 {
        const NEON = 1 << 0;
    }
}

impl CpuFlags {
    /// Flags guaranteed by the compilation target.
    pub const fn compile_time_detect() -> Self {
        #[allow(unused_mut)]
        let mut flags = Self::empty();
        #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
        {
            if cfg!(target_feature = "sse2") {
                flags = flags.union(Self::SSE2);
            }
            if cfg!(target_feature = "ssse3") {
                flags = flags.union(Self::SSSE3);
            }
            if cfg!(target_feature = "sse4.1") {
                flags = flags.union(Self::SSE41);
            }
            if cfg!(target_feature = "avx2") {
                flags = flags.union(Self::AVX2);
            }
            if cfg!(all(
                target_feature = "avx512f",
                target_feature = "avx512cd",
                target_feature = "avx512bw",
                target_feature = "avx512dq",
                target_feature = "avx512vl",
            )) {
                flags = flags.union(Self::AVX512);
            }
        }
        #[cfg(target_arch = "aarch64")]
        {
            if cfg!(target_feature = "neon") {
                flags = flags.union(Self::NEON);
            }
        }
        flags
    }

    pub fn run_time_detect() -> Self {
        #[allow(unused_mut)]
        let mut flags = Self::empty();

        #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
        {
            let detected = [
                (is_x86_feature_detected!("sse2"), Self::SSE2),
                (is_x86_feature_detected!("ssse3"), Self::SSSE3),
                (is_x86_feature_detected!("sse4.1"), Self::SSE41),
                (is_x86_feature_detected!("avx2"), Self::AVX2),
                (
                    is_x86_feature_detected!("avx512f")
                        && is_x86_feature_detected!("avx512cd")
                        && is_x86_feature_detected!("avx512bw")
                        && is_x86_feature_detected!("avx512dq")
                        && is_x86_feature_detected!("avx512vl"),
                    Self::AVX512,
                ),
            ];
            for (present, flag) in detected {
                flags.set(flag, present);
            }
        }

        #[cfg(target_arch = "aarch64")]
        flags.set(Self::NEON, std::arch::is_aarch64_feature_detected!("neon"));

        flags
    }

    /// Dispatch preference of an implementation requiring `self`.
    ///
    /// Higher flags are more specialized, so the highest set bit ranks the
    /// candidate. The portable implementation requires nothing and ranks 0.
    pub fn preference(self) -> u32 {
        32 - self.bits().leading_zeros()
    }
}

/// This is atomic, which has interior mutability,
/// instead of a `static mut`, since the latter is `unsafe` to access.
///
/// It is written once by the lazy initializer in [`get_cpu_flags`]
/// and read by dispatch-table construction.
static CPU_FLAGS: AtomicU32 = AtomicU32::new(0);
static CPU_FLAGS_INIT: Once = Once::new();

/// Modifiable through the public [`set_cpu_flags_mask`]. Only read when a
/// dispatch table is built, so it is not performance sensitive.
static CPU_FLAGS_MASK: AtomicU32 = AtomicU32::new(!0);

/// Detected flags with the process-wide mask applied.
#[inline(always)]
pub fn get_cpu_flags() -> CpuFlags {
    init_cpu();
    let flags = CPU_FLAGS.load(Ordering::SeqCst) | CpuFlags::compile_time_detect().bits();
    let mask = CPU_FLAGS_MASK.load(Ordering::SeqCst);
    // The mask applies to compile-time flags too,
    // so a mask of 0 forces scalar even under -C target-feature=+avx2.
    CpuFlags::from_bits_truncate(flags & mask)
}

/// Detected flags ignoring the process-wide mask.
pub fn detected_cpu_flags() -> CpuFlags {
    init_cpu();
    CpuFlags::from_bits_truncate(
        CPU_FLAGS.load(Ordering::SeqCst) | CpuFlags::compile_time_detect().bits(),
    )
}

#[cold]
fn init_cpu() {
    CPU_FLAGS_INIT.call_once(|| {
        CPU_FLAGS.store(CpuFlags::run_time_detect().bits(), Ordering::SeqCst);
    });
}

/// Restricts the flags seen by the process-wide dispatch tables.
///
/// Must be called before the first kernel call; the tables are built once
/// and never rebuilt.
#[cold]
pub fn set_cpu_flags_mask(mask: u32) {
    CPU_FLAGS_MASK.store(mask, Ordering::SeqCst);
}

/// Try to summon an AVX2 token.
///
/// The dispatch table already checked the flags when it selected the
/// caller, so this only fails if the token cannot be created at all.
#[cfg(target_arch = "x86_64")]
#[inline(always)]
pub(crate) fn summon_avx2() -> Option<archmage::Desktop64> {
    use archmage::SimdToken as _;
    archmage::Desktop64::summon()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masked_flags_are_detected_subset() {
        let detected = detected_cpu_flags();
        assert!(detected.contains(get_cpu_flags()));
    }

    #[test]
    fn preference_ranks_by_highest_flag() {
        assert_eq!(CpuFlags::empty().preference(), 0);
        #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
        {
            assert!(CpuFlags::AVX2.preference() > CpuFlags::SSE41.preference());
            assert_eq!(
                (CpuFlags::AVX2 | CpuFlags::SSE2).preference(),
                CpuFlags::AVX2.preference()
            );
        }
    }
}
