//! Safe, validated entry points for the SAD and intra kernels.
//!
//! Callers normally use the free functions, which run on the process-wide
//! [`Kernels`] bundle. A [`Kernels`] built from explicit [`Settings`] is
//! independent of the global one, so several CPU levels can be compared in
//! one process.
//!
//! # Example
//!
//! ```
//! use vpxdsp_safe::{sad, BlockSize, Depth, PlaneRef};
//!
//! let src = [10u8; 64];
//! let reference = [7u8; 64];
//! let cost = sad(
//!     Depth::Eight,
//!     BlockSize::Block8x8,
//!     PlaneRef::contiguous(&src, 8),
//!     PlaneRef::contiguous(&reference, 8),
//! );
//! assert_eq!(cost, 3 * 64);
//! ```

#![forbid(unsafe_code)]

use crate::include::common::bitdepth::Depth;
use crate::src::cpu::detected_cpu_flags;
use crate::src::cpu::get_cpu_flags;
use crate::src::cpu::CpuFlags;
use crate::src::dsp::DispatchKey;
use crate::src::dsp::DspPixel;
use crate::src::dsp::DspTable;
use crate::src::dsp::Registry;
use crate::src::env;
use crate::src::error::Error;
use crate::src::error::Result;
use crate::src::ipred_prepare::IntraEdge;
use crate::src::levels::BlockSize;
use crate::src::levels::IntraMode;
use crate::src::strided::PlaneMut;
use crate::src::strided::PlaneRef;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use tracing::info;
use tracing::warn;

/// Upper bound on the instruction sets kernels may use.
///
/// Levels above what the CPU supports behave like the highest supported
/// level below them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CpuLevel {
    /// Portable kernels only.
    Scalar,
    /// x86-64-v2: up to SSE4.1.
    X86V2,
    /// x86-64-v3: adds AVX2.
    X86V3,
    /// x86-64-v4: adds AVX-512.
    X86V4,
    /// aarch64 NEON.
    Neon,
    /// Everything the CPU reports.
    #[default]
    Native,
}

impl CpuLevel {
    /// Flag mask for this level, in the bit layout of [`CpuFlags`].
    pub fn to_mask(self) -> u32 {
        match self {
            Self::Scalar => 0,
            Self::Native => !0,
            #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
            Self::X86V2 => (CpuFlags::SSE2 | CpuFlags::SSSE3 | CpuFlags::SSE41).bits(),
            #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
            Self::X86V3 => {
                (CpuFlags::SSE2 | CpuFlags::SSSE3 | CpuFlags::SSE41 | CpuFlags::AVX2).bits()
            }
            #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
            Self::X86V4 => {
                (CpuFlags::SSE2
                    | CpuFlags::SSSE3
                    | CpuFlags::SSE41
                    | CpuFlags::AVX2
                    | CpuFlags::AVX512)
                    .bits()
            }
            #[cfg(target_arch = "aarch64")]
            Self::Neon => CpuFlags::NEON.bits(),
            // Levels of another architecture enable nothing here.
            #[allow(unreachable_patterns)]
            _ => 0,
        }
    }

    /// Flags a table built at this level may use on this CPU.
    pub fn flags(self) -> CpuFlags {
        detected_cpu_flags() & CpuFlags::from_bits_truncate(self.to_mask())
    }

    /// Levels worth testing on the current architecture, lowest first.
    pub fn platform_levels() -> &'static [CpuLevel] {
        if cfg!(any(target_arch = "x86", target_arch = "x86_64")) {
            &[Self::Scalar, Self::X86V2, Self::X86V3, Self::X86V4, Self::Native]
        } else if cfg!(target_arch = "aarch64") {
            &[Self::Scalar, Self::Neon, Self::Native]
        } else {
            &[Self::Scalar, Self::Native]
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Scalar => "scalar",
            Self::X86V2 => "v2",
            Self::X86V3 => "v3",
            Self::X86V4 => "v4",
            Self::Neon => "neon",
            Self::Native => "native",
        }
    }
}

impl fmt::Display for CpuLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CpuLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scalar" | "none" => Ok(Self::Scalar),
            "v2" | "x86-64-v2" => Ok(Self::X86V2),
            "v3" | "x86-64-v3" | "avx2" => Ok(Self::X86V3),
            "v4" | "x86-64-v4" | "avx512" => Ok(Self::X86V4),
            "neon" => Ok(Self::Neon),
            "native" => Ok(Self::Native),
            _ => Err(Error::InvalidCpuLevel(s.to_owned())),
        }
    }
}

/// Kernel selection settings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Settings {
    /// Highest instruction set the selected kernels may use.
    pub cpu_level: CpuLevel,
}

impl Settings {
    /// Defaults overridden by `VPXDSP_CPU_LEVEL=<level>`, then by a truthy
    /// `VPXDSP_FORCE_SCALAR`.
    pub fn from_env() -> Result<Self> {
        let mut settings = Self::default();
        if let Some(raw) = env::cpu_level_override() {
            settings.cpu_level = raw.parse()?;
        }
        if env::force_scalar() {
            settings.cpu_level = CpuLevel::Scalar;
        }
        Ok(settings)
    }
}

/// One dispatch table per compiled bit depth.
pub struct Kernels {
    level: CpuLevel,
    #[cfg(feature = "bitdepth_8")]
    pub(crate) eight: DspTable<u8>,
    #[cfg(feature = "bitdepth_16")]
    pub(crate) ten: DspTable<u16>,
    #[cfg(feature = "bitdepth_16")]
    pub(crate) twelve: DspTable<u16>,
}

impl Kernels {
    /// Tables for `settings`, ignoring the process-wide flag mask.
    pub fn new(settings: &Settings) -> Result<Self> {
        Self::with_flags(settings.cpu_level, settings.cpu_level.flags())
    }

    fn with_flags(level: CpuLevel, flags: CpuFlags) -> Result<Self> {
        let kernels = Self {
            level,
            #[cfg(feature = "bitdepth_8")]
            eight: Registry::with_defaults(Depth::Eight)?.build(flags)?,
            #[cfg(feature = "bitdepth_16")]
            ten: Registry::with_defaults(Depth::Ten)?.build(flags)?,
            #[cfg(feature = "bitdepth_16")]
            twelve: Registry::with_defaults(Depth::Twelve)?.build(flags)?,
        };
        info!(%level, ?flags, "kernels ready");
        Ok(kernels)
    }

    /// The process-wide bundle.
    ///
    /// Built on first use from [`Settings::from_env`] and the flag mask set
    /// through [`set_cpu_flags_mask`](crate::src::cpu::set_cpu_flags_mask);
    /// an unparsable environment level falls back to the defaults.
    pub fn global() -> &'static Self {
        static KERNELS: OnceLock<Kernels> = OnceLock::new();
        KERNELS.get_or_init(|| {
            let settings = Settings::from_env().unwrap_or_else(|e| {
                warn!(error = %e, "ignoring environment kernel settings");
                Settings::default()
            });
            let level_mask = CpuFlags::from_bits_truncate(settings.cpu_level.to_mask());
            let flags = get_cpu_flags() & level_mask;
            Self::with_flags(settings.cpu_level, flags)
                .unwrap_or_else(|e| panic!("default kernel tables are incomplete: {e}"))
        })
    }

    pub fn level(&self) -> CpuLevel {
        self.level
    }

    #[track_caller]
    pub fn table<P: DspPixel>(&self, depth: Depth) -> &DspTable<P> {
        P::select(self, depth)
    }

    /// Selected implementation name for every key of every compiled depth.
    pub fn describe(&self) -> Vec<(DispatchKey, &'static str)> {
        #[allow(unused_mut)]
        let mut entries = Vec::new();
        #[cfg(feature = "bitdepth_8")]
        entries.extend(self.eight.describe());
        #[cfg(feature = "bitdepth_16")]
        {
            entries.extend(self.ten.describe());
            entries.extend(self.twelve.describe());
        }
        entries
    }

    /// SAD of a `bsize` block.
    #[track_caller]
    pub fn sad<P: DspPixel>(
        &self,
        depth: Depth,
        bsize: BlockSize,
        src: PlaneRef<'_, P>,
        reference: PlaneRef<'_, P>,
    ) -> u32 {
        let table = self.table::<P>(depth);
        let f = table.sad(bsize);
        assert_plane(&src, bsize, "source");
        assert_plane(&reference, bsize, "reference");
        debug_assert_samples(&src, bsize, depth, "source");
        debug_assert_samples(&reference, bsize, depth, "reference");
        f(src, reference)
    }

    /// SAD that may stop early once it exceeds `max_cost`.
    ///
    /// Exact when the true SAD is at most `max_cost`, otherwise some value
    /// above `max_cost`.
    #[track_caller]
    pub fn sad_bounded<P: DspPixel>(
        &self,
        depth: Depth,
        bsize: BlockSize,
        src: PlaneRef<'_, P>,
        reference: PlaneRef<'_, P>,
        max_cost: u32,
    ) -> u32 {
        let table = self.table::<P>(depth);
        let f = table.sad_bounded(bsize);
        assert_plane(&src, bsize, "source");
        assert_plane(&reference, bsize, "reference");
        debug_assert_samples(&src, bsize, depth, "source");
        debug_assert_samples(&reference, bsize, depth, "reference");
        f(src, reference, max_cost)
    }

    /// Exact SADs against four references.
    #[track_caller]
    pub fn sad_x4<P: DspPixel>(
        &self,
        depth: Depth,
        bsize: BlockSize,
        src: PlaneRef<'_, P>,
        refs: &[PlaneRef<'_, P>; 4],
    ) -> [u32; 4] {
        let table = self.table::<P>(depth);
        let f = table.sad_x4(bsize);
        assert_plane(&src, bsize, "source");
        debug_assert_samples(&src, bsize, depth, "source");
        for reference in refs {
            assert_plane(reference, bsize, "reference");
            debug_assert_samples(reference, bsize, depth, "reference");
        }
        f(src, refs)
    }

    /// SAD against `avg2(reference, second_pred)`; `second_pred` is packed
    /// with stride equal to the block width.
    #[track_caller]
    pub fn sad_avg<P: DspPixel>(
        &self,
        depth: Depth,
        bsize: BlockSize,
        src: PlaneRef<'_, P>,
        reference: PlaneRef<'_, P>,
        second_pred: &[P],
    ) -> u32 {
        let table = self.table::<P>(depth);
        let f = table.sad_avg(bsize);
        assert_plane(&src, bsize, "source");
        assert_plane(&reference, bsize, "reference");
        assert!(
            second_pred.len() >= bsize.area(),
            "second predictor holds {} samples, {bsize} needs {}",
            second_pred.len(),
            bsize.area()
        );
        debug_assert_samples(&src, bsize, depth, "source");
        debug_assert_samples(&reference, bsize, depth, "reference");
        debug_assert_in_range(&second_pred[..bsize.area()], depth, "second predictor");
        f(src, reference, second_pred)
    }

    /// Predicts the `bsize` block at `dst` from `edge`.
    ///
    /// `Dc` picks its variant from the edge's availability flags.
    #[track_caller]
    pub fn predict_intra<P: DspPixel>(
        &self,
        depth: Depth,
        bsize: BlockSize,
        mode: IntraMode,
        dst: PlaneMut<'_, P>,
        edge: &IntraEdge<'_, P>,
    ) {
        let table = self.table::<P>(depth);
        let kernel = edge.kernel_for(mode);
        if let Err(e) = edge.check(kernel, bsize) {
            panic!("{mode:?} prediction at {bsize}: {e}");
        }
        assert!(
            dst.fits(bsize.width(), bsize.height()),
            "destination cannot hold a {bsize} block"
        );
        let n = bsize.width();
        if kernel.reads_top_left() {
            debug_assert_in_range(&[edge.top_left], depth, "top-left");
        }
        debug_assert_in_range(&edge.above[..kernel.above_len(n)], depth, "above edge");
        debug_assert_in_range(&edge.left[..kernel.left_len(n)], depth, "left edge");
        table.intra(kernel, bsize)(dst, edge, table.bitdepth_max())
    }
}

#[track_caller]
fn assert_plane<P: DspPixel>(plane: &PlaneRef<'_, P>, bsize: BlockSize, what: &str) {
    assert!(
        plane.fits(bsize.width(), bsize.height()),
        "{what} plane (base {}, stride {}, {} samples) cannot hold a {bsize} block",
        plane.base(),
        plane.stride(),
        plane.data().len()
    );
}

/// Debug builds reject samples above the depth maximum; the 16-bit SIMD
/// kernels are only exact inside that range.
#[track_caller]
#[inline]
fn debug_assert_samples<P: DspPixel>(
    plane: &PlaneRef<'_, P>,
    bsize: BlockSize,
    depth: Depth,
    what: &str,
) {
    if cfg!(debug_assertions) {
        for y in 0..bsize.height() {
            debug_assert_in_range(plane.row(y, bsize.width()), depth, what);
        }
    }
}

#[track_caller]
#[inline]
fn debug_assert_in_range<P: DspPixel>(samples: &[P], depth: Depth, what: &str) {
    if cfg!(debug_assertions) {
        let max = depth.max_value();
        if let Some(v) = samples.iter().find(|v| v.to_u32() > max) {
            panic!("{what} sample {} exceeds the {depth} maximum {max}", v.to_u32());
        }
    }
}

/// [`Kernels::sad`] on the process-wide bundle.
#[track_caller]
pub fn sad<P: DspPixel>(
    depth: Depth,
    bsize: BlockSize,
    src: PlaneRef<'_, P>,
    reference: PlaneRef<'_, P>,
) -> u32 {
    Kernels::global().sad(depth, bsize, src, reference)
}

/// [`Kernels::sad_bounded`] on the process-wide bundle.
#[track_caller]
pub fn sad_bounded<P: DspPixel>(
    depth: Depth,
    bsize: BlockSize,
    src: PlaneRef<'_, P>,
    reference: PlaneRef<'_, P>,
    max_cost: u32,
) -> u32 {
    Kernels::global().sad_bounded(depth, bsize, src, reference, max_cost)
}

/// [`Kernels::sad_x4`] on the process-wide bundle.
#[track_caller]
pub fn sad_x4<P: DspPixel>(
    depth: Depth,
    bsize: BlockSize,
    src: PlaneRef<'_, P>,
    refs: &[PlaneRef<'_, P>; 4],
) -> [u32; 4] {
    Kernels::global().sad_x4(depth, bsize, src, refs)
}

/// [`Kernels::sad_avg`] on the process-wide bundle.
#[track_caller]
pub fn sad_avg<P: DspPixel>(
    depth: Depth,
    bsize: BlockSize,
    src: PlaneRef<'_, P>,
    reference: PlaneRef<'_, P>,
    second_pred: &[P],
) -> u32 {
    Kernels::global().sad_avg(depth, bsize, src, reference, second_pred)
}

/// [`Kernels::predict_intra`] on the process-wide bundle.
#[track_caller]
pub fn predict_intra<P: DspPixel>(
    depth: Depth,
    bsize: BlockSize,
    mode: IntraMode,
    dst: PlaneMut<'_, P>,
    edge: &IntraEdge<'_, P>,
) {
    Kernels::global().predict_intra(depth, bsize, mode, dst, edge)
}

/// Returns a comma-delimited string of enabled compile-time feature flags.
///
/// ```
/// let features = vpxdsp_safe::enabled_features();
/// assert!(features.contains("safety:"));
/// ```
pub fn enabled_features() -> String {
    let mut features = Vec::new();

    if cfg!(feature = "unchecked") {
        features.push("unchecked");
    }
    if cfg!(feature = "bitdepth_8") {
        features.push("bitdepth_8");
    }
    if cfg!(feature = "bitdepth_16") {
        features.push("bitdepth_16");
    }

    if cfg!(feature = "unchecked") {
        features.push("safety:unchecked");
    } else {
        features.push("safety:forbid-unsafe");
    }

    features.join(", ")
}
