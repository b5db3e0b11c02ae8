//! Capability dispatch.
//!
//! A [`Registry`] collects every implementation of every kernel together with
//! the CPU flags it needs. [`Registry::build`] picks one implementation per
//! (kind, size, depth) key and freezes the result into a [`DspTable`], which
//! call sites read without locking.

use crate::include::common::bitdepth::BitDepth;
use crate::include::common::bitdepth::Depth;
use crate::include::common::bitdepth::Pixel;
use crate::include::common::validate::validate_input;
use crate::src::cpu::CpuFlags;
use crate::src::error::Error;
use crate::src::ipred::ipred_rust;
use crate::src::ipred::IntraFn;
use crate::src::levels::BlockSize;
use crate::src::levels::IntraKernel;
use crate::src::levels::KernelKind;
use crate::src::managed::Kernels;
use crate::src::sad::for_each_block_size;
use crate::src::sad::sad_avg_rust;
use crate::src::sad::sad_bounded_rust;
use crate::src::sad::sad_rust;
use crate::src::sad::sad_x4_rust;
use crate::src::sad::SadAvgFn;
use crate::src::sad::SadBoundedFn;
use crate::src::sad::SadFn;
use crate::src::sad::SadX4Fn;
use std::fmt;
use strum::EnumCount;
use strum::IntoEnumIterator;
use tracing::debug;
use tracing::info;
use tracing::trace;

/// A kernel function pointer tagged with its signature.
///
/// Kernels trust their planes: they do not check the rectangle against the
/// buffer, and under `unchecked` their row accesses skip bounds checks.
/// Registered kernels are only called through the validating
/// [`Kernels`](crate::src::managed::Kernels) methods.
#[derive(Debug)]
pub enum KernelFn<P> {
    Sad(SadFn<P>),
    SadBounded(SadBoundedFn<P>),
    SadX4(SadX4Fn<P>),
    SadAvg(SadAvgFn<P>),
    Intra(IntraFn<P>),
}

impl<P> Clone for KernelFn<P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P> Copy for KernelFn<P> {}

impl<P> KernelFn<P> {
    /// Whether this function has the signature `kind` expects.
    fn fits(&self, kind: KernelKind) -> bool {
        matches!(
            (self, kind),
            (Self::Sad(_), KernelKind::Sad)
                | (Self::SadBounded(_), KernelKind::SadBounded)
                | (Self::SadX4(_), KernelKind::SadX4)
                | (Self::SadAvg(_), KernelKind::SadAvg)
                | (Self::Intra(_), KernelKind::Intra(_))
        )
    }

    /// Name of the signature class, for error messages.
    fn signature(&self) -> &'static str {
        match self {
            Self::Sad(_) => "sad",
            Self::SadBounded(_) => "sad_bounded",
            Self::SadX4(_) => "sad_x4",
            Self::SadAvg(_) => "sad_avg",
            Self::Intra(_) => "intra",
        }
    }
}

/// One registered implementation of a key.
#[derive(Debug)]
pub struct Implementation<P> {
    pub name: &'static str,
    pub requires: CpuFlags,
    pub(crate) func: KernelFn<P>,
}

impl<P> Clone for Implementation<P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P> Copy for Implementation<P> {}

/// (kernel kind, block size, bit depth)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DispatchKey {
    pub kind: KernelKind,
    pub bsize: BlockSize,
    pub depth: Depth,
}

impl fmt::Display for DispatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.kind, self.bsize, self.depth)
    }
}

#[inline(always)]
const fn slot(kind: KernelKind, bsize: BlockSize) -> usize {
    kind.index() * BlockSize::COUNT + bsize.index()
}

/// Startup-time collection of candidate implementations for one depth.
pub struct Registry<P> {
    depth: Depth,
    /// Per key, sorted by descending preference.
    slots: Vec<Vec<Implementation<P>>>,
}

impl<P: Pixel> Registry<P> {
    /// A registry with no implementations.
    pub fn empty(depth: Depth) -> Result<Self, Error> {
        validate_input!(P::stores(depth), Error::StorageMismatch { depth });
        Ok(Self {
            depth,
            slots: vec![Vec::new(); KernelKind::COUNT * BlockSize::COUNT],
        })
    }

    pub fn depth(&self) -> Depth {
        self.depth
    }

    /// Adds `func` as a candidate for `(kind, bsize, depth)`.
    ///
    /// Among candidates whose `requires` flags are all available, the one
    /// requiring the highest flag wins; ties go to the earlier registration.
    pub fn register_implementation(
        &mut self,
        kind: KernelKind,
        bsize: BlockSize,
        depth: Depth,
        requires: CpuFlags,
        name: &'static str,
        func: KernelFn<P>,
    ) -> Result<(), Error> {
        validate_input!(
            func.fits(kind),
            Error::KindMismatch {
                kind,
                func: func.signature(),
            }
        );
        kind.check(bsize)?;
        validate_input!(depth == self.depth, Error::StorageMismatch { depth });

        let candidates = &mut self.slots[slot(kind, bsize)];
        let rank = requires.preference();
        let at = candidates
            .iter()
            .position(|c| c.requires.preference() < rank)
            .unwrap_or(candidates.len());
        candidates.insert(
            at,
            Implementation {
                name,
                requires,
                func,
            },
        );
        Ok(())
    }

    pub fn candidates(&self, kind: KernelKind, bsize: BlockSize) -> &[Implementation<P>] {
        &self.slots[slot(kind, bsize)]
    }

    /// Selects the preferred implementation available under `flags` for
    /// every key and freezes the result.
    pub fn build(&self, flags: CpuFlags) -> Result<DspTable<P>, Error> {
        let mut table = DspTable {
            depth: self.depth,
            flags,
            sad: [None; BlockSize::COUNT],
            sad_bounded: [None; BlockSize::COUNT],
            sad_x4: [None; BlockSize::COUNT],
            sad_avg: [None; BlockSize::COUNT],
            intra: [[None; BlockSize::COUNT]; IntraKernel::COUNT],
            selected: vec![None; self.slots.len()],
            slots: self.slots.clone(),
        };
        let mut accelerated = 0usize;

        for kind in KernelKind::iter() {
            for bsize in kind.sizes() {
                let key = DispatchKey {
                    kind,
                    bsize,
                    depth: self.depth,
                };
                let candidates = self.candidates(kind, bsize);
                let Some(chosen) = candidates.iter().find(|c| flags.contains(c.requires)) else {
                    return Err(Error::MissingImplementation {
                        kind,
                        bsize,
                        depth: self.depth,
                    });
                };
                for skipped in candidates.iter().take_while(|c| !flags.contains(c.requires)) {
                    trace!(%key, implementation = skipped.name, requires = ?skipped.requires, "masked out");
                }
                debug!(%key, implementation = chosen.name, "selected");
                if !chosen.requires.is_empty() {
                    accelerated += 1;
                }
                table.install(kind, bsize, *chosen);
            }
        }

        info!(
            depth = %self.depth,
            ?flags,
            entries = table.selected.iter().flatten().count(),
            accelerated,
            "built dispatch table"
        );
        Ok(table)
    }
}

impl<P: DspPixel> Registry<P> {
    /// The portable implementation of every key plus every accelerated
    /// implementation compiled for this target.
    pub fn with_defaults(depth: Depth) -> Result<Self, Error> {
        let mut registry = Self::empty(depth)?;
        P::register_defaults(&mut registry)?;
        Ok(registry)
    }
}

/// Registers the portable kernels for every supported key.
fn register_rust<BD: BitDepth>(
    registry: &mut Registry<BD::Pixel>,
    depth: Depth,
) -> Result<(), Error> {
    let none = CpuFlags::empty();
    for bsize in KernelKind::Sad.sizes() {
        let f = for_each_block_size!(bsize, sad_rust, BD::Pixel, SadFn<BD::Pixel>);
        registry.register_implementation(
            KernelKind::Sad,
            bsize,
            depth,
            none,
            "rust",
            KernelFn::Sad(f),
        )?;
    }
    for bsize in KernelKind::SadBounded.sizes() {
        let f = for_each_block_size!(
            bsize,
            sad_bounded_rust,
            BD::Pixel,
            SadBoundedFn<BD::Pixel>
        );
        registry.register_implementation(
            KernelKind::SadBounded,
            bsize,
            depth,
            none,
            "rust",
            KernelFn::SadBounded(f),
        )?;
    }
    for bsize in KernelKind::SadX4.sizes() {
        let f = for_each_block_size!(bsize, sad_x4_rust, BD::Pixel, SadX4Fn<BD::Pixel>);
        registry.register_implementation(
            KernelKind::SadX4,
            bsize,
            depth,
            none,
            "rust",
            KernelFn::SadX4(f),
        )?;
    }
    for bsize in KernelKind::SadAvg.sizes() {
        let f = for_each_block_size!(bsize, sad_avg_rust, BD::Pixel, SadAvgFn<BD::Pixel>);
        registry.register_implementation(
            KernelKind::SadAvg,
            bsize,
            depth,
            none,
            "rust",
            KernelFn::SadAvg(f),
        )?;
    }
    for kernel in IntraKernel::iter() {
        let kind = KernelKind::Intra(kernel);
        for bsize in kind.sizes() {
            let Some(f) = ipred_rust::<BD>(kernel, bsize) else {
                continue;
            };
            registry.register_implementation(
                kind,
                bsize,
                depth,
                none,
                "rust",
                KernelFn::Intra(f),
            )?;
        }
    }
    Ok(())
}

/// Frozen selection for one depth. Lookups are plain array reads.
pub struct DspTable<P> {
    depth: Depth,
    flags: CpuFlags,
    sad: [Option<SadFn<P>>; BlockSize::COUNT],
    sad_bounded: [Option<SadBoundedFn<P>>; BlockSize::COUNT],
    sad_x4: [Option<SadX4Fn<P>>; BlockSize::COUNT],
    sad_avg: [Option<SadAvgFn<P>>; BlockSize::COUNT],
    intra: [[Option<IntraFn<P>>; BlockSize::COUNT]; IntraKernel::COUNT],
    selected: Vec<Option<Implementation<P>>>,
    slots: Vec<Vec<Implementation<P>>>,
}

#[cold]
#[track_caller]
fn unsupported(kind: KernelKind, bsize: BlockSize) -> ! {
    panic!("{kind} has no kernel for {bsize}")
}

impl<P: Pixel> DspTable<P> {
    fn install(&mut self, kind: KernelKind, bsize: BlockSize, chosen: Implementation<P>) {
        let i = bsize.index();
        match (kind, chosen.func) {
            (KernelKind::Sad, KernelFn::Sad(f)) => self.sad[i] = Some(f),
            (KernelKind::SadBounded, KernelFn::SadBounded(f)) => self.sad_bounded[i] = Some(f),
            (KernelKind::SadX4, KernelFn::SadX4(f)) => self.sad_x4[i] = Some(f),
            (KernelKind::SadAvg, KernelFn::SadAvg(f)) => self.sad_avg[i] = Some(f),
            (KernelKind::Intra(k), KernelFn::Intra(f)) => self.intra[k.index()][i] = Some(f),
            _ => unreachable!("registration rejects mismatched signatures"),
        }
        self.selected[slot(kind, bsize)] = Some(chosen);
    }

    pub fn depth(&self) -> Depth {
        self.depth
    }

    pub fn bitdepth_max(&self) -> u32 {
        self.depth.max_value()
    }

    /// Flags the table was built for.
    pub fn flags(&self) -> CpuFlags {
        self.flags
    }

    #[inline(always)]
    #[track_caller]
    pub(crate) fn sad(&self, bsize: BlockSize) -> SadFn<P> {
        self.sad[bsize.index()].unwrap_or_else(|| unsupported(KernelKind::Sad, bsize))
    }

    #[inline(always)]
    #[track_caller]
    pub(crate) fn sad_bounded(&self, bsize: BlockSize) -> SadBoundedFn<P> {
        self.sad_bounded[bsize.index()]
            .unwrap_or_else(|| unsupported(KernelKind::SadBounded, bsize))
    }

    #[inline(always)]
    #[track_caller]
    pub(crate) fn sad_x4(&self, bsize: BlockSize) -> SadX4Fn<P> {
        self.sad_x4[bsize.index()].unwrap_or_else(|| unsupported(KernelKind::SadX4, bsize))
    }

    #[inline(always)]
    #[track_caller]
    pub(crate) fn sad_avg(&self, bsize: BlockSize) -> SadAvgFn<P> {
        self.sad_avg[bsize.index()].unwrap_or_else(|| unsupported(KernelKind::SadAvg, bsize))
    }

    #[inline(always)]
    #[track_caller]
    pub(crate) fn intra(&self, kernel: IntraKernel, bsize: BlockSize) -> IntraFn<P> {
        self.intra[kernel.index()][bsize.index()]
            .unwrap_or_else(|| unsupported(KernelKind::Intra(kernel), bsize))
    }

    /// The selected implementation for a key, if the key is supported.
    pub fn selected(&self, kind: KernelKind, bsize: BlockSize) -> Option<&Implementation<P>> {
        self.selected[slot(kind, bsize)].as_ref()
    }

    /// Every registered implementation for a key, selected or not.
    pub fn candidates(&self, kind: KernelKind, bsize: BlockSize) -> &[Implementation<P>] {
        &self.slots[slot(kind, bsize)]
    }

    /// Candidates that can run on the detected CPU, regardless of the mask
    /// the table was built with.
    pub fn runnable_candidates(
        &self,
        kind: KernelKind,
        bsize: BlockSize,
        available: CpuFlags,
    ) -> impl Iterator<Item = &Implementation<P>> {
        self.candidates(kind, bsize)
            .iter()
            .filter(move |c| available.contains(c.requires))
    }

    /// `(key, implementation name)` for every supported key.
    pub fn describe(&self) -> Vec<(DispatchKey, &'static str)> {
        KernelKind::iter()
            .flat_map(|kind| kind.sizes().map(move |bsize| (kind, bsize)))
            .filter_map(|(kind, bsize)| {
                let chosen = self.selected(kind, bsize)?;
                let key = DispatchKey {
                    kind,
                    bsize,
                    depth: self.depth,
                };
                Some((key, chosen.name))
            })
            .collect()
    }
}

/// Pixel storage with a default registry.
pub trait DspPixel: Pixel {
    /// Registers the portable and accelerated kernels for `registry`'s depth.
    fn register_defaults(registry: &mut Registry<Self>) -> Result<(), Error>;

    /// The table in `kernels` serving `depth`.
    ///
    /// Panics if `depth` is not stored as `Self`.
    fn select(kernels: &Kernels, depth: Depth) -> &DspTable<Self>;
}

impl<P: DspPixel> DspTable<P> {
    /// The process-wide table for `depth`, built on first use and never
    /// rebuilt.
    #[track_caller]
    pub fn get(depth: Depth) -> &'static Self {
        P::select(Kernels::global(), depth)
    }
}

#[cfg(feature = "bitdepth_8")]
impl DspPixel for u8 {
    fn register_defaults(registry: &mut Registry<Self>) -> Result<(), Error> {
        use crate::include::common::bitdepth::BitDepth8;

        let depth = registry.depth();
        register_rust::<BitDepth8>(registry, depth)?;
        crate::src::safe_simd::register_8bpc(registry)
    }

    #[track_caller]
    fn select(kernels: &Kernels, depth: Depth) -> &DspTable<Self> {
        assert!(u8::stores(depth), "{depth} samples are not stored as u8");
        &kernels.eight
    }
}

#[cfg(feature = "bitdepth_16")]
impl DspPixel for u16 {
    fn register_defaults(registry: &mut Registry<Self>) -> Result<(), Error> {
        use crate::include::common::bitdepth::BitDepth16;

        let depth = registry.depth();
        register_rust::<BitDepth16>(registry, depth)?;
        crate::src::safe_simd::register_16bpc(registry)
    }

    #[track_caller]
    fn select(kernels: &Kernels, depth: Depth) -> &DspTable<Self> {
        match depth {
            Depth::Ten => &kernels.ten,
            Depth::Twelve => &kernels.twelve,
            Depth::Eight => panic!("{depth} samples are not stored as u16"),
        }
    }
}
