//! Differential conformance checks.
//!
//! Every registered implementation of every key is run on deterministic
//! random and boundary inputs and compared against per-sample reference
//! arithmetic written independently of the portable kernels. Unbounded
//! kernels must match exactly; bounded SAD must be exact up to its bound and
//! never report less than the bound past it.

use crate::include::common::bitdepth::Depth;
use crate::include::common::bitdepth::Pixel;
use crate::src::cpu::detected_cpu_flags;
use crate::src::dsp::DispatchKey;
use crate::src::dsp::DspTable;
use crate::src::dsp::Implementation;
use crate::src::dsp::KernelFn;
use crate::src::error::Error;
use crate::src::error::Result;
use crate::src::ipred_prepare::IntraEdge;
use crate::src::levels::BlockSize;
use crate::src::levels::IntraKernel;
use crate::src::levels::KernelKind;
use crate::src::strided::PlaneMut;
use crate::src::strided::PlaneRef;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use std::fmt;
use strum::IntoEnumIterator;
use tracing::debug;

/// Seed used by [`run_all`].
pub const DEFAULT_SEED: u64 = 0xbaba_6465_7473_6565;

/// Bound applied in the all-max scenarios.
pub const MAX_SAD_BOUND: u32 = 128;

/// One failed comparison.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mismatch {
    pub key: DispatchKey,
    pub implementation: &'static str,
    pub scenario: String,
    pub expected: u32,
    pub actual: u32,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}: expected {}, got {}",
            self.key, self.implementation, self.scenario, self.expected, self.actual
        )
    }
}

#[derive(Clone, Debug, Default)]
pub struct Report {
    /// Number of comparisons made.
    pub checks: usize,
    pub failures: Vec<Mismatch>,
}

impl Report {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn merge(&mut self, other: Report) {
        self.checks += other.checks;
        self.failures.extend(other.failures);
    }

    #[track_caller]
    pub fn assert_clean(&self) {
        if self.is_clean() {
            return;
        }
        let listing = self
            .failures
            .iter()
            .map(|m| format!("  {m}"))
            .collect::<Vec<_>>()
            .join("\n");
        panic!(
            "{} of {} conformance checks failed:\n{listing}",
            self.failures.len(),
            self.checks
        );
    }

    fn check(
        &mut self,
        key: DispatchKey,
        implementation: &'static str,
        scenario: impl FnOnce() -> String,
        expected: u32,
        actual: u32,
    ) {
        self.checks += 1;
        if expected != actual {
            self.failures.push(Mismatch {
                key,
                implementation,
                scenario: scenario(),
                expected,
                actual,
            });
        }
    }
}

#[inline]
fn sample<P: Pixel>(plane: &PlaneRef<'_, P>, x: usize, y: usize) -> u32 {
    let at = plane.base() as isize + y as isize * plane.stride() + x as isize;
    plane.data()[at as usize].to_u32()
}

/// Reference SAD: a plain double loop over the addressed samples.
pub fn reference_sad<P: Pixel>(
    src: &PlaneRef<'_, P>,
    reference: &PlaneRef<'_, P>,
    bsize: BlockSize,
) -> u32 {
    let mut total = 0;
    for y in 0..bsize.height() {
        for x in 0..bsize.width() {
            total += sample(src, x, y).abs_diff(sample(reference, x, y));
        }
    }
    total
}

/// Reference compound SAD against `(reference + second_pred + 1) >> 1`.
pub fn reference_sad_avg<P: Pixel>(
    src: &PlaneRef<'_, P>,
    reference: &PlaneRef<'_, P>,
    second_pred: &[P],
    bsize: BlockSize,
) -> u32 {
    let w = bsize.width();
    let mut total = 0;
    for y in 0..bsize.height() {
        for x in 0..w {
            let predicted = (sample(reference, x, y) + second_pred[y * w + x].to_u32() + 1) >> 1;
            total += sample(src, x, y).abs_diff(predicted);
        }
    }
    total
}

/// Input patterns for the SAD kernels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::EnumIter, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum SadScenario {
    Random,
    /// Source all zero, references all max.
    MaxRef,
    /// Source all max, references all zero.
    MaxSrc,
    /// Reference stride halved.
    ShortRef,
    /// Reference stride one less than the default.
    UnalignedRef,
    /// Source stride halved.
    ShortSrc,
    /// Source base advanced by one block width.
    SrcOffsetByWidth,
    /// References repacked to stride `w`, compared against the loose layout.
    TightRef,
    /// Reference rows addressed bottom-up.
    NegativeStride,
    /// 0/max checkerboard in the source, its inverse in the references.
    Alternating,
}

enum Fill {
    Random,
    Constant { src: u32, refs: u32 },
    Checker,
}

impl SadScenario {
    fn fill(self, max: u32) -> Fill {
        match self {
            Self::MaxRef => Fill::Constant { src: 0, refs: max },
            Self::MaxSrc => Fill::Constant { src: max, refs: 0 },
            Self::Alternating => Fill::Checker,
            _ => Fill::Random,
        }
    }
}

/// Source, four references and a second predictor for one block size.
///
/// Source stride is `(w + 31) & !31` and reference stride `2w`, the layout
/// motion search typically hands the kernels.
pub struct SadHarness<P> {
    bsize: BlockSize,
    depth: Depth,
    rng: StdRng,
    src: Vec<P>,
    refs: Vec<P>,
    tight: Vec<P>,
    second_pred: Vec<P>,
}

struct SadLayout {
    src_base: usize,
    src_stride: isize,
    ref_stride: isize,
    flipped: bool,
    tight: bool,
}

impl<P: Pixel> SadHarness<P> {
    pub fn new(bsize: BlockSize, depth: Depth, seed: u64) -> Result<Self> {
        if !P::stores(depth) {
            return Err(Error::StorageMismatch { depth });
        }
        let (w, h) = (bsize.width(), bsize.height());
        let src_stride = (w + 31) & !31;
        let zero = P::from_u32(0);
        Ok(Self {
            bsize,
            depth,
            rng: StdRng::seed_from_u64(seed),
            src: vec![zero; src_stride * h + w],
            refs: vec![zero; 4 * 2 * w * h],
            tight: vec![zero; 4 * w * h],
            second_pred: vec![zero; w * h],
        })
    }

    pub fn source_stride(&self) -> usize {
        (self.bsize.width() + 31) & !31
    }

    pub fn reference_stride(&self) -> usize {
        2 * self.bsize.width()
    }

    fn block_len(&self) -> usize {
        self.reference_stride() * self.bsize.height()
    }

    fn layout(&self, scenario: SadScenario) -> SadLayout {
        let src_stride = self.source_stride() as isize;
        let ref_stride = self.reference_stride() as isize;
        let mut layout = SadLayout {
            src_base: 0,
            src_stride,
            ref_stride,
            flipped: false,
            tight: false,
        };
        match scenario {
            SadScenario::ShortRef => layout.ref_stride = ref_stride / 2,
            SadScenario::UnalignedRef => layout.ref_stride = ref_stride - 1,
            SadScenario::ShortSrc => layout.src_stride = src_stride / 2,
            SadScenario::SrcOffsetByWidth => layout.src_base = self.bsize.width(),
            SadScenario::NegativeStride => layout.flipped = true,
            SadScenario::TightRef => layout.tight = true,
            SadScenario::Random
            | SadScenario::MaxRef
            | SadScenario::MaxSrc
            | SadScenario::Alternating => {}
        }
        layout
    }

    fn fill(&mut self, scenario: SadScenario) {
        let max = self.depth.max_value();
        let w = self.bsize.width();
        let src_stride = self.source_stride();
        let ref_stride = self.reference_stride();
        match scenario.fill(max) {
            Fill::Random => {
                let rng = &mut self.rng;
                let all = self
                    .src
                    .iter_mut()
                    .chain(&mut self.refs)
                    .chain(&mut self.second_pred);
                for v in all {
                    *v = P::from_u32(rng.gen_range(0..=max));
                }
            }
            Fill::Constant { src, refs } => {
                self.src.fill(P::from_u32(src));
                self.refs.fill(P::from_u32(refs));
                self.second_pred.fill(P::from_u32(refs));
            }
            Fill::Checker => {
                let on = |i: usize, stride: usize| (i % stride + i / stride) % 2 == 1;
                for (i, v) in self.src.iter_mut().enumerate() {
                    *v = P::from_u32(if on(i, src_stride) { max } else { 0 });
                }
                for (i, v) in self.refs.iter_mut().enumerate() {
                    *v = P::from_u32(if on(i, ref_stride) { 0 } else { max });
                }
                for (i, v) in self.second_pred.iter_mut().enumerate() {
                    *v = P::from_u32(if on(i, w) { 0 } else { max });
                }
            }
        }
    }

    /// Reference views in the default (loose) layout, honoring stride changes.
    fn loose_refs(&self, layout: &SadLayout) -> [PlaneRef<'_, P>; 4] {
        let block_len = self.block_len();
        let h = self.bsize.height() as isize;
        std::array::from_fn(|i| {
            let start = i * block_len;
            if layout.flipped {
                let base = start as isize + (h - 1) * layout.ref_stride;
                PlaneRef::new(&self.refs, base as usize, -layout.ref_stride)
            } else {
                PlaneRef::new(&self.refs, start, layout.ref_stride)
            }
        })
    }

    fn repack(&mut self) {
        let (w, h) = (self.bsize.width(), self.bsize.height());
        let block_len = self.block_len();
        let ref_stride = self.reference_stride();
        for i in 0..4 {
            for y in 0..h {
                let from = i * block_len + y * ref_stride;
                let to = (i * h + y) * w;
                self.tight[to..to + w].copy_from_slice(&self.refs[from..from + w]);
            }
        }
    }

    /// Fills the buffers for `scenario` and checks every candidate of `kind`.
    pub fn run(
        &mut self,
        kind: KernelKind,
        candidates: &[Implementation<P>],
        scenario: SadScenario,
        report: &mut Report,
    ) {
        self.fill(scenario);
        let layout = self.layout(scenario);
        if layout.tight {
            self.repack();
        }
        let bsize = self.bsize;
        let (w, h) = (bsize.width(), bsize.height());
        let key = DispatchKey {
            kind,
            bsize,
            depth: self.depth,
        };

        let src = PlaneRef::new(&self.src, layout.src_base, layout.src_stride);
        let loose = self.loose_refs(&layout);
        let tight: [PlaneRef<'_, P>; 4] =
            std::array::from_fn(|i| PlaneRef::new(&self.tight, i * w * h, w as isize));
        // Expected values are always taken from the loose layout.
        let expected: [u32; 4] = std::array::from_fn(|i| reference_sad(&src, &loose[i], bsize));
        let refs = if layout.tight { &tight } else { &loose };

        for candidate in candidates {
            let name = candidate.name;
            match candidate.func {
                KernelFn::Sad(f) => {
                    for i in 0..4 {
                        let got = f(src, refs[i]);
                        let label = || format!("{scenario} ref {i}");
                        report.check(key, name, label, expected[i], got);
                    }
                }
                KernelFn::SadX4(f) => {
                    let got = f(src, refs);
                    for i in 0..4 {
                        let label = || format!("{scenario} ref {i}");
                        report.check(key, name, label, expected[i], got[i]);
                    }
                }
                KernelFn::SadAvg(f) => {
                    let expected = reference_sad_avg(&src, &loose[0], &self.second_pred, bsize);
                    let got = f(src, refs[0], &self.second_pred);
                    report.check(key, name, || scenario.to_string(), expected, got);
                }
                KernelFn::SadBounded(f) => {
                    let exact = expected[0];
                    let mut bounds = vec![0, exact, exact.saturating_add(1), u32::MAX];
                    if exact > 0 {
                        bounds.push(exact - 1);
                    }
                    if matches!(scenario, SadScenario::MaxRef | SadScenario::MaxSrc) {
                        bounds.push(MAX_SAD_BOUND);
                    }
                    for bound in bounds {
                        let got = f(src, refs[0], bound);
                        report.checks += 1;
                        let ok = if exact <= bound { got == exact } else { got >= bound };
                        if !ok {
                            report.failures.push(Mismatch {
                                key,
                                implementation: name,
                                scenario: format!("{scenario} bound {bound}"),
                                expected: exact,
                                actual: got,
                            });
                        }
                    }
                }
                KernelFn::Intra(_) => {}
            }
        }
    }
}

/// Border patterns for intra prediction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::EnumIter, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum IntraScenario {
    Random,
    /// Every border sample 0.
    Zero,
    /// Every border sample 2^(bd-1).
    Mid,
    /// Every border sample at the depth maximum.
    Max,
    /// Above max, left and corner 0: TM clips high.
    AboveMaxLeftZero,
    /// Above 0, left and corner max: TM clips low.
    AboveZeroLeftMax,
    /// Alternating 0/max along each edge.
    Alternating,
}

/// Reference predictor evaluated one cell at a time.
///
/// Directional modes project each cell straight onto the border sample its
/// ray meets, without building any intermediate rows.
/// Returns `n * n` samples in raster order.
pub fn brute_force_predict<P: Pixel>(
    kernel: IntraKernel,
    n: usize,
    edge: &IntraEdge<'_, P>,
    bitdepth_max: u32,
) -> Vec<u32> {
    let a = |i: usize| edge.above[i].to_u32();
    let l = |i: usize| edge.left[i].to_u32();
    let tl = edge.top_left.to_u32();
    let avg2 = |x: u32, y: u32| (x + y + 1) >> 1;
    let avg3 = |x: u32, y: u32, z: u32| (x + 2 * y + z + 2) >> 2;
    // Border as one line: A[i] at i >= 0, the corner at -1, L[-i - 2] below.
    let e = |i: isize| match i {
        i if i >= 0 => a(i as usize),
        -1 => tl,
        i => l((-i - 2) as usize),
    };
    let log2 = |v: usize| v.trailing_zeros();

    let sum_above: u32 = (0..n).map(a).sum();
    let sum_left: u32 = (0..n).map(l).sum();

    let mut out = Vec::with_capacity(n * n);
    for r in 0..n {
        for c in 0..n {
            let v = match kernel {
                IntraKernel::Dc => (sum_above + sum_left + n as u32) >> log2(2 * n),
                IntraKernel::DcTop => (sum_above + n as u32 / 2) >> log2(n),
                IntraKernel::DcLeft => (sum_left + n as u32 / 2) >> log2(n),
                IntraKernel::Dc128 => (bitdepth_max + 1) >> 1,
                IntraKernel::V => a(c),
                IntraKernel::H => l(r),
                IntraKernel::Tm => {
                    let v = a(c) as i64 + l(r) as i64 - tl as i64;
                    v.clamp(0, bitdepth_max as i64) as u32
                }
                IntraKernel::D45 => {
                    let i = r + c;
                    if i + 2 < 2 * n {
                        avg3(a(i), a(i + 1), a(i + 2))
                    } else {
                        a(2 * n - 1)
                    }
                }
                IntraKernel::D117 => {
                    // Rays rise two rows per column. Even rows land between
                    // two above-row samples, odd rows on one; rays that exit
                    // through the left column land on border sample -y.
                    let half = r / 2;
                    if c >= half {
                        let x = (c - half) as isize;
                        if r % 2 == 0 {
                            avg2(e(x - 1), e(x))
                        } else {
                            avg3(e(x - 2), e(x - 1), e(x))
                        }
                    } else {
                        let y = (r - 2 * c) as isize;
                        avg3(e(1 - y), e(-y), e(-1 - y))
                    }
                }
                IntraKernel::D135 => {
                    // Border ring L[n-1] .. L[0], TL, A[0] .. A[n-1]; each
                    // diagonal takes the three-tap average centered on the
                    // ring sample it starts from.
                    let ring = |i: isize| -> u32 {
                        let k = i - n as isize;
                        match k {
                            k if k < 0 => l((-k - 1) as usize),
                            0 => tl,
                            k => a((k - 1) as usize),
                        }
                    };
                    let center = n as isize + c as isize - r as isize;
                    avg3(ring(center - 1), ring(center), ring(center + 1))
                }
            };
            out.push(v);
        }
    }
    out
}

/// Border context and destination for one intra block size.
pub struct IntraHarness<P> {
    bsize: BlockSize,
    depth: Depth,
    rng: StdRng,
    above: Vec<P>,
    left: Vec<P>,
    top_left: P,
    dst: Vec<P>,
}

/// Columns of guard samples on each side of the predicted block.
const GUARD: usize = 4;

impl<P: Pixel> IntraHarness<P> {
    pub fn new(bsize: BlockSize, depth: Depth, seed: u64) -> Result<Self> {
        if !P::stores(depth) {
            return Err(Error::StorageMismatch { depth });
        }
        KernelKind::Intra(IntraKernel::Dc).check(bsize)?;
        let n = bsize.width();
        let zero = P::from_u32(0);
        Ok(Self {
            bsize,
            depth,
            rng: StdRng::seed_from_u64(seed),
            above: vec![zero; 2 * n],
            left: vec![zero; n],
            top_left: zero,
            dst: vec![zero; Self::stride(n) * (n + 2)],
        })
    }

    fn stride(n: usize) -> usize {
        n + 2 * GUARD
    }

    fn sentinel(&self) -> P {
        P::from_u32(self.depth.max_value() / 3)
    }

    pub fn fill(&mut self, scenario: IntraScenario) {
        let max = self.depth.max_value();
        let mid = self.depth.mid_value();
        let set = |v: &mut [P], x: u32| v.fill(P::from_u32(x));
        match scenario {
            IntraScenario::Random => {
                let rng = &mut self.rng;
                for v in self.above.iter_mut().chain(&mut self.left) {
                    *v = P::from_u32(rng.gen_range(0..=max));
                }
                self.top_left = P::from_u32(rng.gen_range(0..=max));
            }
            IntraScenario::Zero | IntraScenario::Mid | IntraScenario::Max => {
                let k = match scenario {
                    IntraScenario::Zero => 0,
                    IntraScenario::Mid => mid,
                    _ => max,
                };
                set(&mut self.above, k);
                set(&mut self.left, k);
                self.top_left = P::from_u32(k);
            }
            IntraScenario::AboveMaxLeftZero => {
                set(&mut self.above, max);
                set(&mut self.left, 0);
                self.top_left = P::from_u32(0);
            }
            IntraScenario::AboveZeroLeftMax => {
                set(&mut self.above, 0);
                set(&mut self.left, max);
                self.top_left = P::from_u32(max);
            }
            IntraScenario::Alternating => {
                for (i, v) in self.above.iter_mut().enumerate() {
                    *v = P::from_u32(if i % 2 == 0 { max } else { 0 });
                }
                for (i, v) in self.left.iter_mut().enumerate() {
                    *v = P::from_u32(if i % 2 == 0 { 0 } else { max });
                }
                self.top_left = P::from_u32(mid);
            }
        }
    }

    pub fn edge(&self) -> IntraEdge<'_, P> {
        IntraEdge::new(self.top_left, &self.above, &self.left)
    }

    /// Fills the border for `scenario` and checks every candidate of
    /// `kernel`, including that nothing outside the block is written.
    pub fn run(
        &mut self,
        kernel: IntraKernel,
        candidates: &[Implementation<P>],
        scenario: IntraScenario,
        report: &mut Report,
    ) {
        self.fill(scenario);
        let n = self.bsize.width();
        let stride = Self::stride(n);
        let base = stride + GUARD;
        let bitdepth_max = self.depth.max_value();
        let key = DispatchKey {
            kind: KernelKind::Intra(kernel),
            bsize: self.bsize,
            depth: self.depth,
        };
        let sentinel = self.sentinel();
        let expected = brute_force_predict(kernel, n, &self.edge(), bitdepth_max);

        for candidate in candidates {
            let KernelFn::Intra(f) = candidate.func else {
                continue;
            };
            self.dst.fill(sentinel);
            let edge = IntraEdge::new(self.top_left, &self.above, &self.left);
            f(
                PlaneMut::new(&mut self.dst, base, stride as isize),
                &edge,
                bitdepth_max,
            );
            for (i, &got) in self.dst.iter().enumerate() {
                let (y, x) = (i / stride, i % stride);
                let inside = (1..=n).contains(&y) && (GUARD..GUARD + n).contains(&x);
                let want = if inside {
                    expected[(y - 1) * n + (x - GUARD)]
                } else {
                    sentinel.to_u32()
                };
                let (r, c) = (y as isize - 1, x as isize - GUARD as isize);
                report.check(
                    key,
                    candidate.name,
                    || format!("{scenario} row {r} col {c}"),
                    want,
                    got.to_u32(),
                );
            }
        }
    }
}

/// Runs every scenario against every implementation in `table` that the
/// running CPU can execute, seeded with [`DEFAULT_SEED`].
pub fn run_all<P: Pixel>(table: &DspTable<P>) -> Report {
    run_all_with_seed(table, DEFAULT_SEED)
}

pub fn run_all_with_seed<P: Pixel>(table: &DspTable<P>, seed: u64) -> Report {
    let depth = table.depth();
    let available = detected_cpu_flags();
    let mut report = Report::default();

    for kind in KernelKind::iter() {
        for bsize in kind.sizes() {
            let candidates: Vec<_> = table
                .runnable_candidates(kind, bsize, available)
                .copied()
                .collect();
            match kind {
                KernelKind::Intra(kernel) => {
                    let Ok(mut harness) = IntraHarness::new(bsize, depth, seed) else {
                        continue;
                    };
                    for scenario in IntraScenario::iter() {
                        harness.run(kernel, &candidates, scenario, &mut report);
                    }
                }
                _ => {
                    let Ok(mut harness) = SadHarness::new(bsize, depth, seed) else {
                        continue;
                    };
                    for scenario in SadScenario::iter() {
                        harness.run(kind, &candidates, scenario, &mut report);
                    }
                }
            }
        }
    }

    debug!(
        %depth,
        checks = report.checks,
        failures = report.failures.len(),
        "conformance run finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brute_force_matches_hand_computed_d135() {
        let above = [10u8, 20, 30, 40];
        let left = [10u8, 5, 15, 25];
        let edge = IntraEdge::new(10, &above, &left);
        let got = brute_force_predict(IntraKernel::D135, 4, &edge, 255);
        assert_eq!(
            got,
            [10, 13, 20, 30, 9, 10, 13, 20, 9, 9, 10, 13, 15, 9, 9, 10]
        );
    }

    #[test]
    fn brute_force_matches_hand_computed_d117() {
        let above = [10u8, 20, 30, 40];
        let left = [10u8, 5, 15, 25];
        let edge = IntraEdge::new(10, &above, &left);
        let got = brute_force_predict(IntraKernel::D117, 4, &edge, 255);
        assert_eq!(
            got,
            [10, 15, 25, 35, 10, 13, 20, 30, 9, 10, 15, 25, 9, 10, 13, 20]
        );
    }

    #[test]
    #[cfg(feature = "bitdepth_8")]
    fn brute_force_d117_agrees_with_portable_kernel_at_8x8() {
        use crate::include::common::bitdepth::BitDepth8;
        use crate::src::ipred::ipred_rust;

        // Distinct, uneven samples so any tap landing on the wrong index shows.
        let above: Vec<u8> = (0..16).map(|i| (i * i * 3 + 7) as u8).collect();
        let left: Vec<u8> = (0..8).map(|i| (200 - i * 23) as u8).collect();
        let edge = IntraEdge::new(99, &above, &left);
        let kernel = ipred_rust::<BitDepth8>(IntraKernel::D117, BlockSize::Block8x8).unwrap();
        let mut out = [0u8; 64];
        kernel(PlaneMut::contiguous(&mut out, 8), &edge, 255);
        let expected: Vec<u32> = out.iter().map(|&v| v as u32).collect();
        assert_eq!(brute_force_predict(IntraKernel::D117, 8, &edge, 255), expected);
    }

    #[test]
    fn reference_sad_follows_negative_stride() {
        let data: Vec<u8> = (0..16).collect();
        let zero = [0u8; 16];
        let up = PlaneRef::new(&data, 12, -4);
        let src = PlaneRef::contiguous(&zero, 4);
        assert_eq!(reference_sad(&src, &up, BlockSize::Block4x4), (0..16).sum::<u32>());
    }

    #[test]
    fn bounded_relation_flags_under_report() {
        fn lies(_: PlaneRef<'_, u8>, _: PlaneRef<'_, u8>, _: u32) -> u32 {
            0
        }
        let candidates = [Implementation {
            name: "lies",
            requires: crate::src::cpu::CpuFlags::empty(),
            func: KernelFn::SadBounded(lies as crate::src::sad::SadBoundedFn<u8>),
        }];
        let mut harness = SadHarness::<u8>::new(BlockSize::Block8x8, Depth::Eight, 1).unwrap();
        let mut report = Report::default();
        harness.run(
            KernelKind::SadBounded,
            &candidates,
            SadScenario::MaxSrc,
            &mut report,
        );
        assert!(!report.is_clean());
        assert!(report
            .failures
            .iter()
            .any(|m| m.scenario == format!("max_src bound {MAX_SAD_BOUND}")));
    }

    #[test]
    fn harness_rejects_storage_mismatch() {
        assert!(SadHarness::<u8>::new(BlockSize::Block4x4, Depth::Ten, 0).is_err());
        assert!(IntraHarness::<u16>::new(BlockSize::Block8x16, Depth::Ten, 0).is_err());
    }

    #[test]
    #[cfg(feature = "bitdepth_8")]
    fn default_table_is_clean() {
        run_all(DspTable::<u8>::get(Depth::Eight)).assert_clean();
    }
}
