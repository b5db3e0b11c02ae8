//! Property tests over the process-wide kernels.

#![allow(unused_imports)]

use proptest::prelude::*;
use vpxdsp_safe::src::conformance::{reference_sad, reference_sad_avg};
use vpxdsp_safe::{
    predict_intra, sad, sad_avg, sad_bounded, sad_x4, BlockSize, Depth, IntraEdge, IntraMode,
    KernelKind, PlaneMut, PlaneRef,
};

/// Room for a 64x64 block at stride 72.
const LEN: usize = 72 * 64;

fn sizes(kind: KernelKind) -> Vec<BlockSize> {
    kind.sizes().collect()
}

fn intra_sizes() -> Vec<BlockSize> {
    sizes(KernelKind::Intra(vpxdsp_safe::IntraKernel::Dc))
}

#[cfg(feature = "bitdepth_8")]
fn plane(data: &[u8], bsize: BlockSize, pad: usize) -> PlaneRef<'_, u8> {
    PlaneRef::new(data, 0, (bsize.width() + pad) as isize)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    #[cfg(feature = "bitdepth_8")]
    fn sad_matches_double_loop(
        bsize in prop::sample::select(sizes(KernelKind::Sad)),
        pad in 0usize..8,
        src in prop::collection::vec(any::<u8>(), LEN),
        reference in prop::collection::vec(any::<u8>(), LEN),
    ) {
        let s = plane(&src, bsize, pad);
        let r = plane(&reference, bsize, 8 - pad);
        prop_assert_eq!(sad(Depth::Eight, bsize, s, r), reference_sad(&s, &r, bsize));
    }

    #[test]
    #[cfg(feature = "bitdepth_16")]
    fn sad_matches_double_loop_12bit(
        bsize in prop::sample::select(sizes(KernelKind::Sad)),
        src in prop::collection::vec(0u16..4096, LEN),
        reference in prop::collection::vec(0u16..4096, LEN),
    ) {
        let s = PlaneRef::new(&src, 0, 72);
        let r = PlaneRef::new(&reference, 3, 69);
        prop_assert_eq!(sad(Depth::Twelve, bsize, s, r), reference_sad(&s, &r, bsize));
    }

    #[test]
    #[cfg(feature = "bitdepth_8")]
    fn x4_equals_four_single_calls(
        bsize in prop::sample::select(sizes(KernelKind::SadX4)),
        src in prop::collection::vec(any::<u8>(), LEN),
        refs in prop::collection::vec(any::<u8>(), 4 * LEN),
    ) {
        let s = plane(&src, bsize, 0);
        let r: [PlaneRef<'_, u8>; 4] =
            std::array::from_fn(|i| plane(&refs[i * LEN..(i + 1) * LEN], bsize, 5));
        let batched = sad_x4(Depth::Eight, bsize, s, &r);
        for i in 0..4 {
            prop_assert_eq!(batched[i], sad(Depth::Eight, bsize, s, r[i]));
        }
    }

    #[test]
    #[cfg(feature = "bitdepth_16")]
    fn avg_equals_sad_against_materialized_average(
        bsize in prop::sample::select(sizes(KernelKind::SadAvg)),
        src in prop::collection::vec(0u16..1024, 64 * 64),
        reference in prop::collection::vec(0u16..1024, 2 * 64 * 64),
        second in prop::collection::vec(0u16..1024, 64 * 64),
    ) {
        let (w, h) = (bsize.width(), bsize.height());
        let s = PlaneRef::new(&src, 0, w as isize);
        let r = PlaneRef::new(&reference, 0, 2 * w as isize);
        let mut averaged = vec![0u16; w * h];
        for y in 0..h {
            for x in 0..w {
                let a = reference[y * 2 * w + x] as u32;
                let b = second[y * w + x] as u32;
                averaged[y * w + x] = ((a + b + 1) >> 1) as u16;
            }
        }
        let avg = PlaneRef::new(&averaged, 0, w as isize);
        let got = sad_avg(Depth::Ten, bsize, s, r, &second);
        prop_assert_eq!(got, sad(Depth::Ten, bsize, s, avg));
        prop_assert_eq!(got, reference_sad_avg(&s, &r, &second, bsize));
    }

    #[test]
    #[cfg(feature = "bitdepth_8")]
    fn stride_does_not_change_the_result(
        bsize in prop::sample::select(sizes(KernelKind::Sad)),
        pad in 1usize..40,
        src in prop::collection::vec(any::<u8>(), 64 * 64),
        reference in prop::collection::vec(any::<u8>(), 64 * 64),
    ) {
        let (w, h) = (bsize.width(), bsize.height());
        let stride = w + pad;
        let mut loose = vec![0u8; stride * h];
        for y in 0..h {
            loose[y * stride..y * stride + w].copy_from_slice(&reference[y * w..(y + 1) * w]);
        }
        let s = PlaneRef::contiguous(&src, w);
        let tight = PlaneRef::contiguous(&reference, w);
        let wide = PlaneRef::contiguous(&loose, stride);
        prop_assert_eq!(sad(Depth::Eight, bsize, s, tight), sad(Depth::Eight, bsize, s, wide));
    }

    #[test]
    #[cfg(feature = "bitdepth_8")]
    fn bounded_never_under_reports(
        bsize in prop::sample::select(sizes(KernelKind::SadBounded)),
        bound in any::<u32>(),
        src in prop::collection::vec(any::<u8>(), LEN),
        reference in prop::collection::vec(any::<u8>(), LEN),
    ) {
        let s = plane(&src, bsize, 0);
        let r = plane(&reference, bsize, 0);
        let exact = sad(Depth::Eight, bsize, s, r);
        // Bounds near the exact value are the interesting ones.
        for b in [bound, bound % (exact + 1), exact, exact.saturating_sub(1)] {
            let got = sad_bounded(Depth::Eight, bsize, s, r, b);
            if exact <= b {
                prop_assert_eq!(got, exact);
            } else {
                prop_assert!(got >= b, "bound {} exact {} got {}", b, exact, got);
            }
        }
    }

    #[test]
    #[cfg(feature = "bitdepth_16")]
    fn constant_border_predicts_constant_block(
        bsize in prop::sample::select(intra_sizes()),
        mode in prop::sample::select(vec![IntraMode::Dc, IntraMode::V, IntraMode::H, IntraMode::Tm]),
        k in prop::sample::select(vec![0u16, 2048, 4095]),
    ) {
        let n = bsize.width();
        let above = vec![k; 2 * n];
        let left = vec![k; n];
        let edge = IntraEdge::new(k, &above, &left);
        let mut out = vec![1u16; n * n];
        predict_intra(Depth::Twelve, bsize, mode, PlaneMut::contiguous(&mut out, n), &edge);
        prop_assert!(out.iter().all(|&v| v == k));
    }

    #[test]
    #[cfg(all(feature = "bitdepth_8", feature = "bitdepth_16"))]
    fn linear_modes_scale_with_depth(
        bsize in prop::sample::select(intra_sizes()),
        mode in prop::sample::select(vec![IntraMode::V, IntraMode::H, IntraMode::Tm]),
        // Kept below the clip point so the 8-bit result is never saturated.
        above in prop::collection::vec(0u8..128, 64),
        left in prop::collection::vec(0u8..128, 32),
        top_left in 64u8..128,
    ) {
        let n = bsize.width();
        let mut out8 = vec![0u8; n * n];
        let edge8 = IntraEdge::new(top_left, &above, &left);
        predict_intra(Depth::Eight, bsize, mode, PlaneMut::contiguous(&mut out8, n), &edge8);

        let above10: Vec<u16> = above.iter().map(|&v| v as u16 * 4).collect();
        let left10: Vec<u16> = left.iter().map(|&v| v as u16 * 4).collect();
        let edge10 = IntraEdge::new(top_left as u16 * 4, &above10, &left10);
        let mut out10 = vec![0u16; n * n];
        predict_intra(Depth::Ten, bsize, mode, PlaneMut::contiguous(&mut out10, n), &edge10);

        for (a, b) in out8.iter().zip(&out10) {
            prop_assert_eq!(*a as u16 * 4, *b);
        }
    }
}
