//! Hand-computed intra predictions on a 4x4 block.
//!
//! Border: above = 10 20 30 40 50 60 70 (70), left = 10 5 15 25, corner 10.

#![cfg(feature = "bitdepth_8")]

use vpxdsp_safe::{
    predict_intra, BlockSize, Depth, EdgeBuffer, IntraEdge, IntraMode, PlaneMut,
};

const ABOVE: [u8; 8] = [10, 20, 30, 40, 50, 60, 70, 70];
const LEFT: [u8; 4] = [10, 5, 15, 25];
const TOP_LEFT: u8 = 10;

fn predict(mode: IntraMode, edge: &IntraEdge<'_, u8>) -> [[u8; 4]; 4] {
    let mut out = [0u8; 16];
    predict_intra(
        Depth::Eight,
        BlockSize::Block4x4,
        mode,
        PlaneMut::contiguous(&mut out, 4),
        edge,
    );
    std::array::from_fn(|r| std::array::from_fn(|c| out[r * 4 + c]))
}

fn edge() -> IntraEdge<'static, u8> {
    IntraEdge::new(TOP_LEFT, &ABOVE, &LEFT)
}

#[test]
fn dc_averages_both_edges() {
    // (100 + 55 + 4) >> 3
    assert_eq!(predict(IntraMode::Dc, &edge()), [[19; 4]; 4]);
}

#[test]
fn dc_follows_availability() {
    let e = edge();
    assert_eq!(predict(IntraMode::Dc, &e.with_availability(true, false)), [[25; 4]; 4]);
    assert_eq!(predict(IntraMode::Dc, &e.with_availability(false, true)), [[14; 4]; 4]);
    assert_eq!(
        predict(IntraMode::Dc, &e.with_availability(false, false)),
        [[128; 4]; 4]
    );
}

#[test]
fn v_and_h_copy_edges() {
    let v = predict(IntraMode::V, &edge());
    assert!(v.iter().all(|row| *row == [10, 20, 30, 40]));
    let h = predict(IntraMode::H, &edge());
    assert_eq!(h, [[10; 4], [5; 4], [15; 4], [25; 4]]);
}

#[test]
fn tm_extrapolates_from_corner() {
    assert_eq!(
        predict(IntraMode::Tm, &edge()),
        [
            [10, 20, 30, 40],
            [5, 15, 25, 35],
            [15, 25, 35, 45],
            [25, 35, 45, 55],
        ]
    );
}

#[test]
fn d45_replicates_last_above_sample() {
    assert_eq!(
        predict(IntraMode::D45, &edge()),
        [
            [20, 30, 40, 50],
            [30, 40, 50, 60],
            [40, 50, 60, 68],
            [50, 60, 68, 70],
        ]
    );
}

#[test]
fn d117_two_tap_first_row() {
    assert_eq!(
        predict(IntraMode::D117, &edge()),
        [
            [10, 15, 25, 35],
            [10, 13, 20, 30],
            [9, 10, 15, 25],
            [9, 10, 13, 20],
        ]
    );
}

#[test]
fn d135_three_tap_diagonals() {
    assert_eq!(
        predict(IntraMode::D135, &edge()),
        [
            [10, 13, 20, 30],
            [9, 10, 13, 20],
            [9, 9, 10, 13],
            [15, 9, 9, 10],
        ]
    );
}

#[test]
fn edge_buffer_extends_short_above_row() {
    let above = [10u8, 20, 30, 40, 50, 60, 70];
    let buf = EdgeBuffer::build(
        Depth::Eight,
        BlockSize::Block4x4,
        Some(&above[..]),
        Some(&LEFT[..]),
        TOP_LEFT,
    )
    .unwrap();
    assert_eq!(buf.edge().above, &ABOVE);
    assert_eq!(predict(IntraMode::D45, &buf.edge())[3], [50, 60, 68, 70]);
}

#[test]
fn missing_edges_predict_from_fill_values() {
    let buf = EdgeBuffer::<u8>::build(Depth::Eight, BlockSize::Block4x4, None, None, 0).unwrap();
    // Both neighbors missing: DC falls back to the mid value.
    assert_eq!(predict(IntraMode::Dc, &buf.edge()), [[128; 4]; 4]);
    assert_eq!(predict(IntraMode::V, &buf.edge()), [[127; 4]; 4]);
    assert_eq!(predict(IntraMode::H, &buf.edge()), [[129; 4]; 4]);
    // 127 + 129 - 127
    assert_eq!(predict(IntraMode::Tm, &buf.edge()), [[129; 4]; 4]);
}

#[test]
#[cfg(feature = "bitdepth_16")]
fn ten_bit_scales_by_four() {
    let above: Vec<u16> = ABOVE.iter().map(|&v| v as u16 * 4).collect();
    let left: Vec<u16> = LEFT.iter().map(|&v| v as u16 * 4).collect();
    let edge = IntraEdge::new(TOP_LEFT as u16 * 4, &above, &left);
    for mode in [IntraMode::V, IntraMode::H, IntraMode::Tm] {
        let mut out = [0u16; 16];
        predict_intra(
            Depth::Ten,
            BlockSize::Block4x4,
            mode,
            PlaneMut::contiguous(&mut out, 4),
            &edge,
        );
        let expected = predict(mode, &self::edge());
        for (i, &v) in out.iter().enumerate() {
            assert_eq!(v, expected[i / 4][i % 4] as u16 * 4, "{mode:?} cell {i}");
        }
    }
}
