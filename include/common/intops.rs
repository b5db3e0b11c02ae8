//! Integer helpers shared by the kernels.

/// Two-tap average, rounding half up.
#[inline(always)]
pub const fn avg2(x: u32, y: u32) -> u32 {
    (x + y + 1) >> 1
}

/// Center-weighted three-tap average, rounding half up.
#[inline(always)]
pub const fn avg3(x: u32, y: u32, z: u32) -> u32 {
    (x + 2 * y + z + 2) >> 2
}

#[inline(always)]
pub fn iclip(v: i32, min: i32, max: i32) -> i32 {
    debug_assert!(min <= max);
    if v < min {
        min
    } else if v > max {
        max
    } else {
        v
    }
}

/// `(v + (1 << shift >> 1)) >> shift`
#[inline(always)]
pub const fn round2(v: u32, shift: u32) -> u32 {
    if shift == 0 {
        v
    } else {
        (v + (1 << (shift - 1))) >> shift
    }
}

#[inline(always)]
pub const fn ulog2(v: u32) -> u32 {
    31 - v.leading_zeros()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn averages_round_half_up() {
        assert_eq!(avg2(1, 2), 2);
        assert_eq!(avg2(0, 0), 0);
        assert_eq!(avg3(1, 1, 2), 1);
        assert_eq!(avg3(1, 2, 3), 2);
        assert_eq!(avg3(0, 0, 2), 1);
        assert_eq!(avg3(4095, 4095, 4095), 4095);
    }

    #[test]
    fn rounding_shift() {
        assert_eq!(round2(155, 3), 19);
        assert_eq!(round2(7, 0), 7);
        assert_eq!(ulog2(64), 6);
        assert_eq!(iclip(-3, 0, 255), 0);
        assert_eq!(iclip(300, 0, 255), 255);
    }
}
