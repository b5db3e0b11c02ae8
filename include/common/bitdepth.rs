//! Sample storage and logical bit depth.
//!
//! Storage (`u8` or `u16` cells) is a type parameter; the logical depth
//! (8, 10 or 12) is a runtime [`Depth`] tag that bounds valid sample values.

use crate::src::error::Error;
use std::fmt;
use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use strum::EnumCount;
use strum::EnumIter;

mod sealed {
    pub trait Sealed {}
    impl Sealed for u8 {}
    impl Sealed for u16 {}
}

/// A storage cell for one sample.
pub trait Pixel:
    sealed::Sealed + Copy + Default + Eq + Ord + Debug + Send + Sync + 'static
{
    /// Width of the storage cell in bits.
    const STORAGE_BITS: u8;

    fn to_u32(self) -> u32;

    /// Narrows `v` into the cell. `v` must already be a valid sample.
    fn from_u32(v: u32) -> Self;

    /// Whether samples of `depth` are stored in this cell type.
    fn stores(depth: Depth) -> bool {
        depth.storage_bits() == Self::STORAGE_BITS
    }
}

impl Pixel for u8 {
    const STORAGE_BITS: u8 = 8;

    #[inline(always)]
    fn to_u32(self) -> u32 {
        self as u32
    }

    #[inline(always)]
    fn from_u32(v: u32) -> Self {
        debug_assert!(v <= u8::MAX as u32);
        v as u8
    }
}

impl Pixel for u16 {
    const STORAGE_BITS: u8 = 16;

    #[inline(always)]
    fn to_u32(self) -> u32 {
        self as u32
    }

    #[inline(always)]
    fn from_u32(v: u32) -> Self {
        debug_assert!(v <= u16::MAX as u32);
        v as u16
    }
}

/// Compile-time bit depth class, generic over the storage cell.
pub trait BitDepth: Clone + Copy {
    type Pixel: Pixel;

    const BPC: BPC;

    fn new(bitdepth_max: u32) -> Self;

    fn bitdepth_max(&self) -> u32;

    #[inline(always)]
    fn bitdepth(&self) -> u8 {
        (32 - self.bitdepth_max().leading_zeros()) as u8
    }

    /// Clamps an intermediate value into `[0, bitdepth_max]`.
    #[inline(always)]
    fn iclip_pixel(&self, v: i32) -> Self::Pixel {
        Self::Pixel::from_u32(v.clamp(0, self.bitdepth_max() as i32) as u32)
    }

    /// The DC value used when no neighbors are available, `1 << (bitdepth - 1)`.
    #[inline(always)]
    fn mid_pixel(&self) -> Self::Pixel {
        Self::Pixel::from_u32((self.bitdepth_max() + 1) >> 1)
    }
}

/// Storage class selector, matched on when dispatching by storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BPC {
    BPC8,
    BPC16,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct BitDepth8;

impl BitDepth for BitDepth8 {
    type Pixel = u8;

    const BPC: BPC = BPC::BPC8;

    #[inline(always)]
    fn new(bitdepth_max: u32) -> Self {
        debug_assert_eq!(bitdepth_max, 0xff);
        Self
    }

    #[inline(always)]
    fn bitdepth_max(&self) -> u32 {
        0xff
    }
}

#[derive(Clone, Copy, Debug)]
pub struct BitDepth16 {
    bitdepth_max: u32,
}

impl BitDepth for BitDepth16 {
    type Pixel = u16;

    const BPC: BPC = BPC::BPC16;

    #[inline(always)]
    fn new(bitdepth_max: u32) -> Self {
        debug_assert!(bitdepth_max == 0x3ff || bitdepth_max == 0xfff);
        Self { bitdepth_max }
    }

    #[inline(always)]
    fn bitdepth_max(&self) -> u32 {
        self.bitdepth_max
    }
}

/// Logical sample depth.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, EnumCount, EnumIter)]
pub enum Depth {
    Eight,
    Ten,
    Twelve,
}

impl Depth {
    pub const fn bits(self) -> u8 {
        match self {
            Self::Eight => 8,
            Self::Ten => 10,
            Self::Twelve => 12,
        }
    }

    /// Largest valid sample, `2^depth - 1`.
    pub const fn max_value(self) -> u32 {
        (1 << self.bits()) - 1
    }

    /// `2^(depth - 1)`.
    pub const fn mid_value(self) -> u32 {
        1 << (self.bits() - 1)
    }

    pub const fn storage_bits(self) -> u8 {
        match self {
            Self::Eight => 8,
            Self::Ten | Self::Twelve => 16,
        }
    }

    pub const fn bpc(self) -> BPC {
        match self {
            Self::Eight => BPC::BPC8,
            Self::Ten | Self::Twelve => BPC::BPC16,
        }
    }

    /// Dense index into per-depth tables.
    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

impl TryFrom<u8> for Depth {
    type Error = Error;

    fn try_from(bits: u8) -> Result<Self, Error> {
        match bits {
            8 => Ok(Self::Eight),
            10 => Ok(Self::Ten),
            12 => Ok(Self::Twelve),
            _ => Err(Error::UnsupportedBitDepth(bits)),
        }
    }
}

impl Display for Depth {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}bpc", self.bits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_ranges() {
        assert_eq!(Depth::Eight.max_value(), 255);
        assert_eq!(Depth::Ten.max_value(), 1023);
        assert_eq!(Depth::Twelve.max_value(), 4095);
        assert_eq!(Depth::Ten.mid_value(), 512);
        assert!(u8::stores(Depth::Eight));
        assert!(!u8::stores(Depth::Twelve));
        assert!(u16::stores(Depth::Ten));
    }

    #[test]
    fn depth_parse() {
        assert_eq!(Depth::try_from(12), Ok(Depth::Twelve));
        assert_eq!(Depth::try_from(9), Err(Error::UnsupportedBitDepth(9)));
    }

    #[test]
    fn bitdepth16_clip() {
        let bd = BitDepth16::new(0x3ff);
        assert_eq!(bd.bitdepth(), 10);
        assert_eq!(bd.iclip_pixel(-7), 0);
        assert_eq!(bd.iclip_pixel(5000), 1023);
        assert_eq!(bd.mid_pixel(), 512);
        assert_eq!(BitDepth8.mid_pixel(), 128);
    }
}
