use crate::src::error::Error;
use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;
use strum::EnumCount;
use strum::EnumIter;
use strum::IntoEnumIterator;

/// Block geometries, ordered by area then width.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, EnumCount, EnumIter)]
pub enum BlockSize {
    Block4x4,
    Block4x8,
    Block8x4,
    Block8x8,
    Block8x16,
    Block16x8,
    Block16x16,
    Block16x32,
    Block32x16,
    Block32x32,
    Block32x64,
    Block64x32,
    Block64x64,
}

impl BlockSize {
    pub const fn width(self) -> usize {
        use BlockSize::*;
        match self {
            Block4x4 | Block4x8 => 4,
            Block8x4 | Block8x8 | Block8x16 => 8,
            Block16x8 | Block16x16 | Block16x32 => 16,
            Block32x16 | Block32x32 | Block32x64 => 32,
            Block64x32 | Block64x64 => 64,
        }
    }

    pub const fn height(self) -> usize {
        use BlockSize::*;
        match self {
            Block4x4 | Block8x4 => 4,
            Block4x8 | Block8x8 | Block16x8 => 8,
            Block8x16 | Block16x16 | Block32x16 => 16,
            Block16x32 | Block32x32 | Block64x32 => 32,
            Block32x64 | Block64x64 => 64,
        }
    }

    pub const fn area(self) -> usize {
        self.width() * self.height()
    }

    pub const fn is_square(self) -> bool {
        self.width() == self.height()
    }

    pub(crate) const fn index(self) -> usize {
        self as usize
    }

    pub fn from_dims(width: usize, height: usize) -> Result<Self, Error> {
        Self::iter()
            .find(|b| b.width() == width && b.height() == height)
            .ok_or(Error::UnsupportedBlockSize { width, height })
    }
}

impl TryFrom<(usize, usize)> for BlockSize {
    type Error = Error;

    fn try_from((width, height): (usize, usize)) -> Result<Self, Error> {
        Self::from_dims(width, height)
    }
}

impl Display for BlockSize {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width(), self.height())
    }
}

/// Intra prediction modes as seen by a coder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumCount, EnumIter)]
pub enum IntraMode {
    Dc,
    V,
    H,
    Tm,
    D45,
    D117,
    D135,
}

impl Display for IntraMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Dc => "dc",
            Self::V => "v",
            Self::H => "h",
            Self::Tm => "tm",
            Self::D45 => "d45",
            Self::D117 => "d117",
            Self::D135 => "d135",
        };
        f.write_str(name)
    }
}

/// Intra kernels as stored in the dispatch table.
///
/// DC is split by which neighbors are available.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumCount, EnumIter)]
pub enum IntraKernel {
    Dc,
    DcLeft,
    DcTop,
    Dc128,
    V,
    H,
    Tm,
    D45,
    D117,
    D135,
}

impl IntraKernel {
    pub(crate) const fn index(self) -> usize {
        self as usize
    }

    /// Number of above samples the kernel reads for a block of side `n`.
    pub const fn above_len(self, n: usize) -> usize {
        match self {
            Self::D45 => 2 * n,
            Self::Dc | Self::DcTop | Self::V | Self::Tm | Self::D117 | Self::D135 => n,
            Self::DcLeft | Self::Dc128 | Self::H => 0,
        }
    }

    /// Number of left samples the kernel reads for a block of side `n`.
    pub const fn left_len(self, n: usize) -> usize {
        match self {
            Self::Dc | Self::DcLeft | Self::H | Self::Tm | Self::D117 | Self::D135 => n,
            Self::DcTop | Self::Dc128 | Self::V | Self::D45 => 0,
        }
    }

    pub const fn reads_top_left(self) -> bool {
        matches!(self, Self::Tm | Self::D117 | Self::D135)
    }
}

impl From<IntraMode> for IntraKernel {
    /// Maps a mode to its kernel assuming both neighbors are available.
    fn from(mode: IntraMode) -> Self {
        match mode {
            IntraMode::Dc => Self::Dc,
            IntraMode::V => Self::V,
            IntraMode::H => Self::H,
            IntraMode::Tm => Self::Tm,
            IntraMode::D45 => Self::D45,
            IntraMode::D117 => Self::D117,
            IntraMode::D135 => Self::D135,
        }
    }
}

impl Display for IntraKernel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Dc => "dc",
            Self::DcLeft => "dc_left",
            Self::DcTop => "dc_top",
            Self::Dc128 => "dc_128",
            Self::V => "v",
            Self::H => "h",
            Self::Tm => "tm",
            Self::D45 => "d45",
            Self::D117 => "d117",
            Self::D135 => "d135",
        };
        f.write_str(name)
    }
}

/// Kernel identity, the first component of a dispatch key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KernelKind {
    Sad,
    SadBounded,
    SadX4,
    SadAvg,
    Intra(IntraKernel),
}

impl KernelKind {
    pub const COUNT: usize = 4 + IntraKernel::COUNT;

    pub(crate) const fn index(self) -> usize {
        match self {
            Self::Sad => 0,
            Self::SadBounded => 1,
            Self::SadX4 => 2,
            Self::SadAvg => 3,
            Self::Intra(k) => 4 + k.index(),
        }
    }

    pub fn iter() -> impl Iterator<Item = Self> {
        [Self::Sad, Self::SadBounded, Self::SadX4, Self::SadAvg]
            .into_iter()
            .chain(IntraKernel::iter().map(Self::Intra))
    }

    /// Whether `bsize` is in this kernel's fixed size set.
    pub const fn supports(self, bsize: BlockSize) -> bool {
        use BlockSize::*;
        match self {
            Self::Sad | Self::SadX4 => true,
            Self::SadAvg => !matches!(bsize, Block4x4 | Block4x8),
            Self::SadBounded => {
                matches!(bsize, Block16x16 | Block8x16 | Block16x8 | Block8x8 | Block4x4)
            }
            Self::Intra(_) => matches!(bsize, Block4x4 | Block8x8 | Block16x16 | Block32x32),
        }
    }

    pub fn sizes(self) -> impl Iterator<Item = BlockSize> {
        BlockSize::iter().filter(move |&b| self.supports(b))
    }

    pub fn check(self, bsize: BlockSize) -> Result<(), Error> {
        if self.supports(bsize) {
            Ok(())
        } else {
            Err(Error::UnsupportedGeometry { kind: self, bsize })
        }
    }
}

impl Display for KernelKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sad => f.write_str("sad"),
            Self::SadBounded => f.write_str("sad_bounded"),
            Self::SadX4 => f.write_str("sad_x4"),
            Self::SadAvg => f.write_str("sad_avg"),
            Self::Intra(k) => write!(f, "ipred_{k}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_dims() {
        assert_eq!(BlockSize::COUNT, 13);
        for b in BlockSize::iter() {
            assert_eq!(BlockSize::from_dims(b.width(), b.height()), Ok(b));
        }
        assert_eq!(
            BlockSize::try_from((4, 16)),
            Err(Error::UnsupportedBlockSize {
                width: 4,
                height: 16
            })
        );
        assert_eq!(BlockSize::Block32x64.to_string(), "32x64");
    }

    #[test]
    fn size_sets() {
        assert_eq!(KernelKind::Sad.sizes().count(), 13);
        assert_eq!(KernelKind::SadX4.sizes().count(), 13);
        assert_eq!(KernelKind::SadAvg.sizes().count(), 11);
        assert_eq!(KernelKind::SadBounded.sizes().count(), 5);
        assert_eq!(KernelKind::Intra(IntraKernel::D45).sizes().count(), 4);
        assert!(KernelKind::Intra(IntraKernel::Tm)
            .sizes()
            .all(|b| b.is_square()));
    }

    #[test]
    fn kind_indices_are_dense() {
        let indices: Vec<usize> = KernelKind::iter().map(KernelKind::index).collect();
        assert_eq!(indices, (0..KernelKind::COUNT).collect::<Vec<_>>());
    }
}
