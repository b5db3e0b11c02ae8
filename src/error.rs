//! Errors for the construction and validation paths.
//!
//! Kernels have no error channel. Everything here is reported before a kernel
//! runs: while parsing geometry or depth, checking a plane against its
//! buffer, registering implementations or reading settings.

use crate::include::common::bitdepth::Depth;
use crate::src::levels::BlockSize;
use crate::src::levels::KernelKind;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Bit depth outside {8, 10, 12}.
    #[error("unsupported bit depth: {0}")]
    UnsupportedBitDepth(u8),

    /// Width/height pair outside the block catalog.
    #[error("unsupported block size: {width}x{height}")]
    UnsupportedBlockSize { width: usize, height: usize },

    /// Catalog block size that this kernel kind does not implement.
    #[error("{kind} does not support {bsize}")]
    UnsupportedGeometry { kind: KernelKind, bsize: BlockSize },

    /// Function registered under a kind with a different signature.
    #[error("function with the {func} signature registered as {kind}")]
    KindMismatch { kind: KernelKind, func: &'static str },

    /// Depth whose samples are not stored in the table's cell type.
    #[error("{depth} samples are not stored in this table's pixel type")]
    StorageMismatch { depth: Depth },

    /// Plane rows extend past the end (or before the start) of the buffer.
    #[error("buffer too small: need {needed} samples, have {len}")]
    BufferTooSmall { needed: usize, len: usize },

    /// A catalog key was left without any registered implementation.
    #[error("no implementation registered for {kind} {bsize} at {depth}")]
    MissingImplementation {
        kind: KernelKind,
        bsize: BlockSize,
        depth: Depth,
    },

    /// Unrecognized CPU level name.
    #[error("invalid cpu level: {0}")]
    InvalidCpuLevel(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
