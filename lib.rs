// Crate-wide forbid(unsafe_code) unless `unchecked` is enabled.
// With `unchecked`, only pixel_access may opt back in with item-level allows.
#![cfg_attr(not(feature = "unchecked"), forbid(unsafe_code))]
#![cfg_attr(feature = "unchecked", deny(unsafe_code))]
#![allow(clippy::needless_range_loop)]

#[cfg(not(any(feature = "bitdepth_8", feature = "bitdepth_16")))]
compile_error!("No bitdepths enabled. Enable one or more of the following features: `bitdepth_8`, `bitdepth_16`");

pub mod include {
    pub mod common {
        pub mod bitdepth;
        pub mod intops;
        pub(crate) mod validate;
    } // mod common
} // mod include
pub mod src {
    // Sample model and geometry
    pub mod cpu;
    mod env;
    pub mod error;
    pub mod levels;
    pub mod strided;

    // Reference kernels and their dispatch contexts
    pub mod ipred;
    pub mod ipred_prepare;
    pub mod sad;

    // Capability dispatch
    pub mod dsp;

    // Safe SIMD implementations (internal, registered through dsp)
    pub(crate) mod safe_simd;

    // Differential testing
    pub mod conformance;

    /// Safe, validated entry points over the process-wide dispatch tables.
    pub mod managed;
} // mod src

pub use include::common::bitdepth::{BitDepth, BitDepth16, BitDepth8, Depth, Pixel};
pub use src::error::{Error, Result};
pub use src::ipred_prepare::{EdgeBuffer, IntraEdge};
pub use src::levels::{BlockSize, IntraKernel, IntraMode, KernelKind};
pub use src::managed::{
    enabled_features, predict_intra, sad, sad_avg, sad_bounded, sad_x4, CpuLevel, Kernels,
    Settings,
};
pub use src::strided::{PlaneMut, PlaneRef};
