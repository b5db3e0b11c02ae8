//! An unparsable `VPXDSP_CPU_LEVEL` is reported by `Settings::from_env`
//! and ignored by the global kernels, which fall back to the defaults.
//!
//! Environment reads are cached on first use, so this binary sets the
//! variable before anything else runs and holds a single test.

use vpxdsp_safe::{CpuLevel, Error, Kernels, Settings};

#[test]
fn invalid_level_falls_back_to_native() {
    std::env::remove_var("VPXDSP_FORCE_SCALAR");
    std::env::set_var("VPXDSP_CPU_LEVEL", "turbo");

    assert_eq!(
        Settings::from_env(),
        Err(Error::InvalidCpuLevel("turbo".to_owned()))
    );
    let kernels = Kernels::global();
    assert_eq!(kernels.level(), CpuLevel::Native);
    assert_eq!(kernels.level(), Settings::default().cpu_level);
}
