//! Differential conformance at every CPU level of the platform.
//!
//! Each level builds its own `Kernels`, so levels are independent of the
//! process-wide mask and of each other.

use vpxdsp_safe::src::conformance::{run_all, run_all_with_seed, Report};
use vpxdsp_safe::{CpuLevel, Depth, Kernels, Settings};

fn kernels_at(level: CpuLevel) -> Kernels {
    Kernels::new(&Settings { cpu_level: level })
        .unwrap_or_else(|e| panic!("kernels at {level}: {e}"))
}

fn run_level(kernels: &Kernels) -> Report {
    let mut report = Report::default();
    #[cfg(feature = "bitdepth_8")]
    report.merge(run_all(kernels.table::<u8>(Depth::Eight)));
    #[cfg(feature = "bitdepth_16")]
    {
        report.merge(run_all(kernels.table::<u16>(Depth::Ten)));
        report.merge(run_all(kernels.table::<u16>(Depth::Twelve)));
    }
    report
}

#[test]
fn every_level_is_conformant() {
    let mut failures = Vec::new();
    for &level in CpuLevel::platform_levels() {
        let report = run_level(&kernels_at(level));
        eprintln!(
            "[{level}] {} checks, {} failures",
            report.checks,
            report.failures.len()
        );
        assert!(report.checks > 0, "[{level}] ran no checks");
        failures.extend(report.failures.iter().map(|m| format!("[{level}] {m}")));
    }
    assert!(
        failures.is_empty(),
        "conformance failures:\n{}",
        failures.join("\n")
    );
}

#[test]
fn other_seeds_are_conformant() {
    let kernels = kernels_at(CpuLevel::Native);
    for seed in [1, 0x5eed, u64::MAX] {
        #[cfg(feature = "bitdepth_8")]
        run_all_with_seed(kernels.table::<u8>(Depth::Eight), seed).assert_clean();
        #[cfg(feature = "bitdepth_16")]
        run_all_with_seed(kernels.table::<u16>(Depth::Twelve), seed).assert_clean();
    }
}

#[test]
fn scalar_level_selects_only_portable_kernels() {
    let kernels = kernels_at(CpuLevel::Scalar);
    for (key, name) in kernels.describe() {
        assert_eq!(name, "rust", "{key}");
    }
}

#[test]
fn native_level_covers_the_same_keys_as_scalar() {
    let scalar: Vec<_> = kernels_at(CpuLevel::Scalar)
        .describe()
        .into_iter()
        .map(|(key, _)| key)
        .collect();
    let native: Vec<_> = kernels_at(CpuLevel::Native)
        .describe()
        .into_iter()
        .map(|(key, _)| key)
        .collect();
    assert_eq!(scalar, native);
}
