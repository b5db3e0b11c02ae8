use vpxdsp_safe::{
    BlockSize, CpuLevel, Depth, EdgeBuffer, Error, IntraMode, Kernels, KernelKind, PlaneMut,
    PlaneRef, Settings,
};

#[test]
fn test_kernels_creation() {
    let kernels = Kernels::new(&Settings::default()).expect("Failed to build kernels");
    assert_eq!(kernels.level(), CpuLevel::Native);
    assert!(!kernels.describe().is_empty());
}

#[test]
fn test_kernels_with_custom_settings() {
    let settings = Settings {
        cpu_level: CpuLevel::Scalar,
    };
    let kernels = Kernels::new(&settings).expect("Failed to build kernels");
    assert_eq!(kernels.level(), CpuLevel::Scalar);
    for (key, name) in kernels.describe() {
        assert_eq!(name, "rust", "{key:?}");
    }
}

#[test]
#[cfg(feature = "bitdepth_8")]
fn test_every_size_answers_zero_on_identical_planes() {
    let kernels = Kernels::new(&Settings::default()).unwrap();
    let data: Vec<u8> = (0..64 * 64).map(|i| (i * 7 % 251) as u8).collect();
    for bsize in KernelKind::Sad.sizes() {
        let plane = PlaneRef::contiguous(&data, bsize.width());
        assert_eq!(kernels.sad(Depth::Eight, bsize, plane, plane), 0, "{bsize}");
    }
}

#[test]
#[cfg(feature = "bitdepth_16")]
fn test_sad_at_twelve_bit() {
    let kernels = Kernels::new(&Settings::default()).unwrap();
    let src = vec![4095u16; 32 * 32];
    let reference = vec![0u16; 32 * 32];
    let cost = kernels.sad(
        Depth::Twelve,
        BlockSize::Block32x32,
        PlaneRef::contiguous(&src, 32),
        PlaneRef::contiguous(&reference, 32),
    );
    assert_eq!(cost, 4095 * 32 * 32);
}

#[test]
#[cfg(feature = "bitdepth_8")]
fn test_negative_stride_reference() {
    let kernels = Kernels::new(&Settings::default()).unwrap();
    let src: Vec<u8> = (0..16).collect();
    // Rows stored bottom-up: the last row of `flipped` is row 0 of the block.
    let mut flipped = vec![0u8; 16];
    for y in 0..4 {
        flipped[(3 - y) * 4..(4 - y) * 4].copy_from_slice(&src[y * 4..(y + 1) * 4]);
    }
    let reference = PlaneRef::new(&flipped, 12, -4);
    let cost = kernels.sad(
        Depth::Eight,
        BlockSize::Block4x4,
        PlaneRef::contiguous(&src, 4),
        reference,
    );
    assert_eq!(cost, 0);
}

#[test]
#[cfg(feature = "bitdepth_8")]
#[should_panic(expected = "reference plane (base 4, stride -4, 16 samples) cannot hold a 4x4 block")]
fn test_negative_stride_before_buffer_start_panics() {
    let data = [0u8; 16];
    // Row 1 would start at index 0, row 2 before the buffer.
    let reference = PlaneRef::new(&data, 4, -4);
    vpxdsp_safe::sad(
        Depth::Eight,
        BlockSize::Block4x4,
        PlaneRef::contiguous(&data, 4),
        reference,
    );
}

#[test]
#[cfg(feature = "bitdepth_8")]
#[should_panic(expected = "source plane (base 0, stride 16, 255 samples) cannot hold a 16x16 block")]
fn test_short_source_panics_before_any_kernel_runs() {
    let data = vec![0u8; 16 * 16 - 1];
    let reference = [0u8; 16 * 16];
    vpxdsp_safe::sad(
        Depth::Eight,
        BlockSize::Block16x16,
        PlaneRef::contiguous(&data, 16),
        PlaneRef::contiguous(&reference, 16),
    );
}

#[test]
#[cfg(feature = "bitdepth_8")]
fn test_predict_from_edge_buffer() {
    let kernels = Kernels::new(&Settings::default()).unwrap();
    let above = [100u8; 8];
    let buf = EdgeBuffer::build(Depth::Eight, BlockSize::Block8x8, Some(&above[..]), None, 0).unwrap();
    let mut out = [0u8; 64];
    kernels.predict_intra(
        Depth::Eight,
        BlockSize::Block8x8,
        IntraMode::H,
        PlaneMut::contiguous(&mut out, 8),
        &buf.edge(),
    );
    assert!(out.iter().all(|&v| v == 129));
}

#[test]
fn test_invalid_level_name() {
    let err = "pentium".parse::<CpuLevel>().unwrap_err();
    assert_eq!(err, Error::InvalidCpuLevel("pentium".to_owned()));
}

#[test]
fn test_unsupported_geometry_is_an_error() {
    assert_eq!(
        KernelKind::SadAvg.check(BlockSize::Block4x4),
        Err(Error::UnsupportedGeometry {
            kind: KernelKind::SadAvg,
            bsize: BlockSize::Block4x4,
        })
    );
    assert!(BlockSize::from_dims(12, 12).is_err());
}

#[test]
#[cfg(feature = "bitdepth_8")]
#[should_panic(expected = "has no kernel for")]
fn test_bounded_sad_outside_its_size_set_panics() {
    let data = [0u8; 64 * 64];
    let plane = PlaneRef::contiguous(&data, 64);
    vpxdsp_safe::sad_bounded(Depth::Eight, BlockSize::Block64x64, plane, plane, 0);
}

#[test]
fn test_enabled_features() {
    let features = vpxdsp_safe::enabled_features();
    assert_eq!(features.contains("bitdepth_8"), cfg!(feature = "bitdepth_8"));
    assert_eq!(features.contains("bitdepth_16"), cfg!(feature = "bitdepth_16"));
    assert!(features.contains("safety:"));
}
