// tests/readback_depad.rs
// Float readback validation for textures whose rows need 256-byte padding
// Every texel carries its own (x, y) so a misplaced row or column shows up directly

use geo_ao::gpu::GpuContext;
use geo_ao::renderer::readback::read_rgba32f_tight;

fn create_test_context() -> Option<GpuContext> {
    GpuContext::new_headless("readback-depad-test").ok()
}

fn coordinate_texels(width: u32, height: u32) -> Vec<[f32; 4]> {
    (0..height)
        .flat_map(|y| (0..width).map(move |x| [x as f32, y as f32, (x * y) as f32, -1.0]))
        .collect()
}

fn validate_float_readback(ctx: &GpuContext, width: u32, height: u32) {
    let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("readback-depad-source"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba32Float,
        usage: wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    let texels = coordinate_texels(width, height);
    ctx.queue.write_texture(
        wgpu::ImageCopyTexture {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        bytemuck::cast_slice(&texels),
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(16 * width),
            rows_per_image: Some(height),
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );

    let values = read_rgba32f_tight(&ctx.device, &ctx.queue, &texture, (width, height))
        .expect("Readback failed");

    assert_eq!(
        values.len(),
        (width * height * 4) as usize,
        "Buffer size mismatch at {}x{}",
        width,
        height
    );
    for (i, (got, want)) in values.chunks_exact(4).zip(&texels).enumerate() {
        assert_eq!(got, want, "texel {} differs at {}x{}", i, width, height);
    }
}

#[test]
fn readback_odd_widths_are_depadded() {
    let Some(ctx) = create_test_context() else {
        eprintln!("Skipping readback_odd_widths_are_depadded (no GPU)");
        return;
    };

    for (width, height) in [(1, 1), (3, 5), (17, 4), (64, 64)] {
        validate_float_readback(&ctx, width, height);
    }
}

#[test]
fn readback_rejects_wrong_format() {
    let Some(ctx) = create_test_context() else {
        eprintln!("Skipping readback_rejects_wrong_format (no GPU)");
        return;
    };

    let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("readback-depad-rgba8"),
        size: wgpu::Extent3d {
            width: 4,
            height: 4,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });

    let err = read_rgba32f_tight(&ctx.device, &ctx.queue, &texture, (4, 4)).unwrap_err();
    assert!(err.to_string().contains("format mismatch"));
}
