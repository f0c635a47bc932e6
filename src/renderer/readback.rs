// src/renderer/readback.rs
// Rgba32Float texture readback helper yielding tight CPU buffers
// Exists to guarantee consistent depadded downloads of accumulation targets
// RELEVANT FILES: src/occlusion/mod.rs, src/occlusion/report.rs, src/gpu.rs

use anyhow::{anyhow, ensure, Result};
use futures_intrusive::channel::shared::oneshot_channel;

use crate::gpu::align_copy_bpr;

/// Copy a single-sample Rgba32Float texture into a tight `width * height * 4`
/// float vector, row-major from the top row.
pub fn read_rgba32f_tight(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    src: &wgpu::Texture,
    size: (u32, u32),
) -> Result<Vec<f32>> {
    let (width, height) = size;

    ensure!(width > 0 && height > 0, "readback size must be positive");
    ensure!(
        src.sample_count() == 1,
        "readback requires single-sample texture (sample_count=1), got {}",
        src.sample_count()
    );
    ensure!(
        src.format() == wgpu::TextureFormat::Rgba32Float,
        "texture format mismatch: texture={:?}, expected Rgba32Float",
        src.format()
    );

    // Rgba32Float: four little-endian f32 per texel
    let tight_bpr = 16 * width as usize;
    ensure!(
        tight_bpr <= u32::MAX as usize,
        "bytes per row exceeds u32::MAX"
    );
    let padded_bpr = align_copy_bpr(tight_bpr as u32) as usize;
    let buffer_size = (padded_bpr * height as usize) as wgpu::BufferAddress;

    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("geo-ao-readback-staging"),
        size: buffer_size,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("geo-ao-readback-encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::ImageCopyTexture {
            texture: src,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::ImageCopyBuffer {
            buffer: &staging,
            layout: wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(padded_bpr as u32),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );

    queue.submit(std::iter::once(encoder.finish()));

    let slice = staging.slice(..);
    let (sender, receiver) = oneshot_channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = sender.send(result);
    });
    device.poll(wgpu::Maintain::Wait);

    pollster::block_on(receiver.receive())
        .ok_or_else(|| anyhow!("map_async callback channel dropped"))??;

    let data = slice.get_mapped_range();
    let mut tight = Vec::with_capacity(width as usize * height as usize * 4);

    for row in data.chunks_exact(padded_bpr) {
        tight.extend(
            row[..tight_bpr]
                .chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]])),
        );
    }
    drop(data);
    staging.unmap();
    staging.destroy();

    Ok(tight)
}
