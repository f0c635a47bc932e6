//! Allocation accounting for sampler-owned GPU resources.
//!
//! Every texture and buffer a sampler creates is recorded here and handed back
//! to the registry when the sampler is disposed. Counters are atomics so a
//! registry can be shared between samplers living on different threads.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use wgpu::TextureFormat;

/// Snapshot of tracked allocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResourceMetrics {
    pub buffer_count: usize,
    pub texture_count: usize,
    pub buffer_bytes: u64,
    pub texture_bytes: u64,
    /// Total number of release calls ever made
    pub releases: u64,
}

impl ResourceMetrics {
    pub fn total_bytes(&self) -> u64 {
        self.buffer_bytes + self.texture_bytes
    }

    pub fn live_count(&self) -> usize {
        self.buffer_count + self.texture_count
    }
}

#[derive(Debug, Default)]
pub struct ResourceRegistry {
    buffer_count: AtomicUsize,
    texture_count: AtomicUsize,
    buffer_bytes: AtomicU64,
    texture_bytes: AtomicU64,
    releases: AtomicU64,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track_buffer_allocation(&self, size: u64) {
        self.buffer_count.fetch_add(1, Ordering::Relaxed);
        self.buffer_bytes.fetch_add(size, Ordering::Relaxed);
    }

    pub fn free_buffer_allocation(&self, size: u64) {
        self.buffer_count.fetch_sub(1, Ordering::Relaxed);
        self.buffer_bytes.fetch_sub(size, Ordering::Relaxed);
        self.releases.fetch_add(1, Ordering::Relaxed);
    }

    pub fn track_texture_allocation(&self, width: u32, height: u32, format: TextureFormat) {
        let size = texture_bytes(width, height, format);
        self.texture_count.fetch_add(1, Ordering::Relaxed);
        self.texture_bytes.fetch_add(size, Ordering::Relaxed);
    }

    pub fn free_texture_allocation(&self, width: u32, height: u32, format: TextureFormat) {
        let size = texture_bytes(width, height, format);
        self.texture_count.fetch_sub(1, Ordering::Relaxed);
        self.texture_bytes.fetch_sub(size, Ordering::Relaxed);
        self.releases.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_metrics(&self) -> ResourceMetrics {
        ResourceMetrics {
            buffer_count: self.buffer_count.load(Ordering::Relaxed),
            texture_count: self.texture_count.load(Ordering::Relaxed),
            buffer_bytes: self.buffer_bytes.load(Ordering::Relaxed),
            texture_bytes: self.texture_bytes.load(Ordering::Relaxed),
            releases: self.releases.load(Ordering::Relaxed),
        }
    }
}

/// Bytes per texel for the formats the sampler allocates.
pub fn texture_format_bytes_per_pixel(format: TextureFormat) -> u32 {
    match format {
        TextureFormat::Rgba32Float => 16,
        TextureFormat::Rgba16Float => 8,
        TextureFormat::Depth32Float | TextureFormat::R32Float => 4,
        TextureFormat::Rgba8Unorm | TextureFormat::Rgba8UnormSrgb => 4,
        _ => 4,
    }
}

fn texture_bytes(width: u32, height: u32, format: TextureFormat) -> u64 {
    width as u64 * height as u64 * texture_format_bytes_per_pixel(format) as u64
}

/// A tracked texture together with what the registry needs to free it.
pub struct TrackedTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

impl TrackedTexture {
    pub fn create(
        device: &wgpu::Device,
        registry: &ResourceRegistry,
        label: &str,
        size: u32,
        format: TextureFormat,
        usage: wgpu::TextureUsages,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        registry.track_texture_allocation(size, size, format);
        Self {
            texture,
            view,
            width: size,
            height: size,
            format,
        }
    }

    pub fn release(&self, registry: &ResourceRegistry) {
        self.texture.destroy();
        registry.free_texture_allocation(self.width, self.height, self.format);
    }
}

/// A tracked buffer.
pub struct TrackedBuffer {
    pub buffer: wgpu::Buffer,
}

impl TrackedBuffer {
    pub fn track(buffer: wgpu::Buffer, registry: &ResourceRegistry) -> Self {
        registry.track_buffer_allocation(buffer.size());
        Self { buffer }
    }

    pub fn release(&self, registry: &ResourceRegistry) {
        let size = self.buffer.size();
        self.buffer.destroy();
        registry.free_buffer_allocation(size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texture_accounting_balances() {
        let registry = ResourceRegistry::new();
        registry.track_texture_allocation(512, 512, TextureFormat::Rgba32Float);
        registry.track_texture_allocation(512, 512, TextureFormat::Depth32Float);

        let metrics = registry.get_metrics();
        assert_eq!(metrics.texture_count, 2);
        assert_eq!(metrics.texture_bytes, 512 * 512 * 16 + 512 * 512 * 4);

        registry.free_texture_allocation(512, 512, TextureFormat::Rgba32Float);
        registry.free_texture_allocation(512, 512, TextureFormat::Depth32Float);
        let metrics = registry.get_metrics();
        assert_eq!(metrics.live_count(), 0);
        assert_eq!(metrics.total_bytes(), 0);
        assert_eq!(metrics.releases, 2);
    }

    #[test]
    fn buffer_accounting_balances() {
        let registry = ResourceRegistry::new();
        registry.track_buffer_allocation(160);
        assert_eq!(registry.get_metrics().buffer_bytes, 160);
        registry.free_buffer_allocation(160);
        let metrics = registry.get_metrics();
        assert_eq!(metrics.buffer_count, 0);
        assert_eq!(metrics.releases, 1);
    }
}
