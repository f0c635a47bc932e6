// src/gpu.rs
// Headless wgpu device/queue/adapter bundle used by every sampler
// A caller may share one context between samplers or let each sampler own its own
// RELEVANT FILES: src/device_caps.rs, src/occlusion/mod.rs, src/renderer/readback.rs

use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::error::{AoError, AoResult};

// One instance and adapter per process, never dropped. On the GLES/EGL backend
// the display connection belongs to them, and tearing one down invalidates
// every device created in the process.
static INSTANCE: OnceCell<wgpu::Instance> = OnceCell::new();
static ADAPTER: OnceCell<wgpu::Adapter> = OnceCell::new();

fn instance() -> &'static wgpu::Instance {
    INSTANCE.get_or_init(|| {
        wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        })
    })
}

/// Process-wide adapter every context requests its device from.
pub fn shared_adapter() -> AoResult<&'static wgpu::Adapter> {
    ADAPTER.get_or_try_init(|| {
        pollster::block_on(instance().request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| AoError::device("no suitable GPU adapter"))
    })
}

/// A device and queue. Dropping or destroying one leaves the process-wide
/// adapter, and every other context, usable.
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub adapter: &'static wgpu::Adapter,
}

impl GpuContext {
    /// Request a headless device with the limits the sampler needs.
    pub fn new_headless(label: &str) -> AoResult<Self> {
        let adapter = shared_adapter()?;

        // Take whatever 2D texture size the adapter offers; texRes grows with vertex count.
        let limits = wgpu::Limits {
            max_texture_dimension_2d: adapter.limits().max_texture_dimension_2d,
            ..wgpu::Limits::downlevel_defaults()
        };

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                required_features: wgpu::Features::empty(),
                required_limits: limits,
                label: Some(label),
            },
            None,
        ))
        .map_err(|e| AoError::device(format!("request_device failed: {e}")))?;

        let info = adapter.get_info();
        log::info!(
            "created GPU context '{}' on {} ({:?})",
            label,
            info.name,
            info.backend
        );

        Ok(Self {
            device,
            queue,
            adapter,
        })
    }

    /// Convenience wrapper for callers that want to share the context.
    pub fn shared(label: &str) -> AoResult<Arc<Self>> {
        Self::new_headless(label).map(Arc::new)
    }
}

/// Align to WebGPU's required bytes-per-row for copies.
#[inline]
pub fn align_copy_bpr(unpadded: u32) -> u32 {
    let a = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    ((unpadded + a - 1) / a) * a
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_rows_align_to_256() {
        assert_eq!(align_copy_bpr(1), 256);
        assert_eq!(align_copy_bpr(256), 256);
        assert_eq!(align_copy_bpr(257), 512);
        // one Rgba32Float row of a 16-texel vertex texture
        assert_eq!(align_copy_bpr(16 * 16), 256);
    }
}
