//! Device capabilities and construction-time capability checks
//!
//! Provides structured access to the parts of the GPU device the sampler
//! depends on, and the eager check that fails construction when one of them
//! is missing.

use crate::error::{AoError, AoResult};
use crate::gpu::GpuContext;

/// Texel format shared by the vertex/normal textures, the depth capture target
/// and both accumulation targets.
pub const FLOAT_TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;

/// Above this many vertices indexed drawing needs 32-bit indices.
pub const MAX_U16_INDEXED_VERTICES: usize = 65535;

/// Device capabilities structure
#[derive(Debug, Clone)]
pub struct DeviceCaps {
    /// Backend identifier (vulkan, dx12, metal, gl)
    pub backend: String,

    /// Adapter name from driver
    pub adapter_name: String,

    /// Device type (integrated, discrete, virtual, cpu, other)
    pub device_type: String,

    /// Maximum 2D texture dimension of the device (not the adapter)
    pub max_texture_dimension_2d: u32,

    /// Rgba32Float can be rendered to, sampled and copied out
    pub float_render_targets: bool,

    /// Full 32-bit index range in indexed draws
    pub full_uint32_indices: bool,
}

impl DeviceCaps {
    pub fn from_context(ctx: &GpuContext) -> Self {
        let adapter_info = ctx.adapter.get_info();
        let device_limits = ctx.device.limits();

        let required = wgpu::TextureUsages::RENDER_ATTACHMENT
            | wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_SRC;
        let float_render_targets = ctx
            .adapter
            .get_texture_format_features(FLOAT_TARGET_FORMAT)
            .allowed_usages
            .contains(required);

        let full_uint32_indices = ctx
            .adapter
            .get_downlevel_capabilities()
            .flags
            .contains(wgpu::DownlevelFlags::FULL_DRAW_INDEX_UINT32);

        DeviceCaps {
            backend: format!("{:?}", adapter_info.backend).to_lowercase(),
            adapter_name: adapter_info.name.clone(),
            device_type: format!("{:?}", adapter_info.device_type).to_lowercase(),
            max_texture_dimension_2d: device_limits.max_texture_dimension_2d,
            float_render_targets,
            full_uint32_indices,
        }
    }
}

/// What a particular mesh/config combination asks of the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshRequirements {
    pub vertex_count: usize,
    pub indexed: bool,
    pub texture_resolution: u32,
    pub depth_resolution: u32,
}

impl MeshRequirements {
    pub fn needs_wide_indices(&self) -> bool {
        self.indexed && self.vertex_count > MAX_U16_INDEXED_VERTICES
    }
}

/// Fail fast, naming the first capability the device lacks.
pub fn check_requirements(caps: &DeviceCaps, req: &MeshRequirements) -> AoResult<()> {
    if !caps.float_render_targets {
        return Err(AoError::MissingCapability {
            capability: "floating-point render target",
            reason: format!("{:?} must be renderable, sampleable and copyable", FLOAT_TARGET_FORMAT),
        });
    }

    if req.needs_wide_indices() && !caps.full_uint32_indices {
        return Err(AoError::MissingCapability {
            capability: "32-bit index",
            reason: format!("indexed mesh has {} vertices", req.vertex_count),
        });
    }

    let largest = req.texture_resolution.max(req.depth_resolution);
    if largest > caps.max_texture_dimension_2d {
        return Err(AoError::MissingCapability {
            capability: "texture dimension",
            reason: format!(
                "needs {}x{} but the device allows {}",
                largest, largest, caps.max_texture_dimension_2d
            ),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps() -> DeviceCaps {
        DeviceCaps {
            backend: "vulkan".into(),
            adapter_name: "test".into(),
            device_type: "discretegpu".into(),
            max_texture_dimension_2d: 2048,
            float_render_targets: true,
            full_uint32_indices: true,
        }
    }

    fn req(vertex_count: usize, indexed: bool) -> MeshRequirements {
        MeshRequirements {
            vertex_count,
            indexed,
            texture_resolution: 512,
            depth_resolution: 512,
        }
    }

    #[test]
    fn accepts_capable_device() {
        assert!(check_requirements(&caps(), &req(100_000, true)).is_ok());
    }

    #[test]
    fn float_targets_are_always_required() {
        let mut c = caps();
        c.float_render_targets = false;
        let err = check_requirements(&c, &req(3, false)).unwrap_err();
        assert!(err.to_string().contains("floating-point render target"));
    }

    #[test]
    fn wide_indices_only_matter_for_large_indexed_meshes() {
        let mut c = caps();
        c.full_uint32_indices = false;
        assert!(check_requirements(&c, &req(65535, true)).is_ok());
        assert!(check_requirements(&c, &req(70_000, false)).is_ok());
        let err = check_requirements(&c, &req(70_000, true)).unwrap_err();
        assert!(err.to_string().contains("32-bit index"));
    }

    #[test]
    fn oversized_targets_are_rejected() {
        let mut r = req(3, false);
        r.depth_resolution = 4096;
        let err = check_requirements(&caps(), &r).unwrap_err();
        assert!(matches!(
            err,
            AoError::MissingCapability {
                capability: "texture dimension",
                ..
            }
        ));
    }
}
