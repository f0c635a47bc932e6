//! Monte Carlo per-vertex ambient occlusion on the GPU.
//!
//! Each trial rotates the normalized mesh by a random orientation, captures
//! the nearest surface seen along the view axis into a float target, and then
//! tests every vertex against that capture. A vertex that lies behind the
//! captured surface (beyond the tolerance) counts as occluded for the trial.
//! Totals live in a pair of float textures that alternate as source and
//! destination, one texel per vertex.
//!
//! ```no_run
//! use geo_ao::{AmbientOcclusionSampler, AoConfig, AoOptions};
//! # fn main() -> geo_ao::AoResult<()> {
//! let positions = vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
//! let mut sampler = AmbientOcclusionSampler::new(
//!     &positions,
//!     AoOptions::new(AoConfig::default().with_resolution(128)),
//! )?;
//! sampler.sample(256);
//! let occlusion = sampler.report()?;
//! assert_eq!(occlusion.len(), 3);
//! sampler.dispose();
//! # Ok(())
//! # }
//! ```

pub mod accumulate;
pub mod capture;
pub mod config;
pub mod encode;
pub mod params;
pub mod report;
pub mod rotation;

use std::sync::Arc;

use crate::core::resource_tracker::{ResourceMetrics, ResourceRegistry, TrackedBuffer, TrackedTexture};
use crate::device_caps::{check_requirements, DeviceCaps, MeshRequirements, FLOAT_TARGET_FORMAT};
use crate::error::{AoError, AoResult};
use crate::geometry::{normalize_to_reference_volume, NormalizedMesh};
use crate::gpu::GpuContext;
use crate::renderer::readback::read_rgba32f_tight;

use accumulate::{AccumulationInputs, AccumulationPass};
use capture::DepthCapturePass;
pub use config::{AccumulationPolicy, AoConfig, AoOptions};
use params::SampleUniforms;
pub use rotation::{rotation_matrix, FixedAngles, RotationSource, UniformEulerAngles};

/// Rendering context a sampler runs on.
pub enum ContextHandle {
    /// Created by the sampler; the device is destroyed on dispose.
    ///
    /// Only the device goes away. The instance and adapter are process-wide
    /// (see [`crate::gpu::shared_adapter`]), because on the GLES/EGL backend
    /// dropping them would take every other live context down with them.
    Owned(GpuContext),
    /// Supplied by the caller and left alive on dispose
    Shared(Arc<GpuContext>),
}

impl ContextHandle {
    pub fn get(&self) -> &GpuContext {
        match self {
            ContextHandle::Owned(ctx) => ctx,
            ContextHandle::Shared(ctx) => ctx,
        }
    }

    pub fn is_owned(&self) -> bool {
        matches!(self, ContextHandle::Owned(_))
    }
}

/// Introspection snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerStats {
    pub vertex_count: usize,
    pub texture_resolution: u32,
    pub depth_resolution: u32,
    pub sample_count: u64,
    pub policy: AccumulationPolicy,
    pub index_format: Option<wgpu::IndexFormat>,
    pub owned_context: bool,
    pub resources: ResourceMetrics,
}

pub struct AmbientOcclusionSampler {
    context: ContextHandle,
    registry: Arc<ResourceRegistry>,
    config: AoConfig,
    mesh: NormalizedMesh,
    texture_resolution: u32,
    vertex_texture: TrackedTexture,
    normal_texture: TrackedTexture,
    uniforms: TrackedBuffer,
    capture: DepthCapturePass,
    accumulation: AccumulationPass,
    rotations: Box<dyn RotationSource>,
    sample_count: u64,
}

impl AmbientOcclusionSampler {
    /// Build a sampler for `positions` (flat `x, y, z` triples).
    ///
    /// Input and configuration are validated before any GPU work, and the
    /// device is checked for every capability this mesh needs, so a failed
    /// construction never leaves half-built state behind.
    pub fn new(positions: &[f32], options: AoOptions) -> AoResult<Self> {
        let AoOptions {
            config,
            cells,
            context,
            registry,
            rotations,
        } = options;

        config.validate()?;
        let points = parse_positions(positions)?;
        let vertex_count = points.len();
        if let Some(cells) = &cells {
            validate_cells(cells, vertex_count)?;
            if cells.is_empty() {
                log::warn!("mesh has {} vertices but no cells; nothing will occlude", vertex_count);
            }
        }

        let mesh = normalize_to_reference_volume(&points).ok_or(AoError::EmptyMesh)?;
        let texture_resolution = encode::texture_resolution(vertex_count);

        let context = match context {
            Some(shared) => ContextHandle::Shared(shared),
            None => ContextHandle::Owned(GpuContext::new_headless("geo-ao")?),
        };
        let registry = registry.unwrap_or_default();

        let caps = DeviceCaps::from_context(context.get());
        check_requirements(
            &caps,
            &MeshRequirements {
                vertex_count,
                indexed: cells.is_some(),
                texture_resolution,
                depth_resolution: config.resolution,
            },
        )?;

        let ctx = context.get();
        let device = &ctx.device;

        let vertex_texture = upload_attribute_texture(
            ctx,
            &registry,
            "geo-ao.vertices",
            &mesh.positions,
            texture_resolution,
        );
        let normal_texture = if config.policy.uses_normals() {
            let normals =
                encode::topology_normals(&mesh.positions, cells.as_deref(), config.weld_epsilon);
            let orphans = normals.iter().filter(|n| **n == [0.0; 3]).count();
            if orphans > 0 {
                log::warn!(
                    "{} vertices have no incident triangle and will report zero occlusion",
                    orphans
                );
            }
            upload_attribute_texture(ctx, &registry, "geo-ao.normals", &normals, texture_resolution)
        } else {
            // never read in unweighted mode, but the binding must exist
            upload_attribute_texture(ctx, &registry, "geo-ao.normals.unused", &[], 1)
        };

        let uniforms = TrackedBuffer::track(
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("geo-ao.sample-uniforms"),
                size: std::mem::size_of::<SampleUniforms>() as wgpu::BufferAddress,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }),
            &registry,
        );

        let capture = DepthCapturePass::new(
            device,
            &registry,
            &uniforms.buffer,
            &mesh.positions,
            cells.as_deref(),
            config.resolution,
        );
        let accumulation = AccumulationPass::new(
            device,
            &registry,
            AccumulationInputs {
                uniforms: &uniforms.buffer,
                vertices: &vertex_texture.view,
                normals: &normal_texture.view,
                surface: &capture.target.view,
            },
            texture_resolution,
        );

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("geo-ao.init"),
        });
        accumulation.encode_clear(&mut encoder);
        ctx.queue.submit(Some(encoder.finish()));

        let rotations = rotations.unwrap_or_else(|| {
            Box::new(UniformEulerAngles::new(config.seed)) as Box<dyn RotationSource>
        });

        log::info!(
            "ambient occlusion sampler: {} vertices, {}x{} vertex texture, {}x{} capture, {:?}, {} context",
            vertex_count,
            texture_resolution,
            texture_resolution,
            config.resolution,
            config.resolution,
            config.policy,
            if context.is_owned() { "owned" } else { "shared" }
        );

        Ok(Self {
            context,
            registry,
            config,
            mesh,
            texture_resolution,
            vertex_texture,
            normal_texture,
            uniforms,
            capture,
            accumulation,
            rotations,
            sample_count: 0,
        })
    }

    /// Run `n` more trials. Totals keep accumulating across calls, so several
    /// small batches are equivalent to one large one.
    pub fn sample(&mut self, n: u32) {
        if n == 0 {
            return;
        }
        for _ in 0..n {
            self.run_trial();
        }
        self.sample_count += u64::from(n);
        self.context.get().device.poll(wgpu::Maintain::Poll);
        log::debug!("sampled {} trials ({} total)", n, self.sample_count);
    }

    fn run_trial(&mut self) {
        let model = rotation_matrix(self.rotations.next_angles());
        let uniforms = SampleUniforms::new(model, &self.config);

        let ctx = self.context.get();
        ctx.queue
            .write_buffer(&self.uniforms.buffer, 0, bytemuck::bytes_of(&uniforms));

        let mut encoder = ctx.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("geo-ao.trial"),
        });
        self.capture.encode(&mut encoder);
        self.accumulation.encode(&mut encoder);
        ctx.queue.submit(Some(encoder.finish()));

        self.accumulation.swap();
    }

    /// Per-vertex occlusion in [0, 1], in input vertex order. Reading does not
    /// disturb the totals; calling twice without sampling yields equal output.
    pub fn report(&self) -> AoResult<Vec<f32>> {
        let ctx = self.context.get();
        let texels = read_rgba32f_tight(
            &ctx.device,
            &ctx.queue,
            &self.accumulation.current().texture,
            (self.texture_resolution, self.texture_resolution),
        )
        .map_err(AoError::readback)?;
        log::debug!("report after {} trials", self.sample_count);

        Ok(report::occlusion_from_texels(
            &texels,
            self.vertex_count(),
            self.sample_count,
            self.config.policy,
        ))
    }

    /// Release every GPU resource this sampler created. An owned context is
    /// destroyed too; a shared one stays usable by its other holders.
    pub fn dispose(self) {
        log::info!(
            "disposing ambient occlusion sampler after {} trials",
            self.sample_count
        );
        drop(self);
    }

    pub fn sample_count(&self) -> u64 {
        self.sample_count
    }

    pub fn vertex_count(&self) -> usize {
        self.mesh.positions.len()
    }

    pub fn texture_resolution(&self) -> u32 {
        self.texture_resolution
    }

    pub fn config(&self) -> &AoConfig {
        &self.config
    }

    /// Centered and scaled positions the GPU works on.
    pub fn normalized_positions(&self) -> &[[f32; 3]] {
        &self.mesh.positions
    }

    pub fn normalized_mesh(&self) -> &NormalizedMesh {
        &self.mesh
    }

    pub fn registry(&self) -> &Arc<ResourceRegistry> {
        &self.registry
    }

    pub fn stats(&self) -> SamplerStats {
        SamplerStats {
            vertex_count: self.vertex_count(),
            texture_resolution: self.texture_resolution,
            depth_resolution: self.config.resolution,
            sample_count: self.sample_count,
            policy: self.config.policy,
            index_format: self.capture.index_format(),
            owned_context: self.context.is_owned(),
            resources: self.registry.get_metrics(),
        }
    }
}

impl Drop for AmbientOcclusionSampler {
    fn drop(&mut self) {
        self.capture.release(&self.registry);
        self.accumulation.release(&self.registry);
        self.vertex_texture.release(&self.registry);
        self.normal_texture.release(&self.registry);
        self.uniforms.release(&self.registry);
        if let ContextHandle::Owned(ctx) = &self.context {
            ctx.device.destroy();
        }
        log::debug!(
            "released sampler resources, {} allocations still tracked by registry",
            self.registry.get_metrics().live_count()
        );
    }
}

fn parse_positions(positions: &[f32]) -> AoResult<Vec<[f32; 3]>> {
    if positions.len() % 3 != 0 {
        return Err(AoError::InvalidPositions {
            len: positions.len(),
        });
    }
    if positions.is_empty() {
        return Err(AoError::EmptyMesh);
    }
    positions
        .chunks_exact(3)
        .enumerate()
        .map(|(vertex, p)| {
            if p.iter().all(|c| c.is_finite()) {
                Ok([p[0], p[1], p[2]])
            } else {
                Err(AoError::NonFinitePosition { vertex })
            }
        })
        .collect()
}

fn validate_cells(cells: &[[u32; 3]], vertex_count: usize) -> AoResult<()> {
    for (cell, triple) in cells.iter().enumerate() {
        if let Some(&index) = triple.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(AoError::InvalidCell {
                cell,
                index,
                vertex_count,
            });
        }
    }
    Ok(())
}

fn upload_attribute_texture(
    ctx: &GpuContext,
    registry: &ResourceRegistry,
    label: &str,
    values: &[[f32; 3]],
    resolution: u32,
) -> TrackedTexture {
    let texture = TrackedTexture::create(
        &ctx.device,
        registry,
        label,
        resolution,
        FLOAT_TARGET_FORMAT,
        wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
    );
    let texels = encode::pack_texels(values, resolution);
    ctx.queue.write_texture(
        wgpu::ImageCopyTexture {
            texture: &texture.texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        bytemuck::cast_slice(&texels),
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(16 * resolution),
            rows_per_image: Some(resolution),
        },
        wgpu::Extent3d {
            width: resolution,
            height: resolution,
            depth_or_array_layers: 1,
        },
    );
    texture
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_must_be_whole_triples() {
        assert!(matches!(
            parse_positions(&[0.0; 10]),
            Err(AoError::InvalidPositions { len: 10 })
        ));
        assert!(matches!(parse_positions(&[]), Err(AoError::EmptyMesh)));
        assert_eq!(parse_positions(&[1.0, 2.0, 3.0]).unwrap(), vec![[1.0, 2.0, 3.0]]);
    }

    #[test]
    fn non_finite_positions_are_rejected() {
        let err = parse_positions(&[0.0, 0.0, 0.0, 1.0, f32::NAN, 0.0]).unwrap_err();
        assert!(matches!(err, AoError::NonFinitePosition { vertex: 1 }));
    }

    #[test]
    fn cells_must_reference_existing_vertices() {
        assert!(validate_cells(&[[0, 1, 2]], 3).is_ok());
        let err = validate_cells(&[[0, 1, 2], [2, 3, 1]], 3).unwrap_err();
        assert!(matches!(
            err,
            AoError::InvalidCell {
                cell: 1,
                index: 3,
                vertex_count: 3
            }
        ));
    }
}
