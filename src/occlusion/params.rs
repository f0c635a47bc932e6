// src/occlusion/params.rs
// Per-trial uniform block shared by the capture and accumulation shaders
// RELEVANT FILES: src/shaders/ao_capture.wgsl, src/shaders/ao_accumulate.wgsl, src/occlusion/mod.rs

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use super::config::AoConfig;
use crate::geometry::REFERENCE_HALF_EXTENT;

/// Extra depth range beyond the reference cube so faces exactly on the
/// boundary are never clipped by the near/far planes.
pub const DEPTH_MARGIN: f32 = 0.05;

/// Matches `SampleUniforms` in both WGSL files (std140-compatible, 160 bytes).
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct SampleUniforms {
    pub model: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub bias: f32,
    pub slope_scale: f32,
    pub slope_clamp: f32,
    pub half_extent: f32,
    pub depth_resolution: u32,
    pub normal_gated: u32,
    pub _pad: [u32; 2],
}

impl SampleUniforms {
    pub fn new(model: Mat4, config: &AoConfig) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            projection: capture_projection(REFERENCE_HALF_EXTENT).to_cols_array_2d(),
            bias: config.bias,
            slope_scale: config.slope_scale,
            slope_clamp: config.slope_clamp,
            half_extent: REFERENCE_HALF_EXTENT,
            depth_resolution: config.resolution,
            normal_gated: config.policy.uses_normals() as u32,
            _pad: [0; 2],
        }
    }
}

/// Orthographic view of the `[-h, h]^3` cube looking down -Z: larger z is
/// nearer, x/y map exactly onto the capture target.
pub fn capture_projection(half_extent: f32) -> Mat4 {
    let depth = half_extent * (1.0 + DEPTH_MARGIN);
    Mat4::orthographic_rh(
        -half_extent,
        half_extent,
        -half_extent,
        half_extent,
        -depth,
        depth,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::occlusion::config::AccumulationPolicy;
    use glam::Vec3;

    #[test]
    fn uniform_block_layout() {
        assert_eq!(std::mem::size_of::<SampleUniforms>(), 160);
        assert_eq!(std::mem::size_of::<SampleUniforms>() % 16, 0);
    }

    #[test]
    fn projection_keeps_cube_in_clip_space() {
        let h = REFERENCE_HALF_EXTENT;
        let proj = capture_projection(h);

        let near = proj.project_point3(Vec3::new(h, h, h));
        let far = proj.project_point3(Vec3::new(-h, -h, -h));
        assert!((near.x - 1.0).abs() < 1e-5 && (near.y - 1.0).abs() < 1e-5);
        assert!((far.x + 1.0).abs() < 1e-5 && (far.y + 1.0).abs() < 1e-5);
        assert!(near.z > 0.0 && near.z < far.z && far.z < 1.0);
    }

    #[test]
    fn policy_flag_reaches_the_shader() {
        let config = AoConfig::default().with_policy(AccumulationPolicy::Unweighted);
        assert_eq!(SampleUniforms::new(Mat4::IDENTITY, &config).normal_gated, 0);
        let config = AoConfig::default();
        let uniforms = SampleUniforms::new(Mat4::IDENTITY, &config);
        assert_eq!(uniforms.normal_gated, 1);
        assert_eq!(uniforms.depth_resolution, 512);
    }

    #[test]
    fn constant_bias_by_default() {
        let uniforms = SampleUniforms::new(Mat4::IDENTITY, &AoConfig::default());
        assert_eq!(uniforms.slope_scale, 0.0);
        assert_eq!(uniforms.bias, 0.01);

        let config = AoConfig::default().with_slope_bias(1.5, 0.2);
        let uniforms = SampleUniforms::new(Mat4::IDENTITY, &config);
        assert_eq!((uniforms.slope_scale, uniforms.slope_clamp), (1.5, 0.2));
    }
}
