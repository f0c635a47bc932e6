// src/occlusion/config.rs
// Sampler configuration with serde loading and eager validation
// RELEVANT FILES: src/occlusion/mod.rs, src/cli/mod.rs, src/python.rs

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::rotation::RotationSource;
use crate::core::resource_tracker::ResourceRegistry;
use crate::error::{AoError, AoResult};
use crate::gpu::GpuContext;

/// How a single trial contributes to a vertex's running totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccumulationPolicy {
    /// Every trial counts; occlusion = hits / sample_count.
    Unweighted,
    /// Trials where the rotated normal faces away from the capture direction
    /// are skipped; occlusion = hits / valid trials.
    #[default]
    NormalGated,
}

impl AccumulationPolicy {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "unweighted" | "plain" => Some(Self::Unweighted),
            "normal" | "normal_gated" | "normal-gated" => Some(Self::NormalGated),
            _ => None,
        }
    }

    pub fn uses_normals(self) -> bool {
        matches!(self, Self::NormalGated)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AoConfig {
    /// Side of the square depth capture target in texels
    pub resolution: u32,
    /// Constant depth tolerance against self-occlusion
    pub bias: f32,
    pub policy: AccumulationPolicy,
    /// Multiplier on the captured per-pixel depth slope added to `bias`.
    /// Zero (the default) keeps the plain constant-bias comparison.
    pub slope_scale: f32,
    /// Upper bound on the slope-scaled term
    pub slope_clamp: f32,
    /// Seed for the default rotation source; `None` draws from OS entropy
    pub seed: Option<u64>,
    /// Position tolerance when welding an unindexed stream to build normals
    pub weld_epsilon: f32,
}

impl Default for AoConfig {
    fn default() -> Self {
        Self {
            resolution: 512,
            bias: 0.01,
            policy: AccumulationPolicy::NormalGated,
            slope_scale: 0.0,
            slope_clamp: 0.25,
            seed: None,
            weld_epsilon: 1e-5,
        }
    }
}

impl AoConfig {
    pub fn validate(&self) -> AoResult<()> {
        if self.resolution == 0 {
            return Err(AoError::config("resolution must be at least 1"));
        }
        if !self.bias.is_finite() || self.bias < 0.0 {
            return Err(AoError::config(format!(
                "bias must be finite and non-negative, got {}",
                self.bias
            )));
        }
        if !self.slope_scale.is_finite() || self.slope_scale < 0.0 {
            return Err(AoError::config(format!(
                "slope_scale must be finite and non-negative, got {}",
                self.slope_scale
            )));
        }
        if !(self.slope_clamp >= 0.0) {
            return Err(AoError::config(format!(
                "slope_clamp must be non-negative, got {}",
                self.slope_clamp
            )));
        }
        if !self.weld_epsilon.is_finite() || self.weld_epsilon <= 0.0 {
            return Err(AoError::config(format!(
                "weld_epsilon must be positive, got {}",
                self.weld_epsilon
            )));
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> AoResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> AoResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn with_resolution(mut self, resolution: u32) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_bias(mut self, bias: f32) -> Self {
        self.bias = bias;
        self
    }

    pub fn with_policy(mut self, policy: AccumulationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Widen the tolerance by `scale` times the captured depth slope, capped at `clamp`.
    pub fn with_slope_bias(mut self, scale: f32, clamp: f32) -> Self {
        self.slope_scale = scale;
        self.slope_clamp = clamp;
        self
    }
}

/// Everything a sampler can be constructed with besides the positions.
#[derive(Default)]
pub struct AoOptions {
    pub config: AoConfig,
    /// Triangles as vertex index triples; `None` reads positions as a triangle stream
    pub cells: Option<Vec<[u32; 3]>>,
    /// Shared rendering context; `None` makes the sampler create and own one
    pub context: Option<Arc<GpuContext>>,
    /// Allocation registry; `None` gives the sampler a private one
    pub registry: Option<Arc<ResourceRegistry>>,
    /// Orientation source; `None` uses uniform Euler angles seeded from `config.seed`
    pub rotations: Option<Box<dyn RotationSource>>,
}

impl AoOptions {
    pub fn new(config: AoConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn with_cells(mut self, cells: Vec<[u32; 3]>) -> Self {
        self.cells = Some(cells);
        self
    }

    pub fn with_context(mut self, context: Arc<GpuContext>) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_registry(mut self, registry: Arc<ResourceRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn with_rotations(mut self, rotations: Box<dyn RotationSource>) -> Self {
        self.rotations = Some(rotations);
        self
    }
}
