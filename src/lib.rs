//! GPU Monte Carlo ambient occlusion for triangle meshes.
//! Rust: wgpu 0.19, PyO3 0.21 (abi3) behind the `extension-module` feature.
//!
//! The crate estimates, for every vertex, the fraction of random viewing
//! directions from which the rest of the mesh hides it. Work is progressive:
//! call [`AmbientOcclusionSampler::sample`] as often as needed and read the
//! current estimate with [`AmbientOcclusionSampler::report`].

pub mod cli;
pub mod core;
pub mod device_caps;
pub mod error;
pub mod geometry;
pub mod gpu;
pub mod occlusion;
pub mod renderer;

#[cfg(feature = "extension-module")]
pub mod python;

pub use crate::core::resource_tracker::{ResourceMetrics, ResourceRegistry};
pub use device_caps::DeviceCaps;
pub use error::{AoError, AoResult};
pub use gpu::GpuContext;
pub use occlusion::{
    AccumulationPolicy, AmbientOcclusionSampler, AoConfig, AoOptions, FixedAngles,
    RotationSource, SamplerStats, UniformEulerAngles,
};

#[cfg(feature = "extension-module")]
use pyo3::prelude::*;

#[cfg(feature = "extension-module")]
#[pymodule]
fn geo_ao(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<python::PyAmbientOcclusion>()?;
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    Ok(())
}
