//! Central error handling for the occlusion sampler
//!
//! Provides a unified AoError enum with consistent categorization
//! and conversion to Python exceptions via PyO3.

#[cfg(feature = "extension-module")]
use pyo3::exceptions::PyRuntimeError;
#[cfg(feature = "extension-module")]
use pyo3::prelude::*;

/// Centralized error type for all sampler operations
#[derive(thiserror::Error, Debug)]
pub enum AoError {
    #[error("position array not divisible by three (length {len})")]
    InvalidPositions { len: usize },

    #[error("mesh has no vertices")]
    EmptyMesh,

    #[error("vertex {vertex} has a non-finite coordinate")]
    NonFinitePosition { vertex: usize },

    #[error("cell {cell} references vertex {index} but the mesh has {vertex_count} vertices")]
    InvalidCell {
        cell: usize,
        index: u32,
        vertex_count: usize,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("rendering context needs the {capability} capability for this mesh ({reason})")]
    MissingCapability {
        capability: &'static str,
        reason: String,
    },

    #[error("Device error: {0}")]
    Device(String),

    #[error("Readback error: {0}")]
    Readback(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),
}

impl AoError {
    /// Short category tag used in log lines and foreign error messages
    pub fn category(&self) -> &'static str {
        match self {
            AoError::InvalidPositions { .. }
            | AoError::EmptyMesh
            | AoError::NonFinitePosition { .. }
            | AoError::InvalidCell { .. }
            | AoError::InvalidConfig(_) => "Validation",
            AoError::MissingCapability { .. } => "Capability",
            AoError::Device(_) => "Device",
            AoError::Readback(_) => "Readback",
            AoError::Io(_) => "IO",
            AoError::Config(_) => "Config",
        }
    }

    pub fn device<T: ToString>(msg: T) -> Self {
        AoError::Device(msg.to_string())
    }

    pub fn readback<T: ToString>(msg: T) -> Self {
        AoError::Readback(msg.to_string())
    }

    pub fn config<T: ToString>(msg: T) -> Self {
        AoError::InvalidConfig(msg.to_string())
    }

    /// Convert AoError to PyErr with categorized prefixes
    #[cfg(feature = "extension-module")]
    pub fn to_py_err(self) -> PyErr {
        PyRuntimeError::new_err(format!("[{}] {}", self.category(), self))
    }
}

#[cfg(feature = "extension-module")]
impl From<AoError> for PyErr {
    fn from(err: AoError) -> Self {
        err.to_py_err()
    }
}

/// Result type alias for sampler operations
pub type AoResult<T> = Result<T, AoError>;
