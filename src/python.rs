// src/python.rs
// PyO3 bindings exposing the sampler as geo_ao.AmbientOcclusion
// RELEVANT FILES: src/occlusion/mod.rs, src/error.rs, src/lib.rs

use numpy::{IntoPyArray, PyArray1, PyReadonlyArray2, PyReadonlyArrayDyn};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use crate::occlusion::{AccumulationPolicy, AmbientOcclusionSampler, AoConfig, AoOptions};

#[pyclass(module = "geo_ao", name = "AmbientOcclusion")]
pub struct PyAmbientOcclusion {
    inner: Option<AmbientOcclusionSampler>,
}

impl PyAmbientOcclusion {
    fn sampler(&self) -> PyResult<&AmbientOcclusionSampler> {
        self.inner
            .as_ref()
            .ok_or_else(|| PyRuntimeError::new_err("AmbientOcclusion has been disposed"))
    }

    fn sampler_mut(&mut self) -> PyResult<&mut AmbientOcclusionSampler> {
        self.inner
            .as_mut()
            .ok_or_else(|| PyRuntimeError::new_err("AmbientOcclusion has been disposed"))
    }
}

#[pymethods]
impl PyAmbientOcclusion {
    #[new]
    #[pyo3(signature = (positions, cells=None, resolution=512, bias=0.01, normal_gated=true, seed=None))]
    fn new(
        positions: PyReadonlyArrayDyn<'_, f32>,
        cells: Option<PyReadonlyArray2<'_, u32>>,
        resolution: u32,
        bias: f32,
        normal_gated: bool,
        seed: Option<u64>,
    ) -> PyResult<Self> {
        let view = positions.as_array();
        match view.shape() {
            [_] => {}
            [_, 3] => {}
            shape => {
                return Err(PyValueError::new_err(format!(
                    "positions must have shape (N, 3) or (3N,), got {:?}",
                    shape
                )))
            }
        }
        let flat: Vec<f32> = view.iter().copied().collect();

        let mut config = AoConfig::default()
            .with_resolution(resolution)
            .with_bias(bias)
            .with_policy(if normal_gated {
                AccumulationPolicy::NormalGated
            } else {
                AccumulationPolicy::Unweighted
            });
        config.seed = seed;

        let mut options = AoOptions::new(config);
        if let Some(cells) = cells {
            let cells = cells.as_array();
            if cells.shape()[1] != 3 {
                return Err(PyValueError::new_err("cells must have shape (M, 3)"));
            }
            options = options.with_cells(
                cells
                    .rows()
                    .into_iter()
                    .map(|row| [row[0], row[1], row[2]])
                    .collect(),
            );
        }

        let sampler = AmbientOcclusionSampler::new(&flat, options)?;
        Ok(Self {
            inner: Some(sampler),
        })
    }

    #[pyo3(signature = (n=1))]
    fn sample(&mut self, n: u32) -> PyResult<()> {
        self.sampler_mut()?.sample(n);
        Ok(())
    }

    fn report<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyArray1<f32>>> {
        let values = self.sampler()?.report()?;
        Ok(values.into_pyarray_bound(py))
    }

    fn dispose(&mut self) -> PyResult<()> {
        let sampler = self
            .inner
            .take()
            .ok_or_else(|| PyRuntimeError::new_err("AmbientOcclusion has already been disposed"))?;
        sampler.dispose();
        Ok(())
    }

    #[getter]
    fn sample_count(&self) -> PyResult<u64> {
        Ok(self.sampler()?.sample_count())
    }

    #[getter]
    fn vertex_count(&self) -> PyResult<usize> {
        Ok(self.sampler()?.vertex_count())
    }

    fn __repr__(&self) -> String {
        match &self.inner {
            Some(sampler) => format!(
                "AmbientOcclusion(vertices={}, samples={})",
                sampler.vertex_count(),
                sampler.sample_count()
            ),
            None => "AmbientOcclusion(disposed)".to_string(),
        }
    }
}
