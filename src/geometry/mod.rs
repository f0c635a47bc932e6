// src/geometry/mod.rs
// Geometry module hub providing mesh containers and CPU-side mesh processing
// Exists to centralize normalization, welding/normal generation and test primitives
// RELEVANT FILES: src/geometry/transform.rs, src/geometry/weld.rs, src/geometry/primitives.rs

mod primitives;
mod transform;
mod weld;

pub use primitives::{
    generate_bowl, generate_icosahedron, generate_primitive, generate_sphere, generate_torus,
    generate_unit_box, BowlParts, PrimitiveParams, PrimitiveType,
};
pub use transform::{
    bounding_box, normalize_to_reference_volume, NormalizedMesh, REFERENCE_HALF_EXTENT,
};
pub use weld::{vertex_normals, weld_positions, WeldResult};

/// Shared indexed triangle mesh used by the primitive generators.
#[derive(Debug, Clone, Default)]
pub struct MeshBuffers {
    pub positions: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl MeshBuffers {
    pub fn with_capacity(vertex_capacity: usize, index_capacity: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertex_capacity),
            indices: Vec::with_capacity(index_capacity),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Positions as the flat `x, y, z, x, y, z, ...` array the sampler consumes.
    pub fn flat_positions(&self) -> Vec<f32> {
        self.positions.iter().flatten().copied().collect()
    }

    /// Index triples as sampler cells.
    pub fn cells(&self) -> Vec<[u32; 3]> {
        self.indices
            .chunks_exact(3)
            .map(|t| [t[0], t[1], t[2]])
            .collect()
    }

    /// Expand into an unindexed triangle stream (three vertices per triangle).
    pub fn unindexed_positions(&self) -> Vec<f32> {
        self.indices
            .iter()
            .flat_map(|&i| self.positions[i as usize])
            .collect()
    }

    pub(crate) fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adaptors_preserve_layout() {
        let mesh = MeshBuffers {
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            indices: vec![0, 1, 2],
        };
        assert_eq!(mesh.flat_positions(), vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
        assert_eq!(mesh.cells(), vec![[0, 1, 2]]);
        assert_eq!(mesh.unindexed_positions().len(), 9);
        assert_eq!(mesh.triangle_count(), 1);
    }
}
