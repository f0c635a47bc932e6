// src/geometry/weld.rs
// Position welding and per-vertex normal generation
// Exists to recover shared topology from unindexed triangle streams before normals are built
// RELEVANT FILES: src/geometry/mod.rs, src/occlusion/encode.rs

use std::collections::HashMap;

use glam::Vec3;

/// Result of welding coincident positions.
#[derive(Debug, Clone)]
pub struct WeldResult {
    /// One entry per distinct (quantized) position
    pub positions: Vec<[f32; 3]>,
    /// For every input vertex, its index into `positions`
    pub remap: Vec<u32>,
    pub collapsed: usize,
}

/// Merge vertices whose positions agree within `epsilon`.
pub fn weld_positions(positions: &[[f32; 3]], epsilon: f32) -> WeldResult {
    let mut key_map: HashMap<(i64, i64, i64), u32> = HashMap::with_capacity(positions.len());
    let mut welded = Vec::new();
    let mut remap = Vec::with_capacity(positions.len());

    for position in positions {
        let key = quantize_position(*position, epsilon);
        let index = *key_map.entry(key).or_insert_with(|| {
            welded.push(*position);
            (welded.len() - 1) as u32
        });
        remap.push(index);
    }

    let collapsed = positions.len() - welded.len();
    WeldResult {
        positions: welded,
        remap,
        collapsed,
    }
}

/// Area-weighted vertex normals for a triangle list. Vertices without a
/// non-degenerate incident triangle get a zero normal.
pub fn vertex_normals(positions: &[[f32; 3]], triangles: &[[u32; 3]]) -> Vec<[f32; 3]> {
    let mut accum = vec![Vec3::ZERO; positions.len()];

    for tri in triangles {
        let [i0, i1, i2] = tri.map(|i| i as usize);
        let p0 = Vec3::from_array(positions[i0]);
        let p1 = Vec3::from_array(positions[i1]);
        let p2 = Vec3::from_array(positions[i2]);
        // Cross product length is twice the area, which is the weight we want.
        let normal = (p1 - p0).cross(p2 - p0);
        if normal.length_squared() <= 1e-20 {
            continue;
        }
        accum[i0] += normal;
        accum[i1] += normal;
        accum[i2] += normal;
    }

    accum
        .into_iter()
        .map(|n| n.normalize_or_zero().to_array())
        .collect()
}

fn quantize_position(position: [f32; 3], eps: f32) -> (i64, i64, i64) {
    (
        quantize_scalar(position[0], eps),
        quantize_scalar(position[1], eps),
        quantize_scalar(position[2], eps),
    )
}

fn quantize_scalar(value: f32, eps: f32) -> i64 {
    (value / eps).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weld_deduplicates_vertices() {
        let positions = vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.000_001],
        ];
        let result = weld_positions(&positions, 1e-5);
        assert_eq!(result.positions.len(), 4);
        assert_eq!(result.collapsed, 2);
        assert_eq!(result.remap, vec![0, 1, 2, 1, 3, 2]);
    }

    #[test]
    fn normals_follow_counter_clockwise_winding() {
        let positions = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let normals = vertex_normals(&positions, &[[0, 1, 2]]);
        for n in normals {
            assert_eq!(n, [0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn shared_vertices_average_incident_faces() {
        // Two faces folded 90 degrees along the x axis.
        let positions = vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
        ];
        let normals = vertex_normals(&positions, &[[0, 1, 2], [0, 3, 1]]);
        let shared = Vec3::from_array(normals[0]);
        let expected = Vec3::new(0.0, 1.0, 1.0).normalize();
        assert!((shared - expected).length() < 1e-6);
        assert!((Vec3::from_array(normals[2]) - Vec3::Z).length() < 1e-6);
        assert!((Vec3::from_array(normals[3]) - Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn isolated_and_degenerate_vertices_have_zero_normal() {
        let positions = vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [2.0, 0.0, 0.0],
            [5.0, 5.0, 5.0],
        ];
        let normals = vertex_normals(&positions, &[[0, 1, 2]]);
        assert!(normals.iter().all(|n| *n == [0.0, 0.0, 0.0]));
    }
}
