// src/occlusion/encode.rs
// Packs per-vertex attributes into square power-of-two float textures
// Texel i (row-major) holds vertex i; w = 1 marks a live vertex, padding is all zero
// RELEVANT FILES: src/occlusion/mod.rs, src/geometry/weld.rs, src/shaders/ao_accumulate.wgsl

use crate::geometry::{vertex_normals, weld_positions};

/// Smallest power of two `r` with `r * r >= vertex_count` (1 for an empty mesh).
pub fn texture_resolution(vertex_count: usize) -> u32 {
    let mut res: u64 = 1;
    while res * res < vertex_count as u64 {
        res *= 2;
    }
    res as u32
}

/// Lay `values` out one texel per entry in a `res x res` RGBA grid.
pub fn pack_texels(values: &[[f32; 3]], res: u32) -> Vec<[f32; 4]> {
    let texel_count = res as usize * res as usize;
    assert!(
        values.len() <= texel_count,
        "{} values do not fit a {}x{} texture",
        values.len(),
        res,
        res
    );
    let mut texels = vec![[0.0f32; 4]; texel_count];
    for (texel, v) in texels.iter_mut().zip(values) {
        *texel = [v[0], v[1], v[2], 1.0];
    }
    texels
}

/// Unit vertex normals from the mesh topology. Without explicit cells the
/// stream is read as consecutive triangles, welded so coincident corners share
/// one normal, and the welded normals are mapped back per input vertex.
pub fn topology_normals(
    positions: &[[f32; 3]],
    cells: Option<&[[u32; 3]]>,
    weld_epsilon: f32,
) -> Vec<[f32; 3]> {
    if let Some(cells) = cells {
        return vertex_normals(positions, cells);
    }

    let welded = weld_positions(positions, weld_epsilon);
    let triangles: Vec<[u32; 3]> = welded
        .remap
        .chunks_exact(3)
        .map(|t| [t[0], t[1], t[2]])
        .collect();
    log::debug!(
        "welded unindexed stream: {} -> {} vertices",
        positions.len(),
        welded.positions.len()
    );
    let normals = vertex_normals(&welded.positions, &triangles);
    welded.remap.iter().map(|&i| normals[i as usize]).collect()
}
