// src/geometry/primitives.rs
// Procedural closed-topology meshes for occlusion baking and validation scenes
// Seams and poles share vertices so topology-derived normals stay smooth
// RELEVANT FILES: src/geometry/mod.rs, src/cli/mod.rs, tests/test_ao_scenes.rs

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use super::MeshBuffers;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveType {
    Icosahedron,
    Sphere,
    Box,
    Torus,
    Bowl,
}

impl PrimitiveType {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "icosahedron" | "ico" => Some(Self::Icosahedron),
            "sphere" => Some(Self::Sphere),
            "box" | "cube" => Some(Self::Box),
            "torus" => Some(Self::Torus),
            "bowl" => Some(Self::Bowl),
            _ => None,
        }
    }
}

/// Shared tessellation parameters for primitives.
#[derive(Debug, Clone, Copy)]
pub struct PrimitiveParams {
    pub rings: u32,
    pub segments: u32,
    pub radius: f32,
    pub inner_radius: f32,
}

impl Default for PrimitiveParams {
    fn default() -> Self {
        Self {
            rings: 16,
            segments: 32,
            radius: 1.0,
            inner_radius: 0.8,
        }
    }
}

pub fn generate_primitive(kind: PrimitiveType, params: PrimitiveParams) -> MeshBuffers {
    match kind {
        PrimitiveType::Icosahedron => generate_icosahedron(params.radius),
        PrimitiveType::Sphere => generate_sphere(params.rings, params.segments, params.radius),
        PrimitiveType::Box => generate_unit_box(),
        PrimitiveType::Torus => generate_torus(
            params.segments,
            params.rings,
            params.radius,
            params.radius - params.inner_radius.min(params.radius),
        ),
        PrimitiveType::Bowl => {
            generate_bowl(params.rings, params.segments, params.inner_radius, params.radius).mesh
        }
    }
}

/// Regular icosahedron with vertices on a sphere of `radius`.
pub fn generate_icosahedron(radius: f32) -> MeshBuffers {
    let t = (1.0 + 5.0f32.sqrt()) * 0.5;
    let raw = [
        [-1.0, t, 0.0],
        [1.0, t, 0.0],
        [-1.0, -t, 0.0],
        [1.0, -t, 0.0],
        [0.0, -1.0, t],
        [0.0, 1.0, t],
        [0.0, -1.0, -t],
        [0.0, 1.0, -t],
        [t, 0.0, -1.0],
        [t, 0.0, 1.0],
        [-t, 0.0, -1.0],
        [-t, 0.0, 1.0],
    ];
    let faces: [[u32; 3]; 20] = [
        [0, 11, 5],
        [0, 5, 1],
        [0, 1, 7],
        [0, 7, 10],
        [0, 10, 11],
        [1, 5, 9],
        [5, 11, 4],
        [11, 10, 2],
        [10, 7, 6],
        [7, 1, 8],
        [3, 9, 4],
        [3, 4, 2],
        [3, 2, 6],
        [3, 6, 8],
        [3, 8, 9],
        [4, 9, 5],
        [2, 4, 11],
        [6, 2, 10],
        [8, 6, 7],
        [9, 8, 1],
    ];

    let norm = (1.0 + t * t).sqrt();
    let mut mesh = MeshBuffers::with_capacity(12, 60);
    for p in raw {
        mesh.positions
            .push([p[0] / norm * radius, p[1] / norm * radius, p[2] / norm * radius]);
    }
    for [a, b, c] in faces {
        mesh.push_triangle(a, b, c);
    }
    mesh
}

/// UV sphere with single pole vertices and a shared seam.
pub fn generate_sphere(rings: u32, segments: u32, radius: f32) -> MeshBuffers {
    let rings = rings.max(2);
    let segments = segments.max(3);
    let mut mesh = MeshBuffers::with_capacity(
        ((rings - 1) * segments + 2) as usize,
        (rings * segments * 6) as usize,
    );

    // Pole at -Y, rings climbing toward +Y.
    mesh.positions.push([0.0, -radius, 0.0]);
    for ring in 1..rings {
        let phi = ring as f32 / rings as f32 * PI;
        push_ring(&mut mesh, segments, radius * phi.sin(), -radius * phi.cos());
    }
    mesh.positions.push([0.0, radius, 0.0]);

    let top = (mesh.positions.len() - 1) as u32;
    let ring_start = |ring: u32| 1 + (ring - 1) * segments;

    add_pole_fan(&mut mesh, 0, ring_start(1), segments, true);
    for ring in 1..rings - 1 {
        add_band(&mut mesh, ring_start(ring), ring_start(ring + 1), segments, false);
    }
    add_pole_fan(&mut mesh, top, ring_start(rings - 1), segments, false);

    mesh
}

/// Axis-aligned unit cube centered at the origin, eight shared corners.
pub fn generate_unit_box() -> MeshBuffers {
    let mut mesh = MeshBuffers::with_capacity(8, 36);
    for i in 0..8u32 {
        let x = if i & 1 == 0 { -0.5 } else { 0.5 };
        let y = if i & 2 == 0 { -0.5 } else { 0.5 };
        let z = if i & 4 == 0 { -0.5 } else { 0.5 };
        mesh.positions.push([x, y, z]);
    }
    // Quads listed counter-clockwise seen from outside.
    let quads: [[u32; 4]; 6] = [
        [1, 3, 7, 5], // +X
        [0, 4, 6, 2], // -X
        [2, 6, 7, 3], // +Y
        [0, 1, 5, 4], // -Y
        [4, 5, 7, 6], // +Z
        [0, 2, 3, 1], // -Z
    ];
    for [a, b, c, d] in quads {
        mesh.push_triangle(a, b, c);
        mesh.push_triangle(a, c, d);
    }
    mesh
}

/// Torus around the Y axis, both seams shared.
pub fn generate_torus(
    major_segments: u32,
    minor_segments: u32,
    major_radius: f32,
    minor_radius: f32,
) -> MeshBuffers {
    let major_segments = major_segments.max(3);
    let minor_segments = minor_segments.max(3);
    let mut mesh = MeshBuffers::with_capacity(
        (major_segments * minor_segments) as usize,
        (major_segments * minor_segments * 6) as usize,
    );

    for i in 0..major_segments {
        let (sin_phi, cos_phi) = (i as f32 / major_segments as f32 * TAU).sin_cos();
        for j in 0..minor_segments {
            let (sin_theta, cos_theta) = (j as f32 / minor_segments as f32 * TAU).sin_cos();
            let r = major_radius + minor_radius * cos_theta;
            mesh.positions
                .push([r * cos_phi, minor_radius * sin_theta, r * sin_phi]);
        }
    }

    let index = |i: u32, j: u32| (i % major_segments) * minor_segments + (j % minor_segments);
    for i in 0..major_segments {
        for j in 0..minor_segments {
            let a = index(i, j);
            let b = index(i + 1, j);
            let c = index(i, j + 1);
            let d = index(i + 1, j + 1);
            mesh.push_triangle(a, c, b);
            mesh.push_triangle(b, c, d);
        }
    }
    mesh
}

/// Vertex ranges of the three separately-indexed parts of a bowl.
#[derive(Debug, Clone)]
pub struct BowlParts {
    pub mesh: MeshBuffers,
    /// Inner (cavity) surface vertices; the first one is the cavity bottom
    pub inner: std::ops::Range<usize>,
    pub outer: std::ops::Range<usize>,
    /// Flat annulus joining inner and outer rims at y = 0
    pub lip: std::ops::Range<usize>,
}

impl BowlParts {
    pub fn inner_bottom(&self) -> usize {
        self.inner.start
    }
}

/// Thick hemispherical bowl opening toward +Y: an outer hemisphere of
/// `outer_radius`, an inner cavity of `inner_radius` and a flat lip. Each
/// part has its own vertices so the lip keeps a straight +Y normal.
pub fn generate_bowl(rings: u32, segments: u32, inner_radius: f32, outer_radius: f32) -> BowlParts {
    let rings = rings.max(2);
    let segments = segments.max(3);
    let mut mesh = MeshBuffers::default();

    let outer = add_hemisphere(&mut mesh, rings, segments, outer_radius, false);
    let inner = add_hemisphere(&mut mesh, rings, segments, inner_radius, true);

    let lip_start = mesh.positions.len();
    push_ring(&mut mesh, segments, inner_radius, 0.0);
    push_ring(&mut mesh, segments, outer_radius, 0.0);
    let i0 = lip_start as u32;
    let o0 = i0 + segments;
    for k in 0..segments {
        let k1 = (k + 1) % segments;
        mesh.push_triangle(i0 + k, i0 + k1, o0 + k);
        mesh.push_triangle(i0 + k1, o0 + k1, o0 + k);
    }
    let lip = lip_start..mesh.positions.len();

    BowlParts {
        mesh,
        inner,
        outer,
        lip,
    }
}

fn add_hemisphere(
    mesh: &mut MeshBuffers,
    rings: u32,
    segments: u32,
    radius: f32,
    facing_inward: bool,
) -> std::ops::Range<usize> {
    let start = mesh.positions.len();
    mesh.positions.push([0.0, -radius, 0.0]);
    for ring in 1..=rings {
        let phi = ring as f32 / rings as f32 * FRAC_PI_2;
        push_ring(mesh, segments, radius * phi.sin(), -radius * phi.cos());
    }

    let pole = start as u32;
    let ring_start = |ring: u32| pole + 1 + (ring - 1) * segments;
    add_pole_fan(mesh, pole, ring_start(1), segments, !facing_inward);
    for ring in 1..rings {
        add_band(mesh, ring_start(ring), ring_start(ring + 1), segments, facing_inward);
    }
    start..mesh.positions.len()
}

fn push_ring(mesh: &mut MeshBuffers, segments: u32, ring_radius: f32, y: f32) {
    for k in 0..segments {
        let (sin_theta, cos_theta) = (k as f32 / segments as f32 * TAU).sin_cos();
        mesh.positions
            .push([ring_radius * cos_theta, y, ring_radius * sin_theta]);
    }
}

/// Quads between two rings, `lower` nearer the -Y pole. Outward-facing
/// unless `flip` is set.
fn add_band(mesh: &mut MeshBuffers, lower: u32, upper: u32, segments: u32, flip: bool) {
    for k in 0..segments {
        let k1 = (k + 1) % segments;
        let (a, b, c, d) = (lower + k, lower + k1, upper + k, upper + k1);
        if flip {
            mesh.push_triangle(a, b, c);
            mesh.push_triangle(b, d, c);
        } else {
            mesh.push_triangle(a, c, b);
            mesh.push_triangle(b, c, d);
        }
    }
}

/// Fan from a pole to its neighbouring ring. `bottom_outward` selects the
/// winding that faces away from the sphere for a -Y pole.
fn add_pole_fan(mesh: &mut MeshBuffers, pole: u32, ring: u32, segments: u32, bottom_outward: bool) {
    for k in 0..segments {
        let k1 = (k + 1) % segments;
        if bottom_outward {
            mesh.push_triangle(pole, ring + k, ring + k1);
        } else {
            mesh.push_triangle(pole, ring + k1, ring + k);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::vertex_normals;
    use glam::Vec3;

    fn outward_fraction(mesh: &MeshBuffers) -> f32 {
        let normals = vertex_normals(&mesh.positions, &mesh.cells());
        let outward = mesh
            .positions
            .iter()
            .zip(&normals)
            .filter(|(p, n)| Vec3::from_array(**p).dot(Vec3::from_array(**n)) > 0.0)
            .count();
        outward as f32 / mesh.vertex_count() as f32
    }

    #[test]
    fn icosahedron_is_closed_and_outward() {
        let mesh = generate_icosahedron(1.0);
        assert_eq!(mesh.vertex_count(), 12);
        assert_eq!(mesh.triangle_count(), 20);
        assert_eq!(outward_fraction(&mesh), 1.0);
        for p in &mesh.positions {
            assert!((Vec3::from_array(*p).length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn closed_primitives_face_outward() {
        assert_eq!(outward_fraction(&generate_sphere(8, 12, 1.0)), 1.0);
        assert_eq!(outward_fraction(&generate_unit_box()), 1.0);
        let sphere = generate_sphere(8, 12, 1.0);
        assert_eq!(sphere.vertex_count(), 7 * 12 + 2);
        assert_eq!(sphere.triangle_count(), 8 * 12 * 2 - 2 * 12);
    }

    #[test]
    fn torus_normals_point_away_from_tube_center() {
        let mesh = generate_torus(24, 12, 1.0, 0.3);
        let normals = vertex_normals(&mesh.positions, &mesh.cells());
        for (p, n) in mesh.positions.iter().zip(&normals) {
            let p = Vec3::from_array(*p);
            let ring = Vec3::new(p.x, 0.0, p.z).normalize();
            let from_tube = p - ring;
            assert!(from_tube.dot(Vec3::from_array(*n)) > 0.0);
        }
    }

    #[test]
    fn bowl_parts_have_expected_orientation() {
        let bowl = generate_bowl(8, 16, 0.8, 1.0);
        let normals = vertex_normals(&bowl.mesh.positions, &bowl.mesh.cells());

        let bottom = Vec3::from_array(normals[bowl.inner_bottom()]);
        assert!((bottom - Vec3::Y).length() < 1e-4, "cavity bottom faces up: {bottom:?}");
        let outer_bottom = Vec3::from_array(normals[bowl.outer.start]);
        assert!((outer_bottom + Vec3::Y).length() < 1e-4);

        for i in bowl.lip.clone() {
            assert!((Vec3::from_array(normals[i]) - Vec3::Y).length() < 1e-4);
        }
        for i in bowl.inner.clone() {
            let p = Vec3::from_array(bowl.mesh.positions[i]);
            assert!(p.dot(Vec3::from_array(normals[i])) < 0.0, "inner surface faces the cavity");
        }
    }

    #[test]
    fn parse_names() {
        assert_eq!(PrimitiveType::parse("Bowl"), Some(PrimitiveType::Bowl));
        assert_eq!(PrimitiveType::parse("cube"), Some(PrimitiveType::Box));
        assert_eq!(PrimitiveType::parse("teapot"), None);
    }
}
