use glam::{Mat3, Vec3};

/// Half side of the capture cube. A mesh whose bounding-box diagonal equals
/// `2 * REFERENCE_HALF_EXTENT` (= sqrt 3, the unit cube diagonal) stays inside
/// `[-h, h]^3` under any rotation about the origin.
pub const REFERENCE_HALF_EXTENT: f32 = 0.866_025_4;

const EPSILON: f32 = 1e-12;

/// Positions centered on the origin and scaled into the reference sphere.
#[derive(Debug, Clone)]
pub struct NormalizedMesh {
    pub positions: Vec<[f32; 3]>,
    /// Bounding-box center of the input, subtracted from every position
    pub center: Vec3,
    /// Uniform factor applied after centering
    pub scale: f32,
}

impl NormalizedMesh {
    /// Radius of the smallest origin-centered sphere holding every vertex.
    pub fn max_radius(&self) -> f32 {
        self.positions
            .iter()
            .map(|p| Vec3::from_array(*p).length())
            .fold(0.0, f32::max)
    }
}

pub fn bounding_box(positions: &[[f32; 3]]) -> Option<(Vec3, Vec3)> {
    let (first, rest) = positions.split_first()?;

    let mut min = Vec3::from_array(*first);
    let mut max = min;
    for p in rest {
        let v = Vec3::from_array(*p);
        min = min.min(v);
        max = max.max(v);
    }

    Some((min, max))
}

/// Center the bounding box on the origin and scale uniformly so the box's
/// circumscribed sphere has diameter sqrt 3. Returns `None` for an empty mesh.
pub fn normalize_to_reference_volume(positions: &[[f32; 3]]) -> Option<NormalizedMesh> {
    let (min, max) = bounding_box(positions)?;
    let center = (min + max) * 0.5;
    let diagonal = (max - min).length();

    let scale = if diagonal > EPSILON {
        2.0 * REFERENCE_HALF_EXTENT / diagonal
    } else {
        log::warn!("degenerate bounding box (all vertices coincide); mesh is centered but not scaled");
        1.0
    };

    let linear = Mat3::from_diagonal(Vec3::splat(scale));
    let positions = positions
        .iter()
        .map(|p| (linear * (Vec3::from_array(*p) - center)).to_array())
        .collect();

    Some(NormalizedMesh {
        positions,
        center,
        scale,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    fn skewed_box() -> Vec<[f32; 3]> {
        vec![
            [10.0, -2.0, 3.0],
            [14.0, -2.0, 3.0],
            [10.0, 6.0, 3.0],
            [14.0, 6.0, 4.0],
            [12.0, 1.0, 3.5],
        ]
    }

    #[test]
    fn bounding_box_is_centered() {
        let normalized = normalize_to_reference_volume(&skewed_box()).unwrap();
        let (min, max) = bounding_box(&normalized.positions).unwrap();
        assert!(((min + max) * 0.5).length() < 1e-5);
        assert_eq!(normalized.center, Vec3::new(12.0, 2.0, 3.5));
    }

    #[test]
    fn diagonal_matches_unit_cube_diagonal() {
        let normalized = normalize_to_reference_volume(&skewed_box()).unwrap();
        let (min, max) = bounding_box(&normalized.positions).unwrap();
        assert!(((max - min).length() - 3.0f32.sqrt()).abs() < 1e-5);
        assert!(normalized.max_radius() <= REFERENCE_HALF_EXTENT + 1e-5);
    }

    #[test]
    fn any_rotation_stays_inside_capture_cube() {
        let normalized = normalize_to_reference_volume(&skewed_box()).unwrap();
        for i in 0..64 {
            let a = i as f32 * 0.37;
            let q = Quat::from_euler(glam::EulerRot::XYZ, a, a * 1.7, a * 2.3);
            for p in &normalized.positions {
                let r = q * Vec3::from_array(*p);
                assert!(r.abs().max_element() <= REFERENCE_HALF_EXTENT + 1e-5);
            }
        }
    }

    #[test]
    fn aspect_ratio_is_preserved() {
        let normalized = normalize_to_reference_volume(&skewed_box()).unwrap();
        let (min, max) = bounding_box(&normalized.positions).unwrap();
        let extent = max - min;
        assert!((extent.y / extent.x - 2.0).abs() < 1e-5);
    }

    #[test]
    fn degenerate_and_empty_inputs() {
        assert!(normalize_to_reference_volume(&[]).is_none());
        let single = normalize_to_reference_volume(&[[5.0, 5.0, 5.0]]).unwrap();
        assert_eq!(single.positions, vec![[0.0, 0.0, 0.0]]);
        assert_eq!(single.scale, 1.0);
    }
}
