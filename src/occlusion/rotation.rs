//! Per-trial random orientations.
//!
//! Every trial draws three independent angles, one per axis, and builds a
//! rotation-only model matrix from them. The source is injectable so tests and
//! offline bakes can be reproduced exactly.

use std::f32::consts::TAU;

use glam::Mat4;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::{AoError, AoResult};

/// Supplies `[x, y, z]` rotation angles in radians, one triple per trial.
pub trait RotationSource: Send {
    fn next_angles(&mut self) -> [f32; 3];
}

/// Angles drawn uniformly from `[0, 2pi)` on each axis.
pub struct UniformEulerAngles {
    rng: ChaCha8Rng,
}

impl UniformEulerAngles {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
        }
    }

    pub fn new(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_entropy, Self::from_seed)
    }
}

impl RotationSource for UniformEulerAngles {
    fn next_angles(&mut self) -> [f32; 3] {
        [
            self.rng.gen_range(0.0..TAU),
            self.rng.gen_range(0.0..TAU),
            self.rng.gen_range(0.0..TAU),
        ]
    }
}

/// Replays a fixed list of angle triples, wrapping around at the end.
pub struct FixedAngles {
    angles: Vec<[f32; 3]>,
    next: usize,
}

impl FixedAngles {
    /// Fails with `InvalidConfig` when `angles` is empty.
    pub fn new(angles: Vec<[f32; 3]>) -> AoResult<Self> {
        if angles.is_empty() {
            return Err(AoError::config("fixed rotations need at least one angle triple"));
        }
        Ok(Self { angles, next: 0 })
    }
}

impl RotationSource for FixedAngles {
    fn next_angles(&mut self) -> [f32; 3] {
        let angles = self.angles[self.next];
        self.next = (self.next + 1) % self.angles.len();
        angles
    }
}

/// Rotation about X, then Y, then Z applied as `Rx * Ry * Rz`.
pub fn rotation_matrix(angles: [f32; 3]) -> Mat4 {
    Mat4::from_rotation_x(angles[0]) * Mat4::from_rotation_y(angles[1]) * Mat4::from_rotation_z(angles[2])
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn seeded_sources_repeat() {
        let mut a = UniformEulerAngles::from_seed(42);
        let mut b = UniformEulerAngles::from_seed(42);
        for _ in 0..16 {
            assert_eq!(a.next_angles(), b.next_angles());
        }
    }

    #[test]
    fn angles_stay_in_range() {
        let mut source = UniformEulerAngles::from_seed(1);
        for _ in 0..1000 {
            for angle in source.next_angles() {
                assert!((0.0..TAU).contains(&angle));
            }
        }
    }

    #[test]
    fn fixed_angles_wrap() {
        let mut source = FixedAngles::new(vec![[0.0; 3], [1.0, 2.0, 3.0]]).unwrap();
        assert_eq!(source.next_angles(), [0.0; 3]);
        assert_eq!(source.next_angles(), [1.0, 2.0, 3.0]);
        assert_eq!(source.next_angles(), [0.0; 3]);
    }

    #[test]
    fn fixed_angles_reject_empty_list() {
        let err = FixedAngles::new(Vec::new()).err().unwrap();
        assert!(matches!(err, AoError::InvalidConfig(_)));
    }

    #[test]
    fn matrix_is_a_pure_rotation() {
        let m = rotation_matrix([0.3, 1.1, 2.5]);
        let v = Vec3::new(0.2, -0.4, 0.7);
        let r = m.transform_point3(v);
        assert!((r.length() - v.length()).abs() < 1e-6);
        assert!((m.determinant() - 1.0).abs() < 1e-5);
        assert_eq!(m.transform_point3(Vec3::ZERO), Vec3::ZERO);
    }
}
