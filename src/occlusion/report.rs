// src/occlusion/report.rs
// Converts accumulated (occluded, counted) texel totals into per-vertex occlusion
// RELEVANT FILES: src/occlusion/mod.rs, src/shaders/ao_accumulate.wgsl

use super::config::AccumulationPolicy;

/// `texels` is the tight RGBA readback of the accumulation target. Entry `i`
/// of the result is `occluded / effective` for vertex `i`, clamped to [0, 1],
/// where the effective count is the number of trials under `Unweighted` and
/// the per-vertex counted trials under `NormalGated`. A vertex with no
/// effective trials reports 0.
pub fn occlusion_from_texels(
    texels: &[f32],
    vertex_count: usize,
    sample_count: u64,
    policy: AccumulationPolicy,
) -> Vec<f32> {
    texels
        .chunks_exact(4)
        .take(vertex_count)
        .map(|texel| {
            let occluded = texel[0];
            let effective = match policy {
                AccumulationPolicy::Unweighted => sample_count as f32,
                AccumulationPolicy::NormalGated => texel[1],
            };
            if effective > 0.0 {
                (occluded / effective).clamp(0.0, 1.0)
            } else {
                0.0
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texels(counts: &[(f32, f32)], padding: usize) -> Vec<f32> {
        let mut out: Vec<f32> = counts.iter().flat_map(|&(r, g)| [r, g, 0.0, 1.0]).collect();
        out.extend(std::iter::repeat(0.0).take(padding * 4));
        out
    }

    #[test]
    fn unweighted_divides_by_trials() {
        let data = texels(&[(0.0, 10.0), (5.0, 10.0), (10.0, 10.0)], 1);
        let ao = occlusion_from_texels(&data, 3, 10, AccumulationPolicy::Unweighted);
        assert_eq!(ao, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn normal_gated_divides_by_counted_trials() {
        let data = texels(&[(3.0, 4.0), (0.0, 0.0), (2.0, 8.0)], 0);
        let ao = occlusion_from_texels(&data, 3, 10, AccumulationPolicy::NormalGated);
        assert_eq!(ao, vec![0.75, 0.0, 0.25]);
    }

    #[test]
    fn no_trials_reports_zero() {
        let data = texels(&[(0.0, 0.0), (0.0, 0.0)], 2);
        for policy in [AccumulationPolicy::Unweighted, AccumulationPolicy::NormalGated] {
            assert_eq!(occlusion_from_texels(&data, 2, 0, policy), vec![0.0, 0.0]);
        }
    }

    #[test]
    fn padding_is_dropped_and_values_clamped() {
        let data = texels(&[(12.0, 10.0)], 3);
        let ao = occlusion_from_texels(&data, 1, 10, AccumulationPolicy::Unweighted);
        assert_eq!(ao, vec![1.0]);
    }
}
