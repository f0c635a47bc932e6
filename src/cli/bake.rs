// src/cli/bake.rs
// Progressive occlusion bake over a built-in primitive
// RELEVANT FILES: src/cli/args.rs, src/bin/ao_bake.rs, src/occlusion/mod.rs

use std::env;
use std::path::Path;

use serde::Serialize;

use super::args::{BakeArgs, BakeCliError, USAGE};
use crate::error::AoResult;
use crate::geometry::{generate_primitive, PrimitiveParams};
use crate::occlusion::{AmbientOcclusionSampler, AoOptions};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BakeOutput {
    pub vertex_count: usize,
    pub samples: u64,
    pub occlusion: Vec<f32>,
}

impl BakeOutput {
    /// `(min, mean, max)` of the occlusion values.
    pub fn summary(&self) -> (f32, f32, f32) {
        if self.occlusion.is_empty() {
            return (0.0, 0.0, 0.0);
        }
        let min = self.occlusion.iter().copied().fold(f32::INFINITY, f32::min);
        let max = self.occlusion.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let mean = self.occlusion.iter().sum::<f32>() / self.occlusion.len() as f32;
        (min, mean, max)
    }

    pub fn write_json(&self, path: &Path) -> AoResult<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer(std::io::BufWriter::new(file), self)?;
        Ok(())
    }
}

/// Run `args.samples` trials in batches of `args.batch`, logging progress.
pub fn run_bake(args: &BakeArgs) -> AoResult<BakeOutput> {
    let config = args.resolve_config()?;
    let mesh = generate_primitive(args.mesh, PrimitiveParams::default());
    log::info!(
        "baking {:?}: {} vertices, {} triangles",
        args.mesh,
        mesh.vertex_count(),
        mesh.triangle_count()
    );

    let mut sampler = AmbientOcclusionSampler::new(
        &mesh.flat_positions(),
        AoOptions::new(config).with_cells(mesh.cells()),
    )?;

    let mut remaining = args.samples;
    while remaining > 0 {
        let batch = remaining.min(args.batch);
        sampler.sample(batch);
        remaining -= batch;
        log::info!("{}/{} samples", sampler.sample_count(), args.samples);
    }

    let output = BakeOutput {
        vertex_count: sampler.vertex_count(),
        samples: sampler.sample_count(),
        occlusion: sampler.report()?,
    };
    sampler.dispose();
    Ok(output)
}

/// Entry point of the `ao-bake` binary.
pub fn run_ao_bake_cli() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let all_args: Vec<String> = env::args().skip(1).collect();
    let args = match BakeArgs::parse(&all_args) {
        Ok(args) => args,
        Err(BakeCliError::Help) => {
            println!("{USAGE}");
            return Ok(());
        }
        Err(e) => {
            eprintln!("[ao-bake] {e}");
            eprintln!("{USAGE}");
            std::process::exit(2);
        }
    };

    let output = run_bake(&args)?;
    let (min, mean, max) = output.summary();
    println!(
        "{} vertices, {} samples: min {:.4} mean {:.4} max {:.4}",
        output.vertex_count, output.samples, min, mean, max
    );

    if let Some(path) = &args.output {
        output.write_json(path)?;
        log::info!("wrote {}", path.display());
    }
    Ok(())
}
