// src/cli/args.rs
// ao-bake argument parsing
// Flags map onto AoConfig overrides; a --config document is applied first, flags win
// RELEVANT FILES: src/cli/bake.rs, src/bin/ao_bake.rs, src/occlusion/config.rs

use std::path::PathBuf;

use crate::error::AoResult;
use crate::geometry::PrimitiveType;
use crate::occlusion::{AccumulationPolicy, AoConfig};

pub const USAGE: &str = "usage: ao-bake --mesh <sphere|box|torus|icosahedron|bowl> [--samples N] \
[--batch N] [--resolution R] [--bias B] [--policy unweighted|normal] [--seed S] \
[--config file.json] [--output file.json]";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum BakeCliError {
    #[error("missing value for {0}")]
    MissingValue(String),
    #[error("invalid value for {flag}: {value}")]
    InvalidValue { flag: String, value: String },
    #[error("unknown flag {0}")]
    UnknownFlag(String),
    #[error("unknown --mesh value '{0}' (expected sphere, box, torus, icosahedron, bowl)")]
    UnknownMesh(String),
    #[error("--mesh is required")]
    MissingMesh,
    #[error("help requested")]
    Help,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BakeArgs {
    pub mesh: PrimitiveType,
    pub samples: u32,
    pub batch: u32,
    pub resolution: Option<u32>,
    pub bias: Option<f32>,
    pub policy: Option<AccumulationPolicy>,
    pub seed: Option<u64>,
    pub config: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

impl BakeArgs {
    pub const DEFAULT_SAMPLES: u32 = 1000;
    pub const DEFAULT_BATCH: u32 = 100;

    pub fn parse(args: &[String]) -> Result<Self, BakeCliError> {
        let mut mesh = None;
        let mut parsed = BakeArgs {
            mesh: PrimitiveType::Sphere,
            samples: Self::DEFAULT_SAMPLES,
            batch: Self::DEFAULT_BATCH,
            resolution: None,
            bias: None,
            policy: None,
            seed: None,
            config: None,
            output: None,
        };

        let mut iter = args.iter();
        while let Some(flag) = iter.next() {
            match flag.as_str() {
                "-h" | "--help" => return Err(BakeCliError::Help),
                "--mesh" => {
                    let value = next_value(&mut iter, flag)?;
                    mesh = Some(
                        PrimitiveType::parse(value)
                            .ok_or_else(|| BakeCliError::UnknownMesh(value.to_string()))?,
                    );
                }
                "--samples" => parsed.samples = parse_value(&mut iter, flag)?,
                "--batch" => {
                    parsed.batch = parse_value(&mut iter, flag)?;
                    if parsed.batch == 0 {
                        return Err(invalid(flag, "0"));
                    }
                }
                "--resolution" => parsed.resolution = Some(parse_value(&mut iter, flag)?),
                "--bias" => parsed.bias = Some(parse_value(&mut iter, flag)?),
                "--seed" => parsed.seed = Some(parse_value(&mut iter, flag)?),
                "--policy" => {
                    let value = next_value(&mut iter, flag)?;
                    parsed.policy =
                        Some(AccumulationPolicy::parse(value).ok_or_else(|| invalid(flag, value))?);
                }
                "--config" => parsed.config = Some(PathBuf::from(next_value(&mut iter, flag)?)),
                "--output" => parsed.output = Some(PathBuf::from(next_value(&mut iter, flag)?)),
                other => return Err(BakeCliError::UnknownFlag(other.to_string())),
            }
        }

        parsed.mesh = mesh.ok_or(BakeCliError::MissingMesh)?;
        Ok(parsed)
    }

    /// Config file (if any) with command line overrides applied, validated.
    pub fn resolve_config(&self) -> AoResult<AoConfig> {
        let mut config = match &self.config {
            Some(path) => AoConfig::from_json_file(path)?,
            None => AoConfig::default(),
        };
        if let Some(resolution) = self.resolution {
            config.resolution = resolution;
        }
        if let Some(bias) = self.bias {
            config.bias = bias;
        }
        if let Some(policy) = self.policy {
            config.policy = policy;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        config.validate()?;
        Ok(config)
    }
}

fn next_value<'a>(
    iter: &mut std::slice::Iter<'a, String>,
    flag: &str,
) -> Result<&'a str, BakeCliError> {
    iter.next()
        .map(String::as_str)
        .ok_or_else(|| BakeCliError::MissingValue(flag.to_string()))
}

fn parse_value<T: std::str::FromStr>(
    iter: &mut std::slice::Iter<'_, String>,
    flag: &str,
) -> Result<T, BakeCliError> {
    let value = next_value(iter, flag)?;
    value.parse().map_err(|_| invalid(flag, value))
}

fn invalid(flag: &str, value: &str) -> BakeCliError {
    BakeCliError::InvalidValue {
        flag: flag.to_string(),
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_minimal() {
        let parsed = BakeArgs::parse(&args(&["--mesh", "torus"])).unwrap();
        assert_eq!(parsed.mesh, PrimitiveType::Torus);
        assert_eq!(parsed.samples, BakeArgs::DEFAULT_SAMPLES);
        assert_eq!(parsed.batch, BakeArgs::DEFAULT_BATCH);
        assert!(parsed.output.is_none());
    }

    #[test]
    fn parse_all_flags() {
        let parsed = BakeArgs::parse(&args(&[
            "--mesh",
            "bowl",
            "--samples",
            "250",
            "--batch",
            "50",
            "--resolution",
            "256",
            "--bias",
            "0.02",
            "--policy",
            "unweighted",
            "--seed",
            "9",
            "--output",
            "ao.json",
        ]))
        .unwrap();
        assert_eq!(parsed.mesh, PrimitiveType::Bowl);
        assert_eq!(parsed.samples, 250);
        assert_eq!(parsed.batch, 50);
        assert_eq!(parsed.resolution, Some(256));
        assert_eq!(parsed.bias, Some(0.02));
        assert_eq!(parsed.policy, Some(AccumulationPolicy::Unweighted));
        assert_eq!(parsed.seed, Some(9));
        assert_eq!(parsed.output, Some(PathBuf::from("ao.json")));
    }

    #[test]
    fn reject_bad_input() {
        assert_eq!(BakeArgs::parse(&args(&[])), Err(BakeCliError::MissingMesh));
        assert_eq!(
            BakeArgs::parse(&args(&["--mesh", "teapot"])),
            Err(BakeCliError::UnknownMesh("teapot".into()))
        );
        assert_eq!(
            BakeArgs::parse(&args(&["--mesh", "box", "--samples"])),
            Err(BakeCliError::MissingValue("--samples".into()))
        );
        assert!(matches!(
            BakeArgs::parse(&args(&["--mesh", "box", "--bias", "lots"])),
            Err(BakeCliError::InvalidValue { .. })
        ));
        assert!(matches!(
            BakeArgs::parse(&args(&["--mesh", "box", "--batch", "0"])),
            Err(BakeCliError::InvalidValue { .. })
        ));
        assert_eq!(
            BakeArgs::parse(&args(&["--mesh", "box", "--fast"])),
            Err(BakeCliError::UnknownFlag("--fast".into()))
        );
    }

    #[test]
    fn overrides_apply_to_config() {
        let parsed = BakeArgs::parse(&args(&[
            "--mesh",
            "sphere",
            "--resolution",
            "128",
            "--policy",
            "normal",
        ]))
        .unwrap();
        let config = parsed.resolve_config().unwrap();
        assert_eq!(config.resolution, 128);
        assert_eq!(config.policy, AccumulationPolicy::NormalGated);
        assert_eq!(config.bias, AoConfig::default().bias);
    }

    #[test]
    fn invalid_override_fails_validation() {
        let parsed = BakeArgs::parse(&args(&["--mesh", "sphere", "--resolution", "0"])).unwrap();
        assert!(parsed.resolve_config().is_err());
    }
}
