//! Command line front end for offline occlusion bakes.

pub mod args;
pub mod bake;
