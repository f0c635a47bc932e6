//! Core engine modules
//!
//! Allocation accounting shared by every sampler.

pub mod resource_tracker;
