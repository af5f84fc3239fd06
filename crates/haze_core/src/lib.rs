//! HAZE Core - sampling structures and volume assets for the tracer.
//!
//! This crate provides:
//!
//! - **Environment maps**: `RadianceMap` loading and bilinear sampling
//! - **Light importance sampling**: `ProbabilityMap` and `AliasTable`,
//!   consumed by the GPU tracing kernel for O(1) environment sampling
//! - **Volume assets**: `DensityGrid`/`AlbedoGrid` loading and the per-frame
//!   `VolumeParameterStore`
//!
//! # Example
//!
//! ```ignore
//! use haze_core::{AliasTable, ProbabilityMap, RadianceMap};
//!
//! let envmap = RadianceMap::load("sky.hdr")?;
//! let probs = ProbabilityMap::build(&envmap, 200, 200);
//! let table = AliasTable::build(probs.values());
//! ```

pub mod alias;
pub mod envmap;
pub mod importance;
pub mod volume;

// Re-export commonly used types
pub use alias::{AliasEntry, AliasTable};
pub use envmap::{EnvironmentLightParams, EnvironmentParameterStore, EnvmapError, RadianceMap};
pub use importance::ProbabilityMap;
pub use volume::{AlbedoGrid, DensityGrid, VolumeError, VolumeParameterStore, VolumeParams};
