//! Environment (panoramic) radiance map loading and sampling.
//!
//! A `RadianceMap` is an equirectangular panorama in linear RGB: rows map to
//! latitude, columns to longitude, origin at the top-left. It is loaded once
//! per environment change and is immutable afterwards.

use std::path::Path;

use bytemuck::{Pod, Zeroable};
use haze_math::Vec3;
use thiserror::Error;

use crate::alias::AliasTable;
use crate::importance::ProbabilityMap;

/// Errors that can occur while loading an environment map.
#[derive(Error, Debug)]
pub enum EnvmapError {
    #[error("Failed to load environment map {path}: {source}")]
    Load {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Environment map {path} has zero size")]
    Empty { path: String },
}

pub type EnvmapResult<T> = Result<T, EnvmapError>;

/// An equirectangular radiance panorama in linear RGB.
#[derive(Clone, Debug)]
pub struct RadianceMap {
    width: u32,
    height: u32,
    texels: Vec<Vec3>,
}

impl RadianceMap {
    /// Create a radiance map from raw texels (row-major, top-left origin).
    ///
    /// Panics if `texels.len() != width * height` or either dimension is zero.
    pub fn from_texels(width: u32, height: u32, texels: Vec<Vec3>) -> Self {
        assert!(width > 0 && height > 0, "radiance map must be non-empty");
        assert_eq!(
            texels.len(),
            (width * height) as usize,
            "texel count must match dimensions"
        );
        Self {
            width,
            height,
            texels,
        }
    }

    /// Load a radiance map from an HDR (or any `image`-decodable) file.
    ///
    /// On failure the error carries the file path; nothing else is touched,
    /// so a previously loaded environment stays usable.
    pub fn load(path: impl AsRef<Path>) -> EnvmapResult<Self> {
        let path = path.as_ref();
        let path_str = path.to_string_lossy().to_string();

        let img = image::open(path).map_err(|source| EnvmapError::Load {
            path: path_str.clone(),
            source,
        })?;

        let rgb = img.to_rgb32f();
        let (width, height) = rgb.dimensions();
        if width == 0 || height == 0 {
            return Err(EnvmapError::Empty { path: path_str });
        }

        let texels: Vec<Vec3> = rgb
            .pixels()
            .map(|p| Vec3::new(p[0], p[1], p[2]))
            .collect();

        log::info!("Loaded environment map {} ({}x{})", path_str, width, height);

        Ok(Self::from_texels(width, height, texels))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw texels, row-major from the top-left.
    pub fn texels(&self) -> &[Vec3] {
        &self.texels
    }

    /// Get the texel at integer coordinates.
    ///
    /// X wraps around the longitude seam; Y clamps at the poles.
    pub fn texel(&self, x: i32, y: i32) -> Vec3 {
        let x = x.rem_euclid(self.width as i32) as u32;
        let y = y.clamp(0, self.height as i32 - 1) as u32;
        self.texels[(y * self.width + x) as usize]
    }

    /// Sample the map at UV coordinates with bilinear filtering.
    ///
    /// UVs are in [0, 1]; texel centers sit at (x + 0.5) / width.
    pub fn sample_bilinear(&self, u: f32, v: f32) -> Vec3 {
        let x = u * self.width as f32 - 0.5;
        let y = v * self.height as f32 - 0.5;

        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;

        let x0 = x0 as i32;
        let y0 = y0 as i32;

        let p00 = self.texel(x0, y0);
        let p10 = self.texel(x0 + 1, y0);
        let p01 = self.texel(x0, y0 + 1);
        let p11 = self.texel(x0 + 1, y0 + 1);

        let top = p00 * (1.0 - fx) + p10 * fx;
        let bottom = p01 * (1.0 - fx) + p11 * fx;
        top * (1.0 - fy) + bottom * fy
    }
}

/// GPU uniform block describing the environment light.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct EnvironmentLightParams {
    pub intensity: f32,
    pub table_width: u32,
    pub table_height: u32,
    pub table_len: u32,
}

/// User-facing environment-light state.
///
/// Holds the radiance multiplier and assembles the kernel's light block from
/// the built sampling structures.
#[derive(Clone, Debug)]
pub struct EnvironmentParameterStore {
    intensity: f32,
}

impl EnvironmentParameterStore {
    pub fn new() -> Self {
        Self { intensity: 1.0 }
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    /// Set the radiance multiplier.
    ///
    /// Returns true when the value actually changed: intensity scales the
    /// rendering integrand, so the driver must request a history discard on
    /// change.
    pub fn set_intensity(&mut self, intensity: f32) -> bool {
        let changed = self.intensity != intensity;
        self.intensity = intensity;
        changed
    }

    /// Assemble the light block for the current intensity and tables.
    pub fn params(&self, probs: &ProbabilityMap, table: &AliasTable) -> EnvironmentLightParams {
        EnvironmentLightParams {
            intensity: self.intensity,
            table_width: probs.width(),
            table_height: probs.height(),
            table_len: table.len() as u32,
        }
    }
}

impl Default for EnvironmentParameterStore {
    fn default() -> Self {
        Self::new()
    }
}
