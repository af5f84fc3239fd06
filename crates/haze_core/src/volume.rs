//! Volumetric grid loading and the per-frame volume parameter block.
//!
//! Grids are stored as plain text: a `width height depth` header followed by
//! `width * height * depth` whitespace-separated values, one scalar per voxel
//! for density or an RGB triple per voxel for albedo.

use std::fs;
use std::num::ParseFloatError;
use std::path::Path;

use bytemuck::{Pod, Zeroable};
use haze_math::Vec3;
use thiserror::Error;

/// Floor applied to the maximum density before inversion, guarding against
/// division blow-up for near-empty media.
const MIN_MAX_DENSITY: f32 = 0.001;

/// Cap on the up-front voxel reservation. A header promising more voxels
/// than the file holds fails at the first missing token, so growing past
/// this point is the rare legitimate-huge-grid case.
const MAX_VOXEL_PREALLOC: usize = 1 << 20;

/// Errors that can occur while loading a volume grid.
#[derive(Error, Debug)]
pub enum VolumeError {
    #[error("Failed to open volume file {path}: {source}")]
    Load {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed volume file {path}: {detail}")]
    Parse { path: String, detail: String },
}

pub type VolumeResult<T> = Result<T, VolumeError>;

/// Scalar density grid with its observed maximum voxel value.
#[derive(Clone, Debug)]
pub struct DensityGrid {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub voxels: Vec<f32>,
    pub max_density: f32,
}

impl DensityGrid {
    /// Load a density grid from a plain-text file.
    ///
    /// On failure the error carries the file path and nothing else changes,
    /// so a previously loaded grid stays usable.
    pub fn load(path: impl AsRef<Path>) -> VolumeResult<Self> {
        let path = path.as_ref();
        let path_str = path.to_string_lossy().to_string();
        let text = fs::read_to_string(path).map_err(|source| VolumeError::Load {
            path: path_str.clone(),
            source,
        })?;

        let mut tokens = text.split_whitespace();
        let (width, height, depth) = parse_header(&mut tokens, &path_str)?;
        let voxel_count = checked_voxel_count(width, height, depth, &path_str)?;

        let mut voxels = Vec::with_capacity(voxel_count.min(MAX_VOXEL_PREALLOC));
        let mut max_density = 0.0f32;
        for i in 0..voxel_count {
            let value = next_float(&mut tokens, &path_str, i, voxel_count)?;
            max_density = max_density.max(value);
            voxels.push(value);
        }

        log::info!(
            "Loaded density grid {} ({}x{}x{}, max density {:.4})",
            path_str,
            width,
            height,
            depth,
            max_density
        );

        Ok(Self {
            width,
            height,
            depth,
            voxels,
            max_density,
        })
    }
}

/// RGB albedo grid, one triple per voxel.
#[derive(Clone, Debug)]
pub struct AlbedoGrid {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub voxels: Vec<Vec3>,
}

impl AlbedoGrid {
    /// Load an albedo grid from a plain-text file.
    pub fn load(path: impl AsRef<Path>) -> VolumeResult<Self> {
        let path = path.as_ref();
        let path_str = path.to_string_lossy().to_string();
        let text = fs::read_to_string(path).map_err(|source| VolumeError::Load {
            path: path_str.clone(),
            source,
        })?;

        let mut tokens = text.split_whitespace();
        let (width, height, depth) = parse_header(&mut tokens, &path_str)?;
        let voxel_count = checked_voxel_count(width, height, depth, &path_str)?;

        let mut voxels = Vec::with_capacity(voxel_count.min(MAX_VOXEL_PREALLOC));
        for i in 0..voxel_count {
            let r = next_float(&mut tokens, &path_str, i, voxel_count)?;
            let g = next_float(&mut tokens, &path_str, i, voxel_count)?;
            let b = next_float(&mut tokens, &path_str, i, voxel_count)?;
            voxels.push(Vec3::new(r, g, b));
        }

        log::info!(
            "Loaded albedo grid {} ({}x{}x{})",
            path_str,
            width,
            height,
            depth
        );

        Ok(Self {
            width,
            height,
            depth,
            voxels,
        })
    }
}

fn parse_header<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    path: &str,
) -> VolumeResult<(u32, u32, u32)> {
    let mut dim = |name: &str| -> VolumeResult<u32> {
        let token = tokens.next().ok_or_else(|| VolumeError::Parse {
            path: path.to_string(),
            detail: format!("missing {name} in header"),
        })?;
        let value: u32 = token.parse().map_err(|_| VolumeError::Parse {
            path: path.to_string(),
            detail: format!("invalid {name} {token:?}"),
        })?;
        if value == 0 {
            return Err(VolumeError::Parse {
                path: path.to_string(),
                detail: format!("{name} must be positive"),
            });
        }
        Ok(value)
    };
    Ok((dim("width")?, dim("height")?, dim("depth")?))
}

/// Voxel count from untrusted header values, without overflow panics.
fn checked_voxel_count(width: u32, height: u32, depth: u32, path: &str) -> VolumeResult<usize> {
    (width as u64)
        .checked_mul(height as u64)
        .and_then(|n| n.checked_mul(depth as u64))
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| VolumeError::Parse {
            path: path.to_string(),
            detail: format!("voxel count {width}x{height}x{depth} overflows"),
        })
}

fn next_float<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    path: &str,
    voxel: usize,
    voxel_count: usize,
) -> VolumeResult<f32> {
    let token = tokens.next().ok_or_else(|| VolumeError::Parse {
        path: path.to_string(),
        detail: format!("expected {voxel_count} voxels, data ends at voxel {voxel}"),
    })?;
    token
        .parse()
        .map_err(|e: ParseFloatError| VolumeError::Parse {
            path: path.to_string(),
            detail: format!("voxel {voxel}: {e}"),
        })
}

/// GPU uniform block of derived volume coefficients.
///
/// Field layout mirrors a 16-byte-aligned constant buffer; keep the vec3/pad
/// interleaving intact.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct VolumeParams {
    pub lower: [f32; 3],
    pub max_density: f32,
    pub upper: [f32; 3],
    pub inv_density: f32,
    pub inv_extent: [f32; 3],
    pub phase_g: f32,
    pub density_scale: f32,
    pub phase_g2: f32,
    pub _pad: [f32; 2],
}

/// User-facing volume state and the derivation of the kernel's coefficients.
///
/// Derived values are recomputed on every [`params`](Self::params) call from
/// the current inputs; they are cheap enough that caching would only add
/// staleness risk.
#[derive(Clone, Debug)]
pub struct VolumeParameterStore {
    lower: Vec3,
    upper: Vec3,
    density_scale: f32,
    phase_g: f32,
    raw_max_density: f32,
}

impl VolumeParameterStore {
    pub fn new() -> Self {
        Self {
            lower: Vec3::splat(-1.0),
            upper: Vec3::splat(1.0),
            density_scale: 1.0,
            phase_g: 0.0,
            raw_max_density: 0.0,
        }
    }

    /// Set the world-space bounding box of the medium.
    pub fn set_bounding_box(&mut self, lower: Vec3, upper: Vec3) {
        self.lower = lower;
        self.upper = upper;
    }

    /// Set the user-controlled density multiplier.
    pub fn set_density_scale(&mut self, scale: f32) {
        self.density_scale = scale;
    }

    /// Set the Henyey-Greenstein phase asymmetry parameter.
    pub fn set_phase_g(&mut self, g: f32) {
        self.phase_g = g;
    }

    /// Record the maximum voxel value observed in the loaded density grid.
    pub fn set_raw_max_density(&mut self, raw_max: f32) {
        self.raw_max_density = raw_max;
    }

    pub fn density_scale(&self) -> f32 {
        self.density_scale
    }

    pub fn phase_g(&self) -> f32 {
        self.phase_g
    }

    /// Derive the kernel's coefficient block from the current inputs.
    pub fn params(&self) -> VolumeParams {
        let max_density = self.raw_max_density * self.density_scale;
        let inv_density = 1.0 / max_density.max(MIN_MAX_DENSITY);
        let inv_extent = Vec3::ONE / (self.upper - self.lower);

        VolumeParams {
            lower: self.lower.to_array(),
            max_density,
            upper: self.upper.to_array(),
            inv_density,
            inv_extent: inv_extent.to_array(),
            phase_g: self.phase_g,
            density_scale: self.density_scale,
            phase_g2: self.phase_g * self.phase_g,
            _pad: [0.0; 2],
        }
    }
}

impl Default for VolumeParameterStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_density_grid() {
        let path = write_temp("haze_density_ok.txt", "2 2 1\n0.0 0.5\n1.5 0.25\n");
        let grid = DensityGrid::load(&path).unwrap();
        assert_eq!((grid.width, grid.height, grid.depth), (2, 2, 1));
        assert_eq!(grid.voxels, vec![0.0, 0.5, 1.5, 0.25]);
        assert_eq!(grid.max_density, 1.5);
    }

    #[test]
    fn test_load_albedo_grid() {
        let path = write_temp("haze_albedo_ok.txt", "1 1 2\n1 0 0\n0 0.5 1\n");
        let grid = AlbedoGrid::load(&path).unwrap();
        assert_eq!(grid.voxels.len(), 2);
        assert_eq!(grid.voxels[1], Vec3::new(0.0, 0.5, 1.0));
    }

    #[test]
    fn test_short_file_is_parse_error() {
        let path = write_temp("haze_density_short.txt", "2 2 2\n0.0 0.5\n");
        match DensityGrid::load(&path) {
            Err(VolumeError::Parse { path, detail }) => {
                assert!(path.contains("haze_density_short"));
                assert!(detail.contains("voxel"), "detail: {detail}");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_huge_header_is_parse_error() {
        // 70000^3 overflows 32-bit arithmetic; the loader must surface a
        // parse error for the missing voxels, not panic on the header math.
        let path = write_temp("haze_density_huge.txt", "70000 70000 70000\n0.0 0.5\n");
        assert!(matches!(
            DensityGrid::load(&path),
            Err(VolumeError::Parse { .. })
        ));
    }

    #[test]
    fn test_header_overflow_is_parse_error() {
        let path = write_temp(
            "haze_density_overflow.txt",
            "4294967295 4294967295 4294967295\n",
        );
        match DensityGrid::load(&path) {
            Err(VolumeError::Parse { detail, .. }) => {
                assert!(detail.contains("overflow"), "detail: {detail}");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_file_carries_path() {
        match DensityGrid::load("no/such/density.txt") {
            Err(VolumeError::Load { path, .. }) => assert!(path.contains("density.txt")),
            other => panic!("expected load error, got {other:?}"),
        }
    }

    #[test]
    fn test_derived_params() {
        let mut store = VolumeParameterStore::new();
        store.set_bounding_box(Vec3::splat(-2.0), Vec3::splat(2.0));
        store.set_density_scale(10.0);
        store.set_phase_g(0.5);
        store.set_raw_max_density(0.8);

        let params = store.params();
        assert_eq!(params.max_density, 8.0);
        assert_eq!(params.inv_density, 1.0 / 8.0);
        assert_eq!(params.inv_extent, [0.25; 3]);
        assert_eq!(params.phase_g2, 0.25);
    }

    #[test]
    fn test_inv_density_floor() {
        let mut store = VolumeParameterStore::new();
        store.set_raw_max_density(0.0);
        let params = store.params();
        assert_eq!(params.inv_density, 1.0 / MIN_MAX_DENSITY);
    }

    #[test]
    fn test_params_track_current_inputs() {
        let mut store = VolumeParameterStore::new();
        store.set_raw_max_density(1.0);
        store.set_density_scale(2.0);
        assert_eq!(store.params().max_density, 2.0);
        store.set_density_scale(3.0);
        assert_eq!(store.params().max_density, 3.0);
    }
}
