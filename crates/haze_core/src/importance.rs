//! Importance-map construction over an environment radiance map.
//!
//! Downsamples the panorama to a working resolution, weights each cell by the
//! solid angle it subtends on the unit sphere, and normalizes the result into
//! a discrete PMF. The PMF feeds the alias table so the tracing kernel can
//! sample light directions proportional to radiance x solid angle.

use haze_math::{equirect_solid_angle, luminance};
use rayon::prelude::*;

use crate::envmap::RadianceMap;

/// Threshold below which the map is considered black and left unnormalized.
const MIN_TOTAL_LUMINANCE: f32 = 0.001;

/// A discrete PMF over the cells of a downsampled environment map.
///
/// Row-major, same orientation as the source `RadianceMap`. When the total
/// weighted luminance exceeds a near-zero threshold the values sum to 1;
/// otherwise the map is degenerate (near-black environment) and the raw
/// weighted values are kept so downstream construction still works.
#[derive(Clone, Debug)]
pub struct ProbabilityMap {
    width: u32,
    height: u32,
    values: Vec<f32>,
}

impl ProbabilityMap {
    /// Build the probability map at the given target resolution.
    ///
    /// Panics if the target resolution is zero-area or exceeds the source
    /// resolution in either axis (caller contract).
    pub fn build(envmap: &RadianceMap, target_width: u32, target_height: u32) -> Self {
        assert!(
            target_width > 0 && target_height > 0,
            "target resolution must be non-zero"
        );
        assert!(
            target_width <= envmap.width() && target_height <= envmap.height(),
            "target resolution must not exceed the source"
        );

        let width = envmap.width() as i32;
        let height = envmap.height() as i32;

        // Rows are independent; each produces its cell weights plus a partial
        // sum. The partials are reduced in row order afterwards so the total
        // does not depend on worker scheduling.
        let rows: Vec<(Vec<f32>, f32)> = (0..target_height)
            .into_par_iter()
            .map(|y| {
                let y0 = y as f32 / target_height as f32;
                let y1 = (y + 1) as f32 / target_height as f32;

                let y_src_beg = ((y0 * height as f32).floor() as i32 - 1).max(0);
                let y_src_end = ((y1 * height as f32).floor() as i32 + 1).min(height - 1);

                let mut cells = Vec::with_capacity(target_width as usize);
                let mut row_sum = 0.0f32;

                for x in 0..target_width {
                    let x0 = x as f32 / target_width as f32;
                    let x1 = (x + 1) as f32 / target_width as f32;

                    let x_src_beg = ((x0 * width as f32).floor() as i32 - 1).max(0);
                    let x_src_end = ((x1 * width as f32).floor() as i32 + 1).min(width - 1);

                    // Box-filter the padded source window at texel centers.
                    // The one-texel padding avoids seams from rounding at
                    // cell boundaries.
                    let mut cell_lum = 0.0f32;
                    for y_src in y_src_beg..=y_src_end {
                        let v = (y_src as f32 + 0.5) / height as f32;
                        for x_src in x_src_beg..=x_src_end {
                            let u = (x_src as f32 + 0.5) / width as f32;
                            cell_lum += luminance(envmap.sample_bilinear(u, v));
                        }
                    }

                    let weighted = cell_lum * equirect_solid_angle(x0, x1, y0, y1);
                    cells.push(weighted);
                    row_sum += weighted;
                }

                (cells, row_sum)
            })
            .collect();

        let total: f32 = rows.iter().map(|(_, sum)| sum).sum();

        let mut values = Vec::with_capacity((target_width * target_height) as usize);
        for (cells, _) in rows {
            values.extend(cells);
        }

        if total > MIN_TOTAL_LUMINANCE {
            let ratio = 1.0 / total;
            for v in &mut values {
                *v *= ratio;
            }
        } else {
            log::debug!("Near-black environment (total {total}); leaving PMF unnormalized");
        }

        Self {
            width: target_width,
            height: target_height,
            values,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Cell values, row-major from the top-left.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Value at integer cell coordinates.
    pub fn value(&self, x: u32, y: u32) -> f32 {
        self.values[(y * self.width + x) as usize]
    }

    /// Sum over all cells (1.0 for a normalized map).
    pub fn sum(&self) -> f32 {
        self.values.iter().sum()
    }
}
