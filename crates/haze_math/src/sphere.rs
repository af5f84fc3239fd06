//! Spherical helpers for equirectangular (longitude/latitude) environment maps.
//!
//! Conventions: u in [0, 1] maps to longitude (0 to 2π around +Y), v in [0, 1]
//! maps to latitude from the top pole (v = 0 is +Y, v = 1 is -Y). Matches the
//! row-major, origin-top-left layout of a loaded panorama.

use glam::{Vec2, Vec3};
use std::f32::consts::{PI, TAU};

/// Rec.709 perceptual luminance of a linear RGB value.
#[inline]
pub fn luminance(rgb: Vec3) -> f32 {
    0.2126 * rgb.x + 0.7152 * rgb.y + 0.0722 * rgb.z
}

/// Solid angle subtended by the cell [x0, x1] x [y0, y1] on the unit sphere,
/// with coordinates given as fractions of the full equirect domain.
///
/// A full-domain cell (0..1 in both axes) yields 4π.
#[inline]
pub fn equirect_solid_angle(x0: f32, x1: f32, y0: f32, y1: f32) -> f32 {
    (TAU * (x1 - x0) * ((PI * y1).cos() - (PI * y0).cos())).abs()
}

/// Convert equirect UV coordinates to a unit direction.
pub fn equirect_to_dir(u: f32, v: f32) -> Vec3 {
    let phi = TAU * u;
    let theta = PI * v;
    let sin_theta = theta.sin();
    Vec3::new(sin_theta * phi.cos(), theta.cos(), sin_theta * phi.sin())
}

/// Convert a direction (need not be normalized) to equirect UV coordinates.
pub fn dir_to_equirect(dir: Vec3) -> Vec2 {
    let d = dir.normalize();
    let phi = d.z.atan2(d.x).rem_euclid(TAU);
    let theta = d.y.clamp(-1.0, 1.0).acos();
    Vec2::new(phi / TAU, theta / PI)
}
