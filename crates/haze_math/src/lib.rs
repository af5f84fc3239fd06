// Re-export glam for convenience
pub use glam::*;

// HAZE math types
mod sphere;
pub use sphere::{dir_to_equirect, equirect_solid_angle, equirect_to_dir, luminance};
