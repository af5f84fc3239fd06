//! Build an importance-sampling table for a procedural sky.
//!
//! Run with: cargo run -p haze_core --example build_sky_table

use haze_core::{AliasTable, ProbabilityMap, RadianceMap};
use haze_math::{equirect_to_dir, Vec3};

fn main() {
    env_logger::init();

    // Procedural sky: a bright sun disc over a dim blue gradient.
    let (width, height) = (512u32, 256u32);
    let sun_dir = equirect_to_dir(0.25, 0.3);

    let mut texels = Vec::with_capacity((width * height) as usize);
    for y in 0..height {
        for x in 0..width {
            let u = (x as f32 + 0.5) / width as f32;
            let v = (y as f32 + 0.5) / height as f32;
            let dir = equirect_to_dir(u, v);

            let sky = Vec3::new(0.2, 0.3, 0.5) * (1.0 - v * 0.5);
            let sun = if dir.dot(sun_dir) > 0.999 {
                Vec3::splat(500.0)
            } else {
                Vec3::ZERO
            };
            texels.push(sky + sun);
        }
    }
    let envmap = RadianceMap::from_texels(width, height, texels);

    let probs = ProbabilityMap::build(&envmap, 200, 200);
    println!(
        "Probability map: {}x{}, sum {:.6}",
        probs.width(),
        probs.height(),
        probs.sum()
    );

    let table = AliasTable::build(probs.values());
    let brightest = (0..table.len())
        .max_by(|&a, &b| {
            table
                .probability(a)
                .partial_cmp(&table.probability(b))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .unwrap_or(0);
    println!(
        "Alias table: {} entries; most probable cell {} (p = {:.4})",
        table.len(),
        brightest,
        table.probability(brightest)
    );
}
