//! wgpu resource layer: materializes the sampling structures and frame
//! buffers for the external compute kernel.
//!
//! The kernel itself (WGSL, pipeline, bind groups) stays outside this crate;
//! this module only creates and uploads what the core builds, once per
//! environment/volume change plus the per-frame ping-pong textures.

use anyhow::Result;
use wgpu::util::DeviceExt;
use wgpu::{Device, Queue};

use haze_core::{AlbedoGrid, AliasTable, DensityGrid, ProbabilityMap, RadianceMap};

use crate::frame::FrameBufferAllocator;

/// Kernel dispatch tile size in both axes.
pub const WORKGROUP_SIZE: u32 = 16;

/// Number of workgroups needed to cover `extent` pixels.
#[inline]
pub fn workgroup_count(extent: u32) -> u32 {
    (extent + WORKGROUP_SIZE - 1) / WORKGROUP_SIZE
}

/// Headless wgpu device and queue.
pub struct GpuContext {
    pub device: Device,
    pub queue: Queue,
}

impl GpuContext {
    /// Create a device without a surface (compute only).
    pub async fn new_headless() -> Result<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow::anyhow!("Failed to find suitable GPU adapter"))?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("HAZE Device"),
                    // Linear filtering of the float radiance panorama.
                    required_features: wgpu::Features::FLOAT32_FILTERABLE,
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        log::info!("Created headless device: {}", adapter.get_info().name);

        Ok(Self { device, queue })
    }

    /// Blocking convenience wrapper around [`Self::new_headless`].
    pub fn new_headless_blocking() -> Result<Self> {
        pollster::block_on(Self::new_headless())
    }
}

/// Environment-light resources, rebuilt once per environment change.
pub struct EnvironmentGpu {
    pub radiance_view: wgpu::TextureView,
    pub probability_view: wgpu::TextureView,
    pub alias_buffer: wgpu::Buffer,
    pub sampler: wgpu::Sampler,
    pub table_width: u32,
    pub table_height: u32,
    pub table_len: u32,
    _radiance_texture: wgpu::Texture,
    _probability_texture: wgpu::Texture,
}

impl EnvironmentGpu {
    /// Upload the radiance panorama, residual probability map and alias
    /// table. All three are bound read-only by the kernel.
    pub fn upload(
        device: &Device,
        queue: &Queue,
        envmap: &RadianceMap,
        probs: &ProbabilityMap,
        table: &AliasTable,
    ) -> Self {
        // RGB radiance padded to RGBA for a filterable texture format.
        let radiance_data: Vec<[f32; 4]> = envmap
            .texels()
            .iter()
            .map(|t| [t.x, t.y, t.z, 1.0])
            .collect();
        let radiance_texture = write_texture_2d(
            device,
            queue,
            "Envir Radiance",
            envmap.width(),
            envmap.height(),
            wgpu::TextureFormat::Rgba32Float,
            bytemuck::cast_slice(&radiance_data),
        );

        let probability_texture = write_texture_2d(
            device,
            queue,
            "Envir Alias Probs",
            probs.width(),
            probs.height(),
            wgpu::TextureFormat::R32Float,
            bytemuck::cast_slice(probs.values()),
        );

        let alias_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Envir Alias Table"),
            contents: bytemuck::cast_slice(table.entries()),
            usage: wgpu::BufferUsages::STORAGE,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Envir Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            radiance_view: radiance_texture.create_view(&Default::default()),
            probability_view: probability_texture.create_view(&Default::default()),
            alias_buffer,
            sampler,
            table_width: probs.width(),
            table_height: probs.height(),
            table_len: table.len() as u32,
            _radiance_texture: radiance_texture,
            _probability_texture: probability_texture,
        }
    }
}

/// Volume resources, rebuilt once per volume load.
pub struct VolumeGpu {
    pub density_view: wgpu::TextureView,
    pub albedo_view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    _density_texture: wgpu::Texture,
    _albedo_texture: wgpu::Texture,
}

impl VolumeGpu {
    /// Upload density and albedo grids as 3D textures.
    pub fn upload(
        device: &Device,
        queue: &Queue,
        density: &DensityGrid,
        albedo: &AlbedoGrid,
    ) -> Self {
        let density_texture = write_texture_3d(
            device,
            queue,
            "Volume Density",
            density.width,
            density.height,
            density.depth,
            wgpu::TextureFormat::R32Float,
            bytemuck::cast_slice(&density.voxels),
        );

        let albedo_data: Vec<[f32; 4]> = albedo
            .voxels
            .iter()
            .map(|v| [v.x, v.y, v.z, 1.0])
            .collect();
        let albedo_texture = write_texture_3d(
            device,
            queue,
            "Volume Albedo",
            albedo.width,
            albedo.height,
            albedo.depth,
            wgpu::TextureFormat::Rgba32Float,
            bytemuck::cast_slice(&albedo_data),
        );

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Volume Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            density_view: density_texture.create_view(&Default::default()),
            albedo_view: albedo_texture.create_view(&Default::default()),
            sampler,
            _density_texture: density_texture,
            _albedo_texture: albedo_texture,
        }
    }
}

/// A per-generation storage texture plus its view.
pub struct FrameTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

/// wgpu implementation of the frame-buffer allocator injected into the
/// temporal coordinator.
pub struct WgpuFrameAllocator<'a> {
    pub device: &'a Device,
    pub queue: &'a Queue,
}

impl FrameBufferAllocator for WgpuFrameAllocator<'_> {
    type Buffer = FrameTexture;

    fn radiance_buffer(&self, width: u32, height: u32) -> FrameTexture {
        // wgpu zero-initializes textures on first use, which is exactly the
        // semantically-invalid initial history the first-frame discard covers.
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Frame Radiance"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba32Float,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::STORAGE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&Default::default());
        FrameTexture { texture, view }
    }

    fn seed_buffer(&self, width: u32, height: u32, seeds: &[u32]) -> FrameTexture {
        let texture = write_texture_2d_with_usage(
            self.device,
            self.queue,
            "Frame Seeds",
            width,
            height,
            wgpu::TextureFormat::R32Uint,
            bytemuck::cast_slice(seeds),
            wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::STORAGE_BINDING,
        );
        let view = texture.create_view(&Default::default());
        FrameTexture { texture, view }
    }
}

/// Create a uniform buffer holding one Pod value.
pub fn uniform_buffer<T: bytemuck::Pod>(device: &Device, label: &str, value: &T) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::bytes_of(value),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

/// Overwrite a uniform buffer created by [`uniform_buffer`].
pub fn update_uniform<T: bytemuck::Pod>(queue: &Queue, buffer: &wgpu::Buffer, value: &T) {
    queue.write_buffer(buffer, 0, bytemuck::bytes_of(value));
}

fn write_texture_2d(
    device: &Device,
    queue: &Queue,
    label: &str,
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
    data: &[u8],
) -> wgpu::Texture {
    write_texture_2d_with_usage(
        device,
        queue,
        label,
        width,
        height,
        format,
        data,
        wgpu::TextureUsages::TEXTURE_BINDING,
    )
}

#[allow(clippy::too_many_arguments)]
fn write_texture_2d_with_usage(
    device: &Device,
    queue: &Queue,
    label: &str,
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
    data: &[u8],
    usage: wgpu::TextureUsages,
) -> wgpu::Texture {
    let size = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: usage | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    let bytes_per_texel = data.len() as u32 / (width * height);
    queue.write_texture(
        wgpu::ImageCopyTexture {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        data,
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(bytes_per_texel * width),
            rows_per_image: Some(height),
        },
        size,
    );

    texture
}

#[allow(clippy::too_many_arguments)]
fn write_texture_3d(
    device: &Device,
    queue: &Queue,
    label: &str,
    width: u32,
    height: u32,
    depth: u32,
    format: wgpu::TextureFormat,
    data: &[u8],
) -> wgpu::Texture {
    let size = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: depth,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D3,
        format,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    let bytes_per_texel = data.len() as u32 / (width * height * depth);
    queue.write_texture(
        wgpu::ImageCopyTexture {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        data,
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(bytes_per_texel * width),
            rows_per_image: Some(height),
        },
        size,
    );

    texture
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workgroup_count() {
        assert_eq!(workgroup_count(1), 1);
        assert_eq!(workgroup_count(16), 1);
        assert_eq!(workgroup_count(17), 2);
        assert_eq!(workgroup_count(640), 40);
        assert_eq!(workgroup_count(641), 41);
    }
}
