//! The per-frame parameter block consumed by the tracing kernel.

use bytemuck::{Pod, Zeroable};

use crate::camera::CameraSnapshot;

/// Per-frame scalars handed to the kernel as a single uniform block.
///
/// Field layout mirrors a 16-byte-aligned constant buffer: each vec3 is
/// padded by the scalar that follows it. `discard_history` is a u32 bool.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct FrameParams {
    pub eye: [f32; 3],
    pub max_trace_depth: u32,
    pub frustum_a: [f32; 3],
    pub output_width: u32,
    pub frustum_b: [f32; 3],
    pub output_height: u32,
    pub frustum_c: [f32; 3],
    pub discard_history: u32,
    pub frustum_d: [f32; 3],
    pub _pad: f32,
}

impl FrameParams {
    /// Assemble the block for one frame.
    ///
    /// `discard_history` must come from
    /// [`HistoryInvalidationPolicy::frame_flag`] so it is true for exactly
    /// the frame in which its trigger was observed.
    ///
    /// [`HistoryInvalidationPolicy::frame_flag`]:
    /// crate::invalidate::HistoryInvalidationPolicy::frame_flag
    pub fn new(
        camera: &CameraSnapshot,
        output_width: u32,
        output_height: u32,
        max_trace_depth: u32,
        discard_history: bool,
    ) -> Self {
        Self {
            eye: camera.eye.to_array(),
            max_trace_depth,
            frustum_a: camera.frustum_a.to_array(),
            output_width,
            frustum_b: camera.frustum_b.to_array(),
            output_height,
            frustum_c: camera.frustum_c.to_array(),
            discard_history: discard_history as u32,
            frustum_d: camera.frustum_d.to_array(),
            _pad: 0.0,
        }
    }
}
