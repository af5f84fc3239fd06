//! HAZE Render - per-frame coordination for the volumetric path tracer.
//!
//! The tracer converges by accumulating noisy radiance estimates across
//! frames. This crate owns the pieces that make that reuse sound:
//!
//! - **Temporal ping-pong**: `TemporalFrameCoordinator` rotates two
//!   generations of (radiance, seed) buffers, exposing one as read-only
//!   history and one as the write target
//! - **History invalidation**: `HistoryInvalidationPolicy` raises the
//!   per-frame discard flag when the camera moves or a scene parameter
//!   changes
//! - **Frame parameters**: `FrameParams`, the uniform block the kernel
//!   consumes once per frame
//! - **GPU plumbing**: headless device setup and resource upload in `gpu`
//!
//! The per-frame sequence the driver follows:
//!
//! ```ignore
//! let discard = policy.frame_flag(&camera.snapshot());
//! let params = FrameParams::new(&camera.snapshot(), w, h, max_depth, discard);
//! // kernel reads coordinator.previous(), writes coordinator.current()
//! coordinator.rotate();
//! ```

pub mod camera;
pub mod frame;
pub mod gpu;
pub mod invalidate;
pub mod params;

// Re-export commonly used types
pub use camera::{Camera, CameraSnapshot, FrustumDirections};
pub use frame::{initial_seeds, FrameBufferAllocator, FrameGeneration, TemporalFrameCoordinator};
pub use gpu::{
    workgroup_count, EnvironmentGpu, FrameTexture, GpuContext, VolumeGpu, WgpuFrameAllocator,
    WORKGROUP_SIZE,
};
pub use invalidate::HistoryInvalidationPolicy;
pub use params::FrameParams;
