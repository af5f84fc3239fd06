//! Double-buffered accumulation state and its per-frame rotation.
//!
//! The coordinator owns two generations of (radiance, seed) buffers. Each
//! frame one generation is the read-only history and the other the write
//! target; completing a frame swaps the roles. The swap is metadata only: a
//! single-bit selector flips, no data moves and nothing is reallocated.

use crate::invalidate::HistoryInvalidationPolicy;

/// Allocates the GPU-resident buffers a generation is made of.
///
/// Injected into the coordinator so frame rotation stays testable without a
/// graphics context. The wgpu implementation lives in [`crate::gpu`].
pub trait FrameBufferAllocator {
    type Buffer;

    /// Allocate a zeroed per-pixel radiance accumulation buffer.
    fn radiance_buffer(&self, width: u32, height: u32) -> Self::Buffer;

    /// Allocate a per-pixel RNG state buffer initialized with `seeds`.
    fn seed_buffer(&self, width: u32, height: u32, seeds: &[u32]) -> Self::Buffer;
}

/// The deterministic per-pixel seed sequence written at allocation time.
///
/// Sequential ids, not random: RNG streams stay stable across the ping-pong
/// and are only perturbed by the kernel itself.
pub fn initial_seeds(width: u32, height: u32) -> Vec<u32> {
    (1..=width * height).collect()
}

/// One ping-pong copy of the accumulation state.
pub struct FrameGeneration<B> {
    pub radiance: B,
    pub seeds: B,
}

/// Owns both generations and rotates their roles once per completed frame.
///
/// Queried and rotated by the frame driver under a single-frame-at-a-time
/// discipline; the driver must also guarantee the dispatch reading
/// `previous` and writing `current` has completed before the next frame
/// observes the swap.
pub struct TemporalFrameCoordinator<B> {
    generations: [FrameGeneration<B>; 2],
    current: usize,
    width: u32,
    height: u32,
}

impl<B> TemporalFrameCoordinator<B> {
    /// Allocate both generations at the given resolution.
    ///
    /// The initial history contents are semantically invalid; the first
    /// frame's discard flag (raised by the invalidation policy) tells the
    /// kernel to ignore them.
    pub fn new<A>(alloc: &A, width: u32, height: u32) -> Self
    where
        A: FrameBufferAllocator<Buffer = B>,
    {
        assert!(width > 0 && height > 0, "resolution must be non-zero");
        Self {
            generations: [
                Self::allocate_generation(alloc, width, height),
                Self::allocate_generation(alloc, width, height),
            ],
            current: 0,
            width,
            height,
        }
    }

    fn allocate_generation<A>(alloc: &A, width: u32, height: u32) -> FrameGeneration<B>
    where
        A: FrameBufferAllocator<Buffer = B>,
    {
        let seeds = initial_seeds(width, height);
        FrameGeneration {
            radiance: alloc.radiance_buffer(width, height),
            seeds: alloc.seed_buffer(width, height, &seeds),
        }
    }

    /// The generation written this frame by the kernel.
    pub fn current(&self) -> &FrameGeneration<B> {
        &self.generations[self.current]
    }

    /// The read-only history generation (last frame's `current`).
    pub fn previous(&self) -> &FrameGeneration<B> {
        &self.generations[self.current ^ 1]
    }

    /// Swap generation roles. Call once per completed frame, after the
    /// kernel dispatch for this frame is known to have finished.
    pub fn rotate(&mut self) {
        self.current ^= 1;
    }

    /// Reallocate both generations at a new resolution and reseed them.
    ///
    /// Any prior history is invalid afterwards, so the invalidation policy
    /// is told to discard on the next frame. Only call between frames, never
    /// while a dispatch targeting the old resolution is outstanding.
    pub fn resize<A>(
        &mut self,
        alloc: &A,
        width: u32,
        height: u32,
        policy: &mut HistoryInvalidationPolicy,
    ) where
        A: FrameBufferAllocator<Buffer = B>,
    {
        assert!(width > 0 && height > 0, "resolution must be non-zero");
        log::debug!(
            "Resizing frame buffers {}x{} -> {}x{}",
            self.width,
            self.height,
            width,
            height
        );

        self.generations = [
            Self::allocate_generation(alloc, width, height),
            Self::allocate_generation(alloc, width, height),
        ];
        self.current = 0;
        self.width = width;
        self.height = height;

        policy.request_discard();
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraSnapshot;
    use haze_math::Vec3;
    use std::cell::Cell;

    /// Allocator handing out identity-tagged vectors, so tests can tell
    /// whether a buffer was reallocated.
    struct TestAllocator {
        next_id: Cell<u32>,
    }

    struct TestBuffer {
        id: u32,
        width: u32,
        height: u32,
        seeds: Option<Vec<u32>>,
    }

    impl TestAllocator {
        fn new() -> Self {
            Self { next_id: Cell::new(0) }
        }

        fn make(&self, width: u32, height: u32, seeds: Option<Vec<u32>>) -> TestBuffer {
            let id = self.next_id.get();
            self.next_id.set(id + 1);
            TestBuffer { id, width, height, seeds }
        }
    }

    impl FrameBufferAllocator for TestAllocator {
        type Buffer = TestBuffer;

        fn radiance_buffer(&self, width: u32, height: u32) -> TestBuffer {
            self.make(width, height, None)
        }

        fn seed_buffer(&self, width: u32, height: u32, seeds: &[u32]) -> TestBuffer {
            self.make(width, height, Some(seeds.to_vec()))
        }
    }

    fn still_camera() -> CameraSnapshot {
        CameraSnapshot {
            eye: Vec3::ZERO,
            frustum_a: Vec3::X,
            frustum_b: Vec3::Y,
            frustum_c: Vec3::Z,
            frustum_d: Vec3::ONE,
        }
    }

    #[test]
    fn test_initial_seeds_are_sequential() {
        assert_eq!(initial_seeds(2, 2), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_rotation_parity() {
        let alloc = TestAllocator::new();
        let mut coord = TemporalFrameCoordinator::new(&alloc, 4, 4);

        let first_current = coord.current().radiance.id;
        let first_previous = coord.previous().radiance.id;
        assert_ne!(first_current, first_previous);

        for n in 1..=5 {
            coord.rotate();
            let expect_current = if n % 2 == 0 { first_current } else { first_previous };
            assert_eq!(coord.current().radiance.id, expect_current, "frame {n}");
        }
    }

    #[test]
    fn test_rotation_preserves_buffer_identity() {
        let alloc = TestAllocator::new();
        let mut coord = TemporalFrameCoordinator::new(&alloc, 8, 8);
        let ids_before: Vec<u32> = vec![
            coord.current().radiance.id,
            coord.current().seeds.id,
            coord.previous().radiance.id,
            coord.previous().seeds.id,
        ];

        coord.rotate();
        coord.rotate();

        let ids_after: Vec<u32> = vec![
            coord.current().radiance.id,
            coord.current().seeds.id,
            coord.previous().radiance.id,
            coord.previous().seeds.id,
        ];
        assert_eq!(ids_before, ids_after);
    }

    #[test]
    fn test_seed_buffers_get_sequential_ids() {
        let alloc = TestAllocator::new();
        let coord = TemporalFrameCoordinator::new(&alloc, 2, 3);
        let seeds = coord.current().seeds.seeds.as_ref().unwrap();
        assert_eq!(*seeds, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_resize_reallocates_and_requests_discard() {
        let alloc = TestAllocator::new();
        let mut policy = HistoryInvalidationPolicy::new();
        let mut coord = TemporalFrameCoordinator::new(&alloc, 640, 480);

        // Settle the policy so only the resize can trigger a discard.
        policy.frame_flag(&still_camera());
        assert!(!policy.frame_flag(&still_camera()));

        let old_id = coord.current().radiance.id;
        coord.resize(&alloc, 1280, 720, &mut policy);

        assert_eq!((coord.width(), coord.height()), (1280, 720));
        assert_ne!(coord.current().radiance.id, old_id);
        assert_eq!(coord.current().radiance.width, 1280);
        assert_eq!(coord.current().radiance.height, 720);

        // Discard fires on the immediately following frame, then clears.
        assert!(policy.frame_flag(&still_camera()));
        assert!(!policy.frame_flag(&still_camera()));
    }
}
