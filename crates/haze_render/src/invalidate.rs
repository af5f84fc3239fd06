//! Once-per-frame decision on whether accumulated history must be discarded.

use crate::camera::CameraSnapshot;

/// Decides the per-frame discard flag from explicit requests and camera
/// movement.
///
/// The flag is the logical OR of every trigger observed since the previous
/// frame and is consumed by exactly one [`frame_flag`](Self::frame_flag)
/// call; it is never sticky across frames and never fires without a trigger.
#[derive(Debug, Default)]
pub struct HistoryInvalidationPolicy {
    last_camera: Option<CameraSnapshot>,
    pending_request: bool,
}

impl HistoryInvalidationPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a discard for the next frame.
    ///
    /// Called on resize, environment reload, or any user parameter change
    /// that alters the rendering integral (density scale, phase asymmetry,
    /// max trace depth, ...). Sticky until the next [`frame_flag`] consumes
    /// it, so requests raised between frames are never dropped.
    ///
    /// [`frame_flag`]: Self::frame_flag
    pub fn request_discard(&mut self) {
        self.pending_request = true;
    }

    /// Decide the discard flag for the frame about to be traced.
    ///
    /// Call exactly once per frame. Compares the camera snapshot against the
    /// previous frame's with exact inequality (no epsilon: sub-pixel drift
    /// invalidates the estimator too), ORs in any pending explicit request,
    /// then resets. The very first frame reports true since there is no
    /// history to reuse yet.
    pub fn frame_flag(&mut self, camera: &CameraSnapshot) -> bool {
        let camera_moved = self
            .last_camera
            .map_or(true, |previous| previous != *camera);
        let discard = camera_moved || self.pending_request;

        self.last_camera = Some(*camera);
        self.pending_request = false;

        if discard {
            log::trace!("Discarding accumulation history");
        }
        discard
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use haze_math::Vec3;

    fn snapshot() -> CameraSnapshot {
        CameraSnapshot {
            eye: Vec3::new(0.0, 0.0, -4.0),
            frustum_a: Vec3::new(-1.0, 1.0, 1.0),
            frustum_b: Vec3::new(1.0, 1.0, 1.0),
            frustum_c: Vec3::new(-1.0, -1.0, 1.0),
            frustum_d: Vec3::new(1.0, -1.0, 1.0),
        }
    }

    #[test]
    fn test_first_frame_discards() {
        let mut policy = HistoryInvalidationPolicy::new();
        assert!(policy.frame_flag(&snapshot()));
    }

    #[test]
    fn test_static_camera_keeps_history() {
        let mut policy = HistoryInvalidationPolicy::new();
        policy.frame_flag(&snapshot());
        assert!(!policy.frame_flag(&snapshot()));
        assert!(!policy.frame_flag(&snapshot()));
    }

    #[test]
    fn test_each_camera_vector_triggers() {
        let base = snapshot();
        let nudge = Vec3::splat(1e-6);
        let variants = [
            CameraSnapshot { eye: base.eye + nudge, ..base },
            CameraSnapshot { frustum_a: base.frustum_a + nudge, ..base },
            CameraSnapshot { frustum_b: base.frustum_b + nudge, ..base },
            CameraSnapshot { frustum_c: base.frustum_c + nudge, ..base },
            CameraSnapshot { frustum_d: base.frustum_d + nudge, ..base },
        ];

        for changed in variants {
            let mut policy = HistoryInvalidationPolicy::new();
            policy.frame_flag(&base);
            assert!(policy.frame_flag(&changed), "change not detected: {changed:?}");
            // Flag resets on the following frame.
            assert!(!policy.frame_flag(&changed));
        }
    }

    #[test]
    fn test_explicit_request_fires_once() {
        let mut policy = HistoryInvalidationPolicy::new();
        policy.frame_flag(&snapshot());

        policy.request_discard();
        assert!(policy.frame_flag(&snapshot()));
        assert!(!policy.frame_flag(&snapshot()));
    }

    #[test]
    fn test_intensity_change_discards_once() {
        // Environment intensity scales the integrand: a change must discard
        // history for exactly one frame, and re-setting the same value must
        // not.
        let mut policy = HistoryInvalidationPolicy::new();
        let mut envir = haze_core::EnvironmentParameterStore::new();
        policy.frame_flag(&snapshot());

        if envir.set_intensity(2.0) {
            policy.request_discard();
        }
        assert!(policy.frame_flag(&snapshot()));
        assert!(!policy.frame_flag(&snapshot()));

        if envir.set_intensity(2.0) {
            policy.request_discard();
        }
        assert!(!policy.frame_flag(&snapshot()));
    }

    #[test]
    fn test_simultaneous_triggers_not_dropped() {
        let base = snapshot();
        let moved = CameraSnapshot {
            eye: base.eye + Vec3::X,
            ..base
        };

        let mut policy = HistoryInvalidationPolicy::new();
        policy.frame_flag(&base);

        policy.request_discard();
        assert!(policy.frame_flag(&moved));
        assert!(!policy.frame_flag(&moved));
    }
}
