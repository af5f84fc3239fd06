//! Free-look camera and the frustum state the invalidation policy compares.

use haze_math::Vec3;

/// The four corner ray directions spanning the view frustum.
///
/// a = top-left, b = top-right, c = bottom-left, d = bottom-right. The kernel
/// interpolates between these to generate primary rays, so together with the
/// eye position they fully determine the image.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FrustumDirections {
    pub a: Vec3,
    pub b: Vec3,
    pub c: Vec3,
    pub d: Vec3,
}

/// Camera pose as observed by the history invalidation policy.
///
/// Compared with exact float inequality, not an epsilon: even sub-pixel drift
/// must restart the estimator for the accumulated history to stay correct.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CameraSnapshot {
    pub eye: Vec3,
    pub frustum_a: Vec3,
    pub frustum_b: Vec3,
    pub frustum_c: Vec3,
    pub frustum_d: Vec3,
}

/// Free-look camera defined by position, yaw/pitch and a vertical FOV.
#[derive(Clone, Debug)]
pub struct Camera {
    position: Vec3,
    yaw: f32,
    pitch: f32,
    vfov_deg: f32,
    aspect: f32,
}

impl Camera {
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            vfov_deg: 60.0,
            aspect: 1.0,
        }
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Set the view direction as yaw/pitch in radians.
    ///
    /// Pitch is clamped just short of the poles to keep the basis well
    /// defined.
    pub fn set_direction(&mut self, yaw: f32, pitch: f32) {
        self.yaw = yaw;
        self.pitch = pitch.clamp(-1.55, 1.55);
    }

    pub fn set_perspective(&mut self, vfov_deg: f32) {
        self.vfov_deg = vfov_deg;
    }

    /// Set the output aspect ratio (width over height).
    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// View direction derived from yaw/pitch.
    pub fn forward(&self) -> Vec3 {
        Vec3::new(
            self.pitch.cos() * self.yaw.cos(),
            self.pitch.sin(),
            self.pitch.cos() * self.yaw.sin(),
        )
    }

    /// Derive the four frustum corner directions from the current pose.
    pub fn frustum(&self) -> FrustumDirections {
        let forward = self.forward();
        let right = forward.cross(Vec3::Y).normalize();
        let up = right.cross(forward);

        let half_h = (self.vfov_deg.to_radians() * 0.5).tan();
        let half_w = half_h * self.aspect;

        FrustumDirections {
            a: forward + up * half_h - right * half_w,
            b: forward + up * half_h + right * half_w,
            c: forward - up * half_h - right * half_w,
            d: forward - up * half_h + right * half_w,
        }
    }

    /// Capture the pose the invalidation policy compares frame to frame.
    pub fn snapshot(&self) -> CameraSnapshot {
        let frustum = self.frustum();
        CameraSnapshot {
            eye: self.position,
            frustum_a: frustum.a,
            frustum_b: frustum.b,
            frustum_c: frustum.c,
            frustum_d: frustum.d,
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_from_yaw_pitch() {
        let mut camera = Camera::new();
        camera.set_direction(std::f32::consts::FRAC_PI_2, 0.0);
        let forward = camera.forward();
        assert!(forward.x.abs() < 1e-6);
        assert!((forward.z - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_frustum_corners_straddle_forward() {
        let mut camera = Camera::new();
        camera.set_direction(0.0, 0.0);
        camera.set_aspect(16.0 / 9.0);
        let frustum = camera.frustum();
        let forward = camera.forward();

        // All corners lean into the view direction.
        for dir in [frustum.a, frustum.b, frustum.c, frustum.d] {
            assert!(dir.dot(forward) > 0.0);
        }
        // Top corners sit above the bottom ones.
        assert!(frustum.a.y > frustum.c.y);
        assert!(frustum.b.y > frustum.d.y);
        // The average of the corners points along forward.
        let center = (frustum.a + frustum.b + frustum.c + frustum.d) / 4.0;
        assert!((center.normalize() - forward).length() < 1e-5);
    }

    #[test]
    fn test_snapshot_equality_is_exact() {
        let mut camera = Camera::new();
        camera.set_position(Vec3::new(0.0, 0.0, -4.0));
        let before = camera.snapshot();
        assert_eq!(before, camera.snapshot());

        camera.set_position(Vec3::new(0.0, 0.0, -4.0 + 1e-7));
        assert_ne!(before, camera.snapshot());
    }
}
