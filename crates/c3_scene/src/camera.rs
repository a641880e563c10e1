//! Look-at camera
//!
//! The camera keeps an orthonormal basis (side, up, forward) derived from its
//! eye and lookat points. Any edit goes through [`Camera::update_matrix`],
//! which rebuilds the basis, the distance and the view matrix.

use c3_core::{Mat4, Vec3};

/// Eye/lookat camera with a derived view matrix
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub lookat: Vec3,
    pub up: Vec3,
    pub side: Vec3,
    pub forward: Vec3,
    /// Vertical field of view in radians, 0 for orthographic
    pub fov: f32,
    /// Eye to lookat distance
    pub distance: f32,
    /// View matrix
    pub mtx: Mat4,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

impl Camera {
    /// Closest the eye may get to the lookat point
    pub const MIN_DISTANCE: f32 = 0.1;

    /// Eye at (0, 0, 10) looking at the origin, +Z up, 45 degree fov
    pub fn new() -> Self {
        Self::looking(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Z)
    }

    pub fn looking(eye: Vec3, lookat: Vec3, up: Vec3) -> Self {
        let mut cam = Self {
            eye,
            lookat,
            up,
            side: Vec3::X,
            forward: -Vec3::Z,
            fov: std::f32::consts::FRAC_PI_4,
            distance: 0.0,
            mtx: Mat4::IDENTITY,
        };
        cam.update_matrix();
        cam
    }

    pub fn is_orthographic(&self) -> bool {
        self.fov <= 0.0
    }

    /// Move the eye along the view axis so it sits `d` from the lookat
    pub fn set_distance(&mut self, d: f32) {
        let d = d.max(Self::MIN_DISTANCE);
        let back = if self.forward == Vec3::ZERO {
            Vec3::Z
        } else {
            -self.forward
        };
        self.eye = self.lookat + back * d;
        self.update_matrix();
    }

    /// Rotate the eye (and up vector) around the lookat point
    pub fn rot_about_lookat(&mut self, rot: &Mat4) {
        let offset = rot.transform_vector(self.eye - self.lookat);
        self.eye = self.lookat + offset;
        self.up = rot.transform_vector(self.up);
        self.update_matrix();
    }

    /// Move eye and lookat along the camera's own axes
    pub fn movef(&mut self, dx: f32, dy: f32, dz: f32) {
        let delta = self.side * dx + self.up * dy + self.forward * dz;
        self.translate(delta);
    }

    /// Move eye and lookat by a world-space delta
    pub fn translate(&mut self, delta: Vec3) {
        self.eye += delta;
        self.lookat += delta;
        self.update_matrix();
    }

    /// Re-orthonormalise the basis and rebuild the view matrix
    pub fn update_matrix(&mut self) {
        let offset = self.lookat - self.eye;
        self.distance = offset.length();
        let forward = offset.normalize();
        if forward != Vec3::ZERO {
            self.forward = forward;
        }
        let side = self.forward.cross(self.up).normalize();
        if side != Vec3::ZERO {
            self.side = side;
        }
        self.up = self.side.cross(self.forward).normalize();
        self.mtx = Mat4::look_at(self.eye, self.lookat, self.up);
    }
}
