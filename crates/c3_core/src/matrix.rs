//! 4x4 matrices and camera transforms
//!
//! Matrices are column-major (`cols[column][row]`), multiply as `parent * child`,
//! and follow OpenGL clip-space conventions (depth in [-1, 1]).

use crate::vector::{Vec3, Vec4};
use bytemuck::{Pod, Zeroable};

/// 4x4 transformation matrix (column-major)
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Mat4 {
    pub cols: [[f32; 4]; 4],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4 {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    pub const fn from_cols(cols: [[f32; 4]; 4]) -> Self {
        Self { cols }
    }

    pub fn translation(v: Vec3) -> Self {
        Self {
            cols: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [v.x, v.y, v.z, 1.0],
            ],
        }
    }

    pub fn scale(v: Vec3) -> Self {
        Self {
            cols: [
                [v.x, 0.0, 0.0, 0.0],
                [0.0, v.y, 0.0, 0.0],
                [0.0, 0.0, v.z, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    pub fn rotation_x(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self {
            cols: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, c, s, 0.0],
                [0.0, -s, c, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    pub fn rotation_y(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self {
            cols: [
                [c, 0.0, -s, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [s, 0.0, c, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    pub fn rotation_z(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self {
            cols: [
                [c, s, 0.0, 0.0],
                [-s, c, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Rotation of `angle` radians about an arbitrary axis (Rodrigues)
    ///
    /// A zero axis yields the identity.
    pub fn rotation_axis(axis: Vec3, angle: f32) -> Self {
        let a = axis.normalize();
        if a == Vec3::ZERO {
            return Self::IDENTITY;
        }
        let (s, c) = angle.sin_cos();
        let t = 1.0 - c;
        Self {
            cols: [
                [
                    t * a.x * a.x + c,
                    t * a.x * a.y + s * a.z,
                    t * a.x * a.z - s * a.y,
                    0.0,
                ],
                [
                    t * a.x * a.y - s * a.z,
                    t * a.y * a.y + c,
                    t * a.y * a.z + s * a.x,
                    0.0,
                ],
                [
                    t * a.x * a.z + s * a.y,
                    t * a.y * a.z - s * a.x,
                    t * a.z * a.z + c,
                    0.0,
                ],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Multiply two matrices (`self * other`)
    pub fn mul(&self, other: &Mat4) -> Mat4 {
        let mut result = [[0.0f32; 4]; 4];
        for (i, col) in result.iter_mut().enumerate() {
            for (j, cell) in col.iter_mut().enumerate() {
                for k in 0..4 {
                    *cell += self.cols[k][j] * other.cols[i][k];
                }
            }
        }
        Mat4 { cols: result }
    }

    /// Inverse, or the identity when the matrix is singular
    pub fn inverse(&self) -> Mat4 {
        let a = &self.cols;

        let s0 = a[0][0] * a[1][1] - a[1][0] * a[0][1];
        let s1 = a[0][0] * a[1][2] - a[1][0] * a[0][2];
        let s2 = a[0][0] * a[1][3] - a[1][0] * a[0][3];
        let s3 = a[0][1] * a[1][2] - a[1][1] * a[0][2];
        let s4 = a[0][1] * a[1][3] - a[1][1] * a[0][3];
        let s5 = a[0][2] * a[1][3] - a[1][2] * a[0][3];

        let c5 = a[2][2] * a[3][3] - a[3][2] * a[2][3];
        let c4 = a[2][1] * a[3][3] - a[3][1] * a[2][3];
        let c3 = a[2][1] * a[3][2] - a[3][1] * a[2][2];
        let c2 = a[2][0] * a[3][3] - a[3][0] * a[2][3];
        let c1 = a[2][0] * a[3][2] - a[3][0] * a[2][2];
        let c0 = a[2][0] * a[3][1] - a[3][0] * a[2][1];

        let det = s0 * c5 - s1 * c4 + s2 * c3 + s3 * c2 - s4 * c1 + s5 * c0;
        if det.abs() < 1e-10 {
            return Mat4::IDENTITY;
        }
        let inv = 1.0 / det;

        Mat4 {
            cols: [
                [
                    (a[1][1] * c5 - a[1][2] * c4 + a[1][3] * c3) * inv,
                    (-a[0][1] * c5 + a[0][2] * c4 - a[0][3] * c3) * inv,
                    (a[3][1] * s5 - a[3][2] * s4 + a[3][3] * s3) * inv,
                    (-a[2][1] * s5 + a[2][2] * s4 - a[2][3] * s3) * inv,
                ],
                [
                    (-a[1][0] * c5 + a[1][2] * c2 - a[1][3] * c1) * inv,
                    (a[0][0] * c5 - a[0][2] * c2 + a[0][3] * c1) * inv,
                    (-a[3][0] * s5 + a[3][2] * s2 - a[3][3] * s1) * inv,
                    (a[2][0] * s5 - a[2][2] * s2 + a[2][3] * s1) * inv,
                ],
                [
                    (a[1][0] * c4 - a[1][1] * c2 + a[1][3] * c0) * inv,
                    (-a[0][0] * c4 + a[0][1] * c2 - a[0][3] * c0) * inv,
                    (a[3][0] * s4 - a[3][1] * s2 + a[3][3] * s0) * inv,
                    (-a[2][0] * s4 + a[2][1] * s2 - a[2][3] * s0) * inv,
                ],
                [
                    (-a[1][0] * c3 + a[1][1] * c1 - a[1][2] * c0) * inv,
                    (a[0][0] * c3 - a[0][1] * c1 + a[0][2] * c0) * inv,
                    (-a[3][0] * s3 + a[3][1] * s1 - a[3][2] * s0) * inv,
                    (a[2][0] * s3 - a[2][1] * s1 + a[2][2] * s0) * inv,
                ],
            ],
        }
    }

    pub fn transpose(&self) -> Mat4 {
        let mut cols = [[0.0f32; 4]; 4];
        for (i, col) in cols.iter_mut().enumerate() {
            for (j, cell) in col.iter_mut().enumerate() {
                *cell = self.cols[j][i];
            }
        }
        Mat4 { cols }
    }

    /// Transform a point (w = 1)
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        self.transform(p.extend(1.0)).truncate()
    }

    /// Transform a direction (w = 0, ignores translation)
    pub fn transform_vector(&self, v: Vec3) -> Vec3 {
        self.transform(v.extend(0.0)).truncate()
    }

    pub fn transform(&self, v: Vec4) -> Vec4 {
        let c = &self.cols;
        Vec4::new(
            c[0][0] * v.x + c[1][0] * v.y + c[2][0] * v.z + c[3][0] * v.w,
            c[0][1] * v.x + c[1][1] * v.y + c[2][1] * v.z + c[3][1] * v.w,
            c[0][2] * v.x + c[1][2] * v.y + c[2][2] * v.z + c[3][2] * v.w,
            c[0][3] * v.x + c[1][3] * v.y + c[2][3] * v.z + c[3][3] * v.w,
        )
    }

    /// Translation part of an affine matrix
    pub fn position(&self) -> Vec3 {
        Vec3::new(self.cols[3][0], self.cols[3][1], self.cols[3][2])
    }

    /// Right-handed view matrix looking from `eye` toward `target`
    pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        let f = (target - eye).normalize();
        let s = f.cross(up).normalize();
        // up parallel to the view direction: pick any perpendicular side
        let s = if s == Vec3::ZERO {
            f.cross(Vec3::X).normalize()
        } else {
            s
        };
        let u = s.cross(f);

        Mat4 {
            cols: [
                [s.x, u.x, -f.x, 0.0],
                [s.y, u.y, -f.y, 0.0],
                [s.z, u.z, -f.z, 0.0],
                [-s.dot(eye), -u.dot(eye), f.dot(eye), 1.0],
            ],
        }
    }

    /// Perspective projection, `fov_y` in radians
    pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        let f = 1.0 / (fov_y * 0.5).tan();
        let nf = 1.0 / (near - far);

        Mat4 {
            cols: [
                [f / aspect, 0.0, 0.0, 0.0],
                [0.0, f, 0.0, 0.0],
                [0.0, 0.0, (far + near) * nf, -1.0],
                [0.0, 0.0, 2.0 * far * near * nf, 0.0],
            ],
        }
    }

    pub fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
        let rml = right - left;
        let tmb = top - bottom;
        let fmn = far - near;

        Mat4 {
            cols: [
                [2.0 / rml, 0.0, 0.0, 0.0],
                [0.0, 2.0 / tmb, 0.0, 0.0],
                [0.0, 0.0, -2.0 / fmn, 0.0],
                [
                    -(right + left) / rml,
                    -(top + bottom) / tmb,
                    -(far + near) / fmn,
                    1.0,
                ],
            ],
        }
    }

    /// Orthographic projection for overlays in window pixels, y grows downward
    pub fn screen_ortho(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
        Self::orthographic(left, right, top, bottom, near, far)
    }

    pub fn to_cols_array(&self) -> [f32; 16] {
        bytemuck::cast(self.cols)
    }

    pub fn approx_eq(&self, other: &Mat4, epsilon: f32) -> bool {
        self.to_cols_array()
            .iter()
            .zip(other.to_cols_array().iter())
            .all(|(a, b)| (a - b).abs() <= epsilon)
    }
}

impl std::ops::Mul for Mat4 {
    type Output = Mat4;

    fn mul(self, rhs: Mat4) -> Mat4 {
        Mat4::mul(&self, &rhs)
    }
}
