//! Primitive geometry builders

use crate::geometry::{Geometry, GeometryKind, Light};
use c3_core::{Vec2, Vec3};
use std::f32::consts::PI;
use std::ops::{BitOr, BitOrAssign};

/// Which cube faces to emit, plus the centring flag
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CubeFaces(pub u16);

impl CubeFaces {
    pub const TOP: CubeFaces = CubeFaces(1 << 0);
    pub const FRONT: CubeFaces = CubeFaces(1 << 1);
    pub const RIGHT: CubeFaces = CubeFaces(1 << 2);
    pub const BACK: CubeFaces = CubeFaces(1 << 3);
    pub const LEFT: CubeFaces = CubeFaces(1 << 4);
    pub const BOTTOM: CubeFaces = CubeFaces(1 << 5);
    pub const ALL: CubeFaces = CubeFaces(0x3f);
    /// Centre the cube on x/y, with its top at `position.z + size.z / 2`
    pub const CENTER: CubeFaces = CubeFaces(1 << 6);

    pub fn contains(self, other: CubeFaces) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn face_count(self) -> usize {
        (self.0 & Self::ALL.0).count_ones() as usize
    }
}

impl BitOr for CubeFaces {
    type Output = CubeFaces;

    fn bitor(self, rhs: CubeFaces) -> CubeFaces {
        CubeFaces(self.0 | rhs.0)
    }
}

impl BitOrAssign for CubeFaces {
    fn bitor_assign(&mut self, rhs: CubeFaces) {
        self.0 |= rhs.0;
    }
}

/// Face normal and corner indices, in [`CubeFaces`] bit order
const CUBE_FACES: [([f32; 3], [usize; 6]); 6] = [
    ([0.0, 0.0, 1.0], [0, 1, 2, 2, 3, 0]),
    ([0.0, -1.0, 0.0], [0, 4, 5, 5, 1, 0]),
    ([1.0, 0.0, 0.0], [1, 5, 6, 6, 2, 1]),
    ([0.0, 1.0, 0.0], [2, 6, 7, 7, 3, 2]),
    ([-1.0, 0.0, 0.0], [3, 7, 4, 4, 0, 3]),
    ([0.0, 0.0, -1.0], [4, 7, 6, 6, 5, 4]),
];

/// Per-face texture coordinates, V flipped
const CUBE_UV: [[f32; 2]; 6] = [
    [0.0, 1.0],
    [1.0, 1.0],
    [1.0, 0.0],
    [1.0, 0.0],
    [0.0, 0.0],
    [0.0, 1.0],
];

/// Unindexed box, six vertices per selected face
///
/// Without [`CubeFaces::CENTER`] `position` is the top-left-front corner and
/// the box extends toward +x, +y and -z.
pub fn cube(position: Vec3, size: Vec3, faces: CubeFaces) -> Geometry {
    let c = if faces.contains(CubeFaces::CENTER) {
        position + Vec3::new(-size.x / 2.0, -size.y / 2.0, size.z / 2.0)
    } else {
        position
    };
    let corners = [
        c,
        c + Vec3::new(size.x, 0.0, 0.0),
        c + Vec3::new(size.x, size.y, 0.0),
        c + Vec3::new(0.0, size.y, 0.0),
        c + Vec3::new(0.0, 0.0, -size.z),
        c + Vec3::new(size.x, 0.0, -size.z),
        c + Vec3::new(size.x, size.y, -size.z),
        c + Vec3::new(0.0, size.y, -size.z),
    ];

    let mut g = Geometry::triangles().with_name("cube");
    let n = faces.face_count() * 6;
    g.vertices.reserve(n);
    g.normals.reserve(n);
    g.texcoords.reserve(n);
    for (bit, (normal, idx)) in CUBE_FACES.iter().enumerate() {
        if faces.0 & (1 << bit) == 0 {
            continue;
        }
        for (i, uv) in idx.iter().zip(CUBE_UV.iter()) {
            g.vertices.push(corners[*i]);
            g.normals.push(Vec3::from(*normal));
            g.texcoords.push(Vec2::new(uv[0], uv[1]));
        }
    }
    g.update_bounds();
    g
}

/// Indexed latitude/longitude sphere
pub fn uv_sphere(center: Vec3, radius: f32, lat: u32, lon: u32) -> Geometry {
    let lat = lat.max(2);
    let lon = lon.max(3);
    let mut g = Geometry::triangles().with_name("sphere");

    for i in 0..=lat {
        let v = i as f32 / lat as f32;
        let theta = v * PI;
        let (st, ct) = theta.sin_cos();
        for j in 0..=lon {
            let u = j as f32 / lon as f32;
            let phi = u * 2.0 * PI;
            let (sp, cp) = phi.sin_cos();
            let normal = Vec3::new(st * cp, st * sp, ct);
            g.vertices.push(center + normal * radius);
            g.normals.push(normal);
            g.texcoords.push(Vec2::new(u, v));
        }
    }

    let row = lon + 1;
    for i in 0..lat {
        for j in 0..lon {
            let a = i * row + j;
            let b = a + row;
            g.indices.extend([a, b, a + 1, a + 1, b, b + 1]);
        }
    }
    g.update_bounds();
    g
}

/// Line segments (point pairs) expanded into quads of `width` in the XY plane
///
/// Each quad extends half a width past both ends, with the texture laid
/// across it so a round mask gives soft caps. A trailing odd point is
/// ignored.
pub fn lines(points: &[Vec3], width: f32) -> Geometry {
    let mut g = Geometry::new(GeometryKind::Lines { width });
    let half = width / 2.0;
    for seg in points.chunks_exact(2) {
        let (a, b) = (seg[0], seg[1]);
        let dir = Vec3::new(b.x - a.x, b.y - a.y, 0.0).normalize();
        let dir = if dir == Vec3::ZERO { Vec3::X } else { dir };
        let along = dir * half;
        let across = Vec3::new(-dir.y, dir.x, 0.0) * half;
        let quad = [
            a - along - across,
            a - along + across,
            b + along + across,
            b + along - across,
        ];
        for (i, uv) in [0usize, 1, 2, 2, 3, 0].into_iter().zip(QUAD_UV) {
            g.vertices.push(quad[i]);
            g.texcoords.push(uv);
        }
    }
    g.update_bounds();
    g
}

const QUAD_UV: [Vec2; 6] = [
    Vec2::new(0.0, 0.0),
    Vec2::new(0.0, 1.0),
    Vec2::new(1.0, 1.0),
    Vec2::new(1.0, 1.0),
    Vec2::new(1.0, 0.0),
    Vec2::new(0.0, 0.0),
];

/// Textured quad from the origin to `size`
pub fn sprite(size: Vec2) -> Geometry {
    let mut g = Geometry::new(GeometryKind::Sprite { size });
    let quad = [
        Vec3::ZERO,
        Vec3::new(0.0, size.y, 0.0),
        Vec3::new(size.x, size.y, 0.0),
        Vec3::new(size.x, 0.0, 0.0),
    ];
    for (i, uv) in [0usize, 1, 2, 2, 3, 0].into_iter().zip(QUAD_UV) {
        g.vertices.push(quad[i]);
        g.texcoords.push(uv);
    }
    g.update_bounds();
    g
}

/// Vertex-less light geometry
pub fn light(id: u32) -> Geometry {
    let mut g = Geometry::new(GeometryKind::Light(Light::new(id))).with_name(format!("light{}", id));
    g.update_bounds();
    g
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_all_faces() {
        let g = cube(Vec3::ZERO, Vec3::new(1.0, 2.0, 3.0), CubeFaces::ALL);
        assert_eq!(g.vertices.len(), 36);
        assert_eq!(g.normals.len(), 36);
        assert_eq!(g.texcoords.len(), 36);
        assert!(g.indices.is_empty());
        assert_eq!(g.bbox.min, Vec3::new(0.0, 0.0, -3.0));
        assert_eq!(g.bbox.max, Vec3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn test_cube_centered() {
        let g = cube(
            Vec3::new(100.0, 100.0, -1.0),
            Vec3::new(200.0, 200.0, 2.0),
            CubeFaces::CENTER | CubeFaces::ALL,
        );
        // top face flush with z = 0
        assert_eq!(g.bbox.min, Vec3::new(0.0, 0.0, -2.0));
        assert_eq!(g.bbox.max, Vec3::new(200.0, 200.0, 0.0));
    }

    #[test]
    fn test_cube_single_face() {
        let g = cube(Vec3::ZERO, Vec3::ONE, CubeFaces::TOP);
        assert_eq!(g.vertices.len(), 6);
        assert!(g.normals.iter().all(|n| *n == Vec3::Z));
        assert_eq!(g.texcoords[0], Vec2::new(0.0, 1.0));
        assert_eq!(g.vertices[2], Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_sphere_indices_in_range() {
        let g = uv_sphere(Vec3::ZERO, 3.0, 10, 10);
        assert_eq!(g.vertices.len(), 11 * 11);
        assert_eq!(g.indices.len(), 10 * 10 * 6);
        assert!(g.buffers_consistent());
        assert!((g.bbox.max.z - 3.0).abs() < 1e-5);
        assert!((g.bbox.min.z + 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_lines_quads() {
        let g = lines(
            &[Vec3::new(0.0, 0.0, 0.0), Vec3::new(10.0, 0.0, 0.0), Vec3::ONE],
            2.0,
        );
        assert_eq!(g.vertices.len(), 6);
        assert_eq!(g.bbox.min, Vec3::new(-1.0, -1.0, 0.0));
        assert_eq!(g.bbox.max, Vec3::new(11.0, 1.0, 0.0));
        assert!(matches!(g.kind, GeometryKind::Lines { width } if width == 2.0));
    }

    #[test]
    fn test_sprite_and_light() {
        let s = sprite(Vec2::new(256.0, 128.0));
        assert_eq!(s.bbox.max, Vec3::new(256.0, 128.0, 0.0));
        let l = light(3);
        assert_eq!(l.light_id(), Some(3));
        assert_eq!(l.name, "light3");
        assert!(l.vertices.is_empty());
    }
}
