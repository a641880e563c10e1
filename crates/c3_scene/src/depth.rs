//! Draw ordering
//!
//! Gathered geometry is sorted with a key computed once per geometry:
//! lights first by id, then opaque geometry, then translucent geometry, each
//! tier ordered by the nearest bounding-box corner to the eye.

use crate::graph::{GeometryKey, SceneGraph};
use crate::view::ZRange;
use c3_core::Vec3;
use std::cmp::Ordering;

/// Coarse draw class, compared before distance
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DrawTier {
    Light { id: u32 },
    Opaque,
    Translucent,
}

/// Sort key of one gathered geometry
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DepthKey {
    pub tier: DrawTier,
    /// Smallest squared distance from the eye to a world bbox corner
    pub distance: f32,
}

impl DepthKey {
    pub fn order(&self, other: &DepthKey) -> Ordering {
        self.tier
            .cmp(&other.tier)
            .then_with(|| self.distance.total_cmp(&other.distance))
    }
}

/// Sort `keys` into draw order as seen from `eye`
///
/// Returns the squared-distance range covered by all the geometry, still
/// at [`ZRange::SENTINEL`] when `keys` is empty. Geometry that is gone from
/// the graph, or has nothing to draw, is dropped.
pub fn sort_by_depth(keys: &mut Vec<GeometryKey>, scene: &SceneGraph, eye: Vec3) -> ZRange {
    let mut range = ZRange::SENTINEL;
    let mut keyed: Vec<(DepthKey, GeometryKey)> = keys
        .iter()
        .filter_map(|&k| {
            let g = scene.geometry(k).filter(|g| g.has_content())?;
            let (d2min, d2max) = g.world_bbox().distance2_range(eye);
            range.include(d2min, d2max);
            Some((
                DepthKey {
                    tier: g.draw_tier(),
                    distance: d2min,
                },
                k,
            ))
        })
        .collect();

    keyed.sort_by(|a, b| a.0.order(&b.0));

    keys.clear();
    keys.extend(keyed.into_iter().map(|(_, k)| k));
    range
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Geometry, GeometryKind, Light};
    use c3_core::{Color, Mat4};

    fn quad_at(z: f32) -> Geometry {
        let mut g = Geometry::triangles();
        g.vertices = vec![
            Vec3::new(-1.0, -1.0, z),
            Vec3::new(1.0, -1.0, z),
            Vec3::new(1.0, 1.0, z),
        ];
        g
    }

    fn sorted(scene: &mut SceneGraph, eye: Vec3) -> (Vec<GeometryKey>, ZRange) {
        scene.project(&Mat4::IDENTITY);
        let mut keys = Vec::new();
        scene.gather(0, &mut keys);
        let z = sort_by_depth(&mut keys, scene, eye);
        (keys, z)
    }

    #[test]
    fn test_tier_order() {
        assert!(DrawTier::Light { id: 0 } < DrawTier::Light { id: 1 });
        assert!(DrawTier::Light { id: 9 } < DrawTier::Opaque);
        assert!(DrawTier::Opaque < DrawTier::Translucent);
    }

    #[test]
    fn test_near_before_far() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let far = scene.add_geometry(root, quad_at(-50.0)).unwrap();
        let near = scene.add_geometry(root, quad_at(5.0)).unwrap();
        let (keys, _) = sorted(&mut scene, Vec3::new(0.0, 0.0, 10.0));
        assert_eq!(keys, vec![near, far]);
    }

    #[test]
    fn test_lights_first_by_id() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let mesh = scene.add_geometry(root, quad_at(9.0)).unwrap();
        let l1 = scene
            .add_geometry(root, Geometry::new(GeometryKind::Light(Light::new(1))))
            .unwrap();
        let l0 = scene
            .add_geometry(root, Geometry::new(GeometryKind::Light(Light::new(0))))
            .unwrap();
        let (keys, _) = sorted(&mut scene, Vec3::new(0.0, 0.0, 10.0));
        assert_eq!(keys, vec![l0, l1, mesh]);
    }

    #[test]
    fn test_translucent_after_opaque() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let glass = scene
            .add_geometry(root, quad_at(9.0).with_color(Color::rgba(1.0, 1.0, 1.0, 0.5)))
            .unwrap();
        let wall = scene.add_geometry(root, quad_at(-100.0)).unwrap();
        let (keys, _) = sorted(&mut scene, Vec3::new(0.0, 0.0, 10.0));
        assert_eq!(keys, vec![wall, glass]);
    }

    #[test]
    fn test_range_covers_all_corners() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        scene.add_geometry(root, quad_at(0.0)).unwrap();
        let (_, z) = sorted(&mut scene, Vec3::new(0.0, 0.0, 10.0));
        // every corner sits at 1 + 1 + 100
        assert_eq!(z.min, 102.0);
        assert_eq!(z.max, 102.0);
    }

    #[test]
    fn test_far_bound_grows_with_distant_geometry() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        scene.add_geometry(root, quad_at(0.0)).unwrap();
        let (_, before) = sorted(&mut scene, Vec3::new(0.0, 0.0, 10.0));
        scene.add_geometry(root, quad_at(-500.0)).unwrap();
        let (_, after) = sorted(&mut scene, Vec3::new(0.0, 0.0, 10.0));
        assert!(after.max >= before.max);
        assert!(after.min <= before.min);
    }

    #[test]
    fn test_empty_geometry_left_out_of_range() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let quad = scene.add_geometry(root, quad_at(0.0)).unwrap();
        let far_obj = scene.add_object(root).unwrap();
        scene
            .set_transform(far_obj, Mat4::translation(Vec3::new(0.0, 0.0, -1000.0)))
            .unwrap();
        scene.add_geometry(far_obj, Geometry::triangles()).unwrap();
        let (keys, z) = sorted(&mut scene, Vec3::new(0.0, 0.0, 10.0));
        assert_eq!(keys, vec![quad]);
        assert_eq!(z.max, 102.0);
    }

    #[test]
    fn test_empty_keeps_sentinel() {
        let scene = SceneGraph::new();
        let mut keys = Vec::new();
        assert!(sort_by_depth(&mut keys, &scene, Vec3::ZERO).is_sentinel());
    }
}
