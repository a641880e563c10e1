//! Scene object tree
//!
//! Objects and geometries live in two slot-map arenas owned by the
//! [`SceneGraph`]. Objects refer to each other by key, so the tree can only
//! be edited through graph methods, which keep parent and child links in
//! sync and refuse to create cycles.
//!
//! Any edit marks the touched object and every ancestor up to the root as
//! dirty. Projection walks only dirty branches (plus the subtrees of objects
//! whose world matrix moved), so an unchanged tree projects for free.

use crate::error::{Result, SceneError};
use crate::geometry::Geometry;
use crate::view::ViewMask;
use c3_core::{BoundingBox, Mat4};
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;
use tracing::{debug, trace, warn};

new_key_type! {
    /// Handle to a [`SceneObject`]
    pub struct ObjectKey;
    /// Handle to a [`Geometry`]
    pub struct GeometryKey;
}

/// Which views an object subtree shows up in
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
    HiddenFrom(ViewMask),
}

impl Visibility {
    pub fn hides(self, view: usize) -> bool {
        match self {
            Visibility::Visible => false,
            Visibility::Hidden => true,
            Visibility::HiddenFrom(mask) => mask.contains(view),
        }
    }
}

/// A node of the scene tree
#[derive(Clone, Debug)]
pub struct SceneObject {
    pub name: String,
    parent: Option<ObjectKey>,
    children: SmallVec<[ObjectKey; 4]>,
    geometries: SmallVec<[GeometryKey; 4]>,
    transform: Option<Mat4>,
    world: Mat4,
    bbox: BoundingBox,
    dirty: bool,
    visibility: Visibility,
}

impl SceneObject {
    fn new(parent: Option<ObjectKey>) -> Self {
        Self {
            name: String::new(),
            parent,
            children: SmallVec::new(),
            geometries: SmallVec::new(),
            transform: None,
            world: Mat4::IDENTITY,
            bbox: BoundingBox::empty(),
            dirty: true,
            visibility: Visibility::Visible,
        }
    }

    pub fn parent(&self) -> Option<ObjectKey> {
        self.parent
    }

    pub fn children(&self) -> &[ObjectKey] {
        &self.children
    }

    pub fn geometries(&self) -> &[GeometryKey] {
        &self.geometries
    }

    /// Local transform, `None` means identity
    pub fn transform(&self) -> Option<&Mat4> {
        self.transform.as_ref()
    }

    /// World matrix as of the last projection
    pub fn world(&self) -> &Mat4 {
        &self.world
    }

    /// World-space union of the subtree's geometry bounds
    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }
}

/// Arena-backed object tree with a fixed root
#[derive(Debug)]
pub struct SceneGraph {
    objects: SlotMap<ObjectKey, SceneObject>,
    geometries: SlotMap<GeometryKey, Geometry>,
    root: ObjectKey,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    pub fn new() -> Self {
        let mut objects = SlotMap::with_key();
        let mut root_obj = SceneObject::new(None);
        root_obj.name = "root".to_string();
        let root = objects.insert(root_obj);
        Self {
            objects,
            geometries: SlotMap::with_key(),
            root,
        }
    }

    pub fn root(&self) -> ObjectKey {
        self.root
    }

    pub fn object(&self, key: ObjectKey) -> Option<&SceneObject> {
        self.objects.get(key)
    }

    pub fn geometry(&self, key: GeometryKey) -> Option<&Geometry> {
        self.geometries.get(key)
    }

    pub fn children(&self, key: ObjectKey) -> &[ObjectKey] {
        self.objects.get(key).map(|o| o.children()).unwrap_or(&[])
    }

    pub fn geometries_of(&self, key: ObjectKey) -> &[GeometryKey] {
        self.objects.get(key).map(|o| o.geometries()).unwrap_or(&[])
    }

    pub fn world_transform(&self, key: ObjectKey) -> Option<Mat4> {
        self.objects.get(key).map(|o| o.world)
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn geometry_count(&self) -> usize {
        self.geometries.len()
    }

    pub fn is_dirty(&self) -> bool {
        self.objects.get(self.root).is_some_and(|o| o.dirty)
    }

    /// Create an empty object under `parent`
    pub fn add_object(&mut self, parent: ObjectKey) -> Result<ObjectKey> {
        if !self.objects.contains_key(parent) {
            return Err(SceneError::UnknownObject(parent));
        }
        let key = self.objects.insert(SceneObject::new(Some(parent)));
        if let Some(p) = self.objects.get_mut(parent) {
            p.children.push(key);
        }
        self.mark_dirty(parent);
        Ok(key)
    }

    /// Attach `geometry` to `object`, computing its local bounds
    pub fn add_geometry(&mut self, object: ObjectKey, mut geometry: Geometry) -> Result<GeometryKey> {
        if !self.objects.contains_key(object) {
            return Err(SceneError::UnknownObject(object));
        }
        geometry.object = Some(object);
        geometry.dirty = true;
        geometry.update_bounds();
        if !geometry.buffers_consistent() {
            warn!(
                "geometry '{}': {} vertices with {} normals, {} texcoords, {} colors",
                geometry.name,
                geometry.vertices.len(),
                geometry.normals.len(),
                geometry.texcoords.len(),
                geometry.colors.len()
            );
        }
        let key = self.geometries.insert(geometry);
        if let Some(o) = self.objects.get_mut(object) {
            o.geometries.push(key);
        }
        self.mark_dirty(object);
        Ok(key)
    }

    pub fn set_transform(&mut self, key: ObjectKey, transform: Mat4) -> Result<()> {
        let obj = self
            .objects
            .get_mut(key)
            .ok_or(SceneError::UnknownObject(key))?;
        obj.transform = Some(transform);
        self.mark_dirty(key);
        Ok(())
    }

    pub fn clear_transform(&mut self, key: ObjectKey) -> Result<()> {
        let obj = self
            .objects
            .get_mut(key)
            .ok_or(SceneError::UnknownObject(key))?;
        obj.transform = None;
        self.mark_dirty(key);
        Ok(())
    }

    pub fn set_name(&mut self, key: ObjectKey, name: impl Into<String>) -> Result<()> {
        let obj = self
            .objects
            .get_mut(key)
            .ok_or(SceneError::UnknownObject(key))?;
        obj.name = name.into();
        Ok(())
    }

    pub fn set_visibility(&mut self, key: ObjectKey, visibility: Visibility) -> Result<()> {
        let obj = self
            .objects
            .get_mut(key)
            .ok_or(SceneError::UnknownObject(key))?;
        if obj.visibility != visibility {
            obj.visibility = visibility;
            self.mark_dirty(key);
        }
        Ok(())
    }

    /// Flag `key` and all its ancestors for re-projection
    pub fn mark_dirty(&mut self, key: ObjectKey) {
        let mut cursor = Some(key);
        while let Some(k) = cursor {
            let Some(obj) = self.objects.get_mut(k) else {
                break;
            };
            obj.dirty = true;
            cursor = obj.parent;
        }
    }

    /// Edit a geometry in place; bounds are refreshed and the owner chain dirtied
    pub fn update_geometry<R>(
        &mut self,
        key: GeometryKey,
        f: impl FnOnce(&mut Geometry) -> R,
    ) -> Result<R> {
        let g = self
            .geometries
            .get_mut(key)
            .ok_or(SceneError::UnknownGeometry(key))?;
        let out = f(g);
        g.update_bounds();
        g.dirty = true;
        if let Some(owner) = g.object {
            self.mark_dirty(owner);
        }
        Ok(out)
    }

    /// Move `child` (and its subtree) under `parent`
    pub fn reparent(&mut self, child: ObjectKey, parent: ObjectKey) -> Result<()> {
        if child == self.root {
            return Err(SceneError::RootRemoval);
        }
        if !self.objects.contains_key(child) {
            return Err(SceneError::UnknownObject(child));
        }
        if !self.objects.contains_key(parent) {
            return Err(SceneError::UnknownObject(parent));
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(SceneError::Cycle { child, parent });
        }

        let old_parent = self.objects.get(child).and_then(|o| o.parent);
        if let Some(old) = old_parent {
            if let Some(o) = self.objects.get_mut(old) {
                o.children.retain(|c| *c != child);
            }
            self.mark_dirty(old);
        }
        if let Some(p) = self.objects.get_mut(parent) {
            p.children.push(child);
        }
        if let Some(c) = self.objects.get_mut(child) {
            c.parent = Some(parent);
        }
        self.mark_dirty(child);
        Ok(())
    }

    /// True if `ancestor` is `node` or lies on the path from `node` to the root
    fn is_ancestor_or_self(&self, ancestor: ObjectKey, node: ObjectKey) -> bool {
        let mut cursor = Some(node);
        while let Some(k) = cursor {
            if k == ancestor {
                return true;
            }
            cursor = self.objects.get(k).and_then(|o| o.parent);
        }
        false
    }

    /// Remove an object with its whole subtree and all their geometries
    ///
    /// Returns the keys of the removed geometries.
    pub fn remove_object(&mut self, key: ObjectKey) -> Result<Vec<GeometryKey>> {
        if key == self.root {
            return Err(SceneError::RootRemoval);
        }
        let parent = self
            .objects
            .get(key)
            .ok_or(SceneError::UnknownObject(key))?
            .parent;
        if let Some(p) = parent {
            if let Some(o) = self.objects.get_mut(p) {
                o.children.retain(|c| *c != key);
            }
            self.mark_dirty(p);
        }

        let mut removed = Vec::new();
        let mut stack = vec![key];
        let mut objects = 0;
        while let Some(k) = stack.pop() {
            let Some(obj) = self.objects.remove(k) else {
                continue;
            };
            objects += 1;
            for g in obj.geometries {
                if self.geometries.remove(g).is_some() {
                    removed.push(g);
                }
            }
            stack.extend(obj.children);
        }
        debug!(
            "removed {} objects and {} geometries",
            objects,
            removed.len()
        );
        Ok(removed)
    }

    pub fn remove_geometry(&mut self, key: GeometryKey) -> Result<Geometry> {
        let g = self
            .geometries
            .remove(key)
            .ok_or(SceneError::UnknownGeometry(key))?;
        if let Some(owner) = g.object {
            if let Some(o) = self.objects.get_mut(owner) {
                o.geometries.retain(|k| *k != key);
            }
            self.mark_dirty(owner);
        }
        Ok(g)
    }

    /// Drop every object but the root
    pub fn clear(&mut self) {
        let (objects, geometries) = (self.objects.len() - 1, self.geometries.len());
        let root = self.root;
        self.objects.retain(|k, _| k == root);
        self.geometries.clear();
        if let Some(r) = self.objects.get_mut(root) {
            r.children.clear();
            r.geometries.clear();
            r.dirty = true;
        }
        debug!("scene cleared: {} objects, {} geometries", objects, geometries);
    }

    /// Propagate transforms from the root down, clearing dirty flags
    ///
    /// Returns the number of objects whose world matrix was recomputed.
    pub fn project(&mut self, base: &Mat4) -> usize {
        let count = self.project_object(self.root, base, true);
        trace!("projected {} objects", count);
        count
    }

    fn project_object(&mut self, key: ObjectKey, parent_world: &Mat4, force: bool) -> usize {
        let Some(obj) = self.objects.get_mut(key) else {
            return 0;
        };
        if !obj.dirty && !force {
            return 0;
        }
        let world = match &obj.transform {
            Some(local) => parent_world.mul(local),
            None => *parent_world,
        };
        let moved = world != obj.world;
        obj.world = world;
        obj.dirty = false;
        let geometries = obj.geometries.clone();
        let children = obj.children.clone();

        let mut bbox = BoundingBox::empty();
        for gk in geometries {
            if let Some(g) = self.geometries.get_mut(gk) {
                if g.dirty {
                    g.update_bounds();
                    g.dirty = false;
                }
                g.world_bbox = g.bbox.transformed(&world);
                bbox.merge(&g.world_bbox);
            }
        }

        let mut count = 1;
        for child in children {
            count += self.project_object(child, &world, moved);
            if let Some(c) = self.objects.get(child) {
                bbox.merge(&c.bbox);
            }
        }
        if let Some(obj) = self.objects.get_mut(key) {
            obj.bbox = bbox;
        }
        count
    }

    /// Append every geometry visible from `view` in tree order
    pub fn gather(&self, view: usize, out: &mut Vec<GeometryKey>) {
        self.gather_object(self.root, view, out);
    }

    fn gather_object(&self, key: ObjectKey, view: usize, out: &mut Vec<GeometryKey>) {
        let Some(obj) = self.objects.get(key) else {
            return;
        };
        if obj.visibility.hides(view) {
            return;
        }
        out.extend(
            obj.geometries
                .iter()
                .copied()
                .filter(|gk| self.geometries.get(*gk).is_some_and(|g| !g.is_hidden_from(view))),
        );
        for child in &obj.children {
            self.gather_object(*child, view, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use c3_core::Vec3;

    fn point_geometry() -> Geometry {
        let mut g = Geometry::triangles();
        g.vertices = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
        g
    }

    #[test]
    fn test_three_level_transforms() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let a = scene.add_object(root).unwrap();
        let b = scene.add_object(a).unwrap();
        let c = scene.add_object(b).unwrap();
        scene.set_transform(a, Mat4::translation(Vec3::new(1.0, 0.0, 0.0))).unwrap();
        scene.set_transform(b, Mat4::translation(Vec3::new(0.0, 2.0, 0.0))).unwrap();
        scene.set_transform(c, Mat4::scale(Vec3::splat(2.0))).unwrap();
        let g = scene.add_geometry(c, point_geometry()).unwrap();

        assert_eq!(scene.project(&Mat4::IDENTITY), 4);

        let expected = Mat4::translation(Vec3::new(1.0, 0.0, 0.0))
            * Mat4::translation(Vec3::new(0.0, 2.0, 0.0))
            * Mat4::scale(Vec3::splat(2.0));
        assert!(scene.world_transform(c).unwrap().approx_eq(&expected, 1e-6));

        let wb = scene.geometry(g).unwrap().world_bbox();
        assert_eq!(wb.min, Vec3::new(1.0, 2.0, 0.0));
        assert_eq!(wb.max, Vec3::new(3.0, 4.0, 0.0));
        assert_eq!(scene.object(root).unwrap().bbox(), wb);

        for key in [root, a, b, c] {
            assert!(!scene.object(key).unwrap().is_dirty());
        }
        assert!(!scene.geometry(g).unwrap().is_dirty());
    }

    #[test]
    fn test_clean_tree_projects_nothing() {
        let mut scene = SceneGraph::new();
        let a = scene.add_object(scene.root()).unwrap();
        scene.add_geometry(a, point_geometry()).unwrap();
        scene.project(&Mat4::IDENTITY);
        let before = *scene.object(scene.root()).unwrap().bbox();
        // root is always visited, nothing below it
        assert_eq!(scene.project(&Mat4::IDENTITY), 1);
        assert_eq!(*scene.object(scene.root()).unwrap().bbox(), before);
    }

    #[test]
    fn test_parent_move_reaches_clean_children() {
        let mut scene = SceneGraph::new();
        let a = scene.add_object(scene.root()).unwrap();
        let b = scene.add_object(a).unwrap();
        scene.project(&Mat4::IDENTITY);
        scene.set_transform(a, Mat4::translation(Vec3::Z)).unwrap();
        assert!(!scene.object(b).unwrap().is_dirty());
        scene.project(&Mat4::IDENTITY);
        assert_eq!(scene.world_transform(b).unwrap().position(), Vec3::Z);
    }

    #[test]
    fn test_mark_dirty_climbs_to_root() {
        let mut scene = SceneGraph::new();
        let a = scene.add_object(scene.root()).unwrap();
        let b = scene.add_object(a).unwrap();
        scene.project(&Mat4::IDENTITY);
        assert!(!scene.is_dirty());
        scene.mark_dirty(b);
        assert!(scene.object(a).unwrap().is_dirty());
        assert!(scene.is_dirty());
    }

    #[test]
    fn test_reparent_rejects_cycles() {
        let mut scene = SceneGraph::new();
        let a = scene.add_object(scene.root()).unwrap();
        let b = scene.add_object(a).unwrap();
        assert!(matches!(scene.reparent(a, b), Err(SceneError::Cycle { .. })));
        assert!(matches!(scene.reparent(a, a), Err(SceneError::Cycle { .. })));
        assert!(matches!(
            scene.reparent(scene.root(), a),
            Err(SceneError::RootRemoval)
        ));

        scene.reparent(b, scene.root()).unwrap();
        assert_eq!(scene.object(b).unwrap().parent(), Some(scene.root()));
        assert!(scene.children(a).is_empty());
        assert_eq!(scene.children(scene.root()).len(), 2);
    }

    #[test]
    fn test_remove_object_takes_subtree() {
        let mut scene = SceneGraph::new();
        let a = scene.add_object(scene.root()).unwrap();
        let b = scene.add_object(a).unwrap();
        let ga = scene.add_geometry(a, point_geometry()).unwrap();
        let gb = scene.add_geometry(b, point_geometry()).unwrap();

        let mut removed = scene.remove_object(a).unwrap();
        removed.sort();
        let mut expected = vec![ga, gb];
        expected.sort();
        assert_eq!(removed, expected);
        assert_eq!(scene.object_count(), 1);
        assert_eq!(scene.geometry_count(), 0);
        assert!(scene.children(scene.root()).is_empty());
        assert!(matches!(
            scene.remove_object(scene.root()),
            Err(SceneError::RootRemoval)
        ));
    }

    #[test]
    fn test_gather_respects_visibility() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let shown = scene.add_object(root).unwrap();
        let grid = scene.add_object(root).unwrap();
        let g0 = scene.add_geometry(shown, point_geometry()).unwrap();
        let g1 = scene
            .add_geometry(shown, point_geometry().hidden_from(ViewMask::of(1)))
            .unwrap();
        let g2 = scene.add_geometry(grid, point_geometry()).unwrap();
        scene
            .set_visibility(grid, Visibility::HiddenFrom(ViewMask::of(1)))
            .unwrap();

        let mut eye = Vec::new();
        scene.gather(0, &mut eye);
        assert_eq!(eye, vec![g0, g1, g2]);

        let mut light = Vec::new();
        scene.gather(1, &mut light);
        assert_eq!(light, vec![g0]);

        scene.set_visibility(shown, Visibility::Hidden).unwrap();
        let mut none = Vec::new();
        scene.gather(0, &mut none);
        assert_eq!(none, vec![g2]);
    }

    #[test]
    fn test_update_geometry_refreshes_bounds() {
        let mut scene = SceneGraph::new();
        let a = scene.add_object(scene.root()).unwrap();
        let g = scene.add_geometry(a, point_geometry()).unwrap();
        scene.project(&Mat4::IDENTITY);
        scene
            .update_geometry(g, |geo| geo.vertices.push(Vec3::splat(5.0)))
            .unwrap();
        assert!(scene.is_dirty());
        assert_eq!(scene.geometry(g).unwrap().bbox.max, Vec3::splat(5.0));
        scene.project(&Mat4::IDENTITY);
        assert_eq!(scene.object(a).unwrap().bbox().max, Vec3::splat(5.0));
    }

    #[test]
    fn test_remove_geometry() {
        let mut scene = SceneGraph::new();
        let a = scene.add_object(scene.root()).unwrap();
        let g = scene.add_geometry(a, point_geometry()).unwrap();
        scene.project(&Mat4::IDENTITY);
        scene.remove_geometry(g).unwrap();
        assert!(scene.geometries_of(a).is_empty());
        assert!(scene.is_dirty());
        assert!(matches!(
            scene.remove_geometry(g),
            Err(SceneError::UnknownGeometry(_))
        ));
    }
}
