//! Wavefront OBJ import
//!
//! Reads positions, normals and texture coordinates, triangulates faces into
//! flat (unindexed) buffers and splits geometry by `g` groups. Materials are
//! not read; the caller assigns textures after loading.

use super::LoadError;
use crate::geometry::Geometry;
use crate::graph::{ObjectKey, SceneGraph};
use c3_core::{BoundingBox, Vec2, Vec3};
use std::path::Path;
use tracing::{debug, warn};

/// One `g` section, already triangulated
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjGroup {
    pub name: String,
    pub vertices: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub texcoords: Vec<Vec2>,
    pub bbox: BoundingBox,
}

impl ObjGroup {
    fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn into_geometry(self) -> Geometry {
        let mut g = Geometry::triangles().with_name(self.name);
        g.vertices = self.vertices;
        g.normals = self.normals;
        g.texcoords = self.texcoords;
        g.update_bounds();
        g
    }
}

/// Parsed OBJ file
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjModel {
    pub name: String,
    pub groups: Vec<ObjGroup>,
}

/// Resolved attribute indices of one face corner
#[derive(Clone, Copy, Debug, PartialEq)]
struct Corner {
    v: usize,
    t: Option<usize>,
    n: Option<usize>,
}

#[derive(Debug, Default)]
pub struct ObjLoader {
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    texcoords: Vec<Vec2>,
}

impl ObjLoader {
    /// Read and parse the file at `path`
    pub fn load(path: impl AsRef<Path>) -> Result<ObjModel, LoadError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => LoadError::NotFound(path.to_path_buf()),
            _ => LoadError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;
        let model = Self::parse(&source, &path.to_string_lossy());
        if model.groups.is_empty() {
            return Err(LoadError::Parse(path.to_path_buf()));
        }
        Ok(model)
    }

    /// Parse OBJ text; `name` is used in log lines and as the default model name
    ///
    /// Lines that cannot be understood are logged and skipped.
    pub fn parse(source: &str, name: &str) -> ObjModel {
        let mut loader = ObjLoader::default();
        let mut model = ObjModel {
            name: name.to_string(),
            groups: Vec::new(),
        };
        let mut group = ObjGroup::named("default");

        for (lineno, raw) in source.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.split_whitespace();
            let Some(keyword) = parts.next() else {
                continue;
            };
            match keyword {
                "v" | "vn" | "vt" => {
                    let Some(values) = parse_floats(parts) else {
                        warn!("{}:{}: bad {} line {:?}", name, lineno + 1, keyword, line);
                        continue;
                    };
                    let v = Vec3::new(values[0], values[1], values[2]);
                    match keyword {
                        "v" => loader.positions.push(v),
                        "vn" => loader.normals.push(v),
                        _ => loader.texcoords.push(Vec2::new(v.x, v.y)),
                    }
                }
                "f" => {
                    let corners: Vec<Corner> = parts
                        .filter_map(|tok| {
                            let c = loader.corner(tok);
                            if c.is_none() {
                                warn!("{}:{}: bad face corner {:?}", name, lineno + 1, tok);
                            }
                            c
                        })
                        .collect();
                    if corners.len() < 3 {
                        warn!(
                            "{}:{}: face with {} usable corners skipped",
                            name,
                            lineno + 1,
                            corners.len()
                        );
                        continue;
                    }
                    for i in 1..corners.len() - 1 {
                        for c in [corners[0], corners[i], corners[i + 1]] {
                            loader.emit(&mut group, c);
                        }
                    }
                }
                "g" => {
                    let gname = parts.collect::<Vec<_>>().join(" ");
                    if group.vertices.is_empty() {
                        group.name = gname;
                    } else {
                        let done = std::mem::replace(&mut group, ObjGroup::named(gname));
                        model.groups.push(finish_group(done, name));
                    }
                }
                "o" => {
                    if let Some(oname) = parts.next() {
                        model.name = oname.to_string();
                    }
                }
                "mtllib" | "usemtl" | "s" => {}
                other => warn!("{}:{}: unknown keyword {:?}", name, lineno + 1, other),
            }
        }
        if !group.vertices.is_empty() {
            model.groups.push(finish_group(group, name));
        }
        debug!(
            "{}: {} groups, {} triangles",
            model.name,
            model.groups.len(),
            model.groups.iter().map(ObjGroup::triangle_count).sum::<usize>()
        );
        model
    }

    fn emit(&self, group: &mut ObjGroup, c: Corner) {
        let v = self.positions[c.v];
        group.vertices.push(v);
        group.bbox.expand_to_include(v);
        if let Some(t) = c.t {
            group.texcoords.push(self.texcoords[t]);
        }
        if let Some(n) = c.n {
            group.normals.push(self.normals[n]);
        }
    }

    /// Parse `v`, `v/t`, `v/t/n` or `v//n`, checking every index is in range
    fn corner(&self, token: &str) -> Option<Corner> {
        let mut fields = token.split('/');
        let v = resolve(fields.next()?, self.positions.len())?;
        let t = match fields.next() {
            None | Some("") => None,
            Some(s) => Some(resolve(s, self.texcoords.len())?),
        };
        let n = match fields.next() {
            None | Some("") => None,
            Some(s) => Some(resolve(s, self.normals.len())?),
        };
        if fields.next().is_some() {
            return None;
        }
        Some(Corner { v, t, n })
    }
}

/// 1-based (or negative, counted from the end) index into a list of `len`
fn resolve(field: &str, len: usize) -> Option<usize> {
    let i: i64 = field.parse().ok()?;
    let idx = match i {
        0 => return None,
        i if i > 0 => i - 1,
        i => len as i64 + i,
    };
    (0..len as i64).contains(&idx).then_some(idx as usize)
}

/// Up to three floats, missing ones are zero
fn parse_floats<'a>(parts: impl Iterator<Item = &'a str>) -> Option<[f32; 3]> {
    let mut out = [0.0f32; 3];
    let mut count = 0;
    for (slot, tok) in out.iter_mut().zip(parts) {
        *slot = tok.parse().ok()?;
        count += 1;
    }
    (count > 0).then_some(out)
}

/// Drop attribute streams that do not cover every vertex
fn finish_group(mut group: ObjGroup, file: &str) -> ObjGroup {
    let n = group.vertices.len();
    if !group.normals.is_empty() && group.normals.len() != n {
        warn!(
            "{}: group {:?} has normals on only some faces, dropped",
            file, group.name
        );
        group.normals.clear();
    }
    if !group.texcoords.is_empty() && group.texcoords.len() != n {
        warn!(
            "{}: group {:?} has texcoords on only some faces, dropped",
            file, group.name
        );
        group.texcoords.clear();
    }
    group
}

/// Load `path` as a new object under `parent`, one geometry per group
///
/// Failures are logged and yield `None`.
pub fn load_obj(path: impl AsRef<Path>, scene: &mut SceneGraph, parent: ObjectKey) -> Option<ObjectKey> {
    let path = path.as_ref();
    let model = match ObjLoader::load(path) {
        Ok(m) => m,
        Err(e) => {
            warn!("model not loaded: {}", e);
            return None;
        }
    };
    match attach(model, scene, parent) {
        Ok(key) => Some(key),
        Err(e) => {
            warn!("{}: {}", path.display(), e);
            None
        }
    }
}

fn attach(model: ObjModel, scene: &mut SceneGraph, parent: ObjectKey) -> Result<ObjectKey, LoadError> {
    let object = scene.add_object(parent)?;
    scene.set_name(object, model.name.clone())?;
    for group in model.groups {
        let bbox = group.bbox;
        let name = group.name.clone();
        scene.add_geometry(object, group.into_geometry())?;
        debug!(
            "{} {}: bbox {:?} - {:?}",
            model.name, name, bbox.min, bbox.max
        );
    }
    Ok(object)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE: &str = "\
# one triangle
v 0 0 0
v 1 0 0
v 0 2 0.5
vn 0 0 1
vt 0 0
vt 1 0
vt 0 1
f 1/1/1 2/2/1 3/3/1
";

    #[test]
    fn test_single_triangle() {
        let model = ObjLoader::parse(TRIANGLE, "tri.obj");
        assert_eq!(model.groups.len(), 1);
        let g = &model.groups[0];
        assert_eq!(g.vertices.len(), 3);
        assert_eq!(g.normals, vec![Vec3::Z; 3]);
        assert_eq!(g.texcoords[2], Vec2::new(0.0, 1.0));
        assert_eq!(g.bbox.min, Vec3::ZERO);
        assert_eq!(g.bbox.max, Vec3::new(1.0, 2.0, 0.5));
    }

    #[test]
    fn test_normal_index_is_one_based() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 1 0 0\nvn 0 1 0\nf 1//2 2//2 3//2\n";
        let model = ObjLoader::parse(src, "n.obj");
        assert_eq!(model.groups[0].normals, vec![Vec3::Y; 3]);
        assert!(model.groups[0].texcoords.is_empty());
    }

    #[test]
    fn test_quad_is_fan_triangulated() {
        let src = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n";
        let model = ObjLoader::parse(src, "quad.obj");
        let g = &model.groups[0];
        assert_eq!(g.triangle_count(), 2);
        assert_eq!(g.vertices[3], Vec3::ZERO);
        assert_eq!(g.vertices[5], Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_negative_indices() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n";
        let model = ObjLoader::parse(src, "neg.obj");
        assert_eq!(model.groups[0].vertices[2], Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_bad_corners_are_skipped() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 9\nf 1 x 3\nf 1 2 3 0\n";
        let model = ObjLoader::parse(src, "bad.obj");
        // only the last face keeps three corners
        assert_eq!(model.groups.len(), 1);
        assert_eq!(model.groups[0].triangle_count(), 1);
    }

    #[test]
    fn test_groups_split_geometry() {
        let src = "o nozzle\nv 0 0 0\nv 1 0 0\nv 0 1 0\nv 0 0 5\n\
                   g tip\nf 1 2 3\ng body\nf 1 2 4\nusemtl brass\n";
        let model = ObjLoader::parse(src, "two.obj");
        assert_eq!(model.name, "nozzle");
        let names: Vec<_> = model.groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, ["tip", "body"]);
        assert_eq!(model.groups[0].bbox.max.z, 0.0);
        assert_eq!(model.groups[1].bbox.max.z, 5.0);
    }

    #[test]
    fn test_partial_normals_are_dropped() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf 1//1 2//1 3//1\nf 1 2 3\n";
        let model = ObjLoader::parse(src, "mix.obj");
        assert_eq!(model.groups[0].vertices.len(), 6);
        assert!(model.groups[0].normals.is_empty());
    }

    #[test]
    fn test_load_into_scene() {
        let mut scene = SceneGraph::new();
        let model = ObjLoader::parse(TRIANGLE, "tri.obj");
        let root = scene.root();
        let obj = attach(model, &mut scene, root).unwrap();
        assert_eq!(scene.geometries_of(obj).len(), 1);
        assert_eq!(scene.object(obj).unwrap().name, "tri.obj");
    }

    #[test]
    fn test_missing_file_yields_none() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        assert!(load_obj("/nonexistent/c3/nozzle.obj", &mut scene, root).is_none());
        assert_eq!(scene.object_count(), 1);
    }

    #[test]
    fn test_load_errors() {
        assert!(matches!(
            ObjLoader::load("/nonexistent/c3/nozzle.obj"),
            Err(LoadError::NotFound(_))
        ));
        let path = std::env::temp_dir().join("c3_scene_faceless.obj");
        std::fs::write(&path, "v 0 0 0\nv 1 0 0\n").unwrap();
        assert!(matches!(ObjLoader::load(&path), Err(LoadError::Parse(_))));
        std::fs::write(&path, TRIANGLE).unwrap();
        assert_eq!(ObjLoader::load(&path).unwrap().groups.len(), 1);
        let _ = std::fs::remove_file(&path);
    }
}
