//! Wavefront OBJ/MTL export of instanced tree geometry.
//!
//! Every instance bakes a full copy of its canonical mesh into the document.
//! Branches go into the `Cylinder` object and leaves into the `Leaf` object;
//! OBJ indices are global and 1-based, so the leaf block continues numbering
//! after the last branch vertex.

use crate::error::TreeError;
use crate::interpreter::TreeInstances;
use crate::mesh::MeshData;
use glam::{Mat3, Mat4, Vec2, Vec3};
use log::{debug, error, info};
use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const BRANCH_GROUP: &str = "Cylinder";
pub const LEAF_GROUP: &str = "Leaf";
pub const MATERIAL_NAME: &str = "Tree";

/// One `o` block of an OBJ document.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjectGroup {
    pub name: String,
    pub positions: Vec<Vec3>,
    pub tex_coords: Vec<Vec2>,
    pub normals: Vec<Vec3>,
    /// 1-based global indices; position, texcoord and normal share each index.
    pub faces: Vec<[u32; 3]>,
}

impl ObjectGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Bakes `mesh` once per instance, numbering from `base` (the number of
    /// vertices already written by earlier groups).
    fn append_instances(&mut self, mesh: &MeshData, instances: &[Mat4], local: Mat4, base: usize) {
        let stride = mesh.vertex_count();
        self.positions.reserve(stride * instances.len());
        self.tex_coords.reserve(stride * instances.len());
        self.normals.reserve(stride * instances.len());

        for (i, instance) in instances.iter().enumerate() {
            let placement = *instance * local;
            let normal_matrix = normal_matrix(placement);
            for vertex in &mesh.vertices {
                self.positions.push(placement.transform_point3(vertex.position));
                self.tex_coords.push(vertex.tex_coord);
                self.normals.push((normal_matrix * vertex.normal).normalize_or_zero());
            }

            let start = (base + i * stride) as u32 + 1;
            self.faces.extend(
                mesh.indices
                    .chunks_exact(3)
                    .map(|tri| [tri[0] + start, tri[1] + start, tri[2] + start]),
            );
        }
    }
}

fn normal_matrix(placement: Mat4) -> Mat3 {
    let linear = Mat3::from_mat4(placement);
    if linear.determinant().abs() > f32::EPSILON {
        linear.inverse().transpose()
    } else {
        linear
    }
}

/// An in-memory OBJ document.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshDocument {
    /// Stem of the companion `.mtl` file, written as `mtllib ./<stem>.mtl`.
    pub material_library: Option<String>,
    pub material: String,
    pub groups: Vec<ObjectGroup>,
}

impl MeshDocument {
    pub fn group(&self, name: &str) -> Option<&ObjectGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// Total vertices across all groups.
    pub fn vertex_count(&self) -> usize {
        self.groups.iter().map(ObjectGroup::vertex_count).sum()
    }

    pub fn face_count(&self) -> usize {
        self.groups.iter().map(|g| g.faces.len()).sum()
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        write!(out, "{self}")
    }
}

impl fmt::Display for MeshDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# symbios-tree")?;
        if let Some(lib) = &self.material_library {
            writeln!(f, "mtllib ./{lib}.mtl")?;
        }
        for group in &self.groups {
            writeln!(f)?;
            writeln!(f, "o {}", group.name)?;
            writeln!(f, "# vertex coordinates")?;
            for p in &group.positions {
                writeln!(f, "v {} {} {}", p.x, p.y, p.z)?;
            }
            writeln!(f, "\n# texture coordinates")?;
            for t in &group.tex_coords {
                writeln!(f, "vt {} {}", t.x, t.y)?;
            }
            writeln!(f, "\n# normal coordinates")?;
            for n in &group.normals {
                writeln!(f, "vn {} {} {}", n.x, n.y, n.z)?;
            }
            writeln!(f, "\n# faces")?;
            writeln!(f, "usemtl {}", self.material)?;
            for [a, b, c] in &group.faces {
                writeln!(f, "f {a}/{a}/{a} {b}/{b}/{b} {c}/{c}/{c}")?;
            }
        }
        Ok(())
    }
}

/// The `.mtl` companion: one Blinn-Phong material with a diffuse texture.
#[derive(Clone, Debug, PartialEq)]
pub struct MaterialDocument {
    pub name: String,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub illumination: u8,
    pub diffuse_map: String,
}

impl Default for MaterialDocument {
    fn default() -> Self {
        Self {
            name: MATERIAL_NAME.to_string(),
            ambient: Vec3::splat(0.2),
            diffuse: Vec3::splat(0.7),
            specular: Vec3::splat(0.7),
            illumination: 2,
            diffuse_map: "tree.png".to_string(),
        }
    }
}

impl fmt::Display for MaterialDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rgb = |v: Vec3| format!("{} {} {}", v.x, v.y, v.z);
        writeln!(f, "# symbios-tree material\n")?;
        writeln!(f, "newmtl {}\n", self.name)?;
        writeln!(f, "Ka {}", rgb(self.ambient))?;
        writeln!(f, "Kd {}", rgb(self.diffuse))?;
        writeln!(f, "Ks {}\n", rgb(self.specular))?;
        writeln!(f, "illum {}\n", self.illumination)?;
        writeln!(f, "map_Kd ./{}", self.diffuse_map)
    }
}

/// Bakes tree instances into a [`MeshDocument`].
#[derive(Clone, Debug)]
pub struct ObjExporter {
    /// Applied to every branch before its instance matrix; lowers the
    /// centred cylinder onto the segment base.
    branch_local: Mat4,
    material: String,
}

impl ObjExporter {
    /// Exporter for branch meshes of the given segment height.
    pub fn new(branch_height: f32) -> Self {
        Self {
            branch_local: branch_drop(branch_height),
            material: MATERIAL_NAME.to_string(),
        }
    }

    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        self.material = material.into();
        self
    }

    /// Builds the two-group document. Empty instance lists give groups with
    /// no vertices or faces.
    pub fn export(
        &self,
        branch_mesh: &MeshData,
        leaf_mesh: &MeshData,
        instances: &TreeInstances,
    ) -> MeshDocument {
        let mut branches = ObjectGroup::new(BRANCH_GROUP);
        branches.append_instances(branch_mesh, &instances.branches, self.branch_local, 0);

        let mut leaves = ObjectGroup::new(LEAF_GROUP);
        let base = branches.vertex_count();
        leaves.append_instances(leaf_mesh, &instances.leaves, Mat4::IDENTITY, base);

        MeshDocument {
            material_library: None,
            material: self.material.clone(),
            groups: vec![branches, leaves],
        }
    }
}

/// Translation that drops a centred branch mesh by one segment height.
pub fn branch_drop(branch_height: f32) -> Mat4 {
    Mat4::from_translation(Vec3::new(0.0, -branch_height, 0.0))
}

/// Files written by [`write_obj_files`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportPaths {
    pub obj: PathBuf,
    pub mtl: PathBuf,
}

/// Picks `<stem>`, then `<stem>_1`, `<stem>_2`, ... until neither the `.obj`
/// nor the `.mtl` with that name exists in `dir`.
///
/// Not safe against concurrent writers: the probe and the create are separate.
pub fn unique_stem(dir: &Path, stem: &str) -> String {
    let taken = |s: &str| {
        dir.join(format!("{s}.obj")).exists() || dir.join(format!("{s}.mtl")).exists()
    };
    if !taken(stem) {
        return stem.to_string();
    }
    (1u32..)
        .map(|n| format!("{stem}_{n}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| stem.to_string())
}

/// Writes `document` and `material` to a free name derived from `stem`.
///
/// The document's `mtllib` line is pointed at the chosen name. The material's
/// `diffuse_map` is referenced, not written: put the texture beside the
/// `.mtl` with [`copy_texture`]. On failure nothing is retried, no partial
/// pair is left behind and the caller's geometry is untouched.
pub fn write_obj_files(
    dir: &Path,
    stem: &str,
    document: &MeshDocument,
    material: &MaterialDocument,
) -> Result<ExportPaths, TreeError> {
    let chosen = unique_stem(dir, stem);
    let paths = ExportPaths {
        obj: dir.join(format!("{chosen}.obj")),
        mtl: dir.join(format!("{chosen}.mtl")),
    };

    let mut document = document.clone();
    document.material_library = Some(chosen);

    if let Err(e) = write_pair(&paths, &document, material) {
        error!("export to {} failed: {e}", paths.obj.display());
        return Err(e);
    }

    info!(
        "exported {} vertices / {} faces to {}",
        document.vertex_count(),
        document.face_count(),
        paths.obj.display()
    );
    Ok(paths)
}

/// Material first, then the document. A failed document write removes the
/// material again so the stem stays free.
fn write_pair(
    paths: &ExportPaths,
    document: &MeshDocument,
    material: &MaterialDocument,
) -> Result<(), TreeError> {
    let mut mtl = BufWriter::new(File::create(&paths.mtl)?);
    write!(mtl, "{material}")?;
    mtl.flush()?;
    drop(mtl);

    let written = File::create(&paths.obj).and_then(|file| {
        let mut obj = BufWriter::new(file);
        document.write_to(&mut obj)?;
        obj.flush()
    });
    if let Err(e) = written {
        let _ = fs::remove_file(&paths.obj);
        let _ = fs::remove_file(&paths.mtl);
        return Err(e.into());
    }
    Ok(())
}

/// Copies the diffuse texture at `source` next to a written `.mtl`, under
/// the name its `map_Kd` line expects.
pub fn copy_texture(
    source: &Path,
    dir: &Path,
    material: &MaterialDocument,
) -> Result<PathBuf, TreeError> {
    let target = dir.join(&material.diffuse_map);
    if let Err(e) = fs::copy(source, &target) {
        error!(
            "copying texture {} to {} failed: {e}",
            source.display(),
            target.display()
        );
        return Err(e.into());
    }
    debug!("copied texture to {}", target.display());
    Ok(target)
}
