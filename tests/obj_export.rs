// tests/obj_export.rs
mod common;

use common::MeanRandom;
use std::collections::HashMap;
use symbios_tree::{
    BRANCH_GROUP, GeometryParameters, LEAF_GROUP, MaterialDocument, MeshData, MeshDocument,
    ObjExporter, TreeInstances, TreeInterpreter, copy_texture, write_obj_files,
};

/// Per-group counts of `v`, `vt`, `vn` and `f` lines, plus every face index.
#[derive(Default, Debug)]
struct GroupStats {
    v: usize,
    vt: usize,
    vn: usize,
    f: usize,
    indices: Vec<u32>,
}

fn parse_groups(text: &str) -> (Vec<String>, HashMap<String, GroupStats>) {
    let mut order = Vec::new();
    let mut groups: HashMap<String, GroupStats> = HashMap::new();
    let mut current = String::new();
    for line in text.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some(&head) = parts.first() else { continue };
        if head == "o" {
            current = parts[1].to_string();
            order.push(current.clone());
            continue;
        }
        let stats = groups.entry(current.clone()).or_default();
        match head {
            "v" => stats.v += 1,
            "vt" => stats.vt += 1,
            "vn" => stats.vn += 1,
            "f" => {
                stats.f += 1;
                for corner in &parts[1..] {
                    let ids: Vec<u32> = corner.split('/').map(|s| s.parse().unwrap()).collect();
                    assert_eq!(ids.len(), 3);
                    assert!(ids[0] == ids[1] && ids[1] == ids[2], "corner {corner}");
                    stats.indices.push(ids[0]);
                }
            }
            _ => {}
        }
    }
    (order, groups)
}

fn sample_tree() -> (MeshData, MeshData, TreeInstances) {
    let params = GeometryParameters::default();
    let interpreter = TreeInterpreter::new(params.clone()).unwrap();
    let instances = interpreter.interpret("F[<F][>F]F", &mut MeanRandom);
    let branch = MeshData::branch(
        bevy_math::primitives::Cylinder::new(params.branch_radius, params.branch_height),
        params.radius_scaling,
    );
    let leaf = MeshData::leaf(bevy_math::primitives::Rectangle::new(
        params.leaf_radius,
        params.leaf_height,
    ));
    (branch, leaf, instances)
}

#[test]
fn test_reparsed_counts_match_instances() {
    let (branch, leaf, instances) = sample_tree();
    let document = ObjExporter::new(1.0).export(&branch, &leaf, &instances);
    let (order, groups) = parse_groups(&document.to_string());

    assert_eq!(order, vec![BRANCH_GROUP.to_string(), LEAF_GROUP.to_string()]);

    let branches = &groups[BRANCH_GROUP];
    let expected_v = instances.branches.len() * branch.vertex_count();
    assert_eq!(branches.v, expected_v);
    assert_eq!(branches.vt, expected_v);
    assert_eq!(branches.vn, expected_v);
    assert_eq!(branches.f, instances.branches.len() * branch.triangle_count());

    let leaves = &groups[LEAF_GROUP];
    let expected_leaf_v = instances.leaves.len() * leaf.vertex_count();
    assert_eq!(leaves.v, expected_leaf_v);
    assert_eq!(leaves.f, instances.leaves.len() * leaf.triangle_count());
}

#[test]
fn test_face_indices_stay_inside_their_blocks() {
    let (branch, leaf, instances) = sample_tree();
    let document = ObjExporter::new(1.0).export(&branch, &leaf, &instances);
    let (_, groups) = parse_groups(&document.to_string());
    let total = document.vertex_count() as u32;

    let branch_v = groups[BRANCH_GROUP].v as u32;
    let stride = branch.vertex_count() as u32;
    let branch_faces_per_instance = branch.indices.len();
    for (n, chunk) in groups[BRANCH_GROUP]
        .indices
        .chunks(branch_faces_per_instance)
        .enumerate()
    {
        let lo = n as u32 * stride + 1;
        let hi = (n as u32 + 1) * stride;
        assert!(chunk.iter().all(|&i| (lo..=hi).contains(&i)));
    }

    let leaf_stride = leaf.vertex_count() as u32;
    for (n, chunk) in groups[LEAF_GROUP].indices.chunks(leaf.indices.len()).enumerate() {
        let lo = branch_v + n as u32 * leaf_stride + 1;
        let hi = branch_v + (n as u32 + 1) * leaf_stride;
        assert!(chunk.iter().all(|&i| (lo..=hi).contains(&i)));
    }

    let max = groups.values().flat_map(|g| g.indices.iter()).max().copied();
    assert_eq!(max, Some(total));
}

#[test]
fn test_empty_tree_exports_empty_groups() {
    let (branch, leaf, _) = sample_tree();
    let document = ObjExporter::new(1.0).export(&branch, &leaf, &TreeInstances::default());
    let (order, groups) = parse_groups(&document.to_string());
    assert_eq!(order.len(), 2);
    for name in [BRANCH_GROUP, LEAF_GROUP] {
        let stats = groups.get(name);
        assert!(stats.is_none_or(|s| s.v == 0 && s.f == 0));
    }
    assert_eq!(document.vertex_count(), 0);
}

#[test]
fn test_files_get_numeric_suffix_on_collision() {
    let dir = tempfile::tempdir().unwrap();
    let document = MeshDocument {
        material: "Tree".into(),
        ..Default::default()
    };
    let material = MaterialDocument::default();

    let first = write_obj_files(dir.path(), "tree", &document, &material).unwrap();
    let second = write_obj_files(dir.path(), "tree", &document, &material).unwrap();
    let third = write_obj_files(dir.path(), "tree", &document, &material).unwrap();

    assert_eq!(first.obj, dir.path().join("tree.obj"));
    assert_eq!(second.obj, dir.path().join("tree_1.obj"));
    assert_eq!(third.mtl, dir.path().join("tree_2.mtl"));

    let text = std::fs::read_to_string(&second.obj).unwrap();
    assert!(text.contains("mtllib ./tree_1.mtl"));
    let mtl = std::fs::read_to_string(&third.mtl).unwrap();
    assert!(mtl.contains("newmtl Tree"));
}

#[test]
fn test_unwritable_directory_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("does/not/exist");
    let result = write_obj_files(
        &missing,
        "tree",
        &MeshDocument::default(),
        &MaterialDocument::default(),
    );
    assert!(matches!(result, Err(symbios_tree::TreeError::Io(_))));
}

#[test]
fn test_failed_export_keeps_stem_free() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let document = MeshDocument::default();
    let material = MaterialDocument::default();
    assert!(write_obj_files(&out, "tree", &document, &material).is_err());

    std::fs::create_dir(&out).unwrap();
    assert_eq!(std::fs::read_dir(&out).unwrap().count(), 0);
    let paths = write_obj_files(&out, "tree", &document, &material).unwrap();
    assert_eq!(paths.obj, out.join("tree.obj"));
    assert!(paths.mtl.exists());
}

#[test]
fn test_texture_copied_beside_material() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("source.png");
    std::fs::write(&source, b"png").unwrap();
    let out = dir.path().join("out");
    std::fs::create_dir(&out).unwrap();

    let material = MaterialDocument::default();
    let target = copy_texture(&source, &out, &material).unwrap();
    assert_eq!(target, out.join("tree.png"));
    assert_eq!(std::fs::read(&target).unwrap(), b"png");

    let missing = copy_texture(&dir.path().join("nope.png"), &out, &material);
    assert!(matches!(missing, Err(symbios_tree::TreeError::Io(_))));
}
