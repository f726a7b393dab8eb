use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use wf_format::{mesh::Cell, representation::Representations};
use wf_import::{
    export::REPRESENTATIONS_FILE,
    load_scene,
    mtl::{self, ReducedMaterials, RepresentationResolver},
    obj::{self, ObjImport, ParserError},
    DirectorySink, ImportMeta, Scene,
};

fn data(file: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data").join(file)
}

fn import(obj: &str) -> Result<ObjImport, ParserError> {
    obj::import(obj.as_bytes(), ImportMeta::default())
}

#[test]
pub fn test_single_material_triangle() -> anyhow::Result<()> {
    let import = import("v 0 0 0\nv 1 0 0\nv 1 1 0\nusemtl red\nf 1 2 3\n")?;
    let library = mtl::parse("newmtl red\nKd 1 0 0\nd 1\n".as_bytes(), Path::new(""))?;
    let scene = Scene::assemble(import, &library, &ImportMeta::default())?;

    assert_eq!(scene.entries.len(), 1);
    let red = &scene.entries[0];
    assert_eq!(red.key, "red");
    assert_eq!(red.mesh.point_count(), 3);
    assert_eq!(red.mesh.cells, vec![Cell::new(vec![0, 1, 2])]);
    assert_eq!(red.representation.diffuse_color, Some([1.0, 0.0, 0.0]));
    assert_eq!(red.representation.opacity, Some(1.0));
    assert_eq!(red.representation.ambient, None);

    assert_eq!(
        scene.representations.to_json()?,
        "{\n  \"red\": {\n    \"DiffuseColor\": [\n      1.0,\n      0.0,\n      0.0\n    ],\n    \"Opacity\": 1.0\n  }\n}"
    );
    Ok(())
}

#[test]
pub fn test_fixture_groups() -> anyhow::Result<()> {
    let import = obj::load(&data("scene.obj"), ImportMeta::default())?;

    let names: Vec<_> = import.groups.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, vec!["wood", "painted steel", "wood_copy"]);
    assert_eq!(import.material_libraries, vec!["scene.mtl".to_owned()]);
    assert!(import.warnings.is_empty());

    let wood = &import.groups[0].mesh;
    assert_eq!(wood.point_count(), 4);
    assert_eq!(wood.to_cell_array(), vec![4, 0, 1, 2, 3]);
    assert_eq!(wood.tcoords.as_ref().map(|t| t[2]), Some([1.0, 1.0]));
    assert_eq!(wood.normals.as_ref().map(Vec::len), Some(4));

    // negative indices resolve against the six positions read so far
    let steel = &import.groups[1].mesh;
    assert_eq!(steel.point_count(), 4);
    assert_eq!(steel.cells, vec![Cell::new(vec![0, 1, 2]), Cell::new(vec![0, 2, 3])]);
    assert_eq!(steel.positions[3], [0.0, 1.0, 0.0]);
    assert_eq!(steel.tcoords.as_ref().map(|t| t[3]), Some([0.0, 1.0]));
    Ok(())
}

#[test]
pub fn test_index_bounds_and_dedup() -> anyhow::Result<()> {
    let import = obj::load(&data("scene.obj"), ImportMeta::default())?;

    for group in &import.groups {
        let mesh = &group.mesh;
        let mut seen: HashMap<u32, ([u64; 3], Option<[u64; 2]>)> = HashMap::new();

        for &i in mesh.cells.iter().flat_map(|c| c.indices.iter()) {
            assert!((i as usize) < mesh.point_count());
            let position = mesh.positions[i as usize].map(f64::to_bits);
            let tcoord = mesh.tcoords.as_ref().map(|t| t[i as usize].map(f64::to_bits));
            if let Some(previous) = seen.insert(i, (position, tcoord)) {
                assert_eq!(previous, (position, tcoord));
            }
        }

        // no two output vertices carry the same attribute tuple
        let mut tuples: Vec<_> = seen.values().collect();
        tuples.sort();
        tuples.dedup();
        assert_eq!(tuples.len(), mesh.point_count(), "group {}", group.name);
    }
    Ok(())
}

#[test]
pub fn test_reimport_is_identical() -> anyhow::Result<()> {
    let first = load_scene(&data("scene.obj"), None, &ImportMeta::default())?;
    let second = load_scene(&data("scene.obj"), None, &ImportMeta::default())?;

    assert_eq!(first.entries.len(), second.entries.len());
    for (a, b) in first.entries.iter().zip(&second.entries) {
        assert_eq!(a.key, b.key);
        assert_eq!(a.mesh.to_bytes()?, b.mesh.to_bytes()?);
    }
    assert_eq!(first.representations.to_json()?, second.representations.to_json()?);
    Ok(())
}

#[test]
pub fn test_fixture_materials() -> anyhow::Result<()> {
    let library = mtl::load(&data("scene.mtl"))?;
    let reduced = ReducedMaterials::reduce(&library);

    assert_eq!(reduced.material_count(), 3);
    assert_eq!(reduced.canonical_count(), 2);
    assert_eq!(reduced.hash_of("wood"), reduced.hash_of("wood_copy"));

    let mut resolver = RepresentationResolver::new(&library, &reduced);
    let steel = resolver.resolve("painted steel");
    assert_eq!(steel.specular_power, Some(250.0));
    assert_eq!(steel.opacity, Some(0.9));
    assert_eq!((steel.ambient, steel.diffuse, steel.specular), (Some(true), Some(true), Some(false)));

    let wood = resolver.resolve("wood");
    assert_eq!(wood.texture.as_deref(), Some(data("textures/wood.png").as_path()));
    Ok(())
}

#[test]
pub fn test_merge_by_material_and_export() -> anyhow::Result<()> {
    let meta = ImportMeta {
        merge_by_material: true,
        ..ImportMeta::default()
    };
    let scene = load_scene(&data("scene.obj"), None, &meta)?;

    assert_eq!(scene.entries.len(), 2);
    assert_eq!(scene.entries[0].groups, vec!["wood", "wood_copy"]);
    assert_eq!(scene.entries[0].mesh.point_count(), 7);
    assert_eq!(scene.entries[1].groups, vec!["painted steel"]);

    let dir = tempfile::tempdir()?;
    let mut sink = DirectorySink::new(dir.path())?;
    scene.export(&mut sink)?;

    assert_eq!(sink.written().len(), 2);
    let written = Representations::from_file(&dir.path().join(REPRESENTATIONS_FILE))?;
    assert_eq!(written.len(), 2);
    for entry in &scene.entries {
        assert_eq!(entry.key.len(), 64);
        assert!(written.get(&entry.key).is_some());
    }

    let json = fs::read_to_string(dir.path().join(REPRESENTATIONS_FILE))?;
    assert!(json.contains("\"SpecularPower\": 250.0"));
    assert!(!json.contains("wood.png"));
    Ok(())
}

#[test]
pub fn test_explicit_material_library() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let obj = dir.path().join("model.obj");
    let mtl = dir.path().join("other.mtl");
    fs::write(&obj, "v 0 0 0\nv 1 0 0\nv 0 1 0\nusemtl m\nf 1 2 3\n")?;
    fs::write(&mtl, "newmtl m\nNs 5\n")?;

    let without = load_scene(&obj, None, &ImportMeta::default())?;
    assert_eq!(without.entries[0].representation.specular_power, None);

    let with = load_scene(&obj, Some(&mtl), &ImportMeta::default())?;
    assert_eq!(with.entries[0].representation.specular_power, Some(5.0));
    Ok(())
}

#[test]
pub fn test_malformed_file_reports_line() {
    let dir = match tempfile::tempdir() {
        Ok(dir) => dir,
        Err(err) => panic!("{}", err),
    };
    let obj = dir.path().join("broken.obj");
    if let Err(err) = fs::write(&obj, "v 0 0 0\nv 1 0\n") {
        panic!("{}", err);
    }

    let err = match obj::load(&obj, ImportMeta::default()) {
        Ok(_) => panic!("broken file should not import"),
        Err(err) => err,
    };
    let message = format!("{:#}", err);
    assert!(message.contains("broken.obj"), "{}", message);
    assert!(message.contains("line 2"), "{}", message);
    assert!(matches!(
        err.downcast_ref::<ParserError>(),
        Some(ParserError::MalformedRecord { line: 2, .. })
    ));
}
