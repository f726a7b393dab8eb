use anyhow::{Context, Result};
use log::{info, warn};
use std::{collections::HashMap, path::Path, path::PathBuf};

use wf_format::{
    mesh::IndexedMesh,
    representation::{RepresentationParameters, Representations},
};

use crate::{
    export::MeshSink,
    meta::ImportMeta,
    mtl::{self, MaterialLibrary, ReducedMaterials, RepresentationResolver},
    obj::{self, AttributeMismatch, ObjImport},
};

/// One output mesh: all groups sharing a key, appended in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneEntry {
    pub key: String,
    /// Names of the groups merged into this entry.
    pub groups: Vec<String>,
    pub mesh: IndexedMesh,
    pub representation: RepresentationParameters,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    pub entries: Vec<SceneEntry>,
    pub representations: Representations,
    pub warnings: Vec<AttributeMismatch>,
}

impl Scene {
    /// Associates every group of `import` with its material.
    ///
    /// Groups are gathered by name, or by canonical material hash if `merge_by_material` is set.
    /// Group names are passed through the meta aliases before looking up materials.
    pub fn assemble(import: ObjImport, library: &MaterialLibrary, meta: &ImportMeta) -> Result<Scene> {
        let reduced = ReducedMaterials::reduce(library);
        let mut resolver = RepresentationResolver::new(library, &reduced);

        let mut scene = Scene {
            warnings: import.warnings,
            ..Scene::default()
        };
        let mut by_key: HashMap<String, usize> = HashMap::new();
        let group_count = import.groups.len();

        for group in import.groups {
            let material = meta.remap(&group.name);
            let hash = if meta.merge_by_material {
                reduced.hash_of(material)
            } else {
                None
            };
            let key = hash.unwrap_or(&group.name).to_owned();

            if let Some(&idx) = by_key.get(&key) {
                let entry = &mut scene.entries[idx];
                entry
                    .mesh
                    .append(group.mesh)
                    .with_context(|| format!("Could not merge group \"{}\" into \"{}\"", group.name, key))?;
                entry.groups.push(group.name);
                continue;
            }

            let representation = resolver.resolve(hash.unwrap_or(material));
            scene.representations.insert(key.clone(), representation.clone());
            by_key.insert(key.clone(), scene.entries.len());
            scene.entries.push(SceneEntry {
                key,
                groups: vec![group.name],
                mesh: group.mesh,
                representation,
            });
        }

        info!(
            "Assembled {} meshes from {} groups",
            scene.entries.len(),
            group_count
        );
        Ok(scene)
    }

    pub fn entry(&self, key: &str) -> Option<&SceneEntry> {
        self.entries.iter().find(|entry| entry.key == key)
    }

    /// Hands every mesh and the collected representations to `sink`.
    pub fn export<S: MeshSink>(&self, sink: &mut S) -> Result<()> {
        for entry in &self.entries {
            sink.add_mesh(&entry.key, &entry.mesh, &entry.representation)?;
        }
        sink.finish(&self.representations)
    }
}

/// Picks the material library for `obj_path`: an explicit path, the first existing `mtllib`,
/// or `<obj stem>.mtl`.
pub fn material_library_path(obj_path: &Path, explicit: Option<&Path>, import: &ObjImport) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    let dir = obj_path.parent().unwrap_or_else(|| Path::new(""));
    import
        .material_libraries
        .iter()
        .map(|name| dir.join(name))
        .chain(std::iter::once(obj_path.with_extension("mtl")))
        .find(|path| path.is_file())
}

/// Loads an `.obj` file with its material library and assembles the scene.
pub fn load_scene(obj_path: &Path, mtl_path: Option<&Path>, meta: &ImportMeta) -> Result<Scene> {
    let import = obj::load(obj_path, meta.clone())?;

    let library = match material_library_path(obj_path, mtl_path, &import) {
        Some(path) => mtl::load(&path)?,
        None => {
            warn!("No material library found for {}", obj_path.display());
            MaterialLibrary::default()
        }
    };

    Scene::assemble(import, &library, meta)
}
