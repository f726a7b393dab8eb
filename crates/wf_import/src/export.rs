use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::{
    collections::{BTreeMap, HashSet},
    path::{Path, PathBuf},
};

use wf_format::{
    mesh::IndexedMesh,
    representation::{RepresentationParameters, Representations},
};

use crate::utils;

pub const MESH_EXTENSION: &str = "wfm";
pub const REPRESENTATIONS_FILE: &str = "representations.json";
/// Maps every mesh key onto the file it was written to.
pub const MESH_INDEX_FILE: &str = "meshes.json";

/// Receives the finished meshes of an import, e.g. to store, render or register them elsewhere.
pub trait MeshSink {
    fn add_mesh(&mut self, key: &str, mesh: &IndexedMesh, representation: &RepresentationParameters) -> Result<()>;

    /// Called once after all meshes were added.
    fn finish(&mut self, representations: &Representations) -> Result<()>;
}

/// Writes every mesh as `<key>.wfm` and the representations as `representations.json`.
/// Keys that sanitise to an already used file name get a numeric suffix (`<key>_2.wfm`),
/// `meshes.json` records which file belongs to which key.
#[derive(Debug)]
pub struct DirectorySink {
    directory: PathBuf,
    written: Vec<(String, PathBuf)>,
    /// lowercased file stems in use, case-insensitive file systems would merge the others
    used: HashSet<String>,
}

impl DirectorySink {
    pub fn new(directory: impl Into<PathBuf>) -> Result<Self> {
        let directory = directory.into();
        std::fs::create_dir_all(&directory)
            .with_context(|| format!("Could not create output folder: {}", directory.display()))?;
        Ok(Self {
            directory,
            written: Vec::new(),
            used: HashSet::new(),
        })
    }

    fn unique_file_name(&mut self, key: &str) -> String {
        let base = utils::safe_file_name(key);
        let mut name = base.clone();
        let mut suffix = 1;

        while !self.used.insert(name.to_lowercase()) {
            suffix += 1;
            name = format!("{}_{}", base, suffix);
        }

        if suffix > 1 {
            warn!("Mesh \"{}\" collides with another file name, writing it as {}", key, name);
        }
        name
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Mesh keys with the file each was written to.
    pub fn written(&self) -> &[(String, PathBuf)] {
        &self.written
    }
}

impl MeshSink for DirectorySink {
    fn add_mesh(&mut self, key: &str, mesh: &IndexedMesh, _representation: &RepresentationParameters) -> Result<()> {
        let file_name = self.unique_file_name(key);
        let target = utils::combine_path(&self.directory, &file_name, MESH_EXTENSION)?;
        let data = mesh.to_bytes().context("Could not serialize IndexedMesh")?;
        utils::write_file(&target, &data)?;

        debug!(
            "{} - {} points, {} cells => {}",
            key,
            mesh.point_count(),
            mesh.cells.len(),
            target.display()
        );
        self.written.push((key.into(), target));
        Ok(())
    }

    fn finish(&mut self, representations: &Representations) -> Result<()> {
        let target = self.directory.join(REPRESENTATIONS_FILE);
        let json = representations
            .to_json()
            .context("Could not serialize representations")?;
        utils::write_file(&target, json.as_bytes())?;

        let index: BTreeMap<&str, String> = self
            .written
            .iter()
            .filter_map(|(key, path)| {
                let file = path.file_name()?.to_str()?;
                Some((key.as_str(), file.to_owned()))
            })
            .collect();
        let json = serde_json::to_string_pretty(&index).context("Could not serialize mesh index")?;
        utils::write_file(&self.directory.join(MESH_INDEX_FILE), json.as_bytes())?;

        info!(
            "Wrote {} meshes and {} to {}",
            self.written.len(),
            REPRESENTATIONS_FILE,
            self.directory.display()
        );
        Ok(())
    }
}
