use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::utils;

/// Maps every group whose name contains `contains` onto the material `material`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MaterialAlias {
    pub contains: String,
    pub material: String,
}

/// Per-file import settings, read from a `.toml` file next to the `.obj` file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ImportMeta {
    /// Directive that starts a new group; empty to build one mesh from the whole file.
    pub split_on: String,
    /// Fail instead of dropping texture coordinates or normals that don't line up with the positions.
    pub strict_attributes: bool,
    /// Gather groups sharing identical material definitions into one mesh.
    pub merge_by_material: bool,
    /// Name of the group holding faces read before the first split directive.
    pub default_group: String,
    pub aliases: Vec<MaterialAlias>,
}

impl Default for ImportMeta {
    fn default() -> Self {
        Self {
            split_on: "usemtl".into(),
            strict_attributes: false,
            merge_by_material: false,
            default_group: "default".into(),
            aliases: Vec::new(),
        }
    }
}

impl ImportMeta {
    pub fn parse(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        let meta: Self = toml::from_slice(&data)
            .with_context(|| format!("Invalid import meta: {}", path.display()))?;
        Ok(meta)
    }

    /// Parse meta from file called `file.toml` or alternatively from folder scoped meta file named `obj.toml` or else use default meta
    pub fn locate(path: &Path) -> Result<Self> {
        let dir = path
            .parent()
            .with_context(|| format!("Path terminates in root or prefix: {}", path.display()))?;
        let meta_file = utils::file_name(path)?;

        let path = utils::combine_path(dir, meta_file, "toml")?;
        if path.is_file() {
            return ImportMeta::parse(&path);
        }

        // check if folder scoped meta exists
        let path = utils::combine_path(dir, "obj", "toml")?;
        if path.is_file() {
            return ImportMeta::parse(&path);
        }

        Ok(ImportMeta::default())
    }

    pub fn split_directive(&self) -> Option<&str> {
        if self.split_on.is_empty() {
            None
        } else {
            Some(&self.split_on)
        }
    }

    /// Material name a group resolves to; the first matching alias wins.
    pub fn remap<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases
            .iter()
            .find(|alias| name.contains(alias.contains.as_str()))
            .map(|alias| alias.material.as_str())
            .unwrap_or(name)
    }
}
