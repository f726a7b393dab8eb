use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

/// Property keys of a `.mtl` material. Keys without meaning to the importer land in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    /// `Ka`
    AmbientColor,
    /// `Kd`
    DiffuseColor,
    /// `Ks`
    SpecularColor,
    /// `d`
    Dissolve,
    /// `Ns`
    SpecularExponent,
    /// `illum`
    Illumination,
    /// `map_Kd`
    DiffuseMap,
    Other(String),
}

impl PropertyKey {
    pub fn as_str(&self) -> &str {
        match self {
            PropertyKey::AmbientColor => "Ka",
            PropertyKey::DiffuseColor => "Kd",
            PropertyKey::SpecularColor => "Ks",
            PropertyKey::Dissolve => "d",
            PropertyKey::SpecularExponent => "Ns",
            PropertyKey::Illumination => "illum",
            PropertyKey::DiffuseMap => "map_Kd",
            PropertyKey::Other(key) => key.as_str(),
        }
    }
}

impl From<&str> for PropertyKey {
    fn from(key: &str) -> Self {
        match key {
            "Ka" => PropertyKey::AmbientColor,
            "Kd" => PropertyKey::DiffuseColor,
            "Ks" => PropertyKey::SpecularColor,
            "d" => PropertyKey::Dissolve,
            "Ns" => PropertyKey::SpecularExponent,
            "illum" => PropertyKey::Illumination,
            "map_Kd" => PropertyKey::DiffuseMap,
            other => PropertyKey::Other(other.into()),
        }
    }
}

/// A named material with its raw, uncoerced property tokens.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Material {
    pub name: String,
    properties: HashMap<PropertyKey, Vec<String>>,
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: HashMap::new(),
        }
    }

    /// Stores the tokens of a property line; a repeated key replaces the earlier value.
    pub fn set(&mut self, key: PropertyKey, values: Vec<String>) {
        self.properties.insert(key, values);
    }

    pub fn get(&self, key: &PropertyKey) -> Option<&[String]> {
        self.properties.get(key).map(Vec::as_slice)
    }

    /// Properties ordered by their key as written in the file.
    pub fn sorted_properties(&self) -> Vec<(&str, &[String])> {
        let mut properties: Vec<_> = self
            .properties
            .iter()
            .map(|(key, values)| (key.as_str(), values.as_slice()))
            .collect();
        properties.sort_by(|a, b| a.0.cmp(b.0));
        properties
    }
}

/// All materials of one `.mtl` file in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialLibrary {
    materials: Vec<Material>,
    index: HashMap<String, usize>,
    /// Directory texture files are resolved against.
    pub base_dir: PathBuf,
}

impl MaterialLibrary {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            ..Default::default()
        }
    }

    /// Returns the material called `name`, creating it if it wasn't declared before.
    pub fn declare(&mut self, name: &str) -> &mut Material {
        let idx = match self.index.get(name) {
            Some(idx) => *idx,
            None => {
                self.materials.push(Material::new(name));
                self.index.insert(name.into(), self.materials.len() - 1);
                self.materials.len() - 1
            }
        };
        &mut self.materials[idx]
    }

    pub fn get(&self, name: &str) -> Option<&Material> {
        self.index.get(name).map(|idx| &self.materials[*idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Material> {
        self.materials.iter()
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn resolve_path(&self, file: &str) -> PathBuf {
        self.base_dir.join(Path::new(file))
    }
}
