use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, path::Path, sync::Arc};

/// Shading parameters resolved from a material for one mesh.
///
/// Field order matches the sorted key order of the `representations.json` sidecar.
/// Unset fields are left out of the document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepresentationParameters {
    #[serde(
        rename = "Ambient",
        default,
        skip_serializing_if = "Option::is_none",
        with = "flag"
    )]
    pub ambient: Option<bool>,
    #[serde(rename = "AmbientColor", default, skip_serializing_if = "Option::is_none")]
    pub ambient_color: Option<[f64; 3]>,
    #[serde(
        rename = "Diffuse",
        default,
        skip_serializing_if = "Option::is_none",
        with = "flag"
    )]
    pub diffuse: Option<bool>,
    #[serde(rename = "DiffuseColor", default, skip_serializing_if = "Option::is_none")]
    pub diffuse_color: Option<[f64; 3]>,
    #[serde(rename = "Opacity", default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(
        rename = "Specular",
        default,
        skip_serializing_if = "Option::is_none",
        with = "flag"
    )]
    pub specular: Option<bool>,
    #[serde(rename = "SpecularColor", default, skip_serializing_if = "Option::is_none")]
    pub specular_color: Option<[f64; 3]>,
    #[serde(rename = "SpecularPower", default, skip_serializing_if = "Option::is_none")]
    pub specular_power: Option<f64>,
    /// Diffuse texture file, shared between representations of the same material.
    #[serde(skip)]
    pub texture: Option<Arc<Path>>,
}

// shading flags are stored as 1.0 / 0.0 in the sidecar document
mod flag {
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(value: &Option<bool>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(enabled) => s.serialize_f64(if *enabled { 1.0 } else { 0.0 }),
            None => s.serialize_none(),
        }
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
        Ok(Option::<f64>::deserialize(d)?.map(|value| value != 0.0))
    }
}

/// All resolved representations keyed by mesh name, in sorted key order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Representations(BTreeMap<String, RepresentationParameters>);

impl Representations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, parameters: RepresentationParameters) {
        self.0.insert(name.into(), parameters);
    }

    pub fn get(&self, name: &str) -> Option<&RepresentationParameters> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &RepresentationParameters)> {
        self.0.iter()
    }

    /// Renders the sidecar document: one object, sorted keys, two space indent.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_file(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Representations::from_json(&data)
    }
}
