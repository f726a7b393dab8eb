use std::{collections::HashMap, path::Path, sync::Arc};

use log::{debug, warn};
use wf_format::representation::RepresentationParameters;

use super::material::{Material, MaterialLibrary, PropertyKey};
use super::reduce::ReducedMaterials;

/// Turns material names (or canonical hashes) into representation parameters.
/// Texture paths are shared between all lookups of the same name.
#[derive(Debug)]
pub struct RepresentationResolver<'a> {
    library: &'a MaterialLibrary,
    reduced: &'a ReducedMaterials,
    textures: HashMap<String, Arc<Path>>,
}

impl<'a> RepresentationResolver<'a> {
    pub fn new(library: &'a MaterialLibrary, reduced: &'a ReducedMaterials) -> Self {
        Self {
            library,
            reduced,
            textures: HashMap::new(),
        }
    }

    /// Looks `name` up as material name, then as canonical hash.
    pub fn material(&self, name: &str) -> Option<&'a Material> {
        self.library.get(name).or_else(|| {
            self.reduced
                .representative(name)
                .and_then(|representative| self.library.get(representative))
        })
    }

    /// Resolves the parameters for `name`. Unknown names and missing properties leave fields unset.
    pub fn resolve(&mut self, name: &str) -> RepresentationParameters {
        let mut parameters = RepresentationParameters::default();

        let material = match self.material(name) {
            Some(material) => material,
            None => {
                debug!("No material found for \"{}\"", name);
                return parameters;
            }
        };

        parameters.ambient_color = color(material, PropertyKey::AmbientColor);
        parameters.diffuse_color = color(material, PropertyKey::DiffuseColor);
        parameters.specular_color = color(material, PropertyKey::SpecularColor);
        parameters.opacity = scalar(material, PropertyKey::Dissolve);
        parameters.specular_power = scalar(material, PropertyKey::SpecularExponent);

        // the illumination model enables ambient, diffuse and specular shading by threshold
        if let Some(illum) = scalar(material, PropertyKey::Illumination) {
            parameters.ambient = Some(illum >= 0.0);
            parameters.diffuse = Some(illum >= 1.0);
            parameters.specular = Some(illum >= 2.0);
        }

        // options like `-s 1 1 1` may precede the file name
        if let Some(file) = material.get(&PropertyKey::DiffuseMap).and_then(|values| values.last()) {
            let library = self.library;
            let texture = self
                .textures
                .entry(name.into())
                .or_insert_with(|| Arc::from(library.resolve_path(file)));
            parameters.texture = Some(Arc::clone(texture));
        }

        parameters
    }
}

fn numbers(material: &Material, key: &PropertyKey, count: usize) -> Option<Vec<f64>> {
    let values = material.get(key)?;
    if values.len() < count {
        warn!(
            "Material \"{}\": {} needs {} values, found {}",
            material.name,
            key.as_str(),
            count,
            values.len()
        );
        return None;
    }

    match values[..count]
        .iter()
        .map(|v| v.parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
    {
        Ok(numbers) => Some(numbers),
        Err(err) => {
            warn!(
                "Material \"{}\": invalid {} value {:?}: {}",
                material.name,
                key.as_str(),
                values,
                err
            );
            None
        }
    }
}

fn color(material: &Material, key: PropertyKey) -> Option<[f64; 3]> {
    numbers(material, &key, 3).map(|c| [c[0], c[1], c[2]])
}

fn scalar(material: &Material, key: PropertyKey) -> Option<f64> {
    numbers(material, &key, 1).map(|n| n[0])
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mtl::parse;

    fn library(data: &str) -> MaterialLibrary {
        match parse(data.as_bytes(), Path::new("models/car")) {
            Ok(library) => library,
            Err(err) => panic!("{}", err),
        }
    }

    #[test]
    fn test_resolve() {
        let library = library("newmtl red\nKd 1 0 0\nd 1\nNs 96.5\nKs 0.5 0.5 0.5\nKa 0 0 0\n");
        let reduced = ReducedMaterials::reduce(&library);
        let mut resolver = RepresentationResolver::new(&library, &reduced);

        let red = resolver.resolve("red");
        assert_eq!(red.diffuse_color, Some([1.0, 0.0, 0.0]));
        assert_eq!(red.specular_color, Some([0.5, 0.5, 0.5]));
        assert_eq!(red.ambient_color, Some([0.0, 0.0, 0.0]));
        assert_eq!(red.opacity, Some(1.0));
        assert_eq!(red.specular_power, Some(96.5));
        assert_eq!(red.ambient, None);
        assert_eq!(red.texture, None);
    }

    #[test]
    fn test_illumination_flags() {
        let library = library("newmtl two\nillum 2\nnewmtl one\nillum 1\nnewmtl zero\nillum 0\n");
        let reduced = ReducedMaterials::reduce(&library);
        let mut resolver = RepresentationResolver::new(&library, &reduced);

        let flags = |p: RepresentationParameters| (p.ambient, p.diffuse, p.specular);
        assert_eq!(flags(resolver.resolve("two")), (Some(true), Some(true), Some(true)));
        assert_eq!(flags(resolver.resolve("one")), (Some(true), Some(true), Some(false)));
        assert_eq!(flags(resolver.resolve("zero")), (Some(true), Some(false), Some(false)));
    }

    #[test]
    fn test_resolve_by_hash() {
        let library = library("newmtl a\nKd 0 0 1\nnewmtl b\nKd 0 0 1\n");
        let reduced = ReducedMaterials::reduce(&library);
        let mut resolver = RepresentationResolver::new(&library, &reduced);

        let hash = reduced.hash_of("b").unwrap_or_default().to_owned();
        assert_eq!(resolver.material(&hash).map(|m| m.name.as_str()), Some("a"));
        assert_eq!(resolver.resolve(&hash).diffuse_color, Some([0.0, 0.0, 1.0]));
    }

    #[test]
    fn test_unknown_and_invalid() {
        let library = library("newmtl broken\nKd 1 0\nd x\nNs 10 20\n");
        let reduced = ReducedMaterials::reduce(&library);
        let mut resolver = RepresentationResolver::new(&library, &reduced);

        assert_eq!(resolver.resolve("missing"), RepresentationParameters::default());

        let broken = resolver.resolve("broken");
        assert_eq!(broken.diffuse_color, None);
        assert_eq!(broken.opacity, None);
        assert_eq!(broken.specular_power, Some(10.0));
    }

    #[test]
    fn test_texture_is_shared() {
        let library = library("newmtl wood\nmap_Kd -s 2 2 1 textures/wood.jpg\n");
        let reduced = ReducedMaterials::reduce(&library);
        let mut resolver = RepresentationResolver::new(&library, &reduced);

        let first = resolver.resolve("wood").texture;
        let second = resolver.resolve("wood").texture;

        assert_eq!(
            first.as_deref(),
            Some(Path::new("models/car").join("textures/wood.jpg").as_path())
        );
        match (first, second) {
            (Some(a), Some(b)) => assert!(Arc::ptr_eq(&a, &b)),
            other => panic!("expected textures, got {:?}", other),
        }
    }
}
