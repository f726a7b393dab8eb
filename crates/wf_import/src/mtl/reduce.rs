use std::collections::HashMap;

use log::info;
use sha2::{Digest, Sha256};

use super::material::{Material, MaterialLibrary};

/// Content hash of a material: every key, in sorted order, followed by its raw value tokens.
/// Independent of declaration order and material name.
pub fn material_hash(material: &Material) -> String {
    let mut hasher = Sha256::new();
    for (key, values) in material.sorted_properties() {
        update_field(&mut hasher, key);
        hasher.update((values.len() as u64).to_le_bytes());
        for value in values {
            update_field(&mut hasher, value);
        }
    }
    hex::encode(hasher.finalize())
}

// length prefixed, so token boundaries are part of the digest
fn update_field(hasher: &mut Sha256, field: &str) {
    hasher.update((field.len() as u64).to_le_bytes());
    hasher.update(field.as_bytes());
}

/// Maps material names onto canonical content hashes and back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReducedMaterials {
    by_name: HashMap<String, String>,
    /// hash -> first declared material with that content
    by_hash: HashMap<String, String>,
}

impl ReducedMaterials {
    pub fn reduce(library: &MaterialLibrary) -> Self {
        let mut reduced = ReducedMaterials::default();

        for material in library.iter() {
            let hash = material_hash(material);
            reduced
                .by_hash
                .entry(hash.clone())
                .or_insert_with(|| material.name.clone());
            reduced.by_name.insert(material.name.clone(), hash);
        }

        info!(
            "Reducing materials from {} to {}",
            reduced.by_name.len(),
            reduced.by_hash.len()
        );
        reduced
    }

    pub fn hash_of(&self, name: &str) -> Option<&str> {
        self.by_name.get(name).map(String::as_str)
    }

    /// The material name standing in for all materials sharing `hash`.
    pub fn representative(&self, hash: &str) -> Option<&str> {
        self.by_hash.get(hash).map(String::as_str)
    }

    pub fn material_count(&self) -> usize {
        self.by_name.len()
    }

    pub fn canonical_count(&self) -> usize {
        self.by_hash.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mtl::parse;
    use std::path::Path;

    fn library(data: &str) -> MaterialLibrary {
        match parse(data.as_bytes(), Path::new("")) {
            Ok(library) => library,
            Err(err) => panic!("{}", err),
        }
    }

    #[test]
    fn test_hash_ignores_name_and_order() {
        let library = library("newmtl a\nKd 1 0 0\nd 1\nnewmtl b\nd 1\nKd 1 0 0\n");
        let (a, b) = (library.get("a"), library.get("b"));

        assert_eq!(a.map(material_hash), b.map(material_hash));
        assert_eq!(a.map(material_hash).map(|h| h.len()), Some(64));
    }

    #[test]
    fn test_hash_is_exact() {
        let library = library("newmtl a\nd 1\nnewmtl b\nd 1.0\nnewmtl c\nd 0.5\n");
        let hashes: Vec<_> = library.iter().map(material_hash).collect();

        assert_ne!(hashes[0], hashes[1]);
        assert_ne!(hashes[0], hashes[2]);
    }

    #[test]
    fn test_hash_keeps_token_boundaries() {
        let library = library("newmtl a\nKa 1 12 0\nnewmtl b\nKa 11 2 0\nnewmtl c\nKa 1120\n");
        let reduced = ReducedMaterials::reduce(&library);

        assert_eq!(reduced.canonical_count(), 3);
        assert_ne!(reduced.hash_of("a"), reduced.hash_of("b"));
        assert_ne!(reduced.hash_of("a"), reduced.hash_of("c"));

        let hash = reduced.hash_of("b").unwrap_or_default();
        assert_eq!(reduced.representative(hash), Some("b"));
    }

    #[test]
    fn test_reduce() {
        let library = library(
            "newmtl first\nKd 1 0 0\nnewmtl second\nKd 1 0 0\nnewmtl other\nKd 0 1 0\n",
        );
        let reduced = ReducedMaterials::reduce(&library);

        assert_eq!(reduced.material_count(), 3);
        assert_eq!(reduced.canonical_count(), 2);
        assert_eq!(reduced.hash_of("first"), reduced.hash_of("second"));
        assert_ne!(reduced.hash_of("first"), reduced.hash_of("other"));

        let hash = reduced.hash_of("second").unwrap_or_default();
        assert_eq!(reduced.representative(hash), Some("first"));
        assert_eq!(reduced.hash_of("missing"), None);
    }
}
