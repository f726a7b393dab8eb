mod material;
mod parser;
mod reduce;
mod resolve;

use anyhow::{Context, Result};
use std::path::Path;

pub use self::material::{Material, MaterialLibrary, PropertyKey};
pub use self::parser::{parse, parse_file, MtlError};
pub use self::reduce::{material_hash, ReducedMaterials};
pub use self::resolve::RepresentationResolver;

/// Parses a `.mtl` file; texture paths resolve against its directory.
pub fn load(path: &Path) -> Result<MaterialLibrary> {
    parse_file(path).with_context(|| format!("Could not read material library {}", path.display()))
}
