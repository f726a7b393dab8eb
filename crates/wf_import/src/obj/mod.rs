mod builder;
mod parser;

use anyhow::{Context, Result};
use log::{info, warn};
use std::path::Path;

use crate::meta::ImportMeta;

pub use self::builder::{
    Attribute, AttributeCounts, AttributeMismatch, MeshGroup, ObjFace, ObjFaceIndex, ObjGroup, ObjImport,
    ObjMeshBuilder, ObjMeshData, VertexKey,
};
pub use self::parser::{parse, parse_file, ParserError};

/// Parses a `.obj` stream and builds one indexed mesh per group.
pub fn import<R: std::io::BufRead>(reader: R, meta: ImportMeta) -> Result<ObjImport, ParserError> {
    parse(reader, meta)?.build()
}

/// Parses a `.obj` file and builds one indexed mesh per group.
pub fn load(path: &Path, meta: ImportMeta) -> Result<ObjImport> {
    info!("Processing Wavefront `.obj`-file: `{}`", path.display());

    let import = parse_file(path, meta)
        .and_then(ObjMeshBuilder::build)
        .with_context(|| format!("Could not import {}", path.display()))?;

    for warning in &import.warnings {
        warn!("{}: {}", path.display(), warning);
    }
    info!("Built {} mesh groups from {}", import.groups.len(), path.display());

    Ok(import)
}
