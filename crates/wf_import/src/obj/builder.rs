use std::{collections::HashMap, fmt};

use log::debug;
use wf_format::mesh::{Cell, IndexedMesh};

use super::parser::ParserError;
use crate::meta::ImportMeta;

/// The vertex attribute arrays of a `.obj` file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    Position,
    TexCoord,
    Normal,
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribute::Position => write!(f, "position"),
            Attribute::TexCoord => write!(f, "texture coordinate"),
            Attribute::Normal => write!(f, "normal"),
        }
    }
}

/// Resolved, 0-based indices of one face vertex.
/// Missing texture coordinate and normal indices fall back to the position index.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ObjFaceIndex {
    pub position: usize,
    pub tcoord: Option<usize>,
    pub normal: Option<usize>,
}

impl ObjFaceIndex {
    pub fn tcoord_index(&self) -> usize {
        self.tcoord.unwrap_or(self.position)
    }

    pub fn normal_index(&self) -> usize {
        self.normal.unwrap_or(self.position)
    }

    pub fn key(&self) -> VertexKey {
        VertexKey {
            position: self.position,
            tcoord: self.tcoord_index(),
            normal: self.normal_index(),
        }
    }
}

/// Deduplication key of a face vertex within one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexKey {
    pub position: usize,
    pub tcoord: usize,
    pub normal: usize,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ObjFace {
    /// Source line, kept for diagnostics.
    pub line: usize,
    pub face_i: Vec<ObjFaceIndex>,
}

#[derive(Debug, Default, Clone)]
pub struct ObjGroup {
    /// `None` only for the implicit group opened at stream start.
    pub name: Option<String>,
    pub faces: Vec<ObjFace>,
}

#[derive(Debug, Default)]
pub struct ObjMeshData {
    pub groups: Vec<ObjGroup>,
    pub positions: Vec<[f64; 3]>,
    pub tcoords: Vec<[f64; 2]>,
    pub normals: Vec<[f64; 3]>,
    pub material_libraries: Vec<String>,
}

/// Number of entries accumulated so far per attribute.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AttributeCounts {
    pub positions: usize,
    pub tcoords: usize,
    pub normals: usize,
}

impl AttributeCounts {
    pub fn of(&self, attribute: Attribute) -> usize {
        match attribute {
            Attribute::Position => self.positions,
            Attribute::TexCoord => self.tcoords,
            Attribute::Normal => self.normals,
        }
    }
}

/// An attribute dropped from the whole-file mesh because its count disagrees with the positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeMismatch {
    pub attribute: Attribute,
    pub expected: usize,
    pub found: usize,
}

impl fmt::Display for AttributeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "dropped {} array: {} entries for {} positions",
            self.attribute, self.found, self.expected
        )
    }
}

/// A finished group: its name and deduplicated mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshGroup {
    pub name: String,
    pub mesh: IndexedMesh,
}

/// Everything produced from one `.obj` stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjImport {
    pub groups: Vec<MeshGroup>,
    pub warnings: Vec<AttributeMismatch>,
    pub material_libraries: Vec<String>,
}

#[derive(Debug, Default)]
pub struct ObjMeshBuilder {
    pub(crate) mesh: ObjMeshData,
    pub(crate) curr_group: ObjGroup,
    pub(crate) meta: ImportMeta,
}

impl ObjMeshBuilder {
    pub fn new(meta: ImportMeta) -> Self {
        Self {
            meta,
            ..Default::default()
        }
    }

    pub fn split_on(&self) -> Option<&str> {
        self.meta.split_directive()
    }

    pub fn counts(&self) -> AttributeCounts {
        AttributeCounts {
            positions: self.mesh.positions.len(),
            tcoords: self.mesh.tcoords.len(),
            normals: self.mesh.normals.len(),
        }
    }

    /// Opens a new, empty face list. Faces read so far stay with the previous group.
    pub fn set_group(&mut self, name: String) {
        let mut group = ObjGroup {
            name: Some(name),
            ..ObjGroup::default()
        };
        std::mem::swap(&mut group, &mut self.curr_group);
        self.mesh.groups.push(group);
    }

    pub fn push_position(&mut self, position: [f64; 3]) {
        self.mesh.positions.push(position);
    }

    pub fn push_tcoord(&mut self, tcoord: [f64; 2]) {
        self.mesh.tcoords.push(tcoord);
    }

    pub fn push_normal(&mut self, normal: [f64; 3]) {
        self.mesh.normals.push(normal);
    }

    pub fn push_face(&mut self, face: ObjFace) {
        self.curr_group.faces.push(face);
    }

    pub fn push_material_library(&mut self, name: String) {
        self.mesh.material_libraries.push(name);
    }

    pub fn build(self) -> Result<ObjImport, ParserError> {
        let meta = self.meta;
        let mut mesh = self.mesh;
        mesh.groups.push(self.curr_group); // push the last group

        // the implicit leading group only survives if faces were read before the first split
        if let Some(first) = mesh.groups.first() {
            if first.name.is_none() && first.faces.is_empty() {
                mesh.groups.remove(0);
            }
        }

        let mut import = ObjImport {
            material_libraries: std::mem::take(&mut mesh.material_libraries),
            ..ObjImport::default()
        };

        if meta.split_directive().is_some() {
            for group in &mesh.groups {
                let name = group
                    .name
                    .clone()
                    .unwrap_or_else(|| meta.default_group.clone());
                debug!("Deduplicating group \"{}\" ({} faces)", name, group.faces.len());

                import.groups.push(MeshGroup {
                    mesh: dedup_group(group, &mesh)?,
                    name,
                });
            }
        } else {
            let (whole, warnings) = whole_mesh(&mesh, &meta)?;
            import.groups.push(MeshGroup {
                name: meta.default_group.clone(),
                mesh: whole,
            });
            import.warnings = warnings;
        }

        Ok(import)
    }
}

/// Builds the compacted mesh of one group.
/// Every distinct (position, texcoord, normal) triple gets exactly one output vertex, in first-occurrence order.
pub(crate) fn dedup_group(group: &ObjGroup, data: &ObjMeshData) -> Result<IndexedMesh, ParserError> {
    let mut mapping: HashMap<VertexKey, u32> = HashMap::new();
    let mut mesh = IndexedMesh {
        tcoords: (!data.tcoords.is_empty()).then(Vec::new),
        normals: (!data.normals.is_empty()).then(Vec::new),
        ..IndexedMesh::default()
    };

    for face in &group.faces {
        let mut indices = Vec::with_capacity(face.face_i.len());

        for index in &face.face_i {
            let key = index.key();
            let idx = match mapping.get(&key) {
                Some(idx) => *idx,
                None => {
                    let idx = vertex_index(mesh.positions.len(), face.line)?;
                    mesh.positions.push(lookup(
                        &data.positions,
                        key.position,
                        Attribute::Position,
                        face.line,
                    )?);
                    if let Some(tcoords) = mesh.tcoords.as_mut() {
                        tcoords.push(lookup(&data.tcoords, key.tcoord, Attribute::TexCoord, face.line)?);
                    }
                    if let Some(normals) = mesh.normals.as_mut() {
                        normals.push(lookup(&data.normals, key.normal, Attribute::Normal, face.line)?);
                    }
                    mapping.insert(key, idx);
                    idx
                }
            };
            indices.push(idx);
        }

        mesh.cells.push(Cell::new(indices));
    }

    Ok(mesh)
}

/// Builds one mesh over the full attribute arrays, referencing positions directly.
/// Texture coordinates and normals are only kept if they line up 1:1 with the positions.
pub(crate) fn whole_mesh(
    data: &ObjMeshData,
    meta: &ImportMeta,
) -> Result<(IndexedMesh, Vec<AttributeMismatch>), ParserError> {
    let mut warnings = Vec::new();
    let expected = data.positions.len();

    let mut check = |attribute: Attribute, found: usize| -> Result<bool, ParserError> {
        if found == 0 {
            return Ok(false);
        }
        if found == expected {
            return Ok(true);
        }
        if meta.strict_attributes {
            return Err(ParserError::AttributeCountMismatch {
                attribute,
                expected,
                found,
            });
        }
        let mismatch = AttributeMismatch {
            attribute,
            expected,
            found,
        };
        debug!("{}", mismatch);
        warnings.push(mismatch);
        Ok(false)
    };

    let keep_tcoords = check(Attribute::TexCoord, data.tcoords.len())?;
    let keep_normals = check(Attribute::Normal, data.normals.len())?;

    let cells = data
        .groups
        .iter()
        .flat_map(|group| group.faces.iter())
        .map(|face| {
            face.face_i
                .iter()
                .map(|index| vertex_index(index.position, face.line))
                .collect::<Result<Vec<_>, _>>()
                .map(Cell::new)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mesh = IndexedMesh {
        positions: data.positions.clone(),
        tcoords: keep_tcoords.then(|| data.tcoords.clone()),
        normals: keep_normals.then(|| data.normals.clone()),
        cells,
    };

    Ok((mesh, warnings))
}

fn vertex_index(index: usize, line: usize) -> Result<u32, ParserError> {
    u32::try_from(index).map_err(|_| ParserError::IndexOverflow { line, count: index + 1 })
}

fn lookup<T: Copy>(values: &[T], index: usize, attribute: Attribute, line: usize) -> Result<T, ParserError> {
    values
        .get(index)
        .copied()
        .ok_or(ParserError::DanglingIndexReference {
            line,
            attribute,
            index: index as i64 + 1,
            available: values.len(),
        })
}
