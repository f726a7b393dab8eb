use crate::error::{FormatError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One polygon of an [`IndexedMesh`]. The cell size is the number of indices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub indices: Vec<u32>,
}

impl Cell {
    pub fn new(indices: Vec<u32>) -> Self {
        Self { indices }
    }

    pub fn size(&self) -> usize {
        self.indices.len()
    }
}

/// A polygonal mesh owning its compacted vertex attributes.
///
/// `tcoords` and `normals` are either absent or hold exactly one entry per position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexedMesh {
    pub positions: Vec<[f64; 3]>,
    pub tcoords: Option<Vec<[f64; 2]>>,
    pub normals: Option<Vec<[f64; 3]>>,
    pub cells: Vec<Cell>,
}

impl IndexedMesh {
    pub fn point_count(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() && self.cells.is_empty()
    }

    /// Flattens the cells into `[n, i0, .., in-1, n, ...]` connectivity.
    pub fn to_cell_array(&self) -> Vec<u32> {
        let mut out = Vec::with_capacity(self.cells.iter().map(|c| c.size() + 1).sum());
        for cell in &self.cells {
            out.push(cell.size() as u32);
            out.extend_from_slice(&cell.indices);
        }
        out
    }

    /// Appends `other` behind this mesh, shifting its indices past the current points.
    /// An optional attribute is only kept if both meshes carry it.
    /// Fails without modifying this mesh if the combined points don't fit `u32` indices.
    pub fn append(&mut self, other: IndexedMesh) -> Result<()> {
        if self.is_empty() {
            *self = other;
            return Ok(());
        }

        let offset = index_offset(self.positions.len(), other.positions.len())?;

        self.tcoords = match (self.tcoords.take(), other.tcoords) {
            (Some(mut tcoords), Some(more)) => {
                tcoords.extend(more);
                Some(tcoords)
            }
            _ => None,
        };
        self.normals = match (self.normals.take(), other.normals) {
            (Some(mut normals), Some(more)) => {
                normals.extend(more);
                Some(normals)
            }
            _ => None,
        };

        self.positions.extend(other.positions);
        self.cells.extend(other.cells.into_iter().map(|cell| Cell {
            indices: cell.indices.into_iter().map(|i| i + offset).collect(),
        }));
        Ok(())
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Ok(bincode::deserialize::<IndexedMesh>(&bytes)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        IndexedMesh::from_bytes(data)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(&self)?)
    }
}

// the first index of the appended points, if all combined points stay addressable
fn index_offset(len: usize, appended: usize) -> Result<u32> {
    let total = len.saturating_add(appended);
    match (u32::try_from(len), u32::try_from(total)) {
        (Ok(offset), Ok(_)) => Ok(offset),
        _ => Err(FormatError::IndexOverflow(total)),
    }
}
