//! Imports Wavefront `.obj` meshes and their `.mtl` material libraries.
//!
//! A `.obj` stream is parsed in one forward pass into an accumulator, then every group
//! (by default delimited by `usemtl`) is turned into an [`IndexedMesh`](wf_format::mesh::IndexedMesh)
//! whose vertices are the distinct position/texture coordinate/normal triples it references.
//! Materials are reduced by content hash and resolved into representation parameters.

pub mod export;
pub mod meta;
pub mod mtl;
pub mod obj;
pub mod scene;
pub mod utils;

pub use export::{DirectorySink, MeshSink};
pub use meta::ImportMeta;
pub use scene::{load_scene, Scene, SceneEntry};
