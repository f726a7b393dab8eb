pub mod error;
pub mod mesh;
pub mod representation;

pub use error::{FormatError, Result};
