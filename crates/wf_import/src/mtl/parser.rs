use std::io::{self, BufRead};
use std::{fs, path::Path};

use log::{debug, trace};

use super::material::MaterialLibrary;

#[derive(thiserror::Error, Debug)]
pub enum MtlError {
    #[error("Failed to read material library.")]
    Io(#[from] io::Error),
}

// parses wavefront mtl (https://en.wikipedia.org/wiki/Wavefront_.obj_file#Material_template_library)
// values are stored as raw tokens, coercion happens when a representation is resolved
pub fn parse<R: BufRead>(reader: R, base_dir: &Path) -> Result<MaterialLibrary, MtlError> {
    let mut library = MaterialLibrary::new(base_dir);
    let mut current: Option<String> = None;

    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        trace!("Parsing: \"{}\"", line);

        let mut tokens = line.split_whitespace();
        let token = match tokens.next() {
            Some(token) => token,
            None => continue,
        };

        if token == "newmtl" {
            let name = tokens.collect::<Vec<_>>().join(" ");
            // an unnamed material swallows its properties until the next named one
            current = if name.is_empty() {
                debug!("Ignoring unnamed material on line {}", number + 1);
                None
            } else {
                library.declare(&name);
                Some(name)
            };
            continue;
        }

        let values: Vec<String> = tokens.map(String::from).collect();
        match &current {
            Some(name) if !values.is_empty() => library.declare(name).set(token.into(), values),
            Some(_) => debug!("Ignoring \"{}\" without value on line {}", token, number + 1),
            None => debug!("Ignoring \"{}\" outside of a named material on line {}", token, number + 1),
        }
    }

    Ok(library)
}

pub fn parse_file(filepath: &Path) -> Result<MaterialLibrary, MtlError> {
    let file = fs::File::open(filepath)?;
    log::info!("Loading materials: {}", filepath.display());
    let base_dir = filepath.parent().unwrap_or_else(|| Path::new(""));
    parse(io::BufReader::new(file), base_dir)
}
