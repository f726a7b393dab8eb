use std::io::{self, BufRead};
use std::{fs, num, path::Path};

use log::{debug, trace};

use super::builder::*;
use crate::meta::ImportMeta;

#[derive(thiserror::Error, Debug)]
pub enum ParserError {
    #[error("Malformed record on line {line} ({reason}): \"{text}\"")]
    MalformedRecord {
        line: usize,
        text: String,
        reason: String,
    },
    #[error("Line {line} references {attribute} {index}, but only {available} are defined")]
    DanglingIndexReference {
        line: usize,
        attribute: Attribute,
        /// The index as written in the file (1-based, or negative for end-relative)
        index: i64,
        available: usize,
    },
    #[error("Line {line} needs output vertex {count}, but meshes are limited to 32 bit indices")]
    IndexOverflow { line: usize, count: usize },
    #[error("Found {found} {attribute} entries for {expected} positions")]
    AttributeCountMismatch {
        attribute: Attribute,
        expected: usize,
        found: usize,
    },
    #[error("Failed to read model.")]
    Io(#[from] io::Error),
}

/// The line currently parsed, used to report failures.
struct Record<'a> {
    line: usize,
    text: &'a str,
}

impl Record<'_> {
    fn malformed(&self, reason: impl Into<String>) -> ParserError {
        ParserError::MalformedRecord {
            line: self.line,
            text: self.text.into(),
            reason: reason.into(),
        }
    }
}

// parses wavefront obj (https://en.wikipedia.org/wiki/Wavefront_.obj_file) in a single forward pass
pub fn parse<R: BufRead>(reader: R, meta: ImportMeta) -> Result<ObjMeshBuilder, ParserError> {
    let mut builder = ObjMeshBuilder::new(meta);

    for (number, line) in reader.lines().enumerate() {
        parse_line(number + 1, &line?, &mut builder)?;
    }

    Ok(builder)
}

pub fn parse_file(filepath: &Path, meta: ImportMeta) -> Result<ObjMeshBuilder, ParserError> {
    let file = fs::File::open(filepath)?;
    log::info!("Loading mesh: {}", filepath.display());
    parse(io::BufReader::new(file), meta)
}

fn parse_line(number: usize, line: &str, builder: &mut ObjMeshBuilder) -> Result<(), ParserError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(());
    }

    trace!("Parsing: \"{}\"", line);

    let record = Record { line: number, text: line };
    let mut tokens = line.split_whitespace();
    let token = match tokens.next() {
        Some(token) => token,
        None => return Ok(()),
    };

    if builder.split_on() == Some(token) {
        builder.set_group(join(tokens));
        return Ok(());
    }

    match token {
        // vertex
        "v" => builder.push_position(parse_numbers(&record, tokens)?),
        // texture coordinates
        "vt" => builder.push_tcoord(parse_numbers(&record, tokens)?),
        // vertex normals
        "vn" => builder.push_normal(parse_numbers(&record, tokens)?),
        "f" => {
            let face = parse_face(&record, tokens, builder.counts())?;
            builder.push_face(face);
        }
        // material library, used to locate the .mtl file
        "mtllib" => builder.push_material_library(join(tokens)),
        "o" | "g" | "s" | "vp" | "usemtl" | "l" | "p" => {
            debug!("Ignoring \"{}\" on line {}", token, number)
        }
        _ => debug!("Found unknown token \"{}\" on line {}", token, number),
    };

    Ok(())
}

fn join<'a>(tokens: impl Iterator<Item = &'a str>) -> String {
    tokens.collect::<Vec<_>>().join(" ")
}

// parses exactly N numbers; additional values (e.g. vertex colors or weights) are ignored
fn parse_numbers<'a, const N: usize>(
    record: &Record,
    mut tokens: impl Iterator<Item = &'a str>,
) -> Result<[f64; N], ParserError> {
    let mut numbers = [0.0; N];

    for (i, number) in numbers.iter_mut().enumerate() {
        let token = tokens
            .next()
            .ok_or_else(|| record.malformed(format!("expected {} numbers, found {}", N, i)))?;
        *number = token.parse().map_err(|err: num::ParseFloatError| {
            record.malformed(format!("\"{}\" is not a number: {}", token, err))
        })?;
    }

    Ok(numbers)
}

// parses face indexes separated by whitespace, which are themselves separated by slashes
fn parse_face<'a>(
    record: &Record,
    tokens: impl Iterator<Item = &'a str>,
    counts: AttributeCounts,
) -> Result<ObjFace, ParserError> {
    let face_i = tokens
        .map(|token| parse_face_index(record, token, counts))
        .collect::<Result<Vec<_>, _>>()?;

    if face_i.len() < 3 {
        return Err(record.malformed(format!("face has {} vertices, at least 3 required", face_i.len())));
    }

    Ok(ObjFace {
        line: record.line,
        face_i,
    })
}

// parses a single `v`, `v/vt`, `v//vn` or `v/vt/vn` face index
fn parse_face_index(record: &Record, value: &str, counts: AttributeCounts) -> Result<ObjFaceIndex, ParserError> {
    let mut parts = value.split('/');

    let position = match parts.next() {
        Some(part) if !part.is_empty() => resolve_index(record, part, Attribute::Position, counts)?,
        _ => return Err(record.malformed(format!("face vertex \"{}\" has no position index", value))),
    };

    let mut optional = |attribute: Attribute| match parts.next() {
        Some(part) if !part.is_empty() => resolve_index(record, part, attribute, counts).map(Some),
        _ => Ok(None),
    };
    let tcoord = optional(Attribute::TexCoord)?;
    let normal = optional(Attribute::Normal)?;

    if parts.next().is_some() {
        return Err(record.malformed(format!("face vertex \"{}\" has too many indices", value)));
    }

    Ok(ObjFaceIndex {
        position,
        tcoord,
        normal,
    })
}

// converts a 1-based or negative (end-relative) index into a 0-based one
fn resolve_index(
    record: &Record,
    value: &str,
    attribute: Attribute,
    counts: AttributeCounts,
) -> Result<usize, ParserError> {
    let index: i64 = value.parse().map_err(|err: num::ParseIntError| {
        record.malformed(format!("\"{}\" is not an index: {}", value, err))
    })?;
    let available = counts.of(attribute);

    let resolved = match index {
        0 => return Err(record.malformed("index 0 is not valid, indices start at 1")),
        i if i > 0 => (i - 1) as usize,
        i => match available.checked_sub(i.unsigned_abs() as usize) {
            Some(resolved) => resolved,
            None => {
                return Err(ParserError::DanglingIndexReference {
                    line: record.line,
                    attribute,
                    index,
                    available,
                })
            }
        },
    };

    if resolved >= available {
        return Err(ParserError::DanglingIndexReference {
            line: record.line,
            attribute,
            index,
            available,
        });
    }

    Ok(resolved)
}
