//! OBJ file loader for 3D models
//!
//! Supports `v` (with optional `r g b` vertex colors), `vt`, `vn` and `f`
//! statements. Every face corner becomes its own vertex; polygons are fan
//! triangulated into the index list. Other statements (`o`, `g`, `s`,
//! `usemtl`, `mtllib`, ...) are ignored.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

use crate::render::primitives::mesh::{MeshBuilder, Vertex};

/// Color given to vertices without an explicit color
pub const DEFAULT_VERTEX_COLOR: [f32; 3] = [1.0, 1.0, 1.0];

/// OBJ loading errors
#[derive(Error, Debug)]
pub enum ObjError {
    /// The file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A statement could not be parsed
    #[error("Parse error on line {line}: {message}")]
    Parse {
        /// 1-based line number
        line: usize,
        /// What was wrong
        message: String,
    },

    /// The file parsed but does not describe a usable mesh
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Wavefront OBJ loader
pub struct ObjLoader;

impl ObjLoader {
    /// Load an OBJ file
    pub fn load(path: impl AsRef<Path>) -> Result<MeshBuilder, ObjError> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let builder = Self::parse(reader)?;
        log::debug!(
            "Parsed {}: {} vertices, {} indices",
            path.display(),
            builder.vertex_count(),
            builder.index_count()
        );
        Ok(builder)
    }

    /// Parse OBJ source held in memory
    pub fn parse_str(source: &str) -> Result<MeshBuilder, ObjError> {
        Self::parse(source.as_bytes())
    }

    /// Parse OBJ statements from any buffered reader
    pub fn parse(reader: impl BufRead) -> Result<MeshBuilder, ObjError> {
        let mut positions: Vec<[f32; 3]> = Vec::new();
        let mut colors: Vec<[f32; 3]> = Vec::new();
        let mut normals: Vec<[f32; 3]> = Vec::new();
        let mut tex_coords: Vec<[f32; 2]> = Vec::new();
        let mut builder = MeshBuilder::default();

        for (line_index, line) in reader.lines().enumerate() {
            let line_number = line_index + 1;
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut parts = line.split_whitespace();
            let Some(keyword) = parts.next() else { continue };
            let args: Vec<&str> = parts.collect();

            match keyword {
                "v" => {
                    let values = parse_floats(&args, line_number)?;
                    match values.len() {
                        3 | 4 => {
                            positions.push([values[0], values[1], values[2]]);
                            colors.push(DEFAULT_VERTEX_COLOR);
                        }
                        6 => {
                            positions.push([values[0], values[1], values[2]]);
                            colors.push([values[3], values[4], values[5]]);
                        }
                        n => return Err(parse_error(line_number, format!("vertex needs 3 or 6 values, got {}", n))),
                    }
                }
                "vn" => {
                    let values = parse_floats(&args, line_number)?;
                    if values.len() != 3 {
                        return Err(parse_error(line_number, format!("normal needs 3 values, got {}", values.len())));
                    }
                    normals.push([values[0], values[1], values[2]]);
                }
                "vt" => {
                    let values = parse_floats(&args, line_number)?;
                    if values.len() < 2 {
                        return Err(parse_error(line_number, "texture coordinate needs at least 2 values".to_string()));
                    }
                    tex_coords.push([values[0], values[1]]);
                }
                "f" => {
                    if args.len() < 3 {
                        return Err(parse_error(line_number, format!("face needs at least 3 vertices, got {}", args.len())));
                    }

                    let base = builder.vertices.len() as u32;
                    for corner in &args {
                        let refs = parse_face_vertex(corner, line_number)?;

                        let p = resolve_index(refs.position, positions.len(), line_number, "position")?;
                        let mut vertex = Vertex::new(positions[p], colors[p]);
                        if let Some(t) = refs.tex_coord {
                            vertex.uv = tex_coords[resolve_index(t, tex_coords.len(), line_number, "texture")?];
                        }
                        if let Some(n) = refs.normal {
                            vertex.normal = normals[resolve_index(n, normals.len(), line_number, "normal")?];
                        }
                        builder.vertices.push(vertex);
                    }

                    for i in 1..args.len() as u32 - 1 {
                        builder.indices.extend_from_slice(&[base, base + i, base + i + 1]);
                    }
                }
                _ => {}
            }
        }

        if builder.vertices.is_empty() {
            return Err(ObjError::InvalidFormat("No faces found in OBJ data".to_string()));
        }

        Ok(builder)
    }
}

/// Raw 1-based (or negative, relative) indices of one face corner
struct FaceVertexRefs {
    position: i64,
    tex_coord: Option<i64>,
    normal: Option<i64>,
}

fn parse_face_vertex(token: &str, line: usize) -> Result<FaceVertexRefs, ObjError> {
    let mut fields = token.split('/');
    let parse = |field: Option<&str>| -> Result<Option<i64>, ObjError> {
        match field {
            None | Some("") => Ok(None),
            Some(text) => text
                .parse::<i64>()
                .map(Some)
                .map_err(|_| parse_error(line, format!("invalid index '{}' in '{}'", text, token))),
        }
    };

    let position = parse(fields.next())?.ok_or_else(|| parse_error(line, format!("missing position index in '{}'", token)))?;
    let tex_coord = parse(fields.next())?;
    let normal = parse(fields.next())?;
    Ok(FaceVertexRefs { position, tex_coord, normal })
}

/// Turn a 1-based or negative OBJ index into a 0-based one
fn resolve_index(index: i64, count: usize, line: usize, kind: &str) -> Result<usize, ObjError> {
    let resolved = match index {
        i if i > 0 => i - 1,
        i if i < 0 => count as i64 + i,
        _ => return Err(parse_error(line, format!("{} index 0 is not valid", kind))),
    };

    if resolved < 0 || resolved as usize >= count {
        return Err(ObjError::InvalidFormat(format!(
            "{} index {} out of range on line {} ({} defined)",
            kind, index, line, count
        )));
    }
    Ok(resolved as usize)
}

fn parse_floats(args: &[&str], line: usize) -> Result<Vec<f32>, ObjError> {
    args.iter()
        .map(|text| {
            text.parse::<f32>()
                .map_err(|_| parse_error(line, format!("invalid number '{}'", text)))
        })
        .collect()
}

fn parse_error(line: usize, message: String) -> ObjError {
    ObjError::Parse { line, message }
}
