//! Minimal 3DS mesh file loader.
//!
//! Reads the vertex list, face list, and texture coordinates of the
//! first mesh in the file and produces an interleaved vertex buffer,
//! a triangle index list, and the matching [`VertexFormat`], ready for
//! an indexed draw call. 3DS files carry no normals; smooth per-vertex
//! normals are computed by accumulating the face normals of every
//! triangle sharing a vertex.
//!
//! All values in the file are little-endian.

use std::fs;
use std::path::Path;

use log::warn;
use thiserror::Error;

use crate::math::vec::{vec3, Vec4};
use crate::render::input::VertexFormat;

const MAIN: u16 = 0x4D4D;
const EDITOR: u16 = 0x3D3D;
const OBJECT: u16 = 0x4000;
const MESH: u16 = 0x4100;
const VERTEX_LIST: u16 = 0x4110;
const FACE_LIST: u16 = 0x4120;
const TEXCOORD_LIST: u16 = 0x4140;

/// Failure modes of the 3DS loader.
#[derive(Debug, Error)]
pub enum T3dsError {
    #[error("reading mesh file: {0}")]
    Io(#[from] std::io::Error),
    #[error("not a 3ds file")]
    BadMagic,
    #[error("truncated chunk data")]
    Truncated,
    #[error("file contains no mesh geometry")]
    NoGeometry,
}

/// A mesh decoded from a 3DS file.
///
/// `verts` is laid out per `format`, so the mesh can be drawn directly:
/// set `format` on the context and pass `verts`/`indices` to
/// `draw_triangles_indexed`.
#[derive(Clone, Debug)]
pub struct Mesh {
    pub verts: Vec<u8>,
    pub indices: Vec<u16>,
    pub vertex_count: usize,
    pub format: VertexFormat,
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn u8(&mut self) -> Result<u8, T3dsError> {
        let b = *self.buf.get(self.pos).ok_or(T3dsError::Truncated)?;
        self.pos += 1;
        Ok(b)
    }

    fn u16(&mut self) -> Result<u16, T3dsError> {
        let b = self
            .buf
            .get(self.pos..self.pos + 2)
            .ok_or(T3dsError::Truncated)?;
        self.pos += 2;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, T3dsError> {
        let b = self
            .buf
            .get(self.pos..self.pos + 4)
            .ok_or(T3dsError::Truncated)?;
        self.pos += 4;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn f32(&mut self) -> Result<f32, T3dsError> {
        Ok(f32::from_bits(self.u32()?))
    }

    fn seek_to(&mut self, pos: usize) -> Result<(), T3dsError> {
        if pos < self.pos || pos > self.buf.len() {
            return Err(T3dsError::Truncated);
        }
        self.pos = pos;
        Ok(())
    }
}

/// Loads the first mesh of the 3DS file at `path`.
pub fn load_3ds(path: impl AsRef<Path>) -> Result<Mesh, T3dsError> {
    parse_3ds(&fs::read(path)?)
}

/// Parses an in-memory 3DS file.
pub fn parse_3ds(data: &[u8]) -> Result<Mesh, T3dsError> {
    let mut r = Reader::new(data);

    if r.u16()? != MAIN {
        return Err(T3dsError::BadMagic);
    }
    let _file_size = r.u32()?;

    let mut positions: Option<Vec<f32>> = None;
    let mut texcoords: Option<Vec<f32>> = None;
    let mut indices: Option<Vec<u16>> = None;

    while r.remaining() >= 6 {
        let start = r.pos;
        let id = r.u16()?;
        let size = r.u32()? as usize;
        if size < 6 {
            return Err(T3dsError::Truncated);
        }

        match id {
            // Containers: descend into their children.
            EDITOR | MESH => {}
            OBJECT => {
                // Skip the NUL-terminated object name.
                while r.u8()? != 0 {}
            }
            VERTEX_LIST if positions.is_none() => {
                let n = r.u16()? as usize;
                let mut v = Vec::with_capacity(n * 3);
                for _ in 0..n * 3 {
                    v.push(r.f32()?);
                }
                positions = Some(v);
            }
            FACE_LIST if indices.is_none() => {
                let n = r.u16()? as usize;
                let mut ix = Vec::with_capacity(n * 3);
                for _ in 0..n {
                    ix.push(r.u16()?);
                    ix.push(r.u16()?);
                    ix.push(r.u16()?);
                    let _face_flags = r.u16()?;
                }
                indices = Some(ix);
            }
            TEXCOORD_LIST if texcoords.is_none() => {
                let n = r.u16()? as usize;
                let mut tc = Vec::with_capacity(n * 2);
                for _ in 0..n * 2 {
                    tc.push(r.f32()?);
                }
                texcoords = Some(tc);
            }
            // Anything else, and repeated lists, are skipped whole.
            _ => r.seek_to(start + size)?,
        }
    }

    let positions = positions.ok_or(T3dsError::NoGeometry)?;
    let indices = indices.ok_or(T3dsError::NoGeometry)?;
    let vertex_count = positions.len() / 3;

    let texcoords = match texcoords {
        Some(tc) if tc.len() == vertex_count * 2 => Some(tc),
        Some(tc) => {
            warn!(
                "texture coordinate count {} does not match {} vertices, \
                 dropping them",
                tc.len() / 2,
                vertex_count,
            );
            None
        }
        None => None,
    };

    let normals = smooth_normals(&positions, &indices, vertex_count);

    let mut format = VertexFormat::POSITION_F3 | VertexFormat::NORMAL_F3;
    if texcoords.is_some() {
        format |= VertexFormat::TEX0;
    }

    let mut verts = Vec::with_capacity(vertex_count * format.stride());
    for i in 0..vertex_count {
        for k in 0..3 {
            verts.extend_from_slice(&positions[3 * i + k].to_ne_bytes());
        }
        let n = normals[i];
        verts.extend_from_slice(&n.x().to_ne_bytes());
        verts.extend_from_slice(&n.y().to_ne_bytes());
        verts.extend_from_slice(&n.z().to_ne_bytes());
        if let Some(tc) = &texcoords {
            verts.extend_from_slice(&tc[2 * i].to_ne_bytes());
            verts.extend_from_slice(&tc[2 * i + 1].to_ne_bytes());
        }
    }

    Ok(Mesh { verts, indices, vertex_count, format })
}

/// Averages face normals into unit per-vertex normals.
fn smooth_normals(
    positions: &[f32],
    indices: &[u16],
    vertex_count: usize,
) -> Vec<Vec4> {
    let pos = |i: usize| {
        vec3(positions[3 * i], positions[3 * i + 1], positions[3 * i + 2])
    };
    let mut normals = vec![Vec4::ZERO; vertex_count];

    for tri in indices.chunks_exact(3) {
        let (a, b, c) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        if a >= vertex_count || b >= vertex_count || c >= vertex_count {
            warn!("face references vertex out of range, ignored for normals");
            continue;
        }
        let e1 = pos(a) - pos(b);
        let e2 = pos(a) - pos(c);
        let n = e1.cross(&e2);

        normals[a] = normals[a] + n;
        normals[b] = normals[b] + n;
        normals[c] = normals[c] + n;
    }

    for n in &mut normals {
        *n = n.normalize();
    }
    normals
}

#[cfg(test)]
mod tests {
    use crate::render::vertex::Attr;

    use super::*;

    fn chunk(id: u16, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&id.to_le_bytes());
        out.extend_from_slice(&(6 + payload.len() as u32).to_le_bytes());
        out.extend_from_slice(payload);
        out
    }

    fn sample_file(with_texcoords: bool) -> Vec<u8> {
        // One right triangle in the xy plane.
        let mut vert_list = 3u16.to_le_bytes().to_vec();
        for p in [
            [0.0f32, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
        ] {
            for c in p {
                vert_list.extend_from_slice(&c.to_le_bytes());
            }
        }

        let mut face_list = 1u16.to_le_bytes().to_vec();
        for ix in [0u16, 1, 2, 0 /* flags */] {
            face_list.extend_from_slice(&ix.to_le_bytes());
        }

        let mut mesh = chunk(VERTEX_LIST, &vert_list);
        mesh.extend(chunk(FACE_LIST, &face_list));
        if with_texcoords {
            let mut tc_list = 3u16.to_le_bytes().to_vec();
            for tc in [[0.0f32, 0.0], [1.0, 0.0], [0.0, 1.0]] {
                for c in tc {
                    tc_list.extend_from_slice(&c.to_le_bytes());
                }
            }
            mesh.extend(chunk(TEXCOORD_LIST, &tc_list));
        }

        let mut object = b"tri\0".to_vec();
        object.extend(chunk(MESH, &mesh));

        let editor = chunk(OBJECT, &object);
        chunk(MAIN, &chunk(EDITOR, &editor))
    }

    #[test]
    fn rejects_bad_magic() {
        assert!(matches!(
            parse_3ds(&[0x42, 0x42, 6, 0, 0, 0]),
            Err(T3dsError::BadMagic),
        ));
    }

    #[test]
    fn parses_positions_and_faces() {
        let mesh = parse_3ds(&sample_file(false)).unwrap();

        assert_eq!(mesh.vertex_count, 3);
        assert_eq!(mesh.indices, [0, 1, 2]);
        assert_eq!(
            mesh.format,
            VertexFormat::POSITION_F3 | VertexFormat::NORMAL_F3,
        );
        assert_eq!(mesh.verts.len(), 3 * mesh.format.stride());
    }

    #[test]
    fn computes_face_normals() {
        let mesh = parse_3ds(&sample_file(false)).unwrap();

        // All three vertices share the single face's +z normal.
        for i in 0..3 {
            let off = i * mesh.format.stride();
            let v = crate::render::input::decode_vertex(
                mesh.format,
                &mesh.verts[off..off + mesh.format.stride()],
            );
            let n = v.attr(Attr::Normal);
            assert!((n.z() - 1.0).abs() < 1e-6);
            assert_eq!((n.x(), n.y()), (0.0, 0.0));
        }
    }

    #[test]
    fn texcoords_extend_the_format() {
        let mesh = parse_3ds(&sample_file(true)).unwrap();
        assert!(mesh.format.contains(VertexFormat::TEX0));
        assert_eq!(mesh.verts.len(), 3 * (12 + 12 + 8));
    }

    #[test]
    fn missing_geometry_is_an_error() {
        let file = chunk(MAIN, &chunk(EDITOR, &[]));
        assert!(matches!(parse_3ds(&file), Err(T3dsError::NoGeometry)));
    }
}
