//! Vertex buffer records and resolved buffers
//!
//! # Record layout
//! ```text
//! 0x00: format u8           see [`VertexFormat`]; checked before anything else
//! 0x01: padding u8 x3
//! 0x04: vertex_count u32
//! 0x08: data_size u64
//! 0x10: data_offset u64     absolute offset of the packed vertex data
//! ```

use std::io::Cursor;

use crate::error::{FormatError, PapaError};
use crate::primitives::{read_at, read_u8, read_u32, read_u64};
use crate::vertex::{Vertex, VertexFormat};

/// Raw vertex-buffer record with its vertices already unpacked
#[derive(Debug, Clone)]
pub(crate) struct VertexBufferRecord {
    pub format: VertexFormat,
    pub vertices: Vec<Vertex>,
}

impl VertexBufferRecord {
    pub(crate) fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self, PapaError> {
        let format_byte = read_u8(cursor)?;
        let format = VertexFormat::from_u8(format_byte)
            .ok_or(FormatError::UnknownVertexFormat(format_byte))?;
        // Rejected here, at buffer-open time, never per vertex
        if !format.is_supported() {
            return Err(FormatError::UnsupportedVertexFormat(format).into());
        }

        for _ in 0..3 {
            read_u8(cursor)?;
        }
        let vertex_count = read_u32(cursor)?;
        let _data_size = read_u64(cursor)?;
        let data_offset = read_u64(cursor)?;

        let vertices = read_at(cursor, data_offset, |c| {
            let mut vertices = Vec::with_capacity(vertex_count as usize);
            for _ in 0..vertex_count {
                vertices.push(Vertex::read(c, format)?);
            }
            Ok(vertices)
        })?;

        Ok(Self { format, vertices })
    }
}

/// A decoded vertex buffer
#[derive(Debug, Clone, PartialEq)]
pub struct VertexBuffer {
    pub format: VertexFormat,
    pub vertices: Vec<Vertex>,
}

impl From<VertexBufferRecord> for VertexBuffer {
    fn from(record: VertexBufferRecord) -> Self {
        Self {
            format: record.format,
            vertices: record.vertices,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_bytes(format: u8, count: u32, payload: &[u8]) -> Vec<u8> {
        let mut data = Vec::new();
        data.push(format);
        data.extend_from_slice(&[0, 0, 0]);
        data.extend_from_slice(&count.to_le_bytes());
        data.extend_from_slice(&(payload.len() as u64).to_le_bytes());
        data.extend_from_slice(&24u64.to_le_bytes());
        data.extend_from_slice(payload);
        data
    }

    #[test]
    fn test_parse_position3_buffer() {
        let mut payload = Vec::new();
        for f in [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0] {
            payload.extend_from_slice(&f.to_le_bytes());
        }
        let data = record_bytes(0x0, 2, &payload);
        let mut cursor = Cursor::new(&data[..]);
        let record = VertexBufferRecord::parse(&mut cursor).unwrap();

        assert_eq!(record.format, VertexFormat::Position3);
        assert_eq!(record.vertices.len(), 2);
        assert_eq!(
            record.vertices[1].position,
            Some(glam::Vec3::new(4.0, 5.0, 6.0))
        );
        assert_eq!(cursor.position(), 24);
    }

    #[test]
    fn test_unsupported_format_rejected_at_open() {
        let data = record_bytes(0xE, 0, &[]);
        let mut cursor = Cursor::new(&data[..]);
        assert!(matches!(
            VertexBufferRecord::parse(&mut cursor),
            Err(PapaError::Format(FormatError::UnsupportedVertexFormat(
                VertexFormat::Matrix
            )))
        ));
    }

    #[test]
    fn test_unknown_format_byte() {
        let data = record_bytes(0x4F, 0, &[]);
        let mut cursor = Cursor::new(&data[..]);
        assert!(matches!(
            VertexBufferRecord::parse(&mut cursor),
            Err(PapaError::Format(FormatError::UnknownVertexFormat(0x4F)))
        ));
    }
}
