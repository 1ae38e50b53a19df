//! Index buffer records and resolved buffers
//!
//! # Record layout
//! ```text
//! 0x00: format u8           0 = u16 indices, 1 = u32 indices
//! 0x01: padding u8 x3
//! 0x04: index_count u32
//! 0x08: data_size u64
//! 0x10: data_offset u64     absolute offset of the packed indices
//! ```

use std::io::Cursor;

use crate::error::{FormatError, PapaError};
use crate::primitives::{read_at, read_u8, read_u16, read_u32, read_u64};

/// Index width as stored on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum IndexFormat {
    UInt16 = 0,
    UInt32 = 1,
}

impl IndexFormat {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::UInt16),
            1 => Some(Self::UInt32),
            _ => None,
        }
    }

    /// On-disk size of one index in bytes
    pub fn width(self) -> usize {
        match self {
            Self::UInt16 => 2,
            Self::UInt32 => 4,
        }
    }
}

/// Raw index-buffer record with its indices already widened to u32
#[derive(Debug, Clone)]
pub(crate) struct IndexBufferRecord {
    pub format: IndexFormat,
    pub indices: Vec<u32>,
}

impl IndexBufferRecord {
    pub(crate) fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self, PapaError> {
        let format_byte = read_u8(cursor)?;
        let format =
            IndexFormat::from_u8(format_byte).ok_or(FormatError::UnknownIndexFormat(format_byte))?;

        for _ in 0..3 {
            read_u8(cursor)?;
        }
        let index_count = read_u32(cursor)?;
        let _data_size = read_u64(cursor)?;
        let data_offset = read_u64(cursor)?;

        let indices = read_at(cursor, data_offset, |c| {
            let mut indices = Vec::with_capacity(index_count as usize);
            for _ in 0..index_count {
                let index = match format {
                    IndexFormat::UInt16 => read_u16(c)? as u32,
                    IndexFormat::UInt32 => read_u32(c)?,
                };
                indices.push(index);
            }
            Ok(indices)
        })?;

        Ok(Self { format, indices })
    }
}

/// A decoded index buffer; indices are widened to u32 regardless of the
/// on-disk width
#[derive(Debug, Clone, PartialEq)]
pub struct IndexBuffer {
    pub format: IndexFormat,
    pub indices: Vec<u32>,
}

impl From<IndexBufferRecord> for IndexBuffer {
    fn from(record: IndexBufferRecord) -> Self {
        Self {
            format: record.format,
            indices: record.indices,
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
    fn test_parse_u16_indices() {
        let mut payload = Vec::new();
        for i in [0u16, 1, 2] {
            payload.extend_from_slice(&i.to_le_bytes());
        }
        let data = record_bytes(0, 3, &payload);
        let mut cursor = Cursor::new(&data[..]);
        let record = IndexBufferRecord::parse(&mut cursor).unwrap();

        assert_eq!(record.format, IndexFormat::UInt16);
        assert_eq!(record.indices, vec![0, 1, 2]);
        assert_eq!(cursor.position(), 24);
    }

    #[test]
    fn test_parse_u32_indices() {
        let mut payload = Vec::new();
        for i in [70000u32, 1] {
            payload.extend_from_slice(&i.to_le_bytes());
        }
        let data = record_bytes(1, 2, &payload);
        let mut cursor = Cursor::new(&data[..]);
        let record = IndexBufferRecord::parse(&mut cursor).unwrap();
        assert_eq!(record.indices, vec![70000, 1]);
    }

    #[test]
    fn test_unknown_width_is_fatal() {
        let data = record_bytes(2, 0, &[]);
        let mut cursor = Cursor::new(&data[..]);
        assert!(matches!(
            IndexBufferRecord::parse(&mut cursor),
            Err(PapaError::Format(FormatError::UnknownIndexFormat(2)))
        ));
    }
}
