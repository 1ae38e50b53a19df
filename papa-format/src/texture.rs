//! Texture records and resolved textures
//!
//! # Record layout
//! ```text
//! 0x00: name_index i16
//! 0x02: format u8           see [`TextureFormat`]
//! 0x03: bits u8             low 7 bits = mip count, high bit = srgb
//! 0x04: width u16
//! 0x06: height u16
//! 0x08: data_size u64
//! 0x10: data_offset u64     absolute offset of the payload bytes
//! ```
//!
//! The payload is fetched eagerly at its recorded offset; a payload shorter
//! than `data_size` is a fatal read error. Decoding the pixels themselves is
//! the job of an external image codec, fed by [`crate::describe`].

use std::io::Cursor;

use crate::error::{FormatError, PapaError};
use crate::primitives::{read_at, read_bytes, read_i16, read_u8, read_u16, read_u64};
use crate::strings::name_from_index;

/// Pixel formats a texture record may declare
///
/// Only a handful are describable for the external codec; the rest decode
/// structurally but fail in [`crate::describe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TextureFormat {
    Invalid = 0x0,
    R8G8B8A8 = 0x1,
    R8G8B8X8 = 0x2,
    B8G8R8A8 = 0x3,
    Dxt1 = 0x4,
    Dxt3 = 0x5,
    Dxt5 = 0x6,
    R32F = 0x7,
    Rg32F = 0x8,
    Rgba32F = 0x9,
    R16F = 0xA,
    Rg16F = 0xB,
    Rgba16F = 0xC,
    R8 = 0xD,
    Rg8 = 0xE,
    D0 = 0xF,
    D16 = 0x10,
    D24 = 0x11,
    D24S8 = 0x12,
    D32 = 0x13,
    R8I = 0x14,
    R8Ui = 0x15,
    R16I = 0x16,
    R16Ui = 0x17,
    Rg8I = 0x18,
    Rg8Ui = 0x19,
    Rg16I = 0x1A,
    Rg16Ui = 0x1B,
    R32I = 0x1C,
    R32Ui = 0x1D,
    Shadow16 = 0x1E,
    Shadow24 = 0x1F,
    Shadow32 = 0x20,
}

impl TextureFormat {
    pub fn from_u8(value: u8) -> Option<Self> {
        use TextureFormat::*;
        Some(match value {
            0x0 => Invalid,
            0x1 => R8G8B8A8,
            0x2 => R8G8B8X8,
            0x3 => B8G8R8A8,
            0x4 => Dxt1,
            0x5 => Dxt3,
            0x6 => Dxt5,
            0x7 => R32F,
            0x8 => Rg32F,
            0x9 => Rgba32F,
            0xA => R16F,
            0xB => Rg16F,
            0xC => Rgba16F,
            0xD => R8,
            0xE => Rg8,
            0xF => D0,
            0x10 => D16,
            0x11 => D24,
            0x12 => D24S8,
            0x13 => D32,
            0x14 => R8I,
            0x15 => R8Ui,
            0x16 => R16I,
            0x17 => R16Ui,
            0x18 => Rg8I,
            0x19 => Rg8Ui,
            0x1A => Rg16I,
            0x1B => Rg16Ui,
            0x1C => R32I,
            0x1D => R32Ui,
            0x1E => Shadow16,
            0x1F => Shadow24,
            0x20 => Shadow32,
            _ => return None,
        })
    }
}

/// Raw texture-table record, prior to name resolution
#[derive(Debug, Clone)]
pub(crate) struct TextureRecord {
    pub name_index: i16,
    pub format: TextureFormat,
    pub mip_count: u8,
    pub srgb: bool,
    pub width: u16,
    pub height: u16,
    pub data: Vec<u8>,
}

impl TextureRecord {
    pub(crate) fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self, PapaError> {
        let name_index = read_i16(cursor)?;
        let format_byte = read_u8(cursor)?;
        let format = TextureFormat::from_u8(format_byte)
            .ok_or(FormatError::UnknownTextureFormat(format_byte))?;

        let bits = read_u8(cursor)?;
        let mip_count = bits & 0x7F;
        let srgb = (bits >> 7) & 1 == 1;

        let width = read_u16(cursor)?;
        let height = read_u16(cursor)?;
        let data_size = read_u64(cursor)?;
        let data_offset = read_u64(cursor)?;

        let data = read_at(cursor, data_offset, |c| read_bytes(c, data_size as usize))?;

        Ok(Self {
            name_index,
            format,
            mip_count,
            srgb,
            width,
            height,
            data,
        })
    }
}

/// A decoded texture: format parameters plus the raw (still compressed or
/// packed) payload bytes
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    pub name: String,
    pub format: TextureFormat,
    pub width: u16,
    pub height: u16,
    pub mip_count: u8,
    pub srgb: bool,
    pub data: Vec<u8>,
}

impl Texture {
    pub(crate) fn from_record(record: TextureRecord, strings: &[String]) -> Self {
        Self {
            name: name_from_index(strings, record.name_index as i64),
            format: record.format,
            width: record.width,
            height: record.height,
            mip_count: record.mip_count,
            srgb: record.srgb,
            data: record.data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_bytes(format: u8, bits: u8, payload: &[u8], payload_offset: u64) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&0i16.to_le_bytes());
        data.push(format);
        data.push(bits);
        data.extend_from_slice(&4u16.to_le_bytes());
        data.extend_from_slice(&4u16.to_le_bytes());
        data.extend_from_slice(&(payload.len() as u64).to_le_bytes());
        data.extend_from_slice(&payload_offset.to_le_bytes());
        while (data.len() as u64) < payload_offset {
            data.push(0);
        }
        data.extend_from_slice(payload);
        data
    }

    #[test]
    fn test_parse_texture_record() {
        // mip count 5, srgb set
        let data = record_bytes(0x4, 0x85, &[0xAB; 8], 32);
        let mut cursor = Cursor::new(&data[..]);
        let record = TextureRecord::parse(&mut cursor).unwrap();

        assert_eq!(record.format, TextureFormat::Dxt1);
        assert_eq!(record.mip_count, 5);
        assert!(record.srgb);
        assert_eq!(record.width, 4);
        assert_eq!(record.height, 4);
        assert_eq!(record.data, vec![0xAB; 8]);
        // Cursor is back after the 24-byte record
        assert_eq!(cursor.position(), 24);
    }

    #[test]
    fn test_parse_unknown_format() {
        let data = record_bytes(0x21, 0, &[], 24);
        let mut cursor = Cursor::new(&data[..]);
        assert!(matches!(
            TextureRecord::parse(&mut cursor),
            Err(PapaError::Format(FormatError::UnknownTextureFormat(0x21)))
        ));
    }

    #[test]
    fn test_short_payload_is_fatal() {
        let mut data = record_bytes(0x1, 1, &[1, 2, 3], 24);
        // Declare more bytes than the file holds
        data[8..16].copy_from_slice(&64u64.to_le_bytes());
        let mut cursor = Cursor::new(&data[..]);
        assert!(matches!(
            TextureRecord::parse(&mut cursor),
            Err(PapaError::Format(FormatError::UnexpectedEof))
        ));
    }
}
