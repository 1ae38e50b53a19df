//! Primitive readers for the container byte stream
//!
//! Stateless little-endian readers over a `Cursor<&[u8]>`. Each function
//! advances the cursor by the size it consumed; the only failure mode is
//! running past the end of the stream, reported as
//! [`FormatError::UnexpectedEof`].
//!
//! Out-of-line data (tables, sub-tables, payload blobs) is always read
//! through [`read_at`], which seeks to an absolute offset and restores the
//! cursor afterwards, so record decoding never disturbs the position of the
//! decoder that invoked it.

use std::io::{Cursor, Read};

use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

use crate::error::{FormatError, PapaError};

/// Packed color encodings used by vertex attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorFormat {
    RgbU8,
    RgbaU8,
    RgbF32,
    RgbaF32,
    BgrU8,
    BgraU8,
    BgrF32,
    BgraF32,
}

/// An RGBA color with channels normalized to the 0..1 range
///
/// 8-bit source channels are divided by 255; formats without an alpha
/// channel read as fully opaque.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

pub(crate) fn read_u8(cursor: &mut Cursor<&[u8]>) -> Result<u8, PapaError> {
    let mut buf = [0u8; 1];
    cursor
        .read_exact(&mut buf)
        .map_err(|_| FormatError::UnexpectedEof)?;
    Ok(buf[0])
}

pub(crate) fn read_u16(cursor: &mut Cursor<&[u8]>) -> Result<u16, PapaError> {
    let mut buf = [0u8; 2];
    cursor
        .read_exact(&mut buf)
        .map_err(|_| FormatError::UnexpectedEof)?;
    Ok(u16::from_le_bytes(buf))
}

pub(crate) fn read_i16(cursor: &mut Cursor<&[u8]>) -> Result<i16, PapaError> {
    Ok(read_u16(cursor)? as i16)
}

pub(crate) fn read_u32(cursor: &mut Cursor<&[u8]>) -> Result<u32, PapaError> {
    let mut buf = [0u8; 4];
    cursor
        .read_exact(&mut buf)
        .map_err(|_| FormatError::UnexpectedEof)?;
    Ok(u32::from_le_bytes(buf))
}

pub(crate) fn read_i32(cursor: &mut Cursor<&[u8]>) -> Result<i32, PapaError> {
    Ok(read_u32(cursor)? as i32)
}

pub(crate) fn read_u64(cursor: &mut Cursor<&[u8]>) -> Result<u64, PapaError> {
    let mut buf = [0u8; 8];
    cursor
        .read_exact(&mut buf)
        .map_err(|_| FormatError::UnexpectedEof)?;
    Ok(u64::from_le_bytes(buf))
}

pub(crate) fn read_i64(cursor: &mut Cursor<&[u8]>) -> Result<i64, PapaError> {
    Ok(read_u64(cursor)? as i64)
}

pub(crate) fn read_f32(cursor: &mut Cursor<&[u8]>) -> Result<f32, PapaError> {
    Ok(f32::from_bits(read_u32(cursor)?))
}

pub(crate) fn read_bytes(cursor: &mut Cursor<&[u8]>, len: usize) -> Result<Vec<u8>, PapaError> {
    let mut buf = vec![0u8; len];
    cursor
        .read_exact(&mut buf)
        .map_err(|_| FormatError::UnexpectedEof)?;
    Ok(buf)
}

pub(crate) fn read_vec2(cursor: &mut Cursor<&[u8]>) -> Result<Vec2, PapaError> {
    Ok(Vec2::new(read_f32(cursor)?, read_f32(cursor)?))
}

pub(crate) fn read_vec3(cursor: &mut Cursor<&[u8]>) -> Result<Vec3, PapaError> {
    Ok(Vec3::new(
        read_f32(cursor)?,
        read_f32(cursor)?,
        read_f32(cursor)?,
    ))
}

pub(crate) fn read_vec4(cursor: &mut Cursor<&[u8]>) -> Result<Vec4, PapaError> {
    Ok(Vec4::new(
        read_f32(cursor)?,
        read_f32(cursor)?,
        read_f32(cursor)?,
        read_f32(cursor)?,
    ))
}

pub(crate) fn read_quat(cursor: &mut Cursor<&[u8]>) -> Result<Quat, PapaError> {
    Ok(Quat::from_xyzw(
        read_f32(cursor)?,
        read_f32(cursor)?,
        read_f32(cursor)?,
        read_f32(cursor)?,
    ))
}

/// Read a full 4x4 matrix stored as 16 consecutive floats
pub(crate) fn read_mat4(cursor: &mut Cursor<&[u8]>) -> Result<Mat4, PapaError> {
    let mut m = [0.0f32; 16];
    for v in &mut m {
        *v = read_f32(cursor)?;
    }
    Ok(Mat4::from_cols_array(&m))
}

/// Read an embedded 3x3 rotation/scale block as a 4x4 matrix
///
/// The fourth row and column are set to identity so downstream transform
/// math is uniform regardless of how the matrix was stored.
pub(crate) fn read_mat3(cursor: &mut Cursor<&[u8]>) -> Result<Mat4, PapaError> {
    let mut m = [0.0f32; 16];
    for col in 0..3 {
        for row in 0..3 {
            m[col * 4 + row] = read_f32(cursor)?;
        }
    }
    m[15] = 1.0;
    Ok(Mat4::from_cols_array(&m))
}

fn read_channel_u8(cursor: &mut Cursor<&[u8]>) -> Result<f32, PapaError> {
    Ok(read_u8(cursor)? as f32 / 255.0)
}

/// Read a packed color in the given channel order and width
///
/// BGR-ordered variants are byte-swapped into RGB; every variant yields a
/// normalized RGBA color (opaque where the source has no alpha channel).
pub(crate) fn read_color(
    cursor: &mut Cursor<&[u8]>,
    format: ColorFormat,
) -> Result<Color, PapaError> {
    let color = match format {
        ColorFormat::RgbU8 => {
            let (r, g, b) = (
                read_channel_u8(cursor)?,
                read_channel_u8(cursor)?,
                read_channel_u8(cursor)?,
            );
            Color::new(r, g, b, 1.0)
        }
        ColorFormat::RgbaU8 => {
            let (r, g, b, a) = (
                read_channel_u8(cursor)?,
                read_channel_u8(cursor)?,
                read_channel_u8(cursor)?,
                read_channel_u8(cursor)?,
            );
            Color::new(r, g, b, a)
        }
        ColorFormat::RgbF32 => {
            let (r, g, b) = (read_f32(cursor)?, read_f32(cursor)?, read_f32(cursor)?);
            Color::new(r, g, b, 1.0)
        }
        ColorFormat::RgbaF32 => {
            let (r, g, b, a) = (
                read_f32(cursor)?,
                read_f32(cursor)?,
                read_f32(cursor)?,
                read_f32(cursor)?,
            );
            Color::new(r, g, b, a)
        }
        ColorFormat::BgrU8 => {
            let (b, g, r) = (
                read_channel_u8(cursor)?,
                read_channel_u8(cursor)?,
                read_channel_u8(cursor)?,
            );
            Color::new(r, g, b, 1.0)
        }
        ColorFormat::BgraU8 => {
            let (b, g, r, a) = (
                read_channel_u8(cursor)?,
                read_channel_u8(cursor)?,
                read_channel_u8(cursor)?,
                read_channel_u8(cursor)?,
            );
            Color::new(r, g, b, a)
        }
        ColorFormat::BgrF32 => {
            let (b, g, r) = (read_f32(cursor)?, read_f32(cursor)?, read_f32(cursor)?);
            Color::new(r, g, b, 1.0)
        }
        ColorFormat::BgraF32 => {
            let (b, g, r, a) = (
                read_f32(cursor)?,
                read_f32(cursor)?,
                read_f32(cursor)?,
                read_f32(cursor)?,
            );
            Color::new(r, g, b, a)
        }
    };
    Ok(color)
}

/// Read a fixed-length string, trimming everything from the first null byte
#[allow(dead_code)]
pub(crate) fn read_padded_string(
    cursor: &mut Cursor<&[u8]>,
    len: usize,
) -> Result<String, PapaError> {
    let bytes = read_bytes(cursor, len)?;
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
}

/// Read a zero-terminated string; bounded by the first null byte
#[allow(dead_code)]
pub(crate) fn read_zero_terminated_string(
    cursor: &mut Cursor<&[u8]>,
) -> Result<String, PapaError> {
    let mut bytes = Vec::new();
    loop {
        let b = read_u8(cursor)?;
        if b == 0 {
            break;
        }
        bytes.push(b);
    }
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Run `f` with the cursor at `offset`, then restore the original position
///
/// This is the one seek primitive in the crate: every table, sub-table, and
/// payload blob reads through it, so tables may appear anywhere in the file
/// (and may alias each other) without the caller's position drifting.
pub(crate) fn read_at<T>(
    cursor: &mut Cursor<&[u8]>,
    offset: u64,
    f: impl FnOnce(&mut Cursor<&[u8]>) -> Result<T, PapaError>,
) -> Result<T, PapaError> {
    let saved = cursor.position();
    cursor.set_position(offset);
    let value = f(cursor)?;
    cursor.set_position(saved);
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_scalars() {
        let data = [0x01, 0x02, 0x03, 0x04, 0xFF, 0xFF];
        let mut cursor = Cursor::new(&data[..]);
        assert_eq!(read_u16(&mut cursor).unwrap(), 0x0201);
        assert_eq!(read_u16(&mut cursor).unwrap(), 0x0403);
        assert_eq!(read_i16(&mut cursor).unwrap(), -1);
    }

    #[test]
    fn test_read_past_end() {
        let data = [0x01, 0x02];
        let mut cursor = Cursor::new(&data[..]);
        let result = read_u32(&mut cursor);
        assert!(matches!(
            result,
            Err(PapaError::Format(FormatError::UnexpectedEof))
        ));
    }

    #[test]
    fn test_read_mat3_expands_to_identity_border() {
        let mut data = Vec::new();
        for v in [2.0f32, 0.0, 0.0, 0.0, 3.0, 0.0, 0.0, 0.0, 4.0] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        let mut cursor = Cursor::new(&data[..]);
        let m = read_mat3(&mut cursor).unwrap();
        assert_eq!(m.x_axis.to_array(), [2.0, 0.0, 0.0, 0.0]);
        assert_eq!(m.y_axis.to_array(), [0.0, 3.0, 0.0, 0.0]);
        assert_eq!(m.z_axis.to_array(), [0.0, 0.0, 4.0, 0.0]);
        assert_eq!(m.w_axis.to_array(), [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_read_color_rgba_u8_normalizes() {
        let data = [0u8, 51, 102, 255];
        let mut cursor = Cursor::new(&data[..]);
        let c = read_color(&mut cursor, ColorFormat::RgbaU8).unwrap();
        assert_eq!(c, Color::new(0.0, 0.2, 0.4, 1.0));
    }

    #[test]
    fn test_read_color_bgra_keeps_alpha() {
        let data = [255u8, 0, 0, 51];
        let mut cursor = Cursor::new(&data[..]);
        let c = read_color(&mut cursor, ColorFormat::BgraU8).unwrap();
        assert_eq!(c, Color::new(0.0, 0.0, 1.0, 0.2));
    }

    #[test]
    fn test_read_color_rgb_is_opaque() {
        let mut data = Vec::new();
        for v in [0.25f32, 0.5, 0.75] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        let mut cursor = Cursor::new(&data[..]);
        let c = read_color(&mut cursor, ColorFormat::RgbF32).unwrap();
        assert_eq!(c, Color::new(0.25, 0.5, 0.75, 1.0));
    }

    #[test]
    fn test_read_at_restores_position() {
        let data = [9u8, 9, 9, 9, 42, 0, 0, 0];
        let mut cursor = Cursor::new(&data[..]);
        cursor.set_position(1);
        let value = read_at(&mut cursor, 4, read_u32).unwrap();
        assert_eq!(value, 42);
        assert_eq!(cursor.position(), 1);
    }

    #[test]
    fn test_read_zero_terminated_string() {
        let data = b"base\0tail";
        let mut cursor = Cursor::new(&data[..]);
        assert_eq!(read_zero_terminated_string(&mut cursor).unwrap(), "base");
        assert_eq!(cursor.position(), 5);
    }
}
