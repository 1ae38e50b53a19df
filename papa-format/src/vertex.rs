//! Per-vertex attribute layouts
//!
//! A vertex buffer's one-byte format discriminant fully determines which
//! attributes each vertex carries and in what order they sit on disk. The
//! decoder populates exactly those fields; nothing is ever inferred from
//! zero-valued data.
//!
//! Two discriminants (`TexCoord4`, `Matrix`) have no decodable layout and
//! are rejected when the owning buffer is opened, before any vertex is read.

use std::io::Cursor;

use glam::{Vec2, Vec3};

use crate::error::{FormatError, IntegrityError, PapaError};
use crate::primitives::{self, Color, ColorFormat};

/// Vertex layout discriminants as stored on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum VertexFormat {
    Position3 = 0x0,
    Position3Color4bTexCoord2 = 0x1,
    Position3Color4bTexCoord4 = 0x2,
    Position3Color4bTexCoord6 = 0x3,
    Position3Normal3 = 0x4,
    Position3Normal3TexCoord2 = 0x5,
    Position3Normal3Color4TexCoord2 = 0x6,
    Position3Normal3Color4TexCoord4 = 0x7,
    Position3Weights4bBones4bNormal3TexCoord2 = 0x8,
    Position3Normal3Tan3Bin3TexCoord2 = 0x9,
    Position3Normal3Tan3Bin3TexCoord4 = 0xA,
    Position3Normal3Tan3Bin3Color4TexCoord4 = 0xB,
    TexCoord4 = 0xC,
    Position3Color8fTexCoord6 = 0xD,
    Matrix = 0xE,
}

impl VertexFormat {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x0 => Some(Self::Position3),
            0x1 => Some(Self::Position3Color4bTexCoord2),
            0x2 => Some(Self::Position3Color4bTexCoord4),
            0x3 => Some(Self::Position3Color4bTexCoord6),
            0x4 => Some(Self::Position3Normal3),
            0x5 => Some(Self::Position3Normal3TexCoord2),
            0x6 => Some(Self::Position3Normal3Color4TexCoord2),
            0x7 => Some(Self::Position3Normal3Color4TexCoord4),
            0x8 => Some(Self::Position3Weights4bBones4bNormal3TexCoord2),
            0x9 => Some(Self::Position3Normal3Tan3Bin3TexCoord2),
            0xA => Some(Self::Position3Normal3Tan3Bin3TexCoord4),
            0xB => Some(Self::Position3Normal3Tan3Bin3Color4TexCoord4),
            0xC => Some(Self::TexCoord4),
            0xD => Some(Self::Position3Color8fTexCoord6),
            0xE => Some(Self::Matrix),
            _ => None,
        }
    }

    /// Whether the layout is decodable; checked once at buffer-open time
    pub fn is_supported(self) -> bool {
        !matches!(self, Self::TexCoord4 | Self::Matrix)
    }

    /// On-disk size of one vertex in this layout
    pub fn stride(self) -> usize {
        match self {
            Self::Position3 => 12,
            Self::Position3Color4bTexCoord2 => 24,
            Self::Position3Color4bTexCoord4 => 32,
            Self::Position3Color4bTexCoord6 => 40,
            Self::Position3Normal3 => 24,
            Self::Position3Normal3TexCoord2 => 32,
            Self::Position3Normal3Color4TexCoord2 => 36,
            Self::Position3Normal3Color4TexCoord4 => 44,
            Self::Position3Weights4bBones4bNormal3TexCoord2 => 40,
            Self::Position3Normal3Tan3Bin3TexCoord2 => 56,
            Self::Position3Normal3Tan3Bin3TexCoord4 => 64,
            Self::Position3Normal3Tan3Bin3Color4TexCoord4 => 68,
            Self::Position3Color8fTexCoord6 => 68,
            // No decodable layout; buffers carrying these are rejected
            Self::TexCoord4 | Self::Matrix => 0,
        }
    }
}

/// One decoded vertex; which fields are populated is determined solely by
/// the owning buffer's [`VertexFormat`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vertex {
    pub position: Option<Vec3>,
    pub normal: Option<Vec3>,
    pub tangent: Option<Vec3>,
    pub binormal: Option<Vec3>,
    pub color1: Option<Color>,
    pub color2: Option<Color>,
    pub texcoord1: Option<Vec2>,
    pub texcoord2: Option<Vec2>,
    pub texcoord3: Option<Vec2>,
    /// Skin weights normalized from packed bytes by dividing by 255
    pub weights: Option<[f32; 4]>,
    /// Raw local bone indices; mapped to skeleton bone ids through the
    /// owning model's mesh binding, never at vertex-decode time
    pub bones: Option<[u8; 4]>,
}

impl Vertex {
    pub(crate) fn read(cursor: &mut Cursor<&[u8]>, format: VertexFormat) -> Result<Self, PapaError> {
        let mut vertex = Vertex::default();

        match format {
            VertexFormat::Position3 => {
                vertex.position = Some(primitives::read_vec3(cursor)?);
            }
            VertexFormat::Position3Color4bTexCoord2 => {
                vertex.position = Some(primitives::read_vec3(cursor)?);
                vertex.color1 = Some(primitives::read_color(cursor, ColorFormat::RgbaU8)?);
                vertex.texcoord1 = Some(primitives::read_vec2(cursor)?);
            }
            VertexFormat::Position3Color4bTexCoord4 => {
                vertex.position = Some(primitives::read_vec3(cursor)?);
                vertex.color1 = Some(primitives::read_color(cursor, ColorFormat::RgbaU8)?);
                vertex.texcoord1 = Some(primitives::read_vec2(cursor)?);
                vertex.texcoord2 = Some(primitives::read_vec2(cursor)?);
            }
            VertexFormat::Position3Color4bTexCoord6 => {
                vertex.position = Some(primitives::read_vec3(cursor)?);
                vertex.color1 = Some(primitives::read_color(cursor, ColorFormat::RgbaU8)?);
                vertex.texcoord1 = Some(primitives::read_vec2(cursor)?);
                vertex.texcoord2 = Some(primitives::read_vec2(cursor)?);
                vertex.texcoord3 = Some(primitives::read_vec2(cursor)?);
            }
            VertexFormat::Position3Normal3 => {
                vertex.position = Some(primitives::read_vec3(cursor)?);
                vertex.normal = Some(primitives::read_vec3(cursor)?);
            }
            VertexFormat::Position3Normal3TexCoord2 => {
                vertex.position = Some(primitives::read_vec3(cursor)?);
                vertex.normal = Some(primitives::read_vec3(cursor)?);
                vertex.texcoord1 = Some(primitives::read_vec2(cursor)?);
            }
            VertexFormat::Position3Normal3Color4TexCoord2 => {
                vertex.position = Some(primitives::read_vec3(cursor)?);
                vertex.normal = Some(primitives::read_vec3(cursor)?);
                vertex.color1 = Some(primitives::read_color(cursor, ColorFormat::RgbaU8)?);
                vertex.texcoord1 = Some(primitives::read_vec2(cursor)?);
            }
            VertexFormat::Position3Normal3Color4TexCoord4 => {
                vertex.position = Some(primitives::read_vec3(cursor)?);
                vertex.normal = Some(primitives::read_vec3(cursor)?);
                vertex.color1 = Some(primitives::read_color(cursor, ColorFormat::RgbaU8)?);
                vertex.texcoord1 = Some(primitives::read_vec2(cursor)?);
                vertex.texcoord2 = Some(primitives::read_vec2(cursor)?);
            }
            VertexFormat::Position3Weights4bBones4bNormal3TexCoord2 => {
                vertex.position = Some(primitives::read_vec3(cursor)?);
                let mut weights = [0.0f32; 4];
                for w in &mut weights {
                    *w = primitives::read_u8(cursor)? as f32 / 255.0;
                }
                vertex.weights = Some(weights);
                let mut bones = [0u8; 4];
                for b in &mut bones {
                    *b = primitives::read_u8(cursor)?;
                }
                vertex.bones = Some(bones);
                vertex.normal = Some(primitives::read_vec3(cursor)?);
                vertex.texcoord1 = Some(primitives::read_vec2(cursor)?);
            }
            VertexFormat::Position3Normal3Tan3Bin3TexCoord2 => {
                vertex.position = Some(primitives::read_vec3(cursor)?);
                vertex.normal = Some(primitives::read_vec3(cursor)?);
                vertex.tangent = Some(primitives::read_vec3(cursor)?);
                vertex.binormal = Some(primitives::read_vec3(cursor)?);
                vertex.texcoord1 = Some(primitives::read_vec2(cursor)?);
            }
            VertexFormat::Position3Normal3Tan3Bin3TexCoord4 => {
                vertex.position = Some(primitives::read_vec3(cursor)?);
                vertex.normal = Some(primitives::read_vec3(cursor)?);
                vertex.tangent = Some(primitives::read_vec3(cursor)?);
                vertex.binormal = Some(primitives::read_vec3(cursor)?);
                vertex.texcoord1 = Some(primitives::read_vec2(cursor)?);
                vertex.texcoord2 = Some(primitives::read_vec2(cursor)?);
            }
            VertexFormat::Position3Normal3Tan3Bin3Color4TexCoord4 => {
                vertex.position = Some(primitives::read_vec3(cursor)?);
                vertex.normal = Some(primitives::read_vec3(cursor)?);
                vertex.tangent = Some(primitives::read_vec3(cursor)?);
                vertex.binormal = Some(primitives::read_vec3(cursor)?);
                vertex.color1 = Some(primitives::read_color(cursor, ColorFormat::RgbaU8)?);
                vertex.texcoord1 = Some(primitives::read_vec2(cursor)?);
                vertex.texcoord2 = Some(primitives::read_vec2(cursor)?);
            }
            VertexFormat::Position3Color8fTexCoord6 => {
                vertex.position = Some(primitives::read_vec3(cursor)?);
                vertex.color1 = Some(primitives::read_color(cursor, ColorFormat::RgbaF32)?);
                vertex.color2 = Some(primitives::read_color(cursor, ColorFormat::RgbaF32)?);
                vertex.texcoord1 = Some(primitives::read_vec2(cursor)?);
                vertex.texcoord2 = Some(primitives::read_vec2(cursor)?);
                vertex.texcoord3 = Some(primitives::read_vec2(cursor)?);
            }
            VertexFormat::TexCoord4 | VertexFormat::Matrix => {
                return Err(FormatError::UnsupportedVertexFormat(format).into());
            }
        }

        Ok(vertex)
    }

    /// Serialize back into the on-disk layout of `format`
    pub(crate) fn write(&self, out: &mut Vec<u8>, format: VertexFormat) -> Result<(), PapaError> {
        let require_vec3 = |v: Option<Vec3>, attribute| {
            v.ok_or(IntegrityError::MissingVertexAttribute { format, attribute })
        };
        let require_vec2 = |v: Option<Vec2>, attribute| {
            v.ok_or(IntegrityError::MissingVertexAttribute { format, attribute })
        };
        let require_color = |v: Option<Color>, attribute| {
            v.ok_or(IntegrityError::MissingVertexAttribute { format, attribute })
        };
        let write_vec3 = |out: &mut Vec<u8>, v: Vec3| {
            for f in v.to_array() {
                out.extend_from_slice(&f.to_le_bytes());
            }
        };
        let write_vec2 = |out: &mut Vec<u8>, v: Vec2| {
            for f in v.to_array() {
                out.extend_from_slice(&f.to_le_bytes());
            }
        };
        let write_color_u8 = |out: &mut Vec<u8>, c: Color| {
            for f in [c.r, c.g, c.b, c.a] {
                out.push((f * 255.0).round() as u8);
            }
        };
        let write_color_f32 = |out: &mut Vec<u8>, c: Color| {
            for f in [c.r, c.g, c.b, c.a] {
                out.extend_from_slice(&f.to_le_bytes());
            }
        };

        match format {
            VertexFormat::Position3 => {
                write_vec3(out, require_vec3(self.position, "position")?);
            }
            VertexFormat::Position3Color4bTexCoord2 => {
                write_vec3(out, require_vec3(self.position, "position")?);
                write_color_u8(out, require_color(self.color1, "color1")?);
                write_vec2(out, require_vec2(self.texcoord1, "texcoord1")?);
            }
            VertexFormat::Position3Color4bTexCoord4 => {
                write_vec3(out, require_vec3(self.position, "position")?);
                write_color_u8(out, require_color(self.color1, "color1")?);
                write_vec2(out, require_vec2(self.texcoord1, "texcoord1")?);
                write_vec2(out, require_vec2(self.texcoord2, "texcoord2")?);
            }
            VertexFormat::Position3Color4bTexCoord6 => {
                write_vec3(out, require_vec3(self.position, "position")?);
                write_color_u8(out, require_color(self.color1, "color1")?);
                write_vec2(out, require_vec2(self.texcoord1, "texcoord1")?);
                write_vec2(out, require_vec2(self.texcoord2, "texcoord2")?);
                write_vec2(out, require_vec2(self.texcoord3, "texcoord3")?);
            }
            VertexFormat::Position3Normal3 => {
                write_vec3(out, require_vec3(self.position, "position")?);
                write_vec3(out, require_vec3(self.normal, "normal")?);
            }
            VertexFormat::Position3Normal3TexCoord2 => {
                write_vec3(out, require_vec3(self.position, "position")?);
                write_vec3(out, require_vec3(self.normal, "normal")?);
                write_vec2(out, require_vec2(self.texcoord1, "texcoord1")?);
            }
            VertexFormat::Position3Normal3Color4TexCoord2 => {
                write_vec3(out, require_vec3(self.position, "position")?);
                write_vec3(out, require_vec3(self.normal, "normal")?);
                write_color_u8(out, require_color(self.color1, "color1")?);
                write_vec2(out, require_vec2(self.texcoord1, "texcoord1")?);
            }
            VertexFormat::Position3Normal3Color4TexCoord4 => {
                write_vec3(out, require_vec3(self.position, "position")?);
                write_vec3(out, require_vec3(self.normal, "normal")?);
                write_color_u8(out, require_color(self.color1, "color1")?);
                write_vec2(out, require_vec2(self.texcoord1, "texcoord1")?);
                write_vec2(out, require_vec2(self.texcoord2, "texcoord2")?);
            }
            VertexFormat::Position3Weights4bBones4bNormal3TexCoord2 => {
                write_vec3(out, require_vec3(self.position, "position")?);
                let weights = self.weights.ok_or(IntegrityError::MissingVertexAttribute {
                    format,
                    attribute: "weights",
                })?;
                for w in weights {
                    out.push((w * 255.0).round() as u8);
                }
                let bones = self.bones.ok_or(IntegrityError::MissingVertexAttribute {
                    format,
                    attribute: "bones",
                })?;
                out.extend_from_slice(&bones);
                write_vec3(out, require_vec3(self.normal, "normal")?);
                write_vec2(out, require_vec2(self.texcoord1, "texcoord1")?);
            }
            VertexFormat::Position3Normal3Tan3Bin3TexCoord2 => {
                write_vec3(out, require_vec3(self.position, "position")?);
                write_vec3(out, require_vec3(self.normal, "normal")?);
                write_vec3(out, require_vec3(self.tangent, "tangent")?);
                write_vec3(out, require_vec3(self.binormal, "binormal")?);
                write_vec2(out, require_vec2(self.texcoord1, "texcoord1")?);
            }
            VertexFormat::Position3Normal3Tan3Bin3TexCoord4 => {
                write_vec3(out, require_vec3(self.position, "position")?);
                write_vec3(out, require_vec3(self.normal, "normal")?);
                write_vec3(out, require_vec3(self.tangent, "tangent")?);
                write_vec3(out, require_vec3(self.binormal, "binormal")?);
                write_vec2(out, require_vec2(self.texcoord1, "texcoord1")?);
                write_vec2(out, require_vec2(self.texcoord2, "texcoord2")?);
            }
            VertexFormat::Position3Normal3Tan3Bin3Color4TexCoord4 => {
                write_vec3(out, require_vec3(self.position, "position")?);
                write_vec3(out, require_vec3(self.normal, "normal")?);
                write_vec3(out, require_vec3(self.tangent, "tangent")?);
                write_vec3(out, require_vec3(self.binormal, "binormal")?);
                write_color_u8(out, require_color(self.color1, "color1")?);
                write_vec2(out, require_vec2(self.texcoord1, "texcoord1")?);
                write_vec2(out, require_vec2(self.texcoord2, "texcoord2")?);
            }
            VertexFormat::Position3Color8fTexCoord6 => {
                write_vec3(out, require_vec3(self.position, "position")?);
                write_color_f32(out, require_color(self.color1, "color1")?);
                write_color_f32(out, require_color(self.color2, "color2")?);
                write_vec2(out, require_vec2(self.texcoord1, "texcoord1")?);
                write_vec2(out, require_vec2(self.texcoord2, "texcoord2")?);
                write_vec2(out, require_vec2(self.texcoord3, "texcoord3")?);
            }
            VertexFormat::TexCoord4 | VertexFormat::Matrix => {
                return Err(FormatError::UnsupportedVertexFormat(format).into());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_one(bytes: &[u8], format: VertexFormat) -> Vertex {
        let mut cursor = Cursor::new(bytes);
        let vertex = Vertex::read(&mut cursor, format).unwrap();
        assert_eq!(cursor.position() as usize, format.stride());
        vertex
    }

    #[test]
    fn test_position3_only_populates_position() {
        let mut data = Vec::new();
        for f in [1.0f32, 2.0, 3.0] {
            data.extend_from_slice(&f.to_le_bytes());
        }
        let v = decode_one(&data, VertexFormat::Position3);
        assert_eq!(v.position, Some(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(v.normal, None);
        assert_eq!(v.color1, None);
        assert_eq!(v.texcoord1, None);
        assert_eq!(v.weights, None);
    }

    #[test]
    fn test_skinned_format_normalizes_weights_and_keeps_raw_bones() {
        let mut data = Vec::new();
        for f in [0.0f32, 0.0, 0.0] {
            data.extend_from_slice(&f.to_le_bytes());
        }
        data.extend_from_slice(&[255, 0, 0, 0]); // weights
        data.extend_from_slice(&[3, 1, 0, 0]); // bone indices
        for f in [0.0f32, 1.0, 0.0, 0.5, 0.5] {
            data.extend_from_slice(&f.to_le_bytes());
        }
        let v = decode_one(&data, VertexFormat::Position3Weights4bBones4bNormal3TexCoord2);
        assert_eq!(v.weights, Some([1.0, 0.0, 0.0, 0.0]));
        assert_eq!(v.bones, Some([3, 1, 0, 0]));
        assert_eq!(v.normal, Some(Vec3::new(0.0, 1.0, 0.0)));
        assert_eq!(v.texcoord1, Some(Vec2::new(0.5, 0.5)));
    }

    #[test]
    fn test_two_color_format_populates_both_colors() {
        let mut data = Vec::new();
        for f in [0.0f32, 0.0, 0.0] {
            data.extend_from_slice(&f.to_le_bytes());
        }
        for f in [1.0f32, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.5] {
            data.extend_from_slice(&f.to_le_bytes());
        }
        for f in [0.0f32; 6] {
            data.extend_from_slice(&f.to_le_bytes());
        }
        let v = decode_one(&data, VertexFormat::Position3Color8fTexCoord6);
        assert_eq!(v.color1, Some(Color::new(1.0, 0.0, 0.0, 1.0)));
        assert_eq!(v.color2, Some(Color::new(0.0, 1.0, 0.0, 0.5)));
        assert!(v.texcoord3.is_some());
    }

    #[test]
    fn test_unsupported_formats_error() {
        let data = [0u8; 64];
        let mut cursor = Cursor::new(&data[..]);
        let result = Vertex::read(&mut cursor, VertexFormat::Matrix);
        assert!(matches!(
            result,
            Err(PapaError::Format(FormatError::UnsupportedVertexFormat(
                VertexFormat::Matrix
            )))
        ));
    }

    #[test]
    fn test_vertex_roundtrip() {
        let mut data = Vec::new();
        for f in [1.0f32, 2.0, 3.0, 0.0, 1.0, 0.0] {
            data.extend_from_slice(&f.to_le_bytes());
        }
        data.extend_from_slice(&[0, 51, 102, 255]);
        for f in [0.25f32, 0.75] {
            data.extend_from_slice(&f.to_le_bytes());
        }
        let v = decode_one(&data, VertexFormat::Position3Normal3Color4TexCoord2);

        let mut out = Vec::new();
        v.write(&mut out, VertexFormat::Position3Normal3Color4TexCoord2)
            .unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn test_write_missing_attribute() {
        let v = Vertex {
            position: Some(Vec3::ZERO),
            ..Vertex::default()
        };
        let mut out = Vec::new();
        let result = v.write(&mut out, VertexFormat::Position3Normal3);
        assert!(matches!(
            result,
            Err(PapaError::Integrity(
                IntegrityError::MissingVertexAttribute { attribute: "normal", .. }
            ))
        ));
    }

    #[test]
    fn test_strides() {
        assert_eq!(VertexFormat::Position3.stride(), 12);
        assert_eq!(VertexFormat::Position3Normal3.stride(), 24);
        assert_eq!(
            VertexFormat::Position3Weights4bBones4bNormal3TexCoord2.stride(),
            40
        );
        assert_eq!(VertexFormat::Position3Color8fTexCoord6.stride(), 68);
    }
}
