//! Decode and merge error types
//!
//! Every error is terminal for the operation that raised it: a failed decode
//! returns no partial graph, and a failed merge leaves the accumulator where
//! it stopped. There is no retry path anywhere in the crate.

use crate::texture::TextureFormat;
use crate::vertex::VertexFormat;

/// Structural errors in the byte stream itself: bad signature, unsupported
/// version, or a discriminant the format does not define.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormatError {
    /// The first four bytes were not the container signature
    #[error("invalid file signature {0:02X?}")]
    InvalidSignature([u8; 4]),
    /// The container version is not the supported one
    #[error("unsupported container version 0x{0:08X}")]
    UnsupportedVersion(u32),
    /// A texture record carried a format byte outside the defined range
    #[error("unknown texture format 0x{0:02X}")]
    UnknownTextureFormat(u8),
    /// The texture format is defined but the payload describer cannot
    /// produce a header for it
    #[error("unsupported texture format {0:?}")]
    UnsupportedTextureFormat(TextureFormat),
    /// A vertex buffer carried a format byte outside the defined range
    #[error("unknown vertex format 0x{0:02X}")]
    UnknownVertexFormat(u8),
    /// The vertex format is defined but has no decodable layout
    #[error("unsupported vertex format {0:?}")]
    UnsupportedVertexFormat(VertexFormat),
    /// An index buffer carried a width byte other than the two defined kinds
    #[error("unknown index width 0x{0:02X}")]
    UnknownIndexFormat(u8),
    /// A material group carried a primitive-type byte outside the defined range
    #[error("unknown primitive type 0x{0:02X}")]
    UnknownPrimitiveType(u8),
    /// Only triangle lists are decodable
    #[error("unsupported primitive type {0:?}")]
    UnsupportedPrimitiveType(crate::mesh::PrimitiveType),
    /// A read ran past the end of the stream
    #[error("unexpected end of stream")]
    UnexpectedEof,
    /// A collection does not fit the container's 16-bit count fields
    #[error("{kind} table holds {len} records; the container caps counts at {max}")]
    TableTooLarge {
        kind: &'static str,
        len: usize,
        max: usize,
    },
}

/// Reference and value errors found while resolving raw records into the
/// semantic graph. The byte layout was readable; the data does not hang
/// together.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IntegrityError {
    /// A bone record carried a negative name index
    #[error("bone {bone} has no name")]
    UnnamedBone { bone: u16 },
    /// A bone name index pointed outside the string table
    #[error("bone {bone} name index {index} out of range ({len} strings)")]
    BoneNameOutOfRange { bone: u16, index: i16, len: usize },
    /// A bone referenced a parent that comes after it
    #[error("bone {bone} references parent {parent} ahead of it")]
    ForwardBoneParent { bone: u16, parent: i16 },
    /// A bone parent id was negative but not the root marker -1
    #[error("bone {bone} has invalid parent id {parent}")]
    InvalidBoneParent { bone: u16, parent: i16 },
    /// A material texture parameter pointed outside the texture table
    #[error("texture index {index} out of range ({len} textures)")]
    TextureIndexOutOfRange { index: u16, len: usize },
    /// A material group pointed outside the material table
    #[error("material index {index} out of range ({len} materials)")]
    MaterialIndexOutOfRange { index: u16, len: usize },
    /// A mesh pointed outside the vertex-buffer table
    #[error("vertex buffer index {index} out of range ({len} buffers)")]
    VertexBufferIndexOutOfRange { index: u16, len: usize },
    /// A mesh pointed outside the index-buffer table
    #[error("index buffer index {index} out of range ({len} buffers)")]
    IndexBufferIndexOutOfRange { index: u16, len: usize },
    /// A mesh binding pointed outside the mesh table
    #[error("mesh index {index} out of range ({len} meshes)")]
    MeshIndexOutOfRange { index: u16, len: usize },
    /// A model pointed outside the skeleton table
    #[error("skeleton index {index} out of range ({len} skeletons)")]
    SkeletonIndexOutOfRange { index: i16, len: usize },
    /// An animation declared a negative frame count
    #[error("animation declares a negative frame count {0}")]
    NegativeFrameCount(i32),
    /// An animation's frame-rate denominator was zero
    #[error("animation {name:?} has a zero frame-rate denominator")]
    ZeroFrameRateDenominator { name: String },
    /// An animation's transform table does not hold one entry per bone per frame
    #[error("animation {name:?} stores {actual} transforms, expected {expected}")]
    FrameCountMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },
    /// An animation listed the same skeleton bone twice
    #[error("animation {name:?} lists bone {bone} more than once")]
    DuplicateAnimationBone { name: String, bone: u16 },
    /// A material group addresses indices past the end of its index buffer
    #[error("material group {group:?} ends at index {end}, buffer holds {len}")]
    MaterialGroupOutOfBounds {
        group: String,
        end: u64,
        len: usize,
    },
    /// A vertex lacks an attribute its buffer format requires
    #[error("vertex is missing {attribute} required by format {format:?}")]
    MissingVertexAttribute {
        format: VertexFormat,
        attribute: &'static str,
    },
    /// An index value does not fit its buffer's 16-bit width
    #[error("index {index} does not fit the buffer's 16-bit width")]
    IndexTooWide { index: u32 },
}

/// Name conflicts found while merging containers
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MergeError {
    /// `merge` was handed an empty sequence
    #[error("cannot merge an empty sequence of assets")]
    EmptyInput,
    /// Both assets hold an animation with the same non-empty name
    #[error("duplicate animation {0:?}")]
    DuplicateAnimation(String),
    /// Both assets hold a model with the same non-empty name
    #[error("duplicate model {0:?}")]
    DuplicateModel(String),
}

/// Any error this crate can produce
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PapaError {
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Integrity(#[from] IntegrityError),
    #[error(transparent)]
    Merge(#[from] MergeError),
    /// IO error while reading a source stream
    #[error("i/o error: {0}")]
    Io(String),
}

impl From<std::io::Error> for PapaError {
    fn from(e: std::io::Error) -> Self {
        PapaError::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            PapaError::from(FormatError::InvalidSignature(*b"GLTF")).to_string(),
            "invalid file signature [47, 4C, 54, 46]"
        );
        assert_eq!(
            FormatError::UnsupportedVersion(0x0002_0000).to_string(),
            "unsupported container version 0x00020000"
        );
        assert_eq!(
            IntegrityError::UnnamedBone { bone: 7 }.to_string(),
            "bone 7 has no name"
        );
        assert_eq!(
            MergeError::DuplicateAnimation("walk".to_string()).to_string(),
            "duplicate animation \"walk\""
        );
    }

    #[test]
    fn test_umbrella_from() {
        let err: PapaError = IntegrityError::NegativeFrameCount(-3).into();
        assert!(matches!(
            err,
            PapaError::Integrity(IntegrityError::NegativeFrameCount(-3))
        ));
    }
}
