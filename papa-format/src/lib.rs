//! papa-format: decoder and merger for Planetary Annihilation `.papa` assets
//!
//! This crate reads the `.papa` binary container (textures, materials,
//! meshes, skeletons, models, and animations) into a fully-resolved,
//! read-only asset graph, and can fold several decoded containers into one
//! logical asset (models split across files, texture/animation add-ons).
//!
//! # Container layout
//!
//! ```text
//! 0x00: signature "apaP" (4 bytes)
//! 0x04: version u32 (0x00030000 = version 3)
//! 0x08: table counts i16 x9  (strings, textures, vertex buffers, index
//!       buffers, materials, meshes, skeletons, models, animations)
//! 0x1A: padding i16 x3
//! 0x20: table offsets i64 x9, same order; negative = table absent
//! 0x68: table payloads at arbitrary positions
//! ```
//!
//! All integers are little-endian. Decoding happens in two phases: a record
//! layer mirrors the on-disk tables (indices, offsets) exactly, then a
//! resolution phase replaces every index with a shared handle and validates
//! referential integrity. Either everything decodes or nothing does.
//!
//! Texture payloads stay compressed/packed; [`Texture::describe`] computes
//! the format descriptor (pitch, bits per pixel, channel masks or FourCC)
//! that an external image codec needs to decode the pixels.
//!
//! # Usage
//!
//! ```ignore
//! use papa_format::Papa;
//!
//! let unit = Papa::from_bytes(&std::fs::read("unit.papa").unwrap()).unwrap();
//! let anims = Papa::from_bytes(&std::fs::read("unit_anim.papa").unwrap()).unwrap();
//!
//! let merged = Papa::merge(vec![unit, anims]).unwrap();
//! for model in &merged.models {
//!     println!("model {:?}: {} mesh bindings", model.name, model.mesh_bindings.len());
//! }
//! ```

mod animation;
mod decode;
mod describe;
mod error;
mod index_buffer;
mod material;
mod merge;
mod mesh;
mod model;
mod papa;
mod primitives;
mod skeleton;
mod strings;
mod texture;
mod vertex;
mod vertex_buffer;
mod write;

pub use animation::{Animation, AnimationFrame};
pub use describe::{PayloadDescriptor, PixelLayout};
pub use error::{FormatError, IntegrityError, MergeError, PapaError};
pub use index_buffer::{IndexBuffer, IndexFormat};
pub use material::{Material, MatrixParameter, TextureParameter, VectorParameter};
pub use mesh::{MaterialGroup, Mesh, PrimitiveType};
pub use model::{MeshBinding, Model};
pub use papa::Papa;
pub use primitives::{Color, ColorFormat};
pub use skeleton::{Bone, Skeleton};
pub use texture::{Texture, TextureFormat};
pub use vertex::{Vertex, VertexFormat};
pub use vertex_buffer::VertexBuffer;

// =============================================================================
// Constants
// =============================================================================

/// Container file signature
pub const PAPA_SIGNATURE: &[u8; 4] = b"apaP";

/// Container version we support (version 3)
pub const PAPA_VERSION: u32 = 0x0003_0000;
