//! Container decoding
//!
//! Decoding is a strictly sequential, two-phase pass over one byte stream:
//!
//! 1. Read the fixed header (signature, version, nine table counts, nine
//!    table offsets), then decode every table through the record layer. A
//!    negative table offset means the table is absent and yields an empty
//!    collection without seeking. The cursor is restored around every table
//!    read, so tables may sit anywhere in the file and may overlap.
//! 2. Resolve raw records into the semantic graph in dependency order
//!    (textures, materials, buffers, meshes, skeletons, models; animations
//!    independently), replacing every index with a shared handle.
//!
//! Any failure aborts the whole decode; no partial graph is ever returned.

use std::io::{Cursor, Read};
use std::sync::Arc;

use log::debug;

use crate::animation::{Animation, AnimationRecord};
use crate::error::{FormatError, PapaError};
use crate::index_buffer::{IndexBuffer, IndexBufferRecord};
use crate::material::{Material, MaterialRecord};
use crate::mesh::{Mesh, MeshRecord};
use crate::model::{Model, ModelRecord};
use crate::papa::Papa;
use crate::primitives::{read_at, read_i16, read_i64, read_u32};
use crate::skeleton::{Skeleton, SkeletonRecord};
use crate::strings::read_string_entry;
use crate::texture::{Texture, TextureRecord};
use crate::vertex_buffer::{VertexBuffer, VertexBufferRecord};
use crate::{PAPA_SIGNATURE, PAPA_VERSION};

/// Decode one table: seek to `offset`, run `parse` once per record, restore
/// the cursor. A negative offset yields an empty collection.
fn read_table<T>(
    cursor: &mut Cursor<&[u8]>,
    count: i16,
    offset: i64,
    parse: impl Fn(&mut Cursor<&[u8]>) -> Result<T, PapaError>,
) -> Result<Vec<T>, PapaError> {
    if offset < 0 {
        return Ok(Vec::new());
    }

    read_at(cursor, offset as u64, |c| {
        let count = count.max(0) as usize;
        let mut records = Vec::with_capacity(count);
        for _ in 0..count {
            records.push(parse(c)?);
        }
        Ok(records)
    })
}

impl Papa {
    /// Decode a container from a byte slice
    pub fn from_bytes(data: &[u8]) -> Result<Self, PapaError> {
        let mut cursor = Cursor::new(data);

        let mut signature = [0u8; 4];
        cursor
            .read_exact(&mut signature)
            .map_err(|_| FormatError::UnexpectedEof)?;
        if &signature != PAPA_SIGNATURE {
            return Err(FormatError::InvalidSignature(signature).into());
        }

        let version = read_u32(&mut cursor)?;
        if version != PAPA_VERSION {
            return Err(FormatError::UnsupportedVersion(version).into());
        }

        let mut counts = [0i16; 9];
        for count in &mut counts {
            *count = read_i16(&mut cursor)?;
        }
        for _ in 0..3 {
            read_i16(&mut cursor)?;
        }

        let mut offsets = [0i64; 9];
        for offset in &mut offsets {
            *offset = read_i64(&mut cursor)?;
        }

        let [strings_c, textures_c, vbuffers_c, ibuffers_c, materials_c, meshes_c, skeletons_c, models_c, animations_c] =
            counts;
        let [strings_o, textures_o, vbuffers_o, ibuffers_o, materials_o, meshes_o, skeletons_o, models_o, animations_o] =
            offsets;

        // Phase 1: raw tables, in header order
        let strings = read_table(&mut cursor, strings_c, strings_o, read_string_entry)?;
        let texture_records =
            read_table(&mut cursor, textures_c, textures_o, TextureRecord::parse)?;
        let vbuffer_records =
            read_table(&mut cursor, vbuffers_c, vbuffers_o, VertexBufferRecord::parse)?;
        let ibuffer_records =
            read_table(&mut cursor, ibuffers_c, ibuffers_o, IndexBufferRecord::parse)?;
        let material_records =
            read_table(&mut cursor, materials_c, materials_o, MaterialRecord::parse)?;
        let mesh_records = read_table(&mut cursor, meshes_c, meshes_o, MeshRecord::parse)?;
        let skeleton_records =
            read_table(&mut cursor, skeletons_c, skeletons_o, SkeletonRecord::parse)?;
        let model_records = read_table(&mut cursor, models_c, models_o, ModelRecord::parse)?;
        let animation_records =
            read_table(&mut cursor, animations_c, animations_o, AnimationRecord::parse)?;

        // Phase 2: resolve indices into shared handles, dependencies first
        let textures: Vec<Arc<Texture>> = texture_records
            .into_iter()
            .map(|r| Arc::new(Texture::from_record(r, &strings)))
            .collect();

        let materials = material_records
            .into_iter()
            .map(|r| Material::from_record(r, &strings, &textures).map(Arc::new))
            .collect::<Result<Vec<_>, _>>()?;

        let vertex_buffers: Vec<Arc<VertexBuffer>> = vbuffer_records
            .into_iter()
            .map(|r| Arc::new(VertexBuffer::from(r)))
            .collect();
        let index_buffers: Vec<Arc<IndexBuffer>> = ibuffer_records
            .into_iter()
            .map(|r| Arc::new(IndexBuffer::from(r)))
            .collect();

        let meshes = mesh_records
            .into_iter()
            .map(|r| {
                Mesh::from_record(r, &strings, &materials, &vertex_buffers, &index_buffers)
                    .map(Arc::new)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let skeletons = skeleton_records
            .into_iter()
            .map(|r| Skeleton::from_record(r, &strings).map(Arc::new))
            .collect::<Result<Vec<_>, _>>()?;

        let models = model_records
            .into_iter()
            .map(|r| Model::from_record(r, &strings, &skeletons, &meshes))
            .collect::<Result<Vec<_>, _>>()?;

        let animations = animation_records
            .into_iter()
            .map(|r| Animation::from_record(r, &strings))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            "decoded container: {} textures, {} models, {} animations",
            textures.len(),
            models.len(),
            animations.len()
        );

        Ok(Papa {
            textures,
            models,
            animations,
        })
    }

    /// Decode a container from any reader by buffering it first
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self, PapaError> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(&data)
    }
}
