//! Mesh records, material groups, and resolved meshes
//!
//! # Record layout
//! ```text
//! 0x00: vertex_buffer_index u16
//! 0x02: index_buffer_index u16
//! 0x04: material_group_count u16
//! 0x06: padding u16
//! 0x08: material_groups_offset i64
//! ```
//!
//! Material group layout:
//! ```text
//! 0x00: name_index i16
//! 0x02: material_index u16
//! 0x04: first_index u32
//! 0x08: primitive_count u32
//! 0x0C: primitive_type u8    triangle lists only
//! 0x0D: padding u8 x3
//! ```

use std::io::Cursor;
use std::sync::Arc;

use crate::error::{FormatError, IntegrityError, PapaError};
use crate::index_buffer::IndexBuffer;
use crate::material::Material;
use crate::primitives::{read_at, read_i16, read_i64, read_u8, read_u16, read_u32};
use crate::strings::name_from_index;
use crate::vertex_buffer::VertexBuffer;

/// Primitive topology of a material group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PrimitiveType {
    Points = 0,
    Lines = 1,
    Triangles = 2,
}

impl PrimitiveType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Points),
            1 => Some(Self::Lines),
            2 => Some(Self::Triangles),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct MaterialGroupRecord {
    pub name_index: i16,
    pub material_index: u16,
    pub first_index: u32,
    pub primitive_count: u32,
    pub primitive_type: PrimitiveType,
}

impl MaterialGroupRecord {
    pub(crate) fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self, PapaError> {
        let name_index = read_i16(cursor)?;
        let material_index = read_u16(cursor)?;
        let first_index = read_u32(cursor)?;
        let primitive_count = read_u32(cursor)?;

        let type_byte = read_u8(cursor)?;
        let primitive_type = PrimitiveType::from_u8(type_byte)
            .ok_or(FormatError::UnknownPrimitiveType(type_byte))?;
        for _ in 0..3 {
            read_u8(cursor)?;
        }

        if primitive_type != PrimitiveType::Triangles {
            return Err(FormatError::UnsupportedPrimitiveType(primitive_type).into());
        }

        Ok(Self {
            name_index,
            material_index,
            first_index,
            primitive_count,
            primitive_type,
        })
    }
}

/// Raw mesh-table record, prior to reference resolution
#[derive(Debug, Clone)]
pub(crate) struct MeshRecord {
    pub vertex_buffer_index: u16,
    pub index_buffer_index: u16,
    pub material_groups: Vec<MaterialGroupRecord>,
}

impl MeshRecord {
    pub(crate) fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self, PapaError> {
        let vertex_buffer_index = read_u16(cursor)?;
        let index_buffer_index = read_u16(cursor)?;
        let group_count = read_u16(cursor)?;
        let _padding = read_u16(cursor)?;
        let groups_offset = read_i64(cursor)?;

        let mut material_groups = Vec::with_capacity(group_count as usize);
        if groups_offset > 0 {
            material_groups = read_at(cursor, groups_offset as u64, |c| {
                let mut groups = Vec::with_capacity(group_count as usize);
                for _ in 0..group_count {
                    groups.push(MaterialGroupRecord::parse(c)?);
                }
                Ok(groups)
            })?;
        }

        Ok(Self {
            vertex_buffer_index,
            index_buffer_index,
            material_groups,
        })
    }
}

/// A contiguous index range drawn with one material
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialGroup {
    pub name: String,
    pub material: Arc<Material>,
    pub first_index: u32,
    pub primitive_count: u32,
    pub primitive_type: PrimitiveType,
}

/// A resolved mesh: one vertex buffer, one index buffer, and the material
/// groups drawn from them
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub vertex_buffer: Arc<VertexBuffer>,
    pub index_buffer: Arc<IndexBuffer>,
    pub material_groups: Vec<MaterialGroup>,
}

impl Mesh {
    pub(crate) fn from_record(
        record: MeshRecord,
        strings: &[String],
        materials: &[Arc<Material>],
        vertex_buffers: &[Arc<VertexBuffer>],
        index_buffers: &[Arc<IndexBuffer>],
    ) -> Result<Self, PapaError> {
        let vertex_buffer = vertex_buffers
            .get(record.vertex_buffer_index as usize)
            .cloned()
            .ok_or(IntegrityError::VertexBufferIndexOutOfRange {
                index: record.vertex_buffer_index,
                len: vertex_buffers.len(),
            })?;
        let index_buffer = index_buffers
            .get(record.index_buffer_index as usize)
            .cloned()
            .ok_or(IntegrityError::IndexBufferIndexOutOfRange {
                index: record.index_buffer_index,
                len: index_buffers.len(),
            })?;

        let mut material_groups = Vec::with_capacity(record.material_groups.len());
        for group in record.material_groups {
            let material = materials
                .get(group.material_index as usize)
                .cloned()
                .ok_or(IntegrityError::MaterialIndexOutOfRange {
                    index: group.material_index,
                    len: materials.len(),
                })?;
            material_groups.push(MaterialGroup {
                name: name_from_index(strings, group.name_index as i64),
                material,
                first_index: group.first_index,
                primitive_count: group.primitive_count,
                primitive_type: group.primitive_type,
            });
        }

        Ok(Self {
            vertex_buffer,
            index_buffer,
            material_groups,
        })
    }

    /// Check that every material group stays inside the index buffer
    ///
    /// The decoder itself does not enforce this; exporters call it before
    /// walking index ranges.
    pub fn validate_material_groups(&self) -> Result<(), PapaError> {
        let len = self.index_buffer.indices.len();
        for group in &self.material_groups {
            let end = group.first_index as u64 + 3 * group.primitive_count as u64;
            if end > len as u64 {
                return Err(IntegrityError::MaterialGroupOutOfBounds {
                    group: group.name.clone(),
                    end,
                    len,
                }
                .into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index_buffer::IndexFormat;
    use crate::vertex::VertexFormat;

    fn group_bytes(type_byte: u8) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&(-1i16).to_le_bytes());
        data.extend_from_slice(&0u16.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&1u32.to_le_bytes());
        data.push(type_byte);
        data.extend_from_slice(&[0, 0, 0]);
        data
    }

    #[test]
    fn test_non_triangle_group_is_fatal() {
        let data = group_bytes(1);
        let mut cursor = Cursor::new(&data[..]);
        assert!(matches!(
            MaterialGroupRecord::parse(&mut cursor),
            Err(PapaError::Format(FormatError::UnsupportedPrimitiveType(
                PrimitiveType::Lines
            )))
        ));
    }

    #[test]
    fn test_unknown_primitive_byte_is_fatal() {
        let data = group_bytes(9);
        let mut cursor = Cursor::new(&data[..]);
        assert!(matches!(
            MaterialGroupRecord::parse(&mut cursor),
            Err(PapaError::Format(FormatError::UnknownPrimitiveType(9)))
        ));
    }

    fn test_mesh(first_index: u32, primitive_count: u32, index_count: usize) -> Mesh {
        let material = Arc::new(Material {
            shader_name: "solid".to_string(),
            vector_parameters: vec![],
            texture_parameters: vec![],
            matrix_parameters: vec![],
        });
        Mesh {
            vertex_buffer: Arc::new(VertexBuffer {
                format: VertexFormat::Position3,
                vertices: vec![],
            }),
            index_buffer: Arc::new(IndexBuffer {
                format: IndexFormat::UInt16,
                indices: vec![0; index_count],
            }),
            material_groups: vec![MaterialGroup {
                name: "hull".to_string(),
                material,
                first_index,
                primitive_count,
                primitive_type: PrimitiveType::Triangles,
            }],
        }
    }

    #[test]
    fn test_validate_material_groups_in_bounds() {
        assert!(test_mesh(0, 2, 6).validate_material_groups().is_ok());
        assert!(test_mesh(3, 1, 6).validate_material_groups().is_ok());
    }

    #[test]
    fn test_validate_material_groups_out_of_bounds() {
        let result = test_mesh(3, 2, 6).validate_material_groups();
        assert!(matches!(
            result,
            Err(PapaError::Integrity(
                IntegrityError::MaterialGroupOutOfBounds { end: 9, len: 6, .. }
            ))
        ));
    }
}
