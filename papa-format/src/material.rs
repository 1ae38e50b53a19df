//! Material records and resolved materials
//!
//! # Record layout
//! ```text
//! 0x00: shader_name_index u16
//! 0x02: vector_param_count u16
//! 0x04: texture_param_count u16
//! 0x06: matrix_param_count u16
//! 0x08: vector_params_offset i64
//! 0x10: texture_params_offset i64
//! 0x18: matrix_params_offset i64
//! ```
//!
//! Each parameter array is an out-of-line sub-table read at its recorded
//! offset; a non-positive offset skips the array regardless of its declared
//! count.
//!
//! Parameter layouts:
//! ```text
//! vector:  name_index i16, padding u16, value f32 x4
//! texture: name_index i16, texture_index u16
//! matrix:  name_index i16, padding u16, value f32 x16
//! ```

use std::io::Cursor;
use std::sync::Arc;

use glam::{Mat4, Vec4};

use crate::error::{IntegrityError, PapaError};
use crate::primitives::{read_at, read_i16, read_i64, read_mat4, read_u16, read_vec4};
use crate::strings::name_from_index;
use crate::texture::Texture;

#[derive(Debug, Clone)]
pub(crate) struct VectorParamRecord {
    pub name_index: i16,
    pub value: Vec4,
}

#[derive(Debug, Clone)]
pub(crate) struct TextureParamRecord {
    pub name_index: i16,
    pub texture_index: u16,
}

#[derive(Debug, Clone)]
pub(crate) struct MatrixParamRecord {
    pub name_index: i16,
    pub value: Mat4,
}

/// Raw material-table record, prior to reference resolution
#[derive(Debug, Clone)]
pub(crate) struct MaterialRecord {
    pub shader_name_index: u16,
    pub vector_params: Vec<VectorParamRecord>,
    pub texture_params: Vec<TextureParamRecord>,
    pub matrix_params: Vec<MatrixParamRecord>,
}

impl MaterialRecord {
    pub(crate) fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self, PapaError> {
        let shader_name_index = read_u16(cursor)?;

        let vector_count = read_u16(cursor)?;
        let texture_count = read_u16(cursor)?;
        let matrix_count = read_u16(cursor)?;

        let vector_offset = read_i64(cursor)?;
        let texture_offset = read_i64(cursor)?;
        let matrix_offset = read_i64(cursor)?;

        let mut vector_params = Vec::with_capacity(vector_count as usize);
        if vector_offset > 0 {
            vector_params = read_at(cursor, vector_offset as u64, |c| {
                let mut params = Vec::with_capacity(vector_count as usize);
                for _ in 0..vector_count {
                    let name_index = read_i16(c)?;
                    let _padding = read_u16(c)?;
                    let value = read_vec4(c)?;
                    params.push(VectorParamRecord { name_index, value });
                }
                Ok(params)
            })?;
        }

        let mut texture_params = Vec::with_capacity(texture_count as usize);
        if texture_offset > 0 {
            texture_params = read_at(cursor, texture_offset as u64, |c| {
                let mut params = Vec::with_capacity(texture_count as usize);
                for _ in 0..texture_count {
                    let name_index = read_i16(c)?;
                    let texture_index = read_u16(c)?;
                    params.push(TextureParamRecord {
                        name_index,
                        texture_index,
                    });
                }
                Ok(params)
            })?;
        }

        let mut matrix_params = Vec::with_capacity(matrix_count as usize);
        if matrix_offset > 0 {
            matrix_params = read_at(cursor, matrix_offset as u64, |c| {
                let mut params = Vec::with_capacity(matrix_count as usize);
                for _ in 0..matrix_count {
                    let name_index = read_i16(c)?;
                    let _padding = read_u16(c)?;
                    let value = read_mat4(c)?;
                    params.push(MatrixParamRecord { name_index, value });
                }
                Ok(params)
            })?;
        }

        Ok(Self {
            shader_name_index,
            vector_params,
            texture_params,
            matrix_params,
        })
    }
}

/// A named 4-float shader parameter
#[derive(Debug, Clone, PartialEq)]
pub struct VectorParameter {
    pub name: String,
    pub value: Vec4,
}

/// A named texture binding
#[derive(Debug, Clone, PartialEq)]
pub struct TextureParameter {
    pub name: String,
    pub texture: Arc<Texture>,
}

/// A named 4x4 matrix shader parameter
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixParameter {
    pub name: String,
    pub value: Mat4,
}

/// A resolved material: shader name plus its parameter lists
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub shader_name: String,
    pub vector_parameters: Vec<VectorParameter>,
    pub texture_parameters: Vec<TextureParameter>,
    pub matrix_parameters: Vec<MatrixParameter>,
}

impl Material {
    pub(crate) fn from_record(
        record: MaterialRecord,
        strings: &[String],
        textures: &[Arc<Texture>],
    ) -> Result<Self, PapaError> {
        let vector_parameters = record
            .vector_params
            .into_iter()
            .map(|p| VectorParameter {
                name: name_from_index(strings, p.name_index as i64),
                value: p.value,
            })
            .collect();

        let mut texture_parameters = Vec::with_capacity(record.texture_params.len());
        for p in record.texture_params {
            let texture = textures
                .get(p.texture_index as usize)
                .cloned()
                .ok_or(IntegrityError::TextureIndexOutOfRange {
                    index: p.texture_index,
                    len: textures.len(),
                })?;
            texture_parameters.push(TextureParameter {
                name: name_from_index(strings, p.name_index as i64),
                texture,
            });
        }

        let matrix_parameters = record
            .matrix_params
            .into_iter()
            .map(|p| MatrixParameter {
                name: name_from_index(strings, p.name_index as i64),
                value: p.value,
            })
            .collect();

        Ok(Self {
            shader_name: name_from_index(strings, record.shader_name_index as i64),
            vector_parameters,
            texture_parameters,
            matrix_parameters,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::TextureFormat;

    fn material_record_bytes(
        vector: &[(i16, [f32; 4])],
        texture: &[(i16, u16)],
    ) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&0u16.to_le_bytes());
        data.extend_from_slice(&(vector.len() as u16).to_le_bytes());
        data.extend_from_slice(&(texture.len() as u16).to_le_bytes());
        data.extend_from_slice(&0u16.to_le_bytes());

        let vector_offset: i64 = if vector.is_empty() { -1 } else { 32 };
        let texture_offset: i64 = if texture.is_empty() {
            -1
        } else {
            32 + vector.len() as i64 * 20
        };
        data.extend_from_slice(&vector_offset.to_le_bytes());
        data.extend_from_slice(&texture_offset.to_le_bytes());
        data.extend_from_slice(&(-1i64).to_le_bytes());

        for (name, value) in vector {
            data.extend_from_slice(&name.to_le_bytes());
            data.extend_from_slice(&0u16.to_le_bytes());
            for f in value {
                data.extend_from_slice(&f.to_le_bytes());
            }
        }
        for (name, index) in texture {
            data.extend_from_slice(&name.to_le_bytes());
            data.extend_from_slice(&index.to_le_bytes());
        }
        data
    }

    fn test_texture() -> Arc<Texture> {
        Arc::new(Texture {
            name: "diffuse".to_string(),
            format: TextureFormat::R8G8B8A8,
            width: 1,
            height: 1,
            mip_count: 1,
            srgb: false,
            data: vec![0; 4],
        })
    }

    #[test]
    fn test_parse_and_resolve() {
        let data = material_record_bytes(&[(1, [0.5, 0.5, 0.5, 1.0])], &[(-1, 0)]);
        let mut cursor = Cursor::new(&data[..]);
        let record = MaterialRecord::parse(&mut cursor).unwrap();
        assert_eq!(cursor.position(), 32);

        let strings = vec!["solid".to_string(), "tint".to_string()];
        let textures = vec![test_texture()];
        let material = Material::from_record(record, &strings, &textures).unwrap();

        assert_eq!(material.shader_name, "solid");
        assert_eq!(material.vector_parameters.len(), 1);
        assert_eq!(material.vector_parameters[0].name, "tint");
        assert_eq!(material.texture_parameters[0].name, "");
        assert_eq!(material.texture_parameters[0].texture.name, "diffuse");
        assert!(material.matrix_parameters.is_empty());
    }

    #[test]
    fn test_nonpositive_subtable_offset_skips_array() {
        // Declared count of 2 but offset -1: array must come back empty
        let mut data = material_record_bytes(&[], &[]);
        data[2..4].copy_from_slice(&2u16.to_le_bytes());
        let mut cursor = Cursor::new(&data[..]);
        let record = MaterialRecord::parse(&mut cursor).unwrap();
        assert!(record.vector_params.is_empty());
    }

    #[test]
    fn test_texture_index_out_of_range_is_fatal() {
        let data = material_record_bytes(&[], &[(0, 5)]);
        let mut cursor = Cursor::new(&data[..]);
        let record = MaterialRecord::parse(&mut cursor).unwrap();

        let result = Material::from_record(record, &[], &[test_texture()]);
        assert!(matches!(
            result,
            Err(PapaError::Integrity(
                IntegrityError::TextureIndexOutOfRange { index: 5, len: 1 }
            ))
        ));
    }
}
