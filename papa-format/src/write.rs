//! Container writing
//!
//! [`Papa::to_bytes`] serializes an asset back into a valid container. The
//! writer emits a canonical layout: the 104-byte header, the nine record
//! tables in header order, then one data region holding every out-of-line
//! payload (string text, texture payloads, packed vertices and indices,
//! parameter arrays, bone arrays, bindings, animation transforms). Absent
//! tables and empty sub-tables encode offset -1.
//!
//! Entities reachable only through the graph (buffers, materials, meshes,
//! skeletons, and textures referenced by materials but missing from the
//! texture list) are collected and deduplicated by handle identity, so
//! shared references stay shared on disk.

use std::sync::Arc;

use glam::Mat4;
use hashbrown::HashMap;

use crate::error::{FormatError, IntegrityError, PapaError};
use crate::index_buffer::{IndexBuffer, IndexFormat};
use crate::material::Material;
use crate::mesh::Mesh;
use crate::papa::Papa;
use crate::skeleton::Skeleton;
use crate::texture::Texture;
use crate::vertex_buffer::VertexBuffer;
use crate::{PAPA_SIGNATURE, PAPA_VERSION};

const HEADER_SIZE: usize = 104;
const STRING_RECORD_SIZE: usize = 16;
const TEXTURE_RECORD_SIZE: usize = 24;
const BUFFER_RECORD_SIZE: usize = 24;
const MATERIAL_RECORD_SIZE: usize = 32;
const MESH_RECORD_SIZE: usize = 16;
const SKELETON_RECORD_SIZE: usize = 16;
const MODEL_RECORD_SIZE: usize = 80;
const ANIMATION_RECORD_SIZE: usize = 32;

/// Denominator used when re-encoding frame rates; whole and millihertz
/// rates survive a round trip exactly
const FPS_DENOMINATOR: u32 = 1000;

fn write_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn write_i16(out: &mut Vec<u8>, value: i16) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn write_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn write_u64(out: &mut Vec<u8>, value: u64) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn write_i64(out: &mut Vec<u8>, value: i64) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn write_f32(out: &mut Vec<u8>, value: f32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn write_mat4(out: &mut Vec<u8>, value: &Mat4) {
    for f in value.to_cols_array() {
        write_f32(out, f);
    }
}

/// Write the 3x3 block of a matrix stored with an identity border
fn write_mat3(out: &mut Vec<u8>, value: &Mat4) {
    let cols = value.to_cols_array();
    for col in 0..3 {
        for row in 0..3 {
            write_f32(out, cols[col * 4 + row]);
        }
    }
}

fn checked_u16_len(len: usize, kind: &'static str) -> Result<u16, PapaError> {
    if len > u16::MAX as usize {
        return Err(FormatError::TableTooLarge {
            kind,
            len,
            max: u16::MAX as usize,
        }
        .into());
    }
    Ok(len as u16)
}

fn checked_count(len: usize, kind: &'static str) -> Result<i16, PapaError> {
    if len > i16::MAX as usize {
        return Err(FormatError::TableTooLarge {
            kind,
            len,
            max: i16::MAX as usize,
        }
        .into());
    }
    Ok(len as i16)
}

/// Interns strings with first-use ordering; empty names map to index -1
#[derive(Default)]
struct StringInterner {
    strings: Vec<String>,
    ids: HashMap<String, i16>,
}

impl StringInterner {
    fn intern(&mut self, name: &str) -> Result<i16, PapaError> {
        if let Some(&id) = self.ids.get(name) {
            return Ok(id);
        }
        let id = checked_count(self.strings.len() + 1, "string")? - 1;
        self.strings.push(name.to_string());
        self.ids.insert(name.to_string(), id);
        Ok(id)
    }

    /// Empty names are encoded as the no-name index instead of interned
    fn intern_optional(&mut self, name: &str) -> Result<i16, PapaError> {
        if name.is_empty() {
            return Ok(-1);
        }
        self.intern(name)
    }
}

/// Entities collected from the graph, deduplicated by handle identity
struct Tables {
    strings: StringInterner,
    textures: Vec<Arc<Texture>>,
    texture_ids: HashMap<usize, u16>,
    vertex_buffers: Vec<Arc<VertexBuffer>>,
    vertex_buffer_ids: HashMap<usize, u16>,
    index_buffers: Vec<Arc<IndexBuffer>>,
    index_buffer_ids: HashMap<usize, u16>,
    materials: Vec<Arc<Material>>,
    material_ids: HashMap<usize, u16>,
    meshes: Vec<Arc<Mesh>>,
    mesh_ids: HashMap<usize, u16>,
    skeletons: Vec<Arc<Skeleton>>,
    skeleton_ids: HashMap<usize, u16>,
}

fn intern_arc<T>(
    list: &mut Vec<Arc<T>>,
    ids: &mut HashMap<usize, u16>,
    arc: &Arc<T>,
    kind: &'static str,
) -> Result<(u16, bool), PapaError> {
    let key = Arc::as_ptr(arc) as usize;
    if let Some(&id) = ids.get(&key) {
        return Ok((id, false));
    }
    let id = checked_u16_len(list.len(), kind)?;
    list.push(Arc::clone(arc));
    ids.insert(key, id);
    Ok((id, true))
}

impl Tables {
    fn collect(papa: &Papa) -> Result<Self, PapaError> {
        let mut tables = Tables {
            strings: StringInterner::default(),
            textures: Vec::new(),
            texture_ids: HashMap::new(),
            vertex_buffers: Vec::new(),
            vertex_buffer_ids: HashMap::new(),
            index_buffers: Vec::new(),
            index_buffer_ids: HashMap::new(),
            materials: Vec::new(),
            material_ids: HashMap::new(),
            meshes: Vec::new(),
            mesh_ids: HashMap::new(),
            skeletons: Vec::new(),
            skeleton_ids: HashMap::new(),
        };

        for texture in &papa.textures {
            intern_arc(
                &mut tables.textures,
                &mut tables.texture_ids,
                texture,
                "texture",
            )?;
        }

        for model in &papa.models {
            if let Some(skeleton) = &model.skeleton {
                intern_arc(
                    &mut tables.skeletons,
                    &mut tables.skeleton_ids,
                    skeleton,
                    "skeleton",
                )?;
            }
            for binding in &model.mesh_bindings {
                let (_, new_mesh) = intern_arc(
                    &mut tables.meshes,
                    &mut tables.mesh_ids,
                    &binding.mesh,
                    "mesh",
                )?;
                if !new_mesh {
                    continue;
                }
                let mesh = &binding.mesh;
                intern_arc(
                    &mut tables.vertex_buffers,
                    &mut tables.vertex_buffer_ids,
                    &mesh.vertex_buffer,
                    "vertex buffer",
                )?;
                intern_arc(
                    &mut tables.index_buffers,
                    &mut tables.index_buffer_ids,
                    &mesh.index_buffer,
                    "index buffer",
                )?;
                for group in &mesh.material_groups {
                    let (_, new_material) = intern_arc(
                        &mut tables.materials,
                        &mut tables.material_ids,
                        &group.material,
                        "material",
                    )?;
                    if !new_material {
                        continue;
                    }
                    // Materials may reference textures the asset never
                    // listed; appended so their indices resolve
                    for param in &group.material.texture_parameters {
                        intern_arc(
                            &mut tables.textures,
                            &mut tables.texture_ids,
                            &param.texture,
                            "texture",
                        )?;
                    }
                }
            }
        }

        tables.intern_names(papa)?;
        Ok(tables)
    }

    /// Intern every name serialization will ask for, in table order
    fn intern_names(&mut self, papa: &Papa) -> Result<(), PapaError> {
        for texture in &self.textures {
            self.strings.intern_optional(&texture.name)?;
        }

        for material in &self.materials {
            self.strings.intern_optional(&material.shader_name)?;
            for p in &material.vector_parameters {
                self.strings.intern_optional(&p.name)?;
            }
            for p in &material.texture_parameters {
                self.strings.intern_optional(&p.name)?;
            }
            for p in &material.matrix_parameters {
                self.strings.intern_optional(&p.name)?;
            }
        }

        for mesh in &self.meshes {
            for group in &mesh.material_groups {
                self.strings.intern_optional(&group.name)?;
            }
        }

        for skeleton in &self.skeletons {
            for bone in &skeleton.bones {
                // Bone names are required on disk; even an empty one gets a
                // real string entry because -1 would not decode
                self.strings.intern(&bone.name)?;
            }
        }

        for model in &papa.models {
            self.strings.intern_optional(&model.name)?;
            for binding in &model.mesh_bindings {
                self.strings.intern_optional(&binding.name)?;
            }
        }

        for animation in &papa.animations {
            self.strings.intern_optional(&animation.name)?;
        }

        Ok(())
    }
}

impl Papa {
    /// Serialize the asset into container bytes
    ///
    /// The writer produces a canonical layout; decoding the result yields an
    /// asset equal to this one (with materials' stray texture references
    /// normalized into the texture list).
    pub fn to_bytes(&self) -> Result<Vec<u8>, PapaError> {
        let mut tables = Tables::collect(self)?;

        let counts = [
            checked_count(tables.strings.strings.len(), "string")?,
            checked_count(tables.textures.len(), "texture")?,
            checked_count(tables.vertex_buffers.len(), "vertex buffer")?,
            checked_count(tables.index_buffers.len(), "index buffer")?,
            checked_count(tables.materials.len(), "material")?,
            checked_count(tables.meshes.len(), "mesh")?,
            checked_count(tables.skeletons.len(), "skeleton")?,
            checked_count(self.models.len(), "model")?,
            checked_count(self.animations.len(), "animation")?,
        ];

        let record_sizes = [
            STRING_RECORD_SIZE,
            TEXTURE_RECORD_SIZE,
            BUFFER_RECORD_SIZE,
            BUFFER_RECORD_SIZE,
            MATERIAL_RECORD_SIZE,
            MESH_RECORD_SIZE,
            SKELETON_RECORD_SIZE,
            MODEL_RECORD_SIZE,
            ANIMATION_RECORD_SIZE,
        ];

        let mut table_offsets = [0i64; 9];
        let mut position = HEADER_SIZE;
        for (i, (&count, &size)) in counts.iter().zip(record_sizes.iter()).enumerate() {
            table_offsets[i] = if count == 0 { -1 } else { position as i64 };
            position += count as usize * size;
        }
        let data_base = position;

        // The data region grows as records are written; every out-of-line
        // blob lands at data_base + its position within `data`
        let mut data: Vec<u8> = Vec::new();
        let mut records: [Vec<u8>; 9] = Default::default();

        // Strings
        for s in &tables.strings.strings {
            let offset = (data_base + data.len()) as i64;
            data.extend_from_slice(s.as_bytes());
            let out = &mut records[0];
            write_u32(out, s.len() as u32);
            write_u32(out, 0);
            write_i64(out, offset);
        }

        // Textures
        for texture in &tables.textures {
            let name_index = tables.strings.intern_optional(&texture.name)?;
            let offset = (data_base + data.len()) as u64;
            data.extend_from_slice(&texture.data);
            let out = &mut records[1];
            write_i16(out, name_index);
            out.push(texture.format as u8);
            out.push((texture.mip_count & 0x7F) | (u8::from(texture.srgb) << 7));
            write_u16(out, texture.width);
            write_u16(out, texture.height);
            write_u64(out, texture.data.len() as u64);
            write_u64(out, offset);
        }

        // Vertex buffers
        for buffer in &tables.vertex_buffers {
            if !buffer.format.is_supported() {
                return Err(FormatError::UnsupportedVertexFormat(buffer.format).into());
            }
            let mut blob = Vec::with_capacity(buffer.vertices.len() * buffer.format.stride());
            for vertex in &buffer.vertices {
                vertex.write(&mut blob, buffer.format)?;
            }
            let offset = (data_base + data.len()) as u64;
            let size = blob.len() as u64;
            data.extend_from_slice(&blob);
            let out = &mut records[2];
            out.push(buffer.format as u8);
            out.extend_from_slice(&[0; 3]);
            write_u32(out, buffer.vertices.len() as u32);
            write_u64(out, size);
            write_u64(out, offset);
        }

        // Index buffers
        for buffer in &tables.index_buffers {
            let mut blob = Vec::with_capacity(buffer.indices.len() * buffer.format.width());
            for &index in &buffer.indices {
                match buffer.format {
                    IndexFormat::UInt16 => {
                        let narrow = u16::try_from(index)
                            .map_err(|_| IntegrityError::IndexTooWide { index })?;
                        write_u16(&mut blob, narrow);
                    }
                    IndexFormat::UInt32 => write_u32(&mut blob, index),
                }
            }
            let offset = (data_base + data.len()) as u64;
            let size = blob.len() as u64;
            data.extend_from_slice(&blob);
            let out = &mut records[3];
            out.push(buffer.format as u8);
            out.extend_from_slice(&[0; 3]);
            write_u32(out, buffer.indices.len() as u32);
            write_u64(out, size);
            write_u64(out, offset);
        }

        // Materials
        for material in &tables.materials {
            let shader_index = tables.strings.intern_optional(&material.shader_name)?;

            let vector_offset = if material.vector_parameters.is_empty() {
                -1
            } else {
                let offset = (data_base + data.len()) as i64;
                for p in &material.vector_parameters {
                    let name_index = tables.strings.intern_optional(&p.name)?;
                    write_i16(&mut data, name_index);
                    write_u16(&mut data, 0);
                    for f in p.value.to_array() {
                        write_f32(&mut data, f);
                    }
                }
                offset
            };
            let texture_offset = if material.texture_parameters.is_empty() {
                -1
            } else {
                let offset = (data_base + data.len()) as i64;
                for p in &material.texture_parameters {
                    let name_index = tables.strings.intern_optional(&p.name)?;
                    let texture_id = tables.texture_ids[&(Arc::as_ptr(&p.texture) as usize)];
                    write_i16(&mut data, name_index);
                    write_u16(&mut data, texture_id);
                }
                offset
            };
            let matrix_offset = if material.matrix_parameters.is_empty() {
                -1
            } else {
                let offset = (data_base + data.len()) as i64;
                for p in &material.matrix_parameters {
                    let name_index = tables.strings.intern_optional(&p.name)?;
                    write_i16(&mut data, name_index);
                    write_u16(&mut data, 0);
                    write_mat4(&mut data, &p.value);
                }
                offset
            };

            let out = &mut records[4];
            write_u16(out, shader_index as u16);
            write_u16(out, checked_u16_len(material.vector_parameters.len(), "vector parameter")?);
            write_u16(out, checked_u16_len(material.texture_parameters.len(), "texture parameter")?);
            write_u16(out, checked_u16_len(material.matrix_parameters.len(), "matrix parameter")?);
            write_i64(out, vector_offset);
            write_i64(out, texture_offset);
            write_i64(out, matrix_offset);
        }

        // Meshes
        for mesh in &tables.meshes {
            let groups_offset = if mesh.material_groups.is_empty() {
                -1
            } else {
                let offset = (data_base + data.len()) as i64;
                for group in &mesh.material_groups {
                    let name_index = tables.strings.intern_optional(&group.name)?;
                    let material_id = tables.material_ids[&(Arc::as_ptr(&group.material) as usize)];
                    write_i16(&mut data, name_index);
                    write_u16(&mut data, material_id);
                    write_u32(&mut data, group.first_index);
                    write_u32(&mut data, group.primitive_count);
                    data.push(group.primitive_type as u8);
                    data.extend_from_slice(&[0; 3]);
                }
                offset
            };

            let out = &mut records[5];
            write_u16(
                out,
                tables.vertex_buffer_ids[&(Arc::as_ptr(&mesh.vertex_buffer) as usize)],
            );
            write_u16(
                out,
                tables.index_buffer_ids[&(Arc::as_ptr(&mesh.index_buffer) as usize)],
            );
            write_u16(out, checked_u16_len(mesh.material_groups.len(), "material group")?);
            write_u16(out, 0);
            write_i64(out, groups_offset);
        }

        // Skeletons
        for skeleton in &tables.skeletons {
            let bones_offset = if skeleton.bones.is_empty() {
                -1
            } else {
                let offset = (data_base + data.len()) as i64;
                for bone in &skeleton.bones {
                    let name_index = tables.strings.intern(&bone.name)?;
                    write_i16(&mut data, name_index);
                    write_i16(&mut data, bone.parent_id);
                    for f in bone.translation.to_array() {
                        write_f32(&mut data, f);
                    }
                    for f in bone.rotation.to_array() {
                        write_f32(&mut data, f);
                    }
                    write_mat3(&mut data, &bone.shear_scale);
                    write_mat4(&mut data, &bone.bind_to_bone);
                }
                offset
            };

            let out = &mut records[6];
            write_u16(out, checked_u16_len(skeleton.bones.len(), "bone")?);
            out.extend_from_slice(&[0; 6]);
            write_i64(out, bones_offset);
        }

        // Models
        for model in &self.models {
            let name_index = tables.strings.intern_optional(&model.name)?;
            let skeleton_index = match &model.skeleton {
                Some(skeleton) => {
                    tables.skeleton_ids[&(Arc::as_ptr(skeleton) as usize)] as i16
                }
                None => -1,
            };

            let bindings_offset = if model.mesh_bindings.is_empty() {
                -1
            } else {
                // Bone-mapping arrays land first so each binding record can
                // point at its own
                let mut bindings_blob = Vec::new();
                for binding in &model.mesh_bindings {
                    let binding_name = tables.strings.intern_optional(&binding.name)?;
                    let mappings_offset = if binding.bone_mappings.is_empty() {
                        -1
                    } else {
                        let offset = (data_base + data.len()) as i64;
                        for &mapping in &binding.bone_mappings {
                            write_u16(&mut data, mapping);
                        }
                        offset
                    };
                    write_i16(&mut bindings_blob, binding_name);
                    write_u16(
                        &mut bindings_blob,
                        tables.mesh_ids[&(Arc::as_ptr(&binding.mesh) as usize)],
                    );
                    write_u16(
                        &mut bindings_blob,
                        checked_u16_len(binding.bone_mappings.len(), "bone mapping")?,
                    );
                    write_u16(&mut bindings_blob, 0);
                    write_mat4(&mut bindings_blob, &binding.mesh_to_model);
                    write_i64(&mut bindings_blob, mappings_offset);
                }
                let offset = (data_base + data.len()) as i64;
                data.extend_from_slice(&bindings_blob);
                offset
            };

            let out = &mut records[7];
            write_i16(out, name_index);
            write_i16(out, skeleton_index);
            write_u16(out, checked_u16_len(model.mesh_bindings.len(), "mesh binding")?);
            write_u16(out, 0);
            write_mat4(out, &model.model_to_scene);
            write_i64(out, bindings_offset);
        }

        // Animations
        for animation in &self.animations {
            let name_index = tables.strings.intern_optional(&animation.name)?;

            let mut bone_ids: Vec<u16> = animation.bone_frames.keys().copied().collect();
            bone_ids.sort_unstable();

            let bones_offset = if bone_ids.is_empty() {
                -1
            } else {
                let offset = (data_base + data.len()) as i64;
                for &id in &bone_ids {
                    write_u16(&mut data, id);
                }
                offset
            };

            let transforms_offset = if bone_ids.is_empty() || animation.frame_count == 0 {
                -1
            } else {
                let offset = (data_base + data.len()) as i64;
                for &id in &bone_ids {
                    let frames = &animation.bone_frames[&id];
                    if frames.len() != animation.frame_count as usize {
                        return Err(IntegrityError::FrameCountMismatch {
                            name: animation.name.clone(),
                            expected: animation.frame_count as usize,
                            actual: frames.len(),
                        }
                        .into());
                    }
                    for frame in frames {
                        for f in frame.translation.to_array() {
                            write_f32(&mut data, f);
                        }
                        for f in frame.rotation.to_array() {
                            write_f32(&mut data, f);
                        }
                    }
                }
                offset
            };

            let out = &mut records[8];
            write_i16(out, name_index);
            write_u16(out, checked_u16_len(bone_ids.len(), "animation bone")?);
            write_u32(out, animation.frame_count);
            write_u32(out, (animation.fps * FPS_DENOMINATOR as f32).round() as u32);
            write_u32(out, FPS_DENOMINATOR);
            write_i64(out, bones_offset);
            write_i64(out, transforms_offset);
        }

        debug_assert_eq!(
            counts[0] as usize,
            tables.strings.strings.len(),
            "serialization must not discover new strings"
        );

        // Header + record tables + data region
        let mut out = Vec::with_capacity(data_base + data.len());
        out.extend_from_slice(PAPA_SIGNATURE);
        write_u32(&mut out, PAPA_VERSION);
        for count in counts {
            write_i16(&mut out, count);
        }
        for _ in 0..3 {
            write_i16(&mut out, 0);
        }
        for offset in table_offsets {
            write_i64(&mut out, offset);
        }
        for table in &records {
            out.extend_from_slice(table);
        }
        out.extend_from_slice(&data);

        Ok(out)
    }
}
