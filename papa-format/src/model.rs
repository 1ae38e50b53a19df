//! Model records, mesh bindings, and resolved models
//!
//! # Record layout
//! ```text
//! 0x00: name_index i16
//! 0x02: skeleton_index i16       negative = no skeleton
//! 0x04: mesh_binding_count u16
//! 0x06: padding u16
//! 0x08: model_to_scene f32 x16
//! 0x48: mesh_bindings_offset i64
//! ```
//!
//! Mesh binding layout (80 bytes):
//! ```text
//! 0x00: name_index i16
//! 0x02: mesh_index u16
//! 0x04: bone_mapping_count u16
//! 0x06: padding u16
//! 0x08: mesh_to_model f32 x16
//! 0x48: bone_mappings_offset i64
//! ```
//!
//! Bone mappings are u16 entries translating a vertex's local bone index
//! into a skeleton bone id; skinned vertices carry local indices only.

use std::io::Cursor;
use std::sync::Arc;

use glam::Mat4;

use crate::error::{IntegrityError, PapaError};
use crate::mesh::Mesh;
use crate::primitives::{read_at, read_i16, read_i64, read_mat4, read_u16};
use crate::skeleton::Skeleton;
use crate::strings::name_from_index;

#[derive(Debug, Clone)]
pub(crate) struct MeshBindingRecord {
    pub name_index: i16,
    pub mesh_index: u16,
    pub mesh_to_model: Mat4,
    pub bone_mappings: Vec<u16>,
}

impl MeshBindingRecord {
    pub(crate) fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self, PapaError> {
        let name_index = read_i16(cursor)?;
        let mesh_index = read_u16(cursor)?;
        let mapping_count = read_u16(cursor)?;
        let _padding = read_u16(cursor)?;
        let mesh_to_model = read_mat4(cursor)?;
        let mappings_offset = read_i64(cursor)?;

        let mut bone_mappings = Vec::with_capacity(mapping_count as usize);
        if mappings_offset > 0 {
            bone_mappings = read_at(cursor, mappings_offset as u64, |c| {
                let mut mappings = Vec::with_capacity(mapping_count as usize);
                for _ in 0..mapping_count {
                    mappings.push(read_u16(c)?);
                }
                Ok(mappings)
            })?;
        }

        Ok(Self {
            name_index,
            mesh_index,
            mesh_to_model,
            bone_mappings,
        })
    }
}

/// Raw model-table record, prior to reference resolution
#[derive(Debug, Clone)]
pub(crate) struct ModelRecord {
    pub name_index: i16,
    pub skeleton_index: i16,
    pub model_to_scene: Mat4,
    pub mesh_bindings: Vec<MeshBindingRecord>,
}

impl ModelRecord {
    pub(crate) fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self, PapaError> {
        let name_index = read_i16(cursor)?;
        let skeleton_index = read_i16(cursor)?;
        let binding_count = read_u16(cursor)?;
        let _padding = read_u16(cursor)?;
        let model_to_scene = read_mat4(cursor)?;
        let bindings_offset = read_i64(cursor)?;

        let mut mesh_bindings = Vec::with_capacity(binding_count as usize);
        if bindings_offset > 0 {
            mesh_bindings = read_at(cursor, bindings_offset as u64, |c| {
                let mut bindings = Vec::with_capacity(binding_count as usize);
                for _ in 0..binding_count {
                    bindings.push(MeshBindingRecord::parse(c)?);
                }
                Ok(bindings)
            })?;
        }

        Ok(Self {
            name_index,
            skeleton_index,
            model_to_scene,
            mesh_bindings,
        })
    }
}

/// The association of a mesh to a model, carrying the mesh-to-model
/// transform and the local-bone-index to skeleton-bone-id mapping
#[derive(Debug, Clone, PartialEq)]
pub struct MeshBinding {
    pub name: String,
    pub mesh: Arc<Mesh>,
    pub mesh_to_model: Mat4,
    /// Entry `i` is the skeleton bone id for local vertex bone index `i`
    pub bone_mappings: Vec<u16>,
}

/// A resolved model
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub name: String,
    pub skeleton: Option<Arc<Skeleton>>,
    pub mesh_bindings: Vec<MeshBinding>,
    pub model_to_scene: Mat4,
}

impl Model {
    pub(crate) fn from_record(
        record: ModelRecord,
        strings: &[String],
        skeletons: &[Arc<Skeleton>],
        meshes: &[Arc<Mesh>],
    ) -> Result<Self, PapaError> {
        let skeleton = if record.skeleton_index < 0 {
            None
        } else {
            let skeleton = skeletons
                .get(record.skeleton_index as usize)
                .cloned()
                .ok_or(IntegrityError::SkeletonIndexOutOfRange {
                    index: record.skeleton_index,
                    len: skeletons.len(),
                })?;
            Some(skeleton)
        };

        let mut mesh_bindings = Vec::with_capacity(record.mesh_bindings.len());
        for binding in record.mesh_bindings {
            let mesh = meshes
                .get(binding.mesh_index as usize)
                .cloned()
                .ok_or(IntegrityError::MeshIndexOutOfRange {
                    index: binding.mesh_index,
                    len: meshes.len(),
                })?;
            mesh_bindings.push(MeshBinding {
                name: name_from_index(strings, binding.name_index as i64),
                mesh,
                mesh_to_model: binding.mesh_to_model,
                bone_mappings: binding.bone_mappings,
            });
        }

        Ok(Self {
            name: name_from_index(strings, record.name_index as i64),
            skeleton,
            mesh_bindings,
            model_to_scene: record.model_to_scene,
        })
    }
}
