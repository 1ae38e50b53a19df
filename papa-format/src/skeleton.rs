//! Skeleton records, bones, and resolved skeletons
//!
//! # Record layout
//! ```text
//! 0x00: bone_count u16
//! 0x02: padding u16 x3
//! 0x08: bones_offset i64
//! ```
//!
//! Bone layout (132 bytes):
//! ```text
//! 0x00: name_index i16       negative is fatal; bones must be named
//! 0x02: parent_index i16     -1 = root, otherwise an earlier-or-equal id
//! 0x04: translation f32 x3
//! 0x10: rotation f32 x4      quaternion x,y,z,w
//! 0x20: shear_scale f32 x9   3x3 block, expanded to a 4x4
//! 0x44: bind_to_bone f32 x16
//! ```
//!
//! Bone ids are implicit: a bone's id is its position in the bone array.

use std::io::Cursor;

use glam::{Mat4, Quat, Vec3};

use crate::error::{IntegrityError, PapaError};
use crate::primitives::{read_at, read_i16, read_i64, read_mat3, read_mat4, read_quat, read_u16, read_vec3};

#[derive(Debug, Clone)]
pub(crate) struct BoneRecord {
    pub id: u16,
    pub name_index: i16,
    pub parent_index: i16,
    pub translation: Vec3,
    pub rotation: Quat,
    pub shear_scale: Mat4,
    pub bind_to_bone: Mat4,
}

impl BoneRecord {
    pub(crate) fn parse(id: u16, cursor: &mut Cursor<&[u8]>) -> Result<Self, PapaError> {
        let name_index = read_i16(cursor)?;
        let parent_index = read_i16(cursor)?;
        let translation = read_vec3(cursor)?;
        let rotation = read_quat(cursor)?;
        let shear_scale = read_mat3(cursor)?;
        let bind_to_bone = read_mat4(cursor)?;

        if name_index < 0 {
            return Err(IntegrityError::UnnamedBone { bone: id }.into());
        }

        Ok(Self {
            id,
            name_index,
            parent_index,
            translation,
            rotation,
            shear_scale,
            bind_to_bone,
        })
    }
}

/// Raw skeleton-table record
#[derive(Debug, Clone)]
pub(crate) struct SkeletonRecord {
    pub bones: Vec<BoneRecord>,
}

impl SkeletonRecord {
    pub(crate) fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self, PapaError> {
        let bone_count = read_u16(cursor)?;
        for _ in 0..3 {
            read_u16(cursor)?;
        }
        let bones_offset = read_i64(cursor)?;

        let mut bones = Vec::with_capacity(bone_count as usize);
        if bones_offset > 0 {
            bones = read_at(cursor, bones_offset as u64, |c| {
                let mut bones = Vec::with_capacity(bone_count as usize);
                for id in 0..bone_count {
                    bones.push(BoneRecord::parse(id, c)?);
                }
                Ok(bones)
            })?;
        }

        Ok(Self { bones })
    }
}

/// One bone of a skeleton
#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    /// Position in the owning skeleton's bone list
    pub id: u16,
    pub name: String,
    /// -1 for the root; otherwise the id of an earlier-or-equal bone
    pub parent_id: i16,
    pub translation: Vec3,
    pub rotation: Quat,
    /// 3x3 shear/scale block carried as a 4x4 with identity border
    pub shear_scale: Mat4,
    pub bind_to_bone: Mat4,
}

impl Bone {
    /// Parent bone id, or `None` for the root
    pub fn parent(&self) -> Option<u16> {
        (self.parent_id >= 0).then_some(self.parent_id as u16)
    }
}

/// A resolved skeleton; bone order defines the implicit ids `0..N-1`
#[derive(Debug, Clone, PartialEq)]
pub struct Skeleton {
    pub bones: Vec<Bone>,
}

impl Skeleton {
    pub(crate) fn from_record(
        record: SkeletonRecord,
        strings: &[String],
    ) -> Result<Self, PapaError> {
        let mut bones = Vec::with_capacity(record.bones.len());
        for bone in record.bones {
            // Bone names are required; the record parser already rejected
            // negative indices, so only range remains to check
            let name = strings
                .get(bone.name_index as usize)
                .cloned()
                .ok_or(IntegrityError::BoneNameOutOfRange {
                    bone: bone.id,
                    index: bone.name_index,
                    len: strings.len(),
                })?;

            if bone.parent_index < -1 {
                return Err(IntegrityError::InvalidBoneParent {
                    bone: bone.id,
                    parent: bone.parent_index,
                }
                .into());
            }
            // The container is written incrementally, so a parent must
            // already exist when its child appears
            if bone.parent_index > bone.id as i16 {
                return Err(IntegrityError::ForwardBoneParent {
                    bone: bone.id,
                    parent: bone.parent_index,
                }
                .into());
            }

            bones.push(Bone {
                id: bone.id,
                name,
                parent_id: bone.parent_index,
                translation: bone.translation,
                rotation: bone.rotation,
                shear_scale: bone.shear_scale,
                bind_to_bone: bone.bind_to_bone,
            });
        }

        Ok(Self { bones })
    }
}
