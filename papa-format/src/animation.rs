//! Animation records and resolved animations
//!
//! # Record layout
//! ```text
//! 0x00: name_index i16
//! 0x02: bone_count u16
//! 0x04: frame_count i32
//! 0x08: fps_numerator u32
//! 0x0C: fps_denominator u32
//! 0x10: bone_table_offset i64      u16 skeleton-bone ids
//! 0x18: transforms_offset i64      bone_count x frame_count transforms
//! ```
//!
//! Transform layout (28 bytes): translation f32 x3, rotation f32 x4.
//! Transforms are grouped by bone list position: the frames for the bone at
//! position `p` occupy `p*frame_count .. (p+1)*frame_count`.

use std::io::Cursor;

use glam::{Quat, Vec3};
use hashbrown::HashMap;

use crate::error::{IntegrityError, PapaError};
use crate::primitives::{read_at, read_i16, read_i32, read_i64, read_quat, read_u16, read_u32, read_vec3};
use crate::strings::name_from_index;

/// One keyframe of one bone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationFrame {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl AnimationFrame {
    pub(crate) fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self, PapaError> {
        Ok(Self {
            translation: read_vec3(cursor)?,
            rotation: read_quat(cursor)?,
        })
    }
}

/// Raw animation-table record, prior to name resolution and frame grouping
#[derive(Debug, Clone)]
pub(crate) struct AnimationRecord {
    pub name_index: i16,
    pub bone_ids: Vec<u16>,
    pub frame_count: u32,
    pub fps_numerator: u32,
    pub fps_denominator: u32,
    pub transforms: Vec<AnimationFrame>,
}

impl AnimationRecord {
    pub(crate) fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self, PapaError> {
        let name_index = read_i16(cursor)?;
        let bone_count = read_u16(cursor)?;
        let raw_frame_count = read_i32(cursor)?;
        let frame_count = u32::try_from(raw_frame_count)
            .map_err(|_| IntegrityError::NegativeFrameCount(raw_frame_count))?;
        let fps_numerator = read_u32(cursor)?;
        let fps_denominator = read_u32(cursor)?;
        let bone_table_offset = read_i64(cursor)?;
        let transforms_offset = read_i64(cursor)?;

        let mut bone_ids = Vec::with_capacity(bone_count as usize);
        if bone_table_offset > 0 {
            bone_ids = read_at(cursor, bone_table_offset as u64, |c| {
                let mut ids = Vec::with_capacity(bone_count as usize);
                for _ in 0..bone_count {
                    ids.push(read_u16(c)?);
                }
                Ok(ids)
            })?;
        }

        let transform_count = bone_count as usize * frame_count as usize;
        let mut transforms = Vec::with_capacity(transform_count);
        if transforms_offset > 0 {
            transforms = read_at(cursor, transforms_offset as u64, |c| {
                let mut transforms = Vec::with_capacity(transform_count);
                for _ in 0..transform_count {
                    transforms.push(AnimationFrame::parse(c)?);
                }
                Ok(transforms)
            })?;
        }

        Ok(Self {
            name_index,
            bone_ids,
            frame_count,
            fps_numerator,
            fps_denominator,
            transforms,
        })
    }
}

/// A resolved animation clip
///
/// `bone_frames` maps skeleton bone ids to that bone's keyframe sequence;
/// every sequence is exactly `frame_count` long.
#[derive(Debug, Clone, PartialEq)]
pub struct Animation {
    pub name: String,
    /// Frames per second, derived from the stored numerator/denominator pair
    /// with floating-point division
    pub fps: f32,
    pub frame_count: u32,
    pub bone_frames: HashMap<u16, Vec<AnimationFrame>>,
}

impl Animation {
    pub(crate) fn from_record(
        record: AnimationRecord,
        strings: &[String],
    ) -> Result<Self, PapaError> {
        let name = name_from_index(strings, record.name_index as i64);

        if record.fps_denominator == 0 {
            return Err(IntegrityError::ZeroFrameRateDenominator { name }.into());
        }
        let fps = record.fps_numerator as f32 / record.fps_denominator as f32;

        let expected = record.bone_ids.len() * record.frame_count as usize;
        if record.transforms.len() != expected {
            return Err(IntegrityError::FrameCountMismatch {
                name,
                expected,
                actual: record.transforms.len(),
            }
            .into());
        }

        let mut bone_frames = HashMap::with_capacity(record.bone_ids.len());
        for (position, &bone_id) in record.bone_ids.iter().enumerate() {
            let start = position * record.frame_count as usize;
            let frames = record.transforms[start..start + record.frame_count as usize].to_vec();
            if bone_frames.insert(bone_id, frames).is_some() {
                return Err(IntegrityError::DuplicateAnimationBone { name, bone: bone_id }.into());
            }
        }

        Ok(Self {
            name,
            fps,
            frame_count: record.frame_count,
            bone_frames,
        })
    }
}
