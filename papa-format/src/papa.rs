//! The decoded asset root
//!
//! A [`Papa`] owns everything decoded from one container (or merged from
//! several): textures, models, and animations, with meshes, materials,
//! buffers, and skeletons reachable through the models. All cross-references
//! are shared handles; integer indices never leave the record layer.

use std::sync::Arc;

use crate::animation::Animation;
use crate::model::Model;
use crate::texture::Texture;

/// A fully-resolved asset decoded from one or more containers
///
/// Entities are immutable after decoding; the one exception is that merging
/// may replace a texture entry (the stored handle, not the pointed-to value)
/// when an incoming container carries a texture with the same name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Papa {
    pub textures: Vec<Arc<Texture>>,
    pub models: Vec<Model>,
    pub animations: Vec<Animation>,
}

impl Papa {
    /// Look up a texture by exact name; empty names never match
    pub fn texture_by_name(&self, name: &str) -> Option<&Arc<Texture>> {
        if name.is_empty() {
            return None;
        }
        self.textures.iter().find(|t| t.name == name)
    }

    /// Look up a model by exact name; empty names never match
    pub fn model_by_name(&self, name: &str) -> Option<&Model> {
        if name.is_empty() {
            return None;
        }
        self.models.iter().find(|m| m.name == name)
    }

    /// Look up an animation by exact name; empty names never match
    pub fn animation_by_name(&self, name: &str) -> Option<&Animation> {
        if name.is_empty() {
            return None;
        }
        self.animations.iter().find(|a| a.name == name)
    }
}
