//! Merging decoded containers
//!
//! Assets frequently ship split across several containers (a model in one,
//! its diffuse/normal textures and animation clips in others). Merging folds
//! them into one [`Papa`] keyed on non-empty entity names:
//!
//! - **Textures**: last writer wins. A name match replaces the stored
//!   texture handle in place (list position preserved); anything else is
//!   appended.
//! - **Animations and models**: a name match is a fatal conflict; nothing is
//!   renamed or dropped silently.
//! - Entities with empty names are always appended, never matched.

use log::debug;

use crate::error::{MergeError, PapaError};
use crate::papa::Papa;

impl Papa {
    /// Fold a sequence of assets into one, left to right
    ///
    /// Fails on an empty sequence. A single-element sequence is returned
    /// unchanged. Later assets win texture-name collisions against earlier
    /// ones.
    pub fn merge(assets: Vec<Papa>) -> Result<Papa, PapaError> {
        let mut assets = assets.into_iter();
        let mut base = assets.next().ok_or(MergeError::EmptyInput)?;

        for asset in assets {
            base.merge_with(asset)?;
        }

        Ok(base)
    }

    /// Merge another asset into this one
    ///
    /// On a duplicate-name conflict this returns an error immediately,
    /// leaving `self` partially merged: entities absorbed before the
    /// conflict stay absorbed. Callers treating merge as all-or-nothing
    /// should discard the accumulator on error and start over.
    pub fn merge_with(&mut self, other: Papa) -> Result<(), PapaError> {
        for texture in other.textures {
            let existing = if texture.name.is_empty() {
                None
            } else {
                self.textures.iter().position(|t| t.name == texture.name)
            };
            match existing {
                Some(slot) => {
                    // Replace the stored handle rather than mutating through
                    // it; other holders of the old handle keep the old data
                    debug!("merge: overwriting texture {:?}", texture.name);
                    self.textures[slot] = texture;
                }
                None => self.textures.push(texture),
            }
        }

        for animation in other.animations {
            if !animation.name.is_empty()
                && self.animations.iter().any(|a| a.name == animation.name)
            {
                return Err(MergeError::DuplicateAnimation(animation.name).into());
            }
            self.animations.push(animation);
        }

        for model in other.models {
            if !model.name.is_empty() && self.models.iter().any(|m| m.name == model.name) {
                return Err(MergeError::DuplicateModel(model.name).into());
            }
            self.models.push(model);
        }

        Ok(())
    }
}
