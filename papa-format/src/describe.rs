//! Texture payload description for the external image codec
//!
//! The crate never decompresses pixels. For each texture it computes a
//! [`PayloadDescriptor`] (pitch, bits per pixel, and either a compression
//! FourCC or per-channel bit masks) and hands that plus the raw payload
//! bytes to whatever codec the caller plugs in.

use crate::error::{FormatError, PapaError};
use crate::texture::{Texture, TextureFormat};

/// How the payload's pixels are laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelLayout {
    /// Block-compressed data identified by a four-character tag
    BlockCompressed { fourcc: [u8; 4], block_size: u32 },
    /// Linear data described by per-channel bit masks
    Uncompressed {
        red_mask: u32,
        green_mask: u32,
        blue_mask: u32,
        alpha_mask: u32,
    },
}

/// Everything the external image codec needs to interpret a texture payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadDescriptor {
    pub width: u32,
    pub height: u32,
    pub mip_count: u32,
    pub srgb: bool,
    /// Bytes per row of pixels, or per row of blocks for compressed formats
    pub pitch: u32,
    pub bits_per_pixel: u32,
    pub layout: PixelLayout,
}

fn bits_per_pixel(format: TextureFormat) -> Option<u32> {
    match format {
        TextureFormat::R8G8B8A8 | TextureFormat::R8G8B8X8 | TextureFormat::B8G8R8A8 => Some(32),
        TextureFormat::Dxt1 => Some(4),
        TextureFormat::Dxt5 => Some(8),
        TextureFormat::R8 => Some(8),
        _ => None,
    }
}

fn layout(format: TextureFormat) -> Option<PixelLayout> {
    match format {
        TextureFormat::Dxt1 => Some(PixelLayout::BlockCompressed {
            fourcc: *b"DXT1",
            block_size: 8,
        }),
        TextureFormat::Dxt5 => Some(PixelLayout::BlockCompressed {
            fourcc: *b"DXT5",
            block_size: 16,
        }),
        TextureFormat::R8G8B8A8 => Some(PixelLayout::Uncompressed {
            red_mask: 0xFF00_0000,
            green_mask: 0x00FF_0000,
            blue_mask: 0x0000_FF00,
            alpha_mask: 0x0000_00FF,
        }),
        TextureFormat::R8G8B8X8 => Some(PixelLayout::Uncompressed {
            red_mask: 0xFF00_0000,
            green_mask: 0x00FF_0000,
            blue_mask: 0x0000_FF00,
            alpha_mask: 0,
        }),
        TextureFormat::B8G8R8A8 => Some(PixelLayout::Uncompressed {
            red_mask: 0x0000_FF00,
            green_mask: 0x00FF_0000,
            blue_mask: 0xFF00_0000,
            alpha_mask: 0x0000_00FF,
        }),
        TextureFormat::R8 => Some(PixelLayout::Uncompressed {
            red_mask: 0xFF,
            green_mask: 0,
            blue_mask: 0,
            alpha_mask: 0,
        }),
        _ => None,
    }
}

impl Texture {
    /// Compute the payload descriptor for this texture's format
    ///
    /// Fails with an "unsupported texture format" error for every format the
    /// describer has no header recipe for.
    pub fn describe(&self) -> Result<PayloadDescriptor, PapaError> {
        let unsupported = || FormatError::UnsupportedTextureFormat(self.format);
        let bpp = bits_per_pixel(self.format).ok_or_else(unsupported)?;
        let layout = layout(self.format).ok_or_else(unsupported)?;

        let width = self.width as u32;
        let pitch = match layout {
            // One row of 4x4 blocks; width rounds up to whole blocks
            PixelLayout::BlockCompressed { block_size, .. } => {
                ((width + 3) / 4).max(1) * block_size
            }
            PixelLayout::Uncompressed { .. } => (width * bpp + 7) / 8,
        };

        Ok(PayloadDescriptor {
            width,
            height: self.height as u32,
            mip_count: self.mip_count as u32,
            srgb: self.srgb,
            pitch,
            bits_per_pixel: bpp,
            layout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texture(format: TextureFormat, width: u16, height: u16) -> Texture {
        Texture {
            name: String::new(),
            format,
            width,
            height,
            mip_count: 1,
            srgb: false,
            data: Vec::new(),
        }
    }

    #[test]
    fn test_describe_dxt1() {
        let desc = texture(TextureFormat::Dxt1, 256, 128).describe().unwrap();
        assert_eq!(desc.bits_per_pixel, 4);
        assert_eq!(desc.pitch, 64 * 8);
        assert_eq!(
            desc.layout,
            PixelLayout::BlockCompressed {
                fourcc: *b"DXT1",
                block_size: 8
            }
        );
    }

    #[test]
    fn test_describe_dxt5_rounds_width_up_to_blocks() {
        let desc = texture(TextureFormat::Dxt5, 10, 10).describe().unwrap();
        // 10 pixels -> 3 blocks of 16 bytes
        assert_eq!(desc.pitch, 48);
    }

    #[test]
    fn test_describe_block_pitch_has_floor_of_one_block() {
        let desc = texture(TextureFormat::Dxt1, 1, 1).describe().unwrap();
        assert_eq!(desc.pitch, 8);
    }

    #[test]
    fn test_describe_rgba8() {
        let desc = texture(TextureFormat::R8G8B8A8, 100, 50).describe().unwrap();
        assert_eq!(desc.bits_per_pixel, 32);
        assert_eq!(desc.pitch, 400);
        assert_eq!(
            desc.layout,
            PixelLayout::Uncompressed {
                red_mask: 0xFF00_0000,
                green_mask: 0x00FF_0000,
                blue_mask: 0x0000_FF00,
                alpha_mask: 0x0000_00FF,
            }
        );
    }

    #[test]
    fn test_describe_bgra8_swaps_masks() {
        let desc = texture(TextureFormat::B8G8R8A8, 4, 4).describe().unwrap();
        match desc.layout {
            PixelLayout::Uncompressed {
                red_mask,
                blue_mask,
                ..
            } => {
                assert_eq!(red_mask, 0x0000_FF00);
                assert_eq!(blue_mask, 0xFF00_0000);
            }
            _ => panic!("expected mask layout"),
        }
    }

    #[test]
    fn test_describe_r8() {
        let desc = texture(TextureFormat::R8, 33, 7).describe().unwrap();
        assert_eq!(desc.bits_per_pixel, 8);
        assert_eq!(desc.pitch, 33);
    }

    #[test]
    fn test_describe_unsupported_names_the_format() {
        for format in [
            TextureFormat::Invalid,
            TextureFormat::Dxt3,
            TextureFormat::Rgba16F,
            TextureFormat::Shadow32,
        ] {
            let err = texture(format, 4, 4).describe().unwrap_err();
            assert_eq!(
                err,
                PapaError::Format(FormatError::UnsupportedTextureFormat(format))
            );
        }
    }
}
