//! Texture images and the slot that swaps them in when a load finishes

use crate::error::{HingevizError, Result};

/// Side length of the procedural wood fallback
pub const WOOD_SIZE: u32 = 256;

/// How a backend should sample an image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureSampling {
    /// Generate mipmaps
    Mipmapped,
    /// Clamp to edge with linear filtering
    ClampLinear,
}

/// Tightly packed RGBA8 image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl TextureImage {
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || pixels.len() != expected {
            return Err(HingevizError::TextureLoad(format!(
                "{width}x{height} image needs {expected} bytes, got {}",
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Single brown pixel shown until the real image arrives
    pub fn placeholder() -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: vec![139, 90, 43, 255],
        }
    }

    /// Vertical wood grain: `R = 139 + 20 sin(0.1 column)`, `G = 0.6 R`,
    /// `B = 0.3 R`
    pub fn wood(size: u32) -> Self {
        let mut pixels = Vec::with_capacity(size as usize * size as usize * 4);
        for _row in 0..size {
            for column in 0..size {
                let r = 139.0 + 20.0 * (column as f32 * 0.1).sin();
                pixels.extend_from_slice(&[r as u8, (r * 0.6) as u8, (r * 0.3) as u8, 255]);
            }
        }
        Self {
            width: size,
            height: size,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn is_power_of_two(&self) -> bool {
        self.width.is_power_of_two() && self.height.is_power_of_two()
    }

    pub fn sampling(&self) -> TextureSampling {
        if self.is_power_of_two() {
            TextureSampling::Mipmapped
        } else {
            TextureSampling::ClampLinear
        }
    }
}

/// Current texture plus a flag telling the frame loop to upload it
#[derive(Debug, Clone, PartialEq)]
pub struct TextureSlot {
    image: TextureImage,
    pending: bool,
}

impl TextureSlot {
    pub fn new() -> Self {
        Self {
            image: TextureImage::placeholder(),
            pending: true,
        }
    }

    pub fn image(&self) -> &TextureImage {
        &self.image
    }

    /// Take the outcome of an asynchronous load. Failures are replaced by the
    /// wood pattern and never propagate.
    pub fn complete(&mut self, result: Result<TextureImage>) {
        self.image = match result {
            Ok(image) => {
                log::debug!("texture loaded ({}x{})", image.width, image.height);
                image
            }
            Err(err) => {
                log::warn!("{err}; using wood pattern");
                TextureImage::wood(WOOD_SIZE)
            }
        };
        self.pending = true;
    }

    /// The image if it changed since the last call
    pub fn take_update(&mut self) -> Option<&TextureImage> {
        if std::mem::take(&mut self.pending) {
            Some(&self.image)
        } else {
            None
        }
    }
}

impl Default for TextureSlot {
    fn default() -> Self {
        Self::new()
    }
}
