//! Page image encoding.
//!
//! Frames are JPEG-encoded as soon as they are placed, so a [`Document`]
//! holds compressed bytes rather than decoded rasters. A 1080p RGB frame is
//! about 6 MB raw and typically well under 1 MB as JPEG.
//!
//! [`Document`]: crate::Document

use image::{DynamicImage, codecs::jpeg::JpegEncoder};

use crate::{configuration::PixelFormat, error::FlipbookError};

/// A baseline JPEG image ready to embed as a `DCTDecode` stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    data: Vec<u8>,
    width: u32,
    height: u32,
    pixel_format: PixelFormat,
}

impl EncodedImage {
    /// Encode `image` in `pixel_format` at JPEG `quality` (clamped to
    /// `1..=100`).
    ///
    /// # Errors
    ///
    /// [`FlipbookError::ImageError`] if the encoder rejects the image, for
    /// example because a dimension exceeds 65535 pixels.
    ///
    /// ```
    /// use flipbook::{EncodedImage, PixelFormat};
    /// use image::{DynamicImage, RgbImage};
    ///
    /// let frame = DynamicImage::ImageRgb8(RgbImage::new(64, 36));
    /// let encoded = EncodedImage::encode(&frame, PixelFormat::Rgb8, 90)?;
    /// assert_eq!((encoded.width(), encoded.height()), (64, 36));
    /// assert!(encoded.data().starts_with(&[0xFF, 0xD8]));
    /// # Ok::<(), flipbook::FlipbookError>(())
    /// ```
    pub fn encode(
        image: &DynamicImage,
        pixel_format: PixelFormat,
        quality: u8,
    ) -> Result<Self, FlipbookError> {
        let mut data = Vec::new();
        {
            let mut encoder = JpegEncoder::new_with_quality(&mut data, quality.clamp(1, 100));
            match pixel_format {
                PixelFormat::Rgb8 => encoder.encode_image(&image.to_rgb8())?,
                PixelFormat::Gray8 => encoder.encode_image(&image.to_luma8())?,
            }
        }

        Ok(Self {
            data,
            width: image.width(),
            height: image.height(),
            pixel_format,
        })
    }

    /// The JPEG bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Colour model the image was encoded in.
    pub fn pixel_format(&self) -> PixelFormat {
        self.pixel_format
    }
}
