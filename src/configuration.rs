//! Conversion configuration.
//!
//! [`ConvertOptions`] threads progress reporting, frame output settings and
//! JPEG quality through the sampler, composer and writer without widening
//! every signature.
//!
//! # Example
//!
//! ```
//! use flipbook::{ConvertOptions, PixelFormat};
//!
//! let options = ConvertOptions::new()
//!     .with_pixel_format(PixelFormat::Gray8)
//!     .with_resolution(Some(1280), None)
//!     .with_jpeg_quality(75);
//! assert_eq!(options.jpeg_quality(), 75);
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use ffmpeg_next::format::Pixel;

use crate::progress::{NoOpProgress, ProgressCallback};

/// JPEG quality used when none is configured.
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Colour model of decoded frames and of the images embedded in the PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelFormat {
    /// 8-bit RGB, embedded as `DeviceRGB`. This is the default.
    #[default]
    Rgb8,
    /// 8-bit grayscale, embedded as `DeviceGray`.
    Gray8,
}

impl PixelFormat {
    pub(crate) fn to_ffmpeg_pixel(self) -> Pixel {
        match self {
            PixelFormat::Rgb8 => Pixel::RGB24,
            PixelFormat::Gray8 => Pixel::GRAY8,
        }
    }

    pub(crate) fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb8 => 3,
            PixelFormat::Gray8 => 1,
        }
    }
}

/// Size and colour model of decoded frames.
///
/// Without explicit dimensions frames keep the source resolution. Setting
/// one dimension with [`maintain_aspect_ratio`](FrameOutputOptions::maintain_aspect_ratio)
/// derives the other from the source.
#[derive(Debug, Clone)]
pub struct FrameOutputOptions {
    /// Decoded pixel format.
    pub pixel_format: PixelFormat,
    /// Target width. `None` keeps the source width.
    pub width: Option<u32>,
    /// Target height. `None` keeps the source height.
    pub height: Option<u32>,
    /// Derive the missing dimension from the source aspect ratio.
    pub maintain_aspect_ratio: bool,
}

impl Default for FrameOutputOptions {
    fn default() -> Self {
        Self {
            pixel_format: PixelFormat::Rgb8,
            width: None,
            height: None,
            maintain_aspect_ratio: true,
        }
    }
}

impl FrameOutputOptions {
    /// Resolve `(width, height)` for frames decoded from a source of the
    /// given size. Never returns a zero dimension for a non-empty source.
    pub fn resolve_dimensions(&self, source_width: u32, source_height: u32) -> (u32, u32) {
        let scaled = |target: u32, from: u32, other: u32| -> u32 {
            let ratio = target as f64 / from as f64;
            ((other as f64 * ratio).round() as u32).max(1)
        };

        match (self.width, self.height) {
            (Some(width), Some(height)) => (width, height),
            (Some(width), None) if self.maintain_aspect_ratio && source_width > 0 => {
                (width, scaled(width, source_width, source_height))
            }
            (None, Some(height)) if self.maintain_aspect_ratio && source_height > 0 => {
                (scaled(height, source_height, source_width), height)
            }
            (Some(width), None) => (width, source_height),
            (None, Some(height)) => (source_width, height),
            (None, None) => (source_width, source_height),
        }
    }
}

/// Settings shared by every stage of a conversion.
///
/// A default-constructed value reports nothing, decodes RGB frames at source
/// resolution and embeds them at JPEG quality [`DEFAULT_JPEG_QUALITY`].
#[derive(Clone)]
pub struct ConvertOptions {
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) batch_size: u64,
    pub(crate) frame_output: FrameOutputOptions,
    pub(crate) jpeg_quality: u8,
}

impl Debug for ConvertOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ConvertOptions")
            .field("batch_size", &self.batch_size)
            .field("frame_output", &self.frame_output)
            .field("jpeg_quality", &self.jpeg_quality)
            .finish_non_exhaustive()
    }
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ConvertOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self {
            progress: Arc::new(NoOpProgress),
            batch_size: 1,
            frame_output: FrameOutputOptions::default(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Report progress every `size` items. Clamped to a minimum of 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Set the pixel format of decoded frames.
    #[must_use]
    pub fn with_pixel_format(mut self, format: PixelFormat) -> Self {
        self.frame_output.pixel_format = format;
        self
    }

    /// Decode frames at a custom resolution.
    ///
    /// Useful to keep the PDF small for high-resolution sources; page
    /// placement is unaffected because it depends only on aspect ratio.
    #[must_use]
    pub fn with_resolution(mut self, width: Option<u32>, height: Option<u32>) -> Self {
        self.frame_output.width = width;
        self.frame_output.height = height;
        self
    }

    /// Control whether a single configured dimension preserves aspect ratio.
    #[must_use]
    pub fn with_maintain_aspect_ratio(mut self, maintain: bool) -> Self {
        self.frame_output.maintain_aspect_ratio = maintain;
        self
    }

    /// Replace the whole frame output configuration.
    #[must_use]
    pub fn with_frame_output(mut self, frame_output: FrameOutputOptions) -> Self {
        self.frame_output = frame_output;
        self
    }

    /// Set the JPEG quality of embedded images, clamped to `1..=100`.
    #[must_use]
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    /// The configured JPEG quality.
    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }

    /// The configured batch size.
    pub fn batch_size(&self) -> u64 {
        self.batch_size
    }

    /// The configured frame output settings.
    pub fn frame_output(&self) -> &FrameOutputOptions {
        &self.frame_output
    }
}
