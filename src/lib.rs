//! # flipbook
//!
//! Turn a video into a PDF with one sampled still frame per page.
//!
//! `flipbook` samples a video at a fixed time interval, places every sampled
//! frame on its own A4 page (uniformly scaled to fit and centered) and
//! writes the pages as a PDF. Decoding is done by FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate; PDF output
//! by [`pdf-writer`](https://crates.io/crates/pdf-writer).
//!
//! ## Quick Start
//!
//! ```no_run
//! use flipbook::{ConvertOptions, Converter};
//!
//! // One page per two minutes of video.
//! let converter = Converter::ffmpeg(ConvertOptions::new());
//! let summary = converter.convert_to_file("lecture.mp4", 2.0, "lecture.pdf")?;
//! println!("{} page(s) written", summary.pages);
//! # Ok::<(), flipbook::FlipbookError>(())
//! ```
//!
//! ## Pipeline
//!
//! 1. A [`VideoSource`] acquires a [`MediaStream`] for an identifier.
//! 2. [`FrameSampler`] decodes frames `0, n, 2n, …` where
//!    `n = max(1, floor(fps × 60 × minutes))`, skipping frames that fail to
//!    decode.
//! 3. [`PageComposer`] places each frame on a page and JPEG-encodes it.
//! 4. [`DocumentWriter`] serializes the [`Document`] to PDF.
//!
//! [`Converter`] runs steps 2 and 3 in lockstep, so memory grows with the
//! encoded size of the pages, not with the number of decoded frames.
//!
//! [`RequestHandler`] wraps the whole pipeline behind two string
//! parameters and returns either the written file or an [`ErrorPayload`].
//!
//! ## Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `rayon` | JPEG-encode page images in parallel in [`PageComposer::compose`] |
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on the system.

pub mod composer;
pub mod configuration;
mod conversion;
pub mod converter;
pub mod encoding;
pub mod error;
pub mod ffmpeg;
pub mod metadata;
pub mod pdf;
pub mod progress;
pub mod request;
pub mod sampler;
pub mod source;
pub mod stream;

pub use composer::{Document, DocumentBuilder, Page, PageComposer, PageSize, Placement};
pub use configuration::{ConvertOptions, DEFAULT_JPEG_QUALITY, FrameOutputOptions, PixelFormat};
pub use converter::{Conversion, ConversionSummary, Converter};
pub use encoding::EncodedImage;
pub use error::FlipbookError;
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use metadata::{MediaMetadata, VideoMetadata};
pub use pdf::DocumentWriter;
pub use progress::{OperationType, ProgressCallback, ProgressInfo};
pub use request::{
    ConvertRequest, ErrorKind, ErrorPayload, RequestHandler, TIME_PARAMETER, VIDEO_PARAMETER,
    output_stem, parse_interval_minutes, sanitize_filename,
};
pub use sampler::{FrameSampler, SampledFrame, SamplingInterval};
pub use source::{FfmpegSource, VideoSource};
pub use stream::{FfmpegStream, MediaStream};
