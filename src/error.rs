//! Error types for the `flipbook` crate.
//!
//! This module defines [`FlipbookError`], the unified error type returned by
//! every fallible operation in the crate. Variants are grouped by the stage
//! that raises them: acquiring a source, reading stream metadata, decoding a
//! single frame, writing the document, and the request boundary.

use std::io::Error as IoError;

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `flipbook` operations.
///
/// Per-frame problems ([`VideoDecodeError`](FlipbookError::VideoDecodeError))
/// are normally swallowed by the sampler and only surface when a caller
/// decodes a frame directly through a [`MediaStream`](crate::MediaStream).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FlipbookError {
    /// The video source could not be reached or opened.
    #[error("Failed to acquire video from {identifier}: {reason}")]
    Acquisition {
        /// Identifier (path or URL) that was passed to the source.
        identifier: String,
        /// Underlying reason the acquisition failed.
        reason: String,
    },

    /// The source was reachable but carries no decodable video stream.
    #[error("No video stream found in source")]
    NoVideoStream,

    /// Frame rate or frame count could not be determined.
    #[error("Media stream is unreadable: {0}")]
    MediaUnreadable(String),

    /// A single video frame could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// The pipeline produced a document without pages and the caller
    /// asked for that to be treated as a failure.
    #[error("No frames could be sampled from the video")]
    EmptyDocument,

    /// A required request parameter was absent or blank.
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while writing the document.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while converting or encoding a frame.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),
}

impl FlipbookError {
    /// Returns `true` for errors raised while acquiring the source video.
    ///
    /// These abort the pipeline before any frame is sampled.
    pub fn is_acquisition(&self) -> bool {
        matches!(
            self,
            FlipbookError::Acquisition { .. } | FlipbookError::NoVideoStream
        )
    }
}

impl From<FfmpegError> for FlipbookError {
    fn from(error: FfmpegError) -> Self {
        FlipbookError::FfmpegError(error.to_string())
    }
}
