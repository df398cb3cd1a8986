//! Media metadata types.
//!
//! Metadata is read once when an [`FfmpegStream`](crate::FfmpegStream) is
//! opened and cached for the lifetime of the stream.

use std::time::Duration;

/// Container-level metadata for an opened source.
#[derive(Debug, Clone)]
#[must_use]
pub struct MediaMetadata {
    /// Metadata of the video stream selected for sampling.
    pub video: VideoMetadata,
    /// Total duration, or [`Duration::ZERO`] when the container does not
    /// report one.
    pub duration: Duration,
    /// Container format name (e.g. `"mov,mp4,m4a,3gp,3g2,mj2"`, `"matroska,webm"`).
    pub format: String,
}

/// Metadata for the sampled video stream.
#[derive(Debug, Clone)]
#[must_use]
pub struct VideoMetadata {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Average frames per second, `None` when the stream reports no rate.
    pub frames_per_second: Option<f64>,
    /// Total number of frames, `None` when neither the stream nor the
    /// container duration allow computing it.
    pub frame_count: Option<u64>,
    /// Codec name (e.g. `"h264"`, `"vp9"`).
    pub codec: String,
    /// Index of the stream inside the container.
    pub stream_index: usize,
}
