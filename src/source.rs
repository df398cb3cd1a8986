//! Video acquisition.
//!
//! A [`VideoSource`] turns an identifier into a [`MediaStream`]. Transport
//! failures surface as [`FlipbookError::Acquisition`]; a reachable input
//! without a decodable video stream surfaces as
//! [`FlipbookError::NoVideoStream`]. No retries are attempted here.

use crate::{
    configuration::FrameOutputOptions, error::FlipbookError, metadata::MediaMetadata,
    stream::{FfmpegStream, MediaStream},
};

/// Resolves identifiers to decodable streams.
pub trait VideoSource {
    /// The stream type handed to the sampler.
    type Stream: MediaStream;

    /// Acquire a fresh stream for `identifier`.
    fn acquire(&self, identifier: &str) -> Result<Self::Stream, FlipbookError>;
}

/// Opens local paths and URLs with FFmpeg.
///
/// Any protocol compiled into the linked FFmpeg (`file`, `http`, `https`,
/// ...) is accepted. Page URLs of video hosting sites are not resolved;
/// pass a direct media URL.
///
/// # Example
///
/// ```no_run
/// use flipbook::{FfmpegSource, FrameOutputOptions, MediaStream, VideoSource};
///
/// let source = FfmpegSource::new(FrameOutputOptions::default());
/// let stream = source.acquire("https://example.com/talk.mp4")?;
/// println!("{:?} frames", stream.frame_count());
/// # Ok::<(), flipbook::FlipbookError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct FfmpegSource {
    frame_output: FrameOutputOptions,
}

impl FfmpegSource {
    /// Create a source decoding frames with the given output settings.
    pub fn new(frame_output: FrameOutputOptions) -> Self {
        Self { frame_output }
    }

    /// Open `identifier` only to read its metadata.
    pub fn probe(&self, identifier: &str) -> Result<MediaMetadata, FlipbookError> {
        let stream = self.acquire(identifier)?;
        Ok(stream.metadata().clone())
    }
}

impl VideoSource for FfmpegSource {
    type Stream = FfmpegStream;

    fn acquire(&self, identifier: &str) -> Result<FfmpegStream, FlipbookError> {
        FfmpegStream::open(identifier, &self.frame_output)
    }
}

impl<T: VideoSource + ?Sized> VideoSource for &T {
    type Stream = T::Stream;

    fn acquire(&self, identifier: &str) -> Result<Self::Stream, FlipbookError> {
        (**self).acquire(identifier)
    }
}
