//! Frame sampling.
//!
//! [`FrameSampler`] walks a [`MediaStream`] at a fixed [`SamplingInterval`]
//! and decodes one still per candidate index. Decode failures are skipped,
//! so a corrupt frame costs one page instead of the whole conversion.
//!
//! # Example
//!
//! ```no_run
//! use flipbook::{ConvertOptions, FfmpegStream, FrameSampler};
//!
//! let options = ConvertOptions::new();
//! let stream = FfmpegStream::open("talk.mp4", options.frame_output())?;
//! let frames = FrameSampler::new(&options).sample(stream, 2.0)?;
//! for frame in &frames {
//!     println!("frame {} is {}x{}", frame.frame_number, frame.image.width(), frame.image.height());
//! }
//! # Ok::<(), flipbook::FlipbookError>(())
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::iter;

use image::DynamicImage;

use crate::{
    configuration::ConvertOptions,
    error::FlipbookError,
    progress::{OperationType, ProgressTracker},
    stream::MediaStream,
};

/// Number of source frames between two consecutive samples. Always ≥ 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SamplingInterval(u64);

impl SamplingInterval {
    /// Sample every frame.
    pub const EVERY_FRAME: SamplingInterval = SamplingInterval(1);

    /// Compute `max(1, floor(frames_per_second × 60 × minutes))`.
    ///
    /// Zero, negative and NaN products give [`EVERY_FRAME`](Self::EVERY_FRAME)
    /// so sampling always makes progress. Products beyond `u64::MAX`
    /// saturate.
    pub fn from_minutes(frames_per_second: f64, minutes: f64) -> Self {
        let frames = (frames_per_second * 60.0 * minutes).floor();
        // `as` saturates for out-of-range floats and maps NaN to 0.
        Self((frames as u64).max(1))
    }

    /// Wrap an explicit frame step, coercing 0 to 1.
    pub fn from_frames(frames: u64) -> Self {
        Self(frames.max(1))
    }

    /// The step in frames.
    pub fn frames(self) -> u64 {
        self.0
    }

    /// Candidate indices `0, step, 2·step, …` below `total_frames`.
    pub fn candidates(self, total_frames: u64) -> impl Iterator<Item = u64> {
        let step = self.0;
        iter::successors(Some(0_u64), move |index| index.checked_add(step))
            .take_while(move |index| *index < total_frames)
    }

    /// Number of candidates below `total_frames`.
    pub fn candidate_count(self, total_frames: u64) -> u64 {
        total_frames.div_ceil(self.0)
    }
}

impl Display for SamplingInterval {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "every {} frame(s)", self.0)
    }
}

/// A decoded still and the source index it was taken from.
#[derive(Debug, Clone)]
pub struct SampledFrame {
    /// Zero-based index of the frame in the source stream.
    pub frame_number: u64,
    /// The decoded image.
    pub image: DynamicImage,
}

/// Samples stills from a stream at a fixed time interval.
///
/// Stateless between calls: every [`sample`](FrameSampler::sample) consumes
/// a fresh stream.
#[derive(Debug, Clone)]
pub struct FrameSampler<'a> {
    options: &'a ConvertOptions,
}

impl<'a> FrameSampler<'a> {
    /// Create a sampler reporting through `options`' progress callback.
    pub fn new(options: &'a ConvertOptions) -> Self {
        Self { options }
    }

    /// Sample `stream` every `interval_minutes` of video.
    ///
    /// The stream is dropped before this returns, on success or failure.
    ///
    /// # Errors
    ///
    /// [`FlipbookError::MediaUnreadable`] when the stream cannot report a
    /// positive frame rate or a frame count. Per-frame decode failures are
    /// not errors; those positions are left out of the result.
    pub fn sample<S: MediaStream>(
        &self,
        stream: S,
        interval_minutes: f64,
    ) -> Result<Vec<SampledFrame>, FlipbookError> {
        let (interval, frames) = self.sample_with_interval(stream, interval_minutes)?;
        log::debug!("Sampled {} frame(s), {interval}", frames.len());
        Ok(frames)
    }

    /// Like [`sample`](FrameSampler::sample) but also returns the interval
    /// that was derived from the stream's frame rate.
    ///
    /// Every sampled frame is held until this returns; prefer
    /// [`sample_each`](FrameSampler::sample_each) for small intervals over
    /// long videos.
    pub fn sample_with_interval<S: MediaStream>(
        &self,
        stream: S,
        interval_minutes: f64,
    ) -> Result<(SamplingInterval, Vec<SampledFrame>), FlipbookError> {
        let mut frames = Vec::new();
        let interval = self.sample_each(stream, interval_minutes, |frame| frames.push(frame))?;
        Ok((interval, frames))
    }

    /// Sample `stream` every `interval_minutes`, handing each decoded frame
    /// to `visit` before the next one is decoded.
    ///
    /// Frames arrive in increasing index order. Positions that fail to
    /// decode are skipped without calling `visit`.
    ///
    /// # Errors
    ///
    /// Same as [`sample`](FrameSampler::sample).
    pub fn sample_each<S, F>(
        &self,
        mut stream: S,
        interval_minutes: f64,
        mut visit: F,
    ) -> Result<SamplingInterval, FlipbookError>
    where
        S: MediaStream,
        F: FnMut(SampledFrame),
    {
        let frames_per_second = stream
            .frames_per_second()
            .filter(|fps| fps.is_finite() && *fps > 0.0)
            .ok_or_else(|| {
                FlipbookError::MediaUnreadable("frame rate is unavailable".to_string())
            })?;
        let total_frames = stream.frame_count().ok_or_else(|| {
            FlipbookError::MediaUnreadable("frame count is unavailable".to_string())
        })?;

        let interval = SamplingInterval::from_minutes(frames_per_second, interval_minutes);
        log::info!(
            "Sampling {total_frames} frame(s) at {frames_per_second:.3} fps, {interval} ({interval_minutes} min)"
        );

        let mut tracker = ProgressTracker::new(
            self.options.progress.clone(),
            OperationType::FrameSampling,
            Some(interval.candidate_count(total_frames)),
            self.options.batch_size,
        );

        for frame_number in interval.candidates(total_frames) {
            match stream.decode_frame(frame_number) {
                Ok(image) => visit(SampledFrame {
                    frame_number,
                    image,
                }),
                Err(error) => log::warn!("Skipping frame {frame_number}: {error}"),
            }
            tracker.advance(Some(frame_number));
        }
        tracker.finish();

        Ok(interval)
    }
}
