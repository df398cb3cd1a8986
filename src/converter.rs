//! End-to-end conversion.
//!
//! [`Converter`] runs one request through the pipeline: acquire a stream,
//! sample it, compose the frames onto A4 pages and optionally write the PDF.
//! Sampling and composition run in lockstep, so only one decoded frame is
//! alive at a time; the document keeps JPEG bytes.
//! It holds no per-request state, so one converter can serve any number of
//! sequential requests.

use std::path::{Path, PathBuf};

use serde_json::{Value, json};

use crate::{
    composer::{Document, PageComposer, PageSize},
    configuration::ConvertOptions,
    error::FlipbookError,
    pdf::DocumentWriter,
    sampler::{FrameSampler, SamplingInterval},
    source::{FfmpegSource, VideoSource},
};

/// The in-memory result of a conversion.
#[derive(Debug, Clone)]
pub struct Conversion {
    /// Interval derived from the stream's frame rate.
    pub interval: SamplingInterval,
    /// Frames that decoded successfully.
    pub sampled_frames: usize,
    /// The composed document.
    pub document: Document,
}

/// What a conversion wrote to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionSummary {
    /// Interval derived from the stream's frame rate.
    pub interval: SamplingInterval,
    /// Frames that decoded successfully.
    pub sampled_frames: usize,
    /// Pages in the written document.
    pub pages: usize,
    /// Location of the PDF.
    pub output: PathBuf,
}

impl ConversionSummary {
    /// JSON form used by the CLI's `--json` output.
    pub fn to_json(&self) -> Value {
        json!({
            "file": self.output.display().to_string(),
            "pages": self.pages,
            "sampled_frames": self.sampled_frames,
            "interval_frames": self.interval.frames(),
        })
    }
}

/// Runs the sampling and layout pipeline for a [`VideoSource`].
///
/// # Example
///
/// ```no_run
/// use flipbook::{ConvertOptions, Converter};
///
/// let converter = Converter::ffmpeg(ConvertOptions::new());
/// let summary = converter.convert_to_file("lecture.mp4", 5.0, "lecture.pdf")?;
/// println!("{} pages", summary.pages);
/// # Ok::<(), flipbook::FlipbookError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Converter<S> {
    source: S,
    options: ConvertOptions,
}

impl Converter<FfmpegSource> {
    /// A converter decoding with FFmpeg using `options`' frame output.
    pub fn ffmpeg(options: ConvertOptions) -> Self {
        let source = FfmpegSource::new(options.frame_output.clone());
        Self::new(source, options)
    }
}

impl<S: VideoSource> Converter<S> {
    /// Create a converter over `source`.
    pub fn new(source: S, options: ConvertOptions) -> Self {
        Self { source, options }
    }

    /// The options shared by every stage.
    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Acquire, sample and compose `identifier` on A4 pages.
    ///
    /// # Errors
    ///
    /// Acquisition errors from the source and
    /// [`FlipbookError::MediaUnreadable`] from the sampler. A video whose
    /// every frame fails to decode is not an error; the document is empty.
    pub fn convert_detailed(
        &self,
        identifier: &str,
        interval_minutes: f64,
    ) -> Result<Conversion, FlipbookError> {
        let stream = self.source.acquire(identifier)?;

        let mut builder = PageComposer::new(&self.options).builder(PageSize::A4);
        let mut sampled_frames = 0;
        let interval = FrameSampler::new(&self.options).sample_each(
            stream,
            interval_minutes,
            |frame| {
                sampled_frames += 1;
                builder.push(frame);
            },
        )?;
        let document = builder.finish();

        log::info!(
            "Converted {identifier}: {sampled_frames} frame(s) sampled, {} page(s)",
            document.len()
        );

        Ok(Conversion {
            interval,
            sampled_frames,
            document,
        })
    }

    /// Like [`convert_detailed`](Converter::convert_detailed), returning
    /// only the document.
    pub fn convert(&self, identifier: &str, interval_minutes: f64) -> Result<Document, FlipbookError> {
        Ok(self.convert_detailed(identifier, interval_minutes)?.document)
    }

    /// Convert `identifier` and write the PDF to `output`.
    pub fn convert_to_file<P: AsRef<Path>>(
        &self,
        identifier: &str,
        interval_minutes: f64,
        output: P,
    ) -> Result<ConversionSummary, FlipbookError> {
        let conversion = self.convert_detailed(identifier, interval_minutes)?;
        self.write(conversion, output.as_ref())
    }

    /// Write a finished conversion to `output`.
    pub fn write(
        &self,
        conversion: Conversion,
        output: &Path,
    ) -> Result<ConversionSummary, FlipbookError> {
        DocumentWriter::new(&self.options).save(&conversion.document, output)?;
        Ok(ConversionSummary {
            interval: conversion.interval,
            sampled_frames: conversion.sampled_frames,
            pages: conversion.document.len(),
            output: output.to_path_buf(),
        })
    }
}
