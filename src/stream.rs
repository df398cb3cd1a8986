//! Decodable media streams.
//!
//! [`MediaStream`] is the seam between the sampler and the decoding backend:
//! frame rate, frame count and seek-and-decode by frame index. The sampler
//! owns a stream exclusively and drops it when sampling ends.
//! [`FfmpegStream`] is the production implementation.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    time::Duration,
};

use ffmpeg_next::{
    Rational,
    codec::{context::Context as CodecContext, decoder::Video as VideoDecoder},
    format::context::Input,
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::{DynamicImage, GrayImage, RgbImage};

use crate::{
    configuration::{FrameOutputOptions, PixelFormat},
    conversion,
    error::FlipbookError,
    metadata::{MediaMetadata, VideoMetadata},
};

/// A video that can be sampled frame by frame.
///
/// Implementations report their metadata without decoding and decode a
/// single frame on request. A failed [`decode_frame`](MediaStream::decode_frame)
/// call must leave the stream usable for later indices.
pub trait MediaStream {
    /// Frames per second, `None` when the stream cannot report it.
    fn frames_per_second(&self) -> Option<f64>;

    /// Total number of frames, `None` when the stream cannot report it.
    fn frame_count(&self) -> Option<u64>;

    /// Seek to `frame_number` and decode the frame found there.
    fn decode_frame(&mut self, frame_number: u64) -> Result<DynamicImage, FlipbookError>;
}

impl<S: MediaStream + ?Sized> MediaStream for Box<S> {
    fn frames_per_second(&self) -> Option<f64> {
        (**self).frames_per_second()
    }

    fn frame_count(&self) -> Option<u64> {
        (**self).frame_count()
    }

    fn decode_frame(&mut self, frame_number: u64) -> Result<DynamicImage, FlipbookError> {
        (**self).decode_frame(frame_number)
    }
}

/// A media stream decoded with FFmpeg.
///
/// Holds the demuxer, a decoder for the best video stream and a lazily
/// created scaler converting decoded frames to the configured
/// [`PixelFormat`] and resolution.
///
/// # Example
///
/// ```no_run
/// use flipbook::{FfmpegStream, FrameOutputOptions, MediaStream};
///
/// let mut stream = FfmpegStream::open("lecture.mp4", &FrameOutputOptions::default())?;
/// println!("{:?} fps", stream.frames_per_second());
/// let first = stream.decode_frame(0)?;
/// first.save("first.png")?;
/// # Ok::<(), flipbook::FlipbookError>(())
/// ```
pub struct FfmpegStream {
    input_context: Input,
    decoder: VideoDecoder,
    /// Created on the first decoded frame, once the source format is known.
    scaler: Option<ScalingContext>,
    metadata: MediaMetadata,
    time_base: Rational,
    target: FrameTarget,
}

/// Pixel format and size every decoded frame is converted to.
#[derive(Debug, Clone, Copy)]
struct FrameTarget {
    pixel_format: PixelFormat,
    width: u32,
    height: u32,
}

impl Debug for FfmpegStream {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("FfmpegStream")
            .field("metadata", &self.metadata)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl FfmpegStream {
    /// Open a local path or a URL understood by FFmpeg's protocol layer.
    ///
    /// # Errors
    ///
    /// - [`FlipbookError::Acquisition`] if FFmpeg cannot open the input.
    /// - [`FlipbookError::NoVideoStream`] if the input has no video stream
    ///   FFmpeg can decode.
    pub fn open(
        identifier: &str,
        frame_output: &FrameOutputOptions,
    ) -> Result<Self, FlipbookError> {
        log::debug!("Opening media source: {identifier}");

        ffmpeg_next::init().map_err(|error| FlipbookError::Acquisition {
            identifier: identifier.to_string(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let input_context =
            ffmpeg_next::format::input(&identifier).map_err(|error| FlipbookError::Acquisition {
                identifier: identifier.to_string(),
                reason: error.to_string(),
            })?;

        let stream = input_context
            .streams()
            .best(Type::Video)
            .ok_or(FlipbookError::NoVideoStream)?;
        let stream_index = stream.index();
        let time_base = stream.time_base();

        let decoder = CodecContext::from_parameters(stream.parameters())
            .and_then(|context| context.decoder().video())
            .map_err(|error| {
                log::debug!("No usable decoder for stream {stream_index}: {error}");
                FlipbookError::NoVideoStream
            })?;

        let duration_microseconds = input_context.duration();
        let duration = if duration_microseconds > 0 {
            Duration::from_micros(duration_microseconds as u64)
        } else {
            Duration::ZERO
        };

        let frames_per_second = [stream.avg_frame_rate(), stream.rate()]
            .into_iter()
            .filter(|rate| rate.denominator() != 0)
            .map(|rate| rate.numerator() as f64 / rate.denominator() as f64)
            .find(|fps| fps.is_finite() && *fps > 0.0);

        let reported_frames = stream.frames();
        let frame_count = if reported_frames > 0 {
            Some(reported_frames as u64)
        } else {
            frames_per_second
                .filter(|_| !duration.is_zero())
                .map(|fps| (duration.as_secs_f64() * fps) as u64)
        };

        let codec = decoder
            .codec()
            .map(|codec| codec.name().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let metadata = MediaMetadata {
            video: VideoMetadata {
                width: decoder.width(),
                height: decoder.height(),
                frames_per_second,
                frame_count,
                codec,
                stream_index,
            },
            duration,
            format: input_context.format().name().to_string(),
        };

        let (output_width, output_height) =
            frame_output.resolve_dimensions(decoder.width(), decoder.height());

        log::info!(
            "Opened {identifier} (format={}, duration={:.2}s, {}x{}, fps={:?}, frames={:?}, codec={})",
            metadata.format,
            metadata.duration.as_secs_f64(),
            metadata.video.width,
            metadata.video.height,
            metadata.video.frames_per_second,
            metadata.video.frame_count,
            metadata.video.codec,
        );

        Ok(Self {
            input_context,
            decoder,
            scaler: None,
            metadata,
            time_base,
            target: FrameTarget {
                pixel_format: frame_output.pixel_format,
                width: output_width,
                height: output_height,
            },
        })
    }

    /// Metadata read when the stream was opened.
    pub fn metadata(&self) -> &MediaMetadata {
        &self.metadata
    }
}

impl MediaStream for FfmpegStream {
    fn frames_per_second(&self) -> Option<f64> {
        self.metadata.video.frames_per_second
    }

    fn frame_count(&self) -> Option<u64> {
        self.metadata.video.frame_count
    }

    /// Seeks to the keyframe at or before the target and decodes forward.
    ///
    /// When the exact index is not present (variable frame rate, dropped
    /// frames) the first frame after it is returned.
    fn decode_frame(&mut self, frame_number: u64) -> Result<DynamicImage, FlipbookError> {
        let frames_per_second = self.frames_per_second().ok_or_else(|| {
            FlipbookError::MediaUnreadable("stream reports no frame rate".to_string())
        })?;
        let stream_index = self.metadata.video.stream_index;
        let time_base = self.time_base;

        let target = conversion::frame_number_to_seek_timestamp(frame_number, frames_per_second);
        self.input_context.seek(target, ..target)?;
        self.decoder.flush();

        let mut decoded_frame = VideoFrame::empty();

        for (stream, packet) in self.input_context.packets() {
            if stream.index() != stream_index {
                continue;
            }

            self.decoder.send_packet(&packet)?;

            while self.decoder.receive_frame(&mut decoded_frame).is_ok() {
                let pts = decoded_frame.timestamp().or(decoded_frame.pts()).unwrap_or(0);
                let current = conversion::pts_to_frame_number(pts, time_base, frames_per_second);
                if current >= frame_number {
                    return convert_frame(&mut self.scaler, self.target, &decoded_frame);
                }
            }
        }

        self.decoder.send_eof()?;
        while self.decoder.receive_frame(&mut decoded_frame).is_ok() {
            let pts = decoded_frame.timestamp().or(decoded_frame.pts()).unwrap_or(0);
            let current = conversion::pts_to_frame_number(pts, time_base, frames_per_second);
            if current >= frame_number {
                return convert_frame(&mut self.scaler, self.target, &decoded_frame);
            }
        }

        Err(FlipbookError::VideoDecodeError(format!(
            "Could not locate frame {frame_number} in the video stream"
        )))
    }
}

/// Scale a decoded frame to the target format and wrap it as an image.
fn convert_frame(
    scaler: &mut Option<ScalingContext>,
    target: FrameTarget,
    decoded_frame: &VideoFrame,
) -> Result<DynamicImage, FlipbookError> {
    let scaler = match scaler {
        Some(scaler) => scaler,
        None => scaler.insert(ScalingContext::get(
            decoded_frame.format(),
            decoded_frame.width(),
            decoded_frame.height(),
            target.pixel_format.to_ffmpeg_pixel(),
            target.width,
            target.height,
            ScalingFlags::BILINEAR,
        )?),
    };

    let mut scaled_frame = VideoFrame::empty();
    scaler.run(decoded_frame, &mut scaled_frame)?;

    let buffer = conversion::frame_to_buffer(
        &scaled_frame,
        target.width,
        target.height,
        target.pixel_format.bytes_per_pixel(),
    );

    let image = match target.pixel_format {
        PixelFormat::Rgb8 => {
            RgbImage::from_raw(target.width, target.height, buffer).map(DynamicImage::ImageRgb8)
        }
        PixelFormat::Gray8 => {
            GrayImage::from_raw(target.width, target.height, buffer).map(DynamicImage::ImageLuma8)
        }
    };

    image.ok_or_else(|| {
        FlipbookError::VideoDecodeError(
            "Failed to construct image from decoded frame data".to_string(),
        )
    })
}
