//! ConvertOptions, FrameOutputOptions, PixelFormat and FfmpegLogLevel tests.
//!
//! Tests that decode require fixture files from
//! `tests/fixtures/generate_fixtures.sh`.

use std::path::Path;

use flipbook::{
    ConvertOptions, DEFAULT_JPEG_QUALITY, FfmpegLogLevel, FfmpegStream, FrameOutputOptions,
    MediaStream, PixelFormat,
};
use image::DynamicImage;

fn sample_video_path() -> &'static str {
    "tests/fixtures/sample_video.mp4"
}

// ── ConvertOptions builder ─────────────────────────────────────────

#[test]
fn options_defaults() {
    let options = ConvertOptions::new();
    assert_eq!(options.jpeg_quality(), DEFAULT_JPEG_QUALITY);
    assert_eq!(options.batch_size(), 1);
    assert_eq!(options.frame_output().pixel_format, PixelFormat::Rgb8);
    assert!(options.frame_output().width.is_none());

    let debug = format!("{options:?}");
    assert!(debug.contains("ConvertOptions"));
    assert!(debug.contains("jpeg_quality: 90"));
}

#[test]
fn options_batch_size_clamps_zero() {
    assert_eq!(ConvertOptions::new().with_batch_size(0).batch_size(), 1);
    assert_eq!(ConvertOptions::new().with_batch_size(25).batch_size(), 25);
}

#[test]
fn options_jpeg_quality_clamps() {
    assert_eq!(ConvertOptions::new().with_jpeg_quality(0).jpeg_quality(), 1);
    assert_eq!(ConvertOptions::new().with_jpeg_quality(200).jpeg_quality(), 100);
    assert_eq!(ConvertOptions::new().with_jpeg_quality(55).jpeg_quality(), 55);
}

#[test]
fn options_frame_output_builders() {
    let options = ConvertOptions::new()
        .with_pixel_format(PixelFormat::Gray8)
        .with_resolution(Some(320), None)
        .with_maintain_aspect_ratio(false);

    let frame_output = options.frame_output();
    assert_eq!(frame_output.pixel_format, PixelFormat::Gray8);
    assert_eq!(frame_output.width, Some(320));
    assert_eq!(frame_output.height, None);
    assert!(!frame_output.maintain_aspect_ratio);

    let replaced = options.with_frame_output(FrameOutputOptions::default());
    assert_eq!(replaced.frame_output().pixel_format, PixelFormat::Rgb8);
}

// ── FrameOutputOptions ─────────────────────────────────────────────

#[test]
fn resolve_keeps_source_size() {
    let frame_output = FrameOutputOptions::default();
    assert_eq!(frame_output.resolve_dimensions(1920, 1080), (1920, 1080));
}

#[test]
fn resolve_width_keeps_aspect() {
    let frame_output = FrameOutputOptions {
        width: Some(640),
        ..FrameOutputOptions::default()
    };
    assert_eq!(frame_output.resolve_dimensions(1920, 1080), (640, 360));
}

#[test]
fn resolve_height_keeps_aspect() {
    let frame_output = FrameOutputOptions {
        height: Some(540),
        ..FrameOutputOptions::default()
    };
    assert_eq!(frame_output.resolve_dimensions(1920, 1080), (960, 540));
}

#[test]
fn resolve_without_aspect() {
    let frame_output = FrameOutputOptions {
        width: Some(100),
        maintain_aspect_ratio: false,
        ..FrameOutputOptions::default()
    };
    assert_eq!(frame_output.resolve_dimensions(1920, 1080), (100, 1080));
}

#[test]
fn resolve_explicit_size() {
    let frame_output = FrameOutputOptions {
        width: Some(64),
        height: Some(64),
        ..FrameOutputOptions::default()
    };
    assert_eq!(frame_output.resolve_dimensions(1920, 1080), (64, 64));
}

#[test]
fn resolve_never_zero() {
    let frame_output = FrameOutputOptions {
        width: Some(1),
        ..FrameOutputOptions::default()
    };
    assert_eq!(frame_output.resolve_dimensions(4000, 10), (1, 1));
}

// ── FfmpegLogLevel ─────────────────────────────────────────────────

#[test]
fn log_level_parsing() {
    assert_eq!("quiet".parse::<FfmpegLogLevel>(), Ok(FfmpegLogLevel::Quiet));
    assert_eq!("WARN".parse::<FfmpegLogLevel>(), Ok(FfmpegLogLevel::Warning));
    assert_eq!(" error ".parse::<FfmpegLogLevel>(), Ok(FfmpegLogLevel::Error));
    assert_eq!("trace".parse::<FfmpegLogLevel>(), Ok(FfmpegLogLevel::Debug));
    assert!("loud".parse::<FfmpegLogLevel>().is_err());
}

#[test]
fn log_level_display_round_trips() {
    for level in [
        FfmpegLogLevel::Quiet,
        FfmpegLogLevel::Fatal,
        FfmpegLogLevel::Error,
        FfmpegLogLevel::Warning,
        FfmpegLogLevel::Info,
        FfmpegLogLevel::Debug,
    ] {
        assert_eq!(level.to_string().parse::<FfmpegLogLevel>(), Ok(level));
    }
}

// ── Decoding with options ──────────────────────────────────────────

#[test]
fn decode_gray_frames() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let frame_output = FrameOutputOptions {
        pixel_format: PixelFormat::Gray8,
        ..FrameOutputOptions::default()
    };
    let mut stream = FfmpegStream::open(path, &frame_output).expect("Failed to open fixture");
    let image = stream.decode_frame(0).expect("Failed to decode");
    assert!(matches!(image, DynamicImage::ImageLuma8(_)));
}

#[test]
fn decode_scaled_frames() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let options = ConvertOptions::new().with_resolution(Some(320), None);
    let mut stream =
        FfmpegStream::open(path, options.frame_output()).expect("Failed to open fixture");
    let image = stream.decode_frame(0).expect("Failed to decode");
    assert_eq!(image.width(), 320);
    assert_eq!(image.height(), 240);
    assert!(matches!(image, DynamicImage::ImageRgb8(_)));
}
