//! Request handling integration tests.
//!
//! A scripted [`VideoSource`] stands in for FFmpeg so every error category
//! and the empty-document policy can be exercised without media files.

use std::path::Path;

use flipbook::{
    ConvertOptions, ConvertRequest, Converter, ErrorKind, ErrorPayload, FlipbookError,
    MediaStream, RequestHandler, TIME_PARAMETER, VIDEO_PARAMETER, VideoSource, output_stem,
    parse_interval_minutes, sanitize_filename,
};
use image::{DynamicImage, RgbImage};
use serde_json::json;

fn sample_video_path() -> &'static str {
    "tests/fixtures/sample_video.mp4"
}

// ── Scripted source ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum Script {
    /// 30 fps, 90 frames, every frame decodes.
    Healthy,
    /// 30 fps, 90 frames, every frame fails.
    Undecodable,
    /// The stream reports no frame rate.
    NoFrameRate,
    /// The input exists but has no video stream.
    NoVideo,
    /// The input cannot be reached.
    Unreachable,
}

struct ScriptedStream {
    script: Script,
}

impl MediaStream for ScriptedStream {
    fn frames_per_second(&self) -> Option<f64> {
        match self.script {
            Script::NoFrameRate => None,
            _ => Some(30.0),
        }
    }

    fn frame_count(&self) -> Option<u64> {
        Some(90)
    }

    fn decode_frame(&mut self, frame_number: u64) -> Result<DynamicImage, FlipbookError> {
        match self.script {
            Script::Undecodable => Err(FlipbookError::VideoDecodeError(format!(
                "frame {frame_number}"
            ))),
            _ => Ok(DynamicImage::ImageRgb8(RgbImage::new(32, 18))),
        }
    }
}

struct ScriptedSource(Script);

impl VideoSource for ScriptedSource {
    type Stream = ScriptedStream;

    fn acquire(&self, identifier: &str) -> Result<ScriptedStream, FlipbookError> {
        match self.0 {
            Script::NoVideo => Err(FlipbookError::NoVideoStream),
            Script::Unreachable => Err(FlipbookError::Acquisition {
                identifier: identifier.to_string(),
                reason: "connection refused".to_string(),
            }),
            script => Ok(ScriptedStream { script }),
        }
    }
}

fn handler(script: Script, output_dir: &Path) -> RequestHandler<ScriptedSource> {
    RequestHandler::new(
        Converter::new(ScriptedSource(script), ConvertOptions::new()),
        output_dir,
    )
}

fn request(video: &str, time: &str) -> ConvertRequest {
    ConvertRequest::new(Some(video), Some(time))
}

// ── Parameter parsing ──────────────────────────────────────────────

#[test]
fn interval_parsing() {
    assert_eq!(parse_interval_minutes(Some("2")), 2.0);
    assert_eq!(parse_interval_minutes(Some("0.25")), 0.25);
    assert_eq!(parse_interval_minutes(Some("  3 ")), 3.0);
    assert_eq!(parse_interval_minutes(Some("-1")), -1.0);
    assert_eq!(parse_interval_minutes(Some("")), 0.0);
    assert_eq!(parse_interval_minutes(Some("two")), 0.0);
    assert_eq!(parse_interval_minutes(Some("NaN")), 0.0);
    assert_eq!(parse_interval_minutes(Some("inf")), f64::INFINITY);
    assert_eq!(parse_interval_minutes(None), 0.0);
}

#[test]
fn request_from_pairs() {
    let request = ConvertRequest::from_pairs([
        (VIDEO_PARAMETER, "https://example.com/a.mp4"),
        (TIME_PARAMETER, "5"),
        ("ignored", "x"),
    ]);
    assert_eq!(request.video.as_deref(), Some("https://example.com/a.mp4"));
    assert_eq!(request.interval_minutes(), 5.0);

    let aliased = ConvertRequest::from_pairs([("url", "b.mp4"), ("minutes", "1")]);
    assert_eq!(aliased, ConvertRequest::new(Some("b.mp4"), Some("1")));

    let empty = ConvertRequest::from_pairs(Vec::<(String, String)>::new());
    assert_eq!(empty, ConvertRequest::default());
}

#[test]
fn filename_sanitizing() {
    assert_eq!(sanitize_filename(r#"a<b>c:d"e/f\g|h?i*j"#), "a_b_c_d_e_f_g_h_i_j");
    assert_eq!(sanitize_filename("plain name.mp4"), "plain name.mp4");
    assert_eq!(sanitize_filename(""), "");
}

#[test]
fn output_stems() {
    assert_eq!(output_stem("lecture.mp4"), "lecture");
    assert_eq!(output_stem("/videos/2024/talk.final.mkv"), "talk.final");
    assert_eq!(output_stem(r"C:\clips\intro.webm"), "intro");
    assert_eq!(output_stem("https://example.com/watch?v=abc"), "abc");
    assert_eq!(output_stem("https://example.com/watch?feature=share&v=abc"), "abc");
    assert_eq!(output_stem("https://example.com/"), "example");
    assert_eq!(output_stem(""), "video");
    assert_eq!(output_stem("/"), "video");
}

#[test]
fn query_strings_keep_outputs_apart() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let handler = handler(Script::Healthy, temporary_directory.path());

    let first = handler.output_path("https://example.com/watch?v=A");
    let second = handler.output_path("https://example.com/watch?v=B");
    assert_ne!(first, second);
    assert_eq!(first, temporary_directory.path().join("A_frames.pdf"));
    assert_eq!(second, temporary_directory.path().join("B_frames.pdf"));

    let first = handler.output_path("https://example.com/play?id=1");
    let second = handler.output_path("https://example.com/play?id=2");
    assert_ne!(first, second);
}

#[test]
fn query_suffix_is_a_stable_short_hash() {
    let stem = output_stem("https://example.com/media/clip.mp4?token=abc#t=10");
    let (name, hash) = stem.split_once('_').expect("hash suffix");
    assert_eq!(name, "clip");
    assert_eq!(hash.len(), 8);
    assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));

    assert_eq!(
        output_stem("https://example.com/media/clip.mp4?token=abc#t=10"),
        stem
    );
    assert_ne!(output_stem("https://example.com/media/clip.mp4?token=xyz"), stem);

    // A bare `?` carries nothing to tell inputs apart.
    assert_eq!(output_stem("https://example.com/media/clip.mp4?"), "clip");
    // An empty `v` falls back to the hashed path stem.
    assert!(output_stem("https://example.com/watch?v=").starts_with("watch_"));
}

// ── Error payloads ─────────────────────────────────────────────────

#[test]
fn payload_json_shapes() {
    let no_stream = ErrorPayload::from(FlipbookError::NoVideoStream);
    assert_eq!(no_stream.kind, ErrorKind::NoStreamAvailable);
    assert_eq!(
        no_stream.to_json(),
        json!({ "message": "No downloadable video found" })
    );

    let unreadable = ErrorPayload::from(FlipbookError::MediaUnreadable("no fps".to_string()));
    assert_eq!(unreadable.kind, ErrorKind::MediaUnreadable);
    assert!(unreadable.to_json().get("error").is_some());
    assert!(unreadable.to_json().get("message").is_none());
}

#[test]
fn payload_categories() {
    let cases = [
        (FlipbookError::MissingParameter("youtube_url"), ErrorKind::MissingParameter),
        (
            FlipbookError::Acquisition {
                identifier: "x".to_string(),
                reason: "y".to_string(),
            },
            ErrorKind::AcquisitionFailed,
        ),
        (FlipbookError::EmptyDocument, ErrorKind::EmptyDocument),
        (FlipbookError::FfmpegError("boom".to_string()), ErrorKind::Internal),
    ];
    for (error, kind) in cases {
        assert_eq!(ErrorPayload::from(error).kind, kind);
    }
}

// ── RequestHandler ─────────────────────────────────────────────────

#[test]
fn successful_request_writes_pdf() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let handler = handler(Script::Healthy, temporary_directory.path());

    // 30 fps × 60 × (1/60) min = every 30 frames of 90.
    let summary = handler
        .handle(&request("https://example.com/talks/intro.mp4", "0.0166666666667"))
        .expect("Request should succeed");

    assert_eq!(summary.pages, 3);
    assert_eq!(summary.sampled_frames, 3);
    assert_eq!(summary.interval.frames(), 30);
    assert_eq!(
        summary.output,
        temporary_directory.path().join("intro_frames.pdf")
    );

    let bytes = std::fs::read(&summary.output).expect("PDF should exist");
    assert!(bytes.starts_with(b"%PDF-"));

    let payload = summary.to_json();
    assert_eq!(payload["pages"], 3);
    assert_eq!(payload["interval_frames"], 30);
}

#[test]
fn missing_time_samples_every_frame() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let handler = handler(Script::Healthy, temporary_directory.path());

    let summary = handler
        .handle(&ConvertRequest::new(Some("clip.mp4"), None))
        .unwrap();
    assert_eq!(summary.pages, 90);
}

#[test]
fn infinite_time_gives_one_page() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let handler = handler(Script::Healthy, temporary_directory.path());

    let summary = handler.handle(&request("clip.mp4", "inf")).unwrap();
    assert_eq!(summary.pages, 1);
    assert_eq!(summary.interval.frames(), u64::MAX);

    let huge = handler.handle(&request("clip.mp4", "1e300")).unwrap();
    assert_eq!(huge.pages, summary.pages);
}

#[test]
fn output_directory_is_created() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let nested = temporary_directory.path().join("a").join("b");
    let handler = handler(Script::Healthy, &nested);

    let summary = handler.handle(&request("clip.mp4", "1")).unwrap();
    assert!(summary.output.starts_with(&nested));
    assert!(summary.output.exists());
}

#[test]
fn missing_video_parameter() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let handler = handler(Script::Healthy, temporary_directory.path());

    for request in [
        ConvertRequest::new(None, Some("1")),
        ConvertRequest::new(Some("   "), Some("1")),
    ] {
        let payload = handler.handle(&request).unwrap_err();
        assert_eq!(payload.kind, ErrorKind::MissingParameter);
        assert!(payload.message.contains(VIDEO_PARAMETER), "{payload}");
    }
}

#[test]
fn no_video_stream() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let payload = handler(Script::NoVideo, temporary_directory.path())
        .handle(&request("page.html", "1"))
        .unwrap_err();

    assert_eq!(payload.kind, ErrorKind::NoStreamAvailable);
    assert_eq!(payload.message, "No downloadable video found");
}

#[test]
fn unreachable_source() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let payload = handler(Script::Unreachable, temporary_directory.path())
        .handle(&request("https://unreachable.invalid/a.mp4", "1"))
        .unwrap_err();

    assert_eq!(payload.kind, ErrorKind::AcquisitionFailed);
    assert!(payload.message.contains("connection refused"), "{payload}");
}

#[test]
fn unreadable_media() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let payload = handler(Script::NoFrameRate, temporary_directory.path())
        .handle(&request("clip.mp4", "1"))
        .unwrap_err();
    assert_eq!(payload.kind, ErrorKind::MediaUnreadable);
}

#[test]
fn empty_document_rejected_by_default() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let handler = handler(Script::Undecodable, temporary_directory.path());

    let payload = handler.handle(&request("clip.mp4", "0")).unwrap_err();
    assert_eq!(payload.kind, ErrorKind::EmptyDocument);
    assert!(!handler.output_path("clip.mp4").exists());
}

#[test]
fn empty_document_allowed() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let handler = handler(Script::Undecodable, temporary_directory.path()).allow_empty(true);

    let summary = handler.handle(&request("clip.mp4", "0")).unwrap();
    assert_eq!(summary.pages, 0);
    assert_eq!(summary.sampled_frames, 0);

    let bytes = std::fs::read(&summary.output).unwrap();
    assert!(bytes.starts_with(b"%PDF-"));
}

#[test]
fn handler_serves_repeated_requests() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let handler = handler(Script::Healthy, temporary_directory.path());

    let first = handler.handle(&request("a.mp4", "0.05")).unwrap();
    let second = handler.handle(&request("b.mp4", "0.05")).unwrap();
    assert_eq!(first.pages, second.pages);
    assert_ne!(first.output, second.output);
}

#[test]
fn nonexistent_file_with_ffmpeg() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let handler = RequestHandler::new(
        Converter::ffmpeg(ConvertOptions::new()),
        temporary_directory.path(),
    );

    let payload = handler
        .handle(&request("this_file_does_not_exist.mp4", "1"))
        .unwrap_err();
    assert_eq!(payload.kind, ErrorKind::AcquisitionFailed);
    assert!(payload.to_json().get("error").is_some());
}

#[test]
fn fixture_request() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let handler = RequestHandler::new(
        Converter::ffmpeg(ConvertOptions::new().with_resolution(Some(160), None)),
        temporary_directory.path(),
    );

    // One page per second of video.
    let summary = handler
        .handle(&request(path, &(1.0_f64 / 60.0).to_string()))
        .expect("Fixture conversion should succeed");

    assert!(summary.pages >= 1);
    assert_eq!(
        summary.output,
        temporary_directory.path().join("sample_video_frames.pdf")
    );
    assert!(summary.output.exists());
}
