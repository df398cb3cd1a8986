//! Request boundary.
//!
//! [`RequestHandler`] accepts the two string parameters of a conversion
//! request, runs the [`Converter`] and answers with the written PDF or an
//! [`ErrorPayload`]. It also owns the policy for documents without pages,
//! which the pipeline itself never treats as an error.
//!
//! # Example
//!
//! ```no_run
//! use flipbook::{ConvertOptions, ConvertRequest, Converter, RequestHandler};
//!
//! let handler = RequestHandler::new(Converter::ffmpeg(ConvertOptions::new()), "out");
//! let request = ConvertRequest::new(Some("https://example.com/talk.mp4"), Some("2"));
//! match handler.handle(&request) {
//!     Ok(summary) => println!("wrote {}", summary.output.display()),
//!     Err(payload) => println!("{}", payload.to_json()),
//! }
//! ```

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    fs,
    path::{Path, PathBuf},
};

use serde_json::{Value, json};

use crate::{
    converter::{ConversionSummary, Converter},
    error::FlipbookError,
    source::VideoSource,
};

/// Name of the parameter carrying the video identifier.
pub const VIDEO_PARAMETER: &str = "youtube_url";
/// Name of the parameter carrying the interval in minutes.
pub const TIME_PARAMETER: &str = "time";

const FALLBACK_STEM: &str = "video";
const IDENTIFIER_HASH_LENGTH: usize = 8;

/// The two raw inputs of a conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertRequest {
    /// Path or URL of the video.
    pub video: Option<String>,
    /// Sampling interval in minutes, as sent by the client.
    pub time: Option<String>,
}

impl ConvertRequest {
    /// Build a request from optional raw values.
    pub fn new(video: Option<&str>, time: Option<&str>) -> Self {
        Self {
            video: video.map(str::to_string),
            time: time.map(str::to_string),
        }
    }

    /// Build a request from already-decoded key/value pairs, keeping the
    /// last value of each known parameter. Unknown keys are ignored.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut request = Self::default();
        for (key, value) in pairs {
            match key.as_ref() {
                VIDEO_PARAMETER | "video" | "url" => request.video = Some(value.into()),
                TIME_PARAMETER | "minutes" => request.time = Some(value.into()),
                _ => {}
            }
        }
        request
    }

    /// The interval in minutes, see [`parse_interval_minutes`].
    pub fn interval_minutes(&self) -> f64 {
        parse_interval_minutes(self.time.as_deref())
    }
}

/// Parse an interval in minutes.
///
/// Absent, blank, non-numeric and NaN values give `0.0`, which the sampler
/// turns into "every frame". Infinity is kept, like any huge value it
/// saturates the interval and yields only the first frame.
///
/// ```
/// use flipbook::parse_interval_minutes;
///
/// assert_eq!(parse_interval_minutes(Some(" 1.5 ")), 1.5);
/// assert_eq!(parse_interval_minutes(Some("soon")), 0.0);
/// assert_eq!(parse_interval_minutes(Some("inf")), f64::INFINITY);
/// assert_eq!(parse_interval_minutes(None), 0.0);
/// ```
pub fn parse_interval_minutes(raw: Option<&str>) -> f64 {
    raw.map(str::trim)
        .and_then(|value| value.parse::<f64>().ok())
        .filter(|minutes| !minutes.is_nan())
        .unwrap_or(0.0)
}

/// Replace characters that are invalid in file names on common platforms.
///
/// ```
/// use flipbook::sanitize_filename;
///
/// assert_eq!(sanitize_filename("a:b*c?"), "a_b_c_");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c => c,
        })
        .collect()
}

/// File stem for the PDF written for `identifier`.
///
/// Takes the last path segment, drops any query or fragment and the
/// extension, then sanitizes what is left. Two cases keep distinct
/// identifiers apart when that segment alone would not:
///
/// - a `v` query parameter (`.../watch?v=ID`) names the video, so its value
///   is the stem;
/// - any other query or fragment appends the first 8 hex digits of the
///   identifier's BLAKE3 hash.
///
/// ```
/// use flipbook::output_stem;
///
/// assert_eq!(output_stem("/videos/lecture.mp4"), "lecture");
/// assert_eq!(output_stem("https://example.com/watch?v=dQw4w9WgXcQ"), "dQw4w9WgXcQ");
/// assert!(output_stem("https://example.com/play?id=7").starts_with("play_"));
/// ```
pub fn output_stem(identifier: &str) -> String {
    let identifier = identifier.trim();
    let (path, suffix) = match identifier.find(['?', '#']) {
        Some(index) => identifier.split_at(index),
        None => (identifier, ""),
    };
    let segment = path
        .trim_end_matches(['/', '\\'])
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    if let Some(video_id) = query_value(suffix, "v") {
        let sanitized = sanitize_filename(video_id.trim());
        if !sanitized.is_empty() {
            return sanitized;
        }
    }

    let stem = Path::new(segment)
        .file_stem()
        .map(|stem| sanitize_filename(stem.to_string_lossy().trim()))
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| FALLBACK_STEM.to_string());

    if suffix.len() > 1 {
        let digest = blake3::hash(identifier.as_bytes()).to_hex();
        format!("{stem}_{}", &digest.as_str()[..IDENTIFIER_HASH_LENGTH])
    } else {
        stem
    }
}

/// Value of `key` in the query part of `suffix` (`?a=1&b=2#frag`).
fn query_value<'s>(suffix: &'s str, key: &str) -> Option<&'s str> {
    let query = suffix.strip_prefix('?')?;
    let query = query.split('#').next().unwrap_or_default();
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(name, _)| *name == key)
        .map(|(_, value)| value)
}

/// Category of a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The request did not name a video.
    MissingParameter,
    /// The source is reachable but has no decodable video stream.
    NoStreamAvailable,
    /// The source could not be reached or opened.
    AcquisitionFailed,
    /// Frame rate or frame count could not be read.
    MediaUnreadable,
    /// No frame could be sampled and empty documents are rejected.
    EmptyDocument,
    /// Any other failure (encoding, I/O, FFmpeg).
    Internal,
}

/// Structured error returned to the requester.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorPayload {
    /// What went wrong.
    pub kind: ErrorKind,
    /// Human-readable description.
    pub message: String,
}

impl ErrorPayload {
    /// JSON body: `{"message": ...}` when no stream is available,
    /// `{"error": ...}` otherwise.
    pub fn to_json(&self) -> Value {
        match self.kind {
            ErrorKind::NoStreamAvailable => json!({ "message": self.message }),
            _ => json!({ "error": self.message }),
        }
    }
}

impl Display for ErrorPayload {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.message)
    }
}

impl From<FlipbookError> for ErrorPayload {
    fn from(error: FlipbookError) -> Self {
        let kind = match &error {
            FlipbookError::MissingParameter(_) => ErrorKind::MissingParameter,
            FlipbookError::NoVideoStream => ErrorKind::NoStreamAvailable,
            FlipbookError::Acquisition { .. } => ErrorKind::AcquisitionFailed,
            FlipbookError::MediaUnreadable(_) => ErrorKind::MediaUnreadable,
            FlipbookError::EmptyDocument => ErrorKind::EmptyDocument,
            _ => ErrorKind::Internal,
        };
        let message = match kind {
            ErrorKind::NoStreamAvailable => "No downloadable video found".to_string(),
            _ => error.to_string(),
        };
        ErrorPayload { kind, message }
    }
}

/// Serves conversion requests, writing PDFs into one output directory.
#[derive(Debug, Clone)]
pub struct RequestHandler<S> {
    converter: Converter<S>,
    output_dir: PathBuf,
    allow_empty: bool,
}

impl<S: VideoSource> RequestHandler<S> {
    /// Create a handler writing into `output_dir`. Empty documents are
    /// rejected until [`allow_empty`](RequestHandler::allow_empty) is set.
    pub fn new<P: Into<PathBuf>>(converter: Converter<S>, output_dir: P) -> Self {
        Self {
            converter,
            output_dir: output_dir.into(),
            allow_empty: false,
        }
    }

    /// Write a zero-page PDF instead of failing when nothing was sampled.
    #[must_use]
    pub fn allow_empty(mut self, allow: bool) -> Self {
        self.allow_empty = allow;
        self
    }

    /// Where the PDF for `identifier` is written.
    pub fn output_path(&self, identifier: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}_frames.pdf", output_stem(identifier)))
    }

    /// Handle one request.
    pub fn handle(&self, request: &ConvertRequest) -> Result<ConversionSummary, ErrorPayload> {
        self.try_handle(request).map_err(|error| {
            log::warn!("Request failed: {error}");
            ErrorPayload::from(error)
        })
    }

    fn try_handle(&self, request: &ConvertRequest) -> Result<ConversionSummary, FlipbookError> {
        let identifier = request
            .video
            .as_deref()
            .map(str::trim)
            .filter(|video| !video.is_empty())
            .ok_or(FlipbookError::MissingParameter(VIDEO_PARAMETER))?;
        let interval_minutes = request.interval_minutes();

        log::debug!("Handling request for {identifier} every {interval_minutes} min");

        let conversion = self.converter.convert_detailed(identifier, interval_minutes)?;
        if conversion.document.is_empty() && !self.allow_empty {
            return Err(FlipbookError::EmptyDocument);
        }

        fs::create_dir_all(&self.output_dir)?;
        self.converter
            .write(conversion, &self.output_path(identifier))
    }
}
