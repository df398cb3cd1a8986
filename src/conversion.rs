//! Internal conversion helpers.
//!
//! Pixel-plane copying and timestamp arithmetic shared by the FFmpeg-backed
//! stream and the document writer.

use ffmpeg_next::{Rational, frame::Video as VideoFrame};

// One inch is 25.4 mm and 72 pt.
const MILLIMETRES_PER_INCH: f64 = 25.4;
const POINTS_PER_INCH: f64 = 72.0;

/// Copy the first plane of a packed frame into a tightly-packed buffer.
///
/// FFmpeg rows are frequently padded past `width × bytes_per_pixel`; the
/// padding is stripped so the buffer can go straight into
/// [`image::ImageBuffer::from_raw`].
pub(crate) fn frame_to_buffer(
    video_frame: &VideoFrame,
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let row_length = width as usize * bytes_per_pixel;
    let rows = height as usize;
    let data = video_frame.data(0);

    if stride == row_length {
        return data[..row_length * rows].to_vec();
    }

    let mut buffer = Vec::with_capacity(row_length * rows);
    for row in 0..rows {
        let row_start = row * stride;
        buffer.extend_from_slice(&data[row_start..row_start + row_length]);
    }
    buffer
}

/// Rescale a PTS value from the stream time base to seconds.
pub(crate) fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    pts as f64 * time_base.numerator() as f64 / time_base.denominator() as f64
}

/// Rescale a PTS value to a frame index.
pub(crate) fn pts_to_frame_number(pts: i64, time_base: Rational, frames_per_second: f64) -> u64 {
    (pts_to_seconds(pts, time_base) * frames_per_second) as u64
}

/// Convert a frame index to a container seek target in `AV_TIME_BASE`
/// (microseconds), as expected by `Input::seek`.
pub(crate) fn frame_number_to_seek_timestamp(frame_number: u64, frames_per_second: f64) -> i64 {
    let seconds = frame_number as f64 / frames_per_second;
    (seconds * 1_000_000.0) as i64
}

/// Convert a length in millimetres to PDF points.
pub(crate) fn millimetres_to_points(millimetres: f64) -> f32 {
    (millimetres * POINTS_PER_INCH / MILLIMETRES_PER_INCH) as f32
}
