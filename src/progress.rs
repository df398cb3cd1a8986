//! Progress reporting.
//!
//! Each pipeline stage reports through a [`ProgressCallback`] configured on
//! [`ConvertOptions`](crate::ConvertOptions). Callbacks observe only; the
//! pipeline has no cancellation points, so a caller-level timeout is the
//! only way to abandon a conversion.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use flipbook::{ConvertOptions, ProgressCallback, ProgressInfo};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         if let Some(pct) = info.percentage {
//!             println!("[{:?}] {pct:.1}% complete", info.operation);
//!         }
//!     }
//! }
//!
//! let options = ConvertOptions::new().with_progress(Arc::new(PrintProgress));
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

/// The pipeline stage currently reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum OperationType {
    /// Seeking and decoding candidate frames.
    FrameSampling,
    /// Placing sampled frames onto pages.
    PageComposition,
    /// Encoding page images and writing the PDF.
    DocumentWriting,
}

/// A snapshot of stage progress.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Which stage is reporting.
    pub operation: OperationType,
    /// Items (candidate frames or pages) processed so far.
    pub current: u64,
    /// Total items expected, if known.
    pub total: Option<u64>,
    /// Completion percentage (0.0 – 100.0), if `total` is known and non-zero.
    pub percentage: Option<f32>,
    /// Wall-clock time since the stage started.
    pub elapsed: Duration,
    /// Source frame index of the item just processed, when applicable.
    pub current_frame: Option<u64>,
}

/// Receives progress updates from the pipeline.
///
/// Must be [`Send`] and [`Sync`] because it lives in [`ConvertOptions`]
/// behind an [`Arc`], and the options are shared with rayon workers when
/// the `rayon` feature encodes pages in parallel. A [`Converter`] holding
/// them can also be moved to, or shared between, request threads.
///
/// Callbacks are only ever invoked from the thread running the stage.
///
/// [`ConvertOptions`]: crate::ConvertOptions
/// [`Converter`]: crate::Converter
pub trait ProgressCallback: Send + Sync {
    /// Called every `batch_size` items and once when a stage finishes.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Discards all notifications. The default callback.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Tracks timing for one stage and emits callbacks in batches.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    operation: OperationType,
    total: Option<u64>,
    current: u64,
    batch_size: u64,
    start_time: Instant,
    items_since_last_report: u64,
}

impl ProgressTracker {
    pub(crate) fn new(
        callback: Arc<dyn ProgressCallback>,
        operation: OperationType,
        total: Option<u64>,
        batch_size: u64,
    ) -> Self {
        Self {
            callback,
            operation,
            total,
            current: 0,
            batch_size: batch_size.max(1),
            start_time: Instant::now(),
            items_since_last_report: 0,
        }
    }

    /// Record one processed item.
    pub(crate) fn advance(&mut self, frame_number: Option<u64>) {
        self.current += 1;
        self.items_since_last_report += 1;

        if self.items_since_last_report >= self.batch_size {
            self.report(frame_number);
            self.items_since_last_report = 0;
        }
    }

    /// Count an item without reporting it.
    pub(crate) fn count(&mut self) {
        self.current += 1;
    }

    /// Items processed so far.
    pub(crate) fn current(&self) -> u64 {
        self.current
    }

    /// Fix the total once it is known.
    pub(crate) fn set_total(&mut self, total: u64) {
        self.total = Some(total);
    }

    /// Emit a final report regardless of batching.
    pub(crate) fn finish(&mut self) {
        self.report(None);
    }

    fn report(&self, frame_number: Option<u64>) {
        let percentage = self
            .total
            .filter(|&total| total > 0)
            .map(|total| (self.current as f32 / total as f32) * 100.0);

        let info = ProgressInfo {
            operation: self.operation,
            current: self.current,
            total: self.total,
            percentage,
            elapsed: self.start_time.elapsed(),
            current_frame: frame_number,
        };

        self.callback.on_progress(&info);
    }
}
