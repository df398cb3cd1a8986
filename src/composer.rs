//! Page layout.
//!
//! [`PageComposer`] turns sampled frames into a [`Document`]: one page per
//! frame, each image uniformly scaled to fit the page and centered on both
//! axes. Page units are millimetres with the origin at the top-left corner.
//!
//! Each frame is JPEG-encoded as it is placed and its raster dropped, so a
//! document costs one compressed image per page. [`DocumentBuilder`] accepts
//! frames one at a time, which lets a conversion hold at most one decoded
//! frame regardless of how many pages it produces.

use crate::{
    configuration::ConvertOptions,
    encoding::EncodedImage,
    progress::{OperationType, ProgressTracker},
    sampler::SampledFrame,
};

/// Fixed page dimensions in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    /// Page width in millimetres.
    pub width: f64,
    /// Page height in millimetres.
    pub height: f64,
}

impl PageSize {
    /// ISO A4 portrait.
    pub const A4: PageSize = PageSize {
        width: 210.0,
        height: 297.0,
    };
}

impl Default for PageSize {
    fn default() -> Self {
        PageSize::A4
    }
}

/// Where an image sits on its page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Left offset from the page edge.
    pub x: f64,
    /// Top offset from the page edge.
    pub y: f64,
    /// Scaled image width.
    pub width: f64,
    /// Scaled image height.
    pub height: f64,
    /// Uniform factor applied to the intrinsic image size.
    pub scale: f64,
}

impl Placement {
    /// Scale an image of `image_width × image_height` to fit a
    /// `page_width × page_height` page and center it.
    ///
    /// The axis that limits the scale gets the page dimension exactly and
    /// the other axis is clamped to the page, so the placed box never
    /// overflows. Images whose aspect ratio matches the page fill it.
    ///
    /// Returns `None` for images with a zero or non-finite dimension.
    ///
    /// ```
    /// use flipbook::Placement;
    ///
    /// let placement = Placement::fit(1000.0, 500.0, 210.0, 297.0).unwrap();
    /// assert_eq!(placement.width, 210.0);
    /// assert!((placement.height - 105.0).abs() < 1e-9);
    /// assert!((placement.y - 96.0).abs() < 1e-9);
    /// ```
    pub fn fit(image_width: f64, image_height: f64, page_width: f64, page_height: f64) -> Option<Self> {
        let valid = |value: f64| value.is_finite() && value > 0.0;
        if !valid(image_width) || !valid(image_height) {
            return None;
        }

        // Compare aspect ratios without dividing: image is wider than the
        // page when image_width / image_height > page_width / page_height.
        let image_span = image_width * page_height;
        let page_span = page_width * image_height;

        let (width, height, scale) = if image_span == page_span {
            (page_width, page_height, page_width / image_width)
        } else if image_span > page_span {
            let scale = page_width / image_width;
            (page_width, (image_height * scale).min(page_height), scale)
        } else {
            let scale = page_height / image_height;
            ((image_width * scale).min(page_width), page_height, scale)
        };

        Some(Placement {
            x: (page_width - width) / 2.0,
            y: (page_height - height) / 2.0,
            width,
            height,
            scale,
        })
    }
}

/// One page holding a single placed image.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    frame_number: u64,
    image: EncodedImage,
    placement: Placement,
}

impl Page {
    /// A page drawing `image` at `placement`.
    ///
    /// [`PageComposer`] always centers; this constructor allows any
    /// placement, including ones that overflow the page.
    pub fn new(frame_number: u64, image: EncodedImage, placement: Placement) -> Self {
        Self {
            frame_number,
            image,
            placement,
        }
    }

    /// Source frame index of the image on this page.
    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    /// The encoded image at its intrinsic resolution.
    pub fn image(&self) -> &EncodedImage {
        &self.image
    }

    /// Where the image is drawn.
    pub fn placement(&self) -> Placement {
        self.placement
    }
}

/// An ordered, immutable sequence of pages sharing one page size.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    page_size: PageSize,
    pages: Vec<Page>,
}

impl Document {
    /// A document from already placed pages.
    pub fn new(page_size: PageSize, pages: Vec<Page>) -> Self {
        Self { page_size, pages }
    }

    /// Page dimensions shared by every page.
    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    /// Pages in source order.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Number of pages.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Returns `true` when no frame produced a page.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Total size of the embedded JPEG data in bytes.
    pub fn encoded_size(&self) -> usize {
        self.pages.iter().map(|page| page.image.data().len()).sum()
    }
}

/// Lays sampled frames out one per page.
#[derive(Debug, Clone)]
pub struct PageComposer<'a> {
    options: &'a ConvertOptions,
}

impl<'a> PageComposer<'a> {
    /// Create a composer using `options`' pixel format, JPEG quality and
    /// progress callback.
    pub fn new(options: &'a ConvertOptions) -> Self {
        Self { options }
    }

    /// Compose `frames` onto pages of `page_width × page_height`.
    ///
    /// Pages keep the input order. Frames with an empty image, or that fail
    /// to encode, are skipped. An empty input produces an empty document.
    pub fn compose(&self, frames: Vec<SampledFrame>, page_width: f64, page_height: f64) -> Document {
        let page_size = PageSize {
            width: page_width,
            height: page_height,
        };
        let mut builder = DocumentBuilder {
            options: self.options,
            page_size,
            pages: Vec::with_capacity(frames.len()),
            tracker: self.tracker(Some(frames.len() as u64)),
            report_each: true,
        };

        #[cfg(not(feature = "rayon"))]
        for frame in frames {
            builder.push(frame);
        }

        // Encoding dominates; `collect` keeps page order.
        #[cfg(feature = "rayon")]
        {
            use rayon::prelude::*;

            let options = self.options;
            let placed: Vec<(u64, Option<Page>)> = frames
                .into_par_iter()
                .map(|frame| (frame.frame_number, place(options, page_size, frame)))
                .collect();
            for (frame_number, page) in placed {
                builder.add(frame_number, page);
            }
        }

        builder.finish()
    }

    /// Compose `frames` onto pages of a fixed [`PageSize`].
    pub fn compose_on(&self, frames: Vec<SampledFrame>, page_size: PageSize) -> Document {
        self.compose(frames, page_size.width, page_size.height)
    }

    /// Start a document that receives frames one at a time.
    ///
    /// Progress is counted per frame but reported once, on
    /// [`finish`](DocumentBuilder::finish), so it does not interleave with
    /// the sampler's reports when the two run in lockstep.
    pub fn builder(&self, page_size: PageSize) -> DocumentBuilder<'a> {
        DocumentBuilder {
            options: self.options,
            page_size,
            pages: Vec::new(),
            tracker: self.tracker(None),
            report_each: false,
        }
    }

    fn tracker(&self, total: Option<u64>) -> ProgressTracker {
        ProgressTracker::new(
            self.options.progress.clone(),
            OperationType::PageComposition,
            total,
            self.options.batch_size,
        )
    }
}

/// Incrementally built [`Document`], see [`PageComposer::builder`].
pub struct DocumentBuilder<'a> {
    options: &'a ConvertOptions,
    page_size: PageSize,
    pages: Vec<Page>,
    tracker: ProgressTracker,
    report_each: bool,
}

impl DocumentBuilder<'_> {
    /// Place and encode `frame` as the next page. The raster is dropped
    /// before this returns.
    pub fn push(&mut self, frame: SampledFrame) {
        let frame_number = frame.frame_number;
        let page = place(self.options, self.page_size, frame);
        self.add(frame_number, page);
    }

    /// Pages composed so far.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Returns `true` while no page has been composed.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Finish the document.
    pub fn finish(mut self) -> Document {
        if !self.report_each {
            self.tracker.set_total(self.tracker.current());
        }
        self.tracker.finish();

        log::debug!(
            "Composed {} page(s) on {}x{} mm, {} byte(s) of JPEG",
            self.pages.len(),
            self.page_size.width,
            self.page_size.height,
            self.pages
                .iter()
                .map(|page| page.image.data().len())
                .sum::<usize>()
        );

        Document {
            page_size: self.page_size,
            pages: self.pages,
        }
    }

    fn add(&mut self, frame_number: u64, page: Option<Page>) {
        if let Some(page) = page {
            self.pages.push(page);
        }
        if self.report_each {
            self.tracker.advance(Some(frame_number));
        } else {
            self.tracker.count();
        }
    }
}

/// Fit and encode one frame, or `None` when it cannot be placed.
fn place(options: &ConvertOptions, page_size: PageSize, frame: SampledFrame) -> Option<Page> {
    let SampledFrame {
        frame_number,
        image,
    } = frame;

    let Some(placement) = Placement::fit(
        image.width() as f64,
        image.height() as f64,
        page_size.width,
        page_size.height,
    ) else {
        log::warn!(
            "Skipping frame {frame_number}: image has no area ({}x{})",
            image.width(),
            image.height()
        );
        return None;
    };

    match EncodedImage::encode(
        &image,
        options.frame_output.pixel_format,
        options.jpeg_quality,
    ) {
        Ok(encoded) => Some(Page {
            frame_number,
            image: encoded,
            placement,
        }),
        Err(error) => {
            log::warn!("Skipping frame {frame_number}: {error}");
            None
        }
    }
}
