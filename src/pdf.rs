//! PDF serialization.
//!
//! [`DocumentWriter`] renders a [`Document`] with `pdf-writer`: each page
//! gets a MediaBox of the document's page size and one JPEG image XObject
//! drawn at the page's [`Placement`](crate::Placement). Page coordinates
//! are converted from top-left millimetres to bottom-left points.
//!
//! # Example
//!
//! ```no_run
//! use flipbook::{ConvertOptions, DocumentWriter, PageComposer, PageSize};
//!
//! let options = ConvertOptions::new().with_jpeg_quality(80);
//! let document = PageComposer::new(&options).compose_on(Vec::new(), PageSize::A4);
//! DocumentWriter::new(&options).save(&document, "empty.pdf")?;
//! # Ok::<(), flipbook::FlipbookError>(())
//! ```

use std::{fs, path::Path};

use pdf_writer::{Content, Filter, Finish, Name, Pdf, Rect, Ref, TextStr};

use crate::{
    composer::{Document, Page},
    configuration::{ConvertOptions, PixelFormat},
    conversion::millimetres_to_points,
    error::FlipbookError,
    progress::{OperationType, ProgressTracker},
};

const IMAGE_NAME: Name<'static> = Name(b"Im0");
const PRODUCER: &str = concat!("flipbook ", env!("CARGO_PKG_VERSION"));

/// Serializes documents to PDF.
#[derive(Debug, Clone)]
pub struct DocumentWriter<'a> {
    options: &'a ConvertOptions,
}

impl<'a> DocumentWriter<'a> {
    /// Create a writer reporting through `options`' progress callback.
    ///
    /// Pixel format and JPEG quality were applied when the pages were
    /// composed; the writer embeds the encoded bytes as they are.
    pub fn new(options: &'a ConvertOptions) -> Self {
        Self { options }
    }

    /// Render `document` to PDF bytes.
    ///
    /// A document without pages yields a valid PDF with an empty page tree.
    pub fn to_pdf_bytes(&self, document: &Document) -> Vec<u8> {
        let pages = document.pages();
        let mut tracker = ProgressTracker::new(
            self.options.progress.clone(),
            OperationType::DocumentWriting,
            Some(pages.len() as u64),
            self.options.batch_size,
        );

        let mut allocator = Ref::new(1);
        let catalog_id = allocator.bump();
        let page_tree_id = allocator.bump();
        let info_id = allocator.bump();

        // Three objects per page: page, image and content stream.
        let page_refs: Vec<(Ref, Ref, Ref)> = (0..pages.len())
            .map(|_| (allocator.bump(), allocator.bump(), allocator.bump()))
            .collect();

        let page_size = document.page_size();
        let page_width = millimetres_to_points(page_size.width);
        let page_height = millimetres_to_points(page_size.height);

        let mut pdf = Pdf::new();
        pdf.catalog(catalog_id).pages(page_tree_id);
        pdf.pages(page_tree_id)
            .kids(page_refs.iter().map(|(page_id, _, _)| *page_id))
            .count(page_refs.len() as i32);
        pdf.document_info(info_id).producer(TextStr(PRODUCER));

        for (page, (page_id, image_id, content_id)) in pages.iter().zip(&page_refs) {
            let mut page_writer = pdf.page(*page_id);
            page_writer.media_box(Rect::new(0.0, 0.0, page_width, page_height));
            page_writer.parent(page_tree_id);
            page_writer.contents(*content_id);
            page_writer.resources().x_objects().pair(IMAGE_NAME, *image_id);
            page_writer.finish();

            let image = page.image();
            let mut image_writer = pdf.image_xobject(*image_id, image.data());
            image_writer.filter(Filter::DctDecode);
            image_writer.width(image.width() as i32);
            image_writer.height(image.height() as i32);
            match image.pixel_format() {
                PixelFormat::Rgb8 => image_writer.color_space().device_rgb(),
                PixelFormat::Gray8 => image_writer.color_space().device_gray(),
            }
            image_writer.bits_per_component(8);
            image_writer.finish();

            pdf.stream(*content_id, &draw_page(page, page_height));
            tracker.advance(Some(page.frame_number()));
        }
        tracker.finish();

        let bytes = pdf.finish();
        log::debug!(
            "Rendered {} page(s) into {} byte(s) of PDF",
            document.len(),
            bytes.len()
        );
        bytes
    }

    /// Render `document` and write it to `path`.
    ///
    /// # Errors
    ///
    /// [`FlipbookError::IoError`] if the file cannot be written.
    pub fn save<P: AsRef<Path>>(&self, document: &Document, path: P) -> Result<(), FlipbookError> {
        fs::write(path.as_ref(), self.to_pdf_bytes(document))?;
        log::info!(
            "Wrote {} page(s) to {}",
            document.len(),
            path.as_ref().display()
        );
        Ok(())
    }
}

/// Content stream drawing the page's image at its placement.
fn draw_page(page: &Page, page_height: f32) -> Vec<u8> {
    let placement = page.placement();
    let width = millimetres_to_points(placement.width);
    let height = millimetres_to_points(placement.height);
    let x = millimetres_to_points(placement.x);
    // PDF user space grows upwards from the bottom edge.
    let y = page_height - millimetres_to_points(placement.y) - height;

    let mut content = Content::new();
    content.save_state();
    content.transform([width, 0.0, 0.0, height, x, y]);
    content.x_object(IMAGE_NAME);
    content.restore_state();
    content.finish()
}
