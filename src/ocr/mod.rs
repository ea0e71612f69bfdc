//! Optical fallback extraction.
//!
//! [`OcrFallbackExtractor`] walks a document's pages in order, conditions
//! each raster through the [`Preprocessor`](crate::preprocess::Preprocessor),
//! and hands it to a recognition engine. The page source and the recognizer
//! are trait seams so the loop can be exercised without the native pdfium
//! and tesseract libraries.

pub mod raster;
pub mod tesseract;

use crate::error::ExtractError;
use crate::preprocess::Preprocessor;
use image::{DynamicImage, GrayImage};
use std::path::Path;
use tracing::{debug, info};

/// Renders PDF pages to raster images, one page at a time, in document order.
pub trait PageRasterizer {
    /// Invoke `visit` for every page in order. A page that fails to render
    /// aborts the walk.
    fn for_each_page(
        &self,
        pdf_path: &Path,
        visit: &mut dyn FnMut(DynamicImage) -> Result<(), ExtractError>,
    ) -> Result<(), ExtractError>;
}

/// Image-based text recognition with a fixed configuration.
pub trait TextRecognizer {
    fn name(&self) -> &str;
    fn recognize(&self, image: &GrayImage) -> Result<String, ExtractError>;
}

/// Fallback used when a document has no usable text layer.
pub struct OcrFallbackExtractor<R, T> {
    rasterizer: R,
    preprocessor: Preprocessor,
    recognizer: T,
}

impl<R: PageRasterizer, T: TextRecognizer> OcrFallbackExtractor<R, T> {
    pub fn new(rasterizer: R, preprocessor: Preprocessor, recognizer: T) -> Self {
        Self {
            rasterizer,
            preprocessor,
            recognizer,
        }
    }

    /// Recognize every page and concatenate the per-page text with newline
    /// separators, page order preserved. The first failing page fails the
    /// whole document; there is no partial-page retry.
    pub fn extract(&self, pdf_path: &Path) -> Result<String, ExtractError> {
        info!(
            "optical fallback ({}): {}",
            self.recognizer.name(),
            pdf_path.display()
        );

        let mut text = String::new();
        let mut page_index = 0u32;

        self.rasterizer.for_each_page(pdf_path, &mut |page| {
            page_index += 1;
            let conditioned = self.preprocessor.preprocess(&page)?;
            let page_text = self.recognizer.recognize(&conditioned)?;
            debug!("page {}: {} chars recognized", page_index, page_text.len());
            text.push_str(&page_text);
            text.push('\n');
            // Raster and conditioned image drop here, before the next page
            // renders, so peak memory stays bounded to one page.
            Ok(())
        })?;

        Ok(text)
    }
}
