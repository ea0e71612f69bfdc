//! pdfium-backed page rasterization.

use super::PageRasterizer;
use crate::error::ExtractError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::debug;

/// PDF points per inch.
const POINTS_PER_INCH: f32 = 72.0;

/// Renders pages with pdfium at a fixed DPI.
///
/// A fresh pdfium binding is created per document, which keeps the renderer
/// free of shared state across concurrent pipeline runs.
pub struct PdfiumRasterizer {
    dpi: u32,
    library_dir: Option<PathBuf>,
}

impl PdfiumRasterizer {
    pub fn new(dpi: u32, library_dir: Option<PathBuf>) -> Self {
        Self { dpi, library_dir }
    }

    fn bind(&self) -> Result<Pdfium, ExtractError> {
        let bindings = match &self.library_dir {
            Some(dir) => {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
                    .or_else(|_| Pdfium::bind_to_system_library())
            }
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| ExtractError::Rasterization(format!("pdfium unavailable: {}", e)))?;

        Ok(Pdfium::new(bindings))
    }
}

impl PageRasterizer for PdfiumRasterizer {
    fn for_each_page(
        &self,
        pdf_path: &Path,
        visit: &mut dyn FnMut(DynamicImage) -> Result<(), ExtractError>,
    ) -> Result<(), ExtractError> {
        let pdfium = self.bind()?;
        let document = pdfium.load_pdf_from_file(pdf_path, None).map_err(|e| {
            ExtractError::Rasterization(format!("{}: {}", pdf_path.display(), e))
        })?;

        let config = PdfRenderConfig::new().scale_page_by_factor(self.dpi as f32 / POINTS_PER_INCH);
        debug!(
            "rasterizing {} pages at {} dpi",
            document.pages().len(),
            self.dpi
        );

        for page in document.pages().iter() {
            let bitmap = page
                .render_with_config(&config)
                .map_err(|e| ExtractError::Rasterization(format!("page render failed: {}", e)))?;
            visit(bitmap.as_image())?;
        }

        Ok(())
    }
}
