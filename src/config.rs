//! Extraction settings.
//!
//! Every engine knob is an explicit value handed to the extractors at
//! construction. In particular the recognition engine's data path lives
//! here instead of in process-wide engine state.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionSettings {
    /// Recognition language code passed to the OCR engine.
    pub ocr_language: String,
    /// Rendering resolution for the optical path, dots per inch.
    pub raster_dpi: u32,
    /// Page segmentation mode (6 = single uniform block of text).
    pub page_seg_mode: u32,
    /// Adaptive-threshold neighborhood size in pixels. Must be odd.
    pub threshold_window: u32,
    /// Constant subtracted from the local Gaussian mean when thresholding.
    pub threshold_constant: i16,
    /// Tessdata directory override. `None` uses the engine's default path.
    pub tessdata_dir: Option<String>,
    /// Directory holding the pdfium dynamic library. `None` uses the
    /// system-installed library.
    pub pdfium_lib_dir: Option<String>,
    /// Staging directory for uploaded and downloaded PDFs.
    pub upload_dir: String,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            ocr_language: "eng".to_string(),
            raster_dpi: 300,
            page_seg_mode: 6,
            threshold_window: 11,
            threshold_constant: 2,
            tessdata_dir: None,
            pdfium_lib_dir: None,
            upload_dir: "uploads/documents".to_string(),
        }
    }
}

impl ExtractionSettings {
    /// Load settings from a JSON file, falling back to defaults when the
    /// file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No settings file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings: {:?}", path))?;
        let settings: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings: {:?}", path))?;
        settings.validate()?;

        info!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.threshold_window >= 3 && self.threshold_window % 2 == 1,
            "threshold_window must be an odd value of at least 3, got {}",
            self.threshold_window
        );
        anyhow::ensure!(self.raster_dpi > 0, "raster_dpi must be positive");
        Ok(())
    }
}
