//! Tesseract-backed recognition.

use super::TextRecognizer;
use crate::error::ExtractError;
use image::GrayImage;
use tesseract::{PageSegMode, Tesseract};

/// Recognizer with a fixed language and page-segmentation mode.
///
/// All engine configuration is explicit construction input; nothing is read
/// from process-wide state. A fresh engine is spun up per page, so one
/// recognizer can serve concurrent pipeline runs.
pub struct TesseractRecognizer {
    language: String,
    page_seg_mode: u32,
    datapath: Option<String>,
}

impl TesseractRecognizer {
    pub fn new(language: impl Into<String>, page_seg_mode: u32, datapath: Option<String>) -> Self {
        Self {
            language: language.into(),
            page_seg_mode,
            datapath,
        }
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn recognize(&self, image: &GrayImage) -> Result<String, ExtractError> {
        let width = image.width() as i32;
        let height = image.height() as i32;

        let mut engine = Tesseract::new(self.datapath.as_deref(), Some(&self.language))
            .map_err(|e| ExtractError::Recognition(format!("engine init: {}", e)))?
            .set_variable("preserve_interword_spaces", "1")
            .map_err(|e| ExtractError::Recognition(format!("engine config: {}", e)))?
            .set_frame(image.as_raw(), width, height, 1, width)
            .map_err(|e| ExtractError::Recognition(format!("frame load: {}", e)))?;

        engine.set_page_seg_mode(page_seg_mode_from(self.page_seg_mode));

        engine
            .get_text()
            .map_err(|e| ExtractError::Recognition(format!("recognition: {}", e)))
    }
}

/// Map a numeric segmentation mode to the engine enum. Unknown values fall
/// back to full automatic segmentation.
fn page_seg_mode_from(mode: u32) -> PageSegMode {
    match mode {
        0 => PageSegMode::PsmOsdOnly,
        1 => PageSegMode::PsmAutoOsd,
        2 => PageSegMode::PsmAutoOnly,
        3 => PageSegMode::PsmAuto,
        4 => PageSegMode::PsmSingleColumn,
        5 => PageSegMode::PsmSingleBlockVertText,
        6 => PageSegMode::PsmSingleBlock,
        7 => PageSegMode::PsmSingleLine,
        8 => PageSegMode::PsmSingleWord,
        9 => PageSegMode::PsmCircleWord,
        10 => PageSegMode::PsmSingleChar,
        11 => PageSegMode::PsmSparseText,
        12 => PageSegMode::PsmSparseTextOsd,
        13 => PageSegMode::PsmRawLine,
        _ => PageSegMode::PsmAuto,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mode_is_single_block() {
        assert!(matches!(
            page_seg_mode_from(6),
            PageSegMode::PsmSingleBlock
        ));
    }

    #[test]
    fn test_unknown_mode_falls_back_to_auto() {
        assert!(matches!(page_seg_mode_from(99), PageSegMode::PsmAuto));
    }
}
