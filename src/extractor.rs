//! Extraction pipeline orchestrator.
//!
//! Runs the direct text-layer path first; when that yields nothing after
//! trimming, runs the optical fallback. Both paths sit behind small traits
//! so the selection logic can be tested with instrumented stand-ins.

use crate::accuracy;
use crate::config::ExtractionSettings;
use crate::direct::{DirectExtraction, DirectTextExtractor};
use crate::error::ExtractError;
use crate::ocr::raster::PdfiumRasterizer;
use crate::ocr::tesseract::TesseractRecognizer;
use crate::ocr::{OcrFallbackExtractor, PageRasterizer, TextRecognizer};
use crate::preprocess::Preprocessor;
use crate::schema::{DocumentMetadata, ExtractionMethod, ExtractionResult};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// The direct text-layer path.
pub trait DirectSource {
    fn extract(&self, pdf_path: &Path) -> Result<DirectExtraction, ExtractError>;
}

impl DirectSource for DirectTextExtractor {
    fn extract(&self, pdf_path: &Path) -> Result<DirectExtraction, ExtractError> {
        DirectTextExtractor::extract(self, pdf_path)
    }
}

/// The optical fallback path.
pub trait FallbackSource {
    fn extract(&self, pdf_path: &Path) -> Result<String, ExtractError>;
}

impl<R: PageRasterizer, T: TextRecognizer> FallbackSource for OcrFallbackExtractor<R, T> {
    fn extract(&self, pdf_path: &Path) -> Result<String, ExtractError> {
        OcrFallbackExtractor::extract(self, pdf_path)
    }
}

/// Direct-then-fallback pipeline producing one immutable result per document.
pub struct Extractor<D, F> {
    direct: D,
    fallback: F,
}

/// The production pipeline wiring.
pub type PipelineExtractor =
    Extractor<DirectTextExtractor, OcrFallbackExtractor<PdfiumRasterizer, TesseractRecognizer>>;

impl PipelineExtractor {
    /// Wire the pipeline from explicit settings.
    pub fn from_settings(settings: &ExtractionSettings) -> Self {
        let rasterizer = PdfiumRasterizer::new(
            settings.raster_dpi,
            settings.pdfium_lib_dir.clone().map(PathBuf::from),
        );
        let preprocessor =
            Preprocessor::new(settings.threshold_window, settings.threshold_constant);
        let recognizer = TesseractRecognizer::new(
            &settings.ocr_language,
            settings.page_seg_mode,
            settings.tessdata_dir.clone(),
        );

        Extractor::new(
            DirectTextExtractor,
            OcrFallbackExtractor::new(rasterizer, preprocessor, recognizer),
        )
    }
}

impl<D: DirectSource, F: FallbackSource> Extractor<D, F> {
    pub fn new(direct: D, fallback: F) -> Self {
        Self { direct, fallback }
    }

    pub fn extract(&self, pdf_path: &Path) -> Result<ExtractionResult, ExtractError> {
        let DirectExtraction {
            text,
            tables,
            page_count,
        } = self.direct.extract(pdf_path)?;

        // The one branch in the pipeline, binary and irreversible: once the
        // fallback is chosen, direct-path tables are discarded, never merged.
        let (method, text, tables) = if text.trim().is_empty() {
            info!(
                "no usable text layer in {}, falling back to optical recognition",
                pdf_path.display()
            );
            let ocr_text = self.fallback.extract(pdf_path)?;
            (ExtractionMethod::Ocr, ocr_text, Vec::new())
        } else {
            (ExtractionMethod::Direct, text, tables)
        };

        let title = pdf_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let metadata = DocumentMetadata {
            pages: page_count,
            title,
            extraction_method: method,
        };
        let accuracy = accuracy::estimate(&text, method);

        debug!(
            "extraction complete: method={}, {} pages, accuracy={}",
            method.as_str(),
            page_count,
            accuracy
        );

        Ok(ExtractionResult {
            text,
            tables,
            metadata,
            accuracy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Table;
    use crate::testutil::pdf_with_pages;
    use std::cell::Cell;

    struct StubDirect {
        text: String,
        tables: Vec<Table>,
        page_count: u32,
        calls: Cell<u32>,
    }

    impl StubDirect {
        fn with_text(text: &str) -> Self {
            Self {
                text: text.to_string(),
                tables: Vec::new(),
                page_count: 1,
                calls: Cell::new(0),
            }
        }
    }

    impl DirectSource for StubDirect {
        fn extract(&self, _pdf_path: &Path) -> Result<DirectExtraction, ExtractError> {
            self.calls.set(self.calls.get() + 1);
            Ok(DirectExtraction {
                text: self.text.clone(),
                tables: self.tables.clone(),
                page_count: self.page_count,
            })
        }
    }

    struct StubFallback {
        text: String,
        calls: Cell<u32>,
        fail: bool,
    }

    impl StubFallback {
        fn with_text(text: &str) -> Self {
            Self {
                text: text.to_string(),
                calls: Cell::new(0),
                fail: false,
            }
        }
    }

    impl FallbackSource for StubFallback {
        fn extract(&self, _pdf_path: &Path) -> Result<String, ExtractError> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                return Err(ExtractError::Recognition("engine unavailable".to_string()));
            }
            Ok(self.text.clone())
        }
    }

    fn sample_table() -> Table {
        Table {
            rows: vec![
                vec!["Name".to_string(), "Qty".to_string()],
                vec!["Widget".to_string(), "2".to_string()],
            ],
        }
    }

    #[test]
    fn test_text_layer_present_skips_fallback() {
        let mut direct = StubDirect::with_text("Hello from the text layer");
        direct.tables = vec![sample_table()];
        direct.page_count = 4;
        let extractor = Extractor::new(direct, StubFallback::with_text("unused"));

        let result = extractor.extract(Path::new("report.pdf")).unwrap();
        assert_eq!(result.metadata.extraction_method, ExtractionMethod::Direct);
        assert_eq!(result.metadata.pages, 4);
        assert_eq!(result.metadata.title, "report.pdf");
        assert_eq!(result.text, "Hello from the text layer");
        assert_eq!(result.tables, vec![sample_table()]);
        assert_eq!(extractor.fallback.calls.get(), 0);
    }

    #[test]
    fn test_whitespace_only_text_layer_triggers_fallback() {
        let mut direct = StubDirect::with_text(" \n\t \n");
        direct.tables = vec![sample_table()];
        direct.page_count = 2;
        let extractor = Extractor::new(direct, StubFallback::with_text("PAGE ONE\nPAGE TWO\n"));

        let result = extractor.extract(Path::new("scan.pdf")).unwrap();
        assert_eq!(result.metadata.extraction_method, ExtractionMethod::Ocr);
        assert_eq!(result.text, "PAGE ONE\nPAGE TWO\n");
        // Direct-path tables are discarded on the fallback branch.
        assert!(result.tables.is_empty());
        assert_eq!(extractor.fallback.calls.get(), 1);
    }

    #[test]
    fn test_fallback_accuracy_uses_ocr_method_score() {
        let extractor = Extractor::new(
            StubDirect::with_text(""),
            StubFallback::with_text("PAGE ONE\nPAGE TWO\n"),
        );

        let result = extractor.extract(Path::new("scan.pdf")).unwrap();
        // Components: 17 trimmed chars -> 0.017, method 0.85; 3 lines, so
        // no structure component.
        let expected = (((17.0 / 1000.0 + 0.85) / 2.0) * 100.0 * 100.0_f64).round() / 100.0;
        assert!((result.accuracy - expected).abs() < 1e-9);
    }

    #[test]
    fn test_empty_document_is_ocr_with_method_only_accuracy() {
        // Zero pages: the empty text layer routes through the fallback,
        // which recognizes nothing.
        let mut direct = StubDirect::with_text("");
        direct.page_count = 0;
        let extractor = Extractor::new(direct, StubFallback::with_text(""));

        let result = extractor.extract(Path::new("empty.pdf")).unwrap();
        assert_eq!(result.metadata.extraction_method, ExtractionMethod::Ocr);
        assert_eq!(result.metadata.pages, 0);
        assert!(result.text.is_empty());
        assert_eq!(result.accuracy, 85.0);
    }

    #[test]
    fn test_direct_error_propagates() {
        struct FailingDirect;
        impl DirectSource for FailingDirect {
            fn extract(&self, _pdf_path: &Path) -> Result<DirectExtraction, ExtractError> {
                Err(ExtractError::DocumentOpen("not a pdf".to_string()))
            }
        }

        let extractor = Extractor::new(FailingDirect, StubFallback::with_text("unused"));
        let err = extractor.extract(Path::new("broken.pdf")).unwrap_err();
        assert!(matches!(err, ExtractError::DocumentOpen(_)));
        assert_eq!(extractor.fallback.calls.get(), 0);
    }

    #[test]
    fn test_fallback_error_propagates() {
        let mut fallback = StubFallback::with_text("unused");
        fallback.fail = true;
        let extractor = Extractor::new(StubDirect::with_text(""), fallback);

        let err = extractor.extract(Path::new("scan.pdf")).unwrap_err();
        assert!(matches!(err, ExtractError::Recognition(_)));
    }

    #[test]
    fn test_extract_is_idempotent() {
        let extractor = Extractor::new(
            StubDirect::with_text("stable text"),
            StubFallback::with_text("unused"),
        );

        let first = extractor.extract(Path::new("doc.pdf")).unwrap();
        let second = extractor.extract(Path::new("doc.pdf")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_real_direct_path_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let path = pdf_with_pages(dir.path(), "pages.pdf", &["FIRST PAGE", "SECOND PAGE"]);
        let extractor = Extractor::new(DirectTextExtractor, StubFallback::with_text("unused"));

        let result = extractor.extract(&path).unwrap();
        assert_eq!(result.metadata.extraction_method, ExtractionMethod::Direct);
        assert_eq!(result.metadata.pages, 2);
        assert_eq!(result.metadata.title, "pages.pdf");
        let first = result.text.find("FIRST PAGE").unwrap();
        let second = result.text.find("SECOND PAGE").unwrap();
        assert!(first < second);
        assert_eq!(extractor.fallback.calls.get(), 0);
    }

    #[test]
    fn test_real_scanned_pdf_routes_to_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let path = pdf_with_pages(dir.path(), "scanned.pdf", &["", ""]);
        let extractor =
            Extractor::new(DirectTextExtractor, StubFallback::with_text("RECOGNIZED\n"));

        let result = extractor.extract(&path).unwrap();
        assert_eq!(result.metadata.extraction_method, ExtractionMethod::Ocr);
        assert_eq!(result.metadata.pages, 2);
        assert_eq!(result.text, "RECOGNIZED\n");
        assert!(result.tables.is_empty());
        assert_eq!(extractor.fallback.calls.get(), 1);
    }
}
