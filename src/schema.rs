//! Extraction result types and the caller-facing response envelope.

use serde::{Deserialize, Serialize};

/// How the text of a document was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMethod {
    /// Read straight from the PDF text layer.
    Direct,
    /// Recognized from rasterized page images.
    Ocr,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMethod::Direct => "direct",
            ExtractionMethod::Ocr => "ocr",
        }
    }
}

/// A table pulled from the text layer: rows of cell strings.
/// Serialized as a bare 2D array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Table {
    pub rows: Vec<Vec<String>>,
}

/// Document-level metadata recorded with every result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Page count of the document, whether or not any text was found.
    pub pages: u32,
    /// Basename of the processed file.
    pub title: String,
    pub extraction_method: ExtractionMethod,
}

/// Assembled output of one pipeline run. Immutable once built; ownership
/// passes to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub text: String,
    /// Populated by the direct path only; the optical path never produces tables.
    pub tables: Vec<Table>,
    pub metadata: DocumentMetadata,
    /// Heuristic quality score in [0, 100].
    pub accuracy: f64,
}

/// JSON envelope returned by every processing endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessEnvelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<DocumentMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProcessEnvelope {
    pub fn ok(document_id: String, metadata: DocumentMetadata) -> Self {
        Self {
            success: true,
            document_id: Some(document_id),
            metadata: Some(metadata),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            document_id: None,
            metadata: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ExtractionMethod::Ocr).unwrap(),
            "\"ocr\""
        );
        assert_eq!(
            serde_json::to_string(&ExtractionMethod::Direct).unwrap(),
            "\"direct\""
        );
    }

    #[test]
    fn test_table_serializes_as_grid() {
        let table = Table {
            rows: vec![
                vec!["Name".to_string(), "Age".to_string()],
                vec!["Alice".to_string(), "30".to_string()],
            ],
        };
        assert_eq!(
            serde_json::to_string(&table).unwrap(),
            r#"[["Name","Age"],["Alice","30"]]"#
        );
    }

    #[test]
    fn test_envelope_omits_absent_fields() {
        let envelope = ProcessEnvelope::failed("boom");
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "boom");
        assert!(json.get("documentId").is_none());
        assert!(json.get("metadata").is_none());
    }

    #[test]
    fn test_success_envelope_carries_document_id() {
        let metadata = DocumentMetadata {
            pages: 2,
            title: "scan.pdf".to_string(),
            extraction_method: ExtractionMethod::Ocr,
        };
        let envelope = ProcessEnvelope::ok("doc_123".to_string(), metadata);
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["documentId"], "doc_123");
        assert_eq!(json["metadata"]["extraction_method"], "ocr");
        assert!(json.get("error").is_none());
    }
}
