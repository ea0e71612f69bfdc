//! Heuristic accuracy score for an assembled extraction result.
//!
//! A fixed linear blend of ad hoc constants, kept for reproducibility. It
//! is a rough quality signal, not a calibrated confidence measure.

use crate::schema::ExtractionMethod;

/// Base confidence when the text came from optical recognition.
const OCR_METHOD_SCORE: f64 = 0.85;
/// Base confidence for direct text-layer extraction.
const DIRECT_METHOD_SCORE: f64 = 0.95;
/// Awarded when the text shows some line structure.
const STRUCTURE_SCORE: f64 = 0.90;

/// Average the qualifying components and return a percentage rounded to
/// two decimals.
///
/// Components: text length normalized against 1000 chars (only when the
/// trimmed text is non-empty), the per-method constant (always), and the
/// structure constant (only when the text has more than 5 lines).
pub fn estimate(text: &str, method: ExtractionMethod) -> f64 {
    let mut components: Vec<f64> = Vec::new();

    let trimmed_len = text.trim().chars().count();
    if trimmed_len > 0 {
        components.push((trimmed_len as f64 / 1000.0).min(1.0));
    }

    components.push(match method {
        ExtractionMethod::Ocr => OCR_METHOD_SCORE,
        ExtractionMethod::Direct => DIRECT_METHOD_SCORE,
    });

    if text.split('\n').count() > 5 {
        components.push(STRUCTURE_SCORE);
    }

    if components.is_empty() {
        // Unreachable in practice: the method component always qualifies.
        // Kept so an empty component set still has a defined value.
        return 0.0;
    }

    let mean = components.iter().sum::<f64>() / components.len() as f64;
    (mean * 100.0 * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_direct_text_scores_method_only() {
        // Zero-length text has no length component and at most one line,
        // leaving only the method constant.
        assert_eq!(estimate("", ExtractionMethod::Direct), 95.0);
        assert_eq!(estimate("", ExtractionMethod::Ocr), 85.0);
    }

    #[test]
    fn test_length_component_saturates_at_1000_chars() {
        let text = "a".repeat(1000);
        // (1.0 + 0.95) / 2 = 0.975
        assert_eq!(estimate(&text, ExtractionMethod::Direct), 97.5);
    }

    #[test]
    fn test_length_component_halfway() {
        let text = "a".repeat(500);
        // (0.5 + 0.95) / 2 = 0.725
        assert_eq!(estimate(&text, ExtractionMethod::Direct), 72.5);
    }

    #[test]
    fn test_long_structured_direct_text() {
        // >= 1000 chars across more than 5 lines:
        // (1.0 + 0.95 + 0.90) / 3 = 0.95
        let text = "x".repeat(200).to_string() + "\n1\n2\n3\n4\n5\n" + &"y".repeat(1000);
        assert!(text.split('\n').count() > 5);
        assert_eq!(estimate(&text, ExtractionMethod::Direct), 95.0);
    }

    #[test]
    fn test_line_count_uses_raw_text() {
        // Trailing newline still counts toward the split, mirroring a
        // page-concatenated document.
        let text = "one\ntwo\nthree\nfour\nfive\nsix\n";
        assert_eq!(text.split('\n').count(), 7);
        let score = estimate(text, ExtractionMethod::Ocr);
        // Components: len 27/1000, 0.85, 0.90.
        let expected = (((27.0 / 1000.0 + 0.85 + 0.90) / 3.0) * 100.0 * 100.0_f64).round() / 100.0;
        assert_eq!(score, expected);
    }

    #[test]
    fn test_deterministic() {
        let text = "PAGE ONE\nPAGE TWO\n";
        let first = estimate(text, ExtractionMethod::Ocr);
        let second = estimate(text, ExtractionMethod::Ocr);
        assert_eq!(first, second);
    }
}
