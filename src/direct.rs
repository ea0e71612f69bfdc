//! Direct text-layer extraction.
//!
//! Reads text and tabular blocks straight from the PDF content stream,
//! page by page, without rendering any pixels.

use crate::error::ExtractError;
use crate::schema::Table;
use lopdf::Document;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use tracing::debug;

/// Output of the direct path.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectExtraction {
    /// Per-page text joined with newline separators, in document order.
    pub text: String,
    /// All tables found, page order preserved.
    pub tables: Vec<Table>,
    /// Page count of the document, whether or not any text was found.
    pub page_count: u32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DirectTextExtractor;

impl DirectTextExtractor {
    pub fn extract(&self, pdf_path: &Path) -> Result<DirectExtraction, ExtractError> {
        let doc = Document::load(pdf_path)
            .map_err(|e| ExtractError::DocumentOpen(format!("{}: {}", pdf_path.display(), e)))?;

        let pages = doc.get_pages();
        let page_count = pages.len() as u32;

        let mut text = String::new();
        let mut tables = Vec::new();

        for (&page_num, _) in &pages {
            // A page whose text layer fails to decode contributes nothing;
            // only container-level failures abort the document.
            let page_text = doc.extract_text(&[page_num]).unwrap_or_default();
            if page_text.is_empty() {
                continue;
            }
            text.push_str(&page_text);
            text.push('\n');
            tables.extend(detect_tables(&page_text));
        }

        debug!(
            "direct extraction: {} pages, {} chars, {} tables",
            page_count,
            text.len(),
            tables.len()
        );

        Ok(DirectExtraction {
            text,
            tables,
            page_count,
        })
    }
}

/// Extract contiguous blocks of column-aligned rows from page text.
///
/// A table block is a run of at least two consecutive lines that each split
/// into two or more cells on tabs or runs of two-plus spaces, which is the
/// layout the text layer preserves for ruled tables.
fn detect_tables(page_text: &str) -> Vec<Table> {
    static CELL_SPLIT: OnceLock<Regex> = OnceLock::new();
    let cell_split = CELL_SPLIT.get_or_init(|| Regex::new(r"\t+| {2,}").unwrap());

    let mut tables = Vec::new();
    let mut current: Vec<Vec<String>> = Vec::new();

    for line in page_text.lines() {
        let cells: Vec<String> = cell_split
            .split(line.trim())
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();

        if cells.len() >= 2 {
            current.push(cells);
        } else {
            flush_table(&mut current, &mut tables);
        }
    }
    flush_table(&mut current, &mut tables);

    tables
}

/// A block needs at least two rows to count as a table.
fn flush_table(current: &mut Vec<Vec<String>>, tables: &mut Vec<Table>) {
    if current.len() >= 2 {
        tables.push(Table {
            rows: std::mem::take(current),
        });
    } else {
        current.clear();
    }
}
