//! PDF text extraction: page-by-page, in page order, one newline after each page.

use lopdf::Document;
use tracing::warn;

use super::ExtractionError;

/// Extracts the text of every page in order 1..N.
///
/// Pages are read individually with `lopdf`. If that yields no text at all
/// (fonts `lopdf` cannot decode), the whole document is retried with
/// `pdf-extract`, which handles more encodings but does not keep page breaks.
pub fn extract_pdf_text(file_name: &str, bytes: &[u8]) -> Result<String, ExtractionError> {
    let doc = Document::load_mem(bytes).map_err(|e| ExtractionError::Pdf {
        file_name: file_name.to_string(),
        reason: e.to_string(),
    })?;

    // BTreeMap keyed by 1-based page number, so iteration is page order.
    let pages = doc.get_pages();
    let mut page_texts = Vec::with_capacity(pages.len());
    for page_number in pages.keys() {
        match doc.extract_text(&[*page_number]) {
            Ok(text) => page_texts.push(text),
            Err(e) => {
                warn!("'{file_name}': failed to extract text from page {page_number}: {e}");
                page_texts.push(String::new());
            }
        }
    }

    let joined = join_pages(&page_texts);
    if !joined.trim().is_empty() {
        return Ok(joined);
    }

    pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractionError::Pdf {
        file_name: file_name.to_string(),
        reason: e.to_string(),
    })
}

/// Concatenates page texts, each followed by exactly one `\n`.
pub fn join_pages<S: AsRef<str>>(pages: &[S]) -> String {
    let mut out = String::new();
    for page in pages {
        out.push_str(page.as_ref().trim_end_matches(['\n', '\r']));
        out.push('\n');
    }
    out
}
