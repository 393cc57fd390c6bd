//! Résumé text extraction.
//!
//! Text-based PDFs only. Scanned documents without a text layer extract to an
//! empty string; anything that is not a readable PDF is rejected.
use std::panic::{self, AssertUnwindSafe};

use thiserror::Error;
use tracing::{debug, warn};

const PDF_MAGIC: &[u8] = b"%PDF-";

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Unsupported document: {0}")]
    Unsupported(String),
}

/// Extracts plain text from PDF bytes.
///
/// This is CPU-bound; async callers should run it through `spawn_blocking`.
pub fn extract(bytes: &[u8]) -> Result<String, PdfError> {
    if !looks_like_pdf(bytes) {
        return Err(PdfError::Unsupported(
            "file is not a PDF document".to_string(),
        ));
    }

    // pdf-extract panics on some malformed inputs instead of returning an error.
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem(bytes)
    }));

    let raw = match result {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            warn!("PDF extraction failed: {e}");
            return Err(PdfError::Unsupported(format!("unreadable PDF: {e}")));
        }
        Err(_) => {
            warn!("PDF extraction panicked on malformed input");
            return Err(PdfError::Unsupported(
                "corrupted PDF document".to_string(),
            ));
        }
    };

    let text = normalize(&raw);
    debug!(
        bytes = bytes.len(),
        chars = text.len(),
        "Extracted resume text"
    );
    Ok(text)
}

fn looks_like_pdf(bytes: &[u8]) -> bool {
    // The header may be preceded by a little junk; readers accept it within the first 1KB.
    let window = &bytes[..bytes.len().min(1024)];
    window
        .windows(PDF_MAGIC.len())
        .any(|w| w == PDF_MAGIC)
}

/// Turns page breaks into newlines, strips trailing whitespace and collapses long blank runs.
fn normalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut blank_run = 0;

    for line in raw.replace('\x0C', "\n").lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }

    out.trim().to_string()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    /// Builds a single-page PDF that draws each line with Helvetica.
    pub(crate) fn pdf_with_lines(lines: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        });

        let mut operations = Vec::new();
        for (i, line) in lines.iter().enumerate() {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
            operations.push(Operation::new(
                "Td",
                vec![72.into(), (720 - 20 * i as i64).into()],
            ));
            operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
            operations.push(Operation::new("ET", vec![]));
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_extracts_text_from_valid_pdf() {
        let bytes = pdf_with_lines(&["Jane Doe", "Python Developer"]);
        let text = extract(&bytes).unwrap();
        assert!(text.contains("Python Developer"), "got: {text:?}");
    }

    #[test]
    fn test_pdf_without_text_layer_is_empty() {
        let bytes = pdf_with_lines(&[]);
        assert_eq!(extract(&bytes).unwrap(), "");
    }

    #[test]
    fn test_non_pdf_rejected() {
        let err = extract(b"PK\x03\x04 this is a zip archive").unwrap_err();
        assert!(matches!(err, PdfError::Unsupported(_)));
    }

    #[test]
    fn test_corrupted_pdf_rejected() {
        let mut blob = b"%PDF-1.7\n".to_vec();
        blob.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef, 0x00, 0xff, 0x13, 0x37]);
        let err = extract(&blob).unwrap_err();
        assert!(matches!(err, PdfError::Unsupported(_)));
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(extract(&[]).is_err());
    }

    #[test]
    fn test_normalize_collapses_blank_runs_and_page_breaks() {
        let raw = "\n\nSkills  \n\n\n\nRust\x0CExperience\n";
        assert_eq!(normalize(raw), "Skills\n\nRust\nExperience");
    }
}
