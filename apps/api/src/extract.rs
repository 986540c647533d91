//! Text Extractor — converts resume documents (PDF, DOCX) into plain text.
//!
//! Dispatch is by filename extension. Legacy `.doc` is recognized but never
//! parsed; callers must convert to DOCX or PDF.

use thiserror::Error;

/// File formats the service recognizes, classified from the extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Pdf,
    Docx,
    Doc,
    Unknown,
}

impl FileType {
    pub fn from_filename(filename: &str) -> Self {
        let lower = filename.to_lowercase();
        if lower.ends_with(".pdf") {
            FileType::Pdf
        } else if lower.ends_with(".docx") {
            FileType::Docx
        } else if lower.ends_with(".doc") {
            FileType::Doc
        } else {
            FileType::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Pdf => "pdf",
            FileType::Docx => "docx",
            FileType::Doc => "doc",
            FileType::Unknown => "unknown",
        }
    }
}

/// Whether the filename carries one of the accepted extensions.
pub fn is_valid_extension(filename: &str) -> bool {
    !matches!(FileType::from_filename(filename), FileType::Unknown)
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Error extracting text from PDF: {0}")]
    Pdf(String),

    #[error("Error extracting text from DOCX: {0}")]
    Docx(String),

    #[error("DOC files (legacy format) are not directly supported. Please convert your file to DOCX or PDF format.")]
    LegacyDoc,

    #[error("Unsupported file type: {0}")]
    Unsupported(String),
}

/// Extracts plain text from a resume document, dispatching on the extension.
pub fn extract_text(content: &[u8], filename: &str) -> Result<String, ExtractError> {
    match FileType::from_filename(filename) {
        FileType::Pdf => extract_pdf(content),
        FileType::Docx => extract_docx(content),
        FileType::Doc => Err(ExtractError::LegacyDoc),
        FileType::Unknown => Err(ExtractError::Unsupported(
            FileType::Unknown.as_str().to_string(),
        )),
    }
}

fn extract_pdf(content: &[u8]) -> Result<String, ExtractError> {
    let text =
        pdf_extract::extract_text_from_mem(content).map_err(|e| ExtractError::Pdf(e.to_string()))?;
    Ok(text.trim().to_string())
}

/// Joins the document's paragraphs with newlines, run text concatenated
/// within each paragraph.
fn extract_docx(content: &[u8]) -> Result<String, ExtractError> {
    let docx = docx_rs::read_docx(content).map_err(|e| ExtractError::Docx(e.to_string()))?;

    let mut paragraphs: Vec<String> = Vec::new();
    for child in docx.document.children.iter() {
        if let docx_rs::DocumentChild::Paragraph(para) = child {
            let mut text = String::new();
            for pc in para.children.iter() {
                if let docx_rs::ParagraphChild::Run(run) = pc {
                    for rc in run.children.iter() {
                        if let docx_rs::RunChild::Text(t) = rc {
                            text.push_str(&t.text);
                        }
                    }
                }
            }
            paragraphs.push(text);
        }
    }

    Ok(paragraphs.join("\n").trim().to_string())
}
