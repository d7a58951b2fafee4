//! Multi-format text extraction for uploaded documents.
//!
//! Upload handlers supply bytes + filename; this module returns the canonical
//! text (and an HTML variant where the format warrants one) that the
//! alignment pipeline treats as ground truth for locating quotations.

use std::io::Read;

use crate::models::{ContentKind, DocumentType};

/// Maximum decompressed bytes to read from a single ZIP entry (zip-bomb
/// protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// Extraction error. No panic; upload marks the document as failed.
#[derive(Debug)]
pub enum ExtractError {
    UnsupportedType(String),
    Pdf(String),
    Ooxml(String),
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::UnsupportedType(ext) => {
                write!(f, "unsupported file type: {}", ext)
            }
            ExtractError::Pdf(e) => write!(f, "PDF extraction failed: {}", e),
            ExtractError::Ooxml(e) => write!(f, "OOXML extraction failed: {}", e),
        }
    }
}

impl std::error::Error for ExtractError {}

/// Result of extracting an uploaded file.
#[derive(Debug, Clone)]
pub struct ExtractedContent {
    /// Plain-text variant. May be empty for `PdfNative` documents whose text
    /// layer could not be read (degraded mode: no highlighting possible).
    pub text: String,
    /// HTML variant, produced for word-processor formats.
    pub html: Option<String>,
    pub kind: ContentKind,
    /// Structural page count when the format carries one.
    pub page_count: Option<u32>,
    /// Original bytes, kept for formats rendered natively.
    pub binary: Option<Vec<u8>>,
}

/// Lowercased extension of a filename, without the dot. Empty if none.
pub fn file_extension(filename: &str) -> String {
    match filename.rfind('.') {
        Some(idx) => filename[idx + 1..].to_lowercase(),
        None => String::new(),
    }
}

/// Detect the declared document type from the filename.
pub fn detect_type(filename: &str) -> Result<DocumentType, ExtractError> {
    let ext = file_extension(filename);
    DocumentType::from_extension(&ext).ok_or(ExtractError::UnsupportedType(ext))
}

/// Extract content from uploaded bytes according to the declared type.
pub fn extract_content(
    bytes: &[u8],
    doc_type: DocumentType,
) -> Result<ExtractedContent, ExtractError> {
    match doc_type {
        DocumentType::Txt => Ok(extract_txt(bytes)),
        DocumentType::Pdf => extract_pdf(bytes),
        DocumentType::Docx => extract_docx(bytes),
        DocumentType::Pptx => extract_pptx(bytes),
    }
}

fn extract_txt(bytes: &[u8]) -> ExtractedContent {
    ExtractedContent {
        text: String::from_utf8_lossy(bytes).into_owned(),
        html: None,
        kind: ContentKind::Text,
        page_count: None,
        binary: None,
    }
}

/// PDFs are rendered natively, so the original bytes travel with the
/// document. The text layer is a best-effort proxy for quotation location;
/// the page count comes from the document structure.
fn extract_pdf(bytes: &[u8]) -> Result<ExtractedContent, ExtractError> {
    let text = pdf_extract::extract_text_from_mem(bytes).ok();
    let page_count = lopdf::Document::load_mem(bytes)
        .ok()
        .map(|doc| doc.get_pages().len() as u32);

    if text.is_none() && page_count.is_none() {
        return Err(ExtractError::Pdf(
            "file is not parseable as a PDF".to_string(),
        ));
    }

    Ok(ExtractedContent {
        text: text.unwrap_or_default(),
        html: None,
        kind: ContentKind::PdfNative,
        page_count,
        binary: Some(bytes.to_vec()),
    })
}

fn read_zip_entry_bounded(
    archive: &mut zip::ZipArchive<std::io::Cursor<&[u8]>>,
    name: &str,
    max_bytes: u64,
) -> Result<Vec<u8>, ExtractError> {
    let entry = archive
        .by_name(name)
        .map_err(|e| ExtractError::Ooxml(e.to_string()))?;
    let mut out = Vec::new();
    entry
        .take(max_bytes)
        .read_to_end(&mut out)
        .map_err(|e| ExtractError::Ooxml(e.to_string()))?;
    if out.len() as u64 >= max_bytes {
        return Err(ExtractError::Ooxml(format!(
            "ZIP entry {} exceeds size limit ({} bytes)",
            name, max_bytes
        )));
    }
    Ok(out)
}

fn extract_docx(bytes: &[u8]) -> Result<ExtractedContent, ExtractError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| ExtractError::Ooxml(e.to_string()))?;
    let doc_xml = read_zip_entry_bounded(&mut archive, "word/document.xml", MAX_XML_ENTRY_BYTES)?;
    let paragraphs = extract_w_paragraphs(&doc_xml)?;

    let text = paragraphs.join("\n\n");
    let html = paragraphs
        .iter()
        .map(|p| format!("<p>{}</p>", escape_html(p)))
        .collect::<Vec<_>>()
        .join("\n");

    Ok(ExtractedContent {
        text,
        html: Some(html),
        kind: ContentKind::Html,
        page_count: None,
        binary: None,
    })
}

/// Collect `<w:t>` runs grouped by their enclosing `<w:p>` paragraph.
fn extract_w_paragraphs(xml: &[u8]) -> Result<Vec<String>, ExtractError> {
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => {
                if e.local_name().as_ref() == b"t" {
                    if let Ok(quick_xml::events::Event::Text(te)) = reader.read_event_into(&mut buf)
                    {
                        current.push_str(te.unescape().unwrap_or_default().as_ref());
                    }
                }
            }
            Ok(quick_xml::events::Event::End(e)) => {
                if e.local_name().as_ref() == b"p" && !current.is_empty() {
                    paragraphs.push(std::mem::take(&mut current));
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(ExtractError::Ooxml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    if !current.is_empty() {
        paragraphs.push(current);
    }
    Ok(paragraphs)
}

fn extract_pptx(bytes: &[u8]) -> Result<ExtractedContent, ExtractError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| ExtractError::Ooxml(e.to_string()))?;
    let mut slide_names: Vec<String> = archive
        .file_names()
        .filter(|n| n.starts_with("ppt/slides/slide") && n.ends_with(".xml"))
        .map(|s| s.to_string())
        .collect();
    slide_names.sort_by_key(|name| {
        name.trim_start_matches("ppt/slides/slide")
            .trim_end_matches(".xml")
            .parse::<u32>()
            .unwrap_or(u32::MAX)
    });
    let slide_count = slide_names.len() as u32;
    let mut slides = Vec::new();
    for name in slide_names {
        let xml = read_zip_entry_bounded(&mut archive, &name, MAX_XML_ENTRY_BYTES)?;
        let text = extract_a_t_elements(&xml)?;
        if !text.is_empty() {
            slides.push(text);
        }
    }
    Ok(ExtractedContent {
        text: slides.join("\n\n"),
        html: None,
        kind: ContentKind::Text,
        page_count: (slide_count > 0).then_some(slide_count),
        binary: None,
    })
}

fn extract_a_t_elements(xml: &[u8]) -> Result<String, ExtractError> {
    let mut out = String::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => {
                if e.local_name().as_ref() == b"t" {
                    if let Ok(quick_xml::events::Event::Text(te)) = reader.read_event_into(&mut buf)
                    {
                        if !out.is_empty() {
                            out.push(' ');
                        }
                        out.push_str(te.unescape().unwrap_or_default().as_ref());
                    }
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(ExtractError::Ooxml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn minimal_docx(paragraphs: &[&str]) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
            zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
                .unwrap();
            let body = paragraphs
                .iter()
                .map(|p| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", p))
                .collect::<String>();
            let xml = format!(
                "<?xml version=\"1.0\"?><w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"><w:body>{}</w:body></w:document>",
                body
            );
            zip.write_all(xml.as_bytes()).unwrap();
            zip.finish().unwrap();
        }
        buf
    }

    fn minimal_pptx(slides: &[&str]) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
            for (i, text) in slides.iter().enumerate() {
                zip.start_file(
                    format!("ppt/slides/slide{}.xml", i + 1),
                    zip::write::SimpleFileOptions::default(),
                )
                .unwrap();
                let xml = format!(
                    "<?xml version=\"1.0\"?><p:sld xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\"><a:t>{}</a:t></p:sld>",
                    text
                );
                zip.write_all(xml.as_bytes()).unwrap();
            }
            zip.finish().unwrap();
        }
        buf
    }

    #[test]
    fn detects_type_from_extension() {
        assert_eq!(detect_type("Report.PDF").unwrap(), DocumentType::Pdf);
        assert_eq!(detect_type("notes.txt").unwrap(), DocumentType::Txt);
        assert!(matches!(
            detect_type("archive.tar.gz"),
            Err(ExtractError::UnsupportedType(_))
        ));
        assert!(matches!(
            detect_type("no-extension"),
            Err(ExtractError::UnsupportedType(_))
        ));
    }

    #[test]
    fn txt_passes_through() {
        let content = extract_content(b"plain body", DocumentType::Txt).unwrap();
        assert_eq!(content.text, "plain body");
        assert_eq!(content.kind, ContentKind::Text);
        assert!(content.binary.is_none());
    }

    #[test]
    fn invalid_pdf_returns_error() {
        let err = extract_content(b"not a pdf", DocumentType::Pdf).unwrap_err();
        assert!(matches!(err, ExtractError::Pdf(_)));
    }

    #[test]
    fn invalid_zip_returns_error_for_docx() {
        let err = extract_content(b"not a zip", DocumentType::Docx).unwrap_err();
        assert!(matches!(err, ExtractError::Ooxml(_)));
    }

    #[test]
    fn docx_paragraphs_become_text_and_html() {
        let bytes = minimal_docx(&["First paragraph.", "Second &amp; last."]);
        let content = extract_content(&bytes, DocumentType::Docx).unwrap();
        assert_eq!(content.text, "First paragraph.\n\nSecond & last.");
        assert_eq!(content.kind, ContentKind::Html);
        let html = content.html.unwrap();
        assert!(html.contains("<p>First paragraph.</p>"));
        assert!(html.contains("Second &amp; last."));
    }

    #[test]
    fn pptx_slides_in_numeric_order() {
        let bytes = minimal_pptx(&["Slide one", "Slide two", "Slide three"]);
        let content = extract_content(&bytes, DocumentType::Pptx).unwrap();
        assert_eq!(content.text, "Slide one\n\nSlide two\n\nSlide three");
        assert_eq!(content.page_count, Some(3));
    }
}
