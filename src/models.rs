//! Core data models used throughout Sumpane.
//!
//! These types represent the documents, summaries, highlights, and segments
//! that flow through the extraction and alignment pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Declared document type, derived from the uploaded filename extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Pdf,
    Docx,
    Txt,
    Pptx,
}

impl DocumentType {
    /// Map a lowercased filename extension (without the dot) to a type.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "pdf" => Some(DocumentType::Pdf),
            "docx" => Some(DocumentType::Docx),
            "txt" => Some(DocumentType::Txt),
            "pptx" => Some(DocumentType::Pptx),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Pdf => "pdf",
            DocumentType::Docx => "docx",
            DocumentType::Txt => "txt",
            DocumentType::Pptx => "pptx",
        }
    }
}

/// Lifecycle status of a document. `Error` carries a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "message", rename_all = "lowercase")]
pub enum DocumentStatus {
    Uploading,
    Processing,
    Summarizing,
    Completed,
    Error(String),
}

/// How the extracted content should be interpreted downstream.
///
/// `PdfNative` documents keep their original bytes for native rendering;
/// their `text` field is a proxy used for highlight location and may be
/// empty, in which case no highlighting is possible for that document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentKind {
    Text,
    Html,
    PdfNative,
}

/// A document owned by the store. Created on upload, mutated in place when a
/// summary attaches, deleted on request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub name: String,
    pub doc_type: DocumentType,
    /// Size of the uploaded file in bytes.
    pub size: u64,
    /// Page count when the format carries one; estimated otherwise.
    /// `None` when even the estimate is unavailable.
    pub page_count: Option<u32>,
    pub uploaded_at: DateTime<Utc>,
    /// Canonical text content — the ground truth for locating quotations.
    pub content: String,
    /// HTML variant when extraction produced one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    pub content_kind: ContentKind,
    /// Raw bytes for natively rendered formats, base64 in JSON output.
    #[serde(
        with = "base64_bytes",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub binary: Option<Vec<u8>>,
    /// SHA-256 of the uploaded bytes, hex-encoded.
    pub content_hash: String,
    pub status: DocumentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<Summary>,
}

/// Requested summary verbosity. Controls the prompt only, never the
/// alignment algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryLength {
    Short,
    Balanced,
    Detailed,
}

impl SummaryLength {
    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryLength::Short => "short",
            SummaryLength::Balanced => "balanced",
            SummaryLength::Detailed => "detailed",
        }
    }
}

impl std::str::FromStr for SummaryLength {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "short" => Ok(SummaryLength::Short),
            "balanced" => Ok(SummaryLength::Balanced),
            "detailed" => Ok(SummaryLength::Detailed),
            other => Err(format!(
                "unknown summary length '{}' (expected short, balanced, or detailed)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// Section kind as a tagged variant. Only the variants that can carry a
/// highlight expose a reference field, so a heading with a highlight is
/// unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SectionKind {
    Heading,
    Paragraph {
        #[serde(skip_serializing_if = "Option::is_none", default)]
        highlight_id: Option<String>,
    },
    Bullet {
        #[serde(skip_serializing_if = "Option::is_none", default)]
        highlight_id: Option<String>,
    },
    KeyConcept {
        #[serde(skip_serializing_if = "Option::is_none", default)]
        highlight_id: Option<String>,
    },
}

impl SectionKind {
    /// The linked highlight, if this kind carries one.
    pub fn highlight_id(&self) -> Option<&str> {
        match self {
            SectionKind::Heading => None,
            SectionKind::Paragraph { highlight_id }
            | SectionKind::Bullet { highlight_id }
            | SectionKind::KeyConcept { highlight_id } => highlight_id.as_deref(),
        }
    }

    /// Link a highlight. Returns false (and does nothing) for headings.
    pub fn set_highlight(&mut self, id: String) -> bool {
        match self {
            SectionKind::Heading => false,
            SectionKind::Paragraph { highlight_id }
            | SectionKind::Bullet { highlight_id }
            | SectionKind::KeyConcept { highlight_id } => {
                *highlight_id = Some(id);
                true
            }
        }
    }
}

/// One ordered entry of a summary. Immutable once produced; the sequence of
/// sections is the summary's narrative order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarySection {
    pub id: String,
    #[serde(flatten)]
    pub kind: SectionKind,
    pub content: String,
    pub confidence: Confidence,
}

/// Where a highlight sits in the source document.
///
/// `page` and `paragraph` are placeholders carried for renderers; the byte
/// range `[start_offset, end_offset)` into the canonical text is the
/// resolved location. Invariant: `end_offset > start_offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub page: u32,
    pub paragraph: u32,
    pub start_offset: usize,
    pub end_offset: usize,
}

/// A located quotation backing one summary section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Highlight {
    pub id: String,
    /// Back-reference to the owning section.
    pub section_id: String,
    /// 1-based color class, cyclic over the palette.
    pub color_index: u8,
    /// The quotation text exactly as claimed by the model.
    pub source_text: String,
    pub location: SourceLocation,
}

/// A generated summary for one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub id: String,
    pub document_id: String,
    pub sections: Vec<SummarySection>,
    pub highlights: Vec<Highlight>,
    pub generated_at: DateTime<Utc>,
    pub length: SummaryLength,
}

/// A contiguous slice of the canonical text, attributed to at most one
/// highlight. Ephemeral: recomputed for rendering, never persisted.
/// Concatenating segment texts in order reproduces the canonical text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Segment {
    Plain { text: String },
    Highlighted { text: String, highlight_id: String },
}

impl Segment {
    pub fn text(&self) -> &str {
        match self {
            Segment::Plain { text } | Segment::Highlighted { text, .. } => text,
        }
    }

    pub fn highlight_id(&self) -> Option<&str> {
        match self {
            Segment::Plain { .. } => None,
            Segment::Highlighted { highlight_id, .. } => Some(highlight_id),
        }
    }
}

/// Raw section record as returned by a summarization provider, before
/// identifier assignment and highlight location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSection {
    pub kind: RawKind,
    pub content: String,
    /// Verbatim quotation claimed to support this point, if any.
    pub quotation: Option<String>,
    /// Provider-suggested character range for the quotation. A hint, not a
    /// guarantee.
    pub offset_hint: Option<OffsetHint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawKind {
    Heading,
    Paragraph,
    Bullet,
    KeyConcept,
}

/// Provider-supplied offset range. Signed because the model is free to
/// return anything; `start <= 0` is treated as "hint absent".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetHint {
    pub start: i64,
    pub end: i64,
}

/// Per-user presentation preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSettings {
    pub default_summary_length: SummaryLength,
    /// 0-100, renderer-side highlight opacity.
    pub highlight_intensity: u8,
    pub theme: String,
    pub text_size: String,
    pub line_spacing: String,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            default_summary_length: SummaryLength::Balanced,
            highlight_intensity: 70,
            theme: "system".to_string(),
            text_size: "medium".to_string(),
            line_spacing: "normal".to_string(),
        }
    }
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(v: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
        match v {
            Some(bytes) => STANDARD.encode(bytes).serialize(s),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
        let encoded: Option<String> = Option::deserialize(d)?;
        match encoded {
            Some(e) => STANDARD
                .decode(e.as_bytes())
                .map(Some)
                .map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}
