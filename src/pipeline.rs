//! Summarization pipeline orchestration.
//!
//! Coordinates the full flow for one document: chunk planning → one provider
//! call per chunk → merge → quotation location → summary composition. Pure
//! over its inputs: the caller attaches the returned Summary to the document
//! record. A per-chunk provider failure fails the whole request with the
//! chunk identified; cancelling the future leaves no partial summary behind.

use anyhow::{Context, Result};
use uuid::Uuid;

use crate::chunker::chunk_pdf;
use crate::config::{Config, MatchingConfig};
use crate::locate::locate_quotation;
use crate::merge::{merge_chunks, ChunkSummary};
use crate::models::{
    Confidence, ContentKind, Document, Highlight, RawKind, RawSection, SectionKind,
    SourceLocation, Summary, SummaryLength, SummarySection,
};
use crate::progress::{SummarizeEvent, SummarizeProgress};
use crate::summarize::{SummarizeInput, SummaryProvider};

const PDF_MIME: &str = "application/pdf";

/// Generate a summary for `document`.
///
/// Natively rendered PDFs go to the provider as binary, split into
/// page-bounded chunks when oversized; everything else goes as text in a
/// single call. Chunks are processed sequentially in document order, so the
/// merge ordering guarantee holds trivially.
pub async fn generate_summary(
    provider: &dyn SummaryProvider,
    config: &Config,
    document: &Document,
    length: SummaryLength,
    progress: &dyn SummarizeProgress,
) -> Result<Summary> {
    progress.report(SummarizeEvent::Preparing);

    let results = match (&document.content_kind, &document.binary) {
        (ContentKind::PdfNative, Some(bytes)) => {
            summarize_pdf_chunks(provider, config, bytes, length, progress).await?
        }
        _ => {
            progress.report(SummarizeEvent::Chunked { total: 1 });
            let sections = provider
                .summarize(SummarizeInput::Text(&document.content), length)
                .await
                .context("summarization call failed")?;
            progress.report(SummarizeEvent::ChunkDone { n: 1, total: 1 });
            vec![ChunkSummary {
                chunk_index: 0,
                sections,
            }]
        }
    };

    progress.report(SummarizeEvent::Composing);
    let merged = merge_chunks(results);
    Ok(compose_summary(
        &document.id,
        &document.content,
        merged,
        length,
        &config.matching,
        config.highlighting.palette_size,
    ))
}

async fn summarize_pdf_chunks(
    provider: &dyn SummaryProvider,
    config: &Config,
    bytes: &[u8],
    length: SummaryLength,
    progress: &dyn SummarizeProgress,
) -> Result<Vec<ChunkSummary>> {
    let plan = chunk_pdf(bytes, config.chunking.max_pages_per_chunk);
    if plan.is_degraded() {
        progress.report(SummarizeEvent::ChunkingDegraded);
    }
    let total = plan.chunks.len();
    progress.report(SummarizeEvent::Chunked { total });

    let mut results = Vec::with_capacity(total);
    for chunk in &plan.chunks {
        let sections = provider
            .summarize(
                SummarizeInput::Binary {
                    bytes: &chunk.bytes,
                    mime: PDF_MIME,
                },
                length,
            )
            .await
            .with_context(|| format!("summarization failed for chunk {} of {}", chunk.index + 1, total))?;
        progress.report(SummarizeEvent::ChunkDone {
            n: chunk.index + 1,
            total,
        });
        results.push(ChunkSummary {
            chunk_index: chunk.index,
            sections,
        });
    }
    Ok(results)
}

/// Compose the final Summary from merged raw sections.
///
/// Assigns globally sequential `s{n}` / `h{n}` identifiers, locates each
/// quotation, and colors highlights cyclically in the order they resolve to
/// a span. A quotation that resolves nowhere leaves its section unlinked
/// with medium confidence; that is an expected silent outcome.
pub fn compose_summary(
    document_id: &str,
    text: &str,
    merged: Vec<RawSection>,
    length: SummaryLength,
    matching: &MatchingConfig,
    palette_size: u8,
) -> Summary {
    let mut sections = Vec::with_capacity(merged.len());
    let mut highlights = Vec::new();
    let mut located = 0usize;

    for (i, raw) in merged.into_iter().enumerate() {
        let section_id = format!("s{}", i + 1);
        let mut kind = match raw.kind {
            RawKind::Heading => SectionKind::Heading,
            RawKind::Paragraph => SectionKind::Paragraph { highlight_id: None },
            RawKind::Bullet => SectionKind::Bullet { highlight_id: None },
            RawKind::KeyConcept => SectionKind::KeyConcept { highlight_id: None },
        };
        let mut confidence = Confidence::High;

        // Headings never carry a highlight, whatever the model claims.
        if !matches!(raw.kind, RawKind::Heading) {
            if let Some(quotation) = &raw.quotation {
                match locate_quotation(text, quotation, raw.offset_hint, matching) {
                    Some((start, end)) => {
                        located += 1;
                        let highlight_id = format!("h{}", located);
                        kind.set_highlight(highlight_id.clone());
                        highlights.push(Highlight {
                            id: highlight_id,
                            section_id: section_id.clone(),
                            color_index: color_for(located, palette_size),
                            source_text: quotation.clone(),
                            location: SourceLocation {
                                page: 1,
                                paragraph: located as u32,
                                start_offset: start,
                                end_offset: end,
                            },
                        });
                    }
                    None => {
                        // The claimed support could not be verified in the text.
                        confidence = Confidence::Medium;
                    }
                }
            }
        }

        sections.push(SummarySection {
            id: section_id,
            kind,
            content: raw.content,
            confidence,
        });
    }

    Summary {
        id: format!("sum_{}", Uuid::new_v4()),
        document_id: document_id.to_string(),
        sections,
        highlights,
        generated_at: chrono::Utc::now(),
        length,
    }
}

/// 1-based cyclic color class for the `counter`-th located highlight.
fn color_for(counter: usize, palette_size: u8) -> u8 {
    (((counter - 1) % palette_size.max(1) as usize) + 1) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DocumentStatus, DocumentType, OffsetHint};
    use crate::progress::NoProgress;
    use crate::summarize::ProviderError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TEXT: &str = "Alpha methods improve throughput. Beta methods reduce latency significantly across all regions.";

    fn raw(kind: RawKind, content: &str, quotation: Option<&str>) -> RawSection {
        RawSection {
            kind,
            content: content.to_string(),
            quotation: quotation.map(|q| q.to_string()),
            offset_hint: None,
        }
    }

    #[test]
    fn sections_get_sequential_ids() {
        let summary = compose_summary(
            "doc1",
            TEXT,
            vec![
                raw(RawKind::Heading, "Overview", None),
                raw(RawKind::Bullet, "Point one", None),
                raw(RawKind::Paragraph, "Closing", None),
            ],
            SummaryLength::Balanced,
            &MatchingConfig::default(),
            5,
        );
        let ids: Vec<&str> = summary.sections.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["s1", "s2", "s3"]);
        assert!(summary.highlights.is_empty());
    }

    #[test]
    fn located_quotation_links_section_and_highlight() {
        let summary = compose_summary(
            "doc1",
            TEXT,
            vec![raw(
                RawKind::Bullet,
                "Latency improves",
                Some("Beta methods reduce latency"),
            )],
            SummaryLength::Balanced,
            &MatchingConfig::default(),
            5,
        );
        assert_eq!(summary.highlights.len(), 1);
        let h = &summary.highlights[0];
        assert_eq!(h.id, "h1");
        assert_eq!(h.section_id, "s1");
        assert_eq!(h.color_index, 1);
        assert_eq!(h.location.start_offset, 34);
        assert_eq!(h.location.end_offset, 61);
        assert_eq!(summary.sections[0].kind.highlight_id(), Some("h1"));
        assert_eq!(summary.sections[0].confidence, Confidence::High);
    }

    #[test]
    fn unlocatable_quotation_leaves_section_unlinked() {
        let summary = compose_summary(
            "doc1",
            TEXT,
            vec![raw(
                RawKind::Bullet,
                "Point",
                Some("completely fabricated supporting quote"),
            )],
            SummaryLength::Balanced,
            &MatchingConfig::default(),
            5,
        );
        assert!(summary.highlights.is_empty());
        assert_eq!(summary.sections[0].kind.highlight_id(), None);
        assert_eq!(summary.sections[0].confidence, Confidence::Medium);
    }

    #[test]
    fn heading_quotation_is_ignored() {
        let summary = compose_summary(
            "doc1",
            TEXT,
            vec![raw(
                RawKind::Heading,
                "Overview",
                Some("Beta methods reduce latency"),
            )],
            SummaryLength::Balanced,
            &MatchingConfig::default(),
            5,
        );
        assert!(summary.highlights.is_empty());
        assert_eq!(summary.sections[0].kind, SectionKind::Heading);
    }

    #[test]
    fn short_quotation_never_produces_highlight() {
        let summary = compose_summary(
            "doc1",
            TEXT,
            vec![raw(RawKind::Bullet, "Point", Some("Beta"))],
            SummaryLength::Balanced,
            &MatchingConfig::default(),
            5,
        );
        assert!(summary.highlights.is_empty());
    }

    #[test]
    fn colors_cycle_in_located_order() {
        // Seven locatable quotations over a palette of five.
        let words = [
            "Alpha", "methods", "improve", "throughput", "latency", "significantly", "regions",
        ];
        let merged: Vec<RawSection> = words
            .iter()
            .map(|w| raw(RawKind::Bullet, "Point", Some(*w)))
            .collect();
        let summary = compose_summary(
            "doc1",
            TEXT,
            merged,
            SummaryLength::Balanced,
            &MatchingConfig::default(),
            5,
        );
        assert_eq!(summary.highlights.len(), 7);
        let colors: Vec<u8> = summary.highlights.iter().map(|h| h.color_index).collect();
        assert_eq!(colors, vec![1, 2, 3, 4, 5, 1, 2]);
    }

    #[test]
    fn skipped_quotations_do_not_advance_colors() {
        let merged = vec![
            raw(RawKind::Bullet, "A", Some("Alpha methods")),
            raw(RawKind::Bullet, "B", Some("no such text anywhere here")),
            raw(RawKind::Bullet, "C", Some("Beta methods reduce latency")),
        ];
        let summary = compose_summary(
            "doc1",
            TEXT,
            merged,
            SummaryLength::Balanced,
            &MatchingConfig::default(),
            5,
        );
        let colors: Vec<u8> = summary.highlights.iter().map(|h| h.color_index).collect();
        assert_eq!(colors, vec![1, 2]);
        assert_eq!(summary.highlights[1].section_id, "s3");
    }

    #[test]
    fn offset_hint_flows_through_to_locator() {
        let merged = vec![RawSection {
            kind: RawKind::KeyConcept,
            content: "Latency".to_string(),
            quotation: Some("beta methods reduce latency significantly".to_string()),
            offset_hint: Some(OffsetHint { start: 34, end: 95 }),
        }];
        let summary = compose_summary(
            "doc1",
            TEXT,
            merged,
            SummaryLength::Balanced,
            &MatchingConfig::default(),
            5,
        );
        assert_eq!(summary.highlights[0].location.start_offset, 34);
        assert_eq!(summary.highlights[0].location.end_offset, 95);
    }

    // ============ generate_summary with a scripted provider ============

    struct ScriptedProvider {
        calls: AtomicUsize,
        fail_on_call: Option<usize>,
    }

    #[async_trait]
    impl SummaryProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn summarize(
            &self,
            _input: SummarizeInput<'_>,
            _length: SummaryLength,
        ) -> Result<Vec<RawSection>, ProviderError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if Some(call) == self.fail_on_call {
                return Err(ProviderError::Api {
                    status: 500,
                    message: "scripted failure".to_string(),
                });
            }
            Ok(vec![raw(
                RawKind::Bullet,
                &format!("point from call {}", call),
                Some("Beta methods reduce latency"),
            )])
        }
    }

    fn text_document() -> Document {
        Document {
            id: "doc1".to_string(),
            name: "report.txt".to_string(),
            doc_type: DocumentType::Txt,
            size: TEXT.len() as u64,
            page_count: Some(1),
            uploaded_at: chrono::Utc::now(),
            content: TEXT.to_string(),
            html: None,
            content_kind: ContentKind::Text,
            binary: None,
            content_hash: String::new(),
            status: DocumentStatus::Completed,
            summary: None,
        }
    }

    #[tokio::test]
    async fn text_document_is_single_call() {
        let provider = ScriptedProvider {
            calls: AtomicUsize::new(0),
            fail_on_call: None,
        };
        let summary = generate_summary(
            &provider,
            &Config::default(),
            &text_document(),
            SummaryLength::Balanced,
            &NoProgress,
        )
        .await
        .unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert_eq!(summary.sections.len(), 1);
        assert_eq!(summary.highlights.len(), 1);
        assert_eq!(summary.document_id, "doc1");
    }

    #[tokio::test]
    async fn provider_failure_fails_whole_request() {
        let provider = ScriptedProvider {
            calls: AtomicUsize::new(0),
            fail_on_call: Some(1),
        };
        let err = generate_summary(
            &provider,
            &Config::default(),
            &text_document(),
            SummaryLength::Balanced,
            &NoProgress,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("summarization call failed"));
    }
}
