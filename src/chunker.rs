//! Page-bounded PDF chunking.
//!
//! Splits an oversized paged document into standalone sub-documents of at
//! most `max_pages` pages each so every provider call stays under the
//! provider's hard page limit. Page order is preserved; each sub-document
//! decodes on its own.
//!
//! Failure policy: if the page structure cannot be parsed, or any
//! partitioning step fails, the whole original document is returned as a
//! single chunk and the total page count is reported as unknown. The
//! provider call then surfaces any "too large" rejection itself.

use std::io::Cursor;

/// One page-bounded sub-document.
#[derive(Debug, Clone)]
pub struct DocumentChunk {
    /// 0-based position in document order.
    pub index: usize,
    pub bytes: Vec<u8>,
    pub page_count: u32,
}

/// Result of chunking one document.
#[derive(Debug, Clone)]
pub struct ChunkPlan {
    pub chunks: Vec<DocumentChunk>,
    /// `None` when the page structure could not be determined; callers must
    /// not assume a known page count in that case.
    pub total_pages: Option<u32>,
}

impl ChunkPlan {
    /// Whether chunking degraded to the whole-document fallback.
    pub fn is_degraded(&self) -> bool {
        self.total_pages.is_none()
    }
}

/// Partition `1..=total_pages` into contiguous ascending inclusive ranges of
/// at most `max_pages` pages each.
pub fn plan_ranges(total_pages: u32, max_pages: u32) -> Vec<(u32, u32)> {
    if total_pages == 0 || max_pages == 0 {
        return Vec::new();
    }
    let mut ranges = Vec::new();
    let mut start = 1u32;
    while start <= total_pages {
        let end = (start + max_pages - 1).min(total_pages);
        ranges.push((start, end));
        start = end + 1;
    }
    ranges
}

/// Chunk a PDF into page-bounded standalone sub-documents.
pub fn chunk_pdf(bytes: &[u8], max_pages: u32) -> ChunkPlan {
    let doc = match lopdf::Document::load_mem(bytes) {
        Ok(doc) => doc,
        Err(_) => return whole_document_fallback(bytes),
    };

    let total_pages = doc.get_pages().len() as u32;
    if total_pages == 0 {
        return whole_document_fallback(bytes);
    }

    if total_pages <= max_pages {
        return ChunkPlan {
            chunks: vec![DocumentChunk {
                index: 0,
                bytes: bytes.to_vec(),
                page_count: total_pages,
            }],
            total_pages: Some(total_pages),
        };
    }

    let ranges = plan_ranges(total_pages, max_pages);
    let mut chunks = Vec::with_capacity(ranges.len());
    for (index, &(start, end)) in ranges.iter().enumerate() {
        match slice_pages(&doc, total_pages, start, end) {
            Ok(bytes) => chunks.push(DocumentChunk {
                index,
                bytes,
                page_count: end - start + 1,
            }),
            Err(_) => return whole_document_fallback(bytes),
        }
    }

    ChunkPlan {
        chunks,
        total_pages: Some(total_pages),
    }
}

fn whole_document_fallback(bytes: &[u8]) -> ChunkPlan {
    ChunkPlan {
        chunks: vec![DocumentChunk {
            index: 0,
            bytes: bytes.to_vec(),
            page_count: 0,
        }],
        total_pages: None,
    }
}

/// Produce a standalone PDF containing only pages `start..=end` (1-based,
/// inclusive) of `doc`.
fn slice_pages(
    doc: &lopdf::Document,
    total_pages: u32,
    start: u32,
    end: u32,
) -> Result<Vec<u8>, lopdf::Error> {
    let mut sub = doc.clone();
    let delete: Vec<u32> = (1..=total_pages)
        .filter(|p| *p < start || *p > end)
        .collect();
    sub.delete_pages(&delete);
    sub.prune_objects();
    let mut out = Vec::new();
    sub.save_to(&mut Cursor::new(&mut out))?;
    Ok(out)
}
