//! Upload and summarization service layer.
//!
//! Coordinates the flow around the pure core: upload → extraction → store,
//! and load → pipeline → attach summary. Status transitions live here so
//! the store always reflects where a document is in its lifecycle.

use anyhow::{bail, Context, Result};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config::Config;
use crate::extract::{detect_type, extract_content};
use crate::models::{ContentKind, Document, DocumentStatus, Summary, SummaryLength};
use crate::pipeline::generate_summary;
use crate::progress::SummarizeProgress;
use crate::store::DocumentStore;
use crate::summarize::SummaryProvider;

/// Upload size cap.
pub const MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Rough bytes-per-page used when a format carries no page structure.
const BYTES_PER_PAGE_ESTIMATE: u64 = 3000;

/// Ingest one uploaded file.
///
/// Unsupported types and oversized files are rejected outright — no document
/// is created. A supported file whose extraction fails is stored in `Error`
/// status with the extraction message, so the failure is visible in listings.
pub async fn upload_document(
    store: &dyn DocumentStore,
    filename: &str,
    bytes: &[u8],
) -> Result<Document> {
    let doc_type = detect_type(filename).map_err(|e| anyhow::anyhow!("{}", e))?;

    let size = bytes.len() as u64;
    if size > MAX_FILE_SIZE {
        bail!(
            "file exceeds the {} MB upload limit",
            MAX_FILE_SIZE / (1024 * 1024)
        );
    }

    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let content_hash = format!("{:x}", hasher.finalize());

    let mut doc = Document {
        id: format!("doc_{}", Uuid::new_v4()),
        name: filename.to_string(),
        doc_type,
        size,
        page_count: None,
        uploaded_at: chrono::Utc::now(),
        content: String::new(),
        html: None,
        content_kind: ContentKind::Text,
        binary: None,
        content_hash,
        status: DocumentStatus::Uploading,
        summary: None,
    };
    store.put(doc.clone()).await?;

    doc.status = DocumentStatus::Processing;
    store.put(doc.clone()).await?;

    match extract_content(bytes, doc_type) {
        Ok(extracted) => {
            doc.content = extracted.text;
            doc.html = extracted.html;
            doc.content_kind = extracted.kind;
            doc.binary = extracted.binary;
            doc.page_count = extracted
                .page_count
                .or_else(|| Some(size.div_ceil(BYTES_PER_PAGE_ESTIMATE) as u32));
            doc.status = DocumentStatus::Completed;
        }
        Err(e) => {
            doc.status = DocumentStatus::Error(e.to_string());
        }
    }

    store.put(doc.clone()).await?;
    Ok(doc)
}

/// Summarize a stored document and attach the result.
///
/// Regeneration replaces any prior summary (last-write-wins). On failure the
/// document is restored to its prior state: previous summary and status are
/// left untouched.
pub async fn summarize_document(
    store: &dyn DocumentStore,
    provider: &dyn SummaryProvider,
    config: &Config,
    document_id: &str,
    length: SummaryLength,
    progress: &dyn SummarizeProgress,
) -> Result<Summary> {
    let prior = store
        .get(document_id)
        .await?
        .with_context(|| format!("document not found: {}", document_id))?;

    if let DocumentStatus::Error(message) = &prior.status {
        bail!("document {} failed extraction: {}", document_id, message);
    }

    let mut doc = prior.clone();
    doc.status = DocumentStatus::Summarizing;
    store.put(doc.clone()).await?;

    match generate_summary(provider, config, &doc, length, progress).await {
        Ok(summary) => {
            doc.summary = Some(summary.clone());
            doc.status = DocumentStatus::Completed;
            store.put(doc).await?;
            Ok(summary)
        }
        Err(e) => {
            store.put(prior).await?;
            Err(e)
        }
    }
}
