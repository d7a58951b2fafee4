//! # Sumpane CLI (`sumpane`)
//!
//! The `sumpane` binary drives the summarization core from the command
//! line: upload a file, summarize it against the configured provider, and
//! print the dual-pane result — the section list and the highlighted
//! segment partition of the source text.
//!
//! ## Usage
//!
//! ```bash
//! sumpane summarize report.pdf --length balanced
//! sumpane extract report.docx
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `sumpane summarize <file>` | Extract, summarize, and print the aligned result |
//! | `sumpane extract <file>` | Extraction only: print the canonical text |
//!
//! Summarization needs the `GEMINI_API_KEY` environment variable. All
//! settings are read from an optional TOML file (`--config`, default
//! `./sumpane.toml`); a missing file means defaults.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use sumpane::config::load_config_or_default;
use sumpane::extract::{detect_type, extract_content};
use sumpane::ingest::{summarize_document, upload_document};
use sumpane::models::{DocumentStatus, SectionKind, Segment, SummaryLength};
use sumpane::progress::ProgressMode;
use sumpane::resolve::resolve_segments;
use sumpane::store::{DocumentStore, InMemoryStore};
use sumpane::summarize::create_provider;

/// Sumpane — summarize documents with source-linked highlights.
#[derive(Parser)]
#[command(
    name = "sumpane",
    about = "Summarize documents with source-linked highlights",
    version,
    long_about = "Sumpane extracts text from PDF, Word, plain-text, and slide documents, \
    asks an LLM provider for a structured summary with supporting quotations, and aligns \
    each quotation back onto the source text for dual-pane display."
)]
struct Cli {
    /// Path to configuration file (TOML). Missing file means defaults.
    #[arg(long, global = true, default_value = "./sumpane.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize a document and print the aligned result.
    Summarize {
        /// The file to summarize (.pdf, .docx, .txt, .pptx).
        file: PathBuf,

        /// Summary verbosity: short, balanced, or detailed.
        #[arg(long, default_value = "balanced")]
        length: SummaryLength,

        /// Emit the full result (document, summary, segments) as JSON.
        #[arg(long)]
        json: bool,

        /// Progress reporting on stderr: off, human, or json.
        /// Defaults to human when stderr is a TTY.
        #[arg(long)]
        progress: Option<ProgressMode>,
    },

    /// Extract a document's canonical text and print it.
    Extract {
        /// The file to extract (.pdf, .docx, .txt, .pptx).
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config_or_default(&cli.config)?;

    match cli.command {
        Commands::Summarize {
            file,
            length,
            json,
            progress,
        } => {
            let bytes = std::fs::read(&file)
                .with_context(|| format!("Failed to read file: {}", file.display()))?;
            let filename = file
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("upload")
                .to_string();

            let store = InMemoryStore::new();
            let doc = upload_document(&store, &filename, &bytes).await?;
            if let DocumentStatus::Error(message) = &doc.status {
                bail!("extraction failed: {}", message);
            }

            let provider = create_provider(&config.provider)?;
            let reporter = progress.unwrap_or_else(ProgressMode::default_for_tty).reporter();
            let summary = summarize_document(
                &store,
                provider.as_ref(),
                &config,
                &doc.id,
                length,
                reporter.as_ref(),
            )
            .await?;

            let doc = store
                .get(&doc.id)
                .await?
                .context("document vanished from store")?;
            let segments = resolve_segments(&doc.content, &summary.highlights);

            if json {
                let out = serde_json::json!({
                    "document": doc,
                    "summary": summary,
                    "segments": segments,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                print_summary_pane(&summary);
                print_source_pane(&segments);
            }
        }

        Commands::Extract { file } => {
            let bytes = std::fs::read(&file)
                .with_context(|| format!("Failed to read file: {}", file.display()))?;
            let filename = file
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("upload");
            let doc_type = detect_type(filename).map_err(|e| anyhow::anyhow!("{}", e))?;
            let content = extract_content(&bytes, doc_type).map_err(|e| anyhow::anyhow!("{}", e))?;
            if let Some(pages) = content.page_count {
                eprintln!("pages: {}", pages);
            }
            println!("{}", content.text);
        }
    }

    Ok(())
}

fn print_summary_pane(summary: &sumpane::models::Summary) {
    println!(
        "Summary ({}, {} sections, {} highlights)",
        summary.length.as_str(),
        summary.sections.len(),
        summary.highlights.len()
    );
    println!();
    for section in &summary.sections {
        let (marker, link) = match &section.kind {
            SectionKind::Heading => ("#", None),
            SectionKind::Paragraph { highlight_id } => ("¶", highlight_id.as_deref()),
            SectionKind::Bullet { highlight_id } => ("•", highlight_id.as_deref()),
            SectionKind::KeyConcept { highlight_id } => ("★", highlight_id.as_deref()),
        };
        match link {
            Some(id) => println!("  {} {}  [{}]", marker, section.content, id),
            None => println!("  {} {}", marker, section.content),
        }
    }
    println!();
}

fn print_source_pane(segments: &[Segment]) {
    println!("Source");
    let mut rendered = String::new();
    for segment in segments {
        match segment {
            Segment::Plain { text } => rendered.push_str(text),
            Segment::Highlighted { text, highlight_id } => {
                rendered.push_str(&format!("«{}:{}»", highlight_id, text));
            }
        }
    }
    println!("{}", rendered);
}
