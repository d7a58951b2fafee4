//! # Sumpane
//!
//! A document summarization core with source-linked highlights.
//!
//! Sumpane takes an uploaded document (PDF, Word, plain text, or slide
//! deck), extracts its canonical text, asks an LLM provider for a
//! structured summary with supporting quotations, and aligns every
//! quotation back onto the source text — producing the ordered section list
//! and lossless segment partition a dual-pane viewer needs to highlight and
//! scroll to the passage behind each summary point.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌─────────┐   ┌──────────┐   ┌─────────┐
//! │ Extract  │──▶│ Chunker │──▶│ Provider │──▶│  Merge  │
//! │ txt/pdf/ │   │ ≤500 pp │   │ (Gemini) │   │ ordered │
//! │ docx/pptx│   │ per call│   │ per chunk│   │ sections│
//! └──────────┘   └─────────┘   └──────────┘   └────┬────┘
//!                                                  │
//!                              ┌───────────────────┤
//!                              ▼                   ▼
//!                        ┌──────────┐       ┌──────────┐
//!                        │  Locate  │──────▶│ Resolve  │
//!                        │ quotation│ spans │ segments │
//!                        └──────────┘       └──────────┘
//! ```
//!
//! The pipeline is pure over its inputs: the caller owns the document store
//! and attaches the returned [`models::Summary`] itself. Quotations that
//! resolve nowhere simply leave their section unlinked — an expected
//! outcome, not an error.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`extract`] | Multi-format text extraction |
//! | [`chunker`] | Page-bounded PDF chunking |
//! | [`summarize`] | Summarization provider abstraction |
//! | [`merge`] | Per-chunk result merging |
//! | [`locate`] | Quotation location in canonical text |
//! | [`resolve`] | Lossless segment partition |
//! | [`filter`] | Highlight visibility and keyword filtering |
//! | [`pipeline`] | End-to-end summarization orchestration |
//! | [`store`] | Document store trait and in-memory implementation |
//! | [`ingest`] | Upload and summarize service layer |
//! | [`progress`] | Progress reporting |

pub mod chunker;
pub mod config;
pub mod extract;
pub mod filter;
pub mod ingest;
pub mod locate;
pub mod merge;
pub mod models;
pub mod pipeline;
pub mod progress;
pub mod resolve;
pub mod store;
pub mod summarize;
