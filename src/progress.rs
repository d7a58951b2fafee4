//! Summarization progress reporting.
//!
//! Multi-chunk summarization of a large document takes one provider round
//! trip per chunk; the pipeline reports each step through a reporter the
//! caller supplies, decoupled from any logging framework. Progress is
//! emitted on **stderr** so stdout remains parseable for scripts.

use std::io::Write;

/// A single progress event during summarization.
#[derive(Clone, Debug)]
pub enum SummarizeEvent {
    /// Extraction or chunk planning is underway; totals not yet known.
    Preparing,
    /// The document was split; `total` provider calls will follow.
    Chunked { total: usize },
    /// Page structure could not be parsed; the whole document goes to the
    /// provider as a single chunk of unknown page count.
    ChunkingDegraded,
    /// Chunk `n` of `total` came back from the provider (1-based).
    ChunkDone { n: usize, total: usize },
    /// Sections merged; locating quotations and composing the summary.
    Composing,
}

/// Reports summarization progress. Implementations write to stderr (human
/// or JSON).
pub trait SummarizeProgress: Send + Sync {
    /// Emit a progress event. Called from the pipeline.
    fn report(&self, event: SummarizeEvent);
}

/// Human-friendly progress on stderr: "summarize  chunk 2 / 5".
pub struct StderrProgress;

impl SummarizeProgress for StderrProgress {
    fn report(&self, event: SummarizeEvent) {
        let line = match &event {
            SummarizeEvent::Preparing => "summarize  preparing...\n".to_string(),
            SummarizeEvent::Chunked { total } => {
                format!("summarize  split into {} chunks\n", total)
            }
            SummarizeEvent::ChunkingDegraded => {
                "summarize  warning: page structure unreadable, sending whole document\n"
                    .to_string()
            }
            SummarizeEvent::ChunkDone { n, total } => {
                format!("summarize  chunk {} / {}\n", n, total)
            }
            SummarizeEvent::Composing => "summarize  composing summary...\n".to_string(),
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl SummarizeProgress for JsonProgress {
    fn report(&self, event: SummarizeEvent) {
        let obj = match &event {
            SummarizeEvent::Preparing => serde_json::json!({
                "event": "progress",
                "phase": "preparing"
            }),
            SummarizeEvent::Chunked { total } => serde_json::json!({
                "event": "progress",
                "phase": "chunked",
                "total": total
            }),
            SummarizeEvent::ChunkingDegraded => serde_json::json!({
                "event": "warning",
                "phase": "chunking",
                "message": "page structure unreadable; degraded to single chunk"
            }),
            SummarizeEvent::ChunkDone { n, total } => serde_json::json!({
                "event": "progress",
                "phase": "summarizing",
                "n": n,
                "total": total
            }),
            SummarizeEvent::Composing => serde_json::json!({
                "event": "progress",
                "phase": "composing"
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl SummarizeProgress for NoProgress {
    fn report(&self, _event: SummarizeEvent) {}
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    /// Build a reporter for this mode. Caller passes it to the pipeline.
    pub fn reporter(&self) -> Box<dyn SummarizeProgress> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}

impl std::str::FromStr for ProgressMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "off" => Ok(ProgressMode::Off),
            "human" => Ok(ProgressMode::Human),
            "json" => Ok(ProgressMode::Json),
            other => Err(format!(
                "unknown progress mode '{}' (expected off, human, or json)",
                other
            )),
        }
    }
}
