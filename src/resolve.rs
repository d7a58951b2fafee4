//! Segment resolution: from located highlight spans to a lossless partition
//! of the canonical text.
//!
//! Overlapping spans indicate conflicting or duplicate model attributions;
//! the first span in document order wins and the loser is discarded whole.
//! Trimming the loser to its non-overlapping remainder would be the
//! alternative policy; see DESIGN.md for why discard is kept.

use crate::models::{Highlight, Segment};

/// Partition `text` into an ordered, gapless segment sequence.
///
/// Invariants: concatenating the segments' text reproduces `text` exactly,
/// and no two highlighted segments cover overlapping ranges. With no usable
/// spans the whole text is one plain segment.
pub fn resolve_segments(text: &str, highlights: &[Highlight]) -> Vec<Segment> {
    let mut spans: Vec<(usize, usize, &str)> = highlights
        .iter()
        .filter(|h| {
            let loc = &h.location;
            loc.end_offset > loc.start_offset
                && loc.end_offset <= text.len()
                && text.is_char_boundary(loc.start_offset)
                && text.is_char_boundary(loc.end_offset)
        })
        .map(|h| (h.location.start_offset, h.location.end_offset, h.id.as_str()))
        .collect();
    // Stable by start: equal starts keep first-found priority.
    spans.sort_by_key(|&(start, _, _)| start);

    let mut segments = Vec::new();
    let mut cursor = 0usize;
    for (start, end, id) in spans {
        if start < cursor {
            // Overlaps the most recently kept span; discard entirely.
            continue;
        }
        if start > cursor {
            segments.push(Segment::Plain {
                text: text[cursor..start].to_string(),
            });
        }
        segments.push(Segment::Highlighted {
            text: text[start..end].to_string(),
            highlight_id: id.to_string(),
        });
        cursor = end;
    }

    if cursor < text.len() || segments.is_empty() {
        segments.push(Segment::Plain {
            text: text[cursor..].to_string(),
        });
    }

    segments
}
