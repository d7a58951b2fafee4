//! Quotation location inside the canonical document text.
//!
//! Providers return quotations with offset hints that are often stale or
//! fabricated. This module resolves each quotation to a byte span
//! `[start, end)` in the canonical text, trying in order: verify the hint,
//! exact case-insensitive search, prefix search with sentence-boundary
//! extension. A quotation that resolves nowhere produces no highlight; that
//! is an expected outcome, not an error.
//!
//! Case-insensitive matching runs over ASCII-lowercased copies, which map
//! bytes one-to-one, so every offset found in a copy is valid (and on a char
//! boundary) in the original text.

use crate::config::MatchingConfig;
use crate::models::OffsetHint;

/// Resolve `quotation` to a span in `text`, using `hint` when trustworthy.
pub fn locate_quotation(
    text: &str,
    quotation: &str,
    hint: Option<OffsetHint>,
    cfg: &MatchingConfig,
) -> Option<(usize, usize)> {
    let quote = quotation.trim();
    // Too short to locate unambiguously.
    if quote.chars().count() < cfg.min_quote_chars {
        return None;
    }

    if let Some(span) = verify_hint(text, quote, hint, cfg.hint_verify_chars) {
        return Some(span);
    }

    let lower_text = text.to_ascii_lowercase();
    let lower_quote = quote.to_ascii_lowercase();

    if let Some(index) = lower_text.find(&lower_quote) {
        return Some((index, index + lower_quote.len()));
    }

    prefix_search(text, &lower_text, &lower_quote, cfg)
}

/// Step 1: trust-but-verify. A hint with `start <= 0` is treated as absent.
/// The hinted range is accepted when its normalized text and the normalized
/// quotation share a leading prefix of `verify_chars` characters in either
/// direction, which tolerates off-by-a-little drift while rejecting wildly
/// wrong hints.
fn verify_hint(
    text: &str,
    quote: &str,
    hint: Option<OffsetHint>,
    verify_chars: usize,
) -> Option<(usize, usize)> {
    let hint = hint?;
    if hint.start <= 0 || hint.end <= hint.start {
        return None;
    }
    let start = floor_char_boundary(text, (hint.start as usize).min(text.len()));
    let end = floor_char_boundary(text, (hint.end as usize).min(text.len()));
    if end <= start {
        return None;
    }

    let hinted = text[start..end].trim().to_lowercase();
    let claimed = quote.trim().to_lowercase();
    if hinted.is_empty() || claimed.is_empty() {
        return None;
    }

    let hinted_prefix = prefix_chars(&hinted, verify_chars);
    let claimed_prefix = prefix_chars(&claimed, verify_chars);
    if hinted.contains(claimed_prefix) || claimed.contains(hinted_prefix) {
        return Some((start, end));
    }
    None
}

/// Step 3: search for the quotation's leading `search_prefix_chars` chars and
/// extend the end to the next sentence boundary when one sits within
/// `boundary_window_chars` of the naive end. Recovers from the model
/// paraphrasing the tail of a long quotation while bounding the match.
fn prefix_search(
    text: &str,
    lower_text: &str,
    lower_quote: &str,
    cfg: &MatchingConfig,
) -> Option<(usize, usize)> {
    let prefix = prefix_chars(lower_quote, cfg.search_prefix_chars);
    if prefix.is_empty() || prefix.len() == lower_quote.len() {
        // The exact search already covered the whole quotation.
        return None;
    }
    let index = lower_text.find(prefix)?;

    let naive_end = floor_char_boundary(text, (index + lower_quote.len()).min(text.len()));
    let match_end = index + prefix.len();
    let end = match sentence_boundary_after(text, match_end) {
        Some(boundary) if boundary.abs_diff(naive_end) <= cfg.boundary_window_chars => boundary,
        _ => naive_end,
    };
    Some((index, end.max(match_end)))
}

/// Position just past the next sentence-terminating period, or at the next
/// newline, after `from`.
fn sentence_boundary_after(text: &str, from: usize) -> Option<usize> {
    text[from..].find(['.', '\n']).map(|rel| {
        let pos = from + rel;
        if text.as_bytes()[pos] == b'.' {
            pos + 1
        } else {
            pos
        }
    })
}

/// First `n` characters of `s` as a subslice.
fn prefix_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Largest char boundary `<= i`.
fn floor_char_boundary(s: &str, mut i: usize) -> usize {
    if i >= s.len() {
        return s.len();
    }
    while !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "Alpha methods improve throughput. Beta methods reduce latency significantly across all regions.";

    fn cfg() -> MatchingConfig {
        MatchingConfig::default()
    }

    #[test]
    fn exact_case_insensitive_match() {
        let span = locate_quotation(TEXT, "Beta methods reduce latency", None, &cfg());
        assert_eq!(span, Some((34, 61)));
        assert_eq!(&TEXT[34..61], "Beta methods reduce latency");
    }

    #[test]
    fn exact_match_ignores_case() {
        let span = locate_quotation(TEXT, "BETA METHODS REDUCE LATENCY", None, &cfg());
        assert_eq!(span, Some((34, 61)));
    }

    #[test]
    fn quotation_is_trimmed_before_search() {
        let span = locate_quotation(TEXT, "  Beta methods reduce latency  ", None, &cfg());
        assert_eq!(span, Some((34, 61)));
    }

    #[test]
    fn short_quotation_is_skipped() {
        assert_eq!(locate_quotation(TEXT, "Beta", None, &cfg()), None);
        assert_eq!(locate_quotation(TEXT, "Bet", None, &cfg()), None);
        // Present verbatim, still skipped at 4 chars.
        assert!(TEXT.contains("Beta"));
    }

    #[test]
    fn five_char_quotation_is_located() {
        let span = locate_quotation(TEXT, "Alpha", None, &cfg()).unwrap();
        assert_eq!(&TEXT[span.0..span.1], "Alpha");
    }

    #[test]
    fn trustworthy_hint_is_accepted_verbatim() {
        // Hint points at the Beta sentence with sloppy boundaries; its first
        // 30 chars agree with the quotation, so the hint range wins as-is.
        let hint = OffsetHint { start: 34, end: 95 };
        let span = locate_quotation(TEXT, "beta methods reduce latency significantly", Some(hint), &cfg());
        assert_eq!(span, Some((34, 95)));
    }

    #[test]
    fn wildly_wrong_hint_is_rejected() {
        // Hint lands in the Alpha sentence; no 30-char prefix agreement, so
        // the exact search takes over.
        let hint = OffsetHint { start: 1, end: 20 };
        let span = locate_quotation(TEXT, "Beta methods reduce latency", Some(hint), &cfg());
        assert_eq!(span, Some((34, 61)));
    }

    #[test]
    fn zero_start_hint_means_absent() {
        let hint = OffsetHint { start: 0, end: 27 };
        let span = locate_quotation(TEXT, "Beta methods reduce latency", Some(hint), &cfg());
        assert_eq!(span, Some((34, 61)));
    }

    #[test]
    fn inverted_hint_means_absent() {
        let hint = OffsetHint { start: 50, end: 10 };
        let span = locate_quotation(TEXT, "Beta methods reduce latency", Some(hint), &cfg());
        assert_eq!(span, Some((34, 61)));
    }

    #[test]
    fn hint_clamped_to_document_length() {
        let hint = OffsetHint {
            start: 34,
            end: 10_000,
        };
        let span = locate_quotation(TEXT, "beta methods reduce latency", Some(hint), &cfg());
        assert_eq!(span, Some((34, TEXT.len())));
    }

    #[test]
    fn prefix_fallback_extends_to_sentence_boundary() {
        // The model paraphrased the tail: the first 40 chars exist verbatim,
        // the rest does not. The span ends just past the sentence period
        // because it lies within the boundary window of the naive end.
        let quotation = "Beta methods reduce latency significantly across every market we serve";
        assert!(TEXT.to_lowercase().find(&quotation.to_lowercase()).is_none());
        let span = locate_quotation(TEXT, quotation, None, &cfg()).unwrap();
        assert_eq!(span.0, 34);
        assert_eq!(span.1, TEXT.len());
        assert!(TEXT[span.0..span.1].ends_with("regions."));
    }

    #[test]
    fn prefix_fallback_uses_naive_end_when_boundary_is_far() {
        // One long sentence, no period or newline within the window.
        let text = format!(
            "Beta methods reduce latency significantly across {} and more",
            "x".repeat(300)
        );
        let quotation = "Beta methods reduce latency significantly across all regions entirely";
        let span = locate_quotation(&text, quotation, None, &cfg()).unwrap();
        assert_eq!(span.0, 0);
        assert_eq!(span.1, quotation.len().min(text.len()));
    }

    #[test]
    fn absent_quotation_returns_none() {
        let span = locate_quotation(TEXT, "entirely unrelated quotation text", None, &cfg());
        assert_eq!(span, None);
    }

    #[test]
    fn prefix_chars_respects_char_boundaries() {
        assert_eq!(prefix_chars("héllo", 2), "hé");
        assert_eq!(prefix_chars("ab", 40), "ab");
    }

    #[test]
    fn hint_offsets_clamped_to_char_boundary() {
        // 'é' is two bytes; offset 2 falls inside it and must be walked back.
        let text = "aé bcdefgh";
        let hint = OffsetHint { start: 2, end: 9 };
        // Verification fails (no prefix agreement) but must not panic.
        let span = locate_quotation(text, "bcdefgh", Some(hint), &cfg());
        assert_eq!(span, Some((4, 11)));
    }
}
